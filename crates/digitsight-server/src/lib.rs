//! Digitsight Server
//!
//! HTTP inference API for handwritten digit recognition: a single
//! CORS-enabled `POST /infer/` endpoint backed by a pretrained SigLIP2
//! MNIST checkpoint loaded once at startup, plus health and Prometheus
//! metrics endpoints.

pub mod cli;
pub mod config;
pub mod routes;
pub mod state;

pub use cli::Cli;
pub use config::ServerConfig;
pub use routes::create_router;
pub use state::AppState;
