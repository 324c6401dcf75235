//! Digitsight Demo
//!
//! Local interactive widget for the digit classifier: a small axum
//! server that embeds a single-page upload UI and exposes the same
//! classification contract as the headless API, plus a bounded
//! recent-prediction history for the inspector panel.

pub mod cli;
pub mod models;
pub mod server;
pub mod state;

pub use cli::Cli;
pub use models::PredictionRecord;
pub use server::{build_app, run_server};
pub use state::DemoAppState;
