mod app;
pub mod routes;
mod static_files;

pub use app::{build_app, run_server};
