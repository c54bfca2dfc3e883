mod analysis_routes;
mod chat_routes;
pub mod config;
pub mod error;
mod http_layers;
pub mod metrics;
pub mod server;
mod session_routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, DEFAULT_USER_ID};
pub use http_layers::*;
pub use server::{make_app, run_server};
pub use session_routes::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};
