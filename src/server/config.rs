use super::RequestsLoggingLevel;
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// Upper bound for request bodies (multipart uploads included).
    pub max_upload_bytes: usize,
    /// If true, every /analyze result is also saved as a session log.
    pub auto_persist: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 8000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            auto_persist: false,
        }
    }
}
