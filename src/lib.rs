//! MAITRI Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod alert;
pub mod chatbot;
pub mod config;
pub mod emotion;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use alert::{AlertLevel, AlertPolicy};
pub use chatbot::Chatbot;
pub use emotion::{Emotion, EmotionAnalyzer, FusionPolicy};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use storage::{LocalBlobStore, RemoteBlobStore, SessionPersistence, StorageMode};
