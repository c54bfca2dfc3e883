use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use crate::chatbot::Chatbot;
use crate::emotion::EmotionAnalyzer;
use crate::storage::SessionPersistence;

use super::ServerConfig;

pub type GuardedAnalyzer = Arc<EmotionAnalyzer>;
pub type GuardedChatbot = Arc<Chatbot>;
pub type GuardedPersistence = Arc<SessionPersistence>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub analyzer: GuardedAnalyzer,
    pub chatbot: GuardedChatbot,
    pub persistence: GuardedPersistence,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        analyzer: GuardedAnalyzer,
        chatbot: GuardedChatbot,
        persistence: GuardedPersistence,
    ) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            hash: env!("GIT_HASH").to_string(),
            analyzer,
            chatbot,
            persistence,
        }
    }
}

impl FromRef<ServerState> for GuardedChatbot {
    fn from_ref(input: &ServerState) -> Self {
        input.chatbot.clone()
    }
}

impl FromRef<ServerState> for GuardedPersistence {
    fn from_ref(input: &ServerState) -> Self {
        input.persistence.clone()
    }
}
