use std::sync::Arc;
use tracing::warn;

use super::generator::TextGenerator;
use super::templates::{emotion_reply, keyword_reply, LISTENING_REPLY};
use crate::alert::AlertPolicy;
use crate::emotion::{normalize_label, Emotion};
use crate::server::metrics;

/// Where a chat reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Generator,
    Template,
}

impl ReplySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplySource::Generator => "generator",
            ReplySource::Template => "template",
        }
    }
}

pub struct Chatbot {
    generator: Option<Arc<dyn TextGenerator>>,
    negative_emotions: Vec<Emotion>,
}

impl Chatbot {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, alerts: &AlertPolicy) -> Self {
        Self {
            generator,
            negative_emotions: alerts.negative_emotions.clone(),
        }
    }

    /// Templates only.
    pub fn templated(alerts: &AlertPolicy) -> Self {
        Self::new(None, alerts)
    }

    /// Supportive message for a fused decision. Never fails.
    pub fn respond_to_emotion(&self, emotion: Emotion) -> &'static str {
        emotion_reply(emotion)
    }

    /// Reply to a free-form message given the client's current emotion state.
    ///
    /// The generator is tried first when configured; otherwise, or when it fails,
    /// keyword rules and then the emotion templates decide the answer. An
    /// unrecognized emotion state is treated as neutral.
    pub async fn respond(&self, emotion_state: Option<&str>, message: &str) -> (String, ReplySource) {
        let emotion = emotion_state
            .filter(|s| !s.trim().is_empty())
            .map(|s| normalize_label(s).unwrap_or(Emotion::Neutral));

        if let Some(generator) = &self.generator {
            match generator.generate(message).await {
                Ok(text) => {
                    metrics::record_chat_reply(ReplySource::Generator.as_str());
                    let reply = match emotion {
                        Some(e) if self.negative_emotions.contains(&e) => {
                            format!("I understand you're feeling {}. {}", e, text)
                        }
                        _ => text,
                    };
                    return (reply, ReplySource::Generator);
                }
                Err(e) => {
                    warn!(
                        generator = generator.name(),
                        "Text generator failed, using templates: {}", e
                    );
                }
            }
        }

        metrics::record_chat_reply(ReplySource::Template.as_str());
        let reply = keyword_reply(message)
            .or_else(|| emotion.map(emotion_reply))
            .unwrap_or(LISTENING_REPLY);
        (reply.to_string(), ReplySource::Template)
    }
}
