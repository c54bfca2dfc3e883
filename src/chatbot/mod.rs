//! Supportive replies: emotion templates, keyword rules and an optional
//! external text generator.

mod generator;
mod responder;
mod templates;

pub use generator::{GeneratorError, OllamaGenerator, TextGenerator};
pub use responder::{Chatbot, ReplySource};
pub use templates::{emotion_reply, keyword_reply, templates_for, LISTENING_REPLY};
