//! Canned replies keyed by emotion and by message keywords.

use rand::seq::IndexedRandom;

use crate::emotion::Emotion;

const STRESSED: [&str; 3] = [
    "I sense you might be feeling stressed. Remember, you're doing amazing work up there. Would you like to try a breathing exercise?",
    "It's completely normal to feel overwhelmed sometimes. Let's take a moment together. How can I help you relax?",
    "Your stress levels seem elevated. You're incredibly strong for handling everything you do. Want to talk about what's on your mind?",
];

const ANXIOUS: [&str; 3] = [
    "I'm here with you. Feeling anxious in space is natural. Let's work through this together.",
    "Your safety is my priority. Everything is functioning normally. Would you like to review the mission status?",
    "Anxiety can be challenging, but you've trained for this. Let me help you find your center.",
];

const HAPPY: [&str; 3] = [
    "It's wonderful to see you in good spirits! Your positive energy is inspiring.",
    "I'm so glad you're feeling well! Keep up that amazing attitude.",
    "Your happiness is contagious! How are things going with your tasks today?",
];

const SAD: [&str; 3] = [
    "I'm here for you. It's okay to feel sad sometimes, even in space. Want to talk about it?",
    "You're not alone up there. I'm always here to listen. What's weighing on your mind?",
    "Missing home is natural. Let me share something that might lift your spirits.",
];

const NEUTRAL: [&str; 3] = [
    "How are you feeling today? I'm here to support you in any way you need.",
    "Everything seems stable. Is there anything specific you'd like to discuss or any support you need?",
    "I'm monitoring your well-being. Feel free to share anything on your mind.",
];

const CALM: [&str; 3] = [
    "You seem peaceful and centered. That's excellent! Keep maintaining this wonderful state.",
    "Your calm demeanor is admirable. Is there anything you'd like to do to maintain this feeling?",
    "It's great to see you so relaxed. How can I support your well-being today?",
];

/// Reply when the message matches no keyword rule and no emotion is known.
pub const LISTENING_REPLY: &str =
    "I'm listening. Tell me more about what's on your mind, and I'll do my best to help.";

struct KeywordRule {
    keywords: &'static [&'static str],
    reply: &'static str,
}

// First match wins.
const KEYWORD_RULES: [KeywordRule; 5] = [
    KeywordRule {
        keywords: &["help", "stress", "overwhelm"],
        reply: "I'm here to support you. Would you like to try some relaxation techniques, or would you prefer to talk about what's bothering you?",
    },
    KeywordRule {
        keywords: &["lonely", "alone", "miss"],
        reply: "I understand that being away from loved ones is difficult. Remember, you're part of an incredible mission, and many people are rooting for you. I'm always here to keep you company.",
    },
    KeywordRule {
        keywords: &["tired", "exhaust", "sleep"],
        reply: "Rest is crucial for your well-being. Have you been maintaining your sleep schedule? I can help you set up a better rest routine if needed.",
    },
    KeywordRule {
        keywords: &["thank", "appreciate"],
        reply: "You're very welcome! Supporting you is my primary purpose. Is there anything else I can help you with?",
    },
    KeywordRule {
        keywords: &["how are you", "how is"],
        reply: "I'm functioning optimally and always ready to assist you! More importantly, how are YOU feeling today?",
    },
];

/// The template set for an emotion. `alert` has no set of its own and shares
/// the neutral one.
pub fn templates_for(emotion: Emotion) -> &'static [&'static str] {
    match emotion {
        Emotion::Stressed => &STRESSED,
        Emotion::Anxious => &ANXIOUS,
        Emotion::Happy => &HAPPY,
        Emotion::Sad => &SAD,
        Emotion::Calm => &CALM,
        Emotion::Neutral | Emotion::Alert => &NEUTRAL,
    }
}

/// Picks one template at random for the given emotion.
pub fn emotion_reply(emotion: Emotion) -> &'static str {
    let templates = templates_for(emotion);
    templates
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(NEUTRAL[0])
}

/// Case-insensitive substring match against the keyword rules.
pub fn keyword_reply(message: &str) -> Option<&'static str> {
    let message = message.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| message.contains(k)))
        .map(|rule| rule.reply)
}
