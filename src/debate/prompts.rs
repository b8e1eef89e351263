//! Prompt templates for debate turns

use crate::debate::session::Session;

/// Framing for the very first turn of a session
pub fn opening_prompt(topic: &str) -> String {
    format!(
        "Discuss this topic: {}. Introduce your perspective on it.",
        topic
    )
}

/// Framing for every later turn, quoting the opponent verbatim
pub fn rebuttal_prompt(topic: &str, other_name: &str, previous: &str) -> String {
    format!(
        "The topic is: {}. {} just said: \"{}\". Respond to their points.",
        topic, other_name, previous
    )
}

/// Prompt for whoever speaks next in `session`
///
/// Only the first turn of the session gets the opening framing; B's
/// round-1 turn already quotes A.
pub fn prompt_for(session: &Session) -> String {
    match session.last_turn() {
        None => opening_prompt(session.topic()),
        Some(previous) => rebuttal_prompt(session.topic(), &previous.name, &previous.text),
    }
}
