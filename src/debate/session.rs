use crate::{ParleyError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Seat of a participant; A always opens each round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    A,
    B,
}

impl Speaker {
    pub fn other(self) -> Self {
        match self {
            Speaker::A => Speaker::B,
            Speaker::B => Speaker::A,
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::A => write!(f, "A"),
            Speaker::B => write!(f, "B"),
        }
    }
}

/// One utterance in a session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// 1-based position in the session
    pub ordinal: usize,

    /// 1-based round the turn belongs to
    pub round: usize,

    pub speaker: Speaker,

    /// Display name of the speaker at the time of the turn
    pub name: String,

    pub text: String,

    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(
        ordinal: usize,
        round: usize,
        speaker: Speaker,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            ordinal,
            round,
            speaker,
            name: name.into(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A debate in progress
///
/// Turns are append-only; ordinals are assigned here so they stay dense.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    topic: String,
    rounds: usize,
    turns: Vec<Turn>,
    current_round: usize,
}

impl Session {
    pub fn new(topic: impl Into<String>, rounds: usize) -> Result<Self> {
        let topic = topic.into();

        if topic.trim().is_empty() {
            return Err(ParleyError::InvalidConfiguration(
                "topic must not be empty".into(),
            ));
        }
        if rounds == 0 {
            return Err(ParleyError::InvalidConfiguration(
                "rounds must be at least 1".into(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            topic,
            rounds,
            turns: Vec::new(),
            current_round: 0,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Round currently being played; 0 before the first turn
    pub fn current_round(&self) -> usize {
        self.current_round
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn expected_turns(&self) -> usize {
        self.rounds * 2
    }

    pub fn is_complete(&self) -> bool {
        self.turns.len() == self.expected_turns()
    }

    /// Who speaks next, or `None` once all rounds are played
    pub fn next_speaker(&self) -> Option<Speaker> {
        if self.is_complete() {
            return None;
        }
        Some(if self.turns.len() % 2 == 0 { Speaker::A } else { Speaker::B })
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }

    pub(crate) fn begin_round(&mut self, round: usize) {
        self.current_round = round;
    }

    pub(crate) fn push_turn(&mut self, speaker: Speaker, name: &str, text: String) -> &Turn {
        let ordinal = self.turns.len() + 1;
        self.turns
            .push(Turn::new(ordinal, self.current_round, speaker, name, text));
        &self.turns[ordinal - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank_topic() {
        assert!(matches!(
            Session::new("   ", 3),
            Err(ParleyError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Session::new("", 1),
            Err(ParleyError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_zero_rounds() {
        assert!(matches!(
            Session::new("AI", 0),
            Err(ParleyError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_ordinals_are_dense() {
        let mut session = Session::new("Remote work", 2).unwrap();
        session.begin_round(1);
        session.push_turn(Speaker::A, "Optimist", "Great".into());
        session.push_turn(Speaker::B, "Skeptic", "Doubtful".into());
        session.begin_round(2);
        session.push_turn(Speaker::A, "Optimist", "Still great".into());

        let ordinals: Vec<usize> = session.turns().iter().map(|t| t.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
        assert_eq!(session.turns()[2].round, 2);
        assert_eq!(session.next_speaker(), Some(Speaker::B));
        assert!(!session.is_complete());
    }

    #[test]
    fn test_turn_serializes() {
        let turn = Turn::new(1, 1, Speaker::B, "Skeptic", "Prove it.");
        let json = serde_json::to_string(&turn).unwrap();
        let back: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turn);
        assert_eq!(Speaker::A.other(), Speaker::B);
    }
}
