/// Transient status text shown in the corner of the window.
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub text: String,
    pub level: Level,
    expires_at: Instant,
}

impl Feedback {
    pub fn new(text: impl Into<String>, level: Level, ttl: Duration, now: Instant) -> Self {
        Self {
            text: text.into(),
            level,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
