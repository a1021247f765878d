// src/feedback.rs
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::debug;

/// How long a message stays visible before the consumer may drop it.
pub const MESSAGE_TTL: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Feedback {
    pub severity: Severity,
    pub text: String,
    pub posted_at: Instant,
}

/// Single outbound channel for everything the user should see. The engine
/// never renders anything itself; callers drain this queue and display the
/// entries however they like.
#[derive(Debug, Default)]
pub struct FeedbackQueue {
    entries: VecDeque<Feedback>,
}

impl FeedbackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, text: impl Into<String>) {
        let text = text.into();
        debug!("feedback [{:?}]: {}", severity, text);
        self.entries.push_back(Feedback {
            severity,
            text,
            posted_at: Instant::now(),
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(Severity::Info, text);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(Severity::Success, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.push(Severity::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(Severity::Error, text);
    }

    /// Drops entries older than [`MESSAGE_TTL`] relative to `now`.
    pub fn prune_expired(&mut self, now: Instant) {
        self.entries
            .retain(|entry| now.duration_since(entry.posted_at) < MESSAGE_TTL);
    }

    pub fn drain(&mut self) -> Vec<Feedback> {
        self.entries.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feedback> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
