use std::time::{Duration, Instant};

use strumkit_core::action::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

impl From<Severity> for StatusLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Info => StatusLevel::Info,
            Severity::Error => StatusLevel::Error,
        }
    }
}

impl StatusLevel {
    fn ttl(self) -> Duration {
        match self {
            StatusLevel::Info => Duration::from_secs(4),
            StatusLevel::Error => Duration::from_secs(8),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub timestamp: Instant,
}

impl StatusMessage {
    fn is_expired(&self) -> bool {
        self.timestamp.elapsed() > self.level.ttl()
    }
}

pub struct StatusBar {
    messages: Vec<StatusMessage>,
    max: usize,
}

impl StatusBar {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            max: 16,
        }
    }

    /// Errors stay up longer than info messages.
    pub fn push(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.messages.push(StatusMessage {
            text: text.into(),
            level,
            timestamp: Instant::now(),
        });
        if self.messages.len() > self.max {
            self.messages.remove(0);
        }
    }

    /// Newest message still within its time to live.
    pub fn current(&self) -> Option<&StatusMessage> {
        self.messages.iter().rev().find(|m| !m.is_expired())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_current() {
        let mut bar = StatusBar::new();
        assert!(bar.current().is_none());
        bar.push("Saved set 'verse'", StatusLevel::Info);
        let current = bar.current().unwrap();
        assert_eq!(current.text, "Saved set 'verse'");
        assert_eq!(current.level, StatusLevel::Info);
    }

    #[test]
    fn level_comes_from_caller() {
        let mut bar = StatusBar::new();
        bar.push("Import failed: no such file", Severity::Error.into());
        assert_eq!(bar.current().unwrap().level, StatusLevel::Error);
        // Wording alone does not make a message an error.
        bar.push("Imported 1 chords, skipped 1 (Oops: failed to parse)", Severity::Info.into());
        assert_eq!(bar.current().unwrap().level, StatusLevel::Info);
    }

    #[test]
    fn errors_outlive_info() {
        assert!(StatusLevel::Error.ttl() > StatusLevel::Info.ttl());
    }

    #[test]
    fn keeps_a_bounded_history() {
        let mut bar = StatusBar::new();
        for i in 0..40 {
            bar.push(format!("message {}", i), StatusLevel::Info);
        }
        assert_eq!(bar.messages.len(), 16);
        assert_eq!(bar.current().unwrap().text, "message 39");
    }
}
