//! User-facing message sink.
//!
//! Every message carries a level from 1 (essential) to 4 (chatty) and is
//! printed only when that level does not exceed the configured quietness.
//! Errors are always printed. Each line is prefixed with a colored `*`.

use std::cell::RefCell;
use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
}

#[derive(Debug)]
pub struct Output {
    quietness: u8,
    /// When set, messages are recorded here instead of being printed.
    recorded: Option<RefCell<Vec<Message>>>,
}

impl Output {
    pub fn new(quietness: u8) -> Self {
        Self {
            quietness,
            recorded: None,
        }
    }

    /// An output that records every message that passes the quietness check.
    pub fn buffered(quietness: u8) -> Self {
        Self {
            quietness,
            recorded: Some(RefCell::new(Vec::new())),
        }
    }

    pub fn info(&self, text: &str, level: u8) {
        if level <= self.quietness {
            self.emit(Severity::Info, text);
        }
    }

    pub fn warn(&self, text: &str, level: u8) {
        if level <= self.quietness {
            self.emit(Severity::Warn, text);
        }
    }

    pub fn error(&self, text: &str) {
        self.emit(Severity::Error, text);
    }

    /// Messages recorded so far; empty for a printing output.
    pub fn messages(&self) -> Vec<Message> {
        self.recorded
            .as_ref()
            .map(|recorded| recorded.borrow().clone())
            .unwrap_or_default()
    }

    fn emit(&self, severity: Severity, text: &str) {
        if let Some(recorded) = &self.recorded {
            recorded.borrow_mut().push(Message {
                severity,
                text: text.to_string(),
            });
            return;
        }
        for line in text.split('\n') {
            match severity {
                Severity::Info => println!("{} {}", "*".green(), line),
                Severity::Warn => println!("{} {}", "*".yellow(), line),
                Severity::Error => eprintln!("{} {}", "*".red(), line),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quietness_filters_levels() {
        let out = Output::buffered(2);
        out.info("shown", 1);
        out.info("hidden", 3);
        out.warn("shown too", 2);
        out.warn("hidden too", 4);
        let texts: Vec<_> = out.messages().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["shown", "shown too"]);
    }

    #[test]
    fn test_errors_ignore_quietness() {
        let out = Output::buffered(0);
        out.error("boom");
        assert_eq!(
            out.messages(),
            vec![Message {
                severity: Severity::Error,
                text: "boom".to_string()
            }]
        );
    }

    #[test]
    fn test_printing_output_records_nothing() {
        let out = Output::new(0);
        out.info("not shown", 1);
        assert!(out.messages().is_empty());
    }
}
