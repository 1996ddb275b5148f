//! Conversion feedback (warnings and notes about recovered input).
//!
//! Malformed notes are dropped rather than aborting the document, so the
//! converter collects what it skipped alongside the result.

use serde::{Deserialize, Serialize};

/// A recovered problem, tagged with where in the document it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub level: FeedbackLevel,
    pub message: String,
    /// Part identifier the problem was found in, if any part was open.
    pub part: Option<String>,
    /// Cursor in score divisions when the problem was found.
    pub cursor: i64,
    pub suggestion: Option<String>,
}

impl Feedback {
    pub fn warning(message: impl Into<String>, part: Option<String>, cursor: i64) -> Self {
        Feedback {
            level: FeedbackLevel::Warning,
            message: message.into(),
            part,
            cursor,
            suggestion: None,
        }
    }

    pub fn info(message: impl Into<String>, part: Option<String>, cursor: i64) -> Self {
        Feedback {
            level: FeedbackLevel::Info,
            message: message.into(),
            part,
            cursor,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackLevel {
    /// Input was dropped
    Warning,
    /// Input was reinterpreted but kept
    Info,
}

/// Collector for feedback during conversion
#[derive(Debug, Default)]
pub struct FeedbackCollector {
    feedback: Vec<Feedback>,
    part: Option<String>,
    cursor: i64,
}

impl FeedbackCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update position tracking (call whenever the part or cursor changes)
    pub fn set_position(&mut self, part: Option<&str>, cursor: i64) {
        self.part = part.map(str::to_string);
        self.cursor = cursor;
    }

    /// Add a warning at the current position
    pub fn warning(&mut self, message: impl Into<String>) {
        self.feedback
            .push(Feedback::warning(message, self.part.clone(), self.cursor));
    }

    pub fn warning_with_suggestion(
        &mut self,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) {
        self.feedback.push(
            Feedback::warning(message, self.part.clone(), self.cursor)
                .with_suggestion(suggestion),
        );
    }

    /// Add info at the current position
    pub fn info(&mut self, message: impl Into<String>) {
        self.feedback
            .push(Feedback::info(message, self.part.clone(), self.cursor));
    }

    pub fn into_feedback(self) -> Vec<Feedback> {
        self.feedback
    }
}

/// A finished conversion with the feedback gathered along the way
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion<T> {
    pub value: T,
    pub feedback: Vec<Feedback>,
}

impl<T> Conversion<T> {
    pub fn new(value: T, feedback: Vec<Feedback>) -> Self {
        Conversion { value, feedback }
    }

    pub fn has_warnings(&self) -> bool {
        self.feedback
            .iter()
            .any(|f| f.level == FeedbackLevel::Warning)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Feedback> {
        self.feedback
            .iter()
            .filter(|f| f.level == FeedbackLevel::Warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_builder() {
        let fb = Feedback::warning("note has no pitch", Some("P1".into()), 12)
            .with_suggestion("add <step> and <octave>");

        assert_eq!(fb.level, FeedbackLevel::Warning);
        assert_eq!(fb.part.as_deref(), Some("P1"));
        assert_eq!(fb.cursor, 12);
        assert_eq!(fb.suggestion.as_deref(), Some("add <step> and <octave>"));
    }

    #[test]
    fn test_feedback_collector_tracks_position() {
        let mut collector = FeedbackCollector::new();

        collector.info("alter coerced");
        collector.set_position(Some("P2"), 48);
        collector.warning("dropped");

        let feedback = collector.into_feedback();
        assert_eq!(feedback.len(), 2);
        assert_eq!(feedback[0].part, None);
        assert_eq!(feedback[1].part.as_deref(), Some("P2"));
        assert_eq!(feedback[1].cursor, 48);
    }

    #[test]
    fn test_conversion_warnings() {
        let result = Conversion::new(
            (),
            vec![
                Feedback::info("quirk", None, 0),
                Feedback::warning("dropped", None, 0),
            ],
        );

        assert!(result.has_warnings());
        assert_eq!(result.warnings().count(), 1);
    }
}
