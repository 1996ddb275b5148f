//! Pitch resolution: step + octave + alter to a pitch number.

use serde::{Deserialize, Serialize};

/// Diatonic step name as written in `<step>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    /// Semitone offset from C (0-11)
    pub fn to_semitone(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }

    /// Parse from step text. Only the seven uppercase letters are valid.
    pub fn parse(s: &str) -> Option<Step> {
        match s.trim() {
            "C" => Some(Step::C),
            "D" => Some(Step::D),
            "E" => Some(Step::E),
            "F" => Some(Step::F),
            "G" => Some(Step::G),
            "A" => Some(Step::A),
            "B" => Some(Step::B),
            _ => None,
        }
    }
}

/// Result of reading an `<alter>` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alter {
    Value(i32),
    /// Sign with no digits, read as a flat
    Coerced,
    Invalid,
}

impl Alter {
    pub fn parse(text: &str) -> Alter {
        let text = text.trim();
        if let Ok(value) = text.parse::<i32>() {
            return Alter::Value(value);
        }
        if !text.is_empty() && text.chars().all(|c| c == '-' || c == '+') {
            return Alter::Coerced;
        }
        Alter::Invalid
    }

    pub fn semitones(self) -> Option<i32> {
        match self {
            Alter::Value(v) => Some(v),
            Alter::Coerced => Some(-1),
            Alter::Invalid => None,
        }
    }
}

/// Step and octave seen inside one `<pitch>` element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PitchParts {
    pub step: Option<Step>,
    pub octave: Option<i32>,
}

impl PitchParts {
    /// Both step and octave were seen
    pub fn complete(&self) -> Option<(Step, i32)> {
        Some((self.step?, self.octave?))
    }
}

/// `semitone(step) + octave * 12 + alter`, wide enough for any parsed input
pub fn resolve(step: Step, octave: i32, alter: i32) -> i64 {
    i64::from(step.to_semitone()) + i64::from(octave) * 12 + i64::from(alter)
}
