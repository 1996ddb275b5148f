//! Per-note record built up between `<note>` and `</note>`.
//!
//! Every child element of a note sets one field here. Nothing is interpreted
//! until the note closes, when [`NoteBuilder::finish`] checks the record as a
//! whole and says what the note contributes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::pitch::{self, PitchParts, Step};

pub const DEFAULT_VOICE: &str = "1";

/// `<tie type="...">`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieType {
    Start,
    Stop,
}

impl TieType {
    pub fn parse(s: &str) -> Option<TieType> {
        match s {
            "start" => Some(TieType::Start),
            "stop" => Some(TieType::Stop),
            _ => None,
        }
    }
}

/// Note under construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteBuilder {
    pub printed: bool,
    pub rest: bool,
    pub chord: bool,
    pub grace: bool,
    pub duration: Option<i64>,
    /// Step/octave of the `<pitch>` element currently open
    pub pitch_parts: PitchParts,
    /// Set when a `<pitch>` closed with both step and octave
    pub pitch: Option<(Step, i32)>,
    pub alter: i32,
    pub voice: Option<String>,
    pub tie: Option<TieType>,
    pub staccato: bool,
}

impl Default for NoteBuilder {
    fn default() -> Self {
        NoteBuilder {
            printed: true,
            rest: false,
            chord: false,
            grace: false,
            duration: None,
            pitch_parts: PitchParts::default(),
            pitch: None,
            alter: 0,
            voice: None,
            tie: None,
            staccato: false,
        }
    }
}

/// A non-grace note closed without `<duration>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingDuration;

/// What a closed note contributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteKind {
    /// Rest, unprinted note, or discarded grace note
    Silent,
    /// Should sound, but its `<pitch>` lacked a step or octave
    Unpitched,
    Pitched(i64),
}

/// A note that has passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedNote {
    pub kind: NoteKind,
    /// Length in divisions. Zero for grace notes written without one.
    pub duration: i64,
    /// How far the cursor moves after this note
    pub advance: i64,
    pub voice: String,
    pub tie: Option<TieType>,
    pub chord: bool,
    pub grace: bool,
    pub staccato: bool,
}

impl NoteBuilder {
    /// `print-object="no"` marks a note as not played
    pub fn new(printed: bool) -> Self {
        NoteBuilder {
            printed,
            ..Self::default()
        }
    }

    pub fn open_pitch(&mut self) {
        self.pitch_parts = PitchParts::default();
    }

    pub fn close_pitch(&mut self) {
        if let Some(complete) = self.pitch_parts.complete() {
            self.pitch = Some(complete);
        }
        self.pitch_parts = PitchParts::default();
    }

    pub fn finish(self, discard_grace: bool) -> Result<FinishedNote, MissingDuration> {
        let duration = match (self.duration, self.grace) {
            (Some(d), _) => d,
            (None, true) => 0,
            (None, false) => return Err(MissingDuration),
        };

        let sounding = !self.rest && !(self.grace && discard_grace) && self.printed;
        let kind = if !sounding {
            NoteKind::Silent
        } else {
            match self.pitch {
                Some((step, octave)) => {
                    NoteKind::Pitched(pitch::resolve(step, octave, self.alter))
                }
                None => NoteKind::Unpitched,
            }
        };

        let advance = if self.grace || !self.printed {
            0
        } else {
            duration
        };

        Ok(FinishedNote {
            kind,
            duration,
            advance,
            voice: self.voice.unwrap_or_else(|| DEFAULT_VOICE.to_string()),
            tie: self.tie,
            chord: self.chord,
            grace: self.grace,
            staccato: self.staccato,
        })
    }
}

/// Which voices are currently inside a tie. Lives for one part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TieState {
    tying: HashMap<String, bool>,
}

impl TieState {
    /// Apply a note's tie marking to its voice and return whether the note
    /// sounds as part of a tie. A started tie stays on for every later note
    /// in the voice until a stop; the stopping note itself is still tied.
    pub fn resolve(&mut self, voice: &str, tie: Option<TieType>) -> bool {
        let tying = self.tying.entry(voice.to_string()).or_insert(false);
        match tie {
            Some(TieType::Start) => {
                *tying = true;
                true
            }
            Some(TieType::Stop) => std::mem::replace(tying, false),
            None => *tying,
        }
    }
}
