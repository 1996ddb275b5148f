//! Per-instrument merge of finished parts.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matrix::{Matrix, PartRolls};

/// Maps a `<part-name>` to the instrument key used in the output.
///
/// Several parts may map to the same instrument; their matrices are merged.
pub trait InstrumentMapper {
    fn instrument(&self, part_name: &str) -> String;
}

/// Uses the part name as written
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl InstrumentMapper for Verbatim {
    fn instrument(&self, part_name: &str) -> String {
        part_name.to_string()
    }
}

impl<F> InstrumentMapper for F
where
    F: Fn(&str) -> String,
{
    fn instrument(&self, part_name: &str) -> String {
        self(part_name)
    }
}

/// Note-on amplitude from a scaled matrix value in [0, 1]
pub fn to_amplitude(value: f32) -> u8 {
    (value * 128.0).floor().clamp(0.0, 127.0) as u8
}

/// Final matrices for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRoll {
    /// Amplitude 0-127
    pub note_on: Matrix<u8>,
    /// Sustain shape scaled by dynamics, 0-1
    pub articulation: Matrix<f32>,
}

/// Conversion output keyed by instrument name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub instruments: BTreeMap<String, InstrumentRoll>,
}

impl ScoreResult {
    pub fn get(&self, instrument: &str) -> Option<&InstrumentRoll> {
        self.instruments.get(instrument)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn instrument_names(&self) -> impl Iterator<Item = &str> {
        self.instruments.keys().map(String::as_str)
    }

    /// Split into separate note-on and articulation maps
    pub fn into_maps(self) -> (BTreeMap<String, Matrix<u8>>, BTreeMap<String, Matrix<f32>>) {
        let mut note_on = BTreeMap::new();
        let mut articulation = BTreeMap::new();
        for (name, roll) in self.instruments {
            note_on.insert(name.clone(), roll.note_on);
            articulation.insert(name, roll.articulation);
        }
        (note_on, articulation)
    }
}

/// Collects part names and merges scaled part matrices by instrument
#[derive(Debug, Default)]
pub struct Aggregator {
    part_names: HashMap<String, String>,
    merged: BTreeMap<String, PartRolls>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the instrument a part id belongs to
    pub fn bind(&mut self, part_id: &str, instrument: String) {
        self.part_names.insert(part_id.to_string(), instrument);
    }

    pub fn instrument_for(&self, part_id: &str) -> Option<&str> {
        self.part_names.get(part_id).map(String::as_str)
    }

    /// Merge a part's already-scaled matrices into its instrument
    pub fn merge(&mut self, instrument: &str, rolls: PartRolls) {
        match self.merged.get_mut(instrument) {
            Some(existing) => {
                debug!(instrument, "merging part into existing instrument");
                existing.note_on.max_merge(&rolls.note_on);
                existing.articulation.max_merge(&rolls.articulation);
            }
            None => {
                self.merged.insert(instrument.to_string(), rolls);
            }
        }
    }

    pub fn finish(self) -> ScoreResult {
        let instruments = self
            .merged
            .into_iter()
            .map(|(name, rolls)| {
                let roll = InstrumentRoll {
                    note_on: rolls.note_on.map(to_amplitude),
                    articulation: rolls.articulation,
                };
                (name, roll)
            })
            .collect();
        ScoreResult { instruments }
    }
}
