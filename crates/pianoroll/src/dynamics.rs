//! Dynamics envelope: a per-step loudness curve for one part.
//!
//! Markings in the score are sparse (a `p` here, a hairpin there). This
//! module turns them into a dense curve over the whole part, plus a sparse
//! map of where each marking landed so a smoother can treat edges
//! differently from plateaus.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Level used before the first marking
pub const NEUTRAL_LEVEL: f32 = 0.5;

/// How much a crescendo or diminuendo moves the level
pub const HAIRPIN_DELTA: f32 = 0.1;

/// Point dynamic markings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marking {
    Ppp,
    Pp,
    P,
    Mp,
    Mf,
    F,
    Ff,
    Fff,
    /// sf, sfz, sffz, fz: a one-step accent at the fff level
    Sforzando,
    /// Forte then immediately piano
    Fp,
}

impl Marking {
    pub fn from_tag(tag: &str) -> Option<Marking> {
        Some(match tag {
            "ppp" => Marking::Ppp,
            "pp" => Marking::Pp,
            "p" => Marking::P,
            "mp" => Marking::Mp,
            "mf" => Marking::Mf,
            "f" => Marking::F,
            "ff" => Marking::Ff,
            "fff" => Marking::Fff,
            "sf" | "sfz" | "sffz" | "fz" => Marking::Sforzando,
            "fp" => Marking::Fp,
            _ => return None,
        })
    }

    /// Loudness in [0, 1]
    pub fn level(self) -> f32 {
        match self {
            Marking::Ppp => 0.125,
            Marking::Pp => 0.258,
            Marking::P => 0.383,
            Marking::Mp => 0.5,
            Marking::Mf => 0.625,
            Marking::F => 0.75,
            Marking::Ff => 0.875,
            Marking::Fff | Marking::Sforzando => 0.984,
            Marking::Fp => Marking::F.level(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HairpinKind {
    Crescendo,
    Diminuendo,
}

impl HairpinKind {
    pub fn from_wedge(wedge_type: &str) -> Option<HairpinKind> {
        match wedge_type {
            "crescendo" => Some(HairpinKind::Crescendo),
            "diminuendo" => Some(HairpinKind::Diminuendo),
            _ => None,
        }
    }

    /// Recognize written "cresc." / "dim." style directions
    pub fn from_words(text: &str) -> Option<HairpinKind> {
        static CRESC: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"(?i)^\s*cres").expect("valid crescendo pattern"));
        static DIM: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?i)^\s*(dim|decres)").expect("valid diminuendo pattern")
        });

        if CRESC.is_match(text) {
            Some(HairpinKind::Crescendo)
        } else if DIM.is_match(text) {
            Some(HairpinKind::Diminuendo)
        } else {
            None
        }
    }

    pub fn end_level(self, start: f32) -> f32 {
        match self {
            HairpinKind::Crescendo => (start + HAIRPIN_DELTA).min(1.0),
            HairpinKind::Diminuendo => (start - HAIRPIN_DELTA).max(0.0),
        }
    }

    fn flags(self) -> (DynamicFlag, DynamicFlag) {
        match self {
            HairpinKind::Crescendo => (DynamicFlag::CrescendoStart, DynamicFlag::CrescendoStop),
            HairpinKind::Diminuendo => (DynamicFlag::DiminuendoStart, DynamicFlag::DiminuendoStop),
        }
    }
}

/// Kind of event at a step, for the smoother
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicFlag {
    /// A point marking
    Nuance,
    CrescendoStart,
    CrescendoStop,
    DiminuendoStart,
    DiminuendoStop,
}

pub type DynamicFlags = BTreeMap<usize, DynamicFlag>;

/// A hairpin stop arrived with no open hairpin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnbalancedHairpin;

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicsEnvelope {
    levels: Vec<f32>,
    flags: DynamicFlags,
    open_hairpin: Option<(i64, HairpinKind)>,
}

impl DynamicsEnvelope {
    pub fn new(steps: usize) -> Self {
        DynamicsEnvelope {
            levels: vec![NEUTRAL_LEVEL; steps],
            flags: DynamicFlags::new(),
            open_hairpin: None,
        }
    }

    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    pub fn flags(&self) -> &DynamicFlags {
        &self.flags
    }

    pub fn into_parts(self) -> (Vec<f32>, DynamicFlags) {
        (self.levels, self.flags)
    }

    /// Level at `step`, reading the nearest edge when out of range
    pub fn level_at(&self, step: i64) -> f32 {
        if self.levels.is_empty() {
            return NEUTRAL_LEVEL;
        }
        let idx = step.clamp(0, self.levels.len() as i64 - 1) as usize;
        self.levels[idx]
    }

    pub fn apply_marking(&mut self, marking: Marking, step: i64) {
        match marking {
            Marking::Sforzando => {
                self.set(step, marking.level());
                self.flag(step, DynamicFlag::Nuance);
            }
            Marking::Fp => {
                self.set(step, Marking::F.level());
                self.fill_from(step + 1, Marking::P.level());
                self.flag(step, DynamicFlag::Nuance);
                self.flag(step + 1, DynamicFlag::Nuance);
            }
            _ => {
                self.fill_from(step, marking.level());
                self.flag(step, DynamicFlag::Nuance);
            }
        }
    }

    /// Remember where a hairpin starts. The ramp is drawn at its stop.
    pub fn open_hairpin(&mut self, kind: HairpinKind, step: i64) {
        self.open_hairpin = Some((step, kind));
    }

    pub fn close_hairpin(&mut self, stop: i64) -> Result<(), UnbalancedHairpin> {
        let (start, kind) = self.open_hairpin.take().ok_or(UnbalancedHairpin)?;
        let from = self.level_at(start);
        let to = kind.end_level(from);
        self.ramp(start, stop, from, to);
        self.fill_from(stop, to);

        let (start_flag, stop_flag) = kind.flags();
        self.flag(start, start_flag);
        self.flag(stop, stop_flag);
        Ok(())
    }

    /// A written cresc./dim. ramps over a fixed number of steps from `step`.
    /// Anything after the ramp is left alone; the next marking will take over.
    pub fn text_cue(&mut self, kind: HairpinKind, step: i64, horizon_steps: i64) {
        let from = self.level_at(step);
        let stop = step.saturating_add(horizon_steps);
        self.ramp(step, stop, from, kind.end_level(from));
    }

    /// Linear ramp over `[start, stop)`, first step at `from`, last at `to`.
    /// Only the steps inside the envelope are visited.
    fn ramp(&mut self, start: i64, stop: i64, from: f32, to: f32) {
        let count = i128::from(stop) - i128::from(start);
        if count <= 0 {
            return;
        }
        let first = start.max(0);
        let last = stop.min(self.levels.len() as i64);
        for step in first..last {
            let value = if count == 1 {
                from
            } else {
                let i = i128::from(step) - i128::from(start);
                from + (to - from) * (i as f32 / (count - 1) as f32)
            };
            self.set(step, value);
        }
    }

    fn set(&mut self, step: i64, value: f32) {
        if step >= 0 && (step as usize) < self.levels.len() {
            self.levels[step as usize] = value;
        }
    }

    fn fill_from(&mut self, step: i64, value: f32) {
        let start = step.clamp(0, self.levels.len() as i64) as usize;
        for v in &mut self.levels[start..] {
            *v = value;
        }
    }

    fn flag(&mut self, step: i64, flag: DynamicFlag) {
        if step >= 0 && (step as usize) < self.levels.len() {
            self.flags.insert(step as usize, flag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_starts_neutral() {
        let env = DynamicsEnvelope::new(4);
        assert_eq!(env.levels(), &[0.5; 4]);
        assert!(env.flags().is_empty());
    }

    #[test]
    fn test_point_marking_is_a_step_function() {
        let mut env = DynamicsEnvelope::new(6);
        env.apply_marking(Marking::P, 2);
        assert_eq!(env.levels(), &[0.5, 0.5, 0.383, 0.383, 0.383, 0.383]);
        assert_eq!(env.flags().get(&2), Some(&DynamicFlag::Nuance));
    }

    #[test]
    fn test_sforzando_is_single_step() {
        let mut env = DynamicsEnvelope::new(4);
        env.apply_marking(Marking::from_tag("sfz").unwrap(), 1);
        assert_eq!(env.levels(), &[0.5, 0.984, 0.5, 0.5]);
    }

    #[test]
    fn test_fp() {
        let mut env = DynamicsEnvelope::new(4);
        env.apply_marking(Marking::Fp, 1);
        assert_eq!(env.levels(), &[0.5, 0.75, 0.383, 0.383]);
        assert_eq!(env.flags().len(), 2);
    }

    #[test]
    fn test_crescendo_ramp() {
        let mut env = DynamicsEnvelope::new(10);
        env.apply_marking(Marking::Mf, 0);
        env.open_hairpin(HairpinKind::Crescendo, 2);
        env.close_hairpin(7).unwrap();

        let levels = env.levels();
        assert!(approx(levels[2], 0.625));
        assert!(approx(levels[6], 0.725));
        for w in levels[2..7].windows(2) {
            assert!(w[1] >= w[0]);
        }
        assert!(levels[7..].iter().all(|&v| approx(v, 0.725)));
        assert_eq!(env.flags().get(&2), Some(&DynamicFlag::CrescendoStart));
        assert_eq!(env.flags().get(&7), Some(&DynamicFlag::CrescendoStop));
    }

    #[test]
    fn test_crescendo_clamps_at_one() {
        let mut env = DynamicsEnvelope::new(4);
        env.apply_marking(Marking::Fff, 0);
        env.open_hairpin(HairpinKind::Crescendo, 0);
        env.close_hairpin(2).unwrap();
        assert!(approx(env.levels()[3], 1.0));
    }

    #[test]
    fn test_diminuendo_clamps_at_zero() {
        assert_eq!(HairpinKind::Diminuendo.end_level(0.05), 0.0);
        assert!(approx(HairpinKind::Diminuendo.end_level(0.383), 0.283));
    }

    #[test]
    fn test_far_ramps_stay_in_range() {
        let mut env = DynamicsEnvelope::new(4);
        env.text_cue(HairpinKind::Crescendo, i64::MAX - 1, i64::MAX);
        env.open_hairpin(HairpinKind::Diminuendo, i64::MIN);
        env.close_hairpin(i64::MAX).unwrap();
        assert!(env.levels().iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(env.flags().len(), 0);
    }

    #[test]
    fn test_unbalanced_stop() {
        let mut env = DynamicsEnvelope::new(4);
        assert_eq!(env.close_hairpin(2), Err(UnbalancedHairpin));

        env.open_hairpin(HairpinKind::Diminuendo, 0);
        env.close_hairpin(2).unwrap();
        assert_eq!(env.close_hairpin(3), Err(UnbalancedHairpin));
    }

    #[test]
    fn test_text_cue_ramps_over_horizon_only() {
        let mut env = DynamicsEnvelope::new(12);
        env.text_cue(HairpinKind::Diminuendo, 2, 4);
        let levels = env.levels();
        assert!(approx(levels[2], 0.5));
        assert!(approx(levels[5], 0.4));
        assert!(approx(levels[6], 0.5));
    }

    #[test]
    fn test_ramp_past_end_is_clipped() {
        let mut env = DynamicsEnvelope::new(4);
        env.text_cue(HairpinKind::Crescendo, 2, 8);
        assert_eq!(env.levels().len(), 4);
        assert!(env.levels()[3] > 0.5);
    }

    #[test]
    fn test_words_detection() {
        assert_eq!(HairpinKind::from_words("cresc."), Some(HairpinKind::Crescendo));
        assert_eq!(HairpinKind::from_words("Crescendo poco a poco"), Some(HairpinKind::Crescendo));
        assert_eq!(HairpinKind::from_words("DIM."), Some(HairpinKind::Diminuendo));
        assert_eq!(HairpinKind::from_words("decresc."), Some(HairpinKind::Diminuendo));
        assert_eq!(HairpinKind::from_words("dolce"), None);
        assert_eq!(HairpinKind::from_words("poco cresc."), None);
    }
}
