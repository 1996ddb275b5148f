//! The streaming converter: one value per document, fed events in order.
//!
//! State is kept per part. Inside a part the converter is in exactly one
//! context (between notes, inside a note, inside a backup/forward, or inside
//! a direction) and each element start/end moves it between them.
//!
//! Character data is buffered and interpreted when its element closes.

use tracing::{debug, info, warn};

use crate::aggregate::{Aggregator, InstrumentMapper, ScoreResult, Verbatim};
use crate::dynamics::{DynamicsEnvelope, HairpinKind, Marking};
use crate::error::{Error, Result};
use crate::event::{attribute, Event};
use crate::feedback::{Conversion, FeedbackCollector};
use crate::matrix::{Articulation, PartRolls};
use crate::note::{FinishedNote, NoteBuilder, NoteKind, TieState, TieType};
use crate::params::ConvertParams;
use crate::pitch::{Alter, Step};
use crate::smoothing::{Smoother, Unsmoothed};
use crate::tracker::{TimeError, TimeTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Jump {
    Backup,
    Forward,
}

impl Jump {
    fn name(self) -> &'static str {
        match self {
            Jump::Backup => "backup",
            Jump::Forward => "forward",
        }
    }
}

/// Where inside a part the reader currently is
#[derive(Debug, Clone, PartialEq)]
enum Context {
    Part,
    Note(NoteBuilder),
    Jump { jump: Jump, duration: Option<i64> },
    Direction,
}

/// Everything that lives from `<part>` to `</part>`
#[derive(Debug)]
struct PartState {
    id: String,
    tracker: TimeTracker,
    rolls: PartRolls,
    dynamics: DynamicsEnvelope,
    ties: TieState,
    context: Context,
    previous_staccato: bool,
}

impl PartState {
    fn new(id: String, steps: usize, pitches: usize) -> Self {
        PartState {
            id,
            tracker: TimeTracker::new(),
            rolls: PartRolls::new(steps, pitches),
            dynamics: DynamicsEnvelope::new(steps),
            ties: TieState::default(),
            context: Context::Part,
            previous_staccato: false,
        }
    }

    fn note_mut(&mut self) -> Option<&mut NoteBuilder> {
        match &mut self.context {
            Context::Note(note) => Some(note),
            _ => None,
        }
    }

    fn time_error(&self, err: TimeError) -> Error {
        let part = self.id.clone();
        match err {
            TimeError::DivisionsUnknown => Error::DivisionsUnknown { part },
            TimeError::Overflow => Error::TimeOverflow { part },
        }
    }

    fn to_step(&self, time: i64, quantization: u32) -> Result<i64> {
        self.tracker
            .to_step(time, quantization)
            .map_err(|e| self.time_error(e))
    }

    fn cursor_step(&self, quantization: u32) -> Result<i64> {
        self.tracker
            .cursor_step(quantization)
            .map_err(|e| self.time_error(e))
    }

    /// Cursor plus `duration`, in divisions
    fn offset(&self, duration: i64) -> Result<i64> {
        self.tracker
            .offset(duration)
            .map_err(|e| self.time_error(e))
    }
}

/// Converts one document's event stream into per-instrument pianorolls.
///
/// Build one per document; it cannot be reused once [`Converter::finish`]
/// has consumed it.
pub struct Converter<S = Unsmoothed, M = Verbatim> {
    params: ConvertParams,
    steps: usize,
    smoother: S,
    mapper: M,
    aggregator: Aggregator,
    feedback: FeedbackCollector,
    part: Option<PartState>,
    /// Id of the `<score-part>` whose `<part-name>` is expected next
    listed_part: Option<String>,
    text: String,
    parts_done: usize,
}

impl Converter {
    /// `total_quarter_notes` sizes every matrix: rows are
    /// `total_quarter_notes * quantization`.
    pub fn new(params: ConvertParams, total_quarter_notes: u32) -> Result<Self> {
        params.validate()?;
        let steps = (total_quarter_notes as usize)
            .checked_mul(params.quantization as usize)
            .ok_or_else(|| Error::InvalidParams("pianoroll length overflows".into()))?;
        Ok(Converter {
            params,
            steps,
            smoother: Unsmoothed,
            mapper: Verbatim,
            aggregator: Aggregator::new(),
            feedback: FeedbackCollector::new(),
            part: None,
            listed_part: None,
            text: String::new(),
            parts_done: 0,
        })
    }
}

impl<S: Smoother, M: InstrumentMapper> Converter<S, M> {
    pub fn with_smoother<S2: Smoother>(self, smoother: S2) -> Converter<S2, M> {
        Converter {
            params: self.params,
            steps: self.steps,
            smoother,
            mapper: self.mapper,
            aggregator: self.aggregator,
            feedback: self.feedback,
            part: self.part,
            listed_part: self.listed_part,
            text: self.text,
            parts_done: self.parts_done,
        }
    }

    pub fn with_mapper<M2: InstrumentMapper>(self, mapper: M2) -> Converter<S, M2> {
        Converter {
            params: self.params,
            steps: self.steps,
            smoother: self.smoother,
            mapper,
            aggregator: self.aggregator,
            feedback: self.feedback,
            part: self.part,
            listed_part: self.listed_part,
            text: self.text,
            parts_done: self.parts_done,
        }
    }

    /// Number of pianoroll rows
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Cursor of the open part, in score divisions
    pub fn cursor(&self) -> Option<i64> {
        self.part.as_ref().map(|p| p.tracker.cursor())
    }

    pub fn handle(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Start { tag, attributes } => self.element_start(&tag, &attributes),
            Event::End { tag } => self.element_end(&tag),
            Event::Text(content) => {
                self.text.push_str(&content);
                Ok(())
            }
        }
    }

    /// Feed every event from `events`, stopping at the first error
    pub fn feed<I: IntoIterator<Item = Event>>(&mut self, events: I) -> Result<()> {
        events.into_iter().try_for_each(|event| self.handle(event))
    }

    /// Close the document and hand back the merged result
    pub fn finish(self) -> Result<Conversion<ScoreResult>> {
        if let Some(part) = self.part {
            return Err(Error::Truncated { part: part.id });
        }
        let result = self.aggregator.finish();
        info!(
            parts = self.parts_done,
            instruments = result.len(),
            steps = self.steps,
            "pianoroll conversion finished"
        );
        Ok(Conversion::new(result, self.feedback.into_feedback()))
    }

    fn element_start(&mut self, tag: &str, attributes: &[(String, String)]) -> Result<()> {
        self.text.clear();

        match tag {
            "score-part" => {
                self.listed_part = attribute(attributes, "id").map(str::to_string);
                return Ok(());
            }
            "part" => {
                let id = attribute(attributes, "id").unwrap_or_default().to_string();
                if let Some(open) = &self.part {
                    warn!(part = %open.id, "part opened before the previous one closed");
                    self.feedback.set_position(Some(&open.id), open.tracker.cursor());
                    self.feedback.warning("part discarded: a new part started before it closed");
                }
                debug!(part = %id, "part start");
                self.part = Some(PartState::new(id, self.steps, self.params.pitch_range));
                return Ok(());
            }
            _ => {}
        }

        let quantization = self.params.quantization;
        let Some(part) = self.part.as_mut() else {
            return Ok(());
        };

        match tag {
            "note" => {
                let printed = attribute(attributes, "print-object") != Some("no");
                part.context = Context::Note(NoteBuilder::new(printed));
            }
            "backup" | "forward" => {
                let jump = if tag == "backup" {
                    Jump::Backup
                } else {
                    Jump::Forward
                };
                part.context = Context::Jump {
                    jump,
                    duration: None,
                };
            }
            "direction" => {
                if part.context == Context::Part {
                    part.context = Context::Direction;
                }
            }
            "pitch" => {
                if let Some(note) = part.note_mut() {
                    note.open_pitch();
                }
            }
            "rest" => {
                if let Some(note) = part.note_mut() {
                    note.rest = true;
                }
            }
            "grace" => {
                if let Some(note) = part.note_mut() {
                    note.grace = true;
                }
            }
            "staccato" => {
                if let Some(note) = part.note_mut() {
                    note.staccato = true;
                }
            }
            "tie" => {
                let tie = attribute(attributes, "type").and_then(TieType::parse);
                if let (Some(note), Some(tie)) = (part.note_mut(), tie) {
                    note.tie = Some(tie);
                }
            }
            "chord" => {
                let id = part.id.clone();
                if let Some(note) = part.note_mut() {
                    if note.duration.is_some() {
                        return Err(Error::ChordAfterDuration { part: id });
                    }
                    note.chord = true;
                    part.tracker.rewind_chord();
                }
            }
            "wedge" => {
                let wedge_type = attribute(attributes, "type").unwrap_or_default();
                if let Some(kind) = HairpinKind::from_wedge(wedge_type) {
                    let step = part.cursor_step(quantization)?;
                    part.dynamics.open_hairpin(kind, step);
                } else if wedge_type == "stop" {
                    let step = part.cursor_step(quantization)?;
                    part.dynamics
                        .close_hairpin(step)
                        .map_err(|_| Error::UnbalancedWedge {
                            part: part.id.clone(),
                            step,
                        })?;
                }
            }
            _ => {
                if let Some(marking) = Marking::from_tag(tag) {
                    let step = part.cursor_step(quantization)?;
                    part.dynamics.apply_marking(marking, step);
                }
            }
        }
        Ok(())
    }

    fn element_end(&mut self, tag: &str) -> Result<()> {
        let text = std::mem::take(&mut self.text);
        let text = text.trim();

        if tag == "part-name" {
            self.bind_part_name(text);
            return Ok(());
        }

        let quantization = self.params.quantization;
        let Some(part) = self.part.as_mut() else {
            return Ok(());
        };

        match tag {
            "divisions" => {
                let divisions = parse_int(tag, text)?;
                if divisions <= 0 {
                    return Err(invalid(tag, text));
                }
                part.tracker.set_divisions(divisions);
            }
            "beats" => part.tracker.set_beats(parse_int(tag, text)?),
            "beat-type" => part.tracker.set_beat_type(parse_int(tag, text)?),
            "duration" => {
                let duration = parse_int(tag, text)?;
                let clamped = part.tracker.clamp_rest(duration);
                match &mut part.context {
                    Context::Note(note) => {
                        note.duration = Some(if note.rest { clamped } else { duration });
                    }
                    Context::Jump { duration: d, .. } => *d = Some(duration),
                    _ => {}
                }
            }
            "step" => {
                if let Some(note) = part.note_mut() {
                    note.pitch_parts.step = Step::parse(text);
                }
            }
            "octave" => {
                if part.note_mut().is_some() {
                    let octave =
                        i32::try_from(parse_int(tag, text)?).map_err(|_| invalid(tag, text))?;
                    if let Some(note) = part.note_mut() {
                        note.pitch_parts.octave = Some(octave);
                    }
                }
            }
            "alter" => {
                if part.note_mut().is_some() {
                    let alter = Alter::parse(text);
                    if alter == Alter::Coerced {
                        warn!(part = %part.id, text, "malformed alter read as a flat");
                        self.feedback
                            .set_position(Some(&part.id), part.tracker.cursor());
                        self.feedback
                            .info(format!("alter {text:?} has no digits, read as -1"));
                    }
                    let semitones = alter.semitones().ok_or_else(|| invalid(tag, text))?;
                    if let Some(note) = part.note_mut() {
                        note.alter = semitones;
                    }
                }
            }
            "voice" => {
                if let Some(note) = part.note_mut() {
                    note.voice = Some(text.to_string());
                }
            }
            "pitch" => {
                if let Some(note) = part.note_mut() {
                    note.close_pitch();
                }
            }
            "words" => {
                if part.context == Context::Direction {
                    if let Some(kind) = HairpinKind::from_words(text) {
                        let step = part.cursor_step(quantization)?;
                        let horizon = i64::from(self.params.horizon) * i64::from(quantization);
                        part.dynamics.text_cue(kind, step, horizon);
                    }
                }
            }
            "direction" => {
                if part.context == Context::Direction {
                    part.context = Context::Part;
                }
            }
            "note" => self.finish_note()?,
            "backup" | "forward" => self.finish_jump()?,
            "part" => self.finish_part()?,
            _ => {}
        }
        Ok(())
    }

    fn bind_part_name(&mut self, name: &str) {
        match &self.listed_part {
            Some(id) => {
                let instrument = self.mapper.instrument(name);
                debug!(part = %id, name, %instrument, "part named");
                self.aggregator.bind(id, instrument);
            }
            None => {
                warn!(name, "part-name outside of a score-part");
                self.feedback.set_position(None, 0);
                self.feedback
                    .warning(format!("part-name {name:?} has no score-part id"));
            }
        }
    }

    fn finish_note(&mut self) -> Result<()> {
        let Some(part) = self.part.as_mut() else {
            return Ok(());
        };
        let Context::Note(builder) = std::mem::replace(&mut part.context, Context::Part) else {
            return Ok(());
        };

        let note = builder
            .finish(self.params.discard_grace)
            .map_err(|_| Error::MissingDuration {
                context: "note",
                part: part.id.clone(),
            })?;

        // A chord's staccato is written once, on its first note
        let staccato = if note.chord {
            part.previous_staccato
        } else {
            note.staccato
        };

        match &note.kind {
            NoteKind::Pitched(pitch) => {
                write_note(part, &note, *pitch, staccato, &self.params, &mut self.feedback)?;
            }
            NoteKind::Unpitched => {
                let cursor = part.tracker.cursor();
                warn!(part = %part.id, cursor, "note without step or octave dropped");
                part.ties.resolve(&note.voice, note.tie);
                self.feedback.set_position(Some(&part.id), cursor);
                self.feedback.warning_with_suggestion(
                    "note has no complete pitch and was dropped",
                    "give the note a <pitch> with <step> and <octave>",
                );
            }
            NoteKind::Silent => {}
        }

        part.tracker
            .advance_note(note.advance)
            .map_err(|e| part.time_error(e))?;
        part.previous_staccato = staccato;
        Ok(())
    }

    fn finish_jump(&mut self) -> Result<()> {
        let Some(part) = self.part.as_mut() else {
            return Ok(());
        };
        let Context::Jump { jump, duration } = std::mem::replace(&mut part.context, Context::Part)
        else {
            return Ok(());
        };

        let duration = duration.ok_or_else(|| Error::MissingDuration {
            context: jump.name(),
            part: part.id.clone(),
        })?;
        let moved = match jump {
            Jump::Backup => part.tracker.backup(duration),
            Jump::Forward => part.tracker.forward(duration),
        };
        moved.map_err(|e| part.time_error(e))
    }

    fn finish_part(&mut self) -> Result<()> {
        let Some(part) = self.part.take() else {
            return Ok(());
        };
        let instrument = self
            .aggregator
            .instrument_for(&part.id)
            .ok_or_else(|| Error::UnnamedPart {
                id: part.id.clone(),
            })?
            .to_string();

        let (levels, flags) = part.dynamics.into_parts();
        let smoothed =
            self.smoother
                .smooth(&levels, &flags, self.params.quantization, self.params.horizon);
        if smoothed.len() != levels.len() {
            return Err(Error::SmootherLength {
                expected: levels.len(),
                actual: smoothed.len(),
            });
        }

        let mut rolls = part.rolls;
        rolls.scale(&smoothed);
        debug!(part = %part.id, %instrument, cursor = part.tracker.cursor(), "part end");
        self.aggregator.merge(&instrument, rolls);
        self.parts_done += 1;
        Ok(())
    }
}

/// Draw a pitched note into the part's matrices
fn write_note(
    part: &mut PartState,
    note: &FinishedNote,
    pitch: i64,
    staccato: bool,
    params: &ConvertParams,
    feedback: &mut FeedbackCollector,
) -> Result<()> {
    let cursor = part.tracker.cursor();
    // Tie bookkeeping applies even when the note itself is dropped
    let tied = part.ties.resolve(&note.voice, note.tie);

    if pitch < 0 || pitch >= params.pitch_range as i64 {
        warn!(part = %part.id, pitch, "pitch outside the pianoroll range");
        feedback.set_position(Some(&part.id), cursor);
        feedback.warning(format!(
            "pitch {pitch} is outside 0..{} and was dropped",
            params.pitch_range
        ));
        return Ok(());
    }

    let onset = part.to_step(cursor, params.quantization)?;
    let (start, end) = if note.grace {
        (onset.saturating_sub(1), onset)
    } else {
        let release = part.offset(note.duration)?;
        (onset, part.to_step(release, params.quantization)?)
    };

    if note.grace && start < 0 {
        warn!(part = %part.id, pitch, "grace note before the first step dropped");
        feedback.set_position(Some(&part.id), cursor);
        feedback.warning("grace note has no room before the start of the part and was dropped");
        return Ok(());
    }

    part.rolls
        .write_note(pitch as usize, start, end, Articulation { tied, staccato });
    Ok(())
}

fn parse_int(element: &str, text: &str) -> Result<i64> {
    text.parse().map_err(|_| invalid(element, text))
}

fn invalid(element: &str, text: &str) -> Error {
    Error::InvalidNumber {
        element: element.to_string(),
        text: text.to_string(),
    }
}
