//! Length pre-pass: how many quarter notes the longest part spans.
//!
//! The converter needs the matrix height up front, so callers typically run
//! this over the same events first. Time is followed with the same rules as
//! the converter (chord rewinds, backup, forward, grace notes taking no
//! time).

use tracing::debug;

use crate::error::{Error, Result};
use crate::event::{attribute, Event};
use crate::note::NoteBuilder;
use crate::tracker::{TimeError, TimeTracker};

/// Longest part length in quarter notes, rounded up, at least 1
pub fn total_quarter_notes<I: IntoIterator<Item = Event>>(events: I) -> Result<u32> {
    let mut scanner = LengthScanner::default();
    for event in events {
        scanner.handle(event)?;
    }
    Ok(scanner.total())
}

#[derive(Debug, Default)]
struct LengthScanner {
    part: Option<String>,
    tracker: TimeTracker,
    note: Option<NoteBuilder>,
    jump: Option<(bool, Option<i64>)>,
    text: String,
    longest: u32,
}

impl LengthScanner {
    fn handle(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Start { tag, attributes } => {
                self.text.clear();
                match tag.as_str() {
                    "part" => {
                        let id = attribute(&attributes, "id").unwrap_or_default();
                        self.part = Some(id.to_string());
                        self.tracker = TimeTracker::new();
                    }
                    "note" => {
                        let printed = attribute(&attributes, "print-object") != Some("no");
                        self.note = Some(NoteBuilder::new(printed));
                    }
                    "backup" => self.jump = Some((true, None)),
                    "forward" => self.jump = Some((false, None)),
                    "grace" => {
                        if let Some(note) = &mut self.note {
                            note.grace = true;
                        }
                    }
                    "rest" => {
                        if let Some(note) = &mut self.note {
                            note.rest = true;
                        }
                    }
                    "chord" => {
                        if let Some(note) = &mut self.note {
                            note.chord = true;
                            self.tracker.rewind_chord();
                        }
                    }
                    _ => {}
                }
            }
            Event::End { tag } => {
                let text = std::mem::take(&mut self.text);
                self.element_end(&tag, text.trim())?;
            }
            Event::Text(content) => self.text.push_str(&content),
        }
        Ok(())
    }

    fn element_end(&mut self, tag: &str, text: &str) -> Result<()> {
        let Some(part) = &self.part else {
            return Ok(());
        };
        let invalid = || Error::InvalidNumber {
            element: tag.to_string(),
            text: text.to_string(),
        };
        let overflow = |_: TimeError| Error::TimeOverflow { part: part.clone() };
        match tag {
            "divisions" => match text.parse::<i64>() {
                Ok(d) if d > 0 => self.tracker.set_divisions(d),
                _ => return Err(invalid()),
            },
            "beats" => self.tracker.set_beats(text.parse().map_err(|_| invalid())?),
            "beat-type" => self.tracker.set_beat_type(text.parse().map_err(|_| invalid())?),
            "duration" => {
                let duration = text.parse::<i64>().map_err(|_| invalid())?;
                if let Some(note) = &mut self.note {
                    note.duration = Some(if note.rest {
                        self.tracker.clamp_rest(duration)
                    } else {
                        duration
                    });
                } else if let Some((_, d)) = &mut self.jump {
                    *d = Some(duration);
                }
            }
            "note" => {
                if let Some(note) = self.note.take() {
                    let finished = note.finish(false).map_err(|_| Error::MissingDuration {
                        context: "note",
                        part: part.clone(),
                    })?;
                    self.tracker
                        .advance_note(finished.advance)
                        .map_err(overflow)?;
                    self.observe()?;
                }
            }
            "backup" | "forward" => {
                if let Some((backup, duration)) = self.jump.take() {
                    let duration = duration.ok_or_else(|| Error::MissingDuration {
                        context: if backup { "backup" } else { "forward" },
                        part: part.clone(),
                    })?;
                    if backup {
                        self.tracker.backup(duration).map_err(overflow)?;
                    } else {
                        self.tracker.forward(duration).map_err(overflow)?;
                        self.observe()?;
                    }
                }
            }
            "part" => {
                debug!(part = %part, quarters = self.longest, "length scan part end");
                self.part = None;
            }
            _ => {}
        }
        Ok(())
    }

    fn observe(&mut self) -> Result<()> {
        let Some(divisions) = self.tracker.divisions() else {
            return Ok(());
        };
        let cursor = self.tracker.cursor().max(0);
        let quarters = cursor / divisions + i64::from(cursor % divisions != 0);
        let quarters = u32::try_from(quarters).map_err(|_| Error::TimeOverflow {
            part: self.part.clone().unwrap_or_default(),
        })?;
        self.longest = self.longest.max(quarters);
        Ok(())
    }

    fn total(&self) -> u32 {
        self.longest.max(1)
    }
}
