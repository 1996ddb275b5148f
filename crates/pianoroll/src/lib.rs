//! MusicXML to pianoroll conversion.
//!
//! This crate turns the event stream of a MusicXML document into fixed
//! resolution matrices per instrument: a note-on matrix (time steps × pitch,
//! amplitude 0-127) and an articulation matrix describing how each note is
//! sustained (tied, staccato, or released one step early).
//!
//! Tokenizing the document is left to the caller; anything that yields
//! [`Event`]s in document order works.
//!
//! # Example
//!
//! ```
//! use pianoroll::{convert, ConvertParams, Event};
//!
//! fn leaf(tag: &str, text: &str) -> [Event; 3] {
//!     [Event::start(tag), Event::text(text), Event::end(tag)]
//! }
//!
//! let mut events = vec![Event::start_with("score-part", [("id", "P1")])];
//! events.extend(leaf("part-name", "Flute"));
//! events.push(Event::end("score-part"));
//! events.push(Event::start_with("part", [("id", "P1")]));
//! events.extend(leaf("divisions", "1"));
//! events.push(Event::start("note"));
//! events.push(Event::start("pitch"));
//! events.extend(leaf("step", "C"));
//! events.extend(leaf("octave", "5"));
//! events.push(Event::end("pitch"));
//! events.extend(leaf("duration", "1"));
//! events.push(Event::end("note"));
//! events.push(Event::end("part"));
//!
//! let params = ConvertParams::default().with_quantization(4);
//! let result = convert(events, params, 1).unwrap();
//! let flute = result.value.get("Flute").unwrap();
//! assert_eq!(flute.note_on.get(0, 60), Some(64));
//! ```

pub mod aggregate;
pub mod converter;
pub mod dynamics;
pub mod error;
pub mod event;
pub mod feedback;
pub mod length;
pub mod matrix;
pub mod note;
pub mod params;
pub mod pitch;
pub mod smoothing;
pub mod tracker;

pub use aggregate::{InstrumentMapper, InstrumentRoll, ScoreResult, Verbatim};
pub use converter::Converter;
pub use dynamics::{DynamicFlag, DynamicFlags};
pub use error::{ConfigError, Error, Result};
pub use event::Event;
pub use feedback::{Conversion, Feedback, FeedbackLevel};
pub use length::total_quarter_notes;
pub use matrix::Matrix;
pub use params::ConvertParams;
pub use smoothing::{Smoother, Unsmoothed};

/// Convert one document with no smoothing and verbatim instrument names.
///
/// `total_quarter_notes` sets the matrix height; see
/// [`length::total_quarter_notes`] for computing it from the same events.
pub fn convert<I>(
    events: I,
    params: ConvertParams,
    total_quarter_notes: u32,
) -> Result<Conversion<ScoreResult>>
where
    I: IntoIterator<Item = Event>,
{
    convert_with(events, params, total_quarter_notes, Unsmoothed, Verbatim)
}

/// Convert one document with a caller-supplied smoother and instrument mapper
pub fn convert_with<I, S, M>(
    events: I,
    params: ConvertParams,
    total_quarter_notes: u32,
    smoother: S,
    mapper: M,
) -> Result<Conversion<ScoreResult>>
where
    I: IntoIterator<Item = Event>,
    S: Smoother,
    M: InstrumentMapper,
{
    let mut converter = Converter::new(params, total_quarter_notes)?
        .with_smoother(smoother)
        .with_mapper(mapper);
    converter.feed(events)?;
    converter.finish()
}
