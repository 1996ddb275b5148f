//! Builds MusicXML-shaped event streams for tests.

#![allow(dead_code)]

use pianoroll::Event;

/// One `<note>` element
#[derive(Debug, Clone, Default)]
pub struct Note {
    step: Option<&'static str>,
    octave: Option<i32>,
    alter: Option<&'static str>,
    duration: Option<i64>,
    rest: bool,
    chord: bool,
    grace: bool,
    hidden: bool,
    staccato: bool,
    voice: Option<&'static str>,
    ties: Vec<&'static str>,
}

impl Note {
    pub fn pitch(step: &'static str, octave: i32, duration: i64) -> Self {
        Note {
            step: Some(step),
            octave: Some(octave),
            duration: Some(duration),
            ..Self::default()
        }
    }

    pub fn rest(duration: i64) -> Self {
        Note {
            rest: true,
            duration: Some(duration),
            ..Self::default()
        }
    }

    /// Grace note written without a duration
    pub fn grace(step: &'static str, octave: i32) -> Self {
        Note {
            step: Some(step),
            octave: Some(octave),
            grace: true,
            ..Self::default()
        }
    }

    pub fn step_only(step: &'static str, duration: i64) -> Self {
        Note {
            step: Some(step),
            duration: Some(duration),
            ..Self::default()
        }
    }

    pub fn chord(mut self) -> Self {
        self.chord = true;
        self
    }

    pub fn staccato(mut self) -> Self {
        self.staccato = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn alter(mut self, alter: &'static str) -> Self {
        self.alter = Some(alter);
        self
    }

    pub fn voice(mut self, voice: &'static str) -> Self {
        self.voice = Some(voice);
        self
    }

    pub fn tie(mut self, tie: &'static str) -> Self {
        self.ties.push(tie);
        self
    }

    pub fn without_duration(mut self) -> Self {
        self.duration = None;
        self
    }

    fn events(&self) -> Vec<Event> {
        let mut events = if self.hidden {
            vec![Event::start_with("note", [("print-object", "no")])]
        } else {
            vec![Event::start("note")]
        };
        if self.grace {
            events.extend(empty("grace"));
        }
        if self.chord {
            events.extend(empty("chord"));
        }
        if self.rest {
            events.extend(empty("rest"));
        }
        if self.step.is_some() || self.octave.is_some() {
            events.push(Event::start("pitch"));
            if let Some(step) = self.step {
                events.extend(leaf("step", step));
            }
            if let Some(alter) = self.alter {
                events.extend(leaf("alter", alter));
            }
            if let Some(octave) = self.octave {
                events.extend(leaf("octave", &octave.to_string()));
            }
            events.push(Event::end("pitch"));
        }
        if let Some(duration) = self.duration {
            events.extend(leaf("duration", &duration.to_string()));
        }
        for tie in &self.ties {
            events.push(Event::start_with("tie", [("type", *tie)]));
            events.push(Event::end("tie"));
        }
        if let Some(voice) = self.voice {
            events.extend(leaf("voice", voice));
        }
        if self.staccato {
            events.push(Event::start("notations"));
            events.push(Event::start("articulations"));
            events.extend(empty("staccato"));
            events.push(Event::end("articulations"));
            events.push(Event::end("notations"));
        }
        events.push(Event::end("note"));
        events
    }
}

pub fn leaf(tag: &str, text: &str) -> Vec<Event> {
    vec![Event::start(tag), Event::text(text), Event::end(tag)]
}

fn empty(tag: &str) -> Vec<Event> {
    vec![Event::start(tag), Event::end(tag)]
}

/// A whole document, built part by part
#[derive(Debug, Default)]
pub struct Doc {
    events: Vec<Event>,
}

impl Doc {
    /// Part list declaring `(id, name)` pairs
    pub fn new(parts: &[(&str, &str)]) -> Self {
        let mut events = vec![Event::start("score-partwise"), Event::start("part-list")];
        for (id, name) in parts {
            events.push(Event::start_with("score-part", [("id", *id)]));
            events.extend(leaf("part-name", name));
            events.push(Event::end("score-part"));
        }
        events.push(Event::end("part-list"));
        Doc { events }
    }

    pub fn part(mut self, id: &str, divisions: i64) -> Self {
        self.events.push(Event::start_with("part", [("id", id)]));
        self.events.push(Event::start_with("measure", [("number", "1")]));
        self.events.push(Event::start("attributes"));
        self.events.extend(leaf("divisions", &divisions.to_string()));
        self.events.push(Event::end("attributes"));
        self
    }

    pub fn time(mut self, beats: i64, beat_type: i64) -> Self {
        self.events.push(Event::start("attributes"));
        self.events.push(Event::start("time"));
        self.events.extend(leaf("beats", &beats.to_string()));
        self.events.extend(leaf("beat-type", &beat_type.to_string()));
        self.events.push(Event::end("time"));
        self.events.push(Event::end("attributes"));
        self
    }

    pub fn note(mut self, note: Note) -> Self {
        self.events.extend(note.events());
        self
    }

    pub fn backup(mut self, duration: i64) -> Self {
        self.events.push(Event::start("backup"));
        self.events.extend(leaf("duration", &duration.to_string()));
        self.events.push(Event::end("backup"));
        self
    }

    pub fn forward(mut self, duration: i64) -> Self {
        self.events.push(Event::start("forward"));
        self.events.extend(leaf("duration", &duration.to_string()));
        self.events.push(Event::end("forward"));
        self
    }

    fn direction(mut self, inner: Vec<Event>) -> Self {
        self.events.push(Event::start_with("direction", [("placement", "below")]));
        self.events.push(Event::start("direction-type"));
        self.events.extend(inner);
        self.events.push(Event::end("direction-type"));
        self.events.push(Event::end("direction"));
        self
    }

    pub fn dynamic(self, marking: &str) -> Self {
        let mut inner = vec![Event::start("dynamics")];
        inner.extend(empty(marking));
        inner.push(Event::end("dynamics"));
        self.direction(inner)
    }

    pub fn wedge(self, wedge_type: &str) -> Self {
        self.direction(vec![
            Event::start_with("wedge", [("type", wedge_type)]),
            Event::end("wedge"),
        ])
    }

    pub fn words(self, text: &str) -> Self {
        self.direction(leaf("words", text))
    }

    pub fn end_part(mut self) -> Self {
        self.events.push(Event::end("measure"));
        self.events.push(Event::end("part"));
        self
    }

    pub fn events(mut self) -> Vec<Event> {
        self.events.push(Event::end("score-partwise"));
        self.events
    }
}
