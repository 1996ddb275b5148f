//! Time cursor and measure attributes for one part.
//!
//! The cursor counts score divisions (the `<divisions>` unit, per quarter
//! note). It moves forward with each sounding note, back for chord members
//! and `<backup>`, and forward for `<forward>`.
//!
//! All arithmetic is checked: durations come straight from the document.

/// Why a time could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeError {
    /// No `<divisions>` seen yet
    DivisionsUnknown,
    /// The value left the `i64` range
    Overflow,
}

/// Cursor state for the part currently being read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeTracker {
    cursor: i64,
    divisions: Option<i64>,
    beats: Option<i64>,
    beat_type: Option<i64>,
    bar_length: Option<i64>,
    /// How far the previous note moved the cursor; chord members rewind by it
    last_advance: i64,
}

impl TimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn divisions(&self) -> Option<i64> {
        self.divisions
    }

    pub fn bar_length(&self) -> Option<i64> {
        self.bar_length
    }

    pub fn set_divisions(&mut self, divisions: i64) {
        self.divisions = Some(divisions);
        self.update_bar_length();
    }

    pub fn set_beats(&mut self, beats: i64) {
        self.beats = Some(beats);
        self.update_bar_length();
    }

    pub fn set_beat_type(&mut self, beat_type: i64) {
        self.beat_type = Some(beat_type);
        self.update_bar_length();
    }

    fn update_bar_length(&mut self) {
        if let (Some(divisions), Some(beats), Some(beat_type)) =
            (self.divisions, self.beats, self.beat_type)
        {
            if beat_type > 0 {
                // an overflowing bar length disables the rest clamp
                self.bar_length = divisions
                    .checked_mul(beats)
                    .and_then(|v| v.checked_mul(4))
                    .map(|v| v / beat_type);
            }
        }
    }

    /// Whole-bar rests are often written with a longer duration than the bar
    pub fn clamp_rest(&self, duration: i64) -> i64 {
        match self.bar_length {
            Some(bar) if duration > bar => bar,
            _ => duration,
        }
    }

    /// Cursor plus `duration`, without moving
    pub fn offset(&self, duration: i64) -> Result<i64, TimeError> {
        self.cursor.checked_add(duration).ok_or(TimeError::Overflow)
    }

    /// Advance past a finished note. Grace and unprinted notes pass 0.
    pub fn advance_note(&mut self, duration: i64) -> Result<(), TimeError> {
        self.cursor = self.offset(duration)?;
        self.last_advance = duration;
        Ok(())
    }

    /// Move back to the start of the previous note so a chord member
    /// shares its onset.
    pub fn rewind_chord(&mut self) {
        // last_advance was just added to the cursor, so this cannot overflow
        self.cursor -= self.last_advance;
    }

    pub fn backup(&mut self, duration: i64) -> Result<(), TimeError> {
        self.cursor = self
            .cursor
            .checked_sub(duration)
            .ok_or(TimeError::Overflow)?;
        self.last_advance = 0;
        Ok(())
    }

    pub fn forward(&mut self, duration: i64) -> Result<(), TimeError> {
        self.cursor = self.offset(duration)?;
        self.last_advance = 0;
        Ok(())
    }

    /// Convert a time in divisions to a pianoroll step (floor)
    pub fn to_step(&self, time: i64, quantization: u32) -> Result<i64, TimeError> {
        let divisions = self.divisions.ok_or(TimeError::DivisionsUnknown)?;
        let scaled = time
            .checked_mul(i64::from(quantization))
            .ok_or(TimeError::Overflow)?;
        Ok(scaled.div_euclid(divisions))
    }

    /// Pianoroll step of the cursor
    pub fn cursor_step(&self, quantization: u32) -> Result<i64, TimeError> {
        self.to_step(self.cursor, quantization)
    }
}
