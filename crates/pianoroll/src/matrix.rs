//! Time × pitch matrices and the per-part note writer.

use serde::{Deserialize, Serialize};

/// Dense row-major matrix. Rows are pianoroll steps, columns are pitches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Matrix<T> {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::default())
    }
}

impl<T: Copy> Matrix<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn column(&self, col: usize) -> Vec<T> {
        (0..self.rows)
            .map(|r| self.data[r * self.cols + col])
            .collect()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Set `[start, end)` of one column. The range is clipped to the matrix;
    /// out-of-range columns are ignored.
    pub fn fill_rows(&mut self, start: i64, end: i64, col: usize, value: T) {
        if col >= self.cols {
            return;
        }
        let start = start.clamp(0, self.rows as i64) as usize;
        let end = end.clamp(0, self.rows as i64) as usize;
        for r in start..end {
            self.data[r * self.cols + col] = value;
        }
    }

    pub fn map<U, F: Fn(T) -> U>(&self, f: F) -> Matrix<U> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

impl<T: Copy + PartialOrd> Matrix<T> {
    /// Elementwise maximum with a matrix of the same shape
    pub fn max_merge(&mut self, other: &Matrix<T>) {
        debug_assert_eq!(self.shape(), other.shape());
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            if b > *a {
                *a = b;
            }
        }
    }
}

impl Matrix<f32> {
    /// Multiply every row by its factor (broadcast along the pitch axis)
    pub fn scale_rows(&mut self, factors: &[f32]) {
        debug_assert_eq!(factors.len(), self.rows);
        for (row, &factor) in self.data.chunks_mut(self.cols.max(1)).zip(factors) {
            for v in row {
                *v *= factor;
            }
        }
    }
}

/// How the sustain of a note is drawn in the articulation matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Articulation {
    /// Inside a tie for this voice
    pub tied: bool,
    pub staccato: bool,
}

/// Part-local note-on and articulation matrices
#[derive(Debug, Clone, PartialEq)]
pub struct PartRolls {
    pub note_on: Matrix<f32>,
    pub articulation: Matrix<f32>,
}

impl PartRolls {
    pub fn new(steps: usize, pitches: usize) -> Self {
        PartRolls {
            note_on: Matrix::new(steps, pitches),
            articulation: Matrix::new(steps, pitches),
        }
    }

    /// Write one note spanning steps `[start, end)`.
    ///
    /// Ties sustain through the whole span, staccato marks only the attack,
    /// and plain notes stop one step early so repeated notes stay separable.
    /// The tie and staccato writes are applied independently.
    pub fn write_note(&mut self, pitch: usize, start: i64, end: i64, articulation: Articulation) {
        self.note_on.fill_rows(start, end, pitch, 1.0);

        if !articulation.tied && !articulation.staccato {
            self.articulation.fill_rows(start, end.saturating_sub(1), pitch, 1.0);
        }
        if articulation.tied {
            self.articulation.fill_rows(start, end, pitch, 1.0);
        }
        if articulation.staccato {
            self.articulation.fill_rows(start, start.saturating_add(1), pitch, 1.0);
        }
    }

    /// Apply a per-step loudness envelope to both matrices
    pub fn scale(&mut self, envelope: &[f32]) {
        self.note_on.scale_rows(envelope);
        self.articulation.scale_rows(envelope);
    }
}
