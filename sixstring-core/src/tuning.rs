//! # Tuning Tables
//!
//! Named sets of target notes for a six-string guitar. A table is
//! immutable once built and swapped as a whole unit when the player picks
//! a different preset. Tables are serde-enabled so a frontend can load a
//! caller-supplied table from JSON alongside the built-in presets.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A single target note with its name and frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Note name (e.g., "E2", "A2")
    pub name: String,
    /// Frequency in Hz
    pub frequency: f32,
}

/// An ordered mapping from note name to target frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningTable {
    name: String,
    notes: Vec<Note>,
}

/// Standard tuning, E2 through E4.
pub static STANDARD: Lazy<TuningTable> = Lazy::new(|| {
    TuningTable::new(
        "Standard",
        &[
            ("E2", 82.4),
            ("A2", 110.0),
            ("D3", 146.8),
            ("G3", 196.0),
            ("B3", 246.9),
            ("E4", 329.6),
        ],
    )
});

/// Drop D tuning, the low string a whole step down.
pub static DROP_D: Lazy<TuningTable> = Lazy::new(|| {
    TuningTable::new(
        "Drop D",
        &[
            ("D2", 73.42),
            ("A2", 110.0),
            ("D3", 146.8),
            ("G3", 196.0),
            ("B3", 246.9),
            ("E4", 329.6),
        ],
    )
});

/// The built-in presets, in menu order.
pub fn presets() -> [&'static TuningTable; 2] {
    [&STANDARD, &DROP_D]
}

/// Looks up a built-in preset by name, case-insensitively.
pub fn preset(name: &str) -> Option<&'static TuningTable> {
    presets()
        .into_iter()
        .find(|table| table.name.eq_ignore_ascii_case(name.trim()))
}

impl TuningTable {
    pub fn new(name: impl Into<String>, pairs: &[(&str, f32)]) -> Self {
        Self {
            name: name.into(),
            notes: pairs
                .iter()
                .map(|&(name, frequency)| Note {
                    name: name.to_string(),
                    frequency,
                })
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Finds the note whose target frequency is closest to `freq`.
    ///
    /// When two notes are exactly equidistant the later one in table
    /// order wins; the rule only matters for hand-built tables, since the
    /// presets have no equidistant pairs.
    pub fn nearest(&self, freq: f32) -> &Note {
        self.notes
            .iter()
            .min_by(|a, b| {
                let diff_a = (a.frequency - freq).abs();
                let diff_b = (b.frequency - freq).abs();
                diff_a
                    .partial_cmp(&diff_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .expect("tuning tables are validated non-empty") // Enforced at the loading boundary.
    }
}
