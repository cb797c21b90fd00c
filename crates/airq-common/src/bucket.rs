//! AQI category buckets and the fixed classifier code table.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AirqError, Result};

/// Six ordered severity buckets, least severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AqiBucket {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Severe,
}

/// Classifier code → bucket. Index is the code.
pub const BUCKET_TABLE: [AqiBucket; 6] = [
    AqiBucket::Good,
    AqiBucket::Satisfactory,
    AqiBucket::Moderate,
    AqiBucket::Poor,
    AqiBucket::VeryPoor,
    AqiBucket::Severe,
];

impl AqiBucket {
    /// Map a classifier output code to its bucket. Codes outside 0..=5 are rejected.
    pub fn from_code(code: i64) -> Result<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| BUCKET_TABLE.get(i).copied())
            .ok_or(AirqError::UnknownCategory(code))
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn label(self) -> &'static str {
        match self {
            AqiBucket::Good         => "Good",
            AqiBucket::Satisfactory => "Satisfactory",
            AqiBucket::Moderate     => "Moderate",
            AqiBucket::Poor         => "Poor",
            AqiBucket::VeryPoor     => "Very Poor",
            AqiBucket::Severe       => "Severe",
        }
    }

    /// Parse a dataset label. Exact match on the six labels.
    pub fn from_label(label: &str) -> Option<Self> {
        BUCKET_TABLE.iter().copied().find(|b| b.label() == label.trim())
    }

    /// Chart colour used for this bucket.
    pub fn color(self) -> &'static str {
        match self {
            AqiBucket::Good         => "green",
            AqiBucket::Satisfactory => "lime",
            AqiBucket::Moderate     => "yellow",
            AqiBucket::Poor         => "orange",
            AqiBucket::VeryPoor     => "red",
            AqiBucket::Severe       => "darkred",
        }
    }

    pub fn all() -> &'static [AqiBucket] {
        &BUCKET_TABLE
    }
}

impl fmt::Display for AqiBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
