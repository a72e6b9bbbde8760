//! Practice session records as stored by the record store

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype for the owning user's identity - zero-cost type safety
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new UserId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get reference to inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the user ID is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Kind of practice a session was spent on
///
/// Stored and serialized as its numeric code (1-6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PracticeType {
    Warmup = 1,
    Technique = 2,
    Scales = 3,
    Etudes = 4,
    Repertoire = 5,
    Other = 6,
}

impl PracticeType {
    /// All practice types in code order
    pub const ALL: [PracticeType; 6] = [
        PracticeType::Warmup,
        PracticeType::Technique,
        PracticeType::Scales,
        PracticeType::Etudes,
        PracticeType::Repertoire,
        PracticeType::Other,
    ];

    /// Look up a practice type by its stored code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|pt| pt.code() == code)
    }

    /// Numeric code used by the record store
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            PracticeType::Warmup => "Warm-up",
            PracticeType::Technique => "Technique",
            PracticeType::Scales => "Scales",
            PracticeType::Etudes => "Etudes",
            PracticeType::Repertoire => "Repertoire",
            PracticeType::Other => "Other",
        }
    }
}

impl TryFrom<u8> for PracticeType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown practice type code {}", code))
    }
}

impl From<PracticeType> for u8 {
    fn from(pt: PracticeType) -> Self {
        pt.code()
    }
}

impl fmt::Display for PracticeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One logged practice session
///
/// `minutes` and `intensity` are always present. Every `Option` field may be
/// absent and is then excluded from the statistic it feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Store identity (0 = not yet assigned)
    #[serde(default)]
    pub id: i64,

    #[serde(default)]
    pub user_id: UserId,

    pub instrument_id: i64,

    /// Instrument display name, joined from the instrument table
    #[serde(default)]
    pub instrument_name: String,

    /// Practice date (date-only semantics)
    pub practice_date: NaiveDate,

    /// Minutes practiced (1-600)
    pub minutes: u32,

    /// Perceived intensity (1-5)
    pub intensity: u8,

    #[serde(default)]
    pub focus: String,

    #[serde(default)]
    pub comment: Option<String>,

    #[serde(default)]
    pub practice_type: Option<PracticeType>,

    #[serde(default)]
    pub goal: Option<String>,

    #[serde(default)]
    pub achieved: bool,

    /// Self-rated mood (1-5)
    #[serde(default)]
    pub mood: Option<u8>,

    /// Self-rated energy (1-5)
    #[serde(default)]
    pub energy: Option<u8>,

    /// Self-rated focus (1-5)
    #[serde(default)]
    pub focus_score: Option<u8>,

    /// Metronome tempo at start, BPM (20-400)
    #[serde(default)]
    pub tempo_start: Option<u16>,

    /// Metronome tempo at end, BPM (20-400)
    #[serde(default)]
    pub tempo_end: Option<u16>,

    #[serde(default)]
    pub metronome: bool,

    /// Repetitions played (0-1000)
    #[serde(default)]
    pub reps: Option<u16>,

    /// Errors made over those repetitions (0-1000)
    #[serde(default)]
    pub errors: Option<u16>,
}

impl SessionRecord {
    /// Minimal record with every optional field absent
    pub fn new(
        id: i64,
        instrument_id: i64,
        practice_date: NaiveDate,
        minutes: u32,
        intensity: u8,
    ) -> Self {
        Self {
            id,
            user_id: UserId::default(),
            instrument_id,
            instrument_name: String::new(),
            practice_date,
            minutes,
            intensity,
            focus: String::new(),
            comment: None,
            practice_type: None,
            goal: None,
            achieved: false,
            mood: None,
            energy: None,
            focus_score: None,
            tempo_start: None,
            tempo_end: None,
            metronome: false,
            reps: None,
            errors: None,
        }
    }

    /// Both tempo endpoints, when the session recorded them
    pub fn tempo_pair(&self) -> Option<(u16, u16)> {
        Some((self.tempo_start?, self.tempo_end?))
    }

    /// `tempo_end - tempo_start` in BPM (negative when the tempo dropped)
    pub fn tempo_delta(&self) -> Option<i32> {
        self.tempo_pair()
            .map(|(start, end)| i32::from(end) - i32::from(start))
    }

    /// Most informative tempo reading: end tempo, else start tempo
    pub fn latest_tempo(&self) -> Option<u16> {
        self.tempo_end.or(self.tempo_start)
    }

    /// Errors per repetition, only for sessions with at least one rep
    ///
    /// Missing `errors` counts as zero errors here.
    pub fn error_rate(&self) -> Option<f64> {
        let reps = self.reps.filter(|&r| r > 0)?;
        let errors = self.errors.unwrap_or(0);
        Some(f64::from(errors) / f64::from(reps.max(1)))
    }
}
