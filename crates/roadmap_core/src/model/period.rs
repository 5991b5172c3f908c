//! Period registry and period-label helpers.
//!
//! # Responsibility
//! - Keep the ordered set of periods a roadmap timeline can show.
//! - Resolve labels to timeline positions and quarter digits.
//! - Normalize free-form import values into registry labels.
//!
//! # Invariants
//! - Registry periods are sorted by `PeriodKey` and unique by value and key.
//! - A whole-year bucket sorts before the quarters of the same year.
//! - Lookups never fail loudly: unknown labels resolve to `None` or `0`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static QUARTER_DIGIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)q([1-4])").expect("valid quarter digit regex"));
static QUARTER_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)q([1-4])-([0-9]{4})$").expect("valid quarter label regex"));
static YEAR_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})$").expect("valid year label regex"));

const QUARTER_TOKENS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

/// Chronological sort key of one period.
///
/// `quarter = None` denotes a whole-year bucket. Field order matters: the
/// derived `Ord` compares `year` first, then `None < Some(_)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    pub quarter: Option<u8>,
}

impl PeriodKey {
    pub fn whole_year(year: i32) -> Self {
        Self {
            year,
            quarter: None,
        }
    }

    pub fn quarter(year: i32, quarter: u8) -> Self {
        Self {
            year,
            quarter: Some(quarter),
        }
    }

    /// Parses canonical labels: `"Q<d>-<yyyy>"` or `"<yyyy>"`.
    pub fn parse(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if let Some(caps) = QUARTER_LABEL_RE.captures(trimmed) {
            let quarter = caps[1].parse::<u8>().ok()?;
            let year = caps[2].parse::<i32>().ok()?;
            return Some(Self::quarter(year, quarter));
        }
        if let Some(caps) = YEAR_LABEL_RE.captures(trimmed) {
            let year = caps[1].parse::<i32>().ok()?;
            return Some(Self::whole_year(year));
        }
        None
    }
}

impl Display for PeriodKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.quarter {
            Some(quarter) => write!(f, "Q{quarter}-{}", self.year),
            None => write!(f, "{}", self.year),
        }
    }
}

/// One entry of the period registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDescriptor {
    /// Stored label, e.g. `Q1-2025`.
    pub value: String,
    /// Display label, e.g. `Q1 2025`.
    pub label: String,
    pub year: i32,
    #[serde(default)]
    pub quarter: Option<u8>,
}

impl PeriodDescriptor {
    pub fn new(key: PeriodKey, label: impl Into<String>) -> Self {
        Self {
            value: key.to_string(),
            label: label.into(),
            year: key.year,
            quarter: key.quarter,
        }
    }

    pub fn key(&self) -> PeriodKey {
        PeriodKey {
            year: self.year,
            quarter: self.quarter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodRegistryError {
    /// Two descriptors share a value or a sort key.
    DuplicatePeriod(String),
    /// Descriptor value is blank.
    BlankValue,
    /// Quarter outside `1..=4`.
    InvalidQuarter { value: String, quarter: u8 },
    /// Canonical value names another year or quarter than the descriptor.
    MismatchedKey(String),
}

impl Display for PeriodRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicatePeriod(value) => write!(f, "duplicate period `{value}`"),
            Self::BlankValue => write!(f, "period value must not be blank"),
            Self::InvalidQuarter { value, quarter } => {
                write!(f, "period `{value}` has invalid quarter {quarter}; expected 1..=4")
            }
            Self::MismatchedKey(value) => {
                write!(f, "period `{value}` does not match its year and quarter")
            }
        }
    }
}

impl Error for PeriodRegistryError {}

/// Inclusive registry positions covered by one project bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSpan {
    pub start: usize,
    pub end: usize,
}

impl PeriodSpan {
    /// Number of periods covered, always >= 1.
    pub fn period_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Ordered, closed set of periods used for timeline positioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodRegistry {
    periods: Vec<PeriodDescriptor>,
}

impl Default for PeriodRegistry {
    /// `2024` as one bucket, then the four quarters of 2025.
    fn default() -> Self {
        let mut periods = vec![PeriodDescriptor::new(PeriodKey::whole_year(2024), "2024")];
        for quarter in 1..=4 {
            periods.push(PeriodDescriptor::new(
                PeriodKey::quarter(2025, quarter),
                format!("Q{quarter} 2025"),
            ));
        }
        Self { periods }
    }
}

impl PeriodRegistry {
    /// Builds a registry from unordered descriptors.
    ///
    /// # Errors
    /// - `BlankValue` / `InvalidQuarter` for malformed descriptors.
    /// - `MismatchedKey` when a canonical value disagrees with year/quarter.
    /// - `DuplicatePeriod` when two descriptors share a value or key.
    pub fn from_descriptors(
        mut periods: Vec<PeriodDescriptor>,
    ) -> Result<Self, PeriodRegistryError> {
        for period in &mut periods {
            period.value = period.value.trim().to_string();
            if period.value.is_empty() {
                return Err(PeriodRegistryError::BlankValue);
            }
            if let Some(quarter) = period.quarter {
                if !(1..=4).contains(&quarter) {
                    return Err(PeriodRegistryError::InvalidQuarter {
                        value: period.value.clone(),
                        quarter,
                    });
                }
            }
            if PeriodKey::parse(&period.value).is_some_and(|parsed| parsed != period.key()) {
                return Err(PeriodRegistryError::MismatchedKey(period.value.clone()));
            }
        }

        periods.sort_by_key(PeriodDescriptor::key);
        for pair in periods.windows(2) {
            if pair[0].key() == pair[1].key() {
                return Err(PeriodRegistryError::DuplicatePeriod(pair[1].value.clone()));
            }
        }
        for (index, period) in periods.iter().enumerate() {
            if periods[..index].iter().any(|other| other.value == period.value) {
                return Err(PeriodRegistryError::DuplicatePeriod(period.value.clone()));
            }
        }

        Ok(Self { periods })
    }

    pub fn periods(&self) -> &[PeriodDescriptor] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Position of `label` on the timeline.
    ///
    /// Returns `None` for blank, malformed or unknown labels; callers treat
    /// that as "cannot be positioned", not as an error.
    pub fn period_index(&self, label: &str) -> Option<usize> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.periods
            .iter()
            .position(|period| period.value == trimmed)
    }

    /// Signed number of registry steps from `from` to `to`.
    pub fn period_offset(&self, from: &str, to: &str) -> Option<i64> {
        let from = self.period_index(from)? as i64;
        let to = self.period_index(to)? as i64;
        Some(to - from)
    }

    /// Timeline span for a start/end pair. An end before the start collapses
    /// to a single-period span at the start.
    pub fn span(&self, start: &str, end: &str) -> Option<PeriodSpan> {
        let start = self.period_index(start)?;
        let end = self.period_index(end)?;
        Some(PeriodSpan {
            start,
            end: end.max(start),
        })
    }
}

/// Extracts the quarter digit following a case-insensitive `Q`.
///
/// Returns `0` when the label carries no quarter (e.g. a bare year).
pub fn quarter_number(label: &str) -> u8 {
    QUARTER_DIGIT_RE
        .captures(label)
        .and_then(|caps| caps[1].parse::<u8>().ok())
        .unwrap_or(0)
}

/// Maps free-form import values onto registry labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodNormalizer {
    /// Year appended to bare quarter tokens.
    pub quarter_year: i32,
    /// Whole-year bucket used for empty values and year mentions.
    pub year_bucket: String,
}

impl Default for PeriodNormalizer {
    fn default() -> Self {
        Self {
            quarter_year: 2025,
            year_bucket: "2024".to_string(),
        }
    }
}

impl PeriodNormalizer {
    /// Normalizes one raw cell value; the first matching rule wins.
    ///
    /// 1. empty -> year bucket
    /// 2. contains `Q1`..`Q4` (in that order) -> `Q<n>-<quarter_year>`
    /// 3. contains the year bucket -> year bucket
    /// 4. hyphenated quarter list -> first `Q` token + `-<quarter_year>`
    /// 5. anything else passes through trimmed
    pub fn normalize(&self, raw: &str) -> String {
        let value = raw.trim();
        if value.is_empty() {
            return self.year_bucket.clone();
        }

        if let Some(token) = QUARTER_TOKENS.iter().find(|token| value.contains(*token)) {
            return format!("{token}-{}", self.quarter_year);
        }

        if value.contains(self.year_bucket.as_str()) {
            return self.year_bucket.clone();
        }

        if value.contains('-') && value.contains('Q') {
            if let Some(first) = value.split('-').map(str::trim).find(|part| part.contains('Q')) {
                return format!("{first}-{}", self.quarter_year);
            }
        }

        value.to_string()
    }
}
