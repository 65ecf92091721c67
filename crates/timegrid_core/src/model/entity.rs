//! Extracted entity model.
//!
//! # Responsibility
//! - Define typed text spans produced by the entity annotator boundary.
//! - Validate span offsets against the parent cell text.
//!
//! # Invariants
//! - `start_char..end_char` are character offsets (not byte offsets).
//! - `parent_text[start_char..end_char] == text` for every accepted entity.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Closed set of labels an annotator may assign to a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Year,
    Month,
    DayOfWeek,
    MonthDay,
    DayMonth,
    Duration,
    DayOfMonth,
    Person,
    Loc,
    Time,
    SpecialDate,
    /// Marks a span that must be dropped before it reaches graph nodes.
    Remove,
    Event,
    /// Generic calendar reference without finer structure.
    Date,
    Day,
}

impl EntityLabel {
    pub const ALL: [EntityLabel; 15] = [
        Self::Year,
        Self::Month,
        Self::DayOfWeek,
        Self::MonthDay,
        Self::DayMonth,
        Self::Duration,
        Self::DayOfMonth,
        Self::Person,
        Self::Loc,
        Self::Time,
        Self::SpecialDate,
        Self::Remove,
        Self::Event,
        Self::Date,
        Self::Day,
    ];

    /// Stable wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::DayOfWeek => "DAY_OF_WEEK",
            Self::MonthDay => "MONTH_DAY",
            Self::DayMonth => "DAY_MONTH",
            Self::Duration => "DURATION",
            Self::DayOfMonth => "DAY_OF_MONTH",
            Self::Person => "PERSON",
            Self::Loc => "LOC",
            Self::Time => "TIME",
            Self::SpecialDate => "SPECIAL_DATE",
            Self::Remove => "REMOVE",
            Self::Event => "EVENT",
            Self::Date => "DATE",
            Self::Day => "DAY",
        }
    }
}

impl Display for EntityLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown label string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabelError(pub String);

impl Display for UnknownLabelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown entity label: `{}`", self.0)
    }
}

impl Error for UnknownLabelError {}

impl FromStr for EntityLabel {
    type Err = UnknownLabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == normalized)
            .ok_or_else(|| UnknownLabelError(normalized.to_string()))
    }
}

/// Span/text mismatch between an entity and its parent text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitySpanError {
    /// Offsets do not describe a range inside the parent text.
    OutOfRange {
        parent_text: String,
        start_char: usize,
        end_char: usize,
        parent_chars: usize,
    },
    /// The parent substring differs from the claimed entity text.
    Mismatch {
        parent_text: String,
        expected: String,
        found: String,
    },
}

impl Display for EntitySpanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange {
                parent_text,
                start_char,
                end_char,
                parent_chars,
            } => write!(
                f,
                "entity span [{start_char}, {end_char}) is outside parent text `{parent_text}` ({parent_chars} chars)"
            ),
            Self::Mismatch {
                parent_text,
                expected,
                found,
            } => write!(
                f,
                "entity text does not match the span in parent text `{parent_text}`: expected `{expected}`, found `{found}`"
            ),
        }
    }
}

impl Error for EntitySpanError {}

/// Typed span over a cell's raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub text: String,
    pub label: EntityLabel,
    pub start_char: usize,
    pub end_char: usize,
}

impl ExtractedEntity {
    /// Creates an entity and validates it against `parent_text`.
    ///
    /// # Errors
    /// - Returns `EntitySpanError` when the span does not reproduce `text`.
    pub fn new(
        parent_text: &str,
        text: impl Into<String>,
        label: EntityLabel,
        start_char: usize,
        end_char: usize,
    ) -> Result<Self, EntitySpanError> {
        let entity = Self::unchecked(text, label, start_char, end_char);
        entity.validate(parent_text)?;
        Ok(entity)
    }

    /// Creates an entity without validation.
    ///
    /// Used when the parent text is not at hand (e.g. deserialized payloads);
    /// callers must run `validate` before trusting the offsets.
    pub fn unchecked(
        text: impl Into<String>,
        label: EntityLabel,
        start_char: usize,
        end_char: usize,
    ) -> Self {
        Self {
            text: text.into(),
            label,
            start_char,
            end_char,
        }
    }

    /// Checks that the span reproduces `text` exactly. Pure; repeatable.
    pub fn validate(&self, parent_text: &str) -> Result<(), EntitySpanError> {
        let parent_chars = parent_text.chars().count();
        let substring = char_slice(parent_text, self.start_char, self.end_char).ok_or_else(|| {
            EntitySpanError::OutOfRange {
                parent_text: parent_text.to_string(),
                start_char: self.start_char,
                end_char: self.end_char,
                parent_chars,
            }
        })?;

        if substring != self.text {
            return Err(EntitySpanError::Mismatch {
                parent_text: parent_text.to_string(),
                expected: self.text.clone(),
                found: substring.to_string(),
            });
        }
        Ok(())
    }

    /// Number of characters covered by the span.
    pub fn char_len(&self) -> usize {
        self.end_char.saturating_sub(self.start_char)
    }
}

/// Slices `text` by character offsets.
///
/// Returns `None` when `start > end` or `end` exceeds the character count.
pub fn char_slice(text: &str, start_char: usize, end_char: usize) -> Option<&str> {
    if start_char > end_char {
        return None;
    }
    let start = char_to_byte(text, start_char)?;
    let end = char_to_byte(text, end_char)?;
    text.get(start..end)
}

fn char_to_byte(text: &str, char_offset: usize) -> Option<usize> {
    if char_offset == 0 {
        return Some(0);
    }
    text.char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .nth(char_offset)
}
