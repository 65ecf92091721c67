//! Pattern-based entity annotator.
//!
//! # Responsibility
//! - Recognize date/time vocabulary common in hand-written timetables with
//!   regular expressions.
//! - Resolve competing matches into one ordered, non-overlapping span list.
//!
//! # Invariants
//! - Selection is leftmost-longest; equal spans resolve by rule priority.
//! - A standalone month name is labeled `Date`.
//! - Offsets are character offsets into the input text.

use crate::annotate::EntityAnnotator;
use crate::model::entity::{EntityLabel, ExtractedEntity};
use once_cell::sync::Lazy;
use regex::Regex;

const MONTHS: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";
const DAYS_OF_WEEK: &str =
    "monday|tuesday|wednesday|thursday|friday|saturday|sunday|mondays|weds|thurs|sat";
const TIME_UNITS: &str = "days?|weeks?|months?|years?|hours?|minutes?|seconds?";
const NUMBER_WORDS: &str = r"\d+|one|two|three|four|five|six|seven|eight|nine|ten";
const ORDINAL: &str = "(?:st|nd|rd|th)";

struct PatternRule {
    label: EntityLabel,
    regex: Regex,
}

fn rule(label: EntityLabel, pattern: &str) -> PatternRule {
    PatternRule {
        label,
        regex: Regex::new(pattern).expect("valid builtin timetable regex"),
    }
}

// Listed in priority order.
static BUILTIN_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        rule(EntityLabel::Remove, r"(?i)\bshould\s+be\b"),
        rule(
            EntityLabel::SpecialDate,
            r"(?i)\b(?:the\s+following\s+week|christmas|end\s+of\s+term|end\s+week|launch\s+bachata\s+night)\b",
        ),
        rule(
            EntityLabel::Time,
            r"\b\d{1,2}:\d{2}\s*-\s*\d{1,2}:\d{2}\b",
        ),
        rule(
            EntityLabel::MonthDay,
            &format!(r"(?i)\b(?:then\s+)?(?:{MONTHS})\s+\d{{1,2}}(?:/\d{{1,2}})?{ORDINAL}?\b"),
        ),
        rule(
            EntityLabel::DayMonth,
            &format!(
                r"(?i)\b(?:thurs\s+)?(?:\d{{1,2}}{ORDINAL}?\s+or\s+)?\d{{1,2}}(?:/\d{{1,2}})?\s*{ORDINAL}?\s+(?:of\s+)?(?:{MONTHS})\b"
            ),
        ),
        rule(EntityLabel::DayMonth, r"\b\d{1,2}[A-Z]{3}\b"),
        rule(EntityLabel::Duration, r"(?i)\bterm\s+\d+\b"),
        rule(
            EntityLabel::Duration,
            &format!(r"(?i)\b\d+\s*x\s*\d+\s+(?:{TIME_UNITS})\b"),
        ),
        rule(
            EntityLabel::Duration,
            &format!(r"(?i)\b(?:{NUMBER_WORDS})\s+weeks?(?:\s+off)?\b"),
        ),
        rule(
            EntityLabel::Duration,
            &format!(r"(?i)\b\d{{1,2}}\s+(?:full\s+)?(?:{TIME_UNITS})\b"),
        ),
        rule(
            EntityLabel::DayOfMonth,
            &format!(r"(?i)\b(?:(?:thurs|sat)\s+)?\d{{1,2}}{ORDINAL}(?:\s+(?:thurs|sat))?\b"),
        ),
        rule(EntityLabel::Year, r"\b\d{4}\b"),
        rule(EntityLabel::DayOfWeek, &format!(r"(?i)\b(?:{DAYS_OF_WEEK})\b")),
        rule(EntityLabel::Date, &format!(r"(?i)\b(?:{MONTHS})\b")),
    ]
});

/// Regex-driven `EntityAnnotator`.
pub struct PatternAnnotator {
    extra_rules: Vec<PatternRule>,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    priority: usize,
    label: EntityLabel,
}

impl PatternAnnotator {
    /// Annotator with the builtin vocabulary only.
    pub fn builtin() -> Self {
        Self {
            extra_rules: Vec::new(),
        }
    }

    /// Annotator that also recognizes the given person and location names.
    ///
    /// Names match case-insensitively on word boundaries; whitespace inside a
    /// name matches any run of whitespace.
    ///
    /// # Errors
    /// - Returns `regex::Error` when the combined pattern exceeds regex limits.
    pub fn with_known_entities(
        persons: &[String],
        locations: &[String],
    ) -> Result<Self, regex::Error> {
        let mut extra_rules = Vec::new();
        if let Some(regex) = vocabulary_regex(persons)? {
            extra_rules.push(PatternRule {
                label: EntityLabel::Person,
                regex,
            });
        }
        if let Some(regex) = vocabulary_regex(locations)? {
            extra_rules.push(PatternRule {
                label: EntityLabel::Loc,
                regex,
            });
        }
        Ok(Self { extra_rules })
    }

    fn rules(&self) -> impl Iterator<Item = &PatternRule> + '_ {
        BUILTIN_RULES.iter().chain(self.extra_rules.iter())
    }
}

impl EntityAnnotator for PatternAnnotator {
    fn annotate(&self, text: &str) -> Vec<ExtractedEntity> {
        let mut candidates: Vec<Candidate> = Vec::new();
        for (priority, rule) in self.rules().enumerate() {
            for found in rule.regex.find_iter(text) {
                if found.start() < found.end() {
                    candidates.push(Candidate {
                        start: found.start(),
                        end: found.end(),
                        priority,
                        label: rule.label,
                    });
                }
            }
        }

        candidates.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.end.cmp(&a.end))
                .then(a.priority.cmp(&b.priority))
        });

        let mut selected = Vec::new();
        let mut covered_until = 0usize;
        for candidate in candidates {
            if candidate.start < covered_until {
                continue;
            }
            covered_until = candidate.end;
            let start_char = text[..candidate.start].chars().count();
            let span = &text[candidate.start..candidate.end];
            selected.push(ExtractedEntity::unchecked(
                span,
                candidate.label,
                start_char,
                start_char + span.chars().count(),
            ));
        }
        selected
    }
}

fn vocabulary_regex(words: &[String]) -> Result<Option<Regex>, regex::Error> {
    let alternatives: Vec<String> = words
        .iter()
        .map(|word| word.split_whitespace().map(regex::escape).collect::<Vec<_>>())
        .filter(|parts| !parts.is_empty())
        .map(|parts| parts.join(r"\s+"))
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).map(Some)
}
