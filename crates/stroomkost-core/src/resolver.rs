// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Stroomkost.

use std::collections::HashMap;

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use stroomkost_types::{Disambiguation, Reading};

use crate::error::{EngineError, Result};

/// Outcome of mapping a naive local timestamp onto the UTC timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalLookup {
    /// Normal period: exactly one instant
    Unique(DateTime<Utc>),
    /// Duplicated fall-back hour: the clock time occurred twice
    Ambiguous {
        first: DateTime<Utc>,
        second: DateTime<Utc>,
    },
    /// Spring-forward gap: the clock time never occurred
    Nonexistent,
}

/// DST transition rules of a fixed timezone.
///
/// The timezone is an explicit input to the resolver, never an ambient
/// setting, so runs are reproducible across environments and testable with
/// synthetic transition tables.
pub trait LocalTimeRules {
    fn lookup(&self, local: NaiveDateTime) -> LocalLookup;
}

impl LocalTimeRules for Tz {
    fn lookup(&self, local: NaiveDateTime) -> LocalLookup {
        match self.from_local_datetime(&local) {
            LocalResult::Single(instant) => LocalLookup::Unique(instant.with_timezone(&Utc)),
            LocalResult::Ambiguous(first, second) => LocalLookup::Ambiguous {
                first: first.with_timezone(&Utc),
                second: second.with_timezone(&Utc),
            },
            LocalResult::None => LocalLookup::Nonexistent,
        }
    }
}

/// One DST transition: at `at_utc` the UTC offset jumps from
/// `offset_before_secs` to `offset_after_secs`. A growing offset skips local
/// clock time (spring forward); a shrinking one repeats it (fall back).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DstTransition {
    pub at_utc: DateTime<Utc>,
    pub offset_before_secs: i32,
    pub offset_after_secs: i32,
}

/// Explicit transition calendar, as an alternative to a named tzdata zone.
/// Mainly used to make resolver behavior testable without tzdata.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    base_offset_secs: i32,
    transitions: Vec<DstTransition>,
}

impl TransitionTable {
    /// `base_offset_secs` is the UTC offset in effect before the first
    /// transition. Transitions are sorted by instant.
    #[must_use]
    pub fn new(base_offset_secs: i32, mut transitions: Vec<DstTransition>) -> Self {
        transitions.sort_by_key(|t| t.at_utc);
        Self {
            base_offset_secs,
            transitions,
        }
    }
}

impl LocalTimeRules for TransitionTable {
    fn lookup(&self, local: NaiveDateTime) -> LocalLookup {
        // Walk the piecewise-constant offset segments in UTC order; a local
        // time maps to every segment whose offset places it inside that
        // segment. Zero hits = gap, two hits = duplicated hour.
        let mut candidates: Vec<DateTime<Utc>> = Vec::new();
        let mut segment_start = DateTime::<Utc>::MIN_UTC;
        let mut offset = self.base_offset_secs;

        for transition in &self.transitions {
            push_candidate(
                &mut candidates,
                local,
                offset,
                segment_start,
                Some(transition.at_utc),
            );
            segment_start = transition.at_utc;
            offset = transition.offset_after_secs;
        }
        push_candidate(&mut candidates, local, offset, segment_start, None);

        match candidates.as_slice() {
            [] => LocalLookup::Nonexistent,
            [only] => LocalLookup::Unique(*only),
            // Segments are walked chronologically, so the earlier instant
            // comes first
            [first, second, ..] => LocalLookup::Ambiguous {
                first: *first,
                second: *second,
            },
        }
    }
}

fn push_candidate(
    candidates: &mut Vec<DateTime<Utc>>,
    local: NaiveDateTime,
    offset_secs: i32,
    segment_start: DateTime<Utc>,
    segment_end: Option<DateTime<Utc>>,
) {
    let utc = Utc.from_utc_datetime(&(local - Duration::seconds(i64::from(offset_secs))));
    if utc >= segment_start && segment_end.is_none_or(|end| utc < end) {
        candidates.push(utc);
    }
}

/// A reading's local timestamp pinned to the UTC timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedInstant {
    pub utc: DateTime<Utc>,
    pub local: NaiveDateTime,
    pub is_ambiguous: bool,
    pub disambiguation: Disambiguation,
}

/// Classifies each reading's naive local timestamp against the DST rules.
///
/// Duplicated-hour policy: consecutive readings with the same meter and the
/// same ambiguous timestamp, taken in file order, resolve to the first then
/// the second occurrence. This requires same-meter readings to be fed in
/// original file order; distinct meters are independent.
#[derive(Debug)]
pub struct LocalTimeResolver<'a, R: LocalTimeRules> {
    rules: &'a R,
    // (meter id or empty, local timestamp) -> occurrences seen so far
    seen_ambiguous: HashMap<(String, NaiveDateTime), u32>,
}

impl<'a, R: LocalTimeRules> LocalTimeResolver<'a, R> {
    #[must_use]
    pub fn new(rules: &'a R) -> Self {
        Self {
            rules,
            seen_ambiguous: HashMap::new(),
        }
    }

    /// Resolve one reading. `line` is its 1-based position in the input.
    pub fn resolve(&mut self, reading: &Reading, line: usize) -> Result<ResolvedInstant> {
        match self.rules.lookup(reading.timestamp) {
            LocalLookup::Unique(utc) => Ok(ResolvedInstant {
                utc,
                local: reading.timestamp,
                is_ambiguous: false,
                disambiguation: Disambiguation::NotApplicable,
            }),
            LocalLookup::Nonexistent => Err(EngineError::InvalidLocalTime {
                timestamp: reading.timestamp,
                meter_id: reading.meter_id.clone(),
                line,
            }),
            LocalLookup::Ambiguous { first, second } => {
                let key = (
                    reading.meter_id.clone().unwrap_or_default(),
                    reading.timestamp,
                );
                let occurrence = self.seen_ambiguous.entry(key).or_insert(0);
                *occurrence += 1;

                // Only two real instants exist; a third duplicate sticks to
                // the later one (the importer warns about such rows)
                let (utc, disambiguation) = if *occurrence == 1 {
                    (first, Disambiguation::First)
                } else {
                    (second, Disambiguation::Second)
                };
                debug!(
                    "ambiguous local time {} (row {line}) resolved to {} occurrence",
                    reading.timestamp,
                    if *occurrence == 1 { "first" } else { "second" }
                );
                Ok(ResolvedInstant {
                    utc,
                    local: reading.timestamp,
                    is_ambiguous: true,
                    disambiguation,
                })
            }
        }
    }
}
