// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Stroomkost.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use tracing::warn;

use stroomkost_types::Reading;

const MAX_REPORTED_GAPS: usize = 10;

/// Advisory sanity checks on a parsed interval series: off-grid timestamps,
/// duplicates outside the DST fall-back window, and missing intervals.
///
/// Warn-only by design: deduplication and gap-filling are out of scope, and
/// duplicated fall-back hours are legitimate data the engine disambiguates
/// itself.
pub fn check_intervals(readings: &[Reading], interval_minutes: u32) {
    if interval_minutes == 0 {
        warn!("interval length of zero minutes; skipping interval checks");
        return;
    }
    if readings.is_empty() {
        warn!("no interval readings found");
        return;
    }

    if let Some(reading) = readings
        .iter()
        .find(|r| r.timestamp.minute() % interval_minutes != 0 || r.timestamp.second() != 0)
    {
        warn!(
            "timestamp {} does not fall on a {interval_minutes}-minute boundary",
            reading.timestamp
        );
    }

    report_duplicates(readings);
    report_gaps(readings, interval_minutes);
}

fn report_duplicates(readings: &[Reading]) {
    let mut counts: BTreeMap<(&str, NaiveDateTime), usize> = BTreeMap::new();
    for reading in readings {
        *counts
            .entry((reading.meter_id.as_deref().unwrap_or(""), reading.timestamp))
            .or_default() += 1;
    }

    let mut reported = 0usize;
    for ((meter, timestamp), count) in counts {
        // The duplicated fall-back hour is expected to appear twice
        if count > 1 && !in_fall_back_window(timestamp) {
            warn!("duplicate interval {timestamp} (meter {meter:?}, {count} rows)");
            reported += 1;
            if reported >= MAX_REPORTED_GAPS {
                break;
            }
        }
    }
}

// Last-Sunday-of-October heuristic, matching the upload validation the web
// flow used: late-October night duplicates are DST, not data errors.
fn in_fall_back_window(timestamp: NaiveDateTime) -> bool {
    timestamp.month() == 10 && timestamp.day() >= 25
}

fn report_gaps(readings: &[Reading], interval_minutes: u32) {
    let seen: BTreeSet<NaiveDateTime> = readings.iter().map(|r| r.timestamp).collect();
    let (Some(first), Some(last)) = (seen.first().copied(), seen.last().copied()) else {
        return;
    };

    let step = Duration::minutes(i64::from(interval_minutes));
    let mut expected = 0usize;
    let mut missing = Vec::new();
    let mut current = first;
    while current <= last {
        expected += 1;
        if !seen.contains(&current) {
            missing.push(current);
        }
        current += step;
    }

    // A mostly-empty grid means sparse data or mixed granularities, not a
    // broken export; stay quiet then
    if missing.len() * 2 > expected {
        return;
    }
    for timestamp in missing.iter().take(MAX_REPORTED_GAPS) {
        warn!("missing interval {timestamp}");
    }
    if missing.len() > MAX_REPORTED_GAPS {
        warn!("... and {} more missing intervals", missing.len() - MAX_REPORTED_GAPS);
    }
}
