// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Stroomkost.

//! End-to-end tests for the compute pipeline: DST handling, strictness
//! modes, aggregation invariants, and report determinism.

use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use stroomkost_core::{ComputeOptions, EngineError, Strictness, TariffSchedule, compute};
use stroomkost_types::{Reading, TariffRule, TariffType, TimeClass};

fn brussels() -> Tz {
    "Europe/Brussels".parse().expect("known timezone")
}

fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .expect("valid date")
        .and_hms_opt(h, mi, 0)
        .expect("valid time")
}

fn schedule_2024() -> TariffSchedule {
    TariffSchedule::new(vec![
        TariffRule {
            tariff_type: TariffType::Afname,
            valid_from: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            valid_to: NaiveDate::from_ymd_opt(2024, 6, 30),
            price_eur_per_kwh: dec!(0.32),
            time_class: TimeClass::Any,
        },
        TariffRule {
            tariff_type: TariffType::Afname,
            valid_from: NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid date"),
            valid_to: None,
            price_eur_per_kwh: dec!(0.35),
            time_class: TimeClass::Any,
        },
        TariffRule {
            tariff_type: TariffType::Injectie,
            valid_from: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            valid_to: None,
            price_eur_per_kwh: dec!(0.04),
            time_class: TimeClass::Any,
        },
    ])
}

#[test]
fn test_empty_input_yields_zero_report() {
    let report = compute(
        &[],
        &schedule_2024(),
        &brussels(),
        &ComputeOptions::default(),
    )
    .expect("empty run succeeds");

    assert_eq!(report.total.net_cost_eur, Decimal::ZERO);
    assert!(report.monthly.is_empty());
    assert_eq!(report.peak.net_cost_eur, Decimal::ZERO);
    assert_eq!(report.off_peak.net_cost_eur, Decimal::ZERO);
    assert_eq!(report.metadata.readings_total, 0);
    assert_eq!(report.metadata.first_date, None);
}

#[test]
fn test_validity_boundary_prices() {
    let readings = vec![
        Reading::afname(local(2024, 6, 30, 12, 0), dec!(1)),
        Reading::afname(local(2024, 7, 1, 12, 0), dec!(1)),
    ];

    let report = compute(
        &readings,
        &schedule_2024(),
        &brussels(),
        &ComputeOptions::default(),
    )
    .expect("run succeeds");

    assert_eq!(report.monthly["2024-06"].net_cost_eur, dec!(0.32));
    assert_eq!(report.monthly["2024-07"].net_cost_eur, dec!(0.35));
    assert_eq!(report.total.net_cost_eur, dec!(0.67));
}

#[test]
fn test_partition_roundtrip_and_idempotence() {
    let mut readings = Vec::new();
    // Two full days of quarter-hours across a month boundary, mixed flows
    for day in [30, 1] {
        let month = if day == 30 { 6 } else { 7 };
        for quarter in 0..96u32 {
            let h = quarter / 4;
            let m = (quarter % 4) * 15;
            readings.push(Reading {
                timestamp: local(2024, month, day, h, m),
                afname_kwh: dec!(0.213),
                injectie_kwh: dec!(0.050),
                meter_id: Some("541448860000000001".to_owned()),
            });
        }
    }

    let options = ComputeOptions {
        strictness: Strictness::FailFast,
        reference_price_eur_per_kwh: Some(dec!(0.30)),
    };
    let report = compute(&readings, &schedule_2024(), &brussels(), &options)
        .expect("run succeeds");

    let monthly_sum: Decimal = report.monthly.values().map(|s| s.net_cost_eur).sum();
    assert_eq!(monthly_sum, report.total.net_cost_eur);
    assert_eq!(
        report.peak.net_cost_eur + report.off_peak.net_cost_eur,
        report.total.net_cost_eur
    );
    assert_eq!(
        report.peak.afname_kwh + report.off_peak.afname_kwh,
        report.total.afname_kwh
    );

    // 15 peak hours of 24 per day
    assert_eq!(report.peak.afname_kwh, dec!(0.213) * dec!(120));
    assert_eq!(report.off_peak.afname_kwh, dec!(0.213) * dec!(72));

    // Bit-identical on a second run over the same inputs
    let again = compute(&readings, &schedule_2024(), &brussels(), &options)
        .expect("run succeeds");
    assert_eq!(report, again);
    assert_eq!(
        serde_json::to_string(&report).expect("serializes"),
        serde_json::to_string(&again).expect("serializes")
    );
}

#[test]
fn test_fall_back_duplicates_are_distinct_intervals() {
    let ts = local(2024, 10, 27, 2, 30);
    let readings = vec![
        Reading::afname(ts, dec!(0.200)).with_meter("m1"),
        Reading::afname(ts, dec!(0.300)).with_meter("m1"),
    ];

    let report = compute(
        &readings,
        &schedule_2024(),
        &brussels(),
        &ComputeOptions::default(),
    )
    .expect("run succeeds");

    assert_eq!(report.metadata.readings_costed, 2);
    assert_eq!(report.metadata.ambiguous_count, 2);
    assert_eq!(report.total.afname_kwh, dec!(0.500));
    // Both intervals priced at the open-ended 0.35 rule
    assert_eq!(report.total.net_cost_eur, dec!(0.500) * dec!(0.35));
}

#[test]
fn test_spring_forward_fails_fast() {
    let readings = vec![
        Reading::afname(local(2024, 3, 31, 1, 45), dec!(0.25)),
        Reading::afname(local(2024, 3, 31, 2, 30), dec!(0.25)),
    ];

    let err = compute(
        &readings,
        &schedule_2024(),
        &brussels(),
        &ComputeOptions::default(),
    )
    .expect_err("gap time aborts");

    match err {
        EngineError::InvalidLocalTime { timestamp, line, .. } => {
            assert_eq!(timestamp, local(2024, 3, 31, 2, 30));
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_spring_forward_skipped_under_best_effort() {
    let readings = vec![
        Reading::afname(local(2024, 3, 31, 1, 45), dec!(0.25)),
        Reading::afname(local(2024, 3, 31, 2, 30), dec!(0.25)),
        Reading::afname(local(2024, 3, 31, 3, 15), dec!(0.25)),
    ];
    let options = ComputeOptions {
        strictness: Strictness::BestEffort,
        reference_price_eur_per_kwh: None,
    };

    let report = compute(&readings, &schedule_2024(), &brussels(), &options)
        .expect("run continues");

    assert_eq!(report.metadata.readings_total, 3);
    assert_eq!(report.metadata.readings_costed, 2);
    assert_eq!(report.metadata.readings_skipped, 1);
    assert_eq!(report.metadata.skipped.len(), 1);
    assert_eq!(report.metadata.skipped[0].line, 2);
    assert_eq!(report.metadata.skipped[0].timestamp, local(2024, 3, 31, 2, 30));
    // The skipped quarter contributes nothing
    assert_eq!(report.total.afname_kwh, dec!(0.50));
}

#[test]
fn test_missing_coverage_names_the_triple() {
    let readings = vec![Reading::afname(local(2023, 11, 5, 12, 0), dec!(0.25))];

    let err = compute(
        &readings,
        &schedule_2024(),
        &brussels(),
        &ComputeOptions::default(),
    )
    .expect_err("no rule covers 2023");

    match err {
        EngineError::NoTariffMatch {
            tariff_type,
            date,
            time_class,
            ..
        } => {
            assert_eq!(tariff_type, TariffType::Afname);
            assert_eq!(date, NaiveDate::from_ymd_opt(2023, 11, 5).expect("valid date"));
            assert_eq!(time_class, TimeClass::Peak);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_injection_credited_in_net_cost() {
    let readings = vec![Reading {
        timestamp: local(2024, 8, 10, 13, 0),
        afname_kwh: dec!(0.100),
        injectie_kwh: dec!(0.400),
        meter_id: None,
    }];

    let report = compute(
        &readings,
        &schedule_2024(),
        &brussels(),
        &ComputeOptions::default(),
    )
    .expect("run succeeds");

    // 0.100 * 0.35 - 0.400 * 0.04 = 0.019
    assert_eq!(report.total.net_cost_eur, dec!(0.019));
    assert_eq!(report.total.injectie_kwh, dec!(0.400));
}

#[test]
fn test_skipped_ambiguous_readings_not_counted() {
    // Fall-back pair outside the schedule's coverage: both readings resolve
    // as ambiguous but fail tariff lookup and get skipped
    let ts = local(2025, 10, 26, 2, 30);
    let schedule = TariffSchedule::new(vec![TariffRule {
        tariff_type: TariffType::Afname,
        valid_from: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
        valid_to: NaiveDate::from_ymd_opt(2024, 12, 31),
        price_eur_per_kwh: dec!(0.32),
        time_class: TimeClass::Any,
    }]);
    let readings = vec![
        Reading::afname(ts, dec!(0.2)).with_meter("m1"),
        Reading::afname(ts, dec!(0.3)).with_meter("m1"),
    ];
    let options = ComputeOptions {
        strictness: Strictness::BestEffort,
        reference_price_eur_per_kwh: None,
    };

    let report = compute(&readings, &schedule, &brussels(), &options)
        .expect("run continues");

    assert_eq!(report.metadata.readings_costed, 0);
    assert_eq!(report.metadata.readings_skipped, 2);
    assert_eq!(report.metadata.ambiguous_count, 0);
}

#[test]
fn test_disambiguation_visible_in_best_effort_run() {
    // Fall-back pair for one meter, normal reading for another
    let ts = local(2024, 10, 27, 2, 30);
    let readings = vec![
        Reading::afname(ts, dec!(0.2)).with_meter("m1"),
        Reading::afname(local(2024, 10, 27, 12, 0), dec!(0.2)).with_meter("m2"),
        Reading::afname(ts, dec!(0.2)).with_meter("m1"),
    ];
    let options = ComputeOptions {
        strictness: Strictness::BestEffort,
        reference_price_eur_per_kwh: None,
    };

    let report = compute(&readings, &schedule_2024(), &brussels(), &options)
        .expect("run succeeds");

    assert_eq!(report.metadata.ambiguous_count, 2);
    assert_eq!(report.metadata.readings_costed, 3);
    assert_eq!(report.metadata.readings_skipped, 0);
    assert_eq!(report.total.afname_kwh, dec!(0.6));
}
