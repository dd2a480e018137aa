// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Stroomkost.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use fluvius_csv_importer::{check_intervals, read_readings, read_tariffs};
use stroomkost_core::{ComputeOptions, Strictness, TariffSchedule, compute};

#[derive(Parser)]
#[command(name = "stroomkost")]
#[command(about = "Backtest Fluvius interval readings against a tariff schedule", long_about = None)]
struct Cli {
    /// Path to the Fluvius interval export (CSV or XLSX)
    #[arg(short, long)]
    readings: PathBuf,

    /// Tariff rules CSV; omit to use the built-in dual-rate schedule
    #[arg(short, long)]
    tariffs: Option<PathBuf>,

    /// Timezone the export's local timestamps belong to
    #[arg(long, default_value = "Europe/Brussels")]
    timezone: String,

    /// Abort on the first bad reading, or skip-and-count it
    #[arg(long, value_enum, default_value_t = StrictnessArg::FailFast)]
    strictness: StrictnessArg,

    /// Flat reference price (EUR/kWh) to compare the schedule against
    #[arg(long)]
    reference_price: Option<Decimal>,

    /// Peak price (EUR/kWh) for the built-in dual-rate schedule
    #[arg(long, default_value = "0.28")]
    peak_price: Decimal,

    /// Off-peak price (EUR/kWh) for the built-in dual-rate schedule
    #[arg(long, default_value = "0.18")]
    offpeak_price: Decimal,

    /// Per-kWh surcharge added to both built-in rates
    #[arg(long, default_value = "0.02")]
    surcharge: Decimal,

    /// Expected interval length in minutes, for the data sanity checks
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u32).range(1..))]
    interval: u32,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrictnessArg {
    FailFast,
    BestEffort,
}

impl From<StrictnessArg> for Strictness {
    fn from(arg: StrictnessArg) -> Self {
        match arg {
            StrictnessArg::FailFast => Self::FailFast,
            StrictnessArg::BestEffort => Self::BestEffort,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing with env filter support
    // Respects RUST_LOG environment variable
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    let timezone: Tz = cli
        .timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown timezone {:?}", cli.timezone))?;

    let readings = read_readings(&cli.readings)
        .with_context(|| format!("failed to import {}", cli.readings.display()))?;
    check_intervals(&readings, cli.interval);

    let schedule = match &cli.tariffs {
        Some(path) => {
            let rules = read_tariffs(path)
                .with_context(|| format!("failed to import tariffs {}", path.display()))?;
            if rules.is_empty() {
                bail!("tariff file {} contains no rules", path.display());
            }
            TariffSchedule::new(rules)
        }
        None => {
            info!(
                "no tariff file given; using dual-rate schedule: peak {} + {}, off-peak {} + {}",
                cli.peak_price, cli.surcharge, cli.offpeak_price, cli.surcharge
            );
            TariffSchedule::dual_rate(cli.peak_price, cli.offpeak_price, cli.surcharge)
        }
    };

    info!(
        "computing costs for {} readings over {} tariff rules ({})",
        readings.len(),
        schedule.len(),
        timezone
    );

    let options = ComputeOptions {
        strictness: cli.strictness.into(),
        reference_price_eur_per_kwh: cli.reference_price,
    };
    let report = compute(&readings, &schedule, &timezone, &options)
        .map_err(|err| anyhow::anyhow!("{err}"))?;

    if report.metadata.readings_skipped > 0 {
        info!(
            "{} of {} readings skipped; see report metadata",
            report.metadata.readings_skipped, report.metadata.readings_total
        );
    }

    // Money is rounded once, here, at presentation
    let presentation = report.rounded(2);
    let json = if cli.pretty {
        serde_json::to_string_pretty(&presentation)?
    } else {
        serde_json::to_string(&presentation)?
    };
    println!("{json}");

    Ok(())
}
