// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Stroomkost.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use tracing::info;

use stroomkost_types::Reading;

// Header candidates as they appear in Fluvius exports (Dutch) and in
// generic tool output. Matched case-insensitively.
const TIMESTAMP_HEADERS: &[&str] = &["timestamp", "tijdstip"];
const DATE_HEADERS: &[&str] = &["van (datum)", "datum"];
const TIME_HEADERS: &[&str] = &["van (tijdstip)", "tijd", "uur"];
const VALUE_HEADERS: &[&str] = &[
    "afname_kwh",
    "waarde",
    "value",
    "kwh",
    "verbruik",
    "afname",
    "volume",
];
const METER_HEADERS: &[&str] = &["ean", "ean-code", "meter", "meetpunt"];
const REGISTER_HEADERS: &[&str] = &["register"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

/// Read interval readings from a Fluvius export, dispatching on the file
/// extension (CSV or Excel). Rows are kept in file order; readings carry
/// naive local timestamps.
pub fn read_readings(path: &Path) -> Result<Vec<Reading>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let readings = match extension.as_str() {
        "csv" | "txt" => read_csv(path)?,
        "xlsx" | "xlsm" => read_xlsx(path)?,
        other => bail!(
            "unsupported export format {:?}: only CSV and Excel (.xlsx) are supported",
            other
        ),
    };

    info!("parsed {} readings from {}", readings.len(), path.display());
    Ok(readings)
}

/// Detected column positions within an export header row.
#[derive(Debug)]
struct Columns {
    timestamp: Option<usize>,
    date: Option<usize>,
    time: Option<usize>,
    value: usize,
    meter: Option<usize>,
    register: Option<usize>,
}

impl Columns {
    fn detect(header: &[String]) -> Result<Self> {
        let find = |candidates: &[&str]| {
            header
                .iter()
                .position(|name| candidates.iter().any(|c| name.eq_ignore_ascii_case(c)))
        };

        let timestamp = find(TIMESTAMP_HEADERS);
        let date = find(DATE_HEADERS);
        let time = find(TIME_HEADERS);
        let value = find(VALUE_HEADERS);
        let meter = find(METER_HEADERS);
        let register = find(REGISTER_HEADERS);

        let Some(value) = value else {
            bail!("export is missing a value column (expected one of {VALUE_HEADERS:?})");
        };
        if timestamp.is_none() && (date.is_none() || time.is_none()) {
            bail!("export is missing timestamp columns (expected timestamp or date+time)");
        }

        Ok(Self {
            timestamp,
            date,
            time,
            value,
            meter,
            register,
        })
    }
}

fn read_csv(path: &Path) -> Result<Vec<Reading>> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read export file {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    // Fluvius CSV exports often start with a UTF-8 BOM
    let text = text.trim_start_matches('\u{feff}');

    // Semicolon is the common Fluvius dialect; fall back to comma
    let delimiter = detect_delimiter(text);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let header: Vec<String> = reader
        .headers()
        .context("failed to read CSV header")?
        .iter()
        .map(|name| name.trim().to_owned())
        .collect();
    let columns = Columns::detect(&header)?;

    let mut readings = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row = index + 2; // header occupies row 1
        let record = result.with_context(|| format!("failed to read CSV record at row {row}"))?;
        let cells: Vec<String> = record.iter().map(|cell| cell.trim().to_owned()).collect();
        if let Some(reading) = reading_from_cells(&cells, &columns, row)? {
            readings.push(reading);
        }
    }

    Ok(readings)
}

fn detect_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.contains(';') { b';' } else { b',' }
}

fn read_xlsx(path: &Path) -> Result<Vec<Reading>> {
    let mut workbook: Xlsx<_> = calamine::open_workbook(path)
        .with_context(|| format!("failed to open Excel workbook {}", path.display()))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let Some(first_sheet) = sheet_names.first() else {
        bail!("Excel workbook contains no sheets");
    };
    let range = workbook
        .worksheet_range(first_sheet)
        .context("failed to read worksheet")?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        bail!("Excel sheet contains no data");
    };
    let header: Vec<String> = header_row.iter().map(cell_to_string).collect();
    let columns = Columns::detect(&header)?;

    let mut readings = Vec::new();
    for (index, data_row) in rows.enumerate() {
        let row = index + 2;
        let cells: Vec<String> = data_row.iter().map(cell_to_string).collect();
        if let Some(reading) = reading_from_cells(&cells, &columns, row)? {
            readings.push(reading);
        }
    }

    Ok(readings)
}

fn reading_from_cells(cells: &[String], columns: &Columns, row: usize) -> Result<Option<Reading>> {
    let raw_value = cell(cells, Some(columns.value));
    if raw_value.is_empty() {
        // Trailing blank rows and not-yet-validated intervals are common
        return Ok(None);
    }
    let value = parse_decimal(raw_value)
        .with_context(|| format!("invalid value {raw_value:?} at row {row}"))?;
    // Interval quantities are volumes per direction and cannot go below zero
    if value < Decimal::ZERO {
        bail!("negative energy quantity {raw_value:?} at row {row}");
    }

    let timestamp = if let Some(idx) = columns.timestamp {
        let raw = cell(cells, Some(idx));
        parse_local_datetime(raw)
            .with_context(|| format!("invalid timestamp {raw:?} at row {row}"))?
    } else {
        let date_raw = cell(cells, columns.date);
        let time_raw = cell(cells, columns.time);
        let combined = format!("{date_raw} {time_raw}");
        parse_local_datetime(&combined)
            .with_context(|| format!("invalid date/time {combined:?} at row {row}"))?
    };

    // The Register column distinguishes consumption from injection rows
    // ("Afname Dag", "Injectie Nacht", ...). Without one, rows are afname.
    let register = cell(cells, columns.register).to_ascii_lowercase();
    let mut reading = if register.contains("injectie") {
        Reading::injectie(timestamp, value)
    } else {
        Reading::afname(timestamp, value)
    };

    let meter = cell(cells, columns.meter);
    if !meter.is_empty() {
        reading.meter_id = Some(meter.to_owned());
    }

    Ok(Some(reading))
}

fn cell(cells: &[String], index: Option<usize>) -> &str {
    index
        .and_then(|idx| cells.get(idx))
        .map_or("", |value| value.as_str())
}

fn cell_to_string(data: &Data) -> String {
    match data {
        Data::String(s) => s.trim().to_owned(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_owned(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Excel stores datetimes as days since 1899-12-30.
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    #[expect(
        clippy::cast_possible_truncation,
        reason = "export datetimes stay far below the i64 second range"
    )]
    let seconds = (serial * 86_400.0).round() as i64;
    Some(base + Duration::seconds(seconds))
}

fn parse_local_datetime(raw: &str) -> Result<NaiveDateTime> {
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }
    bail!("unrecognised datetime format")
}

/// Fluvius exports use a decimal comma and occasionally thousands spaces.
fn parse_decimal(raw: &str) -> Result<Decimal> {
    let cleaned = raw.replace(' ', "").replace(',', ".");
    cleaned
        .parse::<Decimal>()
        .with_context(|| format!("not a number: {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn test_fluvius_semicolon_export() {
        let file = csv_file(
            "Van (datum);Van (tijdstip);EAN-code;Register;Volume\n\
             01/06/2024;00:00;541448860000000001;Afname Nacht;0,213\n\
             01/06/2024;00:15;541448860000000001;Afname Nacht;0,198\n\
             01/06/2024;00:15;541448860000000001;Injectie Nacht;0,050\n",
        );

        let readings = read_readings(file.path()).expect("parses");
        assert_eq!(readings.len(), 3);

        assert_eq!(
            readings[0].timestamp,
            NaiveDate::from_ymd_opt(2024, 6, 1)
                .expect("valid date")
                .and_hms_opt(0, 0, 0)
                .expect("valid time")
        );
        assert_eq!(readings[0].afname_kwh, dec!(0.213));
        assert_eq!(readings[0].injectie_kwh, Decimal::ZERO);
        assert_eq!(readings[0].meter_id.as_deref(), Some("541448860000000001"));

        // Injectie register rows route into injectie_kwh
        assert_eq!(readings[2].afname_kwh, Decimal::ZERO);
        assert_eq!(readings[2].injectie_kwh, dec!(0.050));
    }

    #[test]
    fn test_generic_comma_export_with_iso_timestamps() {
        let file = csv_file(
            "timestamp,value\n\
             2024-06-01T00:00:00,0.213\n\
             2024-06-01T00:15:00,0.198\n",
        );

        let readings = read_readings(file.path()).expect("parses");
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[1].afname_kwh, dec!(0.198));
        assert_eq!(readings[1].meter_id, None);
    }

    #[test]
    fn test_bom_and_blank_rows_tolerated() {
        let file = csv_file(
            "\u{feff}tijdstip;waarde\n\
             2024-06-01 00:00;1,5\n\
             2024-06-01 00:15;\n",
        );

        let readings = read_readings(file.path()).expect("parses");
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].afname_kwh, dec!(1.5));
    }

    #[test]
    fn test_missing_value_column_is_rejected() {
        let file = csv_file("tijdstip;iets\n2024-06-01 00:00;x\n");
        let err = read_readings(file.path()).expect_err("no value column");
        assert!(err.to_string().contains("value column"));
    }

    #[test]
    fn test_negative_value_names_the_row() {
        let file = csv_file(
            "tijdstip;waarde\n\
             2024-06-01 00:00;0,213\n\
             2024-06-01 00:15;-0,213\n",
        );
        let err = read_readings(file.path()).expect_err("negative quantity");
        assert!(format!("{err:#}").contains("negative energy quantity"));
        assert!(format!("{err:#}").contains("row 3"));
    }

    #[test]
    fn test_invalid_timestamp_names_the_row() {
        let file = csv_file("tijdstip;waarde\nnot-a-date;1,0\n");
        let err = read_readings(file.path()).expect_err("bad timestamp");
        assert!(format!("{err:#}").contains("row 2"));
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let mut file = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()
            .expect("temp file");
        file.write_all(b"whatever").expect("write");
        let err = read_readings(file.path()).expect_err("unsupported");
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn test_datetime_fallback_formats() {
        for raw in [
            "2024-06-01T00:15:00",
            "2024-06-01 00:15",
            "01/06/2024 00:15",
            "01-06-2024 00:15:00",
        ] {
            let parsed = parse_local_datetime(raw).expect("parses");
            assert_eq!(
                parsed,
                NaiveDate::from_ymd_opt(2024, 6, 1)
                    .expect("valid date")
                    .and_hms_opt(0, 15, 0)
                    .expect("valid time"),
                "format {raw:?}"
            );
        }
    }

    #[test]
    fn test_decimal_comma_and_spaces() {
        assert_eq!(parse_decimal("0,213").expect("parses"), dec!(0.213));
        assert_eq!(parse_decimal("1 234,5").expect("parses"), dec!(1234.5));
        assert!(parse_decimal("n/a").is_err());
    }
}
