use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::RawIncident;

/// An incident with its structured cells parsed into typed values.
///
/// The raw record is kept alongside so later stages can still read the
/// narrative and echo the original call timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedIncident {
    pub raw: RawIncident,
    /// Parsed `FECHA_LLAMADA`
    pub call_time: Option<NaiveDateTime>,
    pub age: Option<i64>,
    pub sex: Option<String>,
    /// `None` when the cell was blank
    pub telephone_cpr: Option<bool>,
    pub bystander_cpr: Option<bool>,
    pub aed: Option<bool>,
    pub recorded_rosc: Option<bool>,
    /// Recorded CPC when it is a valid 1-5 score
    pub recorded_cpc: Option<u8>,
    /// C0_C1 + C1_C2 + C2_C3 in seconds, `None` when all three are missing
    pub arrival_time: Option<i64>,
    /// C3_C4 in seconds
    pub post_arrest_time: Option<i64>,
    /// Cells that were present but could not be parsed
    pub warnings: Vec<String>,
}

impl NormalizedIncident {
    /// Resuscitation time recorded in the structured columns, 0 when absent
    pub fn prior_cpr_time(&self) -> i64 {
        self.post_arrest_time.filter(|t| *t > 0).unwrap_or(0)
    }
}

/// Converts raw registry cells into typed values
pub trait FieldNormalizer {
    /// Never fails: malformed cells become `None` plus a warning
    fn normalize(&self, record: RawIncident) -> NormalizedIncident;

    fn normalize_all(&self, records: Vec<RawIncident>) -> Vec<NormalizedIncident> {
        records.into_iter().map(|r| self.normalize(r)).collect()
    }
}

/// Default normalizer for the Spanish registry export
#[derive(Debug, Clone, Default)]
pub struct DefaultFieldNormalizer;

impl DefaultFieldNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl FieldNormalizer for DefaultFieldNormalizer {
    fn normalize(&self, record: RawIncident) -> NormalizedIncident {
        let mut warnings = Vec::new();

        let call_time = checked(
            record.call_date.as_deref(),
            parse_call_timestamp,
            "call timestamp",
            &mut warnings,
        );
        let age = checked(record.age.as_deref(), parse_int, "age", &mut warnings);
        let intervals: Vec<Option<i64>> = [&record.c0_c1, &record.c1_c2, &record.c2_c3]
            .into_iter()
            .map(|cell| checked(cell.as_deref(), parse_int, "response interval", &mut warnings))
            .collect();
        let post_arrest_time =
            checked(record.c3_c4.as_deref(), parse_int, "C3_C4 interval", &mut warnings);
        let recorded_cpc = checked(record.cpc.as_deref(), parse_cpc, "CPC", &mut warnings);

        if !warnings.is_empty() {
            debug!("Row {} normalization warnings: {:?}", record.row, warnings);
        }

        NormalizedIncident {
            call_time,
            age,
            sex: record.sex.as_ref().map(|s| s.trim().to_string()),
            telephone_cpr: parse_flag(record.telephone_cpr.as_deref()),
            bystander_cpr: parse_flag(record.bystander_cpr.as_deref()),
            aed: parse_flag(record.aed.as_deref()),
            recorded_rosc: parse_flag(record.rosc.as_deref()),
            recorded_cpc,
            arrival_time: sum_present(&intervals),
            post_arrest_time,
            warnings,
            raw: record,
        }
    }
}

/// Parse a present cell, recording a warning when it does not parse.
fn checked<T>(
    cell: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    label: &str,
    warnings: &mut Vec<String>,
) -> Option<T> {
    let cell = cell?;
    let parsed = parse(cell);
    if parsed.is_none() {
        warnings.push(format!("unparsable {}: '{}'", label, cell));
    }
    parsed
}

/// Locale-aware boolean: `verdadero`, `true`, `si`, `1`, `1.0` are true,
/// any other non-blank value is false, a blank cell is `None`.
pub fn parse_flag(cell: Option<&str>) -> Option<bool> {
    let value = cell?.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    let truthy = matches!(value.as_str(), "verdadero" | "true" | "si" | "sí" | "1")
        || parse_number(&value) == Some(1.0);
    Some(truthy)
}

/// Numeric cell, accepting a comma decimal separator
pub fn parse_number(cell: &str) -> Option<f64> {
    let value = cell.trim().replace(',', ".");
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Largest integer cell accepted: one week, in seconds
pub const MAX_INT_CELL: i64 = 7 * 86_400;

/// Non-negative whole number no larger than [`MAX_INT_CELL`]
pub fn parse_int(cell: &str) -> Option<i64> {
    parse_number(cell)
        .map(f64::round)
        .filter(|v| (0.0..=MAX_INT_CELL as f64).contains(v))
        .map(|v| v as i64)
}

fn parse_cpc(cell: &str) -> Option<u8> {
    parse_int(cell)
        .filter(|v| (1..=5).contains(v))
        .map(|v| v as u8)
}

const TIMESTAMP_FORMATS: [&str; 6] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

/// Call timestamp in any of the export's formats. Date-only values map to midnight.
pub fn parse_call_timestamp(cell: &str) -> Option<NaiveDateTime> {
    let value = cell.trim();
    // Some exports append fractional seconds
    let value = value.split('.').next().unwrap_or(value);

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Sum of the present values; `None` when every value is missing or the sum overflows
pub fn sum_present(values: &[Option<i64>]) -> Option<i64> {
    values
        .iter()
        .flatten()
        .try_fold(None, |acc: Option<i64>, v| acc.unwrap_or(0).checked_add(*v).map(Some))
        .flatten()
}
