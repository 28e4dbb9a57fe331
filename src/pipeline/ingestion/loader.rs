use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::constants;
use crate::error::{PipelineError, Result};
use crate::metrics::LoadMetrics;
use crate::types::{NarrativeField, RawIncident};

/// Where and how to read the registry export
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub path: PathBuf,
    pub delimiter: char,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(constants::DEFAULT_INPUT_FILE),
            delimiter: ';',
        }
    }
}

/// Raw incidents read from one export, in file order
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub source: PathBuf,
    pub records: Vec<RawIncident>,
    /// Identifiers that appeared more than once
    pub duplicate_ids: Vec<String>,
}

/// Read the export at `config.path`.
///
/// A missing required column aborts with [`PipelineError::MissingColumn`];
/// individual cells never fail.
pub fn load_incidents(config: &LoaderConfig) -> Result<LoadedTable> {
    let start_time = Instant::now();
    let file = File::open(&config.path).map_err(|e| with_path(e, &config.path))?;
    let records = read_incidents(file, config.delimiter as u8, &config.path.display().to_string())?;

    let duplicate_ids = find_duplicate_ids(&records);
    if !duplicate_ids.is_empty() {
        warn!(
            "{} report identifiers appear more than once in {}",
            duplicate_ids.len(),
            config.path.display()
        );
        LoadMetrics::record_duplicate_ids(duplicate_ids.len());
    }

    LoadMetrics::record_rows_loaded(records.len());
    LoadMetrics::record_duration(start_time.elapsed().as_secs_f64());
    info!("Loaded {} incident rows from {}", records.len(), config.path.display());

    Ok(LoadedTable {
        source: config.path.clone(),
        records,
        duplicate_ids,
    })
}

/// Parse raw incidents from any reader. `source` only labels errors.
pub fn read_incidents<R: Read>(reader: R, delimiter: u8, source: &str) -> Result<Vec<RawIncident>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.byte_headers()?.clone();
    let columns = ColumnIndex::from_headers(&headers, source)?;

    let mut records = Vec::new();
    for (index, row) in reader.byte_records().enumerate() {
        let row = row?;
        if row.iter().all(|cell| cell.is_empty()) {
            debug!("Skipping empty line {}", index + 2);
            continue;
        }
        records.push(columns.incident(&row, index + 1));
    }
    Ok(records)
}

/// SHA-256 of a file, hex encoded
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| with_path(e, path))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Trimmed cell text, or `None` for blanks and spreadsheet placeholders
pub fn clean_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.to_lowercase().as_str() {
        "nan" | "none" | "null" | "nat" => None,
        _ => Some(trimmed.to_string()),
    }
}

fn with_path(e: io::Error, path: &Path) -> PipelineError {
    PipelineError::Io(io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))
}

/// Registry exports are not consistently UTF-8; fall back to Latin-1.
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

fn find_duplicate_ids(records: &[RawIncident]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for id in records.iter().filter_map(|r| r.id.as_deref()) {
        if !seen.insert(id) && !duplicates.iter().any(|d: &String| d == id) {
            duplicates.push(id.to_string());
        }
    }
    duplicates
}

/// Positions of the required raw columns in the header row
struct ColumnIndex {
    positions: HashMap<&'static str, usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::ByteRecord, source: &str) -> Result<Self> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| decode(h).trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut positions = HashMap::new();
        for column in constants::REQUIRED_RAW_COLUMNS {
            let position = names.iter().position(|name| name == column).ok_or_else(|| {
                PipelineError::MissingColumn {
                    column: column.to_string(),
                    path: source.to_string(),
                }
            })?;
            positions.insert(column, position);
        }

        for name in names
            .iter()
            .filter(|n| !constants::REQUIRED_RAW_COLUMNS.contains(&n.as_str()))
        {
            debug!("Ignoring column '{}'", name);
        }

        Ok(Self { positions })
    }

    fn cell(&self, row: &csv::ByteRecord, column: &str) -> Option<String> {
        let position = *self.positions.get(column)?;
        row.get(position).and_then(|bytes| clean_cell(&decode(bytes)))
    }

    fn incident(&self, row: &csv::ByteRecord, row_number: usize) -> RawIncident {
        let mut incident = RawIncident {
            row: row_number,
            id: self.cell(row, constants::RAW_ID),
            call_date: self.cell(row, constants::RAW_CALL_DATE),
            age: self.cell(row, constants::RAW_AGE),
            sex: self.cell(row, constants::RAW_SEX),
            telephone_cpr: self.cell(row, constants::RAW_TELEPHONE_CPR),
            aed: self.cell(row, constants::RAW_AED),
            bystander_cpr: self.cell(row, constants::RAW_BYSTANDER_CPR),
            c0_c1: self.cell(row, constants::RAW_C0_C1),
            c1_c2: self.cell(row, constants::RAW_C1_C2),
            c2_c3: self.cell(row, constants::RAW_C2_C3),
            c3_c4: self.cell(row, constants::RAW_C3_C4),
            rhythm: self.cell(row, constants::RAW_RHYTHM),
            rosc: self.cell(row, constants::RAW_ROSC),
            cpc: self.cell(row, constants::RAW_CPC),
            unit_type: self.cell(row, constants::RAW_UNIT_TYPE),
            ..Default::default()
        };
        for field in NarrativeField::ALL {
            *incident.narrative.slot_mut(field) = self.cell(row, field.raw_column());
        }
        incident
    }
}
