//! Row-oriented input and output files shared by all pipelines.

use crate::core::error::{AppError, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// An ordered list of `(column, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatRecord {
    fields: Vec<(String, String)>,
}

impl FlatRecord {
    /// Sets `column`, overwriting in place if it already exists.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(c, v)| (c.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = FlatRecord::default();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

/// One data row of an input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    /// 0-based data row index (the header is not counted).
    pub index: usize,
    pub fields: FlatRecord,
}

impl InputRow {
    /// The raw cell value, or `""` when the column is absent.
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).unwrap_or("")
    }

    /// The trimmed cell value, or `""`.
    pub fn get_trimmed(&self, column: &str) -> &str {
        self.get(column).trim()
    }
}

/// Loads a CSV file with a header row.
///
/// A missing file or a missing required column is fatal: nothing downstream
/// can run without them. Short rows are padded with empty cells.
pub fn load_rows(path: &Path, required_columns: &[&str]) -> Result<Vec<InputRow>> {
    if !path.is_file() {
        return Err(AppError::InputNotFound(path.to_path_buf()));
    }
    tracing::debug!(target: "records", "Opening input file: {}", path.display());

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut missing: Vec<String> = required_columns
        .iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .map(|required| required.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(AppError::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.as_str(), record.get(i).unwrap_or("")))
            .collect();
        rows.push(InputRow { index, fields });
    }

    tracing::info!(target: "records", "Loaded {} rows from '{}'.", rows.len(), path.display());
    Ok(rows)
}

/// Header order: priority columns that occur in any record, then every other
/// column in first-seen order.
fn output_columns(records: &[FlatRecord], priority_columns: &[&str]) -> Vec<String> {
    let mut columns: Vec<String> = priority_columns
        .iter()
        .filter(|p| records.iter().any(|r| r.get(p).is_some()))
        .map(|p| p.to_string())
        .collect();
    let mut seen: HashSet<String> = columns.iter().cloned().collect();
    for record in records {
        for column in record.columns() {
            if seen.insert(column.to_string()) {
                columns.push(column.to_string());
            }
        }
    }
    columns
}

/// Writes records as UTF-8 CSV.
pub fn write_csv(path: &Path, records: &[FlatRecord], priority_columns: &[&str]) -> Result<()> {
    let columns = output_columns(records, priority_columns);
    let mut writer = csv::WriterBuilder::new().from_path(path)?;
    if !columns.is_empty() {
        writer.write_record(&columns)?;
    }
    for record in records {
        writer.write_record(columns.iter().map(|c| record.get(c).unwrap_or("")))?;
    }
    writer.flush()?;
    tracing::info!(target: "records", "Exported {} records to {}", records.len(), path.display());
    Ok(())
}

/// Writes records as a JSON array of objects, keeping column order.
pub fn write_json(path: &Path, records: &[FlatRecord]) -> Result<()> {
    let values: Vec<Value> = records.iter().map(FlatRecord::to_json).collect();
    write_raw_json(path, &values)?;
    tracing::info!(target: "records", "Exported {} records to {}", records.len(), path.display());
    Ok(())
}

/// Dumps arbitrary JSON values (e.g. raw scraping results), pretty-printed.
pub fn write_raw_json(path: &Path, values: &[Value]) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), values)?;
    Ok(())
}

/// `<prefix>_<YYYYmmdd_HHMMSS>.<extension>` in local time, so runs never overwrite each other.
pub fn timestamped_filename(prefix: &str, extension: &str) -> String {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}.{}", prefix, stamp, extension)
}

/// File format of pipeline results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Writes `records` to a fresh timestamped file in `output_dir`, creating the
/// directory if needed, and returns the file's path.
pub fn export(
    output_dir: &Path,
    prefix: &str,
    format: OutputFormat,
    records: &[FlatRecord],
    priority_columns: &[&str],
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(timestamped_filename(prefix, format.extension()));
    match format {
        OutputFormat::Csv => write_csv(&path, records, priority_columns)?,
        OutputFormat::Json => write_json(&path, records)?,
    }
    Ok(path)
}
