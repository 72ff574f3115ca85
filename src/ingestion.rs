use crate::error::Result;
use crate::schema::{RawDataset, RawRow, RawValue};
use log::{debug, warn};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Delimiters tried by [`detect_delimiter`]. Spreadsheet exports in
/// comma-decimal locales usually use `;`.
const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Picks the candidate delimiter that splits the header line into the most fields.
/// Ties go to the earlier candidate, so `,` wins over `;` and tab.
pub fn detect_delimiter(header_line: &str) -> u8 {
    CANDIDATE_DELIMITERS
        .iter()
        .copied()
        .enumerate()
        .max_by_key(|(idx, d)| (header_line.bytes().filter(|b| b == d).count(), Reverse(*idx)))
        .map(|(_, d)| d)
        .filter(|d| header_line.as_bytes().contains(d))
        .unwrap_or(b',')
}

/// Makes header names unique. The first occurrence keeps its name and later
/// ones get a `.1`, `.2`, ... suffix, skipping names already taken.
fn dedupe_headers(headers: &csv::StringRecord) -> Vec<String> {
    let mut taken: HashSet<String> = headers.iter().map(|h| h.to_string()).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut columns = Vec::with_capacity(headers.len());

    for header in headers.iter() {
        if seen.insert(header) {
            columns.push(header.to_string());
            continue;
        }

        let mut suffix = 1;
        let mut candidate = format!("{}.{}", header, suffix);
        while taken.contains(&candidate) {
            suffix += 1;
            candidate = format!("{}.{}", header, suffix);
        }
        warn!("Duplicate CSV header '{}' renamed to '{}'", header, candidate);
        taken.insert(candidate.clone());
        columns.push(candidate);
    }

    columns
}

/// Reads a CSV report with a header row into a [`RawDataset`].
///
/// Cells are kept as text; numeric coercion happens during normalization. Short
/// rows are padded with empty cells so every row carries every column, and
/// repeated header names are suffixed so no cell is overwritten.
pub fn read_csv<R: Read>(reader: R, delimiter: u8) -> Result<RawDataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let columns = dedupe_headers(csv_reader.headers()?);

    let mut dataset = RawDataset::new(columns.clone());

    for record in csv_reader.records() {
        let record = record?;
        let row: RawRow = columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let value = record.get(idx).map(RawValue::from).unwrap_or(RawValue::Empty);
                (column.clone(), value)
            })
            .collect();
        dataset.rows.push(row);
    }

    debug!(
        "Read {} rows with {} columns from CSV",
        dataset.len(),
        dataset.columns.len()
    );

    Ok(dataset)
}

/// Reads CSV text, detecting the delimiter from its first line.
pub fn read_csv_str(data: &str) -> Result<RawDataset> {
    let header = data.lines().next().unwrap_or_default();
    read_csv(data.as_bytes(), detect_delimiter(header))
}

pub fn read_csv_path(path: impl AsRef<Path>) -> Result<RawDataset> {
    let path = path.as_ref();
    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;
    debug!("Loading report from {}", path.display());
    read_csv_str(&contents)
}
