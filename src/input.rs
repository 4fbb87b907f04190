//! Reads sales transactions from CSV files.
//!
//! Every line is `transaction_id,product_id,category,price,quantity`. Header
//! lines (starting with `transaction_id`, in any case) and blank lines are
//! skipped; lines that fail to parse are dropped with a warning.

use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use glob::{glob_with, MatchOptions, Pattern};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::SalesRecord;

const HEADER_PREFIX: &str = "transaction_id";
const FIELD_COUNT: usize = 5;

/// Records read from one or more files, plus how many lines were rejected.
#[derive(Debug, Default)]
pub struct Ingested {
    pub records: Vec<SalesRecord>,
    pub rejected: usize,
}

impl Ingested {
    fn absorb(&mut self, other: Ingested) {
        self.records.extend(other.records);
        self.rejected += other.rejected;
    }
}

/// Parses one CSV line.
///
/// Returns `Ok(None)` for header and blank lines.
pub fn parse_line(line: &str) -> Result<Option<SalesRecord>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.to_lowercase().starts_with(HEADER_PREFIX) {
        return Ok(None);
    }

    let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    if fields.len() < FIELD_COUNT {
        return Err(Error::invalid(format!(
            "expected {FIELD_COUNT} columns, got {}",
            fields.len()
        )));
    }

    let transaction_id = parse_field::<i64>(fields[0], "transaction_id")?;
    let product_id = parse_field::<i64>(fields[1], "product_id")?;
    let category = fields[2];
    if category.is_empty() {
        return Err(Error::invalid("category column is empty"));
    }
    let price = parse_price(fields[3])?;
    let quantity = parse_field::<i32>(fields[4], "quantity")?;

    SalesRecord::new(transaction_id, product_id, category, price, quantity).map(Some)
}

/// Parses a price exactly; input that would need rounding is rejected.
fn parse_price(raw: &str) -> Result<Decimal> {
    if raw.contains('_') {
        return Err(Error::invalid(format!("price `{raw}`: digit separators are not allowed")));
    }
    let parsed = match raw.split_once(['e', 'E']) {
        Some((base, _)) => Decimal::from_str_exact(base).and_then(|_| Decimal::from_scientific(raw)),
        None => Decimal::from_str_exact(raw),
    };
    parsed.map_err(|e| Error::invalid(format!("price `{raw}`: {e}")))
}

fn parse_field<T>(raw: &str, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| Error::invalid(format!("{name} `{raw}`: {e}")))
}

/// Reads every line of `reader`, keeping the records that parse.
pub fn read_records(reader: impl BufRead, source: &str) -> Result<Ingested> {
    let mut ingested = Ingested::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_line(&line) {
            Ok(Some(record)) => ingested.records.push(record),
            Ok(None) => {}
            Err(err) => {
                warn!(source, line_no = idx + 1, line = line.trim(), reason = %err, "failed to parse CSV line");
                ingested.rejected += 1;
            }
        }
    }
    Ok(ingested)
}

pub fn read_file(path: impl AsRef<Path>) -> Result<Ingested> {
    let path = path.as_ref();
    info!(path = %path.display(), "reading CSV file");
    let file = fs::File::open(path)?;
    read_records(BufReader::new(file), &path.display().to_string())
}

/// Lists the `.csv` files (extension matched case-insensitively) directly
/// inside `dir`, in lexicographic order.
pub fn list_csv_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    ensure_directory(dir)?;

    let pattern = format!("{}/*.csv", Pattern::escape(&dir.to_string_lossy()));
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let mut files = Vec::new();
    for entry in glob_with(&pattern, options).map_err(|e| Error::config(format!("bad input path: {e}")))? {
        let path = entry.map_err(|e| e.into_error())?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads every `.csv` file directly inside `dir`.
///
/// Fails if `dir` does not exist or is not a directory; an empty directory
/// yields no records.
pub fn read_all_from_directory(dir: impl AsRef<Path>) -> Result<Ingested> {
    let mut ingested = Ingested::default();
    for path in list_csv_files(dir)? {
        ingested.absorb(read_file(&path)?);
    }
    Ok(ingested)
}

/// Reads `0.csv`, `1.csv`, ... `(count - 1).csv` from `dir`. A missing file is
/// an error.
pub fn read_numbered_files(dir: impl AsRef<Path>, count: usize) -> Result<Ingested> {
    let dir = dir.as_ref();
    ensure_directory(dir)?;

    let mut ingested = Ingested::default();
    for i in 0..count {
        ingested.absorb(read_file(dir.join(format!("{i}.csv")))?);
    }
    Ok(ingested)
}

fn ensure_directory(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("directory does not exist: {}", dir.display()),
        )));
    }
    if !dir.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path is not a directory: {}", dir.display()),
        )));
    }
    Ok(())
}
