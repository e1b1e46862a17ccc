//! Census file loading.
//!
//! Reads the semicolon-delimited DIVIPOLA file into [`Municipality`]
//! records. Any malformed line aborts the whole load; no partial record
//! list is ever returned.

pub mod text;

pub use text::TextCleaner;

use crate::models::Municipality;
use csv::{ByteRecord, ReaderBuilder};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Number of fields every data line must carry.
pub const FIELD_COUNT: usize = 7;

/// Field names in file order, used in error messages.
const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "department_code",
    "department_name",
    "municipality_code",
    "municipality_name",
    "area",
    "urban_population",
    "rural_population",
];

/// Errors that can occur while loading a census file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file is missing or unreadable.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A data line could not be turned into a record.
    #[error("Malformed record at line {line}: {kind}")]
    Parse {
        /// 1-indexed line number in the source, header included.
        line: u64,
        /// What was wrong with the line.
        kind: ParseErrorKind,
    },

    /// The delimited reader itself failed.
    #[error("Delimited data error: {0}")]
    Csv(#[from] csv::Error),
}

/// Reason a single line was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    /// The line has fewer than seven fields. A blank line has none.
    #[error("expected {expected} fields, found {found}", expected = FIELD_COUNT)]
    MissingFields { found: usize },
    /// A numeric field does not parse or is out of range.
    #[error("field '{field}' is not a valid number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    /// Area is zero, negative or not finite.
    #[error("area must be greater than zero, got {value}")]
    InvalidArea { value: f64 },
}

/// Load every municipality from the file at `path`.
pub fn load(path: &Path, cleaner: &TextCleaner) -> Result<Vec<Municipality>, LoadError> {
    info!("Loading census data from {}", path.display());

    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    debug!("Read {} bytes", bytes.len());

    let municipalities = parse_bytes(&bytes, cleaner)?;
    info!("Loaded {} municipalities", municipalities.len());

    Ok(municipalities)
}

/// Parse census data already held in memory.
///
/// The first line is a header and is skipped. A blank line after it is
/// malformed and aborts the load; a trailing line terminator is not.
pub fn parse_bytes(bytes: &[u8], cleaner: &TextCleaner) -> Result<Vec<Municipality>, LoadError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(bytes);

    reader.byte_headers()?;

    let mut municipalities = Vec::new();
    let mut record = ByteRecord::new();
    let mut consumed = reader.position().byte() as usize;

    while reader.read_byte_record(&mut record)? {
        // header is line 1 and a blank line aborts, so lines are contiguous
        let line = municipalities.len() as u64 + 2;
        let end = reader.position().byte() as usize;

        if skipped_blank_line(bytes, consumed, end) {
            return Err(LoadError::Parse {
                line,
                kind: ParseErrorKind::MissingFields { found: 0 },
            });
        }

        municipalities.push(parse_record(&record, line, cleaner)?);
        consumed = end;
    }

    Ok(municipalities)
}

/// Whether the reader dropped an empty line before the record it read
/// from `bytes[start..end]`.
///
/// The reader discards empty lines silently, so they only show up as
/// extra terminator bytes ahead of the record.
fn skipped_blank_line(bytes: &[u8], start: usize, end: usize) -> bool {
    let read = bytes.get(start..end).unwrap_or_default();
    let mut leading = read.iter().take_while(|&&b| b == b'\r' || b == b'\n').count();

    // the `\n` of a CRLF is consumed by the read after its `\r`
    let after_cr = start > 0 && bytes.get(start - 1) == Some(&b'\r');
    if after_cr && read.first() == Some(&b'\n') {
        leading -= 1;
    }

    leading > 0
}

/// Turn one delimited line into a record.
fn parse_record(
    record: &ByteRecord,
    line: u64,
    cleaner: &TextCleaner,
) -> Result<Municipality, LoadError> {
    if record.len() < FIELD_COUNT {
        return Err(LoadError::Parse {
            line,
            kind: ParseErrorKind::MissingFields {
                found: record.len(),
            },
        });
    }

    let fields: Vec<String> = record.iter().take(FIELD_COUNT).map(decode_latin1).collect();

    let area: f64 = parse_number(&fields, 4, line)?;
    if !area.is_finite() || area <= 0.0 {
        return Err(LoadError::Parse {
            line,
            kind: ParseErrorKind::InvalidArea { value: area },
        });
    }

    Ok(Municipality {
        department_code: parse_number(&fields, 0, line)?,
        department_name: cleaner.clean(&fields[1]),
        municipality_code: parse_number(&fields, 2, line)?,
        municipality_name: cleaner.clean(&fields[3]),
        area,
        urban_population: parse_number(&fields, 5, line)?,
        rural_population: parse_number(&fields, 6, line)?,
    })
}

fn parse_number<T: FromStr>(fields: &[String], index: usize, line: u64) -> Result<T, LoadError> {
    let value = text::trim_control(&fields[index]);
    value.parse::<T>().map_err(|_| LoadError::Parse {
        line,
        kind: ParseErrorKind::InvalidNumber {
            field: FIELD_NAMES[index],
            value: value.to_string(),
        },
    })
}

/// Decode ISO-8859-1: every byte is the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    encoding_rs::mem::decode_latin1(bytes).into_owned()
}
