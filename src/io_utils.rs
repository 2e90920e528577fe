//! File and stream I/O for the command-line layer.
//!
//! The engine modules work on in-memory text only; everything that touches
//! the filesystem or standard streams goes through here:
//!
//! - **Delimiter resolution**: `.tsv` → tab, anything else → comma, with
//!   manual override support.
//! - **Encoding**: input decoding and output transcoding via `encoding_rs`,
//!   defaulting to UTF-8.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fs,
    io::{self, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

use crate::codec::{self, Format, Import, ParseOptions};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_delimiter(path: Option<&Path>, provided: Option<u8>) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    match path.and_then(|p| p.extension()).and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    }
}

pub fn resolve_format(path: Option<&Path>, provided: Option<Format>, fallback: Format) -> Format {
    provided
        .or_else(|| path.filter(|p| !is_dash(p)).map(Format::from_path))
        .unwrap_or(fallback)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn read_text(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let mut bytes = Vec::new();
    if is_dash(path) {
        io::stdin()
            .lock()
            .read_to_end(&mut bytes)
            .context("Reading standard input")?;
    } else {
        bytes = fs::read(path).with_context(|| format!("Opening input file {path:?}"))?;
    }
    decode_bytes(&bytes, encoding).with_context(|| format!("Decoding {path:?}"))
}

pub fn write_text(path: Option<&Path>, text: &str, encoding: &'static Encoding) -> Result<()> {
    let encoded = if encoding == UTF_8 {
        std::borrow::Cow::Borrowed(text.as_bytes())
    } else {
        let (encoded, _, had_errors) = encoding.encode(text);
        if had_errors {
            return Err(anyhow!("Failed to encode text using {}", encoding.name()));
        }
        encoded
    };
    match path {
        Some(p) if !is_dash(p) => {
            fs::write(p, encoded.as_ref()).with_context(|| format!("Creating output file {p:?}"))
        }
        _ => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(encoded.as_ref())
                .context("Writing to standard output")?;
            stdout.flush().context("Flushing standard output")
        }
    }
}

/// Display name for a dataset loaded from `path`.
pub fn dataset_name(path: &Path) -> String {
    if is_dash(path) {
        return "stdin".to_string();
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// Reads, decodes and parses one input file.
pub fn load_dataset(
    path: &Path,
    format: Option<Format>,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<Import> {
    let format = resolve_format(Some(path), format, Format::Delimited);
    let options = ParseOptions {
        delimiter: resolve_delimiter(Some(path), delimiter),
    };
    let text = read_text(path, encoding)?;
    codec::parse(&text, format, &dataset_name(path), &options)
        .with_context(|| format!("Parsing {path:?}"))
}
