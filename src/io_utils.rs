//! CSV reading and writing, encodings and delimiter resolution.
//!
//! - **Delimiters**: `.tsv` paths default to tab, everything else to comma;
//!   an explicit `--delimiter` always wins.
//! - **Encodings**: input bytes are decoded with `encoding_rs` (UTF-8 unless
//!   told otherwise, BOM stripped). Exports are rendered in memory and encoded
//!   once when written, so spreadsheet tools that expect Windows-1252 can be
//!   served.
//! - **stdin/stdout**: the `-` path reads stdin or writes stdout.

use std::{
    fs::File,
    io::{self, BufReader, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

fn delimiter_for_extension(path: &Path) -> Option<u8> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => Some(DEFAULT_TSV_DELIMITER),
        Some(ext) if ext.eq_ignore_ascii_case("csv") => Some(DEFAULT_CSV_DELIMITER),
        _ => None,
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided
        .or_else(|| delimiter_for_extension(path))
        .unwrap_or(DEFAULT_CSV_DELIMITER)
}

pub fn resolve_output_delimiter(path: &Path, provided: Option<u8>, fallback: u8) -> u8 {
    provided
        .or_else(|| delimiter_for_extension(path))
        .unwrap_or(fallback)
}

/// Survey exports are often ragged, so records may differ in length.
pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_csv_reader(reader, delimiter))
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

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers().context("Reading header row")?.clone();
    decode_record(&headers, encoding)
}

/// CSV writer over an in-memory buffer; hand it to [`write_csv_output()`].
pub fn csv_buffer(delimiter: u8) -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .from_writer(Vec::new())
}

/// Flushes `writer`, encodes its UTF-8 contents and writes them to `path`
/// (stdout for `-`).
pub fn write_csv_output(
    writer: csv::Writer<Vec<u8>>,
    path: &Path,
    encoding: &'static Encoding,
) -> Result<()> {
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing CSV buffer: {}", err.error()))?;
    let text = String::from_utf8(bytes).context("CSV buffer held invalid UTF-8")?;
    write_text_output(&text, path, encoding)
}

pub fn write_text_output(text: &str, path: &Path, encoding: &'static Encoding) -> Result<()> {
    let encoded = encode_text(text, encoding)?;
    if is_dash(path) {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&encoded).context("Writing to stdout")?;
        stdout.flush().context("Flushing stdout")
    } else {
        let mut file =
            File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
        file.write_all(&encoded)
            .with_context(|| format!("Writing output file {path:?}"))?;
        file.flush()
            .with_context(|| format!("Flushing output file {path:?}"))
    }
}

fn encode_text(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>> {
    if encoding == UTF_8 {
        return Ok(text.as_bytes().to_vec());
    }
    let (encoded, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(anyhow!(
            "Text cannot be represented in encoding {}",
            encoding.name()
        ));
    }
    Ok(encoded.into_owned())
}
