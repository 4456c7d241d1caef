//! Line driver shared by both loaders.

use std::io::BufRead;

use namedev_core::ParseConfig;
use tracing::{debug, warn};

use crate::record::RuleRecord;
use crate::registry::Registry;

use super::error::{LineError, LineResult, LineStatus, LoadError, LoadReport, Result};

/// Stream `reader` line by line, parse each rule line with `parse_line`, and
/// upsert the result into `registry`.
///
/// Blank lines are ignored and comment lines are recorded as skipped. Parse
/// failures are recorded and the line is dropped; only read and registry
/// errors end the pass.
pub(super) fn drive<R, F>(
    mut reader: R,
    mut report: LoadReport,
    parse: &ParseConfig,
    registry: &mut Registry,
    mut parse_line: F,
) -> Result<LoadReport>
where
    R: BufRead,
    F: FnMut(&str) -> std::result::Result<RuleRecord, LineError>,
{
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| LoadError::Read {
                file: report.file,
                path: report.path.clone(),
                source,
            })?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let status = match classify(&buf, parse) {
            Line::Blank => continue,
            Line::Comment => LineStatus::Skipped {
                reason: "comment".to_string(),
            },
            Line::Rule(Err(error)) => LineStatus::Failed { error },
            Line::Rule(Ok(text)) => {
                if text.is_empty() {
                    continue;
                }
                match parse_line(text) {
                    Ok(record) => {
                        let name = record.name().to_string();
                        let outcome = registry.upsert(record)?;
                        debug!(file = %report.file, line = line_no, name = %name, ?outcome, "stored rule");
                        LineStatus::Merged { name }
                    }
                    Err(error) => LineStatus::Failed { error },
                }
            }
        };

        if let LineStatus::Failed { error } = &status {
            warn!(
                file = %report.file,
                path = %report.path.display(),
                line = line_no,
                error = %error,
                "skipping malformed line"
            );
        }
        report.lines.push(LineResult {
            line: line_no,
            status,
        });
    }

    Ok(report)
}

enum Line<'a> {
    Blank,
    Comment,
    /// Rule text with leading whitespace removed, or why it cannot be read.
    Rule(std::result::Result<&'a str, LineError>),
}

/// Sort a raw line into blank, comment or rule text. Blank and comment
/// lines are recognised on the raw bytes, so the length limit and UTF-8
/// decoding only apply to rule lines.
fn classify<'a>(raw: &'a [u8], parse: &ParseConfig) -> Line<'a> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

    let start = raw
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(raw.len());
    let lead = &raw[start..];
    if lead.is_empty() {
        return Line::Blank;
    }
    let mut marker = [0u8; 4];
    if lead.starts_with(parse.comment_char.encode_utf8(&mut marker).as_bytes()) {
        return Line::Comment;
    }
    Line::Rule(decode(raw, parse.max_line_len).map(str::trim_start))
}

/// Enforce the length limit and decode as UTF-8.
fn decode(raw: &[u8], max_len: usize) -> std::result::Result<&str, LineError> {
    if raw.len() > max_len {
        return Err(LineError::LineTooLong {
            len: raw.len(),
            max: max_len,
        });
    }
    std::str::from_utf8(raw).map_err(|_| LineError::InvalidUtf8)
}
