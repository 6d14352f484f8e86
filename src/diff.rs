use once_cell::sync::Lazy;
use regex::Regex;

use crate::ansi::strip_ansi;

/// Section label when the diff stream is empty or all-whitespace.
pub const NO_CHANGES_LABEL: &str = "No changes";
pub const NO_CHANGES_BODY: &str = "No differences found in the current change.";
/// Section label when content precedes any recognized file header.
pub const HEADERLESS_LABEL: &str = "Changes";
/// Section label for the verbatim fallback when nothing at all parsed.
pub const UNPARSED_LABEL: &str = "Raw Diff Output";

/// One file's slice of the diff stream, in first-appearance order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiffRecord {
    pub file_identifier: String,
    pub body: String,
}

/// Native header emitted by structural diff tools: `<path> --- <rest>`.
static TOOL_HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\S+) --- ").unwrap());

/// Conventional dual-path header: `diff --git a/<path> b/<path>`.
static GIT_HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^diff --git a/(.+) b/(.+)$").unwrap());

/// Split a raw diff stream into per-file records.
///
/// Never returns an empty list: blank input yields the "No changes" record,
/// content with no recognized header lands in a "Changes" record, and if the
/// scan somehow produces nothing the entire input comes back verbatim under
/// "Raw Diff Output".
pub fn parse(diff_text: &str) -> Vec<FileDiffRecord> {
    if diff_text.trim().is_empty() {
        return vec![FileDiffRecord {
            file_identifier: NO_CHANGES_LABEL.to_string(),
            body: NO_CHANGES_BODY.to_string(),
        }];
    }

    let mut records: Vec<FileDiffRecord> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in diff_text.lines() {
        // Headers may be colorized; match against the stripped form
        let stripped = strip_ansi(line);

        let header = TOOL_HEADER_RE
            .captures(&stripped)
            .or_else(|| GIT_HEADER_RE.captures(&stripped));

        if let Some(caps) = header {
            flush(&mut current, &mut records);
            current = Some((caps[1].to_string(), vec![line]));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        } else if !stripped.trim().is_empty() {
            current = Some((HEADERLESS_LABEL.to_string(), vec![line]));
        }
    }
    flush(&mut current, &mut records);

    if records.is_empty() {
        return vec![FileDiffRecord {
            file_identifier: UNPARSED_LABEL.to_string(),
            body: diff_text.to_string(),
        }];
    }
    records
}

fn flush(current: &mut Option<(String, Vec<&str>)>, records: &mut Vec<FileDiffRecord>) {
    if let Some((file_identifier, lines)) = current.take() {
        records.push(FileDiffRecord {
            file_identifier,
            body: lines.join("\n"),
        });
    }
}
