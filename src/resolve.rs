use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::ansi::strip_ansi;
use crate::document::{Document, NodeId};

/// Line-numbered diff form: leading whitespace, an integer, whitespace.
static LINE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\s").unwrap());

/// Unified hunk header: the number after `+` is the new-file start line.
static HUNK_HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@@[^+]*\+(\d+)").unwrap());

/// Where a "jump to source" should land. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineReference {
    pub file_identifier: String,
    pub line_number: u32,
}

/// Source line number for one line of diff text, when derivable.
///
/// Explicit per-line numbers win over hunk anchors. A hunk anchor gives the
/// line number at the start of the hunk only; callers needing alignment for
/// lines deep inside a hunk count the following lines themselves.
pub fn resolve_line(line_text: &str) -> Option<u32> {
    let stripped = strip_ansi(line_text);
    if let Some(caps) = LINE_NUMBER_RE.captures(&stripped) {
        return caps[1].parse().ok();
    }
    HUNK_HEADER_RE
        .captures(&stripped)
        .and_then(|caps| caps[1].parse().ok())
}

/// Outcome of a jump action once at least the file is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JumpTarget {
    /// Open the file and move to the line.
    FileLine(LineReference),
    /// Open the file without positioning; the line could not be derived.
    FileOnly(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JumpError {
    #[error("cursor is not inside a file section")]
    NoFileContext,
    #[error("cursor has neither a file section nor a recognizable line number")]
    Nothing,
}

/// Combine the document's file context with the cursor line's number.
///
/// Degrades per the file/line availability: both known jumps to the line,
/// file-only opens the file, no file context at all is the only failure.
pub fn jump_target(
    document: &Document,
    node: NodeId,
    line_text: &str,
) -> Result<JumpTarget, JumpError> {
    let file = document.current_file_for(node).map(str::to_string);
    let line = resolve_line(line_text);
    match (file, line) {
        (Some(file_identifier), Some(line_number)) => Ok(JumpTarget::FileLine(LineReference {
            file_identifier,
            line_number,
        })),
        (Some(file), None) => Ok(JumpTarget::FileOnly(file)),
        (None, Some(_)) => Err(JumpError::NoFileContext),
        (None, None) => Err(JumpError::Nothing),
    }
}
