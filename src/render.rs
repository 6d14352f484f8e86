use crate::ansi::{Color, Style, StyledText};
use crate::document::{Document, Section};

const COLLAPSED_MARKER: &str = "▸";
const EXPANDED_MARKER: &str = "▾";

/// Flatten a document into terminal text. Collapsed sections contribute a
/// single title line; `expand_all` prints every body regardless of state.
pub fn render_document(document: &Document, expand_all: bool) -> String {
    let mut out = String::new();

    out.push_str(&emit_styled(&document.status.body));
    if !out.ends_with('\n') && !out.is_empty() {
        out.push('\n');
    }

    for section in &document.sections {
        out.push('\n');
        render_section(&mut out, section, expand_all);
    }
    out
}

fn render_section(out: &mut String, section: &Section, expand_all: bool) {
    let expanded = expand_all || !section.collapsed;
    let marker = if expanded {
        EXPANDED_MARKER
    } else {
        COLLAPSED_MARKER
    };
    let title = section.title.as_deref().unwrap_or("");
    out.push_str(&format!("\x1b[1m{marker} {title}\x1b[0m\n"));

    if expanded && !section.body.plain.is_empty() {
        out.push_str(&emit_styled(&section.body));
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }
}

/// Re-emit style spans as SGR sequences around their plain-text ranges.
fn emit_styled(text: &StyledText) -> String {
    let mut out = String::with_capacity(text.plain.len());
    let mut pos = 0usize;
    for span in &text.spans {
        out.push_str(&text.plain[pos..span.range.start]);
        out.push_str(&sgr_prefix(&span.style));
        out.push_str(&text.plain[span.range.clone()]);
        out.push_str("\x1b[0m");
        pos = span.range.end;
    }
    out.push_str(&text.plain[pos..]);
    out
}

fn sgr_prefix(style: &Style) -> String {
    let mut params: Vec<String> = Vec::new();
    if style.bold {
        params.push("1".to_string());
    }
    if style.dim {
        params.push("2".to_string());
    }
    if style.italic {
        params.push("3".to_string());
    }
    if style.underline {
        params.push("4".to_string());
    }
    if style.reversed {
        params.push("7".to_string());
    }
    if let Some(fg) = style.fg {
        params.push(color_params(fg, true));
    }
    if let Some(bg) = style.bg {
        params.push(color_params(bg, false));
    }
    format!("\x1b[{}m", params.join(";"))
}

fn color_params(color: Color, foreground: bool) -> String {
    let base = if foreground { 30 } else { 40 };
    let bright_base = if foreground { 90 } else { 100 };
    let extended = if foreground { 38 } else { 48 };
    match color {
        Color::Black => base.to_string(),
        Color::Red => (base + 1).to_string(),
        Color::Green => (base + 2).to_string(),
        Color::Yellow => (base + 3).to_string(),
        Color::Blue => (base + 4).to_string(),
        Color::Magenta => (base + 5).to_string(),
        Color::Cyan => (base + 6).to_string(),
        Color::White => (base + 7).to_string(),
        Color::BrightBlack => bright_base.to_string(),
        Color::BrightRed => (bright_base + 1).to_string(),
        Color::BrightGreen => (bright_base + 2).to_string(),
        Color::BrightYellow => (bright_base + 3).to_string(),
        Color::BrightBlue => (bright_base + 4).to_string(),
        Color::BrightMagenta => (bright_base + 5).to_string(),
        Color::BrightCyan => (bright_base + 6).to_string(),
        Color::BrightWhite => (bright_base + 7).to_string(),
        Color::Indexed(n) => format!("{extended};5;{n}"),
        Color::Rgb(r, g, b) => format!("{extended};2;{r};{g};{b}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::normalize;
    use crate::diff;
    use crate::document::assemble;

    fn sample_document() -> Document {
        assemble(
            normalize("M \x1b[36mfoo.txt\x1b[0m"),
            diff::parse("foo.txt --- text\n@@ -1,1 +1,1 @@\n\x1b[31m-old\x1b[0m\n\x1b[32m+new\x1b[0m"),
        )
    }

    #[test]
    fn test_collapsed_section_is_one_line() {
        let rendered = render_document(&sample_document(), false);
        assert!(rendered.contains("▸ foo.txt"));
        assert!(!rendered.contains("+new"));
    }

    #[test]
    fn test_expand_all_prints_bodies() {
        let rendered = render_document(&sample_document(), true);
        assert!(rendered.contains("▾ foo.txt"));
        assert!(rendered.contains("@@ -1,1 +1,1 @@"));
        assert!(rendered.contains("+new"));
    }

    #[test]
    fn test_status_styling_reemitted() {
        let rendered = render_document(&sample_document(), false);
        assert!(rendered.contains("\x1b[36mfoo.txt\x1b[0m"));
    }

    #[test]
    fn test_body_styling_reemitted_when_expanded() {
        let rendered = render_document(&sample_document(), true);
        assert!(rendered.contains("\x1b[32m+new\x1b[0m"));
        assert!(rendered.contains("\x1b[31m-old\x1b[0m"));
    }

    #[test]
    fn test_status_only_document() {
        let document = assemble(normalize("The working copy is clean"), Vec::new());
        let rendered = render_document(&document, false);
        assert_eq!(rendered, "The working copy is clean\n");
    }

    #[test]
    fn test_round_trip_through_normalize() {
        // Re-emitted SGR codes normalize back to the same plain text
        let rendered = render_document(&sample_document(), true);
        let reparsed = normalize(&rendered);
        assert!(reparsed.plain.contains("+new"));
        assert!(reparsed.plain.contains("▸ foo.txt") || reparsed.plain.contains("▾ foo.txt"));
    }
}
