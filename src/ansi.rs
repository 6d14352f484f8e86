use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches any ANSI escape sequence:
/// - CSI sequences (colors, cursor movement)
/// - OSC sequences ending with BEL or ST
/// - Character set selection and other single-char escapes
/// - Any remaining bare ESC
static ANSI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\x1b\[[0-9;?]*[A-Za-z]",
        r"|\x1b\][^\x07]*\x07",
        r"|\x1b\][^\x1b]*\x1b\\",
        r"|\x1b[()][A-Z0-9]",
        r"|\x1b[=>MNOP78]",
        r"|\x1b",
    ))
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
    Indexed(u8),
    Rgb(u8, u8, u8),
}

impl Color {
    fn named(n: u16) -> Option<Color> {
        Some(match n {
            0 => Color::Black,
            1 => Color::Red,
            2 => Color::Green,
            3 => Color::Yellow,
            4 => Color::Blue,
            5 => Color::Magenta,
            6 => Color::Cyan,
            7 => Color::White,
            _ => return None,
        })
    }

    fn bright(n: u16) -> Option<Color> {
        Some(match n {
            0 => Color::BrightBlack,
            1 => Color::BrightRed,
            2 => Color::BrightGreen,
            3 => Color::BrightYellow,
            4 => Color::BrightBlue,
            5 => Color::BrightMagenta,
            6 => Color::BrightCyan,
            7 => Color::BrightWhite,
            _ => return None,
        })
    }
}

/// Text attributes carried by one styled span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub dim: bool,
    pub italic: bool,
    pub underline: bool,
    pub reversed: bool,
}

impl Style {
    pub fn is_plain(&self) -> bool {
        *self == Style::default()
    }

    /// Apply one SGR parameter list (the `...` of `ESC[...m`) to this style.
    /// Parameter lists that fail to parse leave the style untouched.
    fn apply_sgr(&mut self, params: &str) {
        let codes: Vec<u16> = if params.is_empty() {
            vec![0]
        } else {
            let parsed: Result<Vec<u16>, _> = params
                .split(';')
                .map(|p| if p.is_empty() { Ok(0) } else { p.parse() })
                .collect();
            match parsed {
                Ok(codes) => codes,
                Err(_) => return,
            }
        };

        let mut i = 0;
        while i < codes.len() {
            match codes[i] {
                0 => *self = Style::default(),
                1 => self.bold = true,
                2 => self.dim = true,
                3 => self.italic = true,
                4 => self.underline = true,
                7 => self.reversed = true,
                22 => {
                    self.bold = false;
                    self.dim = false;
                }
                23 => self.italic = false,
                24 => self.underline = false,
                27 => self.reversed = false,
                30..=37 => self.fg = Color::named(codes[i] - 30),
                39 => self.fg = None,
                40..=47 => self.bg = Color::named(codes[i] - 40),
                49 => self.bg = None,
                90..=97 => self.fg = Color::bright(codes[i] - 90),
                100..=107 => self.bg = Color::bright(codes[i] - 100),
                38 | 48 => {
                    let is_fg = codes[i] == 38;
                    let color = match codes.get(i + 1) {
                        Some(&5) => {
                            let n = match codes.get(i + 2) {
                                Some(&n) if n <= 255 => n as u8,
                                _ => return,
                            };
                            i += 2;
                            Color::Indexed(n)
                        }
                        Some(&2) => {
                            let (r, g, b) = match (codes.get(i + 2), codes.get(i + 3), codes.get(i + 4)) {
                                (Some(&r), Some(&g), Some(&b)) if r <= 255 && g <= 255 && b <= 255 => {
                                    (r as u8, g as u8, b as u8)
                                }
                                _ => return,
                            };
                            i += 4;
                            Color::Rgb(r, g, b)
                        }
                        _ => return,
                    };
                    if is_fg {
                        self.fg = Some(color);
                    } else {
                        self.bg = Some(color);
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }
}

/// A half-open byte range of `StyledText::plain` carrying one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSpan {
    pub range: Range<usize>,
    pub style: Style,
}

/// Plain text plus non-overlapping style annotations sorted by start offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledText {
    pub plain: String,
    pub spans: Vec<StyleSpan>,
}

/// Remove every ANSI escape sequence from `text`.
pub fn strip_ansi(text: &str) -> String {
    ANSI_RE.replace_all(text, "").to_string()
}

/// Translate SGR escape sequences into style spans over the stripped text.
///
/// Pure and total: already-plain input comes back with an empty span list,
/// and any non-SGR or malformed sequence is dropped without a trace.
pub fn normalize(text: &str) -> StyledText {
    let mut plain = String::with_capacity(text.len());
    let mut spans = Vec::new();
    let mut style = Style::default();
    let mut open_at = 0usize;
    let mut last = 0usize;

    for m in ANSI_RE.find_iter(text) {
        plain.push_str(&text[last..m.start()]);
        last = m.end();
        if let Some(params) = sgr_params(m.as_str()) {
            push_span(&mut spans, style, open_at, plain.len());
            style.apply_sgr(params);
            open_at = plain.len();
        }
    }
    plain.push_str(&text[last..]);
    push_span(&mut spans, style, open_at, plain.len());

    StyledText { plain, spans }
}

/// The parameter list of an SGR sequence, or None for every other escape.
fn sgr_params(seq: &str) -> Option<&str> {
    let params = seq.strip_prefix("\x1b[")?.strip_suffix('m')?;
    if params.chars().all(|c| c.is_ascii_digit() || c == ';') {
        Some(params)
    } else {
        None
    }
}

fn push_span(spans: &mut Vec<StyleSpan>, style: Style, start: usize, end: usize) {
    if start >= end || style.is_plain() {
        return;
    }
    // Extend the previous span when the style continues across a no-op sequence
    if let Some(last) = spans.last_mut() {
        if last.range.end == start && last.style == style {
            last.range.end = end;
            return;
        }
    }
    spans.push(StyleSpan {
        range: start..end,
        style,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        let styled = normalize("M foo.txt\nA bar.rs\n");
        assert_eq!(styled.plain, "M foo.txt\nA bar.rs\n");
        assert!(styled.spans.is_empty());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let styled = normalize("\x1b[32m+new line\x1b[0m tail");
        let again = normalize(&styled.plain);
        assert_eq!(again.plain, styled.plain);
        assert!(again.spans.is_empty());
    }

    #[test]
    fn test_basic_color_span() {
        let styled = normalize("\x1b[31m-old\x1b[0m rest");
        assert_eq!(styled.plain, "-old rest");
        assert_eq!(styled.spans.len(), 1);
        assert_eq!(styled.spans[0].range, 0..4);
        assert_eq!(styled.spans[0].style.fg, Some(Color::Red));
    }

    #[test]
    fn test_combined_attributes() {
        let styled = normalize("\x1b[1;4;32mbold green\x1b[0m");
        let style = styled.spans[0].style;
        assert!(style.bold);
        assert!(style.underline);
        assert_eq!(style.fg, Some(Color::Green));
    }

    #[test]
    fn test_indexed_and_rgb_colors() {
        let styled = normalize("\x1b[38;5;208morange\x1b[0m \x1b[48;2;10;20;30mdeep\x1b[0m");
        assert_eq!(styled.plain, "orange deep");
        assert_eq!(styled.spans[0].style.fg, Some(Color::Indexed(208)));
        assert_eq!(styled.spans[1].style.bg, Some(Color::Rgb(10, 20, 30)));
    }

    #[test]
    fn test_spans_sorted_and_disjoint() {
        let styled = normalize("\x1b[32madd\x1b[0m mid \x1b[31mdel\x1b[0m");
        assert_eq!(styled.plain, "add mid del");
        let mut prev_end = 0;
        for span in &styled.spans {
            assert!(span.range.start >= prev_end);
            prev_end = span.range.end;
        }
    }

    #[test]
    fn test_non_sgr_sequences_dropped() {
        // Cursor movement, OSC title, and a bare ESC all vanish silently
        let styled = normalize("a\x1b[2Kb\x1b]0;title\x07c\x1bd");
        assert_eq!(styled.plain, "abcd");
        assert!(styled.spans.is_empty());
    }

    #[test]
    fn test_malformed_extended_color_dropped() {
        // 38 without a 5/2 selector cannot be interpreted; text survives
        let styled = normalize("\x1b[38mx\x1b[0m");
        assert_eq!(styled.plain, "x");
        assert!(styled.spans.is_empty());
    }

    #[test]
    fn test_bright_palette() {
        let styled = normalize("\x1b[93mwarn\x1b[0m");
        assert_eq!(styled.spans[0].style.fg, Some(Color::BrightYellow));
    }

    #[test]
    fn test_reset_via_empty_params() {
        let styled = normalize("\x1b[32mgreen\x1b[mplain");
        assert_eq!(styled.plain, "greenplain");
        assert_eq!(styled.spans.len(), 1);
        assert_eq!(styled.spans[0].range, 0..5);
    }

    #[test]
    fn test_adjacent_equal_styles_merge() {
        let styled = normalize("\x1b[32mab\x1b[32mcd\x1b[0m");
        assert_eq!(styled.plain, "abcd");
        assert_eq!(styled.spans.len(), 1);
        assert_eq!(styled.spans[0].range, 0..4);
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[32mfoo.rs\x1b[0m --- Rust"), "foo.rs --- Rust");
        assert_eq!(strip_ansi("no escapes"), "no escapes");
    }
}
