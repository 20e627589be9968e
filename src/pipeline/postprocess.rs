//! Post-processing: deterministic cleanup of rendered MDX.
//!
//! The renderer emits every block with its own trailing blank line and
//! leaves styling decisions to the classifier, so the raw text can carry
//! stacked blank lines, trailing spaces from PDF runs, invisible characters
//! copied out of the text layer, and emphasis markers whose content was
//! stripped away. Each rule is a pure `&str → String` pass.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so every later rule only sees `\n`.
//! Empty emphasis is dropped before trailing whitespace is trimmed, because
//! removing `** **` can leave a dangling space behind.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to rendered MDX.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, …)
/// 3. Drop standalone empty emphasis (`** **`, `__`, `_ _`)
/// 4. Trim trailing whitespace per line
/// 5. Collapse 3+ consecutive newlines to a single blank line
/// 6. End with exactly one newline; empty input stays empty
pub fn clean_mdx(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = remove_empty_emphasis(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Remove empty emphasis ───────────────────────────────────────────
//
// Only markers standing alone between whitespace (or line edges) are
// touched, so `snake_case` and `2*3*4` survive. Thematic breaks such as
// `***` (a custom page separator) are left alone. A list marker is not a
// delimiter, and an item whose whole content looks like empty emphasis
// (`- **`, `* _`) is literal text and keeps it.

static RE_LIST_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*(?:[-*+]|\d{1,9}[.)])[ \t]+").unwrap());

static RE_EMPTY_EMPHASIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(^|[ \t])(?:\*\*|__|\*|_)[ \t]*(?:\*\*|__|\*|_)([ \t]|$)").unwrap()
});

fn remove_empty_emphasis(input: &str) -> String {
    input
        .split('\n')
        .map(|line| {
            if is_thematic_break(line) {
                return line.to_string();
            }
            let prefix = RE_LIST_PREFIX.find(line).map_or(0, |m| m.end());
            let (marker, content) = line.split_at(prefix);
            let cleaned = RE_EMPTY_EMPHASIS.replace_all(content, "$1");
            if prefix > 0 && cleaned.trim().is_empty() {
                line.to_string()
            } else {
                format!("{marker}{cleaned}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_thematic_break(line: &str) -> bool {
    let t = line.trim();
    t.len() >= 3
        && ['*', '_', '-']
            .iter()
            .any(|m| t.chars().all(|c| c == *m))
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 6: Ensure output ends with single newline ───────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
