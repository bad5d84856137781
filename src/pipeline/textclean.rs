//! Deterministic cleanup for recognised text.
//!
//! OCR output from binarized scans has a few systematic artifacts: runs of
//! spaces where column gaps were, the vertical-bar glyph misread for a
//! capital I, the zero glyph misread for a capital O, and blank-line runs
//! between paragraphs. The rules here fix exactly those and nothing else;
//! anything smarter belongs in the engine.

use once_cell::sync::Lazy;
use regex::Regex;

static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
static BLANK_LINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Normalise recognised text.
///
/// Collapses horizontal whitespace runs to a single space, replaces `|`
/// with `I` and `0` with `O`, caps blank-line runs at one empty line, and
/// trims the ends. The zero repair is unconditional, so genuine digits are
/// rewritten too; callers needing numerals intact should disable cleanup.
pub fn clean_text(raw: &str) -> String {
    let collapsed = SPACE_RUNS.replace_all(raw, " ");
    let repaired = collapsed.replace('|', "I").replace('0', "O");
    let squeezed = BLANK_LINE_RUNS.replace_all(&repaired, "\n\n");
    squeezed.trim().to_string()
}
