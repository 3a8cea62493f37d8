//! Screenplay recognition and Markdown reformatting.
//!
//! ## Why a heuristic, not a grammar?
//!
//! Screenplay text coming out of a PDF extractor has already lost its layout:
//! centring, margins, and page position are gone, and only the line text
//! remains. Full Fountain/FDX parsing buys nothing here — what survives
//! extraction is exactly the line-level conventions this module keys on:
//!
//! - scene headings start with a fixed prefix (`INT.`, `EXT.`, …)
//! - transitions are upper-case lines ending in `TO:`
//! - character cues are short, upper-case, purely alphabetic lines
//! - parentheticals are short lines fully wrapped in parentheses
//!
//! The per-line predicates are free functions over a single trimmed line, so
//! they unit-test without constructing pages or documents. False positives
//! and negatives are accepted; the classifier threshold (one scene heading or
//! three cues) keeps ordinary prose from being reformatted.

use once_cell::sync::Lazy;
use regex::Regex;

/// Scene-heading sentinel prefixes, checked against the trimmed line.
const SCENE_PREFIXES: [&str; 4] = ["INT.", "EXT.", "INT/EXT.", "I/E."];

/// Upper-case words ending in a literal `TO:` — `CUT TO:`, `DISSOLVE TO:`.
static RE_TRANSITION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Z \-]+TO:$").unwrap());

/// Parentheticals longer than this are treated as ordinary dialogue.
const MAX_PARENTHETICAL_CHARS: usize = 80;

/// Character cues longer than this (or shorter than 2) are not cues.
const MAX_CUE_CHARS: usize = 30;

/// How many lines the classifier samples from the top of the document.
const CLASSIFIER_SAMPLE_LINES: usize = 1000;

// ── Per-line predicates ──────────────────────────────────────────────────────

/// Does this line open a scene (`INT. KITCHEN - DAY`)?
pub fn is_scene_heading(line: &str) -> bool {
    let s = line.trim();
    SCENE_PREFIXES.iter().any(|p| s.starts_with(p))
}

/// Is this line a transition (`SMASH CUT TO:`)?
pub fn is_transition(line: &str) -> bool {
    RE_TRANSITION.is_match(line.trim())
}

/// Is this line a character cue — the upper-case speaker name above dialogue?
///
/// 2–30 characters; after removing spaces, hyphens, and apostrophes
/// (`ANNE-MARIE`, `O'BRIEN`) the rest must be upper-case letters only.
pub fn is_character_cue(line: &str) -> bool {
    let s = line.trim();
    if !(2..=MAX_CUE_CHARS).contains(&s.chars().count()) {
        return false;
    }
    let mut core = s.chars().filter(|c| !matches!(c, ' ' | '-' | '\'')).peekable();
    core.peek().is_some() && core.all(|c| c.is_alphabetic() && c.is_uppercase())
}

/// A short stage direction fully wrapped in parentheses.
fn is_parenthetical(line: &str) -> bool {
    line.starts_with('(') && line.ends_with(')') && line.chars().count() < MAX_PARENTHETICAL_CHARS
}

// ── Classifier ───────────────────────────────────────────────────────────────

/// Cheap whole-document check: does this text look like a screenplay?
///
/// Samples at most the first 1000 lines and counts scene-heading and
/// character-cue hits. Positive iff at least one scene heading or at least
/// three cues were seen.
pub fn looks_like_screenplay(text: &str) -> bool {
    let mut scene_hits = 0usize;
    let mut cue_hits = 0usize;
    for line in text.lines().take(CLASSIFIER_SAMPLE_LINES) {
        let s = line.trim();
        if s.is_empty() {
            continue;
        }
        if is_scene_heading(s) {
            scene_hits += 1;
        }
        if is_character_cue(s) {
            cue_hits += 1;
        }
    }
    scene_hits >= 1 || cue_hits >= 3
}

// ── Formatter ────────────────────────────────────────────────────────────────

/// Rewrite recognised screenplay structure as Markdown.
///
/// One forward pass with a single cursor:
///
/// - scene heading → `## …`
/// - transition → `> _…_`
/// - character cue → `**…**`, then dialogue capture until a blank line or the
///   next structural line (the terminator is re-examined by the outer loop,
///   except a blank, which is consumed); captured parentheticals become
///   `_…_`, other captured lines stay verbatim
/// - anything else passes through right-trimmed
///
/// Afterwards blank runs are capped at two lines, and non-empty output ends
/// with exactly one trailing newline.
pub fn format_screenplay(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim_end();
        let s = line.trim();

        if s.is_empty() {
            out.push(String::new());
            i += 1;
            continue;
        }
        if is_scene_heading(s) {
            out.push(format!("## {s}"));
            i += 1;
            continue;
        }
        if is_transition(s) {
            out.push(format!("> _{s}_"));
            i += 1;
            continue;
        }
        if is_character_cue(s) {
            out.push(format!("**{s}**"));
            i += 1;
            // Dialogue capture: runs until a blank line or the next
            // structural line. A cue at end-of-input leaves the capture empty.
            while i < lines.len() {
                let next = lines[i].trim_end();
                let ns = next.trim();
                if ns.is_empty() {
                    out.push(String::new());
                    i += 1;
                    break;
                }
                if is_scene_heading(ns) || is_character_cue(ns) || is_transition(ns) {
                    break;
                }
                if is_parenthetical(ns) {
                    out.push(format!("_{ns}_"));
                } else {
                    out.push(next.to_string());
                }
                i += 1;
            }
            continue;
        }
        out.push(line.to_string());
        i += 1;
    }

    collapse_and_terminate(out)
}

/// Cap blank runs at two lines and end with a single trailing newline.
fn collapse_and_terminate(lines: Vec<String>) -> String {
    let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
    let mut blank_run = 0usize;
    for line in &lines {
        if line.is_empty() {
            blank_run += 1;
            if blank_run <= 2 {
                cleaned.push("");
            }
        } else {
            blank_run = 0;
            cleaned.push(line);
        }
    }
    if cleaned.is_empty() {
        return String::new();
    }
    let joined = cleaned.join("\n");
    let body = joined.trim_end_matches('\n');
    if body.is_empty() {
        "\n".to_string()
    } else {
        format!("{body}\n")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_prefixes_match() {
        assert!(is_scene_heading("INT. HOUSE - DAY"));
        assert!(is_scene_heading("EXT. STREET - NIGHT"));
        assert!(is_scene_heading("INT/EXT. CAR - MOVING"));
        assert!(is_scene_heading("I/E. TRUCK CAB"));
        assert!(is_scene_heading("  INT. PADDED  "));
        assert!(!is_scene_heading("INTERIOR HOUSE"));
        assert!(!is_scene_heading("a quiet morning"));
    }

    #[test]
    fn transitions_match() {
        assert!(is_transition("CUT TO:"));
        assert!(is_transition("DISSOLVE TO:"));
        assert!(is_transition("SMASH-CUT TO:"));
        assert!(!is_transition("FADE OUT."));
        assert!(!is_transition("cut to:"));
        assert!(!is_transition("CUT TO: black"));
    }

    #[test]
    fn character_cues_match() {
        assert!(is_character_cue("JOHN"));
        assert!(is_character_cue("ANNE-MARIE"));
        assert!(is_character_cue("O'BRIEN"));
        assert!(is_character_cue("OLD MAN"));
        assert!(!is_character_cue("J")); // too short
        assert!(!is_character_cue("John"));
        assert!(!is_character_cue("JOHN 2")); // digit
        assert!(!is_character_cue("INT. HOUSE - DAY")); // punctuation
        assert!(!is_character_cue("--")); // nothing left after stripping
        assert!(!is_character_cue(&"A".repeat(31)));
    }

    #[test]
    fn transition_is_never_a_cue() {
        // Mutually exclusive by construction: the colon fails the cue rule.
        assert!(!is_character_cue("CUT TO:"));
    }

    #[test]
    fn classifier_positive_on_scene_heading() {
        assert!(looks_like_screenplay("INT. HOUSE - DAY\nsome prose"));
    }

    #[test]
    fn classifier_positive_on_three_cues() {
        assert!(looks_like_screenplay("JOHN\nhello\nSARAH\nhi\nJOHN\nbye"));
    }

    #[test]
    fn classifier_negative_on_prose() {
        let prose = "it was a dark and stormy night.\nthe rain fell in sheets.\n";
        assert!(!looks_like_screenplay(prose));
        assert!(!looks_like_screenplay("JOHN\nhello\nSARAH\nhi")); // only 2 cues
    }

    #[test]
    fn classifier_samples_only_first_1000_lines() {
        let mut text = "lower case prose\n".repeat(1000);
        text.push_str("INT. TOO LATE - DAY\n");
        assert!(!looks_like_screenplay(&text));
    }

    #[test]
    fn formats_scene_heading_and_transition() {
        let out = format_screenplay("INT. LAB - NIGHT\n\nCUT TO:\n");
        assert_eq!(out, "## INT. LAB - NIGHT\n\n> _CUT TO:_\n");
    }

    #[test]
    fn formats_cue_with_parenthetical_dialogue() {
        let out = format_screenplay("SARAH\n(whispering)\nBe quiet.\n\nafter");
        assert_eq!(out, "**SARAH**\n_(whispering)_\nBe quiet.\n\nafter\n");
    }

    #[test]
    fn dialogue_capture_stops_at_structural_lines() {
        let out = format_screenplay("JOHN\nHello there.\nEXT. STREET - NIGHT");
        assert_eq!(out, "**JOHN**\nHello there.\n## EXT. STREET - NIGHT\n");
    }

    #[test]
    fn dialogue_capture_stops_at_next_cue() {
        let out = format_screenplay("JOHN\nHi.\nSARAH\nHi yourself.");
        assert_eq!(out, "**JOHN**\nHi.\n**SARAH**\nHi yourself.\n");
    }

    #[test]
    fn cue_at_end_of_input() {
        assert_eq!(format_screenplay("JOHN"), "**JOHN**\n");
    }

    #[test]
    fn long_parenthetical_stays_verbatim() {
        let aside = format!("({})", "x".repeat(90));
        let out = format_screenplay(&format!("JOHN\n{aside}"));
        assert_eq!(out, format!("**JOHN**\n{aside}\n"));
    }

    #[test]
    fn prose_passes_through() {
        let out = format_screenplay("  indented prose line\nanother line");
        assert_eq!(out, "  indented prose line\nanother line\n");
    }

    #[test]
    fn blank_runs_collapse_to_two() {
        let out = format_screenplay("a\n\n\n\n\nb");
        assert_eq!(out, "a\n\n\nb\n");
        assert!(!out.contains("\n\n\n\n"));
    }

    #[test]
    fn output_ends_with_single_newline() {
        assert_eq!(format_screenplay("line\n\n\n"), "line\n");
        assert_eq!(format_screenplay(""), "");
        assert_eq!(format_screenplay("\n\n"), "\n");
    }
}
