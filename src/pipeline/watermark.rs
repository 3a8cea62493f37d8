//! Watermark detection and removal.
//!
//! ## Why frequency analysis?
//!
//! Extracted PDF text has no styling left — a "CONFIDENTIAL" stamp and a
//! chapter title are both plain lines. What distinguishes boilerplate
//! (headers, footers, draft stamps) is *repetition across pages*: a line that
//! reappears on most pages of a document is almost never content. Detection
//! therefore counts, for each normalised line, the number of pages it appears
//! on, and ranks the result.
//!
//! Three filters keep the candidate set meaningful:
//!
//! - digit-only lines are excluded (page numbers vary, and deleting every
//!   numeric line would be wrong anyway)
//! - lines shorter than 2 characters carry no signal
//! - lines longer than 60 characters are prose, not stamps
//!
//! Removal is a separate, caller-driven step: detection only *proposes*
//! candidates, the caller approves a set of phrases, and
//! [`remove_phrases`] strips matching lines. Approved phrases of length ≥ 3
//! also match as substrings of short lines, so `"Confidential"` catches
//! `"Confidential — do not distribute"` without a second approval round.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::pipeline::pages::{join_pages, normalize_line, split_pages};

/// Candidate phrase length window, in characters, after normalisation.
const MIN_PHRASE_CHARS: usize = 2;
const MAX_PHRASE_CHARS: usize = 60;

/// Substring removal only applies to approved phrases of at least this many
/// characters, and only against lines of at most [`MAX_SUBSTRING_LINE_CHARS`].
const MIN_SUBSTRING_PHRASE_CHARS: usize = 3;
const MAX_SUBSTRING_LINE_CHARS: usize = 120;

/// A normalised phrase and the number of pages it appears on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkCandidate {
    /// Normalised line text.
    pub phrase: String,
    /// Number of pages the phrase appears on (at most once per page).
    pub pages: usize,
}

/// Rank all watermark candidates across `pages`.
///
/// For each page, the **set** of distinct normalised lines passing the
/// candidate filters contributes one count per line — duplicate occurrences
/// on the same page do not inflate the count, so `pages` never exceeds the
/// page count. Results are sorted by count descending, then phrase ascending
/// for a deterministic order.
pub fn detect_candidates(pages: &[&str]) -> Vec<WatermarkCandidate> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for page in pages {
        let mut seen: HashSet<String> = HashSet::new();
        for raw in page.lines() {
            let line = normalize_line(raw);
            if !is_candidate_line(&line) {
                continue;
            }
            seen.insert(line);
        }
        for line in seen {
            *counts.entry(line).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<WatermarkCandidate> = counts
        .into_iter()
        .map(|(phrase, pages)| WatermarkCandidate { phrase, pages })
        .collect();
    ranked.sort_by(|a, b| b.pages.cmp(&a.pages).then_with(|| a.phrase.cmp(&b.phrase)));
    ranked
}

/// Rank only the *strong* candidates: phrases appearing on at least
/// [`strong_threshold`] pages.
///
/// A document with a single page (or none) never yields strong candidates —
/// repetition across pages is undefined there.
pub fn strong_candidates(pages: &[&str]) -> Vec<WatermarkCandidate> {
    if pages.len() <= 1 {
        return Vec::new();
    }
    let threshold = strong_threshold(pages.len());
    detect_candidates(pages)
        .into_iter()
        .filter(|c| c.pages >= threshold)
        .collect()
}

/// Significance threshold for a strong candidate: `max(3, ceil(0.6 × n))`.
pub fn strong_threshold(page_count: usize) -> usize {
    (3 * page_count).div_ceil(5).max(3)
}

/// Strip every line matching an approved phrase from `text`.
///
/// A line is dropped when its normalised form exactly equals an approved
/// (normalised) phrase, or when an approved phrase of ≥ 3 characters occurs
/// as a substring of the line's normalised form and that form is at most
/// 120 characters long. The line-length cap keeps a short watermark fragment
/// from deleting long prose that merely contains it; within that cap the
/// substring rule is intentionally aggressive (see DESIGN.md).
///
/// Returns the input unchanged, byte for byte, when `approved` is empty or
/// normalises to nothing. Surviving lines keep their raw form and order;
/// pages rejoin with the page-break sentinel.
pub fn remove_phrases(text: &str, approved: &[String]) -> String {
    let phrases: Vec<String> = approved
        .iter()
        .map(|p| normalize_line(p))
        .filter(|p| !p.is_empty())
        .collect();
    if phrases.is_empty() {
        return text.to_string();
    }

    let cleaned: Vec<String> = split_pages(text)
        .iter()
        .map(|page| {
            page.lines()
                .filter(|raw| !line_matches(&normalize_line(raw), &phrases))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect();
    join_pages(&cleaned)
}

/// Candidate filter: non-empty, 2–60 characters, not purely digits.
fn is_candidate_line(line: &str) -> bool {
    let chars = line.chars().count();
    if !(MIN_PHRASE_CHARS..=MAX_PHRASE_CHARS).contains(&chars) {
        return false;
    }
    !line.chars().all(|c| c.is_ascii_digit())
}

fn line_matches(line: &str, phrases: &[String]) -> bool {
    let line_chars = line.chars().count();
    phrases.iter().any(|phrase| {
        line == phrase
            || (phrase.chars().count() >= MIN_SUBSTRING_PHRASE_CHARS
                && line_chars <= MAX_SUBSTRING_LINE_CHARS
                && line.contains(phrase.as_str()))
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────
