//! Result types returned by the eager conversion API.

use serde::{Deserialize, Serialize};

/// The result of a completed conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The final Markdown document.
    pub markdown: String,

    /// Watermark phrases that were actually removed (normalised form).
    /// Empty when the watermark policy was `Keep` or nothing qualified.
    pub removed_phrases: Vec<String>,

    /// Counters and timings for the run.
    pub stats: ConversionStats,
}

/// Counters and timings for one conversion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the extracted text (1 when no page-break sentinel appeared).
    pub page_count: usize,

    /// Lines deleted by watermark removal.
    pub removed_lines: usize,

    /// Whether the document classified as a screenplay and was reformatted.
    pub screenplay: bool,

    /// Wall-clock time spent in the extraction backend.
    pub extract_duration_ms: u64,

    /// Total wall-clock time for the conversion.
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_serialize_round_trip() {
        let stats = ConversionStats {
            page_count: 12,
            removed_lines: 24,
            screenplay: true,
            extract_duration_ms: 300,
            total_duration_ms: 450,
        };
        let json = serde_json::to_string(&stats).unwrap();
        let back: ConversionStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back.page_count, 12);
        assert_eq!(back.removed_lines, 24);
        assert!(back.screenplay);
    }
}
