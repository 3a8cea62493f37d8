//! Eager conversion entry points and stage orchestration.
//!
//! This module provides the simpler API: run the whole pipeline and return.
//! Use [`crate::progress::spawn_conversion`] instead when the caller needs a
//! responsive foreground while the conversion runs — both paths share the
//! stage runner here, so they cannot drift apart.
//!
//! Stage order (the worker emits a status event at each boundary):
//!
//! ```text
//! extract ──▶ watermark policy ──▶ classify ──▶ format-or-passthrough
//! (backends)  (detect + remove)    (heuristic)  (Markdown)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::config::{ConversionConfig, ScreenplayMode, WatermarkPolicy};
use crate::error::MinedownError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::extract::{self, Extraction, TextExtractor};
use crate::pipeline::pages::{self, normalize_line};
use crate::pipeline::screenplay;
use crate::pipeline::watermark;
use crate::progress::ConversionEvent;

/// Convert an input document to Markdown, in memory.
///
/// Runs extract → watermark policy → classify → format and returns the
/// Markdown plus run statistics. Nothing is written to disk.
///
/// # Errors
/// [`MinedownError::FileNotFound`] / [`MinedownError::ExtractionFailed`] when
/// no text can be obtained; the cleaning stages themselves are pure and
/// cannot fail.
pub async fn convert(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, MinedownError> {
    run_stages(input.as_ref(), config, &|_| {}).await
}

/// Convert an input document and persist the Markdown artifact.
///
/// The file lands at `<output_dir>/<input stem>.md` (output directory
/// defaults to the input's directory and is created if absent). The write is
/// atomic — temp file then rename — so a failed run never leaves a partial
/// output behind.
pub async fn convert_to_file(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<PathBuf, MinedownError> {
    let input = input.as_ref();
    let output = convert(input, config).await?;
    let path = output_path(input, config);
    write_markdown(&path, &output.markdown).await?;
    info!("wrote {} ({} bytes)", path.display(), output.markdown.len());
    Ok(path)
}

/// Extract the raw text blob without cleaning or formatting it.
pub async fn extract_only(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<String, MinedownError> {
    Ok(extract_stage(input.as_ref(), config).await?.text)
}

/// Render already-extracted text to Markdown, no filesystem involved.
///
/// This is the classify + format step on its own, for callers who already
/// hold the text blob (e.g. after a caller-driven watermark selection).
pub fn render_markdown(text: &str, mode: ScreenplayMode) -> String {
    format_stage(text, mode).0
}

/// Where [`convert_to_file`] will write the artifact for this input.
pub fn output_path(input: &Path, config: &ConversionConfig) -> PathBuf {
    let dir = config
        .output_dir
        .clone()
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let mut name = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "output".into());
    name.push(".md");
    dir.join(name)
}

/// Atomically write a Markdown document, creating the parent directory.
pub async fn write_markdown(path: &Path, markdown: &str) -> Result<(), MinedownError> {
    let io_err = |source| MinedownError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
    }

    let tmp = path.with_extension("md.tmp");
    tokio::fs::write(&tmp, markdown).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)
}

// ── Stage runner ─────────────────────────────────────────────────────────────

/// Run extract → clean → format, emitting status/progress at each boundary.
///
/// Shared by [`convert`] (no-op emitter) and the background workers in
/// [`crate::progress`]. Terminal events are the *caller's* responsibility —
/// this function only emits interim status and progress.
pub(crate) async fn run_stages(
    input: &Path,
    config: &ConversionConfig,
    emit: &(dyn Fn(ConversionEvent) + Send + Sync),
) -> Result<ConversionOutput, MinedownError> {
    let total_start = Instant::now();
    info!("starting conversion: {}", input.display());

    // ── Extract ──────────────────────────────────────────────────────────
    emit(ConversionEvent::Status("Reading input".into()));
    emit(ConversionEvent::Progress(5));
    let extract_start = Instant::now();
    let extraction = extract_stage(input, config).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    emit(ConversionEvent::Status(format!(
        "Extracted text via {}",
        extraction.backend
    )));
    emit(ConversionEvent::Progress(40));

    let text = extraction.text;
    let page_count = pages::split_pages(&text).len();
    debug!("document has {page_count} pages, {} chars", text.len());

    // ── Watermarks ───────────────────────────────────────────────────────
    let lines_before = line_count(&text);
    let (text, removed_phrases) = match &config.watermarks {
        WatermarkPolicy::Keep => (text, Vec::new()),
        WatermarkPolicy::Approved(phrases) => {
            emit(ConversionEvent::Status("Removing watermarks".into()));
            let cleaned = watermark::remove_phrases(&text, phrases);
            let approved = phrases
                .iter()
                .map(|p| normalize_line(p))
                .filter(|p| !p.is_empty())
                .collect();
            (cleaned, approved)
        }
        WatermarkPolicy::Auto => {
            emit(ConversionEvent::Status("Detecting watermarks".into()));
            let phrases: Vec<String> = {
                let page_list = pages::split_pages(&text);
                watermark::strong_candidates(&page_list)
                    .into_iter()
                    .map(|c| c.phrase)
                    .collect()
            };
            if phrases.is_empty() {
                (text, phrases)
            } else {
                emit(ConversionEvent::Status("Removing watermarks".into()));
                info!("removing {} watermark phrase(s)", phrases.len());
                let cleaned = watermark::remove_phrases(&text, &phrases);
                (cleaned, phrases)
            }
        }
    };
    let removed_lines = lines_before.saturating_sub(line_count(&text));
    emit(ConversionEvent::Progress(70));

    // ── Classify + format ────────────────────────────────────────────────
    emit(ConversionEvent::Status("Formatting".into()));
    let (markdown, is_screenplay) = format_stage(&text, config.screenplay);
    if is_screenplay {
        debug!("document classified as screenplay");
    }
    emit(ConversionEvent::Progress(90));

    let stats = ConversionStats {
        page_count,
        removed_lines,
        screenplay: is_screenplay,
        extract_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "conversion complete: {} pages, {} lines removed, {}ms",
        stats.page_count, stats.removed_lines, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        markdown,
        removed_phrases,
        stats,
    })
}

/// Run the extraction backends on a blocking thread.
pub(crate) async fn extract_stage(
    input: &Path,
    config: &ConversionConfig,
) -> Result<Extraction, MinedownError> {
    let path = input.to_path_buf();
    let extractors: Vec<Arc<dyn TextExtractor>> = match &config.extractor {
        Some(extractor) => vec![Arc::clone(extractor)],
        None => extract::default_extractors(),
    };
    tokio::task::spawn_blocking(move || extract::extract_with_fallback(&path, &extractors))
        .await
        .map_err(|e| MinedownError::Internal(format!("extraction task failed: {e}")))?
}

/// Classify the document and format it accordingly.
///
/// The page-break sentinel has done its job by this point; it is flattened
/// to an ordinary line break before classification.
fn format_stage(text: &str, mode: ScreenplayMode) -> (String, bool) {
    let flat = text.replace(pages::PAGE_BREAK, "\n");
    let is_screenplay = match mode {
        ScreenplayMode::Always => true,
        ScreenplayMode::Never => false,
        ScreenplayMode::Auto => screenplay::looks_like_screenplay(&flat),
    };
    let markdown = if is_screenplay {
        screenplay::format_screenplay(&flat)
    } else {
        passthrough_markdown(&flat)
    };
    (markdown, is_screenplay)
}

/// Total raw line count across pages.
fn line_count(text: &str) -> usize {
    pages::split_pages(text)
        .iter()
        .map(|page| page.lines().count())
        .sum()
}

// ── Passthrough cleanup ──────────────────────────────────────────────────────

static RE_EXTRA_BLANKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

/// Minimal polish for non-screenplay documents: collapse 3+ consecutive
/// blank lines down to 2 and end with exactly one trailing newline. Content
/// lines are untouched.
fn passthrough_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let collapsed = RE_EXTRA_BLANKS.replace_all(text, "\n\n\n");
    let body = collapsed.trim_end();
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
    use crate::pipeline::extract::PlainTextExtractor;
    use std::io::Write;

    fn write_input(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn plain_config() -> ConversionConfig {
        ConversionConfig::builder()
            .extractor(Arc::new(PlainTextExtractor))
            .build()
            .unwrap()
    }

    #[test]
    fn output_path_defaults_alongside_input() {
        let config = ConversionConfig::default();
        assert_eq!(
            output_path(Path::new("/docs/script.pdf"), &config),
            PathBuf::from("/docs/script.md")
        );
    }

    #[test]
    fn output_path_honours_output_dir() {
        let config = ConversionConfig::builder().output_dir("/out").build().unwrap();
        assert_eq!(
            output_path(Path::new("/docs/script.pdf"), &config),
            PathBuf::from("/out/script.md")
        );
    }

    #[test]
    fn passthrough_collapses_blank_runs() {
        assert_eq!(passthrough_markdown("a\n\n\n\n\nb"), "a\n\n\nb\n");
        assert_eq!(passthrough_markdown("a"), "a\n");
        assert_eq!(passthrough_markdown(""), "");
        assert_eq!(passthrough_markdown("\n\n"), "\n");
    }

    #[tokio::test]
    async fn convert_plain_prose_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, "prose.txt", "just some prose\n\nmore prose\n");
        let output = convert(&input, &plain_config()).await.unwrap();
        assert!(!output.stats.screenplay);
        assert_eq!(output.markdown, "just some prose\n\nmore prose\n");
        assert!(output.removed_phrases.is_empty());
    }

    #[tokio::test]
    async fn convert_formats_screenplay() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, "scene.txt", "INT. HOUSE - DAY\nJOHN\nHello there.");
        let output = convert(&input, &plain_config()).await.unwrap();
        assert!(output.stats.screenplay);
        assert!(output.markdown.contains("## INT. HOUSE - DAY"));
        assert!(output.markdown.contains("**JOHN**"));
    }

    #[tokio::test]
    async fn convert_auto_removes_cross_page_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let body = "lowercase prose\nConfidential Draft\u{0C}more prose\nConfidential Draft\u{0C}final prose\nConfidential Draft";
        let input = write_input(&dir, "stamped.txt", body);
        let output = convert(&input, &plain_config()).await.unwrap();
        assert!(!output.markdown.contains("Confidential Draft"));
        assert_eq!(output.removed_phrases, vec!["Confidential Draft".to_string()]);
        assert_eq!(output.stats.removed_lines, 3);
        assert_eq!(output.stats.page_count, 3);
    }

    #[tokio::test]
    async fn keep_policy_leaves_watermarks() {
        let dir = tempfile::tempdir().unwrap();
        let body = "a\nStamp\u{0C}b\nStamp\u{0C}c\nStamp";
        let input = write_input(&dir, "stamped.txt", body);
        let config = ConversionConfig::builder()
            .extractor(Arc::new(PlainTextExtractor))
            .watermarks(WatermarkPolicy::Keep)
            .build()
            .unwrap();
        let output = convert(&input, &config).await.unwrap();
        assert!(output.markdown.contains("Stamp"));
        assert_eq!(output.stats.removed_lines, 0);
    }

    #[tokio::test]
    async fn convert_to_file_writes_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, "doc.txt", "INT. LAB - NIGHT\n");
        let config = ConversionConfig::builder()
            .extractor(Arc::new(PlainTextExtractor))
            .output_dir(dir.path().join("nested").join("out"))
            .build()
            .unwrap();
        let path = convert_to_file(&input, &config).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "doc.md");
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("## INT. LAB - NIGHT"));
        assert!(written.ends_with('\n'));
    }

    #[tokio::test]
    async fn missing_input_fails_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        let config = ConversionConfig::builder()
            .extractor(Arc::new(PlainTextExtractor))
            .output_dir(&out_dir)
            .build()
            .unwrap();
        let err = convert_to_file(dir.path().join("missing.txt"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, MinedownError::FileNotFound { .. }));
        assert!(!out_dir.exists(), "no output directory on failure");
    }
}
