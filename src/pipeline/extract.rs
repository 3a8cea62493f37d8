//! Text extraction backends.
//!
//! ## Why a backend chain?
//!
//! The library's own job starts at "a blob of extracted text"; getting that
//! blob out of a PDF is delegated to whatever is available on the host.
//! Backends are tried in order until one succeeds, and every backend failure
//! is remembered so the terminal error can say exactly what was attempted —
//! "extraction failed" with no detail is useless on a machine that simply
//! lacks poppler.
//!
//! Two backends ship by default:
//!
//! 1. [`PlainTextExtractor`] — `.txt`/`.text` files pass straight through
//!    (also the injection point integration tests use).
//! 2. [`PdftotextExtractor`] — the system `pdftotext` from poppler-utils,
//!    invoked with `-layout` so columns survive. pdftotext separates pages
//!    with the form-feed sentinel, which the rest of the pipeline expects.
//!
//! Extraction is best-effort Unicode: backend output is decoded lossily, so
//! a malformed byte never fails the run.
//!
//! Callers needing a different engine implement [`TextExtractor`] and inject
//! it through [`crate::config::ConversionConfigBuilder::extractor`].

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::MinedownError;

/// One extraction backend.
///
/// Implementations are synchronous; the orchestrator runs them on a blocking
/// thread. `Send + Sync` so a shared backend can cross into that thread.
pub trait TextExtractor: Send + Sync {
    /// Short backend name used in status events and error reports.
    fn name(&self) -> &'static str;

    /// Whether this backend can plausibly handle the given file.
    fn supports(&self, path: &Path) -> bool;

    /// Extract the full text of `path`, pages separated by the form-feed
    /// sentinel where the backend can tell pages apart.
    fn extract(&self, path: &Path) -> Result<String, MinedownError>;
}

/// The extracted blob plus the backend that produced it.
#[derive(Debug)]
pub struct Extraction {
    pub text: String,
    pub backend: &'static str,
}

// ── Plain text ───────────────────────────────────────────────────────────────

/// Reads `.txt`/`.text` files as-is (lossy UTF-8).
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "plain-text"
    }

    fn supports(&self, path: &Path) -> bool {
        extension_is(path, &["txt", "text"])
    }

    fn extract(&self, path: &Path) -> Result<String, MinedownError> {
        let bytes = std::fs::read(path).map_err(|e| MinedownError::Internal(format!(
            "failed to read '{}': {e}",
            path.display()
        )))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

// ── pdftotext ────────────────────────────────────────────────────────────────

/// Drives the system `pdftotext` binary (poppler-utils).
pub struct PdftotextExtractor {
    exe: PathBuf,
}

impl PdftotextExtractor {
    /// Look up `pdftotext` on PATH. `None` when it is not installed.
    pub fn locate() -> Option<Self> {
        which("pdftotext").map(|exe| Self { exe })
    }

    /// Use an explicit binary path (tests, unusual installs).
    pub fn with_binary(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }
}

impl TextExtractor for PdftotextExtractor {
    fn name(&self) -> &'static str {
        "pdftotext"
    }

    fn supports(&self, path: &Path) -> bool {
        extension_is(path, &["pdf"])
    }

    fn extract(&self, path: &Path) -> Result<String, MinedownError> {
        debug!("running {} -layout {}", self.exe.display(), path.display());
        let output = Command::new(&self.exe)
            .arg("-layout")
            .arg("-enc")
            .arg("UTF-8")
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| MinedownError::Internal(format!("failed to spawn pdftotext: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MinedownError::Internal(format!(
                "pdftotext exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn extension_is(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// Minimal PATH lookup for an executable.
fn which(cmd: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(cmd);
        if candidate.is_file() {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let candidate = dir.join(format!("{cmd}.exe"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

// ── Chain runner ─────────────────────────────────────────────────────────────

/// The default backend chain, in trial order.
pub fn default_extractors() -> Vec<Arc<dyn TextExtractor>> {
    let mut chain: Vec<Arc<dyn TextExtractor>> = vec![Arc::new(PlainTextExtractor)];
    if let Some(pdftotext) = PdftotextExtractor::locate() {
        chain.push(Arc::new(pdftotext));
    }
    chain
}

/// Try each applicable backend in order; the first success wins.
///
/// All backends failing (or none applying) yields
/// [`MinedownError::ExtractionFailed`] with a note per attempt.
pub fn extract_with_fallback(
    path: &Path,
    extractors: &[Arc<dyn TextExtractor>],
) -> Result<Extraction, MinedownError> {
    if !path.exists() {
        return Err(MinedownError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut attempts: Vec<String> = Vec::new();
    for extractor in extractors {
        if !extractor.supports(path) {
            attempts.push(format!("  • {}: does not handle this file type", extractor.name()));
            continue;
        }
        match extractor.extract(path) {
            Ok(text) => {
                info!("extracted {} chars via {}", text.len(), extractor.name());
                return Ok(Extraction {
                    text,
                    backend: extractor.name(),
                });
            }
            Err(e) => attempts.push(format!("  • {}: {e}", extractor.name())),
        }
    }
    if extractors.is_empty() {
        attempts.push("  • no extraction backend configured".to_string());
    }

    Err(MinedownError::ExtractionFailed {
        path: path.to_path_buf(),
        attempts: attempts.join("\n"),
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct FailingExtractor;

    impl TextExtractor for FailingExtractor {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn supports(&self, _path: &Path) -> bool {
            true
        }
        fn extract(&self, _path: &Path) -> Result<String, MinedownError> {
            Err(MinedownError::Internal("backend broke".into()))
        }
    }

    fn temp_txt(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn plain_text_supports_txt_only() {
        let ex = PlainTextExtractor;
        assert!(ex.supports(Path::new("a.txt")));
        assert!(ex.supports(Path::new("a.TXT")));
        assert!(ex.supports(Path::new("a.text")));
        assert!(!ex.supports(Path::new("a.pdf")));
        assert!(!ex.supports(Path::new("noext")));
    }

    #[test]
    fn pdftotext_supports_pdf_only() {
        let ex = PdftotextExtractor::with_binary("/usr/bin/pdftotext");
        assert!(ex.supports(Path::new("a.pdf")));
        assert!(!ex.supports(Path::new("a.txt")));
    }

    #[test]
    fn plain_text_round_trips() {
        let (_dir, path) = temp_txt("hello\u{0C}world");
        let extraction =
            extract_with_fallback(&path, &[Arc::new(PlainTextExtractor) as Arc<dyn TextExtractor>])
                .unwrap();
        assert_eq!(extraction.text, "hello\u{0C}world");
        assert_eq!(extraction.backend, "plain-text");
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let err = extract_with_fallback(Path::new("/no/such/file.txt"), &default_extractors())
            .unwrap_err();
        assert!(matches!(err, MinedownError::FileNotFound { .. }));
    }

    #[test]
    fn fallback_skips_failing_backend() {
        let (_dir, path) = temp_txt("content");
        let chain: Vec<Arc<dyn TextExtractor>> =
            vec![Arc::new(FailingExtractor), Arc::new(PlainTextExtractor)];
        let extraction = extract_with_fallback(&path, &chain).unwrap();
        assert_eq!(extraction.backend, "plain-text");
    }

    #[test]
    fn all_backends_failing_reports_each_attempt() {
        let (_dir, path) = temp_txt("content");
        let chain: Vec<Arc<dyn TextExtractor>> = vec![Arc::new(FailingExtractor)];
        let err = extract_with_fallback(&path, &chain).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("failing"), "got: {msg}");
        assert!(msg.contains("backend broke"), "got: {msg}");
    }

    #[test]
    fn empty_chain_fails_cleanly() {
        let (_dir, path) = temp_txt("content");
        let err = extract_with_fallback(&path, &[]).unwrap_err();
        assert!(matches!(err, MinedownError::ExtractionFailed { .. }));
    }
}
