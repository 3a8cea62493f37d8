//! Configuration types for text-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to hand a config to the background worker, log it, and diff two
//! runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! Callers set only what they care about and rely on documented defaults for
//! the rest; new fields never break existing call sites.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::MinedownError;
use crate::pipeline::extract::TextExtractor;

/// How watermark removal behaves during a conversion.
///
/// | Policy | Behaviour |
/// |--------|-----------|
/// | `Auto` | remove every strong candidate (default) |
/// | `Approved` | remove exactly the caller-approved phrases |
/// | `Keep` | leave the text untouched |
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatermarkPolicy {
    /// Detect strong candidates and remove all of them. (default)
    #[default]
    Auto,
    /// Remove exactly these phrases (exact or substring match after
    /// normalisation).
    Approved(Vec<String>),
    /// Do not touch watermarks.
    Keep,
}

/// Whether the screenplay formatter runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenplayMode {
    /// Run the classifier and format only when it is positive. (default)
    #[default]
    Auto,
    /// Always format as a screenplay.
    Always,
    /// Never format; pass text through with minimal cleanup.
    Never,
}

/// Configuration for one conversion.
///
/// Built via [`ConversionConfig::builder()`] or [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use minedown::{ConversionConfig, WatermarkPolicy};
///
/// let config = ConversionConfig::builder()
///     .watermarks(WatermarkPolicy::Approved(vec!["Confidential Draft".into()]))
///     .output_dir("out")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Watermark removal policy. Default: [`WatermarkPolicy::Auto`].
    pub watermarks: WatermarkPolicy,

    /// Screenplay formatting mode. Default: [`ScreenplayMode::Auto`].
    pub screenplay: ScreenplayMode,

    /// Directory the Markdown file is written to. `None` (default) writes
    /// alongside the input. Created if absent.
    pub output_dir: Option<PathBuf>,

    /// Maximum candidates shown by ranked-candidate listings. Default: 20.
    ///
    /// Detection itself is never truncated; this only bounds presentation
    /// (and the index space of a by-index selection).
    pub candidate_limit: usize,

    /// Extraction backend override. `None` (default) tries the built-in
    /// chain; `Some` uses exactly this backend. The injection point for
    /// tests and for callers with their own PDF engine.
    pub extractor: Option<Arc<dyn TextExtractor>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            watermarks: WatermarkPolicy::default(),
            screenplay: ScreenplayMode::default(),
            output_dir: None,
            candidate_limit: 20,
            extractor: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("watermarks", &self.watermarks)
            .field("screenplay", &self.screenplay)
            .field("output_dir", &self.output_dir)
            .field("candidate_limit", &self.candidate_limit)
            .field("extractor", &self.extractor.as_ref().map(|e| e.name()))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn watermarks(mut self, policy: WatermarkPolicy) -> Self {
        self.config.watermarks = policy;
        self
    }

    pub fn screenplay(mut self, mode: ScreenplayMode) -> Self {
        self.config.screenplay = mode;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn candidate_limit(mut self, n: usize) -> Self {
        self.config.candidate_limit = n;
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, MinedownError> {
        let c = &self.config;
        if c.candidate_limit == 0 {
            return Err(MinedownError::InvalidConfig(
                "candidate limit must be ≥ 1".into(),
            ));
        }
        if let WatermarkPolicy::Approved(phrases) = &c.watermarks {
            if phrases.iter().all(|p| p.trim().is_empty()) {
                return Err(MinedownError::InvalidConfig(
                    "approved watermark phrase list is empty or all-blank".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConversionConfig::builder().build().unwrap();
        assert_eq!(config.watermarks, WatermarkPolicy::Auto);
        assert_eq!(config.screenplay, ScreenplayMode::Auto);
        assert!(config.output_dir.is_none());
        assert_eq!(config.candidate_limit, 20);
        assert!(config.extractor.is_none());
    }

    #[test]
    fn zero_candidate_limit_rejected() {
        let err = ConversionConfig::builder().candidate_limit(0).build();
        assert!(matches!(err, Err(MinedownError::InvalidConfig(_))));
    }

    #[test]
    fn blank_approved_list_rejected() {
        let err = ConversionConfig::builder()
            .watermarks(WatermarkPolicy::Approved(vec!["  ".into()]))
            .build();
        assert!(matches!(err, Err(MinedownError::InvalidConfig(_))));
    }

    #[test]
    fn debug_shows_extractor_name_only() {
        use crate::pipeline::extract::PlainTextExtractor;
        let config = ConversionConfig::builder()
            .extractor(Arc::new(PlainTextExtractor))
            .build()
            .unwrap();
        let rendered = format!("{config:?}");
        assert!(rendered.contains("plain-text"), "got: {rendered}");
    }
}
