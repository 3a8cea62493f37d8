//! # minedown
//!
//! Convert extracted PDF text to clean, screenplay-aware Markdown.
//!
//! ## Why this crate?
//!
//! Text pulled out of a PDF is messy in two specific, fixable ways: repeating
//! boilerplate (draft stamps, headers, footers) litters every page, and any
//! structure the document had — scene headings, speaker names, transitions —
//! arrives as undifferentiated plain lines. This crate detects watermark
//! lines by counting their recurrence across pages, strips the approved ones,
//! and, when the document looks like a screenplay, rewrites its structural
//! lines as Markdown.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input
//!  │
//!  ├─ 1. Extract    pdftotext / plain text / custom backend
//!  ├─ 2. Pages      split on the form-feed sentinel
//!  ├─ 3. Watermark  cross-page frequency analysis + approved removal
//!  ├─ 4. Classify   screenplay or plain prose
//!  ├─ 5. Format     scene headings, cues, dialogue → Markdown
//!  └─ 6. Output     `<dir>/<stem>.md`, written atomically
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use minedown::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let written = convert_to_file("screenplay.pdf", &config).await?;
//!     println!("wrote {}", written.display());
//!     Ok(())
//! }
//! ```
//!
//! For a responsive foreground, spawn the conversion on a background worker
//! and poll its event channel:
//!
//! ```rust,no_run
//! use minedown::{spawn_conversion, ConversionConfig, ConversionEvent};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut handle = spawn_conversion("screenplay.pdf", ConversionConfig::default());
//!     while let Some(event) = handle.recv().await {
//!         match event {
//!             ConversionEvent::Status(s) => eprintln!("{s}"),
//!             ConversionEvent::Progress(p) => eprintln!("{p}%"),
//!             ConversionEvent::Error(e) => { eprintln!("failed: {e}"); break; }
//!             ConversionEvent::Done(payload) => { println!("{payload:?}"); break; }
//!         }
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `minedown` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! minedown = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ScreenplayMode, WatermarkPolicy};
pub use convert::{
    convert, convert_to_file, extract_only, output_path, render_markdown, write_markdown,
};
pub use error::MinedownError;
pub use output::{ConversionOutput, ConversionStats};
pub use pipeline::extract::{
    default_extractors, PdftotextExtractor, PlainTextExtractor, TextExtractor,
};
pub use pipeline::pages::{join_pages, normalize_line, split_pages, PAGE_BREAK};
pub use pipeline::screenplay::{
    format_screenplay, is_character_cue, is_scene_heading, is_transition, looks_like_screenplay,
};
pub use pipeline::watermark::{
    detect_candidates, remove_phrases, strong_candidates, strong_threshold, WatermarkCandidate,
};
pub use progress::{
    spawn_conversion, spawn_extraction, ConversionEvent, ConversionHandle, ConversionPayload,
};
