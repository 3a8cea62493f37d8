//! Pipeline stages for text-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap
//! implementations (e.g. a different extraction backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ pages ──▶ watermark ──▶ screenplay
//! (path)   (backends)  (split +  (detect and   (classify and
//!                       normalise) strip)       reformat)
//! ```
//!
//! 1. [`extract`]    — pull the raw text blob out of the input file; the only
//!    stage with process I/O, run on a blocking thread
//! 2. [`pages`]      — page-break sentinel handling and line normalisation
//! 3. [`watermark`]  — cross-page frequency analysis, candidate ranking, and
//!    approved-phrase removal
//! 4. [`screenplay`] — line classification heuristics and the Markdown
//!    formatter

pub mod extract;
pub mod pages;
pub mod screenplay;
pub mod watermark;
