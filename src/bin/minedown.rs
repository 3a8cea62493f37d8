//! CLI binary for minedown.
//!
//! A thin shim over the library crate: maps flags to `ConversionConfig`,
//! drives background workers, and renders their event channel as a spinner.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use minedown::{
    convert, detect_candidates, output_path, render_markdown, remove_phrases, spawn_conversion,
    spawn_extraction, split_pages, strong_threshold, write_markdown, ConversionConfig,
    ConversionEvent, ConversionHandle, ConversionPayload, MinedownError, ScreenplayMode,
    WatermarkCandidate, WatermarkPolicy,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a PDF, auto-removing strong watermark candidates
  minedown screenplay.pdf

  # Choose the output directory
  minedown screenplay.pdf -o converted/

  # See what would be removed, then remove by index
  minedown --list-watermarks draft.pdf
  minedown --pick 1,3 draft.pdf

  # Remove specific phrases instead
  minedown --approve "Confidential Draft;Property of Studio" draft.pdf

  # Keep watermarks, force screenplay formatting
  minedown --keep-watermarks --screenplay always script.pdf

  # Extract the raw text only (stdout, no file written)
  minedown --extract-only document.pdf

  # Full structured result as JSON (stdout, no file written)
  minedown --json document.pdf

WATERMARK DETECTION:
  A candidate is a short line (2-60 chars, not a bare page number) that
  recurs across pages; it is *strong* when it appears on at least
  max(3, 60% of pages) pages. The default policy removes every strong
  candidate. Single-page documents never have strong candidates.

ENVIRONMENT VARIABLES:
  MINEDOWN_OUTPUT_DIR       Default output directory
  MINEDOWN_KEEP_WATERMARKS  Disable watermark removal
  MINEDOWN_SCREENPLAY       auto | always | never

EXTRACTION BACKENDS:
  .txt/.text files are read directly; PDFs require `pdftotext` from
  poppler-utils on PATH (Debian/Ubuntu: apt install poppler-utils).
"#;

/// Convert extracted PDF text to clean, screenplay-aware Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "minedown",
    version,
    about = "Convert PDF text to clean, screenplay-aware Markdown",
    long_about = "Convert a PDF (or plain-text) document to cleaned Markdown: repeating \
watermark lines are detected across pages and stripped, and screenplay structure (scene \
headings, character cues, parentheticals, transitions) is rewritten as Markdown.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input document: a PDF or a plain-text file.
    input: PathBuf,

    /// Output directory for the Markdown file (default: alongside the input).
    #[arg(short = 'o', long, env = "MINEDOWN_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Print the raw extracted text to stdout; no file is written.
    #[arg(long)]
    extract_only: bool,

    /// List ranked watermark candidates and exit; no file is written.
    #[arg(long)]
    list_watermarks: bool,

    /// Disable watermark removal entirely.
    #[arg(long, env = "MINEDOWN_KEEP_WATERMARKS")]
    keep_watermarks: bool,

    /// Remove these phrases (separate multiple phrases with ';').
    #[arg(long, value_delimiter = ';')]
    approve: Vec<String>,

    /// Remove candidates by 1-based index into the ranked listing, e.g. "1,3".
    #[arg(long)]
    pick: Option<String>,

    /// Screenplay formatting: auto-detect, force on, or force off.
    #[arg(long, value_enum, default_value = "auto", env = "MINEDOWN_SCREENPLAY")]
    screenplay: ScreenplayArg,

    /// Maximum candidates shown by --list-watermarks and addressable by --pick.
    #[arg(long, default_value_t = 20)]
    candidates: usize,

    /// Output the structured conversion result as JSON instead of writing a file.
    #[arg(long, env = "MINEDOWN_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "MINEDOWN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MINEDOWN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, env = "MINEDOWN_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ScreenplayArg {
    Auto,
    Always,
    Never,
}

impl From<ScreenplayArg> for ScreenplayMode {
    fn from(v: ScreenplayArg) -> Self {
        match v {
            ScreenplayArg::Auto => ScreenplayMode::Auto,
            ScreenplayArg::Always => ScreenplayMode::Always,
            ScreenplayArg::Never => ScreenplayMode::Never,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner renders all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let handle = spawn_extraction(&cli.input, config);
        let text = expect_text(run_with_spinner(handle, show_progress).await?)?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(text.as_bytes()).context("Failed to write to stdout")?;
        if !text.ends_with('\n') {
            out.write_all(b"\n").ok();
        }
        return Ok(());
    }

    // ── Candidate listing mode ───────────────────────────────────────────
    if cli.list_watermarks {
        let handle = spawn_extraction(&cli.input, config);
        let text = expect_text(run_with_spinner(handle, show_progress).await?)?;
        let pages = split_pages(&text);
        let ranked = detect_candidates(&pages);
        let threshold = strong_threshold(pages.len());

        if cli.json {
            let shown: Vec<&WatermarkCandidate> = ranked.iter().take(cli.candidates).collect();
            println!("{}", serde_json::to_string_pretty(&shown)?);
        } else {
            print_candidates(&ranked, cli.candidates, threshold, pages.len());
        }
        return Ok(());
    }

    // ── Pick-by-index mode ───────────────────────────────────────────────
    if let Some(ref picks) = cli.pick {
        let mode: ScreenplayMode = cli.screenplay.into();
        let handle = spawn_extraction(&cli.input, config.clone());
        let text = expect_text(run_with_spinner(handle, show_progress).await?)?;
        let approved = {
            let pages = split_pages(&text);
            let ranked = detect_candidates(&pages);
            let shown = ranked.len().min(cli.candidates);
            resolve_picks(picks, &ranked, shown)?
        };

        if !cli.quiet {
            eprintln!("Removing: {}", bold(&approved.join(", ")));
        }
        let cleaned = remove_phrases(&text, &approved);
        let markdown = render_markdown(&cleaned, mode);
        let path = output_path(&cli.input, &config);
        write_markdown(&path, &markdown).await?;
        if !cli.quiet {
            eprintln!("{} {}", green("✔"), bold(&path.display().to_string()));
        }
        return Ok(());
    }

    // ── JSON mode: eager conversion, structured result on stdout ─────────
    if cli.json {
        let output = convert(&cli.input, &config).await.context("Conversion failed")?;
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    // ── Default: background conversion with spinner ──────────────────────
    let handle = spawn_conversion(&cli.input, config);
    match run_with_spinner(handle, show_progress).await? {
        ConversionPayload::File(path) => {
            if !cli.quiet {
                eprintln!("{} {}", green("✔"), bold(&path.display().to_string()));
            }
        }
        ConversionPayload::Text(_) => bail!("conversion worker returned no output location"),
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let watermarks = if cli.keep_watermarks {
        WatermarkPolicy::Keep
    } else if !cli.approve.is_empty() {
        WatermarkPolicy::Approved(cli.approve.clone())
    } else {
        WatermarkPolicy::Auto
    };

    let mut builder = ConversionConfig::builder()
        .watermarks(watermarks)
        .screenplay(cli.screenplay.into())
        .candidate_limit(cli.candidates.max(1));
    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }
    builder.build().context("Invalid configuration")
}

/// Poll the worker's event channel, rendering status on a spinner.
///
/// Terminates on the terminal event; a worker that dies without one is an
/// error. Events are handled strictly in arrival (= emission) order.
async fn run_with_spinner(mut handle: ConversionHandle, show: bool) -> Result<ConversionPayload> {
    let bar = if show { spinner() } else { ProgressBar::hidden() };
    let mut status = String::from("Working");

    loop {
        let finished = handle.is_finished();
        while let Some(event) = handle.try_recv() {
            match event {
                ConversionEvent::Status(s) => {
                    status = s;
                    bar.set_message(status.clone());
                }
                ConversionEvent::Progress(p) => {
                    bar.set_message(format!("{status} — {p}%"));
                }
                ConversionEvent::Error(reason) => {
                    bar.finish_and_clear();
                    bail!(reason);
                }
                ConversionEvent::Done(payload) => {
                    bar.finish_and_clear();
                    return Ok(payload);
                }
            }
        }
        if finished {
            // The channel was fully drained above and no terminal arrived.
            bar.finish_and_clear();
            bail!("conversion worker exited without reporting a result");
        }
        tokio::time::sleep(Duration::from_millis(80)).await;
    }
}

fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.magenta} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER_FRAMES),
    );
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn expect_text(payload: ConversionPayload) -> Result<String> {
    match payload {
        ConversionPayload::Text(text) => Ok(text),
        ConversionPayload::File(path) => {
            bail!("expected raw text from worker, got a file: {}", path.display())
        }
    }
}

/// Render the ranked candidate table.
fn print_candidates(ranked: &[WatermarkCandidate], limit: usize, threshold: usize, page_count: usize) {
    if ranked.is_empty() {
        println!("No watermark candidates detected.");
        return;
    }
    println!(
        "{} candidate(s) across {} page(s)  {}",
        ranked.len(),
        page_count,
        dim(&format!("(strong ≥ {threshold} pages)"))
    );
    for (i, candidate) in ranked.iter().take(limit).enumerate() {
        let marker = if candidate.pages >= threshold {
            green("●")
        } else {
            dim("○")
        };
        println!(
            "  {:>2}) {} {}  {}",
            i + 1,
            marker,
            candidate.phrase,
            dim(&format!("[{} pages]", candidate.pages))
        );
    }
    if ranked.len() > limit {
        println!("  {}", cyan(&format!("… {} more not shown", ranked.len() - limit)));
    }
}

/// Resolve a "1,3" selection string against the ranked listing.
fn resolve_picks(
    picks: &str,
    ranked: &[WatermarkCandidate],
    shown: usize,
) -> Result<Vec<String>, MinedownError> {
    if shown == 0 {
        return Err(MinedownError::InvalidSelection(
            "no watermark candidates to pick from".into(),
        ));
    }
    let mut phrases = Vec::new();
    for part in picks.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let index: usize = part.parse().map_err(|_| {
            MinedownError::InvalidSelection(format!("'{part}' is not a candidate index"))
        })?;
        if !(1..=shown).contains(&index) {
            return Err(MinedownError::InvalidSelection(format!(
                "candidate index {index} out of range (1-{shown})"
            )));
        }
        phrases.push(ranked[index - 1].phrase.clone());
    }
    if phrases.is_empty() {
        return Err(MinedownError::InvalidSelection(
            "no candidate indices given".into(),
        ));
    }
    Ok(phrases)
}
