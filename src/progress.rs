//! Conversion events and the background-worker handle.
//!
//! ## Why a channel instead of callbacks?
//!
//! A conversion runs on a single background task so the caller can keep a
//! terminal (or anything else) responsive while extraction grinds away. The
//! worker is the sole producer into an unbounded single-consumer channel and
//! the sole writer of the output artifact; the caller polls the channel
//! without blocking and renders interim status however it likes. The channel
//! gives three properties the rest of the crate relies on:
//!
//! - **FIFO**: events arrive in emission order (single writer).
//! - **Terminal exactly once**: the worker sends [`ConversionEvent::Done`] or
//!   [`ConversionEvent::Error`] as its last act, by construction — errors are
//!   flattened into the terminal event, never thrown across the boundary.
//! - **No cancellation**: once spawned, a conversion runs to its terminal
//!   event; dropping the handle merely detaches the worker.
//!
//! There are four event kinds, mirroring the stages a caller can display:
//! free-text status, a coarse 0–100 percentage, and the two terminals.

use std::path::PathBuf;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::config::ConversionConfig;
use crate::convert;
use crate::error::MinedownError;

/// One message from a background conversion worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionEvent {
    /// Human-readable stage description.
    Status(String),
    /// Coarse progress percentage, 0–100.
    Progress(u8),
    /// Terminal: the conversion failed. Carries the rendered error message.
    Error(String),
    /// Terminal: the conversion succeeded.
    Done(ConversionPayload),
}

impl ConversionEvent {
    /// Is this one of the two terminal events?
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversionEvent::Error(_) | ConversionEvent::Done(_))
    }
}

/// What a successful worker produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionPayload {
    /// Markdown was written here.
    File(PathBuf),
    /// Extraction-only mode: the raw extracted text.
    Text(String),
}

/// Consumer side of one background conversion.
///
/// Poll with [`try_recv`](Self::try_recv) from a render loop, await events
/// with [`recv`](Self::recv), or collapse the whole run to its terminal
/// outcome with [`wait`](Self::wait).
pub struct ConversionHandle {
    rx: UnboundedReceiver<ConversionEvent>,
    join: JoinHandle<()>,
}

impl ConversionHandle {
    /// Non-blocking poll. `None` when no event is buffered right now *or*
    /// the channel is closed; pair with [`is_finished`](Self::is_finished)
    /// to tell the cases apart.
    pub fn try_recv(&mut self) -> Option<ConversionEvent> {
        self.rx.try_recv().ok()
    }

    /// Await the next event. `None` once the worker is gone and the channel
    /// is drained.
    pub async fn recv(&mut self) -> Option<ConversionEvent> {
        self.rx.recv().await
    }

    /// Has the worker task exited? Buffered events may still be pending.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Drain events until the terminal one and return its outcome.
    ///
    /// Status and progress events are consumed and discarded. A worker that
    /// exits without a terminal event (a bug, or a panic in the worker)
    /// surfaces as [`MinedownError::Worker`].
    pub async fn wait(mut self) -> Result<ConversionPayload, MinedownError> {
        while let Some(event) = self.rx.recv().await {
            match event {
                ConversionEvent::Status(_) | ConversionEvent::Progress(_) => {}
                ConversionEvent::Error(reason) => return Err(MinedownError::Worker(reason)),
                ConversionEvent::Done(payload) => return Ok(payload),
            }
        }
        Err(MinedownError::Worker(
            "conversion worker exited without reporting a result".into(),
        ))
    }

    /// Adapt the handle into a `Stream` of events.
    pub fn into_stream(self) -> UnboundedReceiverStream<ConversionEvent> {
        UnboundedReceiverStream::new(self.rx)
    }
}

/// Convert `input` on a background task, writing the Markdown artifact.
///
/// The terminal [`ConversionEvent::Done`] carries
/// [`ConversionPayload::File`] with the written location. The output file is
/// written only after formatting fully succeeds; a failed run leaves no
/// partial file behind.
pub fn spawn_conversion(input: impl Into<PathBuf>, config: ConversionConfig) -> ConversionHandle {
    let input = input.into();
    let (tx, rx) = mpsc::unbounded_channel();
    let join = tokio::spawn(async move {
        let emit = |event| {
            let _ = tx.send(event);
        };
        let result = async {
            let output = convert::run_stages(&input, &config, &emit).await?;
            emit(ConversionEvent::Status("Writing output".into()));
            let path = convert::output_path(&input, &config);
            convert::write_markdown(&path, &output.markdown).await?;
            Ok::<_, MinedownError>(ConversionPayload::File(path))
        }
        .await;
        match result {
            Ok(payload) => {
                emit(ConversionEvent::Progress(100));
                emit(ConversionEvent::Done(payload));
            }
            Err(e) => emit(ConversionEvent::Error(e.to_string())),
        }
    });
    ConversionHandle { rx, join }
}

/// Extract text on a background task without converting it.
///
/// The terminal [`ConversionEvent::Done`] carries
/// [`ConversionPayload::Text`] with the raw extracted blob.
pub fn spawn_extraction(input: impl Into<PathBuf>, config: ConversionConfig) -> ConversionHandle {
    let input = input.into();
    let (tx, rx) = mpsc::unbounded_channel();
    let join = tokio::spawn(async move {
        let emit = |event| {
            let _ = tx.send(event);
        };
        emit(ConversionEvent::Status("Reading input".into()));
        match convert::extract_stage(&input, &config).await {
            Ok(extraction) => {
                emit(ConversionEvent::Status(format!(
                    "Extracted text via {}",
                    extraction.backend
                )));
                emit(ConversionEvent::Progress(100));
                emit(ConversionEvent::Done(ConversionPayload::Text(extraction.text)));
            }
            Err(e) => emit(ConversionEvent::Error(e.to_string())),
        }
    });
    ConversionHandle { rx, join }
}

// ── Tests ────────────────────────────────────────────────────────────────────
