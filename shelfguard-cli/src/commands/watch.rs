//! `shelfguard watch` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use shelfguard_capture::{CaptureSession, ReplayDecoder};
use shelfguard_core::types::ScanOutcome;
use shelfguard_session::ScanOrchestrator;

use crate::cli::WatchArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `watch` command.
///
/// Reads decoded frames (one per line) from a file or stdin and runs one
/// capture session per frame, printing each resolution as it happens.
pub async fn execute(
    args: WatchArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = super::load_config(config_path).await?;
    let directory = super::build_directory(args.catalog.as_ref(), &config).await?;

    let frames = read_frames(args.input.as_deref()).await?;
    if frames.is_empty() {
        warn!("no frames to replay");
        return Ok(());
    }
    info!(count = frames.len(), "replaying decoded frames");

    let decoder = ReplayDecoder::new(frames);
    let observer = decoder.clone();
    let shared = Arc::new(decoder);

    let (mut orchestrator, _events) = ScanOrchestrator::builder()
        .directory(Arc::new(directory))
        .history_capacity(config.history.capacity)
        .build()
        .map_err(|e| CliError::Command(e.to_string()))?;

    let mut session_no = 0u64;
    while observer.remaining() > 0 {
        session_no += 1;
        let mut session = CaptureSession::from_config(Arc::clone(&shared), &config.capture)
            .map_err(|e| CliError::Config(e.to_string()))?;
        let outcome = orchestrator.run_capture(&mut session).await?;
        writer.render(&WatchEntry {
            session: session_no,
            outcome,
        })?;
    }

    writer.render(&WatchSummary {
        sessions: session_no,
        resolved: orchestrator.scans_resolved(),
        unknown: orchestrator.unknown_products(),
        history: orchestrator.history().len() as u64,
    })?;
    Ok(())
}

async fn read_frames(input: Option<&Path>) -> Result<Vec<String>, CliError> {
    let content = match input {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut buf = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)?;
            buf
        }
    };
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

/// One resolved frame in a watch run.
#[derive(Serialize)]
pub struct WatchEntry {
    /// 1-based capture session number.
    pub session: u64,
    /// The resolution outcome.
    #[serde(flatten)]
    pub outcome: ScanOutcome,
}

impl Render for WatchEntry {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "--- session {} ---", self.session)?;
        match &self.outcome {
            ScanOutcome::Resolved(record) => super::scan::render_product(w, record),
            ScanOutcome::Unknown { barcode } => {
                writeln!(w, "{}: {barcode}", "unknown barcode".yellow())
            }
        }
    }
}

/// Totals printed after the last frame.
#[derive(Serialize)]
pub struct WatchSummary {
    /// Capture sessions run.
    pub sessions: u64,
    /// Scans resolved to a product.
    pub resolved: u64,
    /// Scans for unknown barcodes.
    pub unknown: u64,
    /// Entries left in the recent history.
    pub history: u64,
}

impl Render for WatchSummary {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w)?;
        writeln!(
            w,
            "{} sessions: {} resolved, {} unknown ({} in history)",
            self.sessions, self.resolved, self.unknown, self.history
        )
    }
}
