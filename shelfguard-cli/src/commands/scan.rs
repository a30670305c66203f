//! `shelfguard scan` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use shelfguard_core::types::{ProductRecord, ProductStatus, ScanOutcome};
use shelfguard_session::ScanOrchestrator;

use crate::cli::ScanArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `scan` command.
///
/// Resolves a single decoded payload through the full pipeline:
/// normalization, then directory lookup when the payload is not a
/// structured QR object.
pub async fn execute(
    args: ScanArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = super::load_config(config_path).await?;
    let directory = super::build_directory(args.catalog.as_ref(), &config).await?;

    let (mut orchestrator, _events) = ScanOrchestrator::builder()
        .directory(Arc::new(directory))
        .history_capacity(config.history.capacity)
        .build()
        .map_err(|e| CliError::Command(e.to_string()))?;

    info!(payload_len = args.payload.len(), "resolving scan payload");
    let outcome = orchestrator.submit_scan(&args.payload).await?;

    writer.render(&ScanReport { outcome })?;
    Ok(())
}

/// Result of resolving one scan payload.
#[derive(Serialize)]
pub struct ScanReport {
    /// The resolution outcome (tagged by `result`).
    #[serde(flatten)]
    pub outcome: ScanOutcome,
}

impl Render for ScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match &self.outcome {
            ScanOutcome::Resolved(record) => render_product(w, record),
            ScanOutcome::Unknown { barcode } => {
                use colored::Colorize;
                writeln!(w, "Result: {}", "UNKNOWN PRODUCT".yellow().bold())?;
                writeln!(w, "  Barcode: {barcode}")?;
                writeln!(w, "  This barcode is not in the catalog.")?;
                Ok(())
            }
        }
    }
}

/// Shared product rendering used by scan, lookup, and watch output.
pub fn render_product(w: &mut dyn Write, record: &ProductRecord) -> std::io::Result<()> {
    use colored::Colorize;

    let status = match record.status {
        ProductStatus::Safe => "SAFE".green().bold(),
        ProductStatus::Expired => "EXPIRED".red().bold(),
    };
    writeln!(w, "{} ({})", record.name.bold(), record.brand)?;
    writeln!(w, "  Status:   {status}")?;
    writeln!(w, "  Category: {}", record.category)?;
    writeln!(w, "  Barcode:  {}", record.barcode)?;
    writeln!(w, "  Expiry:   {}", record.expiry_date)?;
    if record.report_count > 0 {
        writeln!(w, "  Reports:  {}", record.report_count)?;
    }
    Ok(())
}
