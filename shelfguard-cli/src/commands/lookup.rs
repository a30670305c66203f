//! `shelfguard lookup` command handler

use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use shelfguard_core::types::{ProductRecord, ProductStatus};
use shelfguard_resolver::ProductDirectory;

use crate::cli::LookupArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `lookup` command.
///
/// Exact-match catalog lookup. The stored safety status is re-derived
/// against the current time before display.
pub async fn execute(
    args: LookupArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = super::load_config(config_path).await?;
    let directory = super::build_directory(args.catalog.as_ref(), &config).await?;

    info!(barcode = args.barcode.as_str(), "looking up barcode");
    let found = directory.find_by_barcode(&args.barcode).await?;

    let report = match found {
        Some(mut record) => {
            record.status = ProductStatus::evaluate(&record.expiry_date, Utc::now());
            LookupReport {
                barcode: args.barcode,
                found: true,
                product: Some(record),
            }
        }
        None => LookupReport {
            barcode: args.barcode,
            found: false,
            product: None,
        },
    };

    writer.render(&report)?;

    if !report.found {
        return Err(CliError::Command(format!(
            "barcode {} not found in catalog",
            report.barcode
        )));
    }
    Ok(())
}

/// Result of a catalog lookup.
#[derive(Serialize)]
pub struct LookupReport {
    /// Barcode that was looked up.
    pub barcode: String,
    /// Whether the barcode is in the catalog.
    pub found: bool,
    /// The matching record, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductRecord>,
}

impl Render for LookupReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.product {
            Some(record) => super::scan::render_product(w, record),
            None => {
                writeln!(w, "Result: {}", "NOT FOUND".yellow().bold())?;
                writeln!(w, "  Barcode: {}", self.barcode)?;
                Ok(())
            }
        }
    }
}
