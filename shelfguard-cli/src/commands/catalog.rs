//! `shelfguard catalog` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use shelfguard_core::types::{ProductRecord, ProductStatus};
use shelfguard_resolver::ProductDirectory;

use crate::cli::{CatalogAction, CatalogArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `catalog` command.
pub async fn execute(
    args: CatalogArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        CatalogAction::List { catalog } => {
            let config = super::load_config(config_path).await?;
            let directory = super::build_directory(catalog.as_ref(), &config).await?;

            info!(products = directory.len(), "listing catalog");
            let products = directory.all().await?;
            writer.render(&CatalogListReport { products })?;
            Ok(())
        }
    }
}

/// Full catalog listing.
#[derive(Serialize)]
pub struct CatalogListReport {
    /// Every record in the catalog.
    pub products: Vec<ProductRecord>,
}

impl Render for CatalogListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "{:<15} {:<24} {:<12} {:<12} {:<8}",
            "Barcode", "Name", "Brand", "Expiry", "Status"
        )?;
        writeln!(w, "{}", "-".repeat(75))?;

        for product in &self.products {
            let status = match product.status {
                ProductStatus::Safe => "safe".green(),
                ProductStatus::Expired => "expired".red(),
            };
            writeln!(
                w,
                "{:<15} {:<24} {:<12} {:<12} {status}",
                product.barcode, product.name, product.brand, product.expiry_date
            )?;
        }
        writeln!(w)?;
        writeln!(w, "{} products", self.products.len())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_list_render() {
        let report = CatalogListReport {
            products: vec![ProductRecord {
                id: "1".to_owned(),
                barcode: "4780005111223".to_owned(),
                name: "Classic Milk 3.2%".to_owned(),
                brand: "Latto".to_owned(),
                category: "Dairy".to_owned(),
                expiry_date: "2026-03-15".to_owned(),
                status: ProductStatus::Safe,
                report_count: 0,
                image_url: String::new(),
            }],
        };

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("Barcode"), "should have a header row");
        assert!(output.contains("Classic Milk 3.2%"));
        assert!(output.contains("1 products"));
    }

    #[test]
    fn test_catalog_list_json() {
        let report = CatalogListReport { products: vec![] };
        let json = serde_json::to_string(&report).expect("JSON serialization should succeed");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("should parse JSON");
        assert_eq!(parsed["products"].as_array().map(Vec::len), Some(0));
    }
}
