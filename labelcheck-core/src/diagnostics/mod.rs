//! Root-Cause Diagnostics
//!
//! Offline explanation of why sampled products carry zero form-coverage
//! evidence. Reads products and taxonomy, never writes to them; the report
//! goes to a file or stdout as JSON.

pub mod classifier;
pub mod report;

pub use classifier::{
    classify_ingredient, classify_product, IngredientFinding, MismatchKind, ProductClassification,
    RootCause,
};
pub use report::{build_report, nearest_form_key, ReportLimits, RootCauseReport};

use crate::services::{ProductSource, ReferenceStore};
use labelcheck_common::config::DiagnosticsConfig;
use labelcheck_common::Result;
use std::io::Write;
use std::path::Path;
use tracing::info;

impl From<&DiagnosticsConfig> for ReportLimits {
    fn from(config: &DiagnosticsConfig) -> Self {
        Self {
            top_n: config.top_n,
            max_examples: config.max_examples,
        }
    }
}

/// Sample products, load their taxonomy, and build the report
pub async fn run_diagnostics(
    products: &ProductSource,
    reference: &dyn ReferenceStore,
    config: &DiagnosticsConfig,
) -> Result<RootCauseReport> {
    let ids = products
        .sample_product_ids(config.sample_size, config.seed)
        .await?;
    let sampled = products.load_products(&ids).await?;

    let ingredient_ids: Vec<i64> = sampled
        .iter()
        .filter(|p| p.has_zero_coverage())
        .flat_map(|p| p.active_ingredients())
        .filter_map(|i| i.ingredient_id)
        .collect();
    let reference_data = reference.load_reference(&ingredient_ids).await?;

    Ok(build_report(&sampled, &reference_data, config.into()))
}

/// Write the report as pretty JSON to `out`, or stdout when `None`
pub fn write_report(report: &RootCauseReport, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, json)?;
            info!(path = %path.display(), run_id = %report.run_id, "Wrote root-cause report");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}
