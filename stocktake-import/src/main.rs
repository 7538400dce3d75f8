//! Catalog import - CSV → embedded store
//!
//! One-shot batch job: reads `data/cadastro_produtos.csv` from the working
//! directory (no flags), replaces the product catalog wholesale and prints
//! a summary. Counted items and history reference the outgoing catalog, so
//! they are removed first.
//!
//! Run it while the server is stopped - the embedded store is
//! single-process and the import opens the same work directory.

mod csv;
mod record;

use anyhow::Context;

use record::{RejectedRow, parse_record};
use stocktake_server::core::Config;
use stocktake_server::db::DbService;
use stocktake_server::db::models::ProductCreate;
use stocktake_server::db::repository::{CountedItemRepository, ProductRepository};

const SOURCE_PATH: &str = "data/cadastro_produtos.csv";
const BATCH_SIZE: usize = 500;
/// How many rejected rows are echoed individually before summarizing
const REJECT_ECHO_LIMIT: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stocktake_server::setup_environment()
        .map_err(|e| anyhow::anyhow!("environment setup failed: {e}"))?;

    tracing::info!("Catalog import: {SOURCE_PATH} -> embedded store");

    // 1. Read the source file; a missing file is fatal
    let content = std::fs::read_to_string(SOURCE_PATH)
        .with_context(|| format!("Source file not found or unreadable: {SOURCE_PATH}"))?;

    let (records, rejects) = parse_catalog(&content);
    report_rejects(&rejects);
    tracing::info!("Valid products: {}", records.len());

    // 2. Open the server's store
    let config = Config::from_env();
    config
        .ensure_work_dir_structure()
        .context("Failed to create work directory")?;
    let db_path = config.database_dir().join("stocktake.db");
    let db = DbService::open(&db_path.to_string_lossy())
        .await
        .context("Failed to open database (is the server still running?)")?
        .db;

    let products = ProductRepository::new(db.clone());
    let items = CountedItemRepository::new(db);

    // 3. Destructive resync: the catalog is replaced, not merged, so
    //    dependent rows go first
    let existing = products.count().await.map_err(to_anyhow)?;
    if existing > 0 {
        tracing::info!("Removing {existing} existing products and their counted items");
    }
    items.delete_all_history().await.map_err(to_anyhow)?;
    items.delete_all().await.map_err(to_anyhow)?;
    products.delete_all().await.map_err(to_anyhow)?;

    // 4. Batched insert with per-record fallback
    let total = records.len();
    let total_batches = total.div_ceil(BATCH_SIZE);
    let mut inserted = 0usize;
    let mut failed = 0usize;

    for (batch_index, batch) in records.chunks(BATCH_SIZE).enumerate() {
        match products.insert_many(batch.to_vec()).await {
            Ok(count) => inserted += count,
            Err(batch_err) => {
                // One bad record must not block the rest of the batch:
                // retry each row on its own and report the offenders
                tracing::warn!(
                    "Batch {}/{} failed ({}); retrying records individually",
                    batch_index + 1,
                    total_batches,
                    batch_err
                );
                for record in batch {
                    match products.create(record.clone()).await {
                        Ok(_) => inserted += 1,
                        Err(e) => {
                            failed += 1;
                            tracing::error!("Product {}: {}", record.code, e);
                        }
                    }
                }
            }
        }

        let done = (batch_index + 1) * BATCH_SIZE;
        let percent = (done.min(total) * 100) / total.max(1);
        tracing::info!(
            "Progress: {percent}% (batch {}/{}) - {inserted} inserted",
            batch_index + 1,
            total_batches
        );
    }

    // 5. Summary, with the persisted total read back from the store
    let persisted = products.count().await.map_err(to_anyhow)?;
    tracing::info!("Import finished: {inserted} inserted, {failed} failed");
    tracing::info!("Products in store: {persisted}");

    Ok(())
}

/// Parse every data line of the source file. The first non-blank line is
/// the header (logged, not validated); blank lines are skipped. Line
/// numbers in rejects are 1-based positions in the file.
fn parse_catalog(content: &str) -> (Vec<ProductCreate>, Vec<RejectedRow>) {
    let mut records = Vec::new();
    let mut rejects = Vec::new();
    let mut header_seen = false;

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = csv::parse_line(line);

        if !header_seen {
            header_seen = true;
            tracing::info!("Columns: {}", fields.join(" | "));
            continue;
        }

        match parse_record(&fields) {
            Ok(record) => records.push(record),
            Err(reason) => rejects.push(RejectedRow {
                line_number: index + 1,
                reason,
                raw: line.to_string(),
            }),
        }
    }

    (records, rejects)
}

fn report_rejects(rejects: &[RejectedRow]) {
    if rejects.is_empty() {
        return;
    }
    tracing::warn!("Rejected rows: {}", rejects.len());
    for reject in rejects.iter().take(REJECT_ECHO_LIMIT) {
        tracing::warn!(
            "  line {}: {} ({})",
            reject.line_number,
            reject.reason,
            reject.raw
        );
    }
    if rejects.len() > REJECT_ECHO_LIMIT {
        tracing::warn!("  ... and {} more", rejects.len() - REJECT_ECHO_LIMIT);
    }
}

fn to_anyhow(err: stocktake_server::db::repository::RepoError) -> anyhow::Error {
    anyhow::anyhow!(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RowError;

    #[test]
    fn splits_header_data_and_rejects() {
        let content = "\
CÓDIGO EAN;DESCRIÇÃO;CÓDIGO INTERNO
7891000100101;Adubo NPK;ADUBO001

;Sementes de Milho;SEMENTE002
só-dois-campos;X
;;
";
        let (records, rejects) = parse_catalog(content);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code, "ADUBO001");
        assert!(records[1].barcode.is_none());

        assert_eq!(rejects.len(), 2);
        assert_eq!(rejects[0].reason, RowError::MalformedRow(2));
        assert_eq!(rejects[0].line_number, 5);
        assert_eq!(
            rejects[1].reason,
            RowError::MissingRequiredField("description")
        );
    }

    #[test]
    fn empty_file_yields_nothing() {
        let (records, rejects) = parse_catalog("");
        assert!(records.is_empty());
        assert!(rejects.is_empty());
    }
}
