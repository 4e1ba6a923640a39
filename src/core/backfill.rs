//! Sample line-item backfill for historical sales.
//!
//! Sales recorded before line items were captured have an empty or missing
//! `productos` list, which breaks reports that walk the items. The backfill
//! gives each such sale a plausible list whose subtotals add up to the sale
//! total. It runs once over the entire `ventas` collection, one document at a
//! time, and stops at the first failed write.

use crate::{
    core::{
        documents::{DocumentStore, Fields, StoredDocument},
        values::coerce_amount,
    },
    errors::Result,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

/// Collection holding sales.
pub const SALES_COLLECTION: &str = "ventas";

/// Field holding a sale's line items.
pub const LINE_ITEMS_FIELD: &str = "productos";

/// Each full step of this amount adds one item, up to [`MAX_SAMPLE_ITEMS`].
pub const ITEM_THRESHOLD: f64 = 10_000.0;

/// Upper bound on synthesized items per sale.
pub const MAX_SAMPLE_ITEMS: u32 = 3;

/// One line item of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product reference (`sample-product-<n>` for synthesized items)
    pub producto_id: String,
    /// Display name
    pub nombre: String,
    /// Units sold
    pub cantidad: u32,
    /// Price per unit
    pub precio_unitario: f64,
    /// `cantidad * precio_unitario`
    pub subtotal: f64,
}

/// Options for a backfill run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackfillOptions {
    /// Compute everything but write nothing
    pub dry_run: bool,
}

/// Outcome of a backfill run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackfillReport {
    /// Sales read from the collection
    pub scanned: usize,
    /// Sales that received a new line-item list (or would have, in a dry run)
    pub updated: usize,
    /// Sales left untouched because they already had items
    pub skipped_with_items: usize,
    /// Zero-total sales that already had an empty list
    pub skipped_empty: usize,
    /// Line items synthesized across all updated sales
    pub items_created: usize,
    /// Whether this was a dry run
    pub dry_run: bool,
}

/// Number of sample items for a sale total: `clamp(floor(total / 10000) + 1, 1, 3)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn sample_item_count(total: f64) -> u32 {
    let steps = (total / ITEM_THRESHOLD).floor();
    if steps.is_nan() || steps < 0.0 {
        return 1;
    }
    let steps = steps.min(f64::from(MAX_SAMPLE_ITEMS)) as u32;
    (steps + 1).clamp(1, MAX_SAMPLE_ITEMS)
}

/// Synthesizes sample line items for a sale total.
///
/// Every item but the last costs `round(total / count)`. The last item takes
/// the remainder, so the subtotals add up to `total` exactly. A total of zero
/// or less yields no items.
#[must_use]
pub fn synthesize_line_items(total: f64) -> Vec<LineItem> {
    if !total.is_finite() || total <= 0.0 {
        return Vec::new();
    }

    let count = sample_item_count(total);
    let base_price = (total / f64::from(count)).round();
    let last_price = total - base_price * f64::from(count - 1);

    (1..=count)
        .map(|index| {
            let price = if index == count { last_price } else { base_price };
            LineItem {
                producto_id: format!("sample-product-{index}"),
                nombre: format!("Producto de muestra {index}"),
                cantidad: 1,
                precio_unitario: price,
                subtotal: price,
            }
        })
        .collect()
}

/// Whether a sale already carries a non-empty line-item list.
#[must_use]
pub fn has_line_items(sale: &StoredDocument) -> bool {
    sale.fields
        .get(LINE_ITEMS_FIELD)
        .and_then(Value::as_array)
        .is_some_and(|items| !items.is_empty())
}

/// What the backfill does with one sale.
#[derive(Debug, Clone, PartialEq)]
pub enum SalePlan {
    /// Already has items
    KeepItems,
    /// Zero total and an empty list already in place
    KeepEmpty,
    /// Write this list
    Write(Vec<LineItem>),
}

/// Decides what the backfill does with one sale.
#[must_use]
pub fn plan_sale(sale: &StoredDocument) -> SalePlan {
    if has_line_items(sale) {
        return SalePlan::KeepItems;
    }

    let items = synthesize_line_items(coerce_amount(sale.fields.get("total")));
    let already_empty_list = sale
        .fields
        .get(LINE_ITEMS_FIELD)
        .is_some_and(Value::is_array);

    if items.is_empty() && already_empty_list {
        SalePlan::KeepEmpty
    } else {
        SalePlan::Write(items)
    }
}

/// Runs the backfill over every sale in the store.
///
/// # Errors
/// Returns the first read or write error. Sales written before the failure keep
/// their new items.
pub async fn run_backfill(
    store: &DocumentStore,
    options: BackfillOptions,
) -> Result<BackfillReport> {
    let sales = store.scan(SALES_COLLECTION).await?;
    let mut report = BackfillReport {
        scanned: sales.len(),
        dry_run: options.dry_run,
        ..BackfillReport::default()
    };
    info!(
        "Backfill scanning {} sales (dry run: {})",
        report.scanned, options.dry_run
    );

    for sale in sales {
        let items = match plan_sale(&sale) {
            SalePlan::KeepItems => {
                report.skipped_with_items += 1;
                continue;
            }
            SalePlan::KeepEmpty => {
                report.skipped_empty += 1;
                continue;
            }
            SalePlan::Write(items) => items,
        };

        debug!("Sale {} gets {} sample items", sale.id, items.len());
        report.items_created += items.len();
        report.updated += 1;

        if options.dry_run {
            continue;
        }

        let mut patch = Fields::new();
        patch.insert(LINE_ITEMS_FIELD.to_string(), serde_json::to_value(&items)?);
        store
            .update(SALES_COLLECTION, &sale.id, patch)
            .await
            .inspect_err(|e| error!("Backfill aborted at sale {}: {}", sale.id, e))?;
    }

    info!("{}", format_backfill_summary(&report));
    Ok(report)
}

/// One-line human-readable summary of a backfill run.
#[must_use]
pub fn format_backfill_summary(report: &BackfillReport) -> String {
    let verb = if report.dry_run { "would update" } else { "updated" };
    format!(
        "Backfill: scanned {} sales, {} {} ({} items), skipped {} with items and {} empty",
        report.scanned,
        verb,
        report.updated,
        report.items_created,
        report.skipped_with_items,
        report.skipped_empty
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::ConnectionTrait;
    use serde_json::json;

    fn prices(items: &[LineItem]) -> Vec<f64> {
        items.iter().map(|i| i.subtotal).collect()
    }

    #[test]
    fn test_item_count_thresholds() {
        assert_eq!(sample_item_count(1.0), 1);
        assert_eq!(sample_item_count(9_999.0), 1);
        assert_eq!(sample_item_count(10_000.0), 2);
        assert_eq!(sample_item_count(19_999.99), 2);
        assert_eq!(sample_item_count(20_000.0), 3);
        assert_eq!(sample_item_count(5_000_000.0), 3);
    }

    #[test]
    fn test_zero_and_negative_totals_yield_nothing() {
        assert!(synthesize_line_items(0.0).is_empty());
        assert!(synthesize_line_items(-50.0).is_empty());
        assert!(synthesize_line_items(f64::NAN).is_empty());
    }

    #[test]
    fn test_single_item_sale() {
        let items = synthesize_line_items(5_000.0);
        assert_eq!(prices(&items), vec![5_000.0]);
        assert_eq!(items[0].producto_id, "sample-product-1");
        assert_eq!(items[0].cantidad, 1);
        assert_eq!(items[0].precio_unitario, items[0].subtotal);
    }

    #[test]
    fn test_remainder_goes_to_last_item() {
        let items = synthesize_line_items(25_000.0);
        assert_eq!(prices(&items), vec![8_333.0, 8_333.0, 8_334.0]);
        let ids: Vec<&str> = items.iter().map(|i| i.producto_id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["sample-product-1", "sample-product-2", "sample-product-3"]
        );
    }

    #[test]
    fn test_subtotals_sum_to_total() {
        for total in [1.0, 7.0, 9_999.0, 10_000.0, 15_001.0, 20_000.0, 33_333.0, 1_000_001.0] {
            let items = synthesize_line_items(total);
            let sum: f64 = items.iter().map(|i| i.subtotal).sum();
            assert_eq!(sum, total, "total {total}");
        }
    }

    #[test]
    fn test_line_item_serializes_camel_case() {
        let value = serde_json::to_value(&synthesize_line_items(100.0)[0]).unwrap();
        assert_eq!(value["productoId"], json!("sample-product-1"));
        assert_eq!(value["precioUnitario"], json!(100.0));
    }

    #[test]
    fn test_plan_sale() {
        let with_items = StoredDocument {
            id: "v1".to_string(),
            fields: fields(json!({"total": 100, "productos": [{"nombre": "Pan"}]})),
        };
        assert_eq!(plan_sale(&with_items), SalePlan::KeepItems);

        let empty_zero = StoredDocument {
            id: "v2".to_string(),
            fields: fields(json!({"total": 0, "productos": []})),
        };
        assert_eq!(plan_sale(&empty_zero), SalePlan::KeepEmpty);

        let missing_zero = StoredDocument {
            id: "v3".to_string(),
            fields: fields(json!({})),
        };
        assert_eq!(plan_sale(&missing_zero), SalePlan::Write(Vec::new()));

        let string_total = StoredDocument {
            id: "v4".to_string(),
            fields: fields(json!({"total": "12000"})),
        };
        match plan_sale(&string_total) {
            SalePlan::Write(items) => assert_eq!(prices(&items), vec![6_000.0, 6_000.0]),
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_backfill_updates_only_sales_without_items() -> Result<()> {
        let store = setup_document_store().await?;
        let existing = json!([{"productoId": "p1", "nombre": "Pan", "cantidad": 2,
                               "precioUnitario": 500, "subtotal": 1000}]);
        store
            .insert_with_id(
                SALES_COLLECTION,
                "a",
                fields(json!({"total": 1000, "productos": existing, "estado": "completada"})),
            )
            .await?;
        store
            .insert_with_id(SALES_COLLECTION, "b", fields(json!({"total": 25000, "productos": []})))
            .await?;
        store
            .insert_with_id(SALES_COLLECTION, "c", fields(json!({"total": "5000", "estado": "pendiente"})))
            .await?;
        store
            .insert_with_id(SALES_COLLECTION, "d", fields(json!({"total": 0, "productos": []})))
            .await?;

        let report = run_backfill(&store, BackfillOptions::default()).await?;
        assert_eq!(report.scanned, 4);
        assert_eq!(report.updated, 2);
        assert_eq!(report.skipped_with_items, 1);
        assert_eq!(report.skipped_empty, 1);
        assert_eq!(report.items_created, 4);

        let a = store.get(SALES_COLLECTION, "a").await?.unwrap();
        assert_eq!(a.fields["productos"], existing);

        let b = store.get(SALES_COLLECTION, "b").await?.unwrap();
        let b_items: Vec<LineItem> = serde_json::from_value(b.fields["productos"].clone())?;
        assert_eq!(prices(&b_items), vec![8_333.0, 8_333.0, 8_334.0]);

        let c = store.get(SALES_COLLECTION, "c").await?.unwrap();
        assert_eq!(c.text("estado"), Some("pendiente"));
        assert_eq!(c.fields["total"], json!("5000"));
        let c_items: Vec<LineItem> = serde_json::from_value(c.fields["productos"].clone())?;
        assert_eq!(prices(&c_items), vec![5_000.0]);
        Ok(())
    }

    #[tokio::test]
    async fn test_run_backfill_is_idempotent() -> Result<()> {
        let store = setup_document_store().await?;
        store
            .insert_with_id(SALES_COLLECTION, "a", fields(json!({"total": 15000})))
            .await?;

        run_backfill(&store, BackfillOptions::default()).await?;
        let first = store.get(SALES_COLLECTION, "a").await?.unwrap();

        let second_report = run_backfill(&store, BackfillOptions::default()).await?;
        let second = store.get(SALES_COLLECTION, "a").await?.unwrap();

        assert_eq!(second_report.updated, 0);
        assert_eq!(second_report.skipped_with_items, 1);
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() -> Result<()> {
        let store = setup_document_store().await?;
        store
            .insert_with_id(SALES_COLLECTION, "a", fields(json!({"total": 30000})))
            .await?;

        let report = run_backfill(&store, BackfillOptions { dry_run: true }).await?;
        assert_eq!(report.updated, 1);
        assert_eq!(report.items_created, 3);

        let sale = store.get(SALES_COLLECTION, "a").await?.unwrap();
        assert!(!sale.fields.contains_key("productos"));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_write_aborts_the_run() -> Result<()> {
        let store = setup_document_store().await?;
        for id in ["a", "b", "c"] {
            store
                .insert_with_id(SALES_COLLECTION, id, fields(json!({"total": 5000})))
                .await?;
        }
        store
            .connection()
            .execute_unprepared(
                "CREATE TRIGGER reject_sale_b BEFORE UPDATE ON documentos \
                 WHEN NEW.id = 'b' BEGIN SELECT RAISE(ABORT, 'sale b is locked'); END;",
            )
            .await?;

        let result = run_backfill(&store, BackfillOptions::default()).await;
        assert!(matches!(result, Err(crate::errors::Error::Database(_))));

        let a = store.get(SALES_COLLECTION, "a").await?.unwrap();
        let a_items: Vec<LineItem> = serde_json::from_value(a.fields["productos"].clone())?;
        assert_eq!(prices(&a_items), vec![5_000.0]);

        for id in ["b", "c"] {
            let sale = store.get(SALES_COLLECTION, id).await?.unwrap();
            assert!(!sale.fields.contains_key("productos"));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_backfill_ignores_other_collections() -> Result<()> {
        let store = setup_document_store().await?;
        store
            .insert_with_id("egresos", "e", fields(json!({"total": 30000})))
            .await?;

        let report = run_backfill(&store, BackfillOptions::default()).await?;
        assert_eq!(report.scanned, 0);
        Ok(())
    }

    #[test]
    fn test_format_backfill_summary() {
        let report = BackfillReport {
            scanned: 4,
            updated: 2,
            skipped_with_items: 1,
            skipped_empty: 1,
            items_created: 4,
            dry_run: false,
        };
        assert_eq!(
            format_backfill_summary(&report),
            "Backfill: scanned 4 sales, updated 2 (4 items), skipped 1 with items and 1 empty"
        );
    }
}
