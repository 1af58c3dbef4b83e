//! Reporting service for sales and stock summaries
//!
//! Sales reports bucket the ledger by calendar period, product or payment
//! method. Stock reports list catalog lines next to the store-wide valuation.
//! Nothing here writes.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    from_cents, GroupRow, PaymentMethod, SalesGroupBy, SalesReport, StockFilter, StockReport,
    StockRow,
};
use sqlx::{FromRow, SqlitePool};

use super::sales::parse_range;
use crate::error::{AppError, AppResult};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: SqlitePool,
}

/// One sale as seen by the aggregator
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub sale_date: NaiveDate,
    pub quantity: i64,
    pub total_price: Decimal,
    pub payment_method: PaymentMethod,
    /// `(brand, model)`, or `None` when the phone row is missing
    pub product: Option<(String, String)>,
}

#[derive(Debug, FromRow)]
struct LedgerRow {
    id: i64,
    sale_date: NaiveDate,
    quantity: i64,
    total_price_cents: i64,
    payment_method: String,
    brand: Option<String>,
    model: Option<String>,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = AppError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let payment_method = row
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|e| AppError::StorageError(format!("sale {}: {}", row.id, e)))?;

        Ok(LedgerEntry {
            sale_date: row.sale_date,
            quantity: row.quantity,
            total_price: from_cents(row.total_price_cents),
            payment_method,
            product: row.brand.zip(row.model),
        })
    }
}

#[derive(Debug, FromRow)]
struct StockLineRow {
    id: i64,
    brand: String,
    model: String,
    imei: Option<String>,
    price_cents: i64,
    quantity: i64,
}

impl TryFrom<StockLineRow> for StockRow {
    type Error = AppError;

    fn try_from(row: StockLineRow) -> Result<Self, Self::Error> {
        let price = from_cents(row.price_cents);
        Ok(StockRow {
            id: row.id,
            brand: row.brand,
            model: row.model,
            imei: row.imei,
            price,
            quantity: row.quantity,
            line_value: line_value(price, row.quantity)?,
        })
    }
}

/// `price * quantity` for one catalog line
fn line_value(price: Decimal, quantity: i64) -> AppResult<Decimal> {
    price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| AppError::validation("line_value", "Amount is out of range"))
}

/// Checked sum of money amounts
fn checked_total<I>(amounts: I, field: &str) -> AppResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(from_cents(0), |acc, amount| acc.checked_add(amount))
        .ok_or_else(|| AppError::validation(field, "Amount is out of range"))
}

/// Bucket key; derived `Ord` gives chronological order for periods and
/// lexical order for products and payment methods.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum GroupKey {
    Day(NaiveDate),
    IsoWeek { year: i32, week: u32 },
    Month { year: i32, month: u32 },
    Year(i32),
    Product { brand: String, model: String },
    UnknownProduct,
    Payment(&'static str),
}

impl GroupKey {
    fn for_entry(entry: &LedgerEntry, group_by: SalesGroupBy) -> Self {
        let date = entry.sale_date;
        match group_by {
            SalesGroupBy::Day => GroupKey::Day(date),
            SalesGroupBy::Week => {
                let iso = date.iso_week();
                GroupKey::IsoWeek {
                    year: iso.year(),
                    week: iso.week(),
                }
            }
            SalesGroupBy::Month => GroupKey::Month {
                year: date.year(),
                month: date.month(),
            },
            SalesGroupBy::Year => GroupKey::Year(date.year()),
            SalesGroupBy::Product => match &entry.product {
                Some((brand, model)) => GroupKey::Product {
                    brand: brand.clone(),
                    model: model.clone(),
                },
                None => GroupKey::UnknownProduct,
            },
            SalesGroupBy::PaymentMethod => GroupKey::Payment(entry.payment_method.as_str()),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            GroupKey::IsoWeek { year, week } => write!(f, "{}-W{:02}", year, week),
            GroupKey::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            GroupKey::Year(year) => write!(f, "{}", year),
            GroupKey::Product { brand, model } => write!(f, "{} {}", brand, model),
            GroupKey::UnknownProduct => f.write_str("Unknown phone"),
            GroupKey::Payment(method) => f.write_str(method),
        }
    }
}

#[derive(Default)]
struct Bucket {
    sales_count: i64,
    total_quantity: i64,
    total_sales: Decimal,
}

/// Group ledger entries into ordered report rows
pub fn aggregate_sales(entries: &[LedgerEntry], group_by: SalesGroupBy) -> Vec<GroupRow> {
    let mut buckets: BTreeMap<GroupKey, Bucket> = BTreeMap::new();

    for entry in entries {
        let bucket = buckets.entry(GroupKey::for_entry(entry, group_by)).or_default();
        bucket.sales_count += 1;
        bucket.total_quantity += entry.quantity;
        bucket.total_sales += entry.total_price;
    }

    buckets
        .into_iter()
        .map(|(key, bucket)| GroupRow {
            label: key.to_string(),
            sales_count: bucket.sales_count,
            total_quantity: bucket.total_quantity,
            total_sales: bucket.total_sales,
        })
        .collect()
}

impl ReportingService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Grouped sales summary for an inclusive `YYYY-MM-DD` date range
    pub async fn generate_sales_report(
        &self,
        date_from: &str,
        date_to: &str,
        group_by: SalesGroupBy,
    ) -> AppResult<SalesReport> {
        let range = parse_range(date_from, date_to)?;

        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT s.id, s.sale_date, s.quantity, s.total_price_cents, s.payment_method,
                   p.brand, p.model
            FROM sales s
            LEFT JOIN phones p ON p.id = s.phone_id
            WHERE s.sale_date BETWEEN ? AND ?
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        let entries = rows
            .into_iter()
            .map(LedgerEntry::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        let grand_total = checked_total(entries.iter().map(|e| e.total_price), "grand_total")?;

        tracing::debug!(
            from = %range.start,
            to = %range.end,
            group_by = %group_by,
            sales = entries.len(),
            "Sales report generated"
        );

        Ok(SalesReport {
            date_from: range.start,
            date_to: range.end,
            group_by,
            rows: aggregate_sales(&entries, group_by),
            grand_total,
        })
    }

    /// Stock listing for a filter, with the valuation of the whole catalog
    pub async fn generate_stock_report(&self, filter: StockFilter) -> AppResult<StockReport> {
        let base = "SELECT id, brand, model, imei, price_cents, quantity FROM phones";
        let order = "ORDER BY brand, model, id";

        let mut tx = self.db.begin().await?;

        let rows = match &filter {
            StockFilter::All => {
                sqlx::query_as::<_, StockLineRow>(&format!("{base} {order}"))
                    .fetch_all(&mut *tx)
                    .await?
            }
            StockFilter::LowStock { threshold } => {
                if *threshold < 0 {
                    return Err(AppError::validation(
                        "threshold",
                        "Threshold cannot be negative",
                    ));
                }
                sqlx::query_as::<_, StockLineRow>(&format!("{base} WHERE quantity < ? {order}"))
                    .bind(threshold)
                    .fetch_all(&mut *tx)
                    .await?
            }
            StockFilter::ByBrand { brand } => {
                if brand.is_empty() {
                    return Err(AppError::validation("brand", "Brand is required"));
                }
                // `=` on TEXT is case-sensitive in SQLite
                sqlx::query_as::<_, StockLineRow>(&format!("{base} WHERE brand = ? {order}"))
                    .bind(brand)
                    .fetch_all(&mut *tx)
                    .await?
            }
        };

        // Store-wide valuation, independent of the filter. Summed here rather
        // than in SQL, where an overflowing integer product turns into REAL.
        let catalog = sqlx::query_as::<_, (i64, i64)>("SELECT price_cents, quantity FROM phones")
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        let line_values = catalog
            .into_iter()
            .map(|(price_cents, quantity)| line_value(from_cents(price_cents), quantity))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(StockReport {
            filter,
            rows: rows
                .into_iter()
                .map(StockRow::try_from)
                .collect::<AppResult<Vec<_>>>()?,
            grand_total_value: checked_total(line_values, "grand_total_value")?,
        })
    }

    /// Distinct brands in the catalog, sorted
    pub async fn list_brands(&self) -> AppResult<Vec<String>> {
        let brands = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT brand FROM phones ORDER BY brand",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(brands)
    }

    /// Sales report as CSV, closed by a `Total` record
    pub fn sales_report_csv(report: &SalesReport) -> AppResult<String> {
        export_with_total(
            &["label", "sales_count", "total_quantity", "total_sales"],
            &report.rows,
            report.grand_total,
        )
    }

    /// Stock report as CSV, closed by a `Total` record carrying the valuation
    pub fn stock_report_csv(report: &StockReport) -> AppResult<String> {
        export_with_total(
            &["id", "brand", "model", "imei", "price", "quantity", "line_value"],
            &report.rows,
            report.grand_total_value,
        )
    }
}

/// Header, one record per row, then `Total` in the first column and the
/// grand total in the last.
fn export_with_total<T: Serialize>(
    header: &[&str],
    rows: &[T],
    grand_total: Decimal,
) -> AppResult<String> {
    let csv_error = |e: csv::Error| AppError::Internal(format!("CSV serialization error: {}", e));

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    wtr.write_record(header).map_err(csv_error)?;
    for record in rows {
        wtr.serialize(record).map_err(csv_error)?;
    }

    let mut total = vec![String::new(); header.len()];
    if let Some(last) = total.last_mut() {
        *last = grand_total.to_string();
    }
    if let Some(first) = total.first_mut() {
        *first = "Total".to_string();
    }
    wtr.write_record(&total).map_err(csv_error)?;

    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(sale_date: NaiveDate, quantity: i64, cents: i64, method: PaymentMethod) -> LedgerEntry {
        LedgerEntry {
            sale_date,
            quantity,
            total_price: Decimal::new(cents, 2),
            payment_method: method,
            product: Some(("Apple".to_string(), "iPhone 13".to_string())),
        }
    }

    #[test]
    fn test_group_by_day_one_row_per_date() {
        let entries = vec![
            entry(date(2024, 3, 3), 1, 3000, PaymentMethod::Cash),
            entry(date(2024, 3, 1), 1, 1000, PaymentMethod::Cash),
            entry(date(2024, 3, 2), 1, 2000, PaymentMethod::Cash),
        ];

        let rows = aggregate_sales(&entries, SalesGroupBy::Day);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].label, "2024-03-01");
        assert_eq!(rows[2].label, "2024-03-03");
        assert!(rows.iter().all(|r| r.sales_count == 1));
        let total: Decimal = rows.iter().map(|r| r.total_sales).sum();
        assert_eq!(total, Decimal::new(6000, 2));
    }

    #[test]
    fn test_group_by_iso_week_across_year_boundary() {
        // 2024-12-30 (Mon) and 2025-01-05 (Sun) are both in ISO week 2025-W01
        let entries = vec![
            entry(date(2024, 12, 30), 1, 100, PaymentMethod::Cash),
            entry(date(2025, 1, 5), 2, 200, PaymentMethod::Cash),
            entry(date(2024, 12, 29), 1, 50, PaymentMethod::Cash),
        ];

        let rows = aggregate_sales(&entries, SalesGroupBy::Week);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "2024-W52");
        assert_eq!(rows[1].label, "2025-W01");
        assert_eq!(rows[1].sales_count, 2);
        assert_eq!(rows[1].total_quantity, 3);
    }

    #[test]
    fn test_group_by_month_and_year_chronological() {
        let entries = vec![
            entry(date(2024, 11, 5), 1, 100, PaymentMethod::Cash),
            entry(date(2023, 2, 5), 1, 100, PaymentMethod::Cash),
            entry(date(2024, 2, 5), 1, 100, PaymentMethod::Cash),
        ];

        let months: Vec<_> = aggregate_sales(&entries, SalesGroupBy::Month)
            .into_iter()
            .map(|r| r.label)
            .collect();
        assert_eq!(months, vec!["2023-02", "2024-02", "2024-11"]);

        let years = aggregate_sales(&entries, SalesGroupBy::Year);
        assert_eq!(years.len(), 2);
        assert_eq!(years[0].label, "2023");
        assert_eq!(years[1].sales_count, 2);
    }

    #[test]
    fn test_group_by_product_lexical() {
        let mut a = entry(date(2024, 1, 1), 2, 2000, PaymentMethod::Cash);
        a.product = Some(("Samsung".into(), "Galaxy S23".into()));
        let b = entry(date(2024, 1, 2), 1, 1000, PaymentMethod::Cash);
        let mut orphan = entry(date(2024, 1, 3), 1, 500, PaymentMethod::Cash);
        orphan.product = None;

        let rows = aggregate_sales(&[a, b, orphan], SalesGroupBy::Product);

        let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Apple iPhone 13", "Samsung Galaxy S23", "Unknown phone"]);
        assert_eq!(rows[1].total_quantity, 2);
    }

    #[test]
    fn test_group_by_payment_method_lexical() {
        let entries = vec![
            entry(date(2024, 1, 1), 1, 100, PaymentMethod::Other),
            entry(date(2024, 1, 1), 1, 100, PaymentMethod::Cash),
            entry(date(2024, 1, 1), 1, 100, PaymentMethod::BankTransfer),
            entry(date(2024, 1, 1), 1, 100, PaymentMethod::Cash),
        ];

        let rows = aggregate_sales(&entries, SalesGroupBy::PaymentMethod);

        let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["bank_transfer", "cash", "other"]);
        assert_eq!(rows[1].sales_count, 2);
    }

    #[test]
    fn test_empty_ledger_yields_no_rows() {
        assert!(aggregate_sales(&[], SalesGroupBy::Day).is_empty());
    }

    #[test]
    fn test_sales_csv_ends_with_total() {
        let report = SalesReport {
            date_from: date(2024, 3, 1),
            date_to: date(2024, 3, 31),
            group_by: SalesGroupBy::Month,
            rows: vec![GroupRow {
                label: "2024-03".into(),
                sales_count: 2,
                total_quantity: 3,
                total_sales: Decimal::new(12050, 2),
            }],
            grand_total: Decimal::new(12050, 2),
        };

        let csv = ReportingService::sales_report_csv(&report).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "label,sales_count,total_quantity,total_sales",
                "2024-03,2,3,120.50",
                "Total,,,120.50",
            ]
        );
    }

    #[test]
    fn test_empty_stock_csv_keeps_header_and_total() {
        let report = StockReport {
            filter: StockFilter::All,
            rows: vec![],
            grand_total_value: Decimal::new(0, 2),
        };

        let csv = ReportingService::stock_report_csv(&report).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines,
            vec!["id,brand,model,imei,price,quantity,line_value", "Total,,,,,,0.00"]
        );
    }

    #[test]
    fn test_line_value_overflow_is_rejected() {
        assert_eq!(
            line_value(Decimal::new(69999, 2), 3).unwrap(),
            Decimal::new(209997, 2)
        );
        let err = line_value(from_cents(i64::MAX), i64::MAX).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "line_value"));

        let err = checked_total([Decimal::MAX, Decimal::ONE], "grand_total").unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "grand_total"));
    }

    fn group_by_strategy() -> impl Strategy<Value = SalesGroupBy> {
        prop_oneof![
            Just(SalesGroupBy::Day),
            Just(SalesGroupBy::Week),
            Just(SalesGroupBy::Month),
            Just(SalesGroupBy::Year),
            Just(SalesGroupBy::Product),
            Just(SalesGroupBy::PaymentMethod),
        ]
    }

    fn entry_strategy() -> impl Strategy<Value = LedgerEntry> {
        (0i64..1500, 1i64..5, 0i64..500_000, 0usize..4, 0usize..4).prop_map(
            |(day, quantity, cents, method, product)| LedgerEntry {
                sale_date: date(2023, 1, 1) + chrono::Duration::days(day),
                quantity,
                total_price: Decimal::new(cents, 2),
                payment_method: PaymentMethod::ALL[method],
                product: ["A", "B", "C"]
                    .get(product)
                    .map(|b| (b.to_string(), "Model".to_string())),
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Row sums always reconcile with the ungrouped ledger
        #[test]
        fn prop_rows_reconcile_with_ledger(
            entries in prop::collection::vec(entry_strategy(), 0..40),
            group_by in group_by_strategy()
        ) {
            let rows = aggregate_sales(&entries, group_by);

            let count: i64 = rows.iter().map(|r| r.sales_count).sum();
            let quantity: i64 = rows.iter().map(|r| r.total_quantity).sum();
            let total: Decimal = rows.iter().map(|r| r.total_sales).sum();

            prop_assert_eq!(count, entries.len() as i64);
            prop_assert_eq!(quantity, entries.iter().map(|e| e.quantity).sum::<i64>());
            prop_assert_eq!(total, entries.iter().map(|e| e.total_price).sum::<Decimal>());
        }

        /// Time buckets come out in chronological order
        #[test]
        fn prop_day_rows_sorted(entries in prop::collection::vec(entry_strategy(), 0..40)) {
            let rows = aggregate_sales(&entries, SalesGroupBy::Day);
            let labels: Vec<_> = rows.iter().map(|r| r.label.clone()).collect();
            let mut sorted = labels.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(labels, sorted);
        }
    }
}
