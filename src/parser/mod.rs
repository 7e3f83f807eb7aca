pub mod category;
pub mod classify;
pub mod clean;
pub mod ident;
pub mod tables;

use tracing::debug;

use crate::store::Record;
use classify::{classify_row, Rejection};
use ident::IdRegistry;

/// What one document yielded.
#[derive(Debug, Default)]
pub struct DocumentYield {
    pub tables: usize,
    pub rows: usize,
    pub records: Vec<Record>,
    pub rejections: Vec<Rejection>,
}

/// Two-pass pipeline: markup → tables → records.
///
/// Rows are classified in table order then row order; every accepted id is
/// reserved in `ids` before the next row is looked at. Stops as soon as
/// `budget` records have been accepted.
pub fn process_document(
    markup: &str,
    hint: &str,
    ids: &mut IdRegistry,
    budget: Option<usize>,
) -> DocumentYield {
    let tables = tables::extract_tables(markup);
    let mut out = DocumentYield {
        tables: tables.len(),
        ..Default::default()
    };

    'tables: for table in &tables {
        for row in table {
            if budget.is_some_and(|b| out.records.len() >= b) {
                break 'tables;
            }
            out.rows += 1;
            match classify_row(row, hint, ids) {
                Ok(record) => {
                    ids.insert(record.id.clone());
                    out.records.push(record);
                }
                Err(reason) => {
                    debug!("skip {:?}: {}", row.first(), reason);
                    out.rejections.push(reason);
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::category::Category;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/predictions.html").unwrap()
    }

    #[test]
    fn fixture_records() {
        let mut ids = IdRegistry::default();
        let y = process_document(&fixture(), "apocalyptic events", &mut ids, None);
        assert_eq!(y.tables, 2);
        assert_eq!(y.rows, 10);

        let got: Vec<(i32, &str)> = y.records.iter().map(|r| (r.year, r.source.as_str())).collect();
        assert_eq!(
            got,
            vec![
                (1999, "Ravi Batra"),
                (1910, "Camille Flammarion"),
                (2000, "Y2K doomsayers"),
                (1970, "Unknown"),
            ]
        );
        assert_eq!(y.records[0].category, Category::EconomicCollapse);
        assert_eq!(y.records[0].prediction, "The US economy will collapse by 2000 due to debt");
        assert_eq!(y.records[1].category, Category::EnvironmentalDoom);
        assert_eq!(y.records[2].category, Category::TechApocalypse);
        assert_eq!(y.records[3].category, Category::FoodAndResourceScarcity);

        let kinds: Vec<&str> = y.rejections.iter().map(Rejection::kind).collect();
        assert_eq!(
            kinds,
            vec!["header_row", "short_prediction", "future_year", "header_row", "empty_lead", "no_year"]
        );
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn accepted_records_respect_invariants() {
        let mut ids = IdRegistry::default();
        let y = process_document(&fixture(), "", &mut ids, None);
        for r in &y.records {
            assert!((1000..2026).contains(&r.year));
            assert!(r.prediction.chars().count() >= 15);
            assert!(ids.contains(&r.id));
        }
    }

    #[test]
    fn budget_stops_early() {
        let mut ids = IdRegistry::default();
        let y = process_document(&fixture(), "", &mut ids, Some(2));
        assert_eq!(y.records.len(), 2);
        assert_eq!(ids.len(), 2);
        let y = process_document(&fixture(), "", &mut IdRegistry::default(), Some(0));
        assert!(y.records.is_empty());
        assert_eq!(y.rows, 0);
    }

    #[test]
    fn reprocessing_same_document_suffixes_ids() {
        let mut ids = IdRegistry::default();
        let first = process_document(&fixture(), "", &mut ids, None);
        let second = process_document(&fixture(), "", &mut ids, None);
        assert_eq!(first.records.len(), second.records.len());
        for (a, b) in first.records.iter().zip(&second.records) {
            assert_eq!(b.id, format!("{}-1", a.id));
        }
    }

    #[test]
    fn markup_without_tables() {
        let mut ids = IdRegistry::default();
        let y = process_document("<p>No tables here</p>", "", &mut ids, None);
        assert_eq!(y.tables, 0);
        assert!(y.records.is_empty());
    }
}
