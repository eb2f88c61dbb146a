use ahash::AHashMap;

use crate::error::TableResult;
use crate::table::Table;
use crate::visitor::TableVisitors;

/// Set of row indices where two rows are the same element when every column
/// holds equal cells. The first row inserted for each distinct content is
/// kept as its representative.
pub struct RowIdentitySet<'v, 'a> {
    visitors: &'v TableVisitors<'a>,
    /// row hash -> ordinals of representatives with that hash
    buckets: AHashMap<u64, Vec<usize>>,
    rows: Vec<usize>,
}

impl<'v, 'a> RowIdentitySet<'v, 'a> {
    pub fn new(visitors: &'v TableVisitors<'a>) -> Self {
        Self {
            visitors,
            buckets: AHashMap::new(),
            rows: Vec::new(),
        }
    }

    /// Inserts `row` unless an equal row is already present.
    ///
    /// Returns the ordinal of the distinct row (0 for the first distinct
    /// content seen, 1 for the next, ...) and whether `row` was inserted.
    pub fn insert(&mut self, row: usize) -> (usize, bool) {
        let hash = self.visitors.hash(row);
        let bucket = self.buckets.entry(hash).or_default();
        if let Some(&ordinal) = bucket
            .iter()
            .find(|&&ordinal| self.visitors.equal(self.rows[ordinal], row))
        {
            return (ordinal, false);
        }
        let ordinal = self.rows.len();
        bucket.push(ordinal);
        self.rows.push(row);
        (ordinal, true)
    }

    /// Representative rows, in insertion order.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keeps the first occurrence of every distinct row, in input order.
///
/// # Errors
/// [crate::Error::UnsupportedType] if a column cannot be hashed.
pub fn distinct(table: &Table) -> TableResult<Table> {
    let visitors = TableVisitors::new(table, "distinct")?;
    let mut set = RowIdentitySet::new(&visitors);
    for row in 0..table.row_count() {
        set.insert(row);
    }
    log::debug!("distinct: kept {} of {} rows", set.len(), table.row_count());
    visitors.subset(set.rows(), table.class().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::error::Error;
    use crate::table::ClassTag;
    use crate::value::Value;

    #[test]
    fn test_distinct_keeps_first_occurrence() {
        let table = Table::new(vec![
            Column::from_ints("a", [Some(1), Some(1), Some(2)]),
            Column::from_texts("b", [Some("x"), Some("x"), Some("y")]),
        ])
        .unwrap();

        let out = distinct(&table).unwrap();

        assert_eq!(out.row_count(), 2);
        assert_eq!(out.get_row(0).unwrap(), vec![Value::Int(1), Value::Text("x".into())]);
        assert_eq!(out.get_row(1).unwrap(), vec![Value::Int(2), Value::Text("y".into())]);
    }

    #[test]
    fn test_distinct_treats_missing_as_equal() {
        let table = Table::new(vec![Column::from_floats(
            "x",
            [None, Some(f64::NAN), None, Some(f64::NAN), Some(0.0), Some(-0.0)],
        )])
        .unwrap();

        let out = distinct(&table).unwrap();
        assert_eq!(out.row_count(), 3);
        assert!(out.column("x").unwrap().is_null(0));
    }

    #[test]
    fn test_distinct_keeps_class() {
        let class = ClassTag::new(["tbl", "table"]);
        let table = Table::with_class(vec![Column::from_bools("b", [Some(true), Some(true)])], class.clone())
            .unwrap();

        let out = distinct(&table).unwrap();
        assert_eq!(out.class(), &class);
        assert_eq!(out.row_count(), 1);
    }

    #[test]
    fn test_distinct_rejects_lists() {
        let table = Table::new(vec![Column::from_lists("l", [Some(vec![]), Some(vec![])])]).unwrap();
        assert!(matches!(distinct(&table), Err(Error::UnsupportedType { .. })));
    }

    #[test]
    fn test_insert_reports_ordinals() {
        let table = Table::new(vec![Column::from_texts("k", [Some("b"), Some("a"), Some("b")])]).unwrap();
        let visitors = TableVisitors::new(&table, "test").unwrap();
        let mut set = RowIdentitySet::new(&visitors);

        assert_eq!(set.insert(0), (0, true));
        assert_eq!(set.insert(1), (1, true));
        assert_eq!(set.insert(2), (0, false));
        assert_eq!(set.rows(), &[0, 1]);
    }
}
