use std::cmp::Ordering;

use crate::column::Column;
use crate::error::{Error, TableResult};
use crate::table::Table;
use crate::visitor::ColumnVisitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Where missing values go. NaN keys count as missing here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullOrder {
    #[default]
    Last,
    First,
}

impl NullOrder {
    /// Placement that mirrors `direction`: last when ascending, first when descending.
    pub fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::Ascending => NullOrder::Last,
            Direction::Descending => NullOrder::First,
        }
    }
}

/// An already-evaluated column to sort by.
#[derive(Debug, Clone, Copy)]
pub struct SortKey<'a> {
    pub column: &'a Column,
    pub direction: Direction,
    pub nulls: NullOrder,
}

impl<'a> SortKey<'a> {
    pub fn new(column: &'a Column, direction: Direction) -> Self {
        Self {
            column,
            direction,
            nulls: NullOrder::for_direction(direction),
        }
    }

    pub fn ascending(column: &'a Column) -> Self {
        Self::new(column, Direction::Ascending)
    }

    pub fn descending(column: &'a Column) -> Self {
        Self::new(column, Direction::Descending)
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullOrder::First;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullOrder::Last;
        self
    }

    pub fn is_descending(&self) -> bool {
        self.direction == Direction::Descending
    }
}

struct KeyVisitor<'a> {
    visitor: ColumnVisitor<'a>,
    descending: bool,
    nulls: NullOrder,
}

impl KeyVisitor<'_> {
    fn compare(&self, i: usize, j: usize) -> Ordering {
        let missing = match self.nulls {
            NullOrder::Last => Ordering::Greater,
            NullOrder::First => Ordering::Less,
        };
        // NaN shares the missing class so both land at the same end
        match (self.visitor.is_missing_or_nan(i), self.visitor.is_missing_or_nan(j)) {
            (true, true) => Ordering::Equal,
            (true, false) => missing,
            (false, true) => missing.reverse(),
            (false, false) => {
                let ord = self.visitor.compare_present(i, j);
                if self.descending { ord.reverse() } else { ord }
            }
        }
    }
}

/// Computes the stable row permutation for a lexicographic multi-key order.
///
/// Direction flips the comparison of present values per key, so rows equal
/// on every key keep their input order. Missing and NaN keys form one class
/// placed by [NullOrder], which by default mirrors the direction.
pub struct OrderVisitors<'a> {
    keys: Vec<KeyVisitor<'a>>,
    row_count: usize,
}

impl<'a> OrderVisitors<'a> {
    /// # Errors
    /// [Error::UnsupportedType] for a key that cannot be ordered, then
    /// [Error::SizeMismatch] for a key whose length is not `row_count`.
    /// Both name the key by its 1-based position.
    pub fn new(keys: &[SortKey<'a>], row_count: usize, operation: &'static str) -> TableResult<Self> {
        let keys = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let visitor = ColumnVisitor::try_new(key.column).ok_or_else(|| Error::UnsupportedType {
                    operation,
                    subject: format!("sort key {}", i + 1),
                    data_type: key.column.data_type,
                })?;
                let actual = if key.column.len() != row_count {
                    key.column.len()
                } else {
                    key.column.data.len()
                };
                if actual != row_count {
                    return Err(Error::SizeMismatch {
                        operation,
                        subject: format!("sort key {}", i + 1),
                        expected: row_count,
                        actual,
                    });
                }
                Ok(KeyVisitor {
                    visitor,
                    descending: key.is_descending(),
                    nulls: key.nulls,
                })
            })
            .collect::<TableResult<Vec<_>>>()?;
        Ok(Self { keys, row_count })
    }

    /// Every column of `table`, ascending, in column order.
    pub fn ascending(table: &'a Table, operation: &'static str) -> TableResult<Self> {
        let keys: Vec<SortKey<'a>> = table.columns().iter().map(SortKey::ascending).collect();
        Self::new(&keys, table.row_count(), operation)
    }

    pub fn compare(&self, i: usize, j: usize) -> Ordering {
        for key in &self.keys {
            let ord = key.compare(i, j);
            // if it's not equal no need to compare more
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// `result[p]` is the input row placed at output position `p`.
    pub fn apply(&self) -> Vec<usize> {
        let mut index: Vec<usize> = (0..self.row_count).collect();
        if !self.keys.is_empty() {
            // sort_by is stable: ties keep their input order
            index.sort_by(|&a, &b| self.compare(a, b));
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_single_key_both_directions() {
        let a = Column::from_ints("a", [Some(3), Some(1), Some(2)]);

        let asc = OrderVisitors::new(&[SortKey::ascending(&a)], 3, "arrange").unwrap();
        assert_eq!(asc.apply(), vec![1, 2, 0]);

        let desc = OrderVisitors::new(&[SortKey::descending(&a)], 3, "arrange").unwrap();
        assert_eq!(desc.apply(), vec![0, 2, 1]);
    }

    #[test]
    fn test_descending_keeps_ties_stable() {
        let a = Column::from_ints("a", [Some(1), Some(2), Some(1), Some(2)]);

        let desc = OrderVisitors::new(&[SortKey::descending(&a)], 4, "arrange").unwrap();
        assert_eq!(desc.apply(), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_missing_and_nan_mirror_direction() {
        let a = Column::from_floats("a", [None, Some(1.0), Some(f64::NAN), Some(5.0)]);

        let asc = OrderVisitors::new(&[SortKey::ascending(&a)], 4, "arrange").unwrap();
        assert_eq!(asc.apply(), vec![1, 3, 0, 2]);

        let desc = OrderVisitors::new(&[SortKey::descending(&a)], 4, "arrange").unwrap();
        assert_eq!(desc.apply(), vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_nan_sits_with_missing_at_one_end() {
        let a = Column::from_floats("a", [Some(f64::NAN), Some(5.0), None, Some(1.0)]);

        let asc = OrderVisitors::new(&[SortKey::ascending(&a)], 4, "arrange").unwrap();
        assert_eq!(asc.apply(), vec![3, 1, 0, 2]);

        let desc = OrderVisitors::new(&[SortKey::descending(&a)], 4, "arrange").unwrap();
        assert_eq!(desc.apply(), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_explicit_null_placement() {
        let a = Column::from_floats("a", [None, Some(1.0), Some(f64::NAN), Some(5.0)]);

        let first = OrderVisitors::new(&[SortKey::ascending(&a).nulls_first()], 4, "arrange").unwrap();
        assert_eq!(first.apply(), vec![0, 2, 1, 3]);

        let last = OrderVisitors::new(&[SortKey::descending(&a).nulls_last()], 4, "arrange").unwrap();
        assert_eq!(last.apply(), vec![3, 1, 0, 2]);
    }

    #[test]
    fn test_key_data_out_of_step_is_size_mismatch() {
        let mut a = Column::from_ints("a", [Some(1), Some(2)]);
        a.data = crate::column::ColumnData::Int(vec![1]);

        let err = OrderVisitors::new(&[SortKey::ascending(&a)], 2, "arrange").err().unwrap();
        assert!(matches!(err, Error::SizeMismatch { actual: 1, .. }));
    }

    #[test]
    fn test_multiple_keys() {
        let score = Column::from_ints("score", [Some(100), Some(100), Some(50)]);
        let name = Column::from_texts("name", [Some("Bob"), Some("Alice"), Some("Charlie")]);

        let order = OrderVisitors::new(
            &[SortKey::descending(&score), SortKey::ascending(&name)],
            3,
            "arrange",
        )
        .unwrap();
        assert_eq!(order.apply(), vec![1, 0, 2]);
    }

    #[test]
    fn test_key_errors_name_position() {
        let good = Column::from_ints("a", [Some(1), Some(2)]);
        let short = Column::from_ints("b", [Some(1)]);
        let nested = Column::from_lists("c", [Some(vec![Value::Int(1)]), None]);

        let err = OrderVisitors::new(&[SortKey::ascending(&good), SortKey::ascending(&short)], 2, "arrange")
            .err()
            .unwrap();
        assert_eq!(
            err,
            Error::SizeMismatch {
                operation: "arrange",
                subject: "sort key 2".into(),
                expected: 2,
                actual: 1,
            }
        );
        assert_eq!(err.to_string(), "arrange: sort key 2 has incorrect size (1), expecting 2");

        let err = OrderVisitors::new(&[SortKey::ascending(&nested)], 2, "arrange").err().unwrap();
        assert!(matches!(err, Error::UnsupportedType { .. }));
    }

    #[test]
    fn test_no_keys_is_identity() {
        let order = OrderVisitors::new(&[], 3, "arrange").unwrap();
        assert_eq!(order.apply(), vec![0, 1, 2]);
    }
}
