//! Type-erased access to the cells of a column.
//!
//! A [ColumnVisitor] borrows one column and answers compare/equal/hash
//! questions about pairs of its rows without the caller knowing the element
//! kind. [TableVisitors] bundles one visitor per column of a table.

use std::cmp::Ordering;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;

use ahash::RandomState;
use bitvec::slice::BitSlice;
use ordered_float::OrderedFloat;

use crate::column::{Column, ColumnData};
use crate::error::{Error, TableResult};
use crate::table::{ClassTag, Table};

#[derive(Debug, Clone, Copy)]
enum Cells<'a> {
    Bool(&'a BitSlice),
    Int(&'a [i64]),
    Float(&'a [f64]),
    Text(&'a [Arc<str>]),
    Factor(&'a [u32]),
}

/// Borrowed view over one orderable column.
///
/// Missing values form their own class: they compare equal to each other and
/// sort after every present value. Floats order through [OrderedFloat], so NaN
/// is the largest present value and `-0.0 == 0.0`. Keyed ordering in
/// [crate::order] instead groups NaN with missing values.
#[derive(Debug, Clone, Copy)]
pub struct ColumnVisitor<'a> {
    column: &'a Column,
    cells: Cells<'a>,
}

impl<'a> ColumnVisitor<'a> {
    /// Returns `None` for list columns, which have no order.
    pub fn try_new(column: &'a Column) -> Option<Self> {
        let cells = match &column.data {
            ColumnData::Bool(v) => Cells::Bool(v.as_bitslice()),
            ColumnData::Int(v) => Cells::Int(v),
            ColumnData::Float(v) => Cells::Float(v),
            ColumnData::Text(v) => Cells::Text(v),
            ColumnData::Factor { codes, .. } => Cells::Factor(codes),
            ColumnData::List(_) => return None,
        };
        Some(Self { column, cells })
    }

    pub fn column(&self) -> &'a Column {
        self.column
    }

    pub fn len(&self) -> usize {
        self.column.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column.is_empty()
    }

    pub fn is_null(&self, i: usize) -> bool {
        self.column.null_bitmap[i]
    }

    /// Missing, or a NaN float. Ordering places these together.
    pub(crate) fn is_missing_or_nan(&self, i: usize) -> bool {
        self.is_null(i) || matches!(self.cells, Cells::Float(v) if v[i].is_nan())
    }

    /// Ascending order, missing last.
    pub fn compare(&self, i: usize, j: usize) -> Ordering {
        match (self.is_null(i), self.is_null(j)) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.compare_present(i, j),
        }
    }

    /// Order of two rows that are both present.
    pub(crate) fn compare_present(&self, i: usize, j: usize) -> Ordering {
        match self.cells {
            Cells::Bool(v) => v[i].cmp(&v[j]),
            Cells::Int(v) => v[i].cmp(&v[j]),
            Cells::Float(v) => OrderedFloat(v[i]).cmp(&OrderedFloat(v[j])),
            Cells::Text(v) => v[i].as_ref().cmp(v[j].as_ref()),
            Cells::Factor(v) => v[i].cmp(&v[j]),
        }
    }

    pub fn equal(&self, i: usize, j: usize) -> bool {
        self.compare(i, j) == Ordering::Equal
    }

    /// Feeds the cell at `i` into `state`; equal cells feed identical input.
    pub fn hash_into<H: Hasher>(&self, i: usize, state: &mut H) {
        if self.is_null(i) {
            0u8.hash(state);
            return;
        }
        1u8.hash(state);
        match self.cells {
            Cells::Bool(v) => v[i].hash(state),
            Cells::Int(v) => v[i].hash(state),
            Cells::Float(v) => OrderedFloat(v[i]).hash(state),
            Cells::Text(v) => v[i].as_ref().hash(state),
            Cells::Factor(v) => v[i].hash(state),
        }
    }

    pub fn hash(&self, i: usize, build: &RandomState) -> u64 {
        let mut state = build.build_hasher();
        self.hash_into(i, &mut state);
        state.finish()
    }

    /// New column made of the cells at `indices`, see [Column::take].
    pub fn materialize(&self, indices: &[usize]) -> TableResult<Column> {
        self.column.take(indices)
    }
}

/// One [ColumnVisitor] per column of a table, plus the table's shape.
pub struct TableVisitors<'a> {
    table: &'a Table,
    visitors: Vec<ColumnVisitor<'a>>,
    hasher: RandomState,
}

impl<'a> TableVisitors<'a> {
    /// # Errors
    /// [Error::UnsupportedType] naming the first column that cannot be
    /// compared or hashed.
    pub fn new(table: &'a Table, operation: &'static str) -> TableResult<Self> {
        let visitors = table
            .columns()
            .iter()
            .map(|column| {
                ColumnVisitor::try_new(column).ok_or_else(|| Error::UnsupportedType {
                    operation,
                    subject: format!("column '{}'", column.name),
                    data_type: column.data_type,
                })
            })
            .collect::<TableResult<Vec<_>>>()?;
        Ok(Self {
            table,
            visitors,
            hasher: RandomState::new(),
        })
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.visitors.len()
    }

    pub fn visitors(&self) -> &[ColumnVisitor<'a>] {
        &self.visitors
    }

    /// Combined hash of every cell in row `i`.
    pub fn hash(&self, i: usize) -> u64 {
        let mut state = self.hasher.build_hasher();
        for visitor in &self.visitors {
            visitor.hash_into(i, &mut state);
        }
        state.finish()
    }

    pub fn equal(&self, i: usize, j: usize) -> bool {
        self.visitors.iter().all(|v| v.equal(i, j))
    }

    /// Lexicographic ascending order over all columns.
    pub fn compare(&self, i: usize, j: usize) -> Ordering {
        self.visitors
            .iter()
            .map(|v| v.compare(i, j))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    pub fn subset(&self, indices: &[usize], class: ClassTag) -> TableResult<Table> {
        self.table.subset(indices, class)
    }
}
