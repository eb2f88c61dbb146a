use std::ops::Range;
use std::sync::Arc;

use ahash::AHashMap;
use bitvec::prelude::*;

use crate::data_type::DataType;
use crate::error::{Error, TableResult};
use crate::value::Value;

/// Physical storage for column data.
/// Each variant wraps a collection of a specific type to ensure contiguous memory
/// allocation (columnar storage).
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Compact bit-vector for boolean values.
    Bool(BitVec),
    /// Vector of 64-bit integers.
    Int(Vec<i64>),
    /// Vector of 64-bit floats.
    Float(Vec<f64>),
    /// Vector of reference-counted strings.
    Text(Vec<Arc<str>>),
    /// Level codes into a shared list of level names.
    Factor {
        codes: Vec<u32>,
        levels: Arc<[Arc<str>]>,
    },
    /// Nested cells.
    List(Vec<Arc<[Value]>>),
}

impl ColumnData {
    /// Number of stored cells, missing ones included.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Bool(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Factor { codes, .. } => codes.len(),
            ColumnData::List(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Represents a column within a table.
/// It combines metadata (name, type) with actual data and a nullability tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// The name of the column.
    pub name: String,
    /// The element kind of the column.
    pub data_type: DataType,
    /// The actual values stored in the column.
    pub data: ColumnData,
    /// A bitmap where a `true` bit indicates that the value at that index is missing.
    pub null_bitmap: BitVec,
}

impl Column {
    /// Creates a new, empty column with the specified name and data type.
    /// An empty factor column starts with no levels, see [Column::new_factor].
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let data = match data_type {
            DataType::Bool => ColumnData::Bool(bitvec!()),
            DataType::Int => ColumnData::Int(vec![]),
            DataType::Float => ColumnData::Float(vec![]),
            DataType::Text => ColumnData::Text(vec![]),
            DataType::Factor => ColumnData::Factor {
                codes: vec![],
                levels: Arc::from(Vec::<Arc<str>>::new()),
            },
            DataType::List => ColumnData::List(vec![]),
        };
        Self {
            name: name.into(),
            data_type,
            data,
            null_bitmap: bitvec!(),
        }
    }

    /// Creates a new, empty factor column with a fixed set of levels.
    pub fn new_factor<'a>(name: impl Into<String>, levels: impl IntoIterator<Item = &'a str>) -> Self {
        let levels: Vec<Arc<str>> = levels.into_iter().map(Arc::from).collect();
        Self {
            name: name.into(),
            data_type: DataType::Factor,
            data: ColumnData::Factor {
                codes: vec![],
                levels: Arc::from(levels),
            },
            null_bitmap: bitvec!(),
        }
    }

    pub fn from_bools(name: impl Into<String>, cells: impl IntoIterator<Item = Option<bool>>) -> Self {
        let mut data = BitVec::new();
        let mut null_bitmap = BitVec::new();
        for cell in cells {
            data.push(cell.unwrap_or(false));
            null_bitmap.push(cell.is_none());
        }
        Self::from_parts(name, DataType::Bool, ColumnData::Bool(data), null_bitmap)
    }

    pub fn from_ints(name: impl Into<String>, cells: impl IntoIterator<Item = Option<i64>>) -> Self {
        let (data, null_bitmap) = split_cells(cells, 0);
        Self::from_parts(name, DataType::Int, ColumnData::Int(data), null_bitmap)
    }

    pub fn from_floats(name: impl Into<String>, cells: impl IntoIterator<Item = Option<f64>>) -> Self {
        let (data, null_bitmap) = split_cells(cells, 0.0);
        Self::from_parts(name, DataType::Float, ColumnData::Float(data), null_bitmap)
    }

    pub fn from_texts<'a>(
        name: impl Into<String>,
        cells: impl IntoIterator<Item = Option<&'a str>>,
    ) -> Self {
        let (data, null_bitmap): (Vec<Arc<str>>, _) =
            split_cells(cells.into_iter().map(|c| c.map(Arc::from)), Arc::from(""));
        Self::from_parts(name, DataType::Text, ColumnData::Text(data), null_bitmap)
    }

    /// Builds a factor column whose levels are the sorted distinct labels of `cells`.
    pub fn from_factor<'a>(
        name: impl Into<String>,
        cells: impl IntoIterator<Item = Option<&'a str>>,
    ) -> Self {
        let cells: Vec<Option<&str>> = cells.into_iter().collect();
        let mut levels: Vec<&str> = cells.iter().flatten().copied().collect();
        levels.sort_unstable();
        levels.dedup();

        let codes = cells
            .iter()
            .map(|&cell| cell.and_then(|label| levels.binary_search(&label).ok()));
        let (codes, null_bitmap) = split_cells(codes.map(|c| c.map(|c| c as u32)), 0);
        let levels: Vec<Arc<str>> = levels.into_iter().map(Arc::from).collect();
        Self::from_parts(
            name,
            DataType::Factor,
            ColumnData::Factor {
                codes,
                levels: Arc::from(levels),
            },
            null_bitmap,
        )
    }

    /// Builds a factor column over an explicit level list.
    ///
    /// # Errors
    /// Returns [Error::ValueType] if a label is not one of `levels`.
    pub fn from_factor_with_levels<'a>(
        name: impl Into<String>,
        levels: &[&str],
        cells: impl IntoIterator<Item = Option<&'a str>>,
    ) -> TableResult<Self> {
        let mut column = Self::new_factor(name, levels.iter().copied());
        for cell in cells {
            column.push(cell.map_or(Value::Null, |label| Value::Text(Arc::from(label))))?;
        }
        Ok(column)
    }

    pub fn from_lists(
        name: impl Into<String>,
        cells: impl IntoIterator<Item = Option<Vec<Value>>>,
    ) -> Self {
        let (data, null_bitmap): (Vec<Arc<[Value]>>, _) = split_cells(
            cells.into_iter().map(|c| c.map(Arc::from)),
            Arc::from(Vec::new()),
        );
        Self::from_parts(name, DataType::List, ColumnData::List(data), null_bitmap)
    }

    /// Assembles a column from already-aligned storage.
    pub(crate) fn from_parts(
        name: impl Into<String>,
        data_type: DataType,
        data: ColumnData,
        null_bitmap: BitVec,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            data,
            null_bitmap,
        }
    }

    /// Returns a copy of this column under another name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Appends a new value to the end of the column.
    ///
    /// # Errors
    /// Returns [Error::ValueType] if the value's type does not match the column's
    /// data type, or if a factor label is not one of the column's levels.
    ///
    /// # Behavior
    /// - If the value is `Null`, a default "dummy" value is pushed to the data vector
    ///   to maintain index alignment with the `null_bitmap`.
    /// - Factor columns take [Value::Text] labels.
    ///
    /// # Example
    /// ```
    /// # use coltab::{Column, DataType, Value};
    /// let mut col = Column::new("age", DataType::Int);
    /// col.push(Value::Int(30)).unwrap();
    /// col.push(Value::Null).unwrap();
    ///
    /// assert_eq!(col.len(), 2);
    /// assert!(col.get(1).unwrap().is_null());
    /// ```
    pub fn push(&mut self, value: Value) -> TableResult<()> {
        if value.is_null() {
            self.null_bitmap.push(true);
            // Add default value to keep alignment between the data vector and the bitmap
            match &mut self.data {
                ColumnData::Bool(v) => v.push(false),
                ColumnData::Int(v) => v.push(0),
                ColumnData::Float(v) => v.push(0.0),
                ColumnData::Text(v) => v.push(Arc::from("")),
                ColumnData::Factor { codes, .. } => codes.push(0),
                ColumnData::List(v) => v.push(Arc::from(Vec::<Value>::new())),
            }
            return Ok(());
        }

        let accepted = match (&mut self.data, &value) {
            (ColumnData::Bool(col), Value::Bool(v)) => {
                col.push(*v);
                true
            }
            (ColumnData::Int(col), Value::Int(v)) => {
                col.push(*v);
                true
            }
            (ColumnData::Float(col), Value::Float(v)) => {
                col.push(*v);
                true
            }
            (ColumnData::Text(col), Value::Text(v)) => {
                col.push(Arc::clone(v));
                true
            }
            (ColumnData::List(col), Value::List(v)) => {
                col.push(Arc::clone(v));
                true
            }
            (ColumnData::Factor { codes, levels }, Value::Text(label)) => {
                match levels.iter().position(|level| level == label) {
                    Some(code) => {
                        codes.push(code as u32);
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        };

        if !accepted {
            return Err(Error::ValueType {
                column: self.name.clone(),
                data_type: self.data_type,
                value: format!("{value:?}"),
            });
        }

        self.null_bitmap.push(false);
        Ok(())
    }

    /// Returns the number of rows currently stored in the column.
    pub fn len(&self) -> usize {
        self.null_bitmap.len()
    }

    /// Returns true if there is no row in the column, else false.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the value at `row_idx` is missing. Out of range rows are not.
    pub fn is_null(&self, row_idx: usize) -> bool {
        self.null_bitmap.get(row_idx).is_some_and(|bit| *bit)
    }

    /// Level names of a factor column.
    pub fn levels(&self) -> Option<&Arc<[Arc<str>]>> {
        match &self.data {
            ColumnData::Factor { levels, .. } => Some(levels),
            _ => None,
        }
    }

    /// Retrieves the value at the specified row index.
    ///
    /// Returns `Some(Value)` if the index is valid, or `None` if it is out of bounds.
    /// If the `null_bitmap` indicates a null at the index, `Some(Value::Null)` is returned.
    pub fn get(&self, row_idx: usize) -> Option<Value> {
        if row_idx >= self.len() {
            return None;
        }
        if self.null_bitmap[row_idx] {
            return Some(Value::Null);
        }
        let value = match &self.data {
            ColumnData::Bool(col) => Value::Bool(col[row_idx]),
            ColumnData::Int(col) => Value::Int(col[row_idx]),
            ColumnData::Float(col) => Value::Float(col[row_idx]),
            ColumnData::Text(col) => Value::Text(Arc::clone(&col[row_idx])),
            ColumnData::Factor { codes, levels } => {
                Value::Text(Arc::clone(&levels[codes[row_idx] as usize]))
            }
            ColumnData::List(col) => Value::List(Arc::clone(&col[row_idx])),
        };
        Some(value)
    }

    /// Reads every row into a vector of values.
    pub fn values(&self) -> Vec<Value> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }

    /// Builds a new column by reading this column at `indices`, in order.
    /// Indices may repeat or skip rows.
    ///
    /// # Errors
    /// Returns [Error::IndexOutOfRange] if any index is not below [Column::len].
    pub fn take(&self, indices: &[usize]) -> TableResult<Column> {
        let len = self.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(Error::IndexOutOfRange { index, len });
        }

        let null_bitmap: BitVec = indices.iter().map(|&i| self.null_bitmap[i]).collect();
        let data = match &self.data {
            ColumnData::Bool(col) => ColumnData::Bool(indices.iter().map(|&i| col[i]).collect()),
            ColumnData::Int(col) => ColumnData::Int(indices.iter().map(|&i| col[i]).collect()),
            ColumnData::Float(col) => ColumnData::Float(indices.iter().map(|&i| col[i]).collect()),
            ColumnData::Text(col) => {
                ColumnData::Text(indices.iter().map(|&i| Arc::clone(&col[i])).collect())
            }
            ColumnData::Factor { codes, levels } => ColumnData::Factor {
                codes: indices.iter().map(|&i| codes[i]).collect(),
                levels: Arc::clone(levels),
            },
            ColumnData::List(col) => {
                ColumnData::List(indices.iter().map(|&i| Arc::clone(&col[i])).collect())
            }
        };

        Ok(Self::from_parts(self.name.clone(), self.data_type, data, null_bitmap))
    }

    /// Copies the contiguous rows in `range`.
    pub fn slice(&self, range: Range<usize>) -> TableResult<Column> {
        let indices: Vec<usize> = range.collect();
        self.take(&indices)
    }
}

/// Splits optional cells into a dense vector and its null bitmap.
fn split_cells<T: Clone>(cells: impl IntoIterator<Item = Option<T>>, fill: T) -> (Vec<T>, BitVec) {
    let mut data = Vec::new();
    let mut null_bitmap = BitVec::new();
    for cell in cells {
        null_bitmap.push(cell.is_none());
        data.push(cell.unwrap_or_else(|| fill.clone()));
    }
    (data, null_bitmap)
}

/// Map from label to level code, for factor re-coding.
pub(crate) fn level_lookup(levels: &[Arc<str>]) -> AHashMap<&str, u32> {
    levels
        .iter()
        .enumerate()
        .map(|(code, level)| (level.as_ref(), code as u32))
        .collect()
}
