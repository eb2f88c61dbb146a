use ahash::AHashSet;
use bitvec::prelude::*;

use crate::column::Column;
use crate::data_type::DataType;
use crate::distinct::RowIdentitySet;
use crate::error::{Error, TableResult};
use crate::value::Value;
use crate::visitor::TableVisitors;

/// Column definition in the schema
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub columns: Vec<ColumnDef>,
}

/// Opaque "kind" of a table, carried through row reordering untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTag(Vec<String>);

impl ClassTag {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl Default for ClassTag {
    fn default() -> Self {
        Self(vec!["table".to_string()])
    }
}

/// An ordered collection of equal-length, uniquely named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
    class: ClassTag,
}

impl Table {
    /// Builds a table with the default class tag.
    /// The row count is the length of the first column, or zero.
    ///
    /// # Errors
    /// [Error::SizeMismatch] if the columns differ in length or a column's
    /// cells are out of step with its null bitmap,
    /// [Error::DuplicateColumn] if two columns share a name.
    pub fn new(columns: Vec<Column>) -> TableResult<Self> {
        Self::with_class(columns, ClassTag::default())
    }

    pub fn with_class(columns: Vec<Column>, class: ClassTag) -> TableResult<Self> {
        let row_count = columns.first().map_or(0, Column::len);
        Self::with_row_count(columns, row_count, class)
    }

    /// Builds a table with an explicit row count, which lets a table without
    /// columns still report rows.
    pub fn with_row_count(columns: Vec<Column>, row_count: usize, class: ClassTag) -> TableResult<Self> {
        let mut seen = AHashSet::with_capacity(columns.len());
        for column in &columns {
            if column.data.len() != column.null_bitmap.len() {
                return Err(Error::SizeMismatch {
                    operation: "table",
                    subject: format!("data of column '{}'", column.name),
                    expected: column.null_bitmap.len(),
                    actual: column.data.len(),
                });
            }
            if column.len() != row_count {
                return Err(Error::SizeMismatch {
                    operation: "table",
                    subject: format!("column '{}'", column.name),
                    expected: row_count,
                    actual: column.len(),
                });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(Error::DuplicateColumn {
                    name: column.name.clone(),
                });
            }
        }
        Ok(Self {
            columns,
            row_count,
            class,
        })
    }

    /// Assembles a table whose columns are known to be aligned and uniquely named.
    pub(crate) fn from_trusted(columns: Vec<Column>, row_count: usize, class: ClassTag) -> Self {
        debug_assert!(columns.iter().all(|c| c.len() == row_count));
        Self {
            columns,
            row_count,
            class,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn class(&self) -> &ClassTag {
        &self.class
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn schema(&self) -> Schema {
        Schema {
            columns: self
                .columns
                .iter()
                .map(|c| ColumnDef {
                    name: c.name.clone(),
                    data_type: c.data_type,
                })
                .collect(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.name == name)
    }

    pub fn get_row(&self, row_idx: usize) -> Option<Vec<Value>> {
        if self.row_count <= row_idx {
            return None;
        }
        self.columns.iter().map(|col| col.get(row_idx)).collect()
    }

    /// Materializes every column at `indices` and tags the result with `class`.
    /// Column order and names are kept; the row count becomes `indices.len()`.
    ///
    /// # Errors
    /// [Error::IndexOutOfRange] if an index is not below the row count.
    pub fn subset(&self, indices: &[usize], class: ClassTag) -> TableResult<Table> {
        if let Some(&index) = indices.iter().find(|&&i| i >= self.row_count) {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.row_count,
            });
        }
        let columns = self
            .columns
            .iter()
            .map(|column| column.take(indices))
            .collect::<TableResult<Vec<_>>>()?;
        Ok(Self::from_trusted(columns, indices.len(), class))
    }
}

/// A table partitioned into groups of rows sharing the same values in `vars`.
///
/// `labels`, `indices` and `group_sizes` are addressed by the same group
/// position, and the index lists cover every row exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTable {
    table: Table,
    labels: Table,
    indices: Vec<Vec<usize>>,
    group_sizes: Vec<usize>,
    biggest_group_size: usize,
    vars: Vec<String>,
    drop: bool,
}

impl GroupedTable {
    /// Groups `table` by the named columns.
    ///
    /// Groups are numbered in order of first appearance; rows inside a group
    /// stay in table order. `drop` is carried as-is for callers that track
    /// empty-level groups.
    pub fn group_by(table: Table, vars: &[&str], drop: bool) -> TableResult<Self> {
        let keys = vars
            .iter()
            .map(|&var| {
                table.column(var).cloned().ok_or_else(|| Error::UnknownColumn {
                    name: var.to_string(),
                })
            })
            .collect::<TableResult<Vec<_>>>()?;
        let keys = Table::with_row_count(keys, table.row_count(), ClassTag::default())?;

        let visitors = TableVisitors::new(&keys, "group_by")?;
        let mut set = RowIdentitySet::new(&visitors);
        let mut indices: Vec<Vec<usize>> = Vec::new();
        for row in 0..keys.row_count() {
            let (group, inserted) = set.insert(row);
            if inserted {
                indices.push(Vec::new());
            }
            indices[group].push(row);
        }
        let labels = visitors.subset(set.rows(), ClassTag::default())?;

        log::debug!(
            "group_by: {} rows into {} groups over {:?}",
            table.row_count(),
            indices.len(),
            vars
        );

        Ok(Self::from_trusted(
            table,
            labels,
            indices,
            vars.iter().map(|v| v.to_string()).collect(),
            drop,
        ))
    }

    /// Assembles a grouped table from explicit parts.
    ///
    /// # Errors
    /// [Error::InvalidGrouping] if the labels and index lists disagree in
    /// number or the index lists do not partition the rows, and
    /// [Error::UnknownColumn] for a var that is not a column of `table`.
    pub fn from_parts(
        table: Table,
        labels: Table,
        indices: Vec<Vec<usize>>,
        vars: Vec<String>,
        drop: bool,
    ) -> TableResult<Self> {
        if labels.row_count() != indices.len() {
            return Err(Error::InvalidGrouping(format!(
                "{} label rows for {} groups",
                labels.row_count(),
                indices.len()
            )));
        }
        if let Some(var) = vars.iter().find(|v| table.column(v).is_none()) {
            return Err(Error::UnknownColumn { name: var.clone() });
        }
        let grouped = Self::from_trusted(table, labels, indices, vars, drop);
        grouped.check_partition()?;
        Ok(grouped)
    }

    pub(crate) fn from_trusted(
        table: Table,
        labels: Table,
        indices: Vec<Vec<usize>>,
        vars: Vec<String>,
        drop: bool,
    ) -> Self {
        let group_sizes: Vec<usize> = indices.iter().map(Vec::len).collect();
        let biggest_group_size = group_sizes.iter().copied().max().unwrap_or(0);
        Self {
            table,
            labels,
            indices,
            group_sizes,
            biggest_group_size,
            vars,
            drop,
        }
    }

    /// Verifies that the group index lists cover `0..row_count` exactly once.
    pub fn check_partition(&self) -> TableResult<()> {
        let n = self.table.row_count();
        let mut seen = bitvec![0; n];
        for (group, rows) in self.indices.iter().enumerate() {
            for &row in rows {
                if row >= n {
                    return Err(Error::InvalidGrouping(format!(
                        "group {} refers to row {row} of {n}",
                        group + 1
                    )));
                }
                if seen.replace(row, true) {
                    return Err(Error::InvalidGrouping(format!(
                        "row {row} appears in more than one group"
                    )));
                }
            }
        }
        if seen.not_all() {
            return Err(Error::InvalidGrouping(format!(
                "{} of {n} rows belong to no group",
                seen.count_zeros()
            )));
        }
        Ok(())
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn labels(&self) -> &Table {
        &self.labels
    }

    pub fn indices(&self) -> &[Vec<usize>] {
        &self.indices
    }

    pub fn group_sizes(&self) -> &[usize] {
        &self.group_sizes
    }

    pub fn biggest_group_size(&self) -> usize {
        self.biggest_group_size
    }

    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    pub fn drop(&self) -> bool {
        self.drop
    }

    pub fn group_count(&self) -> usize {
        self.indices.len()
    }

    pub fn ungroup(self) -> Table {
        self.table
    }
}

/// Input and output of [crate::arrange()]: either a plain or a grouped table.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Flat(Table),
    Grouped(GroupedTable),
}

impl Frame {
    pub fn table(&self) -> &Table {
        match self {
            Self::Flat(table) => table,
            Self::Grouped(grouped) => grouped.table(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.table().row_count()
    }

    pub fn as_grouped(&self) -> Option<&GroupedTable> {
        match self {
            Self::Flat(_) => None,
            Self::Grouped(grouped) => Some(grouped),
        }
    }
}

impl From<Table> for Frame {
    fn from(table: Table) -> Self {
        Self::Flat(table)
    }
}

impl From<GroupedTable> for Frame {
    fn from(grouped: GroupedTable) -> Self {
        Self::Grouped(grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnData;

    fn users() -> Table {
        Table::new(vec![
            Column::from_ints("id", [Some(1), Some(2), Some(3), Some(4)]),
            Column::from_texts("team", [Some("b"), Some("a"), Some("b"), None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_table_creation() {
        let table = users();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 4);
        assert_eq!(table.names(), vec!["id", "team"]);
        assert_eq!(table.class(), &ClassTag::default());
        assert_eq!(
            table.schema().columns[1],
            ColumnDef {
                name: "team".into(),
                data_type: DataType::Text,
            }
        );
    }

    #[test]
    fn test_column_length_mismatch() {
        let result = Table::new(vec![
            Column::from_ints("a", [Some(1), Some(2)]),
            Column::from_ints("b", [Some(1)]),
        ]);
        assert!(matches!(
            result,
            Err(Error::SizeMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_column_data_out_of_step_with_bitmap() {
        let mut column = Column::from_ints("a", [Some(1), Some(2)]);
        column.data = ColumnData::Int(vec![1]);

        let result = Table::new(vec![column]);
        assert_eq!(
            result,
            Err(Error::SizeMismatch {
                operation: "table",
                subject: "data of column 'a'".into(),
                expected: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_duplicate_column() {
        let result = Table::new(vec![
            Column::from_ints("a", [Some(1)]),
            Column::from_bools("a", [Some(true)]),
        ]);
        assert_eq!(result, Err(Error::DuplicateColumn { name: "a".into() }));
    }

    #[test]
    fn test_get_row_and_col() {
        let table = users();

        assert_eq!(
            table.get_row(3).unwrap(),
            vec![Value::Int(4), Value::Null]
        );
        assert!(table.get_row(4).is_none());
        assert!(table.column("id").is_some());
        assert!(table.column("age").is_none());
    }

    #[test]
    fn test_subset_keeps_names_and_sets_class() {
        let table = users();
        let class = ClassTag::new(["tbl", "table"]);

        let out = table.subset(&[3, 0, 0], class.clone()).unwrap();
        assert_eq!(out.row_count(), 3);
        assert_eq!(out.names(), table.names());
        assert_eq!(out.class(), &class);
        assert_eq!(out.get_row(1).unwrap(), vec![Value::Int(1), Value::Text("b".into())]);

        assert_eq!(
            table.subset(&[9], ClassTag::default()),
            Err(Error::IndexOutOfRange { index: 9, len: 4 })
        );
    }

    #[test]
    fn test_zero_column_table_keeps_row_count() {
        let table = Table::with_row_count(vec![], 5, ClassTag::default()).unwrap();
        assert_eq!(table.row_count(), 5);
        assert_eq!(table.subset(&[0, 1], ClassTag::default()).unwrap().row_count(), 2);
    }

    #[test]
    fn test_group_by_first_appearance() {
        let grouped = GroupedTable::group_by(users(), &["team"], true).unwrap();

        assert_eq!(grouped.group_count(), 3);
        assert_eq!(grouped.indices(), &[vec![0, 2], vec![1], vec![3]]);
        assert_eq!(grouped.group_sizes(), &[2, 1, 1]);
        assert_eq!(grouped.biggest_group_size(), 2);
        assert_eq!(grouped.vars(), &["team".to_string()]);
        assert!(grouped.drop());
        assert_eq!(
            grouped.labels().column("team").unwrap().values(),
            vec![Value::Text("b".into()), Value::Text("a".into()), Value::Null]
        );
        grouped.check_partition().unwrap();
    }

    #[test]
    fn test_group_by_unknown_column() {
        let result = GroupedTable::group_by(users(), &["age"], false);
        assert_eq!(result, Err(Error::UnknownColumn { name: "age".into() }));
    }

    #[test]
    fn test_from_parts_rejects_bad_partition() {
        let labels = Table::new(vec![Column::from_texts("team", [Some("a"), Some("b")])]).unwrap();

        let overlapping = GroupedTable::from_parts(
            users(),
            labels.clone(),
            vec![vec![0, 1], vec![1, 2, 3]],
            vec!["team".into()],
            false,
        );
        assert!(matches!(overlapping, Err(Error::InvalidGrouping(_))));

        let missing = GroupedTable::from_parts(
            users(),
            labels.clone(),
            vec![vec![0, 1], vec![2]],
            vec!["team".into()],
            false,
        );
        assert!(matches!(missing, Err(Error::InvalidGrouping(_))));

        let ok = GroupedTable::from_parts(
            users(),
            labels,
            vec![vec![0, 1], vec![2, 3]],
            vec!["team".into()],
            false,
        )
        .unwrap();
        assert_eq!(ok.group_sizes(), &[2, 2]);
    }
}
