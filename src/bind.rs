use ahash::AHashMap;

use crate::collecter::Collecter;
use crate::column::Column;
use crate::error::{Error, TableResult};
use crate::interrupt::Interrupt;
use crate::table::{ClassTag, GroupedTable, Table};
use crate::value::Value;

/// One argument of [bind_rows] or [bind_cols].
#[derive(Debug, Clone, Copy)]
pub enum BindArg<'a> {
    Table(&'a Table),
    /// Bound as its underlying flat table.
    Grouped(&'a GroupedTable),
    /// Skipped.
    Absent,
    Column(&'a Column),
    Scalar(&'a Value),
}

impl<'a> BindArg<'a> {
    fn kind(&self) -> &'static str {
        match self {
            Self::Table(_) | Self::Grouped(_) => "table",
            Self::Absent => "absent value",
            Self::Column(_) => "column",
            Self::Scalar(_) => "scalar",
        }
    }

    /// The table behind this argument; `None` for [BindArg::Absent].
    fn as_table(&self, operation: &'static str, position: usize) -> TableResult<Option<&'a Table>> {
        match *self {
            Self::Table(table) => Ok(Some(table)),
            Self::Grouped(grouped) => Ok(Some(grouped.table())),
            Self::Absent => Ok(None),
            Self::Column(_) | Self::Scalar(_) => Err(Error::TypeMismatch {
                operation,
                position,
                found: self.kind(),
            }),
        }
    }
}

impl<'a> From<&'a Table> for BindArg<'a> {
    fn from(table: &'a Table) -> Self {
        Self::Table(table)
    }
}

impl<'a> From<&'a GroupedTable> for BindArg<'a> {
    fn from(grouped: &'a GroupedTable) -> Self {
        Self::Grouped(grouped)
    }
}

impl<'a> From<Option<&'a Table>> for BindArg<'a> {
    fn from(table: Option<&'a Table>) -> Self {
        table.map_or(Self::Absent, Self::Table)
    }
}

impl<'a> From<&'a Column> for BindArg<'a> {
    fn from(column: &'a Column) -> Self {
        Self::Column(column)
    }
}

impl<'a> From<&'a Value> for BindArg<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Scalar(value)
    }
}

/// Resolves every argument up front so a non-table fails before any work.
/// Entries keep their 1-based argument position.
fn resolve<'a>(
    args: impl IntoIterator<Item = BindArg<'a>>,
    operation: &'static str,
) -> TableResult<Vec<(usize, &'a Table)>> {
    let mut tables = Vec::new();
    for (i, arg) in args.into_iter().enumerate() {
        if let Some(table) = arg.as_table(operation, i + 1)? {
            tables.push((i + 1, table));
        }
    }
    Ok(tables)
}

/// Stacks tables vertically, matching columns by name.
///
/// See [bind_rows_with].
pub fn bind_rows<'a>(args: impl IntoIterator<Item = BindArg<'a>>) -> TableResult<Table> {
    bind_rows_with(args, &Interrupt::new())
}

/// Stacks tables vertically, matching columns by name.
///
/// The first table to mention a name fixes that column's position in the
/// output. A column is widened along the promotion lattice when a later
/// table brings a wider kind, and rows from tables lacking a column are
/// missing. Tables without columns or without rows are skipped.
///
/// # Errors
/// [Error::TypeMismatch] for an argument that is not a table,
/// [Error::IncompatibleTypes] when two columns under one name have no common
/// kind, [Error::Interrupted] if `interrupt` fires between tables.
pub fn bind_rows_with<'a>(
    args: impl IntoIterator<Item = BindArg<'a>>,
    interrupt: &Interrupt,
) -> TableResult<Table> {
    let tables = resolve(args, "bind_rows")?;
    let tables: Vec<(usize, &Table)> = tables
        .into_iter()
        .filter(|(_, table)| table.column_count() > 0 && table.row_count() > 0)
        .collect();
    let n: usize = tables.iter().map(|(_, table)| table.row_count()).sum();
    log::debug!("bind_rows: {} non-empty tables, {n} rows", tables.len());

    let mut names: Vec<String> = Vec::new();
    let mut positions: AHashMap<String, usize> = AHashMap::new();
    let mut collecters: Vec<Collecter> = Vec::new();

    let mut k = 0;
    for &(position, table) in &tables {
        interrupt.check("bind_rows", position)?;

        let nrows = table.row_count();
        let range = k..k + nrows;
        for source in table.columns() {
            let index = match positions.get(&source.name) {
                Some(&index) => index,
                None => {
                    collecters.push(Collecter::new(source, n));
                    names.push(source.name.clone());
                    positions.insert(source.name.clone(), names.len() - 1);
                    names.len() - 1
                }
            };

            let slot = &mut collecters[index];
            if slot.compatible(source) {
                slot.collect(range.clone(), source)?;
            } else if slot.can_promote(source) {
                let previous = std::mem::take(slot);
                *slot = previous.promote(source, range.clone())?;
            } else {
                return Err(Error::IncompatibleTypes {
                    position,
                    column: source.name.clone(),
                    collecting: slot.describe(),
                    incoming: source.data_type,
                });
            }
        }

        k += nrows;
    }

    let columns = collecters
        .into_iter()
        .zip(names)
        .map(|(collecter, name)| collecter.finish(name))
        .collect();
    Ok(Table::from_trusted(columns, n, ClassTag::default()))
}

/// Places tables side by side. See [bind_cols_with].
pub fn bind_cols<'a>(args: impl IntoIterator<Item = BindArg<'a>>) -> TableResult<Table> {
    bind_cols_with(args, &Interrupt::new())
}

/// Places tables side by side, keeping every column as is and in argument order.
///
/// # Errors
/// [Error::TypeMismatch] for an argument that is not a table,
/// [Error::RowCountMismatch] when a table's row count differs from the first
/// table's, [Error::DuplicateColumn] when two inputs share a column name and
/// [Error::Interrupted] if `interrupt` fires between tables.
pub fn bind_cols_with<'a>(
    args: impl IntoIterator<Item = BindArg<'a>>,
    interrupt: &Interrupt,
) -> TableResult<Table> {
    let tables = resolve(args, "bind_cols")?;
    let Some(&(_, first)) = tables.first() else {
        return Ok(Table::from_trusted(vec![], 0, ClassTag::default()));
    };

    let nrows = first.row_count();
    if let Some(&(position, table)) = tables.iter().find(|(_, t)| t.row_count() != nrows) {
        return Err(Error::RowCountMismatch {
            position,
            expected: nrows,
            actual: table.row_count(),
        });
    }
    log::debug!("bind_cols: {} tables of {nrows} rows", tables.len());

    let mut columns = Vec::with_capacity(tables.iter().map(|(_, t)| t.column_count()).sum());
    for &(position, table) in &tables {
        interrupt.check("bind_cols", position)?;
        columns.extend(table.columns().iter().cloned());
    }
    Table::with_row_count(columns, nrows, ClassTag::default())
}
