use crate::error::TableResult;
use crate::order::{OrderVisitors, SortKey};
use crate::table::{Frame, GroupedTable, Table};

/// Reorders the rows of `frame` by `keys`, stably.
///
/// Each key is a column already evaluated against the table, with its own
/// direction. Without keys a plain table comes back unchanged, while a
/// grouped table has its groups put in label order (see [arrange_groups]).
/// A grouped table sorted by keys keeps its groups; their index lists are
/// renumbered to follow the rows.
///
/// # Errors
/// [crate::Error::UnsupportedType] or [crate::Error::SizeMismatch] for a key
/// that is not orderable or not as long as the table.
pub fn arrange(frame: &Frame, keys: &[SortKey<'_>]) -> TableResult<Frame> {
    match frame {
        Frame::Grouped(grouped) if keys.is_empty() => arrange_groups(grouped).map(Frame::Grouped),
        Frame::Grouped(grouped) => {
            let (table, permutation) = sort_rows(grouped.table(), keys)?;
            Ok(Frame::Grouped(regroup(grouped, table, &permutation)))
        }
        Frame::Flat(table) => arrange_table(table, keys).map(Frame::Flat),
    }
}

/// [arrange] for a plain table.
pub fn arrange_table(table: &Table, keys: &[SortKey<'_>]) -> TableResult<Table> {
    if keys.is_empty() {
        return Ok(table.clone());
    }
    sort_rows(table, keys).map(|(table, _)| table)
}

fn sort_rows(table: &Table, keys: &[SortKey<'_>]) -> TableResult<(Table, Vec<usize>)> {
    let order = OrderVisitors::new(keys, table.row_count(), "arrange")?;
    log::debug!("arrange: {} rows by {} keys", table.row_count(), keys.len());
    let permutation = order.apply();
    let sorted = table.subset(&permutation, table.class().clone())?;
    Ok((sorted, permutation))
}

/// Puts the groups of `grouped` in ascending label order.
///
/// The labels are sorted, each group carries its index list along, and the
/// rows are laid out group after group so that every group covers a
/// contiguous run. Rows keep their order inside a group.
pub fn arrange_groups(grouped: &GroupedTable) -> TableResult<GroupedTable> {
    let labels = grouped.labels();
    let index = OrderVisitors::ascending(labels, "arrange")?.apply();
    log::debug!("arrange: reordering {} groups by label", index.len());

    let sorted_labels = labels.subset(&index, labels.class().clone())?;

    let table = grouped.table();
    let mut master_index = Vec::with_capacity(table.row_count());
    let mut new_indices = Vec::with_capacity(index.len());
    for &group in &index {
        let rows = &grouped.indices()[group];
        let start = master_index.len();
        master_index.extend_from_slice(rows);
        new_indices.push((start..master_index.len()).collect::<Vec<_>>());
    }

    let rows = table.subset(&master_index, table.class().clone())?;
    Ok(GroupedTable::from_trusted(
        rows,
        sorted_labels,
        new_indices,
        grouped.vars().to_vec(),
        grouped.drop(),
    ))
}

/// Carries the groups of `grouped` over to `table`, whose row `p` is row
/// `permutation[p]` of the grouped table.
fn regroup(grouped: &GroupedTable, table: Table, permutation: &[usize]) -> GroupedTable {
    let mut position = vec![0; permutation.len()];
    for (new, &old) in permutation.iter().enumerate() {
        position[old] = new;
    }
    let indices = grouped
        .indices()
        .iter()
        .map(|rows| {
            let mut rows: Vec<usize> = rows.iter().map(|&row| position[row]).collect();
            rows.sort_unstable();
            rows
        })
        .collect();
    GroupedTable::from_trusted(
        table,
        grouped.labels().clone(),
        indices,
        grouped.vars().to_vec(),
        grouped.drop(),
    )
}
