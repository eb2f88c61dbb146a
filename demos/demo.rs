use coltab::*;

fn print_table(table: &Table) {
    println!("  {}", table.names().join(" | "));
    for row in 0..table.row_count() {
        let cells: Vec<String> = table
            .get_row(row)
            .unwrap_or_default()
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("  {}", cells.join(" | "));
    }
}

fn main() -> Result<(), Error> {
    println!("Columnar Table Demo\n");

    let users = Table::new(vec![
        Column::from_ints("id", [Some(1), Some(2), Some(3), Some(4)]),
        Column::from_texts("name", [Some("Alice"), Some("Bob"), Some("Charlie"), Some("Alice")]),
        Column::from_ints("age", [Some(30), Some(25), None, Some(30)]),
    ])?;
    println!("Created table with {} rows", users.row_count());
    print_table(&users);

    // Sort by age descending, then name
    let age = users.column("age").ok_or(Error::UnknownColumn { name: "age".into() })?;
    let name = users.column("name").ok_or(Error::UnknownColumn { name: "name".into() })?;
    let sorted = arrange_table(&users, &[SortKey::descending(age), SortKey::ascending(name)])?;
    println!("\nSorted by age DESC, name ASC:");
    print_table(&sorted);

    // Stack a table with a float column on top of the integer one
    let late = Table::new(vec![
        Column::from_ints("id", [Some(5)]),
        Column::from_floats("age", [Some(41.5)]),
    ])?;
    let stacked = bind_rows([BindArg::from(&users), BindArg::Absent, BindArg::from(&late)])?;
    println!("\nStacked ({} rows), age is now {}:", stacked.row_count(), stacked.schema().columns[2].data_type);
    print_table(&stacked);

    // Drop duplicate (name, age) rows
    let pairs = Table::new(vec![name.clone(), age.clone()])?;
    let unique = distinct(&pairs)?;
    println!("\nDistinct (name, age):");
    print_table(&unique);

    // Groups in label order
    let grouped = GroupedTable::group_by(users, &["name"], false)?;
    let arranged = arrange(&Frame::Grouped(grouped), &[])?;
    if let Some(grouped) = arranged.as_grouped() {
        println!("\nGroups by name, sizes {:?}:", grouped.group_sizes());
        print_table(grouped.table());
    }

    Ok(())
}
