use std::process;

use litescan::Database;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("usage: {} <database-file> [table]", args[0]);
        process::exit(2);
    }

    let path = &args[1];
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error: unable to read \"{path}\": {e}");
            process::exit(1);
        }
    };

    let db = match Database::open(&data) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Error: unable to open database \"{path}\": {e}");
            process::exit(1);
        }
    };

    let result = match args.get(2) {
        Some(table) => dump_table(&db, table),
        None => print_schema(&db),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// List every catalog entry, sqlite3-shell style.
fn print_schema(db: &Database<'_>) -> litescan::Result<()> {
    for entry in db.schema()? {
        println!(
            "{} {} (root page {})",
            entry.entry_type, entry.name, entry.rootpage
        );
        if let Some(sql) = &entry.sql {
            println!("  {sql}");
        }
    }
    Ok(())
}

/// Dump all rows of a table, one pipe-separated line per row.
fn dump_table(db: &Database<'_>, table: &str) -> litescan::Result<()> {
    let rows = db.read_table(table)?;
    for row in &rows {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("{}", line.join("|"));
    }
    eprintln!("{} rows", rows.len());
    Ok(())
}
