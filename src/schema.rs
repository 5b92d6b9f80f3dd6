// Reader for the sqlite_schema (sqlite_master) catalog table.
//
// The catalog is a regular table B-tree always rooted at page 1. Each row
// decodes as [rowid, type, name, tbl_name, rootpage, sql]:
//   type (TEXT)        - "table", "index", "view", or "trigger"
//   name (TEXT)        - name of the object
//   tbl_name (TEXT)    - name of the table the object is associated with
//   rootpage (INTEGER) - root page of the object's B-tree (0 for views)
//   sql (TEXT)         - the CREATE statement (NULL for autoindex)

use crate::btree;
use crate::db::Database;
use crate::error::Result;
use crate::types::{Row, Value};

/// A single entry from the schema catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    /// The type of schema object: "table", "index", "view", or "trigger".
    pub entry_type: String,
    /// The name of the schema object.
    pub name: String,
    /// The name of the table this object is associated with.
    pub tbl_name: String,
    /// The root page number of the object's B-tree.
    pub rootpage: i64,
    /// The SQL CREATE statement that defined this object. Carried as
    /// opaque text; never parsed.
    pub sql: Option<String>,
}

impl SchemaEntry {
    /// Build an entry from a decoded catalog row, or None if the row does
    /// not have the six-column catalog shape (e.g. an overflow
    /// placeholder row).
    fn from_row(row: &Row) -> Option<SchemaEntry> {
        if row.len() < 6 {
            return None;
        }

        let entry_type = row[1].as_text()?.to_string();
        let name = row[2].as_text()?.to_string();
        let tbl_name = row[3].as_text()?.to_string();
        let rootpage = match &row[4] {
            Value::Integer(i) => *i,
            Value::Null => 0,
            _ => return None,
        };
        let sql = match &row[5] {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        };

        Some(SchemaEntry {
            entry_type,
            name,
            tbl_name,
            rootpage,
            sql,
        })
    }
}

/// Read every entry from the catalog table rooted at page 1.
///
/// Rows that do not look like catalog rows are skipped rather than
/// treated as fatal, so one oversized entry cannot abort the scan.
pub fn read_schema(db: &Database<'_>) -> Result<Vec<SchemaEntry>> {
    let rows = btree::read_btree_table(db, 1)?;
    Ok(rows.iter().filter_map(SchemaEntry::from_row).collect())
}

/// Find a table entry by exact name.
pub fn find_table<'a>(schema: &'a [SchemaEntry], name: &str) -> Option<&'a SchemaEntry> {
    schema
        .iter()
        .find(|entry| entry.entry_type == "table" && entry.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_row(entry_type: &str, name: &str, rootpage: i64) -> Row {
        vec![
            Value::Integer(1),
            Value::Text(entry_type.into()),
            Value::Text(name.into()),
            Value::Text(name.into()),
            Value::Integer(rootpage),
            Value::Text(format!("CREATE TABLE {name} (x)")),
        ]
    }

    #[test]
    fn test_entry_from_row() {
        let row = catalog_row("table", "users", 2);
        let entry = SchemaEntry::from_row(&row).unwrap();
        assert_eq!(entry.entry_type, "table");
        assert_eq!(entry.name, "users");
        assert_eq!(entry.tbl_name, "users");
        assert_eq!(entry.rootpage, 2);
        assert_eq!(entry.sql, Some("CREATE TABLE users (x)".into()));
    }

    #[test]
    fn test_entry_with_null_sql_and_rootpage() {
        let row = vec![
            Value::Integer(4),
            Value::Text("view".into()),
            Value::Text("v".into()),
            Value::Text("v".into()),
            Value::Null,
            Value::Null,
        ];
        let entry = SchemaEntry::from_row(&row).unwrap();
        assert_eq!(entry.rootpage, 0);
        assert_eq!(entry.sql, None);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        // Overflow placeholder shape.
        assert!(SchemaEntry::from_row(&vec![Value::Null, Value::Null]).is_none());
        // Non-text name.
        let mut row = catalog_row("table", "t", 2);
        row[2] = Value::Integer(5);
        assert!(SchemaEntry::from_row(&row).is_none());
    }

    #[test]
    fn test_find_table_exact_match() {
        let schema = vec![
            SchemaEntry::from_row(&catalog_row("index", "notes", 3)).unwrap(),
            SchemaEntry::from_row(&catalog_row("table", "notes", 2)).unwrap(),
            SchemaEntry::from_row(&catalog_row("table", "cards", 4)).unwrap(),
        ];

        let entry = find_table(&schema, "notes").unwrap();
        assert_eq!(entry.entry_type, "table");
        assert_eq!(entry.rootpage, 2);

        assert!(find_table(&schema, "Notes").is_none());
        assert!(find_table(&schema, "missing").is_none());
    }
}
