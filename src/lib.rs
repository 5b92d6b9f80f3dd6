//! A minimal, read-only reader for the SQLite3 on-disk file format.
//!
//! Given a byte buffer holding a complete database file, litescan
//! validates the header, locates a table through the schema catalog,
//! walks its B-tree, and decodes every leaf cell into a row of typed
//! values. That is the whole surface: no SQL, no writing, no indexes,
//! no WAL or journal recovery, and no overflow-page chains (cells whose
//! payload spills onto overflow pages decode as `[Null, Null]`
//! placeholders).
//!
//! ```no_run
//! use litescan::Database;
//!
//! # fn main() -> litescan::Result<()> {
//! let bytes = std::fs::read("collection.db").expect("read file");
//! let db = Database::open(&bytes)?;
//! for row in db.read_table("notes")? {
//!     // row[0] is the rowid, the rest are column values.
//!     println!("{:?}", row);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! SQLite3 file format reference: https://www.sqlite.org/fileformat2.html

pub mod btree;
pub mod cursor;
pub mod db;
pub mod error;
pub mod format;
pub mod record;
pub mod schema;
pub mod types;
pub mod varint;

pub use db::{Database, PageNumber};
pub use error::{LitescanError, Result};
pub use schema::SchemaEntry;
pub use types::{Row, Value};
