// Read-only database handle over a memory-resident SQLite3 file.
//
// The whole file is expected to already be in memory as one contiguous
// buffer (the caller typically extracted it from a container archive).
// The handle borrows the buffer, validates the header once, and addresses
// pages by plain offset arithmetic; nothing is cached and nothing is ever
// mutated, so a handle may be shared freely across threads.

use log::debug;

use crate::btree;
use crate::error::{LitescanError, Result};
use crate::format::DatabaseHeader;
use crate::schema::{self, SchemaEntry};
use crate::types::Row;

/// 1-indexed page number.
pub type PageNumber = u32;

/// A read-only SQLite3 database.
#[derive(Debug)]
pub struct Database<'a> {
    data: &'a [u8],
    header: DatabaseHeader,
}

impl<'a> Database<'a> {
    /// Open a database from raw bytes.
    ///
    /// Validates the 100-byte file header: the buffer must be at least
    /// that long, start with the SQLite magic string, and declare a page
    /// size that is a power of two in [512, 65536] (the stored value 1
    /// meaning 65536).
    pub fn open(data: &'a [u8]) -> Result<Database<'a>> {
        let header = DatabaseHeader::parse(data)?;
        debug!(
            "opened database: page_size={} page_count={}",
            header.page_size, header.page_count
        );
        Ok(Database { data, header })
    }

    /// The parsed file header.
    pub fn header(&self) -> &DatabaseHeader {
        &self.header
    }

    /// Page size in bytes.
    pub fn page_size(&self) -> usize {
        self.header.page_size as usize
    }

    /// The raw bytes of a page. Pages are 1-indexed; page `n` is the
    /// window [(n-1)*page_size, n*page_size) of the buffer.
    pub fn page(&self, n: PageNumber) -> Result<&'a [u8]> {
        if n == 0 {
            return Err(LitescanError::Corrupt("page number 0 is invalid".into()));
        }
        let start = (n as usize - 1) * self.page_size();
        let end = start + self.page_size();
        if end > self.data.len() {
            return Err(LitescanError::Corrupt(format!("page {n} out of range")));
        }
        Ok(&self.data[start..end])
    }

    /// Every entry of the schema catalog.
    pub fn schema(&self) -> Result<Vec<SchemaEntry>> {
        schema::read_schema(self)
    }

    /// Read all rows of the named table, in ascending rowid order.
    ///
    /// Each row has the rowid as element 0 followed by the column values.
    /// Rows whose payload spills onto overflow pages decode as the
    /// placeholder `[Null, Null]`; overflow chains are not followed.
    pub fn read_table(&self, name: &str) -> Result<Vec<Row>> {
        let entries = self.schema()?;
        let entry = schema::find_table(&entries, name)
            .ok_or_else(|| LitescanError::TableNotFound(name.to_string()))?;

        if entry.rootpage < 1 || entry.rootpage > PageNumber::MAX as i64 {
            return Err(LitescanError::Corrupt(format!(
                "table {name:?} has invalid root page {}",
                entry.rootpage
            )));
        }

        debug!("table {name:?} rooted at page {}", entry.rootpage);
        btree::read_btree_table(self, entry.rootpage as PageNumber)
    }
}
