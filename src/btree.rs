// Table B-tree traversal.
//
// Implements the read side of the SQLite table B-tree format:
// - B-tree page header parsing (leaf and interior pages)
// - Cell pointer array reading
// - Depth-first in-order walk of a whole table
//
// See: https://www.sqlite.org/fileformat2.html

use log::debug;

use crate::db::{Database, PageNumber};
use crate::error::{LitescanError, Result};
use crate::format::{self, BTreePageType};
use crate::record;
use crate::types::Row;

/// Maximum B-tree depth the walker will descend. Real table trees are a
/// handful of levels; anything deeper is corrupt (or a pointer cycle) and
/// fails cleanly instead of exhausting the native stack.
const MAX_BTREE_DEPTH: usize = 32;

/// Parsed B-tree page header. Leaf pages have an 8-byte header; interior
/// pages have a 12-byte header (the extra 4 bytes store the right-most
/// child pointer).
#[derive(Debug, Clone)]
pub struct BTreePageHeader {
    /// The type of this B-tree page.
    pub page_type: BTreePageType,
    /// Byte offset of the first freeblock on this page (0 if none).
    /// Unused by this reader.
    pub first_freeblock: u16,
    /// Number of cells on this page.
    pub cell_count: u16,
    /// Byte offset of the first byte of the cell content area.
    /// A value of 0 is interpreted as 65536.
    pub cell_content_offset: u16,
    /// Number of fragmented free bytes in the cell content area.
    /// Unused by this reader.
    pub fragmented_free_bytes: u8,
    /// Right-most child page pointer (interior pages only; 0 for leaves).
    pub right_child: PageNumber,
}

impl BTreePageHeader {
    /// Size of the header in bytes: 12 for interior pages, 8 for leaves.
    pub fn header_size(&self) -> usize {
        if self.page_type.is_interior() {
            12
        } else {
            8
        }
    }

    /// Parse a B-tree page header from raw page data.
    ///
    /// `data` is the full page buffer. `offset` is the byte offset where
    /// the B-tree header begins (100 for page 1, 0 for all other pages).
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        if data.len() < offset + 8 {
            return Err(LitescanError::Corrupt(
                "page too small for b-tree header".into(),
            ));
        }

        let page_type = BTreePageType::from_flag(data[offset])?;

        let first_freeblock = format::read_be_u16(data, offset + 1);
        let cell_count = format::read_be_u16(data, offset + 3);
        let cell_content_offset = format::read_be_u16(data, offset + 5);
        let fragmented_free_bytes = data[offset + 7];

        let right_child = if page_type.is_interior() {
            if data.len() < offset + 12 {
                return Err(LitescanError::Corrupt(
                    "page too small for interior b-tree header".into(),
                ));
            }
            format::read_be_u32(data, offset + 8)
        } else {
            0
        };

        Ok(Self {
            page_type,
            first_freeblock,
            cell_count,
            cell_content_offset,
            fragmented_free_bytes,
            right_child,
        })
    }

    /// The effective cell content offset, interpreting 0 as 65536.
    pub fn content_offset(&self) -> usize {
        if self.cell_content_offset == 0 {
            65536
        } else {
            self.cell_content_offset as usize
        }
    }
}

/// Read the cell pointer array from a page. Returns the byte offsets
/// (within the page) where each cell begins, in in-page order.
///
/// The array starts immediately after the B-tree page header, one
/// big-endian u16 per cell.
pub fn read_cell_pointers(
    data: &[u8],
    header_offset: usize,
    header: &BTreePageHeader,
) -> Result<Vec<u16>> {
    let array_start = header_offset + header.header_size();
    let count = header.cell_count as usize;

    let needed = array_start + count * 2;
    if data.len() < needed {
        return Err(LitescanError::Corrupt(
            "page too small for cell pointer array".into(),
        ));
    }

    let mut pointers = Vec::with_capacity(count);
    for i in 0..count {
        pointers.push(format::read_be_u16(data, array_start + i * 2));
    }

    Ok(pointers)
}

/// Read every row of the table B-tree rooted at `page_num`, in ascending
/// rowid order.
///
/// Leaf cells are decoded in cell-pointer order; interior pages are
/// descended left-to-right with the right-most child last, which is
/// exactly the format's key order.
pub fn read_btree_table(db: &Database<'_>, page_num: PageNumber) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    walk(db, page_num, 0, &mut rows)?;
    Ok(rows)
}

fn walk(db: &Database<'_>, page_num: PageNumber, depth: usize, rows: &mut Vec<Row>) -> Result<()> {
    if depth > MAX_BTREE_DEPTH {
        return Err(LitescanError::Corrupt(format!(
            "b-tree deeper than {MAX_BTREE_DEPTH} levels at page {page_num}"
        )));
    }

    let data = db.page(page_num)?;
    // Page 1 carries the 100-byte file header before its B-tree header.
    let header_offset = if page_num == 1 { format::HEADER_SIZE } else { 0 };

    let header = BTreePageHeader::parse(data, header_offset)?;
    let pointers = read_cell_pointers(data, header_offset, &header)?;

    match header.page_type {
        BTreePageType::TableLeaf => {
            debug!("page {page_num}: leaf with {} cells", header.cell_count);
            for ptr in pointers {
                rows.push(record::decode_cell(data, ptr as usize, db.page_size())?);
            }
        }
        BTreePageType::TableInterior => {
            debug!(
                "page {page_num}: interior with {} cells, right child {}",
                header.cell_count, header.right_child
            );
            for ptr in pointers {
                let child = interior_cell_left_child(data, ptr as usize)?;
                walk(db, child, depth + 1, rows)?;
            }
            if header.right_child > 0 {
                walk(db, header.right_child, depth + 1, rows)?;
            }
        }
    }

    Ok(())
}

/// An interior table cell is a 4-byte left-child page number followed by
/// a varint key. Only the child pointer matters for a full scan.
fn interior_cell_left_child(data: &[u8], cell_offset: usize) -> Result<PageNumber> {
    if cell_offset + 4 > data.len() {
        return Err(LitescanError::Corrupt(format!(
            "interior cell at offset {cell_offset} out of range"
        )));
    }
    Ok(format::read_be_u32(data, cell_offset))
}
