//! The textual blockset interchange format.
//!
//! Each block is written as `Block::SIZE` lines of `Block::SIZE`
//! comma-separated cells, so a blockset of `n` blocks is `n * Block::SIZE`
//! lines long. Each cell is a tile: optional `P`, `V` and `H` flags (for
//! priority, vertical and horizontal flip), followed by the four-digit
//! hexadecimal tile index. Cells are padded to a fixed width so that columns
//! line up in a diff:
//! ```text
//!   P0001,   0002
//!   H0003, PV03FF
//! ```

use std::error;
use std::fmt;
use std::fmt::Write;

use lazy_static::lazy_static;
use regex::Regex;

use crate::blockset::Block;
use crate::blockset::Blockset;
use crate::tile::Attribute;
use crate::tile::Tile;
use crate::tile::TileAttributes;

/// The width every cell is padded to.
pub const CELL_WIDTH: usize = 7;

lazy_static! {
  static ref CELL: Regex =
    Regex::new(r"^([A-Za-z]{0,3})([0-9A-Fa-f]{4})$").unwrap();
}

/// A parsing error, carrying the 1-based line it occurred on.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Error {
  /// A line did not have exactly `Block::SIZE` cells.
  ColumnCount {
    /// The offending line.
    line: usize,
    /// The number of cells found.
    found: usize,
  },
  /// A cell was not a valid tile token.
  BadCell {
    /// The offending line.
    line: usize,
    /// The cell's text.
    cell: String,
  },
  /// A cell's tile index was larger than `Tile::MAX_INDEX`.
  IndexOutOfRange {
    /// The offending line.
    line: usize,
    /// The index found.
    index: u16,
  },
  /// The number of lines was not a multiple of `Block::SIZE`.
  RowCount {
    /// The number of lines found.
    rows: usize,
  },
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Error::ColumnCount { line, found } => write!(
        f,
        "line {}: expected {} cells, found {}",
        line,
        Block::SIZE,
        found
      ),
      Error::BadCell { line, cell } => {
        write!(f, "line {}: invalid tile {:?}", line, cell)
      }
      Error::IndexOutOfRange { line, index } => write!(
        f,
        "line {}: tile index 0x{:x} exceeds 0x{:x}",
        line,
        index,
        Tile::MAX_INDEX
      ),
      Error::RowCount { rows } => write!(
        f,
        "{} rows do not make up a whole number of {}-row blocks",
        rows,
        Block::SIZE
      ),
    }
  }
}

impl error::Error for Error {}

/// Formats `blockset` in the interchange format.
pub fn to_csv(blockset: &Blockset) -> String {
  let mut out = String::new();
  for block in blockset.iter() {
    for y in 0..Block::SIZE {
      for (x, tile) in block.row(y).iter().enumerate() {
        if x != 0 {
          out.push(',');
        }
        // Writing to a `String` cannot fail.
        let _ = write!(out, "{:>width$}", tile, width = CELL_WIDTH);
      }
      out.push('\n');
    }
  }
  out
}

/// Parses a single cell.
fn parse_cell(line: usize, text: &str) -> Result<Tile, Error> {
  let cell = text.trim();
  let bad_cell = || Error::BadCell {
    line,
    cell: cell.to_string(),
  };

  let caps = CELL.captures(cell).ok_or_else(bad_cell)?;
  let (flags, digits) = (&caps[1], &caps[2]);

  let mut attrs = TileAttributes::default();
  for flag in flags.chars() {
    let attr = match flag.to_ascii_uppercase() {
      'P' => Attribute::Priority,
      'V' => Attribute::VFlip,
      'H' => Attribute::HFlip,
      _ => return Err(bad_cell()),
    };
    if attrs.get(attr) {
      return Err(bad_cell());
    }
    attrs.set(attr);
  }

  let index = u16::from_str_radix(digits, 16).map_err(|_| bad_cell())?;
  Tile::new(index, attrs).ok_or(Error::IndexOutOfRange { line, index })
}

/// Parses a blockset out of the interchange format.
///
/// Empty input parses as an empty blockset.
pub fn from_csv(text: &str) -> Result<Blockset, Error> {
  let mut tiles = Vec::new();
  let mut rows = 0;
  for (i, line) in text.lines().enumerate() {
    let cells = line.split(',').collect::<Vec<_>>();
    if cells.len() != Block::SIZE {
      return Err(Error::ColumnCount {
        line: i + 1,
        found: cells.len(),
      });
    }
    for cell in cells {
      tiles.push(parse_cell(i + 1, cell)?);
    }
    rows += 1;
  }

  if rows % Block::SIZE != 0 {
    return Err(Error::RowCount { rows });
  }

  // Rows arrive block by block, and each block's rows are contiguous, so the
  // flat tile order is already the blockset's order.
  Blockset::from_tiles(&tiles).ok_or(Error::RowCount { rows })
}
