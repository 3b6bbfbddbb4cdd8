//! Blocks and blocksets.
//!
//! Room maps are not drawn tile-by-tile: they are drawn out of *blocks*,
//! small square grids of tiles. A *blockset* is the list of blocks a room
//! can use, and is stored compressed in ROM.
//!
//! This module provides the in-memory model, along with the two codecs that
//! operate on it:
//! - [`cmp`], the compressed binary form stored in the ROM.
//! - [`csv`], a textual form for diffing and external tools.
//!
//! [`cmp`]: cmp/index.html
//! [`csv`]: csv/index.html

use std::iter::FromIterator;
use std::ops::Deref;
use std::ops::DerefMut;
use std::ops::Index;
use std::ops::IndexMut;

use crate::tile::Tile;

pub mod buf;
pub mod cmp;
pub mod csv;

/// A square grid of tiles.
///
/// Tiles are stored in row-major order.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Block {
  tiles: [Tile; Block::TILES],
}

impl Block {
  /// The width and height of a block, in tiles.
  pub const SIZE: usize = 2;
  /// The number of tiles in a block.
  pub const TILES: usize = Self::SIZE * Self::SIZE;

  /// Creates a new `Block` out of tiles in row-major order.
  pub const fn new(tiles: [Tile; Block::TILES]) -> Self {
    Self { tiles }
  }

  /// Creates a new `Block` with every cell set to `tile`.
  pub const fn filled_with(tile: Tile) -> Self {
    Self {
      tiles: [tile; Block::TILES],
    }
  }

  /// Returns the tiles of this block in row-major order.
  pub fn tiles(&self) -> &[Tile; Block::TILES] {
    &self.tiles
  }

  /// Returns the tile at column `x`, row `y`.
  pub fn get(&self, x: usize, y: usize) -> Option<&Tile> {
    if x >= Self::SIZE || y >= Self::SIZE {
      return None;
    }
    Some(&self.tiles[y * Self::SIZE + x])
  }

  /// Returns a mutable reference to the tile at column `x`, row `y`.
  pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Tile> {
    if x >= Self::SIZE || y >= Self::SIZE {
      return None;
    }
    Some(&mut self.tiles[y * Self::SIZE + x])
  }

  /// Returns row `y` of this block.
  pub fn row(&self, y: usize) -> &[Tile] {
    &self.tiles[y * Self::SIZE..(y + 1) * Self::SIZE]
  }
}

impl Index<usize> for Block {
  type Output = Tile;
  fn index(&self, idx: usize) -> &Tile {
    &self.tiles[idx]
  }
}

impl IndexMut<usize> for Block {
  fn index_mut(&mut self, idx: usize) -> &mut Tile {
    &mut self.tiles[idx]
  }
}

/// An ordered list of [`Block`]s.
///
/// `Blockset` dereferences to a slice of blocks; all of the usual slice
/// operations are available on it.
///
/// [`Block`]: struct.Block.html
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Blockset {
  blocks: Vec<Block>,
}

impl Blockset {
  /// Creates a new, empty `Blockset`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a block.
  pub fn push(&mut self, block: Block) {
    self.blocks.push(block)
  }

  /// Returns the total number of tiles across all blocks.
  pub fn tile_count(&self) -> usize {
    self.blocks.len() * Block::TILES
  }

  /// Returns an iterator over every tile, block by block.
  pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
    self.blocks.iter().flat_map(|b| b.tiles.iter().copied())
  }

  /// Rebuilds a `Blockset` from a flat list of tiles.
  ///
  /// Returns `None` if `tiles` does not contain a whole number of blocks.
  pub fn from_tiles(tiles: &[Tile]) -> Option<Self> {
    if tiles.len() % Block::TILES != 0 {
      return None;
    }
    let blocks = tiles
      .chunks_exact(Block::TILES)
      .map(|chunk| {
        let mut block = Block::default();
        block.tiles.copy_from_slice(chunk);
        block
      })
      .collect();
    Some(Self { blocks })
  }

  /// Consumes this `Blockset`, returning the underlying blocks.
  pub fn into_blocks(self) -> Vec<Block> {
    self.blocks
  }
}

impl Deref for Blockset {
  type Target = [Block];
  fn deref(&self) -> &[Block] {
    &self.blocks
  }
}

impl DerefMut for Blockset {
  fn deref_mut(&mut self) -> &mut [Block] {
    &mut self.blocks
  }
}

impl From<Vec<Block>> for Blockset {
  fn from(blocks: Vec<Block>) -> Self {
    Self { blocks }
  }
}

impl FromIterator<Block> for Blockset {
  fn from_iter<I: IntoIterator<Item = Block>>(iter: I) -> Self {
    Self {
      blocks: iter.into_iter().collect(),
    }
  }
}
