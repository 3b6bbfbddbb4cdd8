//! Tiles: the atomic unit of a blockset.
//!
//! A tile is a reference into the 8x8 pattern sheet loaded into VRAM, plus a
//! handful of attribute bits telling the VDP how to draw it. In the ROM, a
//! tile is stored as a 16-bit name-table word:
//! ```text
//!  15  14  13  12  11  10   9 ... 0
//! +---+-------+---+---+---+---------+
//! | P |   -   | V | H | - |  index  |
//! +---+-------+---+---+---+---------+
//! ```
//! The palette bits (14..=13) and bit 10 are not used by blocksets, and are
//! required to be zero.

use std::fmt;

/// One of the three attribute bits carried by a [`Tile`].
///
/// [`Tile`]: struct.Tile.html
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Attribute {
  /// Mirror the tile horizontally.
  HFlip,
  /// Mirror the tile vertically.
  VFlip,
  /// Draw the tile in front of low-priority sprites.
  Priority,
}

/// The attribute flags of a [`Tile`].
///
/// [`Tile`]: struct.Tile.html
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct TileAttributes {
  hflip: bool,
  vflip: bool,
  priority: bool,
}

impl TileAttributes {
  /// Creates a new set of attributes.
  pub const fn new(hflip: bool, vflip: bool, priority: bool) -> Self {
    Self {
      hflip,
      vflip,
      priority,
    }
  }

  /// Sets `attr`.
  pub fn set(&mut self, attr: Attribute) {
    *self.flag_mut(attr) = true;
  }

  /// Clears `attr`.
  pub fn clear(&mut self, attr: Attribute) {
    *self.flag_mut(attr) = false;
  }

  /// Flips `attr`, returning its new value.
  pub fn toggle(&mut self, attr: Attribute) -> bool {
    let flag = self.flag_mut(attr);
    *flag = !*flag;
    *flag
  }

  /// Returns whether `attr` is set.
  pub fn get(&self, attr: Attribute) -> bool {
    match attr {
      Attribute::HFlip => self.hflip,
      Attribute::VFlip => self.vflip,
      Attribute::Priority => self.priority,
    }
  }

  fn flag_mut(&mut self, attr: Attribute) -> &mut bool {
    match attr {
      Attribute::HFlip => &mut self.hflip,
      Attribute::VFlip => &mut self.vflip,
      Attribute::Priority => &mut self.priority,
    }
  }
}

/// A single tile reference: a pattern index plus attributes.
///
/// The index is always in `0..=Tile::MAX_INDEX`; the constructors enforce
/// this, so a `Tile` can always be written back as a name-table word.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Tile {
  index: u16,
  attrs: TileAttributes,
}

impl Tile {
  /// The largest valid pattern index.
  pub const MAX_INDEX: u16 = 0x3ff;

  const PRIORITY_BIT: u16 = 0x8000;
  const VFLIP_BIT: u16 = 0x1000;
  const HFLIP_BIT: u16 = 0x0800;
  const WORD_MASK: u16 =
    Self::PRIORITY_BIT | Self::VFLIP_BIT | Self::HFLIP_BIT | Self::MAX_INDEX;

  /// Creates a new `Tile`, if `index` is in range.
  pub fn new(index: u16, attrs: TileAttributes) -> Option<Self> {
    if index > Self::MAX_INDEX {
      return None;
    }
    Some(Self { index, attrs })
  }

  /// Creates a new `Tile` with no attributes set, truncating `index` to ten
  /// bits.
  pub const fn from_index(index: u16) -> Self {
    Self {
      index: index & Self::MAX_INDEX,
      attrs: TileAttributes::new(false, false, false),
    }
  }

  /// Returns this tile's pattern index.
  pub fn index(self) -> u16 {
    self.index
  }

  /// Returns this tile's attributes.
  pub fn attrs(self) -> TileAttributes {
    self.attrs
  }

  /// Returns a mutable reference to this tile's attributes.
  pub fn attrs_mut(&mut self) -> &mut TileAttributes {
    &mut self.attrs
  }

  /// Decodes a name-table word.
  ///
  /// Returns `None` if any bit outside of the index and the three attribute
  /// bits is set.
  pub fn from_word(word: u16) -> Option<Self> {
    if word & !Self::WORD_MASK != 0 {
      return None;
    }
    Some(Self {
      index: word & Self::MAX_INDEX,
      attrs: TileAttributes::new(
        word & Self::HFLIP_BIT != 0,
        word & Self::VFLIP_BIT != 0,
        word & Self::PRIORITY_BIT != 0,
      ),
    })
  }

  /// Encodes this tile as a name-table word.
  pub fn to_word(self) -> u16 {
    let mut word = self.index;
    if self.attrs.priority {
      word |= Self::PRIORITY_BIT;
    }
    if self.attrs.vflip {
      word |= Self::VFLIP_BIT;
    }
    if self.attrs.hflip {
      word |= Self::HFLIP_BIT;
    }
    word
  }
}

/// Formats the tile as its interchange token, e.g. `PH01A3`.
impl fmt::Display for Tile {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut flags = String::with_capacity(3);
    if self.attrs.priority {
      flags.push('P');
    }
    if self.attrs.vflip {
      flags.push('V');
    }
    if self.attrs.hflip {
      flags.push('H');
    }
    flags.push_str(&format!("{:04X}", self.index));
    f.pad(&flags)
  }
}
