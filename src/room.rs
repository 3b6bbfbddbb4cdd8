//! Packed room records.
//!
//! The room table is an array of eight-byte records, one per room:
//! ```text
//! MMMMMMMM MMMMMMMM MMMMMMMM MMMMMMMM  UU1TTTTT UUPPPPPP EEEESSSS 222BBBBB
//! ```
//! - `M`: offset of the room's map data (big-endian).
//! - `U`: reserved.
//! - `1`: primary blockset.
//! - `T`: tileset.
//! - `P`: room palette.
//! - `E`: maximum Z height.
//! - `S`: minimum Z height.
//! - `2`: secondary blockset.
//! - `B`: background music.

use std::convert::TryInto;
use std::error;
use std::fmt;

/// The size of a single room table record.
pub const RECORD_LEN: usize = 8;

/// The four packed parameter bytes of a room.
///
/// Every field is stored in the low bits of its `u8`; [`params`] ignores any
/// bits above a field's width.
///
/// [`params`]: #method.params
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Room {
  /// The tileset (five bits).
  pub tileset: u8,
  /// The primary blockset (one bit).
  pub pri_blockset: u8,
  /// The secondary blockset (three bits).
  pub sec_blockset: u8,
  /// The room palette (six bits).
  pub room_palette: u8,
  /// The background music (five bits).
  pub bgm: u8,
  /// The minimum Z height (four bits).
  pub room_z_begin: u8,
  /// The maximum Z height (four bits).
  pub room_z_end: u8,
  /// The reserved bits of the first parameter byte (two bits).
  pub unknown_param1: u8,
  /// The reserved bits of the second parameter byte (two bits).
  pub unknown_param2: u8,
}

impl Room {
  /// Unpacks the four parameter bytes.
  pub fn from_params(params: [u8; 4]) -> Self {
    let [p0, p1, p2, p3] = params;
    Self {
      unknown_param1: p0 >> 6,
      pri_blockset: (p0 >> 5) & 0x01,
      tileset: p0 & 0x1f,
      unknown_param2: p1 >> 6,
      room_palette: p1 & 0x3f,
      room_z_end: p2 >> 4,
      room_z_begin: p2 & 0x0f,
      sec_blockset: p3 >> 5,
      bgm: p3 & 0x1f,
    }
  }

  /// Packs this room back into its four parameter bytes.
  pub fn params(&self) -> [u8; 4] {
    [
      ((self.unknown_param1 & 0x03) << 6)
        | ((self.pri_blockset & 0x01) << 5)
        | (self.tileset & 0x1f),
      ((self.unknown_param2 & 0x03) << 6) | (self.room_palette & 0x3f),
      ((self.room_z_end & 0x0f) << 4) | (self.room_z_begin & 0x0f),
      ((self.sec_blockset & 0x07) << 5) | (self.bgm & 0x1f),
    ]
  }

  /// Returns the index of this room's primary blockset in the blockset
  /// pointer table.
  pub fn blockset_id(&self) -> u8 {
    ((self.pri_blockset & 0x01) << 5) | (self.tileset & 0x1f)
  }
}

/// A full room table record.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Record {
  /// The offset of the room's map data.
  pub map_offset: u32,
  /// The room's parameters.
  pub room: Room,
}

impl Record {
  /// Decodes a single record.
  pub fn from_bytes(bytes: [u8; RECORD_LEN]) -> Self {
    let mut offset = [0; 4];
    let mut params = [0; 4];
    offset.copy_from_slice(&bytes[..4]);
    params.copy_from_slice(&bytes[4..]);
    Self {
      map_offset: u32::from_be_bytes(offset),
      room: Room::from_params(params),
    }
  }

  /// Encodes this record.
  pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
    let mut bytes = [0; RECORD_LEN];
    bytes[..4].copy_from_slice(&self.map_offset.to_be_bytes());
    bytes[4..].copy_from_slice(&self.room.params());
    bytes
  }
}

/// Indicates that a room table's length is not a whole number of records.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct LengthError {
  /// The length of the table, in bytes.
  pub len: usize,
}

impl fmt::Display for LengthError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(
      f,
      "room table of {} bytes is not a multiple of {}",
      self.len, RECORD_LEN
    )
  }
}

impl error::Error for LengthError {}

/// Decodes a whole room table.
pub fn read_table(bytes: &[u8]) -> Result<Vec<Record>, LengthError> {
  if bytes.len() % RECORD_LEN != 0 {
    return Err(LengthError { len: bytes.len() });
  }
  Ok(
    bytes
      .chunks_exact(RECORD_LEN)
      .filter_map(|chunk| chunk.try_into().ok())
      .map(Record::from_bytes)
      .collect(),
  )
}

/// Encodes `records` into `dst`, which must be exactly the right size.
pub fn write_table(records: &[Record], dst: &mut [u8]) -> Result<(), LengthError> {
  if dst.len() != records.len() * RECORD_LEN {
    return Err(LengthError { len: dst.len() });
  }
  for (record, chunk) in records.iter().zip(dst.chunks_exact_mut(RECORD_LEN)) {
    chunk.copy_from_slice(&record.to_bytes());
  }
  Ok(())
}
