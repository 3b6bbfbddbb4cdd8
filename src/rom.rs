//! Types and functions for manipulating Mega Drive ROM images.
//!
//! The Mega Drive maps cartridge ROM linearly from address `$000000`, so an
//! address in the ROM is simply an index into the image. The header carries a
//! 16-bit checksum at [`CHECKSUM_ADDRESS`]: the wrapping sum of every
//! big-endian word from [`CHECKSUM_BEGIN`] to the end of the image. This
//! game also stamps each release with its build date, right after the start
//! of the checksummed area, which is what identifies the release.
//!
//! [`CHECKSUM_ADDRESS`]: ../offsets/constant.CHECKSUM_ADDRESS.html
//! [`CHECKSUM_BEGIN`]: ../offsets/constant.CHECKSUM_BEGIN.html

use std::error;
use std::fmt;
use std::io;

use log::debug;
use log::warn;

use crate::blockset::cmp;
use crate::blockset::Blockset;
use crate::offsets::Region;
use crate::offsets::RomOffsets;
use crate::offsets::Section;
use crate::offsets::BUILD_DATE_BEGIN;
use crate::offsets::BUILD_DATE_LENGTH;
use crate::offsets::CHECKSUM_ADDRESS;
use crate::offsets::CHECKSUM_BEGIN;
use crate::offsets::EXPECTED_SIZE;
use crate::room;

/// An error produced while accessing a ROM image.
#[derive(Debug)]
pub enum Error {
  /// The image is not the size of a retail ROM.
  BadSize {
    /// The size of the image.
    len: usize,
  },
  /// A section or address lies outside of the image.
  OutOfBounds {
    /// The first offending address.
    begin: u32,
    /// One past the last offending address.
    end: u32,
  },
  /// A blockset in the image could not be decoded or re-encoded.
  Codec(cmp::Error),
  /// A room table section was not a whole number of records.
  RoomTable(room::LengthError),
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Error::BadSize { len } => write!(
        f,
        "ROM image is 0x{:x} bytes, expected 0x{:x}",
        len, EXPECTED_SIZE
      ),
      Error::OutOfBounds { begin, end } => write!(
        f,
        "0x{:06x}..0x{:06x} lies outside of the ROM image",
        begin, end
      ),
      Error::Codec(e) => write!(f, "{}", e),
      Error::RoomTable(e) => write!(f, "{}", e),
    }
  }
}

impl error::Error for Error {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      Error::Codec(e) => Some(e),
      Error::RoomTable(e) => Some(e),
      _ => None,
    }
  }
}

impl From<cmp::Error> for Error {
  fn from(e: cmp::Error) -> Self {
    Error::Codec(e)
  }
}

impl From<room::LengthError> for Error {
  fn from(e: room::LengthError) -> Self {
    Error::RoomTable(e)
  }
}

/// A complete ROM image.
#[derive(Clone)]
pub struct RomImage {
  bytes: Box<[u8]>,
}

impl RomImage {
  /// The length of a `RomImage`.
  pub const LEN: usize = EXPECTED_SIZE as usize;

  /// Wraps `bytes`, checking that they are plausibly a ROM image.
  pub fn new(bytes: Vec<u8>) -> Result<Self, Error> {
    if bytes.len() != Self::LEN {
      return Err(Error::BadSize { len: bytes.len() });
    }
    Ok(Self {
      bytes: bytes.into_boxed_slice(),
    })
  }

  /// Creates a new `RomImage` with the given value of `byte` in each slot.
  pub fn filled_with(byte: u8) -> Self {
    Self {
      bytes: vec![byte; Self::LEN].into_boxed_slice(),
    }
  }

  /// Returns the raw bytes of this image.
  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes
  }

  /// Consumes this `RomImage`, returning the raw ROM bytes.
  pub fn into_bytes(self) -> Box<[u8]> {
    self.bytes
  }

  fn bounds_check(&self, section: Section) -> Result<(), Error> {
    if section.end() as usize > self.bytes.len() {
      return Err(Error::OutOfBounds {
        begin: section.begin(),
        end: section.end(),
      });
    }
    Ok(())
  }

  /// Returns the bytes in `section`.
  pub fn read(&self, section: Section) -> Result<&[u8], Error> {
    self.bounds_check(section)?;
    Ok(&self.bytes[section.range()])
  }

  /// Returns the bytes in `section`, for writing.
  pub fn read_mut(&mut self, section: Section) -> Result<&mut [u8], Error> {
    self.bounds_check(section)?;
    Ok(&mut self.bytes[section.range()])
  }

  /// Reads the big-endian `u32` at `addr`, such as an entry in a pointer
  /// table.
  pub fn read_u32(&self, addr: u32) -> Result<u32, Error> {
    let section =
      Section::new(addr, addr.saturating_add(4)).ok_or(Error::OutOfBounds {
        begin: addr,
        end: addr,
      })?;
    let bytes = self.read(section)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
  }

  /// Returns the raw build-date stamp.
  pub fn build_date(&self) -> &[u8] {
    let begin = BUILD_DATE_BEGIN as usize;
    &self.bytes[begin..begin + BUILD_DATE_LENGTH as usize]
  }

  /// Identifies which release this image is, using `offsets`' table of build
  /// dates.
  pub fn region(&self, offsets: &RomOffsets) -> Option<Region> {
    let stamp = String::from_utf8_lossy(self.build_date());
    let region = offsets.region_from_release_date(&stamp);
    if region.is_none() {
      warn!("unrecognized build date {:?}", stamp);
    }
    region
  }

  /// Returns the checksum stored in the header.
  pub fn checksum(&self) -> u16 {
    let addr = CHECKSUM_ADDRESS as usize;
    u16::from_be_bytes([self.bytes[addr], self.bytes[addr + 1]])
  }

  /// Computes the checksum of the image's current contents.
  pub fn compute_checksum(&self) -> u16 {
    self.bytes[CHECKSUM_BEGIN as usize..]
      .chunks_exact(2)
      .map(|w| u16::from_be_bytes([w[0], w[1]]))
      .fold(0u16, u16::wrapping_add)
  }

  /// Returns whether the stored checksum matches the image's contents.
  pub fn checksum_valid(&self) -> bool {
    let (stored, computed) = (self.checksum(), self.compute_checksum());
    if stored != computed {
      warn!(
        "checksum mismatch: header says 0x{:04x}, contents sum to 0x{:04x}",
        stored, computed
      );
    }
    stored == computed
  }

  /// Recomputes the checksum and stores it in the header, returning it.
  pub fn update_checksum(&mut self) -> u16 {
    let checksum = self.compute_checksum();
    let addr = CHECKSUM_ADDRESS as usize;
    self.bytes[addr..addr + 2].copy_from_slice(&checksum.to_be_bytes());
    debug!("updated checksum to 0x{:04x}", checksum);
    checksum
  }

  /// Decodes the whole of `section` as a compressed blockset.
  pub fn load_blockset(&self, section: Section) -> Result<Blockset, Error> {
    let (blockset, _) = cmp::decode(self.read(section)?)?;
    Ok(blockset)
  }

  /// Decodes `count` blocks from the start of `section`.
  ///
  /// Returns the blockset and the number of bytes it occupied.
  pub fn load_blocks(
    &self,
    section: Section,
    count: usize,
  ) -> Result<(Blockset, usize), Error> {
    Ok(cmp::decode_blocks(self.read(section)?, count)?)
  }

  /// Compresses `blockset` into the start of `section`.
  ///
  /// The size of `section` is a hard limit; if the blockset does not fit,
  /// the image is left untouched. Bytes in the section past the end of the
  /// compressed blockset are not modified. Returns the number of bytes
  /// written.
  pub fn store_blockset(
    &mut self,
    section: Section,
    blockset: &Blockset,
  ) -> Result<usize, Error> {
    let written = cmp::encode(blockset, self.read_mut(section)?)?;
    debug!(
      "stored {} blocks at {} ({} bytes free)",
      blockset.len(),
      section,
      section.size() as usize - written
    );
    Ok(written)
  }

  /// Decodes the room table stored in `section`.
  pub fn rooms(&self, section: Section) -> Result<Vec<room::Record>, Error> {
    Ok(room::read_table(self.read(section)?)?)
  }

  /// Dumps the contents of `section` to the given `Write`, as a hex dump.
  pub fn dump(&self, section: Section, mut w: impl io::Write) -> io::Result<()> {
    let bytes = self
      .read(section)
      .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let mut ascii_str = String::new();
    for (row, chunk) in bytes.chunks(16).enumerate() {
      write!(w, "{:06x}:", section.begin() as usize + row * 16)?;

      ascii_str.clear();
      for &byte in chunk {
        write!(w, " {:02x}", byte)?;

        if 0x20 <= byte && byte <= 0x7e {
          ascii_str.push(byte as char);
        } else {
          ascii_str.push('.');
        }
      }
      for _ in chunk.len()..16 {
        write!(w, "   ")?;
      }
      writeln!(w, "  |{}|", ascii_str)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::blockset::Block;
  use crate::tile::Tile;

  fn stamp(rom: &mut RomImage, date: &str) {
    let begin = BUILD_DATE_BEGIN as usize;
    rom.bytes[begin..begin + date.len()].copy_from_slice(date.as_bytes());
  }

  #[test]
  fn size_is_checked() {
    assert!(matches!(
      RomImage::new(vec![0; 0x1000]),
      Err(Error::BadSize { len: 0x1000 })
    ));
    assert!(RomImage::new(vec![0; RomImage::LEN]).is_ok());
  }

  #[test]
  fn region_detection() {
    let offsets = RomOffsets::builder()
      .release_date(Region::Jp, "92/09/24 13:05")
      .build();

    let mut rom = RomImage::filled_with(0);
    stamp(&mut rom, "92/09/24 13:05");
    assert_eq!(rom.build_date(), b"92/09/24 13:05");
    assert_eq!(rom.region(&offsets), Some(Region::Jp));

    stamp(&mut rom, "99/99/99 99:99");
    assert_eq!(rom.region(&offsets), None);
  }

  #[test]
  fn checksum() {
    let mut rom = RomImage::filled_with(0);
    assert!(rom.checksum_valid());

    rom.bytes[0x200] = 0x12;
    rom.bytes[0x201] = 0x34;
    rom.bytes[0x1f_fffe] = 0xff;
    rom.bytes[0x1f_ffff] = 0xff;
    // Bytes before the checksummed area do not count.
    rom.bytes[0x100] = 0x99;
    assert_eq!(rom.compute_checksum(), 0x1233);
    assert!(!rom.checksum_valid());

    assert_eq!(rom.update_checksum(), 0x1233);
    assert_eq!(rom.checksum(), 0x1233);
    assert!(rom.checksum_valid());
  }

  #[test]
  fn bounds() {
    let rom = RomImage::filled_with(0);
    let past_end = Section::new(0x1f_fff0, 0x20_0010).unwrap();
    assert!(matches!(rom.read(past_end), Err(Error::OutOfBounds { .. })));
    assert!(rom.read_u32(0x1f_fffd).is_err());
    assert_eq!(rom.read_u32(0x1f_fffc).unwrap(), 0);
  }

  #[test]
  fn blockset_store_and_load() {
    let mut rom = RomImage::filled_with(0xff);
    let blockset = (0..6)
      .map(|i| Block::filled_with(Tile::from_index(i % 3)))
      .collect::<Blockset>();

    let section = Section::new(0x1000, 0x1100).unwrap();
    let written = rom.store_blockset(section, &blockset).unwrap();
    assert_eq!(written, cmp::encoded_len(&blockset));

    let (loaded, consumed) = rom.load_blocks(section, blockset.len()).unwrap();
    assert_eq!(loaded, blockset);
    assert_eq!(consumed, written);

    let exact = Section::new(0x1000, 0x1000 + written as u32).unwrap();
    assert_eq!(rom.load_blockset(exact).unwrap(), blockset);

    let tiny = Section::new(0x2000, 0x2002).unwrap();
    assert!(matches!(
      rom.store_blockset(tiny, &blockset),
      Err(Error::Codec(cmp::Error::BufferTooSmall { .. }))
    ));
    assert!(rom.read(tiny).unwrap().iter().all(|&b| b == 0xff));
  }

  #[test]
  fn dump() {
    let mut rom = RomImage::filled_with(0);
    rom.bytes[0x100..0x104].copy_from_slice(b"SEGA");
    let mut out = Vec::new();
    rom
      .dump(Section::new(0x100, 0x114).unwrap(), &mut out)
      .unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("000100: 53 45 47 41 00"));
    assert!(lines[0].ends_with("|SEGA............|"));
    assert!(lines[1].starts_with("000110: 00 00 00 00   "));
  }
}
