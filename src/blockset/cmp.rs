//! The compressed blockset format.
//!
//! A compressed blockset is a flat stream of tokens describing the blockset's
//! tiles, block by block, in row-major order. There is no header: the length
//! of the stream is known out-of-band, from the ROM section it lives in.
//!
//! Every token starts with a one-byte opcode; all multi-byte values are
//! big-endian, and tiles are stored as name-table words (see [`Tile`]).
//! ```text
//! $00 tile:16               -- literal: one tile
//! $01 count:8 tile:16       -- run: `count` copies of `tile`
//! $02 distance:16 len:8     -- copy: repeat `len` tiles, starting `distance`
//!                              tiles before the end of the output so far
//! ```
//! Copies may overlap their own output (`distance < len`), in which case the
//! copied pattern repeats. Counts, lengths and distances of zero are
//! malformed.
//!
//! [`Tile`]: ../../tile/struct.Tile.html

use std::collections::HashMap;
use std::error;
use std::fmt;

use log::debug;

use crate::blockset::buf::BoundedWriter;
use crate::blockset::Block;
use crate::blockset::Blockset;
use crate::tile::Tile;

/// The opcode for a literal tile.
pub const OP_LITERAL: u8 = 0x00;
/// The opcode for a run of identical tiles.
pub const OP_RUN: u8 = 0x01;
/// The opcode for a copy of earlier output.
pub const OP_COPY: u8 = 0x02;

/// The longest run a single token can describe.
pub const MAX_RUN: usize = u8::MAX as usize;
/// The longest copy a single token can describe.
pub const MAX_COPY: usize = u8::MAX as usize;
/// The furthest back, in tiles, that a copy may reach.
pub const MAX_DISTANCE: usize = u16::MAX as usize;

/// Runs and copies shorter than this cost more than the literals they'd
/// replace.
const MIN_MATCH: usize = 2;

/// An error produced by the blockset codec.
///
/// Offsets are byte offsets into the compressed stream, pointing at the start
/// of the offending token or field.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
  /// The stream ended in the middle of a token, or before the requested
  /// number of blocks was complete.
  UnexpectedEof {
    /// Where the read was attempted.
    offset: usize,
  },
  /// An opcode was not one of the known token types.
  UnknownOpcode {
    /// The offset of the opcode.
    offset: usize,
    /// The opcode itself.
    opcode: u8,
  },
  /// A tile word had bits set outside of the index and attribute bits.
  BadTile {
    /// The offset of the tile word.
    offset: usize,
    /// The word itself.
    word: u16,
  },
  /// A copy reached back before the start of the output.
  BadReference {
    /// The offset of the copy token.
    offset: usize,
    /// The distance requested.
    distance: u16,
    /// The number of tiles that had been decoded at that point.
    available: usize,
  },
  /// A run or a copy had a length of zero.
  ZeroLength {
    /// The offset of the token.
    offset: usize,
  },
  /// A token would have produced tiles past the last requested block.
  Overrun {
    /// The offset of the token.
    offset: usize,
  },
  /// The stream ended with a partially-decoded block.
  IncompleteBlock {
    /// The total number of tiles decoded.
    tiles: usize,
  },
  /// The encoded blockset does not fit in the destination buffer.
  BufferTooSmall {
    /// The number of bytes the encoded blockset needs.
    needed: usize,
    /// The size of the destination buffer.
    capacity: usize,
  },
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      Error::UnexpectedEof { offset } => {
        write!(f, "unexpected end of blockset data at 0x{:x}", offset)
      }
      Error::UnknownOpcode { offset, opcode } => {
        write!(f, "unknown opcode 0x{:02x} at 0x{:x}", opcode, offset)
      }
      Error::BadTile { offset, word } => {
        write!(f, "invalid tile word 0x{:04x} at 0x{:x}", word, offset)
      }
      Error::BadReference {
        offset,
        distance,
        available,
      } => write!(
        f,
        "copy at 0x{:x} reaches back {} tiles, but only {} are available",
        offset, distance, available
      ),
      Error::ZeroLength { offset } => {
        write!(f, "zero-length token at 0x{:x}", offset)
      }
      Error::Overrun { offset } => {
        write!(f, "token at 0x{:x} runs past the last block", offset)
      }
      Error::IncompleteBlock { tiles } => write!(
        f,
        "{} tiles do not make up a whole number of {}-tile blocks",
        tiles,
        Block::TILES
      ),
      Error::BufferTooSmall { needed, capacity } => write!(
        f,
        "compressed blockset needs {} bytes, but only {} are available",
        needed, capacity
      ),
    }
  }
}

impl error::Error for Error {}

/// A single decoded token.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Token {
  Literal(Tile),
  Run { count: u8, tile: Tile },
  Copy { distance: u16, len: u8 },
}

impl Token {
  /// Returns the number of tiles this token expands to.
  fn tiles(self) -> usize {
    match self {
      Token::Literal(_) => 1,
      Token::Run { count, .. } => count as usize,
      Token::Copy { len, .. } => len as usize,
    }
  }

  /// Returns this token's encoding, and how many bytes of it are used.
  fn bytes(self) -> ([u8; 4], usize) {
    match self {
      Token::Literal(tile) => {
        let [hi, lo] = tile.to_word().to_be_bytes();
        ([OP_LITERAL, hi, lo, 0], 3)
      }
      Token::Run { count, tile } => {
        let [hi, lo] = tile.to_word().to_be_bytes();
        ([OP_RUN, count, hi, lo], 4)
      }
      Token::Copy { distance, len } => {
        let [hi, lo] = distance.to_be_bytes();
        ([OP_COPY, hi, lo, len], 4)
      }
    }
  }

  fn encoded_len(self) -> usize {
    self.bytes().1
  }

  /// Appends this token's tiles to `out`.
  ///
  /// Copies must already have been checked against `out.len()`.
  fn expand(self, out: &mut Vec<Tile>) {
    match self {
      Token::Literal(tile) => out.push(tile),
      Token::Run { count, tile } => {
        out.extend(std::iter::repeat(tile).take(count as usize))
      }
      Token::Copy { distance, len } => {
        let start = out.len() - distance as usize;
        for i in 0..len as usize {
          let tile = out[start + i];
          out.push(tile);
        }
      }
    }
  }
}

/// A bounds-checked cursor over the compressed stream.
struct Reader<'a> {
  src: &'a [u8],
  pos: usize,
}

impl<'a> Reader<'a> {
  fn u8(&mut self) -> Result<u8, Error> {
    let byte = *self
      .src
      .get(self.pos)
      .ok_or(Error::UnexpectedEof { offset: self.pos })?;
    self.pos += 1;
    Ok(byte)
  }

  fn be_u16(&mut self) -> Result<u16, Error> {
    let hi = self.u8()?;
    let lo = self.u8()?;
    Ok(u16::from_be_bytes([hi, lo]))
  }

  fn tile(&mut self) -> Result<Tile, Error> {
    let offset = self.pos;
    let word = self.be_u16()?;
    Tile::from_word(word).ok_or(Error::BadTile { offset, word })
  }

  fn is_empty(&self) -> bool {
    self.pos >= self.src.len()
  }

  /// Reads the next token, validating it against the `available` tiles
  /// decoded so far.
  fn token(&mut self, available: usize) -> Result<Token, Error> {
    let offset = self.pos;
    match self.u8()? {
      OP_LITERAL => Ok(Token::Literal(self.tile()?)),
      OP_RUN => {
        let count = self.u8()?;
        if count == 0 {
          return Err(Error::ZeroLength { offset });
        }
        Ok(Token::Run {
          count,
          tile: self.tile()?,
        })
      }
      OP_COPY => {
        let distance = self.be_u16()?;
        let len = self.u8()?;
        if len == 0 {
          return Err(Error::ZeroLength { offset });
        }
        if distance == 0 || distance as usize > available {
          return Err(Error::BadReference {
            offset,
            distance,
            available,
          });
        }
        Ok(Token::Copy { distance, len })
      }
      opcode => Err(Error::UnknownOpcode { offset, opcode }),
    }
  }
}

/// Decodes tokens from `src`.
///
/// With a `limit`, decoding stops as soon as exactly `limit` tiles have been
/// produced; otherwise, it runs to the end of `src`.
fn decode_tiles(
  src: &[u8],
  limit: Option<usize>,
) -> Result<(Vec<Tile>, usize), Error> {
  let mut r = Reader { src, pos: 0 };
  let mut tiles = Vec::new();
  let mut tokens = 0usize;
  loop {
    match limit {
      Some(limit) if tiles.len() == limit => break,
      None if r.is_empty() => break,
      _ => {}
    }

    let offset = r.pos;
    let token = r.token(tiles.len())?;
    if let Some(limit) = limit {
      if tiles.len() + token.tiles() > limit {
        return Err(Error::Overrun { offset });
      }
    }
    token.expand(&mut tiles);
    tokens += 1;
  }

  debug!(
    "decoded {} tokens ({} bytes) into {} tiles",
    tokens,
    r.pos,
    tiles.len()
  );
  Ok((tiles, r.pos))
}

/// Decodes the whole of `src` as a compressed blockset.
///
/// Returns the blockset, and the number of bytes consumed, which is always
/// `src.len()`.
pub fn decode(src: &[u8]) -> Result<(Blockset, usize), Error> {
  let (tiles, consumed) = decode_tiles(src, None)?;
  let blockset = Blockset::from_tiles(&tiles)
    .ok_or(Error::IncompleteBlock { tiles: tiles.len() })?;
  Ok((blockset, consumed))
}

/// Decodes exactly `count` blocks from the start of `src`.
///
/// Returns the blockset, and the number of bytes consumed. Trailing bytes
/// after the last block are not examined.
pub fn decode_blocks(
  src: &[u8],
  count: usize,
) -> Result<(Blockset, usize), Error> {
  let (tiles, consumed) =
    decode_tiles(src, Some(count.saturating_mul(Block::TILES)))?;
  let blockset = Blockset::from_tiles(&tiles)
    .ok_or(Error::IncompleteBlock { tiles: tiles.len() })?;
  Ok((blockset, consumed))
}

/// Returns the length of the run of identical tiles starting at `pos`.
fn run_length(tiles: &[Tile], pos: usize) -> usize {
  let first = tiles[pos];
  tiles[pos..]
    .iter()
    .take(MAX_RUN)
    .take_while(|&&t| t == first)
    .count()
}

/// Finds the longest earlier match for the tiles at `pos`.
///
/// `candidates` are earlier positions holding the same tile as `pos`, in
/// ascending order; nearer matches win ties. Returns `(distance, len)`.
fn longest_match(
  tiles: &[Tile],
  pos: usize,
  candidates: &[usize],
) -> (usize, usize) {
  let max_len = (tiles.len() - pos).min(MAX_COPY);
  let mut best = (0, 0);
  for &start in candidates.iter().rev() {
    let distance = pos - start;
    if distance > MAX_DISTANCE {
      break;
    }
    let len = tiles[start..]
      .iter()
      .zip(&tiles[pos..pos + max_len])
      .take_while(|(a, b)| a == b)
      .count();
    if len > best.1 {
      best = (distance, len);
      if len == max_len {
        break;
      }
    }
  }
  best
}

/// Greedily converts `tiles` into tokens.
fn tokenize(tiles: &[Tile]) -> Vec<Token> {
  let mut seen: HashMap<Tile, Vec<usize>> = HashMap::new();
  let mut tokens = Vec::new();

  let mut pos = 0;
  while pos < tiles.len() {
    let tile = tiles[pos];
    let (distance, copy_len) = seen
      .get(&tile)
      .map(|c| longest_match(tiles, pos, c))
      .unwrap_or((0, 0));
    let run_len = run_length(tiles, pos);

    let token = if copy_len >= MIN_MATCH && copy_len >= run_len {
      Token::Copy {
        distance: distance as u16,
        len: copy_len as u8,
      }
    } else if run_len >= MIN_MATCH {
      Token::Run {
        count: run_len as u8,
        tile,
      }
    } else {
      Token::Literal(tile)
    };

    let end = pos + token.tiles();
    for (i, &t) in tiles[pos..end].iter().enumerate() {
      seen.entry(t).or_default().push(pos + i);
    }
    tokens.push(token);
    pos = end;
  }
  tokens
}

/// Returns the number of bytes `blockset` compresses to.
pub fn encoded_len(blockset: &Blockset) -> usize {
  let tiles = blockset.tiles().collect::<Vec<_>>();
  tokenize(&tiles).iter().map(|t| t.encoded_len()).sum()
}

/// Compresses `blockset` into `dst`.
///
/// Returns the number of bytes written. If the compressed blockset does not
/// fit, returns [`Error::BufferTooSmall`] without touching `dst`. An empty
/// blockset compresses to zero bytes.
///
/// [`Error::BufferTooSmall`]: enum.Error.html#variant.BufferTooSmall
pub fn encode(blockset: &Blockset, dst: &mut [u8]) -> Result<usize, Error> {
  let tiles = blockset.tiles().collect::<Vec<_>>();
  let tokens = tokenize(&tiles);

  let needed = tokens.iter().map(|t| t.encoded_len()).sum();
  let capacity = dst.len();
  if needed > capacity {
    return Err(Error::BufferTooSmall { needed, capacity });
  }

  let mut w = BoundedWriter::new(dst);
  for token in &tokens {
    let (bytes, len) = token.bytes();
    w.put(&bytes[..len])
      .map_err(|_| Error::BufferTooSmall { needed, capacity })?;
  }

  debug!(
    "encoded {} blocks as {} tokens ({} of {} bytes)",
    blockset.len(),
    tokens.len(),
    w.len(),
    capacity
  );
  Ok(w.len())
}

/// Compresses `blockset` into a new buffer of exactly the right size.
pub fn encode_to_vec(blockset: &Blockset) -> Vec<u8> {
  let tiles = blockset.tiles().collect::<Vec<_>>();
  let mut out = Vec::new();
  for token in tokenize(&tiles) {
    let (bytes, len) = token.bytes();
    out.extend_from_slice(&bytes[..len]);
  }
  out
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::tile::TileAttributes;

  fn block(indices: [u16; 4]) -> Block {
    Block::new([
      Tile::from_index(indices[0]),
      Tile::from_index(indices[1]),
      Tile::from_index(indices[2]),
      Tile::from_index(indices[3]),
    ])
  }

  macro_rules! assert_decode_err {
    ($bytes:expr => $err:expr) => {
      assert_eq!(decode(&$bytes), Err($err));
    };
  }

  #[test]
  fn empty() {
    let mut buf = [0u8; 4];
    assert_eq!(encode(&Blockset::new(), &mut buf), Ok(0));
    assert_eq!(encode(&Blockset::new(), &mut []), Ok(0));
    assert_eq!(decode(&[]), Ok((Blockset::new(), 0)));
  }

  #[test]
  fn hand_written_stream() {
    let bytes = [
      0x00, 0x00, 0x05, // literal 5
      0x01, 0x03, 0x80, 0x01, // 3x P0001
      0x02, 0x00, 0x04, 0x04, // copy the first block again
    ];
    let (blockset, consumed) = decode(&bytes).unwrap();
    assert_eq!(consumed, bytes.len());

    let p1 = Tile::new(1, TileAttributes::new(false, false, true)).unwrap();
    let expected = Block::new([Tile::from_index(5), p1, p1, p1]);
    assert_eq!(&blockset[..], &[expected, expected]);
  }

  #[test]
  fn overlapping_copy() {
    let bytes = [
      0x00, 0x00, 0x01, // 1
      0x00, 0x00, 0x02, // 2
      0x02, 0x00, 0x02, 0x06, // 1 2 1 2 1 2
    ];
    let (blockset, _) = decode(&bytes).unwrap();
    assert_eq!(&blockset[..], &[block([1, 2, 1, 2]), block([1, 2, 1, 2])]);
  }

  #[test]
  fn identical_blocks_compress_to_constant_size() {
    let four = (0..4).map(|_| Block::default()).collect::<Blockset>();
    let eight = (0..8).map(|_| Block::default()).collect::<Blockset>();
    let encoded = encode_to_vec(&four);
    assert!(encoded.len() <= 8, "{:02x?}", encoded);
    assert_eq!(encoded_len(&eight), encoded.len());
    assert_eq!(decode(&encoded), Ok((four, encoded.len())));
  }

  #[test]
  fn repeated_block_uses_one_copy() {
    let blockset = (0..4).map(|_| block([1, 2, 3, 4])).collect::<Blockset>();
    let encoded = encode_to_vec(&blockset);
    // Four literals, then a single copy covering the remaining three blocks.
    assert_eq!(encoded.len(), 4 * 3 + 4);
    assert_eq!(&encoded[12..], &[OP_COPY, 0x00, 0x04, 12]);
    assert_eq!(decode(&encoded).unwrap().0, blockset);
  }

  #[test]
  fn long_runs_are_split() {
    let blockset = (0..100).map(|_| block([7, 7, 7, 7])).collect::<Blockset>();
    let encoded = encode_to_vec(&blockset);
    assert_eq!(decode(&encoded).unwrap().0, blockset);
  }

  #[test]
  fn buffer_too_small() {
    let blockset = (0..4).map(|i| block([i, i + 1, 0, 9])).collect::<Blockset>();
    let needed = encoded_len(&blockset);

    let mut buf = vec![0xeeu8; needed - 1];
    assert_eq!(
      encode(&blockset, &mut buf),
      Err(Error::BufferTooSmall {
        needed,
        capacity: needed - 1
      })
    );
    assert!(buf.iter().all(|&b| b == 0xee));

    let mut buf = vec![0xeeu8; needed + 1];
    assert_eq!(encode(&blockset, &mut buf[..needed]), Ok(needed));
    assert_eq!(buf[needed], 0xee);
  }

  #[test]
  fn decode_blocks_stops_early() {
    let blockset = vec![block([1, 2, 3, 4]), block([5, 6, 7, 8])]
      .into_iter()
      .collect::<Blockset>();
    let mut bytes = encode_to_vec(&blockset);
    let len = bytes.len();
    bytes.extend_from_slice(&[0xff, 0xff]);

    let (decoded, consumed) = decode_blocks(&bytes, 2).unwrap();
    assert_eq!(decoded, blockset);
    assert_eq!(consumed, len);

    assert_eq!(decode_blocks(&bytes, 0), Ok((Blockset::new(), 0)));
    assert_eq!(
      decode_blocks(&bytes[..len], 3),
      Err(Error::UnexpectedEof { offset: len })
    );
  }

  #[test]
  fn decode_blocks_overrun() {
    // A run of six tiles cannot fit in a single block.
    let bytes = [0x01, 0x06, 0x00, 0x01];
    assert_eq!(decode_blocks(&bytes, 1), Err(Error::Overrun { offset: 0 }));
  }

  #[test]
  fn malformed() {
    assert_decode_err!([0x03] => Error::UnknownOpcode { offset: 0, opcode: 0x03 });
    assert_decode_err!([0x00, 0x00] => Error::UnexpectedEof { offset: 2 });
    assert_decode_err!([0x01, 0x04] => Error::UnexpectedEof { offset: 2 });
    assert_decode_err!([0x00, 0x04, 0x00] => Error::BadTile { offset: 1, word: 0x0400 });
    assert_decode_err!([0x01, 0x00, 0x00, 0x00] => Error::ZeroLength { offset: 0 });
    assert_decode_err!([0x02, 0x00, 0x01, 0x04] => Error::BadReference {
      offset: 0,
      distance: 1,
      available: 0,
    });
    assert_decode_err!([0x00, 0x00, 0x01, 0x02, 0x00, 0x00, 0x03] => Error::BadReference {
      offset: 3,
      distance: 0,
      available: 1,
    });
    assert_decode_err!([0x01, 0x03, 0x00, 0x01] => Error::IncompleteBlock { tiles: 3 });
  }
}
