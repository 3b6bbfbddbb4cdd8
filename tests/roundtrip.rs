use proptest::collection::vec;
use proptest::prelude::*;

use lsrom::blockset::cmp;
use lsrom::blockset::csv;
use lsrom::blockset::Block;
use lsrom::blockset::Blockset;
use lsrom::tile::Tile;
use lsrom::tile::TileAttributes;

fn tile() -> impl Strategy<Value = Tile> {
  (0..=Tile::MAX_INDEX, any::<(bool, bool, bool)>()).prop_map(
    |(index, (h, v, p))| {
      Tile::new(index, TileAttributes::new(h, v, p)).unwrap()
    },
  )
}

/// Tiles drawn from a small palette, so that runs and repeats are common.
fn repetitive_tile() -> impl Strategy<Value = Tile> {
  (0u16..4, any::<bool>()).prop_map(|(index, h)| {
    Tile::new(index, TileAttributes::new(h, false, false)).unwrap()
  })
}

fn blockset(tile: impl Strategy<Value = Tile>) -> impl Strategy<Value = Blockset> {
  vec(proptest::array::uniform4(tile), 0..64)
    .prop_map(|blocks| blocks.into_iter().map(Block::new).collect())
}

proptest! {
  #[test]
  fn binary_round_trip(b in blockset(tile())) {
    let bytes = cmp::encode_to_vec(&b);
    prop_assert_eq!(bytes.len(), cmp::encoded_len(&b));
    let (decoded, consumed) = cmp::decode(&bytes).unwrap();
    prop_assert_eq!(consumed, bytes.len());
    prop_assert_eq!(decoded, b);
  }

  #[test]
  fn repetitive_round_trip(b in blockset(repetitive_tile())) {
    let bytes = cmp::encode_to_vec(&b);
    prop_assert!(bytes.len() <= b.tile_count() * 3);
    let (decoded, _) = cmp::decode(&bytes).unwrap();
    prop_assert_eq!(decoded, b);
  }

  #[test]
  fn decode_blocks_prefix(b in blockset(repetitive_tile()), extra in vec(any::<u8>(), 0..8)) {
    let mut bytes = cmp::encode_to_vec(&b);
    let len = bytes.len();
    bytes.extend_from_slice(&extra);
    let (decoded, consumed) = cmp::decode_blocks(&bytes, b.len()).unwrap();
    prop_assert_eq!(consumed, len);
    prop_assert_eq!(decoded, b);
  }

  #[test]
  fn text_round_trip(b in blockset(tile())) {
    let text = csv::to_csv(&b);
    prop_assert_eq!(text.lines().count(), b.len() * Block::SIZE);
    prop_assert_eq!(csv::from_csv(&text).unwrap(), b);
  }

  #[test]
  fn encode_respects_capacity(b in blockset(repetitive_tile()), slack in 0usize..16) {
    let needed = cmp::encoded_len(&b);
    let capacity = needed.saturating_sub(slack);

    let mut buf = vec![0xee; capacity + 16];
    let res = cmp::encode(&b, &mut buf[..capacity]);
    // Nothing past the destination is ever touched.
    prop_assert!(buf[capacity..].iter().all(|&x| x == 0xee));

    if capacity >= needed {
      prop_assert_eq!(res, Ok(needed));
      let (decoded, _) = cmp::decode(&buf[..needed]).unwrap();
      prop_assert_eq!(decoded, b);
    } else {
      prop_assert_eq!(res, Err(cmp::Error::BufferTooSmall { needed, capacity }));
      prop_assert!(buf.iter().all(|&x| x == 0xee));
    }
  }

  #[test]
  fn decode_never_panics(bytes in vec(any::<u8>(), 0..256)) {
    let _ = cmp::decode(&bytes);
    let _ = cmp::decode_blocks(&bytes, 8);
  }
}

#[test]
fn identical_blocks() {
  let block = Block::filled_with(Tile::from_index(0));
  let four = (0..4).map(|_| block).collect::<Blockset>();
  let eight = (0..8).map(|_| block).collect::<Blockset>();

  let bytes = cmp::encode_to_vec(&four);
  assert_eq!(cmp::encoded_len(&eight), bytes.len());
  let (decoded, _) = cmp::decode(&bytes).unwrap();
  assert_eq!(decoded.len(), 4);
  assert!(decoded.iter().all(|b| *b == block));
}
