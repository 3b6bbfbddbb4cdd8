use lsrom::blockset::Block;
use lsrom::blockset::Blockset;
use lsrom::offsets::Region;
use lsrom::offsets::RomOffsets;
use lsrom::offsets::Section;
use lsrom::offsets::BUILD_DATE_BEGIN;
use lsrom::rom::RomImage;
use lsrom::tile::Tile;

const TABLE: &str = r#"{
  region_names: { JP: "Japan", UK: "United Kingdom" },
  release_dates: { JP: "92/09/24 13:05", UK: "93/11/02 10:44" },
  addresses: {
    only_default: { default: 0xA0A00 },
    both: { default: 0x1000, UK: 0x1100 },
  },
  sections: {
    blocks: { default: { begin: 0x10000, end: 0x10100 }, UK: { begin: 0x20000, end: 0x20010 } },
  },
}"#;

fn image_for(date: &str) -> RomImage {
  let mut bytes = vec![0; RomImage::LEN];
  let begin = BUILD_DATE_BEGIN as usize;
  bytes[begin..begin + date.len()].copy_from_slice(date.as_bytes());
  RomImage::new(bytes).unwrap()
}

#[test]
fn region_resolution() {
  let t = RomOffsets::from_json5(TABLE).unwrap();
  assert_eq!(t.address("only_default", Some(Region::Uk)), None);
  assert_eq!(t.address("only_default", None), Some(0xA0A00));
  assert_eq!(t.address_or_default("only_default", Some(Region::Uk)), Some(0xA0A00));
  assert_eq!(t.address("both", Some(Region::Uk)), Some(0x1100));
  assert!(t.address_exists("both"));
  assert!(!t.address_exists("blocks"));
  assert!(t.section_exists("blocks"));
}

#[test]
fn release_detection() {
  let t = RomOffsets::from_json5(TABLE).unwrap();
  assert_eq!(image_for("92/09/24 13:05").region(&t), Some(Region::Jp));
  assert_eq!(image_for("93/11/02 10:44").region(&t), Some(Region::Uk));
  assert_eq!(image_for("00/00/00 00:00").region(&t), None);

  let builtin = RomOffsets::builtin();
  assert_eq!(image_for("92/09/24 13:05").region(&builtin), Some(Region::Jp));
}

#[test]
fn blockset_through_table() {
  let t = RomOffsets::from_json5(TABLE).unwrap();
  let mut rom = image_for("93/11/02 10:44");
  let region = rom.region(&t);

  let blockset = (0..3u16)
    .map(|i| Block::new([
      Tile::from_index(i),
      Tile::from_index(i + 1),
      Tile::from_index(i + 2),
      Tile::from_index(i + 3),
    ]))
    .collect::<Blockset>();

  // The UK section is too small for this blockset; nothing may change.
  let uk = t.section_or_default("blocks", region).unwrap();
  assert_eq!(uk, Section::new(0x20000, 0x20010).unwrap());
  assert!(rom.store_blockset(uk, &blockset).is_err());
  assert!(rom.read(uk).unwrap().iter().all(|&b| b == 0));

  let default = t.section("blocks", None).unwrap();
  let written = rom.store_blockset(default, &blockset).unwrap();
  assert!(written <= default.size() as usize);
  let (loaded, consumed) = rom.load_blocks(default, blockset.len()).unwrap();
  assert_eq!(consumed, written);
  assert_eq!(loaded, blockset);

  rom.update_checksum();
  assert!(rom.checksum_valid());
}
