//! The address table compiled into the crate.
//!
//! These entries are placeholders: the build dates and addresses have not
//! been checked against real ROM dumps, and should be replaced with a table
//! loaded through `--offsets` ([`RomOffsets::from_json5`]), which replaces
//! this one wholesale. Entries without a region are shared by every release
//! that does not override them.
//!
//! [`RomOffsets::from_json5`]: ../struct.RomOffsets.html#method.from_json5

use crate::offsets::Region;
use crate::offsets::RomOffsets;
use crate::offsets::Section;

const REGION_NAMES: &[(Region, &str)] = &[
  (Region::Jp, "Japan"),
  (Region::Us, "United States"),
  (Region::Uk, "United Kingdom"),
  (Region::Fr, "France"),
  (Region::De, "Germany"),
  (Region::UsBeta, "United States (beta)"),
];

const RELEASE_DATES: &[(Region, &str)] = &[
  (Region::Jp, "92/09/24 13:05"),
  (Region::Us, "93/08/24 15:02"),
  (Region::Uk, "93/11/02 10:44"),
  (Region::Fr, "93/11/02 10:48"),
  (Region::De, "93/11/02 10:51"),
  (Region::UsBeta, "93/06/15 09:17"),
];

#[rustfmt::skip]
const ADDRESSES: &[(&str, Option<Region>, u32)] = &[
  ("room_data_ptr",          None,                 0x0a_0a00),
  ("room_data_ptr",          Some(Region::Jp),     0x0a_0900),
  ("room_data_ptr",          Some(Region::Us),     0x0a_0a00),
  ("room_data_ptr",          Some(Region::Uk),     0x0a_0a00),
  ("room_data_ptr",          Some(Region::Fr),     0x0a_0a00),
  ("room_data_ptr",          Some(Region::De),     0x0a_0a00),
  ("room_data_ptr",          Some(Region::UsBeta), 0x0a_09c0),
  ("blockset_ptr_table",     None,                 0x1a_f800),
  ("blockset_ptr_table",     Some(Region::Jp),     0x1a_f6c0),
  ("blockset_ptr_table",     Some(Region::Us),     0x1a_f800),
  ("blockset_ptr_table",     Some(Region::Uk),     0x1a_f800),
  ("blockset_ptr_table",     Some(Region::Fr),     0x1a_f800),
  ("blockset_ptr_table",     Some(Region::De),     0x1a_f800),
  ("blockset_ptr_table",     Some(Region::UsBeta), 0x1a_f780),
  ("tileset_ptr_table",      None,                 0x04_4010),
  ("tileset_ptr_table",      Some(Region::Us),     0x04_4010),
  ("tileset_ptr_table",      Some(Region::Uk),     0x04_4010),
  ("tileset_ptr_table",      Some(Region::Fr),     0x04_4010),
  ("tileset_ptr_table",      Some(Region::De),     0x04_4010),
  ("tileset_ptr_table",      Some(Region::UsBeta), 0x04_4010),
  ("tileset_ptr_table",      Some(Region::Jp),     0x04_3f90),
  ("room_palette_ptr",       None,                 0x01_1c26),
  ("room_palette_ptr",       Some(Region::Jp),     0x01_1b8a),
  ("room_palette_ptr",       Some(Region::Us),     0x01_1c26),
  ("room_palette_ptr",       Some(Region::Fr),     0x01_1c3e),
  ("room_palette_ptr",       Some(Region::De),     0x01_1c3e),
  ("room_palette_ptr",       Some(Region::UsBeta), 0x01_1c26),
  ("debug_menu",             Some(Region::UsBeta), 0x00_8f20),
];

#[rustfmt::skip]
const SECTIONS: &[(&str, Option<Region>, u32, u32)] = &[
  ("room_table",             None,                 0x0a_0a04, 0x0a_12e4),
  ("room_table",             Some(Region::Jp),     0x0a_0904, 0x0a_11e4),
  ("room_table",             Some(Region::Us),     0x0a_0a04, 0x0a_12e4),
  ("room_table",             Some(Region::Uk),     0x0a_0a04, 0x0a_12e4),
  ("room_table",             Some(Region::Fr),     0x0a_0a04, 0x0a_12e4),
  ("room_table",             Some(Region::De),     0x0a_0a04, 0x0a_12e4),
  ("room_table",             Some(Region::UsBeta), 0x0a_09c4, 0x0a_12a4),
  ("blocksets",              None,                 0x1a_fe00, 0x1e_0000),
  ("blocksets",              Some(Region::Jp),     0x1a_fcc0, 0x1e_0000),
  ("blocksets",              Some(Region::Us),     0x1a_fe00, 0x1e_0000),
  ("blocksets",              Some(Region::Uk),     0x1a_fe00, 0x1e_0000),
  ("blocksets",              Some(Region::Fr),     0x1a_fe00, 0x1e_0000),
  ("blocksets",              Some(Region::De),     0x1a_fe00, 0x1e_0000),
  ("blocksets",              Some(Region::UsBeta), 0x1a_fd80, 0x1e_0000),
  ("intro_font",             None,                 0x03_5f40, 0x03_6940),
  ("intro_font",             Some(Region::Jp),     0x03_5c10, 0x03_6610),
  ("intro_font",             Some(Region::Us),     0x03_5f40, 0x03_6940),
  ("intro_font",             Some(Region::De),     0x03_6020, 0x03_6a20),
  ("free_space",             None,                 0x1f_f000, 0x20_0000),
];

pub(super) fn table() -> RomOffsets {
  let mut b = RomOffsets::builder();
  for &(region, name) in REGION_NAMES {
    b = b.region_name(region, name);
  }

  for &(region, date) in RELEASE_DATES {
    b = b.release_date(region, date);
  }
  for &(label, region, addr) in ADDRESSES {
    b = b.address(label, region, addr);
  }
  for &(label, region, begin, end) in SECTIONS {
    if let Some(section) = Section::new(begin, end) {
      b = b.section(label, region, section);
    }
  }
  b.build()
}
