//! Loading address tables from JSON5.

use std::collections::BTreeMap;
use std::collections::HashSet;

use serde::Deserialize;

use crate::offsets::Builder;
use crate::offsets::Error;
use crate::offsets::Region;
use crate::offsets::RomOffsets;
use crate::offsets::Section;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct File {
  #[serde(default)]
  region_names: PerRegion<String>,
  #[serde(default)]
  release_dates: PerRegion<String>,
  #[serde(default)]
  addresses: BTreeMap<String, PerRegion<u32>>,
  #[serde(default)]
  sections: BTreeMap<String, PerRegion<RawSection>>,
}

/// A value per region, plus a default.
///
/// The default is only meaningful for addresses and sections.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PerRegion<T> {
  default: Option<T>,
  #[serde(rename = "JP")]
  jp: Option<T>,
  #[serde(rename = "US")]
  us: Option<T>,
  #[serde(rename = "UK")]
  uk: Option<T>,
  #[serde(rename = "FR")]
  fr: Option<T>,
  #[serde(rename = "DE")]
  de: Option<T>,
  #[serde(rename = "US_BETA")]
  us_beta: Option<T>,
}

impl<T> Default for PerRegion<T> {
  fn default() -> Self {
    Self {
      default: None,
      jp: None,
      us: None,
      uk: None,
      fr: None,
      de: None,
      us_beta: None,
    }
  }
}

impl<T> PerRegion<T> {
  /// Flattens this into `(region, value)` pairs, with `None` standing for
  /// the default.
  fn entries(self) -> impl Iterator<Item = (Option<Region>, T)> {
    vec![
      (None, self.default),
      (Some(Region::Jp), self.jp),
      (Some(Region::Us), self.us),
      (Some(Region::Uk), self.uk),
      (Some(Region::Fr), self.fr),
      (Some(Region::De), self.de),
      (Some(Region::UsBeta), self.us_beta),
    ]
    .into_iter()
    .filter_map(|(region, val)| val.map(|v| (region, v)))
  }
}

#[derive(Copy, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSection {
  begin: u32,
  end: u32,
}

pub(super) fn parse(text: &str) -> Result<RomOffsets, Error> {
  let file: File = json5::from_str(text)?;
  let mut builder = Builder::default();

  for (region, name) in file.region_names.entries() {
    if let Some(region) = region {
      builder = builder.region_name(region, &name);
    }
  }
  let mut dates = HashSet::new();
  for (region, date) in file.release_dates.entries() {
    if let Some(region) = region {
      if !dates.insert(date.clone()) {
        return Err(Error::DuplicateReleaseDate(date));
      }
      builder = builder.release_date(region, &date);
    }
  }
  for (label, entries) in file.addresses {
    for (region, addr) in entries.entries() {
      builder = builder.address(&label, region, addr);
    }
  }
  for (label, entries) in file.sections {
    for (region, raw) in entries.entries() {
      let section =
        Section::new(raw.begin, raw.end).ok_or_else(|| Error::InvalidSection {
          label: label.clone(),
          begin: raw.begin,
          end: raw.end,
        })?;
      builder = builder.section(&label, region, section);
    }
  }

  Ok(builder.build())
}

#[cfg(test)]
mod test {
  use super::*;

  const TABLE: &str = r#"
  // Comments and trailing commas are fine.
  {
    region_names: { JP: "Japan", US_BETA: "US (beta)" },
    release_dates: { JP: "92/10/30 19:38", US: "93/08/24 15:02" },
    addresses: {
      x: { default: 0x1000, JP: 0x0f00 },
      beta_only: { US_BETA: 16384 },
    },
    sections: {
      s: { default: { begin: 0x100, end: 0x180 }, DE: { begin: 0x200, end: 0x300 } },
    },
  }
  "#;

  #[test]
  fn parse_table() {
    let t = RomOffsets::from_json5(TABLE).unwrap();
    assert_eq!(t.region_name(Region::UsBeta), "US (beta)");
    assert_eq!(t.region_name(Region::Us), "US");
    assert_eq!(t.region_from_release_date("93/08/24 15:02"), Some(Region::Us));
    assert_eq!(t.address("x", None), Some(0x1000));
    assert_eq!(t.address("x", Some(Region::Jp)), Some(0x0f00));
    assert_eq!(t.address("x", Some(Region::Uk)), None);
    assert_eq!(t.address("beta_only", Some(Region::UsBeta)), Some(0x4000));
    assert_eq!(t.section("s", Some(Region::De)), Section::new(0x200, 0x300));
  }

  #[test]
  fn empty_table() {
    let t = RomOffsets::from_json5("{}").unwrap();
    assert!(!t.address_exists("x"));
  }

  #[test]
  fn rejects_bad_tables() {
    assert!(matches!(
      RomOffsets::from_json5("{ addresses: { x: { XX: 1 } } }"),
      Err(Error::Json5(_))
    ));
    assert!(matches!(
      RomOffsets::from_json5("{ colours: {} }"),
      Err(Error::Json5(_))
    ));
    assert!(matches!(
      RomOffsets::from_json5("{ sections: { s: { default: { begin: 9, end: 8 } } } }"),
      Err(Error::InvalidSection { .. })
    ));
    assert!(matches!(
      RomOffsets::from_json5(r#"{ release_dates: { JP: "a", US: "a" } }"#),
      Err(Error::DuplicateReleaseDate(_))
    ));
  }
}
