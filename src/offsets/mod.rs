//! Region-aware ROM address tables.
//!
//! The game was released six times (Japan, US, UK, France, Germany, and a US
//! beta), and each release moves data around. A `RomOffsets` table maps a
//! *label*, naming some structure in the ROM, to the address or section where
//! that structure lives in a particular release.
//!
//! A label may have a *default* entry, and any number of region-specific
//! entries. Lookups never mix the two: asking for a region returns only that
//! region's entry, and asking for no region returns only the default. A label
//! that does not exist for a region is not an error; it just means that
//! release does not have that structure.
//!
//! A table is built once, and is read-only afterwards; it is meant to be
//! created at startup and passed around by reference.

use std::collections::HashMap;
use std::error;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use log::trace;

mod builtin;
mod config;

/// The address of the header checksum word.
pub const CHECKSUM_ADDRESS: u32 = 0x00_018e;
/// The first byte covered by the header checksum.
pub const CHECKSUM_BEGIN: u32 = 0x00_0200;
/// The address of the build-date stamp.
pub const BUILD_DATE_BEGIN: u32 = 0x00_0202;
/// The length of the build-date stamp.
pub const BUILD_DATE_LENGTH: u32 = 0x00_000e;
/// The size of an unmodified ROM image: two mebibytes.
pub const EXPECTED_SIZE: u32 = 0x20_0000;

/// A regional release of the game.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Region {
  /// The original Japanese release.
  Jp,
  /// The North American release.
  Us,
  /// The English-language European release.
  Uk,
  /// The French release.
  Fr,
  /// The German release.
  De,
  /// The North American beta.
  UsBeta,
}

impl Region {
  /// Every region, in declaration order.
  pub const ALL: [Region; 6] = [
    Region::Jp,
    Region::Us,
    Region::Uk,
    Region::Fr,
    Region::De,
    Region::UsBeta,
  ];

  /// Returns the short name of this region, such as `US_BETA`.
  pub fn name(self) -> &'static str {
    match self {
      Self::Jp => "JP",
      Self::Us => "US",
      Self::Uk => "UK",
      Self::Fr => "FR",
      Self::De => "DE",
      Self::UsBeta => "US_BETA",
    }
  }

  /// Parses a short name into a `Region`, case-insensitively.
  pub fn from_name(s: &str) -> Option<Self> {
    Self::ALL
      .iter()
      .copied()
      .find(|r| r.name().eq_ignore_ascii_case(s))
  }
}

impl fmt::Display for Region {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Region {
  type Err = Error;
  fn from_str(s: &str) -> Result<Self, Error> {
    Self::from_name(s).ok_or_else(|| Error::UnknownRegion(s.to_string()))
  }
}

/// A contiguous range of ROM addresses, `begin..end`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Section {
  begin: u32,
  end: u32,
}

impl Section {
  /// Creates a new `Section`, if `end` is not before `begin`.
  pub fn new(begin: u32, end: u32) -> Option<Self> {
    if end < begin {
      return None;
    }
    Some(Self { begin, end })
  }

  /// Returns the first address in this section.
  pub fn begin(self) -> u32 {
    self.begin
  }

  /// Returns the address one past the end of this section.
  pub fn end(self) -> u32 {
    self.end
  }

  /// Returns the size of this section, in bytes.
  pub fn size(self) -> u32 {
    self.end - self.begin
  }

  /// Returns this section as a range of indices into a ROM image.
  pub fn range(self) -> Range<usize> {
    self.begin as usize..self.end as usize
  }
}

impl fmt::Display for Section {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "0x{:06x}..0x{:06x}", self.begin, self.end)
  }
}

/// An error produced while building an address table.
#[derive(Debug)]
pub enum Error {
  /// The table description was not valid JSON5, or did not match the
  /// expected shape.
  Json5(json5::Error),
  /// A section ended before it began.
  InvalidSection {
    /// The section's label.
    label: String,
    /// The first address.
    begin: u32,
    /// The end address.
    end: u32,
  },
  /// A region name was not recognized.
  UnknownRegion(String),
  /// Two regions claimed the same build-date stamp.
  DuplicateReleaseDate(String),
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Error::Json5(e) => write!(f, "invalid address table: {}", e),
      Error::InvalidSection { label, begin, end } => write!(
        f,
        "section {} ends (0x{:06x}) before it begins (0x{:06x})",
        label, end, begin
      ),
      Error::UnknownRegion(name) => write!(f, "unknown region {:?}", name),
      Error::DuplicateReleaseDate(date) => {
        write!(f, "build date {:?} is claimed by two regions", date)
      }
    }
  }
}

impl error::Error for Error {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      Error::Json5(e) => Some(e),
      _ => None,
    }
  }
}

impl From<json5::Error> for Error {
  fn from(e: json5::Error) -> Self {
    Error::Json5(e)
  }
}

/// The entries for a single label.
#[derive(Clone, Debug)]
struct Entry<T> {
  default: Option<T>,
  regions: HashMap<Region, T>,
}

impl<T> Default for Entry<T> {
  fn default() -> Self {
    Self {
      default: None,
      regions: HashMap::new(),
    }
  }
}

impl<T: Copy> Entry<T> {
  fn get(&self, region: Option<Region>) -> Option<T> {
    match region {
      Some(region) => self.regions.get(&region).copied(),
      None => self.default,
    }
  }

  fn get_or_default(&self, region: Option<Region>) -> Option<T> {
    self.get(region).or(self.default)
  }
}

/// An immutable table of per-region addresses and sections.
///
/// See the [module documentation](index.html) for the lookup rules.
#[derive(Clone, Debug, Default)]
pub struct RomOffsets {
  region_names: HashMap<Region, String>,
  release_dates: HashMap<String, Region>,
  addresses: HashMap<String, Entry<u32>>,
  sections: HashMap<String, Entry<Section>>,
}

impl RomOffsets {
  /// Returns the table of known structures compiled into this crate.
  pub fn builtin() -> Self {
    builtin::table()
  }

  /// Parses a table from a JSON5 document.
  ///
  /// The document has the following shape; every key is optional:
  /// ```text
  /// {
  ///   region_names: { JP: "Japan", US: "United States" },
  ///   release_dates: { JP: "92/10/30 19:38" },
  ///   addresses: { room_table_ptr: { default: 0xa0a00, UK: 0xa0b00 } },
  ///   sections: { blocksets: { default: { begin: 0x1000, end: 0x2000 } } },
  /// }
  /// ```
  pub fn from_json5(text: &str) -> Result<Self, Error> {
    config::parse(text)
  }

  /// Starts building a new table.
  pub fn builder() -> Builder {
    Builder::default()
  }

  /// Returns the human-readable name of `region`.
  ///
  /// Falls back to the region's short name if this table does not name it.
  pub fn region_name(&self, region: Region) -> &str {
    self
      .region_names
      .get(&region)
      .map(String::as_str)
      .unwrap_or_else(|| region.name())
  }

  /// Identifies a release by its build-date stamp.
  ///
  /// Trailing NUL and space padding is ignored. Returns `None` for a stamp
  /// that does not belong to any known release.
  pub fn region_from_release_date(&self, date: &str) -> Option<Region> {
    let date = date.trim_end_matches(|c| c == '\0' || c == ' ');
    let region = self.release_dates.get(date).copied();
    trace!("build date {:?} -> {:?}", date, region);
    region
  }

  /// Looks up the address of `label`.
  ///
  /// With a region, only that region's entry is considered; without one,
  /// only the default entry is.
  pub fn address(&self, label: &str, region: Option<Region>) -> Option<u32> {
    let addr = self.addresses.get(label).and_then(|e| e.get(region));
    trace!("address {} ({:?}) -> {:x?}", label, region, addr);
    addr
  }

  /// Looks up the section for `label`.
  ///
  /// With a region, only that region's entry is considered; without one,
  /// only the default entry is.
  pub fn section(
    &self,
    label: &str,
    region: Option<Region>,
  ) -> Option<Section> {
    let section = self.sections.get(label).and_then(|e| e.get(region));
    trace!("section {} ({:?}) -> {:?}", label, region, section);
    section
  }

  /// Looks up the address of `label` for `region`, falling back to the
  /// default entry if the region has none.
  pub fn address_or_default(
    &self,
    label: &str,
    region: Option<Region>,
  ) -> Option<u32> {
    self
      .addresses
      .get(label)
      .and_then(|e| e.get_or_default(region))
  }

  /// Looks up the section for `label` in `region`, falling back to the
  /// default entry if the region has none.
  pub fn section_or_default(
    &self,
    label: &str,
    region: Option<Region>,
  ) -> Option<Section> {
    self
      .sections
      .get(label)
      .and_then(|e| e.get_or_default(region))
  }

  /// Returns whether any address entry exists for `label`.
  pub fn address_exists(&self, label: &str) -> bool {
    self.addresses.contains_key(label)
  }

  /// Returns whether any section entry exists for `label`.
  pub fn section_exists(&self, label: &str) -> bool {
    self.sections.contains_key(label)
  }

  /// Returns every address label, sorted.
  pub fn address_labels(&self) -> Vec<&str> {
    let mut labels =
      self.addresses.keys().map(String::as_str).collect::<Vec<_>>();
    labels.sort_unstable();
    labels
  }

  /// Returns every section label, sorted.
  pub fn section_labels(&self) -> Vec<&str> {
    let mut labels =
      self.sections.keys().map(String::as_str).collect::<Vec<_>>();
    labels.sort_unstable();
    labels
  }
}

/// A builder for a [`RomOffsets`] table.
///
/// [`RomOffsets`]: struct.RomOffsets.html
#[derive(Debug, Default)]
pub struct Builder {
  table: RomOffsets,
}

impl Builder {
  /// Sets the human-readable name of `region`.
  pub fn region_name(mut self, region: Region, name: &str) -> Self {
    self.table.region_names.insert(region, name.to_string());
    self
  }

  /// Registers the build-date stamp of `region`.
  ///
  /// A stamp maps to exactly one region; registering it again replaces the
  /// earlier region.
  pub fn release_date(mut self, region: Region, date: &str) -> Self {
    self.table.release_dates.insert(date.to_string(), region);
    self
  }

  /// Defines the address of `label`, either for `region` or as the default.
  pub fn address(
    mut self,
    label: &str,
    region: Option<Region>,
    addr: u32,
  ) -> Self {
    let entry = self.table.addresses.entry(label.to_string()).or_default();
    match region {
      Some(region) => {
        entry.regions.insert(region, addr);
      }
      None => entry.default = Some(addr),
    }
    self
  }

  /// Defines the section for `label`, either for `region` or as the default.
  pub fn section(
    mut self,
    label: &str,
    region: Option<Region>,
    section: Section,
  ) -> Self {
    let entry = self.table.sections.entry(label.to_string()).or_default();
    match region {
      Some(region) => {
        entry.regions.insert(region, section);
      }
      None => entry.default = Some(section),
    }
    self
  }

  /// Finishes building the table.
  pub fn build(self) -> RomOffsets {
    self.table
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn table() -> RomOffsets {
    RomOffsets::builder()
      .region_name(Region::Uk, "United Kingdom")
      .release_date(Region::Jp, "92/10/30 19:38")
      .address("x", None, 0x1000)
      .address("x", Some(Region::Jp), 0x0f00)
      .address("beta_only", Some(Region::UsBeta), 0x4000)
      .section("s", None, Section::new(0x100, 0x180).unwrap())
      .section("s", Some(Region::De), Section::new(0x200, 0x300).unwrap())
      .build()
  }

  #[test]
  fn region_lookup_does_not_fall_back() {
    let t = table();
    assert_eq!(t.address("x", None), Some(0x1000));
    assert_eq!(t.address("x", Some(Region::Jp)), Some(0x0f00));
    assert_eq!(t.address("x", Some(Region::Uk)), None);
    assert_eq!(t.address("beta_only", None), None);
    assert_eq!(t.address("beta_only", Some(Region::UsBeta)), Some(0x4000));
    assert_eq!(t.address("nope", None), None);

    assert_eq!(t.section("s", Some(Region::Fr)), None);
    assert_eq!(t.section("s", Some(Region::De)).map(Section::size), Some(0x100));
  }

  #[test]
  fn fallback_lookup() {
    let t = table();
    assert_eq!(t.address_or_default("x", Some(Region::Uk)), Some(0x1000));
    assert_eq!(t.address_or_default("x", Some(Region::Jp)), Some(0x0f00));
    assert_eq!(t.address_or_default("beta_only", Some(Region::Us)), None);
    assert_eq!(
      t.section_or_default("s", Some(Region::Fr)),
      Section::new(0x100, 0x180)
    );
  }

  #[test]
  fn existence() {
    let t = table();
    assert!(t.address_exists("x"));
    assert!(t.address_exists("beta_only"));
    assert!(!t.address_exists("s"));
    assert!(t.section_exists("s"));
    assert!(!t.section_exists("x"));
    assert_eq!(t.address_labels(), vec!["beta_only", "x"]);
  }

  #[test]
  fn release_dates() {
    let t = table();
    assert_eq!(t.region_from_release_date("92/10/30 19:38"), Some(Region::Jp));
    assert_eq!(
      t.region_from_release_date("92/10/30 19:38\0\0"),
      Some(Region::Jp)
    );
    assert_eq!(t.region_from_release_date("93/01/01 00:00"), None);
  }

  #[test]
  fn region_names() {
    assert_eq!(table().region_name(Region::Uk), "United Kingdom");
    assert_eq!(table().region_name(Region::Fr), "FR");
    let empty = RomOffsets::default();
    for &region in Region::ALL.iter() {
      assert_eq!(empty.region_name(region), region.name());
    }
    for region in Region::ALL.iter() {
      assert_eq!(region.name().parse::<Region>().unwrap(), *region);
    }
    assert_eq!("us_beta".parse::<Region>().unwrap(), Region::UsBeta);
    assert!("XX".parse::<Region>().is_err());
  }

  #[test]
  fn sections() {
    assert_eq!(Section::new(2, 1), None);
    let s = Section::new(0x10, 0x18).unwrap();
    assert_eq!(s.size(), 8);
    assert_eq!(s.range(), 0x10..0x18);
    assert_eq!(s.to_string(), "0x000010..0x000018");
  }
}
