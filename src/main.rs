//! lsrom, a tool for inspecting and rewriting the blocksets in Landstalker
//! ROM images.

#![deny(unused)]
#![deny(unsafe_code)]

use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use log::info;
use log::warn;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use lsrom::blockset::csv;
use lsrom::error::Action;
use lsrom::error::Cause;
use lsrom::error::Context;
use lsrom::error::Error;
use lsrom::error::Kind;
use lsrom::offsets::Region;
use lsrom::offsets::RomOffsets;
use lsrom::offsets::Section;
use lsrom::rom::RomImage;

#[derive(StructOpt)]
#[structopt(name = "lsrom")]
struct Opts {
  /// A JSON5 address table to use instead of the built-in one.
  #[structopt(long, parse(from_os_str))]
  offsets: Option<PathBuf>,
  /// The release to assume, instead of detecting it from the build date.
  #[structopt(long)]
  region: Option<Region>,
  #[structopt(subcommand)]
  cmd: Command,
}

#[derive(StructOpt)]
enum Command {
  /// Prints the release, checksum, and known sections of a ROM.
  Info {
    #[structopt(parse(from_os_str))]
    rom: PathBuf,
  },
  /// Hex-dumps a labeled section of a ROM.
  Dump {
    #[structopt(parse(from_os_str))]
    rom: PathBuf,
    label: String,
  },
  /// Prints the room table of a ROM.
  Rooms {
    #[structopt(parse(from_os_str))]
    rom: PathBuf,
  },
  /// Decompresses the blockset in a labeled section, as CSV.
  Export {
    #[structopt(parse(from_os_str))]
    rom: PathBuf,
    label: String,
    /// Decode only this many blocks, rather than the whole section.
    #[structopt(long)]
    blocks: Option<usize>,
    /// Where to write the CSV; defaults to stdout.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
  },
  /// Compresses a CSV blockset into a labeled section, and fixes the
  /// checksum.
  Import {
    #[structopt(parse(from_os_str))]
    rom: PathBuf,
    label: String,
    #[structopt(parse(from_os_str))]
    csv: PathBuf,
    /// Where to write the new ROM; defaults to overwriting the input.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
  },
  /// Recomputes the header checksum.
  FixChecksum {
    #[structopt(parse(from_os_str))]
    rom: PathBuf,
    /// Where to write the new ROM; defaults to overwriting the input.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
  },
}

/// Everything a command needs besides its own arguments.
struct Env {
  offsets: RomOffsets,
  region: Option<Region>,
}

impl Env {
  fn new(opts: &Opts) -> Result<Self, Error> {
    let offsets = match &opts.offsets {
      Some(path) => {
        let text = fs::read_to_string(path)
          .context(Action::Loading, || Cause::File(path.clone()))?;
        let offsets = RomOffsets::from_json5(&text)
          .context(Action::Parsing, || Cause::File(path.clone()))?;
        info!("using address table {}", path.display());
        offsets
      }
      None => RomOffsets::builtin(),
    };
    Ok(Self {
      offsets,
      region: opts.region,
    })
  }

  /// Loads a ROM, and works out which release it is.
  fn load(&mut self, path: &Path) -> Result<RomImage, Error> {
    let bytes =
      fs::read(path).context(Action::Loading, || Cause::File(path.into()))?;
    let rom =
      RomImage::new(bytes).context(Action::Loading, || Cause::File(path.into()))?;
    self.identify(&rom);
    Ok(rom)
  }

  /// Works out which release `rom` is, unless one was given explicitly.
  fn identify(&mut self, rom: &RomImage) {
    let detected = rom.region(&self.offsets);
    match (self.region, detected) {
      (Some(forced), Some(detected)) if forced != detected => {
        warn!("ROM looks like {}, but treating it as {}", detected, forced)
      }
      (None, Some(detected)) => {
        info!("detected {} release", detected);
        self.region = Some(detected);
      }
      (None, None) => warn!("unknown release; using default addresses"),
      _ => {}
    }
  }

  /// Returns the release that `rom` is being modified as.
  ///
  /// Fails if the release is neither detected nor given with `--region`;
  /// default addresses are only used for reading.
  fn writable_release(
    &self,
    rom: &RomImage,
    path: &Path,
  ) -> Result<Region, Error> {
    self.region.ok_or_else(|| {
      let date = String::from_utf8_lossy(rom.build_date());
      Error::new(
        Kind::UnknownRelease {
          date: date.trim_end_matches(|c| c == '\0' || c == ' ').to_string(),
        },
        Action::Writing,
        Cause::File(path.into()),
      )
    })
  }

  fn section(&self, label: &str) -> Result<Section, Error> {
    self
      .offsets
      .section_or_default(label, self.region)
      .ok_or_else(|| {
        Error::new(
          Kind::MissingLabel {
            label: label.to_string(),
            region: self.region,
          },
          Action::Loading,
          Cause::Label(label.to_string()),
        )
      })
  }
}

fn cause(label: &str, section: Section) -> impl FnOnce() -> Cause + '_ {
  move || Cause::Section {
    label: label.to_string(),
    section,
  }
}

fn save(rom: RomImage, path: &Path) -> Result<(), Error> {
  fs::write(path, rom.into_bytes())
    .context(Action::Writing, || Cause::File(path.into()))?;
  info!("wrote {}", path.display());
  Ok(())
}

fn info(env: &mut Env, path: &Path) -> Result<(), Error> {
  let rom = env.load(path)?;
  let stdout = io::stdout();
  let mut out = stdout.lock();
  let stdout_cause = || Cause::File("<stdout>".into());

  let date = String::from_utf8_lossy(rom.build_date()).into_owned();
  let release = match env.region {
    Some(region) => match env.offsets.region_name(region) {
      name if name == region.name() => name.to_string(),
      name => format!("{} ({})", region, name),
    },
    None => "unknown".to_string(),
  };
  writeln!(out, "release:  {}", release)
    .context(Action::Writing, stdout_cause)?;
  writeln!(out, "built:    {}", date.trim_end_matches('\0'))
    .context(Action::Writing, stdout_cause)?;
  writeln!(
    out,
    "checksum: 0x{:04x} ({})",
    rom.checksum(),
    if rom.checksum_valid() { "ok" } else { "bad" }
  )
  .context(Action::Writing, stdout_cause)?;

  for label in env.offsets.section_labels() {
    if let Some(section) = env.offsets.section_or_default(label, env.region) {
      writeln!(out, "{:>24}  {}  ({} bytes)", label, section, section.size())
        .context(Action::Writing, stdout_cause)?;
    }
  }
  for label in env.offsets.address_labels() {
    if let Some(addr) = env.offsets.address_or_default(label, env.region) {
      writeln!(out, "{:>24}  0x{:06x}", label, addr)
        .context(Action::Writing, stdout_cause)?;
    }
  }
  Ok(())
}

fn dump(env: &mut Env, path: &Path, label: &str) -> Result<(), Error> {
  let rom = env.load(path)?;
  let section = env.section(label)?;
  rom
    .dump(section, io::stdout())
    .context(Action::Writing, || Cause::File("<stdout>".into()))
}

fn rooms(env: &mut Env, path: &Path) -> Result<(), Error> {
  let rom = env.load(path)?;
  let section = env.section("room_table")?;
  let records = rom
    .rooms(section)
    .context(Action::Decoding, cause("room_table", section))?;

  let stdout = io::stdout();
  let mut out = stdout.lock();
  for (i, record) in records.iter().enumerate() {
    let room = &record.room;
    writeln!(
      out,
      "{:4}: map=0x{:06x} tileset={:2} blockset={:2}/{} palette={:2} bgm={:2} z={}..{}",
      i,
      record.map_offset,
      room.tileset,
      room.blockset_id(),
      room.sec_blockset,
      room.room_palette,
      room.bgm,
      room.room_z_begin,
      room.room_z_end,
    )
    .context(Action::Writing, || Cause::File("<stdout>".into()))?;
  }
  Ok(())
}

fn export(
  env: &mut Env,
  path: &Path,
  label: &str,
  blocks: Option<usize>,
  output: Option<&Path>,
) -> Result<(), Error> {
  let rom = env.load(path)?;
  let section = env.section(label)?;
  let blockset = match blocks {
    Some(count) => {
      let (blockset, consumed) = rom
        .load_blocks(section, count)
        .context(Action::Decoding, cause(label, section))?;
      info!("{} blocks occupy {} bytes", count, consumed);
      blockset
    }
    None => rom
      .load_blockset(section)
      .context(Action::Decoding, cause(label, section))?,
  };

  let text = csv::to_csv(&blockset);
  match output {
    Some(out) => fs::write(out, text)
      .context(Action::Writing, || Cause::File(out.into())),
    None => io::stdout()
      .write_all(text.as_bytes())
      .context(Action::Writing, || Cause::File("<stdout>".into())),
  }
}

fn import(
  env: &mut Env,
  path: &Path,
  label: &str,
  csv_path: &Path,
  output: Option<&Path>,
) -> Result<(), Error> {
  let mut rom = env.load(path)?;
  env.writable_release(&rom, path)?;
  let section = env.section(label)?;

  let text = fs::read_to_string(csv_path)
    .context(Action::Loading, || Cause::File(csv_path.into()))?;
  let blockset = csv::from_csv(&text)
    .context(Action::Parsing, || Cause::File(csv_path.into()))?;

  let written = rom
    .store_blockset(section, &blockset)
    .context(Action::Encoding, cause(label, section))?;
  info!(
    "stored {} blocks in {} of {} bytes",
    blockset.len(),
    written,
    section.size()
  );
  rom.update_checksum();
  save(rom, output.unwrap_or(path))
}

fn fix_checksum(
  env: &mut Env,
  path: &Path,
  output: Option<&Path>,
) -> Result<(), Error> {
  let mut rom = env.load(path)?;
  env.writable_release(&rom, path)?;
  let old = rom.checksum();
  let new = rom.update_checksum();
  info!("checksum 0x{:04x} -> 0x{:04x}", old, new);
  save(rom, output.unwrap_or(path))
}

fn run(opts: Opts) -> Result<(), Error> {
  let mut env = Env::new(&opts)?;
  match &opts.cmd {
    Command::Info { rom } => info(&mut env, rom),
    Command::Dump { rom, label } => dump(&mut env, rom, label),
    Command::Rooms { rom } => rooms(&mut env, rom),
    Command::Export {
      rom,
      label,
      blocks,
      output,
    } => export(&mut env, rom, label, *blocks, output.as_deref()),
    Command::Import {
      rom,
      label,
      csv,
      output,
    } => import(&mut env, rom, label, csv, output.as_deref()),
    Command::FixChecksum { rom, output } => {
      fix_checksum(&mut env, rom, output.as_deref())
    }
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .with_writer(io::stderr)
    .init();

  if let Err(e) = run(Opts::from_args()) {
    e.dump_and_die(1);
  }
}

#[cfg(test)]
mod test {
  use super::*;

  use lsrom::offsets::BUILD_DATE_BEGIN;

  fn image(date: &str) -> RomImage {
    let mut bytes = vec![0xff; RomImage::LEN];
    let begin = BUILD_DATE_BEGIN as usize;
    bytes[begin..begin + date.len()].copy_from_slice(date.as_bytes());
    RomImage::new(bytes).unwrap()
  }

  fn env(region: Option<Region>) -> Env {
    let offsets = RomOffsets::builder()
      .release_date(Region::Jp, "92/09/24 13:05")
      .build();
    Env { offsets, region }
  }

  #[test]
  fn unknown_release_blocks_writes() {
    let rom = RomImage::filled_with(0xff);
    let mut env = env(None);
    env.identify(&rom);
    assert_eq!(env.region, None);

    let err = env
      .writable_release(&rom, Path::new("game.bin"))
      .unwrap_err();
    assert!(matches!(err.kind(), Kind::UnknownRelease { .. }));
    assert_eq!(err.action(), Action::Writing);
  }

  #[test]
  fn known_or_forced_release_allows_writes() {
    let path = Path::new("game.bin");

    let rom = image("92/09/24 13:05");
    let mut detected = env(None);
    detected.identify(&rom);
    assert_eq!(detected.writable_release(&rom, path).unwrap(), Region::Jp);

    let rom = RomImage::filled_with(0xff);
    let mut forced = env(Some(Region::Us));
    forced.identify(&rom);
    assert_eq!(forced.writable_release(&rom, path).unwrap(), Region::Us);
  }
}
