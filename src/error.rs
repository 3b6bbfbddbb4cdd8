//! Error printing facilities.
//!
//! Each module has its own error type describing what went wrong; the
//! [`Error`] type here wraps one of them together with what `lsrom` was doing
//! at the time and what it was doing it to, so that it can be shown to the
//! user as a simple diagnostic:
//! ```text
//! error: line 3: invalid tile "PX0001"
//!   while parsing blocks.csv
//! ```
//!
//! [`Error`]: struct.Error.html

use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::blockset::cmp;
use crate::blockset::csv;
use crate::offsets;
use crate::offsets::Region;
use crate::offsets::Section;
use crate::rom;
use crate::room;

/// The underlying reason for an [`Error`].
///
/// [`Error`]: struct.Error.html
#[derive(Debug)]
pub enum Kind {
  /// A file could not be read or written.
  Io(io::Error),
  /// A compressed blockset was malformed, or did not fit.
  Codec(cmp::Error),
  /// A textual blockset was malformed.
  Csv(csv::Error),
  /// An address table was malformed.
  Offsets(offsets::Error),
  /// A ROM image was malformed, or accessed out of bounds.
  Rom(rom::Error),
  /// A room table was malformed.
  Room(room::LengthError),
  /// A label has no entry for the requested region.
  MissingLabel {
    /// The label.
    label: String,
    /// The region, if any.
    region: Option<Region>,
  },
  /// A ROM's build date does not match any known release, so its layout is
  /// unknown.
  UnknownRelease {
    /// The build-date stamp found in the ROM.
    date: String,
  },
}

impl fmt::Display for Kind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Kind::Io(e) => write!(f, "{}", e),
      Kind::Codec(e) => write!(f, "{}", e),
      Kind::Csv(e) => write!(f, "{}", e),
      Kind::Offsets(e) => write!(f, "{}", e),
      Kind::Rom(e) => write!(f, "{}", e),
      Kind::Room(e) => write!(f, "{}", e),
      Kind::MissingLabel {
        label,
        region: Some(region),
      } => write!(f, "no entry for {:?} in region {}", label, region),
      Kind::MissingLabel { label, region: None } => {
        write!(f, "no default entry for {:?}", label)
      }
      Kind::UnknownRelease { date } => write!(
        f,
        "unrecognized release (build date {:?}); refusing to modify it",
        date
      ),
    }
  }
}

macro_rules! kind_from {
  ($($variant:ident($ty:ty),)*) => {$(
    impl From<$ty> for Kind {
      fn from(e: $ty) -> Self {
        Kind::$variant(e)
      }
    }
  )*}
}

kind_from! {
  Io(io::Error),
  Codec(cmp::Error),
  Csv(csv::Error),
  Offsets(offsets::Error),
  Rom(rom::Error),
  Room(room::LengthError),
}

/// The thing an error was caused by, to varying degrees of specificity.
#[derive(Clone, Debug)]
pub enum Cause {
  /// A file.
  File(PathBuf),
  /// A labeled section of the ROM.
  Section {
    /// The section's label.
    label: String,
    /// The resolved addresses.
    section: Section,
  },
  /// A label which could not be resolved to anything.
  Label(String),
}

impl fmt::Display for Cause {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Cause::File(path) => write!(f, "{}", path.display()),
      Cause::Section { label, section } => {
        write!(f, "section {} at {}", label, section)
      }
      Cause::Label(label) => write!(f, "{}", label),
    }
  }
}

/// An action that `lsrom` performs, which an error may be associated with.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Action {
  /// Reading a file, or looking something up in the address table.
  Loading,
  /// Decompressing a blockset.
  Decoding,
  /// Compressing a blockset.
  Encoding,
  /// Converting text into a blockset or address table.
  Parsing,
  /// Writing a file.
  Writing,
}

impl Action {
  fn describe(self) -> &'static str {
    match self {
      Self::Loading => "loading",
      Self::Decoding => "decoding",
      Self::Encoding => "encoding",
      Self::Parsing => "parsing",
      Self::Writing => "writing",
    }
  }
}

/// An error which can be described as a diagnostic.
#[derive(Debug)]
pub struct Error {
  kind: Kind,
  action: Action,
  cause: Cause,
}

impl Error {
  /// Creates a new `Error`.
  pub fn new(kind: impl Into<Kind>, action: Action, cause: Cause) -> Self {
    Self {
      kind: kind.into(),
      action,
      cause,
    }
  }

  /// Returns the underlying reason for this error.
  pub fn kind(&self) -> &Kind {
    &self.kind
  }

  /// Returns the action this error is associated with.
  pub fn action(&self) -> Action {
    self.action
  }

  /// Returns a `Cause` describing the input that resulted in the error.
  pub fn cause(&self) -> &Cause {
    &self.cause
  }

  /// Dumps this error as user-displayable text into `sink`.
  pub fn dump_to(&self, mut sink: impl io::Write) -> io::Result<()> {
    writeln!(sink, "error: {}", self.kind)?;
    writeln!(sink, "  while {} {}", self.action.describe(), self.cause)
  }

  /// Calls `dump_to()` on `stderr`, and exits the process with the given
  /// exit `code`.
  pub fn dump_and_die(&self, code: i32) -> ! {
    // If stderr is gone there is nowhere left to report to.
    let _ = self.dump_to(io::stderr());
    std::process::exit(code)
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.kind)
  }
}

impl error::Error for Error {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match &self.kind {
      Kind::Io(e) => Some(e),
      Kind::Codec(e) => Some(e),
      Kind::Csv(e) => Some(e),
      Kind::Offsets(e) => Some(e),
      Kind::Rom(e) => Some(e),
      Kind::Room(e) => Some(e),
      Kind::MissingLabel { .. } | Kind::UnknownRelease { .. } => None,
    }
  }
}

/// Extension methods for attaching an [`Action`] and [`Cause`] to a
/// `Result`.
///
/// [`Action`]: enum.Action.html
/// [`Cause`]: enum.Cause.html
pub trait Context<T> {
  /// Converts the error in this `Result` into an [`Error`], if there is one.
  ///
  /// [`Error`]: struct.Error.html
  fn context(self, action: Action, cause: impl FnOnce() -> Cause)
    -> Result<T, Error>;
}

impl<T, E: Into<Kind>> Context<T> for Result<T, E> {
  fn context(
    self,
    action: Action,
    cause: impl FnOnce() -> Cause,
  ) -> Result<T, Error> {
    self.map_err(|e| Error::new(e, action, cause()))
  }
}
