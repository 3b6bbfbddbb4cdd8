//! lsrom, a toolkit for reading and rewriting the blocksets in Landstalker
//! ROM images.
//!
//! The crate is split into a few layers:
//! - [`tile`] and [`blockset`] model room graphics, and provide the
//!   compressed ROM encoding and a textual interchange format for them.
//! - [`offsets`] records where each structure lives in each regional release.
//! - [`rom`] and [`room`] tie the two together over an actual ROM image.
//!
//! [`tile`]: tile/index.html
//! [`blockset`]: blockset/index.html
//! [`offsets`]: offsets/index.html
//! [`rom`]: rom/index.html
//! [`room`]: room/index.html

#![deny(missing_docs)]
#![deny(unused)]
#![deny(warnings)]
#![deny(unsafe_code)]

pub mod blockset;
pub mod error;
pub mod offsets;
pub mod rom;
pub mod room;
pub mod tile;
