//! Binary codecs for the Micro Mages ROM image.
//!
//! [`RomData::read`] parses a vanilla 0xA010-byte `.nes` image into an
//! editable model; [`RomData::commit`] re-encodes the model onto a pristine
//! copy of that image. Each submodule is a self-contained codec for one of
//! the ROM's packed data formats.

pub mod bitstream;
pub mod chr;
pub mod hardmode;
pub mod layout;
pub mod level;
pub mod mapper;
pub mod mods;
pub mod music;
pub mod objectcfg;
pub mod objects;
pub mod rom;
pub mod tables;
pub mod text;
pub mod title;
pub mod unitile;
pub mod world;

pub use rom::{CommitErrors, RomData, RomError};
