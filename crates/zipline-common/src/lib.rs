//! Common utilities for zipline.
//!
//! This crate provides the binary-layout primitives shared by the zipline crates:
//!
//! - [`BinaryReader`] - Bounds-checked little-endian reading from byte slices
//! - [`crc`] - CRC32 (IEEE) hashing as used by the ZIP format

mod error;
mod reader;

pub mod crc;

pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
