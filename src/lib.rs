//! Glyphscape library
//!
//! An endless, side-scrolling isometric landscape drawn in text glyphs.
//! Re-exports modules for use by binaries and tools.

pub mod assets;
pub mod biomes;
pub mod catalog;
pub mod config;
pub mod driver;
pub mod error;
pub mod glyphs;
pub mod heightmap;
pub mod noise_field;
pub mod page_cache;
pub mod placement;
pub mod render;
pub mod seeds;
pub mod session;
pub mod sink;
pub mod smoothing;
pub mod snapshot;
pub mod tilemap;
pub mod viewer;
pub mod weather;
