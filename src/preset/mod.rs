//! # Paper Preset Module
//!
//! Static catalog of physical output formats. Every consumer (layout,
//! render surface, composer) reads card geometry, typography and pagination
//! from here instead of carrying its own copy.
//!
//! ## Modules
//!
//! - [`catalog`]: The preset table and key lookup

pub mod catalog;

pub use catalog::{
    BorderStyle, ClampPolicy, FlowDirection, Grid, Orientation, PaperKey, PaperPreset, Spacing,
    Typography, mm_to_px, mm_to_pt,
};
