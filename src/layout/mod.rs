//! Manifest layout: configuration and the block compositor

mod compositor;
mod config;

pub use compositor::{compose_manifest, GridCompositor};
pub use config::{Block, LayoutConfig, Labels};
