//! Order Manifest - shipping manifest compositor for commerce orders
//!
//! This library turns one order snapshot into a single-page, grid-based
//! shipping manifest and writes it as an Excel workbook.
//!
//! # Features
//!
//! - Sold items, subtotal, shipping and totals in one bordered table
//! - Variant details with inline, aspect-fitted product thumbnails
//! - Gift summary aggregated by product, attribute and value
//! - Layouts as configuration: built-in presets or YAML files
//! - Abstract grid surface: compose once, replay into .xlsx or inspect as JSON
//!
//! # Example
//!
//! ```no_run
//! use order_manifest::excel::{manifest_filename, ExcelExporter};
//! use order_manifest::layout::{compose_manifest, LayoutConfig};
//! use order_manifest::parser::parse_order;
//! use std::path::Path;
//!
//! let order = parse_order(Path::new("order.yaml"))?;
//! let ops = compose_manifest(&order, &LayoutConfig::standard())?;
//!
//! println!("Operations: {}", ops.len());
//!
//! let output = manifest_filename(order.id);
//! ExcelExporter::new(ops).export(Path::new(&output))?;
//! # Ok::<(), order_manifest::error::ManifestError>(())
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod excel;
pub mod grid;
pub mod layout;
pub mod parser;
pub mod types;

// Re-export commonly used types
pub use error::{ManifestError, ManifestResult};
pub use grid::{GridOperations, GridSurface};
pub use layout::{compose_manifest, LayoutConfig};
pub use types::{Attribute, LineItem, Order, VariantGroup};
