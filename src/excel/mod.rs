//! Excel output for composed manifests
//!
//! - Export: grid operations → .xlsx (rust_xlsxwriter)
//! - Read-back: .xlsx → cell dump (calamine), for `inspect` and tests

mod exporter;
mod importer;

pub use exporter::{manifest_filename, ExcelExporter};
pub use importer::ManifestReader;
