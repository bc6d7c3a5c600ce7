//! Excel reader - dumps the cells of a written manifest

use crate::error::{ManifestError, ManifestResult};
use crate::grid::{CellRef, CellValue};
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;

/// Reads back the first worksheet of an .xlsx file
pub struct ManifestReader {
    path: std::path::PathBuf,
}

impl ManifestReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Non-empty cells in row-major order, with 1-based addresses
    pub fn read_cells(&self) -> ManifestResult<Vec<(CellRef, CellValue)>> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path)
            .map_err(|e| ManifestError::Import(format!("Failed to open Excel file: {}", e)))?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ManifestError::Import("Workbook has no worksheets".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ManifestError::Import(format!("Failed to read '{}': {}", sheet_name, e)))?;

        // Ranges start at the first used cell, not at A1
        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));

        let mut cells = Vec::new();
        for (row, col, data) in range.used_cells() {
            let value = match data {
                Data::String(s) if !s.is_empty() => CellValue::Text(s.clone()),
                Data::Float(f) => CellValue::Number(*f),
                Data::Int(i) => CellValue::Number(*i as f64),
                Data::Bool(b) => CellValue::Text(b.to_string()),
                _ => continue,
            };
            let cell = CellRef::new(
                (col as u32 + col_offset + 1) as u16,
                row as u32 + row_offset + 1,
            );
            cells.push((cell, value));
        }

        Ok(cells)
    }

    /// Value at a 1-based address
    pub fn value_at(&self, cell: CellRef) -> ManifestResult<Option<CellValue>> {
        Ok(self
            .read_cells()?
            .into_iter()
            .find(|(c, _)| *c == cell)
            .map(|(_, value)| value))
    }
}
