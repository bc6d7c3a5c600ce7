//! Excel exporter implementation - grid operations → .xlsx

use crate::error::{ManifestError, ManifestResult};
use crate::grid::{
    CellRange, CellRef, CellValue, GridOperations, GridSurface, ImageAnchor, Style,
};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Image, Workbook, Worksheet};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Download name the host should offer for an order's manifest
pub fn manifest_filename(order_id: u64) -> String {
    format!("order-{}.xlsx", order_id)
}

/// Accumulated style of one cell
#[derive(Debug, Clone, Default, PartialEq)]
struct CellStyle {
    border_top: bool,
    border_bottom: bool,
    border_left: bool,
    border_right: bool,
    align_left: bool,
    align_center: bool,
    vertical_center: bool,
    wrap: bool,
    text_format: bool,
    font_size: Option<f64>,
}

impl CellStyle {
    fn apply(&mut self, style: &Style, cell: CellRef, range: &CellRange) {
        match style {
            Style::AllBorders => {
                self.border_top = true;
                self.border_bottom = true;
                self.border_left = true;
                self.border_right = true;
            }
            Style::OutlineBorder => {
                self.border_top |= cell.row == range.first.row;
                self.border_bottom |= cell.row == range.last.row;
                self.border_left |= cell.col == range.first.col;
                self.border_right |= cell.col == range.last.col;
            }
            Style::AlignLeft => {
                self.align_left = true;
                self.align_center = false;
            }
            Style::AlignCenter => {
                self.align_center = true;
                self.align_left = false;
            }
            Style::VerticalCenter => self.vertical_center = true,
            Style::WrapText => self.wrap = true,
            Style::ForceText => self.text_format = true,
            Style::FontSize(size) => self.font_size = Some(*size),
        }
    }

    fn to_format(&self) -> Format {
        let mut format = Format::new();
        if self.border_top {
            format = format.set_border_top(FormatBorder::Thin);
        }
        if self.border_bottom {
            format = format.set_border_bottom(FormatBorder::Thin);
        }
        if self.border_left {
            format = format.set_border_left(FormatBorder::Thin);
        }
        if self.border_right {
            format = format.set_border_right(FormatBorder::Thin);
        }
        if self.align_left {
            format = format.set_align(FormatAlign::Left);
        }
        if self.align_center {
            format = format.set_align(FormatAlign::Center);
        }
        if self.vertical_center {
            format = format.set_align(FormatAlign::VerticalCenter);
        }
        if self.wrap {
            format = format.set_text_wrap();
        }
        if self.text_format {
            format = format.set_num_format("@");
        }
        if let Some(size) = self.font_size {
            format = format.set_font_size(size);
        }
        format
    }
}

/// In-memory sheet built from surface calls, flushed into a worksheet at the end
#[derive(Debug, Default)]
struct SheetModel {
    values: BTreeMap<CellRef, CellValue>,
    styles: BTreeMap<CellRef, CellStyle>,
    merges: Vec<CellRange>,
    images: Vec<ImageAnchor>,
    column_widths: BTreeMap<u16, f64>,
}

impl GridSurface for SheetModel {
    fn set_value(&mut self, cell: CellRef, value: CellValue) {
        self.values.insert(cell, value);
    }

    fn merge(&mut self, range: CellRange) {
        if !range.is_single_cell() {
            self.merges.push(range);
        }
    }

    fn apply_style(&mut self, range: CellRange, style: Style) {
        for cell in range.cells() {
            self.styles
                .entry(cell)
                .or_default()
                .apply(&style, cell, &range);
        }
    }

    fn place_image(&mut self, image: ImageAnchor) {
        self.images.push(image);
    }

    fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }
}

fn export_err(what: &str, e: impl std::fmt::Display) -> ManifestError {
    ManifestError::Export(format!("Failed to {}: {}", what, e))
}

/// Zero-based worksheet coordinates of a grid cell
fn position(cell: CellRef) -> (u32, u16) {
    (cell.row.saturating_sub(1), cell.col.saturating_sub(1))
}

impl SheetModel {
    fn format_at(&self, cell: CellRef) -> Format {
        self.styles
            .get(&cell)
            .map(CellStyle::to_format)
            .unwrap_or_else(Format::new)
    }

    fn write(&self, worksheet: &mut Worksheet) -> ManifestResult<()> {
        for (col, width) in &self.column_widths {
            worksheet
                .set_column_width(col.saturating_sub(1), *width)
                .map_err(|e| export_err("set column width", e))?;
        }

        for range in &self.merges {
            self.write_merge(worksheet, range)?;
        }

        // Every other cell that has a value or a style
        let mut cells: Vec<CellRef> = self.values.keys().chain(self.styles.keys()).copied().collect();
        cells.sort();
        cells.dedup();
        for cell in cells {
            if self.merges.iter().any(|m| m.contains(cell)) {
                continue;
            }
            self.write_cell(worksheet, cell)?;
        }

        for image in &self.images {
            self.insert_image(worksheet, image)?;
        }

        Ok(())
    }

    fn write_merge(&self, worksheet: &mut Worksheet, range: &CellRange) -> ManifestResult<()> {
        let (first_row, first_col) = position(range.first);
        let (last_row, last_col) = position(range.last);
        let format = self.format_at(range.first);
        let text = match self.values.get(&range.first) {
            Some(CellValue::Text(text)) => text.as_str(),
            _ => "",
        };

        worksheet
            .merge_range(first_row, first_col, last_row, last_col, text, &format)
            .map_err(|e| export_err(&format!("merge {}", range), e))?;

        if let Some(CellValue::Number(n)) = self.values.get(&range.first) {
            worksheet
                .write_number_with_format(first_row, first_col, *n, &format)
                .map_err(|e| export_err("write number", e))?;
        }

        // Border sides differ per cell inside a merged region
        for cell in range.cells().skip(1) {
            let (row, col) = position(cell);
            worksheet
                .write_blank(row, col, &self.format_at(cell))
                .map_err(|e| export_err("write blank", e))?;
        }

        Ok(())
    }

    fn write_cell(&self, worksheet: &mut Worksheet, cell: CellRef) -> ManifestResult<()> {
        let (row, col) = position(cell);
        let format = self.format_at(cell);
        match self.values.get(&cell) {
            Some(CellValue::Text(text)) => worksheet
                .write_string_with_format(row, col, text, &format)
                .map(|_| ())
                .map_err(|e| export_err("write text", e)),
            Some(CellValue::Number(n)) => worksheet
                .write_number_with_format(row, col, *n, &format)
                .map(|_| ())
                .map_err(|e| export_err("write number", e)),
            None => worksheet
                .write_blank(row, col, &format)
                .map(|_| ())
                .map_err(|e| export_err("write blank", e)),
        }
    }

    /// A missing image file is skipped; the rest of the sheet still exports
    fn insert_image(&self, worksheet: &mut Worksheet, anchor: &ImageAnchor) -> ManifestResult<()> {
        let image = match Image::new(&anchor.path) {
            Ok(image) => image,
            Err(e) => {
                warn!(path = %anchor.path.display(), error = %e, "skipping image");
                return Ok(());
            }
        };

        let scale_width = f64::from(anchor.width) / image.width();
        let scale_height = f64::from(anchor.height) / image.height();
        let image = image
            .set_scale_width(scale_width)
            .set_scale_height(scale_height);

        let (row, col) = position(anchor.cell);
        worksheet
            .insert_image_with_offset(row, col, &image, anchor.offset_x, anchor.offset_y)
            .map_err(|e| export_err("insert image", e))?;
        Ok(())
    }
}

/// Excel exporter for composed manifests
pub struct ExcelExporter {
    ops: GridOperations,
    sheet_name: String,
}

impl ExcelExporter {
    /// Create a new Excel exporter
    pub fn new(ops: GridOperations) -> Self {
        Self {
            ops,
            sheet_name: "Manifest".to_string(),
        }
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Export the manifest to an Excel .xlsx file
    pub fn export(&self, output_path: &Path) -> ManifestResult<()> {
        let mut workbook = self.build_workbook()?;
        workbook
            .save(output_path)
            .map_err(|e| ManifestError::Export(format!("Failed to save Excel file: {}", e)))?;
        debug!(path = %output_path.display(), "saved manifest");
        Ok(())
    }

    /// Serialize the manifest to .xlsx bytes
    pub fn to_buffer(&self) -> ManifestResult<Vec<u8>> {
        let mut workbook = self.build_workbook()?;
        workbook
            .save_to_buffer()
            .map_err(|e| ManifestError::Export(format!("Failed to serialize workbook: {}", e)))
    }

    fn build_workbook(&self) -> ManifestResult<Workbook> {
        let mut sheet = SheetModel::default();
        self.ops.replay(&mut sheet);

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&self.sheet_name)
            .map_err(|e| export_err("set worksheet name", e))?;

        sheet.write(worksheet)?;
        Ok(workbook)
    }
}
