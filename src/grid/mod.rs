//! Abstract grid surface the compositor writes into
//!
//! Coordinates are spreadsheet-style and 1-based: column 1 is `A`, row 1 is
//! the first row. Surfaces translate to their own addressing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A single cell address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub col: u16,
    pub row: u32,
}

impl CellRef {
    pub fn new(col: u16, row: u32) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.col), self.row)
    }
}

/// Inclusive rectangular range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub first: CellRef,
    pub last: CellRef,
}

impl CellRange {
    /// Build a range from two corners in any order
    pub fn new(first_col: u16, first_row: u32, last_col: u16, last_row: u32) -> Self {
        Self {
            first: CellRef::new(first_col.min(last_col), first_row.min(last_row)),
            last: CellRef::new(first_col.max(last_col), first_row.max(last_row)),
        }
    }

    /// Columns `first_col..=last_col` of a single row
    pub fn row_span(row: u32, first_col: u16, last_col: u16) -> Self {
        Self::new(first_col, row, last_col, row)
    }

    pub fn cell(cell: CellRef) -> Self {
        Self {
            first: cell,
            last: cell,
        }
    }

    pub fn is_single_cell(&self) -> bool {
        self.first == self.last
    }

    pub fn contains(&self, cell: CellRef) -> bool {
        (self.first.col..=self.last.col).contains(&cell.col)
            && (self.first.row..=self.last.row).contains(&cell.row)
    }

    /// All cells, row by row
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.first.row..=self.last.row).flat_map(move |row| {
            (self.first.col..=self.last.col).map(move |col| CellRef::new(col, row))
        })
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}:{}", self.first, self.last)
        }
    }
}

/// Convert a 1-based column index to letters (1 → A, 27 → AA)
pub fn column_letter(col: u16) -> String {
    let mut result = String::new();
    let mut idx = col.max(1) as usize - 1;

    loop {
        let remainder = idx % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }

    result
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            CellValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => write!(f, "{:?}", text),
            CellValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Named styles a surface knows how to apply to a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    /// Thin border around every cell
    AllBorders,
    /// Thin border around the range only
    OutlineBorder,
    AlignLeft,
    AlignCenter,
    VerticalCenter,
    WrapText,
    /// Text number format, so ids and phone numbers keep leading zeros
    ForceText,
    FontSize(f64),
}

/// An image anchored at a cell, drawn at an explicit size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnchor {
    pub cell: CellRef,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

/// The sink the compositor writes into
pub trait GridSurface {
    fn set_value(&mut self, cell: CellRef, value: CellValue);
    fn merge(&mut self, range: CellRange);
    fn apply_style(&mut self, range: CellRange, style: Style);
    fn place_image(&mut self, image: ImageAnchor);
    fn set_column_width(&mut self, col: u16, width: f64);
}

/// One recorded surface call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GridOp {
    SetValue { cell: CellRef, value: CellValue },
    Merge { range: CellRange },
    Style { range: CellRange, style: Style },
    PlaceImage { image: ImageAnchor },
    ColumnWidth { col: u16, width: f64 },
}

impl fmt::Display for GridOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridOp::SetValue { cell, value } => write!(f, "set    {:<8} {}", cell, value),
            GridOp::Merge { range } => write!(f, "merge  {}", range),
            GridOp::Style { range, style } => write!(f, "style  {:<8} {:?}", range, style),
            GridOp::PlaceImage { image } => write!(
                f,
                "image  {:<8} {} {}x{} +{}+{}",
                image.cell,
                image.path.display(),
                image.width,
                image.height,
                image.offset_x,
                image.offset_y
            ),
            GridOp::ColumnWidth { col, width } => {
                write!(f, "width  {:<8} {}", column_letter(*col), width)
            }
        }
    }
}

/// Ordered list of grid operations; records any surface calls made on it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridOperations {
    ops: Vec<GridOp>,
}

impl GridOperations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[GridOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn append(&mut self, other: GridOperations) {
        self.ops.extend(other.ops);
    }

    /// Replay every operation, in order, into another surface
    pub fn replay<S: GridSurface + ?Sized>(&self, surface: &mut S) {
        for op in &self.ops {
            match op {
                GridOp::SetValue { cell, value } => surface.set_value(*cell, value.clone()),
                GridOp::Merge { range } => surface.merge(*range),
                GridOp::Style { range, style } => surface.apply_style(*range, style.clone()),
                GridOp::PlaceImage { image } => surface.place_image(image.clone()),
                GridOp::ColumnWidth { col, width } => surface.set_column_width(*col, *width),
            }
        }
    }

    /// Last value written to a cell
    pub fn value_at(&self, cell: CellRef) -> Option<&CellValue> {
        self.ops.iter().rev().find_map(|op| match op {
            GridOp::SetValue { cell: c, value } if *c == cell => Some(value),
            _ => None,
        })
    }

    /// Text cells in write order, with their address
    pub fn texts(&self) -> impl Iterator<Item = (CellRef, &str)> + '_ {
        self.ops.iter().filter_map(|op| match op {
            GridOp::SetValue {
                cell,
                value: CellValue::Text(text),
            } => Some((*cell, text.as_str())),
            _ => None,
        })
    }

    /// First cell holding exactly this text
    pub fn find_text(&self, needle: &str) -> Option<CellRef> {
        self.texts()
            .find(|(_, text)| *text == needle)
            .map(|(cell, _)| cell)
    }

    pub fn merges(&self) -> impl Iterator<Item = CellRange> + '_ {
        self.ops.iter().filter_map(|op| match op {
            GridOp::Merge { range } => Some(*range),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageAnchor> + '_ {
        self.ops.iter().filter_map(|op| match op {
            GridOp::PlaceImage { image } => Some(image),
            _ => None,
        })
    }

    /// Highest row touched by any cell, merge, style or image
    pub fn max_row(&self) -> u32 {
        self.ops
            .iter()
            .map(|op| match op {
                GridOp::SetValue { cell, .. } => cell.row,
                GridOp::Merge { range } | GridOp::Style { range, .. } => range.last.row,
                GridOp::PlaceImage { image } => image.cell.row,
                GridOp::ColumnWidth { .. } => 0,
            })
            .max()
            .unwrap_or(0)
    }
}

impl GridSurface for GridOperations {
    fn set_value(&mut self, cell: CellRef, value: CellValue) {
        self.ops.push(GridOp::SetValue { cell, value });
    }

    fn merge(&mut self, range: CellRange) {
        self.ops.push(GridOp::Merge { range });
    }

    fn apply_style(&mut self, range: CellRange, style: Style) {
        self.ops.push(GridOp::Style { range, style });
    }

    fn place_image(&mut self, image: ImageAnchor) {
        self.ops.push(GridOp::PlaceImage { image });
    }

    fn set_column_width(&mut self, col: u16, width: f64) {
        self.ops.push(GridOp::ColumnWidth { col, width });
    }
}
