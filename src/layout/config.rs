//! Per-layout configuration: block order, widths, constants and labels

use crate::core::{ImageBox, ZeroQuantityPolicy};
use crate::error::{ManifestError, ManifestResult};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Sections of the manifest, emitted in the order the layout lists them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    /// Billing contact, order date, title band and sidebar boxes
    Header,
    ItemTableHeader,
    SoldItems,
    /// Separator row plus the order subtotal
    Subtotal,
    Shipping,
    Totals,
    VariantAttributes,
    GiftHeader,
    VariantGifts,
    SimpleGifts,
    Note,
}

impl Block {
    pub fn name(&self) -> &'static str {
        match self {
            Block::Header => "header",
            Block::ItemTableHeader => "item_table_header",
            Block::SoldItems => "sold_items",
            Block::Subtotal => "subtotal",
            Block::Shipping => "shipping",
            Block::Totals => "totals",
            Block::VariantAttributes => "variant_attributes",
            Block::GiftHeader => "gift_header",
            Block::VariantGifts => "variant_gifts",
            Block::SimpleGifts => "simple_gifts",
            Block::Note => "note",
        }
    }
}

/// Fixed texts of the sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub title: String,
    pub order_date: String,
    pub item: String,
    pub quantity: String,
    pub unit_price: String,
    pub amount: String,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub order_id: String,
    pub site_order_id: String,
    pub invoice: String,
    pub gift_divider: String,
    pub note: String,
    pub image_failed: String,
    pub invalid_quantity: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            title: "出貨明細表".to_string(),
            order_date: "訂單日期".to_string(),
            item: "品名".to_string(),
            quantity: "數量".to_string(),
            unit_price: "單價".to_string(),
            amount: "金額".to_string(),
            subtotal: "小計".to_string(),
            shipping: "運送方式".to_string(),
            total: "總計".to_string(),
            order_id: "訂單編號".to_string(),
            site_order_id: "官網編號".to_string(),
            invoice: "發票註記".to_string(),
            gift_divider: "-- 以下為贈品 --".to_string(),
            note: "備註".to_string(),
            image_failed: "image failed to load".to_string(),
            invalid_quantity: "數量錯誤".to_string(),
        }
    }
}

/// One manifest layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub name: String,
    /// Row of the item table header; the sidebar boxes hang off it too
    pub start_row: u32,
    /// Row of the title band (billing contact uses rows 1-4)
    pub title_row: u32,
    /// Number of columns the title band spans; the sidebar uses the last two
    pub table_width: u16,
    pub default_column_width: f64,
    /// Width overrides keyed by 1-based column index
    pub column_widths: BTreeMap<u16, f64>,
    pub blocks: Vec<Block>,
    /// Blank rows after the totals row
    pub section_gap: u32,
    /// Rows an image is assumed to cover
    pub rows_per_image: u32,
    /// Thumbnails are drawn in the value column (C), fitted into this box
    pub image_box: ImageBox,
    pub date_format: String,
    pub on_zero_quantity: ZeroQuantityPolicy,
    pub labels: Labels,
    /// Display names for metadata keys (`pa_size: 尺寸`)
    pub attribute_labels: BTreeMap<String, String>,
    /// Metadata keys left out of the variant details (`_reduced_stock`)
    pub hidden_meta_keys: BTreeSet<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl LayoutConfig {
    /// The full manifest: items, subtotal, variant details, gifts, note
    pub fn standard() -> Self {
        Self {
            name: "standard".to_string(),
            start_row: 7,
            title_row: 5,
            table_width: 8,
            default_column_width: 12.0,
            column_widths: BTreeMap::new(),
            blocks: vec![
                Block::Header,
                Block::ItemTableHeader,
                Block::SoldItems,
                Block::Subtotal,
                Block::Shipping,
                Block::Totals,
                Block::VariantAttributes,
                Block::GiftHeader,
                Block::VariantGifts,
                Block::SimpleGifts,
                Block::Note,
            ],
            section_gap: 2,
            rows_per_image: 5,
            image_box: ImageBox::default(),
            date_format: "%Y-%m-%d".to_string(),
            on_zero_quantity: ZeroQuantityPolicy::Abort,
            labels: Labels::default(),
            attribute_labels: BTreeMap::new(),
            hidden_meta_keys: BTreeSet::new(),
        }
    }

    /// Narrow sheet without the subtotal row; gifts come before variant details
    pub fn compact() -> Self {
        let mut column_widths = BTreeMap::new();
        column_widths.insert(1, 14.0);
        column_widths.insert(2, 14.0);
        Self {
            name: "compact".to_string(),
            table_width: 7,
            default_column_width: 10.0,
            column_widths,
            blocks: vec![
                Block::Header,
                Block::ItemTableHeader,
                Block::SoldItems,
                Block::Shipping,
                Block::Totals,
                Block::GiftHeader,
                Block::VariantGifts,
                Block::SimpleGifts,
                Block::VariantAttributes,
                Block::Note,
            ],
            section_gap: 1,
            image_box: ImageBox {
                width: 160.0,
                height: 80.0,
            },
            ..Self::standard()
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::standard()),
            "compact" => Some(Self::compact()),
            _ => None,
        }
    }

    pub fn preset_names() -> &'static [&'static str] {
        &["standard", "compact"]
    }

    /// Width of a 1-based column
    pub fn column_width(&self, col: u16) -> f64 {
        self.column_widths
            .get(&col)
            .copied()
            .unwrap_or(self.default_column_width)
    }

    /// First of the two sidebar columns
    pub fn sidebar_col(&self) -> u16 {
        self.table_width - 1
    }

    pub fn validate(&self) -> ManifestResult<()> {
        if self.title_row < 5 {
            return Err(ManifestError::Layout(format!(
                "title_row {} overlaps the billing rows 1-4",
                self.title_row
            )));
        }
        if self.start_row <= self.title_row {
            return Err(ManifestError::Layout(format!(
                "start_row {} must come after title_row {}",
                self.start_row, self.title_row
            )));
        }
        if self.table_width < 7 {
            return Err(ManifestError::Layout(format!(
                "table_width {} leaves no room for the sidebar (minimum 7)",
                self.table_width
            )));
        }
        if !(self.image_box.width > 0.0 && self.image_box.height > 0.0) {
            return Err(ManifestError::Layout(
                "image_box must have a positive width and height".to_string(),
            ));
        }

        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ManifestError::Layout(format!(
                "invalid date_format '{}'",
                self.date_format
            )));
        }

        let mut seen = HashSet::new();
        for block in &self.blocks {
            if !seen.insert(block) {
                return Err(ManifestError::Layout(format!(
                    "block '{}' listed more than once",
                    block.name()
                )));
            }
        }

        let position = |wanted: Block| self.blocks.iter().position(|b| *b == wanted);
        if let Some(totals) = position(Block::Totals) {
            match position(Block::ItemTableHeader) {
                Some(header) if header < totals => {}
                _ => {
                    return Err(ManifestError::Layout(
                        "totals must follow item_table_header".to_string(),
                    ))
                }
            }
        }

        Ok(())
    }
}
