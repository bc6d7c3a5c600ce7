//! Manifest layout tests
//!
//! Composes the fixture orders under test-data/ and checks where blocks land,
//! what they contain and which ones are skipped.

use order_manifest::core::ZeroQuantityPolicy;
use order_manifest::error::ManifestError;
use order_manifest::grid::{CellRange, CellRef, CellValue, GridOperations};
use order_manifest::layout::{compose_manifest, Block, LayoutConfig};
use order_manifest::parser::{parse_layout, parse_order};
use order_manifest::types::{LineItem, Order};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test-data")
        .join(name)
}

fn order(name: &str) -> Order {
    parse_order(&fixture(name)).unwrap()
}

fn compose(order: &Order) -> GridOperations {
    compose_manifest(order, &LayoutConfig::standard()).unwrap()
}

fn cell(col: char, row: u32) -> CellRef {
    CellRef::new(col as u16 - 'A' as u16 + 1, row)
}

fn text(ops: &GridOperations, col: char, row: u32) -> Option<String> {
    ops.value_at(cell(col, row))
        .and_then(CellValue::as_text)
        .map(str::to_string)
}

fn number(ops: &GridOperations, col: char, row: u32) -> Option<f64> {
    ops.value_at(cell(col, row)).and_then(CellValue::as_number)
}

// ═══════════════════════════════════════════════════════════════════════════
// HEADER
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_header_contact_and_sidebar() {
    let ops = compose(&order("order_basic.yaml"));

    assert_eq!(text(&ops, 'A', 1).as_deref(), Some("王小明"));
    assert_eq!(text(&ops, 'A', 2).as_deref(), Some("100 台北市中山路 1 號"));
    assert_eq!(text(&ops, 'A', 3).as_deref(), Some("0912345678"));
    assert_eq!(text(&ops, 'A', 4).as_deref(), Some("ming@example.com"));

    assert_eq!(text(&ops, 'G', 1).as_deref(), Some("訂單日期"));
    assert_eq!(text(&ops, 'H', 1).as_deref(), Some("2024-05-01"));
    assert_eq!(text(&ops, 'A', 5).as_deref(), Some("出貨明細表"));

    assert_eq!(text(&ops, 'G', 7).as_deref(), Some("訂單編號"));
    assert_eq!(text(&ops, 'G', 8).as_deref(), Some("1042"));
    assert_eq!(text(&ops, 'G', 11).as_deref(), Some("貨到付款"));
    assert_eq!(text(&ops, 'G', 14).as_deref(), Some("發票註記"));
    assert_eq!(text(&ops, 'G', 15).as_deref(), Some("小明貿易有限公司 12345678"));

    let merges: Vec<CellRange> = ops.merges().collect();
    assert!(merges.contains(&CellRange::row_span(5, 1, 8)));
    assert!(merges.contains(&CellRange::new(7, 8, 7, 9)));
    assert!(merges.contains(&CellRange::new(7, 11, 8, 12)));
}

// ═══════════════════════════════════════════════════════════════════════════
// ITEM TABLE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_sold_items_sorted_with_unit_price() {
    let ops = compose(&order("order_basic.yaml"));

    assert_eq!(text(&ops, 'A', 7).as_deref(), Some("品名"));
    assert_eq!(text(&ops, 'A', 8).as_deref(), Some("Cup"));
    assert_eq!(text(&ops, 'A', 9).as_deref(), Some("Tea"));

    // 100 / 3 truncates
    assert_eq!(number(&ops, 'D', 8), Some(33.0));
    assert_eq!(number(&ops, 'D', 9), Some(100.0));
    assert_eq!(number(&ops, 'C', 9), Some(3.0));
}

#[test]
fn test_subtotal_shipping_totals_rows() {
    let ops = compose(&order("order_basic.yaml"));

    assert_eq!(text(&ops, 'A', 11).as_deref(), Some("小計"));
    assert_eq!(number(&ops, 'E', 11), Some(400.0));
    assert_eq!(text(&ops, 'A', 12).as_deref(), Some("運送方式: 宅配"));
    assert_eq!(number(&ops, 'E', 12), Some(100.0));
    assert_eq!(text(&ops, 'A', 13).as_deref(), Some("總計"));
    assert_eq!(number(&ops, 'E', 13), Some(500.0));
}

#[test]
fn test_sold_totals_and_shipping_add_up() {
    let order = order("order_basic.yaml");
    let ops = compose(&order);

    let sold: f64 = (8..=9).filter_map(|r| number(&ops, 'E', r)).sum();
    let shipping = number(&ops, 'E', 12).unwrap();
    assert_eq!(sold + shipping, number(&ops, 'E', 13).unwrap());
    assert_eq!(sold + shipping, order.total);
}

#[test]
fn test_br_markup_becomes_line_break() {
    let ops = compose(&order("order_basic.json"));
    assert!(ops.find_text("Pencil\nHB").is_some());
}

#[test]
fn test_no_shipping_line_skips_row() {
    let ops = compose(&order("order_basic.json"));

    // header 7, two items, subtotal 10-11, totals straight after
    assert_eq!(text(&ops, 'A', 12).as_deref(), Some("總計"));
    assert!(!ops.texts().any(|(_, t)| t.starts_with("運送方式")));
}

// ═══════════════════════════════════════════════════════════════════════════
// CONDITIONAL BLOCKS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_no_gifts_note_follows_totals() {
    let ops = compose(&order("order_basic.yaml"));
    let labels = LayoutConfig::standard().labels;

    let totals = ops.find_text(&labels.total).unwrap();
    let note = ops.find_text(&labels.note).unwrap();
    assert_eq!(note.row, totals.row + 3);
    assert_eq!(text(&ops, 'A', note.row + 1).as_deref(), Some("請於下午送達"));
    assert!(ops.find_text(&labels.gift_divider).is_none());
}

#[test]
fn test_empty_order() {
    let ops = compose(&order("order_empty.yaml"));

    assert_eq!(text(&ops, 'A', 7).as_deref(), Some("品名"));
    assert_eq!(text(&ops, 'A', 9).as_deref(), Some("小計"));
    assert_eq!(number(&ops, 'E', 9), Some(0.0));
    assert_eq!(text(&ops, 'A', 10).as_deref(), Some("總計"));
    assert_eq!(number(&ops, 'E', 10), Some(0.0));
    assert_eq!(text(&ops, 'A', 13).as_deref(), Some("備註"));
    assert_eq!(ops.images().count(), 0);
    assert!(ops.find_text("-- 以下為贈品 --").is_none());
}

#[test]
fn test_gift_sections() {
    let ops = compose(&order("order_gifts.yaml"));

    // Sold variant details
    assert_eq!(text(&ops, 'A', 16).as_deref(), Some("Shirt"));
    assert_eq!(text(&ops, 'A', 17).as_deref(), Some("size"));
    assert_eq!(text(&ops, 'C', 17).as_deref(), Some("M"));
    assert_eq!(text(&ops, 'A', 18).as_deref(), Some("color"));
    assert_eq!(text(&ops, 'C', 18).as_deref(), Some("Blue"));

    // Divider after a blank row
    assert_eq!(text(&ops, 'A', 21).as_deref(), Some("-- 以下為贈品 --"));

    // Variant gifts summed and ordered 2, 10, Free
    assert_eq!(text(&ops, 'A', 22).as_deref(), Some("Sock"));
    assert_eq!(text(&ops, 'A', 23).as_deref(), Some("size"));
    assert_eq!(text(&ops, 'C', 23).as_deref(), Some("數量"));
    let values: Vec<(String, f64)> = (24..=26)
        .map(|r| (text(&ops, 'A', r).unwrap(), number(&ops, 'C', r).unwrap()))
        .collect();
    assert_eq!(
        values,
        vec![
            ("2".to_string(), 4.0),
            ("10".to_string(), 5.0),
            ("Free".to_string(), 1.0),
        ]
    );

    // Simple gifts
    assert_eq!(text(&ops, 'A', 28).as_deref(), Some("品名"));
    assert_eq!(text(&ops, 'A', 29).as_deref(), Some("Sticker"));
    assert_eq!(number(&ops, 'C', 29), Some(5.0));

    assert_eq!(text(&ops, 'A', 31).as_deref(), Some("備註"));
}

#[test]
fn test_gifts_stay_out_of_item_table() {
    let ops = compose(&order("order_gifts.yaml"));

    assert_eq!(text(&ops, 'A', 8).as_deref(), Some("Hat"));
    assert_eq!(text(&ops, 'A', 9).as_deref(), Some("Shirt"));
    assert_eq!(text(&ops, 'A', 10), None);
    assert_eq!(number(&ops, 'D', 9), Some(500.0));
}

// ═══════════════════════════════════════════════════════════════════════════
// SORTING AND METADATA
// ═══════════════════════════════════════════════════════════════════════════

fn last_row_of(ops: &GridOperations, value: &str) -> u32 {
    ops.texts()
        .filter(|(_, t)| *t == value)
        .map(|(c, _)| c.row)
        .max()
        .unwrap()
}

fn order_with_items(items: Vec<LineItem>) -> Order {
    let mut order = Order::new(6001);
    for item in items {
        order.subtotal += item.total;
        order.add_item(item);
    }
    order.total = order.subtotal;
    order
}

#[test]
fn test_variant_details_sorted_by_name() {
    let order = order_with_items(vec![
        LineItem::variant("Zed", 1, 100.0).with_meta("pa_size", json!("L")),
        LineItem::variant("Alpha", 1, 200.0).with_meta("pa_size", json!("S")),
    ]);
    let ops = compose(&order);

    assert_eq!(text(&ops, 'A', 8).as_deref(), Some("Alpha"));
    assert_eq!(text(&ops, 'A', 9).as_deref(), Some("Zed"));

    let alpha = last_row_of(&ops, "Alpha");
    let zed = last_row_of(&ops, "Zed");
    assert!(alpha > 9);
    assert!(alpha < zed);
    assert_eq!(text(&ops, 'C', alpha + 1).as_deref(), Some("S"));
    assert_eq!(text(&ops, 'C', zed + 1).as_deref(), Some("L"));
}

#[test]
fn test_simple_gifts_sorted_by_name() {
    let order = order_with_items(vec![
        LineItem::new("Tea", 1, 300.0),
        LineItem::new("Zed", 2, 0.0),
        LineItem::new("Alpha", 3, 0.0),
    ]);
    let ops = compose(&order);

    let alpha = ops.find_text("Alpha").unwrap();
    let zed = ops.find_text("Zed").unwrap();
    assert!(alpha.row < zed.row);
    assert_eq!(number(&ops, 'C', alpha.row), Some(3.0));
    assert_eq!(number(&ops, 'C', zed.row), Some(2.0));
}

#[test]
fn test_underscore_metadata_shown_unless_hidden() {
    let order = order_with_items(vec![
        LineItem::variant("Pen", 1, 80.0).with_meta("_engraving", json!("Ada"))
    ]);

    let ops = compose(&order);
    let label = ops.find_text("_engraving").unwrap();
    assert_eq!(text(&ops, 'C', label.row).as_deref(), Some("Ada"));

    let layout = LayoutConfig {
        hidden_meta_keys: BTreeSet::from(["_engraving".to_string()]),
        ..LayoutConfig::standard()
    };
    let ops = compose_manifest(&order, &layout).unwrap();
    assert!(ops.find_text("_engraving").is_none());
    assert!(ops.find_text("Ada").is_none());
    assert!(ops.find_text("Pen").is_some());
}

// ═══════════════════════════════════════════════════════════════════════════
// IMAGES
// ═══════════════════════════════════════════════════════════════════════════

fn order_with_upload(path: &Path) -> Order {
    let mut order = Order::new(5001);
    order.add_item(
        LineItem::variant("Mug", 1, 350.0)
            .with_meta(
                "_custom_fields",
                json!([
                    {"title": "Logo", "type": "file", "_value": {
                        "name": "logo.png",
                        "tmp_name": path.to_str().unwrap(),
                        "type": "image/png"
                    }},
                    {"title": "Engraving", "type": "text", "_value": "For Ada"},
                    {"title": "Receipt", "type": "file", "_value": {"name": "receipt.pdf", "tmp_name": "/tmp/r.pdf"}}
                ]),
            ),
    );
    order.subtotal = 350.0;
    order.total = 350.0;
    order
}

#[test]
fn test_image_fitted_and_rows_reserved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logo.png");
    image::RgbImage::new(400, 100).save(&path).unwrap();

    let ops = compose(&order_with_upload(&path));

    let images: Vec<_> = ops.images().collect();
    assert_eq!(images.len(), 1);
    let anchor = images[0];
    assert_eq!((anchor.width, anchor.height), (200, 50));
    assert_eq!(anchor.cell, cell('C', 15));
    assert_eq!((anchor.offset_x, anchor.offset_y), (0, 0));

    assert_eq!(text(&ops, 'A', 14).as_deref(), Some("Mug"));
    assert_eq!(text(&ops, 'A', 15).as_deref(), Some("Logo"));
    assert_eq!(text(&ops, 'C', 16).as_deref(), Some("For Ada"));
    assert!(ops.find_text("Receipt").is_none());

    // 2 attribute rows, 5 rows per image -> 3 extra, then the spacer
    assert_eq!(text(&ops, 'A', 21).as_deref(), Some("備註"));
}

#[test]
fn test_missing_image_degrades_to_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gone.png");

    let ops = compose(&order_with_upload(&path));

    assert_eq!(ops.images().count(), 0);
    let expected = format!("image failed to load: {}", path.display());
    assert_eq!(text(&ops, 'C', 15), Some(expected));
    // no rows reserved for an image that was not placed
    assert_eq!(text(&ops, 'A', 18).as_deref(), Some("備註"));
}

// ═══════════════════════════════════════════════════════════════════════════
// FAULTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_zero_quantity_aborts_by_default() {
    let err = compose_manifest(&order("order_zero_quantity.yaml"), &LayoutConfig::standard())
        .unwrap_err();
    match err {
        ManifestError::ZeroQuantity { item } => assert_eq!(item, "Broken"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_zero_quantity_marked() {
    let layout = LayoutConfig {
        on_zero_quantity: ZeroQuantityPolicy::Mark,
        ..LayoutConfig::standard()
    };
    let ops = compose_manifest(&order("order_zero_quantity.yaml"), &layout).unwrap();

    assert_eq!(text(&ops, 'A', 8).as_deref(), Some("Broken (數量錯誤)"));
    assert_eq!(number(&ops, 'C', 8), Some(0.0));
    assert_eq!(number(&ops, 'D', 8), None);
    assert_eq!(number(&ops, 'E', 8), Some(50.0));
    assert_eq!(number(&ops, 'D', 9), Some(100.0));
}

// ═══════════════════════════════════════════════════════════════════════════
// LAYOUTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_compact_layout() {
    let ops = compose_manifest(&order("order_basic.yaml"), &LayoutConfig::compact()).unwrap();

    assert_eq!(text(&ops, 'F', 1).as_deref(), Some("訂單日期"));
    assert_eq!(text(&ops, 'G', 1).as_deref(), Some("2024-05-01"));
    assert!(ops.merges().any(|m| m == CellRange::row_span(5, 1, 7)));
    assert!(ops.find_text("小計").is_none());

    // no subtotal, shipping at 10, totals at 11, gap of 1
    assert_eq!(text(&ops, 'A', 11).as_deref(), Some("總計"));
    assert_eq!(text(&ops, 'A', 13).as_deref(), Some("備註"));
}

#[test]
fn test_compact_puts_gifts_before_variant_details() {
    let ops = compose_manifest(&order("order_gifts.yaml"), &LayoutConfig::compact()).unwrap();

    let divider = ops.find_text("-- 以下為贈品 --").unwrap();
    let shirt_details = ops
        .texts()
        .filter(|(_, t)| *t == "Shirt")
        .map(|(c, _)| c.row)
        .max()
        .unwrap();
    assert!(divider.row < shirt_details);
}

#[test]
fn test_layout_file_labels_and_widths() {
    let layout = parse_layout(&fixture("layout_packing.yaml")).unwrap();
    assert!(!layout.blocks.contains(&Block::GiftHeader));

    let ops = compose_manifest(&order("order_gifts.yaml"), &layout).unwrap();

    assert_eq!(text(&ops, 'A', 5).as_deref(), Some("Packing List"));
    assert_eq!(text(&ops, 'H', 1).as_deref(), Some("Order date"));
    assert_eq!(text(&ops, 'I', 1).as_deref(), Some("12/06/2024"));
    assert!(ops.find_text("Size").is_some());
    assert!(ops.find_text("Colour").is_some());
    assert!(ops.find_text("Sticker").is_none());
}

#[test]
fn test_composition_is_deterministic() {
    let order = order("order_gifts.yaml");
    let first = serde_json::to_string(&compose(&order)).unwrap();
    let second = serde_json::to_string(&compose(&order)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_table_rows_written_top_down() {
    let ops = compose(&order("order_gifts.yaml"));

    // Left of the sidebar, below the title, every text lands at or below the previous one
    let rows: Vec<u32> = ops
        .texts()
        .filter(|(c, _)| c.col <= 5 && c.row >= 7)
        .map(|(c, _)| c.row)
        .collect();
    assert!(rows.len() > 10);
    assert!(rows.windows(2).all(|w| w[0] <= w[1]));
}
