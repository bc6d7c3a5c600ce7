//! Manifest compositor: turns one order into grid operations
//!
//! The compositor walks the layout's block list with a single row cursor.
//! Every block is computed into its own buffer from the cursor and the
//! classified order, then committed in one piece; a block that fails leaves
//! nothing behind. Blocks that have nothing to show contribute zero rows.

use crate::core::{
    AttributeExtractor, Classification, GiftAggregate, GiftAggregator, ImagePlacer,
    LineItemClassifier,
};
use crate::error::{ManifestError, ManifestResult};
use crate::grid::{CellRange, CellRef, CellValue, GridOperations, GridSurface, Style};
use crate::layout::{Block, LayoutConfig};
use crate::types::{AttributeValue, Order};
use tracing::{debug, info, warn};

const COL_A: u16 = 1;
const COL_B: u16 = 2;
const COL_C: u16 = 3;
const COL_D: u16 = 4;
const COL_E: u16 = 5;

/// Compose the manifest for one order
pub fn compose_manifest(order: &Order, layout: &LayoutConfig) -> ManifestResult<GridOperations> {
    GridCompositor::new(order, layout)?.compose()
}

/// Operations of one block and the cursor after it
#[derive(Debug, Default)]
struct BlockOutput {
    ops: GridOperations,
    next_row: u32,
}

/// Buffer a block writes into before it is committed
struct BlockBuilder {
    ops: GridOperations,
}

impl BlockBuilder {
    fn new() -> Self {
        Self {
            ops: GridOperations::new(),
        }
    }

    fn text(&mut self, col: u16, row: u32, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.ops.set_value(CellRef::new(col, row), CellValue::Text(value));
        }
    }

    /// Non-finite numbers never reach a cell
    fn number(&mut self, col: u16, row: u32, value: f64) {
        let cell = CellRef::new(col, row);
        if value.is_finite() {
            self.ops.set_value(cell, CellValue::Number(value));
        } else {
            warn!(%cell, value, "dropping non-finite number");
        }
    }

    fn merge(&mut self, first_col: u16, first_row: u32, last_col: u16, last_row: u32) {
        self.ops
            .merge(CellRange::new(first_col, first_row, last_col, last_row));
    }

    fn merge_cols(&mut self, row: u32, first_col: u16, last_col: u16) {
        self.ops.merge(CellRange::row_span(row, first_col, last_col));
    }

    fn style(&mut self, range: CellRange, style: Style) {
        self.ops.apply_style(range, style);
    }

    fn finish(self, next_row: u32) -> BlockOutput {
        BlockOutput {
            ops: self.ops,
            next_row,
        }
    }
}

pub struct GridCompositor<'a> {
    order: &'a Order,
    layout: &'a LayoutConfig,
    placer: ImagePlacer,
    cursor: u32,
    /// Row of the item table header, once emitted
    table_top: Option<u32>,
}

impl<'a> GridCompositor<'a> {
    pub fn new(order: &'a Order, layout: &'a LayoutConfig) -> ManifestResult<Self> {
        layout.validate()?;
        order.check_amounts()?;
        Ok(Self {
            order,
            layout,
            placer: ImagePlacer::new(layout.image_box, layout.rows_per_image),
            cursor: layout.start_row,
            table_top: None,
        })
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn compose(mut self) -> ManifestResult<GridOperations> {
        let extractor = AttributeExtractor::new(self.layout.attribute_labels.clone())
            .hide_keys(self.layout.hidden_meta_keys.iter().cloned());
        let classification =
            LineItemClassifier::new(&extractor, self.layout.on_zero_quantity).classify(self.order)?;
        let gifts = GiftAggregator::aggregate(&classification.variant_groups);

        let mut out = GridOperations::new();
        self.column_widths(&mut out);

        for block in &self.layout.blocks {
            let output = self.emit(*block, &classification, &gifts)?;
            self.commit(*block, output, &mut out)?;
        }

        info!(
            order_id = self.order.id,
            layout = %self.layout.name,
            last_row = self.cursor,
            ops = out.len(),
            "composed manifest"
        );
        Ok(out)
    }

    fn column_widths(&self, out: &mut GridOperations) {
        let last = self
            .layout
            .column_widths
            .keys()
            .copied()
            .max()
            .unwrap_or(0)
            .max(self.layout.table_width);
        for col in 1..=last {
            out.set_column_width(col, self.layout.column_width(col));
        }
    }

    fn commit(
        &mut self,
        block: Block,
        output: BlockOutput,
        out: &mut GridOperations,
    ) -> ManifestResult<()> {
        if output.next_row < self.cursor {
            return Err(ManifestError::Layout(format!(
                "block '{}' moved the row cursor back from {} to {}",
                block.name(),
                self.cursor,
                output.next_row
            )));
        }

        debug!(
            block = block.name(),
            from = self.cursor,
            to = output.next_row,
            ops = output.ops.len(),
            "block emitted"
        );

        if block == Block::ItemTableHeader {
            self.table_top = Some(self.cursor);
        }
        out.append(output.ops);
        self.cursor = output.next_row;
        Ok(())
    }

    fn emit(
        &self,
        block: Block,
        classification: &Classification,
        gifts: &GiftAggregate,
    ) -> ManifestResult<BlockOutput> {
        let row = self.cursor;
        let output = match block {
            Block::Header => self.header_block(row),
            Block::ItemTableHeader => self.item_table_header_block(row),
            Block::SoldItems => self.sold_items_block(row, classification),
            Block::Subtotal => self.subtotal_block(row),
            Block::Shipping => self.shipping_block(row),
            Block::Totals => self.totals_block(row),
            Block::VariantAttributes => self.variant_attributes_block(row, classification),
            Block::GiftHeader => self.gift_header_block(row, classification),
            Block::VariantGifts => self.variant_gifts_block(row, gifts),
            Block::SimpleGifts => self.simple_gifts_block(row, classification),
            Block::Note => self.note_block(row),
        };
        Ok(output)
    }

    //==========================================================================
    // Fixed-position header
    //==========================================================================

    fn header_block(&self, row: u32) -> BlockOutput {
        let layout = self.layout;
        let labels = &layout.labels;
        let billing = &self.order.billing;
        let mut b = BlockBuilder::new();

        let contact = [
            billing.full_name(),
            billing.full_address(),
            billing.phone.clone(),
            billing.email.clone(),
        ];
        for (idx, value) in contact.into_iter().enumerate() {
            let r = idx as u32 + 1;
            b.text(COL_A, r, value);
            b.merge_cols(r, COL_A, COL_C);
        }
        let contact_range = CellRange::new(COL_A, 1, COL_D, 4);
        b.style(contact_range, Style::AlignLeft);
        b.style(contact_range, Style::ForceText);

        let (g, h) = (layout.sidebar_col(), layout.sidebar_col() + 1);

        // Order date, top of the sidebar columns
        b.text(g, 1, labels.order_date.as_str());
        if let Some(created) = self.order.created_at {
            b.text(h, 1, created.format(&layout.date_format).to_string());
        }
        b.style(CellRange::row_span(1, g, h), Style::ForceText);

        // Title band
        let t = layout.title_row;
        let title = CellRange::row_span(t, COL_A, layout.table_width);
        b.text(COL_A, t, labels.title.as_str());
        b.merge_cols(t, COL_A, layout.table_width);
        b.style(title, Style::AlignCenter);
        b.style(title, Style::FontSize(16.0));
        b.style(title, Style::OutlineBorder);

        let s = layout.start_row;

        // Order id box
        b.text(g, s, labels.order_id.as_str());
        b.text(h, s, labels.site_order_id.as_str());
        b.text(g, s + 1, self.order.id.to_string());
        b.merge(g, s + 1, g, s + 2);
        b.merge(h, s + 1, h, s + 2);
        let id_box = CellRange::new(g, s, h, s + 2);
        b.style(id_box, Style::VerticalCenter);
        b.style(id_box, Style::AllBorders);
        b.style(id_box, Style::ForceText);

        // Payment box
        let payment = CellRange::new(g, s + 4, h, s + 5);
        b.text(g, s + 4, self.order.payment_method_title.as_str());
        b.merge(g, s + 4, h, s + 5);
        b.style(payment, Style::AlignCenter);
        b.style(payment, Style::VerticalCenter);
        b.style(payment, Style::AllBorders);

        // Invoice box
        b.text(g, s + 7, labels.invoice.as_str());
        b.merge_cols(s + 7, g, h);
        b.style(CellRange::row_span(s + 7, g, h), Style::AlignCenter);
        let invoice_body = CellRange::new(g, s + 8, h, s + 9);
        b.text(g, s + 8, self.order.invoice_text());
        b.merge(g, s + 8, h, s + 9);
        b.style(invoice_body, Style::VerticalCenter);
        b.style(invoice_body, Style::WrapText);
        b.style(invoice_body, Style::ForceText);
        b.style(CellRange::new(g, s + 7, h, s + 9), Style::AllBorders);

        b.finish(row)
    }

    //==========================================================================
    // Item table
    //==========================================================================

    fn item_table_header_block(&self, row: u32) -> BlockOutput {
        let labels = &self.layout.labels;
        let mut b = BlockBuilder::new();

        b.text(COL_A, row, labels.item.as_str());
        b.merge_cols(row, COL_A, COL_B);
        b.text(COL_C, row, labels.quantity.as_str());
        b.text(COL_D, row, labels.unit_price.as_str());
        b.text(COL_E, row, labels.amount.as_str());

        b.finish(row + 1)
    }

    fn sold_items_block(&self, row: u32, classification: &Classification) -> BlockOutput {
        let mut b = BlockBuilder::new();
        let mut r = row;

        for item in &classification.sold {
            let name = match item.unit_price {
                Some(_) => item.name.clone(),
                None => format!("{} ({})", item.name, self.layout.labels.invalid_quantity),
            };
            b.text(COL_A, r, name);
            b.merge_cols(r, COL_A, COL_B);
            b.style(CellRange::cell(CellRef::new(COL_A, r)), Style::WrapText);
            b.number(COL_C, r, f64::from(item.quantity));
            if let Some(price) = item.unit_price {
                b.number(COL_D, r, price);
            }
            b.number(COL_E, r, item.total);
            r += 1;
        }

        b.finish(r)
    }

    fn subtotal_block(&self, row: u32) -> BlockOutput {
        let mut b = BlockBuilder::new();

        b.merge_cols(row, COL_A, COL_E);
        let r = row + 1;
        b.text(COL_A, r, self.layout.labels.subtotal.as_str());
        b.merge_cols(r, COL_A, COL_B);
        b.number(COL_E, r, self.order.subtotal);

        b.finish(r + 1)
    }

    fn shipping_block(&self, row: u32) -> BlockOutput {
        let mut b = BlockBuilder::new();
        let method = match self.order.shipping_method.as_deref() {
            Some(method) if !method.is_empty() => method,
            _ => return b.finish(row),
        };

        b.text(
            COL_A,
            row,
            format!("{}: {}", self.layout.labels.shipping, method),
        );
        b.merge_cols(row, COL_A, COL_B);
        b.style(CellRange::cell(CellRef::new(COL_A, row)), Style::WrapText);
        b.number(COL_E, row, self.order.shipping_total);

        b.finish(row + 1)
    }

    fn totals_block(&self, row: u32) -> BlockOutput {
        let mut b = BlockBuilder::new();

        b.text(COL_A, row, self.layout.labels.total.as_str());
        b.merge_cols(row, COL_A, COL_B);
        b.number(COL_E, row, self.order.total);
        b.style(CellRange::cell(CellRef::new(COL_E, row)), Style::FontSize(18.0));

        let table = CellRange::new(COL_A, self.table_top.unwrap_or(row), COL_E, row);
        b.style(table, Style::AlignCenter);
        b.style(table, Style::AllBorders);

        b.finish(row + 1 + self.layout.section_gap)
    }

    //==========================================================================
    // Variant details
    //==========================================================================

    fn variant_attributes_block(&self, row: u32, classification: &Classification) -> BlockOutput {
        let mut b = BlockBuilder::new();
        let mut r = row;

        for group in classification.sold_variant_groups() {
            let start = r;
            b.text(COL_A, r, group.name.as_str());
            b.merge_cols(r, COL_A, COL_B);
            r += 1;

            let mut placed = 0;
            for attr in &group.attributes {
                b.text(COL_A, r, attr.name.as_str());
                b.merge_cols(r, COL_A, COL_B);

                match &attr.value {
                    AttributeValue::Text(value) => b.text(COL_C, r, value.as_str()),
                    AttributeValue::Image(path) => match self.placer.place(path) {
                        Ok(placement) => {
                            b.ops
                                .place_image(placement.anchor(CellRef::new(COL_C, r), path));
                            placed += 1;
                        }
                        Err(e) => {
                            warn!(product = %group.name, attribute = %attr.name, error = %e, "image not placed");
                            b.text(
                                COL_C,
                                r,
                                format!("{}: {}", self.layout.labels.image_failed, path.display()),
                            );
                        }
                    },
                }
                b.merge_cols(r, COL_C, COL_D);
                r += 1;
            }

            let region = CellRange::new(COL_A, start, COL_D, r - 1);
            b.style(region, Style::AllBorders);
            b.style(region, Style::ForceText);

            r += self.placer.extra_row_span(placed, group.attributes.len());
            r += 1;
        }

        b.finish(r)
    }

    //==========================================================================
    // Gifts and note
    //==========================================================================

    fn gift_header_block(&self, row: u32, classification: &Classification) -> BlockOutput {
        let mut b = BlockBuilder::new();
        if !classification.has_gifts() {
            return b.finish(row);
        }

        b.text(COL_A, row + 1, self.layout.labels.gift_divider.as_str());
        b.finish(row + 2)
    }

    fn variant_gifts_block(&self, row: u32, gifts: &GiftAggregate) -> BlockOutput {
        let labels = &self.layout.labels;
        let mut b = BlockBuilder::new();
        let mut r = row;

        for product in &gifts.products {
            b.text(COL_A, r, product.name.as_str());
            b.merge_cols(r, COL_A, COL_B);
            r += 1;

            for attribute in &product.attributes {
                let start = r;
                b.text(COL_A, r, attribute.name.as_str());
                b.merge_cols(r, COL_A, COL_B);
                b.text(COL_C, r, labels.quantity.as_str());
                r += 1;

                for (value, quantity) in attribute.sorted_values() {
                    b.text(COL_A, r, value);
                    b.merge_cols(r, COL_A, COL_B);
                    b.number(COL_C, r, quantity as f64);
                    r += 1;
                }

                b.style(CellRange::new(COL_A, start, COL_C, r - 1), Style::AllBorders);
            }

            r += 1;
        }

        b.finish(r)
    }

    fn simple_gifts_block(&self, row: u32, classification: &Classification) -> BlockOutput {
        let labels = &self.layout.labels;
        let mut b = BlockBuilder::new();
        if classification.simple_gifts.is_empty() {
            return b.finish(row);
        }

        b.text(COL_A, row, labels.item.as_str());
        b.merge_cols(row, COL_A, COL_B);
        b.text(COL_C, row, labels.quantity.as_str());

        let mut r = row + 1;
        for gift in &classification.simple_gifts {
            b.text(COL_A, r, gift.name.as_str());
            b.merge_cols(r, COL_A, COL_B);
            b.number(COL_C, r, f64::from(gift.quantity));
            r += 1;
        }
        b.style(CellRange::new(COL_A, row, COL_C, r - 1), Style::AllBorders);

        b.finish(r + 1)
    }

    fn note_block(&self, row: u32) -> BlockOutput {
        let mut b = BlockBuilder::new();

        b.text(COL_A, row, self.layout.labels.note.as_str());
        b.text(COL_A, row + 1, self.order.customer_note.as_str());
        b.merge_cols(row + 1, COL_A, COL_E);
        b.style(CellRange::cell(CellRef::new(COL_A, row + 1)), Style::WrapText);
        b.style(CellRange::new(COL_A, row, COL_E, row + 1), Style::AllBorders);

        b.finish(row + 2)
    }
}
