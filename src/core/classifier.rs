//! Line item classification: sold items, simple gifts, variant groups

use crate::core::AttributeExtractor;
use crate::error::{ManifestError, ManifestResult};
use crate::types::{LineItem, Order, ProductKind, VariantGroup};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What to do with a priced line whose quantity is 0
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ZeroQuantityPolicy {
    /// Fail the whole export
    #[default]
    Abort,
    /// Keep the row, leave the unit price blank and mark the name
    Mark,
}

/// A priced line of the item table
#[derive(Debug, Clone, PartialEq)]
pub struct SoldItem {
    pub name: String,
    pub quantity: u32,
    pub total: f64,
    /// `None` only for a marked zero-quantity row
    pub unit_price: Option<f64>,
}

/// A zero-total line of a simple product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleGift {
    pub name: String,
    pub quantity: u32,
}

/// Result of splitting an order's line items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub sold: Vec<SoldItem>,
    pub simple_gifts: Vec<SimpleGift>,
    pub variant_groups: Vec<VariantGroup>,
    /// Names of rows kept under `ZeroQuantityPolicy::Mark`
    pub faults: Vec<String>,
}

impl Classification {
    pub fn has_gifts(&self) -> bool {
        !self.simple_gifts.is_empty() || self.variant_groups.iter().any(|g| g.is_gift)
    }

    pub fn sold_variant_groups(&self) -> impl Iterator<Item = &VariantGroup> + '_ {
        self.variant_groups.iter().filter(|g| !g.is_gift)
    }
}

/// Unit price as the integer part of `total / quantity`
pub fn unit_price(total: f64, quantity: u32) -> Option<f64> {
    if quantity == 0 {
        return None;
    }
    Some((total / f64::from(quantity)).trunc())
}

/// Product names may carry `<br/>` markup for a manual line break
fn display_name(name: &str) -> String {
    name.replace("<br/>", "\n")
}

pub struct LineItemClassifier<'a> {
    extractor: &'a AttributeExtractor,
    policy: ZeroQuantityPolicy,
}

impl<'a> LineItemClassifier<'a> {
    pub fn new(extractor: &'a AttributeExtractor, policy: ZeroQuantityPolicy) -> Self {
        Self { extractor, policy }
    }

    pub fn classify(&self, order: &Order) -> ManifestResult<Classification> {
        let mut result = Classification::default();

        for item in &order.items {
            if !item.total.is_finite() {
                return Err(ManifestError::InvalidAmount {
                    field: format!("total of '{}'", item.name),
                    value: item.total,
                });
            }
            let is_gift = item.is_gift();

            if !is_gift {
                result.sold.push(self.sold_item(item, &mut result.faults)?);
            } else if item.kind == ProductKind::Simple {
                result.simple_gifts.push(SimpleGift {
                    name: display_name(&item.name),
                    quantity: item.quantity,
                });
            }

            if item.is_variant() {
                result.variant_groups.push(VariantGroup {
                    name: display_name(&item.name),
                    quantity: item.quantity,
                    attributes: self.extractor.extract(&item.meta),
                    is_gift,
                });
            }
        }

        result.sold.sort_by(|a, b| a.name.cmp(&b.name));
        result.simple_gifts.sort_by(|a, b| a.name.cmp(&b.name));
        result.variant_groups.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(result)
    }

    fn sold_item(&self, item: &LineItem, faults: &mut Vec<String>) -> ManifestResult<SoldItem> {
        let unit_price = match unit_price(item.total, item.quantity) {
            Some(price) => Some(price),
            None => match self.policy {
                ZeroQuantityPolicy::Abort => {
                    return Err(ManifestError::ZeroQuantity {
                        item: item.name.clone(),
                    })
                }
                ZeroQuantityPolicy::Mark => {
                    warn!(item = %item.name, "quantity is 0, leaving unit price blank");
                    faults.push(item.name.clone());
                    None
                }
            },
        };

        Ok(SoldItem {
            name: display_name(&item.name),
            quantity: item.quantity,
            total: item.total,
            unit_price,
        })
    }
}
