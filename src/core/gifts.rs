//! Gift summary: variant-gift quantities per product, attribute and value

use crate::types::VariantGroup;
use std::cmp::Ordering;

/// Ordering for attribute values: integers first in numeric order, then
/// everything else in string order
pub fn compare_values(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Summed quantities for one attribute name of one product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeGifts {
    pub name: String,
    /// Sums are wider than line quantities so they cannot overflow
    values: Vec<(String, u64)>,
}

impl AttributeGifts {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: Vec::new(),
        }
    }

    fn add(&mut self, value: &str, quantity: u32) {
        let quantity = u64::from(quantity);
        match self.values.iter_mut().find(|(v, _)| v == value) {
            Some((_, total)) => *total = total.saturating_add(quantity),
            None => self.values.push((value.to_string(), quantity)),
        }
    }

    /// Values with their summed quantity, sorted for emission
    pub fn sorted_values(&self) -> Vec<(&str, u64)> {
        let mut values: Vec<(&str, u64)> = self
            .values
            .iter()
            .map(|(value, qty)| (value.as_str(), *qty))
            .collect();
        values.sort_by(|a, b| compare_values(a.0, b.0));
        values
    }
}

/// All gift attributes of one product, in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductGifts {
    pub name: String,
    pub attributes: Vec<AttributeGifts>,
}

impl ProductGifts {
    fn attribute_mut(&mut self, name: &str) -> &mut AttributeGifts {
        let idx = match self.attributes.iter().position(|a| a.name == name) {
            Some(idx) => idx,
            None => {
                self.attributes.push(AttributeGifts::new(name));
                self.attributes.len() - 1
            }
        };
        &mut self.attributes[idx]
    }
}

/// product → attribute name → value → summed quantity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GiftAggregate {
    pub products: Vec<ProductGifts>,
}

impl GiftAggregate {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn product_mut(&mut self, name: &str) -> &mut ProductGifts {
        let idx = match self.products.iter().position(|p| p.name == name) {
            Some(idx) => idx,
            None => {
                self.products.push(ProductGifts {
                    name: name.to_string(),
                    attributes: Vec::new(),
                });
                self.products.len() - 1
            }
        };
        &mut self.products[idx]
    }

    /// Summed quantity for one product/attribute/value, if present
    pub fn quantity(&self, product: &str, attribute: &str, value: &str) -> Option<u64> {
        self.products
            .iter()
            .find(|p| p.name == product)?
            .attributes
            .iter()
            .find(|a| a.name == attribute)?
            .values
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, qty)| *qty)
    }
}

pub struct GiftAggregator;

impl GiftAggregator {
    /// Aggregate the gift groups; non-gift groups are ignored
    pub fn aggregate<'a, I>(groups: I) -> GiftAggregate
    where
        I: IntoIterator<Item = &'a VariantGroup>,
    {
        let mut aggregate = GiftAggregate::default();

        for group in groups.into_iter().filter(|g| g.is_gift) {
            let product = aggregate.product_mut(&group.name);
            for attr in &group.attributes {
                product
                    .attribute_mut(&attr.name)
                    .add(&attr.display_value(), group.quantity);
            }
        }

        aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attribute;
    use pretty_assertions::assert_eq;

    fn gift(name: &str, quantity: u32, attrs: &[(&str, &str)]) -> VariantGroup {
        VariantGroup {
            name: name.to_string(),
            quantity,
            attributes: attrs.iter().map(|(n, v)| Attribute::text(*n, *v)).collect(),
            is_gift: true,
        }
    }

    #[test]
    fn test_quantities_summed() {
        let groups = vec![gift("P", 2, &[("Size", "M")]), gift("P", 3, &[("Size", "M")])];
        let aggregate = GiftAggregator::aggregate(&groups);

        assert_eq!(aggregate.quantity("P", "Size", "M"), Some(5));
        assert_eq!(aggregate.products.len(), 1);
        assert_eq!(aggregate.products[0].attributes[0].sorted_values(), vec![("M", 5)]);
    }

    #[test]
    fn test_large_quantities_do_not_wrap() {
        let groups = vec![
            gift("P", u32::MAX, &[("Size", "M")]),
            gift("P", 1, &[("Size", "M")]),
        ];
        let aggregate = GiftAggregator::aggregate(&groups);
        assert_eq!(aggregate.quantity("P", "Size", "M"), Some(u64::from(u32::MAX) + 1));
    }

    #[test]
    fn test_non_gifts_ignored() {
        let mut sold = gift("P", 4, &[("Size", "L")]);
        sold.is_gift = false;
        let aggregate = GiftAggregator::aggregate(&[sold]);
        assert!(aggregate.is_empty());
    }

    #[test]
    fn test_discovery_order_kept() {
        let groups = vec![
            gift("Socks", 1, &[("Color", "Red"), ("Size", "S")]),
            gift("Hat", 1, &[("Size", "L")]),
            gift("Socks", 1, &[("Pattern", "Dots"), ("Color", "Blue")]),
        ];
        let aggregate = GiftAggregator::aggregate(&groups);

        let products: Vec<&str> = aggregate.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(products, vec!["Socks", "Hat"]);

        let socks: Vec<&str> = aggregate.products[0]
            .attributes
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(socks, vec!["Color", "Size", "Pattern"]);
    }

    #[test]
    fn test_numeric_aware_value_order() {
        let groups = vec![
            gift("P", 1, &[("Size", "10")]),
            gift("P", 1, &[("Size", "Free")]),
            gift("P", 1, &[("Size", "2")]),
        ];
        let aggregate = GiftAggregator::aggregate(&groups);
        let values: Vec<&str> = aggregate.products[0].attributes[0]
            .sorted_values()
            .into_iter()
            .map(|(v, _)| v)
            .collect();
        assert_eq!(values, vec!["2", "10", "Free"]);
    }

    #[test]
    fn test_compare_values_is_total() {
        let mut values = vec!["1a", "10", "2", "b", "-3", "02", "A"];
        values.sort_by(|a, b| compare_values(a, b));
        assert_eq!(values, vec!["-3", "02", "2", "10", "1a", "A", "b"]);
    }
}
