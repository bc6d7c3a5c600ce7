use crate::error::{ManifestError, ManifestResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

//==============================================================================
// Order Snapshot
//==============================================================================

/// Billing contact printed in the manifest header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Billing {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub postcode: String,
    pub phone: String,
    pub email: String,
}

impl Billing {
    /// Family and given name are written back to back, as the store keeps them
    pub fn full_name(&self) -> String {
        format!("{}{}", self.first_name, self.last_name)
    }

    /// Postcode, city and both address lines on one line
    pub fn full_address(&self) -> String {
        let mut address = String::new();
        if !self.postcode.is_empty() {
            address.push_str(&self.postcode);
            address.push(' ');
        }
        address.push_str(&self.city);
        address.push_str(&self.address_1);
        address.push_str(&self.address_2);
        address
    }
}

/// Immutable snapshot of one order, as handed over by the host store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub id: u64,
    pub created_at: Option<NaiveDateTime>,
    pub billing: Billing,
    pub payment_method_title: String,
    pub customer_note: String,
    /// Company / tax registration id for the invoice box
    pub tax_id: String,
    pub subtotal: f64,
    /// Name of the first shipping line, if the order has one
    pub shipping_method: Option<String>,
    pub shipping_total: f64,
    pub total: f64,
    pub items: Vec<LineItem>,
}

impl Order {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn add_item(&mut self, item: LineItem) {
        self.items.push(item);
    }

    /// Order-level money fields, by name
    pub fn amounts(&self) -> [(&'static str, f64); 3] {
        [
            ("subtotal", self.subtotal),
            ("shipping_total", self.shipping_total),
            ("total", self.total),
        ]
    }

    /// First order-level amount that is NaN or infinite
    pub fn check_amounts(&self) -> ManifestResult<()> {
        match self.amounts().into_iter().find(|(_, value)| !value.is_finite()) {
            Some((field, value)) => Err(ManifestError::InvalidAmount {
                field: field.to_string(),
                value,
            }),
            None => Ok(()),
        }
    }

    /// Text written into the invoice box: company name and tax id
    pub fn invoice_text(&self) -> String {
        [self.billing.company.as_str(), self.tax_id.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Product type of a line item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    #[default]
    Simple,
    /// A product with selectable options (the store calls it a "variation")
    #[serde(alias = "variation")]
    Variant,
}

/// One raw metadata entry of a line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub key: String,
    pub value: serde_json::Value,
}

impl MetaEntry {
    pub fn new(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

fn default_quantity() -> u32 {
    1
}

/// An order line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub kind: ProductKind,
    #[serde(default)]
    pub meta: Vec<MetaEntry>,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: u32, total: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            total,
            kind: ProductKind::Simple,
            meta: Vec::new(),
        }
    }

    pub fn variant(name: impl Into<String>, quantity: u32, total: f64) -> Self {
        Self {
            kind: ProductKind::Variant,
            ..Self::new(name, quantity, total)
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.push(MetaEntry::new(key, value));
        self
    }

    /// A zero-total line is a gift
    pub fn is_gift(&self) -> bool {
        self.total == 0.0
    }

    pub fn is_variant(&self) -> bool {
        self.kind == ProductKind::Variant
    }
}

//==============================================================================
// Display Attributes
//==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Text,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Text(String),
    /// Path to an uploaded image file
    Image(PathBuf),
}

/// One display attribute of a variant line item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Text(value.into()),
        }
    }

    pub fn image(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            value: AttributeValue::Image(path.into()),
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self.value {
            AttributeValue::Text(_) => AttributeKind::Text,
            AttributeValue::Image(_) => AttributeKind::Image,
        }
    }

    /// Value as shown in a cell (image attributes show their path)
    pub fn display_value(&self) -> String {
        match &self.value {
            AttributeValue::Text(text) => text.clone(),
            AttributeValue::Image(path) => path.display().to_string(),
        }
    }
}

/// Display bundle built for every variant line item, gift or not
#[derive(Debug, Clone, PartialEq)]
pub struct VariantGroup {
    pub name: String,
    pub quantity: u32,
    pub attributes: Vec<Attribute>,
    pub is_gift: bool,
}
