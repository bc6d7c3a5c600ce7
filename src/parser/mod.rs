use crate::error::{ManifestError, ManifestResult};
use crate::layout::LayoutConfig;
use crate::types::Order;
use std::path::Path;
use tracing::debug;

/// Parse an order snapshot from a YAML or JSON file.
///
/// The format is picked by extension: `.json` is read as JSON, anything
/// else (`.yaml`, `.yml`, no extension) as YAML. Missing fields fall back
/// to their defaults, so a snapshot only needs the parts it uses.
///
/// # Example
/// ```no_run
/// use order_manifest::parser::parse_order;
/// use std::path::Path;
///
/// let order = parse_order(Path::new("order-1042.yaml"))?;
/// println!("Order {} has {} items", order.id, order.items.len());
/// # Ok::<(), order_manifest::error::ManifestError>(())
/// ```
pub fn parse_order(path: &Path) -> ManifestResult<Order> {
    let content = std::fs::read_to_string(path)?;
    let order: Order = if is_json(path) {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    validate_order(&order)?;
    debug!(path = %path.display(), order_id = order.id, items = order.items.len(), "parsed order");
    Ok(order)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Structural checks the type system can't express
fn validate_order(order: &Order) -> ManifestResult<()> {
    order.check_amounts()?;
    for (idx, item) in order.items.iter().enumerate() {
        if item.name.trim().is_empty() {
            return Err(ManifestError::Parse(format!(
                "Line item {} has no name",
                idx + 1
            )));
        }
        if !item.total.is_finite() {
            return Err(ManifestError::InvalidAmount {
                field: format!("total of '{}'", item.name),
                value: item.total,
            });
        }
    }
    Ok(())
}

/// Parse a layout file and validate it
pub fn parse_layout(path: &Path) -> ManifestResult<LayoutConfig> {
    let content = std::fs::read_to_string(path)?;
    let layout: LayoutConfig = serde_yaml::from_str(&content)?;
    layout.validate()?;
    Ok(layout)
}

/// Resolve `--layout`: a built-in preset name, otherwise a path to a layout file
pub fn resolve_layout(name_or_path: &str) -> ManifestResult<LayoutConfig> {
    if let Some(layout) = LayoutConfig::preset(name_or_path) {
        return Ok(layout);
    }

    let path = Path::new(name_or_path);
    if !path.exists() {
        return Err(ManifestError::Layout(format!(
            "Unknown layout '{}' (presets: {})",
            name_or_path,
            LayoutConfig::preset_names().join(", ")
        )));
    }
    parse_layout(path)
}
