use crate::core::ZeroQuantityPolicy;
use crate::error::ManifestResult;
use crate::excel::{manifest_filename, ExcelExporter, ManifestReader};
use crate::grid::{CellValue, GridOperations};
use crate::layout::{compose_manifest, LayoutConfig};
use crate::parser;
use crate::types::Order;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Output format of the preview command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PreviewFormat {
    /// One line per grid operation
    #[default]
    Text,
    Json,
    Yaml,
}

/// Format a number for display, removing unnecessary decimal places
fn format_number(n: f64) -> String {
    let rounded = (n * 1e6).round() / 1e6;
    format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn format_value(value: &CellValue) -> String {
    match value {
        CellValue::Text(text) => text.replace('\n', "⏎"),
        CellValue::Number(n) => format_number(*n),
    }
}

/// Load the order and layout, apply the zero-quantity override
fn load(
    order_path: &Path,
    layout: &str,
    on_zero_quantity: Option<ZeroQuantityPolicy>,
) -> ManifestResult<(Order, LayoutConfig)> {
    let order = parser::parse_order(order_path)?;
    let mut layout = parser::resolve_layout(layout)?;
    if let Some(policy) = on_zero_quantity {
        layout.on_zero_quantity = policy;
    }
    Ok((order, layout))
}

/// Execute the export command
pub fn export(
    input: PathBuf,
    output: Option<PathBuf>,
    layout: String,
    on_zero_quantity: Option<ZeroQuantityPolicy>,
    verbose: bool,
) -> ManifestResult<()> {
    println!("{}", "📦 Manifest - Excel Export".bold().green());
    println!("   Order:  {}", input.display());
    println!("   Layout: {}", layout.bright_blue());

    if verbose {
        println!("{}", "📖 Parsing order...".cyan());
    }
    let (order, layout) = load(&input, &layout, on_zero_quantity)?;

    let output = output.unwrap_or_else(|| PathBuf::from(manifest_filename(order.id)));
    println!("   Output: {}\n", output.display());

    if verbose {
        println!(
            "   Order {} with {} line items\n",
            order.id.to_string().bold(),
            order.items.len()
        );
        println!("{}", "🧮 Composing manifest...".cyan());
    }

    let ops = compose_manifest(&order, &layout)?;

    if verbose {
        println!(
            "   {} operations, {} rows, {} images\n",
            ops.len(),
            ops.max_row(),
            ops.images().count()
        );
        println!("{}", "📊 Writing Excel file...".cyan());
    }

    ExcelExporter::new(ops).export(&output)?;

    println!("{}", "✅ Export Complete!".bold().green());
    println!("   Excel file: {}\n", output.display());

    Ok(())
}

/// Execute the preview command - compose without writing a workbook
pub fn preview(input: PathBuf, layout: String, format: PreviewFormat) -> ManifestResult<()> {
    let (order, layout) = load(&input, &layout, None)?;
    let ops = compose_manifest(&order, &layout)?;

    match format {
        PreviewFormat::Json => println!("{}", serde_json::to_string_pretty(&ops)?),
        PreviewFormat::Yaml => print!("{}", serde_yaml::to_string(&ops)?),
        PreviewFormat::Text => print_preview(&order, &layout, &ops),
    }

    Ok(())
}

fn print_preview(order: &Order, layout: &LayoutConfig, ops: &GridOperations) {
    println!("{}", "🔍 Manifest - Preview".bold().green());
    println!("   Order:  {}", order.id.to_string().bright_blue().bold());
    println!("   Layout: {}\n", layout.name.bright_blue());

    for op in ops.ops() {
        println!("   {}", op);
    }

    println!();
    println!(
        "{}",
        format!(
            "✅ {} operations, last row {}",
            ops.len(),
            ops.max_row()
        )
        .bold()
        .green()
    );
}

/// Execute the inspect command - dump the cells of a written manifest
pub fn inspect(input: PathBuf) -> ManifestResult<()> {
    println!("{}", "🔍 Manifest - Inspect".bold().green());
    println!("   File: {}\n", input.display());

    let cells = ManifestReader::new(&input).read_cells()?;

    let mut current_row = 0;
    for (cell, value) in &cells {
        if cell.row != current_row {
            current_row = cell.row;
            println!("   {}", format!("Row {}", current_row).cyan());
        }
        println!("      {:<6} {}", cell.to_string().bright_blue(), format_value(value));
    }

    println!();
    println!("{}", format!("✅ {} non-empty cells", cells.len()).bold().green());

    Ok(())
}

/// Execute the layouts command - list the built-in layouts
pub fn layouts() -> ManifestResult<()> {
    println!("{}", "📐 Manifest - Built-in Layouts".bold().green());
    println!();

    for name in LayoutConfig::preset_names() {
        if let Some(layout) = LayoutConfig::preset(name) {
            println!("   {}", layout.name.bright_blue().bold());
            println!(
                "      width {} columns, table starts at row {}",
                layout.table_width, layout.start_row
            );
            let blocks: Vec<&str> = layout.blocks.iter().map(|b| b.name()).collect();
            println!("      blocks: {}", blocks.join(" → "));
        }
    }

    println!();
    println!(
        "   Use {} or a YAML layout file; {} sets the default.",
        "--layout NAME".bold(),
        "MANIFEST_LAYOUT".bold()
    );

    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
