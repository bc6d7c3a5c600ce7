use clap::{Parser, Subcommand};
use order_manifest::cli::{self, PreviewFormat};
use order_manifest::core::ZeroQuantityPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "manifest")]
#[command(about = "Shipping manifests for commerce orders, as Excel workbooks")]
#[command(long_about = "Manifest - single-page shipping manifests from order snapshots

Lays out one order as a printable grid: billing contact, order id,
payment and invoice boxes, the sold-item table with subtotal, shipping
and total, variant details with product thumbnails, a gift summary and
the customer note.

COMMANDS:
  export   - Order (YAML/JSON) to Excel manifest (.xlsx)
  preview  - Show the grid operations without writing a file
  inspect  - Dump the cells of a written manifest
  layouts  - List the built-in layouts

EXAMPLES:
  manifest export order-1042.yaml                 # writes order-1042.xlsx
  manifest export order.json -o out.xlsx --layout compact
  manifest preview order.yaml --format json
  manifest inspect order-1042.xlsx

LOGGING:
  RUST_LOG=order_manifest=debug manifest export order.yaml")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Export an order to an Excel shipping manifest.

The order snapshot is read from YAML (.yaml/.yml) or JSON (.json).
Without -o the manifest is written to order-<id>.xlsx in the current
directory.

LAYOUTS:
  --layout takes a built-in name (standard, compact) or a YAML layout
  file. MANIFEST_LAYOUT sets the default.

ZERO QUANTITY:
  A sold item with quantity 0 has no unit price. By default the export
  aborts; --on-zero-quantity mark keeps the row and flags it instead.

EXAMPLES:
  manifest export order-1042.yaml
  manifest export order.json -o manifest.xlsx --layout my-layout.yaml")]
    /// Export an order to an Excel manifest (.xlsx)
    Export {
        /// Path to the order snapshot (.yaml or .json)
        order: PathBuf,

        /// Output Excel file path (default: order-<id>.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Layout preset name or layout YAML file
        #[arg(short, long, default_value = "standard", env = "MANIFEST_LAYOUT")]
        layout: String,

        /// Override the layout's zero-quantity policy
        #[arg(long, value_enum)]
        on_zero_quantity: Option<ZeroQuantityPolicy>,

        /// Show verbose export steps
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Compose the manifest and print its grid operations.

Nothing is written to disk. The JSON and YAML formats are stable and can
be diffed between runs; the same order always yields the same operations.

EXAMPLES:
  manifest preview order.yaml
  manifest preview order.yaml --format json > ops.json")]
    /// Show the grid operations of a manifest
    Preview {
        /// Path to the order snapshot (.yaml or .json)
        order: PathBuf,

        /// Layout preset name or layout YAML file
        #[arg(short, long, default_value = "standard", env = "MANIFEST_LAYOUT")]
        layout: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = PreviewFormat::Text)]
        format: PreviewFormat,
    },

    /// Dump the non-empty cells of a manifest workbook
    Inspect {
        /// Path to the Excel file (.xlsx)
        file: PathBuf,
    },

    /// List the built-in layouts
    Layouts,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "order_manifest=debug"
    } else {
        "order_manifest=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Export { verbose: true, .. });
    init_tracing(verbose);

    match cli.command {
        Commands::Export {
            order,
            output,
            layout,
            on_zero_quantity,
            verbose,
        } => cli::export(order, output, layout, on_zero_quantity, verbose)?,

        Commands::Preview {
            order,
            layout,
            format,
        } => cli::preview(order, layout, format)?,

        Commands::Inspect { file } => cli::inspect(file)?,

        Commands::Layouts => cli::layouts()?,
    }

    Ok(())
}
