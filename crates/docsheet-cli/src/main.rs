mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "docsheet",
    version,
    about = "Extract tables and text from PDF or HTML documents into a spreadsheet"
)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a PDF or HTML document and export the result as .xlsx
    Extract {
        /// Path to a PDF or HTML file
        input_file: PathBuf,

        /// Workbook to write
        #[arg(short = 'O', long = "out", value_name = "FILE", default_value = docsheet_core::export::DEFAULT_OUTPUT_FILE)]
        out: PathBuf,

        /// Skip writing the workbook
        #[arg(long)]
        no_export: bool,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// MIME type of the input (guessed from the extension by default)
        #[arg(long, value_name = "TYPE")]
        mime: Option<String>,

        /// Config file (default: <config dir>/docsheet/config.toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Row clustering tolerance in PDF units
        #[arg(long)]
        tolerance: Option<f64>,

        /// Raster scale factor for OCR pages
        #[arg(long)]
        scale: Option<f32>,

        /// OCR language (tesseract language code)
        #[arg(long)]
        lang: Option<String>,
    },
    /// Print the sheets of an exported workbook
    Inspect {
        /// Path to an .xlsx file
        workbook: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            input_file,
            out,
            no_export,
            output,
            mime,
            config,
            tolerance,
            scale,
            lang,
        } => commands::extract::run(commands::extract::ExtractArgs {
            input_file,
            out: (!no_export).then_some(out),
            output_format: output,
            mime,
            config,
            tolerance,
            scale,
            lang,
        }),
        Commands::Inspect { workbook } => commands::inspect::run(&workbook).map(|()| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
