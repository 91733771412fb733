//! # regalia-labels CLI
//!
//! Command-line interface for exporting address label PDFs.
//!
//! ## Usage
//!
//! ```bash
//! # List paper presets
//! regalia-labels presets
//!
//! # Export individual orders onto A4 label sheets
//! regalia-labels export --kind order --paper a4 --input orders.json
//!
//! # 25 identical labels for one ceremony, on A5 cards
//! regalia-labels export --kind ceremony --paper a5 --input ceremony.json --replicate 25
//!
//! # Run the HTTP API for the admin console
//! regalia-labels serve --listen 127.0.0.1:3001 --config labels.json
//! ```

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use regalia_labels::{
    LabelError,
    config::LabelConfig,
    export::{ExportOutcome, ExportRequest},
    preset::PaperPreset,
    record::RecordKind,
    server::{self, ServerConfig},
};

/// regalia-labels - Address label PDF export
#[derive(Parser, Debug)]
#[command(name = "regalia-labels")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available paper presets
    Presets,

    /// Export records from a JSON file to a PDF
    Export {
        /// Record kind: order, ceremony, institution, internal
        #[arg(long, value_parser = parse_kind)]
        kind: RecordKind,

        /// Paper preset key (unknown keys fall back to the default)
        #[arg(long)]
        paper: Option<String>,

        /// JSON file holding an array of records (or one record with --replicate)
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Print N identical copies of a single record
        #[arg(long, value_name = "N")]
        replicate: Option<usize>,

        /// Output path (defaults to the generated filename)
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: ConfigArgs,
    },

    /// Start the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long)]
        listen: Option<String>,

        #[command(flatten)]
        overrides: ConfigArgs,
    },
}

/// Flags shared by commands that build an exporter.
#[derive(clap::Args, Debug)]
struct ConfigArgs {
    /// JSON config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Letterhead logo (file path or URL)
    #[arg(long)]
    logo: Option<String>,

    /// Capture scale factor
    #[arg(long)]
    scale: Option<f32>,

    /// Footer text printed on every card
    #[arg(long)]
    footer: Option<String>,

    /// TTF/OTF font file
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(self) -> Result<LabelConfig, LabelError> {
        let mut config = LabelConfig::load(self.config.as_deref())?;
        if let Some(logo) = self.logo {
            config.logo = Some(logo);
        }
        if let Some(scale) = self.scale {
            config.scale = scale;
        }
        if let Some(footer) = self.footer {
            config.footer = footer;
        }
        if let Some(font) = self.font {
            config.font = Some(font);
        }
        config.validate()?;
        Ok(config)
    }
}

fn parse_kind(s: &str) -> Result<RecordKind, String> {
    RecordKind::parse(s).ok_or_else(|| format!("unknown record kind '{}'", s))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), LabelError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Presets => {
            println!("Available paper presets:");
            for preset in PaperPreset::catalog() {
                let marker = if preset.key == PaperPreset::default().key {
                    " (default)"
                } else {
                    ""
                };
                println!(
                    "  {:<12} {} per page  {}{}",
                    preset.key.as_str(),
                    preset.labels_per_page(),
                    preset.name,
                    marker
                );
            }
        }

        Commands::Export {
            kind,
            paper,
            input,
            replicate,
            output,
            overrides,
        } => {
            let config = overrides.load()?;
            let exporter = config.build_exporter()?;
            let paper = paper.unwrap_or_else(|| config.default_paper.clone());
            let request = build_request(kind, &paper, &input, replicate)?;

            match exporter.export(request).await? {
                ExportOutcome::NothingToExport => {
                    println!("Nothing to export: {} contains no records.", input.display());
                }
                ExportOutcome::Document(doc) => {
                    let path = output.unwrap_or_else(|| PathBuf::from(&doc.filename));
                    std::fs::write(&path, &doc.bytes)?;
                    info!(job = %doc.job_id, path = %path.display(), "wrote PDF");
                    println!(
                        "Wrote {} ({} labels on {} pages)",
                        path.display(),
                        doc.card_count,
                        doc.page_count
                    );
                }
            }
        }

        Commands::Serve { listen, overrides } => {
            let config = overrides.load()?;
            let exporter = config.build_exporter()?;
            let listen_addr = listen.unwrap_or_else(|| config.listen_addr.clone());
            server::serve(ServerConfig { listen_addr }, exporter).await?;
        }
    }

    Ok(())
}

/// Read the input file into an export request.
fn build_request(
    kind: RecordKind,
    paper: &str,
    input: &Path,
    replicate: Option<usize>,
) -> Result<ExportRequest, LabelError> {
    let text = std::fs::read_to_string(input)?;
    let value: Value = serde_json::from_str(&text)?;

    match (replicate, value) {
        (None, Value::Array(records)) => Ok(ExportRequest::records(kind, paper, records)),
        (None, _) => Err(LabelError::Input(format!(
            "{} must contain a JSON array of records",
            input.display()
        ))),
        (Some(count), Value::Array(mut records)) if records.len() == 1 => {
            Ok(ExportRequest::replicate(kind, paper, records.remove(0), count))
        }
        (Some(count), record @ Value::Object(_)) => Ok(ExportRequest::replicate(kind, paper, record, count)),
        (Some(_), _) => Err(LabelError::Input(format!(
            "--replicate needs exactly one record in {}",
            input.display()
        ))),
    }
}
