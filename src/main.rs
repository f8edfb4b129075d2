mod config;
mod error;
mod pdf;
mod report;

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style, Table, Tabled};

use crate::config::{config_dir, load_config, resolve_output_dir, CONFIG_TEMPLATE};
use crate::error::{ReportError, Result};
use crate::pdf::render_pdf;
use crate::report::{build_document, ReportDocument, ReportKind, ReportPayload};

#[derive(Parser)]
#[command(name = "shipforms")]
#[command(version, about = "Shipment report PDF generator", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.shipforms or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config file
    Init,

    /// List supported report types
    Types,

    /// Print the computed table model without rendering a PDF
    Preview {
        /// Report type (see 'shipforms types')
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        kind: String,

        /// Payload JSON file, or '-' for stdin
        #[arg(short, long)]
        input: PathBuf,

        /// Company/customer label for the document title
        #[arg(long)]
        title: Option<String>,
    },

    /// Generate report PDFs from a payload file
    Generate {
        /// Report type (see 'shipforms types')
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        kind: String,

        /// Payload JSON file, or '-' for stdin
        #[arg(short, long)]
        input: PathBuf,

        /// Company/customer label for the document title
        #[arg(long)]
        title: Option<String>,

        /// Custom output file path (default: output_dir/<type>-<epoch>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open generated PDF with system default viewer
        #[arg(long)]
        open: bool,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Types => cmd_types(),
        Commands::Preview { kind, input, title } => cmd_preview(&kind, &input, title),
        Commands::Generate {
            kind,
            input,
            title,
            output,
            open,
        } => cmd_generate(&cfg_dir, &kind, &input, title, output, open),
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(ReportError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized shipforms config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit your company details:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!();
    println!("Then generate your first report:");
    println!("  shipforms generate --type release-form --input payload.json --title \"Storage Co\"");

    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct TypeRow {
    #[tabled(rename = "TYPE")]
    tag: &'static str,
    #[tabled(rename = "TITLE")]
    title: &'static str,
    #[tabled(rename = "PAYLOAD SHAPE")]
    shape: &'static str,
}

/// List supported report types
fn cmd_types() -> Result<()> {
    let rows: Vec<TypeRow> = ReportKind::ALL
        .iter()
        .map(|kind| TypeRow {
            tag: kind.tag(),
            title: kind.title_label(),
            shape: kind.shape(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// Read the payload text from a file or stdin ('-')
fn read_payload(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(std::fs::read_to_string(input)?)
    }
}

/// Build one document per report to generate. The allocation sheet
/// mirrors the dispatch flow of the shipment service: one document per
/// customer, titled from the customer record unless --title overrides it.
/// Every other type requires an explicit --title and yields one document.
fn plan_documents(
    kind: ReportKind,
    payload: &ReportPayload,
    title: Option<String>,
) -> Result<Vec<ReportDocument>> {
    match (kind, payload) {
        (ReportKind::AllocationSheet, ReportPayload::Customers(customers)) => customers
            .iter()
            .map(|customer| {
                let single = ReportPayload::Customers(vec![customer.clone()]);
                let name = title
                    .clone()
                    .unwrap_or_else(|| customer.display_name().to_string());
                build_document(kind, &single, &name)
            })
            .collect(),
        _ => {
            let title = title.ok_or(ReportError::MissingTitle(kind.tag()))?;
            Ok(vec![build_document(kind, payload, &title)?])
        }
    }
}

/// Print the computed table model
fn cmd_preview(kind: &str, input: &Path, title: Option<String>) -> Result<()> {
    let kind: ReportKind = kind.parse()?;
    let payload = ReportPayload::decode_text(kind, &read_payload(input)?)?;
    let documents = plan_documents(kind, &payload, title)?;

    for document in &documents {
        print_document(document);
    }

    Ok(())
}

fn print_document(document: &ReportDocument) {
    println!("{}", document.title);
    println!("{}", "-".repeat(document.title.len()));

    for section in &document.sections {
        if let Some(heading) = &section.heading {
            println!("{heading}");
        }

        let mut builder = Builder::default();
        for row in &section.rows {
            builder.push_record(row.cells.iter().map(|cell| cell.text().to_string()));
        }
        let table = builder.build().with(Style::rounded()).to_string();
        println!("{table}");
        println!();
    }
}

/// Generate report PDFs
fn cmd_generate(
    cfg_dir: &Path,
    kind: &str,
    input: &Path,
    title: Option<String>,
    output: Option<PathBuf>,
    open: bool,
) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(ReportError::ConfigNotFound(cfg_dir.to_path_buf()));
    }

    let kind: ReportKind = kind.parse()?;
    let config = load_config(cfg_dir)?;
    let payload = ReportPayload::decode_text(kind, &read_payload(input)?)?;
    let documents = plan_documents(kind, &payload, title)?;

    let output_dir = resolve_output_dir(&config.pdf.output_dir, cfg_dir);
    std::fs::create_dir_all(&output_dir)?;

    let epoch = chrono::Utc::now().timestamp();
    let mut saved = Vec::with_capacity(documents.len());

    for (index, document) in documents.iter().enumerate() {
        let bytes = render_pdf(document, &config.company, &config.pdf.paper)?;

        let pdf_path = match (&output, documents.len()) {
            (Some(path), 1) => path.clone(),
            (Some(path), _) => numbered_path(path, index + 1),
            (None, 1) => output_dir.join(format!("{}-{epoch}.pdf", kind.tag())),
            (None, _) => output_dir.join(format!("{}-{}-{epoch}.pdf", kind.tag(), index + 1)),
        };
        std::fs::write(&pdf_path, &bytes)?;

        println!("Generated {}", document.title);
        println!("  Sections: {}", document.sections.len());
        println!("  Saved:    {}", pdf_path.display());

        saved.push(pdf_path);
    }

    if open {
        for path in &saved {
            open_path(path)?;
        }
    }

    Ok(())
}

/// Derive a per-customer output path when one --output is given for a
/// multi-document allocation run
fn numbered_path(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report");
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{stem}-{index}.pdf"))
}

fn open_path(pdf_path: &Path) -> Result<()> {
    // Open with system default viewer
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(pdf_path)
            .spawn()
            .map_err(ReportError::Io)?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(pdf_path)
            .spawn()
            .map_err(ReportError::Io)?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", pdf_path.to_str().unwrap_or("")])
            .spawn()
            .map_err(ReportError::Io)?;
    }
    Ok(())
}
