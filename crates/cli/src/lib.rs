use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc_model::{apply_document_action, Document, DocumentAction, MaterialEntry, ObjectId};
use matquote_core::{
    AnnotateRequest, AnnotationSettings, Bridge, Color, ExportRequest, HostRequest, HostResponse,
    LocalHost, Point, Quoting, ReportVariant, SelectionValue,
};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use storage::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "matquote")]
#[command(about = "Material annotation and quote export")]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(long, global = true)]
    verbose: bool,
    /// Directory holding the material catalog and settings.
    #[arg(long, global = true, value_name = "DIR", env = "MATQUOTE_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Settings file (JSON); defaults to settings.json in the data directory.
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Report host and document state.
    Probe {
        #[arg(long, value_name = "FILE")]
        document: Option<PathBuf>,
    },
    /// Annotate the selected objects of a document.
    Annotate {
        #[arg(long, value_name = "FILE")]
        document: PathBuf,
        /// Material to apply, optionally with a quantity: `NAME` or `NAME=QTY`.
        #[arg(long = "material", value_name = "NAME[=QTY]", required = true, value_parser = parse_selection)]
        materials: Vec<SelectionValue>,
        /// Label position in document units.
        #[arg(long, value_name = "X,Y", value_parser = parse_point)]
        at: Point,
        /// Object ids to select instead of the document's saved selection.
        #[arg(long, value_name = "ID", value_delimiter = ',')]
        select: Vec<u64>,
        /// Where to write the annotated document; defaults to overwriting the input.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Export all annotated objects to a CSV quote.
    Export {
        #[arg(long, value_name = "FILE")]
        document: PathBuf,
        #[arg(long, value_name = "DIR", default_value = ".")]
        output_dir: PathBuf,
        /// Report layout: `quantity` or `unit-price`.
        #[arg(long, value_name = "VARIANT", value_parser = parse_variant)]
        variant: Option<ReportVariant>,
        /// Quote every CSV field.
        #[arg(long)]
        quote_all: bool,
    },
    /// Manage the material catalog.
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Subcommand)]
enum CatalogCommand {
    /// Print the catalog as JSON.
    List,
    /// Add or replace a material.
    Add {
        name: String,
        #[arg(long, value_name = "#RRGGBB")]
        color: String,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long)]
        unit_price: Option<f64>,
    },
    /// Remove a material.
    Remove { name: String },
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_tracing(cli.verbose);

    let storage = match &cli.data_dir {
        Some(dir) => Storage::with_root(dir),
        None => Storage::from_default_project().context("failed to locate data directory")?,
    };

    match cli.command {
        Commands::Probe { document } => {
            let document = document.as_deref().map(load_document).transpose()?;
            let settings = load_settings(&storage, cli.settings.as_deref())?;
            let catalog = storage.load_catalog().context("failed to load material catalog")?;
            let mut host = LocalHost::new(document, catalog, settings);
            let response = call(&mut host, &HostRequest::Probe)?;
            finish(&response)
        }
        Commands::Annotate { document, materials, at, select, output } => {
            run_annotate(&storage, cli.settings.as_deref(), &document, materials, at, &select, output)
        }
        Commands::Export { document, output_dir, variant, quote_all } => {
            let mut settings = load_settings(&storage, cli.settings.as_deref())?;
            if let Some(variant) = variant {
                settings = settings.with_report_variant(variant);
            }
            if quote_all {
                settings = settings.with_quoting(Quoting::All);
            }
            let document = load_document(&document)?;
            let catalog = storage.load_catalog().context("failed to load material catalog")?;
            let mut host = LocalHost::new(Some(document), catalog, settings);
            let response = call(&mut host, &HostRequest::Export(ExportRequest { output_dir }))?;
            finish(&response)
        }
        Commands::Catalog { command } => run_catalog(&storage, command),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("MATQUOTE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second call in the same process keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_annotate(
    storage: &Storage,
    settings_path: Option<&Path>,
    document_path: &Path,
    selections: Vec<SelectionValue>,
    at: Point,
    select: &[u64],
    output: Option<PathBuf>,
) -> Result<()> {
    let settings = load_settings(storage, settings_path)?;
    let catalog = storage.load_catalog().context("failed to load material catalog")?;
    let mut document = load_document(document_path)?;

    if !select.is_empty() {
        let ids = select.iter().copied().map(ObjectId).collect();
        apply_document_action(&mut document, DocumentAction::SetSelection { ids })
            .context("invalid --select")?;
    }

    let mut host = LocalHost::new(Some(document), catalog, settings);
    let request =
        HostRequest::Annotate(AnnotateRequest { selections, label_position: at });
    let response = call(&mut host, &request)?;

    if response.success {
        let output = output.unwrap_or_else(|| document_path.to_path_buf());
        if let Some(document) = host.document() {
            save_document(&output, document)?;
        }
    }

    finish(&response)
}

fn run_catalog(storage: &Storage, command: CatalogCommand) -> Result<()> {
    let mut catalog = storage.load_catalog().context("failed to load material catalog")?;

    match command {
        CatalogCommand::List => {}
        CatalogCommand::Add { name, color, unit, unit_price } => {
            let color = Color::from_hex(&color).map_err(|e| anyhow::anyhow!(e.user_message()))?;
            let unit = unit.filter(|unit| !unit.trim().is_empty());
            catalog.insert(name, MaterialEntry { color: color.to_hex(), unit, unit_price });
            storage.save_catalog(&catalog).context("failed to save material catalog")?;
        }
        CatalogCommand::Remove { name } => {
            if catalog.remove(&name).is_none() {
                anyhow::bail!("material not found: {name}");
            }
            storage.save_catalog(&catalog).context("failed to save material catalog")?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}

fn call(host: &mut LocalHost, request: &HostRequest) -> Result<HostResponse> {
    let mut bridge = Bridge::new();
    bridge.call(host, request).context("host request failed")
}

/// Print the response envelope; a failed response becomes the command's error.
fn finish(response: &HostResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    if !response.success {
        anyhow::bail!("{}", response.message);
    }
    Ok(())
}

fn load_settings(storage: &Storage, explicit: Option<&Path>) -> Result<AnnotationSettings> {
    let settings = match explicit {
        Some(path) => AnnotationSettings::from_file(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?,
        None => {
            let path = storage.settings_path();
            if path.exists() {
                AnnotationSettings::from_file(&path)
                    .with_context(|| format!("failed to read settings from {}", path.display()))?
            } else {
                AnnotationSettings::default()
            }
        }
    };

    settings.merge_env().context("invalid MATQUOTE_* environment variable")
}

fn load_document(path: &Path) -> Result<Document> {
    if !path.is_file() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("failed to parse document {}", path.display()))
}

fn save_document(path: &Path, document: &Document) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_vec_pretty(document)?;
    fs::write(path, json).with_context(|| format!("failed to write document to {}", path.display()))
}

fn parse_selection(value: &str) -> Result<SelectionValue, String> {
    let (material, quantity) = match value.split_once('=') {
        Some((material, quantity)) => (material.trim(), quantity.trim()),
        None => (value.trim(), ""),
    };

    if material.is_empty() {
        return Err("material name must not be empty".to_owned());
    }

    Ok(SelectionValue { material: material.to_owned(), quantity: quantity.to_owned() })
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value.split_once(',').ok_or_else(|| "expected X,Y".to_owned())?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("invalid x: {e}"))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("invalid y: {e}"))?;
    Ok(Point::new(x, y))
}

fn parse_variant(value: &str) -> Result<ReportVariant, String> {
    value.parse().map_err(|()| format!("unknown report variant: {value}"))
}
