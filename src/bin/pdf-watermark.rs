//! PDF Watermark CLI tool
//!
//! A command-line tool for stamping text watermarks onto PDF files.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use std::path::{Path, PathBuf};
use std::process;

use pdf_watermark::layout::PageGeometry;
use pdf_watermark::pdf::{
    diagonal_pattern, inspect_file, render_overlay, watermark_file, DiagonalOptions, PageSizing,
    WatermarkOptions, WatermarkReport,
};
use pdf_watermark::spec::{WatermarkRequest, WatermarkSpec};

/// PDF Watermark - Stamp text watermarks onto every page of a PDF
#[derive(Parser)]
#[command(name = "pdf-watermark")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Diagonal, semi-transparent stamp in the middle of every page
    pdf-watermark apply report.pdf -o out.pdf --text CONFIDENTIAL --rotation 45 --opacity 0.3

    # Several watermarks from a JSON request file
    pdf-watermark apply report.pdf -o out.pdf --request watermarks.json

    # Watermark every PDF in a folder into another folder
    pdf-watermark apply \"scans/*.pdf\" -o stamped/ --text DRAFT --position top-right

    # Repeat a stamp along the page diagonal
    pdf-watermark diagonal report.pdf -o out.pdf --text COPY --spacing 120")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add watermarks to one or more PDF files
    Apply {
        /// Input PDF files. Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path (a directory when there are several inputs)
        #[arg(short, long)]
        output: PathBuf,

        /// JSON request: {"watermarks": [...]} or a bare list of watermarks
        #[arg(long, conflicts_with = "text")]
        request: Option<PathBuf>,

        #[command(flatten)]
        spec: SpecArgs,

        /// Resolve positions against each page's own size instead of the first page's
        #[arg(long)]
        per_page: bool,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Repeat one watermark along the page diagonal
    Diagonal {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Watermark text
        #[arg(long)]
        text: String,

        /// Font size in points
        #[arg(long, default_value_t = 24.0)]
        font_size: f32,

        /// Text color as #rrggbb
        #[arg(long, default_value = "#000000")]
        color: String,

        /// Opacity from 0 to 1
        #[arg(long, default_value_t = 0.3)]
        opacity: f32,

        /// Distance between stamps in points
        #[arg(long, default_value_t = 100.0)]
        spacing: f32,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Write only the watermark layer, to preview placement
    Overlay {
        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Page width in points
        #[arg(long, default_value_t = 612.0)]
        width: f32,

        /// Page height in points
        #[arg(long, default_value_t = 792.0)]
        height: f32,

        /// JSON request: {"watermarks": [...]} or a bare list of watermarks
        #[arg(long, conflicts_with = "text")]
        request: Option<PathBuf>,

        #[command(flatten)]
        spec: SpecArgs,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// A single watermark given on the command line
#[derive(Args)]
struct SpecArgs {
    /// Watermark text
    #[arg(long)]
    text: Option<String>,

    /// top-left, top-center, top-right, center-left, center, center-right,
    /// bottom-left, bottom-center, bottom-right, custom, or "x,y"
    #[arg(long, default_value = "center")]
    position: String,

    /// X offset for --position custom (default 300)
    #[arg(long)]
    custom_x: Option<f32>,

    /// Offset from the top edge for --position custom (default 400)
    #[arg(long)]
    custom_y: Option<f32>,

    /// Font size in points
    #[arg(long, default_value_t = 24.0)]
    font_size: f32,

    /// Text color as #rrggbb
    #[arg(long, default_value = "#000000")]
    color: String,

    /// Opacity from 0 to 1
    #[arg(long, default_value_t = 0.5)]
    opacity: f32,

    /// Counter-clockwise rotation in degrees
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    rotation: i32,
}

impl SpecArgs {
    fn to_spec(&self) -> Option<WatermarkSpec> {
        let text = self.text.clone()?;
        Some(WatermarkSpec {
            position: self.position.clone(),
            custom_x: self.custom_x,
            custom_y: self.custom_y,
            font_size: self.font_size,
            color: self.color.clone(),
            opacity: self.opacity,
            rotation: self.rotation,
            ..WatermarkSpec::new(text)
        })
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Apply { inputs, output, request, spec, per_page, open } => {
            cmd_apply(inputs, output, request, spec, per_page, open)
        }
        Commands::Diagonal { input, output, text, font_size, color, opacity, spacing, open } => {
            let options = DiagonalOptions { font_size, color, opacity, spacing };
            cmd_diagonal(input, output, text, options, open)
        }
        Commands::Overlay { output, width, height, request, spec } => {
            cmd_overlay(output, PageGeometry::new(width, height), request, spec)
        }
        Commands::Info { input, json } => cmd_info(input, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = false;
            for entry in glob(&pattern).with_context(|| format!("Invalid glob pattern: {pattern}"))? {
                match entry {
                    Ok(path) => {
                        paths.push(path);
                        matched = true;
                    }
                    Err(e) => eprintln!("Warning: glob error for {}: {}", pattern, e),
                }
            }
            if !matched {
                bail!("No files matched pattern: {}", pattern);
            }
        } else {
            // No glob characters, treat as literal path
            paths.push(PathBuf::from(pattern));
        }
    }

    // Sort paths for consistent ordering
    paths.sort();

    Ok(paths)
}

/// Open a file with the system default application
fn open_file(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

/// Watermarks from a request file, or the single one given by flags
fn load_specs(request: Option<&Path>, args: &SpecArgs) -> Result<Vec<WatermarkSpec>> {
    if let Some(path) = request {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file {}", path.display()))?;
        let specs = WatermarkRequest::from_json(&json)?.into_specs()?;
        return Ok(specs);
    }

    match args.to_spec() {
        Some(spec) => Ok(vec![spec]),
        None => bail!("Specify the watermark with --text or --request"),
    }
}

fn print_report(report: &WatermarkReport) {
    for notice in &report.fallbacks {
        eprintln!("Warning: {}", notice);
    }
    eprintln!(
        "Applied {} watermark(s) to {} page(s)",
        report.watermark_count, report.page_count
    );
}

/// Add watermarks to PDFs
fn cmd_apply(
    inputs: Vec<String>,
    output: PathBuf,
    request: Option<PathBuf>,
    spec: SpecArgs,
    per_page: bool,
    open: bool,
) -> Result<()> {
    let specs = load_specs(request.as_deref(), &spec)?;
    let inputs = expand_globs(inputs)?;

    let options = WatermarkOptions {
        sizing: if per_page { PageSizing::PerPage } else { PageSizing::Uniform },
        ..Default::default()
    };

    // Several inputs (or an existing directory) write into a directory
    let batch = inputs.len() > 1 || output.is_dir();
    if batch {
        std::fs::create_dir_all(&output)
            .with_context(|| format!("Failed to create output directory {}", output.display()))?;
    }

    for input in &inputs {
        let target = if batch {
            let name = input
                .file_name()
                .with_context(|| format!("Not a file: {}", input.display()))?;
            output.join(format!("watermarked_{}", name.to_string_lossy()))
        } else {
            output.clone()
        };

        eprintln!("Watermarking {}...", input.display());
        let report = watermark_file(input, &target, &specs, &options)
            .with_context(|| format!("Failed to watermark {}", input.display()))?;
        print_report(&report);
        eprintln!("Output: {}", target.display());

        if open && !batch {
            open_file(&target)?;
        }
    }

    Ok(())
}

/// Stamp a diagonal run of watermarks
fn cmd_diagonal(
    input: PathBuf,
    output: PathBuf,
    text: String,
    options: DiagonalOptions,
    open: bool,
) -> Result<()> {
    let info = inspect_file(&input)?;
    let specs = diagonal_pattern(&text, &options, info.page_size)?;

    eprintln!("Stamping {} diagonal watermark(s)...", specs.len());
    let report = watermark_file(&input, &output, &specs, &WatermarkOptions::default())?;
    print_report(&report);
    eprintln!("Output: {}", output.display());

    if open {
        open_file(&output)?;
    }

    Ok(())
}

/// Write the overlay page on its own
fn cmd_overlay(
    output: PathBuf,
    geometry: PageGeometry,
    request: Option<PathBuf>,
    spec: SpecArgs,
) -> Result<()> {
    let specs = load_specs(request.as_deref(), &spec)?;
    let overlay = render_overlay(&specs, geometry)?;

    for notice in overlay.fallbacks() {
        eprintln!("Warning: {}", notice);
    }

    overlay.save(&output)?;
    eprintln!("Overlay: {}", output.display());

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: PathBuf, json: bool) -> Result<()> {
    let info = inspect_file(&input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", input.display());
    println!("Pages: {}", info.page_count);
    println!("Page size: {} x {} pt", info.page_size.width, info.page_size.height);

    Ok(())
}
