//! formfill CLI - fill PDF forms with drawn, flattened values

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use formfill::events::FormObserver;
use formfill::raster::BlankRasterizer;
use formfill::render::overlay_to_json;
use formfill::{
    FieldKind, FieldRegistry, FormParser, FormProfile, FormSession, GenerateOptions, JsonFormat,
    LoadOptions, PageSelection, RenderOptions, StringRecordStore,
};

#[derive(Parser)]
#[command(name = "formfill")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Fill PDF forms and flatten the result", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the form fields of a PDF
    #[command(alias = "ls")]
    Fields {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Built-in profile name or profile JSON file
        #[arg(short, long, env = "FORMFILL_PROFILE", default_value = "generic")]
        profile: String,

        /// Write the field list as CSV
        #[arg(long, conflicts_with = "json")]
        csv: bool,

        /// Write the field list as JSON
        #[arg(long)]
        json: bool,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Draw a value record into a PDF
    Fill {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Value record (JSON object)
        #[arg(short, long, value_name = "FILE")]
        data: PathBuf,

        /// Image for an image field, as NAME=PATH
        #[arg(long = "image", value_name = "NAME=PATH")]
        images: Vec<String>,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Built-in profile name or profile JSON file
        #[arg(short, long, env = "FORMFILL_PROFILE", default_value = "generic")]
        profile: String,

        /// Keep the interactive form instead of flattening it
        #[arg(long)]
        no_flatten: bool,

        /// Fail on the first malformed field instead of skipping it
        #[arg(long)]
        strict: bool,
    },

    /// Lay out the editing overlay and print it as JSON
    Preview {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Value record (JSON object)
        #[arg(short, long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// Display zoom in percent
        #[arg(long, default_value = "100")]
        zoom: u32,

        /// Page range (e.g., "1-2", "1,3")
        #[arg(long)]
        pages: Option<String>,

        /// Include debug boxes for every field
        #[arg(long)]
        debug: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Also write blank page backgrounds at render scale to this directory
        #[arg(long, value_name = "DIR")]
        backgrounds: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Built-in profile name or profile JSON file
        #[arg(short, long, env = "FORMFILL_PROFILE", default_value = "generic")]
        profile: String,
    },

    /// Print a built-in profile as JSON
    Profile {
        /// Profile name ("generic" or "dnd-5e")
        #[arg(value_name = "NAME", default_value = "dnd-5e")]
        name: String,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show document and form information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Built-in profile name or profile JSON file
        #[arg(short, long, env = "FORMFILL_PROFILE", default_value = "generic")]
        profile: String,
    },

    /// Show version information
    Version,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Fields {
            input,
            profile,
            csv,
            json,
            output,
        }) => cmd_fields(&input, &profile, csv, json, output.as_deref()),
        Some(Commands::Fill {
            input,
            data,
            images,
            output,
            profile,
            no_flatten,
            strict,
        }) => cmd_fill(
            &input,
            &data,
            &images,
            output.as_deref(),
            &profile,
            !no_flatten,
            strict,
        ),
        Some(Commands::Preview {
            input,
            data,
            zoom,
            pages,
            debug,
            compact,
            backgrounds,
            output,
            profile,
        }) => cmd_preview(
            &input,
            data.as_deref(),
            zoom,
            pages.as_deref(),
            debug,
            compact,
            backgrounds.as_deref(),
            output.as_deref(),
            &profile,
        ),
        Some(Commands::Profile { name, output }) => cmd_profile(&name, output.as_deref()),
        Some(Commands::Info { input, profile }) => cmd_info(&input, &profile),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: formfill <COMMAND> <FILE>".yellow());
            println!("       formfill --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// A built-in profile by name, otherwise a profile JSON file.
fn resolve_profile(spec: &str) -> Result<FormProfile, Box<dyn std::error::Error>> {
    if let Some(profile) = FormProfile::builtin(spec) {
        log::debug!("Using built-in profile '{}'", profile.name);
        return Ok(profile);
    }
    let path = Path::new(spec);
    if path.exists() {
        log::debug!("Loading profile from {}", path.display());
        return Ok(FormProfile::from_path(path)?);
    }
    Err(format!("Unknown profile '{}' (not a built-in name or a file)", spec).into())
}

fn write_or_print(output: Option<&Path>, text: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, text)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", text);
    }
    Ok(())
}

fn cmd_fields(
    input: &Path,
    profile: &str,
    csv: bool,
    json: bool,
    output: Option<&Path>,
) -> CliResult {
    let profile = resolve_profile(profile)?;
    let registry = formfill::load_file(input, &profile)?;

    if csv {
        return write_or_print(output, &registry.to_csv(&profile));
    }
    if json {
        let catalog = registry.catalog(&profile)?;
        return write_or_print(output, &serde_json::to_string_pretty(&catalog)?);
    }

    let mut text = String::new();
    for entry in registry.catalog(&profile)? {
        let kind = match entry.kind {
            FieldKind::Text => format!("{:<10}", "text").normal(),
            FieldKind::Checkbox => format!("{:<10}", "checkbox").yellow(),
            FieldKind::Image => format!("{:<10}", "image").magenta(),
        };
        let source = registry
            .page_source(&entry.name)
            .map(|s| format!("{:?}", s).to_lowercase())
            .unwrap_or_default();
        text.push_str(&format!(
            "{:<40} {} page {} ({})\n",
            entry.display_name,
            kind,
            entry.page_index + 1,
            source.as_str().dimmed()
        ));
    }
    for skipped in registry.skipped() {
        text.push_str(&format!(
            "{} {}: {}\n",
            "Skipped".yellow(),
            skipped.name,
            skipped.reason
        ));
    }
    write_or_print(output, text.trim_end())
}

fn cmd_fill(
    input: &Path,
    data: &Path,
    images: &[String],
    output: Option<&Path>,
    profile: &str,
    flatten: bool,
    strict: bool,
) -> CliResult {
    let output_path = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_filled.pdf", stem))
    });

    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Loading form...");
    let load_options = if strict {
        LoadOptions::new().strict()
    } else {
        LoadOptions::new().lenient()
    };
    let mut session = FormSession::new(resolve_profile(profile)?).with_load_options(load_options);
    session.load_file(input)?;
    pb.inc(1);

    pb.set_message("Reading values...");
    let record = StringRecordStore::new(fs::read_to_string(data)?);
    pb.inc(1);

    pb.set_message("Attaching images...");
    for spec in images {
        let (name, path) = spec
            .split_once('=')
            .ok_or_else(|| format!("Invalid image '{}': expected NAME=PATH", spec))?;
        session.attach_image(name, &fs::read(path)?)?;
    }
    pb.inc(1);

    pb.set_message("Generating PDF...");
    let options = GenerateOptions::new().with_flatten(flatten);
    let generated = session.generate(&record, &options)?;
    fs::write(&output_path, &generated.bytes)?;
    pb.inc(1);
    pb.finish_with_message("Done!");

    let report = &generated.report;
    println!("\n{}", "Filled:".green().bold());
    println!("  {} {} text field(s)", "├─".dimmed(), report.text_fields);
    println!("  {} {} checkbox(es)", "├─".dimmed(), report.checkboxes);
    println!("  {} {} image(s)", "├─".dimmed(), report.images);
    println!(
        "  {} {} unknown record key(s)",
        "└─".dimmed(),
        report.unknown_fields
    );
    for skipped in &report.skipped {
        println!("{} {}: {}", "Skipped".yellow(), skipped.name, skipped.reason);
    }
    println!("{} {}", "Saved to".green(), output_path.display());

    Ok(())
}

/// Drives a progress bar from page cache events.
struct CacheProgress(ProgressBar);

impl FormObserver for CacheProgress {
    fn on_progress(&mut self, page: usize, total: usize, percent: u32) {
        self.0.set_position(u64::from(percent));
        self.0.set_message(format!("Page {}/{}", page, total));
        if percent == 100 {
            self.0.finish_with_message("Pages cached");
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_preview(
    input: &Path,
    data: Option<&Path>,
    zoom: u32,
    pages: Option<&str>,
    debug: bool,
    compact: bool,
    backgrounds: Option<&Path>,
    output: Option<&Path>,
    profile: &str,
) -> CliResult {
    let page_selection = if let Some(p) = pages {
        PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?
    } else {
        PageSelection::All
    };

    let render_options = RenderOptions::new()
        .with_debug(debug)
        .with_pages(page_selection);
    let mut session = FormSession::new(resolve_profile(profile)?).with_render_options(render_options);
    session.load_file(input)?;
    session.set_zoom_percent(zoom);

    if let Some(dir) = backgrounds {
        fs::create_dir_all(dir)?;
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}% {msg}")?
                .progress_chars("#>-"),
        );
        session.subscribe(CacheProgress(pb));

        let mut rasterizer = BlankRasterizer::new(session.registry()?.pages().to_vec());
        session.cache_pages(&mut rasterizer)?;
        if let Some(cache) = session.page_cache() {
            for (index, page) in cache.pages().iter().enumerate() {
                fs::write(dir.join(format!("page-{}.png", index + 1)), &page.png)?;
            }
        }
    }

    let text = match data {
        Some(path) => fs::read_to_string(path)?,
        None => "{}".to_string(),
    };
    let record = StringRecordStore::new(text);
    let pages = session.render_overlay(&record)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = overlay_to_json(pages, format)?;
    write_or_print(output, &json)
}

fn cmd_profile(name: &str, output: Option<&Path>) -> CliResult {
    let profile = FormProfile::builtin(name)
        .ok_or_else(|| format!("No built-in profile named '{}'", name))?;
    write_or_print(output, &profile.to_json()?)
}

fn cmd_info(input: &Path, profile: &str) -> CliResult {
    let profile = resolve_profile(profile)?;
    let parser = FormParser::open_with_options(input, LoadOptions::new().lenient())?;
    let registry = FieldRegistry::build(&parser, &profile)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), parser.version());
    println!("{}: {}", "Pages".bold(), parser.page_count());
    println!(
        "{}: {}",
        "AcroForm".bold(),
        if parser.has_form() { "Yes" } else { "No" }
    );
    println!("{}: {}", "Profile".bold(), profile.name);

    println!();
    println!("{}", "Form Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let count = |kind: FieldKind| registry.iter().filter(|f| f.kind == kind).count();
    println!("{}: {}", "Text fields".bold(), count(FieldKind::Text));
    println!("{}: {}", "Checkboxes".bold(), count(FieldKind::Checkbox));
    println!("{}: {}", "Image fields".bold(), count(FieldKind::Image));
    println!(
        "{}: {}",
        "Multiline".bold(),
        registry.iter().filter(|f| f.is_multiline).count()
    );
    println!("{}: {}", "Skipped".bold(), registry.skipped().len());

    for (index, page) in registry.pages().iter().enumerate() {
        println!(
            "{} {}: {} x {} pt, {} field(s)",
            "Page".bold(),
            index + 1,
            page.width,
            page.height,
            registry.fields_on_page(index).count()
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "formfill".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF form filling and flattening tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/formfill".dimmed());
    println!("License: MIT");
}
