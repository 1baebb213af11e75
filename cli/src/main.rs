//! docweave CLI - convert .docx packages to and from the editor tree
//!
//! A command-line tool over the docweave codec: package to JSON, JSON to
//! package (fresh or patched into an original), round trips and inspection.

use clap::{Parser, Subcommand};
use colored::*;
use docweave::docx::DocxWriter;
use docweave::options::WriteOptions;
use docweave::render::JsonFormat;
use docweave::{Node, NodeKind};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Convert WordprocessingML packages to and from an editable document tree
#[derive(Parser)]
#[command(
    name = "docweave",
    version,
    about = "Convert .docx packages to and from an editable document tree",
    long_about = "docweave - bidirectional .docx codec.\n\n\
                  Reads packages into the editor's JSON tree and writes trees back \
                  into packages, patching an original package in place when given."
)]
struct Cli {
    /// Print debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a package into tree JSON
    Read {
        /// Input package path
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,
    },

    /// Write tree JSON into a package
    Write {
        /// Input JSON path
        input: PathBuf,

        /// Output package path
        #[arg(short, long)]
        output: PathBuf,

        /// Original package to patch in place
        #[arg(long)]
        original: Option<PathBuf>,

        /// Author for revisions and comments without one
        #[arg(long)]
        author: Option<String>,
    },

    /// Read a package and write it back
    Roundtrip {
        /// Input package path
        input: PathBuf,

        /// Output package path
        #[arg(short, long)]
        output: PathBuf,

        /// Patch the input package instead of building a fresh one
        #[arg(long)]
        in_place: bool,
    },

    /// Show package information and tree statistics
    Info {
        /// Input package path
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = env_logger::builder()
        .filter_module("docweave", level)
        .try_init();

    if let Err(e) = run(cli.command) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Read {
            input,
            output,
            compact,
        } => {
            let pb = create_spinner("Reading package...");

            let tree = docweave::read_file(&input)?;
            pb.set_message("Rendering to JSON...");

            let format = if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            let json = docweave::to_json(&tree, format)?;

            pb.finish_and_clear();
            write_output(output.as_ref(), &json)?;

            if let Some(path) = output {
                println!("{} Converted to JSON: {}", "✓".green().bold(), path.display());
            }
        }

        Commands::Write {
            input,
            output,
            original,
            author,
        } => {
            let pb = create_spinner("Parsing tree...");

            let tree = docweave::from_json(&fs::read_to_string(&input)?)?;
            let original = original.map(fs::read).transpose()?;
            pb.set_message("Writing package...");

            let mut options = WriteOptions::default();
            if let Some(author) = author {
                options = options.with_author(author);
            }
            let bytes = DocxWriter::with_options(options).write(&tree, original.as_deref())?;
            fs::write(&output, bytes)?;

            pb.finish_and_clear();
            println!("{} Wrote package: {}", "✓".green().bold(), output.display());
        }

        Commands::Roundtrip {
            input,
            output,
            in_place,
        } => {
            let pb = create_spinner("Reading package...");

            let data = fs::read(&input)?;
            let tree = docweave::read(&data)?;
            pb.set_message("Writing package...");

            let original = in_place.then_some(data.as_slice());
            let bytes = docweave::write(&tree, original)?;
            fs::write(&output, &bytes)?;

            pb.set_message("Verifying...");
            let back = docweave::read(&bytes)?;

            pb.finish_and_clear();
            if back.plain_text() == tree.plain_text() {
                println!("{} Round trip written: {}", "✓".green().bold(), output.display());
            } else {
                println!(
                    "{} Round trip written with text differences: {}",
                    "!".yellow().bold(),
                    output.display()
                );
            }
        }

        Commands::Info { input } => {
            let pb = create_spinner("Analyzing package...");

            let data = fs::read(&input)?;
            let kind = docweave::detect_package(&data)?;
            let tree = docweave::read(&data)?;

            pb.finish_and_clear();
            print_info(&input, kind, &tree);
        }
    }

    Ok(())
}

fn print_info(input: &Path, kind: docweave::PackageKind, tree: &Node) {
    println!("{}", "Package Information".cyan().bold());
    println!("{}", "─".repeat(40));
    println!(
        "{}: {}",
        "File".bold(),
        input.file_name().unwrap_or_default().to_string_lossy()
    );
    println!("{}: {}", "Kind".bold(), kind);

    if let Node::Document { attrs, .. } = tree {
        if let Some(size) = attrs.section.as_ref().and_then(|s| s.page_size.as_ref()) {
            if let (Some(w), Some(h)) = (size.width, size.height) {
                println!("{}: {} x {} twips", "Page".bold(), w, h);
            }
        }
    }

    println!("\n{}", "Tree Statistics".cyan().bold());
    println!("{}", "─".repeat(40));
    for (label, kind) in [
        ("Paragraphs", NodeKind::Paragraph),
        ("Headings", NodeKind::Heading),
        ("Bullet lists", NodeKind::BulletList),
        ("Ordered lists", NodeKind::OrderedList),
        ("Tables", NodeKind::Table),
    ] {
        println!("{}: {}", label.bold(), tree.count_kind(kind));
    }

    let mut comments = std::collections::BTreeSet::new();
    let mut revisions = 0;
    tree.walk(&mut |node| {
        if let Some(marks) = node.marks() {
            if let Some(comment) = marks.comment() {
                comments.insert(comment.comment_id.clone());
            }
            if marks.insertion().is_some() || marks.deletion().is_some() {
                revisions += 1;
            }
        }
    });
    println!("{}: {}", "Comments".bold(), comments.len());
    println!("{}: {}", "Revised runs".bold(), revisions);

    let text = tree.plain_text();
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());
    println!("{}: {}", "Characters".bold(), text.chars().count());
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}
