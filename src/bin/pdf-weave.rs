//! PDF Weave CLI tool
//!
//! A command-line tool for normalizing, merging and stamping text onto PDFs.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::glob;
use std::path::{Path, PathBuf};

use pdf_weave::pdf::{
    merge_pdfs, read_metadata, read_pdf, write_pdf, Align, MergeOptions, Position, TextOptions,
};

/// PDF Weave - Rewrite, merge and annotate PDFs
#[derive(Parser)]
#[command(name = "pdf-weave")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Rewrite a PDF with a fresh cross-reference table
    pdf-weave normalize input.pdf -o clean.pdf

    # Carry the objects of numbered PDFs into the first one; only the
    # first file's pages are shown, the page trees are not combined
    pdf-weave merge -o combined.pdf \"[0-9]*.pdf\"

    # Stamp centered text at the bottom of page 2
    pdf-weave text input.pdf -o out.pdf --font LiberationSerif-Regular.ttf \\
        --page 2 --x 306 --y 36 --align center \"Page 2\"

Set RUST_LOG=debug for detailed progress.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a PDF and write it back out
    Normalize {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Copy every object of the later PDFs into the first one
    ///
    /// Object numbers are renumbered so nothing collides, but page trees are
    /// not combined: the output shows the first file's pages only.
    Merge {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Draw text on a page with an embedded TrueType font
    Text {
        /// Input PDF file
        input: PathBuf,

        /// Text to draw
        text: String,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// TrueType font file (.ttf)
        #[arg(long)]
        font: PathBuf,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Horizontal position in points from the left edge
        #[arg(long, default_value_t = 72.0)]
        x: f32,

        /// Vertical position in points from the bottom edge
        #[arg(long, default_value_t = 72.0)]
        y: f32,

        /// Font size in points
        #[arg(long, default_value_t = 14.0)]
        size: f32,

        /// Text color as #rrggbb
        #[arg(long)]
        color: Option<String>,

        /// Alignment of the text relative to x
        #[arg(long, value_enum, default_value_t = AlignArg::Left)]
        align: AlignArg,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum AlignArg {
    Left,
    Center,
    Right,
}

impl From<AlignArg> for Align {
    fn from(arg: AlignArg) -> Self {
        match arg {
            AlignArg::Left => Align::Left,
            AlignArg::Center => Align::Center,
            AlignArg::Right => Align::Right,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Normalize { input, output } => cmd_normalize(&input, &output),
        Commands::Merge { inputs, output } => cmd_merge(inputs, output),
        Commands::Text {
            input, text, output, font, page, x, y, size, color, align,
        } => {
            let options = TextOptions {
                font_size: size,
                color: match color.as_deref() {
                    Some(hex) => match parse_color(hex) {
                        Ok(color) => color,
                        Err(e) => exit_with(e),
                    },
                    None => (0.0, 0.0, 0.0),
                },
                align: align.into(),
            };
            cmd_text(&input, &output, &font, page, &text, Position::new(x, y), &options)
        }
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        exit_with(e);
    }
}

fn exit_with(e: anyhow::Error) -> ! {
    eprintln!("Error: {:#}", e);
    std::process::exit(1);
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = Vec::new();
            for entry in glob(&pattern).with_context(|| format!("Invalid pattern: {}", pattern))? {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => log::warn!("glob error for {}: {}", pattern, e),
                }
            }
            if matched.is_empty() {
                bail!("No files matched pattern: {}", pattern);
            }
            matched.sort();
            paths.extend(matched);
        } else {
            // No glob characters, treat as literal path
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// `#rrggbb` to RGB components in `0.0..=1.0`
fn parse_color(hex: &str) -> Result<(f32, f32, f32)> {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        bail!("Color must look like #rrggbb, got {}", hex);
    }
    let channel = |i: usize| -> Result<f32> {
        let value = u8::from_str_radix(&digits[i..i + 2], 16)
            .with_context(|| format!("Invalid color: {}", hex))?;
        Ok(value as f32 / 255.0)
    };
    Ok((channel(0)?, channel(2)?, channel(4)?))
}

fn read_input(path: &Path) -> Result<pdf_weave::PdfData> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    read_pdf(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse and re-serialize a PDF
fn cmd_normalize(input: &Path, output: &Path) -> Result<()> {
    let mut data = read_input(input)?;
    let bytes = write_pdf(&mut data).context("Failed to write PDF")?;
    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    eprintln!("Wrote {} objects to: {}", data.real_ids().len(), output.display());
    Ok(())
}

/// Carry the objects of several PDFs into one file
fn cmd_merge(inputs: Vec<String>, output: PathBuf) -> Result<()> {
    // Expand glob patterns
    let inputs = expand_globs(inputs)?;

    // Validate inputs exist
    for path in &inputs {
        if !path.exists() {
            bail!("Input file not found: {}", path.display());
        }
    }

    eprintln!("Merging {} PDF files...", inputs.len());

    let options = MergeOptions {
        input_paths: inputs,
        output_path: output.clone(),
    };

    merge_pdfs(&options).context("Merge failed")?;

    eprintln!("Merged to: {}", output.display());
    Ok(())
}

/// Draw text on one page
fn cmd_text(
    input: &Path,
    output: &Path,
    font: &Path,
    page: usize,
    text: &str,
    at: Position,
    options: &TextOptions,
) -> Result<()> {
    let mut data = read_input(input)?;
    let font_bytes = std::fs::read(font).with_context(|| format!("Failed to read {}", font.display()))?;
    let font_ref = data
        .add_font_file(font_bytes)
        .with_context(|| format!("Failed to load font {}", font.display()))?;

    data.insert_text(page, &font_ref, text, at, options)
        .with_context(|| format!("Failed to place text on page {}", page))?;

    let bytes = write_pdf(&mut data).context("Failed to write PDF")?;
    std::fs::write(output, bytes).with_context(|| format!("Failed to write {}", output.display()))?;

    eprintln!("Output: {}", output.display());
    Ok(())
}

/// Print a short summary of a PDF
fn cmd_info(input: &Path) -> Result<()> {
    let metadata = read_metadata(input).with_context(|| format!("Failed to read {}", input.display()))?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);
    println!("Objects: {}", metadata.object_count);
    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#000000").unwrap(), (0.0, 0.0, 0.0));
        assert_eq!(parse_color("ff0000").unwrap(), (1.0, 0.0, 0.0));
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#gg0000").is_err());
    }

    #[test]
    fn test_expand_globs_literal_paths_keep_order() {
        let paths = expand_globs(vec!["b.pdf".to_string(), "a.pdf".to_string()]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("b.pdf"), PathBuf::from("a.pdf")]);
    }

    #[test]
    fn test_merge_help_names_page_limit() {
        use clap::CommandFactory;

        let mut cli = Cli::command();
        let merge = cli.find_subcommand_mut("merge").expect("merge subcommand");
        let help = merge.render_long_help().to_string();
        assert!(help.contains("first file's pages only"));
    }

    #[test]
    fn test_expand_globs_no_match() {
        assert!(expand_globs(vec!["/nonexistent-dir-xyz/*.pdf".to_string()]).is_err());
    }
}
