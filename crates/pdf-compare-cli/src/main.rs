//! PDF Compare CLI - Stamp notes onto two PDF documents and merge them.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, ValueEnum};
use pdf_compare_core::{
    AppConfig, ComparisonRequest, MergeMode, NoteScope, PdfComparer, PdfDocument, TextColor,
};
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeOption {
    /// Flatten each page of SECOND onto the matching page of FIRST
    SideBySide,
    /// All pages of FIRST, then all pages of SECOND
    Stacked,
}

impl From<ModeOption> for MergeMode {
    fn from(opt: ModeOption) -> Self {
        match opt {
            ModeOption::SideBySide => Self::SideBySide,
            ModeOption::Stacked => Self::Stacked,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScopeOption {
    AllPages,
    FirstPage,
}

impl From<ScopeOption> for NoteScope {
    fn from(opt: ScopeOption) -> Self {
        match opt {
            ScopeOption::AllPages => Self::AllPages,
            ScopeOption::FirstPage => Self::FirstPage,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum ColorOption {
    Black,
    DarkRed,
    Blue,
    DarkGreen,
}

impl From<ColorOption> for TextColor {
    fn from(opt: ColorOption) -> Self {
        match opt {
            ColorOption::Black => Self::black(),
            ColorOption::DarkRed => Self::dark_red(),
            ColorOption::Blue => Self::blue(),
            ColorOption::DarkGreen => Self::dark_green(),
        }
    }
}

/// Notes for the first document
#[derive(ClapArgs, Debug, Default)]
#[group(multiple = false)]
struct FirstNotes {
    /// Notes stamped onto FIRST
    #[arg(id = "first_notes", long = "first-notes", value_name = "TEXT")]
    text: Option<String>,

    /// Read the notes for FIRST from a file
    #[arg(id = "first_notes_file", long = "first-notes-file", value_name = "PATH")]
    file: Option<PathBuf>,
}

/// Notes for the second document
#[derive(ClapArgs, Debug, Default)]
#[group(multiple = false)]
struct SecondNotes {
    /// Notes stamped onto SECOND
    #[arg(id = "second_notes", long = "second-notes", value_name = "TEXT")]
    text: Option<String>,

    /// Read the notes for SECOND from a file
    #[arg(id = "second_notes_file", long = "second-notes-file", value_name = "PATH")]
    file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(name = "pdf-compare")]
#[command(author, version, about = "Stamp notes onto two PDFs and merge them", long_about = None)]
struct Args {
    /// First PDF file
    #[arg(required = true)]
    first: PathBuf,

    /// Second PDF file
    #[arg(required = true)]
    second: PathBuf,

    /// Output PDF file (default: the configured download name)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// How the documents are combined (default: from config)
    #[arg(short, long, value_enum)]
    mode: Option<ModeOption>,

    #[command(flatten)]
    first_notes: FirstNotes,

    #[command(flatten)]
    second_notes: SecondNotes,

    /// Pages that receive the notes
    #[arg(long, value_enum)]
    notes_scope: Option<ScopeOption>,

    /// Note text color
    #[arg(long, value_enum)]
    color: Option<ColorOption>,

    /// Config file path
    #[arg(short, long, env = "PDF_COMPARE_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Resolve note text given inline or through a file.
fn read_notes(text: Option<String>, file: Option<&Path>) -> Result<Option<String>> {
    match (text, file) {
        (Some(text), _) => Ok(Some(text)),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map(Some)
            .context(format!("Failed to read notes: {}", path.display())),
        (None, None) => Ok(None),
    }
}

fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    // Override config with CLI arguments
    if let Some(color) = args.color {
        config.notes.color = color.into();
    }
    if let Some(scope) = args.notes_scope {
        config.notes.scope = scope.into();
    }
    let mode = args.mode.map_or(config.merge.default_mode, MergeMode::from);

    let first_notes = read_notes(args.first_notes.text, args.first_notes.file.as_deref())?;
    let second_notes = read_notes(args.second_notes.text, args.second_notes.file.as_deref())?;

    // Load input PDFs
    info!("Loading PDF: {}", args.first.display());
    let first = PdfDocument::from_file(&args.first)
        .context(format!("Failed to load PDF: {}", args.first.display()))?;

    info!("Loading PDF: {}", args.second.display());
    let second = PdfDocument::from_file(&args.second)
        .context(format!("Failed to load PDF: {}", args.second.display()))?;

    if first.same_content(&second) {
        anyhow::bail!(
            "{} and {} are the same document; choose two different files",
            args.first.display(),
            args.second.display()
        );
    }

    let request =
        ComparisonRequest::new(first, second, mode).with_notes(first_notes, second_notes);

    let merged = PdfComparer::new(&config)
        .compare(&request)
        .context("Failed to merge documents")?;

    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&config.merge.download_filename));

    std::fs::write(&output_path, &merged.bytes)
        .context(format!("Failed to write output: {}", output_path.display()))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!(
            "Merged PDF ({} pages, {}) saved to: {}",
            merged.page_count,
            merged.mode.label().to_lowercase(),
            output_path.display()
        );
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::try_parse_from([
            "pdf-compare",
            "a.pdf",
            "b.pdf",
            "--mode",
            "stacked",
            "--first-notes",
            "rev A",
            "--second-notes-file",
            "notes.txt",
            "--notes-scope",
            "first-page",
            "--color",
            "dark-red",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.first, PathBuf::from("a.pdf"));
        assert!(matches!(args.mode, Some(ModeOption::Stacked)));
        assert_eq!(args.first_notes.text.as_deref(), Some("rev A"));
        assert_eq!(args.second_notes.file, Some(PathBuf::from("notes.txt")));
        assert!(matches!(args.notes_scope, Some(ScopeOption::FirstPage)));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_notes_text_and_file_conflict() {
        let result = Args::try_parse_from([
            "pdf-compare",
            "a.pdf",
            "b.pdf",
            "--first-notes",
            "inline",
            "--first-notes-file",
            "notes.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_second_file_is_required() {
        assert!(Args::try_parse_from(["pdf-compare", "a.pdf"]).is_err());
    }

    #[test]
    fn test_read_notes_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"from file\nsecond line").unwrap();

        let notes = read_notes(None, Some(file.path())).unwrap();
        assert_eq!(notes.as_deref(), Some("from file\nsecond line"));
        assert_eq!(read_notes(None, None).unwrap(), None);
        assert_eq!(
            read_notes(Some("inline".into()), Some(file.path())).unwrap().as_deref(),
            Some("inline")
        );
    }

    #[test]
    fn test_missing_notes_file_errors() {
        assert!(read_notes(None, Some(Path::new("/nonexistent/notes.txt"))).is_err());
    }
}
