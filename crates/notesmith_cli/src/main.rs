//! Command-line driver for note editing sessions.
//!
//! # Responsibility
//! - Open one archive as a package session, list or rewrite notes, repack.
//! - Keep all document semantics inside `notesmith_core`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use notesmith_core::{
    default_log_level, init_logging, EditorConfig, LoggingConfig, NoteKind, PackageSession,
    UpdateOutcome,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "notesmith")]
#[command(about = "Edit footnote and endnote text inside .docx packages")]
#[command(version = notesmith_core::core_version())]
struct Cli {
    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = "NOTESMITH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "NOTESMITH_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List editable notes as simplified markup
    Notes {
        /// Input .docx archive
        archive: PathBuf,

        /// Operate on footnotes instead of endnotes
        #[arg(long)]
        footnotes: bool,

        /// Print JSON records instead of plain lines
        #[arg(long)]
        json: bool,
    },

    /// Rewrite one note and repack the archive
    Update {
        /// Input .docx archive
        archive: PathBuf,

        /// Note id as listed by `notes`
        #[arg(long)]
        id: String,

        /// Edited simplified markup
        #[arg(long)]
        markup: String,

        /// Output path (defaults to Resolved_<name> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Operate on footnotes instead of endnotes
        #[arg(long)]
        footnotes: bool,
    },

    /// List the hyperlink relationship table of the notes part
    Rels {
        /// Input .docx archive
        archive: PathBuf,

        /// Operate on footnotes instead of endnotes
        #[arg(long)]
        footnotes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir {
        let level = cli
            .log_level
            .unwrap_or_else(|| default_log_level().to_string());
        init_logging(&LoggingConfig::new(level, log_dir)).context("failed to initialize logging")?;
    }

    match cli.command {
        Commands::Notes {
            archive,
            footnotes,
            json,
        } => list_notes(&archive, note_kind(footnotes), json),
        Commands::Update {
            archive,
            id,
            markup,
            output,
            footnotes,
        } => update_note(&archive, note_kind(footnotes), &id, &markup, output),
        Commands::Rels { archive, footnotes } => list_relationships(&archive, note_kind(footnotes)),
    }
}

fn note_kind(footnotes: bool) -> NoteKind {
    if footnotes {
        NoteKind::Footnote
    } else {
        NoteKind::Endnote
    }
}

fn open_session(archive: &Path, kind: NoteKind) -> Result<PackageSession> {
    PackageSession::open(archive, EditorConfig::default().with_kind(kind))
        .with_context(|| format!("failed to open `{}`", archive.display()))
}

fn list_notes(archive: &Path, kind: NoteKind, json: bool) -> Result<()> {
    let session = open_session(archive, kind)?;
    let notes = session.notes()?;

    if json {
        let records: Vec<_> = notes.iter().map(|note| note.to_record()).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for note in &notes {
        println!("[{}] {}", note.id, note.markup);
        if !note.search_term.is_empty() {
            println!("    search: {}", note.search_term);
        }
    }
    Ok(())
}

fn update_note(
    archive: &Path,
    kind: NoteKind,
    id: &str,
    markup: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut session = open_session(archive, kind)?;
    match session.update_note(id, markup)? {
        UpdateOutcome::Applied { spans, hyperlinks } => {
            let output = output.unwrap_or_else(|| archive.with_file_name(session.output_filename()));
            session
                .repack_to(&output)
                .with_context(|| format!("failed to write `{}`", output.display()))?;
            println!(
                "updated note {id}: {spans} span(s), {hyperlinks} hyperlink(s) -> {}",
                output.display()
            );
            Ok(())
        }
        UpdateOutcome::NoteNotFound => bail!("no note with id `{id}`"),
        UpdateOutcome::PartMissing => bail!("`{}` has no {} part", archive.display(), kind.part_path()),
    }
}

fn list_relationships(archive: &Path, kind: NoteKind) -> Result<()> {
    let session = open_session(archive, kind)?;
    for entry in session.note_service(kind).relationships()? {
        match entry.target_mode.as_deref() {
            Some(mode) => println!("{}\t{}\t{} ({mode})", entry.id, entry.target, entry.rel_type),
            None => println!("{}\t{}\t{}", entry.id, entry.target, entry.rel_type),
        }
    }
    Ok(())
}
