//! # tft-reference
//!
//! Builds Teamfight Tactics reference tables from CommunityDragon data.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tft_reference::config::{PatchSelector, RunOptions};
use tft_reference::model::Document;
use tft_reference::overrides::{ReferenceTables, load_reference_tables};
use tft_reference::sink::{JsonPartitionWriter, SnapshotSink};
use tft_reference::{assemble, data, split};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "tft-reference: builds versioned Teamfight Tactics reference data.\n\
                  Reads the CommunityDragon TFT document for a patch, extracts trait, augment and \
                  emblem facts, applies hand-maintained reference tables and writes one partition \
                  per (patch, set mutator)."
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble the reference tables and write them out
    Assemble {
        #[command(flatten)]
        source: SourceArgs,

        /// Label rows with this patch. Without it, latest/pbe are resolved
        /// to the patch they currently point at
        #[arg(long)]
        patch_override: Option<String>,

        /// Reference tables: a JSON file or a directory of JSON files
        #[arg(long, env = "TFT_REF_TABLES")]
        tables: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, env = "TFT_REF_OUT", default_value = "reference")]
        out: PathBuf,

        /// Fail when an override matches no record
        #[arg(long)]
        strict_overrides: bool,

        /// Assemble and validate without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Split the selected set into per-entity JSON files
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory
        #[arg(short, long, default_value = "text_files")]
        out: PathBuf,
    },

    /// Show the cache directory used for downloaded documents
    Paths,
}

#[derive(ClapArgs, Debug)]
struct SourceArgs {
    /// Patch to read: a concrete patch (e.g. 14.1), latest or pbe
    #[arg(short, long, default_value = "latest")]
    patch: PatchSelector,

    /// Use this set mutator instead of the highest standard set
    #[arg(short, long)]
    mutator: Option<String>,

    /// Read the upstream document from a local file instead of downloading it
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Download the document even if a cached copy is fresh
    #[arg(long)]
    force: bool,
}

impl SourceArgs {
    fn load(&self) -> Result<Document> {
        let path = match &self.file {
            Some(file) => file.clone(),
            None => data::fetch_document(&self.patch, self.force)
                .with_context(|| format!("Failed to fetch data for patch {}", self.patch))?,
        };
        info!("Loading data from {}", path.display());
        data::load_document(&path).with_context(|| format!("Failed to load {}", path.display()))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tft_reference=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Assemble {
            source,
            patch_override,
            tables,
            out,
            strict_overrides,
            dry_run,
        } => {
            let patch = match patch_override {
                Some(patch) => patch,
                None => data::resolve_patch(&source.patch).with_context(|| {
                    format!(
                        "Failed to resolve {} to a concrete patch, pass --patch-override",
                        source.patch
                    )
                })?,
            };
            let options = RunOptions {
                selector: source.patch.clone(),
                mutator_override: source.mutator.clone(),
                patch_override: Some(patch),
                strict_overrides,
            };
            let tables = match tables {
                Some(path) => load_reference_tables(&path)
                    .with_context(|| format!("Failed to load reference tables from {}", path.display()))?,
                None => ReferenceTables::default(),
            };
            let document = source.load()?;
            let snapshot = assemble::assemble(&document, &options, &tables)
                .context("Assembly aborted, nothing was written")?;

            if dry_run {
                print_summary(&snapshot, None);
                return Ok(());
            }
            let mut writer = JsonPartitionWriter::new(&out);
            writer
                .write(&snapshot, options.publish_targets())
                .with_context(|| format!("Failed to write to {}", out.display()))?;
            print_summary(&snapshot, Some(&out));
        }
        Command::Export { source, out } => {
            let document = source.load()?;
            let entry = data::select_set(&document, source.mutator.as_deref())?;
            let written = split::export_set(entry, &out)?;
            println!("Exported {} files for {} to {}", written.len(), entry.mutator, out.display());
        }
        Command::Paths => {
            println!("Cache: {}", data::get_cache_dir()?.display());
        }
    }

    Ok(())
}

fn print_summary(snapshot: &tft_reference::records::Snapshot, out: Option<&Path>) {
    println!(
        "{} ({}) patch {}: {} traits, {} champions, {} items, {} augments",
        snapshot.set.set_name,
        snapshot.set_mutator(),
        snapshot.patch(),
        snapshot.traits.len(),
        snapshot.champions.len(),
        snapshot.items.len(),
        snapshot.augments.len(),
    );
    if let Some(out) = out {
        println!("Written to {}", out.display());
    }
}
