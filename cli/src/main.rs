//! `platetrack` entry point.
//!
//! Thin presentation collaborator over `platetrack-core`: resolves the
//! acting user, loads the catalog snapshot, dispatches one lifecycle or
//! query operation, and persists the snapshot back after mutations.
//!
//! ## Commands
//!
//! - `platetrack list [--filter <CLASS>] [--search <TEXT>] [--sort <KEY>]`
//! - `platetrack show <ID>`
//! - `platetrack create --id <ID> --shelf <SHELF>` (admin)
//! - `platetrack start|pause <ID>`
//! - `platetrack stop <ID> --confirm <ID>`
//! - `platetrack finish <ID> --xt-file <NAME> --preview <NAME>`
//! - `platetrack edit <ID> [--health <H>] [...]` (admin)
//! - `platetrack upload <ID> --kind <KIND> --file <NAME>` (admin)
//! - `platetrack summary` / `platetrack activity`

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use platetrack_core::catalog::{Catalog, NewPlate};
use platetrack_core::lifecycle::AdminEdit;
use platetrack_core::store::SnapshotStore;
use platetrack_core::{history, sort};
use platetrack_protocol::{
    Actor, ArtifactKind, ArtifactRef, Health, Plate, SortDirection, SortKey, StatusClass,
};

#[derive(Debug, Parser)]
#[command(name = "platetrack", about = "Clamping plate lifecycle tracker")]
struct Cli {
    /// Path to the catalog snapshot file. Falls back to
    /// $PLATETRACK_CATALOG, then the XDG data directory.
    #[arg(long = "catalog", global = true)]
    catalog: Option<PathBuf>,

    /// Acting user name.
    #[arg(long = "user", short = 'u', global = true, default_value = "operator")]
    user: String,

    /// Act with the administrator capability.
    #[arg(long = "admin", global = true)]
    admin: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List plates, optionally filtered, searched and sorted.
    List(ListArgs),
    /// Show one plate with its role-filtered history.
    Show(ShowArgs),
    /// Register a new plate (admin).
    Create(CreateArgs),
    /// Start a work session on a plate.
    Start(PlateArg),
    /// Pause the active work session.
    Pause(PlateArg),
    /// Stop the active work session, discarding its context.
    Stop(StopArgs),
    /// Complete the active work session with new artifacts.
    Finish(FinishArgs),
    /// Edit plate fields (admin).
    Edit(EditArgs),
    /// Record a completed artifact upload (admin).
    Upload(UploadArgs),
    /// Dashboard counts.
    Summary(JsonFlag),
    /// Recent activity across all plates.
    Activity(ActivityArgs),
}

#[derive(Debug, Parser)]
struct ListArgs {
    /// Status class (new-health, used-health, locked-health,
    /// free-occupancy, in-use-occupancy, ongoing-work, history).
    #[arg(long = "filter", short = 'f')]
    filter: Option<StatusClass>,

    /// Case-insensitive search over id, name, last work and shelf.
    #[arg(long = "search", short = 's', default_value = "")]
    search: String,

    /// Sort key: name, status, shelf, modified.
    #[arg(long = "sort", default_value = "modified")]
    sort: SortKey,

    /// Sort direction: asc, desc.
    #[arg(long = "direction", short = 'd', default_value = "desc")]
    direction: SortDirection,

    /// Output as JSON.
    #[arg(long = "json", short = 'j')]
    json: bool,
}

#[derive(Debug, Parser)]
struct ShowArgs {
    id: String,

    /// Output as JSON.
    #[arg(long = "json", short = 'j')]
    json: bool,
}

#[derive(Debug, Parser)]
struct CreateArgs {
    #[arg(long = "id", short = 'i')]
    id: String,

    #[arg(long = "name")]
    name: Option<String>,

    /// Shelf location (e.g., A-12).
    #[arg(long = "shelf")]
    shelf: String,

    #[arg(long = "notes")]
    notes: Option<String>,
}

#[derive(Debug, Parser)]
struct PlateArg {
    id: String,
}

#[derive(Debug, Parser)]
struct StopArgs {
    id: String,

    /// Retype the plate id to confirm.
    #[arg(long = "confirm")]
    confirm: String,

    /// Reason recorded in the audit trail and plate notes.
    #[arg(long = "message")]
    message: Option<String>,
}

#[derive(Debug, Parser)]
struct FinishArgs {
    id: String,

    /// New X_T exchange file name.
    #[arg(long = "xt-file")]
    xt_file: Option<String>,

    /// New preview image file name.
    #[arg(long = "preview")]
    preview: Option<String>,

    #[arg(long = "notes")]
    notes: Option<String>,
}

#[derive(Debug, Parser)]
struct EditArgs {
    id: String,

    /// New plate name; pass an empty string to clear.
    #[arg(long = "name")]
    name: Option<String>,

    #[arg(long = "shelf")]
    shelf: Option<String>,

    /// New health: new, used, locked.
    #[arg(long = "health")]
    health: Option<Health>,

    /// New notes; pass an empty string to clear.
    #[arg(long = "notes")]
    notes: Option<String>,

    /// Replacement preview image file name.
    #[arg(long = "preview")]
    preview: Option<String>,

    /// Replacement X_T file name.
    #[arg(long = "xt-file")]
    xt_file: Option<String>,
}

#[derive(Debug, Parser)]
struct UploadArgs {
    id: String,

    /// Artifact slot: preview-image or exchange-file.
    #[arg(long = "kind", short = 'k')]
    kind: ArtifactKind,

    /// Uploaded file name.
    #[arg(long = "file")]
    file: String,
}

#[derive(Debug, Parser)]
struct JsonFlag {
    /// Output as JSON.
    #[arg(long = "json", short = 'j')]
    json: bool,
}

#[derive(Debug, Parser)]
struct ActivityArgs {
    /// Max entries.
    #[arg(long = "limit", default_value = "10")]
    limit: usize,

    /// Output as JSON.
    #[arg(long = "json", short = 'j')]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        catalog: catalog_path,
        user,
        admin,
        command,
    } = cli;

    let store = open_store(catalog_path)?;
    let catalog = Catalog::from_snapshot(
        store
            .load()
            .with_context(|| format!("load catalog from {}", store.path().display()))?,
    )?;

    let actor = if admin {
        Actor::administrator(user)
    } else {
        Actor::operator(user)
    };

    match command {
        Command::List(args) => {
            let mut plates = catalog
                .filter(args.filter, &args.search, Some(actor.name.as_str()))
                .await;
            sort::order(&mut plates, args.sort, args.direction);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&plates)?);
            } else {
                print_table(&plates);
            }
        }
        Command::Show(args) => {
            let mut plate = catalog.get(&args.id).await?;
            if args.json {
                // The JSON view honors the same visibility rule as the
                // rendered one.
                plate.history = history::visible_to(actor.role, &plate.history);
                println!("{}", serde_json::to_string_pretty(&plate)?);
            } else {
                print_details(&plate, &actor);
            }
        }
        Command::Create(args) => {
            let plate = catalog
                .create(
                    &actor,
                    NewPlate {
                        id: args.id,
                        name: args.name,
                        shelf: args.shelf,
                        notes: args.notes,
                        ..NewPlate::default()
                    },
                )
                .await?;
            store.save(&catalog.snapshot().await)?;
            println!("Created plate {}", plate.id);
        }
        Command::Start(args) => {
            let plate = catalog.start_work(&args.id, &actor).await?;
            store.save(&catalog.snapshot().await)?;
            println!("Work started on {}", plate.id);
        }
        Command::Pause(args) => {
            let plate = catalog.pause_work(&args.id, &actor).await?;
            store.save(&catalog.snapshot().await)?;
            println!("Work paused on {}", plate.id);
        }
        Command::Stop(args) => {
            let message = args
                .message
                .unwrap_or_else(|| format!("Work stopped - {}", Utc::now().to_rfc3339()));
            let plate = catalog
                .stop_work(&args.id, &actor, &args.confirm, &message)
                .await?;
            store.save(&catalog.snapshot().await)?;
            println!("Work stopped on {}", plate.id);
        }
        Command::Finish(args) => {
            let plate = catalog
                .finish_work(
                    &args.id,
                    &actor,
                    args.xt_file.map(ArtifactRef::new),
                    args.preview.map(ArtifactRef::new),
                    args.notes,
                )
                .await?;
            store.save(&catalog.snapshot().await)?;
            let work = plate.last_work_name.as_deref().unwrap_or("-");
            println!("Work completed on {} ({work})", plate.id);
        }
        Command::Edit(args) => {
            let plate = catalog
                .admin_edit(
                    &args.id,
                    &actor,
                    AdminEdit {
                        name: args.name,
                        shelf: args.shelf,
                        health: args.health,
                        notes: args.notes,
                        new_preview_image: args.preview.map(ArtifactRef::new),
                        new_xt_file: args.xt_file.map(ArtifactRef::new),
                    },
                )
                .await?;
            store.save(&catalog.snapshot().await)?;
            println!("Updated plate {}", plate.id);
        }
        Command::Upload(args) => {
            let plate = catalog
                .record_upload(&args.id, &actor, args.kind, ArtifactRef::new(args.file))
                .await?;
            store.save(&catalog.snapshot().await)?;
            println!("Recorded {} upload for {}", args.kind.label(), plate.id);
        }
        Command::Summary(args) => {
            let summary = catalog.summary(&actor.name).await;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Total plates: {}", summary.total);
                println!("  New:    {}", summary.new);
                println!("  Used:   {}", summary.used);
                println!("  Locked: {}", summary.locked);
                println!("  Free:   {}  In use: {}", summary.free, summary.in_use);
                println!("Your active plates: {}", summary.my_active);
            }
        }
        Command::Activity(args) => {
            let feed = catalog.recent_activity(actor.role, args.limit).await;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&feed)?);
            } else {
                for item in &feed {
                    println!(
                        "{}  {:<8} {:<14} by {}{}",
                        item.entry.date.format("%Y-%m-%d %H:%M"),
                        item.plate_id,
                        item.entry.action.as_str(),
                        item.entry.user,
                        item.entry
                            .details
                            .as_deref()
                            .map(|d| format!(" ({d})"))
                            .unwrap_or_default(),
                    );
                }
            }
        }
    }

    Ok(())
}

fn open_store(catalog: Option<PathBuf>) -> anyhow::Result<SnapshotStore> {
    let from_env = std::env::var("PLATETRACK_CATALOG").ok().map(PathBuf::from);
    match catalog.or(from_env) {
        Some(path) => Ok(SnapshotStore::with_path(path)),
        None => SnapshotStore::at_default_location().context("resolve default catalog path"),
    }
}

fn print_table(plates: &[Plate]) {
    if plates.is_empty() {
        println!("No plates found matching your criteria");
        return;
    }
    println!(
        "{:<8} {:<22} {:<8} {:<8} {:<8} {:<16} {}",
        "ID", "NAME", "SHELF", "HEALTH", "OCCUP.", "LAST WORK", "MODIFIED"
    );
    for plate in plates {
        println!(
            "{:<8} {:<22} {:<8} {:<8} {:<8} {:<16} {}",
            plate.id,
            plate.name.as_deref().unwrap_or("Unnamed Plate"),
            plate.shelf,
            plate.health.as_str(),
            plate.occupancy.as_str(),
            plate.last_work_name.as_deref().unwrap_or("-"),
            plate
                .last_modified_date()
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        );
    }
    let n = plates.len();
    println!("{n} plate{} found", if n == 1 { "" } else { "s" });
}

fn print_details(plate: &Plate, actor: &Actor) {
    println!("Plate {} [{} / {}]", plate.id, plate.health.as_str(), plate.occupancy.as_str());
    if let Some(name) = &plate.name {
        println!("Name:      {name}");
    }
    println!("Shelf:     {}", plate.shelf);
    if let Some(work) = &plate.last_work_name {
        println!("Last work: {work}");
    }
    if let Some(notes) = &plate.notes {
        println!("Notes:     {notes}");
    }
    if let Some(xt) = &plate.xt_file {
        println!("X_T file:  {}", xt.file_name);
    }
    if let Some(img) = &plate.preview_image {
        println!("Preview:   {}", img.file_name);
    }
    if let (Some(by), Some(date)) = (plate.last_modified_by(), plate.last_modified_date()) {
        println!("Modified:  {} by {by}", date.format("%Y-%m-%d %H:%M"));
    }

    let visible = history::visible_to(actor.role, &plate.history);
    if visible.is_empty() {
        println!("\nNo relevant history available");
        return;
    }
    println!("\nChange history:");
    for entry in &visible {
        println!(
            "  {}  {:<14} by {}{}",
            entry.date.format("%Y-%m-%d %H:%M"),
            entry.action.as_str(),
            entry.user,
            entry
                .details
                .as_deref()
                .map(|d| format!(" ({d})"))
                .unwrap_or_default(),
        );
    }
}
