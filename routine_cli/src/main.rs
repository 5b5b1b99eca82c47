mod prompt;

use clap::Parser;
use prompt::ConsoleDecider;
use routine_core::*;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "routine-import")]
#[command(about = "Copy a workout routine from one backup into another", long_about = None)]
struct Cli {
    /// Backup to copy the routine from
    source: PathBuf,

    /// Backup to copy the routine into
    destination: PathBuf,

    /// Run the whole import, then roll it back instead of saving
    #[arg(long)]
    dry_run: bool,

    /// Override data directory (import journal)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    routine_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());

    let mut source = Store::open_read_only(&cli.source, &config.store)?;
    source.load()?;
    let mut destination = Store::open(&cli.destination, &config.store)?;
    destination.load()?;

    let stdin = io::stdin();
    let decider = ConsoleDecider::new(stdin.lock(), io::stdout());
    let summary = RoutineImporter::new(&source, &mut destination, decider)
        .create_missing(config.import.create_missing)
        .select_and_import()?;

    if cli.dry_run {
        destination.discard_changes()?;
        display_summary(&summary);
        println!("\n[Dry run - destination left unchanged]");
        return Ok(());
    }

    // Single commit for the whole routine tree
    destination.save_changes()?;
    display_summary(&summary);

    let mut journal = JsonlJournal::in_dir(&data_dir);
    let entry = JournalEntry::new(&cli.source, &cli.destination, summary);
    if let Err(e) = journal.append(&entry) {
        tracing::warn!("Import saved but journal update failed ({:?}): {}", journal.path(), e);
    }

    Ok(())
}

fn display_summary(summary: &ImportSummary) {
    println!();
    println!(
        "✓ Imported routine {:?} (id {})",
        summary.routine_name, summary.routine_id
    );
    display_counts("Categories", &summary.categories);
    display_counts("Exercises", &summary.exercises);
    println!(
        "  Sections: {}, section exercises: {}, sets: {}",
        summary.sections, summary.section_exercises, summary.sets
    );
}

fn display_counts(label: &str, counts: &ReconcileCounts) {
    println!(
        "  {}: {} matched, {} chosen, {} created",
        label, counts.matched, counts.chosen, counts.created
    );
}
