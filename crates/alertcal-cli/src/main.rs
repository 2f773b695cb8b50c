use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use alertcal_core::Trigger;
use alertcal_runner::Runner;

#[derive(Parser)]
#[command(name = "alertcal", version)]
struct Cli {
    /// Directory holding `.alertcal/` (defaults to the current directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create .alertcal/ with a default config, snapshot db and calendar dir
    Init,

    /// Check config and cross-check the snapshot against the calendar
    Doctor,

    /// List reconciled alerts and recent saves
    Status {
        #[arg(long, default_value_t = 5)]
        history: usize,
    },

    /// Show what a run over the feed would do; writes nothing, not even a default config
    Plan {
        #[arg(long)]
        feed: PathBuf,
    },

    /// Reconcile the feed into the calendar and print the run report as JSON
    Run {
        #[arg(long)]
        feed: PathBuf,
        /// What started this run: schedule, manual or any other label
        #[arg(long, default_value = "manual")]
        trigger: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let base_dir = match cli.dir {
        Some(d) => d,
        None => std::env::current_dir()?,
    };

    match cli.cmd {
        Command::Init => {
            Runner::init(&base_dir)?;
            println!("Initialized alertcal in {}", base_dir.display());
        }
        Command::Doctor => {
            let r = Runner::open(base_dir)?;
            let report = r.doctor()?;
            println!("Entries: {}", report.entries);
            for key in &report.incomplete {
                println!("- incomplete: {} (next run resumes it)", key);
            }
            for id in &report.missing_events {
                println!("- missing event: {}", id);
            }
            if !report.is_clean() {
                anyhow::bail!("doctor found {} problem(s)", report.incomplete.len() + report.missing_events.len());
            }
            println!("OK");
        }
        Command::Status { history } => {
            let r = Runner::open(base_dir)?;
            let snap = r.snapshot()?;
            println!("Alerts: {}", snap.len());
            for (key, entry) in snap.iter() {
                let marker = if entry.is_complete() { "" } else { " [incomplete]" };
                println!(
                    "- {} {}/{} events, updated {}{}: {}",
                    key,
                    entry.resource_ids.len(),
                    entry.record.active_windows.len(),
                    entry.record.updated_at.to_rfc3339(),
                    marker,
                    entry.record.title.plain
                );
            }
            for save in r.store.history(history)? {
                println!("save @{} entries={} {}", save.saved_at_unix, save.entry_count, save.fingerprint);
            }
        }
        Command::Plan { feed } => {
            let actions = Runner::plan_feed(&base_dir, &feed)?;
            for action in actions.iter().filter(|a| !a.is_noop()) {
                println!("{}", action);
            }
            println!("{} action(s), {} no-op", actions.len(), actions.iter().filter(|a| a.is_noop()).count());
        }
        Command::Run { feed, trigger } => {
            let r = Runner::open(base_dir)?;
            let trigger = Trigger::parse(&trigger);
            let report = r.run_feed(&feed, &trigger)?;
            info!(%trigger, mutations = report.mutations(), "run finished");
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
