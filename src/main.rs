use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use friendscan::config::ScanConfig;
use friendscan::navigation::NavigationOutcome;
use friendscan::session::{FinderSession, LoadOutcome};
use friendscan::system_desktop;

/// Find entries in the map app's friends list and screenshot their location.
///
/// The list and map regions come from the config file. Bring the app to
/// the front before any command that drives the mouse.
#[derive(Parser, Debug)]
#[command(name = "friendscan")]
#[command(about = "Index, select and screenshot friends in a map app's friends list")]
struct Args {
    /// Configuration file
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rescan the whole friends list and save the index
    Index {
        /// Seconds to wait before touching the mouse
        #[arg(long, default_value_t = 3.0)]
        start_delay: f64,
    },
    /// Print the cached index
    List,
    /// Select a friend by (partial) name, then screenshot the map
    Select {
        name: String,
        /// Skip the click if this process already selected the friend
        #[arg(long)]
        no_force: bool,
        /// Only select; do not take a screenshot
        #[arg(long)]
        no_capture: bool,
        /// Seconds to wait before touching the mouse
        #[arg(long, default_value_t = 3.0)]
        start_delay: f64,
    },
    /// Screenshot the map region
    Capture {
        /// File name template overriding `filename_format`
        #[arg(long)]
        filename: Option<String>,
    },
    /// Run the web host
    #[cfg(feature = "http")]
    Serve {
        #[arg(short, long, default_value_t = friendscan::server::DEFAULT_PORT)]
        port: u16,
        /// Directory of static web assets
        #[arg(long, default_value = "public")]
        public: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = ScanConfig::load(&args.config)?;
    if matches!(args.command, Command::Index { .. } | Command::Select { .. }) {
        require_valid(&config)?;
    }
    let desktop = system_desktop(&config);
    let mut session = FinderSession::builder()
        .with_config(config)
        .with_desktop(desktop)
        .build()?;

    match args.command {
        Command::Index { start_delay } => {
            session.load_cached();
            wait_for_focus(start_delay).await;
            let report = session.rebuild().await?;
            info!(entries = report.entries, rounds = report.rounds, "index saved");
            print_index(&session);
        }
        Command::List => {
            if !session.load_cached() {
                println!("No index cached yet. Run `friendscan index` first.");
                return Ok(());
            }
            print_index(&session);
        }
        Command::Select {
            name,
            no_force,
            no_capture,
            start_delay,
        } => {
            wait_for_focus(start_delay).await;
            if let LoadOutcome::Rebuilt { reason, report } = session.load_or_build().await? {
                info!(?reason, entries = report.entries, "index rebuilt");
            }
            let selection = session.select(&name, !no_force).await?;
            match selection.outcome {
                NavigationOutcome::Selected => println!("Selected {}", selection.key),
                NavigationOutcome::AlreadySelected => println!("{} was already selected", selection.key),
            }
            if !no_capture {
                let record = session.capture_map(None).await?;
                println!("Screenshot saved to {}", record.path.display());
            }
        }
        Command::Capture { filename } => {
            session.load_cached();
            let record = session.capture_map(filename.as_deref()).await?;
            println!("Screenshot saved to {}", record.path.display());
        }
        #[cfg(feature = "http")]
        Command::Serve { port, public } => {
            session.load_cached();
            friendscan::server::serve(session, port, public).await?;
        }
    }
    Ok(())
}

fn require_valid(config: &ScanConfig) -> Result<()> {
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("configuration is incomplete")
}

async fn wait_for_focus(seconds: f64) {
    if seconds > 0.0 && seconds.is_finite() {
        println!("Starting in {seconds} seconds, switch to the map app window.");
        tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
    }
}

fn print_index(session: &FinderSession) {
    let index = session.index();
    match index.last_sync() {
        Some(at) => println!("{} friends, last synced {}", index.len(), at.to_rfc3339()),
        None => println!("{} friends, never synced", index.len()),
    }
    for entry in index.iter() {
        println!(
            "- {} (scrolls={}, y={}{})",
            entry.name,
            entry.scroll_count,
            entry.row_y,
            entry
                .last_capture_ref
                .as_deref()
                .map(|f| format!(", last screenshot {}", f))
                .unwrap_or_default()
        );
    }
}
