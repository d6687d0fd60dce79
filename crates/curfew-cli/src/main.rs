use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use curfew_core::{
    is_allowed_to_run, next_occurrence, window::local_now, CategoryIndex, CategoryOperator,
    ProcessMonitor, SystemMonitor, TimeWindow, VERSION,
};
use curfew_daemon::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "curfew")]
#[command(author = "curfew Team")]
#[command(version = VERSION)]
#[command(about = "App curfews and scheduled shutdown - CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List running processes as the daemon sees them
    Processes {
        /// Only show processes whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show each app rule and whether it is allowed right now
    Status {
        #[arg(short, long, default_value = "./config.json")]
        config: PathBuf,
    },

    /// Show configured categories, or the categories of one process
    Categories {
        #[arg(short, long, default_value = "./config.json")]
        config: PathBuf,

        /// Process name to look up
        #[arg(short, long)]
        process: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Processes { filter }) => {
            println!("{}", "=== curfew Processes ===".green().bold());
            show_processes(filter.as_deref())
        }
        Some(Commands::Status { config }) => {
            println!("{}", "=== curfew Status ===".green().bold());
            show_status(&config)
        }
        Some(Commands::Categories { config, process }) => {
            println!("{}", "=== curfew Categories ===".green().bold());
            show_categories(&config, process.as_deref())
        }
        Some(Commands::Version) => {
            println!("curfew v{}", VERSION);
            println!("App curfews and scheduled shutdown");
            Ok(())
        }
        None => {
            // Default: show status
            println!("{}", "=== curfew Status ===".green().bold());
            show_status(Path::new("./config.json"))
        }
    };

    if let Err(e) = result {
        eprintln!("{}", format!("❌ {}", e).red());
        std::process::exit(1);
    }
}

fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load_from_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to load {:?}: {}", path, e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

fn show_processes(filter: Option<&str>) -> Result<()> {
    let monitor = SystemMonitor::new();
    let processes = monitor.running_processes()?;

    let mut shown = 0;
    for info in processes.iter().filter_map(|p| p.info().ok()) {
        if filter.map_or(true, |f| info.name.contains(f)) {
            println!("  {:>7}  {}", info.pid, info.name);
            shown += 1;
        }
    }

    println!("\n{} processes", shown);
    Ok(())
}

fn show_status(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    let now = local_now();

    println!("\nNow: {}", now.format("%Y-%m-%d %H:%M"));

    if config.apps.is_empty() {
        println!("\n{}", "⚠️  No app rules configured".yellow());
    } else {
        println!("\n{}", "App rules:".bold());
    }

    for app in &config.apps {
        let window = match TimeWindow::from_policy(app) {
            Ok(window) if window.crosses_midnight() => {
                format!("{} - {} (overnight)", app.allowed_from, app.allowed_to)
            }
            Ok(_) => format!("{} - {}", app.allowed_from, app.allowed_to),
            Err(e) => format!("invalid window: {}", e).red().to_string(),
        };

        let state = if is_allowed_to_run(app, now) {
            "✅ allowed".green()
        } else {
            "⛔ blocked".red()
        };

        println!("  {:<20} {:<28} {}", app.name, window, state);

        if let Some(members) = config.categories.get(&app.name) {
            println!("  {:<20} category: {}", "", members.join(", "));
        }
    }

    println!();
    match config.shutdown_time().map_err(anyhow::Error::msg)? {
        Some(target) => {
            let at = next_occurrence(target, now);
            let minutes = (at - now).num_minutes().max(0) as u64;
            println!(
                "{} {} (in {})",
                "Next shutdown:".bold(),
                at.format("%Y-%m-%d %H:%M"),
                humantime::format_duration(Duration::from_secs(minutes * 60))
            );
        }
        None => println!("{}", "Shutdown disabled".yellow()),
    }

    Ok(())
}

fn show_categories(path: &Path, process: Option<&str>) -> Result<()> {
    let config = load_config(path)?;

    match process {
        Some(process) => {
            let index = CategoryIndex::from_map(&config.categories);
            let found = index.categories_of(process);

            if found.is_empty() {
                println!("\n{}", format!("'{}' belongs to no category", process).yellow());
            } else {
                println!("\n{} belongs to: {}", process.bold(), found.join(", "));
            }
        }
        None if config.categories.is_empty() => {
            println!("\n{}", "⚠️  No categories configured".yellow());
        }
        None => {
            for (category, members) in &config.categories {
                println!("\n{}", category.bold());
                for member in members {
                    println!("  - {}", member);
                }
            }
        }
    }

    Ok(())
}
