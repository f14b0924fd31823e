//! Binary entrypoint for the portals-inventory CLI.
//!
//! Commands:
//! - `run` - hydrate the inventory and process JSON commands from stdin until EOF
//! - `init` - create a starter `config.toml`
//! - `status` - print slot usage and items per category from persisted state
//! - `export [--out <file>]` - print or write the persisted blob
//! - `import <file>` - validate a blob file and replace persisted state with it
//! - `reset` - delete persisted state
//!
//! See the library crate docs for module-level details: `portals_inventory::`.
use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::info;

use portals_inventory::config::Config;
use portals_inventory::engine::InventoryEngine;
use portals_inventory::inventory::ItemStore;
use portals_inventory::persistence::{open_backend, PersistenceGateway};
use portals_inventory::protocol::StdioTransport;

#[derive(Parser)]
#[command(name = "portals-inventory")]
#[command(about = "Farming inventory engine driven by host JSON commands")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Process commands from stdin, notifications go to stdout
    Run,
    /// Write a default configuration file
    Init,
    /// Show slot usage from persisted state
    Status,
    /// Dump the persisted inventory blob
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        out: Option<String>,
    },
    /// Replace persisted state from a blob file
    Import {
        /// Blob produced by `export`
        file: String,
    },
    /// Delete persisted state
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        if std::path::Path::new(&cli.config).exists() {
            return Err(anyhow!("{} already exists; refusing to overwrite", cli.config));
        }
        Config::create_default(&cli.config).await?;
        println!("Wrote default configuration to {}", cli.config);
        return Ok(());
    }

    // A missing config file means defaults everywhere.
    let config = if std::path::Path::new(&cli.config).exists() {
        Config::load(&cli.config).await?
    } else {
        Config::default()
    };
    init_logging(&Some(config.clone()), cli.verbose);

    match cli.command {
        Commands::Init => {}
        Commands::Run => {
            info!("Starting portals-inventory v{}", env!("CARGO_PKG_VERSION"));
            let backend = open_backend(&config.storage)?;
            let engine = InventoryEngine::new(
                &config.inventory,
                backend,
                Box::new(StdioTransport::new()),
            );
            let engine = engine.run().await;
            info!(
                "stdin closed; {} items held at shutdown",
                engine.store().len()
            );
        }
        Commands::Status => {
            let store = load_persisted(&config)?;
            println!(
                "Slots: {}/{} ({} free)",
                store.len(),
                store.max_slots(),
                store.max_slots().saturating_sub(store.len())
            );
            let mut per_type: BTreeMap<&str, (usize, u64)> = BTreeMap::new();
            for item in store.iter() {
                let entry = per_type.entry(item.item_type.as_str()).or_default();
                entry.0 += 1;
                entry.1 += u64::from(item.quantity);
            }
            for (item_type, (stacks, units)) in per_type {
                println!("  {:<11} {} stacks, {} units", item_type, stacks, units);
            }
        }
        Commands::Export { out } => {
            let store = load_persisted(&config)?;
            let blob = PersistenceGateway::export_json(&store)?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, blob)
                        .await
                        .map_err(|e| anyhow!("Failed to write {}: {}", path, e))?;
                    println!("Exported {} items to {}", store.len(), path);
                }
                None => println!("{}", blob),
            }
        }
        Commands::Import { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .map_err(|e| anyhow!("Failed to read {}: {}", file, e))?;
            let backend = open_backend(&config.storage)?;
            let mut gateway =
                PersistenceGateway::new(backend, &config.inventory.storage_key, true);
            let mut store = ItemStore::new(config.inventory.max_slots);
            let count = gateway.import_json(&mut store, &text)?;
            println!("Imported {} items from {}", count, file);
        }
        Commands::Reset => {
            let backend = open_backend(&config.storage)?;
            let mut gateway =
                PersistenceGateway::new(backend, &config.inventory.storage_key, true);
            gateway.reset()?;
            println!(
                "Cleared persisted inventory '{}'",
                config.inventory.storage_key
            );
        }
    }

    Ok(())
}

/// Read persisted state regardless of `auto_save`.
fn load_persisted(config: &Config) -> Result<ItemStore> {
    let backend = open_backend(&config.storage)?;
    let mut gateway = PersistenceGateway::new(
        backend,
        &config.inventory.storage_key,
        config.inventory.auto_save,
    );
    let mut store = ItemStore::new(config.inventory.max_slots);
    gateway.load(&mut store);
    Ok(store)
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity wins over the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.log_level())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    let log_file = config.as_ref().and_then(|c| c.logging.file.clone());
    if let Some(file) = log_file {
        if let Ok(f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file)
        {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Echo to the console only in an interactive session
            let is_tty = atty::is(atty::Stream::Stdout);

            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
            let _ = builder.try_init();
            return;
        }
    }
    builder.format(|fmt, record| {
        let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
    });
    let _ = builder.try_init();
}
