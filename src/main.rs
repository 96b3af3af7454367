use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::{AddArgs, ConfigCommand, MoveArgs, NoteArgs, RemoveArgs, ReorderArgs, ShowArgs};
use dietdiary::config::Config;
use dietdiary::identity::Identity;
use dietdiary::store::open_store;

#[derive(Parser)]
#[command(name = "diary")]
#[command(version)]
#[command(about = "A food diary CLI application", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the diary entry for a date
    Show(ShowArgs),

    /// Add a food to a list
    Add(AddArgs),

    /// Remove foods from an entry
    Remove(RemoveArgs),

    /// Move a food to the other list
    Move(MoveArgs),

    /// Reorder the foods of an entry
    Reorder(ReorderArgs),

    /// Set or edit the note of an entry
    Note(NoteArgs),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "dietdiary=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    let Some(command) = cli.command else {
        println!("Use --help to see available commands");
        return Ok(());
    };

    let store = || {
        let identity = Identity::from_config(&config.remote);
        open_store(&identity, config.data_dir.value.clone())
    };

    match command {
        Commands::Show(args) => args.run(store().as_ref()).await?,
        Commands::Add(args) => args.run(store().as_ref()).await?,
        Commands::Remove(args) => args.run(store().as_ref()).await?,
        Commands::Move(args) => args.run(store().as_ref()).await?,
        Commands::Reorder(args) => args.run(store().as_ref()).await?,
        Commands::Note(args) => args.run(store(), config.note_debounce()).await?,
        Commands::Config(cmd) => cmd.run(&config)?,
    }

    Ok(())
}
