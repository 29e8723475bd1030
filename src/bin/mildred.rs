use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mildred_model::catalog;
use mildred_model::schema::schema_sql;
use mildred_model::{
    ActionStatus, Directory, DirectoryType, Entity, EntityStore, MildredConfig,
    OpRecordParamType, ServiceDispatch, Snapshot,
};

/// Mildred catalog administration.
#[derive(Parser)]
#[command(name = "mildred", version, about = "Mildred catalog administration")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the CREATE TABLE statements for every catalog table
    Schema,

    /// Write a snapshot holding the configured seed rows
    Seed {
        /// Output snapshot path
        #[arg(long)]
        out: PathBuf,
    },

    /// Import a snapshot with all constraints and print row counts
    Check {
        /// Snapshot path
        snapshot: PathBuf,
    },

    /// Assign a directory type to a path, creating the directory if needed
    SetType {
        /// Snapshot path, rewritten in place
        snapshot: PathBuf,
        /// Directory path
        path: String,
        /// Directory type name
        type_name: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => MildredConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MildredConfig::default(),
    };

    match cli.command {
        Commands::Schema => println!("{}", schema_sql()),
        Commands::Seed { out } => {
            let mut store = EntityStore::new(config.store.clone());
            let added = catalog::seed(&mut store, &config.seed)?;
            store
                .snapshot()
                .save_json(&out)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("seeded {added} rows into {}", out.display());
        }
        Commands::Check { snapshot } => {
            let store = open(&snapshot, &config)?;
            print_counts(&store);
        }
        Commands::SetType {
            snapshot: file,
            path,
            type_name,
        } => {
            let mut store = open(&file, &config)?;
            let directory = catalog::set_directory_type(&mut store, &path, &type_name)?;
            store
                .snapshot()
                .save_json(&file)
                .with_context(|| format!("writing {}", file.display()))?;
            println!(
                "{} -> {} (version {})",
                path,
                type_name,
                directory.base().version()
            );
        }
    }
    Ok(())
}

fn open(path: &Path, config: &MildredConfig) -> Result<EntityStore> {
    let snapshot =
        Snapshot::load_json(path).with_context(|| format!("reading {}", path.display()))?;
    EntityStore::from_snapshot(config.store.clone(), snapshot)
        .with_context(|| format!("importing {}", path.display()))
}

fn print_counts(store: &EntityStore) {
    println!("action_status         {}", store.count::<ActionStatus>());
    println!("directory_type        {}", store.count::<DirectoryType>());
    println!("directory             {}", store.count::<Directory>());
    println!("op_record_param_type  {}", store.count::<OpRecordParamType>());
    println!("service_dispatch      {}", store.count::<ServiceDispatch>());
}
