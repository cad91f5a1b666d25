use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "cubefix",
    about = "cubefix: cube-system test fixture deployment",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to cubefix.toml (default: ./cubefix.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print shell and warehouse commands instead of running them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a cubefix.toml scaffold
    Init {
        /// Directory the fixture lives in
        #[arg(short, long, default_value = ".")]
        path: String,
        /// Overwrite an existing cubefix.toml
        #[arg(long)]
        force: bool,
    },
    /// Prepare the local environment
    Env {
        #[command(subcommand)]
        action: EnvAction,
    },
    /// Append CSV rows to a table's stored data.
    ///
    /// Rows are read from --file, or from stdin when no file is given.
    /// The content is concatenated as-is; include trailing newlines.
    Append {
        /// Table identity, e.g. default.test_kylin_fact
        table: String,
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Generate random data for a model's tables
    Generate {
        /// Data model name
        model: String,
        /// Fact rows to generate (default: [fixture].generated_rows)
        #[arg(short, long)]
        rows: Option<u32>,
    },
    /// Create, load, and view the configured warehouse tables
    Deploy,
    /// Run a full data preparation flow
    Prepare {
        #[command(subcommand)]
        action: PrepareAction,
    },
}

#[derive(Subcommand)]
enum EnvAction {
    /// Wipe the CLI working directory and recreate the job log directory
    InitWorkdir,
    /// Reset the store to the reference metadata snapshot
    DeployMetadata,
}

#[derive(Subcommand)]
enum PrepareAction {
    /// Generate (or reuse) model data, then deploy warehouse tables
    Normal {
        /// Data model name
        model: String,
        /// Keep the data already in the store instead of generating it
        #[arg(long)]
        provided_data: bool,
    },
    /// Push generated records to a stream topic and append them to the
    /// cube's fact table
    Streaming {
        /// Cube instance name
        cube: String,
        /// Window start, epoch millis
        #[arg(long)]
        start: u64,
        /// Window end, epoch millis
        #[arg(long)]
        end: u64,
        /// Number of records
        #[arg(short = 'n', long, default_value_t = 100)]
        records: usize,
        /// Directory holding <topic>.jsonl files
        #[arg(long, default_value = "topics")]
        topic_dir: PathBuf,
        /// Topic name (default: the cube name)
        #[arg(long)]
        topic: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cubefix=info".parse()?)
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Init { path, force } = &cli.command {
        return commands::init::init(path, *force);
    }

    let session = commands::Session::open(cli.config.as_deref(), cli.dry_run)?;
    let result = match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Env { action } => match action {
            EnvAction::InitWorkdir => commands::env::init_workdir(&session),
            EnvAction::DeployMetadata => commands::env::deploy_metadata(&session),
        },
        Commands::Append { table, file } => {
            commands::append::append(&session, &table, file.as_deref())
        }
        Commands::Generate { model, rows } => {
            commands::generate::generate(&session, &model, rows)
        }
        Commands::Deploy => commands::deploy::deploy(&session),
        Commands::Prepare { action } => match action {
            PrepareAction::Normal { model, provided_data } => {
                commands::prepare::normal(&session, &model, provided_data)
            }
            PrepareAction::Streaming {
                cube,
                start,
                end,
                records,
                topic_dir,
                topic,
            } => commands::prepare::streaming(
                &session,
                &cube,
                start..end,
                records,
                &topic_dir,
                topic.as_deref(),
            ),
        },
    };
    session.print_recorded();
    result
}
