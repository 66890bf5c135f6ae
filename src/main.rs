use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use order_repair::config::PipelineConfig;
use order_repair::generator::OrderGenerator;
use order_repair::processor::{RepairReport, repair_csv_file};
use order_repair::storage::{
    ObjectStore, S3ObjectStore, Stage, StorageError, dated_blob_path, save_table,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "order-repair",
    version,
    about = "Generate, repair and store e-commerce order CSV files."
)]
struct Cli {
    /// Pipeline configuration file. Defaults are used when it does not exist.
    #[arg(long, global = true, default_value = "src/configs/pipeline.toml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a synthetic order batch.
    Generate(GenerateArgs),
    /// Repair an order CSV and write the result.
    Repair(RepairArgs),
    /// Generate a dirty batch, repair it and optionally upload both files.
    Run(RunArgs),
    /// Bucket and blob operations against the configured object store.
    #[command(subcommand)]
    Storage(StorageCommand),
}

#[derive(Debug, Parser)]
struct GenerateArgs {
    #[arg(long)]
    output: PathBuf,

    /// Number of records (default: generator.records from the config).
    #[arg(long)]
    records: Option<usize>,

    /// Do not inject faults.
    #[arg(long, default_value_t = false)]
    clean: bool,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Parser)]
struct RepairArgs {
    #[arg(long)]
    input: PathBuf,

    #[arg(long)]
    output: PathBuf,

    #[arg(long)]
    seed: Option<u64>,

    /// Write whichever configured columns exist instead of failing on missing ones.
    #[arg(long, default_value_t = false)]
    lenient: bool,
}

#[derive(Debug, Parser)]
struct RunArgs {
    /// Where the generated (dirty) batch is written.
    #[arg(long)]
    raw: PathBuf,

    #[arg(long)]
    output: PathBuf,

    #[arg(long)]
    records: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Upload the raw and repaired files to this bucket.
    #[arg(long)]
    bucket: Option<String>,
}

#[derive(Debug, Subcommand)]
enum StorageCommand {
    CreateBucket {
        bucket: String,
    },
    Upload {
        bucket: String,
        local_path: PathBuf,
        /// Remote key (default: repaired/<yyyy>/<mm>/<dd>/<file>-<hhmmss>.<ext>).
        #[arg(long)]
        remote: Option<String>,
    },
    ListBuckets,
    ListBlobs {
        bucket: String,
    },
    DeleteBlob {
        bucket: String,
        blob: String,
    },
    DeleteBucket {
        bucket: String,
        /// Delete every blob in the bucket first.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match run_cli(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(storage_error) = e.downcast_ref::<StorageError>() {
                error!("❌ Storage operation failed: {}", storage_error);
                if let StorageError::MissingCredentials { variable } = storage_error {
                    error!("Set {} in the environment or in a .env file", variable);
                } else if storage_error.is_transient() {
                    warn!("The storage endpoint may be unavailable, retry later");
                }
            } else {
                error!("❌ {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run_cli(cli: Cli) -> Result<()> {
    let config = PipelineConfig::load_or_default(&cli.config)
        .context("Failed to load pipeline configuration")?;

    match cli.cmd {
        Command::Generate(args) => generate(&config, args),
        Command::Repair(args) => repair(&config, args),
        Command::Run(args) => run(&config, args).await,
        Command::Storage(cmd) => storage(&config, cmd).await,
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            info!("Using seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}

fn generate(config: &PipelineConfig, args: GenerateArgs) -> Result<()> {
    let mut rng = seeded_rng(args.seed.or(config.generator.seed));
    let records = args.records.unwrap_or(config.generator.records);

    let generator = OrderGenerator::from_config(&config.generator).with_faults(!args.clean);
    let batch = generator.generate(records, &mut rng);
    let df = generator.records_to_dataframe(&batch)?;

    save_table(&df, &args.output, &config.output.column_order)
        .with_context(|| format!("Failed to save generated batch to {}", args.output.display()))?;

    info!(
        "✅ Generated {} records into {}",
        df.height(),
        args.output.display()
    );
    Ok(())
}

fn repair(config: &PipelineConfig, args: RepairArgs) -> Result<()> {
    let mut rng = seeded_rng(args.seed.or(config.repair.seed));
    let report = repair_csv_file(config, &args.input, &args.output, args.lenient, &mut rng)?;

    print_report(&report)
}

fn print_report(report: &RepairReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize repair report")?;
    println!("{}", json);
    Ok(())
}

async fn run(config: &PipelineConfig, args: RunArgs) -> Result<()> {
    info!("🚀 Starting order repair run");

    let seed = args.seed.or(config.generator.seed);
    generate(
        config,
        GenerateArgs {
            output: args.raw.clone(),
            records: args.records,
            clean: !config.generator.inject_faults,
            seed,
        },
    )?;

    let mut rng = seeded_rng(args.seed.or(config.repair.seed));
    let report = repair_csv_file(config, &args.raw, &args.output, false, &mut rng)?;
    print_report(&report)?;

    if let Some(bucket) = args.bucket {
        let store = S3ObjectStore::from_config(&config.storage)?;
        store.create_bucket(&bucket).await?;

        for (stage, path) in [(Stage::Raw, &args.raw), (Stage::Repaired, &args.output)] {
            let remote = dated_blob_path(stage, &file_name(path)?);
            store.upload_blob(&bucket, path, &remote).await?;
            info!("Stored {} at {}", path.display(), remote);
        }
    }

    info!("🎉 Run completed");
    Ok(())
}

async fn storage(config: &PipelineConfig, cmd: StorageCommand) -> Result<()> {
    let store = S3ObjectStore::from_config(&config.storage)?;

    match cmd {
        StorageCommand::CreateBucket { bucket } => {
            store.create_bucket(&bucket).await?;
        }
        StorageCommand::Upload {
            bucket,
            local_path,
            remote,
        } => {
            let remote = match remote {
                Some(remote) => remote,
                None => dated_blob_path(Stage::Repaired, &file_name(&local_path)?),
            };
            store.upload_blob(&bucket, &local_path, &remote).await?;
        }
        StorageCommand::ListBuckets => {
            for name in store.list_buckets().await? {
                println!("{}", name);
            }
        }
        StorageCommand::ListBlobs { bucket } => {
            let blobs = store.list_blobs(&bucket).await?;
            if blobs.is_empty() {
                info!("Bucket {} is empty.", bucket);
            }
            for blob in blobs {
                println!("{}", blob);
            }
        }
        StorageCommand::DeleteBlob { bucket, blob } => {
            store.delete_blob(&bucket, &blob).await?;
        }
        StorageCommand::DeleteBucket { bucket, force } => {
            store.delete_bucket(&bucket, force).await?;
        }
    }

    Ok(())
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Path has no file name: {}", path.display()))
}
