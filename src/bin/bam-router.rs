use {
    anyhow::Context,
    bam_router::{
        client::{BamSmartClient, ClientError, SendOptions},
        config::{ConfigBamRouter, load_config},
        metrics,
        payload::PayloadEncoding,
        setup_tracing,
    },
    clap::{Parser, Subcommand},
    std::{
        path::PathBuf,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    },
    tokio::{fs, runtime::Builder},
    tracing::info,
};

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Args {
    /// Path to config, built-in testnet catalog when omitted
    #[clap(long)]
    config: Option<PathBuf>,

    /// Only check config and exit
    #[clap(long, default_value_t = false)]
    check: bool,

    #[command(subcommand)]
    command: ArgsCommands,
}

#[derive(Debug, Subcommand)]
enum ArgsCommands {
    /// Show latency to all regions and mark the fastest
    ListRegions,
    /// Submit a signed transaction through the fastest reachable region
    Send {
        /// Path to the signed transaction file
        tx_path: PathBuf,

        /// Force a region to the front of the fallback chain
        #[clap(long)]
        region: Option<String>,

        /// Input encoding of the transaction file
        #[clap(long, default_value = "auto")]
        encoding: PayloadEncoding,

        /// Skip latency probing, requires --region
        #[clap(long, default_value_t = false, requires = "region")]
        skip_probe: bool,

        /// Cap the number of fallback attempts
        #[clap(long)]
        max_attempts: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    Builder::new_multi_thread()
        .thread_name_fn(|| {
            static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
            let id = ATOMIC_ID.fetch_add(1, Ordering::Relaxed);
            format!("bamrouter.tokio{id:02}")
        })
        .enable_all()
        .build()?
        .block_on(main2())
}

async fn main2() -> anyhow::Result<()> {
    let args = Args::parse();
    let config: ConfigBamRouter = match &args.config {
        Some(path) => load_config(path).await?,
        None => ConfigBamRouter::default(),
    };
    setup_tracing(config.tracing.json)?;
    let registry = Arc::new(config.build_registry()?);
    if args.check {
        return Ok(());
    }
    metrics::bam::init();

    let client = BamSmartClient::new(registry, config.probe, &config.submit)?;
    match args.command {
        ArgsCommands::ListRegions => {
            let reports = client.list_regions().await?;
            for report in reports {
                let mark = if report.fastest { "★" } else { " " };
                let avg = match report.measurement.latency() {
                    Some(latency) => format!("{:.1} ms", latency.as_secs_f64() * 1_000.0),
                    None => "n/a".to_owned(),
                };
                println!(
                    "{mark} {:8} {:16} avg={avg:10} tx={}",
                    report.region.code, report.region.label, report.tx_url
                );
            }
        }
        ArgsCommands::Send {
            tx_path,
            region,
            encoding,
            skip_probe,
            max_attempts,
        } => {
            let data = fs::read(&tx_path)
                .await
                .with_context(|| format!("failed to read transaction file {tx_path:?}"))?;
            let options = SendOptions {
                region,
                skip_probe,
                encoding,
                max_attempts,
            };
            let result = match client.send_transaction(&data, &options).await {
                Ok(result) => result,
                Err(error) => {
                    // Operators diagnose fallback failures from the attempt
                    // history: which regions were tried and why each failed
                    if let ClientError::Router(router_error) = &error {
                        for attempt in router_error.attempts() {
                            let outcome = match &attempt.outcome {
                                Ok(_) => "accepted".to_owned(),
                                Err(failure) => failure.to_string(),
                            };
                            eprintln!("attempt {} ({}): {outcome}", attempt.ordinal, attempt.code);
                        }
                    }
                    return Err(error.into());
                }
            };
            info!(
                region = result.region,
                attempts = result.attempts.len(),
                "transaction accepted"
            );
            println!("{}", serde_json::to_string_pretty(&result.value)?);
        }
    }

    Ok(())
}
