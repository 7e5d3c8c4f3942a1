use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use shellq::{
    Client, Error, Job, JobSpec, JobState, PoolOptions, RuntimeConfig, ShellExecutor, WorkerPool,
};

#[derive(Parser)]
#[command(version, about = "Persistent background job queue for shell commands.", long_about = None)]
struct Cli {
    /// PostgreSQL schema holding the queue.
    #[arg(long, default_value = "shellq")]
    schema: String,

    /// PostgreSQL connection string. Falls back to the POSTGRES_URL
    /// environment variable.
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Submit a job to the queue.
    Enqueue {
        /// Shell command to run.
        command: String,

        /// Unique job ID. Generated if not given.
        #[arg(long)]
        id: Option<String>,

        #[arg(long, default_value_t = 0)]
        priority: i32,

        /// Per-job retry ceiling.
        #[arg(long)]
        max_retries: Option<i32>,

        /// Per-job execution time bound, in milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Do not run for this many seconds.
        #[arg(long)]
        delay_secs: Option<i64>,
    },

    /// List jobs, optionally filtered by state.
    List {
        #[arg(long)]
        state: Option<String>,
    },

    /// List the dead letter queue.
    Dlq,

    /// Move a dead job back to the queue.
    Requeue { id: String },

    /// Show per-state counts and pool liveness.
    Status,

    /// Show the last captured output of a job.
    Log { id: String },

    /// Run a worker pool until interrupted.
    Work {
        #[arg(short, long, default_value_t = 4)]
        workers: usize,

        /// Idle polling interval, in milliseconds.
        #[arg(long, default_value_t = 2_000)]
        poll_interval_ms: u64,
    },

    /// Read a runtime config value.
    ConfigGet { key: String },

    /// Write a runtime config value.
    ConfigSet { key: String, value: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let builder = Client::builder().schema(&cli.schema);
    let client = match &cli.database_url {
        Some(url) => builder.connect_to(url).await?,
        None => builder.connect().await?,
    };

    match cli.command {
        Cmd::Enqueue {
            command,
            id,
            priority,
            max_retries,
            timeout_ms,
            delay_secs,
        } => {
            let mut spec = JobSpec::builder()
                .id(id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()))
                .command(command)
                .priority(priority);
            if let Some(max_retries) = max_retries {
                spec = spec.max_retries(max_retries);
            }
            if let Some(timeout_ms) = timeout_ms {
                spec = spec.timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(delay_secs) = delay_secs {
                spec = spec.run_at(chrono::Utc::now() + chrono::Duration::seconds(delay_secs));
            }
            let id = client.enqueue(spec.build()).await?;
            println!("enqueued job '{}'", id);
        }
        Cmd::List { state } => {
            let state = match state {
                Some(raw) => match JobState::try_from(raw) {
                    Ok(state) => Some(state),
                    Err(e) => {
                        eprintln!("error: {}", e);
                        std::process::exit(2);
                    }
                },
                None => None,
            };
            print_jobs(&client.list_jobs(state).await?);
        }
        Cmd::Dlq => {
            print_jobs(&client.dead_letter_jobs().await?);
        }
        Cmd::Requeue { id } => {
            client.requeue_dead(&id).await?;
            println!("job '{}' requeued", id);
        }
        Cmd::Status => {
            let status = client.status().await?;
            let c = status.counts;
            println!(
                "jobs: {} pending, {} processing, {} completed, {} dead",
                c.pending, c.processing, c.completed, c.dead
            );
            match status.pool {
                Some(pool) if pool.running => println!(
                    "pool: running with {} workers (since {})",
                    pool.workers, pool.updated_at
                ),
                Some(pool) => println!("pool: stopped (since {})", pool.updated_at),
                None => println!("pool: never started"),
            }
        }
        Cmd::Log { id } => {
            let log = client.job_log(&id).await?;
            println!("output: {}", log.output.as_deref().unwrap_or("<none>"));
            println!("error: {}", log.error.as_deref().unwrap_or("<none>"));
        }
        Cmd::Work {
            workers,
            poll_interval_ms,
        } => {
            let config = RuntimeConfig::load(client.store().as_ref()).await;
            log::info!(
                "runtime config: max_retries={}, backoff_base={}, job_timeout={}ms",
                config.max_retries,
                config.backoff_base,
                config.job_timeout.as_millis()
            );
            let pool = WorkerPool::with_options(
                client.store(),
                Arc::new(ShellExecutor),
                config,
                PoolOptions {
                    poll_interval: Duration::from_millis(poll_interval_ms),
                    ..Default::default()
                },
            );
            pool.start(workers).await;
            log::info!("pool running with {} workers, ctrl-c to drain and stop", workers);
            let _ = tokio::signal::ctrl_c().await;
            log::info!("draining workers");
            pool.stop().await;
        }
        Cmd::ConfigGet { key } => match client.get_config(&key).await? {
            Some(value) => println!("{}", value),
            None => println!("<unset>"),
        },
        Cmd::ConfigSet { key, value } => {
            let upserted = client.set_config(&key, &value).await?;
            println!("{}: {:?}", key, upserted);
        }
    }
    Ok(())
}

fn print_jobs(jobs: &[Job]) {
    if jobs.is_empty() {
        println!("no jobs");
        return;
    }
    println!(
        "{:<12} {:>8} {:>8} {:<28} command",
        "state", "attempts", "priority", "id"
    );
    for job in jobs {
        println!(
            "{:<12} {:>8} {:>8} {:<28} {}",
            job.state.to_string(),
            job.attempts,
            job.priority,
            job.id,
            job.command
        );
    }
}
