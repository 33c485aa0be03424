//! JetStream management CLI
//!
//! Thin front end over `nats-manager`: create, inspect and delete streams and
//! consumers, read stored messages, and list what exists on the server.
//! Connection settings come from the environment (`NATS_URL`, `JS_DOMAIN`,
//! `JS_API_PREFIX`, `JS_REQUEST_TIMEOUT_MS`) and may be overridden by flags.

use clap::{Parser, Subcommand, ValueEnum};
use eyre::{Result, WrapErr};
use futures::StreamExt;
use logging::{Environment, init_tracing, install_color_eyre};
use nats_manager::{
    ConsumerConfig, ItemStream, JetStreamManager, ManageOpt, ManagerConfig, RawStreamMsg,
    StorageType, StreamConfig,
};
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod logging;

#[derive(Parser)]
#[command(name = "jsm")]
#[command(about = "Manage JetStream streams, consumers and stored messages")]
struct Cli {
    /// NATS server URL (overrides NATS_URL)
    #[arg(long, global = true)]
    server: Option<String>,

    /// JetStream domain (overrides JS_DOMAIN)
    #[arg(long, global = true)]
    domain: Option<String>,

    /// Deadline for the whole command in milliseconds. Listings without it run until done or Ctrl-C.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show JetStream usage and limits of the account
    Account,

    /// Manage streams
    #[command(subcommand)]
    Stream(StreamCommand),

    /// Manage consumers
    #[command(subcommand)]
    Consumer(ConsumerCommand),

    /// Read or delete stored messages
    #[command(subcommand)]
    Msg(MsgCommand),
}

#[derive(Subcommand)]
enum StreamCommand {
    /// Create a stream
    Add {
        name: String,

        /// Subjects the stream captures. Defaults to the stream name.
        #[arg(short, long, value_delimiter = ',')]
        subjects: Vec<String>,

        #[arg(long, value_enum, default_value_t = Storage::File)]
        storage: Storage,

        /// Maximum message age in seconds
        #[arg(long)]
        max_age_secs: Option<u64>,

        /// Extra create attempts after the first
        #[arg(short, long, default_value_t = 0)]
        retries: u32,
    },

    /// Show stream configuration and state
    Info { name: String },

    /// Delete a stream and all its messages
    Rm { name: String },

    /// Remove all messages from a stream
    Purge { name: String },

    /// List streams
    Ls {
        /// Print names only
        #[arg(long)]
        names: bool,

        /// Only streams capturing this subject (implies --names)
        #[arg(long)]
        subject: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConsumerCommand {
    /// Create a consumer. Without --durable the consumer is ephemeral.
    Add {
        stream: String,

        #[arg(long)]
        durable: Option<String>,

        /// Only deliver messages matching this subject
        #[arg(long)]
        filter: Option<String>,

        /// Extra create attempts after the first
        #[arg(short, long, default_value_t = 0)]
        retries: u32,
    },

    /// Show consumer configuration and state
    Info { stream: String, consumer: String },

    /// Delete a consumer
    Rm { stream: String, consumer: String },

    /// List the consumers of a stream
    Ls {
        stream: String,

        /// Print names only
        #[arg(long)]
        names: bool,
    },
}

#[derive(Subcommand)]
enum MsgCommand {
    /// Print a stored message
    Get { stream: String, seq: u64 },

    /// Delete a stored message
    Rm { stream: String, seq: u64 },
}

#[derive(Clone, Copy, ValueEnum)]
enum Storage {
    File,
    Memory,
}

impl From<Storage> for StorageType {
    fn from(storage: Storage) -> Self {
        match storage {
            Storage::File => StorageType::File,
            Storage::Memory => StorageType::Memory,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();
    init_tracing(&Environment::from_env());
    nats_manager::describe_metrics();

    let cli = Cli::parse();

    let mut config = ManagerConfig::from_env()?;
    if let Some(server) = cli.server {
        config = config.with_nats_url(server);
    }
    if let Some(domain) = cli.domain {
        config = config.with_domain(domain);
    }
    config.validate()?;

    let timeout = cli.timeout_ms.map(Duration::from_millis);
    let manager = JetStreamManager::connect(&config)
        .await
        .wrap_err_with(|| format!("Failed to connect to {}", config.nats_url))?;

    match cli.command {
        Commands::Account => {
            let info = manager.account_info(&call_opts(timeout, 0)).await?;
            print_json(&info)?;
        }
        Commands::Stream(command) => run_stream(&manager, command, timeout).await?,
        Commands::Consumer(command) => run_consumer(&manager, command, timeout).await?,
        Commands::Msg(command) => run_msg(&manager, command, timeout).await?,
    }

    Ok(())
}

async fn run_stream(
    manager: &JetStreamManager,
    command: StreamCommand,
    timeout: Option<Duration>,
) -> Result<()> {
    match command {
        StreamCommand::Add {
            name,
            subjects,
            storage,
            max_age_secs,
            retries,
        } => {
            let mut config = StreamConfig::new(name)
                .with_subjects(subjects)
                .with_storage(storage.into());
            if let Some(secs) = max_age_secs {
                config = config.with_max_age(Duration::from_secs(secs));
            }
            let info = manager
                .add_stream(&config, &call_opts(timeout, retries))
                .await?;
            print_json(&info)?;
        }
        StreamCommand::Info { name } => {
            let info = manager.stream_info(&name, &call_opts(timeout, 0)).await?;
            print_json(&info)?;
        }
        StreamCommand::Rm { name } => {
            manager.delete_stream(&name, &call_opts(timeout, 0)).await?;
        }
        StreamCommand::Purge { name } => {
            let purged = manager.purge_stream(&name, &call_opts(timeout, 0)).await?;
            print_json(&json!({ "stream": name, "purged": purged }))?;
        }
        StreamCommand::Ls { names, subject } => {
            let opts = listing_opts(timeout);
            match subject {
                Some(subject) => {
                    print_each(manager.stream_names_matching(&subject, &opts)?, Ok).await?
                }
                None if names => print_each(manager.stream_names(&opts)?, Ok).await?,
                None => print_each(manager.streams_info(&opts)?, to_json_line).await?,
            }
        }
    }
    Ok(())
}

async fn run_consumer(
    manager: &JetStreamManager,
    command: ConsumerCommand,
    timeout: Option<Duration>,
) -> Result<()> {
    match command {
        ConsumerCommand::Add {
            stream,
            durable,
            filter,
            retries,
        } => {
            let mut config = ConsumerConfig {
                durable,
                ..Default::default()
            };
            if let Some(filter) = filter {
                config = config.with_filter_subject(filter);
            }
            let info = manager
                .add_consumer(&stream, Some(&config), &call_opts(timeout, retries))
                .await?;
            print_json(&info)?;
        }
        ConsumerCommand::Info { stream, consumer } => {
            let info = manager
                .consumer_info(&stream, &consumer, &call_opts(timeout, 0))
                .await?;
            print_json(&info)?;
        }
        ConsumerCommand::Rm { stream, consumer } => {
            manager
                .delete_consumer(&stream, &consumer, &call_opts(timeout, 0))
                .await?;
        }
        ConsumerCommand::Ls { stream, names } => {
            let opts = listing_opts(timeout);
            if names {
                print_each(manager.consumer_names(&stream, &opts)?, Ok).await?;
            } else {
                print_each(manager.consumers_info(&stream, &opts)?, to_json_line).await?;
            }
        }
    }
    Ok(())
}

async fn run_msg(
    manager: &JetStreamManager,
    command: MsgCommand,
    timeout: Option<Duration>,
) -> Result<()> {
    match command {
        MsgCommand::Get { stream, seq } => {
            let msg = manager.get_msg(&stream, seq, &call_opts(timeout, 0)).await?;
            print_msg(&msg);
        }
        MsgCommand::Rm { stream, seq } => {
            manager
                .delete_msg(&stream, seq, &call_opts(timeout, 0))
                .await?;
            info!(stream = %stream, seq, "Message deleted");
        }
    }
    Ok(())
}

fn call_opts(timeout: Option<Duration>, retries: u32) -> Vec<ManageOpt> {
    let mut opts = vec![ManageOpt::Retries(retries)];
    if let Some(timeout) = timeout {
        opts.push(ManageOpt::Timeout(timeout));
    }
    opts
}

/// Listings without a deadline run until exhausted or interrupted with Ctrl-C.
fn listing_opts(timeout: Option<Duration>) -> Vec<ManageOpt> {
    if let Some(timeout) = timeout {
        return vec![ManageOpt::Timeout(timeout)];
    }

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    vec![ManageOpt::Context(token)]
}

async fn print_each<T>(
    mut items: ItemStream<T>,
    render: impl Fn(T) -> Result<String>,
) -> Result<()> {
    while let Some(item) = items.next().await {
        println!("{}", render(item)?);
    }
    items.finish().await.wrap_err("Listing failed")
}

fn to_json_line<T: serde::Serialize>(item: T) -> Result<String> {
    Ok(serde_json::to_string(&item)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_msg(msg: &RawStreamMsg) {
    println!("Subject: {}", msg.subject);
    println!("Sequence: {}", msg.sequence);
    println!("Time: {}", msg.time.to_rfc3339());
    for (name, value) in &msg.headers {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    println!();
    println!("{}", String::from_utf8_lossy(&msg.data));
}
