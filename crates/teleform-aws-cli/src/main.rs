//! Manage single teleform-aws resources from the command line.
//!
//! Definitions are JSON documents holding the local state of one resource.
//! Every command that touches a resource prints the resulting state record,
//! which later `read`, `update` and `delete` calls take back in.
//!
//! ```sh
//! tele-aws types
//! tele-aws create --type aws_route53_resolver_rule --definition rule.json --out rule.state.json
//! tele-aws update --state rule.state.json --definition rule.json --out rule.state.json
//! tele-aws delete --state rule.state.json --force
//! ```
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tele_aws::{Clients, ProviderConfig, Registry, StateRecord};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Sets the verbosity level
    #[clap(short, action = clap::ArgAction::Count)]
    verbosity: u8,

    /// Provider config file (TOML).
    #[clap(long, env = "TELE_AWS_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides the region of the provider config.
    #[clap(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Overrides the shared config profile of the provider config.
    #[clap(long, env = "AWS_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the supported resource types.
    Types,
    /// Create a resource from a JSON definition.
    Create {
        #[clap(long = "type")]
        type_name: String,
        #[clap(long)]
        definition: PathBuf,
        #[clap(long)]
        out: Option<PathBuf>,
    },
    /// Refresh the remote state of a resource.
    Read {
        #[clap(long)]
        state: PathBuf,
        #[clap(long)]
        out: Option<PathBuf>,
    },
    /// Adopt an existing resource by its ID.
    Import {
        #[clap(long = "type")]
        type_name: String,
        #[clap(long)]
        id: String,
        #[clap(long)]
        out: Option<PathBuf>,
    },
    /// Bring a resource in line with a new JSON definition.
    Update {
        #[clap(long)]
        state: PathBuf,
        #[clap(long)]
        definition: PathBuf,
        #[clap(long)]
        out: Option<PathBuf>,
    },
    /// Delete a resource.
    Delete {
        #[clap(long)]
        state: PathBuf,
        /// Required to actually delete, otherwise the resource is only shown.
        #[clap(long, short, default_value = "false")]
        force: bool,
    },
}

fn read_definition(path: &Path) -> anyhow::Result<serde_json::Value> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading definition {path:?}"))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing definition {path:?}"))
}

async fn emit(record: &StateRecord, out: Option<&Path>) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            record.save(path).await?;
            println!(
                "{} {} '{}' -> {}",
                "stored".green(),
                record.type_name,
                record.id.cyan(),
                path.display()
            );
        }
        None => println!("{}", record.to_json()?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        verbosity,
        config,
        region,
        profile,
        command,
    } = Cli::parse();

    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::default()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("tele_aws", level)
        .filter_module("tele_aws_cli", level)
        .init();

    let registry = Registry::<Clients>::standard();
    if let Command::Types = command {
        for type_name in registry.type_names() {
            println!("{type_name}");
        }
        return Ok(());
    }

    let mut provider = match &config {
        Some(path) => ProviderConfig::from_file(path)?,
        None => ProviderConfig::default(),
    };
    if region.is_some() {
        provider.region = region;
    }
    if profile.is_some() {
        provider.profile = profile;
    }
    log::debug!("provider config: {provider:#?}");

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("interrupted, cancelling");
                cancel.cancel();
            }
        }
    });
    let ctx = provider.context(cancel);
    let sdk = provider.sdk_config().await;
    let clients = Clients::from_sdk_config(&sdk, &provider);

    match command {
        Command::Types => {}
        Command::Create {
            type_name,
            definition,
            out,
        } => {
            let local = read_definition(&definition)?;
            let record = registry.create(&clients, &type_name, local, &ctx).await?;
            emit(&record, out.as_deref()).await?;
        }
        Command::Read { state, out } => {
            let previous = StateRecord::load(&state).await?;
            match registry.read(&clients, &previous, &ctx).await? {
                Some(record) => emit(&record, out.as_deref()).await?,
                None => anyhow::bail!(
                    "{} '{}' no longer exists",
                    previous.type_name,
                    previous.id
                ),
            }
        }
        Command::Import {
            type_name,
            id,
            out,
        } => {
            let record = registry.import(&clients, &type_name, &id, &ctx).await?;
            emit(&record, out.as_deref()).await?;
        }
        Command::Update {
            state,
            definition,
            out,
        } => {
            let previous = StateRecord::load(&state).await?;
            let local = read_definition(&definition)?;
            let record = registry.update(&clients, &previous, local, &ctx).await?;
            emit(&record, out.as_deref()).await?;
        }
        Command::Delete { state, force } => {
            let previous = StateRecord::load(&state).await?;
            if !force {
                println!("{}", previous.to_json()?);
                println!();
                println!("Please call `delete --force` to delete this resource.");
                return Ok(());
            }
            registry.delete(&clients, &previous, &ctx).await?;
            println!(
                "{} {} '{}'",
                "deleted".red().bold(),
                previous.type_name,
                previous.id.cyan()
            );
        }
    }
    Ok(())
}
