use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use warden_bot::application::errors::BotError;
use warden_bot::application::services::{ModerationEngine, ScopeContext};
use warden_bot::domain::entities::{capability, BANNED, HONORS, SIGNED_UP};
use warden_bot::domain::traits::{Notifier, RecordStore};
use warden_bot::infrastructure::adapters::console::ConsoleAdapter;
use warden_bot::infrastructure::config::{Config, ScopeConfig};
use warden_bot::infrastructure::directory::InMemoryDirectory;
use warden_bot::infrastructure::notifications::{LogNotifier, WebhookNotifier};
use warden_bot::infrastructure::storage::FileRecordStore;

#[derive(Parser)]
#[command(name = "warden-bot")]
#[command(about = "Strike, suspension and role reconciliation for communities", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Record directory (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the configured scopes and start the console
    Run {
        /// Scope the console operates on (defaults to the first configured)
        #[arg(long)]
        scope: Option<String>,
    },
    /// Print the persisted records of a scope
    Records {
        #[arg(long)]
        scope: String,
    },
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { scope } => run_bot(load_config(&cli.config, cli.data_dir), scope),
        Commands::Records { scope } => print_records(load_config(&cli.config, cli.data_dir), scope),
        Commands::Version => {
            println!("warden-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(config_path: &str, data_dir: Option<PathBuf>) -> Config {
    let mut config = if std::path::Path::new(config_path).exists() {
        Config::load(config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    if let Some(dir) = data_dir {
        config.storage.data_dir = dir;
    }
    config
}

fn run_bot(config: Config, console_scope: Option<String>) -> Result<(), BotError> {
    tracing::info!("Starting {}", config.bot.name);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let notifier: Arc<dyn Notifier> = match &config.notifications.webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
            None => Arc::new(LogNotifier),
        };
        let directory = Arc::new(InMemoryDirectory::new());

        let mut scopes = Vec::new();
        for seed in &config.scopes {
            match open_scope(&config, seed, directory.clone(), notifier.clone()).await {
                Ok(ctx) => scopes.push(ctx),
                Err(e) => {
                    tracing::error!("Failed to open scope {}: {}", seed.id, e);
                    notifier.report(&e, config.notifications.channel.as_deref()).await;
                }
            }
        }

        let selected = match &console_scope {
            Some(id) => scopes.iter().find(|s| s.scope() == id.as_str()),
            None => scopes.first(),
        };
        let result = match selected {
            Some(ctx) => ConsoleAdapter::new(&config.bot.prefix).run(ctx, directory.clone()).await,
            None => Err(BotError::InvalidArgs("no scope available for the console".to_string())),
        };

        for ctx in scopes {
            ctx.shutdown().await;
        }
        result
    })
}

async fn open_scope(
    config: &Config,
    seed: &ScopeConfig,
    directory: Arc<InMemoryDirectory>,
    notifier: Arc<dyn Notifier>,
) -> Result<ScopeContext, BotError> {
    // Role provisioning normally happens on the platform side
    for name in [BANNED, SIGNED_UP, HONORS] {
        directory.ensure_capability(&seed.id, name).await;
    }
    for course in &seed.courses {
        for name in capability::course_levels(course) {
            directory.ensure_capability(&seed.id, &name).await;
        }
    }
    for member in &seed.members {
        directory.add_member(&seed.id, member).await;
    }

    let store = FileRecordStore::open(&config.storage.data_dir, &seed.id).await?;
    tracing::info!("Opened scope {} ({})", seed.id, store.path().display());

    let mut engine = ModerationEngine::new(seed.id.clone(), Arc::new(store), directory, notifier);
    if let Some(channel) = &config.notifications.channel {
        engine = engine.with_notification_channel(channel.clone());
    }

    let ctx = if config.reconciler.enabled {
        ScopeContext::start(engine, config.reconciler.period_ms)
    } else {
        ScopeContext::new(engine)
    };
    Ok(ctx)
}

fn print_records(config: Config, scope: String) -> Result<(), BotError> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let store = FileRecordStore::open(&config.storage.data_dir, &scope).await?;
        let records = store.list().await?;
        if records.is_empty() {
            println!("No records for {}", scope);
        }
        for record in records {
            println!("{}", record);
        }
        Ok::<(), BotError>(())
    })
}

fn init_config() -> Result<(), BotError> {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config)
        .map_err(|e| BotError::InvalidArgs(format!("Failed to render config: {}", e)))?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}
