use ragchat::{
    api, app,
    cli::{
        chat,
        init::{self, InitConfig, InitResult},
        output::Output,
        Cli, Commands, LogFormat,
    },
    rag::{IndexPolicy, SetupOutcome},
    RagChatConfig,
};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    // init writes the config, so it must run before one is loaded
    let command = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Init {
            path,
            force,
            provider,
            port,
        } => {
            let config = InitConfig {
                path,
                force,
                provider,
                port,
            };
            return match init::run(config, &output) {
                InitResult::Success | InitResult::AlreadyExists => ExitCode::SUCCESS,
                InitResult::Error(_) => ExitCode::FAILURE,
            };
        }
        other => other,
    };

    let config = match RagChatConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            output.error(&format!("Failed to load {}: {}", cli.config.display(), e));
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config, cli.verbose, cli.log_format);

    let result = match command {
        Commands::Serve => serve(config).await,
        Commands::Chat => run_chat(config, &output).await,
        Commands::Index { rebuild } => run_index(config, rebuild, &output).await,
        Commands::Status => run_status(config, &output).await,
        Commands::Init { .. } => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// RUST_LOG wins over the configured level; `--verbose` bumps the default to debug.
fn init_tracing(config: &RagChatConfig, verbose: bool, format: LogFormat) {
    let default_level = if verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "ragchat={level},tower_http={level},warn",
            level = default_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

async fn serve(config: RagChatConfig) -> ragchat::Result<()> {
    let (state, _) = app::bootstrap(config, IndexPolicy::Reuse).await?;
    api::serve(state).await
}

async fn run_chat(config: RagChatConfig, output: &Output) -> ragchat::Result<()> {
    let (state, outcome) = app::bootstrap(config, IndexPolicy::Reuse).await?;
    report_outcome(&outcome, output);
    chat::run(&state, output).await
}

async fn run_index(config: RagChatConfig, rebuild: bool, output: &Output) -> ragchat::Result<()> {
    let policy = if rebuild {
        IndexPolicy::Rebuild
    } else {
        IndexPolicy::Reuse
    };
    output.header("Indexing knowledge folder");
    output.kv("folder", &config.knowledge.folder.display().to_string());
    output.kv("store", &config.store.path.display().to_string());

    let (_, outcome) = app::build_index(&config, policy).await?;
    report_outcome(&outcome, output);
    Ok(())
}

async fn run_status(config: RagChatConfig, output: &Output) -> ragchat::Result<()> {
    let index = app::open_index(&config).await?;
    let status = index.status().await?;

    output.header("Knowledge index");
    output.kv("collection", &status.collection);
    output.kv("exists", &status.exists.to_string());
    output.kv("entries", &status.entries.to_string());
    output.kv("store", &status.store);
    output.kv(
        "embedder",
        &format!("{} ({} dims)", status.embedder, status.dimensions),
    );
    match status.manifest {
        Some(manifest) => {
            output.kv("populated", &manifest.populated.to_string());
            output.kv("built at", &manifest.built_at.to_rfc3339());
            output.kv("fingerprint", &manifest.fingerprint);
        }
        None => output.kv("manifest", "none"),
    }
    Ok(())
}

fn report_outcome(outcome: &SetupOutcome, output: &Output) {
    match outcome {
        SetupOutcome::Populated { count } => {
            output.success(&format!("Indexed {} document(s)", count))
        }
        SetupOutcome::Reused { count, stale: false } => {
            output.info(&format!("Using existing index ({} entries)", count))
        }
        SetupOutcome::Reused { count, stale: true } => {
            output.warning(&format!(
                "Using existing index ({} entries), but the knowledge folder changed since it was built",
                count
            ));
            output.hint("Run `ragchat index --rebuild` to pick up the changes");
        }
        SetupOutcome::Adopted { count } => {
            output.info(&format!("Adopted existing collection ({} entries)", count))
        }
        SetupOutcome::Empty => {
            output.warning("No supported documents found; answers will use general knowledge")
        }
    }
}
