use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use semantic_registry::config::Config;
use semantic_registry::{Kind, Registry, TargetParams, api, render, watch};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Serve and render semantic metric and dimension definitions")]
struct Cli {
    /// Configuration file (defaults to registry.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Definition root directory; may be repeated. Overrides the config file.
    #[arg(long = "semantics", global = true)]
    semantics: Vec<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,

        /// Reload automatically when definition files change
        #[arg(long)]
        watch: bool,
    },
    /// Load all definitions and report problems
    Validate,
    /// List definition names of one kind
    List { kind: Kind },
    /// Print one definition as JSON
    Show { kind: Kind, name: String },
    /// List available render targets
    Targets,
    /// Render one definition for a target
    Render {
        target: String,
        kind: Kind,
        name: String,

        /// Target parameter as key=value; may be repeated
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Write the artifact here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.trim().is_empty() {
        return Err(format!("empty parameter name in '{s}'"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_registry(config: &Config) -> Result<Registry> {
    Registry::open(config.semantics.clone()).context("failed to load semantic definitions")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if !cli.semantics.is_empty() {
        config.semantics = cli.semantics;
    }

    match cli.command {
        Command::Serve { bind, watch: watch_flag } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            config.watch |= watch_flag;

            let registry = Arc::new(open_registry(&config)?);
            let _watcher = if config.watch {
                Some(watch::spawn(Arc::clone(&registry)).context("failed to watch definition directories")?)
            } else {
                None
            };

            let app = api::create_router(registry);
            let listener = tokio::net::TcpListener::bind(&config.bind)
                .await
                .with_context(|| format!("could not bind {}", config.bind))?;
            info!(address = %config.bind, watch = config.watch, "serving semantic registry");
            axum::serve(listener, app).await?;
        }
        Command::Validate => {
            let registry = open_registry(&config)?;
            let snapshot = registry.snapshot();
            println!(
                "ok: {} metrics, {} dimensions",
                snapshot.len(Kind::Metric),
                snapshot.len(Kind::Dimension)
            );
        }
        Command::List { kind } => {
            let registry = open_registry(&config)?;
            for name in registry.snapshot().list_names(kind) {
                println!("{name}");
            }
        }
        Command::Show { kind, name } => {
            let registry = open_registry(&config)?;
            let snapshot = registry.snapshot();
            let record = snapshot.get(kind, &name)?;
            println!("{}", serde_json::to_string_pretty(record)?);
        }
        Command::Targets => {
            for target in render::targets() {
                println!("{target}");
            }
        }
        Command::Render {
            target,
            kind,
            name,
            params,
            out,
        } => {
            if render::renderer(&target).is_none() {
                bail!("unknown render target '{target}' (available: {})", render::targets().join(", "));
            }

            let registry = open_registry(&config)?;
            let params: TargetParams = params.into_iter().collect();
            let artifact = render::render(&registry.snapshot(), &target, kind, &name, &params)?;

            match out {
                Some(path) => {
                    fs::write(&path, &artifact.body).with_context(|| format!("could not write '{}'", path.display()))?;
                    info!(path = %path.display(), "wrote {} artifact", artifact.target);
                }
                None => print!("{}", artifact.body),
            }
        }
    }

    Ok(())
}
