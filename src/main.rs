//! WallMatch service entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > env > config)
//!   4. Init logger once
//!   5. Load the artwork catalog
//!   6. Build the image-edit provider and probe it
//!   7. Spawn Ctrl-C → shutdown signal watcher
//!   8. Serve the HTTP API until shutdown

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use wallmatch::bootstrap::logger::{self, LogSettings};
use wallmatch::catalog::Catalog;
use wallmatch::comms::axum_channel::{self, AppState};
use wallmatch::compositor::Compositor;
use wallmatch::compositor::fetch::ArtworkFetcher;
use wallmatch::core::config::{self, Config};
use wallmatch::core::error::AppError;
use wallmatch::imagegen::providers;
use wallmatch::matcher::Matcher;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Optional file; a missing .env is fine.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(LogSettings {
        level: effective_log_level,
        prefer_level: args.log_level.is_some(),
        file: config.log_file.as_deref(),
    })?;

    info!(
        name = %config.name,
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    let catalog = Arc::new(Catalog::load(&config.catalog.path)?);

    let provider = providers::build(&config.imagegen, config.gemini_api_key.clone())
        .map_err(|e| AppError::Provider(e.to_string()))?;
    match provider.ping().await {
        Ok(()) => info!(provider = provider.name(), "image provider reachable"),
        Err(e) => warn!(provider = provider.name(), error = %e, "image provider unreachable; remote edits will fall back"),
    }

    let fetcher = ArtworkFetcher::new().map_err(|e| AppError::Provider(e.to_string()))?;
    let compositor = Compositor::new(provider, fetcher, config.compositor.clone());
    let matcher = Matcher::new(catalog.clone(), config.catalog.max_results);

    let state = AppState {
        matcher: Arc::new(matcher),
        compositor: Arc::new(compositor),
        vocabulary: Arc::new(config.vocabulary.clone()),
    };

    // Ctrl-C cancels the token; axum drains in-flight requests.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    print_startup_summary(&config, catalog.len());

    axum_channel::serve(&config.http, state, shutdown).await?;

    let _ = { use std::io::Write as _; std::io::stderr().flush() };
    Ok(())
}

fn print_startup_summary(config: &Config, artworks: usize) {
    let fit = |text: String| -> String {
        const WIDTH: usize = 58;
        let char_count = text.chars().count();
        if char_count >= WIDTH {
            let mut out = text.chars().take(WIDTH - 1).collect::<String>();
            out.push('…');
            out
        } else {
            format!("{text:<WIDTH$}")
        }
    };

    let origins = if config.http.allowed_origins.is_empty() {
        "any".to_string()
    } else {
        config.http.allowed_origins.join(", ")
    };
    let c = &config.compositor;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ 🖼️  WallMatch                                                 ║");
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║   {}║", fit(format!("name: {}", config.name)));
    println!("║   {}║", fit(format!("pid: {}", std::process::id())));
    println!("║   {}║", fit(format!("listen: {}", config.http.bind)));
    println!("║   {}║", fit(format!("cors: {origins}")));
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║ 📚 Catalog                                                   ║");
    println!("║   {}║", fit(format!("{} ({artworks} artworks)", config.catalog.path.display())));
    println!("║   {}║", fit(format!("max results: {}", config.catalog.max_results)));
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║ 🎨 Compositor                                                ║");
    println!(
        "║   {}║",
        fit(format!("provider={} model={}", config.imagegen.provider, config.provider_model()))
    );
    println!("║   {}║", fit(format!("prompt: {}", c.prompt_file.display())));
    println!(
        "║   {}║",
        fit(format!(
            "fetch timeouts: remote={}s local={}s",
            c.remote_fetch_timeout.as_secs(),
            c.local_fetch_timeout.as_secs()
        ))
    );
    println!("╚══════════════════════════════════════════════════════════════╝");
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: wallmatch [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                println!();
                println!("Environment:");
                println!("  GEMINI_API_KEY             API key for the gemini image provider");
                println!("  WALLMATCH_LOG_LEVEL        Override server.log_level");
                println!("  WALLMATCH_CATALOG          Override catalog.path");
                println!("  WALLMATCH_BIND             Override http.bind");
                std::process::exit(0);
            }
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            other => eprintln!("warning: ignoring unknown argument '{other}'"),
        }
    }

    // -v warn, -vv info, -vvv debug, -vvvv+ trace.
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, config_path }
}
