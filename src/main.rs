//! QuizMaker - create, manage and host quizzes.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizmaker::{
    config::{CheckConfig, Cli, Command, ServeConfig, TokenConfig, TokenOutputFormat},
    server::{create_router, ClientConfig, RouterConfig},
    store::{QuizStore, SupabaseStore},
    SessionTokenAuth,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Token(config) => run_token(config),
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    // validate() guarantees all three are present
    let supabase_url = config.supabase_url.clone().unwrap_or_default();
    let supabase_key = config.supabase_key.clone().unwrap_or_default();
    let jwt_secret = config.jwt_secret.clone().unwrap_or_default();

    info!("QuizMaker v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Store: {}", supabase_url);
    info!("  Image bucket: {}", config.quiz_bucket);
    info!("  Store timeout: {}s", config.store_timeout_secs);
    match config.cors_origins() {
        Some(origins) => info!("  CORS origins: {}", origins.join(", ")),
        None => warn!("  CORS: any origin allowed (set ALLOWED_ORIGINS to restrict)"),
    }

    let store = match SupabaseStore::new(
        &supabase_url,
        supabase_key.clone(),
        Duration::from_secs(config.store_timeout_secs),
    ) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to create store client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Connecting to store...");
    if let Err(e) = store.health_check().await {
        error!("  Failed to reach store: {}", e);
        error!("  Please check:");
        error!("    - SUPABASE_URL points at your project");
        error!("    - SUPABASE_KEY is valid for that project");
        return ExitCode::FAILURE;
    }
    info!("  Connected successfully");

    let client = ClientConfig {
        supabase_url,
        supabase_key,
        quiz_bucket: config.quiz_bucket.clone(),
    };
    let router = create_router(store, build_router_config(&config, jwt_secret, client));

    let addr = config.bind_address();

    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("    curl http://{}/api/ping", addr);
    info!("    open http://{}/quizmaker", addr);
    info!("────────────────────────────────────────────────────────────────");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "quizmaker=debug,tower_http=debug"
    } else {
        "quizmaker=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig, secret: String, client: ClientConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new(secret, client);

    if let Some(origins) = config.cors_origins() {
        router_config = router_config.with_cors_origins(origins);
    }

    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Token Command
// =============================================================================

fn run_token(config: TokenConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let tokens = SessionTokenAuth::new(&config.jwt_secret);
    let token = tokens.issue(&config.username, config.admin);

    match config.format {
        TokenOutputFormat::Token => {
            println!("{}", token);
        }
        TokenOutputFormat::Json => {
            let claims = match tokens.verify(&token) {
                Ok(claims) => claims,
                Err(e) => {
                    eprintln!("Error: freshly issued token failed verification: {}", e);
                    return ExitCode::FAILURE;
                }
            };

            let json = serde_json::json!({
                "token": token,
                "username": claims.username,
                "admin": claims.admin,
                "iat": claims.iat,
                "exp": claims.exp,
            });
            match serde_json::to_string_pretty(&json) {
                Ok(out) => println!("{}", out),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("QuizMaker Configuration Check");
    println!("═════════════════════════════");
    println!();

    if let Err(e) = config.validate() {
        println!("✗ {}", e);
        return ExitCode::FAILURE;
    }

    let url = config.supabase_url.clone().unwrap_or_default();
    let key = config.supabase_key.clone().unwrap_or_default();
    println!("✓ Store: {}", url);
    println!();

    let store = match SupabaseStore::new(&url, key, Duration::from_secs(config.store_timeout_secs))
    {
        Ok(store) => store,
        Err(e) => {
            println!("✗ {}", e);
            return ExitCode::FAILURE;
        }
    };

    print!("Testing store connection... ");
    match store.health_check().await {
        Ok(()) => println!("✓ success"),
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Please check:");
            println!("  - The project URL is correct and reachable");
            println!("  - The key belongs to that project");
            println!("  - The quizzes table exists");
            return ExitCode::FAILURE;
        }
    }

    if config.list_quizzes {
        println!();
        println!("Quizzes (newest first):");
        println!("───────────────────────");

        match store.list_quizzes().await {
            Ok(quizzes) if quizzes.is_empty() => println!("  (no quizzes found)"),
            Ok(quizzes) => {
                for quiz in &quizzes {
                    println!("  {:<24} {}", quiz.slug, quiz.name);
                }
                println!();
                println!("Total: {} quiz(zes)", quizzes.len());
            }
            Err(e) => println!("  Error listing quizzes: {}", e),
        }
    }

    println!();
    println!("═════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
