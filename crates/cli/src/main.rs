mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{NotifyConfig, CONFIG_FILE, DEFAULT_DB_NAME, NOTIFY_DIR};
use server::{create_router, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bpa-notify")]
#[command(about = "Partner agent notification and task core", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Overrides the port from the config file
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    Init,
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => init_project().await,
        Some(Commands::Serve { port }) => serve(port.or(cli.port)).await,
        Some(Commands::Status) => status().await,
        None => serve(cli.port).await,
    }
}

async fn init_project() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let notify_dir = cwd.join(NOTIFY_DIR);

    if notify_dir.exists() {
        println!("Already initialized at {}", notify_dir.display());
        return Ok(());
    }

    println!("Initializing bpa-notify in {}", cwd.display());
    tokio::fs::create_dir_all(&notify_dir).await?;

    let project_name = cwd
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("business-partner-agent")
        .to_string();

    let mut config = NotifyConfig::default();
    config.project.name = project_name.clone();
    config.write(&notify_dir.join(CONFIG_FILE)).await?;

    let db_path = notify_dir.join(DEFAULT_DB_NAME);
    let database_url = format!("sqlite:{}", db_path.display());
    let pool = db::create_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    println!();
    println!("Initialized bpa-notify for '{}'", project_name);
    println!();
    println!("Created:");
    println!("  {}/", NOTIFY_DIR);
    println!("  ├── {}", CONFIG_FILE);
    println!("  └── {}", DEFAULT_DB_NAME);
    println!();
    println!("Run 'bpa-notify serve' to start accepting events");

    Ok(())
}

async fn serve(port: Option<u16>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let notify_dir = cwd.join(NOTIFY_DIR);

    let (config, db_path) = if notify_dir.exists() {
        let config = NotifyConfig::load(&notify_dir.join(CONFIG_FILE)).await?;
        (config, notify_dir.join(DEFAULT_DB_NAME))
    } else {
        println!("No {} directory found.", NOTIFY_DIR);
        println!("Run 'bpa-notify init' first, or using default configuration.");
        println!();
        (NotifyConfig::default(), cwd.join(DEFAULT_DB_NAME))
    };

    init_tracing();

    let database_url = format!("sqlite:{}", db_path.display());
    tracing::info!("Database: {}", db_path.display());

    let pool = db::create_pool(&database_url)
        .await
        .context("Failed to create database pool")?;
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    let policy = config.activity_log_config();
    tracing::info!(
        connection_states = ?policy.connection_states(),
        credential_states = ?policy.credential_exchange_states(),
        presentation_states = ?policy.presentation_exchange_states(),
        auto_respond_credential_offer = policy.auto_respond_credential_offer(),
        "Task-relevance policy loaded"
    );

    let (state, service) = AppState::start(pool, policy);
    let app = create_router(state);

    let port = port.unwrap_or(config.server.port);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    println!();
    println!("bpa-notify - {}", config.project.name);
    println!("════════════════════════════════════════");
    println!();
    println!("  Events:         POST http://localhost:{}/api/events", port);
    println!("  Notifications:  GET  http://localhost:{}/api/notifications", port);
    println!("  Activities:     GET  http://localhost:{}/api/activities", port);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    service.shutdown().await;

    served.context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

async fn status() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let notify_dir = cwd.join(NOTIFY_DIR);

    if !notify_dir.exists() {
        println!("Not a bpa-notify project.");
        println!("Run 'bpa-notify init' to initialize.");
        return Ok(());
    }

    let config = NotifyConfig::load(&notify_dir.join(CONFIG_FILE)).await?;
    let db_path = notify_dir.join(DEFAULT_DB_NAME);

    if !db_path.exists() {
        println!("Project: {} (database not initialized)", config.project.name);
        return Ok(());
    }

    let database_url = format!("sqlite:{}", db_path.display());
    let pool = db::create_pool(&database_url).await?;

    let partners = db::PartnerRepository::new(pool.clone()).find_all().await?;
    let activity_repo = db::ActivityRepository::new(pool);
    let total = activity_repo.count().await?;
    let open_tasks = activity_repo.find_all(db::ActivityFilter::open_tasks()).await?;

    println!();
    println!("Project: {}", config.project.name);
    println!("Path:    {}", cwd.display());
    println!();
    println!("Partners:   {}", partners.len());
    println!("Activities: {}", total);

    if open_tasks.is_empty() {
        println!("No open tasks.");
    } else {
        println!("Open tasks ({}):", open_tasks.len());
        for task in &open_tasks {
            println!(
                "  ○ [{}] {} ({})",
                task.kind.as_str(),
                task.correlation_id(),
                task.state.as_str()
            );
        }
    }

    println!();

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bpa_notify=info,orchestrator=info,server=info,tower_http=info".into()
            }),
        )
        .init();
}
