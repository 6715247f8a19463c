use actix_web::{App, HttpServer, middleware, web};
use clap::{Parser, Subcommand};
use tracing::info;

use job_board::api::{Services, health::health_config, validation::route_not_found};
use job_board::cli::{self, ClientCommand};
use job_board::config::{ClientConfig, Config, log_dir};
use job_board::db::{self, PgRepository};
use job_board::logging::{self, Console};
use job_board::shutdown::ShutdownCoordinator;

#[derive(Parser)]
#[command(name = "job-board", version, about = "Job board API server and client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Server(ServerCommand),
    /// Talk to a running server
    #[command(subcommand)]
    Client(ClientCommand),
}

#[derive(Subcommand)]
enum ServerCommand {
    /// Run pending migrations, then serve the HTTP API
    Serve {
        /// Overrides HOST
        #[arg(long)]
        host: Option<String>,
        /// Overrides PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply pending database migrations
    Migrate,
    /// Insert the default job postings
    Seed {
        /// Seed even when jobs already exist
        #[arg(long)]
        force: bool,
    },
}

async fn connect(config: &Config) -> sqlx::Pool<sqlx::Postgres> {
    let pool = db::connection::get_connection(&config.database_url, config.max_db_connections)
        .await
        .expect("Failed to connect to database");
    info!("Database connection pool established");
    pool
}

async fn serve(config: Config, host: Option<String>, port: Option<u16>) -> std::io::Result<()> {
    let host = host.unwrap_or_else(|| config.host.clone());
    let port = port.unwrap_or(config.port);

    info!("Starting job-board application");
    info!("Configuration loaded successfully:");
    info!("  - Max payload size: {} bytes", config.max_payload_size);
    info!("  - Max database connections: {}", config.max_db_connections);

    let pool = connect(&config).await;

    // Auto-migrate when starting the server
    db::migrations::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let services = Services::postgres(PgRepository::new(pool.clone()))
        .with_payload_limit(config.max_payload_size);
    let server_pool = pool.clone();
    let max_payload_size = config.max_payload_size;

    let server = HttpServer::new(move || {
        let services = services.clone();
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(server_pool.clone()))
            .app_data(web::PayloadConfig::default().limit(max_payload_size))
            .configure(health_config)
            .configure(move |cfg| services.configure(cfg))
            .default_service(web::to(route_not_found))
    });

    info!("Server starting on http://{}:{}", host, port);

    let server = server.bind((host.as_str(), port))?.run();
    let server_handle = server.handle();
    let server_task = actix_web::rt::spawn(server);

    ShutdownCoordinator::new(server_handle, server_task, pool)
        .wait_for_shutdown()
        .await
}

async fn run_server_command(command: ServerCommand) -> std::io::Result<()> {
    let config = Config::from_env().expect("Failed to load configuration");
    logging::init(&config.log_dir, "info", Console::Stdout)?;

    match command {
        ServerCommand::Serve { host, port } => serve(config, host, port).await,
        ServerCommand::Migrate => {
            let pool = connect(&config).await;
            db::migrations::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            pool.close().await;
            Ok(())
        }
        ServerCommand::Seed { force } => {
            let pool = connect(&config).await;
            let inserted = db::seed::seed_jobs(&PgRepository::new(pool.clone()), force)
                .await
                .expect("Failed to seed jobs");
            info!("Seeded {} jobs", inserted);
            pool.close().await;
            Ok(())
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    match Cli::parse().command {
        Command::Server(command) => run_server_command(command).await,
        Command::Client(command) => {
            logging::init(&log_dir(), "warn", Console::Stderr)?;
            if !cli::run(&ClientConfig::from_env(), command).await {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
