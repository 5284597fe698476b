use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use timetable::config::AppConfig;
use timetable::scrape::{self, DirectoryScraper};
use timetable::server::create_router;
use timetable::types::AppState;

#[derive(Debug, Clone, Parser)]
#[command(version, about)]
struct Args {
    /// JSON config file; environment variables override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Serve the timetable API
    Serve,
    /// Rebuild the student/course lookup tables from the course directory site
    Scrape {
        /// Override the configured semester prefix (e.g. `2502-`)
        #[arg(long)]
        semester_prefix: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .init();

    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Serve => serve(config).await,
        Command::Scrape { semester_prefix } => {
            if let Some(prefix) = semester_prefix {
                config.scrape.semester_prefix = prefix;
            }
            run_scrape(config).await
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting timetable server");

    let state = Arc::new(AppState::from_config(&config)?);
    info!("Loaded {} courses", state.catalog.len());

    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            sweeper.selections.cleanup_expired();
        }
    });

    let app = create_router(state);
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}

async fn run_scrape(config: AppConfig) -> anyhow::Result<()> {
    let scraper = DirectoryScraper::new(config.scrape.clone())?;
    let directory = scraper.run().await?;
    scrape::write_tables(
        &directory,
        &config.student_courses_path(),
        &config.course_students_path(),
    )?;
    Ok(())
}
