use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::watch;

use gridfeed_backend::cache::Cache;
use gridfeed_backend::config::Config;
use gridfeed_backend::services::scheduler::Scheduler;
use gridfeed_backend::{api, cli, db};

#[derive(Parser)]
#[command(name = "gridfeed")]
#[command(about = "NFL data aggregation service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server with the background sync scheduler
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Initialize the database schema
    InitDb,
    /// Run one sync pipeline now
    Sync {
        #[arg(short, long, default_value = "all")]
        target: String,
    },
    /// Import historical seasons from the archive
    Backfill {
        #[arg(long)]
        start_season: i64,
        #[arg(long)]
        end_season: i64,
        /// Subset of datasets (games, boxscores, stats, pbp, ngs, injuries, schedule)
        #[arg(long, value_delimiter = ',')]
        datasets: Option<Vec<String>>,
    },
    /// Recompute standings for a season week
    Standings {
        #[arg(short, long)]
        season: i64,
        #[arg(short, long)]
        week: i64,
    },
    /// Look up a team by name
    Team {
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port }) => serve(port).await?,
        Some(Commands::InitDb) => {
            let config = Config::from_env()?;
            let pool = db::create_pool(&config).await?;
            db::init_schema(&pool).await?;
            tracing::info!("Database initialized");
        }
        Some(Commands::Sync { target }) => cli::sync(&target).await?,
        Some(Commands::Backfill {
            start_season,
            end_season,
            datasets,
        }) => cli::backfill(start_season, end_season, datasets).await?,
        Some(Commands::Standings { season, week }) => cli::compute_standings(season, week).await?,
        Some(Commands::Team { name }) => cli::team_lookup(&name).await?,
        None => serve(None).await?,
    }

    Ok(())
}

async fn serve(port: Option<u16>) -> Result<()> {
    let config = Config::from_env()?;
    let port = port.unwrap_or(config.port);

    let pool = db::create_pool(&config).await?;
    db::init_schema(&pool).await?;

    let cache = Cache::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = Scheduler::new(
        pool.clone(),
        cache.clone(),
        config.scheduler.clone(),
        shutdown_rx.clone(),
    );
    let handle = scheduler.handle();
    tokio::spawn(scheduler.run());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let state = api::AppState {
        pool,
        cache,
        scheduler: handle,
    };
    api::serve(port, state, shutdown_rx).await
}
