//! market-glance: a terminal dashboard over warehouse market data.

use market_glance::cli::{Cli, MockWarehouseKind};
use market_glance::config::{Config, ConnectionConfig, DEFAULT_CONNECTION};
use market_glance::connection::ConnectionManager;
use market_glance::dashboard::Dashboard;
use market_glance::error::{DashError, Result};
use market_glance::logging;
use market_glance::query::QueryRunner;
use market_glance::tui::{self, headless, App};
use market_glance::warehouse::{FailingWarehouse, MockWarehouse, Warehouse};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Could not load .env file: {e}");
        }
    }

    let cli = Cli::parse_args();
    if cli.headless {
        logging::init_stderr_logging();
    } else {
        logging::init_file_logging();
    }

    let code = match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e.message());
            1
        }
    };
    std::process::exit(code);
}

async fn run(cli: &Cli) -> Result<i32> {
    cli.validate_headless().map_err(DashError::config)?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_overrides(&mut config);

    let mut manager = ConnectionManager::new();
    let connected = open_connection(cli, &config, &mut manager).await;

    let runner = manager
        .warehouse()
        .map(|warehouse| QueryRunner::new(warehouse, config.dashboard.cache_ttl()));
    let mut dashboard = Dashboard::new(runner, &config.dashboard.queries_dir);
    if let Err(e) = &connected {
        error!("Could not connect to '{}': {}", cli.connection, e);
        dashboard.report_connection_error(e);
    }

    let mut app = App::new(dashboard, manager.label());
    let outcome = if cli.headless {
        headless::run_headless(cli, app).await
    } else {
        tui::run(&mut app).await.map(|()| 0)
    };

    if let Err(e) = manager.close().await {
        warn!("Failed to release the warehouse connection: {}", e);
    }
    outcome
}

/// Opens the session's warehouse connection, or an in-memory one for `--mock`.
async fn open_connection(cli: &Cli, config: &Config, manager: &mut ConnectionManager) -> Result<()> {
    if let Some(kind) = cli.mock {
        let warehouse: Arc<dyn Warehouse> = match kind {
            MockWarehouseKind::Demo => Arc::new(MockWarehouse::demo()),
            MockWarehouseKind::Empty => Arc::new(MockWarehouse::empty()),
            MockWarehouseKind::Failing => Arc::new(FailingWarehouse::new()),
        };
        *manager = ConnectionManager::with_warehouse("mock", warehouse);
        return Ok(());
    }

    let mut connection = match config.get_connection(Some(&cli.connection)) {
        Some(connection) => connection.clone(),
        // the default Snowflake connection may come entirely from the environment
        None if cli.connection == DEFAULT_CONNECTION => ConnectionConfig::default(),
        None => {
            return Err(DashError::config(format!(
                "Connection '{}' not found in config file",
                cli.connection
            )));
        }
    };
    connection.apply_env_defaults();

    manager
        .connect(&cli.connection, &connection, config.dashboard.query_timeout())
        .await?;
    Ok(())
}
