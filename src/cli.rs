//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::py_strategy_adapter::{PyStrategyAdapter, strategy_name_from_filename};
use crate::adapters::sqlite_result_adapter::SqliteResultAdapter;
use crate::domain::error::TradebenchError;
use crate::domain::execution;
use crate::ports::result_port::ResultStore;
use crate::ports::strategy_port::StrategyStore;

#[derive(Parser, Debug)]
#[command(name = "tradebench", about = "Backtest execution server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run a backtest against a stored strategy
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Price series file (any supported tabular encoding)
        #[arg(long)]
        data: PathBuf,
        /// Name of a stored strategy
        #[arg(long)]
        strategy: String,
        /// Initial amount handed to the strategy
        #[arg(long)]
        amount: f64,
        /// Unique name for the persisted result
        #[arg(long)]
        name: String,
    },
    /// Upload a strategy artifact from a local file
    CreateStrategy {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        file: PathBuf,
    },
    /// List stored strategy names
    ListStrategies {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Delete a stored strategy
    DeleteStrategy {
        #[arg(short, long)]
        config: PathBuf,
        name: String,
    },
    /// List persisted backtest result names
    ListResults {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print one persisted backtest result as JSON
    Show {
        #[arg(short, long)]
        config: PathBuf,
        name: String,
    },
    /// Delete a persisted backtest result
    DeleteResult {
        #[arg(short, long)]
        config: PathBuf,
        name: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing();

    match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::Run {
            config,
            data,
            strategy,
            amount,
            name,
        } => run_backtest(&config, &data, &strategy, amount, &name),
        Command::CreateStrategy { config, file } => run_create_strategy(&config, &file),
        Command::ListStrategies { config } => run_list_strategies(&config),
        Command::DeleteStrategy { config, name } => run_delete_strategy(&config, &name),
        Command::ListResults { config } => run_list_results(&config),
        Command::Show { config, name } => run_show(&config, &name),
        Command::DeleteResult { config, name } => run_delete_result(&config, &name),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TradebenchError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Both stores, built once per invocation from the shared config, schema
/// created if absent.
pub fn open_stores(
    config: &FileConfigAdapter,
) -> Result<(PyStrategyAdapter, SqliteResultAdapter), TradebenchError> {
    let strategies = PyStrategyAdapter::from_config(config)?;
    let results = SqliteResultAdapter::from_config(config)?;
    results.initialize_schema()?;
    Ok((strategies, results))
}

fn with_stores<F>(config_path: &PathBuf, f: F) -> ExitCode
where
    F: FnOnce(&PyStrategyAdapter, &SqliteResultAdapter) -> Result<(), TradebenchError>,
{
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let (strategies, results) = match open_stores(&config) {
        Ok(stores) => stores,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match f(&strategies, &results) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_backtest(
    config_path: &PathBuf,
    data: &PathBuf,
    strategy: &str,
    amount: f64,
    name: &str,
) -> ExitCode {
    with_stores(config_path, |strategies, results| {
        let raw = fs::read(data)?;
        execution::run_backtest(&raw, strategy, amount, name, strategies, results)?;
        eprintln!("Backtest '{name}' created");
        Ok(())
    })
}

fn run_create_strategy(config_path: &PathBuf, file: &PathBuf) -> ExitCode {
    with_stores(config_path, |strategies, _| {
        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| TradebenchError::InvalidInput {
                reason: format!("{} has no filename", file.display()),
            })?;
        let source = fs::read(file)?;
        strategies.create(&filename, &source)?;
        eprintln!("Strategy '{}' created", strategy_name_from_filename(&filename)?);
        Ok(())
    })
}

fn run_list_strategies(config_path: &PathBuf) -> ExitCode {
    with_stores(config_path, |strategies, _| {
        for name in strategies.list()? {
            println!("{name}");
        }
        Ok(())
    })
}

fn run_delete_strategy(config_path: &PathBuf, name: &str) -> ExitCode {
    with_stores(config_path, |strategies, _| {
        strategies.delete(name)?;
        eprintln!("Strategy '{name}' deleted");
        Ok(())
    })
}

fn run_list_results(config_path: &PathBuf) -> ExitCode {
    with_stores(config_path, |_, results| {
        for name in results.list_names()? {
            println!("{name}");
        }
        Ok(())
    })
}

fn run_show(config_path: &PathBuf, name: &str) -> ExitCode {
    with_stores(config_path, |_, results| {
        let record = results.get(name)?;
        let body = serde_json::json!({
            "predictions": record.predictions,
            "results": record.results,
            "end_result": record.end_result,
        });
        let rendered =
            serde_json::to_string_pretty(&body).map_err(|e| TradebenchError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        println!("{rendered}");
        Ok(())
    })
}

fn run_delete_result(config_path: &PathBuf, name: &str) -> ExitCode {
    with_stores(config_path, |_, results| {
        results.delete(name)?;
        eprintln!("Backtest '{name}' deleted");
        Ok(())
    })
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use crate::ports::config_port::ConfigPort;
        use std::net::SocketAddr;
        use std::sync::Arc;

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let (strategies, results) = match open_stores(&config) {
            Ok(stores) => stores,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let addr: SocketAddr = match config
            .get_string("web", "listen")
            .unwrap_or_else(|| "127.0.0.1:8000".to_string())
            .parse()
        {
            Ok(a) => a,
            Err(e) => {
                eprintln!("error: invalid [web] listen address: {e}");
                return ExitCode::from(2);
            }
        };

        tracing::info!(%addr, "starting server");

        let state = AppState {
            strategies: Arc::new(strategies),
            results: Arc::new(results),
        };
        let router = build_router(state);

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: failed to start runtime: {e}");
                return ExitCode::from(1);
            }
        };

        let served = runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await
        });

        match served {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::from(1)
            }
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}
