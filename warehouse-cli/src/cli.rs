use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use warehouse_core::{
    BatchOrchestrator, Config,
    provider::openweather_from_config,
    store::{self, SchemaProvisioner},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-etl", version, about = "Load city weather into the warehouse")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Warehouse database file; overrides config and environment.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Provision the schema and collect weather for every configured city.
    Run,

    /// Store the OpenWeather API key in the config file.
    Configure,
}

impl Cli {
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Config::config_file_path(),
        }
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        let mut cfg = Config::load_from(&self.config_path()?)?;
        cfg.apply_env();
        if let Some(db) = &self.database {
            cfg.database_path = Some(db.clone());
        }
        Ok(cfg)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            None | Some(Command::Run) => self.collect().await,
            Some(Command::Configure) => self.configure(),
        }
    }

    async fn collect(&self) -> anyhow::Result<()> {
        let cfg = self.load_config()?;
        let client = openweather_from_config(&cfg)?;

        let db_path = cfg.database_path()?;
        info!(database = %db_path.display(), "Opening warehouse");
        let conn = store::open(&db_path)?;

        SchemaProvisioner::new(&conn).ensure_schema()?;
        println!("Schema ready");

        let report = BatchOrchestrator::new(&conn, &client, &client, cfg.region.as_str())
            .run(cfg.cities.as_slice())
            .await;

        println!("\n--- Report ---");
        for outcome in &report.outcomes {
            println!("{outcome}");
        }
        println!(
            "\nETL complete: {} succeeded, {} failed.",
            report.succeeded(),
            report.failed()
        );

        Ok(())
    }

    fn configure(&self) -> anyhow::Result<()> {
        let path = self.config_path()?;
        let mut cfg = Config::load_from(&path)?;

        let api_key = inquire::Password::new("OpenWeather API key:")
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;

        cfg.set_openweather_api_key(api_key.trim().to_string());
        cfg.save_to(&path)?;

        println!("Saved configuration to {}", path.display());
        Ok(())
    }
}
