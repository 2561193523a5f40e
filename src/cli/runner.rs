//! CLI runner - executes commands

use crate::cli::commands::{parse_stream_list, Cli, Commands, OutputFormat};
use crate::config::TapConfig;
use crate::connector::{Connector, GladlyTap};
use crate::engine::Message;
use crate::error::{Error, Result};
use crate::types::LogLevel;
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let tap = GladlyTap::new()?;

        match &self.cli.command {
            Commands::Spec => self.spec(&tap),
            Commands::Check => self.check(&tap).await,
            Commands::Discover => self.discover(&tap).await,
            Commands::Streams => self.streams(&tap),
            Commands::Read { streams } => self.read(&tap, streams.as_deref()).await,
        }
    }

    /// Load configuration; inline JSON takes precedence
    fn load_config(&self) -> Result<TapConfig> {
        if let Some(json) = &self.cli.config_json {
            return TapConfig::from_json(json);
        }

        if let Some(path) = &self.cli.config {
            return TapConfig::from_file(path);
        }

        Err(Error::config(
            "No configuration given; pass --config FILE or --config-json JSON",
        ))
    }

    /// Show spec
    fn spec(&self, tap: &GladlyTap) -> Result<()> {
        let spec = tap.spec();
        self.output_message(&json!({
            "type": "SPEC",
            "spec": spec,
        }));
        Ok(())
    }

    /// Check connection
    async fn check(&self, tap: &GladlyTap) -> Result<()> {
        let config = self.load_config()?;
        let result = tap.check(&config).await?;

        let status = if result.success { "SUCCEEDED" } else { "FAILED" };
        self.output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": {
                "status": status,
                "message": result.message.unwrap_or_else(|| "Connection successful".to_string())
            }
        }));

        Ok(())
    }

    /// Print the catalog
    async fn discover(&self, tap: &GladlyTap) -> Result<()> {
        let config = self.load_config()?;
        let catalog = tap.discover(&config).await?;
        self.output_message(&serde_json::to_value(&catalog)?);
        Ok(())
    }

    /// List stream names; without a config every declared stream is listed
    fn streams(&self, tap: &GladlyTap) -> Result<()> {
        let names: Vec<String> = if self.cli.config.is_some() || self.cli.config_json.is_some() {
            let config = self.load_config()?;
            tap.streams(&config)?
                .names()
                .into_iter()
                .map(String::from)
                .collect()
        } else {
            tap.definition()
                .all_streams()
                .into_iter()
                .map(|s| s.name)
                .collect()
        };

        self.output_message(&json!({
            "type": "STREAMS",
            "streams": names,
            "connector": tap.definition().name
        }));

        Ok(())
    }

    /// Read streams, printing messages as they arrive
    async fn read(&self, tap: &GladlyTap, streams: Option<&str>) -> Result<()> {
        let config = self.load_config()?;
        let selected = streams.map(parse_stream_list);

        let mut messages = tap.read(&config, selected.as_deref()).await?;
        let mut records = 0usize;

        while let Some(message) = messages.next().await {
            match message? {
                Message::Log { level, message } => log_message(level, &message),
                other => {
                    if other.is_record() {
                        records += 1;
                    }
                    self.output_message(&other.to_json());
                }
            }
        }

        info!("Read {} records", records);
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Route an engine log message to tracing
fn log_message(level: LogLevel, message: &str) {
    match level {
        LogLevel::Debug => debug!("{}", message),
        LogLevel::Info => info!("{}", message),
        LogLevel::Warn => warn!("{}", message),
        LogLevel::Error => error!("{}", message),
    }
}
