//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use stratus::{
    Clock, CredentialProvider, EnvCredentialProvider, Fields, FixedClock, ReqwestTransport,
    SearchClient, SearchRequest, SystemClock, build_url, sign,
};

use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};

pub struct CoreApp {
    pub config: AppConfig,
    pub client: SearchClient,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        // Signing works on any URL and needs no domain configuration
        if let Commands::Sign {
            method,
            url,
            body,
            at,
        } = command
        {
            return Self::sign_request(&method, &url, &body, at).await;
        }

        let app = Self::init(&cli_config)?;
        app.execute(command).await
    }

    fn init(cli: &CliConfig) -> Result<Self> {
        Self::with_config(AppConfig::load(cli)?)
    }

    fn with_config(config: AppConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.http.timeout())
            .context("Failed to initialize HTTP client")?;
        let client = SearchClient::new(
            config.search_domain(),
            Arc::new(transport),
            Arc::new(EnvCredentialProvider::new()),
        )
        .with_mode(config.mode());

        tracing::debug!(mode = ?config.mode(), "Client initialized");
        Ok(Self { config, client })
    }

    async fn execute(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Url(args) => {
                let request = args.to_request()?;
                println!("{}", build_url(self.client.domain(), &request)?);
            }
            Commands::Search(args) => {
                let request = args.to_request()?;
                self.search(&request).await?;
            }
            Commands::Add { id, fields } => {
                let fields = parse_fields(&fields)?;
                self.client
                    .add_item(&id, fields)
                    .await
                    .with_context(|| format!("Failed to add document {}", id))?;
                println!("Added {}", id);
            }
            Commands::Update { id, fields } => {
                let fields = parse_fields(&fields)?;
                self.client
                    .update_item(&id, fields)
                    .await
                    .with_context(|| format!("Failed to update document {}", id))?;
                println!("Updated {}", id);
            }
            Commands::Remove { id } => {
                self.client
                    .remove_item(&id)
                    .await
                    .with_context(|| format!("Failed to remove document {}", id))?;
                println!("Removed {}", id);
            }
            Commands::Sign {
                method,
                url,
                body,
                at,
            } => Self::sign_request(&method, &url, &body, at).await?,
        }
        Ok(())
    }

    async fn search(&self, request: &SearchRequest) -> Result<()> {
        let page = self
            .client
            .search(request)
            .await
            .with_context(|| format!("Search on domain '{}' failed", self.config.domain.name))?;
        tracing::debug!(
            hits = page.len(),
            total = page.total_entries(),
            "Search completed"
        );
        println!("{}", serde_json::to_string_pretty(&page.to_json())?);
        Ok(())
    }

    async fn sign_request(
        method: &str,
        url: &str,
        body: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let credential = EnvCredentialProvider::new()
            .credential()
            .await
            .context("Failed to load credentials")?;
        let clock: Box<dyn Clock> = match at {
            Some(at) => Box::new(FixedClock(at)),
            None => Box::new(SystemClock),
        };
        let headers = sign(method, url, body.as_bytes(), &credential, clock.as_ref())
            .with_context(|| format!("Failed to sign {} {}", method, url))?;
        for (name, value) in headers.iter() {
            println!("{}: {}", name, value);
        }
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

/// Parse the `--fields` JSON object
fn parse_fields(json: &str) -> Result<Fields> {
    let value: serde_json::Value =
        serde_json::from_str(json).context("Failed to parse --fields JSON")?;
    Fields::from_json(&value).context("Invalid --fields")
}
