use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use stratus::{SearchRequest, SortSpec, parse_facets, parse_filter};

use super::constants::{
    ENV_API_VERSION, ENV_CONFIG, ENV_DOMAIN, ENV_REGION, ENV_SANDBOX, ENV_TIMEOUT_SECS,
};

#[derive(Parser)]
#[command(name = "stratus")]
#[command(version, about = "Query and update CloudSearch domains", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Search domain name
    #[arg(long, short = 'd', global = true, env = ENV_DOMAIN)]
    pub domain: Option<String>,

    /// Domain region
    #[arg(long, short = 'r', global = true, env = ENV_REGION)]
    pub region: Option<String>,

    /// API version path segment
    #[arg(long, global = true, env = ENV_API_VERSION)]
    pub api_version: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = ENV_TIMEOUT_SECS)]
    pub timeout: Option<u64>,

    /// Skip all service calls (searches return no hits, updates succeed)
    #[arg(
        long,
        global = true,
        env = ENV_SANDBOX,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub sandbox: Option<bool>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,
}

/// Search arguments shared by `search` and `url`
#[derive(Args, Clone, Debug, Default)]
pub struct QueryArgs {
    /// Full-text search term
    pub term: Option<String>,

    /// Filter as a JSON object, e.g. '{"and":{"genre":"drama","year":{"min":1990,"max":1999}}}'
    #[arg(long)]
    pub filter: Option<String>,

    /// Facets as a JSON array of fields or an object of field options
    #[arg(long)]
    pub facet: Option<String>,

    /// Sort as FIELD or FIELD:asc|desc
    #[arg(long, value_parser = parse_sort)]
    pub sort: Option<SortSpec>,

    /// 1-based page number
    #[arg(long)]
    pub page: Option<u32>,

    /// Results per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Fields to return, comma separated
    #[arg(long = "return", value_delimiter = ',')]
    pub return_fields: Vec<String>,
}

impl QueryArgs {
    /// Assemble the search request from the parsed arguments
    pub fn to_request(&self) -> Result<SearchRequest> {
        let mut request = SearchRequest::by_term(self.term.clone().unwrap_or_default());

        if let Some(filter) = &self.filter {
            let value: serde_json::Value =
                serde_json::from_str(filter).context("Failed to parse --filter JSON")?;
            request = request.filters(parse_filter(&value).context("Invalid --filter")?);
        }
        if let Some(facet) = &self.facet {
            let value: serde_json::Value =
                serde_json::from_str(facet).context("Failed to parse --facet JSON")?;
            request = request.facets(parse_facets(&value).context("Invalid --facet")?);
        }
        if let Some(sort) = &self.sort {
            request = request.sort(sort.clone());
        }
        if let Some(page) = self.page {
            request = request.page(page);
        }
        if let Some(page_size) = self.page_size {
            request = request.page_size(page_size);
        }
        if !self.return_fields.is_empty() {
            request = request.return_fields(self.return_fields.iter().cloned());
        }
        Ok(request)
    }
}

/// Parse sort directive from CLI string
fn parse_sort(s: &str) -> Result<SortSpec, String> {
    s.parse()
}

/// Parse an RFC 3339 timestamp from CLI string
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Invalid timestamp '{}': {}", s, e))
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Run a search and print the result page as JSON
    Search(QueryArgs),
    /// Print the compiled search URL without sending it
    Url(QueryArgs),
    /// Add a document
    Add {
        /// Document id
        id: String,
        /// Fields as a JSON object
        #[arg(long)]
        fields: String,
    },
    /// Update a document (same call as add)
    Update {
        /// Document id
        id: String,
        /// Fields as a JSON object
        #[arg(long)]
        fields: String,
    },
    /// Remove a document
    Remove {
        /// Document id
        id: String,
    },
    /// Print SigV4 headers for a request
    Sign {
        /// HTTP method
        method: String,
        /// Full request URL
        url: String,
        /// Request body
        #[arg(long, default_value = "")]
        body: String,
        /// Signing time (RFC 3339); defaults to now
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<DateTime<Utc>>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub domain: Option<String>,
    pub region: Option<String>,
    pub api_version: Option<String>,
    pub timeout: Option<u64>,
    pub sandbox: Option<bool>,
    pub config: Option<PathBuf>,
}

impl Cli {
    fn into_parts(self) -> (CliConfig, Commands) {
        let config = CliConfig {
            domain: self.domain,
            region: self.region,
            api_version: self.api_version,
            timeout: self.timeout,
            sandbox: self.sandbox,
            config: self.config,
        };
        (config, self.command)
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    Cli::parse().into_parts()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_from(args: &[&str]) -> (CliConfig, Commands) {
        Cli::try_parse_from(args).unwrap().into_parts()
    }

    #[test]
    fn test_global_flags() {
        let (config, command) = parse_from(&[
            "stratus",
            "remove",
            "42",
            "--domain",
            "movies",
            "-r",
            "eu-west-1",
            "--timeout",
            "5",
            "--sandbox",
            "true",
        ]);
        assert_eq!(config.domain.as_deref(), Some("movies"));
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.timeout, Some(5));
        assert_eq!(config.sandbox, Some(true));
        assert!(matches!(command, Commands::Remove { ref id } if id == "42"));
    }

    #[test]
    fn test_sandbox_flag_values() {
        let sandbox = |args: &[&str]| parse_from(args).0.sandbox;
        assert_eq!(sandbox(&["stratus", "remove", "42", "--sandbox"]), Some(true));
        assert_eq!(sandbox(&["stratus", "remove", "42", "--sandbox=1"]), Some(true));
        assert_eq!(sandbox(&["stratus", "remove", "42", "--sandbox", "no"]), Some(false));
        assert_eq!(sandbox(&["stratus", "remove", "42", "--sandbox=off"]), Some(false));
        assert!(Cli::try_parse_from(["stratus", "remove", "42", "--sandbox=maybe"]).is_err());
    }

    #[test]
    fn test_url_command_builds_request() {
        let (_, command) = parse_from(&[
            "stratus",
            "url",
            "star wars",
            "--filter",
            r#"{"and":{"foo":"bar","baz":"bug"}}"#,
            "--sort",
            "year:desc",
            "--page",
            "2",
            "--page-size",
            "20",
            "--return",
            "title,year",
        ]);
        let Commands::Url(args) = command else {
            panic!("expected url command");
        };
        let request = args.to_request().unwrap();
        assert_eq!(
            request.query_string(),
            "?q=star+wars&fq=(and%20foo:'bar'baz:'bug')&size=20&return=title,year&start=20&sort=year%20desc"
        );
    }

    #[test]
    fn test_facet_argument() {
        let args = QueryArgs {
            term: Some("x".to_string()),
            facet: Some(r#"["genres"]"#.to_string()),
            ..QueryArgs::default()
        };
        assert_eq!(
            args.to_request().unwrap().query_string(),
            "?q=x&facet.genres=%7B%7D&size=10"
        );
    }

    #[test]
    fn test_invalid_filter_json() {
        let args = QueryArgs {
            filter: Some("{not json".to_string()),
            ..QueryArgs::default()
        };
        let err = args.to_request().unwrap_err();
        assert!(err.to_string().contains("--filter"));
    }

    #[test]
    fn test_invalid_sort() {
        assert!(Cli::try_parse_from(["stratus", "url", "x", "--sort", "year:sideways"]).is_err());
    }

    #[test]
    fn test_sign_command() {
        let (_, command) = parse_from(&[
            "stratus",
            "sign",
            "POST",
            "http://doc-x.us-east-1.cloudsearch.amazonaws.com/2013-01-01/documents/batch",
            "--body",
            "[]",
            "--at",
            "2015-08-30T12:36:00Z",
        ]);
        let Commands::Sign { method, body, at, .. } = command else {
            panic!("expected sign command");
        };
        assert_eq!(method, "POST");
        assert_eq!(body, "[]");
        assert_eq!(at.unwrap().timestamp(), 1440938160);
    }

    #[test]
    fn test_invalid_timestamp() {
        assert!(parse_timestamp("yesterday").is_err());
    }
}
