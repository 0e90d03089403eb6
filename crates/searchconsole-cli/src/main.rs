mod cli;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{parse_filter, Cli, Command, Format, QueryArgs};
use searchconsole::transport::{QueryResponse, SiteEntry};
use searchconsole::{authenticate, Account, Query, QueryRequest, Settings, Transport, TransportError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    debug!(?settings, "Loaded settings");

    match cli.command {
        Command::Auth { save } => {
            let source = cli.credentials.interactive(&settings)?;
            let account = authenticate(source, &settings).await?;
            let path = match save {
                Some(path) => path,
                None => settings.credentials_file()?,
            };
            account.serialize_credentials(&path).await?;
            eprintln!(
                "Saved credentials to {} ({} properties)",
                path.display(),
                account.len()
            );
        }
        Command::Sites => {
            let account = connect(&cli.credentials, &settings).await?;
            for property in &account {
                println!("{}\t{}", property.url(), property.permission());
            }
        }
        Command::Query(args) => {
            if args.dry_run {
                let query = build_query(Query::new(Arc::new(NoTransport), args.site.clone()), &args)?;
                println!("{}", serde_json::to_string_pretty(&query.request()?)?);
                return Ok(());
            }

            let account = connect(&cli.credentials, &settings).await?;
            let property = account
                .get(&args.site)
                .with_context(|| format!("{} is not a property of this account", args.site))?;
            let report = build_query(property.query(), &args)?.get().await?;

            let frame = report.to_dataframe();
            match args.format {
                Format::Table => print!("{}", frame),
                Format::Json => println!("{}", serde_json::to_string_pretty(&frame)?),
            }
            debug!(rows = report.len(), pages = report.pages(), "Query printed");
        }
    }

    Ok(())
}

async fn connect(credentials: &cli::CredentialArgs, settings: &Settings) -> anyhow::Result<Account> {
    let source = credentials.resolve(settings)?;
    Ok(authenticate(source, settings).await?)
}

/// Apply the command line options to a fresh query.
fn build_query(query: Query, args: &QueryArgs) -> anyhow::Result<Query> {
    let mut query = match (&args.end, args.days, args.months) {
        (Some(end), _, _) => query.range(&args.start, end)?,
        (None, Some(days), _) => query.range_days(&args.start, days)?,
        (None, None, Some(months)) => query.range_months(&args.start, months)?,
        (None, None, None) => query.range(&args.start, &args.start)?,
    };

    query = query.dimensions(&args.dimensions)?;
    for value in &args.filters {
        let filter = parse_filter(value)?;
        query = query.filter(filter.dimension, filter.expression, filter.operator)?;
    }
    if let Some(search_type) = &args.search_type {
        query = query.search_type(search_type)?;
    }
    if let Some(aggregation) = &args.aggregation_type {
        query = query.aggregation_type(aggregation)?;
    }
    if let Some(state) = &args.data_state {
        query = query.data_state(state)?;
    }
    if let Some(limit) = args.limit {
        query = query.limit(limit)?;
    }
    if let Some(start_row) = args.start_row {
        query = query.start_row(start_row)?;
    }
    Ok(query)
}

/// Transport for `--dry-run`, which only serializes.
struct NoTransport;

#[async_trait]
impl Transport for NoTransport {
    async fn list_sites(&self) -> Result<Vec<SiteEntry>, TransportError> {
        Ok(Vec::new())
    }

    async fn query(&self, _site_url: &str, _request: &QueryRequest) -> Result<QueryResponse, TransportError> {
        Ok(QueryResponse::default())
    }
}
