//! Command line definition and argument helpers.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use searchconsole::{CredentialSource, Flow, Settings, Source};

#[derive(Parser, Debug)]
#[command(name = "searchconsole", version, about = "Query Google Search Console search analytics")]
pub struct Cli {
    /// Settings file (defaults to ~/.searchconsole/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Default)]
pub struct CredentialArgs {
    /// Serialized user credentials
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,

    /// Service-account key file
    #[arg(long, global = true, conflicts_with = "credentials")]
    pub service_account: Option<PathBuf>,

    /// OAuth client secrets, used when no saved credentials exist
    #[arg(long, global = true)]
    pub client_secrets: Option<PathBuf>,

    /// Consent flow for interactive authorization
    #[arg(long, global = true, value_enum, default_value_t = FlowArg::Web)]
    pub flow: FlowArg,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the consent flow and save the resulting credentials
    Auth {
        /// Where to write the credentials (defaults to the configured path)
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// List the web properties the account can access
    Sites,
    /// Run a search analytics query against one property
    Query(QueryArgs),
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Property URL, e.g. https://www.example.com/ or sc-domain:example.com
    pub site: String,

    /// First day: YYYY-MM-DD, today or yesterday
    #[arg(long, default_value = "today")]
    pub start: String,

    /// Last day (explicit range)
    #[arg(long, conflicts_with_all = ["days", "months"])]
    pub end: Option<String>,

    /// Signed day count from --start, the start day included
    #[arg(long, allow_negative_numbers = true, conflicts_with = "months")]
    pub days: Option<i64>,

    /// Signed month count from --start
    #[arg(long, allow_negative_numbers = true)]
    pub months: Option<i32>,

    /// Dimension to group by; repeat for several
    #[arg(short = 'd', long = "dimension")]
    pub dimensions: Vec<String>,

    /// Filter as DIMENSION:OPERATOR:EXPRESSION (or DIMENSION:EXPRESSION for equals)
    #[arg(short = 'f', long = "filter")]
    pub filters: Vec<String>,

    #[arg(long)]
    pub search_type: Option<String>,

    #[arg(long)]
    pub aggregation_type: Option<String>,

    #[arg(long)]
    pub data_state: Option<String>,

    #[arg(long)]
    pub limit: Option<i64>,

    #[arg(long)]
    pub start_row: Option<i64>,

    #[arg(long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Print the request body instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Table,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlowArg {
    #[default]
    Web,
    Console,
}

impl From<FlowArg> for Flow {
    fn from(arg: FlowArg) -> Self {
        match arg {
            FlowArg::Web => Flow::LocalServer,
            FlowArg::Console => Flow::Console,
        }
    }
}

/// A `--filter` value split into (dimension, operator, expression).
#[derive(Debug, PartialEq, Eq)]
pub struct FilterArg<'a> {
    pub dimension: &'a str,
    pub operator: &'a str,
    pub expression: &'a str,
}

/// Split `DIMENSION:OPERATOR:EXPRESSION`. The expression may itself contain
/// colons; a two-part value uses `equals`.
pub fn parse_filter(value: &str) -> anyhow::Result<FilterArg<'_>> {
    let parts: Vec<&str> = value.splitn(3, ':').collect();
    match parts[..] {
        [dimension, operator, expression] => Ok(FilterArg {
            dimension,
            operator,
            expression,
        }),
        [dimension, expression] => Ok(FilterArg {
            dimension,
            operator: "equals",
            expression,
        }),
        _ => anyhow::bail!("invalid filter {value:?}: expected DIMENSION:OPERATOR:EXPRESSION"),
    }
}

impl CredentialArgs {
    /// Pick a credential source: service account, then saved credentials,
    /// then an interactive flow with client secrets.
    pub fn resolve(&self, settings: &Settings) -> anyhow::Result<CredentialSource> {
        if let Some(path) = self
            .service_account
            .clone()
            .or_else(|| settings.service_account_path.clone())
        {
            return Ok(CredentialSource::ServiceAccount(Source::File(path)));
        }

        if let Some(path) = &self.credentials {
            return Ok(CredentialSource::File(path.clone()));
        }

        let saved = settings.credentials_file()?;
        if saved.exists() {
            return Ok(CredentialSource::File(saved));
        }

        self.interactive(settings)
    }

    /// Interactive flow with the configured client secrets.
    pub fn interactive(&self, settings: &Settings) -> anyhow::Result<CredentialSource> {
        let Some(secrets) = self
            .client_secrets
            .clone()
            .or_else(|| settings.client_secrets_path.clone())
        else {
            anyhow::bail!("no credentials found: pass --credentials, --service-account or --client-secrets");
        };
        Ok(CredentialSource::Interactive {
            client_secrets: Source::File(secrets),
            flow: self.flow.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_forms() {
        assert_eq!(
            parse_filter("page:contains:/blog/").unwrap(),
            FilterArg {
                dimension: "page",
                operator: "contains",
                expression: "/blog/"
            }
        );
        let with_colons = parse_filter("page:equals:https://www.example.com/").unwrap();
        assert_eq!(with_colons.expression, "https://www.example.com/");

        let short = parse_filter("country:usa").unwrap();
        assert_eq!(short.operator, "equals");
        assert!(parse_filter("query").is_err());
    }

    #[test]
    fn test_query_args_parse() {
        let cli = Cli::try_parse_from([
            "searchconsole",
            "query",
            "sc-domain:example.com",
            "--start",
            "2024-01-01",
            "--days",
            "-7",
            "-d",
            "query",
            "-d",
            "page",
            "-f",
            "query:contains:dress",
            "--limit",
            "30000",
            "--format",
            "json",
        ])
        .unwrap();

        let Command::Query(args) = cli.command else {
            panic!("expected query command");
        };
        assert_eq!(args.site, "sc-domain:example.com");
        assert_eq!(args.days, Some(-7));
        assert_eq!(args.dimensions, vec!["query", "page"]);
        assert_eq!(args.format, Format::Json);
        assert_eq!(args.limit, Some(30_000));
    }

    #[test]
    fn test_end_conflicts_with_days() {
        let result = Cli::try_parse_from([
            "searchconsole", "query", "x", "--end", "2024-01-02", "--days", "3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_prefers_service_account() {
        let args = CredentialArgs {
            service_account: Some("/keys/sa.json".into()),
            client_secrets: Some("/keys/client.json".into()),
            ..CredentialArgs::default()
        };
        let source = args.resolve(&Settings::default()).unwrap();
        assert!(matches!(source, CredentialSource::ServiceAccount(Source::File(p)) if p.ends_with("sa.json")));
    }

    #[test]
    fn test_resolve_falls_back_to_interactive() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            credentials_path: Some(dir.path().join("missing.json")),
            client_secrets_path: Some(dir.path().join("client_secrets.json")),
            ..Settings::default()
        };
        let args = CredentialArgs {
            flow: FlowArg::Console,
            ..CredentialArgs::default()
        };
        match args.resolve(&settings).unwrap() {
            CredentialSource::Interactive { flow, .. } => assert_eq!(flow, Flow::Console),
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_without_anything_fails() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            credentials_path: Some(dir.path().join("missing.json")),
            ..Settings::default()
        };
        assert!(CredentialArgs::default().resolve(&settings).is_err());
    }
}
