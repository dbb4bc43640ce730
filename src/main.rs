use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use touristesim::auth::TokenProvider;
use touristesim::{ApiError, Config, Method, Mode, Query, RequestOptions, TouristEsim};

/// touristesim - TouristeSIM API command line client
///
/// Credentials are read from the options below or from the TOURISTESIM_*
/// environment variables.
///
/// Examples:
///   touristesim token                        # Check that the credentials work
///   touristesim plans --country JP           # List plans for Japan
///   touristesim request GET /esims/8944.../usage
#[derive(Parser, Debug)]
#[command(author, version = touristesim::VERSION, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// OAuth client id
    #[arg(long, env = "TOURISTESIM_CLIENT_ID", global = true, hide_env_values = true)]
    client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "TOURISTESIM_CLIENT_SECRET", global = true, hide_env_values = true)]
    client_secret: Option<String>,

    /// API base URL (defaults to https://api.touristesim.net/v1)
    #[arg(long, env = "TOURISTESIM_BASE_URL", value_name = "URL", global = true)]
    base_url: Option<String>,

    /// Token endpoint (defaults to <base-url>/../oauth/token)
    #[arg(long, env = "TOURISTESIM_TOKEN_URL", value_name = "URL", global = true)]
    token_url: Option<String>,

    /// API environment: sandbox or production
    #[arg(long, env = "TOURISTESIM_MODE", global = true)]
    mode: Option<Mode>,

    /// Retries for transient failures
    #[arg(long, value_name = "N", global = true)]
    max_retries: Option<u32>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch an access token and show its lifetime
    Token,

    /// Send an arbitrary API request and print the JSON response
    Request(RequestArgs),

    /// List plans
    Plans(PlansArgs),

    /// Show the account balance
    Balance,
}

#[derive(clap::Args, Debug)]
struct RequestArgs {
    /// HTTP method
    #[arg(value_name = "METHOD", value_parser = parse_method)]
    method: Method,

    /// Path relative to the base URL, e.g. /plans
    #[arg(value_name = "PATH")]
    path: String,

    /// Query parameter, may be repeated
    #[arg(long = "query", short = 'q', value_name = "KEY=VALUE", value_parser = parse_key_value)]
    query: Vec<(String, String)>,

    /// JSON request body
    #[arg(long, value_name = "JSON", value_parser = parse_json)]
    body: Option<Value>,
}

#[derive(clap::Args, Debug)]
struct PlansArgs {
    /// ISO country code
    #[arg(long, short = 'c')]
    country: Option<String>,
}

fn parse_method(s: &str) -> std::result::Result<Method, String> {
    s.to_ascii_uppercase()
        .parse()
        .map_err(|_| format!("invalid HTTP method '{}'", s))
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    Ok((key.to_string(), value.to_string()))
}

fn parse_json(s: &str) -> std::result::Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {}", e))
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let client_id = self
            .client_id
            .clone()
            .context("Missing client id (use --client-id or TOURISTESIM_CLIENT_ID)")?;
        let client_secret = self
            .client_secret
            .clone()
            .context("Missing client secret (use --client-secret or TOURISTESIM_CLIENT_SECRET)")?;

        let mut builder = Config::builder(client_id, client_secret);
        if let Some(base_url) = &self.base_url {
            builder = builder.base_url(base_url);
        }
        if let Some(token_url) = &self.token_url {
            builder = builder.oauth_token_url(token_url);
        }
        if let Some(mode) = self.mode {
            builder = builder.mode(mode);
        }
        if let Some(max_retries) = self.max_retries {
            builder = builder.max_retries(max_retries);
        }
        Ok(builder.build()?)
    }
}

async fn run(cli: Cli) -> Result<()> {
    let sdk = TouristEsim::with_config(cli.config()?)?;

    match cli.command {
        Commands::Token => {
            let token = sdk.oauth().get_valid_token().await?;
            println!(
                "{} token, expires in {}s",
                token.token_type(),
                token.time_remaining()
            );
        }
        Commands::Request(args) => {
            let options = RequestOptions::new().with_query(args.query);
            let options = match args.body {
                Some(body) => options.body(body),
                None => options,
            };
            let body = sdk
                .http_client()
                .execute(args.method, &args.path, options)
                .await?;
            print_json(&body)?;
        }
        Commands::Plans(args) => {
            let mut filters = Query::new();
            if let Some(country) = args.country {
                filters.push(("country".to_string(), country));
            }
            let page = sdk.plans().get(filters).await?;
            for plan in page.items() {
                println!(
                    "{}\t{}\t{}\t{:.2}",
                    plan.id.map(|id| id.to_string()).unwrap_or_default(),
                    plan.name.as_deref().unwrap_or("-"),
                    plan.plan_type(),
                    plan.price()
                );
            }
            println!(
                "page {}/{} ({} plans)",
                page.current_page(),
                page.last_page(),
                page.total()
            );
        }
        Commands::Balance => {
            let balance = sdk.balance().get().await?;
            print_json(&Value::Object(balance))?;
        }
    }
    Ok(())
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints an error with its HTTP details.
fn report(err: &anyhow::Error) {
    let Some(api) = err.downcast_ref::<ApiError>() else {
        eprintln!("Error: {:#}", err);
        return;
    };

    eprintln!("Error: {}", api);
    if api.status_code() != 0 {
        eprintln!("Status: {}", api.status_code());
    }
    if let Some(errors) = api.validation_errors() {
        for (field, message) in errors {
            eprintln!("  {}: {}", field, message);
        }
    }
    if let Some(retry_after) = api.retry_after() {
        eprintln!("Retry after: {}s", retry_after);
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        report(&err);
        std::process::exit(1);
    }
}
