//! sharepoint_crawler CLI - Crawl SharePoint document libraries.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use sharepoint_crawler::config::{
    DEFAULT_AUTHORITY, DEFAULT_EXTRACTION_URL, DEFAULT_GRAPH_ENDPOINT, DEFAULT_OUTPUT_PATH,
    DEFAULT_REDIRECT_URI, DEFAULT_SCOPE, DEFAULT_SCRATCH_DIR, DEFAULT_TOKEN_CACHE_PATH,
};
use sharepoint_crawler::auth::new_state;
use sharepoint_crawler::models::format_size;
use sharepoint_crawler::snapshot::write_snapshot;
use sharepoint_crawler::{
    extract_auth_code, AuthorizedClient, Authenticator, ContentExtractor, CrawlerConfig,
    CredentialStore, DocumentFetcher, FileCredentialStore, GraphEndpoints, SharePointClient,
    SiteWalker, TikaExtractor,
};

/// CLI tool for crawling SharePoint document libraries.
#[derive(Parser)]
#[command(name = "sharepoint_crawler")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Application (client) ID of the app registration.
    #[arg(long, env = "SHAREPOINT_CLIENT_ID")]
    client_id: String,

    /// Client secret of the app registration.
    #[arg(long, env = "SHAREPOINT_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// Tenant authority URL.
    #[arg(long, env = "SHAREPOINT_AUTHORITY", default_value = DEFAULT_AUTHORITY)]
    authority: String,

    /// Redirect URI registered for the app.
    #[arg(long, env = "SHAREPOINT_REDIRECT_URI", default_value = DEFAULT_REDIRECT_URI)]
    redirect_uri: String,

    /// Scopes to request (comma separated).
    #[arg(long = "scope", env = "SHAREPOINT_SCOPES", value_delimiter = ',', default_value = DEFAULT_SCOPE)]
    scopes: Vec<String>,

    /// Token cache file.
    #[arg(long, env = "SHAREPOINT_TOKEN_CACHE", default_value = DEFAULT_TOKEN_CACHE_PATH)]
    token_cache: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in interactively and store the tokens.
    Login,

    /// Forget the cached tokens.
    Logout,

    /// Walk all sites and write the extracted documents to a JSON file.
    Crawl {
        /// Document API base URL.
        #[arg(long, env = "GRAPH_ENDPOINT", default_value = DEFAULT_GRAPH_ENDPOINT)]
        graph_endpoint: String,

        /// Tika server URL.
        #[arg(long, env = "TIKA_SERVICE_URL", default_value = DEFAULT_EXTRACTION_URL)]
        extraction_url: String,

        /// Directory downloads are written to before extraction.
        #[arg(long, env = "SHAREPOINT_FILE_DIR", default_value = DEFAULT_SCRATCH_DIR)]
        scratch_dir: PathBuf,

        /// Output JSON file.
        #[arg(long, short = 'o', env = "SHAREPOINT_CONTENT_JSON_FILE", default_value = DEFAULT_OUTPUT_PATH)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sharepoint_crawler=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut builder = CrawlerConfig::builder()
        .client_id(cli.client_id)
        .client_secret(cli.client_secret)
        .authority(cli.authority)
        .redirect_uri(cli.redirect_uri)
        .scopes(cli.scopes)
        .token_cache_path(cli.token_cache);

    if let Commands::Crawl {
        graph_endpoint,
        extraction_url,
        scratch_dir,
        output,
    } = &cli.command
    {
        builder = builder
            .graph_endpoint(graph_endpoint.as_str())
            .extraction_url(extraction_url.as_str())
            .scratch_dir(scratch_dir)
            .output_path(output);
    }

    let config = builder.build();
    config.validate().context("Incomplete configuration")?;

    let auth = Authenticator::new((&config).into()).context("Invalid authority URL")?;
    let store = Arc::new(FileCredentialStore::new(&config.token_cache_path));

    match cli.command {
        Commands::Login => login(&auth, store.as_ref()).await?,

        Commands::Logout => {
            store
                .clear()
                .with_context(|| format!("Failed to remove {:?}", store.path()))?;
            println!("Token cache cleared.");
            println!(
                "To end the browser session as well, open:\n{}",
                auth.logout_url(&config.redirect_uri)
            );
        }

        Commands::Crawl { .. } => crawl(&config, auth, store).await?,
    }

    Ok(())
}

async fn login(auth: &Authenticator, store: &dyn CredentialStore) -> Result<()> {
    let state = new_state();

    println!("Open this URL in a browser and sign in:\n");
    println!("{}\n", auth.authorization_url(&state));
    println!("Then paste the URL you were redirected to:");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read redirect URL")?;

    let code = extract_auth_code(&line, Some(&state)).context("Invalid redirect")?;
    let cache = auth
        .acquire_token_by_auth_code(&code, store)
        .await
        .context("Failed to redeem authorization code")?;

    let who = cache
        .account()
        .and_then(|a| a.username.clone().or_else(|| a.name.clone()))
        .unwrap_or_else(|| "unknown account".to_string());
    println!("Signed in as {}.", who);
    Ok(())
}

async fn crawl(
    config: &CrawlerConfig,
    auth: Authenticator,
    store: Arc<FileCredentialStore>,
) -> Result<()> {
    let http = AuthorizedClient::connect(auth, store)
        .await
        .context("Not signed in")?;

    let endpoints =
        GraphEndpoints::new(&config.graph_endpoint).context("Invalid Graph endpoint")?;
    let client = SharePointClient::new(http, endpoints);
    let fetcher = DocumentFetcher::new(client.clone(), &config.scratch_dir);
    let extractor =
        TikaExtractor::new(&config.extraction_url).context("Invalid extraction service URL")?;
    let walker = SiteWalker::new(client, ContentExtractor::new(fetcher, Box::new(extractor)));

    let records = walker.crawl().await.context("Crawl aborted")?;

    write_snapshot(&config.output_path, &records)
        .await
        .with_context(|| format!("Failed to write {:?}", config.output_path))?;

    if !records.is_empty() {
        println!("{:<36} {:>10} {:<20} {:<12} {}", "ID", "SIZE", "TYPE", "CONTENT", "NAME");
        println!("{}", "-".repeat(100));
        for record in &records {
            println!("{}", record);
        }
    }

    let total: u64 = records.iter().map(|r| r.size).sum();
    println!(
        "Total files extracted: {} ({})",
        records.len(),
        format_size(total)
    );
    println!("Saved to: {:?}", config.output_path);
    Ok(())
}
