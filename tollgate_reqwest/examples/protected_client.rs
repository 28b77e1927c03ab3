use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use reqwest::Method;
use reqwest_middleware::ClientBuilder;
use tollgate_reqwest::{AccessTokenMiddleware, HttpsOnly, InterceptorConfig};
use tollgate_tokens::{AccessToken, StaticIdentityProvider};
use url::Url;

#[derive(Debug, Parser)]
struct Opts {
    /// The interceptor configuration file
    #[arg(short, long, env, default_value = "interceptor.json")]
    config: PathBuf,

    /// A pre-issued access token to attach to protected requests
    #[arg(short = 't', long, env, hide_env_values = true)]
    access_token: String,

    /// The HTTP method to use
    #[arg(short = 'X', long, env, default_value = "GET")]
    method: Method,

    /// Allow tokens to be sent over plaintext HTTP
    #[arg(long)]
    allow_http: bool,

    /// The URL to request
    url: Url,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();

    let config = InterceptorConfig::load(&opts.config).await?;
    let provider = Arc::new(StaticIdentityProvider::new(AccessToken::new(
        opts.access_token,
    )));

    let middleware = AccessTokenMiddleware::new(provider, config);

    let client = if opts.allow_http {
        ClientBuilder::new(reqwest::Client::new())
            .with(middleware)
            .build()
    } else {
        ClientBuilder::new(reqwest::Client::new())
            .with(middleware.with_predicate(HttpsOnly))
            .build()
    };

    let response = client.request(opts.method, opts.url.clone()).send().await?;

    tracing::info!(
        url = %opts.url,
        status = %response.status(),
        "received response"
    );

    let body = response.text().await?;
    println!("{body}");

    Ok(())
}
