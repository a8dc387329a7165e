//! Makes one Yar call and prints the result as JSON.
//!
//! ```text
//! echo-call <address> <method> [params-json]
//! echo-call http://10.0.0.7:8080/api Echo '["hi"]'
//! ```
//!
//! Options come from the environment:
//!
//! - `YAR_OPTIONS`: a JSON document for [`Options`], e.g.
//!   `{"provider":"svcA","packager":"msgpack","timeout_ms":2000}`.
//! - `YAR_PROVIDER`, `YAR_CREDENTIAL`, `YAR_PACKAGER`, `YAR_TIMEOUT_MS`:
//!   override single fields on top of that.
//! - `RUST_LOG`: log filter (default `info`).

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use yar_client::prelude::*;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn options_from_env() -> Result<Options, BoxError> {
    let mut options = match env::var("YAR_OPTIONS") {
        Ok(doc) => serde_json::from_str(&doc)?,
        Err(_) => Options::default(),
    };
    if let Ok(provider) = env::var("YAR_PROVIDER") {
        options.provider = provider;
    }
    if let Ok(credential) = env::var("YAR_CREDENTIAL") {
        options.credential = credential;
    }
    if let Ok(packager) = env::var("YAR_PACKAGER") {
        options.packager = packager;
    }
    if let Ok(ms) = env::var("YAR_TIMEOUT_MS") {
        options = options.with_timeout(Duration::from_millis(ms.parse()?));
    }
    Ok(options)
}

async fn run() -> Result<Value, BoxError> {
    let mut args = env::args().skip(1);
    let (Some(address), Some(method)) = (args.next(), args.next()) else {
        return Err("usage: echo-call <address> <method> [params-json]".into());
    };
    let params: Vec<Value> = match args.next() {
        Some(json) => serde_json::from_str(&json)?,
        None => params![],
    };

    let options = options_from_env()?;
    tracing::info!(%address, %method, packager = %options.packager, "calling");

    let client = Client::new(address)?.with_options(options);
    Ok(client.call(&method, params).await?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match run().await {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
