//! `omoconf` 바이너리 진입점.

use omoconf::interface::cli::Cli;
use omoconf::interface::composition::AppComposition;
use omoconf::interface::dispatch::{DispatchResponse, dispatch};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let action = match Cli::parse_action() {
        Ok(action) => action,
        Err(msg) => {
            eprintln!("error: {msg}");
            std::process::exit(2);
        }
    };

    let response = match AppComposition::from_settings() {
        Ok(composition) => dispatch(&composition, action).await,
        Err(err) => DispatchResponse::from_result::<()>(Err(err)),
    };

    println!("{}", response.to_pretty_json());
    if !response.is_success() {
        std::process::exit(1);
    }
}
