use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Cli;
use shared_config::SchedulingConfig;
use shared_models::AppError;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = SchedulingConfig::from_env();
    info!("Starting clinic scheduler");

    match commands::run(cli, config).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(rendered) => println!("{}", rendered),
            Err(e) => {
                error!("Failed to render output: {}", e);
                std::process::exit(1);
            }
        },
        Err(err) => {
            let code = match err.downcast_ref::<AppError>() {
                Some(app_error) => app_error.exit_code(),
                None => {
                    error!("{:#}", err);
                    1
                }
            };
            std::process::exit(code);
        }
    }
}
