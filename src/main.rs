//! Estate predictor entry point

use clap::Parser;
use estate_predictor::cli::{cmd_info, cmd_predict, cmd_serve, cmd_train, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "estate_predictor=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, model_dir, test_size, seed, cv_folds } => {
            cmd_train(&data, &model_dir, test_size, seed, cv_folds)?;
        }
        Commands::Predict { model_dir, input } => {
            cmd_predict(&model_dir, &input)?;
        }
        Commands::Serve { host, port, model_dir, data } => {
            cmd_serve(host, port, model_dir, data).await?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
    }

    Ok(())
}
