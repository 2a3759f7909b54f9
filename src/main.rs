use anyhow::Result;
use clap::Parser;
use fanout_stream::cli::{execute_grep, execute_stats, Cli, Commands};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ログはstderrへ（stdoutは集計結果用）
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Stats { input, depth, json } => {
            execute_stats(input, depth, json, cli.config).await
        }
        Commands::Grep {
            patterns,
            input,
            depth,
            ignore_case,
        } => execute_grep(patterns, input, depth, ignore_case, cli.config).await,
    };

    if let Err(error) = result {
        eprintln!("❌ エラー: {error:#}");
        std::process::exit(1);
    }

    Ok(())
}
