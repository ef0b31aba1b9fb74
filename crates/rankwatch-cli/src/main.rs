mod keywords;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::keywords::KeywordsCommands;

#[derive(Debug, Parser)]
#[command(name = "rankwatch-cli")]
#[command(about = "Keyword rank tracking command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Import, inspect and alert on keyword rankings
    Keywords {
        #[command(subcommand)]
        command: KeywordsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("rankwatch-cli: run with --help to list commands");
        return Ok(());
    };

    let config = rankwatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = rankwatch_db::PoolConfig::from_app_config(&config);
    let pool = rankwatch_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Ping => {
                rankwatch_db::ping(&pool).await?;
                println!("database ok");
            }
            DbCommands::Migrate => {
                let applied = rankwatch_db::run_migrations(&pool).await?;
                println!("applied {applied} new migration(s)");
            }
        },
        Commands::Keywords { command } => keywords::run(&pool, &config, command).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests;
