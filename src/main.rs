mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use tokenledger::config::Config;
use tokenledger::ledger::LedgerStore;
use tokenledger::observability;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn print_json<T: Serialize>(value: &T) -> Result<(), BoxError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(store: &LedgerStore, config: &Config, command: Commands) -> Result<(), BoxError> {
    match command {
        Commands::Index => store.ensure_indexes(&config.index).await?,
        Commands::Reset => store.drop_database().await?,
        Commands::Status(args) => print_json(&store.load_status(&args.context).await?)?,
        Commands::Token(args) => print_json(&store.fetch_token(&args.token_id).await?)?,
        Commands::Tokens => print_json(&store.fetch_all_tokens().await?)?,
        Commands::Graph(args) => {
            print_json(&store.fetch_graph(&args.token_id, args.since).await?)?
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config = Config::load()?;
    observability::init_tracing(&config.logging.filter);

    let store = LedgerStore::from_config(&config.store);
    let outcome = run(&store, &config, cli.command).await;
    store.close().await?;
    outcome
}
