use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tokenledger")]
#[command(about = "Token ledger store maintenance CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the configured indexes
    Index,
    /// Drop every collection
    Reset,
    /// Print the saved status checkpoint for a context
    Status(StatusArgs),
    /// Print one token record
    Token(TokenArgs),
    /// Print every token record
    Tokens,
    /// Print a token's graph
    Graph(GraphArgs),
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    pub context: String,
}

#[derive(clap::Args, Debug)]
pub struct TokenArgs {
    pub token_id: String,
}

#[derive(clap::Args, Debug)]
pub struct GraphArgs {
    pub token_id: String,

    /// Hide nodes prunable at or below this height
    #[arg(long)]
    pub since: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_graph_with_floor() {
        let cli = Cli::try_parse_from(["tokenledger", "graph", "abcd", "--since", "20"]).unwrap();
        match cli.command {
            Commands::Graph(args) => {
                assert_eq!(args.token_id, "abcd");
                assert_eq!(args.since, Some(20));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_status_requires_context() {
        assert!(Cli::try_parse_from(["tokenledger", "status"]).is_err());
    }
}
