use clap::{Parser, Subcommand};

/// Query a Nimiq Albatross node over JSON-RPC.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Node RPC URL. Use `ws://` or `wss://` for subscriptions.
    #[arg(long, default_value = "http://127.0.0.1:8648", env = "NIMIQ_RPC_URL")]
    pub rpc_url: String,

    /// RPC username (requires --rpc-pass).
    #[arg(long, env = "NIMIQ_RPC_USER")]
    pub rpc_user: Option<String>,

    /// RPC password (requires --rpc-user).
    #[arg(long, env = "NIMIQ_RPC_PASS")]
    pub rpc_pass: Option<String>,

    /// Per-call timeout in seconds.
    #[arg(long, default_value = "5", env = "NIMIQ_RPC_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show whether the node has consensus.
    Consensus,

    /// List the basic accounts held by the node's wallet.
    Accounts,

    /// Show the current block, batch and epoch numbers.
    Height,

    /// Show a block by height or hash (latest if omitted).
    Block {
        /// Block height or hex hash.
        id: Option<String>,

        /// Include full transactions.
        #[arg(long)]
        full: bool,
    },

    /// Show an account by address.
    Account { address: String },

    /// Show the mempool summary.
    Mempool,

    /// Show connected peers.
    Peers,

    /// Print new head blocks as they arrive (needs a ws:// URL).
    FollowHeads {
        /// Stop after this many blocks.
        #[arg(long)]
        count: Option<usize>,
    },

    /// Call any method with JSON-encoded positional params and print the raw
    /// result.
    Call {
        method: String,
        params: Vec<String>,
    },
}
