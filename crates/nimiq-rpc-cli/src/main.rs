mod cli;

use std::time::Duration;

use clap::Parser;
use eyre::{eyre, WrapErr};
use serde_json::Value;

use nimiq_rpc::types::{AccountType, Block, BlockKind, BlockTransactions};
use nimiq_rpc::{ClientConfig, ClientError, NimiqClient, RpcError};

use cli::Command;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    let config = ClientConfig::from_url(
        &args.rpc_url,
        args.rpc_user.as_deref(),
        args.rpc_pass.as_deref(),
    )
    .context("invalid RPC connection settings")?
    .with_timeout(Duration::from_secs(args.timeout_secs));

    let client = NimiqClient::connect(config)
        .await
        .map_err(|err| connect_error(&args.rpc_url, &err))?;
    tracing::debug!(url = %client.config().endpoint_url(), "client ready");

    let outcome = run(&client, args.command, &args.rpc_url).await;
    client.close().await;
    outcome
}

async fn run(client: &NimiqClient, command: Command, rpc_url: &str) -> eyre::Result<()> {
    match command {
        Command::Consensus => {
            let established = client
                .is_consensus_established()
                .await
                .map_err(|err| call_error(rpc_url, err, "fetch consensus state"))?;
            println!("Consensus: {}", if established { "established" } else { "syncing" });
        }

        Command::Accounts => {
            let addresses = client
                .list_accounts()
                .await
                .map_err(|err| call_error(rpc_url, err, "list wallet accounts"))?;
            for address in addresses {
                let account = client
                    .get_account_by_address(&address)
                    .await
                    .with_context(|| format!("fetch account {address}"))?;
                if account.data.account_type() == AccountType::Basic {
                    println!("{}  {}", account.data.address, format_luna(account.data.balance));
                }
            }
        }

        Command::Height => {
            let block = client.block_number().await.context("fetch block number")?;
            let batch = client.batch_number().await.context("fetch batch number")?;
            let epoch = client.epoch_number().await.context("fetch epoch number")?;
            println!("block {block}  batch {batch}  epoch {epoch}");
        }

        Command::Block { id, full } => {
            let include = Some(full);
            let block = match id.as_deref() {
                None => Some(client.get_latest_block(include).await?),
                Some(id) => match id.parse::<u32>() {
                    Ok(height) => client.get_block_by_number(height, include).await?,
                    Err(_) => client.get_block_by_hash(id, include).await?,
                },
            };
            let block = block.ok_or_else(|| eyre!("block not found"))?;
            print_block(&block);
        }

        Command::Account { address } => {
            let account = client
                .get_account_by_address(&address)
                .await
                .with_context(|| format!("fetch account {address}"))?;
            println!(
                "{}  {:?}  {}  (at block #{})",
                account.data.address,
                account.data.account_type(),
                format_luna(account.data.balance),
                account.metadata.block_number
            );
        }

        Command::Mempool => {
            let info = client.mempool().await.context("fetch mempool")?;
            let min_fee = client
                .min_fee_per_byte()
                .await
                .context("fetch minimum fee")?;
            println!("{} transactions, min fee {min_fee} Luna/byte", info.total);
            for (bucket, count) in &info.fee_buckets {
                println!("  >= {bucket} Luna/byte: {count}");
            }
        }

        Command::Peers => {
            let peers = client.peer_list().await.context("fetch peer list")?;
            println!("{} peers", peers.len());
            for peer in peers {
                println!("  {peer}");
            }
        }

        Command::FollowHeads { count } => follow_heads(client, count).await?,

        Command::Call { method, params } => {
            let params: Vec<Value> = params.iter().map(String::as_str).map(parse_param).collect();
            let result = client
                .call_raw(&method, params)
                .await
                .with_context(|| format!("call `{method}`"))?;
            println!(
                "{}",
                serde_json::to_string_pretty(&result).context("format result")?
            );
        }
    }

    Ok(())
}

async fn follow_heads(client: &NimiqClient, count: Option<usize>) -> eyre::Result<()> {
    let mut heads = client
        .subscribe_for_head_block(Some(false))
        .await
        .context("subscribe to head blocks")?;
    tracing::info!(subscription = heads.id(), "following head blocks; ctrl-c to stop");

    let mut seen = 0usize;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            item = heads.next() => {
                let Some(block) = item else {
                    tracing::warn!("head block subscription ended");
                    break;
                };
                print_block(&block.context("decode head block")?);
                seen += 1;
                if count.is_some_and(|count| seen >= count) {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn print_block(block: &Block) {
    let kind = match &block.kind {
        BlockKind::Micro { .. } => "micro",
        BlockKind::Macro {
            is_election_block: true,
            ..
        } => "macro (election)",
        BlockKind::Macro { .. } => "macro",
    };
    println!("{kind} block #{}: {}", block.number, block.hash);
    match &block.transactions {
        Some(BlockTransactions::Full(txs)) => {
            for tx in txs {
                println!("  {}  {} -> {}  {}", tx.hash, tx.from, tx.to, format_luna(tx.value));
            }
        }
        Some(BlockTransactions::Hashes(hashes)) => {
            for hash in hashes {
                println!("  {hash}");
            }
        }
        None => {}
    }
}

/// 1 NIM = 100 000 Luna.
fn format_luna(luna: u64) -> String {
    format!("{}.{:05} NIM", luna / 100_000, luna % 100_000)
}

/// Positional params are JSON; anything that does not parse is sent as a
/// string so addresses and hashes need no quoting.
fn parse_param(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Failures that mean the node could not be talked to at all, as opposed to
/// the node answering with an error.
fn is_reachability_error(err: &ClientError) -> bool {
    matches!(
        err.rpc(),
        Some(RpcError::Connection(_) | RpcError::Timeout { .. } | RpcError::Protocol(_))
    )
}

fn call_error(rpc_url: &str, err: ClientError, context: &'static str) -> eyre::Report {
    if is_reachability_error(&err) {
        connect_error(rpc_url, &err)
    } else {
        eyre::Report::new(err).wrap_err(context)
    }
}

fn connect_error(rpc_url: &str, err: &ClientError) -> eyre::Report {
    eyre!(format_rpc_connect_error(rpc_url, err))
        .wrap_err("while attempting to talk to the Nimiq node")
}

fn format_rpc_connect_error(rpc_url: &str, err: &ClientError) -> String {
    let source_error = err.to_string();
    let mut lines = vec![
        format!("could not reach RPC endpoint `{rpc_url}`"),
        format!("RPC error: {source_error}"),
    ];

    let hint = match err {
        ClientError::Config(_) => {
            Some("hint: check --rpc-url and that --rpc-user/--rpc-pass are set together")
        }
        ClientError::Rpc(RpcError::Connection(msg))
            if msg.contains("401") || msg.contains("403") || msg.contains("authentication") =>
        {
            Some("hint: authentication failed; verify --rpc-user/--rpc-pass")
        }
        ClientError::Rpc(RpcError::Connection(msg))
            if msg.contains("dns error") || msg.contains("failed to lookup") =>
        {
            Some("hint: hostname resolution failed; verify the endpoint hostname and your DNS/network")
        }
        ClientError::Rpc(RpcError::Connection(msg))
            if msg.contains("tls") || msg.contains("certificate") =>
        {
            Some("hint: TLS handshake failed; verify certificate trust and the https/wss scheme")
        }
        ClientError::Rpc(RpcError::Connection(_)) => Some(
            "hint: is the node running with its RPC server enabled? (default port 8648)",
        ),
        ClientError::Rpc(RpcError::Timeout { .. }) => {
            Some("hint: the node is slow to answer; raise --timeout-secs")
        }
        ClientError::Rpc(RpcError::Protocol(_)) => {
            Some("hint: the endpoint did not answer with JSON-RPC; verify the URL points at the node RPC port")
        }
        _ => None,
    };
    lines.extend(hint.map(str::to_owned));

    lines.join("\n")
}
