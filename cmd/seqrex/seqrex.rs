mod cli;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use seqrex_blockchain::mempool::Mempool;
use seqrex_blockchain::{Blockchain, BlockchainOptions};
use seqrex_rpc::clients::EthClient;
use seqrex_rpc::{RpcApiContext, start_api};
use seqrex_sequencer::block_producer::BlockProducer;
use seqrex_sequencer::l1_watcher::L1Watcher;
use seqrex_sequencer::wal_compactor::WalCompactor;
use seqrex_sequencer::SequencerConfig;
use seqrex_storage::Store;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// How often the L1 watcher polls for new blocks.
const L1_CHECK_INTERVAL_MS: u64 = 1000;
/// Safety-net WAL compaction period.
const WAL_COMPACTION_INTERVAL_MS: u64 = 60_000;

#[tokio::main]
async fn main() {
    let opts = cli::Options::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(opts.log_level.clone())),
        )
        .init();

    if let Err(err) = launch(opts).await {
        error!("seqrex failed to start: {err}");
        std::process::exit(1);
    }
}

async fn launch(opts: cli::Options) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = SequencerConfig::from_env()?;
    if let Some(host) = opts.http_addr {
        config.api_host = host;
    }
    if let Some(port) = opts.http_port {
        config.api_port = port;
    }
    if let Some(url) = opts.l1_rpc_url {
        config.l1_rpc_url = url;
    }

    info!(
        chain_id = config.l2_chain_id,
        wal = %config.mempool_wal_path,
        "Starting seqrex sequencer"
    );
    if config.sequencer_private_key.is_none() {
        warn!("No sequencer private key configured; batch submissions are unsigned");
    }
    // the shipped KV engine is in-memory; a durable engine would open
    // config.state_db_path here
    let store = Store::new_in_memory();

    // a corrupt WAL header is fatal; a short tail is repaired by replay
    let mempool = Mempool::with_wal(config.mempool_max_size, &config.mempool_wal_path)?;

    let blockchain = Arc::new(Blockchain::new(
        store,
        mempool,
        BlockchainOptions {
            block_gas_limit: config.block_gas_limit,
            batch_size_limit: config.batch_size_limit,
            batch_interval_ms: config.batch_interval_ms,
            chain_id: config.l2_chain_id,
        },
    ));

    let l1_client = Arc::new(EthClient::new(config.l1_rpc_url.parse()?));
    let emergency_halt = Arc::new(AtomicBool::new(config.emergency_halt));
    let shutdown = Arc::new(AtomicBool::new(false));

    let producer = BlockProducer::new(
        blockchain.clone(),
        l1_client.clone(),
        config.batch_interval_ms,
        emergency_halt.clone(),
        shutdown.clone(),
    );
    let watcher = L1Watcher::new(
        blockchain.clone(),
        l1_client,
        L1_CHECK_INTERVAL_MS,
        shutdown.clone(),
    );
    let compactor = WalCompactor::new(
        blockchain.clone(),
        WAL_COMPACTION_INTERVAL_MS,
        shutdown.clone(),
    );

    tokio::spawn(producer.run());
    tokio::spawn(watcher.run());
    tokio::spawn(compactor.run());

    let http_addr: SocketAddr = format!("{}:{}", config.api_host, config.api_port).parse()?;
    // blocks until ctrl-c
    start_api(http_addr, RpcApiContext::new(blockchain)).await?;

    shutdown.store(true, Ordering::Relaxed);
    info!("seqrex shut down");
    Ok(())
}
