use clap::Parser;

#[derive(Parser)]
#[command(
    name = "seqrex",
    author,
    version,
    about = "seqrex L2 sequencer node",
    long_about = "Accepts signed transactions over JSON-RPC, orders them into \
                  blocks, aggregates blocks into batches and submits them to L1."
)]
pub struct Options {
    /// Override the RPC bind host (defaults to $API_HOST or 0.0.0.0).
    #[arg(long = "http.addr", value_name = "ADDRESS")]
    pub http_addr: Option<String>,

    /// Override the RPC bind port (defaults to $API_PORT or 6197).
    #[arg(long = "http.port", value_name = "PORT")]
    pub http_port: Option<u16>,

    /// Override the L1 RPC endpoint (defaults to $L1_RPC_URL).
    #[arg(long = "l1.rpc-url", value_name = "URL")]
    pub l1_rpc_url: Option<String>,

    /// tracing directive, e.g. "info" or "seqrex_blockchain=debug".
    #[arg(long = "log.level", value_name = "DIRECTIVE", default_value = "info")]
    pub log_level: String,
}
