/// Base cost of any transaction.
pub const TX_GAS_COST: u64 = 21_000;

/// Per-byte calldata cost for zero bytes.
pub const TX_DATA_ZERO_GAS_COST: u64 = 4;

/// Per-byte calldata cost for non-zero bytes (EIP-2028).
pub const TX_DATA_NON_ZERO_GAS: u64 = 16;

/// Surcharge for contract-creating transactions.
pub const TX_CREATE_GAS_COST: u64 = 32_000;

/// How many recent block hashes the reorg detector retains per chain.
pub const REORG_WINDOW: u64 = 100;
