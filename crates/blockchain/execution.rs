use ethereum_types::{Address, U256};
use seqrex_common::types::{LegacyTransaction, TxKind};
use seqrex_storage::Store;

use crate::constants::{
    TX_CREATE_GAS_COST, TX_DATA_NON_ZERO_GAS, TX_DATA_ZERO_GAS_COST, TX_GAS_COST,
};
use crate::error::ChainError;
use crate::witness::WitnessBuilder;

/// Outcome of executing a single transaction. Failed transactions are still
/// included in blocks; their receipts carry `succeeded = false` and the gas
/// recorded here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    pub succeeded: bool,
    pub gas_used: u64,
}

impl ExecutionResult {
    const fn failed(gas_used: u64) -> Self {
        Self {
            succeeded: false,
            gas_used,
        }
    }
}

/// Gas consumed by a transaction under the stub engine: the base cost, the
/// calldata bytes, and the creation surcharge. No opcodes are executed.
pub fn intrinsic_gas(tx: &LegacyTransaction) -> u64 {
    let mut gas = TX_GAS_COST;
    for byte in tx.data.iter() {
        gas += if *byte == 0 {
            TX_DATA_ZERO_GAS_COST
        } else {
            TX_DATA_NON_ZERO_GAS
        };
    }
    if matches!(tx.to, TxKind::Create) {
        gas += TX_CREATE_GAS_COST;
    }
    gas
}

/// Applies one transaction to the account state.
///
/// Balance and nonce effects of simple value transfers are exact; contract
/// execution is stubbed (gas is accounted, nothing is deployed, no logs).
/// Overflow in the cost computation is treated as insufficient funds.
pub fn execute_transaction(
    tx: &LegacyTransaction,
    sender: Address,
    state: &Store,
    mut witness: Option<&mut WitnessBuilder>,
) -> Result<ExecutionResult, ChainError> {
    if let Some(builder) = witness.as_deref_mut() {
        builder.track_address(&sender);
        if let TxKind::Call(recipient) = tx.to {
            builder.track_address(&recipient);
        }
        if !tx.data.is_empty() {
            // placeholder for the contract bytecode fetch
            builder.track_code(&tx.data);
        }
    }

    if tx.nonce != state.get_nonce(&sender)? {
        return Ok(ExecutionResult::failed(0));
    }

    let gas_used = intrinsic_gas(tx);

    let Some(total_cost) = tx
        .gas_price
        .checked_mul(U256::from(gas_used))
        .and_then(|gas_cost| tx.value.checked_add(gas_cost))
    else {
        return Ok(ExecutionResult::failed(0));
    };

    let sender_balance = state.get_balance(&sender)?;
    if sender_balance < total_cost {
        return Ok(ExecutionResult::failed(0));
    }

    if gas_used > tx.gas_limit {
        return Ok(ExecutionResult::failed(tx.gas_limit));
    }

    state.set_balance(sender, sender_balance - total_cost)?;
    if let TxKind::Call(recipient) = tx.to {
        let recipient_balance = state.get_balance(&recipient)?;
        state.set_balance(recipient, recipient_balance.saturating_add(tx.value))?;
    }
    state.increment_nonce(sender)?;

    Ok(ExecutionResult {
        succeeded: true,
        gas_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn funded_state(sender: Address, balance: u64) -> Store {
        let state = Store::new_in_memory();
        state.set_balance(sender, U256::from(balance)).unwrap();
        state
    }

    fn transfer(nonce: u64, to: Address, value: u64, gas_price: u64) -> LegacyTransaction {
        LegacyTransaction {
            nonce,
            gas_price: U256::from(gas_price),
            gas_limit: 21_000,
            to: TxKind::Call(to),
            value: U256::from(value),
            ..Default::default()
        }
    }

    #[test]
    fn simple_transfer_moves_value_and_burns_gas() {
        let sender = Address::repeat_byte(0xaa);
        let recipient = Address::repeat_byte(0xbb);
        let state = funded_state(sender, 22_000);

        let result =
            execute_transaction(&transfer(0, recipient, 100, 1), sender, &state, None).unwrap();

        assert!(result.succeeded);
        assert_eq!(result.gas_used, 21_000);
        assert_eq!(state.get_balance(&sender).unwrap(), U256::from(900));
        assert_eq!(state.get_balance(&recipient).unwrap(), U256::from(100));
        assert_eq!(state.get_nonce(&sender).unwrap(), 1);
        assert_eq!(state.get_nonce(&recipient).unwrap(), 0);
    }

    #[test]
    fn nonce_mismatch_fails_without_side_effects() {
        let sender = Address::repeat_byte(0xaa);
        let state = funded_state(sender, 1_000_000);

        let result =
            execute_transaction(&transfer(5, Address::zero(), 1, 1), sender, &state, None).unwrap();

        assert_eq!(result, ExecutionResult::failed(0));
        assert_eq!(state.get_nonce(&sender).unwrap(), 0);
        assert_eq!(state.get_balance(&sender).unwrap(), U256::from(1_000_000));
    }

    #[test]
    fn insufficient_balance_fails_with_zero_gas() {
        let sender = Address::repeat_byte(0xaa);
        // required = 500 + 10 * 21000, far beyond the balance
        let state = funded_state(sender, 1_000);
        let result =
            execute_transaction(&transfer(0, Address::zero(), 500, 10), sender, &state, None)
                .unwrap();
        assert_eq!(result, ExecutionResult::failed(0));
        assert_eq!(state.get_balance(&sender).unwrap(), U256::from(1_000));
    }

    #[test]
    fn gas_above_limit_consumes_the_whole_limit() {
        let sender = Address::repeat_byte(0xaa);
        let state = funded_state(sender, u64::MAX);
        let tx = LegacyTransaction {
            nonce: 0,
            gas_price: U256::one(),
            gas_limit: 21_001,
            to: TxKind::Create,
            value: U256::zero(),
            data: Bytes::from_static(b"\x01"),
            ..Default::default()
        };
        // 21000 + 16 + 32000 > 21001
        let result = execute_transaction(&tx, sender, &state, None).unwrap();
        assert_eq!(result, ExecutionResult::failed(21_001));
        // no balance or nonce changes on this failure path
        assert_eq!(state.get_nonce(&sender).unwrap(), 0);
    }

    #[test]
    fn intrinsic_gas_counts_calldata_and_creation() {
        let tx = LegacyTransaction {
            to: TxKind::Create,
            data: Bytes::from_static(b"\x00\x01\x00\x02"),
            ..Default::default()
        };
        assert_eq!(
            intrinsic_gas(&tx),
            TX_GAS_COST + 2 * TX_DATA_ZERO_GAS_COST + 2 * TX_DATA_NON_ZERO_GAS + TX_CREATE_GAS_COST
        );
    }

    #[test]
    fn cost_overflow_is_insufficient_funds() {
        let sender = Address::repeat_byte(0xaa);
        let state = funded_state(sender, u64::MAX);
        let tx = LegacyTransaction {
            nonce: 0,
            gas_price: U256::MAX,
            gas_limit: u64::MAX,
            to: TxKind::Call(Address::zero()),
            value: U256::MAX,
            ..Default::default()
        };
        let result = execute_transaction(&tx, sender, &state, None).unwrap();
        assert_eq!(result, ExecutionResult::failed(0));
    }

    #[test]
    fn execution_is_deterministic_over_a_snapshot() {
        let sender = Address::repeat_byte(0xaa);
        let recipient = Address::repeat_byte(0xbb);
        let tx = transfer(0, recipient, 250, 2);

        let run = || {
            let state = funded_state(sender, 100_000);
            let result = execute_transaction(&tx, sender, &state, None).unwrap();
            (
                result,
                state.get_balance(&sender).unwrap(),
                state.get_balance(&recipient).unwrap(),
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn balance_is_conserved_up_to_gas() {
        let sender = Address::repeat_byte(0xaa);
        let recipient = Address::repeat_byte(0xbb);
        let state = funded_state(sender, 500_000);
        let tx = transfer(0, recipient, 1_234, 3);

        let total_before: U256 = state
            .iter_accounts()
            .unwrap()
            .iter()
            .map(|(_, _, balance)| *balance)
            .fold(U256::zero(), |acc, b| acc + b);
        let result = execute_transaction(&tx, sender, &state, None).unwrap();
        let total_after: U256 = state
            .iter_accounts()
            .unwrap()
            .iter()
            .map(|(_, _, balance)| *balance)
            .fold(U256::zero(), |acc, b| acc + b);

        let gas_cost = U256::from(result.gas_used) * tx.gas_price;
        assert_eq!(total_before, total_after + gas_cost);
    }

    #[test]
    fn witness_tracks_touched_accounts_and_code() {
        let sender = Address::repeat_byte(0xaa);
        let recipient = Address::repeat_byte(0xbb);
        let state = funded_state(sender, 10_000_000);
        let tx = LegacyTransaction {
            nonce: 0,
            gas_price: U256::one(),
            gas_limit: 100_000,
            to: TxKind::Call(recipient),
            value: U256::zero(),
            data: Bytes::from_static(b"\x60\x00"),
            ..Default::default()
        };

        let mut builder = WitnessBuilder::new();
        execute_transaction(&tx, sender, &state, Some(&mut builder)).unwrap();
        let witness = builder.build(None);

        assert_eq!(witness.state_nodes.len(), 2);
        assert_eq!(witness.codes.len(), 1);
        assert!(witness.block_headers.is_empty());
    }
}
