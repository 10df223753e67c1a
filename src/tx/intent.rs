//! Transaction intent value objects
//!
//! An intent is the unsigned shape of a transaction: gas limit, fees, nonce
//! and recipient. Two intents sharing a nonce form a replacement pair; the
//! ledger keeps at most one confirmed transaction per (account, nonce), so
//! the pair competes for one slot and the higher priority fee is preferred.

use crate::error::{OpsError, OpsResult};

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Eip1559TransactionRequest, U256};

/// Unsigned EIP-1559 transaction intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIntent {
    pub to: Address,
    pub value: U256,
    pub gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub max_fee_per_gas: U256,
    pub nonce: u64,
}

impl TxIntent {
    /// Build the typed transaction for signing
    pub fn to_typed(&self, chain_id: u64) -> TypedTransaction {
        let request = Eip1559TransactionRequest::new()
            .to(self.to)
            .value(self.value)
            .gas(self.gas)
            .max_fee_per_gas(self.max_fee_per_gas)
            .max_priority_fee_per_gas(self.max_priority_fee_per_gas)
            .nonce(self.nonce)
            .chain_id(chain_id);
        TypedTransaction::Eip1559(request)
    }
}

/// Two intents competing for one (account, nonce) slot.
///
/// The constructor enforces the replacement preconditions: identical nonce,
/// strictly higher priority fee on the replacement.
#[derive(Debug, Clone)]
pub struct ReplacementPair {
    pub original: TxIntent,
    pub replacement: TxIntent,
}

impl ReplacementPair {
    pub fn new(original: TxIntent, replacement: TxIntent) -> OpsResult<Self> {
        if replacement.nonce != original.nonce {
            return Err(OpsError::Config(format!(
                "replacement nonce {} does not match original nonce {}",
                replacement.nonce, original.nonce
            )));
        }
        if replacement.max_priority_fee_per_gas <= original.max_priority_fee_per_gas {
            return Err(OpsError::Config(format!(
                "replacement priority fee {} must exceed the original's {}",
                replacement.max_priority_fee_per_gas, original.max_priority_fee_per_gas
            )));
        }
        Ok(Self {
            original,
            replacement,
        })
    }

    /// Shared nonce of the pair
    pub fn nonce(&self) -> u64 {
        self.original.nonce
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(gas: u64, priority_fee: u64, nonce: u64) -> TxIntent {
        TxIntent {
            to: Address::zero(),
            value: U256::zero(),
            gas: U256::from(gas),
            max_priority_fee_per_gas: U256::from(priority_fee),
            max_fee_per_gas: U256::from(priority_fee) * 2,
            nonce,
        }
    }

    #[test]
    fn accepts_valid_replacement_pair() {
        let pair = ReplacementPair::new(
            intent(53_000, 2_000_000_180, 158),
            intent(930_000, 110_000_010_080, 158),
        )
        .unwrap();
        assert_eq!(pair.nonce(), 158);
    }

    #[test]
    fn rejects_nonce_mismatch() {
        let result = ReplacementPair::new(
            intent(53_000, 2_000_000_180, 158),
            intent(930_000, 110_000_010_080, 159),
        );
        assert!(matches!(result, Err(OpsError::Config(_))));
    }

    #[test]
    fn rejects_equal_priority_fee() {
        let result = ReplacementPair::new(
            intent(53_000, 2_000_000_180, 158),
            intent(930_000, 2_000_000_180, 158),
        );
        assert!(matches!(result, Err(OpsError::Config(_))));
    }

    #[test]
    fn typed_transaction_carries_intent_fields() {
        let typed = intent(53_000, 2_000_000_180, 158).to_typed(5);
        assert_eq!(typed.nonce(), Some(&U256::from(158)));
        assert_eq!(typed.gas(), Some(&U256::from(53_000)));
        match typed {
            TypedTransaction::Eip1559(request) => {
                assert_eq!(
                    request.max_priority_fee_per_gas,
                    Some(U256::from(2_000_000_180u64))
                );
                assert_eq!(request.chain_id, Some(5.into()));
            }
            other => panic!("expected EIP-1559 request, got {:?}", other),
        }
    }
}
