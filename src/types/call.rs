//! Elementary calls executed by a Safe.

use crate::error::MultisendError;
use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::{SolType, sol_data},
};
use serde::{Deserialize, Serialize};

/// How a Safe executes a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum OperationType {
    /// A regular `CALL`.
    #[default]
    Call = 0,
    /// A `DELEGATECALL`, executing the target's code in the Safe's context.
    DelegateCall = 1,
}

impl TryFrom<u8> for OperationType {
    type Error = MultisendError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Call),
            1 => Ok(Self::DelegateCall),
            other => Err(MultisendError::UnknownOperation(other)),
        }
    }
}

impl From<OperationType> for u8 {
    fn from(value: OperationType) -> Self {
        value as Self
    }
}

/// A single call made by the Safe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTransaction {
    /// The call target.
    pub to: Address,
    /// Amount of native value to send to the target, in wei.
    #[serde(with = "crate::serde::decimal_u256")]
    pub value: U256,
    /// The calldata bytes.
    #[serde(default)]
    pub data: Bytes,
    /// The operation type.
    #[serde(default)]
    pub operation: OperationType,
}

impl MetaTransaction {
    /// Creates a new `CALL`.
    pub fn call(to: Address, value: U256, data: Bytes) -> Self {
        Self { to, value, data, operation: OperationType::Call }
    }

    /// Returns `true` if the call is a `DELEGATECALL`.
    pub fn is_delegate_call(&self) -> bool {
        self.operation == OperationType::DelegateCall
    }

    /// `uint8 operation ‖ address to ‖ uint256 value ‖ uint256 dataLength ‖ bytes data`
    pub fn abi_encode_packed(&self) -> Vec<u8> {
        <(sol_data::Uint<8>, sol_data::Address, sol_data::Uint<256>, sol_data::Uint<256>, sol_data::Bytes)>::abi_encode_packed(&(
            u8::from(self.operation),
            self.to,
            self.value,
            U256::from(self.data.len()),
            self.data.clone(),
        ))
    }
}

/// Returns `true` if any of the calls transfers native value.
pub fn contains_value(transactions: &[MetaTransaction]) -> bool {
    transactions.iter().any(|tx| !tx.value.is_zero())
}
