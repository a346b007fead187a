//! Batching of calls through the Safe `MultiSend` contracts.

use super::{MetaTransaction, OperationType};
use crate::{
    constants::{MULTISEND_141, MULTISEND_CALLONLY_141},
    error::MultisendError,
};
use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall,
};

sol! {
    /// Reference: <https://github.com/safe-global/safe-smart-account/blob/main/contracts/libraries/MultiSend.sol>
    interface IMultiSend {
        function multiSend(bytes transactions) external payable;
    }
}

/// `uint8 operation ‖ address to ‖ uint256 value ‖ uint256 dataLength`
const PACKED_HEADER_LEN: usize = 1 + 20 + 32 + 32;

/// Returns `true` if `to` is one of the supported `MultiSend` deployments.
pub fn is_multisend(to: Address) -> bool {
    to == MULTISEND_141 || to == MULTISEND_CALLONLY_141
}

/// Collapses a list of calls into a single call.
///
/// A single call is returned unchanged. Several calls are packed into a `multiSend` delegate
/// call, targeting `MultiSendCallOnly` unless one of them is itself a delegate call.
pub fn encode_multi(transactions: &[MetaTransaction]) -> Result<MetaTransaction, MultisendError> {
    match transactions {
        [] => Err(MultisendError::EmptyBatch),
        [single] => Ok(single.clone()),
        _ => {
            let to = if transactions.iter().any(MetaTransaction::is_delegate_call) {
                MULTISEND_141
            } else {
                MULTISEND_CALLONLY_141
            };
            let packed: Vec<u8> =
                transactions.iter().flat_map(MetaTransaction::abi_encode_packed).collect();

            Ok(MetaTransaction {
                to,
                value: U256::ZERO,
                data: IMultiSend::multiSendCall { transactions: packed.into() }.abi_encode().into(),
                operation: OperationType::DelegateCall,
            })
        }
    }
}

/// Unpacks the calls of `multiSend` call data.
///
/// Any length mismatch is an error: the buffer is never silently truncated.
pub fn decode_multi(data: &[u8]) -> Result<Vec<MetaTransaction>, MultisendError> {
    let IMultiSend::multiSendCall { transactions } = IMultiSend::multiSendCall::abi_decode(data)?;

    let mut decoded = Vec::new();
    let mut offset = 0;
    while offset < transactions.len() {
        let malformed = MultisendError::Malformed { offset };
        let header = transactions.get(offset..offset + PACKED_HEADER_LEN).ok_or(malformed)?;

        let operation = OperationType::try_from(header[0])?;
        let to = Address::from_slice(&header[1..21]);
        let value = U256::from_be_slice(&header[21..53]);
        let data_len: usize = U256::from_be_slice(&header[53..85])
            .try_into()
            .map_err(|_| MultisendError::Malformed { offset })?;

        let start = offset + PACKED_HEADER_LEN;
        let end = start.checked_add(data_len).ok_or(MultisendError::Malformed { offset })?;
        let data = transactions.get(start..end).ok_or(MultisendError::Malformed { offset })?;

        decoded.push(MetaTransaction { to, value, data: Bytes::copy_from_slice(data), operation });
        offset = end;
    }

    Ok(decoded)
}
