use crate::{
    constants::USER_OP_IDENTIFIER,
    error::DecodeError,
    types::{
        DecodedTxData, EvmMessage, MetaTransaction, OperationType, Safe4337Module,
        TransactionSerializable, UserOperation, decode_multi, decode_rlp_transaction,
        format_cost, is_multisend,
    },
};
use alloy::{dyn_abi::TypedData, primitives::ChainId, sol_types::SolCall};

/// The call made by a plain transaction, with `gas * (maxFee + priorityFee)` as cost.
///
/// Legacy transactions are priced with `gas * gasPrice`.
pub fn decode_transaction_serializable(
    chain_id: ChainId,
    tx: &TransactionSerializable,
) -> Result<DecodedTxData, DecodeError> {
    if tx.chain_id != chain_id {
        return Err(DecodeError::ChainIdMismatch { expected: chain_id, got: tx.chain_id });
    }
    let cost = tx.max_cost()?;
    let to = tx.to.ok_or(DecodeError::MissingRecipient)?;

    Ok(DecodedTxData {
        chain_id,
        cost_estimate: format_cost(cost),
        transactions: vec![MetaTransaction::call(
            to,
            tx.value.unwrap_or_default(),
            tx.data.clone().unwrap_or_default(),
        )],
        message: None,
    })
}

/// Same as [`decode_transaction_serializable`], for an RLP encoded transaction.
pub fn decode_rlp_hex(chain_id: ChainId, raw: &[u8]) -> Result<DecodedTxData, DecodeError> {
    let tx = TransactionSerializable::from_typed(&decode_rlp_transaction(raw)?, chain_id);
    decode_transaction_serializable(chain_id, &tx)
}

/// Typed data executes nothing and costs nothing.
pub fn decode_typed_data(chain_id: ChainId, typed_data: TypedData) -> DecodedTxData {
    DecodedTxData::message(chain_id, EvmMessage::TypedData(Box::new(typed_data)))
}

/// The calls executed by a Safe operation.
///
/// A delegate call into `MultiSend` is unpacked into the batched calls.
pub fn decode_user_operation(
    chain_id: ChainId,
    op: &UserOperation,
) -> Result<DecodedTxData, DecodeError> {
    let call_data =
        op.call_data.strip_suffix(USER_OP_IDENTIFIER.as_slice()).unwrap_or(&op.call_data[..]);
    let call = Safe4337Module::executeUserOpCall::abi_decode(call_data)?;

    let transactions = if is_multisend(call.to) {
        decode_multi(&call.data)?
    } else {
        vec![MetaTransaction {
            to: call.to,
            value: call.value,
            data: call.data,
            operation: OperationType::try_from(call.operation)?,
        }]
    };

    Ok(DecodedTxData {
        chain_id,
        cost_estimate: format_cost(op.max_execution_cost()),
        transactions,
        message: None,
    })
}
