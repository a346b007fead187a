use super::{EvmMessage, MetaTransaction, TransactionSerializable, UserOperation};
use alloy::primitives::{ChainId, U256, utils::format_ether};
use serde::{Deserialize, Serialize};

/// The intent reconstructed from a payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedTxData {
    /// The chain the payload was submitted for.
    pub chain_id: ChainId,
    /// Upper bound of the fees, in ether.
    pub cost_estimate: String,
    /// The calls executed by the payload. Empty for messages.
    pub transactions: Vec<MetaTransaction>,
    /// The message, when the payload is not a transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<EvmMessage>,
}

impl DecodedTxData {
    /// A payload that is only a message.
    pub fn message(chain_id: ChainId, message: EvmMessage) -> Self {
        Self {
            chain_id,
            cost_estimate: "0".to_string(),
            transactions: Vec::new(),
            message: Some(message),
        }
    }
}

/// Formats wei as ether, without trailing zeros.
pub fn format_cost(wei: U256) -> String {
    let formatted = format_ether(wei);
    match formatted.split_once('.') {
        Some((int, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() { int.to_string() } else { format!("{int}.{frac}") }
        }
        None => formatted,
    }
}

/// Where a signed payload is submitted.
#[derive(Debug, Clone)]
pub enum BroadcastTarget {
    /// A plain transaction, sent to the chain.
    Evm(TransactionSerializable),
    /// A user operation, sent to the bundler.
    Bundler(UserOperation),
}
