//! Reduction of signing requests to the hash the owner signs.

use crate::{
    error::{DecodeError, RequestError, SafeError},
    gas::GasMode,
    safe_message::{SafeInfo, decode_safe_message, decoded_message, message_hash},
    signers::SignatureRequest,
    types::{
        EncodedSignRequest, EncodedTxData, EvmData, EvmMessage, MetaTransaction,
        SendTransactionParams, SignMethod, SignRequest, TransactionParams,
        TransactionSerializable, decode_rlp_transaction,
    },
    wallet::SafeWallet,
};
use alloy::{
    consensus::{SignableTransaction, TxEip1559},
    hex,
    primitives::{Address, Bytes, ChainId, TxKind, eip191_hash_message},
    providers::Provider,
    rpc::types::TransactionRequest,
};
use std::future::IntoFuture;
use itertools::Itertools;
use tracing::{debug, instrument};

/// The single sender of a request.
fn unique_from(request: &SignRequest) -> Result<Address, RequestError> {
    let senders: Vec<Address> = request.method.from_addresses().into_iter().unique().collect();
    match senders.as_slice() {
        [] => Err(RequestError::MissingFrom),
        [from] => Ok(*from),
        _ => Err(RequestError::AmbiguousSender(senders)),
    }
}

/// Raw bytes of a message given either as text or as `0x` hex.
fn message_bytes(message: &str) -> Vec<u8> {
    message
        .strip_prefix("0x")
        .and_then(|raw| hex::decode(raw).ok())
        .unwrap_or_else(|| message.as_bytes().to_vec())
}

/// The call an RLP encoded transaction makes.
fn call_from_rlp(chain_id: ChainId, raw: &[u8]) -> Result<MetaTransaction, DecodeError> {
    let tx = TransactionSerializable::from_typed(&decode_rlp_transaction(raw)?, chain_id);
    if tx.chain_id != chain_id {
        return Err(DecodeError::ChainIdMismatch { expected: chain_id, got: tx.chain_id });
    }
    let to = tx.to.ok_or(DecodeError::MissingRecipient)?;
    Ok(MetaTransaction::call(to, tx.value.unwrap_or_default(), tx.data.unwrap_or_default()))
}

impl SafeWallet {
    /// Returns `true` if requests from `from` are signed by the Safe, `false` if they are signed
    /// by the owner directly.
    ///
    /// The zero address stands for the Safe.
    pub fn encode_for_safe(&self, from: Address) -> Result<bool, RequestError> {
        let safe = self.address();
        let owner = self.mpc_address();
        if from == safe || from == Address::ZERO {
            Ok(true)
        } else if from == owner {
            Ok(false)
        } else {
            Err(RequestError::UnexpectedFrom { from, safe, owner })
        }
    }

    /// The Safe messages are signed for on `chain_id`.
    pub fn safe_info(&self, chain_id: ChainId) -> SafeInfo {
        SafeInfo { address: self.address(), chain_id, version: Some(self.safe_version().clone()) }
    }

    /// Reduces `request` to the hash the owner signs.
    ///
    /// Transactions are turned into a user operation, gas negotiated per `gas_mode`, whose JSON
    /// is returned as message. Messages are wrapped in a `SafeMessage` unless the request comes
    /// from the owner itself.
    #[instrument(skip_all, fields(chain_id = request.chain_id, method = request.method.name()))]
    pub async fn request_router(
        &self,
        request: &SignRequest,
        gas_mode: &GasMode,
    ) -> Result<EncodedSignRequest, SafeError> {
        let from = unique_from(request)?;
        if !self.encode_for_safe(from)? {
            debug!(%from, "signing as owner");
            return match &request.method {
                SignMethod::SendTransaction(SendTransactionParams::Calls(calls)) => {
                    self.owner_transaction(request.chain_id, calls).await
                }
                _ => Ok(eoa_encoding(request)?),
            };
        }

        let safe_info = self.safe_info(request.chain_id);
        match &request.method {
            SignMethod::SignTypedData { typed_data, .. } => {
                let message = EvmMessage::TypedData(typed_data.clone());
                let decoded = decode_safe_message(message.clone(), &safe_info)?;
                Ok(EncodedSignRequest { evm_message: message, hash_to_sign: decoded.safe_message_hash })
            }
            SignMethod::PersonalSign { message, .. } | SignMethod::EthSign { message, .. } => {
                let decoded = decode_safe_message(message.clone().into(), &safe_info)?;
                Ok(EncodedSignRequest {
                    evm_message: decoded.decoded_message,
                    hash_to_sign: decoded.safe_message_hash,
                })
            }
            SignMethod::SendTransaction(params) => {
                let transactions: Vec<MetaTransaction> = match params {
                    SendTransactionParams::Calls(calls) => {
                        calls.iter().cloned().map(MetaTransaction::from).collect()
                    }
                    SendTransactionParams::Rlp(raw) => vec![call_from_rlp(request.chain_id, raw)?],
                };
                let op = self.build_transaction(request.chain_id, &transactions, gas_mode).await?;
                let hash_to_sign = self.op_hash(request.chain_id, &op).await?;
                let evm_message = serde_json::to_string(&op)
                    .map_err(|err| SafeError::InternalError(err.into()))?;
                Ok(EncodedSignRequest { evm_message: evm_message.into(), hash_to_sign })
            }
        }
    }

    /// An EIP-1559 transaction sent by the owner itself, completed from the chain.
    ///
    /// The message is the unsigned RLP encoding, the hash its signing hash.
    async fn owner_transaction(
        &self,
        chain_id: ChainId,
        calls: &[TransactionParams],
    ) -> Result<EncodedSignRequest, SafeError> {
        let [call] = calls else {
            let reason = "the owner sends one transaction at a time";
            return Err(RequestError::Unsupported(reason).into());
        };
        let provider = &self.chain(chain_id)?.provider;
        let owner = self.mpc_address();
        let value = call.value.unwrap_or_default();
        let input = call.data.clone().unwrap_or_default();

        let (nonce, gas_price, max_priority_fee_per_gas) = tokio::try_join!(
            provider.get_transaction_count(owner).into_future(),
            provider.get_gas_price(),
            provider.get_max_priority_fee_per_gas(),
        )?;
        let gas_limit = match call.gas {
            Some(gas) => gas.saturating_to(),
            None => {
                let request = TransactionRequest::default()
                    .from(owner)
                    .to(call.to)
                    .value(value)
                    .input(input.clone().into());
                provider.estimate_gas(request).await?
            }
        };

        let tx = TxEip1559 {
            chain_id,
            nonce,
            gas_limit,
            max_fee_per_gas: gas_price + max_priority_fee_per_gas,
            max_priority_fee_per_gas,
            to: TxKind::Call(call.to),
            value,
            input,
            access_list: Default::default(),
        };
        debug!(nonce, gas_limit, "owner transaction");
        Ok(EncodedSignRequest {
            evm_message: Bytes::from(tx.encoded_for_signing()).to_string().into(),
            hash_to_sign: tx.signature_hash(),
        })
    }

    /// Reduces `request` to its hash and has the signer encode its own request for it.
    pub async fn encode_sign_request(
        &self,
        request: &SignRequest,
        gas_mode: &GasMode,
    ) -> Result<EncodedTxData, SafeError> {
        let EncodedSignRequest { evm_message, hash_to_sign } =
            self.request_router(request, gas_mode).await?;
        let signer_payload = self
            .signer()
            .encode_signature_request_tx(&SignatureRequest {
                path: self.signer().derivation_path().to_string(),
                payload: hash_to_sign,
                key_version: 0,
            })
            .await
            .map_err(SafeError::signer)?;

        Ok(EncodedTxData {
            signer_payload,
            evm_data: EvmData { chain_id: request.chain_id, evm_message, hash_to_sign },
        })
    }
}

/// Hashes of messages as signed by a plain account: EIP-191 for text, EIP-712 for typed data.
fn eoa_encoding(request: &SignRequest) -> Result<EncodedSignRequest, RequestError> {
    match &request.method {
        SignMethod::PersonalSign { message, .. } | SignMethod::EthSign { message, .. } => {
            Ok(EncodedSignRequest {
                evm_message: decoded_message(message).into(),
                hash_to_sign: eip191_hash_message(message_bytes(message)),
            })
        }
        SignMethod::SignTypedData { typed_data, .. } => {
            let message = EvmMessage::TypedData(typed_data.clone());
            let hash_to_sign = message_hash(&message)?;
            Ok(EncodedSignRequest { evm_message: message, hash_to_sign })
        }
        // RLP transactions carry no sender and are sent by the Safe
        SignMethod::SendTransaction(_) => Err(RequestError::MissingFrom),
    }
}
