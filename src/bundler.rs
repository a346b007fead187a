//! ERC-4337 bundler client.

use crate::{
    constants::{DUMMY_ECDSA_SIG, PLACEHOLDER_SIG, RECEIPT_POLL_INTERVAL},
    error::BundlerError,
    types::{GasPrices, PaymasterData, UnsignedUserOperation, UserOperation, UserOperationReceipt},
};
use alloy::{
    primitives::{Address, B256, ChainId},
    rpc::client::RpcClient,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};
use url::Url;

/// Third `pm_sponsorUserOperation` parameter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SponsorshipContext {
    sponsorship_policy_id: String,
}

/// Client of a bundler serving one chain and one EntryPoint.
///
/// Requests are never retried.
#[derive(Debug, Clone)]
pub struct Erc4337Bundler {
    client: RpcClient,
    entry_point: Address,
    chain_id: ChainId,
}

impl Erc4337Bundler {
    /// Creates a bundler client over HTTP.
    pub fn new(url: Url, entry_point: Address, chain_id: ChainId) -> Self {
        Self::with_client(RpcClient::new_http(url), entry_point, chain_id)
    }

    /// Creates a bundler client over an existing RPC client.
    pub fn with_client(client: RpcClient, entry_point: Address, chain_id: ChainId) -> Self {
        Self { client, entry_point, chain_id }
    }

    /// The EntryPoint operations are submitted to.
    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    /// The chain served by the bundler.
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    async fn request<P, R>(&self, method: &'static str, params: P) -> Result<R, BundlerError>
    where
        P: alloy::rpc::json_rpc::RpcSend,
        R: alloy::rpc::json_rpc::RpcRecv + DeserializeOwned,
    {
        trace!(method, chain_id = self.chain_id, "bundler request");
        Ok(self.client.request(method, params).await?)
    }

    /// Asks the paymaster to sponsor `op`.
    ///
    /// The operation carries [`PLACEHOLDER_SIG`]; the answer holds the paymaster fields and every
    /// gas limit.
    #[instrument(skip_all, fields(chain_id = self.chain_id, sender = %op.sender))]
    pub async fn sponsor_user_operation(
        &self,
        op: &UnsignedUserOperation,
        policy: Option<&str>,
    ) -> Result<PaymasterData, BundlerError> {
        let op = op.with_stub_signature(PLACEHOLDER_SIG);
        let data: PaymasterData = match policy {
            Some(policy) => {
                let context =
                    SponsorshipContext { sponsorship_policy_id: policy.to_string() };
                self.request("pm_sponsorUserOperation", (op, self.entry_point, context)).await?
            }
            None => self.request("pm_sponsorUserOperation", (op, self.entry_point)).await?,
        };
        debug!(paymaster = ?data.paymaster, "sponsored operation");
        Ok(data)
    }

    /// Estimates the gas limits of `op`, paid by the Safe itself.
    ///
    /// The operation carries [`DUMMY_ECDSA_SIG`] so validation is simulated realistically.
    #[instrument(skip_all, fields(chain_id = self.chain_id, sender = %op.sender))]
    pub async fn estimate_user_operation_gas(
        &self,
        op: &UnsignedUserOperation,
    ) -> Result<PaymasterData, BundlerError> {
        let op = op.with_stub_signature(DUMMY_ECDSA_SIG);
        let estimate: PaymasterData =
            self.request("eth_estimateUserOperationGas", (op, self.entry_point)).await?;
        Ok(PaymasterData {
            verification_gas_limit: estimate.verification_gas_limit,
            call_gas_limit: estimate.call_gas_limit,
            pre_verification_gas: estimate.pre_verification_gas,
            ..Default::default()
        })
    }

    /// Fee suggestions for operations, per speed tier.
    pub async fn get_gas_price(&self) -> Result<GasPrices, BundlerError> {
        self.request("pimlico_getUserOperationGasPrice", ()).await
    }

    /// Submits a signed operation, returning its hash.
    #[instrument(skip_all, fields(chain_id = self.chain_id, sender = %op.sender, nonce = %op.nonce))]
    pub async fn send_user_operation(&self, op: &UserOperation) -> Result<B256, BundlerError> {
        let hash = self
            .request("eth_sendUserOperation", (op.clone(), self.entry_point))
            .await
            .map_err(|err| match err {
                BundlerError::Unauthorized => err,
                err => BundlerError::SendUserOp(Box::new(err)),
            })?;
        info!(%hash, "submitted user operation");
        Ok(hash)
    }

    /// The receipt of an operation, `None` while it is pending.
    pub async fn get_user_operation_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<UserOperationReceipt>, BundlerError> {
        self.request("eth_getUserOperationReceipt", (hash,)).await
    }

    /// Polls for the receipt of an operation until it is available.
    ///
    /// There is no timeout: returns `Ok(None)` once `cancel` is triggered. Errors end the
    /// polling.
    #[instrument(skip(self, cancel))]
    pub async fn await_receipt(
        &self,
        hash: B256,
        cancel: CancellationToken,
    ) -> Result<Option<UserOperationReceipt>, BundlerError> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    warn!(%hash, "stopped waiting for user operation receipt");
                    return Ok(None);
                }
                _ = tokio::time::sleep(RECEIPT_POLL_INTERVAL) => {}
            }

            if let Some(receipt) = self.get_user_operation_receipt(hash).await? {
                debug!(%hash, success = receipt.success, "user operation included");
                return Ok(Some(receipt));
            }
        }
    }
}
