//! A Safe account driven by a remote signer: operation building, signing and submission.

use crate::{
    account::SafeAccount,
    bundler::Erc4337Bundler,
    chains::{Chain, Chains},
    config::SafeConfig,
    error::{BundlerError, SafeError},
    gas::GasMode,
    pimlico::PimlicoClient,
    safe::SafeContractSuite,
    signers::{MpcSigner, pack_signature, select_signature},
    transport::{RETRY_LAYER, create_transport},
    types::{
        MetaTransaction, SignRequest, SponsorshipPolicy, TransactionParams, U48, UserOperation,
        UserOperationReceipt, encode_multi,
    },
};
use alloy::{
    primitives::{Address, B256, Bytes, ChainId, U256},
    providers::{Provider, ProviderBuilder},
    rpc::client::ClientBuilder,
};
use semver::Version;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// A Safe whose sole owner is a key held by a remote signer.
#[derive(Debug)]
pub struct SafeWallet {
    signer: Arc<dyn MpcSigner>,
    suite: SafeContractSuite,
    account: SafeAccount,
    chains: Chains,
    pimlico: Option<PimlicoClient>,
    safe_version: Version,
    gas_mode: GasMode,
}

impl SafeWallet {
    /// Connects to every configured chain and derives the account of `signer`.
    pub async fn create(config: &SafeConfig, signer: Arc<dyn MpcSigner>) -> eyre::Result<Self> {
        let setup_provider = {
            let (transport, is_local) = create_transport(&config.setup_rpc).await?;
            let client = ClientBuilder::default().layer(RETRY_LAYER).transport(transport, is_local);
            ProviderBuilder::new().connect_client(client).erased()
        };
        let suite = SafeContractSuite::new(setup_provider, config.deployments);
        let account = SafeAccount::derive(&suite, signer.address(), config.safe_salt_nonce).await?;
        let chains = Chains::from_config(config).await?;

        info!(
            account_id = signer.account_id(),
            owner = %signer.address(),
            safe = %account.address(),
            "safe wallet ready"
        );

        Ok(Self::new(signer, suite, account, chains)
            .with_pimlico(config.secrets.pimlico_api_key.clone().map(PimlicoClient::new))
            .with_safe_version(config.safe_version.clone())
            .with_gas_mode(config.gas.clone()))
    }

    /// Assembles a wallet from its parts.
    pub fn new(
        signer: Arc<dyn MpcSigner>,
        suite: SafeContractSuite,
        account: SafeAccount,
        chains: Chains,
    ) -> Self {
        Self {
            signer,
            suite,
            account,
            chains,
            pimlico: None,
            safe_version: Version::new(1, 4, 1),
            gas_mode: GasMode::default(),
        }
    }

    /// Sets the Pimlico client used for policy lookups.
    pub fn with_pimlico(mut self, pimlico: Option<PimlicoClient>) -> Self {
        self.pimlico = pimlico;
        self
    }

    /// Sets the Safe version.
    pub fn with_safe_version(mut self, version: Version) -> Self {
        self.safe_version = version;
        self
    }

    /// Sets the default gas mode.
    pub fn with_gas_mode(mut self, gas_mode: GasMode) -> Self {
        self.gas_mode = gas_mode;
        self
    }

    /// The Safe address.
    pub fn address(&self) -> Address {
        self.account.address()
    }

    /// The owner address controlled by the remote signer.
    pub fn mpc_address(&self) -> Address {
        self.signer.address()
    }

    /// The account the remote signer acts for.
    pub fn mpc_account_id(&self) -> &str {
        self.signer.account_id()
    }

    /// The account.
    pub fn account(&self) -> &SafeAccount {
        &self.account
    }

    /// The remote signer.
    pub fn signer(&self) -> &Arc<dyn MpcSigner> {
        &self.signer
    }

    /// The Safe contracts.
    pub fn suite(&self) -> &SafeContractSuite {
        &self.suite
    }

    /// The Safe version.
    pub fn safe_version(&self) -> &Version {
        &self.safe_version
    }

    /// The gas mode used when a request does not pick one.
    pub fn gas_mode(&self) -> &GasMode {
        &self.gas_mode
    }

    pub(crate) fn chain(&self, chain_id: ChainId) -> Result<&Chain, SafeError> {
        self.chains.get(chain_id)
    }

    fn bundler(&self, chain_id: ChainId) -> Result<&Erc4337Bundler, SafeError> {
        self.chain(chain_id)?.bundler()
    }

    /// Native balance of the Safe.
    pub async fn get_balance(&self, chain_id: ChainId) -> Result<U256, SafeError> {
        Ok(self.chain(chain_id)?.provider.get_balance(self.address()).await?)
    }

    /// Returns `true` if the Safe is deployed on `chain_id`.
    pub async fn safe_deployed(&self, chain_id: ChainId) -> Result<bool, SafeError> {
        let provider = &self.chain(chain_id)?.provider;
        self.account.deployments().is_deployed(chain_id, provider, self.address()).await
    }

    /// Builds an operation executing `transactions`, with gas negotiated per `gas_mode`.
    ///
    /// Several transactions are batched through `multiSend`. An undeployed Safe is deployed by
    /// the operation itself.
    #[instrument(skip_all, fields(chain_id = chain_id, calls = transactions.len()))]
    pub async fn build_transaction(
        &self,
        chain_id: ChainId,
        transactions: &[MetaTransaction],
        gas_mode: &GasMode,
    ) -> Result<UserOperation, SafeError> {
        let tx = encode_multi(transactions)?;
        let chain = self.chain(chain_id)?;
        let bundler = chain.bundler()?;

        let (gas_prices, nonce, deployed) = tokio::try_join!(
            async { bundler.get_gas_price().await.map_err(SafeError::from) },
            self.suite.get_nonce(&chain.provider, self.address()),
            self.safe_deployed(chain_id),
        )?;
        debug!(%nonce, deployed, "building user operation");

        let init = (!deployed).then(|| self.account.deployment_params());
        let op = self.suite.build_user_op(nonce, &tx, self.address(), gas_prices.fast, init);
        Ok(gas_mode.negotiate(bundler, op, deployed).await?)
    }

    /// The digest the owner signs for `op`.
    pub async fn op_hash(&self, chain_id: ChainId, op: &UserOperation) -> Result<B256, SafeError> {
        self.suite.op_hash(&self.chain(chain_id)?.provider, op).await
    }

    /// Signs an operation hash with the remote signer, returning the packed signature.
    #[instrument(skip(self))]
    pub async fn sign_transaction(&self, op_hash: B256) -> Result<Bytes, SafeError> {
        let candidates = self.signer.sign_hash(op_hash).await.map_err(SafeError::signer)?;
        let signature = select_signature(op_hash, &candidates, self.mpc_address())?;
        Ok(pack_signature(&signature.as_bytes(), U48::ZERO, U48::ZERO))
    }

    /// Attaches the owner `signature` to `op` and submits it.
    pub async fn broadcast_bundler(
        &self,
        chain_id: ChainId,
        signature: &[u8],
        op: UserOperation,
    ) -> Result<B256, SafeError> {
        let op = op.with_signature(pack_signature(signature, U48::ZERO, U48::ZERO));
        self.execute_transaction(chain_id, &op).await
    }

    /// Submits a signed operation, returning its hash.
    pub async fn execute_transaction(
        &self,
        chain_id: ChainId,
        op: &UserOperation,
    ) -> Result<B256, SafeError> {
        Ok(self.bundler(chain_id)?.send_user_operation(op).await?)
    }

    /// The receipt of an operation, `None` while it is pending.
    pub async fn get_op_receipt(
        &self,
        chain_id: ChainId,
        op_hash: B256,
    ) -> Result<Option<UserOperationReceipt>, SafeError> {
        let receipt = self.bundler(chain_id)?.get_user_operation_receipt(op_hash).await?;
        self.observe_receipt(chain_id, receipt.as_ref()).await;
        Ok(receipt)
    }

    /// Waits for the receipt of an operation until `cancel` is triggered.
    pub async fn await_op_receipt(
        &self,
        chain_id: ChainId,
        op_hash: B256,
        cancel: CancellationToken,
    ) -> Result<Option<UserOperationReceipt>, SafeError> {
        let receipt = self.bundler(chain_id)?.await_receipt(op_hash, cancel).await?;
        self.observe_receipt(chain_id, receipt.as_ref()).await;
        Ok(receipt)
    }

    // an included operation from the Safe proves its deployment
    async fn observe_receipt(&self, chain_id: ChainId, receipt: Option<&UserOperationReceipt>) {
        if receipt.is_some_and(|receipt| receipt.success && receipt.sender == self.address()) {
            self.account.deployments().mark_deployed(chain_id).await;
        }
    }

    /// Returns `true` if the Safe can pay for `transactions` and `gas_cost`.
    ///
    /// Nothing to pay is always funded, without a balance read.
    pub async fn sufficiently_funded(
        &self,
        chain_id: ChainId,
        transactions: &[MetaTransaction],
        gas_cost: U256,
    ) -> Result<bool, SafeError> {
        let tx_value = transactions.iter().fold(U256::ZERO, |acc, tx| acc + tx.value);
        let required = tx_value + gas_cost;
        if required.is_zero() {
            return Ok(true);
        }
        let balance = self.get_balance(chain_id).await?;
        Ok(required < balance)
    }

    /// A call adding `owner` to the Safe, keeping the threshold at 1.
    pub fn add_owner_tx(&self, owner: Address) -> MetaTransaction {
        MetaTransaction::call(self.address(), U256::ZERO, self.suite.add_owner_data(owner))
    }

    /// A call removing `owner` from the Safe.
    pub async fn remove_owner_tx(
        &self,
        chain_id: ChainId,
        owner: Address,
    ) -> Result<MetaTransaction, SafeError> {
        let data = self
            .suite
            .remove_owner_data(&self.chain(chain_id)?.provider, self.address(), owner)
            .await?;
        Ok(MetaTransaction::call(self.address(), U256::ZERO, data))
    }

    /// A request whose only effect is deploying the Safe.
    pub fn deployment_request(&self, chain_id: ChainId) -> SignRequest {
        SignRequest::send_transaction(
            chain_id,
            vec![TransactionParams {
                from: self.address(),
                to: Address::ZERO,
                gas: None,
                value: Some(U256::ZERO),
                data: Some(Bytes::new()),
            }],
        )
    }

    /// A request adding `recovery_owner` to the Safe.
    pub fn add_owner_request(&self, chain_id: ChainId, recovery_owner: Address) -> SignRequest {
        SignRequest::send_transaction(
            chain_id,
            vec![TransactionParams {
                from: self.address(),
                to: self.address(),
                gas: None,
                value: Some(U256::ZERO),
                data: Some(self.suite.add_owner_data(recovery_owner)),
            }],
        )
    }

    /// Sponsorship policies of the Pimlico account applying to `chain_id`.
    pub async fn policy_for_chain_id(
        &self,
        chain_id: ChainId,
    ) -> Result<Vec<SponsorshipPolicy>, SafeError> {
        let pimlico = self.pimlico.as_ref().ok_or(BundlerError::MissingApiKey)?;
        Ok(pimlico.policies_for_chain(chain_id).await?)
    }
}
