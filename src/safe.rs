//! The Safe contracts an account is built from: address derivation, setup, operation building
//! and hashing.

use crate::{
    constants::{PLACEHOLDER_SIG, SENTINEL_OWNERS, USER_OP_IDENTIFIER},
    error::{RequestError, SafeError},
    types::{
        EntryPoint, GasPrice, MetaTransaction, Safe, Safe4337Module, SafeDeployments,
        SafeModuleSetup, SafeProxyFactory, UnsignedUserOperation, UserOperation,
    },
};
use alloy::{
    primitives::{Address, B256, Bytes, U256, aliases::U192, keccak256},
    providers::DynProvider,
    sol_types::SolCall,
};
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

/// `CREATE2` address of a Safe proxy deployed by `factory`.
///
/// ```text
/// salt         = keccak256(keccak256(setup) ‖ uint256(saltNonce))
/// initCodeHash = keccak256(proxyCreationCode ‖ uint256(singleton))
/// ```
pub fn safe_address(
    factory: Address,
    singleton: Address,
    proxy_creation_code: &[u8],
    setup: &[u8],
    salt_nonce: U256,
) -> Address {
    let mut salt_preimage = [0u8; 64];
    salt_preimage[..32].copy_from_slice(keccak256(setup).as_slice());
    salt_preimage[32..].copy_from_slice(&salt_nonce.to_be_bytes::<32>());
    let salt = keccak256(salt_preimage);

    let mut init_code = Vec::with_capacity(proxy_creation_code.len() + 32);
    init_code.extend_from_slice(proxy_creation_code);
    init_code.extend_from_slice(singleton.into_word().as_slice());

    factory.create2(salt, keccak256(init_code))
}

/// A salt nonce derived from an arbitrary label: `uint256(keccak256(utf8(message)))`.
pub fn salt_nonce_from_message(message: &str) -> U256 {
    U256::from_be_bytes(keccak256(message.as_bytes()).0)
}

/// Every contract used in account creation and execution.
#[derive(Debug)]
pub struct SafeContractSuite {
    /// Used only for stateless reads.
    setup_provider: DynProvider,
    deployments: SafeDeployments,
    proxy_creation_code: OnceCell<Bytes>,
}

impl SafeContractSuite {
    /// Creates a new [`SafeContractSuite`].
    pub fn new(setup_provider: DynProvider, deployments: SafeDeployments) -> Self {
        Self { setup_provider, deployments, proxy_creation_code: OnceCell::new() }
    }

    /// The contract addresses.
    pub fn deployments(&self) -> &SafeDeployments {
        &self.deployments
    }

    /// Creation code of the factory proxies, read once.
    pub async fn proxy_creation_code(&self) -> Result<&Bytes, SafeError> {
        self.proxy_creation_code
            .get_or_try_init(|| async {
                debug!(factory = %self.deployments.proxy_factory, "reading proxy creation code");
                let code = SafeProxyFactory::new(self.deployments.proxy_factory, &self.setup_provider)
                    .proxyCreationCode()
                    .call()
                    .await?;
                Ok::<_, SafeError>(code)
            })
            .await
    }

    /// The address the factory deploys a proxy to for `setup` and `salt_nonce`.
    pub async fn address_for_setup(
        &self,
        setup: &Bytes,
        salt_nonce: U256,
    ) -> Result<Address, SafeError> {
        let code = self.proxy_creation_code().await?;
        Ok(safe_address(
            self.deployments.proxy_factory,
            self.deployments.singleton,
            code,
            setup,
            salt_nonce,
        ))
    }

    /// `Safe.setup` call data: threshold 1, 4337 module enabled and installed as fallback handler.
    pub fn get_setup(&self, owners: Vec<Address>) -> Bytes {
        Safe::setupCall {
            _owners: owners,
            _threshold: U256::from(1),
            to: self.deployments.module_setup,
            data: SafeModuleSetup::enableModulesCall { modules: vec![self.deployments.m4337] }
                .abi_encode()
                .into(),
            fallbackHandler: self.deployments.m4337,
            paymentToken: Address::ZERO,
            payment: U256::ZERO,
            paymentReceiver: Address::ZERO,
        }
        .abi_encode()
        .into()
    }

    /// `createProxyWithNonce` call data deploying the Safe.
    pub fn factory_data(&self, setup: Bytes, salt_nonce: U256) -> Bytes {
        SafeProxyFactory::createProxyWithNonceCall {
            _singleton: self.deployments.singleton,
            initializer: setup,
            saltNonce: salt_nonce,
        }
        .abi_encode()
        .into()
    }

    /// `addOwnerWithThreshold(owner, 1)` call data.
    pub fn add_owner_data(&self, owner: Address) -> Bytes {
        Safe::addOwnerWithThresholdCall { owner, _threshold: U256::from(1) }.abi_encode().into()
    }

    /// `removeOwner(prevOwner, owner, 1)` call data. The threshold stays at 1.
    pub async fn remove_owner_data(
        &self,
        provider: &DynProvider,
        safe: Address,
        owner: Address,
    ) -> Result<Bytes, SafeError> {
        let prev_owner = self.prev_owner(provider, safe, owner).await?;
        Ok(Safe::removeOwnerCall { prevOwner: prev_owner, owner, _threshold: U256::from(1) }
            .abi_encode()
            .into())
    }

    /// The owner linked to `owner` in the Safe owner list.
    pub async fn prev_owner(
        &self,
        provider: &DynProvider,
        safe: Address,
        owner: Address,
    ) -> Result<Address, SafeError> {
        let owners = Safe::new(safe, provider).getOwners().call().await?;
        match owners.iter().position(|current| *current == owner) {
            Some(0) => Ok(SENTINEL_OWNERS),
            Some(index) => Ok(owners[index - 1]),
            None => Err(RequestError::NotAnOwner(owner).into()),
        }
    }

    /// Next EntryPoint nonce of `safe`, for key 0.
    pub async fn get_nonce(&self, provider: &DynProvider, safe: Address) -> Result<U256, SafeError> {
        Ok(EntryPoint::new(self.deployments.entry_point, provider)
            .getNonce(safe, U192::ZERO)
            .call()
            .await?)
    }

    /// Builds an operation executing `tx` from `safe`, without gas limits.
    ///
    /// `init` carries the setup and salt nonce of a Safe that still has to be deployed.
    pub fn build_user_op(
        &self,
        nonce: U256,
        tx: &MetaTransaction,
        safe: Address,
        fees: GasPrice,
        init: Option<(Bytes, U256)>,
    ) -> UnsignedUserOperation {
        let (factory, factory_data) = match init {
            Some((setup, salt_nonce)) => (
                Some(self.deployments.proxy_factory),
                Some(self.factory_data(setup, salt_nonce)),
            ),
            None => (None, None),
        };

        let mut call_data = Safe4337Module::executeUserOpCall {
            to: tx.to,
            value: tx.value,
            data: tx.data.clone(),
            operation: tx.operation.into(),
        }
        .abi_encode();
        call_data.extend_from_slice(USER_OP_IDENTIFIER.as_slice());

        UnsignedUserOperation {
            sender: safe,
            nonce,
            factory,
            factory_data,
            call_data: call_data.into(),
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            max_fee_per_gas: fees.max_fee_per_gas,
        }
    }

    /// Reads the digest the owner has to sign for `op` from the 4337 module.
    ///
    /// The operation is hashed with the placeholder signature, so the validity window is zero.
    #[instrument(skip_all, fields(sender = %op.sender, nonce = %op.nonce))]
    pub async fn op_hash(
        &self,
        provider: &DynProvider,
        op: &UserOperation,
    ) -> Result<B256, SafeError> {
        let packed = op.clone().with_signature(PLACEHOLDER_SIG).pack();
        let hash = Safe4337Module::new(self.deployments.m4337, provider)
            .getOperationHash(packed)
            .call()
            .await?;
        debug!(%hash, "operation hash");
        Ok(hash)
    }
}
