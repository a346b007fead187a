//! ERC-4337 v0.7 user operations and their on-chain packing.

use super::{PackedUserOperation, U48};
use alloy::{
    primitives::{Address, B256, Bytes, ChainId, U128, U256},
    rpc::types::Log,
    sol,
    sol_types::{SolStruct, eip712_domain},
};
use serde::{Deserialize, Serialize};

sol! {
    /// The EIP-712 struct hashed by `Safe4337Module.getOperationHash`.
    ///
    /// ```solidity
    /// SafeOp(address safe,uint256 nonce,bytes initCode,bytes callData,uint128 verificationGasLimit,uint128 callGasLimit,uint256 preVerificationGas,uint128 maxPriorityFeePerGas,uint128 maxFeePerGas,bytes paymasterAndData,uint48 validAfter,uint48 validUntil,address entryPoint)
    /// ```
    #[derive(Debug)]
    struct SafeOp {
        address safe;
        uint256 nonce;
        bytes initCode;
        bytes callData;
        uint128 verificationGasLimit;
        uint128 callGasLimit;
        uint256 preVerificationGas;
        uint128 maxPriorityFeePerGas;
        uint128 maxFeePerGas;
        bytes paymasterAndData;
        uint48 validAfter;
        uint48 validUntil;
        address entryPoint;
    }
}

/// `uint128(hi) ‖ uint128(lo)`
pub fn pack_gas(hi: U128, lo: U128) -> B256 {
    let mut packed = B256::ZERO;
    packed[..16].copy_from_slice(&hi.to_be_bytes::<16>());
    packed[16..].copy_from_slice(&lo.to_be_bytes::<16>());
    packed
}

/// `factory ‖ factoryData`, or empty if there is no factory.
pub fn pack_init_code(factory: Option<Address>, factory_data: Option<&Bytes>) -> Bytes {
    match factory {
        Some(factory) => {
            let mut init_code = factory.to_vec();
            init_code.extend_from_slice(factory_data.map(|d| d.as_ref()).unwrap_or_default());
            init_code.into()
        }
        None => Bytes::new(),
    }
}

/// `paymaster ‖ uint128(verificationGasLimit) ‖ uint128(postOpGasLimit) ‖ paymasterData`, or
/// empty if there is no paymaster.
pub fn pack_paymaster_data(
    paymaster: Option<Address>,
    verification_gas_limit: Option<U128>,
    post_op_gas_limit: Option<U128>,
    paymaster_data: Option<&Bytes>,
) -> Bytes {
    let Some(paymaster) = paymaster else { return Bytes::new() };

    let mut packed = paymaster.to_vec();
    packed.extend_from_slice(&verification_gas_limit.unwrap_or_default().to_be_bytes::<16>());
    packed.extend_from_slice(&post_op_gas_limit.unwrap_or_default().to_be_bytes::<16>());
    packed.extend_from_slice(paymaster_data.map(|d| d.as_ref()).unwrap_or_default());
    packed.into()
}

/// A user operation before gas negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedUserOperation {
    /// The Safe executing the operation.
    pub sender: Address,
    /// EntryPoint nonce, read fresh for every build.
    pub nonce: U256,
    /// Proxy factory, present iff the Safe is not deployed yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<Address>,
    /// `createProxyWithNonce` call data, present iff `factory` is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_data: Option<Bytes>,
    /// `executeUserOp` call data, suffixed with the operation identifier.
    pub call_data: Bytes,
    /// Max priority fee per gas.
    pub max_priority_fee_per_gas: U128,
    /// Max fee per gas.
    pub max_fee_per_gas: U128,
}

impl UnsignedUserOperation {
    /// Completes the operation with negotiated gas limits and paymaster fields.
    pub fn with_gas(self, gas: PaymasterData) -> UserOperation {
        UserOperation {
            sender: self.sender,
            nonce: self.nonce,
            factory: self.factory,
            factory_data: self.factory_data,
            call_data: self.call_data,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            max_fee_per_gas: self.max_fee_per_gas,
            verification_gas_limit: gas.verification_gas_limit,
            call_gas_limit: gas.call_gas_limit,
            pre_verification_gas: gas.pre_verification_gas,
            paymaster: gas.paymaster,
            paymaster_verification_gas_limit: gas.paymaster_verification_gas_limit,
            paymaster_post_op_gas_limit: gas.paymaster_post_op_gas_limit,
            paymaster_data: gas.paymaster_data,
            signature: None,
        }
    }

    /// Attaches a stand-in signature, as sent to paymasters and gas estimators.
    pub fn with_stub_signature(&self, signature: Bytes) -> StubSignedOperation {
        StubSignedOperation { op: self.clone(), signature }
    }
}

/// An [`UnsignedUserOperation`] carrying a stand-in signature.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StubSignedOperation {
    #[serde(flatten)]
    op: UnsignedUserOperation,
    signature: Bytes,
}

/// Gas limits, and optionally paymaster fields, negotiated for an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymasterData {
    /// The paymaster sponsoring the operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    /// Paymaster specific data, usually its signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<Bytes>,
    /// Gas for the paymaster validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U128>,
    /// Gas for the paymaster `postOp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U128>,
    /// Gas for the account validation.
    pub verification_gas_limit: U128,
    /// Gas for the execution.
    pub call_gas_limit: U128,
    /// Gas paid to the bundler for calldata and overhead.
    pub pre_verification_gas: U256,
}

impl PaymasterData {
    /// Static limits used when no estimate is available.
    pub fn fallback(deployed: bool) -> Self {
        Self {
            verification_gas_limit: U128::from(if deployed { 100_000 } else { 500_000 }),
            call_gas_limit: U128::from(100_000),
            pre_verification_gas: U256::from(100_000),
            ..Default::default()
        }
    }
}

/// A complete ERC-4337 v0.7 user operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    /// The Safe executing the operation.
    pub sender: Address,
    /// EntryPoint nonce.
    pub nonce: U256,
    /// Proxy factory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<Address>,
    /// Proxy factory call data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_data: Option<Bytes>,
    /// `executeUserOp` call data.
    pub call_data: Bytes,
    /// Max priority fee per gas.
    pub max_priority_fee_per_gas: U128,
    /// Max fee per gas.
    pub max_fee_per_gas: U128,
    /// Gas for the account validation.
    pub verification_gas_limit: U128,
    /// Gas for the execution.
    pub call_gas_limit: U128,
    /// Gas paid to the bundler for calldata and overhead.
    pub pre_verification_gas: U256,
    /// The paymaster sponsoring the operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    /// Gas for the paymaster validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U128>,
    /// Gas for the paymaster `postOp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U128>,
    /// Paymaster specific data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<Bytes>,
    /// `uint48 validAfter ‖ uint48 validUntil ‖ ecdsa signature`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Bytes>,
}

impl UserOperation {
    /// Sets the packed signature.
    pub fn with_signature(mut self, signature: Bytes) -> Self {
        self.signature = Some(signature);
        self
    }

    /// `factory ‖ factoryData`
    pub fn init_code(&self) -> Bytes {
        pack_init_code(self.factory, self.factory_data.as_ref())
    }

    /// `verificationGasLimit ‖ callGasLimit`
    pub fn account_gas_limits(&self) -> B256 {
        pack_gas(self.verification_gas_limit, self.call_gas_limit)
    }

    /// `maxPriorityFeePerGas ‖ maxFeePerGas`
    pub fn gas_fees(&self) -> B256 {
        pack_gas(self.max_priority_fee_per_gas, self.max_fee_per_gas)
    }

    /// `paymaster ‖ verificationGasLimit ‖ postOpGasLimit ‖ paymasterData`
    pub fn paymaster_and_data(&self) -> Bytes {
        pack_paymaster_data(
            self.paymaster,
            self.paymaster_verification_gas_limit,
            self.paymaster_post_op_gas_limit,
            self.paymaster_data.as_ref(),
        )
    }

    /// Upper bound of the fees paid for execution: `callGasLimit * (maxFee + maxPriorityFee)`.
    pub fn max_execution_cost(&self) -> U256 {
        U256::from(self.call_gas_limit)
            * (U256::from(self.max_fee_per_gas) + U256::from(self.max_priority_fee_per_gas))
    }

    /// Packs the operation the way the EntryPoint receives it.
    pub fn pack(&self) -> PackedUserOperation {
        PackedUserOperation {
            sender: self.sender,
            nonce: self.nonce,
            initCode: self.init_code(),
            callData: self.call_data.clone(),
            accountGasLimits: self.account_gas_limits(),
            preVerificationGas: self.pre_verification_gas,
            gasFees: self.gas_fees(),
            paymasterAndData: self.paymaster_and_data(),
            signature: self.signature.clone().unwrap_or_default(),
        }
    }

    /// Validity bounds encoded in the first 12 bytes of the signature, zero if absent.
    pub fn validity(&self) -> (U48, U48) {
        match self.signature.as_deref() {
            Some(sig) if sig.len() >= 12 => {
                (U48::from_be_slice(&sig[..6]), U48::from_be_slice(&sig[6..12]))
            }
            _ => (U48::ZERO, U48::ZERO),
        }
    }

    /// The `SafeOp` struct signed by the owner.
    pub fn safe_op(&self, entry_point: Address) -> SafeOp {
        let (valid_after, valid_until) = self.validity();
        SafeOp {
            safe: self.sender,
            nonce: self.nonce,
            initCode: self.init_code(),
            callData: self.call_data.clone(),
            verificationGasLimit: self.verification_gas_limit.to(),
            callGasLimit: self.call_gas_limit.to(),
            preVerificationGas: self.pre_verification_gas,
            maxPriorityFeePerGas: self.max_priority_fee_per_gas.to(),
            maxFeePerGas: self.max_fee_per_gas.to(),
            paymasterAndData: self.paymaster_and_data(),
            validAfter: valid_after,
            validUntil: valid_until,
            entryPoint: entry_point,
        }
    }

    /// Computes the digest `Safe4337Module.getOperationHash` returns, without a chain read.
    ///
    /// The domain is `{chainId, verifyingContract: module}`.
    pub fn safe_op_hash(&self, chain_id: ChainId, module: Address, entry_point: Address) -> B256 {
        let domain = eip712_domain! {
            chain_id: chain_id,
            verifying_contract: module,
        };
        self.safe_op(entry_point).eip712_signing_hash(&domain)
    }
}

/// Fee suggestion for a single speed tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPrice {
    /// Max fee per gas.
    pub max_fee_per_gas: U128,
    /// Max priority fee per gas.
    pub max_priority_fee_per_gas: U128,
}

/// Answer of `pimlico_getUserOperationGasPrice`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPrices {
    /// Slow tier.
    pub slow: GasPrice,
    /// Standard tier.
    pub standard: GasPrice,
    /// Fast tier.
    pub fast: GasPrice,
}

/// The transaction an operation was included in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionReceipt {
    /// Hash of the bundle transaction.
    pub transaction_hash: B256,
    /// Block hash.
    pub block_hash: B256,
    /// Block number.
    pub block_number: U256,
    /// Gas used by the bundle transaction.
    #[serde(default)]
    pub gas_used: Option<U256>,
    /// `0x1` on success.
    #[serde(default)]
    pub status: Option<U256>,
}

/// Answer of `eth_getUserOperationReceipt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    /// The operation hash.
    pub user_op_hash: B256,
    /// The EntryPoint that executed the operation.
    pub entry_point: Address,
    /// The Safe.
    pub sender: Address,
    /// The operation nonce.
    pub nonce: U256,
    /// The paymaster, if any.
    #[serde(default)]
    pub paymaster: Option<Address>,
    /// Gas used by the operation.
    pub actual_gas_used: U256,
    /// Fees paid for the operation.
    pub actual_gas_cost: U256,
    /// Whether the execution succeeded.
    pub success: bool,
    /// Revert reason, if any.
    #[serde(default)]
    pub reason: Option<String>,
    /// Logs emitted by the operation.
    #[serde(default)]
    pub logs: Vec<Log>,
    /// The bundle transaction.
    pub receipt: InclusionReceipt,
}
