use crate::pipeline::*;
use alloy::{
    consensus::{SignableTransaction, TxEip1559},
    primitives::{Address, Bytes, TxKind, U128, U256, address, bytes},
    sol_types::SolCall,
};
use mpc_safe::{
    constants::{DUMMY_ECDSA_SIG, PLACEHOLDER_SIG},
    decode::decode_evm_data,
    error::{RequestError, SafeError},
    gas::GasMode,
    signers::MpcSigner,
    types::{
        EvmMessage, MetaTransaction, Safe4337Module, SafeDeployments, SendTransactionParams,
        SignMethod, SignRequest, TransactionParams, UserOperation,
    },
};
use tokio_util::sync::CancellationToken;

fn transfer(from: Address) -> SignRequest {
    SignRequest::send_transaction(
        CHAIN_ID,
        vec![TransactionParams {
            from,
            to: address!("0xbeEf4Dad00000000000000000000000000000000"),
            gas: None,
            value: Some(U256::from(1)),
            data: Some(bytes!("b00b1e")),
        }],
    )
}

fn op_of(message: &EvmMessage) -> UserOperation {
    let EvmMessage::Text(json) = message else { panic!("expected a user operation") };
    serde_json::from_str(json).unwrap()
}

#[tokio::test]
async fn first_operation_deploys_the_safe() -> eyre::Result<()> {
    let env = Environment::setup().await;
    let wallet = &env.wallet;

    let encoded = wallet.request_router(&transfer(wallet.address()), wallet.gas_mode()).await?;
    assert_eq!(encoded.hash_to_sign, OP_HASH);

    let op = op_of(&encoded.evm_message);
    let (setup, salt_nonce) = wallet.account().deployment_params();
    assert_eq!(op.sender, wallet.address());
    assert_eq!(op.nonce, U256::ZERO);
    assert_eq!(op.factory, Some(SafeDeployments::default().proxy_factory));
    assert_eq!(op.factory_data, Some(wallet.suite().factory_data(setup, salt_nonce)));
    assert_eq!(op.max_fee_per_gas, U128::from(0x3575104828u64));
    assert_eq!(op.call_gas_limit, U128::from(0x14a6a));
    assert_eq!(op.paymaster, Some(address!("0x0000000000000039cd5e8aE05257CE51C473ddd1")));
    assert_eq!(op.paymaster_verification_gas_limit, Some(U128::from(0x6c8e)));
    assert_eq!(op.signature, None);

    // the module hashed the operation carrying the placeholder signature
    let hashed = env.node.lock().unwrap().hashed.clone();
    let expected = Safe4337Module::getOperationHashCall {
        userOp: op.clone().with_signature(PLACEHOLDER_SIG).pack(),
    }
    .abi_encode();
    assert_eq!(hashed, [Bytes::from(expected)]);

    let sponsor = env.bundler.lock().unwrap().params("pm_sponsorUserOperation");
    assert_eq!(sponsor.len(), 1);
    assert_eq!(sponsor[0][0]["signature"], PLACEHOLDER_SIG.to_string());
    assert_eq!(sponsor[0][1], serde_json::json!(SafeDeployments::default().entry_point));
    assert_eq!(sponsor[0][2]["sponsorshipPolicyId"], POLICY_ID);

    let decoded = decode_evm_data(&mpc_safe::types::EvmData {
        chain_id: CHAIN_ID,
        evm_message: encoded.evm_message.clone(),
        hash_to_sign: encoded.hash_to_sign,
    })?;
    assert_eq!(decoded.cost_estimate, "0.019522217711724688");
    assert_eq!(
        decoded.transactions,
        [MetaTransaction::call(
            address!("0xbeEf4Dad00000000000000000000000000000000"),
            U256::from(1),
            bytes!("b00b1e"),
        )]
    );
    Ok(())
}

#[tokio::test]
async fn owner_transactions_skip_the_safe() -> eyre::Result<()> {
    let env = Environment::setup().await;
    let wallet = &env.wallet;
    env.node.lock().unwrap().tx_count = 4;

    let encoded = wallet.request_router(&transfer(wallet.mpc_address()), wallet.gas_mode()).await?;
    let expected = TxEip1559 {
        chain_id: CHAIN_ID,
        nonce: 4,
        gas_limit: ESTIMATED_GAS,
        max_fee_per_gas: GAS_PRICE + PRIORITY_FEE,
        max_priority_fee_per_gas: PRIORITY_FEE,
        to: TxKind::Call(address!("0xbeEf4Dad00000000000000000000000000000000")),
        value: U256::from(1),
        input: bytes!("b00b1e"),
        access_list: Default::default(),
    };
    assert_eq!(encoded.hash_to_sign, expected.signature_hash());
    let rlp = Bytes::from(expected.encoded_for_signing()).to_string();
    assert!(matches!(&encoded.evm_message, EvmMessage::Text(text) if *text == rlp));

    // neither the bundler nor the 4337 module is involved
    assert!(env.bundler.lock().unwrap().requests.is_empty());
    assert!(env.node.lock().unwrap().hashed.is_empty());

    let decoded = decode_evm_data(&mpc_safe::types::EvmData {
        chain_id: CHAIN_ID,
        evm_message: encoded.evm_message,
        hash_to_sign: encoded.hash_to_sign,
    })?;
    assert_eq!(decoded.cost_estimate, "0.001058");
    assert_eq!(decoded.transactions.len(), 1);

    // a suggested gas limit is kept
    let mut request = transfer(wallet.mpc_address());
    if let SignMethod::SendTransaction(SendTransactionParams::Calls(calls)) = &mut request.method {
        calls[0].gas = Some(U256::from(60_000));
    }
    wallet.request_router(&request, wallet.gas_mode()).await?;
    assert_eq!(env.node.lock().unwrap().count("eth_estimateGas"), 1);

    let mut batch = transfer(wallet.mpc_address());
    if let SignMethod::SendTransaction(SendTransactionParams::Calls(calls)) = &mut batch.method {
        calls.push(calls[0].clone());
    }
    let err = wallet.request_router(&batch, wallet.gas_mode()).await.unwrap_err();
    assert!(matches!(err, SafeError::Request(RequestError::Unsupported(_))));
    Ok(())
}

#[tokio::test]
async fn signed_operation_is_submitted() -> eyre::Result<()> {
    let env = Environment::setup().await;
    let wallet = &env.wallet;
    let encoded = wallet.request_router(&transfer(wallet.address()), wallet.gas_mode()).await?;

    let signature = wallet.sign_transaction(encoded.hash_to_sign).await?;
    assert_eq!(signature.len(), 12 + 65);
    assert_eq!(&signature[..12], PLACEHOLDER_SIG.as_ref());
    let recovered = alloy::primitives::Signature::try_from(&signature[12..])?
        .recover_address_from_prehash(&encoded.hash_to_sign)?;
    assert_eq!(recovered, env.signer.address());

    let op = op_of(&encoded.evm_message);
    let hash = wallet.broadcast_bundler(CHAIN_ID, &signature[12..], op).await?;
    assert_eq!(hash, USER_OP_HASH);

    let sent = env.bundler.lock().unwrap().params("eth_sendUserOperation");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0][0]["signature"], signature.to_string());
    Ok(())
}

#[tokio::test]
async fn receipt_marks_the_safe_deployed() -> eyre::Result<()> {
    let env = Environment::setup().await;
    let wallet = &env.wallet;
    assert!(!wallet.account().deployments().is_cached(CHAIN_ID).await);

    let receipt = wallet.get_op_receipt(CHAIN_ID, USER_OP_HASH).await?.expect("included");
    assert!(receipt.success);
    assert_eq!(receipt.sender, wallet.address());
    assert!(wallet.account().deployments().is_cached(CHAIN_ID).await);

    // deployment is no longer read from the chain
    let reads = env.node.lock().unwrap().count("eth_getCode");
    let op =
        wallet.build_transaction(CHAIN_ID, &[MetaTransaction::default()], &GasMode::Fallback).await?;
    assert_eq!(op.factory, None);
    assert_eq!(op.factory_data, None);
    assert_eq!(env.node.lock().unwrap().count("eth_getCode"), reads);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn waits_for_pending_receipt() -> eyre::Result<()> {
    let env = Environment::setup().await;
    env.bundler.lock().unwrap().pending_polls = 2;

    let receipt =
        env.wallet.await_op_receipt(CHAIN_ID, USER_OP_HASH, CancellationToken::new()).await?;
    assert_eq!(receipt.map(|r| r.user_op_hash), Some(USER_OP_HASH));
    assert_eq!(env.bundler.lock().unwrap().count("eth_getUserOperationReceipt"), 3);

    env.bundler.lock().unwrap().pending_polls = usize::MAX;
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(env.wallet.await_op_receipt(CHAIN_ID, USER_OP_HASH, cancel).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn deployed_safe_uses_current_nonce() -> eyre::Result<()> {
    let env = Environment::setup().await;
    env.deploy();
    env.node.lock().unwrap().nonce = U256::from(7);

    let op = env
        .wallet
        .build_transaction(CHAIN_ID, &[MetaTransaction::default()], &GasMode::Fallback)
        .await?;
    assert_eq!(op.nonce, U256::from(7));
    assert_eq!(op.factory, None);
    assert_eq!(op.verification_gas_limit, U128::from(100_000));
    Ok(())
}

#[tokio::test]
async fn gas_modes() -> eyre::Result<()> {
    let env = Environment::setup().await;
    let calls = [MetaTransaction::default()];

    let op = env.wallet.build_transaction(CHAIN_ID, &calls, &GasMode::SelfFunded).await?;
    assert_eq!(op.paymaster, None);
    assert_eq!(op.call_gas_limit, U128::from(0x186a0));
    assert_eq!(op.verification_gas_limit, U128::from(0x7a120));
    let estimate = env.bundler.lock().unwrap().params("eth_estimateUserOperationGas");
    assert_eq!(estimate[0][0]["signature"], DUMMY_ECDSA_SIG.to_string());

    let op = env.wallet.build_transaction(CHAIN_ID, &calls, &GasMode::Fallback).await?;
    assert_eq!(op.verification_gas_limit, U128::from(500_000));
    assert_eq!(env.bundler.lock().unwrap().count("pm_sponsorUserOperation"), 0);
    Ok(())
}

#[tokio::test]
async fn signer_request_wraps_the_hash() -> eyre::Result<()> {
    let env = Environment::setup().await;
    let wallet = &env.wallet;

    let encoded = wallet.encode_sign_request(&transfer(wallet.address()), wallet.gas_mode()).await?;
    assert_eq!(encoded.evm_data.chain_id, CHAIN_ID);
    assert_eq!(encoded.evm_data.hash_to_sign, OP_HASH);

    let request = &encoded.signer_payload["actions"][0]["params"]["args"]["request"];
    assert_eq!(request["payload"], OP_HASH.to_string());
    assert_eq!(request["path"], env.signer.derivation_path());
    assert_eq!(encoded.signer_payload["signerId"], env.signer.account_id());

    let wire = serde_json::to_value(&encoded)?;
    assert!(wire.get("signerPayload").is_some());
    assert_eq!(wire["evmData"]["hashToSign"], OP_HASH.to_string());
    Ok(())
}

#[tokio::test]
async fn funding_covers_value_and_gas() -> eyre::Result<()> {
    let env = Environment::setup().await;
    let calls = [MetaTransaction::call(Address::repeat_byte(1), U256::from(10), Bytes::new())];

    // nothing to pay needs no balance
    assert!(env.wallet.sufficiently_funded(CHAIN_ID, &[], U256::ZERO).await?);
    assert_eq!(env.node.lock().unwrap().count("eth_getBalance"), 0);

    env.node.lock().unwrap().balance = U256::from(16);
    assert!(env.wallet.sufficiently_funded(CHAIN_ID, &calls, U256::from(5)).await?);
    assert!(!env.wallet.sufficiently_funded(CHAIN_ID, &calls, U256::from(6)).await?);
    Ok(())
}
