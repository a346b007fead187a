use crate::pipeline::*;
use alloy::{
    primitives::{Address, U256, address},
    sol_types::SolCall,
};
use mpc_safe::{
    constants::SENTINEL_OWNERS,
    decode::decode_user_operation,
    error::{RequestError, SafeError},
    gas::GasMode,
    types::{EvmMessage, Safe, UserOperation},
};

const RECOVERY: Address = address!("0x7f01d9b227593e033bf8d6fc86e634d27aa85568");

#[tokio::test]
async fn adds_recovery_owner() -> eyre::Result<()> {
    let env = Environment::setup().await;
    let request = env.wallet.add_owner_request(CHAIN_ID, RECOVERY);

    let encoded = env.wallet.request_router(&request, &GasMode::Fallback).await?;
    let EvmMessage::Text(json) = &encoded.evm_message else { panic!("expected an operation") };
    let op: UserOperation = serde_json::from_str(json)?;

    let decoded = decode_user_operation(CHAIN_ID, &op)?;
    assert_eq!(decoded.transactions.len(), 1);
    assert_eq!(decoded.transactions[0].to, env.wallet.address());
    let call = Safe::addOwnerWithThresholdCall::abi_decode(&decoded.transactions[0].data)?;
    assert_eq!(call.owner, RECOVERY);
    assert_eq!(call._threshold, U256::from(1));
    Ok(())
}

#[tokio::test]
async fn removes_owner_after_its_predecessor() -> eyre::Result<()> {
    let env = Environment::setup().await;
    let owner = env.wallet.mpc_address();
    env.node.lock().unwrap().owners = vec![owner, RECOVERY];

    let tx = env.wallet.remove_owner_tx(CHAIN_ID, RECOVERY).await?;
    assert_eq!(tx.to, env.wallet.address());
    let call = Safe::removeOwnerCall::abi_decode(&tx.data)?;
    assert_eq!(call.prevOwner, owner);
    assert_eq!(call.owner, RECOVERY);

    let tx = env.wallet.remove_owner_tx(CHAIN_ID, owner).await?;
    assert_eq!(Safe::removeOwnerCall::abi_decode(&tx.data)?.prevOwner, SENTINEL_OWNERS);

    let err = env.wallet.remove_owner_tx(CHAIN_ID, Address::repeat_byte(1)).await.unwrap_err();
    assert!(matches!(err, SafeError::Request(RequestError::NotAnOwner(_))));
    Ok(())
}

#[tokio::test]
async fn deployment_request_is_an_empty_call() -> eyre::Result<()> {
    let env = Environment::setup().await;
    let request = env.wallet.deployment_request(CHAIN_ID);

    let encoded = env.wallet.request_router(&request, &GasMode::Fallback).await?;
    let EvmMessage::Text(json) = &encoded.evm_message else { panic!("expected an operation") };
    let op: UserOperation = serde_json::from_str(json)?;
    assert!(op.factory.is_some());

    let decoded = decode_user_operation(CHAIN_ID, &op)?;
    assert_eq!(decoded.transactions[0].to, Address::ZERO);
    assert!(decoded.transactions[0].data.is_empty());
    Ok(())
}
