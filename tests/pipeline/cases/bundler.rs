use crate::pipeline::*;
use alloy::primitives::{Bytes, U256};
use mpc_safe::{
    error::{BundlerError, SafeError},
    gas::GasMode,
    types::{MetaTransaction, PaymasterData, UnsignedUserOperation},
};

fn op(env: &Environment) -> mpc_safe::types::UserOperation {
    UnsignedUserOperation {
        sender: env.wallet.address(),
        nonce: U256::ZERO,
        factory: None,
        factory_data: None,
        call_data: Bytes::new(),
        max_priority_fee_per_gas: Default::default(),
        max_fee_per_gas: Default::default(),
    }
    .with_gas(PaymasterData::fallback(true))
}

#[tokio::test]
async fn rejected_key_is_not_retried() {
    let env = Environment::setup().await;
    env.bundler.lock().unwrap().unauthorized = true;

    let err = env.wallet.execute_transaction(CHAIN_ID, &op(&env)).await.unwrap_err();
    assert!(matches!(err, SafeError::Bundler(BundlerError::Unauthorized)));
    assert_eq!(err.to_string(), "Unauthorized request. Please check your Pimlico API key.");
    assert_eq!(env.bundler.lock().unwrap().requests.len(), 1);
}

#[tokio::test]
async fn rejected_key_fails_gas_negotiation() {
    let env = Environment::setup().await;
    env.bundler.lock().unwrap().unauthorized = true;

    let err = env
        .wallet
        .build_transaction(CHAIN_ID, &[MetaTransaction::default()], &GasMode::sponsored(None))
        .await
        .unwrap_err();
    assert!(matches!(err, SafeError::Bundler(ref err) if err.is_unauthorized()));
    assert!(!err.to_string().contains("dummyKey"));
    assert_eq!(env.bundler.lock().unwrap().count("pimlico_getUserOperationGasPrice"), 1);
    assert_eq!(env.bundler.lock().unwrap().count("pm_sponsorUserOperation"), 0);
}

#[tokio::test]
async fn unsponsored_requests_carry_no_policy() -> eyre::Result<()> {
    let env = Environment::setup().await;
    env.deploy();

    env.wallet
        .build_transaction(CHAIN_ID, &[MetaTransaction::default()], &GasMode::sponsored(None))
        .await?;
    let sponsor = env.bundler.lock().unwrap().params("pm_sponsorUserOperation");
    assert_eq!(sponsor[0].as_array().map(Vec::len), Some(2));
    assert!(sponsor[0][0].get("factory").is_none());
    Ok(())
}

#[tokio::test]
async fn unknown_chain_is_rejected() {
    let env = Environment::setup().await;
    let err = env.wallet.execute_transaction(1, &op(&env)).await.unwrap_err();
    assert!(matches!(err, SafeError::UnsupportedChain(1)));
    assert!(env.bundler.lock().unwrap().requests.is_empty());
}
