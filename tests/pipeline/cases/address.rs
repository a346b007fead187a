use super::decode::BATCH_FACTORY_DATA;
use crate::pipeline::*;
use alloy::primitives::{Address, B256, U256, address, hex, keccak256};
use mpc_safe::{
    account::SafeAccount,
    constants::DEFAULT_SAFE_SALT_NONCE,
    safe::SafeContractSuite,
    signers::MpcSigner,
    types::SafeDeployments,
};

fn suite() -> SafeContractSuite {
    SafeContractSuite::new(node(Shared::default()), SafeDeployments::default())
}

/// `address(keccak256(0xff ‖ deployer ‖ salt ‖ keccak256(initCode))[12:])`
fn create2(deployer: Address, salt: B256, init_code: &[u8]) -> Address {
    let mut preimage = vec![0xff];
    preimage.extend_from_slice(deployer.as_slice());
    preimage.extend_from_slice(salt.as_slice());
    preimage.extend_from_slice(keccak256(init_code).as_slice());
    Address::from_slice(&keccak256(preimage)[12..])
}

#[tokio::test]
async fn address_is_deterministic() -> eyre::Result<()> {
    let owner = owner_signer().address();

    let first = SafeAccount::derive(&suite(), owner, DEFAULT_SAFE_SALT_NONCE).await?;
    let second = SafeAccount::derive(&suite(), owner, DEFAULT_SAFE_SALT_NONCE).await?;
    assert_eq!(first.address(), second.address());
    assert_eq!(first.owner(), owner);

    let deployments = SafeDeployments::default();
    let setup = suite().get_setup(vec![owner]);
    let mut salt = keccak256(&setup).to_vec();
    salt.extend_from_slice(&DEFAULT_SAFE_SALT_NONCE.to_be_bytes::<32>());
    let mut init_code = PROXY_CREATION_CODE.to_vec();
    init_code.extend_from_slice(&[0u8; 12]);
    init_code.extend_from_slice(deployments.singleton.as_slice());

    assert_eq!(first.address(), create2(deployments.proxy_factory, keccak256(salt), &init_code));
    assert_eq!(first.setup(), &setup);
    Ok(())
}

#[tokio::test]
async fn address_depends_on_owner_and_salt() -> eyre::Result<()> {
    let owner = owner_signer().address();
    let base = SafeAccount::derive(&suite(), owner, DEFAULT_SAFE_SALT_NONCE).await?.address();

    let other_salt = SafeAccount::derive(&suite(), owner, U256::ZERO).await?.address();
    let other_owner =
        SafeAccount::derive(&suite(), Address::repeat_byte(1), DEFAULT_SAFE_SALT_NONCE)
            .await?
            .address();

    assert_ne!(base, other_salt);
    assert_ne!(base, other_owner);
    Ok(())
}

#[tokio::test]
async fn creation_code_is_read_once_per_suite() -> eyre::Result<()> {
    let state = Shared::<NodeState>::default();
    let suite = SafeContractSuite::new(node(state.clone()), SafeDeployments::default());

    for salt in 0..3u64 {
        SafeAccount::derive(&suite, Address::repeat_byte(1), U256::from(salt)).await?;
    }
    assert_eq!(state.lock().unwrap().count("eth_call"), 1);
    Ok(())
}

#[test]
fn factory_data_matches_known_deployment() {
    let suite = suite();
    let setup = suite.get_setup(vec![address!("0x569361e38aca310a578a5b3a2714968497494908")]);
    let factory_data = suite.factory_data(setup, U256::ZERO);
    assert_eq!(hex::encode_prefixed(&factory_data), BATCH_FACTORY_DATA);
}
