use crate::pipeline::*;
use alloy::primitives::{Address, B256, Signature, eip191_hash_message};
use mpc_safe::{
    error::{RequestError, SafeError, SignatureError},
    gas::GasMode,
    safe_message::{SafeInfo, decode_safe_message},
    signers::{MpcSigner, select_signature},
    types::{EvmMessage, SignMethod, SignRequest},
};
use semver::Version;

const MESSAGE: &str = "Welcome to Safe!";

fn personal_sign(from: Address) -> SignRequest {
    SignRequest::new(CHAIN_ID, SignMethod::PersonalSign { message: MESSAGE.into(), from })
}

#[tokio::test]
async fn safe_messages_are_bound_to_version() -> eyre::Result<()> {
    let current = Environment::setup().await;
    let legacy = Environment::setup_with_version("1.2.0").await;
    assert_eq!(current.wallet.address(), legacy.wallet.address());

    let request = personal_sign(current.wallet.address());
    let signed = current.wallet.request_router(&request, &GasMode::Fallback).await?;
    let legacy_signed = legacy.wallet.request_router(&request, &GasMode::Fallback).await?;
    assert_ne!(signed.hash_to_sign, legacy_signed.hash_to_sign);

    let info = SafeInfo {
        address: current.wallet.address(),
        chain_id: CHAIN_ID,
        version: Some(Version::parse("1.4.1+L2")?),
    };
    let expected = decode_safe_message(MESSAGE.to_string().into(), &info)?;
    assert_eq!(signed.hash_to_sign, expected.safe_message_hash);
    assert!(matches!(signed.evm_message, EvmMessage::Text(text) if text == MESSAGE));

    // messages never touch the chain or the bundler
    assert!(current.bundler.lock().unwrap().requests.is_empty());
    Ok(())
}

#[tokio::test]
async fn zero_sender_stands_for_the_safe() -> eyre::Result<()> {
    let env = Environment::setup().await;
    let from_safe =
        env.wallet.request_router(&personal_sign(env.wallet.address()), &GasMode::Fallback).await?;
    let from_zero =
        env.wallet.request_router(&personal_sign(Address::ZERO), &GasMode::Fallback).await?;
    assert_eq!(from_safe.hash_to_sign, from_zero.hash_to_sign);
    Ok(())
}

#[tokio::test]
async fn owner_messages_are_plain_eip191() -> eyre::Result<()> {
    let env = Environment::setup().await;
    let request = personal_sign(env.wallet.mpc_address());

    let encoded = env.wallet.request_router(&request, &GasMode::Fallback).await?;
    assert_eq!(encoded.hash_to_sign, eip191_hash_message(MESSAGE));
    Ok(())
}

#[tokio::test]
async fn unexpected_sender_is_rejected() {
    let env = Environment::setup().await;
    let stranger = Address::repeat_byte(0x42);

    let err = env
        .wallet
        .request_router(&personal_sign(stranger), &GasMode::Fallback)
        .await
        .unwrap_err();
    let SafeError::Request(RequestError::UnexpectedFrom { from, safe, owner }) = err else {
        panic!("unexpected error {err}");
    };
    assert_eq!(from, stranger);
    assert_eq!(safe, env.wallet.address());
    assert_eq!(owner, env.wallet.mpc_address());
}

#[tokio::test]
async fn signatures_recover_to_the_owner() -> eyre::Result<()> {
    let env = Environment::setup().await;
    let encoded =
        env.wallet.request_router(&personal_sign(env.wallet.address()), &GasMode::Fallback).await?;

    let candidates = env.signer.sign_hash(encoded.hash_to_sign).await?;
    let signature = select_signature(encoded.hash_to_sign, &candidates, env.wallet.mpc_address())?;
    assert_eq!(signature.recover_address_from_prehash(&encoded.hash_to_sign)?, env.signer.address());

    // a signature over another hash recovers to someone else
    let forged: Vec<Signature> = env.signer.sign_hash(B256::repeat_byte(1)).await?;
    let err = select_signature(encoded.hash_to_sign, &forged, env.wallet.mpc_address()).unwrap_err();
    assert!(matches!(err, SignatureError::NoValidCandidate { candidates: 2, .. }));
    Ok(())
}

#[tokio::test]
async fn typed_data_is_wrapped_for_the_safe() -> eyre::Result<()> {
    let env = Environment::setup().await;
    let request: SignRequest = serde_json::from_value(serde_json::json!({
        "method": "eth_signTypedData_v4",
        "chainId": CHAIN_ID,
        "params": [env.wallet.address(), {
            "types": {
                "EIP712Domain": [{ "name": "chainId", "type": "uint256" }],
                "Mail": [{ "name": "contents", "type": "string" }],
            },
            "domain": { "chainId": "0xaa36a7" },
            "primaryType": "Mail",
            "message": { "contents": "hi" },
        }],
    }))?;

    let as_safe = env.wallet.request_router(&request, &GasMode::Fallback).await?;
    let SignMethod::SignTypedData { typed_data, .. } = &request.method else { unreachable!() };
    assert_ne!(as_safe.hash_to_sign, typed_data.eip712_signing_hash()?);
    assert!(matches!(as_safe.evm_message, EvmMessage::TypedData(_)));

    let mut as_owner = request.clone();
    if let SignMethod::SignTypedData { from, .. } = &mut as_owner.method {
        *from = env.wallet.mpc_address();
    }
    let encoded = env.wallet.request_router(&as_owner, &GasMode::Fallback).await?;
    assert_eq!(encoded.hash_to_sign, typed_data.eip712_signing_hash()?);
    Ok(())
}
