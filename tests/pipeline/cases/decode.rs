use crate::pipeline::*;
use alloy::primitives::{Address, U256, address, bytes, hex};
use mpc_safe::{
    decode::{decode_evm_data, decode_tx_data, determine_broadcast_target},
    types::{
        BroadcastTarget, EvmData, EvmMessage, MetaTransaction, OperationType, SafeDeployments,
        UserOperation,
    },
};
use serde_json::{Value, json};

const SINGLE_CALL_DATA: &str = concat!(
    "0x7bb374280000000000000000000000008d99f8b2710e6a3b94d9bf465a98e5273069acbd0000000000000000",
    "0000000000000000000000000000000000000000000000000000000000000000000000000000000000000000",
    "0000000000000000000000800000000000000000000000000000000000000000000000000000000000000000",
    "0000000000000000000000000000000000000000000000000000000000000002B00B00000000000000000000",
    "0000000000000000000000000000000000000000",
);

pub(super) const BATCH_FACTORY_DATA: &str = concat!(
    "0x1688f0b900000000000000000000000029fcb43b46531bca003ddc8fcb67ffe91900c7620000000000000000",
    "0000000000000000000000000000000000000000000000600000000000000000000000000000000000000000",
    "00000000000000000000000000000000000000000000000000000000000000000000000000000000000001e4",
    "b63e800d00000000000000000000000000000000000000000000000000000000000001000000000000000000",
    "0000000000000000000000000000000000000000000000010000000000000000000000002dd68b007b46fbe9",
    "1b9a7c3eda5a7a1063cb5b470000000000000000000000000000000000000000000000000000000000000140",
    "00000000000000000000000075cf11467937ce3f2f357ce24ffc3dbf8fd5c226000000000000000000000000",
    "0000000000000000000000000000000000000000000000000000000000000000000000000000000000000000",
    "0000000000000000000000000000000000000000000000000000000000000000000000000000000000000000",
    "00000000000000000000000000000000000000000000000000000001000000000000000000000000569361e3",
    "8aca310a578a5b3a271496849749490800000000000000000000000000000000000000000000000000000000",
    "000000648d0dc49f000000000000000000000000000000000000000000000000000000000000002000000000",
    "0000000000000000000000000000000000000000000000000000000100000000000000000000000075cf1146",
    "7937ce3f2f357ce24ffc3dbf8fd5c22600000000000000000000000000000000000000000000000000000000",
    "00000000000000000000000000000000000000000000000000000000",
);

const BATCH_CALL_DATA: &str = concat!(
    "0x7bb374280000000000000000000000009641d764fc13c8b624c04430c7356c1c7c8102e20000000000000000",
    "0000000000000000000000000000000000000000000000000000000000000000000000000000000000000000",
    "0000000000000000000000800000000000000000000000000000000000000000000000000000000000000001",
    "00000000000000000000000000000000000000000000000000000000000001a48d80ff0a0000000000000000",
    "0000000000000000000000000000000000000000000000200000000000000000000000000000000000000000",
    "00000000000000000000014c00beef4dad000000000000000000000000000000000000000000000000000000",
    "0000000000000000000000000000000000000000010000000000000000000000000000000000000000000000",
    "000000000000000003b00b1e0099999999999999999999999999999999999999990000000000000000000000",
    "0000000000000000000000000000000000000000000000000000000000000000000000000000000000000000",
    "00000000000000000611112222444400575a9d13b206eaf9d621c8626252ac32f72c11330000000000000000",
    "0000000000000000000000000000000000000000000000000000000000000000000000000000000000000000",
    "0000000000000000000000440d582f130000000000000000000000007f01d9b227593e033bf8d6fc86e634d2",
    "7aa8556800000000000000000000000000000000000000000000000000000000000000010000000000000000",
    "00000000000000000000000000000000000000000000000000000000000000000000000000000000",
);

fn single_op() -> Value {
    json!({
        "sender": "0x4184cabfD63Da66828dE8486FE20DC015D800BbB",
        "nonce": "0xc",
        "callData": SINGLE_CALL_DATA,
        "maxFeePerGas": "0x3575104828",
        "maxPriorityFeePerGas": "0x47868c00",
        "paymaster": "0x0000000000000039cd5e8aE05257CE51C473ddd1",
        "paymasterData": "0x00000066fd3196000000000000ec1da1a540e872a6b82ad0e5622ff24e06f5a928477aa2f3c9655c1a92c2ed7f153b8bcb8e5ad52f734a58d498b60d58bd307f1d2ccbd5115f09773d804cbc0c1b",
        "preVerificationGas": "0xd257",
        "verificationGasLimit": "0x138b1",
        "callGasLimit": "0x14a6a",
        "paymasterVerificationGasLimit": "0x6c8e",
        "paymasterPostOpGasLimit": "0x1",
    })
}

fn batch_op() -> Value {
    json!({
        "sender": "0x575a9D13B206EaF9d621c8626252ac32F72c1133",
        "nonce": "0x0",
        "factory": "0x4e1DCf7AD4e460CfD30791CCC4F9c8a4f820ec67",
        "factoryData": BATCH_FACTORY_DATA,
        "callData": BATCH_CALL_DATA,
        "maxFeePerGas": "0x3fba4b0a48",
        "maxPriorityFeePerGas": "0x47868c00",
        "verificationGasLimit": "0x7a120",
        "callGasLimit": "0x186a0",
        "preVerificationGas": "0x186a0",
    })
}

#[test]
fn decodes_single_call_operation() -> eyre::Result<()> {
    let decoded = decode_tx_data(CHAIN_ID, &Value::String(single_op().to_string()))?;

    assert_eq!(decoded.chain_id, CHAIN_ID);
    assert_eq!(decoded.cost_estimate, "0.019522217711724688");
    assert!(decoded.message.is_none());
    assert_eq!(
        decoded.transactions,
        [MetaTransaction {
            to: address!("0x8d99F8b2710e6A3B94d9bf465A98E5273069aCBd"),
            value: U256::ZERO,
            data: bytes!("b00b"),
            operation: OperationType::Call,
        }]
    );
    Ok(())
}

#[test]
fn decodes_batched_operation() -> eyre::Result<()> {
    let decoded = decode_tx_data(CHAIN_ID, &Value::String(batch_op().to_string()))?;

    assert_eq!(decoded.cost_estimate, "0.0274908419656");
    assert_eq!(
        decoded.transactions,
        [
            MetaTransaction::call(
                address!("0xbeEf4Dad00000000000000000000000000000000"),
                U256::from(1),
                bytes!("b00b1e"),
            ),
            MetaTransaction::call(
                address!("0x9999999999999999999999999999999999999999"),
                U256::ZERO,
                bytes!("111122224444"),
            ),
            MetaTransaction::call(
                address!("0x575a9D13B206EaF9d621c8626252ac32F72c1133"),
                U256::ZERO,
                bytes!(
                    "0d582f130000000000000000000000007f01d9b227593e033bf8d6fc86e634d27aa855680000000000000000000000000000000000000000000000000000000000000001"
                ),
            ),
        ]
    );
    Ok(())
}

#[test]
fn decodes_wire_representation() -> eyre::Result<()> {
    let decoded = decode_tx_data(CHAIN_ID, &Value::String(batch_op().to_string()))?;
    let wire = serde_json::to_value(&decoded)?;

    assert_eq!(wire["chainId"], CHAIN_ID);
    assert_eq!(wire["costEstimate"], "0.0274908419656");
    assert_eq!(wire["transactions"].as_array().map(Vec::len), Some(3));
    assert_eq!(wire["transactions"][0]["operation"], 0);
    assert!(wire.get("message").is_none());
    Ok(())
}

#[test]
fn encoded_requests_decode_by_payload() -> eyre::Result<()> {
    let data = EvmData {
        chain_id: CHAIN_ID,
        evm_message: EvmMessage::Text(single_op().to_string()),
        hash_to_sign: OP_HASH,
    };
    let decoded = decode_evm_data(&data)?;
    assert_eq!(decoded.transactions.len(), 1);

    let message = EvmData { evm_message: EvmMessage::Text("hello".into()), ..data };
    let decoded = decode_evm_data(&message)?;
    assert!(decoded.transactions.is_empty());
    assert!(matches!(decoded.message, Some(EvmMessage::Text(text)) if text == "hello"));
    Ok(())
}

#[test]
fn operations_are_broadcast_to_the_bundler() {
    let target = determine_broadcast_target(CHAIN_ID, &Value::String(batch_op().to_string()));
    let Some(BroadcastTarget::Bundler(op)) = target else {
        panic!("expected a bundler target, got {target:?}");
    };
    assert_eq!(op.sender, address!("0x575a9D13B206EaF9d621c8626252ac32F72c1133"));
    assert_eq!(op.factory, Some(SafeDeployments::default().proxy_factory));
    assert_eq!(op.signature, None);
}

#[test]
fn factory_data_deploys_the_expected_setup() -> eyre::Result<()> {
    let op: UserOperation = serde_json::from_value(batch_op())?;
    let factory_data = op.factory_data.clone().unwrap_or_default();
    assert_eq!(hex::encode_prefixed(&factory_data), BATCH_FACTORY_DATA);
    assert!(op.init_code().starts_with(SafeDeployments::default().proxy_factory.as_slice()));
    assert_ne!(op.sender, Address::ZERO);
    Ok(())
}
