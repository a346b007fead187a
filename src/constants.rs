//! Protocol constants.

use alloy::primitives::{Address, Bytes, FixedBytes, U256, address, bytes, fixed_bytes, uint};
use std::time::Duration;

/// Marker appended to every `executeUserOp` call data.
///
/// This is `"bitte/near-safe"` as UTF-8, right padded to 16 bytes. It tags operations built by
/// this pipeline so they can be attributed on-chain.
pub const USER_OP_IDENTIFIER: FixedBytes<16> = fixed_bytes!("62697474652f6e6561722d7361666500");

/// The default Safe salt nonce: [`USER_OP_IDENTIFIER`] read as a `uint128`.
pub const DEFAULT_SAFE_SALT_NONCE: U256 = uint!(130811896738364114529934864114944206080_U256);

/// Head of the Safe owner linked list.
pub const SENTINEL_OWNERS: Address = address!("0x0000000000000000000000000000000000000001");

/// RPC used to read immutable contract data when no chain specific endpoint is configured.
pub const DEFAULT_SETUP_RPC: &str = "https://ethereum-sepolia-rpc.publicnode.com";

/// Default Safe version assumed for accounts deployed by this crate.
pub const DEFAULT_SAFE_VERSION: &str = "1.4.1+L2";

/// `uint48 validAfter ‖ uint48 validUntil`, both zero. Used whenever an operation is hashed or
/// sponsored before it carries a real signature.
pub const PLACEHOLDER_SIG: Bytes = bytes!("000000000000000000000000");

/// A well formed but invalid ECDSA signature, prefixed with zeroed validity bounds.
///
/// Bundlers simulate validation during `eth_estimateUserOperationGas`; a 65 byte signature keeps
/// the calldata cost and the `ecrecover` path representative.
pub const DUMMY_ECDSA_SIG: Bytes = bytes!(
    "000000000000000000000000ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
);

/// Safe `MultiSend` v1.4.1.
pub const MULTISEND_141: Address = address!("0x38869bf66a61cF6bDB996A6aE40D5853Fd43B526");

/// Safe `MultiSendCallOnly` v1.4.1.
pub const MULTISEND_CALLONLY_141: Address = address!("0x9641d764fc13c8B624c04430C7356C1C7C8102e2");

/// Interval between two `eth_getUserOperationReceipt` polls.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Base URL of the Pimlico API.
pub const PIMLICO_API_URL: &str = "https://api.pimlico.io/v2";

/// Environment variable holding the Pimlico API key.
pub const PIMLICO_KEY_ENV: &str = "PIMLICO_KEY";
