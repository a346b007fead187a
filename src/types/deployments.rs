use alloy::primitives::{Address, address};
use serde::{Deserialize, Serialize};

/// Addresses of the contracts a Safe account is built from.
///
/// All of them are deployed deterministically, so one set is valid on every supported chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeDeployments {
    /// Safe v1.4.1 L2 singleton.
    pub singleton: Address,
    /// Safe v1.4.1 proxy factory.
    pub proxy_factory: Address,
    /// SafeModuleSetup v0.3.0.
    pub module_setup: Address,
    /// Safe4337Module v0.3.0.
    pub m4337: Address,
    /// EntryPoint v0.7.
    pub entry_point: Address,
}

impl Default for SafeDeployments {
    fn default() -> Self {
        Self {
            singleton: address!("0x29fcB43b46531BcA003ddC8FCB67FFE91900C762"),
            proxy_factory: address!("0x4e1DCf7AD4e460CfD30791CCC4F9c8a4f820ec67"),
            module_setup: address!("0x2dd68b007B46fBe91B9A7c3EDa5A7a1063cB5b47"),
            m4337: address!("0x75cf11467937ce3F2f357CE24ffc3DBF8fD5c226"),
            entry_point: address!("0x0000000071727De22E5E9d8BAf0edAc6f37da032"),
        }
    }
}
