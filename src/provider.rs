//! Alloy provider extensions.

use alloy::{primitives::Address, providers::Provider, transports::TransportResult};

/// Extension trait for [`Provider`] adding account helpers.
pub trait ProviderExt: Provider {
    /// Returns `true` if `address` has code deployed.
    fn is_contract(&self, address: Address) -> impl Future<Output = TransportResult<bool>> + Send {
        async move { Ok(!self.get_code_at(address).await?.is_empty()) }
    }
}

impl<T> ProviderExt for T where T: Provider {}
