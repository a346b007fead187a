//! An in-process stand-in for the remote signer.
use super::{MpcSigner, SignatureRequest};
use alloy::{
    network::{FullSigner, TxSigner},
    primitives::{Address, B256, Signature},
    signers::local::PrivateKeySigner,
};
use std::{fmt, str::FromStr, sync::Arc};

/// Contract the remote signer is reached through.
const SIGNER_CONTRACT: &str = "v1.signer";

/// Signs with a local key, returning both parities of every signature like a threshold signer
/// does.
#[derive(Clone)]
pub struct LocalMpcSigner {
    signer: Arc<dyn FullSigner<Signature> + Send + Sync>,
    account_id: String,
    path: String,
}

impl fmt::Debug for LocalMpcSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalMpcSigner")
            .field("address", &self.address())
            .field("account_id", &self.account_id)
            .field("path", &self.path)
            .finish()
    }
}

impl LocalMpcSigner {
    /// Wraps a private key signer.
    pub fn new(signer: PrivateKeySigner, account_id: impl Into<String>) -> Self {
        Self { signer: Arc::new(signer), account_id: account_id.into(), path: "ethereum,1".into() }
    }

    /// Load a private key.
    pub fn from_signing_key(key: &str, account_id: impl Into<String>) -> eyre::Result<Self> {
        Ok(Self::new(PrivateKeySigner::from_str(key)?, account_id))
    }

    /// A signer with a fresh random key.
    pub fn random() -> Self {
        Self::new(PrivateKeySigner::random(), "local.testnet")
    }

    /// Sets the derivation path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

#[async_trait::async_trait]
impl MpcSigner for LocalMpcSigner {
    fn address(&self) -> Address {
        TxSigner::address(&self.signer)
    }

    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn derivation_path(&self) -> &str {
        &self.path
    }

    async fn sign_hash(&self, hash: B256) -> eyre::Result<Vec<Signature>> {
        let signature = self.signer.sign_hash(&hash).await?;
        let twin = Signature::new(signature.r(), signature.s(), !signature.v());
        Ok(vec![twin, signature])
    }

    async fn encode_signature_request_tx(
        &self,
        request: &SignatureRequest,
    ) -> eyre::Result<serde_json::Value> {
        Ok(serde_json::json!({
            "signerId": self.account_id,
            "receiverId": SIGNER_CONTRACT,
            "actions": [{
                "type": "FunctionCall",
                "params": {
                    "methodName": "sign",
                    "args": { "request": request },
                    "deposit": "1",
                },
            }],
        }))
    }
}
