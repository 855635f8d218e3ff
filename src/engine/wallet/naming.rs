// Pulse Wallet Engine — Naming-disabled provider
//
// The target network has no usable naming service, so the provider handed to
// the contract binding only accepts literal addresses. Everything except the
// two naming operations is forwarded untouched to the inner provider.

use super::primitives::Address;
use super::provider::{NameResolver, WalletProvider};
use crate::atoms::error::{ProviderError, WalletError, WalletResult};
use crate::atoms::types::ProviderEvent;
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use tokio::sync::broadcast;

pub struct NoNameProvider<P> {
    inner: P,
}

impl<P: WalletProvider> NoNameProvider<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: WalletProvider> WalletProvider for NoNameProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.inner.request(method, params).await
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.inner.subscribe()
    }
}

#[async_trait]
impl<P: WalletProvider> NameResolver for NoNameProvider<P> {
    async fn resolve_name(&self, name: &str) -> WalletResult<String> {
        debug!("[naming] resolve_name({})", name);
        if !Address::is_valid(name) {
            return Err(WalletError::UnsupportedResolution(name.to_string()));
        }
        Ok(name.to_string())
    }

    async fn lookup_address(&self, address: &Address) -> WalletResult<Option<String>> {
        debug!("[naming] lookup_address({}) skipped", address);
        Ok(None)
    }
}
