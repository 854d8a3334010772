pub mod app;
pub mod connect;
pub mod types;

use crate::WalletSubprovider;
use app::TrezorSubprovider;
use async_trait::async_trait;
use connect::TrezorConnect;
use ethers_core::types::{Address, TransactionRequest};
use types::TrezorError;

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<C: TrezorConnect> WalletSubprovider for TrezorSubprovider<C> {
    type Error = TrezorError;

    async fn get_accounts(&mut self) -> Result<Vec<Address>, Self::Error> {
        TrezorSubprovider::get_accounts(self).await
    }

    async fn sign_transaction(&self, tx: &TransactionRequest) -> Result<String, Self::Error> {
        TrezorSubprovider::sign_transaction(self, tx).await
    }

    async fn sign_personal_message<S: Send + Sync + AsRef<[u8]>>(
        &self,
        message: S,
        address: Address,
    ) -> Result<String, Self::Error> {
        TrezorSubprovider::sign_personal_message(self, message, address).await
    }

    async fn sign_typed_data(
        &self,
        address: Address,
        typed_data: &serde_json::Value,
    ) -> Result<String, Self::Error> {
        TrezorSubprovider::sign_typed_data(self, address, typed_data).await
    }
}
