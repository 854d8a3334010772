//! A Trezor signing backend for Ethereum JSON-RPC provider pipelines.
//!
//! The [`TrezorSubprovider`] answers the account and signing requests of a provider engine
//! (`eth_accounts`, `eth_signTransaction`, `eth_sign`, `personal_sign`, `eth_signTypedData`)
//! by forwarding them to a trezor-connect style device client, injected through the
//! [`TrezorConnect`] trait.
//!
//! You can implement the [`WalletSubprovider`] trait to plug other signing backends into
//! the same request routing, see [`rpc::handle_request`].
//!
//! ```no_run
//! # use ethers_trezor_subprovider::{TrezorConnect, TrezorSubprovider, TrezorSubproviderConfig};
//! # use ethers_core::types::TransactionRequest;
//! # async fn foo<C: TrezorConnect>(client: C) -> Result<(), Box<dyn std::error::Error>> {
//! let mut trezor = TrezorSubprovider::new(TrezorSubproviderConfig::new(client, 1));
//!
//! // confirms the signing path on the device
//! let accounts = trezor.get_accounts().await?;
//!
//! let tx = TransactionRequest::new().to(accounts[0]).value(10000).gas(21000).nonce(0);
//! let raw = trezor.sign_transaction(&tx).await?;
//! # Ok(())
//! # }
//! ```
mod trezor;
pub use trezor::{
    app::{TrezorSubprovider, TrezorSubproviderConfig},
    connect::TrezorConnect,
    types::{
        convert_path, AddressPayload, DeviceFailure, DeviceResponse, GetAddressParams,
        MessageSignaturePayload, SignMessageParams, SignTransactionParams,
        TransactionSignaturePayload, TrezorError, TrezorTransaction, DEFAULT_DERIVATION_PATH,
    },
};

pub mod rpc;

use async_trait::async_trait;
use ethers_core::types::{Address, TransactionRequest};
use std::error::Error;

/// Trait for the signing backends of a provider engine
///
/// Each method answers one family of JSON-RPC requests. Retrieving accounts may update
/// the backend's state, so it requires exclusive access.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait WalletSubprovider: std::fmt::Debug + Send + Sync {
    type Error: Error + Send + Sync;

    /// Returns the accounts available for signing (`eth_accounts`)
    async fn get_accounts(&mut self) -> Result<Vec<Address>, Self::Error>;

    /// Signs the transaction, returning the `0x` prefixed raw transaction
    async fn sign_transaction(&self, tx: &TransactionRequest) -> Result<String, Self::Error>;

    /// Signs a personal message with `address` (`eth_sign`, `personal_sign`)
    async fn sign_personal_message<S: Send + Sync + AsRef<[u8]>>(
        &self,
        message: S,
        address: Address,
    ) -> Result<String, Self::Error>;

    /// Signs EIP-712 typed data (`eth_signTypedData`)
    async fn sign_typed_data(
        &self,
        address: Address,
        typed_data: &serde_json::Value,
    ) -> Result<String, Self::Error>;
}
