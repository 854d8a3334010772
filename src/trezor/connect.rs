use async_trait::async_trait;
use std::fmt::Debug;

use super::types::{
    AddressPayload, DeviceResponse, GetAddressParams, MessageSignaturePayload, SignMessageParams,
    SignTransactionParams, TransactionSignaturePayload,
};

/// The device-client capability the subprovider signs through.
///
/// Mirrors the three trezor-connect calls it needs. Every call resolves once the user has
/// interacted with the device, and reports failures (rejection on the device, transport
/// errors, timeouts) as [`DeviceResponse::Failure`] rather than through a separate error
/// channel.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait TrezorConnect: Debug + Send + Sync {
    /// `ethereumGetAddress`
    async fn ethereum_get_address(
        &self,
        params: GetAddressParams,
    ) -> DeviceResponse<AddressPayload>;

    /// `ethereumSignTransaction`
    async fn ethereum_sign_transaction(
        &self,
        params: SignTransactionParams,
    ) -> DeviceResponse<TransactionSignaturePayload>;

    /// `ethereumSignMessage`
    async fn ethereum_sign_message(
        &self,
        params: SignMessageParams,
    ) -> DeviceResponse<MessageSignaturePayload>;
}
