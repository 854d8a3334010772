#![allow(dead_code)]
use async_trait::async_trait;
use ethers_trezor_subprovider::{
    AddressPayload, DeviceResponse, GetAddressParams, MessageSignaturePayload, SignMessageParams,
    SignTransactionParams, TransactionSignaturePayload, TrezorConnect,
};
use serde_json::{json, Value};
use std::sync::Mutex;
use tracing::metadata::LevelFilter;

pub const ADDRESS: &str = "0x73d0385F4d8E00C5e6504C6030F47BF6212736A8";
pub const SERIALIZED_PATH: &str = "m/44'/60'/0'/0/0";

// EIP-155 example transaction, see https://eips.ethereum.org/EIPS/eip-155
pub const V: &str = "0x25";
pub const R: &str = "0x28ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276";
pub const S: &str = "0x67cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83";
pub const SIGNED_TX: &str = "0xf86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83";

pub const MESSAGE_SIGNATURE: &str = "a4a2f3c1d2c50d3e7d3a6b2a8f0fc4e3a0cbb68c1a57d8bb0ff8c3e3f1b5a8c97b0e2a2c5c3bd3c0a3ef2e6c4ea5e1c4c7d7d4c9b0a7f2b8c1d5f6e3a2b1c0d91b";

pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    GetAddress(GetAddressParams),
    SignTransaction(SignTransactionParams),
    SignMessage(SignMessageParams),
}

/// A device which answers every call with a fixed response and records the calls made
#[derive(Debug)]
pub struct MockTrezorConnect {
    address: DeviceResponse<AddressPayload>,
    transaction: DeviceResponse<TransactionSignaturePayload>,
    message: DeviceResponse<MessageSignaturePayload>,
    calls: Mutex<Vec<Call>>,
}

impl Default for MockTrezorConnect {
    fn default() -> Self {
        Self {
            address: DeviceResponse::failure("Device not connected"),
            transaction: DeviceResponse::failure("Device not connected"),
            message: DeviceResponse::failure("Device not connected"),
            calls: Mutex::new(vec![]),
        }
    }
}

/// Parses a response the way a trezor-connect client hands it over
pub fn response<T: serde::de::DeserializeOwned>(value: Value) -> DeviceResponse<T> {
    serde_json::from_value(value).unwrap()
}

impl MockTrezorConnect {
    /// A device that has everything configured to succeed
    pub fn unlocked() -> Self {
        Self::default()
            .with_address(response(json!({
                "success": true,
                "payload": { "address": ADDRESS, "serializedPath": SERIALIZED_PATH }
            })))
            .with_transaction(response(json!({
                "success": true,
                "payload": { "v": V, "r": R, "s": S }
            })))
            .with_message(response(json!({
                "success": true,
                "payload": { "address": ADDRESS, "signature": MESSAGE_SIGNATURE }
            })))
    }

    pub fn with_address(mut self, response: DeviceResponse<AddressPayload>) -> Self {
        self.address = response;
        self
    }

    pub fn with_transaction(
        mut self,
        response: DeviceResponse<TransactionSignaturePayload>,
    ) -> Self {
        self.transaction = response;
        self
    }

    pub fn with_message(mut self, response: DeviceResponse<MessageSignaturePayload>) -> Self {
        self.message = response;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TrezorConnect for MockTrezorConnect {
    async fn ethereum_get_address(
        &self,
        params: GetAddressParams,
    ) -> DeviceResponse<AddressPayload> {
        self.record(Call::GetAddress(params));
        self.address.clone()
    }

    async fn ethereum_sign_transaction(
        &self,
        params: SignTransactionParams,
    ) -> DeviceResponse<TransactionSignaturePayload> {
        self.record(Call::SignTransaction(params));
        self.transaction.clone()
    }

    async fn ethereum_sign_message(
        &self,
        params: SignMessageParams,
    ) -> DeviceResponse<MessageSignaturePayload> {
        self.record(Call::SignMessage(params));
        self.message.clone()
    }
}
