//! Helpers for talking to a trezor-connect style device client
//! [Official Docs](https://github.com/trezor/connect/blob/develop/docs/methods.md)
use serde::{
    de::{self, DeserializeOwned},
    ser::SerializeStruct,
    Deserialize, Deserializer, Serialize, Serializer,
};
use thiserror::Error;

use ethers_core::types::{Address, NameOrAddress, Signature, TransactionRequest, U256};

/// The derivation path used until the device confirms a serialized path
pub const DEFAULT_DERIVATION_PATH: &str = "44'/60'/0'/0/0";

const HARDENED_BIT: u32 = 0x80000000;

#[derive(Error, Debug)]
/// Error when signing through the Trezor subprovider
pub enum TrezorError {
    /// The device reported `success: false`, carrying its error text verbatim
    #[error("{0}")]
    Device(String),
    /// The device signed a message with a different account than requested
    #[error("address mismatch: expected {expected:?}, device signed with {actual}")]
    AddressMismatch { expected: Address, actual: String },
    #[error("{0}")]
    UnsupportedOperation(String),
    #[error(transparent)]
    /// Error when converting from a hex string
    HexError(#[from] hex::FromHexError),
    #[error("signature component `{component}` does not fit, got {len} bytes")]
    SignatureComponentOverflow { component: &'static str, len: usize },
    #[error("device returned an invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid derivation path: {0}")]
    InvalidKeyPath(String),
    #[error("Does not support ENS.")]
    NoENSSupport,
}

/// Converts a `m/...` derivation path into its BIP-32 child indices, hardened indices
/// having the top bit set.
///
/// Also serves as the validator for key paths handed to the subprovider.
pub fn convert_path(path: &str) -> Result<Vec<u32>, TrezorError> {
    let invalid = || TrezorError::InvalidKeyPath(path.to_string());

    let mut elements = path.split('/');
    if elements.next() != Some("m") {
        return Err(invalid())
    }

    elements
        .map(|element| {
            let (index, hardened) = match element.strip_suffix('\'') {
                Some(index) => (index, true),
                None => (element, false),
            };
            let index = index.parse::<u32>().map_err(|_| invalid())?;
            if index & HARDENED_BIT != 0 {
                return Err(invalid())
            }
            Ok(if hardened { index | HARDENED_BIT } else { index })
        })
        .collect()
}

pub(crate) fn parse_address(address: &str) -> Result<Address, TrezorError> {
    address.parse::<Address>().map_err(|_| TrezorError::InvalidAddress(address.to_string()))
}

fn strip_hex_prefix(value: &str) -> &str {
    value.strip_prefix("0x").unwrap_or(value)
}

/// The result of every device call: a success flag with either the payload or the
/// device's error description.
///
/// Serialized as trezor-connect does:
/// `{ "success": true, "payload": { .. } }` or `{ "success": false, "payload": { "error": ".." } }`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceResponse<T> {
    Success(T),
    Failure(DeviceFailure),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFailure {
    pub error: String,
}

impl<T> DeviceResponse<T> {
    /// Builds a failed response with the given error description
    pub fn failure(error: impl Into<String>) -> Self {
        DeviceResponse::Failure(DeviceFailure { error: error.into() })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeviceResponse::Success(_))
    }

    /// Consume the response, turning a device failure into [`TrezorError::Device`]
    pub fn into_result(self) -> Result<T, TrezorError> {
        match self {
            DeviceResponse::Success(payload) => Ok(payload),
            DeviceResponse::Failure(failure) => Err(TrezorError::Device(failure.error)),
        }
    }
}

impl<T: Serialize> Serialize for DeviceResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DeviceResponse", 2)?;
        match self {
            DeviceResponse::Success(payload) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("payload", payload)?;
            }
            DeviceResponse::Failure(failure) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("payload", failure)?;
            }
        }
        state.end()
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for DeviceResponse<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            success: bool,
            payload: serde_json::Value,
        }

        let raw = Raw::deserialize(deserializer)?;
        let response = if raw.success {
            serde_json::from_value(raw.payload).map(DeviceResponse::Success)
        } else {
            serde_json::from_value(raw.payload).map(DeviceResponse::Failure)
        };
        response.map_err(de::Error::custom)
    }
}

/// Parameters of `ethereumGetAddress`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAddressParams {
    pub path: String,
}

/// Parameters of `ethereumSignTransaction`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignTransactionParams {
    pub path: String,
    pub transaction: TrezorTransaction,
}

/// Parameters of `ethereumSignMessage`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignMessageParams {
    pub path: String,
    /// The message, hex encoded without a `0x` prefix when `hex` is set
    pub message: String,
    pub hex: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    pub address: String,
    /// The canonical path the device derived the address with
    pub serialized_path: String,
}

/// Signature components as `0x` prefixed hex strings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignaturePayload {
    pub v: String,
    pub r: String,
    pub s: String,
}

impl TransactionSignaturePayload {
    fn decode_component(
        component: &'static str,
        value: &str,
        max_len: usize,
    ) -> Result<Vec<u8>, TrezorError> {
        // quantities such as v are not zero padded, e.g. `0x135` on chain 137
        let digits = strip_hex_prefix(value);
        let bytes = if digits.len() % 2 == 1 {
            hex::decode(format!("0{digits}"))?
        } else {
            hex::decode(digits)?
        };
        if bytes.len() > max_len {
            return Err(TrezorError::SignatureComponentOverflow { component, len: bytes.len() })
        }
        Ok(bytes)
    }

    /// Decodes the hex components into a [`Signature`]
    pub fn to_signature(&self) -> Result<Signature, TrezorError> {
        let v = Self::decode_component("v", &self.v, 8)?;
        let r = Self::decode_component("r", &self.r, 32)?;
        let s = Self::decode_component("s", &self.s, 32)?;

        Ok(Signature {
            r: U256::from_big_endian(&r),
            s: U256::from_big_endian(&s),
            v: v.iter().fold(0u64, |acc, byte| (acc << 8) | *byte as u64),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSignaturePayload {
    pub address: String,
    /// r || s || v, hex encoded without a `0x` prefix
    pub signature: String,
}

/// Trezor Transaction Struct
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrezorTransaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

impl TrezorTransaction {
    fn to_hex_quantity(value: &U256) -> String {
        format!("{value:#x}")
    }

    pub fn load(tx: &TransactionRequest) -> Result<Self, TrezorError> {
        let to = match &tx.to {
            Some(NameOrAddress::Name(_)) => return Err(TrezorError::NoENSSupport),
            Some(NameOrAddress::Address(value)) => Some(format!("0x{}", hex::encode(value))),
            // Contract Creation
            None => None,
        };

        Ok(Self {
            to,
            value: tx.value.as_ref().map(Self::to_hex_quantity),
            gas_price: tx.gas_price.as_ref().map(Self::to_hex_quantity),
            gas_limit: tx.gas.as_ref().map(Self::to_hex_quantity),
            nonce: tx.nonce.as_ref().map(Self::to_hex_quantity),
            data: tx.data.as_ref().map(|data| format!("0x{}", hex::encode(data))),
            chain_id: tx.chain_id.map(|id| id.as_u64()),
        })
    }
}
