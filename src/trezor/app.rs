use ethers_core::types::{Address, TransactionRequest};
use tracing::{debug, instrument, trace};

use super::{connect::TrezorConnect, types::*};

/// Construction parameters of a [`TrezorSubprovider`]
#[derive(Clone, Debug)]
pub struct TrezorSubproviderConfig<C> {
    /// The trezor-connect client used to reach the device
    pub trezor_connect_client_api: C,
    /// Chain id injected into every signed transaction (EIP-155)
    pub network_id: u64,
}

impl<C> TrezorSubproviderConfig<C> {
    pub fn new(trezor_connect_client_api: C, network_id: u64) -> Self {
        Self { trezor_connect_client_api, network_id }
    }
}

/// A Trezor backed wallet subprovider.
///
/// Forwards account and signing requests to a [`TrezorConnect`] client and turns the
/// device's answers into the values expected by the JSON-RPC layer.
///
/// The key used for signing starts at `m/44'/60'/0'/0/0` and is replaced by the path the
/// device confirms on [`get_accounts`](Self::get_accounts). Retrieving accounts therefore
/// needs `&mut self`, which keeps it from running alongside a signing request on the same
/// instance.
///
/// ```no_run
/// # use ethers_trezor_subprovider::{TrezorConnect, TrezorSubprovider, TrezorSubproviderConfig};
/// # async fn foo<C: TrezorConnect>(client: C) -> Result<(), Box<dyn std::error::Error>> {
/// let mut trezor = TrezorSubprovider::new(TrezorSubproviderConfig::new(client, 1));
/// let accounts = trezor.get_accounts().await?;
/// let signature = trezor.sign_personal_message(b"hello world", accounts[0]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TrezorSubprovider<C> {
    client: C,
    derivation_path: &'static str,
    network_id: u64,
    key_path: String,
}

impl<C: TrezorConnect> TrezorSubprovider<C> {
    pub fn new(config: TrezorSubproviderConfig<C>) -> Self {
        let derivation_path = DEFAULT_DERIVATION_PATH;
        Self {
            client: config.trezor_connect_client_api,
            derivation_path,
            network_id: config.network_id,
            key_path: format!("m/{derivation_path}"),
        }
    }

    pub fn network_id(&self) -> u64 {
        self.network_id
    }

    /// The path signing requests are issued with
    pub fn key_path(&self) -> &str {
        &self.key_path
    }

    /// Overrides the signing key path, e.g. with a path confirmed by an earlier session.
    ///
    /// The path is kept in its string form since that is what the device expects; it only
    /// has to parse as a BIP-32 path.
    pub fn set_key_path(&mut self, path: impl Into<String>) -> Result<(), TrezorError> {
        let path = path.into();
        // validate only, the device takes the string form
        convert_path(&path)?;
        self.key_path = path;
        Ok(())
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Retrieve the account at the default derivation path.
    ///
    /// On success the device's serialized path becomes the key path for subsequent
    /// signing requests. A failed device call yields no accounts instead of an error.
    #[instrument(err, skip(self), fields(path = %self.derivation_path))]
    pub async fn get_accounts(&mut self) -> Result<Vec<Address>, TrezorError> {
        debug!("Dispatching ethereum_get_address");
        let response = self
            .client
            .ethereum_get_address(GetAddressParams { path: format!("m/{}", self.derivation_path) })
            .await;
        trace!("{:?}", &response);

        match response {
            DeviceResponse::Success(payload) => {
                let address = parse_address(&payload.address)?;
                self.key_path = payload.serialized_path;
                Ok(vec![address])
            }
            DeviceResponse::Failure(failure) => {
                debug!(error = %failure.error, "device returned no account");
                Ok(vec![])
            }
        }
    }

    /// Signs a legacy transaction with EIP-155 replay protection for the configured
    /// network, returning the `0x` prefixed RLP of the signed transaction.
    #[instrument(err, skip(self, tx), fields(network_id = self.network_id, path = %self.key_path))]
    pub async fn sign_transaction(&self, tx: &TransactionRequest) -> Result<String, TrezorError> {
        let tx = tx.clone().chain_id(self.network_id);
        let transaction = TrezorTransaction::load(&tx)?;

        debug!("Dispatching ethereum_sign_transaction");
        let payload = self
            .client
            .ethereum_sign_transaction(SignTransactionParams {
                path: self.key_path.clone(),
                transaction,
            })
            .await
            .into_result()?;
        trace!(sighash = ?tx.sighash(), "{:?}", &payload);

        let signature = payload.to_signature()?;
        Ok(format!("0x{}", hex::encode(tx.rlp_signed(&signature))))
    }

    /// Signs a personal message with the account at the key path. The device must sign
    /// with `address`; the returned signature is `0x` followed by r, s and v.
    #[instrument(err, skip(self, message), fields(message = %hex::encode(message.as_ref())))]
    pub async fn sign_personal_message<S: AsRef<[u8]>>(
        &self,
        message: S,
        address: Address,
    ) -> Result<String, TrezorError> {
        debug!("Dispatching ethereum_sign_message");
        let payload = self
            .client
            .ethereum_sign_message(SignMessageParams {
                path: self.key_path.clone(),
                message: hex::encode(message.as_ref()),
                hex: true,
            })
            .await
            .into_result()?;
        trace!("{:?}", &payload);

        let signer = parse_address(&payload.address).ok();
        if signer != Some(address) {
            return Err(TrezorError::AddressMismatch { expected: address, actual: payload.address })
        }

        Ok(format!("0x{}", payload.signature))
    }

    /// Typed data (EIP-712) cannot be signed through this subprovider.
    pub async fn sign_typed_data(
        &self,
        address: Address,
        typed_data: &serde_json::Value,
    ) -> Result<String, TrezorError> {
        Err(TrezorError::UnsupportedOperation(format!(
            "METHOD_NOT_SUPPORTED: signTypedData {address:?} {typed_data}"
        )))
    }
}
