use alloy_primitives::{Address, B256, hex};
use serde_json::{Value, json};

use crate::{
    error::{ConnectorError, TransportError},
    provider::{Transport, decode},
    types::{ChainRef, TransportKind},
};

/// Request facade bound to a connected account.
///
/// The wallet on the other side of the transport holds the keys: signing
/// requests travel through the transport and the wallet returns the signature
/// or transaction hash.
#[derive(Clone, Debug)]
pub struct WalletClient {
    transport: Transport,
    account: Address,
    chain: ChainRef,
}

impl WalletClient {
    pub(crate) fn new(transport: Transport, account: Address, chain: ChainRef) -> Self {
        Self { transport, account, chain }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn chain(&self) -> ChainRef {
        self.chain
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Raw RPC passthrough for methods this facade does not wrap.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        self.transport.request(method, params).await
    }

    /// Signs a message with `personal_sign`, returning the signature hex.
    pub async fn sign_message(&self, message: &[u8]) -> Result<String, ConnectorError> {
        let data = hex::encode_prefixed(message);
        let result = self
            .transport
            .request("personal_sign", json!([data, self.account]))
            .await
            .map_err(|err| ConnectorError::from(err).normalize_rejection())?;
        decode(result).map_err(Into::into)
    }

    /// Signs EIP-712 typed data with `eth_signTypedData_v4`.
    pub async fn sign_typed_data(&self, typed_data: &Value) -> Result<String, ConnectorError> {
        let payload = serde_json::to_string(typed_data)
            .map_err(|err| TransportError::new(format!("invalid typed data: {err}")))?;
        let result = self
            .transport
            .request("eth_signTypedData_v4", json!([self.account, payload]))
            .await
            .map_err(|err| ConnectorError::from(err).normalize_rejection())?;
        decode(result).map_err(Into::into)
    }

    /// Submits a transaction with `eth_sendTransaction`. The wallet signs and
    /// broadcasts in one step and returns the transaction hash.
    ///
    /// `from` is filled in with the bound account when absent.
    pub async fn send_transaction(&self, mut tx: Value) -> Result<B256, ConnectorError> {
        if let Value::Object(fields) = &mut tx
            && !fields.contains_key("from")
        {
            fields.insert("from".to_string(), json!(self.account));
        }
        let result = self
            .transport
            .request("eth_sendTransaction", json!([tx]))
            .await
            .map_err(|err| ConnectorError::from(err).normalize_rejection())?;
        let hash: String = decode(result)?;
        hash.parse()
            .map_err(|_| TransportError::new(format!("invalid transaction hash: {hash:?}")).into())
    }
}
