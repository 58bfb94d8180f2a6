//! Nullable wallet daemon with deterministic raw transactions and recorded calls.

use async_trait::async_trait;
use dustsweep_rpc::{
    DecodedTransaction, RpcError, RpcMethod, SignedTransaction, UnspentRecord, WalletRpc,
};
use dustsweep_types::{Amount, OutPoint, Utxo};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// One `createrawtransaction` request as the wallet received it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedTransaction {
    pub inputs: Vec<OutPoint>,
    pub address: String,
    pub amount: Amount,
}

/// A scripted wallet daemon for testing.
///
/// Raw and signed transactions are opaque tokens (`raw0000`, `signed0000`, ...)
/// numbered by `createrawtransaction` call. Decoded sizes come from the queue
/// given to [`NullWallet::with_sizes`], falling back to a P2PKH-style estimate.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullWallet {
    unspent: Vec<UnspentRecord>,
    failures: HashMap<RpcMethod, RpcError>,
    call_failures: HashMap<(RpcMethod, usize), RpcError>,
    incomplete_signatures: bool,
    unreadable_outputs: bool,
    output_skew: Amount,
    sizes: Mutex<VecDeque<u64>>,
    calls: Mutex<Vec<RpcMethod>>,
    created: Mutex<Vec<CreatedTransaction>>,
    broadcasts: Mutex<Vec<String>>,
}

impl NullWallet {
    pub fn new() -> Self {
        Self {
            unspent: Vec::new(),
            failures: HashMap::new(),
            call_failures: HashMap::new(),
            incomplete_signatures: false,
            unreadable_outputs: false,
            output_skew: Amount::ZERO,
            sizes: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
        }
    }

    /// Serve these UTXOs from `listunspent`, amounts converted back to coins.
    pub fn with_utxos(mut self, utxos: &[Utxo]) -> Self {
        self.unspent = utxos
            .iter()
            .map(|u| UnspentRecord {
                address: Some(u.address.clone()),
                txid: u.txid.clone(),
                vout: u.vout,
                amount: u.amount.to_coins(),
                confirmations: 10,
            })
            .collect();
        self
    }

    /// Serve these raw records from `listunspent`.
    pub fn with_unspent_records(mut self, records: Vec<UnspentRecord>) -> Self {
        self.unspent = records;
        self
    }

    /// Sizes reported by successive `decoderawtransaction` calls.
    pub fn with_sizes(mut self, sizes: impl IntoIterator<Item = u64>) -> Self {
        self.sizes = Mutex::new(sizes.into_iter().collect());
        self
    }

    /// Make every call to `method` fail with `error`.
    pub fn fail_on(mut self, method: RpcMethod, error: RpcError) -> Self {
        self.failures.insert(method, error);
        self
    }

    /// Make only the `nth` call (0-based) to `method` fail with `error`.
    ///
    /// With two build passes, `nth = 1` targets the final rebuild.
    pub fn fail_on_call(mut self, method: RpcMethod, nth: usize, error: RpcError) -> Self {
        self.call_failures.insert((method, nth), error);
        self
    }

    /// Report `complete: false` from `signrawtransaction`.
    pub fn with_incomplete_signatures(mut self) -> Self {
        self.incomplete_signatures = true;
        self
    }

    /// Decode outputs as paying `skew` more than was requested.
    pub fn with_output_skew(mut self, skew: Amount) -> Self {
        self.output_skew = skew;
        self
    }

    /// Decode outputs without a readable `value`.
    pub fn with_unreadable_outputs(mut self) -> Self {
        self.unreadable_outputs = true;
        self
    }

    /// Every call made, in order.
    pub fn calls(&self) -> Vec<RpcMethod> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<CreatedTransaction> {
        self.created.lock().unwrap().clone()
    }

    /// Signed hex passed to each `sendrawtransaction` call.
    pub fn broadcasts(&self) -> Vec<String> {
        self.broadcasts.lock().unwrap().clone()
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().unwrap().len()
    }

    /// Signed hex of the `n`th created transaction (0-based).
    pub fn signed_hex_for(&self, n: usize) -> String {
        format!("signed{n:04}")
    }

    /// Txid of the `n`th created transaction (0-based).
    pub fn txid_for(&self, n: usize) -> String {
        format!("{:064x}", 0xd057_0000_u64 + n as u64)
    }

    fn record(&self, method: RpcMethod) -> Result<(), RpcError> {
        let mut calls = self.calls.lock().unwrap();
        let nth = calls.iter().filter(|&&m| m == method).count();
        calls.push(method);
        match self
            .failures
            .get(&method)
            .or_else(|| self.call_failures.get(&(method, nth)))
        {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn created_index(hex: &str, prefix: &str) -> Result<usize, RpcError> {
        hex.strip_prefix(prefix)
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| RpcError::Daemon {
                code: -22,
                message: format!("TX decode failed: {hex}"),
            })
    }
}

impl Default for NullWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletRpc for NullWallet {
    async fn list_unspent(&self) -> Result<Vec<UnspentRecord>, RpcError> {
        self.record(RpcMethod::ListUnspent)?;
        Ok(self.unspent.clone())
    }

    async fn create_raw_transaction(
        &self,
        inputs: &[OutPoint],
        address: &str,
        amount: Amount,
    ) -> Result<String, RpcError> {
        self.record(RpcMethod::CreateRawTransaction)?;
        let mut created = self.created.lock().unwrap();
        created.push(CreatedTransaction {
            inputs: inputs.to_vec(),
            address: address.to_string(),
            amount,
        });
        Ok(format!("raw{:04}", created.len() - 1))
    }

    async fn sign_raw_transaction(&self, raw_hex: &str) -> Result<SignedTransaction, RpcError> {
        self.record(RpcMethod::SignRawTransaction)?;
        let n = Self::created_index(raw_hex, "raw")?;
        Ok(SignedTransaction {
            hex: self.signed_hex_for(n),
            complete: !self.incomplete_signatures,
            errors: Vec::new(),
        })
    }

    async fn decode_raw_transaction(
        &self,
        raw_hex: &str,
    ) -> Result<DecodedTransaction, RpcError> {
        self.record(RpcMethod::DecodeRawTransaction)?;
        let n = Self::created_index(raw_hex, "signed")?;
        let tx = self
            .created
            .lock()
            .unwrap()
            .get(n)
            .cloned()
            .ok_or_else(|| RpcError::Daemon {
                code: -22,
                message: format!("unknown transaction {raw_hex}"),
            })?;
        let size = self
            .sizes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(10 + 148 * tx.inputs.len() as u64 + 34);
        let paid = tx.amount + self.output_skew;
        let value = if self.unreadable_outputs {
            json!(null)
        } else {
            json!(paid.to_coins())
        };

        Ok(DecodedTransaction {
            txid: self.txid_for(n),
            size,
            vin: tx
                .inputs
                .iter()
                .map(|i| json!({ "txid": i.txid, "vout": i.vout }))
                .collect(),
            vout: vec![json!({
                "value": value,
                "n": 0,
                "scriptPubKey": { "addresses": [tx.address] }
            })],
        })
    }

    async fn send_raw_transaction(&self, signed_hex: &str) -> Result<String, RpcError> {
        self.record(RpcMethod::SendRawTransaction)?;
        let n = Self::created_index(signed_hex, "signed")?;
        self.broadcasts.lock().unwrap().push(signed_hex.to_string());
        Ok(self.txid_for(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outpoint() -> OutPoint {
        OutPoint {
            txid: "ab".repeat(32),
            vout: 1,
        }
    }

    #[tokio::test]
    async fn build_sign_decode_round() {
        let wallet = NullWallet::new().with_sizes([300]);
        let raw = wallet
            .create_raw_transaction(&[outpoint()], "BAddr", Amount::from_sat(5_000))
            .await
            .unwrap();
        let signed = wallet.sign_raw_transaction(&raw).await.unwrap();
        let decoded = wallet.decode_raw_transaction(&signed.hex).await.unwrap();

        assert!(signed.complete);
        assert_eq!(decoded.size, 300);
        assert_eq!(decoded.output_total(), Some(Amount::from_sat(5_000)));
        assert_eq!(decoded.txid, wallet.txid_for(0));
    }

    #[tokio::test]
    async fn default_size_scales_with_inputs() {
        let wallet = NullWallet::new();
        let raw = wallet
            .create_raw_transaction(&[outpoint(), outpoint()], "BAddr", Amount::from_sat(1))
            .await
            .unwrap();
        let signed = wallet.sign_raw_transaction(&raw).await.unwrap();
        let decoded = wallet.decode_raw_transaction(&signed.hex).await.unwrap();
        assert_eq!(decoded.size, 10 + 148 * 2 + 34);
    }

    #[tokio::test]
    async fn scripted_failure_is_recorded() {
        let wallet = NullWallet::new()
            .fail_on(RpcMethod::ListUnspent, RpcError::Http { status: 401 });
        assert_eq!(
            wallet.list_unspent().await,
            Err(RpcError::Http { status: 401 })
        );
        assert_eq!(wallet.calls(), vec![RpcMethod::ListUnspent]);
    }

    #[tokio::test]
    async fn indexed_failure_hits_only_that_call() {
        let wallet = NullWallet::new().fail_on_call(
            RpcMethod::ListUnspent,
            1,
            RpcError::Transport("refused".into()),
        );
        assert!(wallet.list_unspent().await.is_ok());
        assert_eq!(
            wallet.list_unspent().await,
            Err(RpcError::Transport("refused".into()))
        );
        assert!(wallet.list_unspent().await.is_ok());
        assert_eq!(wallet.calls().len(), 3);
    }

    #[tokio::test]
    async fn unreadable_outputs_have_no_total() {
        let wallet = NullWallet::new().with_unreadable_outputs();
        let raw = wallet
            .create_raw_transaction(&[outpoint()], "BAddr", Amount::from_sat(5_000))
            .await
            .unwrap();
        let signed = wallet.sign_raw_transaction(&raw).await.unwrap();
        let decoded = wallet.decode_raw_transaction(&signed.hex).await.unwrap();
        assert_eq!(decoded.output_total(), None);
    }

    #[tokio::test]
    async fn broadcast_is_recorded() {
        let wallet = NullWallet::new();
        let txid = wallet.send_raw_transaction("signed0003").await.unwrap();
        assert_eq!(txid, wallet.txid_for(3));
        assert_eq!(wallet.broadcasts(), vec!["signed0003".to_string()]);
    }

    #[test]
    fn utxos_are_served_in_coins() {
        let utxo = Utxo::new("BAddr", "cd".repeat(32), 2, Amount::from_sat(5_500));
        let wallet = NullWallet::new().with_utxos(&[utxo.clone()]);
        assert_eq!(wallet.unspent[0].amount, 0.000055);
        assert_eq!(wallet.unspent[0].clone().into_utxo().unwrap(), utxo);
    }
}
