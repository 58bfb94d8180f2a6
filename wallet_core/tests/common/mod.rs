#![allow(dead_code)]

use dustsweep_types::{Amount, Utxo};
use dustsweep_wallet_core::{DustCandidate, Notice, Operator, PricedTransaction, SweepError};

pub fn txid(n: u32) -> String {
    format!("{:064x}", n)
}

pub fn utxo(address: &str, n: u32, sat: u64) -> Utxo {
    Utxo::new(address, txid(n), 0, Amount::from_sat(sat))
}

/// An operator that answers from a fixed script and records what it was shown.
pub struct ScriptedOperator {
    /// `None` accepts the profile default.
    pub threshold: Option<Amount>,
    /// `None` picks the first candidate.
    pub address: Option<String>,
    pub confirm_address: bool,
    pub confirm_send: bool,
    pub notices: Vec<Notice>,
    pub offered: Vec<DustCandidate>,
    pub send_prompts: Vec<PricedTransaction>,
}

impl ScriptedOperator {
    pub fn accepting() -> Self {
        Self {
            threshold: None,
            address: None,
            confirm_address: true,
            confirm_send: true,
            notices: Vec::new(),
            offered: Vec::new(),
            send_prompts: Vec::new(),
        }
    }

    pub fn with_threshold(mut self, sat: u64) -> Self {
        self.threshold = Some(Amount::from_sat(sat));
        self
    }

    pub fn choosing(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    pub fn declining_address(mut self) -> Self {
        self.confirm_address = false;
        self
    }

    pub fn declining_send(mut self) -> Self {
        self.confirm_send = false;
        self
    }
}

impl Operator for ScriptedOperator {
    fn dust_threshold(&mut self, default: Amount) -> Result<Amount, SweepError> {
        Ok(self.threshold.unwrap_or(default))
    }

    fn choose_address(&mut self, candidates: &[DustCandidate]) -> Result<String, SweepError> {
        self.offered = candidates.to_vec();
        Ok(self
            .address
            .clone()
            .unwrap_or_else(|| candidates[0].address.clone()))
    }

    fn confirm_address(&mut self, _candidate: &DustCandidate) -> Result<bool, SweepError> {
        Ok(self.confirm_address)
    }

    fn confirm_send(&mut self, priced: &PricedTransaction) -> Result<bool, SweepError> {
        self.send_prompts.push(priced.clone());
        Ok(self.confirm_send)
    }

    fn notify(&mut self, notice: &Notice) {
        self.notices.push(notice.clone());
    }
}
