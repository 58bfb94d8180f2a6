//! Bounded input selection from one address's dust set.
//!
//! Inputs are taken from the **end** of the dust set first: the last outputs the
//! daemon listed are consolidated first. When a dust set holds more than
//! `max_inputs` outputs, the earliest-listed ones are left for a later run.

use dustsweep_types::{Amount, OutPoint, Utxo};

/// Inputs chosen for one consolidation transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionBatch {
    /// Selected outputs, in selection order (last-listed first).
    pub inputs: Vec<Utxo>,
    /// Exact sum of the selected amounts.
    pub total: Amount,
}

impl SelectionBatch {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn outpoints(&self) -> Vec<OutPoint> {
        self.inputs.iter().map(Utxo::outpoint).collect()
    }
}

/// Take up to `max_inputs` outputs from the end of `dust_set`.
pub fn select(dust_set: &[Utxo], max_inputs: u32) -> SelectionBatch {
    let inputs: Vec<Utxo> = dust_set
        .iter()
        .rev()
        .take(max_inputs as usize)
        .cloned()
        .collect();
    let total = inputs.iter().map(|u| u.amount).sum();
    SelectionBatch { inputs, total }
}
