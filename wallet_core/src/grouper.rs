//! Partition a wallet's UTXOs by address and find the addresses worth consolidating.

use dustsweep_types::{Amount, Utxo, UtxoError};
use std::collections::{HashMap, HashSet};

/// Fewest dust outputs an address needs before consolidating it does anything.
pub const MIN_DUST_OUTPUTS: usize = 2;

/// All UTXOs of one address, plus the subset at or below the dust threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressGroup {
    pub address: String,
    /// Every output of the address, in the order the daemon listed them.
    pub utxos: Vec<Utxo>,
    /// Outputs with `amount <= threshold`, same order.
    pub dust: Vec<Utxo>,
}

impl AddressGroup {
    pub fn dust_total(&self) -> Amount {
        self.dust.iter().map(|u| u.amount).sum()
    }

    pub fn is_consolidatable(&self) -> bool {
        self.dust.len() >= MIN_DUST_OUTPUTS
    }
}

/// Result of [`group`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grouping {
    pub threshold: Amount,
    /// Groups in order of each address's first appearance.
    groups: Vec<AddressGroup>,
    index: HashMap<String, usize>,
    /// Addresses with at least [`MIN_DUST_OUTPUTS`] dust outputs, in group order.
    pub dust_addresses: Vec<String>,
}

impl Grouping {
    pub fn groups(&self) -> &[AddressGroup] {
        &self.groups
    }

    pub fn get(&self, address: &str) -> Option<&AddressGroup> {
        self.index.get(address).map(|&i| &self.groups[i])
    }

    /// The dust outputs of `address`, or `None` if the address holds no UTXOs.
    pub fn dust_set(&self, address: &str) -> Option<&[Utxo]> {
        self.get(address).map(|g| g.dust.as_slice())
    }

    /// Groups that qualify for consolidation, in `dust_addresses` order.
    pub fn candidates(&self) -> impl Iterator<Item = &AddressGroup> {
        self.groups.iter().filter(|g| g.is_consolidatable())
    }
}

/// Group `utxos` by address and compute each address's dust set.
///
/// Pure and deterministic. Fails on records with missing fields or a repeated
/// outpoint.
pub fn group(utxos: &[Utxo], threshold: Amount) -> Result<Grouping, UtxoError> {
    let mut groups: Vec<AddressGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut seen: HashSet<(&str, u32)> = HashSet::with_capacity(utxos.len());

    for utxo in utxos {
        utxo.validate()?;
        if !seen.insert((utxo.txid.as_str(), utxo.vout)) {
            return Err(UtxoError::DuplicateOutPoint {
                txid: utxo.txid.clone(),
                vout: utxo.vout,
            });
        }

        let slot = *index.entry(utxo.address.clone()).or_insert_with(|| {
            groups.push(AddressGroup {
                address: utxo.address.clone(),
                utxos: Vec::new(),
                dust: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.utxos.push(utxo.clone());
        if utxo.amount <= threshold {
            group.dust.push(utxo.clone());
        }
    }

    let dust_addresses = groups
        .iter()
        .filter(|g| g.is_consolidatable())
        .map(|g| g.address.clone())
        .collect();

    Ok(Grouping {
        threshold,
        groups,
        index,
        dust_addresses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txid(n: u8) -> String {
        format!("{:02x}", n).repeat(32)
    }

    fn utxo(address: &str, n: u8, sat: u64) -> Utxo {
        Utxo::new(address, txid(n), 0, Amount::from_sat(sat))
    }

    fn amounts(utxos: &[Utxo]) -> Vec<u64> {
        utxos.iter().map(|u| u.amount.to_sat()).collect()
    }

    #[test]
    fn single_dust_output_address_is_not_reported() {
        let utxos = vec![
            utxo("A", 1, 1_000),
            utxo("A", 2, 2_000),
            utxo("A", 3, 200_000_000),
            utxo("B", 4, 500),
        ];
        let grouping = group(&utxos, Amount::from_sat(5_000)).unwrap();

        assert_eq!(amounts(grouping.dust_set("A").unwrap()), vec![1_000, 2_000]);
        assert_eq!(amounts(grouping.dust_set("B").unwrap()), vec![500]);
        assert_eq!(grouping.get("A").unwrap().utxos.len(), 3);
        assert_eq!(grouping.dust_addresses, vec!["A".to_string()]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let utxos = vec![utxo("A", 1, 5_000), utxo("A", 2, 5_000), utxo("A", 3, 5_001)];
        let grouping = group(&utxos, Amount::from_sat(5_000)).unwrap();
        assert_eq!(grouping.dust_set("A").unwrap().len(), 2);
        assert_eq!(grouping.get("A").unwrap().dust_total(), Amount::from_sat(10_000));
    }

    #[test]
    fn dust_addresses_follow_first_appearance() {
        let utxos = vec![
            utxo("C", 1, 10),
            utxo("A", 2, 10),
            utxo("C", 3, 10),
            utxo("B", 4, 10),
            utxo("A", 5, 10),
            utxo("B", 6, 10),
        ];
        let grouping = group(&utxos, Amount::from_sat(100)).unwrap();
        assert_eq!(grouping.dust_addresses, vec!["C", "A", "B"]);
        let order: Vec<_> = grouping.candidates().map(|g| g.address.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn empty_list_yields_nothing() {
        let grouping = group(&[], Amount::from_sat(5_500)).unwrap();
        assert!(grouping.groups().is_empty());
        assert!(grouping.dust_addresses.is_empty());
        assert_eq!(grouping.dust_set("A"), None);
    }

    #[test]
    fn duplicate_outpoint_is_malformed() {
        let utxos = vec![utxo("A", 1, 10), utxo("A", 1, 10)];
        assert!(matches!(
            group(&utxos, Amount::from_sat(100)),
            Err(UtxoError::DuplicateOutPoint { vout: 0, .. })
        ));
    }

    #[test]
    fn missing_address_is_malformed() {
        let utxos = vec![utxo("", 1, 10)];
        assert!(matches!(
            group(&utxos, Amount::from_sat(100)),
            Err(UtxoError::MissingAddress { .. })
        ));
    }
}
