use proptest::prelude::*;

use dustsweep_types::{Amount, Utxo};
use dustsweep_wallet_core::{group, select, MIN_DUST_OUTPUTS};

const ADDRESSES: [&str; 4] = ["A", "B", "C", "D"];

/// A wallet listing with unique outpoints over a handful of addresses.
fn wallet() -> impl Strategy<Value = Vec<Utxo>> {
    prop::collection::vec((0usize..ADDRESSES.len(), 1u64..20_000), 0..40).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (addr, sat))| {
                Utxo::new(
                    ADDRESSES[addr],
                    format!("{:064x}", i + 1),
                    0,
                    Amount::from_sat(sat),
                )
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn grouping_is_deterministic(utxos in wallet(), threshold in 0u64..20_000) {
        let threshold = Amount::from_sat(threshold);
        let first = group(&utxos, threshold).unwrap();
        let second = group(&utxos, threshold).unwrap();
        prop_assert_eq!(first.groups(), second.groups());
        prop_assert_eq!(first.dust_addresses, second.dust_addresses);
    }

    /// An address is reported exactly when it holds at least two dust outputs.
    #[test]
    fn reported_addresses_have_enough_dust(utxos in wallet(), threshold in 0u64..20_000) {
        let grouping = group(&utxos, Amount::from_sat(threshold)).unwrap();
        for g in grouping.groups() {
            let reported = grouping.dust_addresses.contains(&g.address);
            prop_assert_eq!(reported, g.dust.len() >= MIN_DUST_OUTPUTS);
            prop_assert!(g.dust.iter().all(|u| u.amount.to_sat() <= threshold));
        }
    }

    /// Every input lands in exactly one group.
    #[test]
    fn grouping_conserves_outputs(utxos in wallet(), threshold in 0u64..20_000) {
        let grouping = group(&utxos, Amount::from_sat(threshold)).unwrap();
        let grouped: usize = grouping.groups().iter().map(|g| g.utxos.len()).sum();
        prop_assert_eq!(grouped, utxos.len());
        let total: Amount = grouping.groups().iter().flat_map(|g| &g.utxos).map(|u| u.amount).sum();
        let expected: Amount = utxos.iter().map(|u| u.amount).sum();
        prop_assert_eq!(total, expected);
    }

    /// Selection never exceeds the cap and its total is the exact input sum.
    #[test]
    fn selection_is_bounded(utxos in wallet(), max_inputs in 0u32..16) {
        let batch = select(&utxos, max_inputs);
        prop_assert_eq!(batch.len(), utxos.len().min(max_inputs as usize));
        let sum: Amount = batch.inputs.iter().map(|u| u.amount).sum();
        prop_assert_eq!(batch.total, sum);
        if let Some(first) = batch.inputs.first() {
            prop_assert_eq!(first, utxos.last().unwrap());
        }
    }
}
