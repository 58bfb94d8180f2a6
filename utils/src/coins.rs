//! Coin formatting for operator-facing text.

use dustsweep_types::Amount;

/// Render `amount` as whole coins with eight decimals and a ticker,
/// e.g. `0.00002364 BURST`.
pub fn format_coins(amount: Amount, ticker: &str) -> String {
    if ticker.is_empty() {
        amount.to_string()
    } else {
        format!("{amount} {ticker}")
    }
}
