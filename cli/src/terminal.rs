//! Line-oriented terminal operator.

use dustsweep_types::Amount;
use dustsweep_utils::format_coins;
use dustsweep_wallet_core::{DustCandidate, Notice, Operator, PricedTransaction, SweepError};
use std::io::{self, BufRead, Write};

/// Answers session prompts from a line reader and prints to a writer.
pub struct TerminalOperator<R, W> {
    input: R,
    output: W,
    ticker: String,
}

impl TerminalOperator<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(ticker: impl Into<String>) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), ticker)
    }
}

impl<R: BufRead, W: Write> TerminalOperator<R, W> {
    pub fn new(input: R, output: W, ticker: impl Into<String>) -> Self {
        Self {
            input,
            output,
            ticker: ticker.into(),
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    fn coins(&self, amount: Amount) -> String {
        format_coins(amount, &self.ticker)
    }

    fn ask(&mut self, prompt: &str) -> Result<String, SweepError> {
        write!(self.output, "{prompt} ").map_err(prompt_error)?;
        self.output.flush().map_err(prompt_error)?;
        let mut line = String::new();
        if self.input.read_line(&mut line).map_err(prompt_error)? == 0 {
            return Err(SweepError::Prompt("input closed".into()));
        }
        Ok(line.trim().to_string())
    }

    /// Ask until the answer is `accept` or `reject`, ignoring case.
    fn choose(&mut self, prompt: &str, accept: &str, reject: &str) -> Result<bool, SweepError> {
        let prompt = format!("{prompt} [{accept}/{reject}]:");
        loop {
            let answer = self.ask(&prompt)?;
            if answer.eq_ignore_ascii_case(accept) {
                return Ok(true);
            }
            if answer.eq_ignore_ascii_case(reject) {
                return Ok(false);
            }
            self.say(&format!("Please answer {accept} or {reject}."))?;
        }
    }

    fn say(&mut self, line: &str) -> Result<(), SweepError> {
        writeln!(self.output, "{line}").map_err(prompt_error)
    }
}

fn prompt_error(e: io::Error) -> SweepError {
    SweepError::Prompt(e.to_string())
}

impl<R: BufRead, W: Write> Operator for TerminalOperator<R, W> {
    fn dust_threshold(&mut self, default: Amount) -> Result<Amount, SweepError> {
        let prompt = format!(
            "Enter amount in satoshis to use as dust threshold, or press ENTER to use default ({} satoshis):",
            default.to_sat()
        );
        loop {
            let answer = self.ask(&prompt)?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<u64>() {
                Ok(sat) => return Ok(Amount::from_sat(sat)),
                Err(_) => self.say(&format!("Not a whole number of satoshis: {answer}"))?,
            }
        }
    }

    fn choose_address(&mut self, candidates: &[DustCandidate]) -> Result<String, SweepError> {
        self.say("Select an address")?;
        for (i, c) in candidates.iter().enumerate() {
            let line = format!(
                "  {}) {}  ({} dust UTXOs, {})",
                i + 1,
                c.address,
                c.dust_count,
                self.coins(c.dust_total)
            );
            self.say(&line)?;
        }
        let prompt = format!("Address [1-{}]:", candidates.len());
        loop {
            let answer = self.ask(&prompt)?;
            if let Some(c) = candidates.iter().find(|c| c.address == answer) {
                return Ok(c.address.clone());
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=candidates.len()).contains(&n) => {
                    return Ok(candidates[n - 1].address.clone())
                }
                _ => self.say(&format!("No such choice: {answer}"))?,
            }
        }
    }

    fn confirm_address(&mut self, candidate: &DustCandidate) -> Result<bool, SweepError> {
        let prompt = format!(
            "Selected address: {}? Total Dust UTXOs: {}.",
            candidate.address, candidate.dust_count
        );
        self.choose(&prompt, "Continue", "Cancel")
    }

    fn confirm_send(&mut self, priced: &PricedTransaction) -> Result<bool, SweepError> {
        let prompt = format!(
            "Send {} to {} with fee {}? Total amount: {}",
            self.coins(priced.send_amount),
            priced.destination,
            self.coins(priced.fee()),
            self.coins(priced.total)
        );
        self.choose(&prompt, "Send", "Cancel")
    }

    fn notify(&mut self, notice: &Notice) {
        let line = match notice {
            Notice::WholeCoinsAreNotDust { threshold } => format!(
                "Whole coins are not dust. Value entered was: {}",
                self.coins(*threshold)
            ),
            other => other.to_string(),
        };
        if let Err(e) = self.say(&line) {
            tracing::warn!(%e, "failed to write notice");
        }
    }
}
