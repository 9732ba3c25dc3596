//! Cycle Report - Operator Summary Formatting
//!
//! Turns one cycle's outcomes into a single Telegram HTML message: a
//! timestamp header, an overall status line, then one block per target.
//! Pure formatting, no I/O.
//!
//! The message never exceeds Telegram's 4096-unit limit: error texts are
//! cut to `MAX_ERROR_CHARS` and blocks that no longer fit are replaced by
//! a single "not shown" line. The status line always counts every target.

use std::fmt::Write as _;

use rust_decimal::Decimal;

use super::target::RebalanceOutcome;

/// Telegram `sendMessage` text limit, in UTF-16 code units.
pub const MAX_MESSAGE_LEN: usize = 4096;
/// Error texts longer than this are cut and suffixed with `…`.
pub const MAX_ERROR_CHARS: usize = 300;
/// Room kept for the trailing "not shown" line.
const OMISSION_RESERVE: usize = 64;

/// Overall result of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
  AllSucceeded,
  Mixed,
  AllFailed,
}

/// Success/failure counts for a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
  pub succeeded: usize,
  pub failed: usize,
}

impl CycleSummary {
  pub fn from_outcomes(outcomes: &[RebalanceOutcome]) -> Self {
    let succeeded = outcomes.iter().filter(|o| o.success).count();
    Self {
      succeeded,
      failed: outcomes.len() - succeeded,
    }
  }

  pub fn total(&self) -> usize {
    self.succeeded + self.failed
  }

  /// An empty cycle counts as failed: nothing was rebalanced.
  pub fn status(&self) -> CycleStatus {
    match (self.succeeded, self.failed) {
      (s, 0) if s > 0 => CycleStatus::AllSucceeded,
      (0, _) => CycleStatus::AllFailed,
      _ => CycleStatus::Mixed,
    }
  }

  /// Human-readable status line, without markup.
  pub fn status_line(&self) -> String {
    match self.status() {
      CycleStatus::AllSucceeded => {
        format!("all succeeded ({}/{})", self.succeeded, self.total())
      }
      CycleStatus::Mixed => format!(
        "mixed results: {} succeeded, {} failed",
        self.succeeded, self.failed
      ),
      CycleStatus::AllFailed => format!("all failed (0/{})", self.total()),
    }
  }
}

/// Format the full report for `outcomes` under the `label` timestamp.
pub fn format_report(outcomes: &[RebalanceOutcome], label: &str) -> String {
  let summary = CycleSummary::from_outcomes(outcomes);
  let icon = match summary.status() {
    CycleStatus::AllSucceeded => "✅",
    CycleStatus::Mixed => "⚠️",
    CycleStatus::AllFailed => "❌",
  };

  let mut out = String::new();
  let _ = writeln!(out, "🔄 <b>Rebalance report</b>");
  let _ = writeln!(out, "🕐 {}", escape_html(label));
  let _ = writeln!(out, "{icon} <b>Status:</b> {}", summary.status_line());

  for (i, outcome) in outcomes.iter().enumerate() {
    let mut block = String::from("\n");
    write_block(&mut block, outcome);

    let remaining = outcomes.len() - i;
    let budget = if remaining == 1 {
      MAX_MESSAGE_LEN
    } else {
      MAX_MESSAGE_LEN - OMISSION_RESERVE
    };
    if utf16_len(&out) + utf16_len(&block) > budget {
      let _ = writeln!(out, "\n… {remaining} more target(s) not shown");
      break;
    }
    out.push_str(&block);
  }

  out
}

/// Length as Telegram counts it.
pub fn utf16_len(text: &str) -> usize {
  text.encode_utf16().count()
}

fn truncate_chars(text: &str, max: usize) -> String {
  match text.char_indices().nth(max) {
    Some((cut, _)) => format!("{}…", &text[..cut]),
    None => text.to_string(),
  }
}

fn write_block(out: &mut String, outcome: &RebalanceOutcome) {
  let icon = if outcome.success { "✅" } else { "❌" };
  let _ = writeln!(out, "{icon} <b>{}</b>", escape_html(&outcome.name));
  let _ = writeln!(out, "Handler: <code>{:#x}</code>", outcome.handler);

  if let Some(tx_hash) = &outcome.tx_hash {
    let _ = writeln!(out, "📊 Tx: <code>{}</code>", escape_html(tx_hash));
  }
  if let Some(gas_used) = outcome.gas_used {
    let _ = writeln!(out, "⛽ Gas used: {}", group_thousands(&gas_used.to_string()));
  }
  if let Some(block) = outcome.block_number {
    let _ = writeln!(out, "🔢 Block: {}", group_thousands(&block.to_string()));
  }
  if let Some(equity) = outcome.equity_usd {
    let _ = writeln!(out, "💰 Equity: ${}", format_amount(equity));
  }
  if let Some(usdc) = outcome.usdc_balance {
    let _ = writeln!(out, "💵 USDC: {}", format_amount(usdc));
  }
  if let Some(pps) = outcome.price_per_share {
    let _ = writeln!(out, "📈 PPS: {pps}");
  }
  if let Some(error) = &outcome.error {
    let error = truncate_chars(error, MAX_ERROR_CHARS);
    let _ = writeln!(out, "🚫 Error: {}", escape_html(&error));
  }
}

/// Two decimal places with thousands separators: `1234.5` → `1,234.50`.
pub fn format_amount(value: Decimal) -> String {
  let rounded = format!("{:.2}", value.round_dp(2));
  let (sign, digits) = match rounded.strip_prefix('-') {
    Some(rest) => ("-", rest),
    None => ("", rounded.as_str()),
  };
  let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, "00"));
  format!("{sign}{}.{frac_part}", group_thousands(int_part))
}

/// Insert `,` every three digits from the right.
pub fn group_thousands(digits: &str) -> String {
  let len = digits.len();
  let mut out = String::with_capacity(len + len / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (len - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out
}

/// Escape the characters Telegram's HTML parse mode rejects.
pub fn escape_html(text: &str) -> String {
  text
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
}
