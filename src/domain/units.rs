//! Fixed-point conversion from on-chain integers to `Decimal`.
//!
//! Equity and price-per-share come back as `uint256` scaled by 1e18, the
//! core USDC balance as `uint64` scaled by 1e8. Values are converted
//! exactly; if a raw value is too large for `Decimal`, low-order digits
//! are dropped until it fits.

use alloy::primitives::U256;
use rust_decimal::Decimal;

/// Scale of equity and price-per-share values.
pub const WAD_DECIMALS: u32 = 18;

/// Scale of core spot balances.
pub const CORE_BALANCE_DECIMALS: u32 = 8;

/// Convert `raw / 10^decimals` to a `Decimal`.
///
/// Returns `None` only when the integer part alone does not fit.
pub fn scaled_to_decimal(raw: U256, decimals: u32) -> Option<Decimal> {
  let ten = U256::from(10u8);
  let mut mantissa = raw;
  let mut scale = decimals;

  loop {
    let value = u128::try_from(mantissa)
      .ok()
      .and_then(|v| i128::try_from(v).ok());
    if let Some(value) = value {
      if let Ok(decimal) = Decimal::try_from_i128_with_scale(value, scale) {
        return Some(decimal.normalize());
      }
    }
    if scale == 0 {
      return None;
    }
    mantissa /= ten;
    scale -= 1;
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;

  #[test]
  fn test_wad_conversion() {
    let raw = U256::from(1_234_560_000_000_000_000_000u128);
    assert_eq!(scaled_to_decimal(raw, WAD_DECIMALS), Some(dec!(1234.56)));

    let pps = U256::from(1_050_000_000_000_000_000u128);
    assert_eq!(scaled_to_decimal(pps, WAD_DECIMALS), Some(dec!(1.05)));
  }

  #[test]
  fn test_core_balance_conversion() {
    let raw = U256::from(100_050_000_000u64);
    assert_eq!(scaled_to_decimal(raw, CORE_BALANCE_DECIMALS), Some(dec!(1000.5)));
  }

  #[test]
  fn test_zero() {
    assert_eq!(scaled_to_decimal(U256::ZERO, WAD_DECIMALS), Some(Decimal::ZERO));
  }

  #[test]
  fn test_large_value_loses_precision_not_magnitude() {
    // 10^12 USD at 1e18 scale exceeds Decimal's 96-bit mantissa.
    let raw = U256::from(10u8).pow(U256::from(30u8)) + U256::from(7u8);
    let value = scaled_to_decimal(raw, WAD_DECIMALS).unwrap();
    assert_eq!(value.trunc(), dec!(1000000000000));
  }

  #[test]
  fn test_out_of_range() {
    assert_eq!(scaled_to_decimal(U256::MAX, 0), None);
  }
}
