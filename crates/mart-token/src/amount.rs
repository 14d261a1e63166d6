//! Fixed-point amounts with 18 decimal places.
//!
//! Distinct types keep a native amount from being passed where a USD price or
//! an exchange rate is expected. Amounts are `u128` base units with 18
//! decimals:
//!
//! - [`Wei`]: native currency (1 ETH = 10^18 wei)
//! - [`UsdAmount`]: stable unit of account
//! - [`Rate`]: ETH per USD, kept as an exact ratio
//!
//! All arithmetic is checked; nothing wraps. Values serialize as decimal
//! strings (`"1.01"`) because JSON numbers cannot carry a full `u128`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenError};

/// Number of decimal places for every fixed-point amount.
pub const DECIMALS: u32 = 18;

/// One whole unit in base units (10^18).
pub const ONE: u128 = 1_000_000_000_000_000_000;

/// Basis points in one whole (100%).
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Computes `floor(a * b / d)` exactly, returning `None` on overflow or when
/// `d` is zero.
///
/// Uses the identity `a*b/d = (a/d)*b + (a%d)*b/d` when the direct product
/// does not fit, so results stay exact for every input whose quotient fits.
#[must_use]
pub const fn mul_div_floor(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    if let Some(product) = a.checked_mul(b) {
        return Some(product / d);
    }
    let Some(whole) = (a / d).checked_mul(b) else {
        return None;
    };
    let Some(rest) = (a % d).checked_mul(b) else {
        return None;
    };
    whole.checked_add(rest / d)
}

fn parse_decimal(s: &str) -> Result<u128> {
    let s = s.trim();
    if s.starts_with('-') {
        return Err(TokenError::invalid_amount("negative values not allowed"));
    }

    let (whole_str, frac_str) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole_str.is_empty() && frac_str.is_empty() {
        return Err(TokenError::invalid_amount(format!("invalid number: {s:?}")));
    }
    if frac_str.len() > DECIMALS as usize {
        return Err(TokenError::invalid_amount("too many decimal places"));
    }
    if !whole_str.chars().all(|c| c.is_ascii_digit()) || !frac_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(TokenError::invalid_amount(format!("invalid number: {s:?}")));
    }

    let whole: u128 = if whole_str.is_empty() {
        0
    } else {
        whole_str
            .parse()
            .map_err(|_| TokenError::invalid_amount(format!("invalid whole part: {s}")))?
    };

    // Pad fractional part to 18 digits
    let padded = format!("{frac_str:0<18}");
    let frac: u128 = padded
        .parse()
        .map_err(|_| TokenError::invalid_amount(format!("invalid fractional part: {s}")))?;

    whole
        .checked_mul(ONE)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| TokenError::invalid_amount("overflow"))
}

fn format_decimal(value: u128) -> String {
    let whole = value / ONE;
    let frac = value % ONE;
    if frac == 0 {
        return whole.to_string();
    }
    let frac_str = format!("{frac:018}");
    format!("{whole}.{}", frac_str.trim_end_matches('0'))
}

/// An amount of native currency in wei (10^-18 ETH).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Wei(u128);

impl Wei {
    /// Zero wei.
    pub const ZERO: Self = Self(0);

    /// Maximum representable amount.
    pub const MAX: Self = Self(u128::MAX);

    /// Create from base units.
    #[must_use]
    pub const fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    /// Create from whole ETH.
    #[must_use]
    pub const fn from_ether(ether: u64) -> Self {
        Self(ether as u128 * ONE)
    }

    /// Amount in base units.
    #[must_use]
    pub const fn as_wei(self) -> u128 {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on underflow.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Saturating subtraction.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Scale by `(10000 + bps) / 10000`, rounding down.
    ///
    /// `with_buffer_bps(100)` adds 1%, the client's default allowance for
    /// price movement between quote and confirmation.
    #[must_use]
    pub const fn with_buffer_bps(self, bps: u32) -> Option<Self> {
        match mul_div_floor(self.0, BPS_DENOMINATOR + bps as u128, BPS_DENOMINATOR) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ETH", format_decimal(self.0))
    }
}

impl FromStr for Wei {
    type Err = TokenError;

    /// Parse a decimal ETH amount (`"1.01"`).
    fn from_str(s: &str) -> Result<Self> {
        parse_decimal(s).map(Self)
    }
}

impl TryFrom<String> for Wei {
    type Error = TokenError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Wei> for String {
    fn from(amount: Wei) -> Self {
        format_decimal(amount.0)
    }
}

/// An amount in the stable unit of account (USD), 18 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UsdAmount(u128);

impl UsdAmount {
    /// Zero dollars.
    pub const ZERO: Self = Self(0);

    /// Create from base units (10^-18 USD).
    #[must_use]
    pub const fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    /// Create from whole dollars.
    #[must_use]
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars as u128 * ONE)
    }

    /// Amount in base units.
    #[must_use]
    pub const fn as_base_units(self) -> u128 {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for UsdAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} USD", format_decimal(self.0))
    }
}

impl FromStr for UsdAmount {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        parse_decimal(s).map(Self)
    }
}

impl TryFrom<String> for UsdAmount {
    type Error = TokenError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<UsdAmount> for String {
    fn from(amount: UsdAmount) -> Self {
        format_decimal(amount.0)
    }
}

/// Exchange rate: ETH per one USD, kept as an exact reduced ratio.
///
/// Decimal rates (`"0.01"`: one dollar costs 0.01 ETH) and inverted feed
/// quotes (ETH at 3000 USD is `1/3000`) are both exact, so conversion rounds
/// once, at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rate {
    num: u128,
    den: u128,
}

const fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Rate {
    /// Zero rate.
    pub const ZERO: Self = Self { num: 0, den: 1 };

    /// `num / den` ETH per USD, reduced. `den` must be non-zero.
    const fn ratio(num: u128, den: u128) -> Self {
        if num == 0 {
            return Self::ZERO;
        }
        let g = gcd(num, den);
        Self {
            num: num / g,
            den: den / g,
        }
    }

    /// Create from wei per whole USD.
    #[must_use]
    pub const fn from_wei_per_usd(wei: u128) -> Self {
        Self::ratio(wei, ONE)
    }

    /// Whether the rate is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.num == 0
    }

    /// Invert a quote given as "USD per one ETH" (how price feeds usually
    /// report the native asset). The inverse is kept exact.
    ///
    /// # Errors
    ///
    /// Returns error if the quote is zero.
    pub fn from_usd_per_native(price: UsdAmount) -> Result<Self> {
        if price.is_zero() {
            return Err(TokenError::invalid_amount("native price cannot be zero"));
        }
        Ok(Self::ratio(ONE, price.0))
    }

    /// Convert a USD amount into wei at this rate, rounding toward zero.
    ///
    /// Returns `None` if the result does not fit.
    #[must_use]
    pub const fn convert(self, usd: UsdAmount) -> Option<Wei> {
        match mul_div_floor(usd.0, self.num, self.den) {
            Some(v) => Some(Wei(v)),
            None => None,
        }
    }

    /// Decimal base units when the rate has a finite 18-digit expansion.
    const fn exact_decimal(self) -> Option<u128> {
        match self.num.checked_mul(ONE) {
            Some(scaled) if scaled % self.den == 0 => Some(scaled / self.den),
            _ => None,
        }
    }
}

fn parse_integer(s: &str) -> Result<u128> {
    let s = s.trim();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(TokenError::invalid_amount(format!("invalid number: {s:?}")));
    }
    s.parse().map_err(|_| TokenError::invalid_amount("overflow"))
}

fn format_rate(rate: Rate) -> String {
    match rate.exact_decimal() {
        Some(units) => format_decimal(units),
        None => format!("{}/{}", rate.num, rate.den),
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ETH/USD", format_rate(*self))
    }
}

impl FromStr for Rate {
    type Err = TokenError;

    /// Parse a decimal (`"0.01"`) or a ratio (`"1/3000"`, `"0.5/1500"`).
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((num, den)) => {
                let (num, den) = if num.contains('.') || den.contains('.') {
                    (parse_decimal(num)?, parse_decimal(den)?)
                } else {
                    (parse_integer(num)?, parse_integer(den)?)
                };
                if den == 0 {
                    return Err(TokenError::invalid_amount("rate denominator cannot be zero"));
                }
                Ok(Self::ratio(num, den))
            }
            None => parse_decimal(s).map(|units| Self::ratio(units, ONE)),
        }
    }
}

impl TryFrom<String> for Rate {
    type Error = TokenError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Rate> for String {
    fn from(rate: Rate) -> Self {
        format_rate(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("1", ONE ; "whole")]
    #[test_case("1.01", 1_010_000_000_000_000_000 ; "fraction")]
    #[test_case(".5", ONE / 2 ; "leading dot")]
    #[test_case("0.000000000000000001", 1 ; "one wei")]
    #[test_case("100.", 100 * ONE ; "trailing dot")]
    fn parses(s: &str, expected: u128) {
        assert_eq!(s.parse::<Wei>().expect("parse").as_wei(), expected);
    }

    #[test_case("-1" ; "negative")]
    #[test_case("abc" ; "garbage")]
    #[test_case("1.2.3" ; "two dots")]
    #[test_case("0.0000000000000000001" ; "too precise")]
    #[test_case("." ; "lone dot")]
    #[test_case("" ; "empty")]
    #[test_case("1e18" ; "exponent")]
    #[test_case("999999999999999999999999" ; "overflow")]
    fn rejects(s: &str) {
        assert!(s.parse::<Wei>().is_err());
    }

    #[test]
    fn display_trims_trailing_zeros() {
        assert_eq!(Wei::from_wei(1_010_000_000_000_000_000).to_string(), "1.01 ETH");
        assert_eq!(Wei::ZERO.to_string(), "0 ETH");
        assert_eq!(UsdAmount::from_dollars(100).to_string(), "100 USD");
    }

    #[test]
    fn serde_uses_decimal_strings() {
        let amount = Wei::from_wei(1_500_000_000_000_000_000);
        let json = serde_json::to_string(&amount).expect("serialize");
        assert_eq!(json, r#""1.5""#);
        let back: Wei = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, amount);
    }

    #[test]
    fn serde_rejects_invalid_string() {
        assert!(serde_json::from_str::<Wei>(r#""-3""#).is_err());
    }

    #[test]
    fn rate_converts_usd_to_wei() {
        // 100 USD at 0.01 ETH per USD = 1 ETH
        let rate: Rate = "0.01".parse().expect("rate");
        let wei = rate.convert(UsdAmount::from_dollars(100)).expect("convert");
        assert_eq!(wei, Wei::from_ether(1));
    }

    #[test]
    fn rate_conversion_rounds_toward_zero() {
        // 1 base unit of USD at a rate of 0.5 ETH/USD is half a wei -> 0
        let rate: Rate = "0.5".parse().expect("rate");
        let wei = rate.convert(UsdAmount::from_base_units(1)).expect("convert");
        assert_eq!(wei, Wei::ZERO);
    }

    #[test]
    fn rate_from_usd_per_native() {
        // ETH at 2000 USD -> 0.0005 ETH per USD
        let rate = Rate::from_usd_per_native(UsdAmount::from_dollars(2000)).expect("rate");
        assert_eq!(rate.convert(UsdAmount::from_dollars(1)), Some(Wei::from_wei(500_000_000_000_000)));
        assert_eq!(rate, "0.0005".parse().expect("rate"));
        assert!(Rate::from_usd_per_native(UsdAmount::ZERO).is_err());
    }

    #[test]
    fn inverted_quote_rounds_once() {
        // ETH at 3000 USD: 100 USD is 1/30 ETH, floored only at conversion.
        let rate = Rate::from_usd_per_native(UsdAmount::from_dollars(3000)).expect("rate");
        let wei = rate.convert(UsdAmount::from_dollars(100)).expect("convert");
        assert_eq!(wei, Wei::from_wei(33_333_333_333_333_333));
        assert_eq!(rate.convert(UsdAmount::from_dollars(3000)), Some(Wei::from_ether(1)));
    }

    #[test_case("0.01", "0.01 ETH/USD" ; "decimal")]
    #[test_case("1/3000", "1/3000 ETH/USD" ; "ratio")]
    #[test_case("2/200", "0.01 ETH/USD" ; "reducible ratio")]
    #[test_case("0.5/1500", "1/3000 ETH/USD" ; "decimal ratio")]
    fn rate_display(s: &str, expected: &str) {
        assert_eq!(s.parse::<Rate>().expect("rate").to_string(), expected);
    }

    #[test]
    fn rate_serde_keeps_inexact_ratio() {
        let rate = Rate::from_usd_per_native(UsdAmount::from_dollars(3000)).expect("rate");
        let json = serde_json::to_string(&rate).expect("serialize");
        assert_eq!(json, r#""1/3000""#);
        let back: Rate = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, rate);
        assert!("1/0".parse::<Rate>().is_err());

        let steep = Rate::from_wei_per_usd(u128::MAX);
        let back: Rate = serde_json::from_str(&serde_json::to_string(&steep).expect("serialize"))
            .expect("deserialize");
        assert_eq!(back, steep);
    }

    #[test]
    fn buffer_adds_basis_points() {
        let quote = Wei::from_ether(1);
        assert_eq!(quote.with_buffer_bps(100), Some(Wei::from_wei(1_010_000_000_000_000_000)));
        assert_eq!(quote.with_buffer_bps(0), Some(quote));
    }

    #[test]
    fn checked_arithmetic() {
        assert_eq!(Wei::MAX.checked_add(Wei::from_wei(1)), None);
        assert_eq!(Wei::ZERO.checked_sub(Wei::from_wei(1)), None);
        assert_eq!(Wei::from_wei(5).saturating_sub(Wei::from_wei(9)), Wei::ZERO);
    }

    #[test]
    fn mul_div_handles_wide_products() {
        // a*b overflows u128 but the quotient fits
        let a = u128::MAX / 2;
        assert_eq!(mul_div_floor(a, 4, 4), Some(a));
        assert_eq!(mul_div_floor(1, 1, 0), None);
        assert_eq!(mul_div_floor(u128::MAX, 2, 1), None);
    }

    proptest! {
        #[test]
        fn mul_div_matches_direct_when_it_fits(a in 0u128..u64::MAX as u128, b in 0u128..u64::MAX as u128, d in 1u128..u64::MAX as u128) {
            prop_assert_eq!(mul_div_floor(a, b, d), Some(a * b / d));
        }

        #[test]
        fn parse_display_agree(units in 0u128..u128::MAX / 2) {
            let amount = Wei::from_wei(units);
            let s: String = amount.into();
            prop_assert_eq!(s.parse::<Wei>().ok(), Some(amount));
        }
    }
}
