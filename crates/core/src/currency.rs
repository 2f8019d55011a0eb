//! Currencies and exchange-rate arithmetic.
//!
//! Rates are always expressed as "units of currency per 1 USD", which is
//! what the exchange-rate provider returns for a USD base. Converting
//! between two non-USD currencies goes through USD.

use std::collections::BTreeMap;

use serde::Serialize;

pub const BASE_CURRENCY: &str = "USD";

/// Used when the provider is unreachable and nothing is stored yet.
pub const FALLBACK_USD_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.95),
    ("JPY", 160.0),
    ("GBP", 0.83),
    ("CAD", 1.45),
    ("INR", 88.0),
    ("AUD", 1.65),
    ("BRL", 6.2),
    ("MXN", 21.0),
];

/// Currencies offered for display preferences.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
}

pub const MAJOR_CURRENCIES: &[CurrencyInfo] = &[
    CurrencyInfo { code: "USD", name: "US Dollar", symbol: "$" },
    CurrencyInfo { code: "EUR", name: "Euro", symbol: "€" },
    CurrencyInfo { code: "CNY", name: "Chinese Yuan", symbol: "¥" },
    CurrencyInfo { code: "JPY", name: "Japanese Yen", symbol: "¥" },
    CurrencyInfo { code: "GBP", name: "British Pound", symbol: "£" },
    CurrencyInfo { code: "CHF", name: "Swiss Franc", symbol: "CHF" },
    CurrencyInfo { code: "CAD", name: "Canadian Dollar", symbol: "C$" },
    CurrencyInfo { code: "AUD", name: "Australian Dollar", symbol: "A$" },
];

/// Amounts keyed by ISO currency code.
pub type CurrencyAmounts = BTreeMap<String, f64>;

pub fn normalize_currency_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Units-per-USD rate table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RateTable {
    rates: BTreeMap<String, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        let mut table = Self::default();
        table.insert(BASE_CURRENCY, 1.0);
        table
    }

    pub fn fallback() -> Self {
        FALLBACK_USD_RATES.iter().copied().collect()
    }

    /// Non-positive or non-finite rates are ignored.
    pub fn insert(&mut self, currency: &str, per_usd: f64) {
        if per_usd.is_finite() && per_usd > 0.0 {
            self.rates.insert(normalize_currency_code(currency), per_usd);
        }
    }

    /// Fill gaps from another table without overriding existing entries.
    pub fn fill_from(&mut self, other: &RateTable) {
        for (code, rate) in &other.rates {
            self.rates.entry(code.clone()).or_insert(*rate);
        }
    }

    pub fn rate(&self, currency: &str) -> Option<f64> {
        let code = normalize_currency_code(currency);
        if code == BASE_CURRENCY {
            return Some(1.0);
        }
        self.rates.get(&code).copied()
    }

    pub fn currencies(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Rate to multiply an amount in `from` by to get `to`.
    pub fn cross_rate(&self, from: &str, to: &str) -> Option<f64> {
        if normalize_currency_code(from) == normalize_currency_code(to) {
            return Some(1.0);
        }
        Some(self.rate(to)? / self.rate(from)?)
    }

    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        self.cross_rate(from, to).map(|r| amount * r)
    }

    pub fn to_usd(&self, amount: f64, from: &str) -> Option<f64> {
        self.convert(amount, from, BASE_CURRENCY)
    }

    /// Sum of per-currency amounts in USD. Currencies without a rate are
    /// skipped.
    pub fn total_usd(&self, amounts: &CurrencyAmounts) -> f64 {
        amounts
            .iter()
            .filter_map(|(code, amount)| self.to_usd(*amount, code))
            .sum()
    }

    /// Same as [`total_usd`](Self::total_usd) but into any target currency.
    pub fn total_in(&self, amounts: &CurrencyAmounts, target: &str) -> f64 {
        amounts
            .iter()
            .filter_map(|(code, amount)| self.convert(*amount, code, target))
            .sum()
    }
}

impl<'a> FromIterator<(&'a str, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        let mut table = RateTable::new();
        for (code, rate) in iter {
            table.insert(code, rate);
        }
        table
    }
}

/// Fallback rates rebased on `base`: units of each currency per 1 `base`.
pub fn fallback_rates(base: &str) -> BTreeMap<String, f64> {
    let table = RateTable::fallback();
    table
        .currencies()
        .filter_map(|(code, _)| table.cross_rate(base, code).map(|r| (code.to_string(), r)))
        .collect()
}

/// Round to cents for display totals.
pub fn round2(amount: f64) -> f64 {
    // `+ 0.0` turns a negative zero into zero.
    (amount * 100.0).round() / 100.0 + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_currency_is_identity() {
        let table = RateTable::new();
        assert_eq!(table.convert(12.5, "xyz", "XYZ"), Some(12.5));
        assert_eq!(table.convert(12.5, "USD", "usd"), Some(12.5));
    }

    #[test]
    fn converts_through_usd() {
        let table = RateTable::fallback();
        let eur_to_usd = table.to_usd(9.5, "EUR").unwrap();
        assert!((eur_to_usd - 10.0).abs() < 1e-9);

        let gbp = table.convert(0.95, "EUR", "GBP").unwrap();
        assert!((gbp - 0.83).abs() < 1e-9);
    }

    #[test]
    fn unknown_currency_has_no_rate() {
        let table = RateTable::fallback();
        assert_eq!(table.convert(1.0, "EUR", "ZZZ"), None);
    }

    #[test]
    fn total_usd_skips_unknown() {
        let table = RateTable::fallback();
        let mut amounts = CurrencyAmounts::new();
        amounts.insert("USD".into(), 10.0);
        amounts.insert("JPY".into(), 1600.0);
        amounts.insert("ZZZ".into(), 99.0);
        assert!((table.total_usd(&amounts) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_rates_are_ignored() {
        let mut table = RateTable::new();
        table.insert("EUR", 0.0);
        table.insert("GBP", f64::NAN);
        assert_eq!(table.rate("EUR"), None);
        assert_eq!(table.rate("GBP"), None);
    }

    #[test]
    fn fill_from_keeps_existing() {
        let mut table: RateTable = [("EUR", 0.9)].into_iter().collect();
        table.fill_from(&RateTable::fallback());
        assert_eq!(table.rate("EUR"), Some(0.9));
        assert_eq!(table.rate("MXN"), Some(21.0));
    }

    #[test]
    fn rebased_fallback() {
        let rates = fallback_rates("EUR");
        assert!((rates["EUR"] - 1.0).abs() < 1e-9);
        assert!((rates["USD"] - 1.0 / 0.95).abs() < 1e-9);
    }

    #[test]
    fn rounding() {
        assert_eq!(round2(10.005_1), 10.01);
        assert_eq!(round2(3.14159), 3.14);
        assert!(round2(-0.0).is_sign_positive());
        assert!(round2(-0.001).is_sign_positive());
    }
}
