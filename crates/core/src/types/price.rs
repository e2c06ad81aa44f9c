//! Type-safe price representation.
//!
//! The commerce backend reports every monetary amount as an integer in the
//! currency's smallest unit (e.g. paise for INR, cents for USD). Prices are
//! carried verbatim and only converted to a decimal form for display.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A price in integer minor units with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the smallest currency unit (e.g., paise for INR).
    pub amount: i64,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price from minor units.
    #[must_use]
    pub const fn new(amount: i64, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero price in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            amount: 0,
            currency_code,
        }
    }

    /// Format for display (e.g., "₹150.00").
    #[must_use]
    pub fn display(&self) -> String {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        format!(
            "{sign}{}{}.{:02}",
            self.currency_code.symbol(),
            abs / 100,
            abs % 100
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// ISO 4217 currency codes supported by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyCode {
    #[default]
    Inr,
    Usd,
    Eur,
    Gbp,
}

impl CurrencyCode {
    /// Currency symbol for display.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Inr => "₹",
            Self::Usd => "$",
            Self::Eur => "€",
            Self::Gbp => "£",
        }
    }

    /// Lowercase ISO 4217 code as used by the backend API.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Inr => "inr",
            Self::Usd => "usd",
            Self::Eur => "eur",
            Self::Gbp => "gbp",
        }
    }
}

impl core::str::FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inr" => Ok(Self::Inr),
            "usd" => Ok(Self::Usd),
            "eur" => Ok(Self::Eur),
            "gbp" => Ok(Self::Gbp),
            _ => Err(CurrencyCodeError(s.to_string())),
        }
    }
}

/// Error for unsupported currency codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported currency code: {0}")]
pub struct CurrencyCodeError(String);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency_code() {
        assert_eq!("inr".parse::<CurrencyCode>().unwrap(), CurrencyCode::Inr);
        assert_eq!("USD".parse::<CurrencyCode>().unwrap(), CurrencyCode::Usd);
        assert!("xyz".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_display_whole_and_fraction() {
        let price = Price::new(15000, CurrencyCode::Inr);
        assert_eq!(price.display(), "₹150.00");

        let price = Price::new(1205, CurrencyCode::Usd);
        assert_eq!(price.display(), "$12.05");
    }

    #[test]
    fn test_display_sub_unit() {
        let price = Price::new(7, CurrencyCode::Inr);
        assert_eq!(price.display(), "₹0.07");
    }

    #[test]
    fn test_display_negative() {
        // Discounted totals can go negative on refund lines
        let price = Price::new(-50, CurrencyCode::Inr);
        assert_eq!(price.display(), "-₹0.50");
    }

    #[test]
    fn test_display_zero() {
        assert_eq!(Price::zero(CurrencyCode::Inr).display(), "₹0.00");
    }

    #[test]
    fn test_serde_currency_lowercase() {
        let json = serde_json::to_string(&CurrencyCode::Inr).unwrap();
        assert_eq!(json, "\"inr\"");

        let parsed: CurrencyCode = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(parsed, CurrencyCode::Usd);
    }
}
