//! Country catalog and progressive tax brackets

use rust_decimal::prelude::*;
use shared::models::{SupportedCountry, TaxBracket};

use crate::utils::{AppError, AppResult, ErrorCode};

const MAX_BRACKETS: usize = 20;

const fn country(code: &'static str, name: &'static str, currency: &'static str) -> SupportedCountry {
    SupportedCountry {
        code,
        name,
        currency,
    }
}

/// Countries payroll can be generated for
pub const SUPPORTED_COUNTRIES: &[SupportedCountry] = &[
    country("US", "United States", "USD"),
    country("UK", "United Kingdom", "GBP"),
    country("India", "India", "INR"),
    country("Singapore", "Singapore", "SGD"),
    country("Australia", "Australia", "AUD"),
    country("Canada", "Canada", "CAD"),
    country("Germany", "Germany", "EUR"),
    country("France", "France", "EUR"),
    country("Japan", "Japan", "JPY"),
    country("UAE", "United Arab Emirates", "AED"),
    country("China", "China", "CNY"),
    country("Brazil", "Brazil", "BRL"),
    country("Mexico", "Mexico", "MXN"),
    country("South Africa", "South Africa", "ZAR"),
    country("Netherlands", "Netherlands", "EUR"),
    country("Spain", "Spain", "EUR"),
    country("Italy", "Italy", "EUR"),
    country("Sweden", "Sweden", "SEK"),
    country("Switzerland", "Switzerland", "CHF"),
    country("Malaysia", "Malaysia", "MYR"),
];

/// Look a country up by code or full name, ignoring case
pub fn find_country(value: &str) -> Option<&'static SupportedCountry> {
    let value = value.trim();
    SUPPORTED_COUNTRIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(value) || c.name.eq_ignore_ascii_case(value))
}

pub fn require_country(value: &str) -> AppResult<&'static SupportedCountry> {
    find_country(value).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::UnsupportedCountry,
            format!("Country '{}' is not supported", value.trim()),
        )
    })
}

/// A single open bracket taxing everything at `rate`
pub fn flat(rate: f64) -> Vec<TaxBracket> {
    vec![TaxBracket {
        min: 0.0,
        max: None,
        rate,
    }]
}

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::with_message(ErrorCode::TaxRuleInvalid, msg)
}

/// Brackets must start at 0, be contiguous and end with an open band
pub fn validate_brackets(brackets: &[TaxBracket]) -> AppResult<()> {
    if brackets.is_empty() || brackets.len() > MAX_BRACKETS {
        return Err(invalid(format!(
            "Between 1 and {} brackets are required",
            MAX_BRACKETS
        )));
    }
    if brackets[0].min != 0.0 {
        return Err(invalid("The first bracket must start at 0"));
    }

    let last = brackets.len() - 1;
    for (i, b) in brackets.iter().enumerate() {
        if !b.rate.is_finite() || !(0.0..=1.0).contains(&b.rate) {
            return Err(invalid(format!("Bracket {} rate must be between 0 and 1", i + 1)));
        }
        if !b.min.is_finite() || b.min < 0.0 {
            return Err(invalid(format!("Bracket {} has an invalid lower bound", i + 1)));
        }
        match (b.max, i == last) {
            (None, true) => {}
            (None, false) => {
                return Err(invalid("Only the last bracket may be open ended"));
            }
            (Some(_), true) => {
                return Err(invalid("The last bracket must be open ended"));
            }
            (Some(max), false) => {
                if !max.is_finite() || max <= b.min {
                    return Err(invalid(format!("Bracket {} upper bound must exceed its lower bound", i + 1)));
                }
                if brackets[i + 1].min != max {
                    return Err(invalid(format!(
                        "Bracket {} must start where bracket {} ends",
                        i + 2,
                        i + 1
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Tax on `income`, each band taxing only the slice that falls inside it
pub fn progressive_tax(income: Decimal, brackets: &[TaxBracket]) -> Decimal {
    let mut tax = Decimal::ZERO;
    for b in brackets {
        let min = super::to_decimal(b.min);
        if income <= min {
            break;
        }
        let upper = match b.max {
            Some(max) => income.min(super::to_decimal(max)),
            None => income,
        };
        tax += (upper - min) * super::to_decimal(b.rate);
    }
    tax
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(min: f64, max: Option<f64>, rate: f64) -> TaxBracket {
        TaxBracket { min, max, rate }
    }

    #[test]
    fn test_country_lookup() {
        assert_eq!(find_country("india").map(|c| c.currency), Some("INR"));
        assert_eq!(find_country("United Arab Emirates").map(|c| c.code), Some("UAE"));
        assert_eq!(find_country(" uk ").map(|c| c.currency), Some("GBP"));
        assert!(find_country("Atlantis").is_none());
        assert_eq!(
            require_country("Atlantis").unwrap_err().code,
            ErrorCode::UnsupportedCountry
        );
    }

    #[test]
    fn test_progressive_tax() {
        let brackets = vec![
            band(0.0, Some(10_000.0), 0.1),
            band(10_000.0, Some(50_000.0), 0.2),
            band(50_000.0, None, 0.3),
        ];
        // 1000 + 8000 + 3000
        assert_eq!(progressive_tax(Decimal::from(60_000), &brackets), Decimal::from(12_000));
        assert_eq!(progressive_tax(Decimal::from(5_000), &brackets), Decimal::from(500));
        assert_eq!(progressive_tax(Decimal::ZERO, &brackets), Decimal::ZERO);
        assert_eq!(
            progressive_tax(Decimal::from(1_000), &flat(0.11)),
            Decimal::from(110)
        );
    }

    #[test]
    fn test_bracket_validation() {
        assert!(validate_brackets(&flat(0.2)).is_ok());
        assert!(validate_brackets(&[band(0.0, Some(100.0), 0.0), band(100.0, None, 0.1)]).is_ok());

        let cases = [
            vec![],
            vec![band(10.0, None, 0.1)],
            vec![band(0.0, None, 1.5)],
            vec![band(0.0, Some(100.0), 0.1)],
            vec![band(0.0, None, 0.1), band(100.0, None, 0.2)],
            vec![band(0.0, Some(100.0), 0.1), band(150.0, None, 0.2)],
            vec![band(0.0, Some(0.0), 0.1), band(0.0, None, 0.2)],
        ];
        for brackets in cases {
            let err = validate_brackets(&brackets).unwrap_err();
            assert_eq!(err.code, ErrorCode::TaxRuleInvalid, "{brackets:?}");
        }
    }
}
