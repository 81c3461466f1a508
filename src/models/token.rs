use ethers::types::U256;
use serde::{Serialize, Serializer};

/// A balance as read from chain, with its 18-decimal rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balance {
    #[serde(serialize_with = "serialize_decimal")]
    pub raw: U256,
    pub formatted: String,
}

impl Balance {
    pub fn from_raw(raw: U256) -> Self {
        Self {
            raw,
            formatted: format_units(raw, 18),
        }
    }
}

/// Render `amount / 10^decimals` as a decimal string without trailing zeros.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let decimals = decimals as usize;
    let mut amount_str = amount.to_string();

    if amount_str.len() <= decimals {
        amount_str.insert_str(0, &"0".repeat(decimals - amount_str.len() + 1));
    }

    let point = amount_str.len() - decimals;
    amount_str.insert(point, '.');

    // Trim trailing zeros and decimal point if necessary
    amount_str = amount_str
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string();

    if amount_str.is_empty() {
        "0".to_string()
    } else {
        amount_str
    }
}

fn serialize_decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::utils::parse_ether;

    #[test]
    fn test_format_whole_and_fractional() {
        assert_eq!(Balance::from_raw(parse_ether("1").unwrap()).formatted, "1");
        assert_eq!(Balance::from_raw(parse_ether("100").unwrap()).formatted, "100");
        assert_eq!(Balance::from_raw(parse_ether("0.5").unwrap()).formatted, "0.5");
        assert_eq!(Balance::from_raw(parse_ether("12.034").unwrap()).formatted, "12.034");
    }

    #[test]
    fn test_format_zero_and_dust() {
        assert_eq!(Balance::from_raw(U256::zero()).formatted, "0");
        assert_eq!(Balance::from_raw(U256::one()).formatted, "0.000000000000000001");
    }

    #[test]
    fn test_format_other_decimals() {
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }

    #[test]
    fn test_raw_serializes_as_decimal() {
        let json = serde_json::to_value(Balance::from_raw(parse_ether("2").unwrap())).unwrap();
        assert_eq!(json["raw"], "2000000000000000000");
        assert_eq!(json["formatted"], "2");
    }
}
