use std::fmt;

/// number of base units (wei) per display unit (ether)
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// An amount of the native currency, counted in base units (wei).
///
/// Wallet capabilities report balances as hexadecimal quantities which can
/// exceed what a double (or a `u64`) can hold without rounding. All the
/// conversions here are exact integer arithmetic: formatting an amount and
/// parsing the output back always yields the original amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Wei(u128);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseUnitsError {
    #[error("Expecting a `0x' prefixed hexadecimal quantity")]
    MissingPrefix,
    #[error("Invalid quantity `{quantity}': {reason}")]
    InvalidQuantity { quantity: String, reason: String },
    #[error("Too many fractional digits ({0}), ether has at most 18")]
    TooManyFractionalDigits(usize),
    #[error("Amount does not fit in 128 bits")]
    Overflow,
}

impl Wei {
    /// parse the hexadecimal quantity as reported by `eth_getBalance`
    /// (e.g. `"0xde0b6b3a7640000"`)
    pub fn from_hex_quantity(quantity: &str) -> Result<Self, ParseUnitsError> {
        let Some(digits) = quantity.strip_prefix("0x").or_else(|| quantity.strip_prefix("0X"))
        else {
            return Err(ParseUnitsError::MissingPrefix);
        };

        u128::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|error| ParseUnitsError::InvalidQuantity {
                quantity: quantity.to_owned(),
                reason: error.to_string(),
            })
    }

    /// format the amount as an exact decimal ether string
    ///
    /// The output keeps up to 18 fractional digits, trimming the trailing
    /// zeroes but always keeping at least one (`"1.0"`, not `"1"`). Parsing
    /// the output with [`Wei::from_ether`] yields the amount back, whatever
    /// the amount.
    pub fn to_ether(&self) -> String {
        let whole = self.0 / WEI_PER_ETHER;
        let fractional = self.0 % WEI_PER_ETHER;

        if fractional == 0 {
            format!("{whole}.0")
        } else {
            let digits = format!("{fractional:018}");
            format!("{whole}.{}", digits.trim_end_matches('0'))
        }
    }

    /// parse a decimal ether string (`"1.5"`, `"0.000000000000000001"`, ...)
    /// back into base units
    pub fn from_ether(ether: &str) -> Result<Self, ParseUnitsError> {
        let (whole, fractional) = ether.split_once('.').unwrap_or((ether, ""));

        if whole.is_empty() && fractional.is_empty() {
            return Err(ParseUnitsError::InvalidQuantity {
                quantity: ether.to_owned(),
                reason: "empty amount".to_owned(),
            });
        }
        if fractional.len() > 18 {
            return Err(ParseUnitsError::TooManyFractionalDigits(fractional.len()));
        }

        let parse = |digits: &str| -> Result<u128, ParseUnitsError> {
            if digits.is_empty() {
                Ok(0)
            } else {
                digits
                    .parse()
                    .map_err(|error: std::num::ParseIntError| ParseUnitsError::InvalidQuantity {
                        quantity: ether.to_owned(),
                        reason: error.to_string(),
                    })
            }
        };

        let whole = parse(whole)?;
        let scale = 10u128.pow(18 - fractional.len() as u32);
        let fractional = parse(fractional)? * scale;

        whole
            .checked_mul(WEI_PER_ETHER)
            .and_then(|wei| wei.checked_add(fractional))
            .map(Self)
            .ok_or(ParseUnitsError::Overflow)
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl From<u128> for Wei {
    fn from(wei: u128) -> Self {
        Self(wei)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wei", self.0)
    }
}
