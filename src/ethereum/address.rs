use std::fmt;

/// A 20 bytes Ethereum account address.
///
/// Parsed from the usual `0x` prefixed hexadecimal string. The canonical
/// form is lowercase: two addresses that differ only in the case of their
/// hexadecimal digits are equal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; Self::SIZE]);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AddressParseError {
    #[error("Expecting the address to start with `0x'")]
    MissingPrefix,
    #[error("Expecting {expected} hexadecimal digits, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("Invalid hexadecimal digits: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

impl Address {
    pub const SIZE: usize = 20;

    /// parse an address from its `0x` prefixed hexadecimal representation
    ///
    /// The input may be of any case (or mixed case, as produced by EIP-55
    /// checksummed displays). The parsed address is case-insensitive.
    pub fn from_hex(hex: &str) -> Result<Self, AddressParseError> {
        let Some(digits) = hex.strip_prefix("0x").or_else(|| hex.strip_prefix("0X")) else {
            return Err(AddressParseError::MissingPrefix);
        };

        if digits.len() != Self::SIZE * 2 {
            return Err(AddressParseError::InvalidLength {
                expected: Self::SIZE * 2,
                got: digits.len(),
            });
        }

        let mut bytes = [0; Self::SIZE];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// the canonical (lowercase) `0x` prefixed hexadecimal representation
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// shortened display form (`0x1234…7890`), handy for UIs that only
    /// need the user to recognise the address
    pub fn abbreviated(&self) -> String {
        let hex = self.to_hex();
        format!("{}\u{2026}{}", &hex[..6], &hex[hex.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Address").field(&self.to_hex()).finish()
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; Address::SIZE]> for Address {
    fn from(bytes: [u8; Address::SIZE]) -> Self {
        Self(bytes)
    }
}

impl std::str::FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl serde::Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;
        impl serde::de::Visitor<'_> for Visitor {
            type Value = Address;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "Expecting a `0x' prefixed hexadecimal address")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Address::from_hex(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(Visitor)
    }
}
