use std::fmt;

/// EIP-155 chain identifier of the ledger the capability is pointed at.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ChainId(u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid chain id `{quantity}'")]
pub struct ChainIdParseError {
    pub quantity: String,
}

impl ChainId {
    pub const MAINNET: Self = Self(1);
    pub const SEPOLIA: Self = Self(11_155_111);
    pub const HOLESKY: Self = Self(17_000);

    /// parse the hexadecimal quantity the capability reports for
    /// `eth_chainId` and the `chainChanged` event payload (e.g. `"0x1"`)
    pub fn from_hex_quantity(quantity: &str) -> Result<Self, ChainIdParseError> {
        quantity
            .strip_prefix("0x")
            .or_else(|| quantity.strip_prefix("0X"))
            .and_then(|digits| u64::from_str_radix(digits, 16).ok())
            .map(Self)
            .ok_or_else(|| ChainIdParseError {
                quantity: quantity.to_owned(),
            })
    }

    /// the human readable name of the chain, if it is one of the commonly
    /// deployed ones
    pub fn name(&self) -> Option<&'static str> {
        match self.0 {
            1 => Some("mainnet"),
            10 => Some("optimism"),
            56 => Some("bnb"),
            137 => Some("polygon"),
            8_453 => Some("base"),
            17_000 => Some("holesky"),
            42_161 => Some("arbitrum"),
            11_155_111 => Some("sepolia"),
            _ => None,
        }
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "unknown-chain({})", self.0),
        }
    }
}

/// Immutable snapshot of the network the connection points at. Replaced
/// wholesale on every chain change, never partially updated.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NetworkInfo {
    pub chain_id: ChainId,
    pub name: Option<String>,
}

impl NetworkInfo {
    pub fn from_chain_id(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            name: chain_id.name().map(str::to_owned),
        }
    }
}

impl fmt::Display for NetworkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "unknown-chain({})", u64::from(self.chain_id)),
        }
    }
}
