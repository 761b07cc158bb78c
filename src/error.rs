#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum ProviderErrorCode {
    #[error("The user rejected the request.")]
    UserRejectedRequest,
    #[error("The requested method and/or account has not been authorized by the user.")]
    Unauthorized,
    #[error("The provider does not support the requested method.")]
    UnsupportedMethod,
    #[error("The provider is disconnected from all chains.")]
    Disconnected,
    #[error("The provider is not connected to the requested chain.")]
    ChainDisconnected,
    #[error("Internal JSON-RPC error.")]
    InternalError,
    #[error("Unknown error code `{0}'")]
    Unknown(i64),
}

/// Error reported by the wallet capability itself, following the EIP-1193
/// error shape (`{ code, message }`).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error, serde::Deserialize,
)]
#[error("{code}. {message}.")]
pub struct ProviderError {
    pub code: ProviderErrorCode,
    pub message: String,
}

impl ProviderError {
    /// error to report when the capability handed us back something we
    /// could not make sense of
    pub fn unexpected(info: impl Into<String>) -> Self {
        Self {
            code: ProviderErrorCode::InternalError,
            message: info.into(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(
            self.code,
            ProviderErrorCode::UserRejectedRequest | ProviderErrorCode::Unauthorized
        )
    }
}

/// Why a connection attempt settled in the `Failed` state. Every variant is
/// recoverable: calling `connect` again starts a fresh attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("No wallet found. Install a browser wallet extension.")]
    NoCapability,
    #[error("The wallet denied the connection request.")]
    ConnectionDenied,
    #[error("The wallet request failed: {0}")]
    RequestFailed(ProviderError),
}

/// Why a balance resolution settled in the `Failed` state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    #[error("This is not a valid account address.")]
    InvalidAddressFormat,
    #[error("No wallet available to query the balance with.")]
    ProviderUnavailable,
    #[error("The balance query failed: {0}")]
    NetworkQueryFailed(ProviderError),
}

impl<'de> serde::Deserialize<'de> for ProviderErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;
        impl serde::de::Visitor<'_> for Visitor {
            type Value = ProviderErrorCode;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "Expecting an integer ProviderErrorCode")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                match v {
                    4001 => Ok(ProviderErrorCode::UserRejectedRequest),
                    4100 => Ok(ProviderErrorCode::Unauthorized),
                    4200 => Ok(ProviderErrorCode::UnsupportedMethod),
                    4900 => Ok(ProviderErrorCode::Disconnected),
                    4901 => Ok(ProviderErrorCode::ChainDisconnected),
                    -32603 => Ok(ProviderErrorCode::InternalError),
                    unknown => Ok(ProviderErrorCode::Unknown(unknown)),
                }
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_i64(v as i64)
            }
        }

        deserializer.deserialize_i64(Visitor)
    }
}
