//! Ethereum domain primitives: account addresses, chain identities and
//! native currency amounts.

mod address;
mod chain;
mod units;

pub use self::{
    address::{Address, AddressParseError},
    chain::{ChainId, ChainIdParseError, NetworkInfo},
    units::{ParseUnitsError, WEI_PER_ETHER, Wei},
};
