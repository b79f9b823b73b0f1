//! Closed set of chains the gateway knows how to snapshot.
//!
//! [`ChainName`] is used to validate the `{name}` path segment of the
//! by-name history query. Stored rows keep the name exactly as BlockCypher
//! returned it; this type only governs lookups.

use std::fmt;

/// Fee-field layout a chain populates in its snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainFamily {
    /// Bitcoin-like chains reporting `{high,medium,low}_fee_per_kb`.
    Utxo,
    /// Ethereum-like chains reporting gas price, priority fee and base fee.
    Account,
}

impl ChainFamily {
    /// Lower-case label used in API responses.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Utxo => "utxo",
            Self::Account => "account",
        }
    }
}

/// One of the five chains served by the BlockCypher endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainName {
    /// `ETH.main`
    EthMain,
    /// `DASH.main`
    DashMain,
    /// `BTC.main`
    BtcMain,
    /// `BTC.test3`
    BtcTest3,
    /// `LTC.main`
    LtcMain,
}

impl ChainName {
    /// Every supported chain, in the order used in validation messages.
    pub const ALL: [Self; 5] = [
        Self::EthMain,
        Self::DashMain,
        Self::BtcMain,
        Self::BtcTest3,
        Self::LtcMain,
    ];

    /// Canonical BlockCypher spelling of the chain name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EthMain => "ETH.main",
            Self::DashMain => "DASH.main",
            Self::BtcMain => "BTC.main",
            Self::BtcTest3 => "BTC.test3",
            Self::LtcMain => "LTC.main",
        }
    }

    /// Default BlockCypher endpoint path serving this chain.
    #[must_use]
    pub const fn endpoint(&self) -> &'static str {
        match self {
            Self::EthMain => "/v1/eth/main",
            Self::DashMain => "/v1/dash/main",
            Self::BtcMain => "/v1/btc/main",
            Self::BtcTest3 => "/v1/btc/test3",
            Self::LtcMain => "/v1/ltc/main",
        }
    }

    /// Which fee group snapshots of this chain carry.
    #[must_use]
    pub const fn family(&self) -> ChainFamily {
        match self {
            Self::EthMain => ChainFamily::Account,
            _ => ChainFamily::Utxo,
        }
    }

    /// Case-insensitive lookup against the canonical names.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|chain| chain.as_str().eq_ignore_ascii_case(name))
    }

    /// Comma-separated list of canonical names, e.g. for error messages.
    #[must_use]
    pub fn joined() -> String {
        Self::ALL
            .iter()
            .map(ChainName::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ChainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignores_case() {
        assert_eq!(ChainName::parse("btc.main"), Some(ChainName::BtcMain));
        assert_eq!(ChainName::parse("BTC.TEST3"), Some(ChainName::BtcTest3));
        assert_eq!(ChainName::parse("Eth.Main"), Some(ChainName::EthMain));
    }

    #[test]
    fn parse_rejects_unknown_and_empty() {
        assert_eq!(ChainName::parse("bogus"), None);
        assert_eq!(ChainName::parse(""), None);
        assert_eq!(ChainName::parse("BTC"), None);
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(ChainName::DashMain.to_string(), "DASH.main");
        assert_eq!(ChainName::LtcMain.to_string(), "LTC.main");
    }

    #[test]
    fn joined_lists_all_five() {
        assert_eq!(
            ChainName::joined(),
            "ETH.main, DASH.main, BTC.main, BTC.test3, LTC.main"
        );
    }

    #[test]
    fn only_eth_is_account_family() {
        for chain in ChainName::ALL {
            let expected = if chain == ChainName::EthMain {
                ChainFamily::Account
            } else {
                ChainFamily::Utxo
            };
            assert_eq!(chain.family(), expected);
        }
    }

    #[test]
    fn endpoints_match_lowercase_paths() {
        assert_eq!(ChainName::BtcTest3.endpoint(), "/v1/btc/test3");
        assert_eq!(ChainName::EthMain.endpoint(), "/v1/eth/main");
    }
}
