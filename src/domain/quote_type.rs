//! Provider-assigned security categories.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteType {
    Equity,
    Etf,
    Index,
    Future,
    MutualFund,
    Currency,
}

impl QuoteType {
    pub const ALL: [QuoteType; 6] = [
        QuoteType::Equity,
        QuoteType::Etf,
        QuoteType::Index,
        QuoteType::Future,
        QuoteType::MutualFund,
        QuoteType::Currency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteType::Equity => "EQUITY",
            QuoteType::Etf => "ETF",
            QuoteType::Index => "INDEX",
            QuoteType::Future => "FUTURE",
            QuoteType::MutualFund => "MUTUALFUND",
            QuoteType::Currency => "CURRENCY",
        }
    }

    /// Whether the dashboard can display this security.
    pub fn is_supported(&self) -> bool {
        matches!(self, QuoteType::Equity | QuoteType::Etf | QuoteType::Index)
    }
}

impl fmt::Display for QuoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuoteType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown quote type: {s}"))
    }
}
