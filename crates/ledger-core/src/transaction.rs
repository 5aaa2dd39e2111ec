use serde::{Deserialize, Serialize};

/// A value transfer between two named parties.
///
/// `from == None` marks coins minted by the ledger itself (mining rewards and
/// genesis credits). Amounts and addresses are stored verbatim; nothing here
/// checks balances, signatures or duplicates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub(crate) from: Option<String>,
    pub(crate) to: String,
    pub(crate) amount: u64,
}

impl Transaction {
    /// Transfer from `from` to `to`.
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: u64) -> Self {
        Self::from_parts(Some(from.into()), to.into(), amount)
    }

    /// Coins minted out of nothing for `to`.
    pub fn reward(to: impl Into<String>, amount: u64) -> Self {
        Self::from_parts(None, to.into(), amount)
    }

    pub fn from_parts(from: Option<String>, to: String, amount: u64) -> Self {
        Self { from, to, amount }
    }

    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn is_reward(&self) -> bool {
        self.from.is_none()
    }
}
