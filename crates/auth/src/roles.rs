use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Caller role, as resolved by the auth provider.
///
/// A closed set: the engine never compares role strings. Variants are declared
/// in ascending rank so `Ord` expresses "outranks".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May submit requisitions and record receipts.
    Requester,
    /// Standard approver.
    Approver,
    /// Administrator: implicitly outranks approvers, may repair chains.
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Requester => "requester",
            Role::Approver => "approver",
            Role::Administrator => "administrator",
        }
    }

    pub fn outranks(&self, other: Role) -> bool {
        *self > other
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requester" => Ok(Role::Requester),
            "approver" => Ok(Role::Approver),
            "administrator" => Ok(Role::Administrator),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}
