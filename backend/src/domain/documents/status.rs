//! Document lifecycle status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Position of a document in the delivery workflow.
///
/// `Delivered` is the initial state, `Completed` closes the normal flow and
/// `Archived` is a terminal label an administrator can apply at any point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    /// Uploaded by an administrator, awaiting the consultant.
    Delivered,
    /// The consultant acknowledged receipt.
    ReceiptConfirmed,
    /// The consultant uploaded a return file.
    ReturnSent,
    /// An administrator accepted the return.
    Completed,
    /// Removed from the active flow.
    Archived,
}

/// Raised when a stored or requested status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document status '{0}'")]
pub struct UnknownStatusError(pub String);

impl DocumentStatus {
    /// Every status, in workflow order.
    pub const ALL: [Self; 5] = [
        Self::Delivered,
        Self::ReceiptConfirmed,
        Self::ReturnSent,
        Self::Completed,
        Self::Archived,
    ];

    /// Stable storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "DELIVERED",
            Self::ReceiptConfirmed => "RECEIPT_CONFIRMED",
            Self::ReturnSent => "RETURN_SENT",
            Self::Completed => "COMPLETED",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatusError(s.to_owned()))
    }
}
