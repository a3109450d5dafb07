//! Document status workflow and its transition guard.
//!
//! ```text
//! DELIVERED --confirm receipt--> RECEIPT_CONFIRMED --submit return--> RETURN_SENT
//! RETURN_SENT --confirm return--> COMPLETED
//! any state except ARCHIVED --archive--> ARCHIVED
//! ```
//!
//! [`guard`] is the single authority on who may move a document and from
//! where. Role and ownership are checked before the current status, so a
//! caller without rights always sees `Forbidden`, whatever state the
//! document is in.

use std::fmt;

use crate::domain::{DocumentStatus, Error, Role, UserId};

/// Identity of the user making a request, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Authenticated user.
    pub user_id: UserId,
    /// Role held by that user.
    pub role: Role,
}

impl Caller {
    /// Build a caller.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Whether the caller is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `Forbidden` unless the caller is an administrator.
    pub fn require_admin(&self) -> Result<(), GuardRejection> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(GuardRejection::Forbidden)
        }
    }
}

/// A requested move in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Consultant acknowledges a delivered document.
    ConfirmReceipt,
    /// Consultant uploads the return file.
    SubmitReturn,
    /// Administrator accepts the return.
    ConfirmReturn,
    /// Administrator archives the document.
    Archive,
}

impl Transition {
    /// Status the document ends up in.
    pub const fn target(self) -> DocumentStatus {
        match self {
            Self::ConfirmReceipt => DocumentStatus::ReceiptConfirmed,
            Self::SubmitReturn => DocumentStatus::ReturnSent,
            Self::ConfirmReturn => DocumentStatus::Completed,
            Self::Archive => DocumentStatus::Archived,
        }
    }

    /// Whether the transition may start from `current`.
    pub const fn accepts(self, current: DocumentStatus) -> bool {
        match self {
            Self::ConfirmReceipt => matches!(current, DocumentStatus::Delivered),
            Self::SubmitReturn => matches!(current, DocumentStatus::ReceiptConfirmed),
            Self::ConfirmReturn => matches!(current, DocumentStatus::ReturnSent),
            Self::Archive => !matches!(current, DocumentStatus::Archived),
        }
    }

    /// Transition reached by asking for `status` through the generic status
    /// update entry point.
    ///
    /// `RETURN_SENT` needs a file and `DELIVERED` is only ever initial, so
    /// neither maps to a transition.
    pub const fn for_requested_status(status: DocumentStatus) -> Option<Self> {
        match status {
            DocumentStatus::ReceiptConfirmed => Some(Self::ConfirmReceipt),
            DocumentStatus::Completed => Some(Self::ConfirmReturn),
            DocumentStatus::Archived => Some(Self::Archive),
            DocumentStatus::Delivered | DocumentStatus::ReturnSent => None,
        }
    }

    fn permits(self, caller: &Caller, owner: &UserId) -> bool {
        match self {
            Self::ConfirmReceipt | Self::SubmitReturn => {
                caller.role == Role::Consultant && &caller.user_id == owner
            }
            Self::ConfirmReturn | Self::Archive => caller.is_admin(),
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::ConfirmReceipt => "confirm receipt",
            Self::SubmitReturn => "submit return",
            Self::ConfirmReturn => "confirm return",
            Self::Archive => "archive",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why [`guard`] refused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GuardRejection {
    /// Caller role or ownership does not allow the transition.
    #[error("not permitted to perform this action")]
    Forbidden,
    /// The document is not in the state the transition starts from.
    #[error("{transition} is not allowed from status {current}")]
    InvalidTransition {
        /// Requested transition.
        transition: Transition,
        /// Status the document was in.
        current: DocumentStatus,
    },
}

impl From<GuardRejection> for Error {
    fn from(value: GuardRejection) -> Self {
        match value {
            GuardRejection::Forbidden => Self::forbidden(value.to_string()),
            GuardRejection::InvalidTransition { .. } => Self::invalid_transition(value.to_string()),
        }
    }
}

/// Decide whether `caller` may apply `transition` to a document owned by
/// `owner` that is currently in `current`.
///
/// Returns the status the document moves to.
///
/// # Examples
/// ```
/// use doctrack::domain::workflow::{guard, Caller, GuardRejection, Transition};
/// use doctrack::domain::{DocumentStatus, Role, UserId};
///
/// let owner = UserId::new("paulo.marcio").unwrap();
/// let caller = Caller::new(owner.clone(), Role::Consultant);
///
/// assert_eq!(
///     guard(&caller, &owner, DocumentStatus::Delivered, Transition::ConfirmReceipt),
///     Ok(DocumentStatus::ReceiptConfirmed)
/// );
/// assert!(matches!(
///     guard(&caller, &owner, DocumentStatus::Delivered, Transition::ConfirmReturn),
///     Err(GuardRejection::Forbidden)
/// ));
/// ```
pub fn guard(
    caller: &Caller,
    owner: &UserId,
    current: DocumentStatus,
    transition: Transition,
) -> Result<DocumentStatus, GuardRejection> {
    if !transition.permits(caller, owner) {
        return Err(GuardRejection::Forbidden);
    }
    if !transition.accepts(current) {
        return Err(GuardRejection::InvalidTransition {
            transition,
            current,
        });
    }
    Ok(transition.target())
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
