//! Per-status counters over the documents visible to a caller.

use serde::Serialize;

use super::DocumentStatus;

/// Document counts grouped by status.
///
/// `total` always equals the sum of the per-status fields.
///
/// # Examples
/// ```
/// use doctrack::domain::{DocumentStats, DocumentStatus};
///
/// let stats = DocumentStats::from_counts([
///     (DocumentStatus::Delivered, 2),
///     (DocumentStatus::Completed, 1),
/// ]);
/// assert_eq!(stats.delivered, 2);
/// assert_eq!(stats.total, 3);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    /// Documents awaiting receipt confirmation.
    pub delivered: u64,
    /// Documents whose receipt was confirmed.
    pub receipt_confirmed: u64,
    /// Documents with a submitted return.
    pub return_sent: u64,
    /// Documents whose return was accepted.
    pub completed: u64,
    /// Archived documents.
    pub archived: u64,
    /// All visible documents.
    pub total: u64,
}

impl DocumentStats {
    /// Fold `(status, count)` pairs into a stats record.
    ///
    /// Repeated statuses accumulate.
    pub fn from_counts(counts: impl IntoIterator<Item = (DocumentStatus, u64)>) -> Self {
        counts
            .into_iter()
            .fold(Self::default(), |mut stats, (status, count)| {
                *stats.slot(status) += count;
                stats.total += count;
                stats
            })
    }

    /// Count recorded for a single status.
    pub fn count(&self, status: DocumentStatus) -> u64 {
        match status {
            DocumentStatus::Delivered => self.delivered,
            DocumentStatus::ReceiptConfirmed => self.receipt_confirmed,
            DocumentStatus::ReturnSent => self.return_sent,
            DocumentStatus::Completed => self.completed,
            DocumentStatus::Archived => self.archived,
        }
    }

    fn slot(&mut self, status: DocumentStatus) -> &mut u64 {
        match status {
            DocumentStatus::Delivered => &mut self.delivered,
            DocumentStatus::ReceiptConfirmed => &mut self.receipt_confirmed,
            DocumentStatus::ReturnSent => &mut self.return_sent,
            DocumentStatus::Completed => &mut self.completed,
            DocumentStatus::Archived => &mut self.archived,
        }
    }
}
