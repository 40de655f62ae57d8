//! Lifecycle status vocabulary and the transition table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use serialforge_core::{CustomerId, DocumentId, OrderId, StockId};

use crate::record::WarrantyPeriod;

/// Lifecycle of one issued code.
///
/// Linear with branching at the tail, no cycles:
/// `Generated → Printed → SentToVendor → Received → Assigned → Sold`, with
/// `Returned` reachable from `Sold` and `Cancelled`/`Damaged` reachable from
/// any non-terminal state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerialStatus {
    Generated,
    Printed,
    SentToVendor,
    Received,
    Assigned,
    Sold,
    Returned,
    Cancelled,
    Damaged,
}

impl SerialStatus {
    /// Terminal statuses accept no further transition. `Sold` is terminal in
    /// every direction except the explicit `Returned` branch.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SerialStatus::Sold | SerialStatus::Returned | SerialStatus::Cancelled | SerialStatus::Damaged
        )
    }

    /// Whether the unit has physically arrived (at or past `Received` on the
    /// main chain). Used by the receiving gateway to word its rejections.
    pub fn has_been_received(self) -> bool {
        matches!(
            self,
            SerialStatus::Received | SerialStatus::Assigned | SerialStatus::Sold | SerialStatus::Returned
        )
    }

    /// The transition table. Everything not listed here is rejected.
    pub fn allows(self, next: SerialStatus) -> bool {
        use SerialStatus::*;
        match (self, next) {
            (Generated, Printed)
            | (Printed, SentToVendor)
            | (SentToVendor, Received)
            | (Received, Assigned)
            | (Assigned, Sold)
            | (Sold, Returned) => true,
            (from, Cancelled) | (from, Damaged) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SerialStatus::Generated => "generated",
            SerialStatus::Printed => "printed",
            SerialStatus::SentToVendor => "sent_to_vendor",
            SerialStatus::Received => "received",
            SerialStatus::Assigned => "assigned",
            SerialStatus::Sold => "sold",
            SerialStatus::Returned => "returned",
            SerialStatus::Cancelled => "cancelled",
            SerialStatus::Damaged => "damaged",
        }
    }
}

impl core::fmt::Display for SerialStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested lifecycle step plus the context it carries onto the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    Printed,
    SentToVendor,
    Received {
        receiving_document_id: DocumentId,
    },
    Assigned {
        stock_id: StockId,
    },
    Sold {
        order_id: OrderId,
        customer_id: CustomerId,
        warranty_starts_on: Option<NaiveDate>,
        warranty_ends_on: Option<NaiveDate>,
    },
    Returned,
    Cancelled {
        reason: String,
    },
    Damaged {
        reason: String,
    },
}

impl Transition {
    pub fn target_status(&self) -> SerialStatus {
        match self {
            Transition::Printed => SerialStatus::Printed,
            Transition::SentToVendor => SerialStatus::SentToVendor,
            Transition::Received { .. } => SerialStatus::Received,
            Transition::Assigned { .. } => SerialStatus::Assigned,
            Transition::Sold { .. } => SerialStatus::Sold,
            Transition::Returned => SerialStatus::Returned,
            Transition::Cancelled { .. } => SerialStatus::Cancelled,
            Transition::Damaged { .. } => SerialStatus::Damaged,
        }
    }

    /// Warranty window for `Sold`, when both dates are present and ordered.
    pub fn warranty(&self) -> Result<Option<WarrantyPeriod>, LifecycleError> {
        match self {
            Transition::Sold {
                warranty_starts_on: Some(start),
                warranty_ends_on: Some(end),
                ..
            } => Ok(Some(WarrantyPeriod::new(*start, *end)?)),
            _ => Ok(None),
        }
    }
}

/// Lifecycle rule violation: a business-rule rejection, not a system fault.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: SerialStatus, to: SerialStatus },

    #[error("warranty period ends ({ends_on}) before it starts ({starts_on})")]
    InvalidWarranty {
        starts_on: NaiveDate,
        ends_on: NaiveDate,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_chain_advances_one_step_at_a_time() {
        use SerialStatus::*;
        let chain = [Generated, Printed, SentToVendor, Received, Assigned, Sold];
        for pair in chain.windows(2) {
            assert!(pair[0].allows(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        // Skipping a step is rejected.
        assert!(!Generated.allows(SentToVendor));
        assert!(!Printed.allows(Received));
        assert!(!Received.allows(Sold));
    }

    #[test]
    fn sold_allows_only_returned() {
        use SerialStatus::*;
        assert!(Sold.allows(Returned));
        for next in [Generated, Printed, SentToVendor, Received, Assigned, Cancelled, Damaged] {
            assert!(!Sold.allows(next), "sold must not allow {next}");
        }
    }

    #[test]
    fn cancel_and_damage_reach_every_non_terminal_state() {
        use SerialStatus::*;
        for from in [Generated, Printed, SentToVendor, Received, Assigned] {
            assert!(from.allows(Cancelled));
            assert!(from.allows(Damaged));
        }
        for from in [Sold, Returned, Cancelled, Damaged] {
            assert!(!from.allows(Cancelled));
            assert!(!from.allows(Damaged));
        }
    }

    #[test]
    fn terminal_states_accept_nothing() {
        use SerialStatus::*;
        let all = [
            Generated, Printed, SentToVendor, Received, Assigned, Sold, Returned, Cancelled, Damaged,
        ];
        for from in [Returned, Cancelled, Damaged] {
            for next in all {
                assert!(!from.allows(next), "{from} must not allow {next}");
            }
        }
    }

    #[test]
    fn no_transition_reaches_an_earlier_main_chain_state() {
        use SerialStatus::*;
        let chain = [Generated, Printed, SentToVendor, Received, Assigned, Sold];
        for (i, from) in chain.iter().enumerate() {
            for earlier in &chain[..=i] {
                assert!(!from.allows(*earlier), "{from} must not regress to {earlier}");
            }
        }
    }
}
