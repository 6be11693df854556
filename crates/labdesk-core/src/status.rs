//! Order lifecycle.
//!
//! ```text
//! DRAFT ──► SUBMITTED ──► IN_PROGRESS ──► READY
//!   │           │
//!   └───────────┴──► CANCELLED
//! ```
//!
//! `READY` and `CANCELLED` are terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Draft,
    Submitted,
    InProgress,
    Ready,
    Cancelled,
}

/// A requested status change that the lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid status transition: cannot move order from {from} to {to}")]
pub struct InvalidTransition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Draft,
        OrderStatus::Submitted,
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Draft => "DRAFT",
            OrderStatus::Submitted => "SUBMITTED",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Ready => "READY",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Statuses reachable in a single step from `self`.
    pub fn allowed_transitions(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Draft => &[OrderStatus::Submitted, OrderStatus::Cancelled],
            OrderStatus::Submitted => &[OrderStatus::InProgress, OrderStatus::Cancelled],
            OrderStatus::InProgress => &[OrderStatus::Ready],
            OrderStatus::Ready | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Validates a move to `target`, returning the new status.
    pub fn transition_to(self, target: OrderStatus) -> Result<OrderStatus, InvalidTransition> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(InvalidTransition {
                from: self,
                to: target,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::invalid_status(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    fn expected_targets(from: OrderStatus) -> Vec<OrderStatus> {
        match from {
            Draft => vec![Submitted, Cancelled],
            Submitted => vec![InProgress, Cancelled],
            InProgress => vec![Ready],
            Ready | Cancelled => vec![],
        }
    }

    #[test]
    fn transition_table_is_exhaustive() {
        for from in OrderStatus::ALL {
            let allowed = expected_targets(from);
            for to in OrderStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&to),
                    "{from} -> {to}"
                );
                assert_eq!(from.transition_to(to).is_ok(), allowed.contains(&to));
            }
        }
    }

    #[test]
    fn terminal_states_permit_nothing() {
        assert!(Ready.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Draft.is_terminal());
        assert!(!InProgress.is_terminal());
    }

    #[test]
    fn ready_to_in_progress_is_rejected() {
        let err = Ready.transition_to(InProgress).unwrap_err();
        assert_eq!(err.from, Ready);
        assert_eq!(err.to, InProgress);
        assert_eq!(
            err.to_string(),
            "Invalid status transition: cannot move order from READY to IN_PROGRESS"
        );
    }

    #[test]
    fn self_transitions_are_not_allowed() {
        for status in OrderStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn parses_and_serializes_wire_names() {
        assert_eq!("IN_PROGRESS".parse::<OrderStatus>().unwrap(), InProgress);
        assert!("in_progress".parse::<OrderStatus>().is_err());
        assert!("PENDING".parse::<OrderStatus>().is_err());

        let json = serde_json::to_string(&InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let back: OrderStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(back, Cancelled);
    }
}
