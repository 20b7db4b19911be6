//! Owner status lifecycles and the render mode they imply.
//!
//! Whether a result is editable is derived from its owner's status and
//! nothing else. There is no separate "read-only" flag to drift out of sync.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Service order lifecycle: ORDERED → IN_PROGRESS → COMPLETED / CANCELLED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceOrderStatus {
    Ordered,
    InProgress,
    Completed,
    Cancelled,
}

impl ServiceOrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceOrderStatus::Completed | ServiceOrderStatus::Cancelled)
    }

    /// An order may be cancelled from any open status, but only completed
    /// once work has started.
    pub fn can_transition_to(&self, next: ServiceOrderStatus) -> bool {
        use ServiceOrderStatus::*;
        matches!(
            (self, next),
            (Ordered, InProgress) | (Ordered, Cancelled) | (InProgress, Completed) | (InProgress, Cancelled)
        )
    }
}

impl fmt::Display for ServiceOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceOrderStatus::Ordered => "ORDERED",
            ServiceOrderStatus::InProgress => "IN_PROGRESS",
            ServiceOrderStatus::Completed => "COMPLETED",
            ServiceOrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Visit lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl VisitStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VisitStatus::Completed | VisitStatus::Cancelled | VisitStatus::NoShow
        )
    }

    pub fn can_transition_to(&self, next: VisitStatus) -> bool {
        use VisitStatus::*;
        matches!(
            (self, next),
            (Scheduled, InProgress)
                | (Scheduled, Cancelled)
                | (Scheduled, NoShow)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
        )
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VisitStatus::Scheduled => "SCHEDULED",
            VisitStatus::InProgress => "IN_PROGRESS",
            VisitStatus::Completed => "COMPLETED",
            VisitStatus::Cancelled => "CANCELLED",
            VisitStatus::NoShow => "NO_SHOW",
        };
        f.write_str(s)
    }
}

/// The status of whichever entity owns a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerStatus {
    Visit(VisitStatus),
    ServiceOrder(ServiceOrderStatus),
}

impl OwnerStatus {
    pub fn is_terminal(&self) -> bool {
        match self {
            OwnerStatus::Visit(s) => s.is_terminal(),
            OwnerStatus::ServiceOrder(s) => s.is_terminal(),
        }
    }

    /// True if `next` is a legal step from `self`. Mixing owner kinds is never legal.
    pub fn can_transition_to(&self, next: OwnerStatus) -> bool {
        match (self, next) {
            (OwnerStatus::Visit(a), OwnerStatus::Visit(b)) => a.can_transition_to(b),
            (OwnerStatus::ServiceOrder(a), OwnerStatus::ServiceOrder(b)) => a.can_transition_to(b),
            _ => false,
        }
    }

    pub fn render_mode(&self) -> RenderMode {
        RenderMode::for_status(*self)
    }
}

impl fmt::Display for OwnerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerStatus::Visit(s) => write!(f, "visit {s}"),
            OwnerStatus::ServiceOrder(s) => write!(f, "service order {s}"),
        }
    }
}

/// How the generic renderer presents a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Accepts input and emits filled-data changes.
    Interactive,
    /// Read-only rendering of a snapshot.
    View,
}

impl RenderMode {
    pub fn for_status(status: OwnerStatus) -> Self {
        if status.is_terminal() {
            RenderMode::View
        } else {
            RenderMode::Interactive
        }
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, RenderMode::Interactive)
    }
}
