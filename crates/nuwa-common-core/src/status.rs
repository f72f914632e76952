//! Common status types.

use serde::{Deserialize, Serialize};

/// Wish lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WishStatus {
    /// Submitted, waiting to be picked up.
    Pending,
    /// Being turned into a task.
    Processing,
    /// Fulfilled.
    Completed,
    /// Rejected by moderation.
    Rejected,
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Open for contributions.
    Open,
    /// Modules are being built.
    InProgress,
    /// All modules delivered.
    Completed,
    /// Closed without completion.
    Closed,
}

/// Module review state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    Submitted,
    Reviewing,
    Approved,
    Rejected,
}

/// Agent build state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Building,
    Testing,
    Ready,
    Deployed,
    /// Live and serving (reported by the showcase endpoints).
    Active,
}

macro_rules! status_str {
    ($ty:ty { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            /// Wire representation, as used in `status` query filters.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s,)+
                }
            }

            /// Parse the wire representation.
            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($s => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

status_str!(WishStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Rejected => "rejected",
});

status_str!(TaskStatus {
    Open => "open",
    InProgress => "in_progress",
    Completed => "completed",
    Closed => "closed",
});

status_str!(ModuleStatus {
    Submitted => "submitted",
    Reviewing => "reviewing",
    Approved => "approved",
    Rejected => "rejected",
});

status_str!(AgentStatus {
    Building => "building",
    Testing => "testing",
    Ready => "ready",
    Deployed => "deployed",
    Active => "active",
});

impl WishStatus {
    /// Is the wish in a terminal state?
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

impl TaskStatus {
    /// Does the task still accept module submissions?
    pub fn accepts_modules(&self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }
}
