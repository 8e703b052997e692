//! Shared primitive types used across the mapping engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier of a pool member.
pub type WorkerId = String;

/// Stable identifier of an open role requisition.
pub type RoleId = String;

/// Identifier of an assignment record (UUID v4 text).
pub type AssignmentId = String;

/// Identifier of a client owning one or more roles.
pub type ClientId = String;

/// Whole percentage points of a worker's capacity.
pub type Percent = u32;

/// Gives a fieldless enum a stable text form shared by serde, SQLite
/// columns, and log lines.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} '{other}'", stringify!($name))),
                }
            }
        }
    };
}

/// Which pool a worker belongs to. The DA and TA mapping boards are two
/// engines over the same code, one per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    #[default]
    DeliveryAssociate,
    TalentAcquisition,
}

text_enum!(WorkerKind {
    DeliveryAssociate => "delivery_associate",
    TalentAcquisition => "talent_acquisition",
});

impl WorkerKind {
    /// Short board label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::DeliveryAssociate => "DA",
            Self::TalentAcquisition => "TA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Busy,
    Unavailable,
}

text_enum!(Availability {
    Available => "available",
    Busy => "busy",
    Unavailable => "unavailable",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

text_enum!(Priority {
    High => "high",
    Medium => "medium",
    Low => "low",
});

impl Priority {
    /// Sort rank, lowest first. High sorts ahead of Low.
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentType {
    Primary,
    Secondary,
    Backup,
}

text_enum!(AssignmentType {
    Primary => "primary",
    Secondary => "secondary",
    Backup => "backup",
});

/// Assignment lifecycle. `Completed` is terminal; removal is not a status,
/// the record simply leaves the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    Pending,
    Active,
    Completed,
}

text_enum!(LifecycleStatus {
    Pending => "pending",
    Active => "active",
    Completed => "completed",
});

impl LifecycleStatus {
    /// Pending and active assignments hold a workload reservation and
    /// block a second assignment for the same (worker, role) pair.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }
}

/// Derived staffing completeness of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    Unassigned,
    PartiallyAssigned,
    FullyAssigned,
}

text_enum!(FulfillmentStatus {
    Unassigned => "unassigned",
    PartiallyAssigned => "partially_assigned",
    FullyAssigned => "fully_assigned",
});

/// Normalise a skill tag for set comparison: trimmed, lower-case.
pub fn normalise_skill(skill: &str) -> String {
    skill.trim().to_lowercase()
}
