//! Role fulfillment tracker.
//!
//! RULE: This is the only place that classifies a role as unassigned,
//! partially assigned, or fully assigned. Nothing caches the result;
//! every caller recomputes from the current assignment set.

use crate::{
    assignment_store::Assignment,
    role::RoleRequisition,
    types::{FulfillmentStatus, LifecycleStatus},
};
use serde::{Deserialize, Serialize};

/// The tri-state rule. A role needing nobody is always fully assigned.
pub fn classify(active: usize, required_headcount: u32) -> FulfillmentStatus {
    if active >= required_headcount as usize {
        FulfillmentStatus::FullyAssigned
    } else if active == 0 {
        FulfillmentStatus::Unassigned
    } else {
        FulfillmentStatus::PartiallyAssigned
    }
}

/// Number of active assignments targeting `role_id`.
pub fn active_count<'a, I>(role_id: &str, assignments: I) -> usize
where
    I: IntoIterator<Item = &'a Assignment>,
{
    assignments
        .into_iter()
        .filter(|a| a.role_id == role_id && a.status == LifecycleStatus::Active)
        .count()
}

pub fn status_for<'a, I>(role: &RoleRequisition, assignments: I) -> FulfillmentStatus
where
    I: IntoIterator<Item = &'a Assignment>,
{
    classify(active_count(&role.role_id, assignments), role.required_headcount)
}

/// Percentage of headcount filled, capped at 100. Zero headcount is 100%.
pub fn fulfillment_percent(active: usize, required_headcount: u32) -> f64 {
    if required_headcount == 0 {
        return 100.0;
    }
    (active as f64 * 100.0 / required_headcount as f64).min(100.0)
}

/// Role counts per status, for the board header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentSummary {
    pub total_roles:        usize,
    pub unassigned:         usize,
    pub partially_assigned: usize,
    pub fully_assigned:     usize,
    pub closed:             usize,
    /// Active assignments over required headcount across open roles.
    pub overall_percent:    f64,
}

pub fn summarise(roles: &[RoleRequisition], assignments: &[Assignment]) -> FulfillmentSummary {
    let mut summary = FulfillmentSummary {
        total_roles: roles.len(),
        ..FulfillmentSummary::default()
    };
    let mut filled: u64 = 0;
    let mut required: u64 = 0;

    for role in roles {
        if role.closed {
            summary.closed += 1;
            continue;
        }
        let active = active_count(&role.role_id, assignments);
        match classify(active, role.required_headcount) {
            FulfillmentStatus::Unassigned        => summary.unassigned += 1,
            FulfillmentStatus::PartiallyAssigned => summary.partially_assigned += 1,
            FulfillmentStatus::FullyAssigned     => summary.fully_assigned += 1,
        }
        filled += (active as u64).min(role.required_headcount as u64);
        required += role.required_headcount as u64;
    }

    summary.overall_percent = if required == 0 {
        100.0
    } else {
        filled as f64 * 100.0 / required as f64
    };
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tri_state_rule() {
        assert_eq!(classify(0, 2), FulfillmentStatus::Unassigned);
        assert_eq!(classify(1, 2), FulfillmentStatus::PartiallyAssigned);
        assert_eq!(classify(2, 2), FulfillmentStatus::FullyAssigned);
        assert_eq!(classify(3, 2), FulfillmentStatus::FullyAssigned);
    }

    #[test]
    fn zero_headcount_is_always_full() {
        assert_eq!(classify(0, 0), FulfillmentStatus::FullyAssigned);
        assert_eq!(fulfillment_percent(0, 0), 100.0);
    }

    #[test]
    fn percent_is_capped() {
        assert_eq!(fulfillment_percent(1, 4), 25.0);
        assert_eq!(fulfillment_percent(5, 4), 100.0);
    }
}
