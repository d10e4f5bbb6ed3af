//! Department overlap report for the manager leave overview.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::leave_request::LeaveWithOwner;

use super::overlap::overlaps;

pub const ALL_DEPARTMENTS: &str = "All";

/// Department selector of the overview; anything but "All" narrows to one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DepartmentFilter {
    #[default]
    All,
    Only(String),
}

impl DepartmentFilter {
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(ALL_DEPARTMENTS) => DepartmentFilter::All,
            Some(name) => DepartmentFilter::Only(name.to_string()),
        }
    }

    pub fn department(&self) -> Option<&str> {
        match self {
            DepartmentFilter::All => None,
            DepartmentFilter::Only(name) => Some(name),
        }
    }

    pub fn label(&self) -> &str {
        self.department().unwrap_or(ALL_DEPARTMENTS)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OverlapReport {
    /// leave id -> overlaps another approved leave of the same department
    pub overlap_flags: BTreeMap<u64, bool>,
    pub current: Vec<LeaveWithOwner>,
    pub upcoming: Vec<LeaveWithOwner>,
    pub departments: Vec<String>,
    #[schema(example = "All")]
    pub selected_department: String,
}

/// Builds the overview from approved leaves.
///
/// Leaves are expected ordered by department then start date, as the store
/// returns them; the flags do not depend on that order. Past leaves are kept
/// out of `current` and `upcoming` but still flag their neighbours.
pub fn report(
    approved: Vec<LeaveWithOwner>,
    reference_date: NaiveDate,
    departments: Vec<String>,
    selected: &DepartmentFilter,
) -> OverlapReport {
    let overlap_flags = overlap_flags(&approved);

    let mut current = Vec::new();
    let mut upcoming = Vec::new();
    for leave in approved {
        if leave.leave.span().contains(reference_date) {
            current.push(leave);
        } else if leave.leave.start_date > reference_date {
            upcoming.push(leave);
        }
    }

    OverlapReport {
        overlap_flags,
        current,
        upcoming,
        departments,
        selected_department: selected.label().to_string(),
    }
}

/// Flags every leave that shares a day with another leave of its department.
///
/// Sweeps each department in start order keeping the furthest end seen so
/// far: a leave starting on or before that end overlaps the leave holding
/// it, and both are flagged.
pub fn overlap_flags(leaves: &[LeaveWithOwner]) -> BTreeMap<u64, bool> {
    let mut by_department: HashMap<&str, Vec<&LeaveWithOwner>> = HashMap::new();
    for leave in leaves {
        by_department
            .entry(leave.department.as_str())
            .or_default()
            .push(leave);
    }

    let mut flags: BTreeMap<u64, bool> = leaves.iter().map(|l| (l.leave.id, false)).collect();

    for group in by_department.values_mut() {
        group.sort_by_key(|l| (l.leave.start_date, l.leave.end_date, l.leave.id));

        let mut furthest: Option<&LeaveWithOwner> = None;
        for &leave in group.iter() {
            if let Some(holder) = furthest {
                if holder.leave.id != leave.leave.id && overlaps(&holder.leave.span(), &leave.leave.span()) {
                    flags.insert(holder.leave.id, true);
                    flags.insert(leave.leave.id, true);
                }
            }
            if furthest.is_none_or(|holder| leave.leave.end_date > holder.leave.end_date) {
                furthest = Some(leave);
            }
        }
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::{LeaveRequest, LeaveStatus};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).expect("valid date")
    }

    fn approved(id: u64, department: &str, start: NaiveDate, end: NaiveDate) -> LeaveWithOwner {
        LeaveWithOwner {
            leave: LeaveRequest {
                id,
                user_id: id * 10,
                start_date: start,
                end_date: end,
                reason: "Holiday".to_string(),
                status: LeaveStatus::Approved,
                created_at: date(1, 1),
                days: ((end - start).num_days() + 1) as i32,
            },
            username: format!("user-{id}"),
            department: department.to_string(),
        }
    }

    fn pairwise(leaves: &[LeaveWithOwner]) -> BTreeMap<u64, bool> {
        leaves
            .iter()
            .map(|l| {
                let flagged = leaves.iter().any(|o| {
                    o.leave.id != l.leave.id
                        && o.department == l.department
                        && overlaps(&l.leave.span(), &o.leave.span())
                });
                (l.leave.id, flagged)
            })
            .collect()
    }

    #[test]
    fn flags_overlaps_within_department_only() {
        let leaves = vec![
            approved(1, "Front Desk", date(3, 1), date(3, 5)),
            approved(2, "Front Desk", date(3, 4), date(3, 8)),
            approved(3, "IT", date(3, 1), date(3, 10)),
        ];

        let flags = overlap_flags(&leaves);
        assert!(flags[&1]);
        assert!(flags[&2]);
        assert!(!flags[&3]);
    }

    #[test]
    fn sweep_matches_pairwise_scan() {
        let leaves = vec![
            approved(1, "Front Desk", date(3, 1), date(3, 20)),
            approved(2, "Front Desk", date(3, 2), date(3, 3)),
            approved(3, "Front Desk", date(3, 4), date(3, 6)),
            approved(4, "Front Desk", date(3, 21), date(3, 22)),
            approved(5, "Front Desk", date(3, 22), date(3, 25)),
            approved(6, "IT", date(3, 1), date(3, 1)),
            approved(7, "IT", date(3, 2), date(3, 2)),
            approved(8, "Kitchen", date(2, 1), date(2, 28)),
            approved(9, "IT", date(2, 25), date(3, 1)),
            approved(10, "Kitchen", date(4, 1), date(4, 2)),
        ];

        assert_eq!(overlap_flags(&leaves), pairwise(&leaves));

        let mut reversed = leaves.clone();
        reversed.reverse();
        assert_eq!(overlap_flags(&reversed), pairwise(&leaves));
    }

    #[test]
    fn partitions_current_and_upcoming() {
        let leaves = vec![
            approved(1, "IT", date(3, 1), date(3, 10)),
            approved(2, "IT", date(3, 10), date(3, 15)),
            approved(3, "IT", date(2, 1), date(2, 3)),
        ];

        let report = report(
            leaves,
            date(3, 6),
            vec!["Front Desk".to_string(), "IT".to_string()],
            &DepartmentFilter::All,
        );

        let current: Vec<u64> = report.current.iter().map(|l| l.leave.id).collect();
        let upcoming: Vec<u64> = report.upcoming.iter().map(|l| l.leave.id).collect();
        assert_eq!(current, vec![1]);
        assert_eq!(upcoming, vec![2]);
        assert_eq!(report.selected_department, "All");
        assert_eq!(report.departments.len(), 2);
    }

    #[test]
    fn past_leaves_still_flag_neighbours() {
        let leaves = vec![
            approved(1, "IT", date(2, 20), date(3, 2)),
            approved(2, "IT", date(3, 1), date(3, 12)),
        ];

        let report = report(leaves, date(3, 5), Vec::new(), &DepartmentFilter::from_query(Some("IT")));

        assert!(report.current.iter().all(|l| l.leave.id != 1));
        assert!(report.upcoming.is_empty());
        assert!(report.overlap_flags[&1]);
        assert!(report.overlap_flags[&2]);
        assert_eq!(report.selected_department, "IT");
    }

    #[test]
    fn department_filter_defaults_to_all() {
        assert_eq!(DepartmentFilter::from_query(None), DepartmentFilter::All);
        assert_eq!(DepartmentFilter::from_query(Some("All")), DepartmentFilter::All);
        assert_eq!(DepartmentFilter::from_query(Some(" ")), DepartmentFilter::All);
        assert_eq!(
            DepartmentFilter::from_query(Some("IT")).department(),
            Some("IT")
        );
    }
}
