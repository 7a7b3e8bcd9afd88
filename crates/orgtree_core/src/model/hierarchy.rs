//! Hierarchy read models and pure consistency checks.
//!
//! # Responsibility
//! - Define the "employee with parent resolved" read model.
//! - Detect invariant violations over an in-memory snapshot of rows.
//!
//! # Invariants
//! - Checks never mutate input and never depend on storage.
//! - Reported violations are ordered deterministically by employee id.

use crate::model::employee::{Employee, EmployeeId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Employee row together with its direct supervisor, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEmployee {
    #[serde(flatten)]
    pub employee: Employee,
    pub parent: Option<Employee>,
}

/// One broken hierarchy rule found by [`find_violations`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HierarchyViolation {
    /// `parent_id` points at no existing employee.
    DanglingParent {
        employee_id: EmployeeId,
        parent_id: EmployeeId,
    },
    /// Official without a positive level.
    SeatWithoutLevel { employee_id: EmployeeId },
    /// Plain employee carrying a level.
    LevelWithoutSeat { employee_id: EmployeeId, level: u32 },
    /// Following `parent_id` from any member loops back. Members sorted.
    Cycle { members: Vec<EmployeeId> },
    /// Official reporting to an official of equal or lower rank.
    RankInversion {
        employee_id: EmployeeId,
        employee_level: u32,
        parent_id: EmployeeId,
        parent_level: u32,
    },
}

impl HierarchyViolation {
    /// Soft violations are tolerated by the store and the mutator.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::RankInversion { .. })
    }
}

/// Scans a snapshot of employees and reports every hierarchy violation.
///
/// Per-row violations come first in id order, followed by cycles ordered by
/// their smallest member.
pub fn find_violations(employees: &[Employee]) -> Vec<HierarchyViolation> {
    let by_id: HashMap<EmployeeId, &Employee> =
        employees.iter().map(|employee| (employee.id, employee)).collect();
    let mut ordered: Vec<&Employee> = employees.iter().collect();
    ordered.sort_by_key(|employee| employee.id);

    let mut violations = Vec::new();
    for employee in &ordered {
        match (employee.is_official, employee.level) {
            (true, None) | (true, Some(0)) => {
                violations.push(HierarchyViolation::SeatWithoutLevel {
                    employee_id: employee.id,
                });
            }
            (false, Some(level)) => violations.push(HierarchyViolation::LevelWithoutSeat {
                employee_id: employee.id,
                level,
            }),
            _ => {}
        }

        let Some(parent_id) = employee.parent_id else {
            continue;
        };
        let Some(parent) = by_id.get(&parent_id) else {
            violations.push(HierarchyViolation::DanglingParent {
                employee_id: employee.id,
                parent_id,
            });
            continue;
        };

        if let (true, Some(employee_level), true, Some(parent_level)) = (
            employee.is_official,
            employee.level,
            parent.is_official,
            parent.level,
        ) {
            if parent_level >= employee_level && parent.id != employee.id {
                violations.push(HierarchyViolation::RankInversion {
                    employee_id: employee.id,
                    employee_level,
                    parent_id,
                    parent_level,
                });
            }
        }
    }

    violations.extend(
        find_cycles(&ordered, &by_id)
            .into_iter()
            .map(|members| HierarchyViolation::Cycle { members }),
    );
    violations
}

fn find_cycles(
    ordered: &[&Employee],
    by_id: &HashMap<EmployeeId, &Employee>,
) -> Vec<Vec<EmployeeId>> {
    let mut done: HashSet<EmployeeId> = HashSet::new();
    let mut cycles = Vec::new();

    for employee in ordered {
        if done.contains(&employee.id) {
            continue;
        }

        let mut path: Vec<EmployeeId> = Vec::new();
        let mut position: HashMap<EmployeeId, usize> = HashMap::new();
        let mut cursor = Some(employee.id);
        while let Some(current) = cursor {
            if done.contains(&current) {
                break;
            }
            if let Some(&start) = position.get(&current) {
                let mut members = path[start..].to_vec();
                members.sort_unstable();
                cycles.push(members);
                break;
            }
            position.insert(current, path.len());
            path.push(current);
            cursor = by_id.get(&current).and_then(|row| row.parent_id);
        }
        done.extend(path);
    }

    cycles.sort_by_key(|members| members.first().copied());
    cycles
}
