//! Read-only hierarchy queries.
//!
//! # Responsibility
//! - Serve the official list, subordinate lists and unit listings.
//! - Audit the stored hierarchy against the structural rules.
//!
//! # Invariants
//! - Never writes.
//! - Every list has a total, deterministic order with `id` as tie-break.

use crate::model::employee::{Employee, EmployeeId};
use crate::model::hierarchy::{find_violations, HierarchyViolation, ResolvedEmployee};
use crate::repo::hierarchy_repo::HierarchyRepository;
use crate::service::hierarchy_mutator::HierarchyError;
use log::warn;

/// Hierarchy query service facade.
pub struct HierarchyReader<R: HierarchyRepository> {
    repo: R,
}

impl<R: HierarchyRepository> HierarchyReader<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Officials ordered by level, then id. Top level first.
    pub fn list_officials(&self) -> Result<Vec<ResolvedEmployee>, HierarchyError> {
        Ok(self.repo.list_officials()?)
    }

    /// One official with their supervisor resolved.
    pub fn get_official(&self, id: EmployeeId) -> Result<ResolvedEmployee, HierarchyError> {
        self.repo
            .get_official(id)?
            .ok_or(HierarchyError::OfficialNotFound(id))
    }

    /// Employees who are not officials, ordered by name, then id.
    pub fn list_promotable(&self) -> Result<Vec<Employee>, HierarchyError> {
        Ok(self.repo.list_promotable()?)
    }

    /// Direct subordinates ordered by id.
    ///
    /// An unknown id has no subordinates and yields an empty list.
    pub fn list_subordinates(
        &self,
        id: EmployeeId,
    ) -> Result<Vec<ResolvedEmployee>, HierarchyError> {
        Ok(self.repo.list_subordinates(id)?)
    }

    /// Members of one unit ordered by name, then id, optionally without one employee.
    pub fn list_by_unit(
        &self,
        unit: &str,
        exclude_id: Option<EmployeeId>,
    ) -> Result<Vec<Employee>, HierarchyError> {
        let unit = unit.trim();
        if unit.is_empty() {
            return Err(HierarchyError::MissingUnit);
        }
        Ok(self.repo.list_by_unit(unit, exclude_id)?)
    }

    /// Reports every structural violation in the current data.
    ///
    /// Rank inversions are reported but are soft: mutations allow them.
    pub fn audit(&self) -> Result<Vec<HierarchyViolation>, HierarchyError> {
        let snapshot = self.repo.snapshot()?;
        let violations = find_violations(&snapshot);
        let hard = violations.iter().filter(|item| !item.is_soft()).count();
        if hard > 0 {
            warn!(
                "event=hierarchy_audit module=hierarchy status=violations employees={} hard={} soft={}",
                snapshot.len(),
                hard,
                violations.len() - hard
            );
        }
        Ok(violations)
    }
}
