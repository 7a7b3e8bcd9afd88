//! Hierarchy mutation use-case service.
//!
//! # Responsibility
//! - Validate promote / reassign / demote requests before any transaction.
//! - Pick the reassignment path and translate repository failures.
//! - Emit one metadata-only log event per mutation.
//!
//! # Invariants
//! - Validation failures never reach the repository.
//! - `level` must be a positive integer that fits `u32`.
//! - An employee is never its own supervisor.
//! - Rank ordering between parent and child is not validated.

use crate::model::employee::{Employee, EmployeeId};
use crate::repo::hierarchy_repo::{
    DemoteOutcome, HierarchyRepoError, HierarchyRepository, ReassignOutcome, SeatChangeStep,
};
use crate::service::ErrorKind;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from hierarchy service operations.
#[derive(Debug)]
pub enum HierarchyError {
    /// Level is zero, negative, or too large.
    InvalidLevel(i64),
    /// Employee named as its own supervisor.
    SelfSupervision(EmployeeId),
    /// Unit filter is blank after trim.
    MissingUnit,
    /// Requested supervisor link would close a loop.
    CycleDetected {
        employee_id: EmployeeId,
        parent_id: EmployeeId,
    },
    /// Target employee does not exist.
    EmployeeNotFound(EmployeeId),
    /// Target does not exist or is not currently an official.
    OfficialNotFound(EmployeeId),
    /// Requested supervisor does not exist.
    ParentNotFound(EmployeeId),
    /// Incoming employee vanished mid seat change; everything rolled back.
    IncomingNotFound(EmployeeId),
    /// Repository-level failure; nothing was committed.
    Repo(HierarchyRepoError),
}

impl HierarchyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidLevel(_)
            | Self::SelfSupervision(_)
            | Self::MissingUnit
            | Self::CycleDetected { .. } => ErrorKind::Validation,
            Self::EmployeeNotFound(_) | Self::OfficialNotFound(_) | Self::ParentNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::IncomingNotFound(_) | Self::Repo(_) => ErrorKind::Internal,
        }
    }

    /// Seat-change step that failed, when the failure happened inside one.
    pub fn failed_step(&self) -> Option<SeatChangeStep> {
        match self {
            Self::Repo(HierarchyRepoError::SeatChangeFailed { step, .. }) => Some(*step),
            Self::IncomingNotFound(_) => Some(SeatChangeStep::PromoteIncoming),
            _ => None,
        }
    }
}

impl Display for HierarchyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLevel(level) => {
                write!(f, "level must be a positive integer, got {level}")
            }
            Self::SelfSupervision(id) => write!(f, "employee {id} cannot supervise itself"),
            Self::MissingUnit => write!(f, "unit must not be blank"),
            Self::CycleDetected {
                employee_id,
                parent_id,
            } => write!(
                f,
                "assigning supervisor {parent_id} to employee {employee_id} would create a cycle"
            ),
            Self::EmployeeNotFound(id) => write!(f, "employee not found: {id}"),
            Self::OfficialNotFound(id) => write!(f, "official not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "supervisor not found: {id}"),
            Self::IncomingNotFound(id) => write!(
                f,
                "incoming employee not found: {id}; seat change rolled back"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HierarchyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HierarchyRepoError> for HierarchyError {
    fn from(value: HierarchyRepoError) -> Self {
        match value {
            HierarchyRepoError::EmployeeNotFound(id) => Self::EmployeeNotFound(id),
            HierarchyRepoError::NotAnOfficial(id) => Self::OfficialNotFound(id),
            HierarchyRepoError::ParentNotFound(id) => Self::ParentNotFound(id),
            HierarchyRepoError::CycleDetected {
                employee_id,
                parent_id,
            } => Self::CycleDetected {
                employee_id,
                parent_id,
            },
            HierarchyRepoError::IncomingNotFound(id) => Self::IncomingNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Input of [`HierarchyMutator::promote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromoteRequest {
    pub employee_id: EmployeeId,
    pub level: i64,
    pub parent_id: Option<EmployeeId>,
}

/// Input of [`HierarchyMutator::reassign`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReassignRequest {
    /// Seat being edited, identified by its current occupant.
    pub official_id: EmployeeId,
    /// Occupant after the call. Equal to `official_id` for an in-place edit.
    pub new_employee_id: EmployeeId,
    pub level: i64,
    pub new_parent_id: Option<EmployeeId>,
}

/// Hierarchy mutation service facade.
///
/// The only sanctioned writer of `is_official`, `level` and `parent_id`.
pub struct HierarchyMutator<R: HierarchyRepository> {
    repo: R,
}

impl<R: HierarchyRepository> HierarchyMutator<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Promotes one employee to an official seat.
    ///
    /// Below the top level, every unassigned plain employee of the same unit
    /// is re-linked to the new official in the same transaction.
    pub fn promote(&self, request: &PromoteRequest) -> Result<Employee, HierarchyError> {
        let started_at = Instant::now();
        let result = self.promote_inner(request);
        match &result {
            Ok((employee, adopted)) => info!(
                "event=hierarchy_promote module=hierarchy status=ok employee_id={} level={} adopted={} duration_ms={}",
                employee.id,
                request.level,
                adopted,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("hierarchy_promote", request.employee_id, err, started_at),
        }
        result.map(|(employee, _)| employee)
    }

    /// Edits an official seat.
    ///
    /// Same occupant: level and parent change in place. New occupant: the
    /// outgoing official is demoted and the incoming employee promoted,
    /// with subordinates re-linked, all in one transaction.
    pub fn reassign(&self, request: &ReassignRequest) -> Result<ReassignOutcome, HierarchyError> {
        let started_at = Instant::now();
        let result = self.reassign_inner(request);
        match &result {
            Ok(outcome) => info!(
                "event=hierarchy_reassign module=hierarchy status=ok official_id={} new_employee_id={} case={:?} detached={} relinked={} outgoing_attached={} duration_ms={}",
                request.official_id,
                request.new_employee_id,
                outcome.case,
                outcome.detached,
                outcome.relinked,
                outcome.outgoing_attached,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("hierarchy_reassign", request.official_id, err, started_at),
        }
        result
    }

    /// Removes official status from one employee.
    ///
    /// Direct subordinates become unassigned; nobody is promoted in their
    /// place. The demoted employee keeps their own `parent_id`.
    pub fn demote(&self, employee_id: EmployeeId) -> Result<DemoteOutcome, HierarchyError> {
        let started_at = Instant::now();
        let result = self.repo.demote(employee_id).map_err(HierarchyError::from);
        match &result {
            Ok(outcome) => info!(
                "event=hierarchy_demote module=hierarchy status=ok employee_id={} detached={} duration_ms={}",
                employee_id,
                outcome.detached,
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("hierarchy_demote", employee_id, err, started_at),
        }
        result
    }

    fn promote_inner(&self, request: &PromoteRequest) -> Result<(Employee, usize), HierarchyError> {
        let level = validate_level(request.level)?;
        ensure_not_self(request.employee_id, request.parent_id)?;
        let outcome = self
            .repo
            .promote(request.employee_id, level, request.parent_id)?;
        Ok((outcome.employee, outcome.adopted))
    }

    fn reassign_inner(&self, request: &ReassignRequest) -> Result<ReassignOutcome, HierarchyError> {
        let level = validate_level(request.level)?;
        ensure_not_self(request.new_employee_id, request.new_parent_id)?;

        let result = if request.new_employee_id == request.official_id {
            self.repo
                .update_seat(request.official_id, level, request.new_parent_id)
        } else {
            self.repo.replace_occupant(
                request.official_id,
                request.new_employee_id,
                level,
                request.new_parent_id,
            )
        };

        result.map_err(|err| match err {
            HierarchyRepoError::EmployeeNotFound(id) if id == request.official_id => {
                HierarchyError::OfficialNotFound(id)
            }
            other => other.into(),
        })
    }
}

fn validate_level(level: i64) -> Result<u32, HierarchyError> {
    match u32::try_from(level) {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(HierarchyError::InvalidLevel(level)),
    }
}

fn ensure_not_self(
    employee_id: EmployeeId,
    parent_id: Option<EmployeeId>,
) -> Result<(), HierarchyError> {
    if parent_id == Some(employee_id) {
        return Err(HierarchyError::SelfSupervision(employee_id));
    }
    Ok(())
}

fn log_failure(event: &str, subject_id: EmployeeId, err: &HierarchyError, started_at: Instant) {
    warn!(
        "event={} module=hierarchy status=error subject_id={} error_kind={} failed_step={} duration_ms={} error={}",
        event,
        subject_id,
        err.kind().as_str(),
        err.failed_step().map_or("none", SeatChangeStep::as_str),
        started_at.elapsed().as_millis(),
        err
    );
}

#[cfg(test)]
mod tests {
    use super::{HierarchyError, HierarchyMutator, PromoteRequest, ReassignRequest};
    use crate::model::employee::{Employee, EmployeeId};
    use crate::model::hierarchy::ResolvedEmployee;
    use crate::repo::hierarchy_repo::{
        DemoteOutcome, HierarchyRepoError, HierarchyRepoResult, HierarchyRepository,
        PromoteOutcome, ReassignCase, ReassignOutcome,
    };
    use crate::service::ErrorKind;
    use std::cell::RefCell;

    /// Records which write path was taken; reads are never used here.
    #[derive(Default)]
    struct RecordingRepo {
        calls: RefCell<Vec<&'static str>>,
        fail_with_missing: Option<EmployeeId>,
    }

    impl RecordingRepo {
        fn record(&self, call: &'static str) {
            self.calls.borrow_mut().push(call);
        }

        fn outcome(case: ReassignCase) -> ReassignOutcome {
            ReassignOutcome {
                case,
                detached: 0,
                relinked: 0,
                outgoing_attached: false,
            }
        }
    }

    impl HierarchyRepository for &RecordingRepo {
        fn promote(
            &self,
            employee_id: EmployeeId,
            level: u32,
            parent_id: Option<EmployeeId>,
        ) -> HierarchyRepoResult<PromoteOutcome> {
            self.record("promote");
            Ok(PromoteOutcome {
                employee: Employee {
                    id: employee_id,
                    nip: "198001012005011001".to_string(),
                    name: "Stub".to_string(),
                    position: String::new(),
                    unit: "Ops".to_string(),
                    is_official: true,
                    level: Some(level),
                    parent_id,
                    interim: None,
                },
                adopted: 0,
            })
        }

        fn update_seat(
            &self,
            _official_id: EmployeeId,
            _level: u32,
            _parent_id: Option<EmployeeId>,
        ) -> HierarchyRepoResult<ReassignOutcome> {
            self.record("update_seat");
            Ok(RecordingRepo::outcome(ReassignCase::SameOccupant))
        }

        fn replace_occupant(
            &self,
            official_id: EmployeeId,
            _incoming_id: EmployeeId,
            _level: u32,
            _parent_id: Option<EmployeeId>,
        ) -> HierarchyRepoResult<ReassignOutcome> {
            self.record("replace_occupant");
            if self.fail_with_missing == Some(official_id) {
                return Err(HierarchyRepoError::EmployeeNotFound(official_id));
            }
            Ok(RecordingRepo::outcome(ReassignCase::NewOccupant))
        }

        fn demote(&self, _employee_id: EmployeeId) -> HierarchyRepoResult<DemoteOutcome> {
            self.record("demote");
            Ok(DemoteOutcome { detached: 0 })
        }

        fn list_officials(&self) -> HierarchyRepoResult<Vec<ResolvedEmployee>> {
            Ok(Vec::new())
        }

        fn get_official(&self, _id: EmployeeId) -> HierarchyRepoResult<Option<ResolvedEmployee>> {
            Ok(None)
        }

        fn list_promotable(&self) -> HierarchyRepoResult<Vec<Employee>> {
            Ok(Vec::new())
        }

        fn list_subordinates(&self, _id: EmployeeId) -> HierarchyRepoResult<Vec<ResolvedEmployee>> {
            Ok(Vec::new())
        }

        fn list_by_unit(
            &self,
            _unit: &str,
            _exclude_id: Option<EmployeeId>,
        ) -> HierarchyRepoResult<Vec<Employee>> {
            Ok(Vec::new())
        }

        fn snapshot(&self) -> HierarchyRepoResult<Vec<Employee>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn invalid_level_is_rejected_before_repository() {
        let repo = RecordingRepo::default();
        let mutator = HierarchyMutator::new(&repo);

        for level in [0, -3, i64::from(u32::MAX) + 1] {
            let err = mutator
                .promote(&PromoteRequest {
                    employee_id: 1,
                    level,
                    parent_id: None,
                })
                .unwrap_err();
            assert!(matches!(err, HierarchyError::InvalidLevel(value) if value == level));
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert!(repo.calls.borrow().is_empty());
    }

    #[test]
    fn self_supervision_is_rejected_before_repository() {
        let repo = RecordingRepo::default();
        let mutator = HierarchyMutator::new(&repo);

        let err = mutator
            .reassign(&ReassignRequest {
                official_id: 1,
                new_employee_id: 2,
                level: 2,
                new_parent_id: Some(2),
            })
            .unwrap_err();
        assert!(matches!(err, HierarchyError::SelfSupervision(2)));
        assert!(repo.calls.borrow().is_empty());
    }

    #[test]
    fn reassign_picks_path_by_occupant() {
        let repo = RecordingRepo::default();
        let mutator = HierarchyMutator::new(&repo);

        let same = mutator
            .reassign(&ReassignRequest {
                official_id: 4,
                new_employee_id: 4,
                level: 3,
                new_parent_id: None,
            })
            .unwrap();
        assert_eq!(same.case, ReassignCase::SameOccupant);

        let changed = mutator
            .reassign(&ReassignRequest {
                official_id: 4,
                new_employee_id: 5,
                level: 3,
                new_parent_id: None,
            })
            .unwrap();
        assert_eq!(changed.case, ReassignCase::NewOccupant);
        assert_eq!(*repo.calls.borrow(), vec!["update_seat", "replace_occupant"]);
    }

    #[test]
    fn missing_seat_maps_to_official_not_found() {
        let repo = RecordingRepo {
            fail_with_missing: Some(9),
            ..RecordingRepo::default()
        };
        let mutator = HierarchyMutator::new(&repo);

        let err = mutator
            .reassign(&ReassignRequest {
                official_id: 9,
                new_employee_id: 5,
                level: 2,
                new_parent_id: None,
            })
            .unwrap_err();
        assert!(matches!(err, HierarchyError::OfficialNotFound(9)));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn incoming_not_found_is_internal() {
        let err = HierarchyError::from(HierarchyRepoError::IncomingNotFound(3));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.failed_step().is_some());
    }
}
