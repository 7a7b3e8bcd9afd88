//! Employee domain model.
//!
//! # Responsibility
//! - Define the canonical employee row and its registration input.
//! - Validate record shape before persistence and after decoding.
//!
//! # Invariants
//! - `level` is set iff `is_official` is true, and is at least 1.
//! - An employee never supervises itself.
//! - Interim title and unit are set together or not at all.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static NIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{18}$").expect("valid nip regex"));

/// Stable employee identifier (SQLite rowid).
pub type EmployeeId = i64;

/// Temporary ("acting") assignment carried next to the permanent position.
///
/// Does not participate in hierarchy invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterimAssignment {
    /// Acting position title.
    pub title: String,
    /// Unit the acting position belongs to.
    pub unit: String,
}

/// One person in the employee directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    /// Staff registration number, 18 digits.
    pub nip: String,
    pub name: String,
    /// Permanent position title.
    pub position: String,
    /// Organizational division label. Scopes automatic re-linking.
    pub unit: String,
    /// True iff the employee holds a structural (manager) seat.
    pub is_official: bool,
    /// Rank of the seat, 1 is topmost. Present iff `is_official`.
    pub level: Option<u32>,
    /// Direct supervisor. `None` means unassigned (or top of the tree).
    pub parent_id: Option<EmployeeId>,
    pub interim: Option<InterimAssignment>,
}

impl Employee {
    /// Checks the hierarchy-related shape of this row.
    ///
    /// Rank ordering against the parent is not checked here; see
    /// [`crate::model::hierarchy::find_violations`].
    pub fn validate(&self) -> Result<(), EmployeeValidationError> {
        match (self.is_official, self.level) {
            (true, None) | (true, Some(0)) => {
                return Err(EmployeeValidationError::SeatWithoutLevel(self.id));
            }
            (false, Some(level)) => {
                return Err(EmployeeValidationError::LevelWithoutSeat {
                    employee_id: self.id,
                    level,
                });
            }
            _ => {}
        }
        if self.parent_id == Some(self.id) {
            return Err(EmployeeValidationError::SelfSupervised(self.id));
        }
        Ok(())
    }

    /// Returns whether this is a plain employee with no supervisor.
    pub fn is_unassigned(&self) -> bool {
        !self.is_official && self.parent_id.is_none()
    }
}

/// Registration input for a new directory row.
///
/// Carries no hierarchy fields: new rows always start as unassigned plain
/// employees, and only the hierarchy mutator may change that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub nip: String,
    pub name: String,
    pub position: String,
    pub unit: String,
}

impl NewEmployee {
    pub fn new(
        nip: impl Into<String>,
        name: impl Into<String>,
        position: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            nip: nip.into(),
            name: name.into(),
            position: position.into(),
            unit: unit.into(),
        }
    }

    /// Returns a trimmed copy, or the first field that fails validation.
    pub fn normalized(&self) -> Result<Self, EmployeeValidationError> {
        let nip = self.nip.trim();
        if !NIP_RE.is_match(nip) {
            return Err(EmployeeValidationError::InvalidNip(nip.to_string()));
        }
        let name = non_blank(&self.name, "name")?;
        let unit = non_blank(&self.unit, "unit")?;
        Ok(Self {
            nip: nip.to_string(),
            name,
            position: self.position.trim().to_string(),
            unit,
        })
    }
}

/// Validation failures for employee records and registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeValidationError {
    /// NIP is not exactly 18 ASCII digits.
    InvalidNip(String),
    /// Required text field is blank after trim.
    BlankField(&'static str),
    /// Official without a positive level.
    SeatWithoutLevel(EmployeeId),
    /// Plain employee carrying a level.
    LevelWithoutSeat { employee_id: EmployeeId, level: u32 },
    /// Employee listed as its own supervisor.
    SelfSupervised(EmployeeId),
}

impl Display for EmployeeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNip(value) => write!(f, "nip must be 18 digits, got `{value}`"),
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::SeatWithoutLevel(id) => write!(f, "official {id} has no positive level"),
            Self::LevelWithoutSeat { employee_id, level } => write!(
                f,
                "employee {employee_id} is not an official but has level {level}"
            ),
            Self::SelfSupervised(id) => write!(f, "employee {id} cannot supervise itself"),
        }
    }
}

impl Error for EmployeeValidationError {}

pub(crate) fn non_blank(
    value: &str,
    field: &'static str,
) -> Result<String, EmployeeValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EmployeeValidationError::BlankField(field));
    }
    Ok(trimmed.to_string())
}
