//! Dispatch of parsed commands onto core services.

use crate::cli::{Cli, Commands, EmployeeCommands, OfficialCommands, UnitCommands};
use log::debug;
use orgtree_core::{
    init_logging, open_db_with, ConfigError, CoreConfig, DbError, DirectoryError,
    EmployeeDirectory, ErrorKind, HierarchyError, HierarchyMutator, HierarchyReader,
    LoggingError, NewEmployee, PromoteRequest, ReassignRequest, SqliteEmployeeRepository,
    SqliteHierarchyRepository,
};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Any failure surfaced to the terminal.
#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Logging(LoggingError),
    Db(DbError),
    Directory(DirectoryError),
    Hierarchy(HierarchyError),
    Output(serde_json::Error),
}

impl CliError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Directory(err) => err.kind(),
            Self::Hierarchy(err) => err.kind(),
            Self::Config(_) | Self::Logging(_) => ErrorKind::Validation,
            Self::Db(_) | Self::Output(_) => ErrorKind::Internal,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::NotFound => 2,
            ErrorKind::Validation => 3,
            ErrorKind::Internal => 1,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Directory(err) => write!(f, "{err}"),
            Self::Hierarchy(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to render output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Directory(err) => Some(err),
            Self::Hierarchy(err) => Some(err),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<DirectoryError> for CliError {
    fn from(value: DirectoryError) -> Self {
        Self::Directory(value)
    }
}

impl From<HierarchyError> for CliError {
    fn from(value: HierarchyError) -> Self {
        Self::Hierarchy(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

/// Environment first, then command-line flags on top.
pub fn resolve_config(cli: &Cli) -> Result<CoreConfig, CliError> {
    let mut config = CoreConfig::from_env()?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    if cli.log_stderr {
        config.log_stderr = true;
    }
    if config.log_dir.is_none() {
        if let Some(level) = &cli.log_level {
            return Err(without_log_dir("--log-level", level).into());
        }
        if cli.log_stderr {
            return Err(without_log_dir("--log-stderr", "true").into());
        }
    }
    Ok(config)
}

fn without_log_dir(key: &'static str, value: &str) -> ConfigError {
    ConfigError {
        key,
        value: value.to_string(),
        reason: "file logging is off; set --log-dir or ORGTREE_LOG_DIR",
    }
}

/// Runs one command and returns its JSON rendering.
pub fn run(cli: &Cli) -> Result<String, CliError> {
    let config = resolve_config(cli)?;
    if let Some(logging) = config.logging() {
        init_logging(&logging)?;
    }
    debug!("event=cli_start module=cli status=start");

    let conn = open_db_with(&config.db_path, &config.db_options())?;
    match &cli.command {
        Commands::Employee { cmd } => {
            let repo = SqliteEmployeeRepository::try_new(&conn).map_err(DirectoryError::from)?;
            run_employee(&EmployeeDirectory::new(repo), cmd)
        }
        Commands::Official { cmd } => {
            let repo = SqliteHierarchyRepository::try_new(&conn).map_err(HierarchyError::from)?;
            run_official(repo, cmd)
        }
        Commands::Unit {
            cmd: UnitCommands::Members { unit, exclude },
        } => {
            let repo = SqliteHierarchyRepository::try_new(&conn).map_err(HierarchyError::from)?;
            render(&HierarchyReader::new(repo).list_by_unit(unit, *exclude)?)
        }
        Commands::Audit => {
            let repo = SqliteHierarchyRepository::try_new(&conn).map_err(HierarchyError::from)?;
            render(&HierarchyReader::new(repo).audit()?)
        }
    }
}

fn run_employee(
    directory: &EmployeeDirectory<SqliteEmployeeRepository<'_>>,
    cmd: &EmployeeCommands,
) -> Result<String, CliError> {
    match cmd {
        EmployeeCommands::Add(args) => render(&directory.register(&NewEmployee {
            nip: args.nip.clone(),
            name: args.name.clone(),
            position: args.position.clone(),
            unit: args.unit.clone(),
        })?),
        EmployeeCommands::List => render(&directory.list()?),
        EmployeeCommands::Show { id } => render(&directory.get(*id)?),
        EmployeeCommands::InterimSet { id, title, unit } => {
            render(&directory.assign_interim(*id, title.as_str(), unit.as_str())?)
        }
        EmployeeCommands::InterimClear { id } => render(&directory.clear_interim(*id)?),
    }
}

fn run_official(
    repo: SqliteHierarchyRepository<'_>,
    cmd: &OfficialCommands,
) -> Result<String, CliError> {
    match cmd {
        OfficialCommands::Add {
            employee_id,
            level,
            parent,
        } => render(&HierarchyMutator::new(repo).promote(&PromoteRequest {
            employee_id: *employee_id,
            level: *level,
            parent_id: *parent,
        })?),
        OfficialCommands::Update {
            official_id,
            employee,
            level,
            parent,
        } => render(&HierarchyMutator::new(repo).reassign(&ReassignRequest {
            official_id: *official_id,
            new_employee_id: employee.unwrap_or(*official_id),
            level: *level,
            new_parent_id: *parent,
        })?),
        OfficialCommands::Remove { id } => render(&HierarchyMutator::new(repo).demote(*id)?),
        OfficialCommands::List => render(&HierarchyReader::new(repo).list_officials()?),
        OfficialCommands::Show { id } => render(&HierarchyReader::new(repo).get_official(*id)?),
        OfficialCommands::Subordinates { id } => {
            render(&HierarchyReader::new(repo).list_subordinates(*id)?)
        }
        OfficialCommands::Available => render(&HierarchyReader::new(repo).list_promotable()?),
    }
}

fn render<T: Serialize>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}
