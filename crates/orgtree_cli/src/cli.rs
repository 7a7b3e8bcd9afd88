//! Command-line argument definitions.

use clap::{Args, Parser, Subcommand};
use orgtree_core::EmployeeId;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "orgtree")]
#[command(about = "Maintain the official hierarchy of an employee registry")]
#[command(version)]
pub struct Cli {
    /// SQLite database file. Overrides ORGTREE_DB_PATH.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log level. Overrides ORGTREE_LOG_LEVEL. Needs a log directory.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Absolute directory for log files. Overrides ORGTREE_LOG_DIR.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Also print warnings to stderr. Overrides ORGTREE_LOG_STDERR.
    #[arg(long, global = true)]
    pub log_stderr: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Employee directory")]
    Employee {
        #[command(subcommand)]
        cmd: EmployeeCommands,
    },

    #[command(about = "Official seats and the supervisor tree")]
    Official {
        #[command(subcommand)]
        cmd: OfficialCommands,
    },

    #[command(about = "Unit listings")]
    Unit {
        #[command(subcommand)]
        cmd: UnitCommands,
    },

    #[command(about = "Report hierarchy rule violations")]
    Audit,
}

#[derive(Debug, Subcommand)]
pub enum EmployeeCommands {
    #[command(about = "Register a plain, unassigned employee")]
    Add(NewEmployeeArgs),

    #[command(about = "List every employee by id")]
    List,

    #[command(about = "Show one employee")]
    Show { id: EmployeeId },

    #[command(about = "Set an interim (acting) assignment")]
    InterimSet {
        id: EmployeeId,
        #[arg(long)]
        title: String,
        #[arg(long)]
        unit: String,
    },

    #[command(about = "Clear the interim assignment")]
    InterimClear { id: EmployeeId },
}

#[derive(Debug, Args)]
pub struct NewEmployeeArgs {
    /// 18-digit staff registration number.
    #[arg(long)]
    pub nip: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub unit: String,
    #[arg(long, default_value = "")]
    pub position: String,
}

#[derive(Debug, Subcommand)]
pub enum OfficialCommands {
    #[command(about = "Promote an employee to an official seat")]
    Add {
        employee_id: EmployeeId,
        #[arg(long, allow_negative_numbers = true)]
        level: i64,
        #[arg(long)]
        parent: Option<EmployeeId>,
    },

    #[command(about = "Edit a seat or hand it to another employee")]
    Update {
        /// Current occupant of the seat.
        official_id: EmployeeId,
        /// New occupant. Defaults to the current one.
        #[arg(long)]
        employee: Option<EmployeeId>,
        #[arg(long, allow_negative_numbers = true)]
        level: i64,
        #[arg(long)]
        parent: Option<EmployeeId>,
    },

    #[command(about = "Demote an official; subordinates become unassigned")]
    Remove { id: EmployeeId },

    #[command(about = "List officials by level")]
    List,

    #[command(about = "Show one official")]
    Show { id: EmployeeId },

    #[command(about = "List direct subordinates")]
    Subordinates { id: EmployeeId },

    #[command(about = "List employees available for promotion")]
    Available,
}

#[derive(Debug, Subcommand)]
pub enum UnitCommands {
    #[command(about = "List the members of a unit by name")]
    Members {
        unit: String,
        #[arg(long)]
        exclude: Option<EmployeeId>,
    },
}
