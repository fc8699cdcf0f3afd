//! Role and permission commands

use crate::error::{CliError, CliResult};
use crate::output::{self, print_info, print_success, print_warning, OutputFormat};
use access_gate::{GateDecision, PermissionGate};
use access_types::*;
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;

/// Access control subcommands
#[derive(Subcommand)]
pub enum AccessCommands {
    /// List roles by hierarchy level
    Roles,

    /// List the permissions a role holds
    Permissions {
        /// Role (e.g. DRIVER, storage-manager)
        role: String,
    },

    /// Check whether one role may manage another
    CanManage {
        /// Managing role
        manager: String,

        /// Managed role
        target: String,
    },

    /// Evaluate a permission gate for a role
    Gate {
        /// Role of the user; omit for a signed-out user
        #[arg(short, long)]
        role: Option<String>,

        /// Required permissions (e.g. journey:approve)
        #[arg(short, long = "permission", required_unless_present = "min_role")]
        permissions: Vec<String>,

        /// Pass when any listed permission is held, instead of all
        #[arg(long)]
        any: bool,

        /// Require a minimum role level instead of permissions
        #[arg(long, conflicts_with = "permissions")]
        min_role: Option<String>,
    },
}

/// Table row for role display
#[derive(Debug, Serialize, Tabled)]
struct RoleRow {
    role: &'static str,
    label: &'static str,
    level: u8,
    permissions: usize,
}

impl From<Role> for RoleRow {
    fn from(role: Role) -> Self {
        Self {
            role: role.as_str(),
            label: role.label(),
            level: role.level(),
            permissions: role_permissions(role).len(),
        }
    }
}

/// Table row for permission display
#[derive(Debug, Serialize, Tabled)]
struct PermissionRow {
    permission: &'static str,
    resource: &'static str,
    action: &'static str,
}

impl From<Permission> for PermissionRow {
    fn from(p: Permission) -> Self {
        Self {
            permission: p.as_str(),
            resource: p.resource(),
            action: p.action(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ManageCheck {
    manager: Role,
    target: Role,
    allowed: bool,
}

#[derive(Debug, Serialize)]
struct GateCheck {
    role: Option<Role>,
    gate: PermissionGate,
    decision: GateDecision,
}

fn parse_role(s: &str) -> CliResult<Role> {
    Ok(s.parse::<Role>()?)
}

fn build_gate(
    permissions: &[String],
    any: bool,
    min_role: Option<&str>,
) -> CliResult<PermissionGate> {
    if let Some(min) = min_role {
        return Ok(PermissionGate::minimum_role(parse_role(min)?));
    }
    let permissions = permissions
        .iter()
        .map(|p| p.parse::<Permission>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(match permissions.len() {
        0 => return Err(CliError::InvalidInput("no permission given".into())),
        1 => PermissionGate::permission(permissions[0]),
        _ if any => PermissionGate::any(permissions),
        _ => PermissionGate::all(permissions),
    })
}

/// Execute an access command
pub fn execute(command: AccessCommands, format: OutputFormat) -> CliResult<()> {
    match command {
        AccessCommands::Roles => {
            let rows: Vec<RoleRow> = Role::ALL.into_iter().map(RoleRow::from).collect();
            output::print_output(rows, format)
        }

        AccessCommands::Permissions { role } => {
            let role = parse_role(&role)?;
            let rows: Vec<PermissionRow> = role_permissions(role)
                .iter()
                .copied()
                .map(PermissionRow::from)
                .collect();
            output::print_heading(
                &format!("{} ({} permissions)", role.label(), rows.len()),
                format,
            );
            output::print_output(rows, format)
        }

        AccessCommands::CanManage { manager, target } => {
            let (manager, target) = (parse_role(&manager)?, parse_role(&target)?);
            let check = ManageCheck {
                manager,
                target,
                allowed: can_manage_role(manager, target),
            };
            match format {
                OutputFormat::Table if check.allowed => {
                    print_success(&format!("{} can manage {}", check.manager, check.target));
                    Ok(())
                }
                OutputFormat::Table => {
                    print_warning(&format!("{} cannot manage {}", check.manager, check.target));
                    Ok(())
                }
                _ => output::print_single(&check, format),
            }
        }

        AccessCommands::Gate {
            role,
            permissions,
            any,
            min_role,
        } => {
            let role = role.as_deref().map(parse_role).transpose()?;
            let gate = build_gate(&permissions, any, min_role.as_deref())?;
            let decision = gate.decide(role);
            match format {
                OutputFormat::Table => {
                    let who = role.map(|r| r.to_string()).unwrap_or_else(|| "signed-out user".into());
                    if decision.renders() {
                        print_success(&format!("render for {}", who));
                    } else {
                        print_info(&format!("{:?} for {}", decision, who));
                    }
                    Ok(())
                }
                _ => output::print_single(&GateCheck { role, gate, decision }, format),
            }
        }
    }
}
