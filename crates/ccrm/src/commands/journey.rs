//! Journey workflow commands
//!
//! Each command loads the journey's progress from the journey API, acts
//! on it through the workflow controller and prints the result.

use crate::error::{CliError, CliResult};
use crate::output::{self, cell, ConsoleNotifier, OutputFormat};
use access_types::Role;
use clap::{Args, Subcommand};
use journey_engine::role_view::FieldView;
use journey_engine::*;
use journey_types::*;
use serde::Serialize;
use tabled::Tabled;

/// Who is acting
#[derive(Args, Debug, Clone)]
pub struct ActorArgs {
    /// Role of the acting user (DRIVER, MOVER, MANAGER, ...)
    #[arg(short, long, env = "CCRM_ROLE")]
    role: String,

    /// User id recorded with the action
    #[arg(short, long, env = "CCRM_USER")]
    user: Option<String>,
}

impl ActorArgs {
    fn actor(&self) -> CliResult<Actor> {
        let actor = Actor::new(self.role.parse::<Role>()?);
        Ok(match &self.user {
            Some(user) => actor.with_user_id(user.clone()),
            None => actor,
        })
    }
}

/// Journey subcommands
#[derive(Subcommand)]
pub enum JourneyCommands {
    /// List the four field steps and what each role fills in
    Steps {
        /// Only show this role's sub-forms
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Show a journey's step timeline
    Progress {
        /// Journey ID
        journey_id: String,
    },

    /// Show a journey as a role sees it
    View {
        /// Journey ID
        journey_id: String,

        /// Role to render the view for
        #[arg(short, long, env = "CCRM_ROLE")]
        role: String,
    },

    /// Start a pending step
    Start {
        journey_id: String,

        /// Step ordinal (1-4) or phase id (e.g. points_a)
        step: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Record one field of the role's sub-form
    Record {
        journey_id: String,

        /// Step ordinal (1-4) or phase id
        step: String,

        /// Field key (see `ccrm journey steps`)
        field: String,

        /// Value; checklists are comma separated, flags yes/no
        value: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Attach a photo or video reference to a step
    Media {
        journey_id: String,

        /// Step ordinal (1-4) or phase id
        step: String,

        /// Storage reference of the captured file
        reference: String,

        /// photo or video
        #[arg(short, long, default_value = "photo")]
        kind: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Submit the role's sub-form for a step
    Complete {
        journey_id: String,

        /// Step ordinal (1-4) or phase id
        step: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Approve a completed step (managers only)
    Approve {
        journey_id: String,

        /// Step ordinal (1-4) or phase id
        step: String,

        #[command(flatten)]
        actor: ActorArgs,
    },
}

// ── Rows ─────────────────────────────────────────────────────────────

/// Table row for step definitions
#[derive(Debug, Serialize, Tabled)]
struct StepRow {
    ordinal: u8,
    step: &'static str,
    label: &'static str,
    role: FieldRole,
    required: String,
    optional: String,
    media: MediaRequirement,
}

fn step_rows(role: Option<FieldRole>) -> Vec<StepRow> {
    WORKFLOW_STEPS
        .iter()
        .flat_map(|def| {
            def.sub_forms
                .iter()
                .filter(move |s| role.map_or(true, |r| s.role == r))
                .map(move |s| StepRow {
                    ordinal: def.ordinal,
                    step: def.id.phase_id(),
                    label: def.label,
                    role: s.role,
                    required: join_keys(s.fields.iter().filter(|f| f.required)),
                    optional: join_keys(s.fields.iter().filter(|f| !f.required)),
                    media: s.media,
                })
        })
        .collect()
}

fn join_keys<'a>(fields: impl Iterator<Item = &'a FieldSpec>) -> String {
    let keys: Vec<String> = fields.map(|f| format!("{} ({})", f.key, f.kind)).collect();
    if keys.is_empty() {
        "-".to_string()
    } else {
        keys.join(", ")
    }
}

/// Table row for the step timeline
#[derive(Debug, Serialize, Tabled)]
struct TimelineRow {
    #[tabled(rename = "#")]
    ordinal: u8,
    step: &'static str,
    status: StepStatus,
    completed_by: String,
    submitted: String,
    media: usize,
}

impl From<&TimelineEntry> for TimelineRow {
    fn from(e: &TimelineEntry) -> Self {
        let submitted: Vec<String> = e.submitted.iter().map(|r| r.to_string()).collect();
        Self {
            ordinal: e.ordinal,
            step: e.label,
            status: e.status,
            completed_by: cell(e.completed_by),
            submitted: if submitted.is_empty() {
                "-".to_string()
            } else {
                submitted.join(", ")
            },
            media: e.media_count,
        }
    }
}

/// Table row for a sub-form's fields
#[derive(Debug, Serialize, Tabled)]
struct FieldRow {
    field: &'static str,
    label: &'static str,
    kind: FieldKind,
    required: bool,
    value: String,
}

impl From<&FieldView> for FieldRow {
    fn from(f: &FieldView) -> Self {
        Self {
            field: f.key,
            label: f.label,
            kind: f.kind,
            required: f.required,
            value: cell(f.value.as_ref()),
        }
    }
}

// ── Execution ────────────────────────────────────────────────────────

type CliController = JourneyWorkflowController<HttpJourneyApi, ConsoleNotifier>;

fn parse_step(s: &str) -> CliResult<StepId> {
    StepId::parse(s).ok_or_else(|| {
        CliError::InvalidInput(format!(
            "unknown step '{}': use 1-4 or ready_to_go, points_a, new_location, back_to_dispatcher",
            s
        ))
    })
}

/// Load a journey into a controller
async fn open(
    config: &EngineConfig,
    journey_id: &str,
    allow_fallback: bool,
) -> CliResult<CliController> {
    let journey = JourneyId::new(journey_id);
    let mut workflow = config.workflow.clone();
    workflow.fallback_on_load_failure &= allow_fallback;

    let api = HttpJourneyApi::new(&config.api)?;
    let controller =
        JourneyWorkflowController::new(journey.clone(), api, ConsoleNotifier).with_config(workflow);
    controller.load_instance(&journey).await?;
    Ok(controller)
}

/// Dispatch one action and print the actor's view of the step
async fn act(
    config: &EngineConfig,
    journey_id: &str,
    actor: Actor,
    action: WorkflowAction,
    format: OutputFormat,
) -> CliResult<()> {
    let controller = open(config, journey_id, true).await?;
    let step = action.step();
    let name = action.name();
    let role = actor.role;

    tracing::debug!(journey = journey_id, actor = %actor, action = name, "Dispatching");
    match controller.dispatch(ActionRequest::new(actor, action)).await? {
        DispatchOutcome::PersistFailed { error, .. } => {
            return Err(CliError::NotPersisted {
                action: name.to_string(),
                error,
            })
        }
        DispatchOutcome::Persisted { .. } | DispatchOutcome::Duplicate { .. } => {}
    }

    // Only field roles get past dispatch, and they act in every step
    print_step_view(&controller.step_view(step, role)?, format)
}

fn print_step_view(view: &StepView, format: OutputFormat) -> CliResult<()> {
    if format != OutputFormat::Table {
        return output::print_single(view, format);
    }
    output::print_heading(
        &format!(
            "{}. {} [{}] as {}",
            view.step.ordinal(),
            view.label,
            view.status,
            view.role
        ),
        format,
    );
    output::print_output(view.fields.iter().map(FieldRow::from).collect(), format)?;
    if view.media != MediaRequirement::None {
        println!(
            "media: {} required ({}), {} captured",
            view.media, view.media_hint, view.media_captured
        );
    }
    let actions: Vec<String> = view.actions.iter().map(|a| format!("{:?}", a)).collect();
    println!("actions: {}", cell((!actions.is_empty()).then(|| actions.join(", "))));
    Ok(())
}

fn print_rendered(view: &RenderedView, format: OutputFormat) -> CliResult<()> {
    if format != OutputFormat::Table {
        return output::print_single(view, format);
    }
    match view {
        RenderedView::Field(panel) => {
            match &panel.current {
                Some(current) => print_step_view(current, format)?,
                None => output::print_info("Journey finished"),
            }
            if !panel.approvals.is_empty() {
                let steps: Vec<String> = panel.approvals.iter().map(|s| s.to_string()).collect();
                println!("awaiting approval: {}", steps.join(", "));
            }
        }
        RenderedView::Office(panel) => {
            output::print_heading(
                &format!(
                    "{} view, current step {}{}",
                    panel.role.label(),
                    panel.current_step,
                    if panel.finished { " (finished)" } else { "" }
                ),
                format,
            );
            output::print_output(panel.timeline.iter().map(TimelineRow::from).collect(), format)?;
            if let Some(audit) = &panel.audit {
                println!("audit records this session: {}", audit.len());
            }
        }
    }
    Ok(())
}

/// Execute a journey command
pub async fn execute(
    command: JourneyCommands,
    config: &EngineConfig,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        JourneyCommands::Steps { role } => {
            let role = match role {
                Some(r) => Some(FieldRole::from_role(r.parse::<Role>()?).ok_or_else(|| {
                    CliError::InvalidInput(format!("{} has no sub-form in any step", r))
                })?),
                None => None,
            };
            output::print_output(step_rows(role), format)
        }

        JourneyCommands::Progress { journey_id } => {
            let controller = open(config, &journey_id, false).await?;
            if format != OutputFormat::Table {
                return output::print_single(&controller.progress(), format);
            }
            let instance = controller.instance();
            output::print_heading(
                &format!(
                    "Journey {}: step {} of {}",
                    instance.journey_id,
                    instance.current_ordinal().min(STEP_COUNT as u8),
                    STEP_COUNT
                ),
                format,
            );
            let view = controller.view(Role::Auditor);
            output::print_output(view.timeline().iter().map(TimelineRow::from).collect(), format)
        }

        JourneyCommands::View { journey_id, role } => {
            let role = role.parse::<Role>()?;
            let controller = open(config, &journey_id, false).await?;
            print_rendered(&controller.view(role), format)
        }

        JourneyCommands::Start {
            journey_id,
            step,
            actor,
        } => {
            let action = WorkflowAction::Start {
                step: parse_step(&step)?,
            };
            act(config, &journey_id, actor.actor()?, action, format).await
        }

        JourneyCommands::Record {
            journey_id,
            step,
            field,
            value,
            actor,
        } => {
            let step = parse_step(&step)?;
            let actor = actor.actor()?;
            let kind = FieldRole::from_role(actor.role)
                .and_then(|r| step.definition().sub_form(r))
                .and_then(|s| s.field(&field))
                .map(|f| f.kind)
                .ok_or_else(|| {
                    CliError::InvalidInput(format!(
                        "{} has no field '{}' in step {}",
                        actor.role, field, step
                    ))
                })?;
            let value = FieldValue::parse_as(kind, &value).ok_or_else(|| {
                CliError::InvalidInput(format!("'{}' is not a valid {} value", value, kind))
            })?;
            let action = WorkflowAction::RecordField { step, field, value };
            act(config, &journey_id, actor, action, format).await
        }

        JourneyCommands::Media {
            journey_id,
            step,
            reference,
            kind,
            actor,
        } => {
            let kind = MediaKind::parse(&kind)
                .ok_or_else(|| CliError::InvalidInput(format!("unknown media kind '{}'", kind)))?;
            let action = WorkflowAction::AddMedia {
                step: parse_step(&step)?,
                kind,
                reference,
            };
            act(config, &journey_id, actor.actor()?, action, format).await
        }

        JourneyCommands::Complete {
            journey_id,
            step,
            actor,
        } => {
            let action = WorkflowAction::Complete {
                step: parse_step(&step)?,
            };
            act(config, &journey_id, actor.actor()?, action, format).await
        }

        JourneyCommands::Approve {
            journey_id,
            step,
            actor,
        } => {
            let action = WorkflowAction::Approve {
                step: parse_step(&step)?,
            };
            act(config, &journey_id, actor.actor()?, action, format).await
        }
    }
}
