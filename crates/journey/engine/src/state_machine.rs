//! State machine: applies user actions to a journey workflow instance
//!
//! Every operation checks the acting role first, then the step's status
//! and position, then the submitted data. A rejected operation leaves the
//! instance untouched.

use crate::action::{Actor, WorkflowAction};
use access_types::{has_permission, Permission, Role};
use chrono::Utc;
use journey_types::*;
use serde::{Deserialize, Serialize};

/// The effect of an applied action
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transition {
    Started {
        step: StepId,
    },
    FieldRecorded {
        step: StepId,
        role: FieldRole,
        field: String,
    },
    /// The role's sub-form is in, but other roles still have to submit
    SubFormSubmitted {
        step: StepId,
        role: FieldRole,
        outstanding: Vec<FieldRole>,
    },
    Completed {
        step: StepId,
        role: FieldRole,
        /// The step that is now current; `None` once the workflow is done
        next: Option<StepId>,
    },
    Approved {
        step: StepId,
    },
    MediaAdded {
        step: StepId,
        role: FieldRole,
        kind: MediaKind,
    },
}

impl Transition {
    pub fn step(&self) -> StepId {
        match self {
            Self::Started { step }
            | Self::FieldRecorded { step, .. }
            | Self::SubFormSubmitted { step, .. }
            | Self::Completed { step, .. }
            | Self::Approved { step }
            | Self::MediaAdded { step, .. } => *step,
        }
    }

    /// Short message suitable for a user notification
    pub fn describe(&self) -> String {
        match self {
            Self::Started { step } => format!("{} started", step.definition().label),
            Self::FieldRecorded { field, .. } => format!("Saved {}", field),
            Self::SubFormSubmitted {
                step, outstanding, ..
            } => {
                let waiting: Vec<String> = outstanding.iter().map(|r| r.to_string()).collect();
                format!(
                    "{} submitted; waiting on {}",
                    step.definition().label,
                    waiting.join(", ")
                )
            }
            Self::Completed { step, next: None, .. } => {
                format!("{} completed; journey finished", step.definition().label)
            }
            Self::Completed { step, .. } => format!("{} completed", step.definition().label),
            Self::Approved { step } => format!("{} approved", step.definition().label),
            Self::MediaAdded { kind, .. } => format!("Added {}", kind),
        }
    }
}

/// Actions a role may currently take on a step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailableAction {
    Start,
    RecordField,
    Complete,
    Approve,
    AddMedia,
}

/// Applies workflow actions to instances
#[derive(Clone, Debug, Default)]
pub struct WorkflowStateMachine;

impl WorkflowStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Apply any action on behalf of `actor`
    pub fn apply(
        &self,
        instance: &mut JourneyWorkflowInstance,
        actor: &Actor,
        action: &WorkflowAction,
    ) -> JourneyResult<Transition> {
        match action {
            WorkflowAction::Start { step } => self.start(instance, actor.role, *step),
            WorkflowAction::RecordField { step, field, value } => {
                self.record_field(instance, actor.role, *step, field, value.clone())
            }
            WorkflowAction::Complete { step } => self.complete(instance, actor.role, *step),
            WorkflowAction::Approve { step } => {
                self.approve(instance, actor.role, *step, actor.user_id.clone())
            }
            WorkflowAction::AddMedia {
                step,
                kind,
                reference,
            } => self.add_media(instance, actor.role, *step, *kind, reference),
        }
    }

    /// Move a pending step to in_progress. Only the current step can start.
    pub fn start(
        &self,
        instance: &mut JourneyWorkflowInstance,
        role: Role,
        step: StepId,
    ) -> JourneyResult<Transition> {
        check_start(instance, role, step)?;

        instance.step_mut(step).started_at = Some(Utc::now());
        instance.touch();

        tracing::info!(journey = %instance.journey_id, step = %step, role = %role, "Step started");
        Ok(Transition::Started { step })
    }

    /// Record one field of the role's sub-form
    pub fn record_field(
        &self,
        instance: &mut JourneyWorkflowInstance,
        role: Role,
        step: StepId,
        field: &str,
        value: FieldValue,
    ) -> JourneyResult<Transition> {
        let field_role = check_editable(instance, role, step, "edit")?;
        let spec = sub_form_spec(step, field_role, role)?
            .field(field)
            .ok_or_else(|| ValidationError::UnknownField {
                step,
                role: field_role,
                field: field.to_string(),
            })?;
        value.validate_for(spec)?;

        instance
            .step_mut(step)
            .sub_form_mut(field_role)
            .values
            .insert(spec.key.to_string(), value);
        instance.touch();

        tracing::debug!(journey = %instance.journey_id, step = %step, role = %role, field = spec.key, "Field recorded");
        Ok(Transition::FieldRecorded {
            step,
            role: field_role,
            field: spec.key.to_string(),
        })
    }

    /// Submit the role's sub-form and complete the step if the instance's
    /// completion policy is met.
    pub fn complete(
        &self,
        instance: &mut JourneyWorkflowInstance,
        role: Role,
        step: StepId,
    ) -> JourneyResult<Transition> {
        let field_role = check_complete(instance, role, step)?;
        let spec = sub_form_spec(step, field_role, role)?;
        let record = instance.step(step);

        let missing: Vec<String> = spec
            .required_fields()
            .filter(|f| {
                !record
                    .sub_form(field_role)
                    .and_then(|s| s.value(f.key))
                    .map(FieldValue::is_filled)
                    .unwrap_or(false)
            })
            .map(|f| f.key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingRequiredFields { fields: missing }.into());
        }

        if !spec.media.is_satisfied_by(record.media_kinds_by(field_role)) {
            return Err(ValidationError::MissingMedia {
                step,
                role: field_role,
                requirement: spec.media,
            }
            .into());
        }

        let policy = instance.completion_policy;
        let now = Utc::now();
        let record = instance.step_mut(step);
        record.sub_form_mut(field_role).submitted_at = Some(now);

        if !record.completion_satisfied(policy) {
            let outstanding = record.outstanding_roles();
            instance.touch();
            tracing::info!(
                journey = %instance.journey_id,
                step = %step,
                role = %role,
                outstanding = outstanding.len(),
                "Sub-form submitted"
            );
            return Ok(Transition::SubFormSubmitted {
                step,
                role: field_role,
                outstanding,
            });
        }

        record.completed_at = Some(now);
        record.completed_by = Some(field_role);
        instance.touch();

        let next = instance.current_step();
        tracing::info!(
            journey = %instance.journey_id,
            step = %step,
            role = %role,
            current = instance.current_ordinal(),
            "Step completed"
        );
        Ok(Transition::Completed {
            step,
            role: field_role,
            next,
        })
    }

    /// Approve a completed step. Managers only, and never a step the
    /// manager's own submission completed.
    pub fn approve(
        &self,
        instance: &mut JourneyWorkflowInstance,
        role: Role,
        step: StepId,
        approved_by: Option<String>,
    ) -> JourneyResult<Transition> {
        check_approve(instance, role, step)?;

        instance.step_mut(step).approval = Some(Approval {
            approved_at: Utc::now(),
            approved_by,
        });
        instance.touch();

        tracing::info!(journey = %instance.journey_id, step = %step, "Step approved");
        Ok(Transition::Approved { step })
    }

    /// Attach a media reference to the step. The status is unchanged.
    pub fn add_media(
        &self,
        instance: &mut JourneyWorkflowInstance,
        role: Role,
        step: StepId,
        kind: MediaKind,
        reference: &str,
    ) -> JourneyResult<Transition> {
        let field_role = check_media(instance, role, step)?;
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ValidationError::EmptyMediaReference.into());
        }

        instance
            .step_mut(step)
            .media
            .push(MediaReference::new(kind, reference, field_role));
        instance.touch();

        tracing::debug!(journey = %instance.journey_id, step = %step, role = %role, kind = %kind, "Media added");
        Ok(Transition::MediaAdded {
            step,
            role: field_role,
            kind,
        })
    }

    /// Actions whose preconditions currently hold for `role` on `step`.
    /// Field contents are not checked, so `Complete` may still fail
    /// validation.
    pub fn available_actions(
        &self,
        instance: &JourneyWorkflowInstance,
        role: Role,
        step: StepId,
    ) -> Vec<AvailableAction> {
        let mut actions = Vec::new();
        if check_start(instance, role, step).is_ok() {
            actions.push(AvailableAction::Start);
        }
        if check_editable(instance, role, step, "edit").is_ok() {
            actions.push(AvailableAction::RecordField);
        }
        if check_complete(instance, role, step).is_ok() {
            actions.push(AvailableAction::Complete);
        }
        if check_approve(instance, role, step).is_ok() {
            actions.push(AvailableAction::Approve);
        }
        if check_media(instance, role, step).is_ok() {
            actions.push(AvailableAction::AddMedia);
        }
        actions
    }
}

// ── Preconditions ────────────────────────────────────────────────────

/// The role's field role, if it acts in `step`
fn field_role_for(role: Role, step: StepId, action: &'static str) -> JourneyResult<FieldRole> {
    FieldRole::from_role(role)
        .filter(|fr| step.definition().permits(*fr))
        .ok_or(JourneyError::PermissionDenied { role, action, step })
}

fn sub_form_spec(
    step: StepId,
    field_role: FieldRole,
    role: Role,
) -> JourneyResult<&'static SubFormSpec> {
    step.definition()
        .sub_form(field_role)
        .ok_or(JourneyError::PermissionDenied {
            role,
            action: "edit",
            step,
        })
}

fn check_start(
    instance: &JourneyWorkflowInstance,
    role: Role,
    step: StepId,
) -> JourneyResult<FieldRole> {
    let field_role = field_role_for(role, step, "start")?;
    let status = instance.status(step);
    if status != StepStatus::Pending {
        return Err(JourneyError::sequence(
            step,
            format!("step is already {}", status),
        ));
    }
    if step.ordinal() != instance.current_ordinal() {
        return Err(JourneyError::sequence(
            step,
            format!(
                "current step is {}, earlier steps must finish first",
                instance.current_ordinal()
            ),
        ));
    }
    Ok(field_role)
}

/// Pending or in_progress, and the role's own sub-form not yet submitted
fn check_editable(
    instance: &JourneyWorkflowInstance,
    role: Role,
    step: StepId,
    action: &'static str,
) -> JourneyResult<FieldRole> {
    let field_role = field_role_for(role, step, action)?;
    let record = instance.step(step);
    let status = record.status();
    if status.is_finished() {
        return Err(JourneyError::sequence(
            step,
            format!("step is {} and can no longer change", status),
        ));
    }
    if record.is_submitted_by(field_role) {
        return Err(JourneyError::StepLocked {
            step,
            role: field_role,
        });
    }
    Ok(field_role)
}

fn check_complete(
    instance: &JourneyWorkflowInstance,
    role: Role,
    step: StepId,
) -> JourneyResult<FieldRole> {
    let field_role = field_role_for(role, step, "complete")?;
    let record = instance.step(step);
    let status = record.status();
    if status != StepStatus::InProgress {
        return Err(JourneyError::sequence(
            step,
            format!("step is {}, not in_progress", status),
        ));
    }
    if record.is_submitted_by(field_role) {
        return Err(JourneyError::StepLocked {
            step,
            role: field_role,
        });
    }
    Ok(field_role)
}

fn check_approve(instance: &JourneyWorkflowInstance, role: Role, step: StepId) -> JourneyResult<()> {
    if role != Role::Manager {
        return Err(JourneyError::PermissionDenied {
            role,
            action: "approve",
            step,
        });
    }
    let record = instance.step(step);
    match record.status() {
        StepStatus::Completed => {}
        StepStatus::Approved => return Err(JourneyError::sequence(step, "step is already approved")),
        other => {
            return Err(JourneyError::sequence(
                step,
                format!("step is {}, not completed", other),
            ))
        }
    }
    if record.completed_by == Some(FieldRole::Manager) {
        return Err(JourneyError::SelfApproval(step));
    }
    Ok(())
}

fn check_media(
    instance: &JourneyWorkflowInstance,
    role: Role,
    step: StepId,
) -> JourneyResult<FieldRole> {
    if !has_permission(role, Permission::MediaUpload) {
        return Err(JourneyError::PermissionDenied {
            role,
            action: "add media to",
            step,
        });
    }
    check_editable(instance, role, step, "add media to")
}
