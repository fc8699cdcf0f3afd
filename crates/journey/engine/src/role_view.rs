//! Role views: what each role sees of a journey workflow
//!
//! A [`RoleView`] is chosen once from the signed-in user's role and
//! renders a [`JourneyContext`] into plain data. Field roles get their
//! sub-form for the current step; office roles get the timeline, with the
//! audit trail behind the `audit:read` permission.

use crate::audit::{AuditRecord, AuditTrail};
use crate::state_machine::{AvailableAction, WorkflowStateMachine};
use access_gate::PermissionGate;
use access_types::{Permission, Role};
use journey_types::*;
use serde::Serialize;

/// Everything a view needs to render
#[derive(Clone, Copy)]
pub struct JourneyContext<'a> {
    pub instance: &'a JourneyWorkflowInstance,
    pub audit: &'a AuditTrail,
    pub machine: &'a WorkflowStateMachine,
}

/// One view per role
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoleView {
    SuperAdmin,
    Admin,
    Manager,
    Dispatcher,
    Auditor,
    StorageManager,
    Driver,
    Mover,
}

impl RoleView {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::SuperAdmin => Self::SuperAdmin,
            Role::Admin => Self::Admin,
            Role::Manager => Self::Manager,
            Role::Dispatcher => Self::Dispatcher,
            Role::Auditor => Self::Auditor,
            Role::StorageManager => Self::StorageManager,
            Role::Driver => Self::Driver,
            Role::Mover => Self::Mover,
        }
    }

    pub fn role(self) -> Role {
        match self {
            Self::SuperAdmin => Role::SuperAdmin,
            Self::Admin => Role::Admin,
            Self::Manager => Role::Manager,
            Self::Dispatcher => Role::Dispatcher,
            Self::Auditor => Role::Auditor,
            Self::StorageManager => Role::StorageManager,
            Self::Driver => Role::Driver,
            Self::Mover => Role::Mover,
        }
    }

    pub fn render(self, ctx: &JourneyContext<'_>) -> RenderedView {
        match self {
            Self::Driver => RenderedView::Field(field_panel(ctx, FieldRole::Driver)),
            Self::Mover => RenderedView::Field(field_panel(ctx, FieldRole::Mover)),
            Self::Manager => {
                let mut panel = field_panel(ctx, FieldRole::Manager);
                panel.approvals = StepId::ALL
                    .into_iter()
                    .filter(|s| {
                        ctx.machine
                            .available_actions(ctx.instance, Role::Manager, *s)
                            .contains(&AvailableAction::Approve)
                    })
                    .collect();
                RenderedView::Field(panel)
            }
            Self::SuperAdmin
            | Self::Admin
            | Self::Dispatcher
            | Self::Auditor
            | Self::StorageManager => RenderedView::Office(office_panel(ctx, self.role())),
        }
    }
}

// ── Rendered data ────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum RenderedView {
    Field(FieldPanel),
    Office(OfficePanel),
}

impl RenderedView {
    pub fn timeline(&self) -> &[TimelineEntry] {
        match self {
            Self::Field(p) => &p.timeline,
            Self::Office(p) => &p.timeline,
        }
    }
}

/// A field role's screen
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldPanel {
    pub role: FieldRole,
    /// The role's sub-form for the current step; `None` once finished
    pub current: Option<StepView>,
    /// Completed steps this role may approve
    pub approvals: Vec<StepId>,
    pub timeline: Vec<TimelineEntry>,
}

/// An office role's screen
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OfficePanel {
    pub role: Role,
    pub current_step: u8,
    pub finished: bool,
    /// Holds `journey:write`
    pub can_edit: bool,
    pub timeline: Vec<TimelineEntry>,
    /// Present for roles holding `audit:read`
    pub audit: Option<Vec<AuditRecord>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub step: StepId,
    pub ordinal: u8,
    pub label: &'static str,
    pub status: StepStatus,
    pub completed_by: Option<FieldRole>,
    pub submitted: Vec<FieldRole>,
    pub media_count: usize,
}

/// One role's sub-form within a step
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepView {
    pub step: StepId,
    pub label: &'static str,
    pub status: StepStatus,
    pub role: FieldRole,
    pub fields: Vec<FieldView>,
    pub media: MediaRequirement,
    pub media_hint: &'static str,
    pub media_captured: usize,
    pub submitted: bool,
    pub actions: Vec<AvailableAction>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldView {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub value: Option<FieldValue>,
}

impl StepView {
    /// Build `role`'s view of `step`
    pub fn build(
        instance: &JourneyWorkflowInstance,
        machine: &WorkflowStateMachine,
        role: Role,
        step: StepId,
    ) -> JourneyResult<StepView> {
        let definition = step.definition();
        let denied = JourneyError::PermissionDenied {
            role,
            action: "view",
            step,
        };
        let field_role = FieldRole::from_role(role).ok_or_else(|| denied.clone())?;
        let spec = definition.sub_form(field_role).ok_or(denied)?;

        let record = instance.step(step);
        let sub_form = record.sub_form(field_role);
        let fields = spec
            .fields
            .iter()
            .map(|f| FieldView {
                key: f.key,
                label: f.label,
                kind: f.kind,
                required: f.required,
                value: sub_form.and_then(|s| s.value(f.key)).cloned(),
            })
            .collect();

        Ok(StepView {
            step,
            label: definition.label,
            status: record.status(),
            role: field_role,
            fields,
            media: spec.media,
            media_hint: spec.media_hint,
            media_captured: record.media_by(field_role).count(),
            submitted: record.is_submitted_by(field_role),
            actions: machine.available_actions(instance, role, step),
        })
    }
}

fn timeline(instance: &JourneyWorkflowInstance) -> Vec<TimelineEntry> {
    instance
        .steps
        .iter()
        .map(|r| TimelineEntry {
            step: r.step,
            ordinal: r.step.ordinal(),
            label: r.definition().label,
            status: r.status(),
            completed_by: r.completed_by,
            submitted: r.submitted_roles(),
            media_count: r.media.len(),
        })
        .collect()
}

fn field_panel(ctx: &JourneyContext<'_>, role: FieldRole) -> FieldPanel {
    let current = ctx
        .instance
        .current_step()
        .and_then(|s| StepView::build(ctx.instance, ctx.machine, role.role(), s).ok());
    FieldPanel {
        role,
        current,
        approvals: Vec::new(),
        timeline: timeline(ctx.instance),
    }
}

fn office_panel(ctx: &JourneyContext<'_>, role: Role) -> OfficePanel {
    let audit_gate = PermissionGate::permission(Permission::AuditRead);
    let edit_gate = PermissionGate::permission(Permission::JourneyWrite);
    OfficePanel {
        role,
        current_step: ctx.instance.current_ordinal(),
        finished: ctx.instance.is_finished(),
        can_edit: edit_gate.decide(Some(role)).renders(),
        timeline: timeline(ctx.instance),
        audit: audit_gate
            .decide(Some(role))
            .renders()
            .then(|| ctx.audit.records().to_vec()),
    }
}
