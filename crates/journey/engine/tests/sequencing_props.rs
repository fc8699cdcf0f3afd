//! Property tests: arbitrary action sequences never break step ordering.
//!
//! Whatever roles act on whatever steps, in any order, the instance stays
//! sequenced, statuses only move forward, and a rejected action changes
//! nothing.

use access_types::Role;
use journey_engine::{Actor, WorkflowAction, WorkflowStateMachine};
use journey_types::*;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
enum Op {
    Start,
    FillRequired,
    FillWrongKind,
    Photo,
    Video,
    Complete,
    Approve,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Start),
        Just(Op::FillRequired),
        Just(Op::FillWrongKind),
        Just(Op::Photo),
        Just(Op::Video),
        Just(Op::Complete),
        Just(Op::Approve),
    ]
}

/// A role, a step and an operation
fn arb_move() -> impl Strategy<Value = (Role, StepId, Op)> {
    (0..Role::ALL.len(), 0..STEP_COUNT, arb_op())
        .prop_map(|(role, step, op)| (Role::ALL[role], StepId::ALL[step], op))
}

fn arb_moves(max: usize) -> impl Strategy<Value = Vec<(Role, StepId, Op)>> {
    prop::collection::vec(arb_move(), 0..max)
}

fn good_value(kind: FieldKind) -> FieldValue {
    match kind {
        FieldKind::Text => FieldValue::Text("noted".into()),
        FieldKind::Number => FieldValue::Number(3.0),
        FieldKind::Rating => FieldValue::Rating(4),
        FieldKind::Checklist => FieldValue::Checklist(vec!["done".into()]),
        FieldKind::Flag => FieldValue::Flag(true),
    }
}

fn wrong_value(kind: FieldKind) -> FieldValue {
    match kind {
        FieldKind::Flag => FieldValue::Text("maybe".into()),
        _ => FieldValue::Flag(true),
    }
}

/// Record every required field of the role's sub-form
fn fill(role: Role, step: StepId, value: fn(FieldKind) -> FieldValue) -> Vec<WorkflowAction> {
    let spec = FieldRole::from_role(role).and_then(|r| step.definition().sub_form(r));
    match spec {
        Some(spec) => spec
            .required_fields()
            .map(|f| WorkflowAction::RecordField {
                step,
                field: f.key.to_string(),
                value: value(f.kind),
            })
            .collect(),
        // Office roles still try; the machine must refuse them
        None => vec![WorkflowAction::RecordField {
            step,
            field: "anything".into(),
            value: FieldValue::Flag(true),
        }],
    }
}

/// Expand a move into the actions it stands for
fn actions(role: Role, step: StepId, op: Op) -> Vec<WorkflowAction> {
    match op {
        Op::Start => vec![WorkflowAction::Start { step }],
        Op::FillRequired => fill(role, step, good_value),
        Op::FillWrongKind => fill(role, step, wrong_value),
        Op::Photo => vec![WorkflowAction::AddMedia {
            step,
            kind: MediaKind::Photo,
            reference: "s3://p.jpg".into(),
        }],
        Op::Video => vec![WorkflowAction::AddMedia {
            step,
            kind: MediaKind::Video,
            reference: "s3://v.mp4".into(),
        }],
        Op::Complete => vec![WorkflowAction::Complete { step }],
        Op::Approve => vec![WorkflowAction::Approve { step }],
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn sequencing_holds_under_arbitrary_actions(
        moves in arb_moves(80),
        all_sub_forms in any::<bool>(),
    ) {
        let policy = if all_sub_forms {
            CompletionPolicy::AllSubForms
        } else {
            CompletionPolicy::SingleRole
        };
        let machine = WorkflowStateMachine::new();
        let mut instance = JourneyWorkflowInstance::new(JourneyId::new("J-prop")).with_policy(policy);

        for (role, step, op) in moves {
            let actor = Actor::new(role);
            for action in actions(role, step, op) {
                let before = instance.clone();
                let result = machine.apply(&mut instance, &actor, &action);

                if result.is_err() {
                    prop_assert_eq!(&instance, &before);
                }
                prop_assert!(instance.check_sequencing().is_ok());
                prop_assert!(instance.current_ordinal() >= before.current_ordinal());
                for (now, was) in instance.statuses().iter().zip(before.statuses().iter()) {
                    prop_assert!(now >= was);
                }
            }
        }
    }

    #[test]
    fn finished_steps_name_a_completing_field_role(moves in arb_moves(120)) {
        let machine = WorkflowStateMachine::new();
        let mut instance = JourneyWorkflowInstance::new(JourneyId::new("J-prop"));

        for (role, step, op) in moves {
            let actor = Actor::new(role);
            for action in actions(role, step, op) {
                let _ = machine.apply(&mut instance, &actor, &action);
            }
        }

        for record in &instance.steps {
            let finished = record.status().is_finished();
            prop_assert_eq!(record.completed_by.is_some(), finished);
            if record.status() == StepStatus::Approved {
                prop_assert_ne!(record.completed_by, Some(FieldRole::Manager));
            }
        }
    }

    #[test]
    fn only_managers_ever_approve(moves in arb_moves(80)) {
        let machine = WorkflowStateMachine::new();
        let mut instance = JourneyWorkflowInstance::new(JourneyId::new("J-prop"));

        for (role, step, op) in moves {
            let actor = Actor::new(role);
            for action in actions(role, step, op) {
                let approving = matches!(action, WorkflowAction::Approve { .. });
                let result = machine.apply(&mut instance, &actor, &action);
                if approving && role != Role::Manager {
                    prop_assert_eq!(
                        result.map_err(|e| e.category()).err(),
                        Some(ErrorCategory::PermissionDenied)
                    );
                }
            }
        }
    }
}
