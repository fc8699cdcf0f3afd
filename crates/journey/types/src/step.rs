//! Static step definitions
//!
//! The four field steps, the roles that act in them and the fields each
//! role's sub-form collects. This table is data, not configuration:
//! changing it is a code change, and its shape is checked at compile time.

use crate::MediaKind;
use access_types::Role;
use serde::{Deserialize, Serialize};

/// Number of field steps in every journey workflow
pub const STEP_COUNT: usize = 4;

// ── Step Identifier ──────────────────────────────────────────────────

/// One of the four fixed field steps
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    ReadyToGo,
    PointsA,
    NewLocation,
    BackToDispatcher,
}

impl StepId {
    /// Every step, in ordinal order
    pub const ALL: [StepId; STEP_COUNT] = [
        StepId::ReadyToGo,
        StepId::PointsA,
        StepId::NewLocation,
        StepId::BackToDispatcher,
    ];

    /// Position in the workflow, starting at 1
    pub const fn ordinal(self) -> u8 {
        match self {
            StepId::ReadyToGo => 1,
            StepId::PointsA => 2,
            StepId::NewLocation => 3,
            StepId::BackToDispatcher => 4,
        }
    }

    /// Phase identifier used on the wire
    pub const fn phase_id(self) -> &'static str {
        match self {
            StepId::ReadyToGo => "ready_to_go",
            StepId::PointsA => "points_a",
            StepId::NewLocation => "new_location",
            StepId::BackToDispatcher => "back_to_dispatcher",
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<StepId> {
        StepId::ALL.into_iter().find(|s| s.ordinal() == ordinal)
    }

    pub fn from_phase_id(phase_id: &str) -> Option<StepId> {
        let phase_id = phase_id.trim().to_ascii_lowercase().replace('-', "_");
        StepId::ALL.into_iter().find(|s| s.phase_id() == phase_id)
    }

    /// Parse either an ordinal (`"2"`) or a phase id (`"points_a"`)
    pub fn parse(s: &str) -> Option<StepId> {
        match s.trim().parse::<u8>() {
            Ok(ordinal) => StepId::from_ordinal(ordinal),
            Err(_) => StepId::from_phase_id(s),
        }
    }

    /// The step after this one, if any
    pub fn next(self) -> Option<StepId> {
        StepId::from_ordinal(self.ordinal() + 1)
    }

    /// The static definition of this step
    pub fn definition(self) -> &'static StepDefinition {
        &WORKFLOW_STEPS[self.index()]
    }

    /// Zero-based index into per-step arrays
    pub const fn index(self) -> usize {
        self.ordinal() as usize - 1
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.phase_id())
    }
}

// ── Field Roles ──────────────────────────────────────────────────────

/// The roles that act inside field steps. Dispatch and office roles
/// follow a journey but never fill a step's sub-forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldRole {
    Manager,
    Driver,
    Mover,
}

impl FieldRole {
    pub const ALL: [FieldRole; 3] = [FieldRole::Manager, FieldRole::Driver, FieldRole::Mover];

    pub fn from_role(role: Role) -> Option<FieldRole> {
        match role {
            Role::Manager => Some(FieldRole::Manager),
            Role::Driver => Some(FieldRole::Driver),
            Role::Mover => Some(FieldRole::Mover),
            _ => None,
        }
    }

    pub const fn role(self) -> Role {
        match self {
            FieldRole::Manager => Role::Manager,
            FieldRole::Driver => Role::Driver,
            FieldRole::Mover => Role::Mover,
        }
    }
}

impl std::fmt::Display for FieldRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.role())
    }
}

// ── Fields ───────────────────────────────────────────────────────────

/// The kind of value a field collects
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text
    Text,
    /// Non-negative number (counts, mileage, fuel level)
    Number,
    /// Rating from 1 to 5
    Rating,
    /// List of checked item labels
    Checklist,
    /// Yes/no confirmation
    Flag,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Rating => "rating",
            FieldKind::Checklist => "checklist",
            FieldKind::Flag => "flag",
        };
        write!(f, "{}", s)
    }
}

/// One field of a sub-form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            required: true,
        }
    }

    pub const fn optional(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            required: false,
        }
    }
}

/// Media a role must capture before completing its sub-form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaRequirement {
    None,
    Photo,
    PhotoOrVideo,
}

impl MediaRequirement {
    /// Whether the captured kinds meet this requirement
    pub fn is_satisfied_by(self, captured: impl IntoIterator<Item = MediaKind>) -> bool {
        let mut captured = captured.into_iter();
        match self {
            MediaRequirement::None => true,
            MediaRequirement::Photo => captured.any(|k| k == MediaKind::Photo),
            MediaRequirement::PhotoOrVideo => captured.next().is_some(),
        }
    }
}

impl std::fmt::Display for MediaRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MediaRequirement::None => "none",
            MediaRequirement::Photo => "a photo",
            MediaRequirement::PhotoOrVideo => "a photo or video",
        };
        write!(f, "{}", s)
    }
}

/// The sub-form one role fills within a step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SubFormSpec {
    pub role: FieldRole,
    pub fields: &'static [FieldSpec],
    pub media: MediaRequirement,
    /// What the media should show
    pub media_hint: &'static str,
}

impl SubFormSpec {
    pub fn field(&self, key: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }
}

// ── Step Definition ──────────────────────────────────────────────────

/// Static definition of one field step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StepDefinition {
    pub id: StepId,
    pub ordinal: u8,
    pub label: &'static str,
    pub sub_forms: &'static [SubFormSpec],
}

impl StepDefinition {
    /// The sub-form for `role`, if that role acts in this step
    pub fn sub_form(&self, role: FieldRole) -> Option<&'static SubFormSpec> {
        self.sub_forms.iter().find(|s| s.role == role)
    }

    /// Roles permitted to act on this step
    pub fn roles(&self) -> impl Iterator<Item = FieldRole> {
        self.sub_forms.iter().map(|s| s.role)
    }

    pub fn permits(&self, role: FieldRole) -> bool {
        self.sub_form(role).is_some()
    }
}

/// Look up a step definition by ordinal
pub fn step_by_ordinal(ordinal: u8) -> Option<&'static StepDefinition> {
    WORKFLOW_STEPS.iter().find(|s| s.ordinal == ordinal)
}

use FieldKind::*;

const READY_TO_GO: &[SubFormSpec] = &[
    SubFormSpec {
        role: FieldRole::Driver,
        fields: &[
            FieldSpec::required("truckInspection", "Truck inspection", Checklist),
            FieldSpec::required("fuelLevel", "Fuel level", Number),
            FieldSpec::optional("vehicleNotes", "Vehicle notes", Text),
        ],
        media: MediaRequirement::Photo,
        media_hint: "truck condition before departure",
    },
    SubFormSpec {
        role: FieldRole::Mover,
        fields: &[
            FieldSpec::required("equipmentChecklist", "Equipment checklist", Checklist),
            FieldSpec::optional("crewNotes", "Crew notes", Text),
        ],
        media: MediaRequirement::None,
        media_hint: "",
    },
    SubFormSpec {
        role: FieldRole::Manager,
        fields: &[
            FieldSpec::required("crewConfirmed", "Crew confirmed", Flag),
            FieldSpec::optional("dispatchNotes", "Dispatch notes", Text),
        ],
        media: MediaRequirement::None,
        media_hint: "",
    },
];

const POINTS_A: &[SubFormSpec] = &[
    SubFormSpec {
        role: FieldRole::Driver,
        fields: &[
            FieldSpec::required("itemsLoaded", "Items loaded", Number),
            FieldSpec::optional("loadingNotes", "Loading notes", Text),
        ],
        media: MediaRequirement::None,
        media_hint: "",
    },
    SubFormSpec {
        role: FieldRole::Mover,
        fields: &[
            FieldSpec::required("inventoryChecked", "Inventory checked", Flag),
            FieldSpec::optional("damageNotes", "Pre-existing damage", Text),
        ],
        media: MediaRequirement::Photo,
        media_hint: "pre-existing damage at pickup",
    },
    SubFormSpec {
        role: FieldRole::Manager,
        fields: &[FieldSpec::required("customerSignoff", "Customer sign-off", Flag)],
        media: MediaRequirement::None,
        media_hint: "",
    },
];

const NEW_LOCATION: &[SubFormSpec] = &[
    SubFormSpec {
        role: FieldRole::Driver,
        fields: &[
            FieldSpec::required("itemsDelivered", "Items delivered", Number),
            FieldSpec::optional("arrivalNotes", "Arrival notes", Text),
        ],
        media: MediaRequirement::None,
        media_hint: "",
    },
    SubFormSpec {
        role: FieldRole::Mover,
        fields: &[
            FieldSpec::required("itemsUnloaded", "Items unloaded", Number),
            FieldSpec::optional("damageReport", "Damage report", Text),
        ],
        media: MediaRequirement::Photo,
        media_hint: "items placed at the new location",
    },
    SubFormSpec {
        role: FieldRole::Manager,
        fields: &[
            FieldSpec::required("customerRating", "Customer satisfaction", Rating),
            FieldSpec::optional("deliveryNotes", "Delivery notes", Text),
        ],
        media: MediaRequirement::None,
        media_hint: "",
    },
];

const BACK_TO_DISPATCHER: &[SubFormSpec] = &[
    SubFormSpec {
        role: FieldRole::Driver,
        fields: &[
            FieldSpec::required("finalMileage", "Final mileage", Number),
            FieldSpec::optional("returnNotes", "Return notes", Text),
        ],
        media: MediaRequirement::Photo,
        media_hint: "truck condition on return",
    },
    SubFormSpec {
        role: FieldRole::Mover,
        fields: &[FieldSpec::required("equipmentReturned", "Equipment returned", Checklist)],
        media: MediaRequirement::PhotoOrVideo,
        media_hint: "equipment returned to the depot",
    },
    SubFormSpec {
        role: FieldRole::Manager,
        fields: &[
            FieldSpec::required("journeyRating", "Journey rating", Rating),
            FieldSpec::optional("finalNotes", "Final notes", Text),
        ],
        media: MediaRequirement::None,
        media_hint: "",
    },
];

const STEPS: [StepDefinition; STEP_COUNT] = [
    StepDefinition {
        id: StepId::ReadyToGo,
        ordinal: 1,
        label: "Ready to Go",
        sub_forms: READY_TO_GO,
    },
    StepDefinition {
        id: StepId::PointsA,
        ordinal: 2,
        label: "Points A",
        sub_forms: POINTS_A,
    },
    StepDefinition {
        id: StepId::NewLocation,
        ordinal: 3,
        label: "New Location",
        sub_forms: NEW_LOCATION,
    },
    StepDefinition {
        id: StepId::BackToDispatcher,
        ordinal: 4,
        label: "Back to Dispatcher",
        sub_forms: BACK_TO_DISPATCHER,
    },
];

/// The four field steps, in ordinal order
pub static WORKFLOW_STEPS: [StepDefinition; STEP_COUNT] = STEPS;

/// Ordinals contiguous from 1, each matching its id, and every step with
/// at least one sub-form and no role listed twice.
const fn steps_are_well_formed(steps: &[StepDefinition]) -> bool {
    let mut i = 0;
    while i < steps.len() {
        let step = &steps[i];
        if step.ordinal as usize != i + 1 || step.id.ordinal() != step.ordinal {
            return false;
        }
        if step.sub_forms.is_empty() {
            return false;
        }
        let mut a = 0;
        while a < step.sub_forms.len() {
            let mut b = a + 1;
            while b < step.sub_forms.len() {
                if step.sub_forms[a].role as u8 == step.sub_forms[b].role as u8 {
                    return false;
                }
                b += 1;
            }
            a += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    steps_are_well_formed(&STEPS),
    "workflow steps must have contiguous ordinals starting at 1"
);
