//! Effective-owner resolution over one employee's phase-ordered trail.
//!
//! Each record is classified into a [`TrailEvent`] relative to the
//! calibrator and its phase order, then fed through [`OwnershipState::step`]:
//!
//! | state            | `Earlier(o)`        | `DirectAtPhase`          | `ForeignAtOrAfter` | `OwnLater` |
//! |------------------|---------------------|--------------------------|--------------------|------------|
//! | `Unresolved`     | `OwnedByEarlier(o)` | `OwnedDirectly(None)`    | `OutOfScope`       | stay       |
//! | `OwnedByEarlier` | `OwnedByEarlier(o)` | `OwnedDirectly(Some(p))` | `OutOfScope`       | stay       |
//! | `OwnedDirectly`  | terminal            | terminal                 | terminal           | terminal   |
//! | `OutOfScope`     | terminal            | terminal                 | terminal           | terminal   |
//!
//! A single-record employee whose calibrator is already an established
//! earlier-phase owner is adopted into that owner (see [`resolve_owner`]).

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::models::calibration::{CalibrationRecord, Employee};

/// Display name of the "no prior owner" bucket owner.
pub const NO_PRIOR_OWNER: &str = "N-1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerRef {
    pub id: Uuid,
    pub name: String,
}

impl OwnerRef {
    fn of(record: &CalibrationRecord) -> Self {
        OwnerRef {
            id: record.calibrator_id,
            name: record.calibrator_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    Named(OwnerRef),
    NoPriorOwner,
}

impl Owner {
    pub fn name(&self) -> &str {
        match self {
            Owner::Named(o) => &o.name,
            Owner::NoPriorOwner => NO_PRIOR_OWNER,
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            Owner::Named(o) => Some(o.id),
            Owner::NoPriorOwner => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailEvent {
    /// Below the phase order: someone rated the employee earlier.
    Earlier(OwnerRef),
    /// At the phase order, by the calibrator.
    DirectAtPhase,
    /// At or after the phase order, by someone else.
    ForeignAtOrAfter,
    /// After the phase order, by the calibrator.
    OwnLater,
}

pub fn classify(record: &CalibrationRecord, calibrator_id: Uuid, phase_order: i32) -> TrailEvent {
    let own = record.calibrator_id == calibrator_id;
    match record.phase_order {
        o if o < phase_order => TrailEvent::Earlier(OwnerRef::of(record)),
        o if o == phase_order && own => TrailEvent::DirectAtPhase,
        _ if !own => TrailEvent::ForeignAtOrAfter,
        _ => TrailEvent::OwnLater,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipState {
    Unresolved,
    OwnedByEarlier(OwnerRef),
    /// Carries the earlier calibrator that forwarded the employee, if any.
    OwnedDirectly(Option<OwnerRef>),
    OutOfScope,
}

impl OwnershipState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OwnershipState::OwnedDirectly(_) | OwnershipState::OutOfScope
        )
    }

    pub fn step(self, event: TrailEvent) -> OwnershipState {
        use OwnershipState::*;
        match (self, event) {
            (state @ (OwnedDirectly(_) | OutOfScope), _) => state,
            (_, TrailEvent::ForeignAtOrAfter) => OutOfScope,
            (_, TrailEvent::Earlier(owner)) => OwnedByEarlier(owner),
            (Unresolved, TrailEvent::DirectAtPhase) => OwnedDirectly(None),
            (OwnedByEarlier(owner), TrailEvent::DirectAtPhase) => OwnedDirectly(Some(owner)),
            (state, TrailEvent::OwnLater) => state,
        }
    }
}

/// Outcome for an employee that stays in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub owner: Owner,
    /// Rated by the calibrator at its own phase (`pic`).
    pub direct: bool,
    /// The owner came from an earlier-phase record, so other single-record
    /// employees rated by the same name may be adopted into it.
    pub establishes_owner: bool,
}

/// Earlier-phase owners already seen in one summarize call, by name.
pub type EstablishedOwners = BTreeMap<String, OwnerRef>;

/// Runs the trail through the state machine. `None` means out of scope.
pub fn resolve_owner(
    employee: &Employee,
    calibrator_id: Uuid,
    phase_order: i32,
    established: &EstablishedOwners,
) -> Option<Resolution> {
    let mut state = OwnershipState::Unresolved;
    for record in &employee.trail {
        state = state.step(classify(record, calibrator_id, phase_order));
        if state.is_terminal() {
            break;
        }
    }

    let (owner, direct) = match state {
        OwnershipState::OutOfScope => return None,
        OwnershipState::Unresolved => (None, false),
        OwnershipState::OwnedByEarlier(owner) => (Some(owner), false),
        OwnershipState::OwnedDirectly(owner) => (owner, true),
    };
    let establishes_owner = owner.is_some();

    if let Some(adopted) = adopt_established(employee, established) {
        return Some(Resolution {
            owner: Owner::Named(adopted),
            direct,
            establishes_owner: false,
        });
    }

    Some(Resolution {
        owner: owner.map_or(Owner::NoPriorOwner, Owner::Named),
        direct,
        establishes_owner,
    })
}

/// Single-record employees collapse into an established owner of the same name.
fn adopt_established(employee: &Employee, established: &EstablishedOwners) -> Option<OwnerRef> {
    match employee.trail.as_slice() {
        [only] => established.get(&only.calibrator_name).cloned(),
        _ => None,
    }
}
