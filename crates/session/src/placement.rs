use foundation::math::Vec3;
use scene::entity::EntityId;

use crate::platform::AnchorId;

/// Cooldown gate for anchor placement.
///
/// Opens on the first eligible frame and then at most once per cooldown.
/// An ineligible frame (anchor present or request in flight) never opens
/// the gate and never moves the timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementGate {
    cooldown_ms: f64,
    last_evaluated_ms: Option<f64>,
}

impl PlacementGate {
    pub fn new(cooldown_ms: f64) -> Self {
        Self {
            cooldown_ms,
            last_evaluated_ms: None,
        }
    }

    pub fn cooldown_ms(&self) -> f64 {
        self.cooldown_ms
    }

    pub fn last_evaluated_ms(&self) -> Option<f64> {
        self.last_evaluated_ms
    }

    pub fn should_evaluate(&mut self, time_ms: f64, eligible: bool) -> bool {
        if !eligible {
            return false;
        }
        let due = match self.last_evaluated_ms {
            None => true,
            Some(last) => time_ms - last >= self.cooldown_ms,
        };
        if due {
            self.last_evaluated_ms = Some(time_ms);
        }
        due
    }
}

/// Inputs captured when an anchor was requested, consumed on completion.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPlacement {
    pub id: AnchorId,
    pub heading_rad: f64,
    pub points: Vec<Vec3>,
}

/// A placed compass: the platform anchor and the scene root attached to it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AnchorState {
    pub id: AnchorId,
    pub root: EntityId,
    pub heading_rad: f64,
    pub tracked: bool,
}
