//! Global callback slots
//!
//! One slot per callback kind, as the vendor API exposes them. Function
//! pointers are `Copy`, so readers take the pointer out and call it without
//! holding the lock.

use std::sync::{PoisonError, RwLock};

use contracts::{EventCallback, PointsCallback};

#[derive(Debug, Default)]
pub(crate) struct CallbackSlots {
    points: RwLock<Option<PointsCallback>>,
    event: RwLock<Option<EventCallback>>,
}

impl CallbackSlots {
    pub fn points(&self) -> Option<PointsCallback> {
        *self.points.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn event(&self) -> Option<EventCallback> {
        *self.event.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a points callback; returns false when the slot is taken.
    pub fn set_points(&self, callback: PointsCallback) -> bool {
        let mut slot = self.points.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(callback);
        true
    }

    pub fn set_event(&self, callback: EventCallback) -> bool {
        let mut slot = self.event.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(callback);
        true
    }

    pub fn clear_points(&self) {
        *self.points.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn clear_all(&self) {
        self.clear_points();
        *self.event.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
