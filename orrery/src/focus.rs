//! Shared focus and pin state
//!
//! Written by selection and search, read by the camera director and the
//! visibility blender.

use hecs::Entity;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTarget {
    pub entity: Entity,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct FocusState {
    focused: Option<FocusTarget>,
    last_focused_system: String,
    pinned: BTreeSet<String>,
}

impl FocusState {
    pub fn new(home_system: impl Into<String>) -> Self {
        Self {
            focused: None,
            last_focused_system: home_system.into(),
            pinned: BTreeSet::new(),
        }
    }

    pub fn focused(&self) -> Option<&FocusTarget> {
        self.focused.as_ref()
    }

    pub fn focused_entity(&self) -> Option<Entity> {
        self.focused.as_ref().map(|target| target.entity)
    }

    pub fn is_focused(&self, entity: Entity) -> bool {
        self.focused_entity() == Some(entity)
    }

    /// Returns false when `target` is already focused
    pub fn set(&mut self, target: FocusTarget) -> bool {
        if self.is_focused(target.entity) {
            return false;
        }
        debug!(name = %target.name, "Focus set");
        self.focused = Some(target);
        true
    }

    pub fn clear(&mut self) -> Option<FocusTarget> {
        let previous = self.focused.take();
        if let Some(target) = &previous {
            debug!(name = %target.name, "Focus cleared");
        }
        previous
    }

    /// System treated as local for fades and the asteroid belt
    pub fn last_focused_system(&self) -> &str {
        &self.last_focused_system
    }

    pub fn set_last_focused_system(&mut self, system: &str) {
        if self.last_focused_system != system {
            debug!(system, "Local system changed");
            self.last_focused_system = system.to_string();
        }
    }

    pub fn set_pinned(&mut self, name: &str, pinned: bool) {
        if pinned {
            self.pinned.insert(name.to_string());
        } else {
            self.pinned.remove(name);
        }
    }

    pub fn is_pinned(&self, name: &str) -> bool {
        self.pinned.contains(name)
    }

    /// Pinned names in sorted order
    pub fn pinned_names(&self) -> impl Iterator<Item = &str> {
        self.pinned.iter().map(String::as_str)
    }
}
