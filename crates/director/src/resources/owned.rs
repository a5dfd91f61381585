//! Scene objects and widgets created by one phase.
//!
//! The director's scene clear is only a backstop; each phase removes what
//! it added through this guard when it is torn down.

use std::fmt;

use tracing::debug;

use crate::interaction::GateId;
use crate::surfaces::{ObjectHandle, Surfaces};

#[derive(Default)]
pub struct OwnedResources {
    objects: Vec<ObjectHandle>,
    gates: Vec<GateId>,
    counter: bool,
    board: bool,
    text: bool,
}

impl OwnedResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_object(&mut self, handle: ObjectHandle) {
        self.objects.push(handle);
    }

    pub fn track_objects(&mut self, handles: impl IntoIterator<Item = ObjectHandle>) {
        self.objects.extend(handles);
    }

    /// Stops tracking an object the phase already removed itself.
    pub fn forget_object(&mut self, handle: ObjectHandle) {
        self.objects.retain(|h| *h != handle);
    }

    pub fn track_gate(&mut self, gate: GateId) {
        self.gates.push(gate);
    }

    pub fn forget_gate(&mut self, gate: GateId) {
        self.gates.retain(|g| *g != gate);
    }

    pub fn set_counter(&mut self, shown: bool) {
        self.counter = shown;
    }

    pub fn set_board(&mut self, shown: bool) {
        self.board = shown;
    }

    pub fn set_text(&mut self, shown: bool) {
        self.text = shown;
    }

    pub fn objects(&self) -> &[ObjectHandle] {
        &self.objects
    }

    pub fn open_gates(&self) -> &[GateId] {
        &self.gates
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
            && self.gates.is_empty()
            && !self.counter
            && !self.board
            && !self.text
    }

    /// Removes everything still tracked. Safe to call repeatedly.
    pub fn release(&mut self, surfaces: &Surfaces) {
        if self.is_empty() {
            return;
        }

        debug!(
            objects = self.objects.len(),
            gates = self.gates.len(),
            "Releasing phase-owned resources"
        );

        for gate in self.gates.drain(..) {
            surfaces.presentation.close_gate(gate);
        }
        if std::mem::take(&mut self.counter) {
            surfaces.presentation.hide_counter();
        }
        if std::mem::take(&mut self.board) {
            surfaces.presentation.hide_board();
        }
        if std::mem::take(&mut self.text) {
            surfaces.presentation.hide_text();
        }
        for handle in self.objects.drain(..) {
            surfaces.scene.remove(handle);
        }
    }
}

impl fmt::Debug for OwnedResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedResources")
            .field("objects", &self.objects)
            .field("gates", &self.gates)
            .field("counter", &self.counter)
            .field("board", &self.board)
            .field("text", &self.text)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::Interaction;
    use crate::recording::{Recorder, SurfaceCall};
    use crate::surfaces::{Color, Placement, Shape};

    #[test]
    fn test_release_removes_everything_once() {
        let recorder = Recorder::new();
        let surfaces = recorder.surfaces();

        let handle =
            surfaces
                .scene
                .add_placeholder(Shape::Sphere, Color::GOLD, Placement::default());
        surfaces
            .presentation
            .open_gate(GateId(1), &Interaction::confirm("Go"));

        let mut owned = OwnedResources::new();
        owned.track_object(handle);
        owned.track_gate(GateId(1));
        owned.set_text(true);

        owned.release(&surfaces);
        assert!(owned.is_empty());
        assert!(recorder.live_objects().is_empty());
        assert!(recorder.open_gates().is_empty());

        let calls = recorder.calls().len();
        owned.release(&surfaces);
        assert_eq!(recorder.calls().len(), calls);
        assert!(recorder.calls().contains(&SurfaceCall::TextHidden));
    }

    #[test]
    fn test_forget_object() {
        let mut owned = OwnedResources::new();
        owned.track_objects([ObjectHandle(1), ObjectHandle(2)]);
        owned.forget_object(ObjectHandle(1));
        assert_eq!(owned.objects(), &[ObjectHandle(2)]);
    }
}
