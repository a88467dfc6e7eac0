//! Application state threaded through the frame driver and event handlers.

use std::sync::Arc;

use crate::options::ViewerOptions;
use crate::ramp::GradientRamp;
use crate::scene::Node;
use crate::toon::{apply_toon_shading, restore_materials};

/// The viewer's mutable state: the displayed model and its flags.
///
/// The state is owned by the caller and passed by reference wherever it is
/// needed; there is no global context.
pub struct ViewerState {
    /// Root of the currently displayed model, if any.
    pub model: Option<Node>,
    /// Display name of the current model, for logging.
    pub model_name: Option<String>,
    /// Viewer options.
    pub options: ViewerOptions,
    /// The gradient ramp shared by all derived toon materials.
    pub ramp: Arc<GradientRamp>,
}

impl ViewerState {
    /// Creates an empty viewer state with default options and the
    /// three-tone ramp.
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: None,
            model_name: None,
            options: ViewerOptions::default(),
            ramp: Arc::new(GradientRamp::three_tone()),
        }
    }

    /// Atomically swaps in a newly loaded model, returning the previous one.
    ///
    /// The incoming model is quantized immediately when toon shading is
    /// enabled, so the first frame after a swap already shows the active
    /// shading style.
    pub fn swap_model(&mut self, name: impl Into<String>, mut model: Node) -> Option<Node> {
        if self.options.toon_enabled {
            apply_toon_shading(&mut model, &self.ramp);
        }
        self.model_name = Some(name.into());
        self.model.replace(model)
    }

    /// Enables or disables toon shading, rederiving or restoring the
    /// current model's materials accordingly.
    pub fn set_toon_enabled(&mut self, enabled: bool) {
        self.options.toon_enabled = enabled;
        if let Some(model) = &mut self.model {
            if enabled {
                apply_toon_shading(model, &self.ramp);
            } else {
                restore_materials(model);
            }
        }
    }

    /// Flips the toon-shading flag.
    pub fn toggle_toon(&mut self) {
        self.set_toon_enabled(!self.options.toon_enabled);
    }
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Mesh;
    use glam::Vec3;

    fn model() -> Node {
        Node::with_mesh(
            "m",
            Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]]),
        )
    }

    #[test]
    fn test_swap_model_quantizes_when_enabled() {
        let mut state = ViewerState::new();
        assert!(state.options.toon_enabled);

        let old = state.swap_model("first", model());
        assert!(old.is_none());
        let mesh = state.model.as_ref().unwrap().mesh.as_ref().unwrap();
        assert!(mesh.slots.get(0).unwrap().is_toon());

        let old = state.swap_model("second", model());
        assert!(old.is_some());
        assert_eq!(state.model_name.as_deref(), Some("second"));
    }

    #[test]
    fn test_toggle_restores_then_rederives() {
        let mut state = ViewerState::new();
        state.swap_model("m", model());

        state.toggle_toon();
        assert!(!state.options.toon_enabled);
        let mesh = state.model.as_ref().unwrap().mesh.as_ref().unwrap();
        assert!(!mesh.slots.get(0).unwrap().is_toon());

        state.toggle_toon();
        let mesh = state.model.as_ref().unwrap().mesh.as_ref().unwrap();
        assert!(mesh.slots.get(0).unwrap().is_toon());
    }

    #[test]
    fn test_swap_respects_disabled_mode() {
        let mut state = ViewerState::new();
        state.options.toon_enabled = false;
        state.swap_model("m", model());
        let mesh = state.model.as_ref().unwrap().mesh.as_ref().unwrap();
        assert!(!mesh.slots.get(0).unwrap().is_toon());
    }
}
