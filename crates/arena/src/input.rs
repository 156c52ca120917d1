//! Input state provider
//!
//! Behaviors never poll a device; they ask an [`InputProvider`] for the
//! state of the current frame. The headless build drives the player with a
//! [`ScriptedInput`].

use std::cell::RefCell;
use std::rc::Rc;

/// Intent for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    /// Forward (+1) / backward (-1)
    pub forward: f32,

    /// Right (+1) / left (-1)
    pub strafe: f32,

    /// Yaw change this frame, radians
    pub turn: f32,

    /// Fire button held
    pub fire: bool,
}

/// Source of per-frame input
pub trait InputProvider {
    /// Advance by `delta_time` and return the state for this frame
    fn sample(&mut self, delta_time: f32) -> InputState;
}

/// Shared handle so the host can keep a reference to the provider
pub type SharedInput = Rc<RefCell<dyn InputProvider>>;

/// Deterministic pattern: circle-strafe while turning and firing
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    elapsed: f32,
    turn_rate: f32,
    strafe_period: f32,
}

impl ScriptedInput {
    /// Turn at `turn_rate` rad/s, switching strafe side every `strafe_period` seconds
    pub fn new(turn_rate: f32, strafe_period: f32) -> Self {
        Self {
            elapsed: 0.0,
            turn_rate,
            strafe_period,
        }
    }
}

impl Default for ScriptedInput {
    fn default() -> Self {
        Self::new(0.6, 2.0)
    }
}

impl InputProvider for ScriptedInput {
    fn sample(&mut self, delta_time: f32) -> InputState {
        self.elapsed += delta_time;
        let phase = (self.elapsed / self.strafe_period) as u32;
        InputState {
            forward: if phase % 4 == 0 { 1.0 } else { 0.0 },
            strafe: if phase % 2 == 0 { 1.0 } else { -1.0 },
            turn: self.turn_rate * delta_time,
            fire: true,
        }
    }
}

/// Always returns the same state
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantInput(pub InputState);

#[cfg(test)]
impl InputProvider for ConstantInput {
    fn sample(&mut self, _delta_time: f32) -> InputState {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_alternates_strafe() {
        let mut input = ScriptedInput::new(0.0, 1.0);

        let first = input.sample(0.5);
        let second = input.sample(1.0);

        assert_eq!(first.strafe, 1.0);
        assert_eq!(second.strafe, -1.0);
        assert!(first.fire);
    }
}
