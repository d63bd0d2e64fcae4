//! Input handling
//!
//! Input polling itself is platform-specific; an [`InputSource`] feeds key
//! transitions into the per-frame [`Input`] snapshot components read.

use std::collections::VecDeque;

use glam::Vec2;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Logical keys the runtime understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Escape,
    Tab,
}

/// Input state manager
#[derive(Debug, Default)]
pub struct Input {
    /// Currently pressed keys
    pressed_keys: FxHashSet<Key>,
    /// Keys that were just pressed this frame
    just_pressed_keys: FxHashSet<Key>,
    /// Keys that were just released this frame
    just_released_keys: FxHashSet<Key>,
    /// Current pointer position
    pointer_position: Vec2,
}

impl Input {
    /// Create a new input manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the end of each frame to clear per-frame state
    pub fn update(&mut self) {
        self.just_pressed_keys.clear();
        self.just_released_keys.clear();
    }

    /// Process a key transition
    pub fn process_key(&mut self, key: Key, pressed: bool) {
        if pressed {
            if self.pressed_keys.insert(key) {
                self.just_pressed_keys.insert(key);
            }
        } else if self.pressed_keys.remove(&key) {
            self.just_released_keys.insert(key);
        }
    }

    /// Process pointer movement
    pub fn process_pointer(&mut self, position: Vec2) {
        self.pointer_position = position;
    }

    /// Check if a key is currently pressed
    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Check if any of the keys is pressed
    pub fn any_pressed(&self, keys: &[Key]) -> bool {
        keys.iter().any(|key| self.is_key_pressed(*key))
    }

    /// Check if a key was just pressed this frame
    pub fn is_key_just_pressed(&self, key: Key) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    /// Check if a key was just released this frame
    pub fn is_key_just_released(&self, key: Key) -> bool {
        self.just_released_keys.contains(&key)
    }

    /// Get current pointer position
    pub fn pointer_position(&self) -> Vec2 {
        self.pointer_position
    }
}

/// Something that produces input events once per frame
pub trait InputSource {
    /// Feed this frame's events into `input`
    fn poll(&mut self, input: &mut Input);
}

/// No input at all
#[derive(Debug, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self, _input: &mut Input) {}
}

/// Plays back a fixed list of per-frame key transitions
#[derive(Debug, Default)]
pub struct ScriptedInput {
    frames: VecDeque<Vec<(Key, bool)>>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one frame of transitions
    #[must_use]
    pub fn then(mut self, events: Vec<(Key, bool)>) -> Self {
        self.frames.push_back(events);
        self
    }

    /// Append `count` frames with no transitions
    #[must_use]
    pub fn idle(mut self, count: usize) -> Self {
        self.frames.extend(std::iter::repeat_with(Vec::new).take(count));
        self
    }

    /// Frames left to play
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, input: &mut Input) {
        if let Some(events) = self.frames.pop_front() {
            for (key, pressed) in events {
                input.process_key(key, pressed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let mut input = Input::new();
        input.process_key(Key::W, true);
        assert!(input.is_key_pressed(Key::W));
        assert!(input.is_key_just_pressed(Key::W));

        input.update();
        input.process_key(Key::W, true);
        assert!(!input.is_key_just_pressed(Key::W), "held key is not a new press");

        input.process_key(Key::W, false);
        assert!(!input.is_key_pressed(Key::W));
        assert!(input.is_key_just_released(Key::W));
    }

    #[test]
    fn test_scripted_playback() {
        let mut source = ScriptedInput::new()
            .then(vec![(Key::Left, true)])
            .idle(1)
            .then(vec![(Key::Left, false)]);
        let mut input = Input::new();

        source.poll(&mut input);
        assert!(input.any_pressed(&[Key::A, Key::Left]));
        input.update();

        source.poll(&mut input);
        assert!(input.is_key_pressed(Key::Left));
        input.update();

        source.poll(&mut input);
        assert!(!input.is_key_pressed(Key::Left));
        assert_eq!(source.remaining(), 0);
    }
}
