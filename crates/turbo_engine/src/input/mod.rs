//! Input management system
//!
//! [`InputManager`] turns one raw pressed/not-pressed table per frame into
//! edge-aware [`KeyState`]s and derived movement axes. It is an explicit
//! context object: create one, share it (for example behind an `Arc`) with
//! whoever polls events and whoever reads input. Every accessor takes the
//! same lock, so each call is atomic but two calls are not.

use std::sync::{Mutex, MutexGuard, PoisonError};

use bitflags::bitflags;

use crate::foundation::math::Vec2;

/// Size of the raw key table, indexed by scancode
pub const KEY_COUNT: usize = 512;

/// Maximum bytes held by the text input buffer
pub const TEXT_INPUT_CAPACITY: usize = 256;

/// Per-key state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    /// Up, and up last frame
    #[default]
    Released,
    /// Down, and down last frame
    Held,
    /// Up this frame after being down
    JustReleased,
    /// Down this frame after being up
    JustPressed,
}

impl KeyState {
    /// State after one frame with the raw key `down` or not
    pub fn next(self, down: bool) -> Self {
        match (self, down) {
            (Self::Released | Self::JustReleased, true) => Self::JustPressed,
            (Self::JustPressed | Self::Held, true) => Self::Held,
            (Self::JustPressed | Self::Held, false) => Self::JustReleased,
            (Self::Released | Self::JustReleased, false) => Self::Released,
        }
    }

    /// Held or just pressed
    pub fn is_down(self) -> bool {
        matches!(self, Self::Held | Self::JustPressed)
    }

    /// Released or just released
    pub fn is_up(self) -> bool {
        !self.is_down()
    }

    /// Pressed this frame
    pub fn is_just_pressed(self) -> bool {
        self == Self::JustPressed
    }

    /// Released this frame
    pub fn is_just_released(self) -> bool {
        self == Self::JustReleased
    }
}

/// Keys the game reads, valued by USB HID scancode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum KeyCode {
    A = 4,
    B = 5,
    C = 6,
    D = 7,
    E = 8,
    F = 9,
    G = 10,
    H = 11,
    I = 12,
    J = 13,
    K = 14,
    L = 15,
    M = 16,
    N = 17,
    O = 18,
    P = 19,
    Q = 20,
    R = 21,
    S = 22,
    T = 23,
    U = 24,
    V = 25,
    W = 26,
    X = 27,
    Y = 28,
    Z = 29,
    Return = 40,
    Escape = 41,
    Backspace = 42,
    Space = 44,
    Right = 79,
    Left = 80,
    Down = 81,
    Up = 82,
    LAlt = 226,
}

impl KeyCode {
    /// Index into the raw key table
    pub fn scancode(self) -> usize {
        self as usize
    }
}

bitflags! {
    /// Input modes toggled at runtime
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InputModes: u8 {
        /// Keys other than Return are ignored while text is being typed
        const TEXT_INPUT = 0b0000_0001;
    }
}

/// Platform hook for switching text entry (IME, on-screen keyboard) on and
/// off
pub trait TextInputControl {
    /// Begin delivering text events
    fn start_text_input(&mut self);
    /// Stop delivering text events
    fn stop_text_input(&mut self);
}

struct InputState {
    keys: [KeyState; KEY_COUNT],
    horizontal: f32,
    vertical: f32,
    modes: InputModes,
    text: String,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            keys: [KeyState::Released; KEY_COUNT],
            horizontal: 0.0,
            vertical: 0.0,
            modes: InputModes::empty(),
            text: String::new(),
        }
    }
}

impl InputState {
    fn down(&self, a: KeyCode, b: KeyCode) -> bool {
        self.keys[a.scancode()].is_down() || self.keys[b.scancode()].is_down()
    }
}

/// Edge-detecting keyboard state
#[derive(Default)]
pub struct InputManager {
    state: Mutex<InputState>,
}

impl InputManager {
    /// All keys released, no text input
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InputState> {
        // A poisoned table is still a valid table
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance every key by one frame from the raw table (`true` = down)
    /// and recompute the movement axes.
    ///
    /// Call once per frame. While text input is active only Return is
    /// updated.
    pub fn update(&self, raw: &[bool]) {
        let mut state = self.lock();
        let text_input = state.modes.contains(InputModes::TEXT_INPUT);
        for (scancode, down) in raw.iter().copied().enumerate().take(KEY_COUNT) {
            if text_input && scancode != KeyCode::Return.scancode() {
                continue;
            }
            state.keys[scancode] = state.keys[scancode].next(down);
        }

        let mut horizontal = 0.0;
        if state.down(KeyCode::Right, KeyCode::D) {
            horizontal += 1.0;
        }
        if state.down(KeyCode::Left, KeyCode::A) {
            horizontal -= 1.0;
        }
        let mut vertical = 0.0;
        if state.down(KeyCode::Up, KeyCode::W) {
            vertical -= 1.0;
        }
        if state.down(KeyCode::Down, KeyCode::S) {
            vertical += 1.0;
        }
        state.horizontal = horizontal;
        state.vertical = vertical;
    }

    /// State of one key
    pub fn key(&self, key: KeyCode) -> KeyState {
        self.lock().keys[key.scancode()]
    }

    /// Movement direction: zero, or unit length
    pub fn vector_movement(&self) -> Vec2 {
        let state = self.lock();
        let movement = Vec2::new(state.horizontal, state.vertical);
        if movement.norm() == 0.0 {
            movement
        } else {
            movement.normalize()
        }
    }

    /// Horizontal axis: -1, 0 or 1
    pub fn axis_horizontal(&self) -> f32 {
        self.lock().horizontal
    }

    /// Vertical axis, down positive: -1, 0 or 1
    pub fn axis_vertical(&self) -> f32 {
        self.lock().vertical
    }

    /// Space or left Alt pressed this frame
    pub fn trigger_jump(&self) -> bool {
        let state = self.lock();
        state.keys[KeyCode::Space.scancode()].is_just_pressed()
            || state.keys[KeyCode::LAlt.scancode()].is_just_pressed()
    }

    /// Switch text input on or off, telling the platform
    pub fn toggle_text_input(&self, platform: &mut dyn TextInputControl) {
        let mut state = self.lock();
        if state.modes.contains(InputModes::TEXT_INPUT) {
            platform.stop_text_input();
        } else {
            platform.start_text_input();
        }
        state.modes.toggle(InputModes::TEXT_INPUT);
    }

    /// True while text input is on
    pub fn is_text_input_active(&self) -> bool {
        self.lock().modes.contains(InputModes::TEXT_INPUT)
    }

    /// Append typed text, dropping characters that would overflow the
    /// buffer
    pub fn push_text(&self, text: &str) {
        append_limited(&mut self.lock().text, text);
    }

    /// Remove the last character (backspace)
    pub fn pop_char(&self) -> Option<char> {
        self.lock().text.pop()
    }

    /// Copy of the typed text
    pub fn text_input_buffer(&self) -> String {
        self.lock().text.clone()
    }

    /// Replace the typed text, truncated to capacity
    pub fn set_text_input_buffer(&self, text: &str) {
        let mut state = self.lock();
        state.text.clear();
        append_limited(&mut state.text, text);
    }
}

fn append_limited(buffer: &mut String, text: &str) {
    for ch in text.chars() {
        if buffer.len() + ch.len_utf8() > TEXT_INPUT_CAPACITY {
            break;
        }
        buffer.push(ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn raw(keys: &[KeyCode]) -> Vec<bool> {
        let mut table = vec![false; KEY_COUNT];
        for key in keys {
            table[key.scancode()] = true;
        }
        table
    }

    #[test]
    fn test_transition_table() {
        use KeyState::*;
        let cases = [
            (Released, true, JustPressed),
            (Released, false, Released),
            (JustPressed, true, Held),
            (JustPressed, false, JustReleased),
            (Held, true, Held),
            (Held, false, JustReleased),
            (JustReleased, true, JustPressed),
            (JustReleased, false, Released),
        ];
        for (previous, down, expected) in cases {
            assert_eq!(previous.next(down), expected, "{previous:?} + {down}");
        }
    }

    #[test]
    fn test_press_then_hold() {
        let input = InputManager::new();
        input.update(&raw(&[KeyCode::Space]));
        assert_eq!(input.key(KeyCode::Space), KeyState::JustPressed);
        assert!(input.trigger_jump());
        input.update(&raw(&[KeyCode::Space]));
        assert_eq!(input.key(KeyCode::Space), KeyState::Held);
        assert!(!input.trigger_jump());
        input.update(&raw(&[]));
        assert_eq!(input.key(KeyCode::Space), KeyState::JustReleased);
        input.update(&raw(&[]));
        assert_eq!(input.key(KeyCode::Space), KeyState::Released);
    }

    #[test]
    fn test_left_alt_triggers_jump() {
        let input = InputManager::new();
        input.update(&raw(&[KeyCode::LAlt]));
        assert!(input.trigger_jump());
    }

    #[test]
    fn test_movement_is_zero_or_unit() {
        let horizontal = [&[KeyCode::Left][..], &[], &[KeyCode::D]];
        let vertical = [&[KeyCode::W][..], &[], &[KeyCode::Down]];
        for h in horizontal {
            for v in vertical {
                let input = InputManager::new();
                let keys: Vec<KeyCode> = h.iter().chain(v).copied().collect();
                input.update(&raw(&keys));
                let length = input.vector_movement().norm();
                assert!(length == 0.0 || (length - 1.0).abs() < 1e-6, "{keys:?} gave {length}");
            }
        }
    }

    #[test]
    fn test_axes() {
        let input = InputManager::new();
        input.update(&raw(&[KeyCode::Right, KeyCode::Up]));
        assert_eq!(input.axis_horizontal(), 1.0);
        assert_eq!(input.axis_vertical(), -1.0);
        let movement = input.vector_movement();
        assert_relative_eq!(movement.x, std::f32::consts::FRAC_1_SQRT_2);
        assert_relative_eq!(movement.y, -std::f32::consts::FRAC_1_SQRT_2);

        // Opposite keys cancel
        input.update(&raw(&[KeyCode::Right, KeyCode::A]));
        assert_eq!(input.axis_horizontal(), 0.0);
        assert_eq!(input.vector_movement(), Vec2::zeros());
    }

    #[derive(Default)]
    struct Platform {
        started: usize,
        stopped: usize,
    }

    impl TextInputControl for Platform {
        fn start_text_input(&mut self) {
            self.started += 1;
        }
        fn stop_text_input(&mut self) {
            self.stopped += 1;
        }
    }

    #[test]
    fn test_text_input_ignores_all_but_return() {
        let input = InputManager::new();
        let mut platform = Platform::default();
        input.toggle_text_input(&mut platform);
        assert!(input.is_text_input_active());
        assert_eq!(platform.started, 1);

        input.update(&raw(&[KeyCode::A, KeyCode::Return]));
        assert_eq!(input.key(KeyCode::A), KeyState::Released);
        assert_eq!(input.key(KeyCode::Return), KeyState::JustPressed);

        input.toggle_text_input(&mut platform);
        assert!(!input.is_text_input_active());
        assert_eq!(platform.stopped, 1);
        input.update(&raw(&[KeyCode::A]));
        assert_eq!(input.key(KeyCode::A), KeyState::JustPressed);
    }

    #[test]
    fn test_text_buffer() {
        let input = InputManager::new();
        input.push_text("hi");
        input.push_text("!");
        assert_eq!(input.pop_char(), Some('!'));
        assert_eq!(input.text_input_buffer(), "hi");

        input.set_text_input_buffer(&"x".repeat(300));
        assert_eq!(input.text_input_buffer().len(), TEXT_INPUT_CAPACITY);
    }

    #[test]
    fn test_short_raw_table_only_updates_given_keys() {
        let input = InputManager::new();
        input.update(&[false, false, false, false, true]);
        assert_eq!(input.key(KeyCode::A), KeyState::JustPressed);
        assert_eq!(input.key(KeyCode::Z), KeyState::Released);
    }

    #[test]
    fn test_shared_across_threads() {
        let input = std::sync::Arc::new(InputManager::new());
        let writer = std::sync::Arc::clone(&input);
        std::thread::spawn(move || writer.update(&raw(&[KeyCode::S])))
            .join()
            .unwrap();
        assert_eq!(input.axis_vertical(), 1.0);
    }
}
