//! Host-key-combo detection.
//!
//! Watches the canonical key stream for the configured host combination
//! (e.g. Right Ctrl) and classifies each full-combo gesture:
//!
//! ```text
//! Idle ──member down──► ComboPartial ──full set down──► ComboHeldAlone
//!                                                        │         │
//!                                     other key pressed ─┘         │ member released
//!                                                        ▼         ▼
//!                                             ComboHeldWithOther  capture toggle
//! ```
//!
//! Releasing a member while `ComboHeldAlone` is the "Host key pressed and
//! released on its own" convention, meaning *toggle capture*.  Pressing any
//! other key first demotes the gesture to a hot-key: alphanumerics resolve
//! to host action shortcuts, F1–F12 are forwarded to the guest as a literal
//! Ctrl+Alt+Fn sequence (the conventional way to reach a Linux guest's
//! virtual terminals through the combo).
//!
//! Entering the fully-held state uses exact *set* equality against the
//! configured combo — holding extra non-combo keys alongside the full combo
//! demotes straight to hot-key mode rather than triggering a capture
//! toggle.  That asymmetry is long-standing observed behavior and is kept.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, trace};
use vminput_core::keymap::KeyTranslator;
use vminput_core::scancode::stream::ScanCodeStream;
use vminput_core::scancode::{KeyFlags, ScanCode};

use super::keystate::{PressedKeySnapshot, PressedKeyTable};

/// Identity of a canonical key: the set-1 base code plus the extended bit.
///
/// Left Ctrl (1D) and Right Ctrl (E0-1D) are distinct combo members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ComboKey {
    pub code: ScanCode,
    pub extended: bool,
}

/// The configured set of canonical keys defining the host combination.
///
/// Immutable per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostComboKeySet {
    keys: Vec<ComboKey>,
}

impl HostComboKeySet {
    /// Builds a combo set from (code, flags) pairs.  Duplicates collapse.
    pub fn new(keys: impl IntoIterator<Item = (ScanCode, KeyFlags)>) -> Self {
        let mut keys: Vec<ComboKey> = keys
            .into_iter()
            .map(|(code, flags)| ComboKey {
                code,
                extended: flags.extended(),
            })
            .collect();
        keys.sort();
        keys.dedup();
        Self { keys }
    }

    /// Returns `true` if the (code, extended) pair is a combo member.
    pub fn contains(&self, code: ScanCode, extended: bool) -> bool {
        self.keys.binary_search(&ComboKey { code, extended }).is_ok()
    }

    /// Number of keys in the combination.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no combo is configured (detection disabled).
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates the members in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = ComboKey> + '_ {
        self.keys.iter().copied()
    }
}

/// Detector state.  See the module docs for the transition diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboState {
    Idle,
    ComboPartial,
    ComboHeldAlone,
    ComboHeldWithOther,
}

/// What the handler must do in response to a key event, as decided by the
/// detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComboOutcome {
    /// Not a combo gesture; forward the event normally.
    Forward,
    /// Combo member while the gesture is in flight; do not forward.
    Swallow,
    /// Full combo released on its own: toggle keyboard capture.  The
    /// attached stream releases any combo keys the guest may believe are
    /// still down.
    ToggleCapture(ScanCodeStream),
    /// Combo exited after demotion to hot-key mode; just clean up.
    ComboEnded(ScanCodeStream),
    /// Combo + alphanumeric: run the host action bound to this symbol.
    HostShortcut(char),
    /// Combo + F1–F12: forward a Ctrl+Alt+Fn sequence to the guest.
    ConsoleSwitch(ScanCodeStream),
}

/// The per-session host-key-combo state machine.
#[derive(Debug)]
pub struct HostComboDetector {
    combo: HostComboKeySet,
    state: ComboState,
    /// Transient press records for currently-down combo members.
    pressed_members: BTreeMap<ComboKey, Instant>,
    /// Key-state snapshot taken when the combo became fully held.
    saved_keys: Option<PressedKeySnapshot>,
}

impl HostComboDetector {
    /// Creates a detector for the given host combination.
    pub fn new(combo: HostComboKeySet) -> Self {
        Self {
            combo,
            state: ComboState::Idle,
            pressed_members: BTreeMap::new(),
            saved_keys: None,
        }
    }

    /// Current detector state.
    pub fn state(&self) -> ComboState {
        self.state
    }

    /// Returns `true` while any combo gesture is in flight.
    pub fn gesture_active(&self) -> bool {
        self.state != ComboState::Idle
    }

    /// The configured combo set.
    pub fn combo(&self) -> &HostComboKeySet {
        &self.combo
    }

    /// Feeds one canonical key event through the detector.
    ///
    /// `table` must already reflect this event (the handler records the
    /// transition first); it is consulted for the "no other key pressed"
    /// half of the fully-held check and for the hot-key snapshot.
    pub fn on_key_event(
        &mut self,
        code: ScanCode,
        flags: KeyFlags,
        pressed: bool,
        table: &PressedKeyTable,
    ) -> ComboOutcome {
        if self.combo.is_empty() {
            return ComboOutcome::Forward;
        }
        let key = ComboKey {
            code,
            extended: flags.extended(),
        };
        if self.combo.contains(code, flags.extended()) {
            if pressed {
                self.on_member_pressed(key, table)
            } else {
                self.on_member_released(key, table)
            }
        } else if pressed {
            self.on_other_pressed(code)
        } else {
            // Releases of non-members never change the gesture.
            ComboOutcome::Forward
        }
    }

    fn on_member_pressed(&mut self, key: ComboKey, table: &PressedKeyTable) -> ComboOutcome {
        self.pressed_members.entry(key).or_insert_with(Instant::now);

        let full_set = self.pressed_members.len() == self.combo.len();
        if full_set {
            // Exact-set match requires that nothing outside the combo is
            // down; extra held keys demote straight to hot-key mode.
            if table.any_non_combo_pressed(&self.combo) {
                debug!("host combo completed with extra keys held, hot-key mode");
                self.state = ComboState::ComboHeldWithOther;
            } else {
                debug!("host combo fully held alone");
                self.state = ComboState::ComboHeldAlone;
                self.saved_keys = Some(table.snapshot());
            }
        } else {
            trace!(
                held = self.pressed_members.len(),
                of = self.combo.len(),
                "host combo partial"
            );
            self.state = ComboState::ComboPartial;
        }
        ComboOutcome::Swallow
    }

    fn on_member_released(&mut self, key: ComboKey, table: &PressedKeyTable) -> ComboOutcome {
        if self.pressed_members.remove(&key).is_none() && self.state == ComboState::Idle {
            // Release of a combo key we never saw pressed (e.g. it was down
            // before the session started); nothing to resolve.
            return ComboOutcome::Forward;
        }

        // Key events for unrelated keys carry no ordering guarantee, so a
        // non-member press may have landed in the table without passing
        // through the detector.  The snapshot diff catches that case.
        let newly_pressed = self
            .saved_keys
            .as_ref()
            .is_some_and(|snap| snap.newly_pressed_in(table).next().is_some());
        let was_alone = self.state == ComboState::ComboHeldAlone && !newly_pressed;
        let was_demoted = self.state == ComboState::ComboHeldWithOther;
        self.state = if self.pressed_members.is_empty() {
            ComboState::Idle
        } else {
            ComboState::ComboPartial
        };
        self.saved_keys = None;

        // Whatever happens next, make sure the guest does not end up
        // believing a combo key is stuck down.
        let mut releases = ScanCodeStream::new();
        for member in self.combo.iter() {
            releases.release(member.code, member.extended);
        }

        if was_alone {
            debug!("host combo released alone, toggling capture");
            ComboOutcome::ToggleCapture(releases)
        } else if was_demoted {
            ComboOutcome::ComboEnded(releases)
        } else {
            ComboOutcome::Swallow
        }
    }

    fn on_other_pressed(&mut self, code: ScanCode) -> ComboOutcome {
        match self.state {
            ComboState::ComboHeldAlone | ComboState::ComboHeldWithOther => {
                self.state = ComboState::ComboHeldWithOther;
                if let Some(fn_index) = code.function_key_index() {
                    let mut stream = ScanCodeStream::new();
                    stream.ctrl_alt_fn(fn_index);
                    debug!(fn_index, "host combo + function key, console switch");
                    ComboOutcome::ConsoleSwitch(stream)
                } else if let Some(symbol) = KeyTranslator::set1_to_ascii(code) {
                    debug!(%symbol, "host combo + alphanumeric, host shortcut");
                    ComboOutcome::HostShortcut(symbol)
                } else {
                    // Combo + unbound key: swallowed, not forwarded.
                    ComboOutcome::Swallow
                }
            }
            _ => ComboOutcome::Forward,
        }
    }

    /// Resets all transient state (used on session teardown).
    pub fn reset(&mut self) {
        self.state = ComboState::Idle;
        self.pressed_members.clear();
        self.saved_keys = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RCTRL_EXT: KeyFlags = KeyFlags(KeyFlags::EXTENDED | KeyFlags::MODIFIER);
    const LSHIFT: KeyFlags = KeyFlags(KeyFlags::MODIFIER);
    const PLAIN: KeyFlags = KeyFlags(0);

    fn rctrl_combo() -> HostComboKeySet {
        HostComboKeySet::new(vec![(ScanCode::RIGHT_CTRL, RCTRL_EXT)])
    }

    /// Records the transition in the table, then feeds the detector, the
    /// same order the handler uses.
    fn feed(
        det: &mut HostComboDetector,
        table: &mut PressedKeyTable,
        code: ScanCode,
        flags: KeyFlags,
        pressed: bool,
    ) -> ComboOutcome {
        table.record_key_transition(code, flags.extended(), pressed, false);
        det.on_key_event(code, flags, pressed, table)
    }

    #[test]
    fn test_single_key_combo_press_enters_held_alone() {
        // Arrange
        let mut det = HostComboDetector::new(rctrl_combo());
        let mut table = PressedKeyTable::new();

        // Act
        let outcome = feed(&mut det, &mut table, ScanCode::RIGHT_CTRL, RCTRL_EXT, true);

        // Assert
        assert_eq!(outcome, ComboOutcome::Swallow);
        assert_eq!(det.state(), ComboState::ComboHeldAlone);
    }

    #[test]
    fn test_release_while_held_alone_toggles_capture() {
        // Arrange
        let mut det = HostComboDetector::new(rctrl_combo());
        let mut table = PressedKeyTable::new();
        feed(&mut det, &mut table, ScanCode::RIGHT_CTRL, RCTRL_EXT, true);

        // Act
        let outcome = feed(&mut det, &mut table, ScanCode::RIGHT_CTRL, RCTRL_EXT, false);

        // Assert – toggle plus a guest release for the combo key itself
        match outcome {
            ComboOutcome::ToggleCapture(stream) => {
                assert_eq!(stream.into_bytes(), vec![0xE0, 0x9D]);
            }
            other => panic!("expected ToggleCapture, got {other:?}"),
        }
        assert_eq!(det.state(), ComboState::Idle);
    }

    #[test]
    fn test_combo_completed_with_extra_key_held_is_not_alone() {
        // Exact-set rule: {RightCtrl} pressed while Shift is already down
        // must not arm the capture toggle.
        let mut det = HostComboDetector::new(rctrl_combo());
        let mut table = PressedKeyTable::new();

        feed(&mut det, &mut table, ScanCode::LEFT_SHIFT, LSHIFT, true);
        feed(&mut det, &mut table, ScanCode::RIGHT_CTRL, RCTRL_EXT, true);
        assert_eq!(det.state(), ComboState::ComboHeldWithOther);

        // Releasing the combo member must not toggle capture.
        let outcome = feed(&mut det, &mut table, ScanCode::RIGHT_CTRL, RCTRL_EXT, false);
        assert!(matches!(outcome, ComboOutcome::ComboEnded(_)));
    }

    #[test]
    fn test_other_key_while_held_alone_demotes_to_hot_key() {
        // Arrange
        let mut det = HostComboDetector::new(rctrl_combo());
        let mut table = PressedKeyTable::new();
        feed(&mut det, &mut table, ScanCode::RIGHT_CTRL, RCTRL_EXT, true);

        // Act – 'f' (set-1 0x21) while the combo is held
        let outcome = feed(&mut det, &mut table, ScanCode(0x21), PLAIN, true);

        // Assert
        assert_eq!(outcome, ComboOutcome::HostShortcut('f'));
        assert_eq!(det.state(), ComboState::ComboHeldWithOther);

        // Release of the combo member afterwards must not toggle capture.
        let outcome = feed(&mut det, &mut table, ScanCode::RIGHT_CTRL, RCTRL_EXT, false);
        assert!(matches!(outcome, ComboOutcome::ComboEnded(_)));
    }

    #[test]
    fn test_function_key_while_held_forwards_console_switch() {
        // Arrange
        let mut det = HostComboDetector::new(rctrl_combo());
        let mut table = PressedKeyTable::new();
        feed(&mut det, &mut table, ScanCode::RIGHT_CTRL, RCTRL_EXT, true);

        // Act – F2
        let outcome = feed(&mut det, &mut table, ScanCode(0x3C), PLAIN, true);

        // Assert – literal Ctrl+Alt+F2 sequence
        match outcome {
            ComboOutcome::ConsoleSwitch(stream) => {
                assert_eq!(
                    stream.into_bytes(),
                    vec![0x1D, 0x38, 0x3C, 0xBC, 0xB8, 0x9D]
                );
            }
            other => panic!("expected ConsoleSwitch, got {other:?}"),
        }
    }

    #[test]
    fn test_two_key_combo_requires_full_set() {
        // Arrange – Ctrl+Alt combo (both left-side)
        let combo = HostComboKeySet::new(vec![
            (ScanCode::LEFT_CTRL, KeyFlags(KeyFlags::MODIFIER)),
            (ScanCode::LEFT_ALT, KeyFlags(KeyFlags::MODIFIER)),
        ]);
        let mut det = HostComboDetector::new(combo);
        let mut table = PressedKeyTable::new();

        // Act / Assert – one member is only partial
        feed(
            &mut det,
            &mut table,
            ScanCode::LEFT_CTRL,
            KeyFlags(KeyFlags::MODIFIER),
            true,
        );
        assert_eq!(det.state(), ComboState::ComboPartial);

        feed(
            &mut det,
            &mut table,
            ScanCode::LEFT_ALT,
            KeyFlags(KeyFlags::MODIFIER),
            true,
        );
        assert_eq!(det.state(), ComboState::ComboHeldAlone);

        // Releasing one member from the full set toggles capture.
        let outcome = feed(
            &mut det,
            &mut table,
            ScanCode::LEFT_ALT,
            KeyFlags(KeyFlags::MODIFIER),
            false,
        );
        assert!(matches!(outcome, ComboOutcome::ToggleCapture(_)));
        assert_eq!(det.state(), ComboState::ComboPartial);
    }

    #[test]
    fn test_left_and_right_ctrl_are_distinct_members() {
        // Combo is Right Ctrl; Left Ctrl must behave as an ordinary key.
        let mut det = HostComboDetector::new(rctrl_combo());
        let mut table = PressedKeyTable::new();

        let outcome = feed(
            &mut det,
            &mut table,
            ScanCode::LEFT_CTRL,
            KeyFlags(KeyFlags::MODIFIER),
            true,
        );
        assert_eq!(outcome, ComboOutcome::Forward);
        assert_eq!(det.state(), ComboState::Idle);
    }

    #[test]
    fn test_release_of_member_never_pressed_is_forwarded() {
        let mut det = HostComboDetector::new(rctrl_combo());
        let table = PressedKeyTable::new();

        let outcome = det.on_key_event(ScanCode::RIGHT_CTRL, RCTRL_EXT, false, &table);
        assert_eq!(outcome, ComboOutcome::Forward);
    }

    #[test]
    fn test_empty_combo_disables_detection() {
        let mut det = HostComboDetector::new(HostComboKeySet::new(vec![]));
        let mut table = PressedKeyTable::new();

        let outcome = feed(&mut det, &mut table, ScanCode::RIGHT_CTRL, RCTRL_EXT, true);
        assert_eq!(outcome, ComboOutcome::Forward);
    }
}
