//! Per-session state threaded through every tick.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::controller::{Axis, Button, ButtonSet, RawSample, BUTTON_COUNT};
use crate::latch::{LatchController, LatchMode};
use crate::output::{EmitFailures, HeldOutput, OutputEvent, OutputTarget};
use crate::profile::{AimAssistSettings, AxisConfig, Profile, ProfileSource};
use crate::telemetry::Telemetry;

const AXES: [Axis; 4] = [Axis::LeftStickX, Axis::LeftStickY, Axis::RightStickX, Axis::RightStickY];

/// A mapped button, checked and ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedButton {
    pub mode: LatchMode,
    pub target: OutputTarget,
    /// Analog activation level, L2/R2 only.
    pub threshold: Option<f32>,
}

/// A profile with every axis and button validated.
///
/// Malformed entries are replaced by identity shaping or passthrough latching
/// for that entry alone, and described in [`ResolvedProfile::warnings`].
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    profile: Arc<Profile>,
    axes: [AxisConfig; 4],
    aim_assist: AimAssistSettings,
    buttons: [Option<ResolvedButton>; BUTTON_COUNT],
    warnings: Vec<String>,
}

impl ResolvedProfile {
    #[must_use]
    pub fn resolve(profile: Arc<Profile>) -> Self {
        let mut warnings = Vec::new();

        let axes = AXES.map(|axis| {
            let config = *profile.axes.get(axis);
            match config.validate() {
                Ok(()) => config,
                Err(e) => {
                    warnings.push(format!("{:?}: {}; using identity shaping", axis, e));
                    AxisConfig::identity()
                }
            }
        });

        let aim_assist = match profile.aim_assist.validate() {
            Ok(()) => profile.aim_assist,
            Err(e) => {
                warnings.push(format!("aim_assist: {}; aim assist disabled", e));
                AimAssistSettings {
                    target_ttl_ms: profile.aim_assist.target_ttl_ms,
                    ..AimAssistSettings::disabled()
                }
            }
        };

        let mut buttons: [Option<ResolvedButton>; BUTTON_COUNT] = Default::default();
        for mapping in profile.buttons.iter() {
            let button = mapping.button;
            let mode = match LatchMode::from_mapping(mapping, profile.polling_rate) {
                Ok(mode) => mode,
                Err(e) => {
                    warnings.push(format!("{}; using passthrough", e));
                    LatchMode::passthrough()
                }
            };
            for flag in LatchMode::overridden_flags(mapping) {
                warnings.push(format!("{}: {} flag ignored", button, flag));
            }

            let threshold = match mapping.activation_threshold {
                Some(_) if button.trigger_slot().is_none() => {
                    warnings.push(format!("{}: activation_threshold only applies to L2 and R2", button));
                    None
                }
                Some(t) if !(t > 0.0 && t <= 1.0) => {
                    warnings.push(format!("{}: activation_threshold {} must be in (0, 1]", button, t));
                    None
                }
                other => other,
            };

            buttons[button.index()] = Some(ResolvedButton {
                mode,
                target: OutputTarget::from(&mapping.output),
                threshold,
            });
        }

        Self {
            profile,
            axes,
            aim_assist,
            buttons,
            warnings,
        }
    }

    #[must_use]
    pub fn profile(&self) -> &Arc<Profile> {
        &self.profile
    }

    #[must_use]
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        &self.axes[axis.index()]
    }

    /// Aim assist settings, disabled when the profile's were out of range.
    #[must_use]
    pub fn aim_assist(&self) -> &AimAssistSettings {
        &self.aim_assist
    }

    #[must_use]
    pub fn button(&self, button: Button) -> Option<&ResolvedButton> {
        self.buttons[button.index()].as_ref()
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Outputs currently held down.
///
/// Targets are tracked per source button, and every key, mouse button and
/// action they contain is reference counted. The host sees a press when a
/// part's count leaves zero and a release when it returns to zero, so two
/// buttons mapped to the same key produce one press and one release.
#[derive(Debug, Clone, Default)]
pub struct OutputState {
    held: [Option<OutputTarget>; BUTTON_COUNT],
    counts: HashMap<HeldOutput, u32>,
}

impl OutputState {
    #[must_use]
    pub fn is_held(&self, button: Button) -> bool {
        self.held[button.index()].is_some()
    }

    #[must_use]
    pub fn held_count(&self) -> usize {
        self.held.iter().flatten().count()
    }

    /// Number of held targets containing `part`.
    #[must_use]
    pub fn part_count(&self, part: &HeldOutput) -> u32 {
        self.counts.get(part).copied().unwrap_or(0)
    }

    /// Moves to the `desired` outputs, appending one release or press per
    /// part whose held state changes. Releases come before presses; chords
    /// release in reverse.
    pub fn transition<'a, F>(&mut self, desired: F, events: &mut Vec<OutputEvent>)
    where
        F: Fn(Button) -> Option<&'a OutputTarget>,
    {
        let mut released = Vec::new();
        let mut pressed = Vec::new();
        for button in Button::ALL {
            let want = desired(button);
            let slot = &mut self.held[button.index()];
            if slot.as_ref() == want {
                continue;
            }
            if let Some(old) = slot.take() {
                released.extend(old.parts().into_iter().rev());
            }
            if let Some(target) = want {
                pressed.extend(target.parts());
                *slot = Some(target.clone());
            }
        }
        if released.is_empty() && pressed.is_empty() {
            return;
        }

        let before: HashMap<&HeldOutput, u32> = released
            .iter()
            .chain(&pressed)
            .map(|part| (part, self.part_count(part)))
            .collect();
        for part in &released {
            self.decrement(part);
        }
        for part in &pressed {
            *self.counts.entry(part.clone()).or_insert(0) += 1;
        }

        let mut emitted = HashSet::new();
        for part in &released {
            if before.get(part).copied().unwrap_or(0) > 0 && self.part_count(part) == 0 && emitted.insert(part) {
                events.push(part.event(false));
            }
        }
        for part in &pressed {
            if before.get(part).copied().unwrap_or(0) == 0 && emitted.insert(part) {
                events.push(part.event(true));
            }
        }
    }

    /// Releases everything held.
    pub fn release_all(&mut self, events: &mut Vec<OutputEvent>) {
        self.transition(|_| None, events);
    }

    fn decrement(&mut self, part: &HeldOutput) {
        let remaining = match self.counts.get_mut(part) {
            Some(count) => {
                *count -= 1;
                *count
            }
            None => return,
        };
        if remaining == 0 {
            self.counts.remove(part);
        }
    }
}

/// Everything the polling loop carries from one tick to the next.
#[derive(Debug)]
pub struct SessionContext {
    profiles: ProfileSource,
    resolved: ResolvedProfile,
    latches: LatchController,
    outputs: OutputState,
    telemetry: Telemetry,
    connected: bool,
    virtual_buttons: ButtonSet,
    mouse_remainder: (f32, f32),
}

impl SessionContext {
    #[must_use]
    pub fn new(profiles: ProfileSource, emit_failures: EmitFailures) -> Self {
        let resolved = ResolvedProfile::resolve(profiles.current());
        log_warnings(&resolved);
        Self {
            profiles,
            resolved,
            latches: LatchController::new(),
            outputs: OutputState::default(),
            telemetry: Telemetry::new(emit_failures),
            connected: false,
            virtual_buttons: ButtonSet::empty(),
            mouse_remainder: (0.0, 0.0),
        }
    }

    /// Picks up a newly published profile. Returns `true` if it changed.
    pub fn refresh_profile(&mut self) -> bool {
        let current = self.profiles.current();
        if Arc::ptr_eq(&current, self.resolved.profile()) {
            return false;
        }
        self.apply_profile(current);
        true
    }

    fn apply_profile(&mut self, profile: Arc<Profile>) {
        info!("Switching to profile '{}'", profile.name);
        self.resolved = ResolvedProfile::resolve(profile);
        log_warnings(&self.resolved);

        let resolved = &self.resolved;
        self.latches.retain_mapped(&resolved.profile().buttons, |button| {
            resolved
                .button(button)
                .map_or(LatchMode::passthrough(), |b| b.mode)
        });
    }

    #[must_use]
    pub fn profile(&self) -> &Arc<Profile> {
        self.resolved.profile()
    }

    #[must_use]
    pub fn resolved(&self) -> &ResolvedProfile {
        &self.resolved
    }

    #[must_use]
    pub fn latches(&self) -> &LatchController {
        &self.latches
    }

    #[must_use]
    pub fn outputs(&self) -> &OutputState {
        &self.outputs
    }

    #[must_use]
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn telemetry_mut(&mut self) -> &mut Telemetry {
        &mut self.telemetry
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn virtual_buttons(&self) -> ButtonSet {
        self.virtual_buttons
    }

    /// Prepares for polling after a stop: latches start from idle, outputs
    /// still held are released by the next tick's diff.
    pub fn resume(&mut self) {
        self.latches.reset();
        self.mouse_remainder = (0.0, 0.0);
    }

    /// Tracks the device link. On the tick the device goes away every held
    /// output is released once. Returns whether the tick should be processed.
    pub fn update_connection(&mut self, connected: bool, events: &mut Vec<OutputEvent>) -> bool {
        if self.connected && !connected {
            warn!("Controller disconnected; releasing {} held outputs", self.outputs.held_count());
            self.telemetry.record_disconnect();
            self.outputs.release_all(events);
            self.virtual_buttons = ButtonSet::empty();
            self.mouse_remainder = (0.0, 0.0);
        } else if !self.connected && connected {
            info!("Controller connected");
        }
        self.connected = connected;
        connected
    }

    /// Physical pressed state, reading the analog value for thresholded
    /// triggers.
    #[must_use]
    pub fn physical_buttons(&self, sample: &RawSample) -> ButtonSet {
        let mut pressed = sample.buttons;
        for button in [Button::L2, Button::R2] {
            let threshold = self.resolved.button(button).and_then(|b| b.threshold);
            if let (Some(threshold), Some(slot)) = (threshold, button.trigger_slot()) {
                pressed.set(button, sample.triggers[slot] >= threshold);
            }
        }
        pressed
    }

    /// Runs every button through its latch and counts new virtual presses.
    pub fn resolve_latches(&mut self, physical: ButtonSet) -> ButtonSet {
        let mut virtual_buttons = ButtonSet::empty();
        for button in Button::ALL {
            let mode = self.resolved.button(button).map(|b| &b.mode);
            let on = self.latches.resolve(button, mode, physical.contains(button));
            virtual_buttons.set(button, on);
            if on && !self.virtual_buttons.contains(button) {
                self.telemetry.record_press(button);
            }
        }
        self.virtual_buttons = virtual_buttons;
        virtual_buttons
    }

    /// Emits key and mouse button transitions for the current virtual state.
    pub fn diff_buttons(&mut self, events: &mut Vec<OutputEvent>) {
        let resolved = &self.resolved;
        let virtual_buttons = self.virtual_buttons;
        self.outputs.transition(
            |button| {
                if virtual_buttons.contains(button) {
                    resolved.button(button).map(|b| &b.target)
                } else {
                    None
                }
            },
            events,
        );
    }

    /// Converts the blended right stick into whole-pixel mouse movement,
    /// carrying the fractional part to the next tick.
    pub fn emit_mouse(&mut self, x: f32, y: f32, events: &mut Vec<OutputEvent>) {
        let profile = self.resolved.profile();
        if !profile.mouse.enabled {
            return;
        }
        let pixels_per_tick = profile.mouse.speed_px_per_sec / profile.polling_rate.hz() as f32;
        let sens_x = self.resolved.axis(Axis::RightStickX).sensitivity;
        let sens_y = self.resolved.axis(Axis::RightStickY).sensitivity;

        let fx = clamp_unit(x) * sens_x * pixels_per_tick + self.mouse_remainder.0;
        let fy = clamp_unit(y) * sens_y * pixels_per_tick + self.mouse_remainder.1;
        let (dx, dy) = (fx.trunc(), fy.trunc());
        self.mouse_remainder = (fx - dx, fy - dy);

        if dx != 0.0 || dy != 0.0 {
            events.push(OutputEvent::MouseMove {
                dx: dx as i32,
                dy: dy as i32,
            });
        }
    }
}

#[inline]
fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fn log_warnings(resolved: &ResolvedProfile) {
    for warning in resolved.warnings() {
        warn!("Profile '{}': {}", resolved.profile().name, warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{profile_channel, ButtonMapping, ButtonOutput, MouseButton, PollingRate};

    fn key(code: &str, down: bool) -> OutputEvent {
        OutputEvent::Key {
            code: Arc::from(code),
            down,
        }
    }

    fn session(profile: Profile) -> (crate::profile::ProfileHandle, SessionContext) {
        let (handle, source) = profile_channel(profile);
        (handle, SessionContext::new(source, EmitFailures::default()))
    }

    fn one_button(mapping: ButtonMapping) -> Profile {
        Profile {
            buttons: [mapping].into_iter().collect(),
            ..Profile::default()
        }
    }

    // ==================== ResolvedProfile Tests ====================

    #[test]
    fn test_invalid_axis_falls_back_to_identity() {
        let mut profile = Profile::default();
        profile.axes.left_stick_x.deadzone_inner = 0.9;
        profile.axes.left_stick_x.deadzone_outer = 0.5;

        let resolved = ResolvedProfile::resolve(Arc::new(profile));
        assert_eq!(*resolved.axis(Axis::LeftStickX), AxisConfig::identity());
        assert_eq!(*resolved.axis(Axis::LeftStickY), AxisConfig::default());
        assert_eq!(resolved.warnings().len(), 1);
    }

    #[test]
    fn test_invalid_button_falls_back_to_passthrough() {
        let profile = one_button(ButtonMapping {
            turbo: true,
            turbo_rate_hz: 0.0,
            ..ButtonMapping::key(Button::Circle, "KeyC")
        });
        let resolved = ResolvedProfile::resolve(Arc::new(profile));
        let circle = resolved.button(Button::Circle).unwrap();
        assert_eq!(circle.mode, LatchMode::passthrough());
        assert_eq!(circle.target, OutputTarget::Key(Arc::from("KeyC")));
        assert_eq!(resolved.warnings().len(), 1);
    }

    #[test]
    fn test_threshold_only_on_triggers() {
        let profile = one_button(ButtonMapping {
            activation_threshold: Some(0.5),
            ..ButtonMapping::key(Button::Cross, "Space")
        });
        let resolved = ResolvedProfile::resolve(Arc::new(profile));
        assert_eq!(resolved.button(Button::Cross).unwrap().threshold, None);
        assert_eq!(resolved.warnings().len(), 1);
    }

    #[test]
    fn test_out_of_range_aim_assist_disabled() {
        let mut profile = Profile::default();
        profile.aim_assist.snap_to_target = true;
        profile.aim_assist.pull_strength = 4.0;

        let resolved = ResolvedProfile::resolve(Arc::new(profile));
        assert!(!resolved.aim_assist().enabled);
        assert_eq!(resolved.aim_assist().target_ttl_ms, 250);
        assert_eq!(resolved.warnings().len(), 1);
        assert!(resolved.warnings()[0].contains("pull_strength"));
    }

    #[test]
    fn test_nan_stabilization_rejected() {
        let mut profile = Profile::default();
        profile.aim_assist.stabilization_strength = f32::NAN;

        let resolved = ResolvedProfile::resolve(Arc::new(profile));
        assert!(!resolved.aim_assist().enabled);
        assert_eq!(resolved.warnings().len(), 1);
    }

    #[test]
    fn test_swapped_in_aim_assist_validated() {
        let (handle, mut ctx) = session(Profile::default());
        assert!(ctx.resolved().aim_assist().enabled);

        let mut bad = Profile::default();
        bad.aim_assist.slowdown_factor = -0.5;
        handle.replace(bad);
        assert!(ctx.refresh_profile());
        assert!(!ctx.resolved().aim_assist().enabled);
    }

    #[test]
    fn test_default_profile_resolves_cleanly() {
        let resolved = ResolvedProfile::resolve(Arc::new(Profile::default()));
        assert!(resolved.warnings().is_empty());
        assert_eq!(resolved.button(Button::R2).unwrap().threshold, Some(0.3));
    }

    // ==================== OutputState Tests ====================

    #[test]
    fn test_transition_one_event_per_change() {
        let a = OutputTarget::Key(Arc::from("KeyA"));
        let mut state = OutputState::default();
        let mut events = Vec::new();

        state.transition(|b| (b == Button::Cross).then_some(&a), &mut events);
        state.transition(|b| (b == Button::Cross).then_some(&a), &mut events);
        assert_eq!(events, vec![key("KeyA", true)]);
        assert!(state.is_held(Button::Cross));

        state.release_all(&mut events);
        assert_eq!(events, vec![key("KeyA", true), key("KeyA", false)]);
        assert_eq!(state.held_count(), 0);
    }

    #[test]
    fn test_transition_swaps_changed_target() {
        let a = OutputTarget::Key(Arc::from("KeyA"));
        let b = OutputTarget::Key(Arc::from("KeyB"));
        let mut state = OutputState::default();
        let mut events = Vec::new();

        state.transition(|btn| (btn == Button::Cross).then_some(&a), &mut events);
        events.clear();
        state.transition(|btn| (btn == Button::Cross).then_some(&b), &mut events);
        assert_eq!(events, vec![key("KeyA", false), key("KeyB", true)]);
    }

    #[test]
    fn test_shared_key_pressed_and_released_once() {
        let space = OutputTarget::Key(Arc::from("Space"));
        let mut state = OutputState::default();
        let mut events = Vec::new();

        state.transition(|b| matches!(b, Button::Cross | Button::L1).then_some(&space), &mut events);
        assert_eq!(events, vec![key("Space", true)]);
        assert_eq!(state.part_count(&HeldOutput::Key(Arc::from("Space"))), 2);

        // L1 still holds Space
        events.clear();
        state.transition(|b| (b == Button::L1).then_some(&space), &mut events);
        assert!(events.is_empty());

        state.release_all(&mut events);
        assert_eq!(events, vec![key("Space", false)]);
    }

    #[test]
    fn test_chords_sharing_a_modifier() {
        let chord = |keys: [&str; 2]| {
            OutputTarget::from(&ButtonOutput::Macro {
                keys: keys.iter().map(|k| k.to_string()).collect(),
            })
        };
        let undo = chord(["ControlLeft", "KeyZ"]);
        let redo = chord(["ControlLeft", "KeyY"]);
        let mut state = OutputState::default();
        let mut events = Vec::new();

        state.transition(
            |b| match b {
                Button::Square => Some(&undo),
                Button::Triangle => Some(&redo),
                _ => None,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![key("ControlLeft", true), key("KeyZ", true), key("KeyY", true)]
        );

        events.clear();
        state.transition(|b| (b == Button::Triangle).then_some(&redo), &mut events);
        assert_eq!(events, vec![key("KeyZ", false)]);

        events.clear();
        state.release_all(&mut events);
        assert_eq!(events, vec![key("KeyY", false), key("ControlLeft", false)]);
    }

    #[test]
    fn test_handover_between_buttons_emits_nothing() {
        let space = OutputTarget::Key(Arc::from("Space"));
        let mut state = OutputState::default();
        let mut events = Vec::new();

        state.transition(|b| (b == Button::Cross).then_some(&space), &mut events);
        events.clear();
        state.transition(|b| (b == Button::L1).then_some(&space), &mut events);
        assert!(events.is_empty());
        assert!(state.is_held(Button::L1));
        assert!(!state.is_held(Button::Cross));
    }

    // ==================== SessionContext Tests ====================

    #[test]
    fn test_trigger_threshold_reads_analog_value() {
        let (_handle, ctx) = session(Profile::default());
        let mut sample = RawSample::neutral();
        sample.triggers = [0.1, 0.5];
        let pressed = ctx.physical_buttons(&sample);
        assert!(!pressed.contains(Button::L2));
        assert!(pressed.contains(Button::R2));

        // Digital bit alone does not press a thresholded trigger
        let sample = RawSample::neutral().with_button(Button::R2, true);
        assert!(!ctx.physical_buttons(&sample).contains(Button::R2));
    }

    #[test]
    fn test_heatmap_counts_virtual_presses() {
        let (_handle, mut ctx) = session(one_button(ButtonMapping {
            sticky: true,
            ..ButtonMapping::key(Button::Circle, "KeyC")
        }));
        let pressed = ButtonSet::from_iter([Button::Circle]);
        ctx.resolve_latches(pressed);
        ctx.resolve_latches(ButtonSet::empty());
        ctx.resolve_latches(pressed);
        ctx.resolve_latches(ButtonSet::empty());
        // One virtual press despite two physical presses
        assert_eq!(ctx.telemetry().heatmap().get(Button::Circle), 1);
    }

    #[test]
    fn test_disconnect_releases_once() {
        let (_handle, mut ctx) = session(Profile::default());
        let mut events = Vec::new();
        assert!(ctx.update_connection(true, &mut events));
        ctx.resolve_latches(ButtonSet::from_iter([Button::Cross]));
        ctx.diff_buttons(&mut events);
        assert_eq!(events, vec![key("Space", true)]);

        events.clear();
        assert!(!ctx.update_connection(false, &mut events));
        assert_eq!(events, vec![key("Space", false)]);

        events.clear();
        assert!(!ctx.update_connection(false, &mut events));
        assert!(events.is_empty());
        assert_eq!(ctx.telemetry().snapshot().disconnects, 1);
    }

    #[test]
    fn test_profile_swap_keeps_shared_latch() {
        let sticky_circle = ButtonMapping {
            sticky: true,
            ..ButtonMapping::key(Button::Circle, "KeyC")
        };
        let (handle, mut ctx) = session(Profile {
            buttons: [sticky_circle.clone(), ButtonMapping { toggle: true, ..ButtonMapping::key(Button::Cross, "Space") }]
                .into_iter()
                .collect(),
            ..Profile::default()
        });
        ctx.resolve_latches(ButtonSet::from_iter([Button::Circle, Button::Cross]));

        handle.replace(Profile {
            name: "Swapped".into(),
            buttons: [sticky_circle].into_iter().collect(),
            ..Profile::default()
        });
        assert!(ctx.refresh_profile());
        assert!(!ctx.refresh_profile());

        assert!(ctx.latches().state(Button::Circle).unwrap().sticky_engaged);
        assert!(ctx.latches().state(Button::Cross).is_none());
        let virtual_buttons = ctx.resolve_latches(ButtonSet::empty());
        assert!(virtual_buttons.contains(Button::Circle));
        assert!(!virtual_buttons.contains(Button::Cross));
    }

    #[test]
    fn test_unmapped_button_emits_nothing() {
        let (_handle, mut ctx) = session(one_button(ButtonMapping::new(
            Button::L2,
            ButtonOutput::MouseButton { button: MouseButton::Right },
        )));
        let mut events = Vec::new();
        ctx.resolve_latches(ButtonSet::from_iter([Button::Triangle]));
        ctx.diff_buttons(&mut events);
        assert!(events.is_empty());
        assert!(ctx.virtual_buttons().contains(Button::Triangle));
    }

    #[test]
    fn test_mouse_subpixel_carry() {
        let profile = Profile {
            polling_rate: PollingRate::Hz1000,
            ..Profile::default()
        };
        let (_handle, mut ctx) = session(profile);
        let mut events = Vec::new();
        // 1500 px/s at 1000 Hz: 1.5 px per tick at full deflection
        ctx.emit_mouse(1.0, 0.0, &mut events);
        ctx.emit_mouse(1.0, 0.0, &mut events);
        assert_eq!(
            events,
            vec![
                OutputEvent::MouseMove { dx: 1, dy: 0 },
                OutputEvent::MouseMove { dx: 2, dy: 0 },
            ]
        );
    }

    #[test]
    fn test_mouse_clamps_and_skips_zero() {
        let (_handle, mut ctx) = session(Profile::default());
        let mut events = Vec::new();
        ctx.emit_mouse(0.0, 0.0, &mut events);
        assert!(events.is_empty());

        ctx.emit_mouse(5.0, -5.0, &mut events);
        assert_eq!(events, vec![OutputEvent::MouseMove { dx: 1, dy: -1 }]);
    }

    #[test]
    fn test_mouse_disabled() {
        let mut profile = Profile::default();
        profile.mouse.enabled = false;
        let (_handle, mut ctx) = session(profile);
        let mut events = Vec::new();
        ctx.emit_mouse(1.0, 1.0, &mut events);
        assert!(events.is_empty());
    }
}
