//! Character animation machine
//!
//! Four states, each owning the clip of the same name:
//!
//! - `idle` goes to `walk` on movement and to `dance` on the trigger
//! - `walk` and `run` swap on the run modifier and drop to `idle` as soon as
//!   movement is released; swapping keeps the gait phase
//! - `dance` plays once, holds its last frame and returns to `idle` when the
//!   clip finishes
//!
//! The machine stays empty until the clip table arrives through
//! [`CharacterAnimator::load`].

use super::{FsmError, State, StateMachine, Transition};
use crate::animation::{AnimationLibrary, AnimationMixer, FinishedEvent, ListenerId, LoopMode};
use crate::config::AnimationConfig;
use crate::input::Intents;

/// Looping rest pose
pub const IDLE: &str = "idle";
/// Looping walk cycle
pub const WALK: &str = "walk";
/// Looping run cycle
pub const RUN: &str = "run";
/// One-shot emote
pub const DANCE: &str = "dance";

/// Clips the machine expects in its library
pub const CLIPS: [&str; 4] = [IDLE, WALK, RUN, DANCE];

/// Everything the character states operate on
#[derive(Debug, Default)]
pub struct CharacterProxy {
    /// Actions for every loaded clip
    pub mixer: AnimationMixer,
    /// Intent snapshot for this frame
    pub input: Intents,
    /// Completions reported by the mixer this frame
    pub finished: Vec<FinishedEvent>,
    /// Blend timings
    pub blend: AnimationConfig,
}

impl CharacterProxy {
    fn is_gait(name: &str) -> bool {
        name == WALK || name == RUN
    }

    /// Start a looping clip, cross-fading from `previous` if there is one
    fn start_looping(&mut self, clip: &'static str, previous: Option<&dyn State<Self>>) {
        let Some(previous) = previous.map(|state| state.name()) else {
            self.mixer.play(clip);
            return;
        };

        let phase = if self.blend.sync_gait_phase && Self::is_gait(clip) && Self::is_gait(previous) {
            self.mixer
                .action(previous)
                .filter(|action| action.duration() > 0.0)
                .map(|action| action.time() / action.duration())
        } else {
            None
        };

        let Some(action) = self.mixer.action_mut(clip) else {
            log::warn!("No '{}' clip loaded", clip);
            return;
        };
        action.set_enabled(true);
        match phase {
            Some(phase) => action.set_time(phase * action.duration()),
            None => {
                action.set_time(0.0);
                action.set_time_scale(1.0);
                action.set_weight(1.0);
            }
        }

        self.mixer
            .cross_fade(previous, clip, self.blend.locomotion_blend_seconds);
        self.mixer.play(clip);
    }
}

struct IdleState;

impl State<CharacterProxy> for IdleState {
    fn name(&self) -> &'static str {
        IDLE
    }

    fn enter(&mut self, proxy: &mut CharacterProxy, previous: Option<&dyn State<CharacterProxy>>) {
        proxy.start_looping(IDLE, previous);
    }

    fn update(&mut self, proxy: &mut CharacterProxy, _delta_time: f32) -> Transition {
        if proxy.input.is_moving() {
            Transition::Switch(WALK)
        } else if proxy.input.contains(Intents::TRIGGER) {
            Transition::Switch(DANCE)
        } else {
            Transition::Stay
        }
    }
}

struct WalkState;

impl State<CharacterProxy> for WalkState {
    fn name(&self) -> &'static str {
        WALK
    }

    fn enter(&mut self, proxy: &mut CharacterProxy, previous: Option<&dyn State<CharacterProxy>>) {
        proxy.start_looping(WALK, previous);
    }

    fn update(&mut self, proxy: &mut CharacterProxy, _delta_time: f32) -> Transition {
        match (proxy.input.is_moving(), proxy.input.is_running()) {
            (false, _) => Transition::Switch(IDLE),
            (true, true) => Transition::Switch(RUN),
            (true, false) => Transition::Stay,
        }
    }
}

struct RunState;

impl State<CharacterProxy> for RunState {
    fn name(&self) -> &'static str {
        RUN
    }

    fn enter(&mut self, proxy: &mut CharacterProxy, previous: Option<&dyn State<CharacterProxy>>) {
        proxy.start_looping(RUN, previous);
    }

    fn update(&mut self, proxy: &mut CharacterProxy, _delta_time: f32) -> Transition {
        match (proxy.input.is_moving(), proxy.input.is_running()) {
            (false, _) => Transition::Switch(IDLE),
            (true, false) => Transition::Switch(WALK),
            (true, true) => Transition::Stay,
        }
    }
}

/// One-shot dance; owns its finished-listener for as long as it is current
#[derive(Default)]
struct DanceState {
    listener: Option<ListenerId>,
}

impl DanceState {
    fn release(&mut self, proxy: &mut CharacterProxy) {
        if let Some(listener) = self.listener.take() {
            proxy.mixer.remove_finished_listener(listener);
        }
    }
}

impl State<CharacterProxy> for DanceState {
    fn name(&self) -> &'static str {
        DANCE
    }

    fn enter(&mut self, proxy: &mut CharacterProxy, previous: Option<&dyn State<CharacterProxy>>) {
        let Some(action) = proxy.mixer.action_mut(DANCE) else {
            log::warn!("No '{}' clip loaded", DANCE);
            return;
        };
        action.reset();
        action.set_loop_mode(LoopMode::Once);
        action.set_clamp_when_finished(true);

        self.listener = Some(proxy.mixer.add_finished_listener(DANCE));
        if let Some(previous) = previous {
            proxy
                .mixer
                .cross_fade(previous.name(), DANCE, proxy.blend.dance_blend_seconds);
        }
        proxy.mixer.play(DANCE);
    }

    fn exit(&mut self, proxy: &mut CharacterProxy) {
        self.release(proxy);
    }

    fn update(&mut self, proxy: &mut CharacterProxy, _delta_time: f32) -> Transition {
        let Some(listener) = self.listener else {
            // Nothing to wait for without a clip
            return Transition::Switch(IDLE);
        };
        if proxy.finished.iter().any(|event| event.listener == listener) {
            self.release(proxy);
            log::debug!("Dance finished");
            return Transition::Switch(IDLE);
        }
        Transition::Stay
    }
}

/// Animation driver for a player character
#[derive(Debug)]
pub struct CharacterAnimator {
    fsm: StateMachine<CharacterProxy>,
    proxy: CharacterProxy,
    ready: bool,
}

impl CharacterAnimator {
    /// Machine with the four character states registered, not yet loaded
    pub fn new(blend: AnimationConfig) -> Self {
        let mut fsm = StateMachine::new();
        fsm.add_state(IDLE, || Box::new(IdleState));
        fsm.add_state(WALK, || Box::new(WalkState));
        fsm.add_state(RUN, || Box::new(RunState));
        fsm.add_state(DANCE, || Box::new(DanceState::default()));

        Self {
            fsm,
            proxy: CharacterProxy {
                blend,
                ..CharacterProxy::default()
            },
            ready: false,
        }
    }

    /// Whether clips have been loaded
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Build the mixer from `library` and enter `idle`.
    ///
    /// Only the first call has any effect; it returns `Ok(false)` afterwards.
    pub fn load(&mut self, library: &AnimationLibrary) -> Result<bool, FsmError> {
        if self.ready {
            log::warn!("Animation clips already loaded; ignoring second readiness signal");
            return Ok(false);
        }

        let missing = library.missing(&CLIPS);
        if !missing.is_empty() {
            log::warn!("Animation library has no clip for {:?}", missing);
        }

        self.proxy.mixer = AnimationMixer::from_library(library);
        self.ready = true;
        self.fsm.set_state(IDLE, &mut self.proxy)?;
        log::info!("Character animations ready ({} clips)", library.len());
        Ok(true)
    }

    /// Advance the clips, then let the current state react to this frame's
    /// input and completions.
    pub fn update(&mut self, delta_time: f32, input: Intents) -> Result<(), FsmError> {
        if !self.ready {
            return Ok(());
        }

        self.proxy.input = input;
        self.proxy.finished = self.proxy.mixer.update(delta_time);
        let result = self.fsm.update(&mut self.proxy, delta_time);
        self.proxy.finished.clear();
        result
    }

    /// Force a state change
    pub fn set_state(&mut self, name: &str) -> Result<bool, FsmError> {
        self.fsm.set_state(name, &mut self.proxy)
    }

    /// Name of the current state
    pub fn state(&self) -> Option<&'static str> {
        self.fsm.current_name()
    }

    /// Acting clip and its normalized playback time
    pub fn current_action(&self) -> Option<(&'static str, f32)> {
        let name = self.fsm.current_name()?;
        let action = self.proxy.mixer.action(name)?;
        Some((name, action.normalized_time()))
    }

    /// Underlying mixer
    pub fn mixer(&self) -> &AnimationMixer {
        &self.proxy.mixer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn library() -> AnimationLibrary {
        AnimationLibrary::new()
            .with_clip(IDLE, 2.0)
            .with_clip(WALK, 1.0)
            .with_clip(RUN, 0.8)
            .with_clip(DANCE, 1.5)
    }

    fn loaded() -> CharacterAnimator {
        let mut animator = CharacterAnimator::new(AnimationConfig::default());
        assert_eq!(animator.load(&library()), Ok(true));
        animator
    }

    #[test]
    fn test_idle_only_after_load() {
        let mut animator = CharacterAnimator::new(AnimationConfig::default());
        animator.update(0.1, Intents::FORWARD).expect("update");
        assert_eq!(animator.state(), None);
        assert!(animator.current_action().is_none());

        animator.load(&library()).expect("load");
        assert_eq!(animator.state(), Some(IDLE));
        assert_eq!(animator.load(&library()), Ok(false));
    }

    #[test]
    fn test_locomotion_transitions() {
        let mut animator = loaded();

        animator.update(0.016, Intents::FORWARD).expect("update");
        assert_eq!(animator.state(), Some(WALK));

        animator.update(0.016, Intents::FORWARD | Intents::MODIFIER).expect("update");
        assert_eq!(animator.state(), Some(RUN));

        animator.update(0.016, Intents::BACKWARD).expect("update");
        assert_eq!(animator.state(), Some(WALK));

        animator.update(0.016, Intents::MODIFIER).expect("update");
        assert_eq!(animator.state(), Some(IDLE));

        // Turning alone does not start walking
        animator.update(0.016, Intents::LEFT).expect("update");
        assert_eq!(animator.state(), Some(IDLE));
    }

    #[test]
    fn test_gait_phase_is_kept() {
        let mut animator = loaded();
        animator.update(0.0, Intents::FORWARD).expect("enter walk");
        animator.update(0.5, Intents::FORWARD).expect("advance walk");
        let walk_time = animator.mixer().action(WALK).map(|a| a.time()).unwrap_or_default();
        assert_relative_eq!(walk_time, 0.5, epsilon = 1e-5);

        animator
            .update(0.0, Intents::FORWARD | Intents::MODIFIER)
            .expect("enter run");
        let run = animator.mixer().action(RUN).expect("run clip");
        assert_relative_eq!(run.time(), 0.4, epsilon = 1e-5);
        assert_relative_eq!(run.normalized_time(), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_dance_returns_to_idle_once() {
        let mut animator = loaded();

        for _ in 0..3 {
            animator.update(0.016, Intents::TRIGGER).expect("enter dance");
            assert_eq!(animator.state(), Some(DANCE));
            assert_eq!(animator.mixer().listener_count(), 1);

            let mut returns = 0;
            for _ in 0..40 {
                let before = animator.state();
                animator.update(0.1, Intents::empty()).expect("update");
                if before == Some(DANCE) && animator.state() == Some(IDLE) {
                    returns += 1;
                }
            }

            assert_eq!(returns, 1);
            assert_eq!(animator.state(), Some(IDLE));
            assert_eq!(animator.mixer().listener_count(), 0);
        }
    }

    #[test]
    fn test_dance_reports_progress() {
        let mut animator = loaded();
        animator.update(0.0, Intents::TRIGGER).expect("enter dance");
        animator.update(0.75, Intents::empty()).expect("advance");

        let (clip, time) = animator.current_action().expect("acting clip");
        assert_eq!(clip, DANCE);
        assert_relative_eq!(time, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_leaving_dance_early_releases_listener() {
        let mut animator = loaded();
        animator.update(0.0, Intents::TRIGGER).expect("enter dance");
        assert_eq!(animator.mixer().listener_count(), 1);

        animator.set_state(WALK).expect("force walk");
        assert_eq!(animator.mixer().listener_count(), 0);
    }

    #[test]
    fn test_missing_clips_do_not_panic() {
        let mut animator = CharacterAnimator::new(AnimationConfig::default());
        animator
            .load(&AnimationLibrary::new().with_clip(IDLE, 1.0))
            .expect("load");
        animator.update(0.1, Intents::TRIGGER).expect("update");
        animator.update(0.1, Intents::empty()).expect("update");
        assert_eq!(animator.state(), Some(IDLE));
    }
}
