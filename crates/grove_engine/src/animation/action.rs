//! Playback state of a single clip

use super::AnimationClip;
use crate::foundation::math::utils::{lerp, saturate};

/// What happens when playback reaches the end of the clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Wrap around forever
    #[default]
    Repeat,
    /// Play once, then finish
    Once,
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

/// Playable instance of a clip
#[derive(Debug, Clone)]
pub struct AnimationAction {
    clip: AnimationClip,
    time: f32,
    time_scale: f32,
    weight: f32,
    fade_level: f32,
    fade: Option<Fade>,
    loop_mode: LoopMode,
    clamp_when_finished: bool,
    enabled: bool,
    paused: bool,
    scheduled: bool,
}

impl AnimationAction {
    /// Idle action for `clip`
    pub fn new(clip: AnimationClip) -> Self {
        Self {
            clip,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            fade_level: 1.0,
            fade: None,
            loop_mode: LoopMode::Repeat,
            clamp_when_finished: false,
            enabled: true,
            paused: false,
            scheduled: false,
        }
    }

    /// Source clip
    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Clip name
    pub fn name(&self) -> &str {
        self.clip.name()
    }

    /// Clip length in seconds
    pub fn duration(&self) -> f32 {
        self.clip.duration()
    }

    /// Local playback time in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Jump to `time`, clamped into the clip
    pub fn set_time(&mut self, time: f32) {
        self.time = if time.is_finite() {
            time.clamp(0.0, self.duration())
        } else {
            0.0
        };
    }

    /// Playback time as a fraction of the clip, in `[0, 1]`
    pub fn normalized_time(&self) -> f32 {
        if self.duration() <= 0.0 {
            return 0.0;
        }
        saturate(self.time / self.duration())
    }

    /// Playback speed multiplier
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Change playback speed; negative plays backwards
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale;
    }

    /// Base blend weight
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Set base blend weight
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight.max(0.0);
    }

    /// Blend weight after fading; zero while disabled
    pub fn effective_weight(&self) -> f32 {
        if self.enabled {
            self.weight * self.fade_level
        } else {
            0.0
        }
    }

    /// Whether a weight fade is in progress
    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Current loop mode
    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Change loop mode
    pub fn set_loop_mode(&mut self, loop_mode: LoopMode) {
        self.loop_mode = loop_mode;
    }

    /// Whether a finished one-shot holds its last frame
    pub fn clamp_when_finished(&self) -> bool {
        self.clamp_when_finished
    }

    /// Hold the last frame (paused) instead of disabling when a one-shot ends
    pub fn set_clamp_when_finished(&mut self, clamp: bool) {
        self.clamp_when_finished = clamp;
    }

    /// Whether the action contributes to the pose
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable without rewinding
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether time is frozen
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Freeze or resume time
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Scheduled, enabled and not paused
    pub fn is_running(&self) -> bool {
        self.scheduled && self.enabled && !self.paused
    }

    /// Whether `play` has been called since the last `stop`
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Schedule the action with the mixer
    pub fn play(&mut self) {
        self.scheduled = true;
    }

    /// Unschedule and rewind
    pub fn stop(&mut self) {
        self.scheduled = false;
        self.reset();
    }

    /// Rewind, re-enable, unpause and cancel any fade
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.enabled = true;
        self.paused = false;
        self.fade = None;
        self.fade_level = 1.0;
    }

    /// Ramp the weight from zero to full over `seconds`
    pub fn fade_in(&mut self, seconds: f32) {
        self.start_fade(0.0, 1.0, seconds);
    }

    /// Ramp the weight to zero over `seconds`; the action disables itself
    /// when the fade completes
    pub fn fade_out(&mut self, seconds: f32) {
        self.start_fade(self.fade_level, 0.0, seconds);
    }

    /// Fade `previous` out while this action fades in
    pub fn cross_fade_from(&mut self, previous: &mut Self, seconds: f32) {
        previous.fade_out(seconds);
        self.fade_in(seconds);
    }

    fn start_fade(&mut self, from: f32, to: f32, seconds: f32) {
        self.fade = Some(Fade {
            from,
            to,
            elapsed: 0.0,
            duration: seconds.max(0.0),
        });
        self.fade_level = from;
    }

    /// Advance fades and time; returns `true` when a one-shot completes
    /// during this step.
    pub(crate) fn advance(&mut self, delta_time: f32) -> bool {
        if !self.scheduled || !self.enabled {
            return false;
        }

        self.advance_fade(delta_time);
        if !self.enabled || self.paused {
            return false;
        }

        let duration = self.duration();
        self.time += delta_time * self.time_scale;

        match self.loop_mode {
            LoopMode::Repeat => {
                self.time = if duration > 0.0 {
                    self.time.rem_euclid(duration)
                } else {
                    0.0
                };
                false
            }
            LoopMode::Once => {
                let ended = if self.time_scale >= 0.0 {
                    self.time >= duration
                } else {
                    self.time <= 0.0
                };
                if !ended {
                    return false;
                }

                self.time = self.time.clamp(0.0, duration);
                if self.clamp_when_finished {
                    self.paused = true;
                } else {
                    self.enabled = false;
                }
                true
            }
        }
    }

    fn advance_fade(&mut self, delta_time: f32) {
        let Some(fade) = self.fade.as_mut() else {
            return;
        };

        fade.elapsed += delta_time;
        let progress = if fade.duration > 0.0 {
            saturate(fade.elapsed / fade.duration)
        } else {
            1.0
        };
        self.fade_level = lerp(fade.from, fade.to, progress);

        if progress >= 1.0 {
            let faded_out = fade.to <= 0.0;
            self.fade = None;
            self.fade_level = 1.0;
            if faded_out {
                self.enabled = false;
            }
        }
    }
}
