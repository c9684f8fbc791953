#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Presentation contract for wave encounters.
//!
//! Adapters implement [`Presenter`] to receive the four call-in points the
//! sequencer and population tracker announce. [`dispatch`] forwards a derived
//! event batch to a presenter synchronously and in order. [`HudCues`] is a
//! ready-made presenter that animates the heads-up display: every cue runs on
//! its own clock and all of them advance together on each tick.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::trace;
use wave_siege_core::{Event, WaveIndex};

/// Receives the call-in points announced at phase boundaries.
pub trait Presenter {
    /// The upcoming wave is being announced.
    fn on_wave_announced(&mut self, wave: WaveIndex);
    /// The spawn burst of the wave was issued.
    fn on_wave_started(&mut self, wave: WaveIndex);
    /// A counted death changed the kill total.
    fn on_kill_count_changed(&mut self, total_kills: u32);
    /// Every enemy of the current wave died.
    fn on_wave_completed(&mut self);
    /// Simulation time advanced by `dt`. Presenters without animations ignore it.
    fn on_time_advanced(&mut self, _dt: Duration) {}
}

impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn on_wave_announced(&mut self, wave: WaveIndex) {
        (**self).on_wave_announced(wave);
    }

    fn on_wave_started(&mut self, wave: WaveIndex) {
        (**self).on_wave_started(wave);
    }

    fn on_kill_count_changed(&mut self, total_kills: u32) {
        (**self).on_kill_count_changed(total_kills);
    }

    fn on_wave_completed(&mut self) {
        (**self).on_wave_completed();
    }

    fn on_time_advanced(&mut self, dt: Duration) {
        (**self).on_time_advanced(dt);
    }
}

/// Forwards presentation events to `presenter` in the order they were emitted.
pub fn dispatch<P: Presenter + ?Sized>(events: &[Event], presenter: &mut P) {
    for event in events {
        match event {
            Event::WaveAnnounced { wave } => presenter.on_wave_announced(*wave),
            Event::WaveStarted { wave, .. } => presenter.on_wave_started(*wave),
            Event::KillCountChanged { total_kills } => presenter.on_kill_count_changed(*total_kills),
            Event::WaveCompleted { .. } => presenter.on_wave_completed(),
            Event::TimeAdvanced { dt } => presenter.on_time_advanced(*dt),
            _ => {}
        }
    }
}

/// Label shown while a wave is active, e.g. `WAVE 03`.
#[must_use]
pub fn wave_label(wave: WaveIndex) -> String {
    format!("WAVE {wave}")
}

/// Label shown while a wave is being announced, e.g. `!WAVE 03!`.
#[must_use]
pub fn warning_label(wave: WaveIndex) -> String {
    format!("!WAVE {wave}!")
}

/// Label showing the kill total, zero-padded to two digits.
#[must_use]
pub fn kills_label(total_kills: u32) -> String {
    format!("{total_kills:02}")
}

/// Longest cue duration accepted by [`CueConfig::validate`], in seconds.
pub const MAX_CUE_SECONDS: f32 = 3_600.0;

/// A [`CueConfig`] value outside its accepted range.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
#[error("cue setting `{field}` is out of range, got {value}")]
pub struct InvalidCue {
    /// Name of the offending key.
    pub field: &'static str,
    /// Rejected value.
    pub value: f32,
}

/// Tuning for the heads-up display cues. Durations are in seconds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    /// Length of the wave label pulse.
    pub text_animation_duration: f32,
    /// Scale the wave label starts its pulse from.
    pub text_pulse_scale: f32,
    /// Length of each warning fade-in and fade-out.
    pub warning_fade_duration: f32,
    /// Whether the screen flashes while a wave is announced.
    pub flash_enabled: bool,
    /// RGBA colour of the flash overlay at its peak.
    pub flash_color: [f32; 4],
    /// Number of flash pulses per announcement.
    pub flash_count: u32,
    /// Length of each half of a flash pulse.
    pub flash_speed: f32,
    /// Whether a warning sound accompanies the announcement.
    pub sound_enabled: bool,
    /// Volume of the warning sound.
    pub sound_volume: f32,
    /// Whether the warning sound loops until the wave starts.
    pub loop_sound: bool,
    /// How long a non-looping warning sound plays. Zero leaves it unbounded.
    pub sound_duration: f32,
    /// Scale the kill label starts its pulse from.
    pub kill_pulse_scale: f32,
    /// Length of the kill label pulse.
    pub kill_pulse_duration: f32,
}

impl CueConfig {
    /// Rejects values that are not finite, negative, or durations longer than
    /// [`MAX_CUE_SECONDS`].
    pub fn validate(&self) -> Result<(), InvalidCue> {
        let durations = [
            ("text_animation_duration", self.text_animation_duration),
            ("warning_fade_duration", self.warning_fade_duration),
            ("flash_speed", self.flash_speed),
            ("sound_duration", self.sound_duration),
            ("kill_pulse_duration", self.kill_pulse_duration),
        ];
        for (field, value) in durations {
            if !(0.0..=MAX_CUE_SECONDS).contains(&value) {
                return Err(InvalidCue { field, value });
            }
        }

        let [red, green, blue, alpha] = self.flash_color;
        let magnitudes = [
            ("text_pulse_scale", self.text_pulse_scale),
            ("kill_pulse_scale", self.kill_pulse_scale),
            ("sound_volume", self.sound_volume),
            ("flash_color", red),
            ("flash_color", green),
            ("flash_color", blue),
            ("flash_color", alpha),
        ];
        for (field, value) in magnitudes {
            if !value.is_finite() || value < 0.0 {
                return Err(InvalidCue { field, value });
            }
        }
        Ok(())
    }
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            text_animation_duration: 0.5,
            text_pulse_scale: 1.3,
            warning_fade_duration: 0.3,
            flash_enabled: true,
            flash_color: [1.0, 0.0, 0.0, 0.3],
            flash_count: 2,
            flash_speed: 0.15,
            sound_enabled: true,
            sound_volume: 0.7,
            loop_sound: false,
            sound_duration: 2.0,
            kill_pulse_scale: 1.5,
            kill_pulse_duration: 0.2,
        }
    }
}

/// Rendered state of a text element.
#[derive(Clone, Debug, PartialEq)]
pub struct TextFrame {
    /// Text to display.
    pub text: String,
    /// Opacity in `[0, 1]`.
    pub alpha: f32,
    /// Scale relative to the element's resting size.
    pub scale: f32,
}

impl TextFrame {
    fn resting(text: String) -> Self {
        Self {
            text,
            alpha: 1.0,
            scale: 1.0,
        }
    }
}

/// Warning sound currently playing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioFrame {
    /// Playback volume.
    pub volume: f32,
    /// Whether playback loops.
    pub looping: bool,
}

/// Snapshot of every heads-up display element for a single frame.
#[derive(Clone, Debug, PartialEq)]
pub struct HudFrame {
    /// Active wave label.
    pub wave: TextFrame,
    /// Kill counter label.
    pub kills: TextFrame,
    /// Warning banner, present while an announcement is visible.
    pub warning: Option<TextFrame>,
    /// RGBA colour of the flash overlay, present while it is visible.
    pub overlay: Option<[f32; 4]>,
    /// Warning sound, present while it plays.
    pub audio: Option<AudioFrame>,
}

/// Presenter that drives the heads-up display cue timelines.
#[derive(Debug)]
pub struct HudCues {
    config: CueConfig,
    warning_duration: Duration,
    wave_text: String,
    kills_text: String,
    warning: Option<WarningCue>,
    flash: Option<FlashCue>,
    audio: Option<AudioCue>,
    wave_pulse: Option<Pulse>,
    kill_pulse: Option<Pulse>,
}

impl HudCues {
    /// Creates an idle display whose warnings last `warning_duration`.
    #[must_use]
    pub fn new(config: CueConfig, warning_duration: Duration) -> Self {
        Self {
            config,
            warning_duration,
            wave_text: String::new(),
            kills_text: kills_label(0),
            warning: None,
            flash: None,
            audio: None,
            wave_pulse: None,
            kill_pulse: None,
        }
    }

    /// Advances every running cue and applies presentation events in order.
    pub fn handle(&mut self, events: &[Event]) {
        dispatch(events, self);
    }

    /// Advances every running cue by `dt` and retires the finished ones.
    pub fn advance(&mut self, dt: Duration) {
        retire(&mut self.warning, dt, WarningCue::advance);
        retire(&mut self.flash, dt, FlashCue::advance);
        retire(&mut self.audio, dt, AudioCue::advance);
        retire(&mut self.wave_pulse, dt, Pulse::advance);
        retire(&mut self.kill_pulse, dt, Pulse::advance);
    }

    /// Reports whether any cue is still animating.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.warning.is_some()
            || self.flash.is_some()
            || self.audio.is_some()
            || self.wave_pulse.is_some()
            || self.kill_pulse.is_some()
    }

    /// Captures the current state of every display element.
    #[must_use]
    pub fn frame(&self) -> HudFrame {
        let wave = match &self.wave_pulse {
            Some(pulse) => TextFrame {
                text: self.wave_text.clone(),
                alpha: pulse.progress(),
                scale: pulse.scale(),
            },
            None => TextFrame::resting(self.wave_text.clone()),
        };
        let kills = match &self.kill_pulse {
            Some(pulse) => TextFrame {
                text: self.kills_text.clone(),
                alpha: 1.0,
                scale: pulse.scale(),
            },
            None => TextFrame::resting(self.kills_text.clone()),
        };

        HudFrame {
            wave,
            kills,
            warning: self.warning.as_ref().map(WarningCue::frame),
            overlay: self.flash.as_ref().map(|flash| {
                let [red, green, blue, _] = self.config.flash_color;
                [red, green, blue, flash.alpha()]
            }),
            audio: self.audio.as_ref().map(|audio| AudioFrame {
                volume: audio.volume,
                looping: audio.looping,
            }),
        }
    }
}

impl Presenter for HudCues {
    fn on_wave_announced(&mut self, wave: WaveIndex) {
        trace!(wave = wave.get(), "starting warning cues");
        let fade = seconds(self.config.warning_fade_duration);
        self.warning = Some(WarningCue {
            text: warning_label(wave),
            elapsed: Duration::ZERO,
            fade,
            hold: self.warning_duration.saturating_sub(fade.saturating_mul(2)),
        });

        self.flash = (self.config.flash_enabled && self.config.flash_count > 0).then(|| {
            FlashCue {
                elapsed: Duration::ZERO,
                half_period: seconds(self.config.flash_speed),
                count: self.config.flash_count,
                peak: self.config.flash_color[3],
            }
        });

        self.audio = self.config.sound_enabled.then(|| {
            let bound = seconds(self.config.sound_duration);
            AudioCue {
                elapsed: Duration::ZERO,
                volume: self.config.sound_volume,
                looping: self.config.loop_sound,
                stop_after: (!self.config.loop_sound && !bound.is_zero()).then_some(bound),
            }
        });
    }

    fn on_wave_started(&mut self, wave: WaveIndex) {
        self.wave_text = wave_label(wave);
        self.wave_pulse = Some(Pulse::new(
            seconds(self.config.text_animation_duration),
            self.config.text_pulse_scale,
        ));
        if self.audio.as_ref().is_some_and(|audio| audio.looping) {
            self.audio = None;
        }
    }

    fn on_kill_count_changed(&mut self, total_kills: u32) {
        self.kills_text = kills_label(total_kills);
        self.kill_pulse = Some(Pulse::new(
            seconds(self.config.kill_pulse_duration),
            self.config.kill_pulse_scale,
        ));
    }

    fn on_wave_completed(&mut self) {}

    fn on_time_advanced(&mut self, dt: Duration) {
        self.advance(dt);
    }
}

fn seconds(value: f32) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::try_from_secs_f32(value).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

fn ratio(elapsed: Duration, length: Duration) -> f32 {
    if length.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / length.as_secs_f32()).clamp(0.0, 1.0)
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Advances the cue and drops it once `advance` reports completion.
fn retire<T>(slot: &mut Option<T>, dt: Duration, advance: fn(&mut T, Duration) -> bool) {
    if let Some(cue) = slot.as_mut() {
        if !advance(cue, dt) {
            *slot = None;
        }
    }
}

#[derive(Clone, Debug)]
struct WarningCue {
    text: String,
    elapsed: Duration,
    fade: Duration,
    hold: Duration,
}

impl WarningCue {
    const SCALE_FROM: f32 = 0.5;
    const SCALE_PEAK: f32 = 1.2;

    fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);
        self.elapsed < self.fade.saturating_mul(2).saturating_add(self.hold)
    }

    fn frame(&self) -> TextFrame {
        let fade_out_at = self.fade.saturating_add(self.hold);
        let (alpha, scale) = if self.elapsed < self.fade {
            let t = ratio(self.elapsed, self.fade);
            (t, lerp(Self::SCALE_FROM, Self::SCALE_PEAK, t))
        } else if self.elapsed < fade_out_at {
            (1.0, Self::SCALE_PEAK)
        } else {
            let t = ratio(self.elapsed - fade_out_at, self.fade);
            (1.0 - t, Self::SCALE_PEAK)
        };

        TextFrame {
            text: self.text.clone(),
            alpha,
            scale,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct FlashCue {
    elapsed: Duration,
    half_period: Duration,
    count: u32,
    peak: f32,
}

impl FlashCue {
    fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);
        self.elapsed < self.half_period.saturating_mul(2).saturating_mul(self.count)
    }

    fn alpha(&self) -> f32 {
        if self.half_period.is_zero() {
            return 0.0;
        }
        let period = self.half_period.as_secs_f32() * 2.0;
        let within = self.elapsed.as_secs_f32() % period;
        let half = self.half_period.as_secs_f32();
        if within < half {
            lerp(0.0, self.peak, within / half)
        } else {
            lerp(self.peak, 0.0, (within - half) / half)
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct AudioCue {
    elapsed: Duration,
    volume: f32,
    looping: bool,
    stop_after: Option<Duration>,
}

impl AudioCue {
    fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);
        self.stop_after.map_or(true, |limit| self.elapsed < limit)
    }
}

#[derive(Clone, Copy, Debug)]
struct Pulse {
    elapsed: Duration,
    length: Duration,
    from_scale: f32,
}

impl Pulse {
    fn new(length: Duration, from_scale: f32) -> Self {
        Self {
            elapsed: Duration::ZERO,
            length,
            from_scale,
        }
    }

    fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(dt);
        self.elapsed < self.length
    }

    fn progress(&self) -> f32 {
        ratio(self.elapsed, self.length)
    }

    fn scale(&self) -> f32 {
        lerp(self.from_scale, 1.0, self.progress())
    }
}
