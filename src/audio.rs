//! Sound vocabulary and the event-to-sink director
//!
//! The simulation only emits `GameEvent`s. `AudioDirector` turns them into
//! calls on an `AudioSink`, applying the volume settings on the way.

use serde::{Deserialize, Serialize};

use crate::consts::{AMBIENT_FADE_MS, MUSIC_FADE_MS};
use crate::settings::Settings;
use crate::sim::GameEvent;

/// One-shot sound effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Boot cover
    Pic1,
    /// Second opening panel
    Pic2,
    /// Any left click
    Click,
    /// Round countdown start
    CountBackward,
    /// Seed drop
    Drop,
    Water,
    Ending,
    /// Round lost
    Fail,
    /// Round or rain lesson won
    Pass,
    /// Bird warning onset
    Bird,
}

impl SoundEffect {
    pub fn key(self) -> SoundKey {
        match self {
            SoundEffect::Pic1 => SoundKey::Pic1,
            SoundEffect::Pic2 => SoundKey::Pic2,
            SoundEffect::Click => SoundKey::Click,
            SoundEffect::CountBackward => SoundKey::CountBackward,
            SoundEffect::Drop => SoundKey::Drop,
            SoundEffect::Water => SoundKey::Water,
            SoundEffect::Ending => SoundKey::Ending,
            SoundEffect::Fail => SoundKey::Fail,
            SoundEffect::Pass => SoundKey::Pass,
            SoundEffect::Bird => SoundKey::Bird,
        }
    }
}

/// Looping weather ambience; at most one plays at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmbientTrack {
    Rain,
    SourRain,
}

impl AmbientTrack {
    pub fn key(self) -> SoundKey {
        match self {
            AmbientTrack::Rain => SoundKey::Rainy,
            AmbientTrack::SourRain => SoundKey::SourRain,
        }
    }
}

/// Every sound file the game knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SoundKey {
    Pic1,
    Pic2,
    Bgm,
    Click,
    CountBackward,
    Drop,
    Water,
    Ending,
    Fail,
    Pass,
    Rainy,
    Bird,
    SourRain,
}

impl SoundKey {
    pub const ALL: [SoundKey; 13] = [
        SoundKey::Pic1,
        SoundKey::Pic2,
        SoundKey::Bgm,
        SoundKey::Click,
        SoundKey::CountBackward,
        SoundKey::Drop,
        SoundKey::Water,
        SoundKey::Ending,
        SoundKey::Fail,
        SoundKey::Pass,
        SoundKey::Rainy,
        SoundKey::Bird,
        SoundKey::SourRain,
    ];

    /// Path relative to the asset root
    pub fn path(self) -> &'static str {
        match self {
            SoundKey::Pic1 => "music/pic1.mp3",
            SoundKey::Pic2 => "music/pic2.mp3",
            SoundKey::Bgm => "music/bgm.mp3",
            SoundKey::Click => "music/click.mp3",
            SoundKey::CountBackward => "music/countbackward.mp3",
            SoundKey::Drop => "music/drop.mp3",
            SoundKey::Water => "music/water.mp3",
            SoundKey::Ending => "music/ending.mp3",
            SoundKey::Fail => "music/fail.mp3",
            SoundKey::Pass => "music/pass.mp3",
            SoundKey::Rainy => "music/rainy.mp3",
            SoundKey::Bird => "music/bird.mp3",
            SoundKey::SourRain => "music/sourrain.mp3",
        }
    }
}

/// Mixer channel a sound plays on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Sfx,
    Ambient,
    Music,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayOptions {
    pub looping: bool,
    pub fade_in_ms: u32,
}

/// Playback backend
pub trait AudioSink {
    fn play(&mut self, key: SoundKey, volume: f32, options: PlayOptions);
    fn stop(&mut self, key: SoundKey, fade_out_ms: u32);
}

/// Drops everything
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _key: SoundKey, _volume: f32, _options: PlayOptions) {}
    fn stop(&mut self, _key: SoundKey, _fade_out_ms: u32) {}
}

/// Headless sink: logs what a real mixer would do
#[derive(Debug, Default)]
pub struct LogAudio {
    played: u64,
}

impl LogAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sounds started so far
    pub fn played(&self) -> u64 {
        self.played
    }
}

impl AudioSink for LogAudio {
    fn play(&mut self, key: SoundKey, volume: f32, options: PlayOptions) {
        self.played += 1;
        log::debug!(
            "play {} vol={:.2} loop={} fade_in={}ms",
            key.path(),
            volume,
            options.looping,
            options.fade_in_ms
        );
    }

    fn stop(&mut self, key: SoundKey, fade_out_ms: u32) {
        log::debug!("stop {} fade_out={}ms", key.path(), fade_out_ms);
    }
}

/// Routes simulation events to a sink
pub struct AudioDirector<S: AudioSink> {
    sink: S,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
}

impl<S: AudioSink> AudioDirector<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
        }
    }

    pub fn from_settings(sink: S, settings: &Settings) -> Self {
        let mut director = Self::new(sink);
        director.set_master_volume(settings.master_volume);
        director.set_sfx_volume(settings.sfx_volume);
        director.set_music_volume(settings.music_volume);
        director.set_muted(settings.muted);
        director
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set music volume (0.0 - 1.0)
    pub fn set_music_volume(&mut self, vol: f32) {
        self.music_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Volume after master, channel and mute
    pub fn effective_volume(&self, channel: Channel) -> f32 {
        if self.muted {
            return 0.0;
        }
        let channel = match channel {
            Channel::Sfx | Channel::Ambient => self.sfx_volume,
            Channel::Music => self.music_volume,
        };
        self.master_volume * channel
    }

    fn start(&mut self, key: SoundKey, channel: Channel, options: PlayOptions) {
        let vol = self.effective_volume(channel);
        if vol <= 0.0 {
            return;
        }
        self.sink.play(key, vol, options);
    }

    pub fn handle(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::Sound(effect) => {
                self.start(effect.key(), Channel::Sfx, PlayOptions::default())
            }
            GameEvent::SoundFadeIn { effect, fade_ms } => self.start(
                effect.key(),
                Channel::Sfx,
                PlayOptions {
                    looping: false,
                    fade_in_ms: fade_ms,
                },
            ),
            GameEvent::AmbientStart(track) => self.start(
                track.key(),
                Channel::Ambient,
                PlayOptions {
                    looping: true,
                    fade_in_ms: AMBIENT_FADE_MS,
                },
            ),
            GameEvent::AmbientStop(track) => self.sink.stop(track.key(), AMBIENT_FADE_MS),
            GameEvent::MusicStart => self.start(
                SoundKey::Bgm,
                Channel::Music,
                PlayOptions {
                    looping: true,
                    fade_in_ms: MUSIC_FADE_MS,
                },
            ),
            GameEvent::MusicFadeOut => self.sink.stop(SoundKey::Bgm, MUSIC_FADE_MS),
            GameEvent::StepChanged { .. } | GameEvent::Quit => {}
        }
    }

    pub fn handle_all(&mut self, events: &[GameEvent]) {
        for event in events {
            self.handle(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(SoundKey, Option<PlayOptions>)>,
    }

    impl AudioSink for Recorder {
        fn play(&mut self, key: SoundKey, _volume: f32, options: PlayOptions) {
            self.calls.push((key, Some(options)));
        }

        fn stop(&mut self, key: SoundKey, _fade_out_ms: u32) {
            self.calls.push((key, None));
        }
    }

    #[test]
    fn test_sound_paths_are_unique() {
        let mut paths: Vec<_> = SoundKey::ALL.iter().map(|k| k.path()).collect();
        paths.sort_unstable();
        paths.dedup();
        assert_eq!(paths.len(), SoundKey::ALL.len());
    }

    #[test]
    fn test_ambient_loops_with_fade() {
        let mut director = AudioDirector::new(Recorder::default());
        director.handle(&GameEvent::AmbientStart(AmbientTrack::SourRain));
        director.handle(&GameEvent::AmbientStop(AmbientTrack::SourRain));
        let calls = &director.sink().calls;
        assert_eq!(
            calls[0],
            (
                SoundKey::SourRain,
                Some(PlayOptions {
                    looping: true,
                    fade_in_ms: AMBIENT_FADE_MS
                })
            )
        );
        assert_eq!(calls[1], (SoundKey::SourRain, None));
    }

    #[test]
    fn test_music_fade_and_ending() {
        let mut director = AudioDirector::new(Recorder::default());
        director.handle_all(&[
            GameEvent::MusicFadeOut,
            GameEvent::SoundFadeIn {
                effect: SoundEffect::Ending,
                fade_ms: MUSIC_FADE_MS,
            },
        ]);
        let calls = &director.into_sink().calls;
        assert_eq!(calls[0], (SoundKey::Bgm, None));
        assert_eq!(calls[1].0, SoundKey::Ending);
    }

    #[test]
    fn test_muted_plays_nothing_but_still_stops() {
        let settings = Settings {
            muted: true,
            ..Settings::default()
        };
        let mut director = AudioDirector::from_settings(Recorder::default(), &settings);
        assert_eq!(director.effective_volume(Channel::Music), 0.0);
        director.handle(&GameEvent::Sound(SoundEffect::Click));
        director.handle(&GameEvent::AmbientStop(AmbientTrack::Rain));
        assert_eq!(director.sink().calls, vec![(SoundKey::Rainy, None)]);
    }

    #[test]
    fn test_volume_clamped() {
        let mut director = AudioDirector::new(NullAudio);
        director.set_master_volume(3.0);
        director.set_sfx_volume(-1.0);
        assert_eq!(director.effective_volume(Channel::Sfx), 0.0);
        director.set_sfx_volume(0.5);
        assert_eq!(director.effective_volume(Channel::Ambient), 0.5);
    }
}
