//! Sound board: named cues and a quiet background loop.
//!
//! With the `audio` feature the cues are synthesized and played through rodio; without it
//! (or when no output device opens) the board only traces what it would have played.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    /// The falling piece came to rest.
    Collision,
    /// A cluster or overflow clear.
    Explosion,
}

impl Cue {
    pub fn volume(self) -> f32 {
        match self {
            Self::Collision => 0.2,
            Self::Explosion => 0.3,
        }
    }
}

pub const MUSIC_VOLUME: f32 = 0.02;

pub struct SoundBoard {
    effects: bool,
    music: bool,
    played: usize,
    #[cfg(feature = "audio")]
    output: Option<output::Output>,
}

impl SoundBoard {
    pub fn new(effects: bool, music: bool) -> Self {
        #[cfg(feature = "audio")]
        let output = if effects || music {
            match output::Output::open() {
                Ok(o) => Some(o),
                Err(e) => {
                    tracing::warn!(error = %e, "audio output unavailable, continuing silently");
                    None
                }
            }
        } else {
            None
        };
        let mut board = Self {
            effects,
            music: false,
            played: 0,
            #[cfg(feature = "audio")]
            output,
        };
        if music {
            board.set_music(true);
        }
        board
    }

    /// Play a cue; a cue already playing restarts from the beginning.
    pub fn play(&mut self, cue: Cue) {
        if !self.effects {
            return;
        }
        self.played += 1;
        debug!(?cue, volume = cue.volume(), "cue");
        #[cfg(feature = "audio")]
        {
            if let Some(out) = self.output.as_mut() {
                out.play(cue);
            }
        }
    }

    pub fn toggle_music(&mut self) -> bool {
        self.set_music(!self.music);
        self.music
    }

    fn set_music(&mut self, on: bool) {
        self.music = on;
        debug!(on, volume = MUSIC_VOLUME, "music");
        #[cfg(feature = "audio")]
        {
            if let Some(out) = self.output.as_mut() {
                out.set_music(on);
            }
        }
    }

    pub fn music_on(&self) -> bool {
        self.music
    }

    /// Number of cues played since start.
    pub fn played(&self) -> usize {
        self.played
    }
}

#[cfg(feature = "audio")]
mod output {
    use super::{Cue, MUSIC_VOLUME};
    use rand::Rng;
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink, Source, StreamError};
    use std::collections::HashMap;
    use std::f32::consts::TAU;

    const SAMPLE_RATE: u32 = 44_100;

    pub struct Output {
        // Must outlive every sink.
        _stream: OutputStream,
        handle: OutputStreamHandle,
        cues: HashMap<Cue, Sink>,
        music: Option<Sink>,
    }

    impl Output {
        pub fn open() -> Result<Self, StreamError> {
            let (stream, handle) = OutputStream::try_default()?;
            Ok(Self {
                _stream: stream,
                handle,
                cues: HashMap::new(),
                music: None,
            })
        }

        pub fn play(&mut self, cue: Cue) {
            let Ok(sink) = Sink::try_new(&self.handle) else {
                return;
            };
            sink.set_volume(cue.volume());
            match cue {
                Cue::Collision => sink.append(thud()),
                Cue::Explosion => sink.append(burst()),
            }
            // Dropping the previous sink stops it.
            self.cues.insert(cue, sink);
        }

        pub fn set_music(&mut self, on: bool) {
            if !on {
                self.music = None;
                return;
            }
            if self.music.is_some() {
                return;
            }
            if let Ok(sink) = Sink::try_new(&self.handle) {
                sink.set_volume(MUSIC_VOLUME);
                sink.append(arpeggio().repeat_infinite());
                self.music = Some(sink);
            }
        }
    }

    fn samples(duration_ms: u64, f: impl Fn(f32) -> f32) -> SamplesBuffer<f32> {
        let n = (u64::from(SAMPLE_RATE) * duration_ms / 1000) as usize;
        let rate = SAMPLE_RATE as f32;
        let data: Vec<f32> = (0..n).map(|i| f(i as f32 / rate)).collect();
        SamplesBuffer::new(1, SAMPLE_RATE, data)
    }

    /// Short decaying low ping.
    fn thud() -> SamplesBuffer<f32> {
        samples(120, |t| (TAU * 180.0 * t).sin() * (-t * 30.0).exp())
    }

    /// Noisy rumble with a fast attack.
    fn burst() -> SamplesBuffer<f32> {
        let noise: Vec<f32> = {
            let mut rng = rand::thread_rng();
            (0..64).map(|_| rng.gen_range(-1.0..1.0)).collect()
        };
        samples(450, move |t| {
            let envelope = if t < 0.02 {
                t / 0.02
            } else {
                (-(t - 0.02) * 6.0).exp()
            };
            let rumble = (TAU * 60.0 * t).sin() * 0.5 + (TAU * 95.0 * t).sin() * 0.3;
            let grain = noise[(t * 4000.0) as usize % noise.len()] * 0.4;
            (rumble + grain) * envelope
        })
    }

    /// Four-note loop for the background track.
    fn arpeggio() -> SamplesBuffer<f32> {
        const NOTES: [f32; 4] = [220.0, 277.18, 329.63, 440.0];
        const NOTE_SECS: f32 = 0.4;
        samples(1600, |t| {
            let note = NOTES[((t / NOTE_SECS) as usize).min(NOTES.len() - 1)];
            let local = t % NOTE_SECS;
            (TAU * note * t).sin() * (-local * 4.0).exp()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_volumes() {
        assert_eq!(Cue::Collision.volume(), 0.2);
        assert_eq!(Cue::Explosion.volume(), 0.3);
        assert_eq!(MUSIC_VOLUME, 0.02);
    }

    #[test]
    fn test_effects_off_plays_nothing() {
        let mut board = SoundBoard::new(false, false);
        board.play(Cue::Explosion);
        assert_eq!(board.played(), 0);
        assert!(!board.music_on());
    }

    #[cfg(not(feature = "audio"))]
    #[test]
    fn test_cues_and_music_toggle() {
        let mut board = SoundBoard::new(true, true);
        assert!(board.music_on());
        board.play(Cue::Collision);
        board.play(Cue::Collision);
        assert_eq!(board.played(), 2);
        assert!(!board.toggle_music());
        assert!(board.toggle_music());
    }
}
