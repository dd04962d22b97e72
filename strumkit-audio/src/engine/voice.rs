//! Instrument voice: one recorded (or synthesized) note, replayed at other
//! pitches by resampling.

use std::path::Path;

use crate::AudioError;

/// MIDI pitch the raw voice sample sounds at.
pub const VOICE_ROOT_MIDI: u8 = 60;

/// Release fade applied when a note reaches its duration.
const RELEASE_SECS: f64 = 0.06;

/// Mono sample data for the instrument voice.
#[derive(Debug, Clone)]
pub struct VoiceSample {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub root_midi: u8,
}

impl VoiceSample {
    /// Load a WAV file, mixing channels down to mono.
    pub fn load_wav(path: &Path, root_midi: u8) -> Result<Self, AudioError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let samples: Vec<f32> = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        if samples.is_empty() {
            return Err(AudioError::EmptySample(path.display().to_string()));
        }

        log::debug!(
            target: "audio",
            "loaded voice {} ({} frames @ {} Hz)",
            path.display(),
            samples.len(),
            spec.sample_rate
        );

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
            root_midi,
        })
    }

    /// Karplus-Strong plucked string at the root pitch.
    pub fn synthesized_pluck(sample_rate: u32) -> Self {
        let root_freq = 440.0 * 2f64.powf((VOICE_ROOT_MIDI as f64 - 69.0) / 12.0);
        let period = (sample_rate as f64 / root_freq).round().max(2.0) as usize;
        let total = (sample_rate as f64 * 2.5) as usize;

        // Simple LCG so the voice is identical on every run
        let mut rng_state: u64 = 0x5eed_1234;
        let mut delay: Vec<f32> = (0..period)
            .map(|_| {
                rng_state = rng_state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((rng_state >> 33) as f32 / (1u64 << 31) as f32) * 2.0 - 1.0
            })
            .collect();

        let mut samples = Vec::with_capacity(total);
        let mut idx = 0;
        for _ in 0..total {
            let next = (idx + 1) % period;
            let value = delay[idx];
            // Averaging filter with a little extra damping for a nylon tone
            delay[idx] = 0.4985 * (value + delay[next]);
            samples.push(value * 0.5);
            idx = next;
        }

        Self {
            samples,
            sample_rate,
            root_midi: VOICE_ROOT_MIDI,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate.max(1) as f64
    }

    fn sample_at(&self, position: f64) -> f32 {
        let idx = position as usize;
        if idx + 1 >= self.samples.len() {
            return self.samples.get(idx).copied().unwrap_or(0.0);
        }
        let frac = (position - idx as f64) as f32;
        self.samples[idx] * (1.0 - frac) + self.samples[idx + 1] * frac
    }
}

/// One sounding note in the mixer.
#[derive(Debug, Clone)]
pub struct Voice {
    start_frame: u64,
    release_frame: u64,
    release_frames: u64,
    position: f64,
    rate: f64,
    gain: f32,
    finished: bool,
}

impl Voice {
    pub fn new(
        sample: &VoiceSample,
        midi: u8,
        gain: f32,
        start_secs: f64,
        duration_secs: f64,
        output_rate: u32,
    ) -> Self {
        let output_rate_f = output_rate.max(1) as f64;
        let start_frame = (start_secs.max(0.0) * output_rate_f) as u64;
        let release_frame = start_frame + (duration_secs.max(0.0) * output_rate_f) as u64;
        let semitones = midi as f64 - sample.root_midi as f64;
        Self {
            start_frame,
            release_frame,
            release_frames: ((RELEASE_SECS * output_rate_f) as u64).max(1),
            position: 0.0,
            rate: 2f64.powf(semitones / 12.0) * sample.sample_rate as f64 / output_rate_f,
            gain,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Value at output frame `frame`. Frames must be visited in order.
    pub fn next_value(&mut self, sample: &VoiceSample, frame: u64) -> f32 {
        if self.finished || frame < self.start_frame {
            return 0.0;
        }
        if self.position >= sample.samples.len() as f64 {
            self.finished = true;
            return 0.0;
        }

        let envelope = if frame < self.release_frame {
            1.0
        } else {
            let into_release = frame - self.release_frame;
            if into_release >= self.release_frames {
                self.finished = true;
                return 0.0;
            }
            1.0 - into_release as f32 / self.release_frames as f32
        };

        let value = sample.sample_at(self.position) * self.gain * envelope;
        self.position += self.rate;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluck_is_audible_and_decays() {
        let voice = VoiceSample::synthesized_pluck(44_100);
        assert_eq!(voice.root_midi, VOICE_ROOT_MIDI);
        let head: f32 = voice.samples[..4410].iter().map(|s| s.abs()).sum();
        let tail: f32 = voice.samples[voice.samples.len() - 4410..]
            .iter()
            .map(|s| s.abs())
            .sum();
        assert!(head > 0.0);
        assert!(tail < head);
    }

    #[test]
    fn voice_waits_for_start_frame() {
        let sample = VoiceSample {
            samples: vec![1.0; 1000],
            sample_rate: 1000,
            root_midi: 60,
        };
        let mut voice = Voice::new(&sample, 60, 0.5, 0.1, 1.0, 1000);
        assert_eq!(voice.next_value(&sample, 99), 0.0);
        assert!((voice.next_value(&sample, 100) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn voice_finishes_after_release() {
        let sample = VoiceSample {
            samples: vec![1.0; 10_000],
            sample_rate: 1000,
            root_midi: 60,
        };
        let mut voice = Voice::new(&sample, 60, 1.0, 0.0, 0.01, 1000);
        for frame in 0..200 {
            voice.next_value(&sample, frame);
        }
        assert!(voice.is_finished());
    }

    #[test]
    fn octave_up_doubles_rate() {
        let sample = VoiceSample {
            samples: vec![0.0; 10],
            sample_rate: 1000,
            root_midi: 60,
        };
        let voice = Voice::new(&sample, 72, 1.0, 0.0, 1.0, 1000);
        assert!((voice.rate - 2.0).abs() < 1e-9);
    }

    #[test]
    fn load_wav_mixes_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let voice = VoiceSample::load_wav(&path, 60).unwrap();
        assert_eq!(voice.samples.len(), 100);
        assert_eq!(voice.sample_rate, 8000);
        assert!((voice.samples[0] - 0.25).abs() < 1e-3);
    }

    #[test]
    fn missing_wav_is_an_error() {
        let result = VoiceSample::load_wav(Path::new("/nonexistent/voice.wav"), 60);
        assert!(result.is_err());
    }
}
