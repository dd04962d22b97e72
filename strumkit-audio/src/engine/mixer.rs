use std::sync::Arc;

use super::voice::{Voice, VoiceSample};

/// Sums active voices into the output buffer and keeps the frame clock.
pub struct Mixer {
    sample: Option<Arc<VoiceSample>>,
    voices: Vec<Voice>,
    frames: u64,
    sample_rate: u32,
    master_gain: f32,
}

impl Mixer {
    pub fn new(sample_rate: u32, master_gain: f32) -> Self {
        Self {
            sample: None,
            voices: Vec::new(),
            frames: 0,
            sample_rate,
            master_gain,
        }
    }

    pub fn set_sample(&mut self, sample: Arc<VoiceSample>) {
        self.sample = Some(sample);
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate.max(1) as f64
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Queue a note. Start times in the past play immediately.
    pub fn add_voice(&mut self, midi: u8, gain: f32, at: f64, duration_secs: f64) {
        let Some(sample) = &self.sample else {
            return;
        };
        let start = at.max(self.current_time());
        self.voices.push(Voice::new(
            sample,
            midi,
            gain,
            start,
            duration_secs,
            self.sample_rate,
        ));
    }

    pub fn clear(&mut self) {
        self.voices.clear();
    }

    /// Fill an interleaved buffer, same signal on every channel.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let Some(sample) = self.sample.clone() else {
            out.fill(0.0);
            self.frames += (out.len() / channels) as u64;
            return;
        };

        for frame in out.chunks_mut(channels) {
            let mut mixed = 0.0f32;
            for voice in &mut self.voices {
                mixed += voice.next_value(&sample, self.frames);
            }
            let value = (mixed * self.master_gain).clamp(-1.0, 1.0);
            frame.fill(value);
            self.frames += 1;
        }

        self.voices.retain(|v| !v.is_finished());
    }
}
