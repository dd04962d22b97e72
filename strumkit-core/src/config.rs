use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use strumkit_audio::{EngineSettings, SchedulerTiming};
use strumkit_types::{sanitize_bpm, Instrument, DEFAULT_BPM};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    audio: AudioConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    library: LibraryConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    bpm: Option<u16>,
    instrument: Option<String>,
    pattern: Option<String>,
}

#[derive(Deserialize, Default)]
struct PlaybackConfig {
    lookahead_ms: Option<u64>,
    tick_interval_ms: Option<u64>,
    start_delay_ms: Option<u64>,
    strum_stagger_ms: Option<u64>,
}

#[derive(Deserialize, Default)]
struct AudioConfig {
    sample_path: Option<PathBuf>,
    master_gain: Option<f32>,
}

#[derive(Deserialize, Default)]
struct StorageConfig {
    database: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
struct LibraryConfig {
    chord_files: Option<Vec<PathBuf>>,
}

pub struct Config {
    defaults: DefaultsConfig,
    playback: PlaybackConfig,
    audio: AudioConfig,
    storage: StorageConfig,
    library: LibraryConfig,
}

impl Config {
    /// Embedded defaults overridden by `~/.config/strumkit/config.toml`.
    pub fn load() -> Self {
        Self::load_with(user_config_path().as_deref())
    }

    pub fn load_with(user_path: Option<&Path>) -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user_path {
            if path.exists() {
                match std::fs::read_to_string(path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => merge(&mut base, user),
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            defaults: base.defaults,
            playback: base.playback,
            audio: base.audio,
            storage: base.storage,
            library: base.library,
        }
    }

    pub fn bpm(&self) -> u16 {
        sanitize_bpm(self.defaults.bpm.unwrap_or(DEFAULT_BPM))
    }

    pub fn instrument(&self) -> Instrument {
        self.defaults
            .instrument
            .as_deref()
            .and_then(Instrument::parse)
            .unwrap_or_default()
    }

    /// Pattern selected at start-up. May name a custom pattern.
    pub fn default_pattern_id(&self) -> Option<&str> {
        self.defaults.pattern.as_deref()
    }

    /// Lookahead clamped to 20..=1000 ms, tick to 5..=100 ms.
    pub fn scheduler_timing(&self) -> SchedulerTiming {
        let fallback = SchedulerTiming::default();
        let lookahead_ms = self.playback.lookahead_ms.unwrap_or(100).clamp(20, 1000);
        let tick_ms = self.playback.tick_interval_ms.unwrap_or(25).clamp(5, 100);
        SchedulerTiming {
            lookahead_secs: lookahead_ms as f64 / 1000.0,
            start_delay_secs: self
                .playback
                .start_delay_ms
                .map(|ms| ms.min(1000) as f64 / 1000.0)
                .unwrap_or(fallback.start_delay_secs),
            tick_interval: Duration::from_millis(tick_ms),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let fallback = EngineSettings::default();
        EngineSettings {
            sample_path: self.audio.sample_path.clone(),
            master_gain: self
                .audio
                .master_gain
                .unwrap_or(fallback.master_gain)
                .clamp(0.0, 2.0),
            strum_stagger_secs: self
                .playback
                .strum_stagger_ms
                .map(|ms| ms.min(100) as f64 / 1000.0)
                .unwrap_or(fallback.strum_stagger_secs),
        }
    }

    /// Configured database, else `~/.local/share/strumkit/strumkit.sqlite`.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.storage.database.clone().or_else(|| {
            dirs::data_dir().map(|d| d.join("strumkit").join("strumkit.sqlite"))
        })
    }

    pub fn chord_files(&self) -> &[PathBuf] {
        self.library.chord_files.as_deref().unwrap_or(&[])
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("strumkit").join("config.toml"))
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    merge_defaults(&mut base.defaults, user.defaults);
    merge_playback(&mut base.playback, user.playback);
    if user.audio.sample_path.is_some() {
        base.audio.sample_path = user.audio.sample_path;
    }
    if user.audio.master_gain.is_some() {
        base.audio.master_gain = user.audio.master_gain;
    }
    if user.storage.database.is_some() {
        base.storage.database = user.storage.database;
    }
    if user.library.chord_files.is_some() {
        base.library.chord_files = user.library.chord_files;
    }
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.bpm.is_some() {
        base.bpm = user.bpm;
    }
    if user.instrument.is_some() {
        base.instrument = user.instrument;
    }
    if user.pattern.is_some() {
        base.pattern = user.pattern;
    }
}

fn merge_playback(base: &mut PlaybackConfig, user: PlaybackConfig) {
    if user.lookahead_ms.is_some() {
        base.lookahead_ms = user.lookahead_ms;
    }
    if user.tick_interval_ms.is_some() {
        base.tick_interval_ms = user.tick_interval_ms;
    }
    if user.start_delay_ms.is_some() {
        base.start_delay_ms = user.start_delay_ms;
    }
    if user.strum_stagger_ms.is_some() {
        base.strum_stagger_ms = user.strum_stagger_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn user_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_embedded_config() {
        let config = Config::load_with(None);
        assert_eq!(config.bpm(), 120);
        assert_eq!(config.instrument(), Instrument::Ukulele);
        assert_eq!(config.default_pattern_id(), Some("down-up-16th"));
        assert_eq!(config.scheduler_timing(), SchedulerTiming::default());
        let engine = config.engine_settings();
        assert!(engine.sample_path.is_none());
        assert!((engine.master_gain - 0.8).abs() < f32::EPSILON);
        assert!((engine.strum_stagger_secs - 0.01).abs() < 1e-12);
        assert!(config.chord_files().is_empty());
    }

    #[test]
    fn user_file_overrides_fields() {
        let file = user_file("[defaults]\nbpm = 90\ninstrument = \"guitar\"\n\n[playback]\ntick_interval_ms = 10\n");
        let config = Config::load_with(Some(file.path()));
        assert_eq!(config.bpm(), 90);
        assert_eq!(config.instrument(), Instrument::Guitar);
        // Untouched fields keep the embedded value.
        assert_eq!(config.default_pattern_id(), Some("down-up-16th"));
        let timing = config.scheduler_timing();
        assert_eq!(timing.tick_interval, Duration::from_millis(10));
        assert!((timing.lookahead_secs - 0.1).abs() < 1e-12);
    }

    #[test]
    fn malformed_user_file_is_ignored() {
        let file = user_file("[defaults\nbpm = ");
        let config = Config::load_with(Some(file.path()));
        assert_eq!(config.bpm(), 120);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let file = user_file("[defaults]\nbpm = 400\n\n[playback]\nlookahead_ms = 5\ntick_interval_ms = 500\n");
        let config = Config::load_with(Some(file.path()));
        assert_eq!(config.bpm(), DEFAULT_BPM);
        let timing = config.scheduler_timing();
        assert!((timing.lookahead_secs - 0.02).abs() < 1e-12);
        assert_eq!(timing.tick_interval, Duration::from_millis(100));
    }

    #[test]
    fn unknown_instrument_falls_back() {
        let file = user_file("[defaults]\ninstrument = \"banjo\"\n");
        let config = Config::load_with(Some(file.path()));
        assert_eq!(config.instrument(), Instrument::Ukulele);
    }
}
