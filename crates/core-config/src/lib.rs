//! Configuration loading and parsing.
//!
//! Parses `folio.toml` (or an override path provided by the binary):
//!
//! ```toml
//! [gesture]
//! threshold_ratio = 0.25
//! travel_ratio = 0.85
//! settle_ms = 220
//!
//! [resize]
//! debounce_ms = 120
//!
//! [runtime]
//! tick_ms = 40
//! ```
//!
//! Unknown fields are ignored. A missing file or a file that fails to parse
//! yields defaults, logged at `warn`. Ratios outside `(0, 1]` are clamped by
//! `Config::apply`, which logs the clamp under the `config` target. A NaN or
//! infinite ratio takes its default. The raw parsed values are retained in
//! `file` for diagnostics.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};
use tracing::{info, warn};

const MIN_RATIO: f32 = 0.01;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GestureConfig {
    #[serde(default = "GestureConfig::default_threshold_ratio")]
    pub threshold_ratio: f32,
    #[serde(default = "GestureConfig::default_travel_ratio")]
    pub travel_ratio: f32,
    #[serde(default = "GestureConfig::default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            threshold_ratio: Self::default_threshold_ratio(),
            travel_ratio: Self::default_travel_ratio(),
            settle_ms: Self::default_settle_ms(),
        }
    }
}

impl GestureConfig {
    const fn default_threshold_ratio() -> f32 {
        0.25
    }
    const fn default_travel_ratio() -> f32 {
        0.85
    }
    const fn default_settle_ms() -> u64 {
        220
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ResizeConfig {
    #[serde(default = "ResizeConfig::default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            debounce_ms: Self::default_debounce_ms(),
        }
    }
}

impl ResizeConfig {
    const fn default_debounce_ms() -> u64 {
        120
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    #[serde(default = "RuntimeConfig::default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_ms: Self::default_tick_ms(),
        }
    }
}

impl RuntimeConfig {
    const fn default_tick_ms() -> u64 {
        40
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub resize: ResizeConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Values after clamping, ready to hand to the gesture controller and timers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveConfig {
    pub threshold_ratio: f32,
    pub travel_ratio: f32,
    pub settle: Duration,
    pub resize_debounce: Duration,
    pub tick: Duration,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        ConfigFile::default().effective()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
    pub effective: EffectiveConfig,
}

impl ConfigFile {
    fn effective(&self) -> EffectiveConfig {
        EffectiveConfig {
            threshold_ratio: usable_ratio(
                self.gesture.threshold_ratio,
                GestureConfig::default_threshold_ratio(),
            ),
            travel_ratio: usable_ratio(
                self.gesture.travel_ratio,
                GestureConfig::default_travel_ratio(),
            ),
            settle: Duration::from_millis(self.gesture.settle_ms),
            resize_debounce: Duration::from_millis(self.resize.debounce_ms),
            tick: Duration::from_millis(self.runtime.tick_ms.max(1)),
        }
    }
}

// `clamp` lets NaN through.
fn usable_ratio(value: f32, default: f32) -> f32 {
    if value.is_finite() {
        value.clamp(MIN_RATIO, 1.0)
    } else {
        default
    }
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("folio.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("folio").join("folio.toml");
    }
    PathBuf::from("folio.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let mut config = match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Config {
                raw: Some(content),
                file,
                effective: EffectiveConfig::default(),
            },
            Err(e) => {
                warn!(target: "config", file = %path.display(), error = %e, "config_parse_failed_using_defaults");
                Config::default()
            }
        },
        Err(e) => {
            warn!(target: "config", file = %path.display(), error = %e, "config_unreadable_using_defaults");
            Config::default()
        }
    };
    config.apply();
    Ok(config)
}

impl Config {
    /// Clamp parsed values into their usable ranges. Returns the effective set.
    pub fn apply(&mut self) -> EffectiveConfig {
        let effective = self.file.effective();
        let gesture = &self.file.gesture;
        if effective.threshold_ratio != gesture.threshold_ratio
            || effective.travel_ratio != gesture.travel_ratio
        {
            info!(
                target: "config",
                raw_threshold = gesture.threshold_ratio,
                threshold = effective.threshold_ratio,
                raw_travel = gesture.travel_ratio,
                travel = effective.travel_ratio,
                "gesture_ratio_clamped"
            );
        }
        self.effective = effective;
        effective
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.file.gesture.threshold_ratio, 0.25);
        assert_eq!(cfg.effective.settle, Duration::from_millis(220));
        assert_eq!(cfg.effective.resize_debounce, Duration::from_millis(120));
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn parses_gesture_values() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[gesture]\nthreshold_ratio = 0.4\nsettle_ms = 300\n[runtime]\ntick_ms = 16\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective.threshold_ratio, 0.4);
        assert_eq!(cfg.effective.travel_ratio, 0.85);
        assert_eq!(cfg.effective.settle, Duration::from_millis(300));
        assert_eq!(cfg.effective.tick, Duration::from_millis(16));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[gesture\nthreshold_ratio = ").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective, EffectiveConfig::default());
    }

    #[test]
    fn zero_tick_is_raised_to_one_ms() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[runtime]\ntick_ms = 0\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.effective.tick, Duration::from_millis(1));
    }

    #[test]
    fn clamp_logging_uses_config_target() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[gesture]\nthreshold_ratio = 3.0\ntravel_ratio = -1.0\n",
        )
        .unwrap();
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let cfg = with_default(subscriber, || {
            load_from(Some(tmp.path().to_path_buf())).unwrap()
        });

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("gesture_ratio_clamped"));
        assert_eq!(cfg.effective.threshold_ratio, 1.0);
        assert_eq!(cfg.effective.travel_ratio, MIN_RATIO);
        assert_eq!(cfg.file.gesture.threshold_ratio, 3.0);
    }

    #[test]
    fn non_finite_ratios_take_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[gesture]\nthreshold_ratio = nan\ntravel_ratio = inf\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(cfg.file.gesture.threshold_ratio.is_nan());
        assert_eq!(cfg.effective.threshold_ratio, 0.25);
        assert_eq!(cfg.effective.travel_ratio, 0.85);
    }

    #[test]
    fn missing_file_is_logged_with_its_path() {
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::WARN)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let cfg = with_default(subscriber, || {
            load_from(Some(PathBuf::from("__absent_folio__.toml"))).unwrap()
        });

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("WARN config:"));
        assert!(log_output.contains("config_unreadable_using_defaults"));
        assert!(log_output.contains("__absent_folio__.toml"));
        assert_eq!(cfg.effective, EffectiveConfig::default());
    }
}
