//! Best-effort device fingerprints for soft claim deduplication.
//!
//! Signals are collected one dimension at a time. A dimension that cannot be
//! read becomes [`Signal::Unavailable`] and renders as [`UNSUPPORTED`], so a
//! fingerprint is always produced. The hash is a djb2-style rolling hash over
//! UTF-16 code units, bit-compatible with fingerprints computed in browsers.
//! It is not collision resistant.

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Rendered value of a dimension that could not be collected.
pub const UNSUPPORTED: &str = "unsupported";

/// Separator placed between signal values before hashing.
pub const SIGNAL_DELIMITER: &str = "|~|";

const HASH_SEED: u32 = 5381;

/// One device dimension, in hashing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    RenderingSurface,
    GraphicsDriver,
    Screen,
    Timezone,
    Plugins,
    UserAgent,
    Language,
    LogicalCores,
    TouchPoints,
}

impl Dimension {
    pub const ALL: [Dimension; 9] = [
        Dimension::RenderingSurface,
        Dimension::GraphicsDriver,
        Dimension::Screen,
        Dimension::Timezone,
        Dimension::Plugins,
        Dimension::UserAgent,
        Dimension::Language,
        Dimension::LogicalCores,
        Dimension::TouchPoints,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Available(String),
    Unavailable,
}

impl Signal {
    pub fn as_str(&self) -> &str {
        match self {
            Signal::Available(value) => value,
            Signal::Unavailable => UNSUPPORTED,
        }
    }
}

impl From<Option<String>> for Signal {
    fn from(value: Option<String>) -> Self {
        value.map_or(Signal::Unavailable, Signal::Available)
    }
}

/// Somewhere device signals can be read from.
pub trait SignalSource {
    fn signal(&self, dimension: Dimension) -> Signal;
}

/// The collected signals, ordered as [`Dimension::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSignal {
    values: Vec<Signal>,
}

impl DeviceSignal {
    pub fn collect(source: &dyn SignalSource) -> Self {
        Self {
            values: Dimension::ALL
                .iter()
                .map(|&dimension| source.signal(dimension))
                .collect(),
        }
    }

    pub fn get(&self, dimension: Dimension) -> &Signal {
        &self.values[dimension as usize]
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(Signal::as_str)
    }

    pub fn joined(&self) -> String {
        self.values().collect::<Vec<_>>().join(SIGNAL_DELIMITER)
    }
}

/// A `<8-hex>-<8-hex>` device fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hashes every signal together, then the rendering surface on its own.
    pub fn from_signals(signals: &DeviceSignal) -> Self {
        let full = hash(&signals.joined());
        let rendering = hash(signals.get(Dimension::RenderingSurface).as_str());
        Fingerprint(format!("{full}-{rendering}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn hash_u32(input: &str) -> u32 {
    input.encode_utf16().fold(HASH_SEED, |h, unit| {
        h.wrapping_shl(5).wrapping_add(h).wrapping_add(u32::from(unit))
    })
}

/// Rolling hash rendered as 8 lowercase hex digits.
pub fn hash(input: &str) -> String {
    format!("{:08x}", hash_u32(input))
}

pub fn generate_fingerprint(source: &dyn SignalSource) -> Fingerprint {
    Fingerprint::from_signals(&DeviceSignal::collect(source))
}

/// Signals as reported by a browser page. Every field is optional, and a
/// field of the wrong type is read as missing rather than failing the report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportedSignals {
    #[serde(deserialize_with = "lenient_text")]
    pub canvas: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub webgl: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub screen: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub timezone: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub plugins: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub user_agent: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub language: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub hardware_concurrency: Option<u32>,
    #[serde(deserialize_with = "lenient_count")]
    pub max_touch_points: Option<u32>,
}

impl ReportedSignals {
    /// Parses a browser report.
    ///
    /// # Arguments
    /// * `json` - The report as sent by the page
    ///
    /// # Returns
    /// The parsed signals. A document that is not a JSON object yields an
    /// empty report, so every dimension falls back to [`UNSUPPORTED`].
    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|err| {
            warn!(error = %err, "unreadable signal report, using sentinels");
            Self::default()
        })
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    })
}

impl SignalSource for ReportedSignals {
    fn signal(&self, dimension: Dimension) -> Signal {
        match dimension {
            Dimension::RenderingSurface => self.canvas.clone().into(),
            Dimension::GraphicsDriver => self.webgl.clone().into(),
            Dimension::Screen => self.screen.clone().into(),
            Dimension::Timezone => self.timezone.clone().into(),
            Dimension::Plugins => self.plugins.clone().into(),
            Dimension::UserAgent => self.user_agent.clone().into(),
            Dimension::Language => self.language.clone().into(),
            Dimension::LogicalCores => self.hardware_concurrency.map(|n| n.to_string()).into(),
            Dimension::TouchPoints => self.max_touch_points.map(|n| n.to_string()).into(),
        }
    }
}

/// Signals of the machine running this process.
#[derive(Debug, Clone, Default)]
pub struct HostSignals {
    timezone: Option<String>,
    language: Option<String>,
    cores: Option<usize>,
}

impl HostSignals {
    pub fn detect() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            timezone: var("TZ"),
            language: var("LANG"),
            cores: std::thread::available_parallelism().ok().map(|n| n.get()),
        }
    }
}

impl SignalSource for HostSignals {
    fn signal(&self, dimension: Dimension) -> Signal {
        match dimension {
            Dimension::Timezone => self.timezone.clone().into(),
            Dimension::UserAgent => Signal::Available(format!(
                "{}/{} ({}; {})",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH
            )),
            Dimension::Language => self.language.clone().into(),
            Dimension::LogicalCores => self.cores.map(|n| n.to_string()).into(),
            Dimension::TouchPoints => Signal::Available("0".to_string()),
            Dimension::RenderingSurface
            | Dimension::GraphicsDriver
            | Dimension::Screen
            | Dimension::Plugins => Signal::Unavailable,
        }
    }
}
