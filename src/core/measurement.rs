/// Measurement records served by the controller's `/api/measurements/list`
///
/// The firmware serialises readings either as JSON numbers or as numeric
/// strings, and emits `{}` for channels it has not measured yet. Values are
/// read with the same leniency the web dashboard applied (`parseFloat`) and
/// formatted like `Number.prototype.toFixed`.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Channels shown by the display panel and the table view
pub const NUM_OF_CHANNELS_TO_DISPLAY: usize = 3;

/// Numeric reading that may arrive as a number or a numeric string
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Reading(f64);

impl Reading {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReading {
    Number(f64),
    Text(String),
    Null,
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = match RawReading::deserialize(deserializer)? {
            RawReading::Number(n) => n,
            RawReading::Text(text) => parse_float(&text),
            RawReading::Null => f64::NAN,
        };
        Ok(Self(value))
    }
}

/// One channel's processed measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    #[serde(rename = "_name")]
    pub name: String,
    pub verbose_name: String,
    pub probe: String,
    #[serde(rename = "temperature_C")]
    pub temperature_c: Reading,
    #[serde(rename = "temperature_F")]
    pub temperature_f: Reading,
    #[serde(rename = "temperature_K")]
    pub temperature_k: Reading,
    #[serde(rename = "resistance_Om")]
    pub resistance_ohm: Reading,
    /// Raw ADC average, not rendered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_reading: Option<Reading>,
}

/// A slot of the measurement array
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelReading {
    Measured(MeasurementRecord),
    /// Channel present but not measured yet (`{}` on the wire)
    Pending,
}

impl ChannelReading {
    pub fn record(&self) -> Option<&MeasurementRecord> {
        match self {
            ChannelReading::Measured(record) => Some(record),
            ChannelReading::Pending => None,
        }
    }
}

impl<'de> Deserialize<'de> for ChannelReading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Object(ref map) if map.is_empty() => Ok(ChannelReading::Pending),
            other => MeasurementRecord::deserialize(other)
                .map(ChannelReading::Measured)
                .map_err(de::Error::custom),
        }
    }
}

impl Serialize for ChannelReading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ChannelReading::Measured(record) => record.serialize(serializer),
            ChannelReading::Pending => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

/// Parse a response body into channel readings, in channel order
pub fn parse_frame(body: &str) -> Result<Vec<ChannelReading>, serde_json::Error> {
    serde_json::from_str(body)
}

/// Lenient float parsing: the longest leading decimal literal wins,
/// anything without one is NaN
pub fn parse_float(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    if s[end..].starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - (end + 1);
        end = frac_end;
    }

    if digits == 0 {
        return f64::NAN;
    }

    // Exponent only counts when it has digits ("1e" parses as 1)
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(f64::NAN)
}

// Digits past the requested precision used to detect exact halfway values
const TIE_PROBE_DIGITS: usize = 25;

// At and above this magnitude numbers print in exponent form
const EXPONENT_THRESHOLD: f64 = 1e21;

/// Format with a fixed number of decimals, rounding exact halves away from
/// zero (`21.125` -> `"21.13"`) and spelling non-finite values `NaN`,
/// `Infinity` and `-Infinity`. Magnitudes of 1e21 and more ignore `digits`
/// and use the shortest exponent form, e.g. `"1.5e+21"`.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude >= EXPONENT_THRESHOLD {
        return format!("{:e}", value).replacen('e', "e+", 1);
    }

    let expanded = format!("{:.*}", digits + TIE_PROBE_DIGITS, magnitude);
    let (head, tail) = expanded.split_at(expanded.len() - TIE_PROBE_DIGITS);

    let rounded = if tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0') {
        increment_last_digit(head.trim_end_matches('.'))
    } else {
        format!("{:.*}", digits, magnitude)
    };

    // -0.0 is not negative here, so it prints without a sign
    if value < 0.0 {
        format!("-{}", rounded)
    } else {
        rounded
    }
}

fn increment_last_digit(number: &str) -> String {
    let mut digits: Vec<char> = number.chars().collect();
    let mut i = digits.len();

    loop {
        if i == 0 {
            digits.insert(0, '1');
            break;
        }
        i -= 1;
        match digits[i] {
            '.' => continue,
            '9' => digits[i] = '0',
            d => {
                digits[i] = char::from(d as u8 + 1);
                break;
            }
        }
    }

    digits.into_iter().collect()
}
