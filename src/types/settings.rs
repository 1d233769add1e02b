// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

pub const MIN_TIMER_SECONDS: u32 = 1;
pub const MAX_TIMER_SECONDS: u32 = 60;

/// User preferences, persisted as a JSON blob.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub timer_enabled: bool,
    pub timer_seconds: u32,
    #[serde(rename = "minimalUI")]
    pub minimal_ui: bool,
    pub outdoor_mode: bool,
    pub audio_feedback: bool,
    pub light_mode: bool,
    pub autosave: bool,
    pub last_csv_hash: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timer_enabled: false,
            timer_seconds: 5,
            minimal_ui: true,
            outdoor_mode: false,
            // Audio feedback defaults on only for mobile hosts.
            audio_feedback: false,
            light_mode: false,
            autosave: true,
            last_csv_hash: String::new(),
        }
    }
}

impl Settings {
    /// Read settings from a stored blob. Each field that is missing or has
    /// the wrong type falls back to its default on its own.
    pub fn from_value(value: &Value) -> Self {
        let mut settings = Settings::default();
        let bool_field = |key: &str, default: bool| -> bool {
            value.get(key).and_then(Value::as_bool).unwrap_or(default)
        };
        settings.timer_enabled = bool_field("timerEnabled", settings.timer_enabled);
        settings.minimal_ui = bool_field("minimalUI", settings.minimal_ui);
        settings.outdoor_mode = bool_field("outdoorMode", settings.outdoor_mode);
        settings.audio_feedback = bool_field("audioFeedback", settings.audio_feedback);
        settings.light_mode = bool_field("lightMode", settings.light_mode);
        settings.autosave = bool_field("autosave", settings.autosave);
        if let Some(seconds) = value.get("timerSeconds").and_then(Value::as_f64) {
            settings.timer_seconds = clamp_seconds(seconds);
        }
        if let Some(hash) = value.get("lastCsvHash").and_then(Value::as_str) {
            settings.last_csv_hash = hash.to_string();
        }
        settings
    }
}

/// Clamp a timer duration into the supported range. Non-finite values
/// become the minimum.
pub fn clamp_seconds(seconds: f64) -> u32 {
    if !seconds.is_finite() {
        return MIN_TIMER_SECONDS;
    }
    seconds
        .trunc()
        .clamp(MIN_TIMER_SECONDS as f64, MAX_TIMER_SECONDS as f64) as u32
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        assert_eq!(Settings::from_value(&json!({})), Settings::default());
    }

    #[test]
    fn test_wrong_types_fall_back() {
        let value = json!({
            "timerEnabled": true,
            "minimalUI": "yes",
            "autosave": 0,
            "timerSeconds": 90,
        });
        let settings = Settings::from_value(&value);
        assert!(settings.timer_enabled);
        assert!(settings.minimal_ui);
        assert!(settings.autosave);
        assert_eq!(settings.timer_seconds, 60);
    }

    #[test]
    fn test_clamp_seconds() {
        assert_eq!(clamp_seconds(0.0), 1);
        assert_eq!(clamp_seconds(-5.0), 1);
        assert_eq!(clamp_seconds(12.7), 12);
        assert_eq!(clamp_seconds(600.0), 60);
        assert_eq!(clamp_seconds(f64::NAN), 1);
    }

    #[test]
    fn test_serialized_keys() -> crate::error::Fallible<()> {
        let value = serde_json::to_value(Settings::default())?;
        assert_eq!(value["minimalUI"], json!(true));
        assert_eq!(value["timerSeconds"], json!(5));
        assert_eq!(value["autosave"], json!(true));
        Ok(())
    }
}
