//! HTTP client for the home-automation device API.
//!
//! The backend is treated as a black box exposing per-entity state reads and
//! three command endpoints (mode, temperature, fan). Bearer-token auth; every
//! request carries the configured timeout and non-2xx responses surface as
//! `DeviceError::Http` for the caller to record — command sequencing never
//! aborts on an individual failure.

use serde::{Deserialize, Serialize};

use crate::config::DeviceApiConfig;

#[derive(Debug)]
pub enum DeviceError {
    /// Credentials missing from the environment; the push pipeline
    /// short-circuits before any zone work.
    MissingConfig,
    Transport(String),
    Http { status: u16, message: String },
    Json(String),
}

impl core::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DeviceError::MissingConfig => write!(f, "device API credentials not configured"),
            DeviceError::Transport(s) => write!(f, "transport error: {}", s),
            DeviceError::Http { status, message } => write!(f, "http {}: {}", status, message),
            DeviceError::Json(s) => write!(f, "json error: {}", s),
        }
    }
}

impl std::error::Error for DeviceError {}

impl From<reqwest::Error> for DeviceError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            DeviceError::Json(value.to_string())
        } else {
            DeviceError::Transport(value.to_string())
        }
    }
}

/// Operating mode of a thermostat entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    Heat,
    Cool,
    HeatCool,
    Off,
}

impl HvacMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HvacMode::Heat => "heat",
            HvacMode::Cool => "cool",
            HvacMode::HeatCool => "heat_cool",
            HvacMode::Off => "off",
        }
    }

    /// Tolerant parse of stored/reported mode strings.
    pub fn parse(s: &str) -> Option<HvacMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heat" => Some(HvacMode::Heat),
            "cool" => Some(HvacMode::Cool),
            "heat_cool" | "heatcool" | "auto" => Some(HvacMode::HeatCool),
            "off" => Some(HvacMode::Off),
            _ => None,
        }
    }
}

/// Temperature command payload; dual setpoints only apply to heat_cool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TempCommand {
    Single(f64),
    Dual { high: f64, low: f64 },
}

/// Snapshot of a thermostat entity as the device reports it. Persisted
/// verbatim as the zone's last-known state after read-back.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceState {
    pub hvac_mode: Option<String>,
    pub fan_mode: Option<String>,
    pub current_temp_f: Option<f64>,
    pub humidity: Option<f64>,
    pub heat_setpoint_f: Option<f64>,
    pub cool_setpoint_f: Option<f64>,
    /// Single-setpoint reading for heat-only / cool-only modes.
    pub target_temp_f: Option<f64>,
    /// What the equipment is physically doing ("heating", "cooling",
    /// "idle", "fan").
    pub hvac_action: Option<String>,
}

pub struct DeviceClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl DeviceClient {
    pub fn new(config: &DeviceApiConfig) -> Result<Self, DeviceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeviceError::Transport(e.to_string()))?;
        Ok(DeviceClient {
            client,
            base_url: config.base_url.clone(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Cheap reachability probe, used once per cycle before any zone work.
    pub async fn ping(&self) -> Result<(), DeviceError> {
        let res = self
            .client
            .get(self.url("api/"))
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;
        if res.status().is_success() {
            Ok(())
        } else {
            Err(DeviceError::Http {
                status: res.status().as_u16(),
                message: res.text().await.unwrap_or_default(),
            })
        }
    }

    pub async fn get_state(&self, entity_id: &str) -> Result<DeviceState, DeviceError> {
        let res = self
            .client
            .get(self.url(&format!("api/entities/{}/state", entity_id)))
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(DeviceError::Http {
                status: res.status().as_u16(),
                message: res.text().await.unwrap_or_default(),
            });
        }
        let state = res
            .json::<DeviceState>()
            .await
            .map_err(|e| DeviceError::Json(e.to_string()))?;
        Ok(state)
    }

    pub async fn set_mode(&self, entity_id: &str, mode: HvacMode) -> Result<(), DeviceError> {
        self.post_command(
            &format!("api/entities/{}/mode", entity_id),
            &serde_json::json!({ "hvac_mode": mode.as_str() }),
        )
        .await
    }

    pub async fn set_temperature(
        &self,
        entity_id: &str,
        command: TempCommand,
    ) -> Result<(), DeviceError> {
        let body = match command {
            TempCommand::Single(t) => serde_json::json!({ "temperature": t }),
            TempCommand::Dual { high, low } => {
                serde_json::json!({ "target_temp_high": high, "target_temp_low": low })
            }
        };
        self.post_command(&format!("api/entities/{}/temperature", entity_id), &body)
            .await
    }

    pub async fn set_fan_mode(&self, entity_id: &str, fan_mode: &str) -> Result<(), DeviceError> {
        self.post_command(
            &format!("api/entities/{}/fan", entity_id),
            &serde_json::json!({ "fan_mode": fan_mode }),
        )
        .await
    }

    async fn post_command(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<(), DeviceError> {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.bearer_token)
            .json(body)
            .send()
            .await?;
        if res.status().is_success() {
            Ok(())
        } else {
            Err(DeviceError::Http {
                status: res.status().as_u16(),
                message: res.text().await.unwrap_or_default(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mode_aliases() {
        assert_eq!(HvacMode::parse("heat"), Some(HvacMode::Heat));
        assert_eq!(HvacMode::parse("Heat_Cool"), Some(HvacMode::HeatCool));
        assert_eq!(HvacMode::parse("auto"), Some(HvacMode::HeatCool));
        assert_eq!(HvacMode::parse(" off "), Some(HvacMode::Off));
        assert_eq!(HvacMode::parse("dry"), None);
    }

    #[test]
    fn device_state_roundtrips_through_json() {
        let state = DeviceState {
            hvac_mode: Some("heat".into()),
            fan_mode: Some("auto".into()),
            current_temp_f: Some(69.5),
            humidity: Some(41.0),
            heat_setpoint_f: Some(68.0),
            cool_setpoint_f: None,
            target_temp_f: Some(68.0),
            hvac_action: Some("heating".into()),
        };
        let json = serde_json::to_value(&state).unwrap();
        let back: DeviceState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
