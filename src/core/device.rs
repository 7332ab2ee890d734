/// Controller state as served by `/api/state/list`

use serde::{Deserialize, Serialize};

use super::measurement::ChannelReading;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub info: DeviceInfo,
    pub data: DeviceState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "VERSION")]
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    pub device_mode: String,
    #[serde(default)]
    pub is_initialized: bool,
    /// `[ip, netmask, gateway, dns]` once Wi-Fi is up
    #[serde(default)]
    pub network_info: Option<Vec<String>>,
    #[serde(default)]
    pub wifi_ok: bool,
    #[serde(default)]
    pub free_memory: Option<u64>,
    #[serde(default)]
    pub measurement_results: Option<Vec<ChannelReading>>,
}

impl DeviceState {
    pub fn ip_address(&self) -> Option<&str> {
        self.network_info
            .as_ref()
            .and_then(|info| info.first())
            .map(String::as_str)
    }
}
