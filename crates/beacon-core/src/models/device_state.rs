use serde::{Deserialize, Serialize};

/// Cost of the currently active network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkCost {
    #[default]
    Unknown,
    Unmetered,
    Metered,
    Roaming,
}

/// Power source of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerSource {
    #[default]
    Unknown,
    Battery,
    Charging,
}

/// Network medium. Reserved: carried by profile rules but not matched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    #[default]
    Unknown,
    Wired,
    Wifi,
    Wwan,
}

/// Last observed device conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceState {
    pub network_cost: NetworkCost,
    pub power_source: PowerSource,
}

impl DeviceState {
    pub fn new(network_cost: NetworkCost, power_source: PowerSource) -> Self {
        Self {
            network_cost,
            power_source,
        }
    }
}
