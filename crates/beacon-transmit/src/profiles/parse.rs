//! JSON profile documents.
//!
//! ```json
//! [{"name": "CUSTOM", "rules": [{"netCost": "metered", "powerState": "any", "timers": [10, 5, 1]}]}]
//! ```
//!
//! Any malformed input or unknown enum string rejects the whole document.

use serde::Deserialize;

use beacon_core::errors::ProfileError;
use beacon_core::models::{
    NetworkCost, NetworkType, PowerSource, TransmitProfileRule, TransmitProfileRules,
};

#[derive(Debug, Deserialize)]
struct ProfileDoc {
    name: String,
    rules: Vec<RuleDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuleDoc {
    net_cost: Option<String>,
    power_state: Option<String>,
    net_type: Option<String>,
    net_speed: Option<u32>,
    timers: Vec<i32>,
}

/// Parse a profile document into rule lists. Performs no semantic validation.
pub fn parse_profiles(json: &str) -> Result<Vec<TransmitProfileRules>, ProfileError> {
    let docs: Vec<ProfileDoc> = serde_json::from_str(json).map_err(|e| ProfileError::Parse {
        message: e.to_string(),
    })?;

    docs.into_iter()
        .map(|doc| {
            let rules = doc
                .rules
                .into_iter()
                .map(parse_rule)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TransmitProfileRules::new(doc.name, rules))
        })
        .collect()
}

fn parse_rule(doc: RuleDoc) -> Result<TransmitProfileRule, ProfileError> {
    let net_cost = doc.net_cost.as_deref().map(parse_net_cost).transpose()?.flatten();
    let power_state = doc
        .power_state
        .as_deref()
        .map(parse_power_state)
        .transpose()?
        .flatten();
    let net_type = doc.net_type.as_deref().map(parse_net_type).transpose()?.flatten();

    Ok(TransmitProfileRule {
        net_cost,
        power_state,
        net_type,
        net_speed: doc.net_speed.unwrap_or(0),
        timers: doc.timers,
    })
}

/// `Ok(None)` means "any".
fn parse_net_cost(value: &str) -> Result<Option<NetworkCost>, ProfileError> {
    match value.to_ascii_lowercase().as_str() {
        "any" => Ok(None),
        "unknown" => Ok(Some(NetworkCost::Unknown)),
        "unmetered" | "low" => Ok(Some(NetworkCost::Unmetered)),
        "metered" | "high" => Ok(Some(NetworkCost::Metered)),
        "roaming" | "restricted" => Ok(Some(NetworkCost::Roaming)),
        _ => Err(unknown("netCost", value)),
    }
}

fn parse_power_state(value: &str) -> Result<Option<PowerSource>, ProfileError> {
    match value.to_ascii_lowercase().as_str() {
        "any" => Ok(None),
        "unknown" => Ok(Some(PowerSource::Unknown)),
        "battery" => Ok(Some(PowerSource::Battery)),
        "charging" => Ok(Some(PowerSource::Charging)),
        _ => Err(unknown("powerState", value)),
    }
}

fn parse_net_type(value: &str) -> Result<Option<NetworkType>, ProfileError> {
    match value.to_ascii_lowercase().as_str() {
        "any" => Ok(None),
        "unknown" => Ok(Some(NetworkType::Unknown)),
        "wired" => Ok(Some(NetworkType::Wired)),
        "wifi" => Ok(Some(NetworkType::Wifi)),
        "wwan" => Ok(Some(NetworkType::Wwan)),
        _ => Err(unknown("netType", value)),
    }
}

fn unknown(field: &str, value: &str) -> ProfileError {
    ProfileError::Parse {
        message: format!("unknown {field} value {value:?}"),
    }
}
