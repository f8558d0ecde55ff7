//! Built-in profiles. Timers are seconds for Normal, CostDeferred, RealTime.

use beacon_core::models::{NetworkCost, PowerSource, TransmitProfileRule, TransmitProfileRules};

pub const REAL_TIME: &str = "REAL_TIME";
pub const NEAR_REAL_TIME: &str = "NEAR_REAL_TIME";
pub const BEST_EFFORT: &str = "BEST_EFFORT";

/// Profile selected when none is configured or the active one disappears.
pub const DEFAULT_PROFILE: &str = REAL_TIME;

pub const BUILT_IN_NAMES: [&str; 3] = [REAL_TIME, NEAR_REAL_TIME, BEST_EFFORT];

pub fn is_built_in(name: &str) -> bool {
    BUILT_IN_NAMES.contains(&name)
}

/// Timer rows in rule order after the leading roaming rule:
/// metered × {unknown, battery, charging}, unmetered × ..., unknown cost × ...
type Rows = [[i32; 3]; 9];

const REAL_TIME_ROWS: Rows = [
    [16, 8, 4],
    [16, 8, 4],
    [12, 6, 3],
    [8, 4, 2],
    [8, 4, 2],
    [4, 2, 1],
    [8, 4, 2],
    [8, 4, 2],
    [4, 2, 1],
];

const NEAR_REAL_TIME_ROWS: Rows = [
    [-1, 24, 12],
    [-1, 24, 12],
    [-1, 18, 9],
    [24, 12, 6],
    [24, 12, 6],
    [12, 6, 3],
    [24, 12, 6],
    [24, 12, 6],
    [12, 6, 3],
];

const BEST_EFFORT_ROWS: Rows = [
    [-1, 72, 36],
    [-1, 72, 36],
    [-1, 54, 27],
    [72, 36, 18],
    [72, 36, 18],
    [36, 18, 9],
    [72, 36, 18],
    [72, 36, 18],
    [36, 18, 9],
];

fn build(name: &str, rows: &Rows) -> TransmitProfileRules {
    const DISABLED: [i32; 3] = [-1, -1, -1];
    let costs = [NetworkCost::Metered, NetworkCost::Unmetered, NetworkCost::Unknown];
    let powers = [PowerSource::Unknown, PowerSource::Battery, PowerSource::Charging];

    let mut rules = Vec::with_capacity(rows.len() + 2);
    rules.push(TransmitProfileRule::new(
        Some(NetworkCost::Roaming),
        None,
        DISABLED.to_vec(),
    ));
    let conditions = costs
        .iter()
        .flat_map(|c| powers.iter().map(move |p| (*c, *p)));
    for ((cost, power), timers) in conditions.zip(rows.iter()) {
        rules.push(TransmitProfileRule::new(Some(cost), Some(power), timers.to_vec()));
    }
    rules.push(TransmitProfileRule::catch_all(DISABLED.to_vec()));
    TransmitProfileRules::new(name, rules)
}

/// The three built-in profiles, in selection order.
pub fn built_in_profiles() -> Vec<TransmitProfileRules> {
    vec![
        build(REAL_TIME, &REAL_TIME_ROWS),
        build(NEAR_REAL_TIME, &NEAR_REAL_TIME_ROWS),
        build(BEST_EFFORT, &BEST_EFFORT_ROWS),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::models::DeviceState;

    #[test]
    fn every_built_in_has_eleven_rules_and_catch_all() {
        for profile in built_in_profiles() {
            assert_eq!(profile.rules.len(), 11, "{}", profile.name);
            assert!(profile.rules.last().unwrap().is_catch_all());
        }
    }

    #[test]
    fn roaming_is_suppressed_everywhere() {
        let roaming = DeviceState::new(NetworkCost::Roaming, PowerSource::Charging);
        for profile in built_in_profiles() {
            let idx = profile.select_rule(&roaming).unwrap();
            assert_eq!(profile.rules[idx].timers, vec![-1, -1, -1]);
        }
    }

    #[test]
    fn real_time_unmetered_charging_is_fastest() {
        let profile = &built_in_profiles()[0];
        let state = DeviceState::new(NetworkCost::Unmetered, PowerSource::Charging);
        let idx = profile.select_rule(&state).unwrap();
        assert_eq!(profile.rules[idx].timers, vec![4, 2, 1]);
    }
}
