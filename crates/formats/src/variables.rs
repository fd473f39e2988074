use serde::{Deserialize, Serialize};

/// Display metadata for a model state variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateVariableInfo {
    pub name: String,
    pub common_name: String,
    pub units: String,
    /// Abbreviated units used in tooltips.
    pub short_units: String,
    pub description: String,
}

struct KnownVariable {
    name: &'static str,
    common_name: &'static str,
    units: &'static str,
    short_units: &'static str,
    description: &'static str,
}

const KNOWN: &[KnownVariable] = &[
    KnownVariable {
        name: "qlink1",
        common_name: "Streamflow",
        units: "cubic meter/second",
        short_units: "cu.m/s",
        description: "Amount of water flow per unit time",
    },
    KnownVariable {
        name: "z_gwsubbas",
        common_name: "Bucket",
        units: "meter",
        short_units: "m",
        description: "Elevation of water in the basin or bucket",
    },
];

/// Looks up a variable; unknown names describe themselves with empty units.
pub fn state_variable(name: &str) -> StateVariableInfo {
    match KNOWN.iter().find(|k| k.name == name) {
        Some(k) => StateVariableInfo {
            name: k.name.to_string(),
            common_name: k.common_name.to_string(),
            units: k.units.to_string(),
            short_units: k.short_units.to_string(),
            description: k.description.to_string(),
        },
        None => StateVariableInfo {
            name: name.to_string(),
            common_name: name.to_string(),
            units: String::new(),
            short_units: String::new(),
            description: String::new(),
        },
    }
}

pub fn is_known_state_variable(name: &str) -> bool {
    KNOWN.iter().any(|k| k.name == name)
}

#[cfg(test)]
mod tests {
    use super::{is_known_state_variable, state_variable};

    #[test]
    fn known_variables() {
        let q = state_variable("qlink1");
        assert_eq!(q.common_name, "Streamflow");
        assert_eq!(q.units, "cubic meter/second");
        assert_eq!(q.short_units, "cu.m/s");
        assert_eq!(state_variable("z_gwsubbas").units, "meter");
    }

    #[test]
    fn unknown_variable_falls_back_to_name() {
        let v = state_variable("sfcheadrt");
        assert_eq!(v.common_name, "sfcheadrt");
        assert!(v.units.is_empty());
        assert!(!is_known_state_variable("sfcheadrt"));
    }
}
