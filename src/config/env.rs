//! Environment variable naming scheme (spec §6): a photon's constructor
//! parameters become `{PHOTONNAME}_{PARAM_NAME}` environment variables.

use std::collections::HashMap;

use crate::model::ConfigParam;

fn to_upper_snake(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(ch.to_uppercase());
    }
    out
}

pub fn env_var_name(photon_name: &str, param_name: &str) -> String {
    format!("{}_{}", to_upper_snake(photon_name), to_upper_snake(param_name))
}

/// Resolves a photon's configuration record from the process environment,
/// per the naming scheme above. A parameter with a symbolic default
/// satisfies "required" even when its variable is unset (spec §6).
pub fn resolve_from_env(photon_name: &str, params: &[ConfigParam]) -> HashMap<String, String> {
    let mut record = HashMap::new();
    for param in params {
        let var = env_var_name(photon_name, &param.name);
        if let Ok(value) = std::env::var(&var) {
            record.insert(param.name.clone(), value);
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_upper_snake_case_name() {
        assert_eq!(env_var_name("demo", "apiKey"), "DEMO_API_KEY");
    }
}
