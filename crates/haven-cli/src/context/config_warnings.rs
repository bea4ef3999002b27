use haven_config::HavenConfig;

/// Sections whose env overrides are easy to mistype with a single underscore.
const SECTIONS: &[(&str, &str)] = &[
    ("IDENTITY", "HAVEN_IDENTITY__USER_ID"),
    ("LOCATION", "HAVEN_LOCATION__FALLBACK_LAT"),
    ("SCANNER", "HAVEN_SCANNER__INTERVAL_SECS"),
    ("GEODATA", "HAVEN_GEODATA__TIMEOUT_SECS"),
    ("DATABASE", "HAVEN_DATABASE__PATH"),
];

/// Warn about `HAVEN_*` env vars that figment silently ignored.
pub fn warn_misnamed_env(config: &HavenConfig) {
    for warning in collect_warnings(config, std::env::vars().map(|(key, _)| key)) {
        tracing::warn!("{warning}");
    }
}

fn collect_warnings<I>(config: &HavenConfig, env_keys: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let keys = env_keys.into_iter().collect::<Vec<_>>();
    let mut warnings = Vec::new();

    for (section, example) in SECTIONS {
        let single = format!("HAVEN_{section}_");
        let double = format!("HAVEN_{section}__");
        let misnamed = keys
            .iter()
            .any(|key| key.starts_with(&single) && !key.starts_with(&double));
        if misnamed {
            warnings.push(format!(
                "HAVEN_{section}_* env vars are ignored; use double underscores (example: {example})"
            ));
        }
    }

    if !config.identity.is_configured() && keys.iter().any(|k| k == "HAVEN_USER") {
        warnings.push("HAVEN_USER is ignored; set HAVEN_IDENTITY__USER_ID or pass --user".into());
    }

    warnings
}
