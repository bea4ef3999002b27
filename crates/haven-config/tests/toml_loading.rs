//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for sandboxed files and env vars.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use haven_config::{ConfigError, HavenConfig};

#[test]
fn loads_every_section_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[database]
path = "/var/lib/haven/haven.db"

[scanner]
interval_secs = 5

[location]
timeout_secs = 3
fallback_lat = 51.5074
fallback_lng = -0.1278

[geodata]
endpoints = ["http://localhost:12345/api/interpreter"]
timeout_secs = 8
search_radius_m = 1500.0

[identity]
user_id = "alex"
display_name = "Alex"

[general]
default_limit = 50
"#,
        )?;

        let figment = Figment::from(Serialized::defaults(HavenConfig::default()))
            .merge(Toml::file("config.toml"));
        let config = HavenConfig::from_figment(&figment).expect("config");

        assert_eq!(config.database.path, "/var/lib/haven/haven.db");
        assert_eq!(config.scanner.interval_secs, 5);
        assert_eq!(config.location.timeout_secs, 3);
        let fallback = config.location.fallback().expect("fallback set");
        assert!((fallback.lat - 51.5074).abs() < 1e-9);
        assert_eq!(config.geodata.endpoints.len(), 1);
        assert_eq!(config.geodata.timeout_secs, 8);
        assert!((config.geodata.search_radius_m - 1500.0).abs() < f64::EPSILON);
        assert_eq!(config.identity.resolve(None).unwrap().signature(), "Alex");
        assert_eq!(config.general.default_limit, 50);
        Ok(())
    });
}

#[test]
fn partial_section_keeps_other_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[location]\nfallback_lat = 1.0\nfallback_lng = 2.0\n")?;

        let figment = Figment::from(Serialized::defaults(HavenConfig::default()))
            .merge(Toml::file("config.toml"));
        let config = HavenConfig::from_figment(&figment).expect("config");

        assert_eq!(config.location.timeout_secs, 10);
        assert_eq!(config.scanner.interval_secs, 30);
        Ok(())
    });
}

#[test]
fn zero_scan_interval_fails_validation() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[scanner]\ninterval_secs = 0\n")?;

        let figment = Figment::from(Serialized::defaults(HavenConfig::default()))
            .merge(Toml::file("config.toml"));
        let err = HavenConfig::from_figment(&figment).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "scanner.interval_secs"));
        Ok(())
    });
}

#[test]
fn project_config_in_working_directory_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".haven")?;
        jail.create_file(".haven/config.toml", "[identity]\nuser_id = \"sam\"\n")?;

        let config = HavenConfig::load().expect("config");
        assert_eq!(config.identity.user_id, "sam");
        Ok(())
    });
}
