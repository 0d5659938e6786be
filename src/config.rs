//! Page lists per provider group.
//!
//! The built-in lists track the public documentation indices; a JSON
//! config file with the same shape (`{"ose": [...], "lg": [...]}`) can
//! replace them for partial or experimental runs.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::model::Group;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub ose: Vec<String>,
    #[serde(default)]
    pub lg: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let de = &mut serde_json::Deserializer::from_str(&source);
        let config: Config = serde_path_to_error::deserialize(de)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn urls(&self, group: Group) -> &[String] {
        match group {
            Group::Ose => &self.ose,
            Group::Lg => &self.lg,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let ose_base = "https://www.webosose.org/docs/reference/ls2-api";
        let lg_base = "https://webostv.developer.lge.com/api/webos-service-api";
        Config {
            ose: OSE_PAGES
                .iter()
                .map(|page| format!("{ose_base}/{page}/"))
                .collect(),
            lg: LG_PAGES
                .iter()
                .map(|page| format!("{lg_base}/{page}/"))
                .collect(),
        }
    }
}

const OSE_PAGES: &[&str] = &[
    "com-webos-appinstallservice",
    "com-webos-bootmanager",
    "com-webos-media",
    "com-webos-notification",
    "com-webos-service-activitymanager",
    "com-webos-service-ai-voice",
    "com-webos-service-alarm",
    "com-webos-service-applicationmanager",
    "com-webos-service-audio",
    "com-webos-service-audiofocusmanager",
    "com-webos-service-audiooutput",
    "com-webos-service-bluetooth2",
    "com-webos-service-bugreport",
    "com-webos-service-camera2",
    "com-webos-service-cec",
    "com-webos-service-config",
    "com-webos-service-configurator",
    "com-webos-service-connectionmanager",
    "com-webos-service-contextintentmgr",
    "com-webos-service-db",
    "com-webos-service-devmode",
    "com-webos-service-downloadmanager",
    "com-webos-service-filecache",
    "com-webos-service-hfp",
    "com-webos-service-intent",
    "com-webos-service-location",
    "com-webos-service-mediacontroller",
    "com-webos-service-mediaindexer",
    "com-webos-service-memorymanager",
    "com-webos-service-nettools",
    "com-webos-service-pdm",
    "com-webos-service-peripheralmanager",
    "com-webos-service-power2",
    "com-webos-service-preferences",
    "com-webos-service-rosbridge",
    "com-webos-service-settings",
    "com-webos-service-sleep",
    "com-webos-service-storageaccess",
    "com-webos-service-swupdater",
    "com-webos-service-systemservice",
    "com-webos-service-tempdb",
    "com-webos-service-tts",
    "com-webos-service-unifiedsearch",
    "com-webos-service-uwb",
    "com-webos-service-webappmanager",
    "com-webos-service-wifi",
    "com-webos-surfacemanager",
];

const LG_PAGES: &[&str] = &[
    "activity-manager",
    "application-manager",
    "audio",
    "camera",
    "connection-manager",
    "db",
    "device-unique-id",
    "drm",
    "magic-remote",
    "media-database",
    "settings-service",
    "system-service",
    "tv-device-information",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_lists_cover_both_groups() {
        let config = Config::default();
        assert_eq!(config.urls(Group::Ose).len(), 47);
        assert_eq!(config.urls(Group::Lg).len(), 13);
        assert!(config.ose.iter().all(|u| u.starts_with("https://www.webosose.org/")));
        assert!(config.lg.iter().all(|u| u.ends_with('/')));
    }

    #[test]
    fn config_file_overrides_the_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.json");
        std::fs::write(&path, r#"{"ose": ["https://example.test/audio/"]}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.ose, vec!["https://example.test/audio/"]);
        assert!(config.lg.is_empty());
    }

    #[test]
    fn bad_config_reports_the_offending_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.json");
        std::fs::write(&path, r#"{"ose": [1]}"#).unwrap();
        let err = format!("{:#}", Config::load(&path).unwrap_err());
        assert!(err.contains("ose"), "{err}");
    }
}
