use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::{fs, io};
use thiserror::Error;

/// Where the disc image collaborator reads sector data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DataLocation {
    /// Built-in image held in memory (the menu disc)
    #[default]
    Ram,
    /// Image mounted from removable storage
    SdCard,
}

impl Display for DataLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ram => write!(f, "RAM"),
            Self::SdCard => write!(f, "SD card"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error reading config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Error parsing config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamerConfig {
    /// Sectors before absolute sector 0 of the disc image
    #[serde(default = "default_lead_in")]
    pub lead_in: i32,
    /// Sectors between the lead-in and the start of track data
    #[serde(default = "default_pregap")]
    pub pregap: i32,
    /// Sector (relative to start of data) that carries directory listing pages
    #[serde(default = "default_listing_sector")]
    pub listing_sector: i32,
    /// Maximum number of visible entries scanned per directory
    #[serde(default = "default_scan_cap")]
    pub scan_cap: u16,
    /// Only list files whose name (minus extension) contains this string
    #[serde(default)]
    pub name_filter: Option<String>,
    #[serde(default)]
    pub initial_data_location: DataLocation,
}

impl StreamerConfig {
    /// Parse a config from TOML text; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or the resulting config is out of range.
    pub fn from_toml(s: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not contain a valid config.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        log::info!("Loaded config from '{}'", path.display());

        Self::from_toml(&s)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.lead_in < 0 || self.pregap < 0 {
            return Err(ConfigError::Invalid(format!(
                "lead_in and pregap must be non-negative, were {} and {}",
                self.lead_in, self.pregap
            )));
        }

        if self.listing_sector < 0 {
            return Err(ConfigError::Invalid(format!(
                "listing_sector must be non-negative, was {}",
                self.listing_sector
            )));
        }

        // 0xFFFF is the "count unknown" sentinel in listing pages
        if self.scan_cap == 0 || self.scan_cap == u16::MAX {
            return Err(ConfigError::Invalid(format!(
                "scan_cap must be between 1 and {}, was {}",
                u16::MAX - 1,
                self.scan_cap
            )));
        }

        Ok(())
    }
}

impl Default for StreamerConfig {
    fn default() -> Self {
        toml::from_str("").unwrap()
    }
}

fn default_lead_in() -> i32 {
    cdrom::LEAD_IN_SECTORS
}

fn default_pregap() -> i32 {
    cdrom::PREGAP_SECTORS
}

fn default_listing_sector() -> i32 {
    100
}

fn default_scan_cap() -> u16 {
    4096
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn empty_config_uses_defaults() {
        let config = StreamerConfig::from_toml("").unwrap();
        assert_eq!(config, StreamerConfig::default());
        assert_eq!(config.lead_in, 4500);
        assert_eq!(config.pregap, 150);
        assert_eq!(config.listing_sector, 100);
        assert_eq!(config.scan_cap, 4096);
        assert_eq!(config.name_filter, None);
        assert_eq!(config.initial_data_location, DataLocation::Ram);
    }

    #[test]
    fn overrides() {
        let config = StreamerConfig::from_toml(
            "listing_sector = 20\nname_filter = \"Final\"\ninitial_data_location = \"SdCard\"\n",
        )
        .unwrap();
        assert_eq!(config.listing_sector, 20);
        assert_eq!(config.name_filter.as_deref(), Some("Final"));
        assert_eq!(config.initial_data_location, DataLocation::SdCard);
    }

    #[test]
    fn rejects_sentinel_scan_cap() {
        assert!(matches!(
            StreamerConfig::from_toml("scan_cap = 65535"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(StreamerConfig::from_toml("lead_in = \"x\""), Err(ConfigError::Parse(_))));
    }
}
