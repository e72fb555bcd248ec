//! Config file handling.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;

use super::error::{OptionError, OptionResult};

/// The sysfs location of the vidmem report, under the GPU platform device.
pub const SYSFS_REPORT_PATH: &str =
    "/sys/devices/platform/soc@0/42080000.rifsc/48280000.gpu/vidmem";

/// The historical debugfs location of the vidmem report.
pub const DEBUGFS_REPORT_PATH: &str = "/d/gc/vidmem";

/// Where the kernel exposes the vidmem report. Selected once at startup,
/// never branched on afterwards.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportSource {
    /// The sysfs report under the GPU platform device.
    #[default]
    Sysfs,
    /// The debugfs report; only available when debugfs is mounted.
    Debugfs,
}

impl ReportSource {
    /// The report location this source resolves to.
    pub fn path(self) -> &'static Path {
        match self {
            ReportSource::Sysfs => Path::new(SYSFS_REPORT_PATH),
            ReportSource::Debugfs => Path::new(DEBUGFS_REPORT_PATH),
        }
    }
}

impl FromStr for ReportSource {
    type Err = OptionError;

    fn from_str(s: &str) -> OptionResult<Self> {
        if s.eq_ignore_ascii_case("sysfs") {
            Ok(ReportSource::Sysfs)
        } else if s.eq_ignore_ascii_case("debugfs") {
            Ok(ReportSource::Debugfs)
        } else {
            Err(OptionError::arg(format!(
                "'{s}' is not a valid report source, use 'sysfs' or 'debugfs'."
            )))
        }
    }
}

/// The config file as deserialized from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub report: Option<ReportConfig>,
}

/// Report location settings.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReportConfig {
    /// Which kernel report location to read.
    pub source: Option<ReportSource>,
    /// Explicit report location; wins over `source`.
    pub path: Option<PathBuf>,
}

/// Reads the config at `path`. A missing file is fine and means defaults; a
/// file that exists but does not parse is an error worth surfacing.
pub fn get_or_default_config(path: Option<&Path>) -> OptionResult<Config> {
    match path {
        Some(path) => match fs::read_to_string(path) {
            Ok(contents) => Ok(toml_edit::de::from_str(&contents)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Config::default()),
            Err(err) => Err(err.into()),
        },
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_report_section() {
        let config: Config = toml_edit::de::from_str(
            "[report]\nsource = \"debugfs\"\npath = \"/tmp/vidmem\"\n",
        )
        .unwrap();

        let report = config.report.unwrap();
        assert_eq!(report.source, Some(ReportSource::Debugfs));
        assert_eq!(report.path.as_deref(), Some(Path::new("/tmp/vidmem")));
    }

    #[test]
    fn empty_config_is_fine() {
        let config: Config = toml_edit::de::from_str("").unwrap();
        assert!(config.report.is_none());
    }

    #[test]
    fn bad_source_is_rejected() {
        let config: Result<Config, _> = toml_edit::de::from_str("[report]\nsource = \"procfs\"\n");
        assert!(config.is_err());
    }

    #[test]
    fn source_paths() {
        assert_eq!(
            ReportSource::default().path(),
            Path::new(SYSFS_REPORT_PATH)
        );
        assert_eq!(
            "debugfs".parse::<ReportSource>().unwrap().path(),
            Path::new(DEBUGFS_REPORT_PATH)
        );
        assert!("procfs".parse::<ReportSource>().is_err());
    }

    #[test]
    fn missing_config_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = get_or_default_config(Some(&dir.path().join("none.toml"))).unwrap();
        assert!(config.report.is_none());
    }
}
