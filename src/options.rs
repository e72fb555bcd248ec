//! How the binary is configured: argument parsing and config file handling,
//! merged into the settings the service runs with.

pub mod args;
pub mod config;
mod error;

use std::path::PathBuf;

pub use error::{OptionError, OptionResult};

use self::{
    args::MemtrackdArgs,
    config::{Config, ReportSource},
};

/// Resolves the report location from the arguments and the config file.
///
/// Resolution happens once at startup. An explicit path always wins over a
/// source selection, and arguments win over the config file.
pub fn get_report_path(args: &MemtrackdArgs, config: &Config) -> OptionResult<PathBuf> {
    if let Some(path) = &args.report_args.report_path {
        return Ok(PathBuf::from(path));
    }

    if let Some(source) = &args.report_args.source {
        return Ok(source.parse::<ReportSource>()?.path().to_path_buf());
    }

    let report = config.report.clone().unwrap_or_default();
    if let Some(path) = report.path {
        return Ok(path);
    }

    Ok(report.source.unwrap_or_default().path().to_path_buf())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{config::SYSFS_REPORT_PATH, *};
    use crate::options::config::ReportConfig;

    fn parse(args: &[&str]) -> MemtrackdArgs {
        let mut argv = vec!["memtrackd"];
        argv.extend_from_slice(args);
        MemtrackdArgs::parse_from(argv)
    }

    #[test]
    fn default_is_sysfs() {
        let path = get_report_path(&parse(&[]), &Config::default()).unwrap();
        assert_eq!(path, PathBuf::from(SYSFS_REPORT_PATH));
    }

    #[test]
    fn explicit_path_wins_over_source() {
        let args = parse(&["--report-path", "/tmp/vidmem", "--source", "debugfs"]);
        let path = get_report_path(&args, &Config::default()).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/vidmem"));
    }

    #[test]
    fn args_win_over_config() {
        let config = Config {
            report: Some(ReportConfig {
                source: None,
                path: Some(PathBuf::from("/from/config")),
            }),
        };

        let path = get_report_path(&parse(&["--source", "debugfs"]), &config).unwrap();
        assert_eq!(path, ReportSource::Debugfs.path());
    }

    #[test]
    fn config_path_wins_over_config_source() {
        let config = Config {
            report: Some(ReportConfig {
                source: Some(ReportSource::Debugfs),
                path: Some(PathBuf::from("/from/config")),
            }),
        };

        let path = get_report_path(&parse(&[]), &config).unwrap();
        assert_eq!(path, PathBuf::from("/from/config"));
    }

    #[test]
    fn bad_source_is_an_argument_error() {
        let result = get_report_path(&parse(&["--source", "procfs"]), &Config::default());
        assert!(matches!(result, Err(OptionError::Argument(_))));
    }
}
