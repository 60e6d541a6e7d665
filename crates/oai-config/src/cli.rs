//! Command-line surface of the `oaid` binary.

use std::ffi::OsString;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use thiserror::Error;

use crate::deployment::DeploymentContext;

/// Errors raised while turning command-line arguments into a deployment.
#[derive(Debug, Error)]
pub enum CliError {
    /// The arguments could not be parsed.
    #[error(transparent)]
    Parse(#[from] clap::Error),
    /// None of the directory flags were supplied.
    #[error("one of --log-dir or --bin-dir is required")]
    MissingDirectory,
}

/// Arguments accepted by the server bootstrap.
#[derive(Debug, Clone, Parser, PartialEq, Eq)]
#[command(name = "oaid", about = "Bootstrap the OAI harvesting server environment")]
pub struct Cli {
    /// Directory for log output; also the configuration directory unless
    /// `--root-dir` is given.
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<Utf8PathBuf>,
    /// Directory holding the properties files.
    #[arg(long, value_name = "DIR", requires = "log_dir")]
    pub root_dir: Option<Utf8PathBuf>,
    /// Container installation directory; selects hosted mode.
    #[arg(long, value_name = "DIR", conflicts_with_all = ["log_dir", "root_dir"])]
    pub bin_dir: Option<Utf8PathBuf>,
    /// Lookups attempted for a missing configuration file before giving up.
    #[arg(long, value_name = "COUNT", default_value_t = 1)]
    pub resolve_attempts: u32,
    /// Milliseconds to wait between two lookups of a missing file.
    #[arg(long, value_name = "MILLIS", default_value_t = 0)]
    pub resolve_delay_ms: u64,
}

impl Cli {
    /// Parses the supplied arguments, the first of which is the binary name.
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Ok(Self::try_parse_from(args)?)
    }

    /// Pause between two lookups of a missing configuration file.
    #[must_use]
    pub const fn resolve_delay(&self) -> Duration {
        Duration::from_millis(self.resolve_delay_ms)
    }

    /// Maps the flags to a deployment context.
    pub fn deployment(&self) -> Result<DeploymentContext, CliError> {
        match (&self.bin_dir, &self.root_dir, &self.log_dir) {
            (Some(bin_dir), _, _) => Ok(DeploymentContext::Hosted {
                bin_dir: bin_dir.clone(),
            }),
            (None, Some(root_dir), Some(log_dir)) => Ok(DeploymentContext::StandaloneWithRoot {
                root_dir: root_dir.clone(),
                log_dir: log_dir.clone(),
            }),
            (None, None, Some(log_dir)) => Ok(DeploymentContext::Standalone {
                log_dir: log_dir.clone(),
            }),
            (None, _, None) => Err(CliError::MissingDirectory),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn log_dir_alone_selects_standalone() {
        let cli = Cli::try_parse_args(["oaid", "--log-dir", "/srv/oai"]).expect("parse");
        assert_eq!(
            cli.deployment().expect("deployment"),
            DeploymentContext::Standalone {
                log_dir: "/srv/oai".into()
            }
        );
    }

    #[rstest]
    fn root_dir_selects_split_layout() {
        let cli = Cli::try_parse_args(["oaid", "--root-dir", "/srv/oai", "--log-dir", "/var/log"])
            .expect("parse");
        assert_eq!(
            cli.deployment().expect("deployment"),
            DeploymentContext::StandaloneWithRoot {
                root_dir: "/srv/oai".into(),
                log_dir: "/var/log".into(),
            }
        );
    }

    #[rstest]
    fn bin_dir_selects_hosted() {
        let cli = Cli::try_parse_args(["oaid", "--bin-dir", "/opt/tomcat/bin"]).expect("parse");
        assert!(matches!(
            cli.deployment().expect("deployment"),
            DeploymentContext::Hosted { .. }
        ));
    }

    #[rstest]
    fn root_dir_requires_log_dir() {
        let error = Cli::try_parse_args(["oaid", "--root-dir", "/srv/oai"]).expect_err("must fail");
        assert!(matches!(error, CliError::Parse(_)));
    }

    #[rstest]
    fn bin_dir_conflicts_with_log_dir() {
        let result = Cli::try_parse_args(["oaid", "--bin-dir", "/a", "--log-dir", "/b"]);
        assert!(result.is_err());
    }

    #[rstest]
    fn resolution_retry_defaults_to_a_single_attempt() {
        let cli = Cli::try_parse_args(["oaid", "--log-dir", "/srv/oai"]).expect("parse");
        assert_eq!(cli.resolve_attempts, 1);
        assert_eq!(cli.resolve_delay(), Duration::ZERO);

        let cli = Cli::try_parse_args([
            "oaid",
            "--log-dir",
            "/srv/oai",
            "--resolve-attempts",
            "5",
            "--resolve-delay-ms",
            "250",
        ])
        .expect("parse");
        assert_eq!(cli.resolve_attempts, 5);
        assert_eq!(cli.resolve_delay(), Duration::from_millis(250));
    }

    #[rstest]
    fn no_directory_is_reported() {
        let cli = Cli::try_parse_args(["oaid"]).expect("parse");
        assert!(matches!(cli.deployment(), Err(CliError::MissingDirectory)));
    }
}
