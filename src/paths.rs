use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;

pub mod env_vars {
    pub const AWS_CONFIG_FILE: &str = "AWS_CONFIG_FILE";
    pub const AWS_SHARED_CREDENTIALS_FILE: &str = "AWS_SHARED_CREDENTIALS_FILE";
    pub const AWSX_HOME: &str = "AWSX_HOME";
}

/// Locations of every file awsx reads or writes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Paths {
    pub aws_config: PathBuf,
    pub aws_credentials: PathBuf,
    pub awsx_home: PathBuf,
}

impl Paths {
    /// Resolves the paths from the environment, falling back to `~/.aws` and `~/.awsx`.
    pub fn from_env() -> anyhow::Result<Paths> {
        let home = dirs::home_dir().context("Failed to determine the home directory")?;
        Ok(Self::resolve(&home, |name| env::var(name).ok()))
    }

    fn resolve<F>(home: &Path, var: F) -> Paths
    where
        F: Fn(&str) -> Option<String>,
    {
        let aws_home = home.join(".aws");
        Paths {
            aws_config: var(env_vars::AWS_CONFIG_FILE)
                .map(PathBuf::from)
                .unwrap_or_else(|| aws_home.join("config")),
            aws_credentials: var(env_vars::AWS_SHARED_CREDENTIALS_FILE)
                .map(PathBuf::from)
                .unwrap_or_else(|| aws_home.join("credentials")),
            awsx_home: var(env_vars::AWSX_HOME)
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(".awsx")),
        }
    }

    /// Lays out every file under a single directory. Used by tests and sandboxes.
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Paths {
        let root = root.as_ref();
        Paths {
            aws_config: root.join(".aws").join("config"),
            aws_credentials: root.join(".aws").join("credentials"),
            awsx_home: root.join(".awsx"),
        }
    }

    pub fn aws_home(&self) -> Option<&Path> {
        self.aws_config.parent()
    }

    pub fn awsx_profiles(&self) -> PathBuf {
        self.awsx_home.join("profiles")
    }

    pub fn exports_script(&self) -> PathBuf {
        self.awsx_home.join("exports.sh")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_live_under_home() {
        let paths = Paths::resolve(Path::new("/home/u"), |_| None);
        assert_eq!(paths.aws_config, PathBuf::from("/home/u/.aws/config"));
        assert_eq!(paths.aws_credentials, PathBuf::from("/home/u/.aws/credentials"));
        assert_eq!(paths.awsx_profiles(), PathBuf::from("/home/u/.awsx/profiles"));
        assert_eq!(paths.exports_script(), PathBuf::from("/home/u/.awsx/exports.sh"));
        assert_eq!(paths.aws_home(), Some(Path::new("/home/u/.aws")));
    }

    #[test]
    fn env_vars_override_defaults() {
        let paths = Paths::resolve(Path::new("/home/u"), |name| match name {
            env_vars::AWS_SHARED_CREDENTIALS_FILE => Some("/custom/credentials".to_string()),
            env_vars::AWSX_HOME => Some("/custom/awsx".to_string()),
            _ => None,
        });
        assert_eq!(paths.aws_config, PathBuf::from("/home/u/.aws/config"));
        assert_eq!(paths.aws_credentials, PathBuf::from("/custom/credentials"));
        assert_eq!(paths.awsx_home, PathBuf::from("/custom/awsx"));
    }
}
