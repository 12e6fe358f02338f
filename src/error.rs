use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AwsxError {
    #[error(
        "missing required AWS file(s): {}. Run `aws configure` first: \
         https://docs.aws.amazon.com/cli/latest/userguide/cli-configure-quickstart.html",
        display_paths(.missing)
    )]
    ConfigurationMissing { missing: Vec<PathBuf> },

    #[error("No profile '{0}' found, make sure you run 'awsx add-profile' first.")]
    ProfileNotFound(String),

    #[error("No assume role profile '{name}' found for parent profile '{parent}'.")]
    AssumeRoleProfileNotFound { name: String, parent: String },

    #[error("No profiles are configured, run 'awsx add-profile' first.")]
    NoProfilesConfigured,

    #[error("Profile named '{0}' already exists.")]
    ProfileNameCollision(String),

    #[error("credential exchange failed for profile '{profile}': {source}")]
    CredentialExchangeFailed {
        profile: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("cancelled")]
    Cancelled,

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("failed to export environment: {0}")]
    Export(anyhow::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T, E = AwsxError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_missing_names_every_path() {
        let e = AwsxError::ConfigurationMissing {
            missing: vec![
                PathBuf::from("/home/u/.aws/config"),
                PathBuf::from("/home/u/.aws/credentials"),
            ],
        };
        let message = e.to_string();
        assert!(message.contains("/home/u/.aws/config, /home/u/.aws/credentials"));
        assert!(message.contains("aws configure"));
    }

    #[test]
    fn profile_not_found_suggests_add_profile() {
        let message = AwsxError::ProfileNotFound("prod".to_string()).to_string();
        assert!(message.contains("'prod'"));
        assert!(message.contains("awsx add-profile"));
    }
}
