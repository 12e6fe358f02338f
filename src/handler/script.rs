use std::fs;
use std::path::PathBuf;

use awsx_schema::shell::Shell;
use tracing::{debug, info};

use crate::handler::{into_variables, HandleCredentials, HandleCredentialsRequest, Variable};
use crate::store::restrict_permissions;

/// Writes a script for the calling shell to source after `awsx` exits.
pub struct ScriptCredentialsHandler {
    path: PathBuf,
    shell: Shell,
}

impl ScriptCredentialsHandler {
    pub fn new(path: PathBuf, shell: Shell) -> ScriptCredentialsHandler {
        ScriptCredentialsHandler { path, shell }
    }
}

impl HandleCredentials for ScriptCredentialsHandler {
    fn handle_credentials(&self, request: HandleCredentialsRequest) -> anyhow::Result<()> {
        let profile_name = request.profile_name.to_string();
        let script = render(&self.shell, into_variables(request));
        debug!("shell: {:?}, script: {}", self.shell, self.path.display());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Staged beside the script, then renamed over it.
        let staging = self.path.with_extension("awsx-tmp");
        fs::write(&staging, script)?;
        restrict_permissions(&staging)?;
        fs::rename(&staging, &self.path)?;

        info!("exported profile {} to {}", profile_name, self.path.display());
        Ok(())
    }
}

pub fn render(shell: &Shell, variables: Vec<Variable>) -> String {
    variables
        .into_iter()
        .map(|Variable { name, value }| match value {
            Some(value) => shell.set_line(name, value),
            None => shell.unset_line(name),
        })
        .map(|line| line + "\n")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use awsx_schema::credentials::Credentials;

    fn request(credentials: &Credentials) -> HandleCredentialsRequest<'_> {
        HandleCredentialsRequest {
            profile_name: "prod",
            region_name: Some("us-east-1"),
            output_format: None,
            credentials: Some(credentials),
        }
    }

    #[test]
    fn renders_bash() {
        let credentials = Credentials::new("ASIA", "secret").with_token("token");
        let script = render(&Shell::Bash, into_variables(request(&credentials)));
        assert_eq!(
            script,
            "export AWS_PROFILE='prod'\n\
             export AWS_ACCESS_KEY_ID='ASIA'\n\
             export AWS_SECRET_ACCESS_KEY='secret'\n\
             export AWS_SESSION_TOKEN='token'\n\
             export AWS_DEFAULT_REGION='us-east-1'\n\
             unset AWS_DEFAULT_OUTPUT\n"
        );
    }

    #[test]
    fn renders_fish() {
        let credentials = Credentials::new("AKIA", "secret");
        let script = render(&Shell::Fish, into_variables(request(&credentials)));
        assert!(script.contains("set -gx AWS_PROFILE 'prod'\n"));
        assert!(script.contains("set -e AWS_SESSION_TOKEN\n"));
    }

    #[cfg(unix)]
    #[test]
    fn writes_private_script() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("exports.sh");
        let handler = ScriptCredentialsHandler::new(path.clone(), Shell::Zsh);
        let credentials = Credentials::new("AKIA", "secret");
        handler.handle_credentials(request(&credentials)).unwrap();

        let script = fs::read_to_string(&path).unwrap();
        assert!(script.starts_with("export AWS_PROFILE='prod'\n"));
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn tightens_a_script_left_readable_by_others() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports.sh");
        fs::write(&path, "export AWS_PROFILE='old'\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let handler = ScriptCredentialsHandler::new(path.clone(), Shell::Bash);
        let credentials = Credentials::new("AKIA", "secret");
        handler.handle_credentials(request(&credentials)).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!fs::read_to_string(&path).unwrap().contains("'old'"));
    }
}
