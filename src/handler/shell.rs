use std::env;
use std::ffi::CString;
use std::path::Path;

use tracing::debug;

use crate::handler::{into_variables, HandleCredentials, HandleCredentialsRequest, Variable};

/// Exports into this process's environment, to be inherited by [`start_shell_session`].
pub struct ShellCredentialsHandler;

impl HandleCredentials for ShellCredentialsHandler {
    fn handle_credentials(&self, request: HandleCredentialsRequest) -> anyhow::Result<()> {
        let variables = into_variables(request);
        debug!("exporting {} variables to the sub-shell", variables.len());
        variables.iter().for_each(apply);
        Ok(())
    }
}

fn apply(variable: &Variable) {
    match variable.value {
        Some(value) => env::set_var(variable.name, value),
        // A stale session token from an earlier switch must not survive.
        None => env::remove_var(variable.name),
    }
}

/// Replaces the current process with a login of `$SHELL`. Only returns on failure.
pub fn start_shell_session() -> anyhow::Result<()> {
    let program = env::var("SHELL")?;
    let name = Path::new(&program)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(program.as_str())
        .to_string();
    debug!("starting sub-shell {} as {}", program, name);

    let path = CString::new(program)?;
    let argv = [CString::new(name)?];
    match nix::unistd::execv(&path, &argv)? {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Credentials;

    #[test]
    fn assume_role_switch_clears_inherited_keys() {
        env::set_var("AWS_SESSION_TOKEN", "stale");
        env::set_var("AWS_ACCESS_KEY_ID", "ASIASTALE");

        let handler = ShellCredentialsHandler;
        handler
            .handle_credentials(HandleCredentialsRequest {
                profile_name: "prod-readonly",
                region_name: Some("eu-west-1"),
                output_format: None,
                credentials: None,
            })
            .unwrap();

        assert_eq!(env::var("AWS_PROFILE").as_deref(), Ok("prod-readonly"));
        assert_eq!(env::var("AWS_DEFAULT_REGION").as_deref(), Ok("eu-west-1"));
        assert!(env::var("AWS_SESSION_TOKEN").is_err());
        assert!(env::var("AWS_ACCESS_KEY_ID").is_err());

        let session = Credentials::new("ASIANEW", "secret").with_token("token");
        handler
            .handle_credentials(HandleCredentialsRequest {
                profile_name: "prod",
                region_name: None,
                output_format: Some("json"),
                credentials: Some(&session),
            })
            .unwrap();
        assert_eq!(env::var("AWS_SESSION_TOKEN").as_deref(), Ok("token"));
        assert!(env::var("AWS_DEFAULT_REGION").is_err());
    }
}
