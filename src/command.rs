use std::io::Write;

use crate::clock::Clock;
use crate::error::{AwsxError, Result};
use crate::profile::load::ProfileRegistry;
use crate::profile::{Profile, ProfileSet};
use crate::prompt::{position_of, Choice, Prompt};
use crate::store::ProfileStore;

pub mod add_assume_role_profile;
pub mod add_profile;
pub mod backup_config;
pub mod completions;
pub mod current_profile;
pub mod disable_mfa;
pub mod enable_mfa;
pub mod remove_assume_role_profile;
pub mod remove_profile;
pub mod set_key_max_age;
pub mod switch;
pub mod whoami;

pub use add_assume_role_profile::AddAssumeRoleProfileCommand;
pub use add_profile::AddProfileCommand;
pub use backup_config::BackupConfigCommand;
pub use completions::CompletionsCommand;
pub use current_profile::CurrentProfileCommand;
pub use disable_mfa::DisableMfaCommand;
pub use enable_mfa::EnableMfaCommand;
pub use remove_assume_role_profile::RemoveAssumeRoleProfileCommand;
pub use remove_profile::RemoveProfileCommand;
pub use set_key_max_age::SetKeyMaxAgeCommand;
pub use switch::SwitchCommand;
pub use whoami::WhoamiCommand;

/// What every command runs against.
pub struct Context<'a, S, P> {
    pub store: &'a S,
    pub prompt: &'a P,
    pub clock: &'a dyn Clock,
    /// `$AWS_PROFILE` at start-up.
    pub current_profile: Option<&'a str>,
    pub out: &'a mut dyn Write,
}

impl<'a, S: ProfileStore, P: Prompt> Context<'a, S, P> {
    pub fn profiles(&self) -> ProfileSet {
        ProfileRegistry::new(self.store).load(self.clock.now_secs())
    }

    /// The named profile, or one picked from those matching `filter`.
    pub(crate) fn choose_profile<'p, F>(
        &self,
        profiles: &'p ProfileSet,
        name: Option<&str>,
        filter: F,
    ) -> Result<&'p Profile>
    where
        F: Fn(&Profile) -> bool,
    {
        let name = match name {
            Some(name) => name.to_string(),
            None => {
                let choices = profiles
                    .profiles()
                    .filter(|p| filter(*p))
                    .map(|p| Choice::plain(p.name.clone()))
                    .collect::<Vec<_>>();
                if choices.is_empty() {
                    return Err(AwsxError::NoProfilesConfigured);
                }
                let initial = position_of(&choices, self.current_profile);
                self.prompt.select("Choose a profile", &choices, initial)?
            }
        };

        profiles
            .get_profile(&name)
            .ok_or(AwsxError::ProfileNotFound(name))
    }

    /// `given`, or the answer to `message`. Blank answers are rejected.
    pub(crate) fn required(
        &self,
        message: &str,
        given: Option<String>,
        initial: Option<&str>,
    ) -> Result<String> {
        let value = match given {
            Some(value) => value,
            None => self.prompt.text(message, initial)?,
        };
        let value = value.trim();
        if value.is_empty() {
            Err(AwsxError::InvalidInput(format!("{} is required", message)))
        } else {
            Ok(value.to_string())
        }
    }

    /// Like [`Context::required`], but a blank answer means "none".
    pub(crate) fn optional(
        &self,
        message: &str,
        given: Option<String>,
        initial: Option<&str>,
    ) -> Result<Option<String>> {
        let value = match given {
            Some(value) => value,
            None => self.prompt.text(message, initial)?,
        };
        let value = value.trim();
        Ok((!value.is_empty()).then(|| value.to_string()))
    }

    pub(crate) fn output_format(
        &self,
        given: Option<String>,
        initial: Option<&str>,
    ) -> Result<String> {
        match given {
            Some(format) => Ok(format),
            None => {
                let choices = crate::prompt::output_format_choices();
                let initial = position_of(&choices, initial).or(Some(0));
                self.prompt.select("Output format", &choices, initial)
            }
        }
    }

    pub(crate) fn confirmed(&self, message: &str, skip: bool) -> Result<bool> {
        if skip {
            return Ok(true);
        }
        self.prompt.confirm(message, false)
    }
}

pub(crate) fn validate_key_max_age(days: i64) -> std::result::Result<(), String> {
    if days < 0 {
        Err("maximum age must be 0 or more days".to_string())
    } else if days > i64::from(u32::MAX) {
        Err("maximum age is too large".to_string())
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    use awsx_schema::credentials::Credentials;

    use crate::clock::FixedClock;
    use crate::profile::{MfaSettings, Profile, ProfileKind};

    pub(crate) const NOW: i64 = 1_700_000_000;

    pub(crate) fn clock() -> FixedClock {
        FixedClock::at_secs(NOW)
    }

    pub(crate) fn plain(name: &str) -> Profile {
        Profile {
            name: name.to_string(),
            credentials: Credentials::new(format!("AKIA{}", name.to_uppercase()), "secret"),
            region_name: Some("eu-west-1".to_string()),
            output_format: Some("json".to_string()),
            key_max_age: None,
            secret_key_expiry: None,
            kind: ProfileKind::Plain,
        }
    }

    pub(crate) fn mfa(name: &str) -> Profile {
        Profile {
            kind: ProfileKind::Mfa(MfaSettings {
                device_arn: format!("arn:aws:iam::111111111111:mfa/{}", name),
                session_length: 3600,
                last_login: None,
                session_valid: false,
            }),
            ..plain(name)
        }
    }

    pub(crate) fn output(buf: &[u8]) -> String {
        String::from_utf8_lossy(buf).into_owned()
    }
}
