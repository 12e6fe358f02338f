use std::io::Write;

use clap::Args;

use crate::store::section::DEFAULT_PROFILE;

#[derive(Debug, Clone, Default, Args)]
pub struct CurrentProfileCommand {}

impl CurrentProfileCommand {
    pub fn execute(self, current_profile: Option<&str>, out: &mut dyn Write) -> anyhow::Result<()> {
        writeln!(out, "{}", current_profile.unwrap_or(DEFAULT_PROFILE))?;
        Ok(())
    }
}
