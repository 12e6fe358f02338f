use std::io::Write;

use clap::Args;

use crate::clock::Clock;
use crate::store::FileStore;

#[derive(Debug, Clone, Default, Args)]
pub struct BackupConfigCommand {}

impl BackupConfigCommand {
    pub fn execute(self, store: &FileStore, clock: &dyn Clock, out: &mut dyn Write) -> anyhow::Result<()> {
        let backups = store.backup_all(clock.now())?;
        for path in &backups {
            writeln!(out, "{}", path.display())?;
        }
        writeln!(out, "Backed up all AWS CLI and awsx config files")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::clock::FixedClock;
    use crate::command::fixture::output;
    use crate::paths::Paths;

    #[test]
    fn backs_up_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted_at(dir.path());
        fs::create_dir_all(paths.aws_home().unwrap()).unwrap();
        fs::write(&paths.aws_config, "[default]\nregion = us-east-1\n").unwrap();
        fs::write(&paths.aws_credentials, "[default]\n").unwrap();
        let store = FileStore::new(paths);
        let mut out = Vec::new();

        BackupConfigCommand {}
            .execute(&store, &FixedClock::at_secs(1_700_000_000), &mut out)
            .unwrap();

        let out = output(&out);
        assert!(out.contains("config.20231114221320"));
        assert!(out.ends_with("Backed up all AWS CLI and awsx config files\n"));
    }
}
