use std::io::{self, Cursor};

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};
use skim::prelude::{SkimItemReader, SkimOptionsBuilder};
use skim::Skim;

use crate::error::{AwsxError, Result};
use crate::prompt::{Choice, Prompt};

/// Prompts on the controlling terminal: skim for selections, dialoguer for the rest.
#[derive(Default)]
pub struct TerminalPrompt {
    theme: ColorfulTheme,
}

fn interrupted(e: dialoguer::Error) -> AwsxError {
    match e {
        dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted => AwsxError::Cancelled,
        dialoguer::Error::IO(e) => AwsxError::Io(e),
    }
}

impl Prompt for TerminalPrompt {
    fn select(&self, message: &str, choices: &[Choice], initial: Option<usize>) -> Result<String> {
        // skim has no cursor position, so the initial entry is listed first.
        let mut ordered = choices.iter().collect::<Vec<_>>();
        if let Some(i) = initial.filter(|&i| i < ordered.len()) {
            let first = ordered.remove(i);
            ordered.insert(0, first);
        }
        let titles = ordered
            .iter()
            .map(|c| c.title.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let item_reader = SkimItemReader::default();
        let items = item_reader.of_bufread(Cursor::new(titles));

        let options = SkimOptionsBuilder::default()
            .reverse(true)
            .header(Some(message))
            .build()
            .map_err(|e| AwsxError::Prompt(e.to_string()))?;
        let selected = Skim::run_with(&options, Some(items))
            .and_then(|out| (!out.is_abort).then_some(out.selected_items))
            .unwrap_or_default();

        let title = selected
            .into_iter()
            .next()
            .map(|x| x.output().to_string())
            .ok_or(AwsxError::Cancelled)?;
        ordered
            .into_iter()
            .find(|c| c.title == title)
            .map(|c| c.value.clone())
            .ok_or(AwsxError::Cancelled)
    }

    fn text(&self, message: &str, initial: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(message);
        if let Some(initial) = initial.filter(|s| !s.is_empty()) {
            input = input.default(initial.to_string());
        }
        let answer = input.interact_text().map_err(interrupted)?;
        Ok(answer.trim().to_string())
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .interact_opt()
            .map_err(interrupted)?
            .ok_or(AwsxError::Cancelled)
    }

    fn number(
        &self,
        message: &str,
        initial: i64,
        validate: &dyn Fn(i64) -> std::result::Result<(), String>,
    ) -> Result<i64> {
        Input::<i64>::with_theme(&self.theme)
            .with_prompt(message)
            .default(initial)
            .validate_with(|value: &i64| validate(*value))
            .interact_text()
            .map_err(interrupted)
    }
}
