use crate::error::Result;

pub mod terminal;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Choice {
    pub title: String,
    pub value: String,
}

impl Choice {
    pub fn new<T: Into<String>, V: Into<String>>(title: T, value: V) -> Choice {
        Choice {
            title: title.into(),
            value: value.into(),
        }
    }

    /// A choice whose title is its value.
    pub fn plain<S: Into<String>>(value: S) -> Choice {
        let value = value.into();
        Choice::new(value.clone(), value)
    }
}

/// Interactive questions. Every method returns `AwsxError::Cancelled` when the
/// user aborts, in which case callers must not write anything.
pub trait Prompt {
    /// Returns the `value` of the chosen entry.
    fn select(&self, message: &str, choices: &[Choice], initial: Option<usize>) -> Result<String>;

    fn text(&self, message: &str, initial: Option<&str>) -> Result<String>;

    fn confirm(&self, message: &str, default: bool) -> Result<bool>;

    /// Re-asks until `validate` accepts the answer.
    fn number(
        &self,
        message: &str,
        initial: i64,
        validate: &dyn Fn(i64) -> std::result::Result<(), String>,
    ) -> Result<i64>;
}

impl<P: Prompt + ?Sized> Prompt for &P {
    fn select(&self, message: &str, choices: &[Choice], initial: Option<usize>) -> Result<String> {
        (**self).select(message, choices, initial)
    }

    fn text(&self, message: &str, initial: Option<&str>) -> Result<String> {
        (**self).text(message, initial)
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        (**self).confirm(message, default)
    }

    fn number(
        &self,
        message: &str,
        initial: i64,
        validate: &dyn Fn(i64) -> std::result::Result<(), String>,
    ) -> Result<i64> {
        (**self).number(message, initial, validate)
    }
}

pub const OUTPUT_FORMATS: [&str; 4] = ["json", "yaml", "text", "table"];

pub fn output_format_choices() -> Vec<Choice> {
    OUTPUT_FORMATS.iter().map(|f| Choice::plain(*f)).collect()
}

/// Index of `value` among `choices`, if present.
pub fn position_of(choices: &[Choice], value: Option<&str>) -> Option<usize> {
    let value = value?;
    choices.iter().position(|c| c.value == value)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_of_finds_value() {
        let choices = output_format_choices();
        assert_eq!(position_of(&choices, Some("text")), Some(2));
        assert_eq!(position_of(&choices, Some("xml")), None);
        assert_eq!(position_of(&choices, None), None);
    }
}
