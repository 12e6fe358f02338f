use std::path::Path;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Unknown(String),
}

impl Shell {
    pub fn from_process_path<P: AsRef<Path>>(process_path: P) -> Option<Shell> {
        let process = process_path.as_ref().file_stem().and_then(|f| f.to_str());
        process.map(|p| match p {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            _ => Shell::Unknown(p.to_string()),
        })
    }

    /// Renders a line assigning `value` to `name`.
    pub fn set_line(&self, name: &str, value: &str) -> String {
        let value = quote(value);
        match self {
            Shell::Fish => format!("set -gx {} {}", name, value),
            _ => format!("export {}={}", name, value),
        }
    }

    /// Renders a line removing `name` from the environment.
    pub fn unset_line(&self, name: &str) -> String {
        match self {
            Shell::Fish => format!("set -e {}", name),
            _ => format!("unset {}", name),
        }
    }
}

// Single quotes survive every supported shell; embedded quotes are closed and escaped.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
