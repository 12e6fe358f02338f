//! Section naming in the AWS config file.
//!
//! The AWS CLI keys named profiles in `~/.aws/config` as `[profile <name>]` while
//! the default profile keeps its bare `[default]` header. The credentials file
//! and the awsx metadata file always use the bare profile name.

pub const PROFILE_PREFIX: &str = "profile ";
pub const DEFAULT_PROFILE: &str = "default";

/// Returns the config-file section header for `profile_name`.
pub fn config_section_name(profile_name: &str) -> String {
    if profile_name == DEFAULT_PROFILE {
        profile_name.to_string()
    } else {
        format!("{}{}", PROFILE_PREFIX, profile_name)
    }
}

/// Returns the profile name a config-file section header refers to.
///
/// Accepts bare legacy headers as well as `profile <name>`.
pub fn parse_config_section_name(section: &str) -> &str {
    section
        .strip_prefix(PROFILE_PREFIX)
        .map(str::trim)
        .unwrap_or_else(|| section.trim())
}

/// Every header under which `profile_name` may appear in the config file,
/// preferred form first.
pub fn config_section_candidates(profile_name: &str) -> Vec<String> {
    let preferred = config_section_name(profile_name);
    if preferred == profile_name {
        vec![preferred, format!("{}{}", PROFILE_PREFIX, profile_name)]
    } else {
        vec![preferred, profile_name.to_string()]
    }
}
