// SPDX-FileCopyrightText: 2026 Polycast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment reports where a `polycast.toml` went wrong; this module turns
//! those reports into miette diagnostics that point into the file and
//! suggest the nearest valid key or platform name.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(polycast::config::unknown_key),
        help("{}", format_unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(polycast::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value could not be parsed, such as an unknown platform tag.
    #[error("invalid value for key `{key}`: {detail}")]
    #[diagnostic(code(polycast::config::invalid_value))]
    InvalidValue { key: String, detail: String },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(polycast::config::missing_key),
        help("add `{key} = <value>` to your polycast.toml")
    )]
    MissingKey { key: String },

    /// A semantic check failed after deserialization.
    #[error("validation error: {message}")]
    #[diagnostic(code(polycast::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(polycast::config::other))]
    Other(String),
}

fn format_unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert a `figment::Error` into one diagnostic per underlying error.
///
/// `toml_sources` pairs each file path with its contents so unknown keys and
/// mistyped values can be pointed at.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| classify(&error, toml_sources))
        .collect()
}

fn classify(error: &figment::Error, toml_sources: &[(String, String)]) -> ConfigError {
    use figment::error::Kind;

    let key = error.path.join(".");
    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let located = locate(error, &error.path, field, toml_sources);
            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion: suggest_key(field, expected),
                valid_keys: expected.join(", "),
                span: located.as_ref().map(|(span, _)| *span),
                src: located.map(|(_, src)| src),
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: if key.is_empty() {
                field.to_string()
            } else {
                format!("{key}.{field}")
            },
        },
        Kind::InvalidType(actual, expected) => {
            // The offending key is the last path segment, inside its parent table.
            let located = error.path.split_last().and_then(|(field, table)| {
                locate(error, table, field, toml_sources)
            });
            ConfigError::InvalidType {
                key,
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
                span: located.as_ref().map(|(span, _)| *span),
                src: located.map(|(_, src)| src),
            }
        }
        Kind::UnknownVariant(actual, expected) => {
            let allowed = expected.join(", ");
            let detail = match suggest_key(actual, expected) {
                Some(s) => format!("`{actual}` is not one of {allowed}; did you mean `{s}`?"),
                None => format!("`{actual}` is not one of {allowed}"),
            };
            ConfigError::InvalidValue { key, detail }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Span of `field` under `table` in the file the error came from, if that
/// file's contents were supplied.
fn locate(
    error: &figment::Error,
    table: &[String],
    field: &str,
    toml_sources: &[(String, String)],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let figment::Source::File(origin) = error.metadata.as_ref()?.source.as_ref()? else {
        return None;
    };
    let origin = origin.display().to_string();
    let (path, content) = toml_sources.iter().find(|(path, _)| *path == origin)?;
    let offset = find_key_offset(content, table, field)?;
    Some((
        SourceSpan::new(offset.into(), field.len()),
        NamedSource::new(path, content.clone()),
    ))
}

/// Byte offset of `field` in TOML `content`, searching below the header of
/// `table`.
///
/// For `table = ["adapters", "main"]` the deepest header present wins:
/// `[adapters.main]` is tried first, then `[adapters]`. An empty table
/// searches from the start of the file.
pub fn find_key_offset(content: &str, table: &[String], field: &str) -> Option<usize> {
    let start = if table.is_empty() {
        0
    } else {
        (1..=table.len()).rev().find_map(|depth| {
            let header = format!("[{}]", table[..depth].join("."));
            content.find(&header).map(|pos| pos + header.len())
        })?
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        let rest = line[indent..].strip_prefix(field);
        if rest.is_some_and(|r| r.trim_start().starts_with('=')) {
            return Some(offset + indent);
        }
        offset += line.len();
    }
    None
}

/// Closest entry of `valid_keys` to `unknown` by Jaro-Winkler similarity,
/// if any clears the suggestion threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render a list of `ConfigError`s to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_platfrom_for_platform() {
        let valid = &["platform", "name", "version", "enabled"];
        assert_eq!(suggest_key("platfrom", valid), Some("platform".to_string()));
    }

    #[test]
    fn suggest_window_for_windw_ms() {
        let valid = &["requests", "window_ms"];
        assert_eq!(suggest_key("windw_ms", valid), Some("window_ms".to_string()));
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["log_level", "auth_timeout_ms"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_in_nested_table() {
        let content = "[manager]\nname = 1\n\n[adapters.main]\nversoin = \"1\"\n";
        let path = vec!["adapters".to_string(), "main".to_string()];
        let o = find_key_offset(content, &path, "versoin").unwrap();
        assert_eq!(&content[o..o + 7], "versoin");
    }

    #[test]
    fn find_key_offset_ignores_longer_keys_with_same_prefix() {
        let content = "[adapters.main]\nname_suffix = 1\nname = \"m\"\n";
        let path = vec!["adapters".to_string(), "main".to_string()];
        let o = find_key_offset(content, &path, "name").unwrap();
        assert_eq!(o, content.find("name =").unwrap());
    }

    #[test]
    fn misspelled_adapter_key_gets_a_suggestion() {
        let content = "[adapters.main]\nplatform = \"slack\"\nplatfrom = \"x\"\n";
        let err = crate::loader::load_config_from_str(content).unwrap_err();
        let errors = figment_to_config_errors(err, &[]);
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigError::UnknownKey { key, suggestion: Some(s), .. } if key == "platfrom" && s == "platform"
        )));
    }

    #[test]
    fn find_key_offset_prefers_deepest_header() {
        let content = "[adapters.a]\nname = \"a\"\n[adapters.b]\nname = \"b\"\n";
        let path = vec!["adapters".to_string(), "b".to_string()];
        let o = find_key_offset(content, &path, "name").unwrap();
        assert!(o > content.find("[adapters.b]").unwrap());
    }
}
