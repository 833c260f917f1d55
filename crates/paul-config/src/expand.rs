//! `${VAR}` and `${VAR:-default}` expansion for string settings.

use crate::ConfigError;

/// Expand environment variable references in a configuration value.
///
/// Only the braced form is recognised, so `$path` segments in URLs and
/// globs pass through untouched. An unset variable without a default is an
/// error naming both the variable and the `field` it appeared in.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var).map(Some).map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Expand every entry of a list setting, reporting the index on failure.
pub(crate) fn expand_all(values: &mut [String], field: &str) -> Result<(), ConfigError> {
    for (index, value) in values.iter_mut().enumerate() {
        *value = expand_env(value, &format!("{field}[{index}]"))?;
    }
    Ok(())
}

struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_value_is_unchanged() {
        assert_eq!(expand_env("dist", "build.output_dir").unwrap(), "dist");
    }

    #[test]
    fn test_expands_set_variable() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("PAUL_TEST_OUT_DIR", "public-out");
        }
        let result = expand_env("${PAUL_TEST_OUT_DIR}/site", "build.output_dir").unwrap();
        assert_eq!(result, "public-out/site");
        unsafe {
            std::env::remove_var("PAUL_TEST_OUT_DIR");
        }
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("PAUL_TEST_UNSET_HOST");
        }
        let result = expand_env("${PAUL_TEST_UNSET_HOST:-0.0.0.0}", "server.host").unwrap();
        assert_eq!(result, "0.0.0.0");
    }

    #[test]
    fn test_unset_variable_names_field() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("PAUL_TEST_MISSING");
        }
        let err = expand_env("${PAUL_TEST_MISSING}", "server.host").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let message = err.to_string();
        assert!(message.contains("PAUL_TEST_MISSING"));
        assert!(message.contains("server.host"));
    }

    #[test]
    fn test_bare_dollar_is_literal() {
        assert_eq!(
            expand_env("pages/$draft/*.toml", "styles.content").unwrap(),
            "pages/$draft/*.toml"
        );
    }

    #[test]
    fn test_expand_all_reports_index() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("PAUL_TEST_LIST_MISSING");
        }
        let mut values = vec!["ok".to_owned(), "${PAUL_TEST_LIST_MISSING}".to_owned()];
        let err = expand_all(&mut values, "styles.load_paths").unwrap_err();
        assert!(err.to_string().contains("styles.load_paths[1]"));
    }
}
