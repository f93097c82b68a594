use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `{{ env.NAME }}` or `{{ env.NAME | default("value") }}`
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*([A-Za-z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\)\s*)?\}\}"#)
        .expect("placeholder pattern must compile")
});

/// Substitute environment placeholders in raw configuration text
///
/// Runs before TOML parsing. Comment lines are copied untouched so that
/// commented-out settings never require their variables to be set.
pub fn expand_env(input: &str) -> anyhow::Result<String> {
    let mut output = String::with_capacity(input.len());

    for line in input.split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            output.push_str(line);
            continue;
        }

        let mut failure = None;
        let replaced = PLACEHOLDER.replace_all(line, |captures: &Captures<'_>| {
            resolve(&captures[1], captures.get(2).map(|m| m.as_str())).unwrap_or_else(|e| {
                failure.get_or_insert(e);
                String::new()
            })
        });

        if let Some(e) = failure {
            return Err(e);
        }

        output.push_str(&replaced);
    }

    Ok(output)
}

fn resolve(key: &str, default: Option<&str>) -> anyhow::Result<String> {
    let Some(name) = key.strip_prefix("env.").filter(|name| !name.is_empty() && !name.contains('.')) else {
        anyhow::bail!("unsupported placeholder `{key}`, only `env.NAME` is allowed");
    };

    match std::env::var(name) {
        Ok(value) => Ok(value),
        Err(_) => default
            .map(str::to_owned)
            .ok_or_else(|| anyhow::anyhow!("environment variable `{name}` is not set")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let input = "[server]\nlisten_address = \"127.0.0.1:3000\"\n";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn substitutes_set_variables() {
        temp_env::with_vars([("FL_HOST", Some("10.0.0.1")), ("FL_PORT", Some("8080"))], || {
            let result = expand_env("listen_address = \"{{ env.FL_HOST }}:{{env.FL_PORT}}\"").unwrap();
            assert_eq!(result, "listen_address = \"10.0.0.1:8080\"");
        });
    }

    #[test]
    fn unset_variable_without_default_fails() {
        temp_env::with_var_unset("FL_ABORT_DELAY", || {
            let err = expand_env("abort_delay = \"{{ env.FL_ABORT_DELAY }}\"").unwrap_err();
            assert!(err.to_string().contains("FL_ABORT_DELAY"));
        });
    }

    #[test]
    fn default_fills_unset_variable() {
        temp_env::with_var_unset("FL_ABORT_DELAY", || {
            let result = expand_env("abort_delay = \"{{ env.FL_ABORT_DELAY | default(\"2s\") }}\"").unwrap();
            assert_eq!(result, "abort_delay = \"2s\"");
        });
    }

    #[test]
    fn set_variable_wins_over_default() {
        temp_env::with_var("FL_ABORT_DELAY", Some("750ms"), || {
            let result = expand_env("abort_delay = \"{{ env.FL_ABORT_DELAY | default(\"2s\") }}\"").unwrap();
            assert_eq!(result, "abort_delay = \"750ms\"");
        });
    }

    #[test]
    fn comments_are_not_expanded() {
        temp_env::with_vars([("FL_SET", Some("yes")), ("FL_UNSET", None::<&str>)], || {
            let input = "  # path = \"{{ env.FL_UNSET }}\"\npath = \"/{{ env.FL_SET }}\"\n";
            let result = expand_env(input).unwrap();
            assert_eq!(result, "  # path = \"{{ env.FL_UNSET }}\"\npath = \"/yes\"\n");
        });
    }

    #[test]
    fn other_scopes_are_rejected() {
        let err = expand_env("key = \"{{ secrets.TOKEN }}\"").unwrap_err();
        assert!(err.to_string().contains("secrets.TOKEN"));
    }
}
