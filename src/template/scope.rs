use crate::value::Value;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;

/// Variables seeded into every script's scope.
pub const SEEDED: &[&str] = &["argv", "input"];

/// The single variable scope of one script execution.
///
/// Bindings shadow earlier ones with the same name; nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope with `argv` and `input`.
    ///
    /// `argv` is the full command line as a JSON list: the program that ran
    /// the script, the script path, then the script's arguments. `input` is
    /// the script's arguments joined by single spaces.
    pub fn seeded(program: &str, script: &Path, args: &[String]) -> Self {
        let mut argv = vec![json!(program), json!(script.display().to_string())];
        argv.extend(args.iter().map(|arg| json!(arg)));

        let mut scope = Self::new();
        scope.bind("argv", Value::data(json!(argv)));
        scope.bind("input", Value::text(args.join(" ")));
        scope
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_variables() {
        let scope = Scope::seeded(
            "/usr/local/bin/siesta",
            Path::new("scripts/commit"),
            &["fix".into(), "typo".into()],
        );
        assert_eq!(
            scope.get("argv"),
            Some(&Value::data(json!(["/usr/local/bin/siesta", "scripts/commit", "fix", "typo"])))
        );
        assert_eq!(scope.get("input"), Some(&Value::text("fix typo")));
        for name in SEEDED {
            assert!(scope.get(name).is_some());
        }
    }

    #[test]
    fn test_seeded_without_arguments() {
        let scope = Scope::seeded("siesta", Path::new("greet"), &[]);
        assert_eq!(scope.get("argv"), Some(&Value::data(json!(["siesta", "greet"]))));
        assert_eq!(scope.get("input"), Some(&Value::text("")));
    }

    #[test]
    fn test_later_binding_shadows() {
        let mut scope = Scope::new();
        scope.bind("x", Value::text("one"));
        scope.bind("x", Value::text("two"));
        assert_eq!(scope.get("x"), Some(&Value::text("two")));
        assert_eq!(scope.get("y"), None);
    }
}
