//! Distribution `package.json`.

use std::path::Path;

use serde_json::{Map, Value};

use crate::BuildError;

/// Rewrite a project `package.json` for distribution: entry points point
/// at the built files, only the `start` script survives and dev
/// dependencies are dropped.
pub(crate) fn dist_package(path: &Path, source: &str) -> Result<String, BuildError> {
    let invalid = |message: String| BuildError::Package {
        path: path.to_path_buf(),
        message,
    };
    let Value::Object(mut package) = serde_json::from_str(source).map_err(|e| invalid(e.to_string()))?
    else {
        return Err(invalid("expected a JSON object".to_owned()));
    };

    package.insert("main".to_owned(), Value::from("index.js"));
    package.insert("types".to_owned(), Value::from("index.d.ts"));
    package.remove("devDependencies");

    let start = package
        .get("scripts")
        .and_then(|scripts| scripts.get("start"))
        .cloned();
    let mut scripts = Map::new();
    if let Some(start) = start {
        scripts.insert("start".to_owned(), start);
    }
    package.insert("scripts".to_owned(), Value::Object(scripts));

    let mut json = serde_json::to_string_pretty(&Value::Object(package))
        .map_err(|e| invalid(e.to_string()))?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_dist_package() {
        let source = r#"{
            "name": "acme-landing",
            "version": "1.0.0",
            "main": "src/index.js",
            "scripts": {"start": "paul serve", "dev": "paul serve --watch", "build": "paul build"},
            "dependencies": {"left-pad": "^1.3.0"},
            "devDependencies": {"eslint": "^9.0.0"}
        }"#;

        let out = dist_package(Path::new("package.json"), source).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(
            value,
            json!({
                "name": "acme-landing",
                "version": "1.0.0",
                "main": "index.js",
                "scripts": {"start": "paul serve"},
                "dependencies": {"left-pad": "^1.3.0"},
                "types": "index.d.ts",
            })
        );
    }

    #[test]
    fn test_key_order_is_kept() {
        let out = dist_package(Path::new("package.json"), r#"{"name": "a", "main": "x.js"}"#).unwrap();

        assert!(out.find("\"name\"").unwrap() < out.find("\"main\"").unwrap());
    }

    #[test]
    fn test_without_scripts() {
        let out = dist_package(Path::new("package.json"), r#"{"name": "a"}"#).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["scripts"], json!({}));
    }

    #[test]
    fn test_rejects_non_object() {
        let err = dist_package(Path::new("/p/package.json"), "[1, 2]").unwrap_err();

        assert!(matches!(err, BuildError::Package { .. }));
        assert!(err.to_string().contains("/p/package.json"));
    }
}
