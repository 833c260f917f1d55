//! Isolated JavaScript evaluation with boa.
//!
//! `boa_engine::Context` is `!Send`, so a dedicated thread owns every
//! context and callers talk to it over a channel. Each evaluation gets a
//! fresh context with only the prelude loaded; nothing leaks between
//! components.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use boa_engine::{Context, JsError, Source};
use paul_components::Props;
use serde::Deserialize;
use serde_json::Value;

use crate::ScriptError;

const PRELUDE: &str = include_str!("prelude.js");

const DISALLOWED_MARKER: &str = "__paul_disallowed_import:";
const NOT_RENDERABLE_MARKER: &str = "__paul_not_renderable:";

/// What a component module exports.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Described {
    /// `function` or `string`.
    pub kind: String,
    /// The component's `defaultProps`, or an empty object.
    pub default_props: Value,
}

struct Job {
    program: String,
    response_tx: mpsc::Sender<Result<String, String>>,
}

/// Handle to the sandbox thread. Cheap to share behind an `Arc`.
pub struct Sandbox {
    jobs: SyncSender<Job>,
}

impl Sandbox {
    /// Start the sandbox thread and check that the prelude loads.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Unavailable`] if the thread cannot be started
    /// or the prelude fails to evaluate.
    pub fn new() -> Result<Self, ScriptError> {
        let (jobs, jobs_rx) = mpsc::sync_channel::<Job>(16);
        let (init_tx, init_rx) = mpsc::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("paul-sandbox".to_owned())
            .spawn(move || run(&jobs_rx, &init_tx))
            .map_err(|e| ScriptError::Unavailable(e.to_string()))?;

        init_rx
            .recv()
            .map_err(|_| ScriptError::Unavailable("sandbox thread exited during startup".to_owned()))?
            .map_err(ScriptError::Unavailable)?;

        Ok(Self { jobs })
    }

    /// Evaluate a lowered module and report its export.
    ///
    /// # Errors
    ///
    /// Fails if the module throws, imports a disallowed module or exports
    /// something that is neither a function nor a string.
    pub fn describe(&self, script: &str, path: &Path) -> Result<Described, ScriptError> {
        let output = self.run(&program(script, "__paulDescribe(module.exports)"), path)?;
        serde_json::from_str(&output).map_err(|e| ScriptError::Evaluation {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Evaluate a lowered module and render its component with `props`.
    ///
    /// # Errors
    ///
    /// Same as [`Sandbox::describe`], plus anything the component throws.
    pub fn render(&self, script: &str, path: &Path, props: &Props) -> Result<String, ScriptError> {
        let props = serde_json::to_string(props).map_err(|e| ScriptError::Evaluation {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.run(
            &program(script, &format!("__paulRender(module.exports, {props})")),
            path,
        )
    }

    fn run(&self, program: &str, path: &Path) -> Result<String, ScriptError> {
        let (response_tx, response_rx) = mpsc::channel();
        self.jobs
            .send(Job {
                program: program.to_owned(),
                response_tx,
            })
            .map_err(|_| ScriptError::Unavailable("sandbox thread is not running".to_owned()))?;

        response_rx
            .recv()
            .map_err(|_| ScriptError::Unavailable("sandbox thread stopped".to_owned()))?
            .map_err(|message| classify(message, path))
    }
}

/// Wrap a module body so it sees `module`/`exports` and the program
/// returns the string produced by `tail`.
fn program(script: &str, tail: &str) -> String {
    format!(
        "(function () {{\nvar module = {{ exports: {{}} }};\n(function (module, exports) {{\n{script}\n}})(module, module.exports);\nreturn {tail};\n}})()"
    )
}

fn classify(message: String, path: &Path) -> ScriptError {
    if let Some(module) = marker_value(&message, DISALLOWED_MARKER) {
        return ScriptError::DisallowedImport {
            path: path.to_path_buf(),
            module,
        };
    }
    if let Some(kind) = marker_value(&message, NOT_RENDERABLE_MARKER) {
        return ScriptError::NotRenderable {
            path: path.to_path_buf(),
            kind,
        };
    }
    ScriptError::Evaluation {
        path: path.to_path_buf(),
        message,
    }
}

fn marker_value(message: &str, marker: &str) -> Option<String> {
    let start = message.find(marker)? + marker.len();
    Some(message[start..].lines().next().unwrap_or_default().trim().to_owned())
}

fn run(jobs: &Receiver<Job>, init_tx: &mpsc::Sender<Result<(), String>>) {
    let check = fresh_context().map(|_| ());
    let ok = check.is_ok();
    if init_tx.send(check).is_err() || !ok {
        return;
    }

    while let Ok(job) = jobs.recv() {
        let result = fresh_context().and_then(|mut context| eval(&mut context, &job.program));
        let _ = job.response_tx.send(result);
    }
}

fn fresh_context() -> Result<Context, String> {
    let mut context = Context::default();
    context
        .eval(Source::from_bytes(PRELUDE))
        .map_err(|e| format!("prelude failed: {}", error_message(&e, &mut context)))?;
    Ok(context)
}

fn eval(context: &mut Context, program: &str) -> Result<String, String> {
    let value = context
        .eval(Source::from_bytes(program))
        .map_err(|e| error_message(&e, context))?;
    value
        .to_string(context)
        .map(|s| s.to_std_string_escaped())
        .map_err(|e| error_message(&e, context))
}

fn error_message(error: &JsError, context: &mut Context) -> String {
    error
        .to_opaque(context)
        .to_string(context)
        .map_or_else(|_| "unknown JavaScript error".to_owned(), |s| s.to_std_string_escaped())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn props(value: Value) -> Props {
        value.as_object().cloned().unwrap()
    }

    fn path() -> PathBuf {
        PathBuf::from("components/card.jsx")
    }

    static_assertions::assert_impl_all!(Sandbox: Send, Sync);

    #[test]
    fn test_render_function_component() {
        let sandbox = Sandbox::new().unwrap();
        let script = "function Card(p) { return h('div', { className: 'card' }, h('h2', null, p.title)); }\nmodule.exports.default = Card;";

        let html = sandbox
            .render(script, &path(), &props(json!({"title": "Hi"})))
            .unwrap();

        assert_eq!(html, "<div class=\"card\"><h2>Hi</h2></div>");
    }

    #[test]
    fn test_text_is_escaped() {
        let sandbox = Sandbox::new().unwrap();
        let script = "module.exports.default = function (p) { return h('p', null, p.text); };";

        let html = sandbox
            .render(script, &path(), &props(json!({"text": "<b>&</b>"})))
            .unwrap();

        assert_eq!(html, "<p>&lt;b&gt;&amp;&lt;/b&gt;</p>");
    }

    #[test]
    fn test_style_children_and_objects() {
        let sandbox = Sandbox::new().unwrap();
        let script = "module.exports.default = function () { return React.createElement(React.Fragment, null, h('style', null, 'a > b {}'), h('hr', { style: { marginTop: '1rem' } })); };";

        let html = sandbox.render(script, &path(), &Props::new()).unwrap();

        assert_eq!(html, "<style>a > b {}</style><hr style=\"margin-top:1rem\">");
    }

    #[test]
    fn test_describe_reads_default_props() {
        let sandbox = Sandbox::new().unwrap();
        let script = "function Card() { return ''; }\nCard.defaultProps = { title: 'Default' };\nmodule.exports.default = Card;";

        let described = sandbox.describe(script, &path()).unwrap();

        assert_eq!(described.kind, "function");
        assert_eq!(described.default_props, json!({"title": "Default"}));
    }

    #[test]
    fn test_string_export_is_static_markup() {
        let sandbox = Sandbox::new().unwrap();
        let script = "module.exports.default = '<p>static</p>';";

        assert_eq!(
            sandbox.render(script, &path(), &Props::new()).unwrap(),
            "<p>static</p>"
        );
    }

    #[test]
    fn test_sole_named_export_is_used() {
        let sandbox = Sandbox::new().unwrap();
        let script = "module.exports.Banner = function () { return h('aside', null, 'x'); };";

        assert_eq!(
            sandbox.render(script, &path(), &Props::new()).unwrap(),
            "<aside>x</aside>"
        );
    }

    #[test]
    fn test_runtime_require_is_restricted() {
        let sandbox = Sandbox::new().unwrap();
        let err = sandbox
            .describe("var fs = require('fs');\nmodule.exports.default = '';", &path())
            .unwrap_err();

        match err {
            ScriptError::DisallowedImport { module, .. } => assert_eq!(module, "fs"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_object_export_is_not_renderable() {
        let sandbox = Sandbox::new().unwrap();
        let err = sandbox
            .describe("module.exports.default = { title: 1 };", &path())
            .unwrap_err();

        match err {
            ScriptError::NotRenderable { kind, .. } => assert_eq!(kind, "object"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_thrown_errors_are_reported() {
        let sandbox = Sandbox::new().unwrap();
        let err = sandbox
            .render(
                "module.exports.default = function () { throw new Error('boom'); };",
                &path(),
                &Props::new(),
            )
            .unwrap_err();

        assert!(matches!(err, ScriptError::Evaluation { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_contexts_are_isolated() {
        let sandbox = Sandbox::new().unwrap();
        sandbox
            .render(
                "globalThis.leaked = 'yes'; module.exports.default = '';",
                &path(),
                &Props::new(),
            )
            .unwrap();

        let html = sandbox
            .render(
                "module.exports.default = function () { return typeof leaked; };",
                &path(),
                &Props::new(),
            )
            .unwrap();
        assert_eq!(html, "undefined");
    }
}
