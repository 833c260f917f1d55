//! Utility-first CSS generation.
//!
//! Content files matched by the configured globs are scanned for class-like
//! tokens. Every token naming a known utility (optionally behind `hover:`,
//! `focus:` or a responsive `sm:`/`md:`/`lg:`/`xl:` variant) produces one
//! rule. Generated rules replace the `@tailwind utilities;` directive of the
//! input stylesheet; `@tailwind base;` and `@tailwind components;` are
//! dropped. Without a directive the rules are appended.
//!
//! Output order is stable: plain utilities, then state variants, then one
//! media block per breakpoint, each sorted by class name.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::{StyleCompiler, StyleError};

static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@tailwind\s+(base|components|utilities)\s*;").unwrap());

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z0-9_\-:/.]+").unwrap());

const BREAKPOINTS: [(&str, &str); 4] = [
    ("sm", "640px"),
    ("md", "768px"),
    ("lg", "1024px"),
    ("xl", "1280px"),
];

const STATES: [&str; 2] = ["hover", "focus"];

/// Generates utility classes used by the project's content files.
pub struct UtilityGenerator {
    content: Vec<String>,
}

impl UtilityGenerator {
    /// `content` holds absolute glob patterns of files to scan.
    #[must_use]
    pub fn new(content: Vec<String>) -> Self {
        Self { content }
    }

    /// Collect candidate class tokens from every content file.
    fn scan(&self) -> BTreeSet<String> {
        let mut candidates = BTreeSet::new();
        for pattern in &self.content {
            let Ok(paths) = glob::glob(pattern) else {
                tracing::warn!(pattern, "Skipping invalid content glob");
                continue;
            };
            for path in paths.flatten().filter(|p| p.is_file()) {
                let Ok(text) = std::fs::read_to_string(&path) else {
                    continue;
                };
                candidates.extend(tokens(&text));
            }
        }
        candidates
    }
}

impl StyleCompiler for UtilityGenerator {
    fn compile(&self, source: &str, _origin: Option<&Path>) -> Result<String, StyleError> {
        let mut candidates = self.scan();
        candidates.extend(tokens(source));
        let utilities = generate(candidates.iter().map(String::as_str));
        tracing::debug!(
            candidates = candidates.len(),
            bytes = utilities.len(),
            "Generated utility classes"
        );

        if !DIRECTIVE.is_match(source) {
            let mut css = source.trim_end().to_owned();
            if !css.is_empty() {
                css.push('\n');
            }
            css.push_str(&utilities);
            return Ok(css);
        }

        Ok(DIRECTIVE
            .replace_all(source, |caps: &regex::Captures<'_>| {
                if &caps[1] == "utilities" {
                    utilities.clone()
                } else {
                    String::new()
                }
            })
            .into_owned())
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['.', ':', '/']).to_owned())
        .filter(|t| !t.is_empty())
}

/// A generated rule for one class.
struct Rule {
    class: String,
    pseudo: Option<&'static str>,
    declarations: Vec<(&'static str, String)>,
}

impl Rule {
    fn write(&self, out: &mut String, indent: &str) {
        let _ = write!(out, "{indent}.{}", escape_class(&self.class));
        if let Some(pseudo) = self.pseudo {
            let _ = write!(out, ":{pseudo}");
        }
        out.push_str(" {");
        for (property, value) in &self.declarations {
            let _ = write!(out, " {property}: {value};");
        }
        out.push_str(" }\n");
    }
}

/// Generate CSS for every recognised class name.
#[must_use]
pub fn generate<'a>(classes: impl IntoIterator<Item = &'a str>) -> String {
    let mut plain = Vec::new();
    let mut states = Vec::new();
    let mut media: BTreeMap<usize, Vec<Rule>> = BTreeMap::new();

    for class in classes {
        let Some((breakpoint, pseudo, utility)) = split_variants(class) else {
            continue;
        };
        let Some(declarations) = declarations(utility) else {
            continue;
        };
        let rule = Rule {
            class: class.to_owned(),
            pseudo,
            declarations,
        };
        match (breakpoint, pseudo) {
            (Some(index), _) => media.entry(index).or_default().push(rule),
            (None, Some(_)) => states.push(rule),
            (None, None) => plain.push(rule),
        }
    }

    let mut css = String::new();
    for rule in plain.iter().chain(&states) {
        rule.write(&mut css, "");
    }
    for (index, rules) in &media {
        let (_, width) = BREAKPOINTS[*index];
        let _ = writeln!(css, "@media (min-width: {width}) {{");
        for rule in rules {
            rule.write(&mut css, "  ");
        }
        css.push_str("}\n");
    }
    css
}

/// Split `md:hover:p-4` into breakpoint index, pseudo-class and utility.
fn split_variants(class: &str) -> Option<(Option<usize>, Option<&'static str>, &str)> {
    let mut parts: Vec<&str> = class.split(':').collect();
    let utility = parts.pop()?;
    let mut breakpoint = None;
    let mut pseudo = None;
    for variant in parts {
        if let Some(index) = BREAKPOINTS.iter().position(|(name, _)| *name == variant) {
            if breakpoint.replace(index).is_some() {
                return None;
            }
        } else if let Some(state) = STATES.iter().find(|s| **s == variant) {
            if pseudo.replace(*state).is_some() {
                return None;
            }
        } else {
            return None;
        }
    }
    Some((breakpoint, pseudo, utility))
}

fn escape_class(class: &str) -> String {
    let mut escaped = String::with_capacity(class.len());
    for ch in class.chars() {
        if matches!(ch, ':' | '/' | '.') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn single(property: &'static str, value: impl Into<String>) -> Option<Vec<(&'static str, String)>> {
    Some(vec![(property, value.into())])
}

/// Declarations for a utility without variants, or `None` if unknown.
fn declarations(utility: &str) -> Option<Vec<(&'static str, String)>> {
    if let Some(declarations) = keyword(utility) {
        return Some(declarations);
    }
    if let Some((prefix, value)) = utility.split_once('-')
        && let Some(declarations) = spacing(prefix, value)
    {
        return Some(declarations);
    }
    sizing(utility)
        .or_else(|| typography(utility))
        .or_else(|| color(utility))
        .or_else(|| decoration(utility))
}

fn keyword(utility: &str) -> Option<Vec<(&'static str, String)>> {
    let (property, value) = match utility {
        "block" => ("display", "block"),
        "inline-block" => ("display", "inline-block"),
        "inline" => ("display", "inline"),
        "flex" => ("display", "flex"),
        "inline-flex" => ("display", "inline-flex"),
        "grid" => ("display", "grid"),
        "hidden" => ("display", "none"),
        "flex-row" => ("flex-direction", "row"),
        "flex-col" => ("flex-direction", "column"),
        "flex-wrap" => ("flex-wrap", "wrap"),
        "flex-1" => ("flex", "1 1 0%"),
        "items-start" => ("align-items", "flex-start"),
        "items-center" => ("align-items", "center"),
        "items-end" => ("align-items", "flex-end"),
        "items-stretch" => ("align-items", "stretch"),
        "justify-start" => ("justify-content", "flex-start"),
        "justify-center" => ("justify-content", "center"),
        "justify-end" => ("justify-content", "flex-end"),
        "justify-between" => ("justify-content", "space-between"),
        "justify-around" => ("justify-content", "space-around"),
        "justify-evenly" => ("justify-content", "space-evenly"),
        "text-left" => ("text-align", "left"),
        "text-center" => ("text-align", "center"),
        "text-right" => ("text-align", "right"),
        "text-justify" => ("text-align", "justify"),
        "uppercase" => ("text-transform", "uppercase"),
        "lowercase" => ("text-transform", "lowercase"),
        "capitalize" => ("text-transform", "capitalize"),
        "italic" => ("font-style", "italic"),
        "underline" => ("text-decoration-line", "underline"),
        "no-underline" => ("text-decoration-line", "none"),
        "relative" => ("position", "relative"),
        "absolute" => ("position", "absolute"),
        "sticky" => ("position", "sticky"),
        "overflow-hidden" => ("overflow", "hidden"),
        "select-none" => ("user-select", "none"),
        _ => return None,
    };
    single(property, value)
}

/// Spacing scale: `n` → `n * 0.25rem`, plus `px` and (margins only) `auto`.
fn spacing_value(value: &str, allow_auto: bool) -> Option<String> {
    match value {
        "0" => Some("0px".to_owned()),
        "px" => Some("1px".to_owned()),
        "auto" if allow_auto => Some("auto".to_owned()),
        _ => {
            let steps: f64 = value.parse().ok()?;
            let valid = (0.0..=96.0).contains(&steps) && (steps * 2.0).fract().abs() < f64::EPSILON;
            valid.then(|| format!("{}rem", steps * 0.25))
        }
    }
}

fn spacing(prefix: &str, value: &str) -> Option<Vec<(&'static str, String)>> {
    let (properties, allow_auto): (&[&'static str], bool) = match prefix {
        "p" => (&["padding"], false),
        "px" => (&["padding-left", "padding-right"], false),
        "py" => (&["padding-top", "padding-bottom"], false),
        "pt" => (&["padding-top"], false),
        "pr" => (&["padding-right"], false),
        "pb" => (&["padding-bottom"], false),
        "pl" => (&["padding-left"], false),
        "m" => (&["margin"], true),
        "mx" => (&["margin-left", "margin-right"], true),
        "my" => (&["margin-top", "margin-bottom"], true),
        "mt" => (&["margin-top"], true),
        "mr" => (&["margin-right"], true),
        "mb" => (&["margin-bottom"], true),
        "ml" => (&["margin-left"], true),
        "gap" => (&["gap"], false),
        _ => return None,
    };
    let value = spacing_value(value, allow_auto)?;
    Some(properties.iter().map(|p| (*p, value.clone())).collect())
}

fn sizing(utility: &str) -> Option<Vec<(&'static str, String)>> {
    if let Some(value) = utility.strip_prefix("w-") {
        let width = match value {
            "full" => "100%".to_owned(),
            "screen" => "100vw".to_owned(),
            "auto" => "auto".to_owned(),
            "1/2" => "50%".to_owned(),
            "1/3" => "33.333333%".to_owned(),
            "2/3" => "66.666667%".to_owned(),
            "1/4" => "25%".to_owned(),
            "3/4" => "75%".to_owned(),
            other => spacing_value(other, false)?,
        };
        return single("width", width);
    }
    if let Some(value) = utility.strip_prefix("h-") {
        let height = match value {
            "full" => "100%".to_owned(),
            "screen" => "100vh".to_owned(),
            "auto" => "auto".to_owned(),
            other => spacing_value(other, false)?,
        };
        return single("height", height);
    }
    if let Some(value) = utility.strip_prefix("max-w-") {
        let width = match value {
            "sm" => "24rem",
            "md" => "28rem",
            "lg" => "32rem",
            "xl" => "36rem",
            "2xl" => "42rem",
            "3xl" => "48rem",
            "4xl" => "56rem",
            "5xl" => "64rem",
            "6xl" => "72rem",
            "7xl" => "80rem",
            "full" => "100%",
            "prose" => "65ch",
            _ => return None,
        };
        return single("max-width", width);
    }
    if let Some(columns) = utility.strip_prefix("grid-cols-") {
        let count: u8 = columns.parse().ok()?;
        return (1..=12)
            .contains(&count)
            .then(|| vec![("grid-template-columns", format!("repeat({count}, minmax(0, 1fr))"))]);
    }
    None
}

fn typography(utility: &str) -> Option<Vec<(&'static str, String)>> {
    if let Some(size) = utility.strip_prefix("text-") {
        let (font_size, line_height) = match size {
            "xs" => ("0.75rem", "1rem"),
            "sm" => ("0.875rem", "1.25rem"),
            "base" => ("1rem", "1.5rem"),
            "lg" => ("1.125rem", "1.75rem"),
            "xl" => ("1.25rem", "1.75rem"),
            "2xl" => ("1.5rem", "2rem"),
            "3xl" => ("1.875rem", "2.25rem"),
            "4xl" => ("2.25rem", "2.5rem"),
            "5xl" => ("3rem", "1"),
            "6xl" => ("3.75rem", "1"),
            _ => return None,
        };
        return Some(vec![
            ("font-size", font_size.to_owned()),
            ("line-height", line_height.to_owned()),
        ]);
    }
    if let Some(weight) = utility.strip_prefix("font-") {
        let weight = match weight {
            "thin" => "100",
            "light" => "300",
            "normal" => "400",
            "medium" => "500",
            "semibold" => "600",
            "bold" => "700",
            "extrabold" => "800",
            "black" => "900",
            _ => return None,
        };
        return single("font-weight", weight);
    }
    None
}

fn color(utility: &str) -> Option<Vec<(&'static str, String)>> {
    let (property, name) = if let Some(name) = utility.strip_prefix("text-") {
        ("color", name)
    } else if let Some(name) = utility.strip_prefix("bg-") {
        ("background-color", name)
    } else if let Some(name) = utility.strip_prefix("border-") {
        ("border-color", name)
    } else {
        return None;
    };
    single(property, palette(name)?)
}

fn palette(name: &str) -> Option<&'static str> {
    const SHADES: [&str; 10] = ["50", "100", "200", "300", "400", "500", "600", "700", "800", "900"];
    const GRAY: [&str; 10] = [
        "#f9fafb", "#f3f4f6", "#e5e7eb", "#d1d5db", "#9ca3af", "#6b7280", "#4b5563", "#374151",
        "#1f2937", "#111827",
    ];
    const RED: [&str; 10] = [
        "#fef2f2", "#fee2e2", "#fecaca", "#fca5a5", "#f87171", "#ef4444", "#dc2626", "#b91c1c",
        "#991b1b", "#7f1d1d",
    ];
    const GREEN: [&str; 10] = [
        "#f0fdf4", "#dcfce7", "#bbf7d0", "#86efac", "#4ade80", "#22c55e", "#16a34a", "#15803d",
        "#166534", "#14532d",
    ];
    const BLUE: [&str; 10] = [
        "#eff6ff", "#dbeafe", "#bfdbfe", "#93c5fd", "#60a5fa", "#3b82f6", "#2563eb", "#1d4ed8",
        "#1e40af", "#1e3a8a",
    ];
    const INDIGO: [&str; 10] = [
        "#eef2ff", "#e0e7ff", "#c7d2fe", "#a5b4fc", "#818cf8", "#6366f1", "#4f46e5", "#4338ca",
        "#3730a3", "#312e81",
    ];

    match name {
        "white" => return Some("#ffffff"),
        "black" => return Some("#000000"),
        "transparent" => return Some("transparent"),
        _ => {}
    }
    let (hue, shade) = name.rsplit_once('-')?;
    let index = SHADES.iter().position(|s| *s == shade)?;
    let scale = match hue {
        "gray" => &GRAY,
        "red" => &RED,
        "green" => &GREEN,
        "blue" => &BLUE,
        "indigo" => &INDIGO,
        _ => return None,
    };
    Some(scale[index])
}

fn decoration(utility: &str) -> Option<Vec<(&'static str, String)>> {
    let radius = match utility {
        "rounded-none" => Some("0px"),
        "rounded-sm" => Some("0.125rem"),
        "rounded" => Some("0.25rem"),
        "rounded-md" => Some("0.375rem"),
        "rounded-lg" => Some("0.5rem"),
        "rounded-xl" => Some("0.75rem"),
        "rounded-2xl" => Some("1rem"),
        "rounded-full" => Some("9999px"),
        _ => None,
    };
    if let Some(radius) = radius {
        return single("border-radius", radius);
    }

    let shadow = match utility {
        "shadow-none" => Some("none"),
        "shadow-sm" => Some("0 1px 2px 0 rgb(0 0 0 / 0.05)"),
        "shadow" => Some("0 1px 3px 0 rgb(0 0 0 / 0.1), 0 1px 2px -1px rgb(0 0 0 / 0.1)"),
        "shadow-md" => Some("0 4px 6px -1px rgb(0 0 0 / 0.1), 0 2px 4px -2px rgb(0 0 0 / 0.1)"),
        "shadow-lg" => Some("0 10px 15px -3px rgb(0 0 0 / 0.1), 0 4px 6px -4px rgb(0 0 0 / 0.1)"),
        _ => None,
    };
    if let Some(shadow) = shadow {
        return single("box-shadow", shadow);
    }

    let border = match utility {
        "border" => Some("1px"),
        "border-0" => Some("0px"),
        "border-2" => Some("2px"),
        "border-4" => Some("4px"),
        "border-8" => Some("8px"),
        _ => None,
    };
    border.map(|width| {
        vec![
            ("border-width", width.to_owned()),
            ("border-style", "solid".to_owned()),
        ]
    })
}
