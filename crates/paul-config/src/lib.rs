//! Project configuration for paul.
//!
//! Parses `paul.toml` with serde and discovers it in the current directory
//! or any parent. Every section is optional; a project without a config
//! file gets defaults rooted at the working directory.
//!
//! CLI settings are layered on top during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String values support `${VAR}` and `${VAR:-default}`. Expanded fields:
//! - `server.host`
//! - `build.output_dir`
//! - `styles.load_paths`

mod expand;
mod mode;

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

pub use mode::{BuildMode, MODE_ENV_VAR};

/// CLI settings that override configuration file values.
///
/// Only `Some` values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override live reload enabled flag.
    pub live_reload_enabled: Option<bool>,
    /// Override build output directory.
    pub output_dir: Option<PathBuf>,
    /// Override build mode.
    pub mode: Option<BuildMode>,
    /// Override the dynamic component loader opt-in.
    pub dynamic_components: Option<bool>,
}

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "paul.toml";

/// Default patterns watched by the preview server, relative to the project root.
const DEFAULT_WATCH_PATTERNS: [&str; 4] = ["pages/**", "components/**", "styles/**", "public/**"];

/// Default content globs scanned for utility classes.
const DEFAULT_CONTENT_GLOBS: [&str; 2] = ["pages/**/*", "components/**/*"];

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Preview server configuration.
    pub server: ServerConfig,
    /// Project layout (paths are relative strings from TOML).
    project: ProjectConfigRaw,
    /// Stylesheet processing configuration.
    styles: StylesConfigRaw,
    /// Component loading configuration.
    pub components: ComponentsConfig,
    /// Build configuration (paths are relative strings from TOML).
    build: BuildConfigRaw,
    /// Live reload configuration.
    pub live_reload: LiveReloadConfig,

    /// Resolved project layout (set after loading).
    #[serde(skip)]
    pub project_resolved: ProjectPaths,
    /// Resolved stylesheet settings (set after loading).
    #[serde(skip)]
    pub styles_resolved: StylesSettings,
    /// Resolved build settings (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildSettings,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Preview server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3000,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ProjectConfigRaw {
    pages_dir: Option<String>,
    components_dir: Option<String>,
    styles_dir: Option<String>,
    public_dir: Option<String>,
}

/// Resolved project layout with absolute paths.
#[derive(Debug, Default, Clone)]
pub struct ProjectPaths {
    /// Project root (directory holding `paul.toml`).
    pub root: PathBuf,
    /// Directory holding the app definition (`index.toml` and friends).
    pub pages_dir: PathBuf,
    /// Directory holding user components.
    pub components_dir: PathBuf,
    /// Directory holding global stylesheets.
    pub styles_dir: PathBuf,
    /// Directory served verbatim by the preview server.
    pub public_dir: PathBuf,
    /// Directory for paul's own data (`.paul/`).
    pub project_dir: PathBuf,
}

impl ProjectPaths {
    fn rooted_at(root: &Path, raw: &ProjectConfigRaw) -> Self {
        let resolve =
            |path: Option<&str>, default: &str| normalize_path(&root.join(path.unwrap_or(default)));
        Self {
            root: root.to_path_buf(),
            pages_dir: resolve(raw.pages_dir.as_deref(), "pages"),
            components_dir: resolve(raw.components_dir.as_deref(), "components"),
            styles_dir: resolve(raw.styles_dir.as_deref(), "styles"),
            public_dir: resolve(raw.public_dir.as_deref(), "public"),
            project_dir: root.join(".paul"),
        }
    }

    /// Cache directory path (`.paul/cache/`).
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.project_dir.join("cache")
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct StylesConfigRaw {
    content: Option<Vec<String>>,
    load_paths: Vec<String>,
}

/// Resolved stylesheet settings.
#[derive(Debug, Default, Clone)]
pub struct StylesSettings {
    /// Absolute glob patterns scanned for utility class names.
    pub content: Vec<String>,
    /// Extra directories searched by `@use` and `@import`.
    pub load_paths: Vec<PathBuf>,
}

/// Component loading configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ComponentsConfig {
    /// Allow sections to reference component files evaluated at runtime.
    pub dynamic: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    output_dir: Option<String>,
    source_dir: Option<String>,
    templates_dir: Option<String>,
    mode: Option<BuildMode>,
    cache: Option<bool>,
}

/// Resolved build settings with absolute paths.
#[derive(Debug, Default, Clone)]
pub struct BuildSettings {
    /// Directory the static site and processed assets are written to.
    pub output_dir: PathBuf,
    /// Directory whose scripts and stylesheets are processed.
    pub source_dir: PathBuf,
    /// Directory copied to `<output>/templates` when present.
    pub templates_dir: PathBuf,
    /// Development or production output.
    pub mode: BuildMode,
    /// Whether transform results are cached on disk.
    pub cache_enabled: bool,
}

/// Live reload configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Whether live reload is enabled.
    pub enabled: bool,
    /// File patterns to watch, relative to the project root.
    pub watch_patterns: Option<Vec<String>>,
}

impl LiveReloadConfig {
    /// Configured watch patterns, or the defaults covering every project directory.
    #[must_use]
    pub fn patterns(&self) -> Vec<String> {
        self.watch_patterns.clone().unwrap_or_else(|| {
            DEFAULT_WATCH_PATTERNS
                .iter()
                .map(|p| (*p).to_owned())
                .collect()
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`server.host`").
        field: String,
        /// Error message (e.g., "${`PAUL_HOST`} not set").
        message: String,
    },
}

/// Absolute form of `path` with `.` and `..` folded away.
///
/// Lexical only: symlinks are not followed and nothing has to exist.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Directory holding the config file. A bare file name lives in the
/// working directory.
fn config_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_glob(pattern: &str, field: &str) -> Result<(), ConfigError> {
    glob::Pattern::new(pattern).map_err(|e| {
        ConfigError::Validation(format!("{field} has invalid pattern \"{pattern}\": {e}"))
    })?;
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `paul.toml` in the current directory and its parents, falling back
    /// to defaults rooted at the working directory.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails
    /// or a value does not validate.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Load the configuration of the project rooted at `root`.
    ///
    /// Reads `root/paul.toml` when it exists, otherwise returns defaults
    /// rooted at `root`. No parent-directory discovery happens.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but fails to parse or validate.
    pub fn load_project(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILENAME);
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default_with_base(root))
        }
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(live_reload_enabled) = settings.live_reload_enabled {
            self.live_reload.enabled = live_reload_enabled;
        }
        if let Some(output_dir) = &settings.output_dir {
            self.build_resolved.output_dir = normalize_path(output_dir);
        }
        if let Some(mode) = settings.mode {
            self.build_resolved.mode = mode;
        }
        if let Some(dynamic) = settings.dynamic_components {
            self.components.dynamic = dynamic;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    #[must_use]
    pub fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            server: ServerConfig::default(),
            project: ProjectConfigRaw::default(),
            styles: StylesConfigRaw::default(),
            components: ComponentsConfig::default(),
            build: BuildConfigRaw::default(),
            live_reload: LiveReloadConfig::default(),
            project_resolved: ProjectPaths::default(),
            styles_resolved: StylesSettings::default(),
            build_resolved: BuildSettings::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        config.resolve_paths(config_dir(path));
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        for pattern in &self.live_reload.patterns() {
            require_glob(pattern, "live_reload.watch_patterns")?;
        }
        for pattern in &self.styles_resolved.content {
            require_glob(pattern, "styles.content")?;
        }

        self.validate_output_dir()
    }

    /// The build cleans its output directory, so it must not hold the
    /// project or any directory paul reads from.
    fn validate_output_dir(&self) -> Result<(), ConfigError> {
        let output = &self.build_resolved.output_dir;
        if self.project_resolved.root.starts_with(output) {
            return Err(ConfigError::Validation(format!(
                "build.output_dir {} cannot be the project root or one of its parents",
                output.display()
            )));
        }

        let inputs = [
            ("build.source_dir", &self.build_resolved.source_dir),
            ("build.templates_dir", &self.build_resolved.templates_dir),
            ("project.pages_dir", &self.project_resolved.pages_dir),
            ("project.components_dir", &self.project_resolved.components_dir),
            ("project.styles_dir", &self.project_resolved.styles_dir),
            ("project.public_dir", &self.project_resolved.public_dir),
        ];
        for (field, dir) in inputs {
            if dir.starts_with(output) || output.starts_with(dir) {
                return Err(ConfigError::Validation(format!(
                    "build.output_dir {} overlaps {field} {}",
                    output.display(),
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref output_dir) = self.build.output_dir {
            self.build.output_dir = Some(expand::expand_env(output_dir, "build.output_dir")?);
        }

        expand::expand_all(&mut self.styles.load_paths, "styles.load_paths")?;

        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let config_dir = &normalize_path(config_dir);
        let project = ProjectPaths::rooted_at(config_dir, &self.project);

        let content = match &self.styles.content {
            Some(globs) => globs.clone(),
            None => DEFAULT_CONTENT_GLOBS.iter().map(|g| (*g).to_owned()).collect(),
        };
        self.styles_resolved = StylesSettings {
            content: content
                .iter()
                .map(|glob| config_dir.join(glob).to_string_lossy().into_owned())
                .collect(),
            load_paths: std::iter::once(project.styles_dir.clone())
                .chain(self.styles.load_paths.iter().map(|p| config_dir.join(p)))
                .collect(),
        };

        let resolve = |path: Option<&str>, default: &Path| {
            normalize_path(&path.map_or_else(|| default.to_path_buf(), |p| config_dir.join(p)))
        };
        self.build_resolved = BuildSettings {
            output_dir: resolve(self.build.output_dir.as_deref(), &config_dir.join("dist")),
            source_dir: resolve(self.build.source_dir.as_deref(), &project.public_dir),
            templates_dir: resolve(
                self.build.templates_dir.as_deref(),
                &config_dir.join("templates"),
            ),
            mode: self.build.mode.unwrap_or_default(),
            cache_enabled: self.build.cache.unwrap_or(true),
        };

        self.project_resolved = project;
    }
}
