//! The build pipeline.

use std::path::{Path, PathBuf};
use std::time::Instant;

use md5::{Digest, Md5};
use paul_cache::{Cache, CacheBucket, CacheBucketExt, FileCache, NullCache};
use paul_config::{BuildMode, Config, normalize_path};

use crate::BuildError;
use crate::asset::{AssetKind, Transformers};
use crate::manifest::{AssetManifest, MANIFEST_FILENAME, hashed_name};
use crate::package::dist_package;

const CACHE_BUCKET: &str = "transforms";

/// What to build and where.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Tree of scripts, stylesheets and static files.
    pub source_dir: PathBuf,
    /// Where the build is written.
    pub output_dir: PathBuf,
    /// Copied to `<output>/templates` when it exists.
    pub templates_dir: Option<PathBuf>,
    /// Directory holding `package.json` and `README.md`.
    pub package_dir: Option<PathBuf>,
    pub mode: BuildMode,
    /// Remove the output directory first.
    pub clean: bool,
    /// On-disk transform cache (`None` disables caching).
    pub cache_dir: Option<PathBuf>,
    /// Extra `@use`/`@import` directories for Sass.
    pub load_paths: Vec<PathBuf>,
}

impl BuildOptions {
    /// Development build of `source_dir` into `output_dir`, cleaning first,
    /// without caching.
    #[must_use]
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            templates_dir: None,
            package_dir: None,
            mode: BuildMode::Development,
            clean: true,
            cache_dir: None,
            load_paths: Vec::new(),
        }
    }

    /// Options for a project's `[build]` section.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let build = &config.build_resolved;
        Self {
            source_dir: build.source_dir.clone(),
            output_dir: build.output_dir.clone(),
            templates_dir: Some(build.templates_dir.clone()),
            package_dir: Some(config.project_resolved.root.clone()),
            mode: build.mode,
            clean: true,
            cache_dir: build
                .cache_enabled
                .then(|| config.project_resolved.cache_dir()),
            load_paths: config.styles_resolved.load_paths.clone(),
        }
    }
}

/// Summary of a finished build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Every file written, relative to the output directory, in walk order.
    pub outputs: Vec<PathBuf>,
    /// Hashed names of the emitted scripts and stylesheets.
    pub manifest: AssetManifest,
    /// Files whose transform came from the cache.
    pub cached: usize,
}

/// Walks a source tree and writes transformed assets.
pub struct BuildPipeline {
    options: BuildOptions,
    transformers: Transformers,
    cache: Box<dyn CacheBucket>,
}

impl BuildPipeline {
    #[must_use]
    pub fn new(options: BuildOptions) -> Self {
        let cache: Box<dyn Cache> = match &options.cache_dir {
            Some(dir) => Box::new(FileCache::new(dir.clone(), env!("CARGO_PKG_VERSION"))),
            None => Box::new(NullCache),
        };
        Self {
            transformers: Transformers::new(options.mode.is_production(), options.load_paths.clone()),
            cache: cache.bucket(CACHE_BUCKET),
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// The output directory may not hold any directory the build reads.
    fn check_clean_target(&self) -> Result<(), BuildError> {
        let output = normalize_path(&self.options.output_dir);
        let inputs = std::iter::once(&self.options.source_dir)
            .chain(&self.options.templates_dir)
            .chain(&self.options.package_dir);
        for input in inputs {
            if normalize_path(input).starts_with(&output) {
                return Err(BuildError::UnsafeClean {
                    output,
                    input: input.clone(),
                });
            }
        }
        Ok(())
    }

    /// Run the build.
    ///
    /// # Errors
    ///
    /// Stops at the first failing file. Output written so far is left in
    /// place. Cleaning an output directory that holds the source, templates
    /// or package directory fails before anything is removed.
    pub fn run(&self) -> Result<BuildReport, BuildError> {
        let start = Instant::now();
        let output = &self.options.output_dir;
        tracing::info!(
            source = %self.options.source_dir.display(),
            output = %output.display(),
            mode = %self.options.mode,
            "Starting build"
        );

        if self.options.clean {
            self.check_clean_target()?;
            if output.exists() {
                std::fs::remove_dir_all(output).map_err(BuildError::io(output))?;
            }
        }
        std::fs::create_dir_all(output).map_err(BuildError::io(output))?;

        let mut report = BuildReport::default();
        self.process_sources(&mut report)?;
        self.copy_templates(&mut report)?;
        self.write_package(&mut report)?;

        if !report.manifest.is_empty() {
            report.manifest.write(&output.join(MANIFEST_FILENAME))?;
            report.outputs.push(PathBuf::from(MANIFEST_FILENAME));
        }

        tracing::info!(
            files = report.outputs.len(),
            cached = report.cached,
            elapsed_ms = start.elapsed().as_millis(),
            "Build finished"
        );
        Ok(report)
    }

    fn process_sources(&self, report: &mut BuildReport) -> Result<(), BuildError> {
        let source_dir = &self.options.source_dir;
        if !source_dir.is_dir() {
            tracing::debug!(path = %source_dir.display(), "No source directory, skipping assets");
            return Ok(());
        }

        for file in walk_files(source_dir)? {
            let relative = file.strip_prefix(source_dir).unwrap_or(&file).to_path_buf();
            let kind = AssetKind::of(&relative);
            let out_relative = kind.output_path(&relative);
            let out_path = self.options.output_dir.join(&out_relative);

            if kind == AssetKind::Copy {
                copy_file(&file, &out_path)?;
                report.outputs.push(out_relative);
                continue;
            }

            let source = std::fs::read_to_string(&file).map_err(BuildError::io(&file))?;
            let content = self.transform(kind, &source, &file, &relative, report)?;
            write_file(&out_path, &content)?;
            tracing::debug!(path = %relative.display(), ?kind, "Processed asset");

            if kind.is_hashed() {
                let logical = slash_path(&out_relative);
                let hashed = hashed_name(&logical, content.as_bytes());
                write_file(&self.options.output_dir.join(&hashed), &content)?;
                report.manifest.insert(logical, hashed.clone());
                report.outputs.push(PathBuf::from(hashed));
            }
            report.outputs.push(out_relative);
        }
        Ok(())
    }

    /// Transform through the cache: keyed by relative path, validated by
    /// source content and mode.
    fn transform(
        &self,
        kind: AssetKind,
        source: &str,
        path: &Path,
        relative: &Path,
        report: &mut BuildReport,
    ) -> Result<String, BuildError> {
        let key = slash_path(relative);
        let etag = hex::encode(Md5::digest(
            format!("{}\0{}", self.options.mode, source).as_bytes(),
        ));

        if let Some(cached) = self.cache.get_string(&key, &etag) {
            report.cached += 1;
            return Ok(cached);
        }
        let content = self.transformers.apply(kind, source, path)?;
        self.cache.set_string(&key, &etag, &content);
        Ok(content)
    }

    fn copy_templates(&self, report: &mut BuildReport) -> Result<(), BuildError> {
        let Some(templates) = self.options.templates_dir.as_ref().filter(|d| d.is_dir()) else {
            return Ok(());
        };
        let target = PathBuf::from("templates");
        for file in walk_files(templates)? {
            let relative = target.join(file.strip_prefix(templates).unwrap_or(&file));
            copy_file(&file, &self.options.output_dir.join(&relative))?;
            report.outputs.push(relative);
        }
        Ok(())
    }

    fn write_package(&self, report: &mut BuildReport) -> Result<(), BuildError> {
        let Some(dir) = &self.options.package_dir else {
            return Ok(());
        };

        let package = dir.join("package.json");
        if package.is_file() {
            let source = std::fs::read_to_string(&package).map_err(BuildError::io(&package))?;
            let content = dist_package(&package, &source)?;
            write_file(&self.options.output_dir.join("package.json"), &content)?;
            report.outputs.push(PathBuf::from("package.json"));
        }

        let readme = dir.join("README.md");
        if readme.is_file() {
            copy_file(&readme, &self.options.output_dir.join("README.md"))?;
            report.outputs.push(PathBuf::from("README.md"));
        }
        Ok(())
    }
}

/// Regular files under `root`, hidden entries skipped, sorted by path.
fn walk_files(root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut files = Vec::new();
    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();
    for entry in walker {
        let entry = entry.map_err(|source| BuildError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_some_and(|t| t.is_file()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn write_file(path: &Path, content: &str) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(BuildError::io(parent))?;
    }
    std::fs::write(path, content).map_err(BuildError::io(path))
}

fn copy_file(from: &Path, to: &Path) -> Result<(), BuildError> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(BuildError::io(parent))?;
    }
    std::fs::copy(from, to).map_err(BuildError::io(from))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn read(dir: &Path, name: &str) -> String {
        std::fs::read_to_string(dir.join(name)).unwrap()
    }

    #[test]
    fn test_refuses_to_clean_over_sources() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("public");
        write(&src, "site.css", ".a { color: red; }\n");

        for output in [src.clone(), src.join("nested").join(".."), tmp.path().to_path_buf()] {
            let err = BuildPipeline::new(BuildOptions::new(&src, &output))
                .run()
                .unwrap_err();
            assert!(matches!(err, BuildError::UnsafeClean { .. }), "{err}");
        }
        assert_eq!(read(&src, "site.css"), ".a { color: red; }\n");
    }

    #[test]
    fn test_refuses_to_clean_project_root() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("public");
        write(&src, "a.txt", "a");
        write(tmp.path(), "paul.toml", "");
        let mut options = BuildOptions::new(&src, tmp.path().join("dist"));
        options.package_dir = Some(tmp.path().join("dist").join(".."));
        options.output_dir = tmp.path().to_path_buf();

        assert!(BuildPipeline::new(options).run().is_err());
        assert!(tmp.path().join("paul.toml").exists());
    }

    #[test]
    fn test_development_build() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let out = tmp.path().join("dist");
        write(&src, "app.js", "console.log('hi');\n");
        write(&src, "components/Hero.jsx", "export const Hero = () => <h1>Hi</h1>;\n");
        write(&src, "types/index.d.ts", "export declare const x: number;\n");
        write(&src, "styles/theme.scss", "$c: red;\n.a { color: $c; }\n");
        write(&src, "img/logo.svg", "<svg/>");
        write(&src, ".secret", "token");

        let report = BuildPipeline::new(BuildOptions::new(&src, &out)).run().unwrap();

        assert_eq!(read(&out, "app.js"), "console.log('hi');\n");
        assert!(!read(&out, "components/Hero.js").contains("<h1>"));
        assert_eq!(read(&out, "types/index.d.ts"), "export declare const x: number;\n");
        assert!(read(&out, "styles/theme.css").contains(".a"));
        assert_eq!(read(&out, "img/logo.svg"), "<svg/>");
        assert!(!out.join(".secret").exists());
        assert!(!out.join("components/Hero.jsx").exists());

        assert_eq!(report.manifest.len(), 3);
        let hashed = report.manifest.get("components/Hero.js").unwrap();
        assert!(hashed.starts_with("components/Hero."));
        assert_eq!(read(&out, hashed), read(&out, "components/Hero.js"));

        let manifest: serde_json::Value = serde_json::from_str(&read(&out, MANIFEST_FILENAME)).unwrap();
        assert_eq!(manifest["app.js"], report.manifest.get("app.js").unwrap());
        assert!(manifest.get("img/logo.svg").is_none());
    }

    #[test]
    fn test_production_minifies() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let out = tmp.path().join("dist");
        write(&src, "app.js", "export function add(first, second) {\n  debugger;\n  return first + second;\n}\n");
        write(&src, "main.css", ".a {\n  color: red;\n}\n");

        let options = BuildOptions {
            mode: BuildMode::Production,
            ..BuildOptions::new(&src, &out)
        };
        BuildPipeline::new(options).run().unwrap();

        let js = read(&out, "app.js");
        assert!(!js.contains("debugger"));
        assert!(!js.contains("first + second"));
        assert!(read(&out, "main.css").contains(".a{color:red}"));
    }

    #[test]
    fn test_clean_removes_stale_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let out = tmp.path().join("dist");
        write(&src, "a.txt", "a");
        write(&out, "stale.html", "old");

        BuildPipeline::new(BuildOptions::new(&src, &out)).run().unwrap();

        assert!(!out.join("stale.html").exists());
        assert!(out.join("a.txt").exists());
        assert!(!out.join(MANIFEST_FILENAME).exists());
    }

    #[test]
    fn test_templates_package_and_readme() {
        let tmp = tempfile::TempDir::new().unwrap();
        let out = tmp.path().join("dist");
        write(tmp.path(), "templates/card.html", "<div>{{ title }}</div>");
        write(
            tmp.path(),
            "package.json",
            r#"{"name": "site", "scripts": {"start": "paul serve", "build": "paul build"}, "devDependencies": {}}"#,
        );
        write(tmp.path(), "README.md", "# Site\n");

        let options = BuildOptions {
            templates_dir: Some(tmp.path().join("templates")),
            package_dir: Some(tmp.path().to_path_buf()),
            ..BuildOptions::new(tmp.path().join("missing"), &out)
        };
        let report = BuildPipeline::new(options).run().unwrap();

        assert_eq!(read(&out, "templates/card.html"), "<div>{{ title }}</div>");
        let package: serde_json::Value = serde_json::from_str(&read(&out, "package.json")).unwrap();
        assert_eq!(package["main"], "index.js");
        assert_eq!(package["scripts"], serde_json::json!({"start": "paul serve"}));
        assert!(package.get("devDependencies").is_none());
        assert_eq!(read(&out, "README.md"), "# Site\n");
        assert_eq!(
            report.outputs,
            vec![
                PathBuf::from("templates/card.html"),
                PathBuf::from("package.json"),
                PathBuf::from("README.md"),
            ]
        );
    }

    #[test]
    fn test_transform_cache() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let out = tmp.path().join("dist");
        write(&src, "app.ts", "export const n: number = 1;\n");

        let options = BuildOptions {
            cache_dir: Some(tmp.path().join(".paul/cache")),
            ..BuildOptions::new(&src, &out)
        };

        let first = BuildPipeline::new(options.clone()).run().unwrap();
        assert_eq!(first.cached, 0);

        let second = BuildPipeline::new(options.clone()).run().unwrap();
        assert_eq!(second.cached, 1);
        assert!(read(&out, "app.js").contains("export const n = 1"));

        write(&src, "app.ts", "export const n: number = 2;\n");
        let third = BuildPipeline::new(options.clone()).run().unwrap();
        assert_eq!(third.cached, 0);

        let production = BuildOptions {
            mode: BuildMode::Production,
            ..options
        };
        assert_eq!(BuildPipeline::new(production).run().unwrap().cached, 0);
    }

    #[test]
    fn test_failure_names_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("src");
        write(&src, "broken.tsx", "export const = ;");

        let err = BuildPipeline::new(BuildOptions::new(&src, tmp.path().join("dist")))
            .run()
            .unwrap_err();

        assert!(err.to_string().contains("broken.tsx"));
    }
}
