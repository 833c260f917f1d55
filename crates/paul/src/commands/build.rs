//! `paul build` command implementation.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use paul_build::{BuildOptions, BuildPipeline};
use paul_config::{BuildMode, CliSettings, Config};
use paul_site::StaticExporter;

use crate::error::CliError;
use crate::output::Output;
use crate::project::Project;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover paul.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Build mode: development or production (default: from NODE_ENV).
    #[arg(short, long)]
    mode: Option<BuildMode>,

    /// Only export pages, skip the asset pipeline.
    #[arg(long)]
    no_assets: bool,

    /// Load JavaScript components from project files.
    #[arg(long)]
    dynamic: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, an asset fails to transform
    /// or a page fails to render.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let start = Instant::now();

        let cli_settings = CliSettings {
            output_dir: self.output,
            mode: self.mode.or_else(BuildMode::from_env),
            dynamic_components: self.dynamic.then_some(true),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let output_dir = config.build_resolved.output_dir.clone();

        output.info(&format!(
            "Building {} ({} mode)",
            config.project_resolved.root.display(),
            config.build_resolved.mode
        ));

        if self.no_assets {
            output.info("Assets: skipped");
        } else {
            let report = BuildPipeline::new(BuildOptions::from_config(&config)).run()?;
            output.info(&format!(
                "Assets: {} files ({} from cache)",
                report.outputs.len(),
                report.cached
            ));
        }

        let project = Project::new(config)?;
        let site = project.load_site()?;
        let written = StaticExporter::new(&output_dir).export(&site)?;
        output.info(&format!("Pages: {}", written.len()));

        output.success(&format!(
            "Built {} in {:.2}s",
            output_dir.display(),
            start.elapsed().as_secs_f64()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: BuildArgs,
    }

    fn project(root: &std::path::Path) {
        fs::create_dir_all(root.join("pages")).unwrap();
        fs::create_dir_all(root.join("public/css")).unwrap();
        fs::write(root.join("paul.toml"), "").unwrap();
        fs::write(
            root.join("pages/index.toml"),
            "[[pages]]\nroute = \"/\"\nmeta = { title = \"Acme\" }\n\n\
             [[pages.sections]]\ncomponent = \"cta\"\n\n\
             [[pages]]\nroute = \"/pricing\"\nmeta = { title = \"Pricing\" }\n",
        )
        .unwrap();
        fs::write(root.join("public/css/site.css"), ".a { color: red; }\n").unwrap();
    }

    fn parse(args: &[&str]) -> BuildArgs {
        TestCli::parse_from(std::iter::once("build").chain(args.iter().copied())).args
    }

    #[test]
    fn test_build_writes_assets_and_pages() {
        let tmp = tempfile::TempDir::new().unwrap();
        project(tmp.path());
        let config = tmp.path().join("paul.toml");

        parse(&["--config", config.to_str().unwrap(), "--mode", "development"])
            .execute()
            .unwrap();

        let dist = tmp.path().join("dist");
        assert!(dist.join("index.html").is_file());
        assert!(dist.join("pricing.html").is_file());
        assert!(dist.join("css/site.css").is_file());
        assert!(dist.join("manifest.json").is_file());
        let html = fs::read_to_string(dist.join("index.html")).unwrap();
        assert!(html.contains("<title>Acme</title>"));
    }

    #[test]
    fn test_no_assets_exports_pages_only() {
        let tmp = tempfile::TempDir::new().unwrap();
        project(tmp.path());
        let config = tmp.path().join("paul.toml");
        let out = tmp.path().join("site");

        parse(&[
            "--config",
            config.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--no-assets",
        ])
        .execute()
        .unwrap();

        assert!(out.join("index.html").is_file());
        assert!(!out.join("css").exists());
        assert!(!tmp.path().join("dist").exists());
    }

    #[test]
    fn test_render_failure_fails_build() {
        let tmp = tempfile::TempDir::new().unwrap();
        project(tmp.path());
        fs::write(
            tmp.path().join("pages/index.toml"),
            "[[pages]]\nroute = \"/\"\n\n[[pages.sections]]\ncomponent = \"pricing\"\n",
        )
        .unwrap();
        let config = tmp.path().join("paul.toml");

        let err = parse(&["--config", config.to_str().unwrap(), "--no-assets"])
            .execute()
            .unwrap_err();

        assert!(err.to_string().contains("pricing"));
    }
}
