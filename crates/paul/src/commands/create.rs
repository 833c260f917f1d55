//! `paul create` command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use dialoguer::Input;
use minijinja::{Environment, context};

use crate::error::CliError;
use crate::output::Output;

const DEFAULT_PATH: &str = "my-landing-page";
const DEFAULT_TITLE: &str = "My Landing Page";
const DEFAULT_DESCRIPTION: &str = "A beautiful landing page built with paul";

/// Directories every new project starts with.
const PROJECT_DIRS: [&str; 4] = ["pages", "components", "styles", "public"];

/// A file of the default project.
struct ScaffoldFile {
    path: &'static str,
    source: &'static str,
    /// Rendered with the project variables instead of copied.
    templated: bool,
}

const SCAFFOLD: [ScaffoldFile; 6] = [
    ScaffoldFile {
        path: "paul.toml",
        source: include_str!("../scaffold/paul.toml"),
        templated: true,
    },
    ScaffoldFile {
        path: "pages/index.toml",
        source: include_str!("../scaffold/index.toml"),
        templated: true,
    },
    ScaffoldFile {
        path: "components/feature.html",
        source: include_str!("../scaffold/feature.html"),
        templated: false,
    },
    ScaffoldFile {
        path: "styles/main.css",
        source: include_str!("../scaffold/main.css"),
        templated: false,
    },
    ScaffoldFile {
        path: "README.md",
        source: include_str!("../scaffold/README.md"),
        templated: true,
    },
    ScaffoldFile {
        path: ".gitignore",
        source: include_str!("../scaffold/gitignore"),
        templated: false,
    },
];

/// Arguments for the create command.
#[derive(Args)]
pub(crate) struct CreateArgs {
    /// Project directory (prompted when omitted).
    path: Option<PathBuf>,

    /// Site title.
    #[arg(long)]
    title: Option<String>,

    /// Short site description.
    #[arg(long)]
    description: Option<String>,

    /// Copy this directory instead of the default project.
    #[arg(long, value_name = "DIR")]
    template: Option<PathBuf>,

    /// Use defaults instead of prompting.
    #[arg(short, long)]
    yes: bool,
}

/// Values substituted into project files.
struct ProjectVars {
    title: String,
    description: String,
    project_name: String,
}

impl CreateArgs {
    /// Execute the create command.
    ///
    /// # Errors
    ///
    /// Returns an error if a prompt fails, the target directory is not
    /// empty or a file cannot be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        if let Some(template) = &self.template
            && !template.is_dir()
        {
            return Err(CliError::Validation(format!(
                "Template directory not found: {}",
                template.display()
            )));
        }

        let path = match self.path {
            Some(path) => path,
            None => PathBuf::from(ask(
                "Where would you like to create your project?",
                DEFAULT_PATH,
                None,
                self.yes,
            )?),
        };
        ensure_empty(&path)?;

        let vars = ProjectVars {
            title: ask("What is your site title?", DEFAULT_TITLE, self.title, self.yes)?,
            description: ask(
                "Enter a brief description",
                DEFAULT_DESCRIPTION,
                self.description,
                self.yes,
            )?,
            project_name: project_name(&path),
        };

        output.info(&format!("Creating {} in {}", vars.project_name, path.display()));
        match &self.template {
            Some(template) => copy_template(template, &path, &vars)?,
            None => scaffold(&path, &vars)?,
        }

        output.success("Project created successfully!");
        output.highlight("Next steps:");
        output.info(&format!("  cd {}", path.display()));
        output.info("  paul serve --watch");
        Ok(())
    }
}

/// Prompt for a value unless it was given or defaults were accepted.
fn ask(prompt: &str, default: &str, given: Option<String>, yes: bool) -> Result<String, CliError> {
    match given {
        Some(value) => Ok(value),
        None if yes => Ok(default.to_owned()),
        None => Ok(Input::<String>::new()
            .with_prompt(prompt)
            .default(default.to_owned())
            .interact_text()?),
    }
}

/// The target may be missing or an empty directory.
fn ensure_empty(path: &Path) -> Result<(), CliError> {
    if !path.exists() {
        return Ok(());
    }
    if !path.is_dir() {
        return Err(CliError::Validation(format!(
            "{} exists and is not a directory",
            path.display()
        )));
    }
    if fs::read_dir(path)?.next().is_some() {
        return Err(CliError::Validation(format!(
            "{} is not empty",
            path.display()
        )));
    }
    Ok(())
}

fn project_name(path: &Path) -> String {
    std::path::absolute(path)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| DEFAULT_PATH.to_owned())
}

/// Write the default project.
fn scaffold(root: &Path, vars: &ProjectVars) -> Result<(), CliError> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    let ctx = context! {
        title => &vars.title,
        description => &vars.description,
        project_name => &vars.project_name,
    };

    for dir in PROJECT_DIRS {
        fs::create_dir_all(root.join(dir))?;
    }
    for file in &SCAFFOLD {
        let content = if file.templated {
            env.render_str(file.source, &ctx)?
        } else {
            file.source.to_owned()
        };
        fs::write(root.join(file.path), content)?;
        tracing::debug!(path = file.path, "Wrote project file");
    }
    Ok(())
}

/// Recursively copy a template directory, substituting the project
/// variables in text files. Binary files are copied unchanged.
fn copy_template(src: &Path, dest: &Path, vars: &ProjectVars) -> Result<(), CliError> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        if name == ".git" {
            continue;
        }
        let from = entry.path();
        let to = dest.join(&name);

        if entry.file_type()?.is_dir() {
            copy_template(&from, &to, vars)?;
            continue;
        }
        let bytes = fs::read(&from)?;
        match String::from_utf8(bytes) {
            Ok(text) => fs::write(&to, substitute(&text, vars))?,
            Err(e) => fs::write(&to, e.into_bytes())?,
        }
        tracing::debug!(path = %to.display(), "Copied template file");
    }
    Ok(())
}

/// Replace `{{ title }}`, `{{ description }}` and `{{ project_name }}`,
/// with or without inner spaces. Anything else in braces is left alone.
fn substitute(text: &str, vars: &ProjectVars) -> String {
    let mut out = text.to_owned();
    for (key, value) in [
        ("title", &vars.title),
        ("description", &vars.description),
        ("project_name", &vars.project_name),
    ] {
        out = out
            .replace(&format!("{{{{ {key} }}}}"), value)
            .replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use paul_config::Config;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::project::Project;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: CreateArgs,
    }

    fn create(args: &[&str]) -> Result<(), CliError> {
        TestCli::parse_from(std::iter::once("create").chain(args.iter().copied()))
            .args
            .execute()
    }

    fn vars() -> ProjectVars {
        ProjectVars {
            title: "Acme".to_owned(),
            description: "Rockets for everyone".to_owned(),
            project_name: "acme-site".to_owned(),
        }
    }

    #[test]
    fn test_scaffold_layout() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path().join("acme-site");

        create(&[root.to_str().unwrap(), "--yes"]).unwrap();

        for dir in PROJECT_DIRS {
            assert!(root.join(dir).is_dir(), "{dir}");
        }
        for file in &SCAFFOLD {
            assert!(root.join(file.path).is_file(), "{}", file.path);
        }
        let readme = fs::read_to_string(root.join("README.md")).unwrap();
        assert!(readme.starts_with(&format!("# {DEFAULT_TITLE}\n")));
        assert!(readme.contains("acme-site/"));
        assert!(readme.ends_with("```\n"));
    }

    #[test]
    fn test_scaffold_renders_as_site() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path().join("acme");

        create(&[
            root.to_str().unwrap(),
            "--title",
            "Acme \"Rockets\" & Co",
            "--description",
            "Fast <b>rockets</b>",
        ])
        .unwrap();

        let project = Project::new(Config::load_project(&root).unwrap()).unwrap();
        let site = project.load_site().unwrap();
        let html = site.render_page("/").unwrap();

        assert_eq!(site.routes(), vec!["/".to_owned()]);
        assert!(html.contains("Acme &quot;Rockets&quot; &amp; Co"));
        assert!(html.contains("Fast &lt;b&gt;rockets&lt;/b&gt;"));
        assert!(html.contains("Why acme?"));
        assert!(html.contains("--primary-color"));
    }

    #[test]
    fn test_refuses_non_empty_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("keep.txt"), "x").unwrap();

        let err = create(&[tmp.path().to_str().unwrap(), "--yes"]).unwrap_err();

        assert!(err.to_string().contains("is not empty"));
        assert!(!tmp.path().join("pages").exists());
    }

    #[test]
    fn test_existing_empty_directory_is_used() {
        let tmp = tempfile::TempDir::new().unwrap();

        create(&[tmp.path().to_str().unwrap(), "--yes"]).unwrap();

        assert!(tmp.path().join("pages/index.toml").is_file());
    }

    #[test]
    fn test_copy_template() {
        let tmp = tempfile::TempDir::new().unwrap();
        let template = tmp.path().join("template");
        fs::create_dir_all(template.join("pages")).unwrap();
        fs::create_dir_all(template.join(".git")).unwrap();
        fs::write(template.join(".git/HEAD"), "ref").unwrap();
        fs::write(
            template.join("pages/index.toml"),
            "title = \"{{ title }}\"\nname = \"{{project_name}}\"\nother = \"{{ other }}\"\n",
        )
        .unwrap();
        fs::write(template.join("logo.bin"), [0xff, 0xfe, 0x00]).unwrap();
        let dest = tmp.path().join("out");

        copy_template(&template, &dest, &vars()).unwrap();

        assert_eq!(
            fs::read_to_string(dest.join("pages/index.toml")).unwrap(),
            "title = \"Acme\"\nname = \"acme-site\"\nother = \"{{ other }}\"\n"
        );
        assert_eq!(fs::read(dest.join("logo.bin")).unwrap(), vec![0xff, 0xfe, 0x00]);
        assert!(!dest.join(".git").exists());
    }

    #[test]
    fn test_missing_template_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("site");
        let missing = tmp.path().join("nope");

        let err = create(&[
            target.to_str().unwrap(),
            "--template",
            missing.to_str().unwrap(),
            "--yes",
        ])
        .unwrap_err();

        assert!(err.to_string().contains("Template directory not found"));
        assert!(!target.exists());
    }

    #[test]
    fn test_substitute() {
        assert_eq!(
            substitute("{{ description }} / {{description}} / {{ title}}", &vars()),
            "Rockets for everyone / Rockets for everyone / {{ title}}"
        );
    }
}
