//! `paul add` command implementation.

use std::path::PathBuf;

use clap::Args;
use paul_components::{ComponentRegistry, builtins, merge_props};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the add command.
#[derive(Args)]
pub(crate) struct AddArgs {
    /// Built-in component to add (hero, cta or footer).
    component: String,

    /// Directory to write into.
    #[arg(short, long, default_value = "components")]
    output: PathBuf,

    /// Write the JSX component instead of HTML markup.
    #[arg(long)]
    jsx: bool,

    /// Overwrite an existing file.
    #[arg(short, long)]
    force: bool,
}

impl AddArgs {
    /// Execute the add command.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown components, existing files (without
    /// `--force`) or write failures.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let name = self.component.as_str();

        let registry = ComponentRegistry::with_builtins()?;
        let component = registry.builtin(name).ok_or_else(|| {
            CliError::Validation(format!(
                "Unknown component \"{name}\" (available: {})",
                builtins::NAMES.join(", ")
            ))
        })?;
        let props = merge_props(component.default_props(), None);

        let (file_name, content) = if self.jsx {
            let source = component.alt_render(&props).ok_or_else(|| {
                CliError::Validation(format!("Component \"{name}\" has no JSX version"))
            })??;
            (format!("{name}.jsx"), source)
        } else {
            let mut markup = String::new();
            if let Some(css) = component.styles(&props)? {
                markup.push_str("<style>\n");
                markup.push_str(css.trim_end());
                markup.push_str("\n</style>\n");
            }
            markup.push_str(component.render(&props)?.trim_end());
            markup.push('\n');
            (format!("{name}.html"), markup)
        };

        let path = self.output.join(file_name);
        if path.exists() && !self.force {
            return Err(CliError::Validation(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        std::fs::create_dir_all(&self.output)?;
        std::fs::write(&path, content)?;
        tracing::info!(path = %path.display(), component = name, "Added component");

        output.success(&format!("Added {}", path.display()));
        if !self.jsx {
            output.info(&format!(
                "Use it from pages/index.toml:\n\n  [components.my-{name}]\n  template = \"{}\"",
                path.display()
            ));
        }
        Ok(())
    }
}
