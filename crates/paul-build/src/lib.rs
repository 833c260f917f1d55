//! Asset build pipeline for paul projects.
//!
//! [`BuildPipeline::run`] turns a source tree into deployable assets:
//!
//! 1. Clean the output directory
//! 2. Walk the source tree, skipping hidden files
//! 3. Transform each file by kind (see [`AssetKind`])
//! 4. Copy the templates directory
//! 5. Write a cleaned `package.json` and copy `README.md`
//! 6. Write content-hashed copies and `manifest.json`
//!
//! Transform results are cached per file, validated by a hash of the
//! source content and build mode.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), paul_build::BuildError> {
//! use paul_build::{BuildOptions, BuildPipeline};
//! use paul_config::BuildMode;
//!
//! let options = BuildOptions {
//!     mode: BuildMode::Production,
//!     ..BuildOptions::new("public", "dist")
//! };
//! let report = BuildPipeline::new(options).run()?;
//! println!("{} files written", report.outputs.len());
//! # Ok(())
//! # }
//! ```

mod asset;
mod manifest;
mod package;
mod pipeline;

use std::path::PathBuf;

use paul_script::ScriptError;
use paul_styles::StyleError;

pub use asset::AssetKind;
pub use manifest::{AssetManifest, MANIFEST_FILENAME, hashed_name};
pub use pipeline::{BuildOptions, BuildPipeline, BuildReport};

/// Error raised by the build pipeline.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to transform {}: {source}", path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: ScriptError,
    },

    #[error("Failed to process {}: {source}", path.display())]
    Style {
        path: PathBuf,
        #[source]
        source: StyleError,
    },

    #[error("Invalid package manifest {}: {message}", path.display())]
    Package { path: PathBuf, message: String },

    #[error("Failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("Refusing to clean {}: it contains {}", output.display(), input.display())]
    UnsafeClean { output: PathBuf, input: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
