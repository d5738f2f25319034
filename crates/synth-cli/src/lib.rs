//! synth-attrib - command-line front end
//!
//! Wires the attribution library and the post-processing orchestrator to
//! files on disk:
//! - `validate`: report attribution defects, non-zero exit when invalid
//! - `breakdown`: print the generated appendix
//! - `process`: full pipeline with an optional shell-command repair capability
//! - `rules`: print the instruction block for upstream synthesis prompts

#![warn(missing_docs)]

pub mod app;
pub mod command;
pub mod logging;
pub mod sources;

pub use app::{cli, run, EXIT_INVALID, EXIT_OK};
pub use command::CommandGenerator;
pub use logging::init_tracing;
pub use sources::SourcesFile;
