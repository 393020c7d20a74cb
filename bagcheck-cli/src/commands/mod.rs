//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Module containing the implementation of the `validate` command.
/// This command checks bag integrity, derivatives and sidecar metadata, and
/// repairs control files on request.
pub mod validate;
