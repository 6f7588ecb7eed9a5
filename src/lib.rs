//! gettext-extract-plugin
//!
//! Incremental gettext string extraction for module bundlers: translation
//! keys found in loaded modules are merged into an in-memory key table, and
//! PO catalogs and compiled artifacts are only rewritten when something new
//! shows up.

pub mod catalog;
pub mod config;
pub mod extract;
pub mod flush;
pub mod host;
pub mod merge;
pub mod plugin;
pub mod types;

pub use plugin::{
    GettextPlugin,
    ModuleLoader,
    PassReport,
    PluginError,
};
