use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use skein_grammar::CompileOptions;

/// Driver settings: built-in defaults, then `skein.toml` (or the file named
/// on the command line), then `SKEIN_*` environment variables, then flags.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Label of the entry node.
    pub start: String,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Fail when the script produced any diagnostic.
    pub deny_diagnostics: bool,
    pub pretty: bool,
}

impl Settings {
    pub fn load(
        file: Option<&Path>,
        start: Option<String>,
        pretty: bool,
    ) -> Result<Self, ConfigError> {
        let file = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name("skein").required(false),
        };
        Config::builder()
            .set_default("start", "start")?
            .set_default("log_level", "warn")?
            .set_default("deny_diagnostics", false)?
            .set_default("pretty", false)?
            .add_source(file)
            .add_source(Environment::with_prefix("SKEIN"))
            .set_override_option("start", start)?
            .set_override_option("pretty", pretty.then_some(true))?
            .build()?
            .try_deserialize()
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            start: self.start.clone(),
        }
    }
}
