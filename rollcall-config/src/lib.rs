#![forbid(unsafe_code)]
// Rustc lint groups
#![warn(future_incompatible)]
#![warn(rust_2018_idioms)]
#![warn(unused)]
// Rustc lints
#![warn(noop_method_call)]
#![warn(single_use_lifetimes)]
// Clippy lints
#![warn(clippy::use_self)]

mod api;
pub mod doc;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{fs, io};

use doc::Document;
use serde::Deserialize;

pub use crate::api::*;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config file")]
    Io(#[from] io::Error),
    #[error("failed to parse config file")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Default, Deserialize, Document)]
pub struct Config {
    /// The directory that rollcall stores its data in when not running in
    /// ephemeral mode. This is where the current login session and the
    /// server's cookies are kept between runs.
    ///
    /// Relative paths are interpreted relative to the user's home directory.
    ///
    /// See also the `--data-dir` command line option.
    #[document(default = "platform-dependent")]
    pub data_dir: Option<PathBuf>,

    /// Whether to start in ephemeral mode.
    ///
    /// In ephemeral mode, rollcall doesn't store any data. Logging in only
    /// lasts until the client exits.
    ///
    /// See also the `--ephemeral` command line option.
    #[serde(default)]
    pub ephemeral: bool,

    /// Time zone that event dates are entered and displayed in.
    ///
    /// This option is interpreted as a POSIX TZ string. On a normal system,
    /// the string `"localtime"` as well as any value from the "TZ identifier"
    /// column of the following wikipedia article should be valid:
    /// <https://en.wikipedia.org/wiki/List_of_tz_database_time_zones>
    ///
    /// If the `TZ` environment variable exists, it overrides this option. If
    /// neither exist, rollcall uses the system's local time zone.
    #[serde(default)]
    #[document(default = "`$TZ` or local system time zone")]
    pub time_zone: Option<String>,

    #[serde(default)]
    #[document(no_default)]
    pub api: Api,
}

impl Config {
    pub fn time_zone_ref(&self) -> Option<&str> {
        self.time_zone.as_deref()
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        Ok(match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Self::default(),
            Err(err) => Err(err)?,
        })
    }
}
