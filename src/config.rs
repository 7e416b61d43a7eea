//! Configuration file entry point.
//!
//! The sender and its parameters live in the `[knockknock]` section of an INI
//! file (`./knockknock.ini` by default) or of a TOML file. Environment
//! variables prefixed with `KNOCKKNOCK_` override keys of that section, e.g.
//! `KNOCKKNOCK_WEBHOOK_URL`.

use crate::core::Backend;
use crate::error::KnockError;
use crate::notifier::{Notifier, ProcessRole};
use crate::registry::{self, BackendParams};
use figment::{
    providers::{Env, Format, Toml},
    value::{Dict, Map, Tag, Value},
    Error, Figment, Metadata, Profile, Provider, Source,
};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "./knockknock.ini";
pub const SECTION: &str = "knockknock";
pub const ENV_PREFIX: &str = "KNOCKKNOCK_";

/// The sender selected by a configuration source, with its raw parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    pub sender: String,
    /// Whether notifications are enabled at all.
    pub notification: bool,
    pub params: BackendParams,
}

impl SenderConfig {
    /// Reads the `[knockknock]` section from `path`, overlaid with the environment.
    ///
    /// Returns `None` when the file or the section does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>, KnockError> {
        let path = path.as_ref();
        if !path.is_file() {
            warn!(path = %path.display(), "Config file not found, running without notifications");
            return Ok(None);
        }
        let file = file_figment(path);
        file.data()?;
        if !file.contains(SECTION) {
            warn!(path = %path.display(), section = SECTION, "Config section not found, running without notifications");
            return Ok(None);
        }
        Self::from_figment(&file.merge(EnvOverlay))
    }

    /// Extracts the `[knockknock]` section from any figment.
    pub fn from_figment(figment: &Figment) -> Result<Option<Self>, KnockError> {
        figment.data()?;
        if !figment.contains(SECTION) {
            return Ok(None);
        }
        let mut section: BTreeMap<String, Value> = figment.extract_inner(SECTION)?;

        let sender = section
            .remove("sender")
            .map(|value| stringify(&value))
            .filter(|sender| !sender.trim().is_empty())
            .ok_or(KnockError::MissingParameter {
                backend: SECTION,
                key: "sender",
            })?;
        let notification = match section.remove("notification") {
            Some(value) => parse_bool(&stringify(&value))?,
            None => true,
        };
        let params = section
            .iter()
            .map(|(key, value)| (key.clone(), stringify(value)))
            .collect();

        Ok(Some(Self {
            sender: sender.trim().to_string(),
            notification,
            params,
        }))
    }

    /// Builds the notifier for this configuration.
    ///
    /// The sender name is checked even when notifications are disabled.
    pub fn into_notifier(self, role: ProcessRole) -> Result<Option<Notifier>, KnockError> {
        if !registry::is_known(&self.sender) {
            return Err(registry::unknown_backend(&self.sender));
        }
        if !self.notification {
            info!(sender = %self.sender, "Notifications disabled by configuration");
            return Ok(None);
        }
        let backend: Box<dyn Backend> = registry::resolve(&self.sender, &self.params)?;
        debug!(sender = %self.sender, params = ?self.params.keys().collect::<Vec<_>>(), "Resolved sender");
        Ok(Some(Notifier::with_role(backend, role)))
    }
}

fn file_figment(path: &Path) -> Figment {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Figment::from(Toml::file(path)),
        _ => Figment::from(IniFile::new(path)),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(_, s) => s.clone(),
        other => serde_json::to_value(other)
            .map(|json| json.to_string())
            .unwrap_or_default(),
    }
}

fn parse_bool(raw: &str) -> Result<bool, KnockError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(KnockError::InvalidParameter {
            backend: SECTION,
            key: "notification",
            reason: format!("`{}` is not a boolean", other),
        }),
    }
}

/// A figment provider for INI files.
///
/// Sections become top-level dictionaries. Keys are lowercased and values are
/// kept as strings. Lines starting with `#` or `;` are comments. A missing
/// file provides no data.
#[derive(Debug, Clone)]
pub struct IniFile {
    path: PathBuf,
}

impl IniFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(&self, source: &str) -> Result<Dict, Error> {
        let mut root = Dict::new();
        let mut current: Option<String> = None;

        for (number, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let name = name.trim().to_string();
                root.entry(name.clone())
                    .or_insert_with(|| Value::Dict(Tag::Default, Dict::new()));
                current = Some(name);
                continue;
            }

            let Some((key, value)) = line.split_once(['=', ':']) else {
                return Err(self.syntax_error(number, "expected `key = value`"));
            };
            let Some(section) = &current else {
                return Err(self.syntax_error(number, "key outside of any section"));
            };
            if let Some(Value::Dict(_, dict)) = root.get_mut(section) {
                dict.insert(
                    key.trim().to_ascii_lowercase(),
                    Value::from(value.trim().to_string()),
                );
            }
        }
        Ok(root)
    }

    fn syntax_error(&self, number: usize, reason: &str) -> Error {
        Error::from(format!(
            "{}:{}: {}",
            self.path.display(),
            number + 1,
            reason
        ))
    }
}

impl Provider for IniFile {
    fn metadata(&self) -> Metadata {
        Metadata::named("INI file").source(Source::File(self.path.clone()))
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let source = match std::fs::read_to_string(&self.path) {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(Error::from(format!("{}: {}", self.path.display(), e))),
        };
        let mut map = Map::new();
        map.insert(Profile::Default, self.parse(&source)?);
        Ok(map)
    }
}

/// `KNOCKKNOCK_*` variables as string keys of the `[knockknock]` section.
///
/// Values are not type-guessed, so `+15551234567` or `007` survive verbatim.
struct EnvOverlay;

impl Provider for EnvOverlay {
    fn metadata(&self) -> Metadata {
        Metadata::named(format!("`{}` environment variables", ENV_PREFIX))
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let section: Dict = Env::prefixed(ENV_PREFIX)
            .iter()
            .map(|(key, value)| (key.as_str().to_ascii_lowercase(), Value::from(value)))
            .collect();
        let mut dict = Dict::new();
        if !section.is_empty() {
            dict.insert(SECTION.to_string(), Value::Dict(Tag::Default, section));
        }
        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}

/// Wraps work using the sender named in a configuration file.
///
/// When the file is missing, has no `[knockknock]` section, or disables
/// notifications, work runs unchanged and nothing is sent.
pub struct ConfiguredNotifier {
    notifier: Option<Notifier>,
}

impl ConfiguredNotifier {
    /// Loads `./knockknock.ini`.
    pub fn from_default_file() -> Result<Self, KnockError> {
        Self::from_file(DEFAULT_CONFIG_FILE)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KnockError> {
        Self::from_file_with_role(path, ProcessRole::detect())
    }

    pub fn from_file_with_role(path: impl AsRef<Path>, role: ProcessRole) -> Result<Self, KnockError> {
        let notifier = match SenderConfig::load(path)? {
            Some(config) => config.into_notifier(role)?,
            None => None,
        };
        Ok(Self { notifier })
    }

    pub fn is_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    /// See [`Notifier::run`].
    pub fn run<T, E, F>(&self, call: &str, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        T: fmt::Debug,
        E: fmt::Display + fmt::Debug,
    {
        match &self.notifier {
            Some(notifier) => notifier.run(call, work),
            None => work(),
        }
    }

    /// See [`Notifier::call`].
    pub fn call<T, F>(&self, call: &str, work: F) -> T
    where
        F: FnOnce() -> T,
        T: fmt::Debug,
    {
        match self.run::<T, Infallible, _>(call, || Ok(work())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }
}
