use std::{
    collections::BTreeMap,
    env,
    fs::File,
    io,
    path::{Path, PathBuf},
    time,
};

use serde::Deserialize;
use tracing::debug;

use crate::API_ROOT;

const DEFAULT_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// An error encountered while loading or resolving a configuration profile.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The config file could not be read.
    #[error("Failed to load config file")]
    Io(#[from] io::Error),
    /// The config file is not valid YAML, or has the wrong shape.
    #[error("Invalid configuration")]
    Invalid(#[from] serde_yaml::Error),
    /// The requested profile is not in the config file.
    #[error("Profile '{0}' not found")]
    ProfileNotFound(String),
    /// The access token is not ASCII.
    #[error("Access token contains invalid characters")]
    InvalidAccessToken,
    /// No access token in the profile or the environment.
    #[error("No access token found")]
    NoAccessToken,
    /// No base in the profile or the environment.
    #[error("No base found")]
    NoBase,
    /// `AIRTABLE_TIMEOUT` is not a number of seconds.
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
}

/// A fully resolved configuration profile for talking to one Airtable base.
#[derive(Clone)]
pub struct Profile {
    /// The name of the profile.
    pub name: String,
    /// The personal access token used for authentication.
    pub access_token: String,
    /// The ID of the base, e.g. `appXXXXXXXXXXXXXX`.
    pub base: String,
    /// The timeout applied to every request. `None` disables it.
    pub timeout: Option<time::Duration>,
    /// The root of the REST API. Intended for testing.
    pub api_root: String,
    /// The user-agent used on requests.
    pub user_agent: String,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("access_token", &"********")
            .field("base", &self.base)
            .field("timeout", &self.timeout)
            .field("api_root", &self.api_root)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// A profile stored in the config file.
#[derive(Debug, Default, Clone, Deserialize)]
struct ConfigProfile {
    access_token: Option<String>,
    base: Option<String>,
    /// In seconds. 0 disables the timeout.
    timeout: Option<u64>,
    api_root: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct Config {
    profiles: BTreeMap<String, ConfigProfile>,
}

impl Profile {
    /// A profile for the given token and base, with the default 10 second
    /// timeout.
    pub fn new(access_token: &str, base: &str) -> Self {
        Self {
            name: "default".to_owned(),
            access_token: access_token.to_owned(),
            base: base.to_owned(),
            timeout: Some(DEFAULT_TIMEOUT),
            api_root: API_ROOT.to_owned(),
            user_agent: make_ua(None),
        }
    }

    /// Sets the request timeout. `None` disables it.
    pub fn with_timeout(self, timeout: Option<time::Duration>) -> Self {
        Self { timeout, ..self }
    }

    /// Points the profile at a different API root, e.g. a local test
    /// server.
    pub fn with_api_root(self, api_root: &str) -> Self {
        Self {
            api_root: api_root.trim_end_matches('/').to_owned(),
            ..self
        }
    }

    /// Modifies the user-agent to have a different prefix.
    pub fn with_ua_product(self, ua_product: &str) -> Self {
        Self {
            user_agent: make_ua(Some(ua_product)),
            ..self
        }
    }

    /// Load a profile from the configuration file (usually
    /// ~/.config/airtable.yaml) and the environment.
    ///
    /// If `AIRTABLE_PROFILE` is set, that will be used to select the profile.
    /// Otherwise the profile `default` will be used.
    pub fn from_default_env() -> Result<Self, Error> {
        if let Ok(s) = env::var("AIRTABLE_PROFILE") {
            Self::from_env(&s)
        } else {
            Self::from_env("default")
        }
    }

    /// Load the given profile from the configuration file (usually
    /// ~/.config/airtable.yaml). If no configuration file is present, then
    /// the configuration will be loaded solely from the environment.
    ///
    /// The following environment variables override the corresponding
    /// values in the config file:
    ///
    /// | Environment Variable    | Config Value   |
    /// |-------------------------|----------------|
    /// | `AIRTABLE_ACCESS_TOKEN` | `access_token` |
    /// | `AIRTABLE_BASE`         | `base`         |
    /// | `AIRTABLE_TIMEOUT`      | `timeout`      |
    /// | `AIRTABLE_API_ROOT`     | `api_root`     |
    pub fn from_env(name: &str) -> Result<Self, Error> {
        let config_path = find_config()?;
        let mut profile = match read_profile(&config_path, name) {
            Ok(p) => p,
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config file found");
                Default::default()
            }
            Err(e) => return Err(e),
        };

        if let Ok(token) = env::var("AIRTABLE_ACCESS_TOKEN") {
            profile.access_token = Some(token);
        }

        if let Ok(base) = env::var("AIRTABLE_BASE") {
            profile.base = Some(base);
        }

        if let Ok(timeout) = env::var("AIRTABLE_TIMEOUT") {
            let secs = timeout
                .parse()
                .map_err(|_| Error::InvalidTimeout(timeout.clone()))?;
            profile.timeout = Some(secs);
        }

        if let Ok(root) = env::var("AIRTABLE_API_ROOT") {
            profile.api_root = Some(root);
        }

        Self::from_raw(profile, name.to_owned())
    }

    /// Load the given profile (or 'default') from the given file, which must
    /// be a valid configuration file. Does not read any environment
    /// variables.
    pub fn read(path: impl AsRef<Path>, name: Option<&str>) -> Result<Self, Error> {
        let path = path.as_ref();
        let name = name.unwrap_or("default").to_owned();
        let profile = read_profile(path, &name)?;
        Self::from_raw(profile, name)
    }

    fn from_raw(raw: ConfigProfile, name: String) -> Result<Self, Error> {
        let ConfigProfile {
            access_token,
            base,
            timeout,
            api_root,
        } = raw;

        let access_token = access_token.ok_or(Error::NoAccessToken)?;
        if !access_token.is_ascii() {
            return Err(Error::InvalidAccessToken);
        }

        let base = base.ok_or(Error::NoBase)?;
        let timeout = match timeout {
            Some(0) => None,
            Some(secs) => Some(time::Duration::from_secs(secs)),
            None => Some(DEFAULT_TIMEOUT),
        };

        let profile = Self::new(&access_token, &base).with_timeout(timeout);
        let profile = match api_root {
            Some(root) => profile.with_api_root(&root),
            None => profile,
        };

        Ok(Self { name, ..profile })
    }
}

fn find_config() -> Result<PathBuf, Error> {
    let Some(home) = env::home_dir() else {
        return Err(Error::Io(io::Error::other(
            "No $HOME found for the current user",
        )));
    };

    let canonical = home.join(".config/airtable.yaml");
    if canonical.exists() {
        return Ok(canonical);
    }

    // Try some fallback paths, and if that doesn't work, return the error from
    // the canonical location.
    for fallback in [".config/airtable.yml", ".airtable/config.yaml"] {
        let path = home.join(fallback);
        if path.exists() {
            return Ok(path);
        }
    }

    Ok(canonical)
}

fn read_profile(p: &Path, name: &str) -> Result<ConfigProfile, Error> {
    let file = File::open(p)?;
    let mut config: Config = serde_yaml::from_reader(file).map_err(Error::Invalid)?;
    let Some(config_profile) = config.profiles.remove(name) else {
        return Err(Error::ProfileNotFound(name.to_string()));
    };

    debug!(path = %p.display(), "loaded config file");

    Ok(config_profile)
}

fn make_ua(product: Option<&str>) -> String {
    format!(
        "{}/{}",
        product.unwrap_or("airtable-rs"),
        env!("CARGO_PKG_VERSION")
    )
}
