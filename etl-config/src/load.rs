use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Supported extensions for configuration files.
const CONFIG_FILE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Prefix for environment variable configuration overrides.
const ENV_PREFIX: &str = "APP";

/// Separator between environment variable prefix and key segments.
const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested configuration keys in environment variables.
const ENV_SEPARATOR: &str = "__";

/// Separator for list elements in environment variables.
const LIST_SEPARATOR: &str = ",";

/// Trait implemented by configuration structures that require list parsing help.
pub trait Config {
    /// Keys whose values should be parsed as lists when loading the configuration.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

/// Errors that can occur while loading configuration files and overrides.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    /// The configuration file does not exist.
    #[error("configuration file `{0}` does not exist")]
    ConfigurationFileMissing(PathBuf),

    /// The configuration file has an extension no format is registered for.
    #[error("configuration file `{path}` has an unsupported extension; expected one of: {expected}")]
    UnsupportedExtension { path: PathBuf, expected: String },

    /// The configuration file existed but could not be parsed.
    #[error("failed to load configuration from `{path}`: {source}")]
    ConfigurationFileLoad {
        path: PathBuf,
        source: config::ConfigError,
    },

    /// Environment variable overrides failed to merge into the configuration.
    #[error("failed to load configuration from environment variables: {0}")]
    EnvironmentVariables(#[source] config::ConfigError),

    /// The configuration was parsed but deserialization failed.
    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] config::ConfigError),
}

/// Loads configuration from a single file and environment-variable overrides.
///
/// The file format is inferred from its extension (`yaml`, `yml` or `json`). Values from
/// `APP_`-prefixed environment variables are applied on top of the file. Nested keys use double
/// underscores (`APP_PIPELINE__MAX_WORKERS`), and list values are comma-separated.
pub fn load_config_from_path<T>(path: &Path) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    if !path.is_file() {
        return Err(LoadConfigError::ConfigurationFileMissing(
            path.to_path_buf(),
        ));
    }

    let has_supported_extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| CONFIG_FILE_EXTENSIONS.contains(&extension));
    if !has_supported_extension {
        return Err(LoadConfigError::UnsupportedExtension {
            path: path.to_path_buf(),
            expected: CONFIG_FILE_EXTENSIONS.join(", "),
        });
    }

    let file_source = config::File::from(path.to_path_buf());

    let builder = config::Config::builder().add_source(file_source);
    builder
        .clone()
        .build()
        .map_err(|source| LoadConfigError::ConfigurationFileLoad {
            path: path.to_path_buf(),
            source,
        })?;

    let settings = builder
        .add_source(environment_source::<T>())
        .build()
        .map_err(LoadConfigError::EnvironmentVariables)?;

    settings
        .try_deserialize::<T>()
        .map_err(LoadConfigError::Deserialization)
}

/// Builds the `APP_`-prefixed environment source for `T`.
fn environment_source<T>() -> config::Environment
where
    T: Config,
{
    let mut environment_source = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true);

    if !T::LIST_PARSE_KEYS.is_empty() {
        environment_source = environment_source.list_separator(LIST_SEPARATOR);

        for key in <T as Config>::LIST_PARSE_KEYS {
            environment_source = environment_source.with_list_parse_key(key);
        }
    }

    environment_source
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;
    use tempfile::Builder;

    #[derive(Debug, Deserialize)]
    struct LoaderSettings {
        name: String,
        loader_nested: LoaderNested,
    }

    #[derive(Debug, Deserialize)]
    struct LoaderNested {
        size: u32,
    }

    impl Config for LoaderSettings {
        const LIST_PARSE_KEYS: &'static [&'static str] = &[];
    }

    fn write_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_yaml_file() {
        let file = write_file(".yaml", "name: yaml\nloader_nested:\n  size: 3\n");

        let settings: LoaderSettings = load_config_from_path(file.path()).unwrap();

        assert_eq!(settings.name, "yaml");
        assert_eq!(settings.loader_nested.size, 3);
    }

    #[test]
    fn loads_json_file() {
        let file = write_file(".json", r#"{"name":"json","loader_nested":{"size":5}}"#);

        let settings: LoaderSettings = load_config_from_path(file.path()).unwrap();

        assert_eq!(settings.name, "json");
    }

    #[test]
    fn environment_overrides_file_values() {
        let file = write_file(".yaml", "name: base\nloader_nested:\n  size: 3\n");

        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var("APP_LOADER_NESTED__SIZE", "42") };
        let settings: Result<LoaderSettings, _> = load_config_from_path(file.path());
        // SAFETY: see above.
        unsafe { std::env::remove_var("APP_LOADER_NESTED__SIZE") };

        assert_eq!(settings.unwrap().loader_nested.size, 42);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_config_from_path::<LoaderSettings>(Path::new("/definitely/missing.yaml"))
            .unwrap_err();

        assert!(matches!(err, LoadConfigError::ConfigurationFileMissing(_)));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let file = write_file(".txt", "name: text");

        let err = load_config_from_path::<LoaderSettings>(file.path()).unwrap_err();

        assert!(matches!(err, LoadConfigError::UnsupportedExtension { .. }));
    }

    #[test]
    fn invalid_contents_fail_to_load() {
        let file = write_file(".json", "{ not json");

        let err = load_config_from_path::<LoaderSettings>(file.path()).unwrap_err();

        assert!(matches!(err, LoadConfigError::ConfigurationFileLoad { .. }));
    }
}
