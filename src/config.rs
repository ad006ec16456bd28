use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Endpoint returning the JSON reading array, e.g. "http://youless/e"
    #[serde(default = "default_device_url")]
    pub url: String,
    /// Request timeout; the HTTP client default applies when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_device_url() -> String {
    "http://youless/e".into()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            url: default_device_url(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Prefix for every exported metric name ("youless" -> "youless_pwr_current")
    #[serde(default)]
    pub namespace: Option<String>,
}

impl Config {
    /// Load YAML from disk, substitute $(VAR)/${VAR} with env vars, then parse and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let expanded = expand_env_placeholders(&raw)?;
        let config: Self = serde_yaml::from_str(&expanded)?;

        config.validate()?;
        Ok(config)
    }

    /// Build the configuration from the process environment.
    ///
    /// `APP_CONFIG` optionally names a YAML file; without it the defaults are
    /// used. `DEVICE_URL`, `SERVER_HOST` and `SERVER_PORT` override whatever
    /// the file says.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var("APP_CONFIG") {
            Ok(path) => {
                tracing::info!("Loading configuration from: {}", path);
                Self::load(&path)?
            }
            Err(_) => Self::default(),
        };

        if let Ok(url) = env::var("DEVICE_URL") {
            config.device.url = url;
        }

        if let Ok(host) = env::var("SERVER_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = env::var("SERVER_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid SERVER_PORT: {}", port)))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn validate(&self) -> Result<()> {
        if self.device.url.is_empty() {
            return Err(AppError::Config("Device url cannot be empty".to_string()));
        }

        let url = reqwest::Url::parse(&self.device.url).map_err(|e| {
            AppError::Config(format!("Invalid device url {}: {}", self.device.url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "Device url must use http or https, got {}",
                url.scheme()
            )));
        }

        if self.device.timeout_secs == Some(0) {
            return Err(AppError::Config(
                "Device timeout_secs cannot be 0".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(AppError::Config("Server port cannot be 0".to_string()));
        }

        Ok(())
    }
}

/// Expand $(VAR) and ${VAR} placeholders using environment variables.
/// "$$" is an escaped literal "$"; any other "$" is kept as-is.
fn expand_env_placeholders(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut it = input.chars().peekable();

    while let Some(c) = it.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let close = match it.peek().copied() {
            Some('$') => {
                it.next();
                out.push('$');
                continue;
            }
            Some('(') => ')',
            Some('{') => '}',
            _ => {
                out.push('$');
                continue;
            }
        };

        it.next();
        let var = read_until(&mut it, close).ok_or_else(|| {
            AppError::Config(format!(
                "unterminated env placeholder: missing '{}'",
                close
            ))
        })?;
        let val = env::var(&var)
            .map_err(|_| AppError::Config(format!("missing environment variable: {}", var)))?;
        out.push_str(&val);
    }

    Ok(out)
}

/// Read characters until `end`, consuming the delimiter.
fn read_until<I>(it: &mut std::iter::Peekable<I>, end: char) -> Option<String>
where
    I: Iterator<Item = char>,
{
    let mut buf = String::new();
    for ch in it.by_ref() {
        if ch == end {
            return Some(buf);
        }
        buf.push(ch);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn write_config(content: &str) -> std::path::PathBuf {
        let path = env::temp_dir().join(format!(
            "youless-exporter-{}-{}.yaml",
            std::process::id(),
            content.len()
        ));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.device.url, "http://youless/e");
        assert_eq!(config.device.timeout_secs, None);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.metrics.namespace, None);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("server:\n  port: 9100\n").unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.device.url, "http://youless/e");
    }

    #[test]
    #[serial]
    fn test_load_expands_placeholders() {
        env::set_var("YOULESS_TEST_HOST", "192.168.1.40");
        let path = write_config(
            "device:\n  url: http://$(YOULESS_TEST_HOST)/e\n  timeout_secs: 5\nmetrics:\n  namespace: youless\n",
        );

        let config = Config::load(&path).unwrap();

        assert_eq!(config.device.url, "http://192.168.1.40/e");
        assert_eq!(config.device.timeout_secs, Some(5));
        assert_eq!(config.metrics.namespace.as_deref(), Some("youless"));

        fs::remove_file(path).unwrap();
        env::remove_var("YOULESS_TEST_HOST");
    }

    #[test]
    fn test_load_example_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/config.example.yaml");

        let config = Config::load(path).unwrap();

        assert_eq!(config.device.url, "http://youless/e");
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.metrics.namespace.as_deref(), Some("youless"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/youless.yaml");
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    #[serial]
    fn test_expand_env_placeholders() {
        env::set_var("YOULESS_TEST_VAR", "value");

        assert_eq!(
            expand_env_placeholders("a: $(YOULESS_TEST_VAR) b: ${YOULESS_TEST_VAR}").unwrap(),
            "a: value b: value"
        );
        assert_eq!(expand_env_placeholders("cost: $$5").unwrap(), "cost: $5");
        assert_eq!(expand_env_placeholders("plain $ sign").unwrap(), "plain $ sign");

        env::remove_var("YOULESS_TEST_VAR");
    }

    #[test]
    fn test_expand_env_placeholders_errors() {
        assert!(expand_env_placeholders("$(YOULESS_UNTERMINATED").is_err());
        assert!(expand_env_placeholders("$(YOULESS_DEFINITELY_NOT_SET)").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.device.url = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.device.url = "ftp://youless/e".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.device.url = "not a url".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.device.timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        env::remove_var("APP_CONFIG");
        env::set_var("DEVICE_URL", "http://10.0.0.7/e");
        env::set_var("SERVER_PORT", "9898");

        let config = Config::from_env().unwrap();
        assert_eq!(config.device.url, "http://10.0.0.7/e");
        assert_eq!(config.server.port, 9898);

        env::set_var("SERVER_PORT", "not-a-port");
        assert!(matches!(Config::from_env(), Err(AppError::Config(_))));

        env::remove_var("DEVICE_URL");
        env::remove_var("SERVER_PORT");
    }
}
