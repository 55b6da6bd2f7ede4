//! Environment variable layer.
//!
//! Every canonical key maps to `POCLI_<KEY>` in upper case. Empty values are
//! treated as unset.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use crate::defaults::ENV_PREFIX;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{AuthMethod, ConfigLayer};

/// Build a layer from a snapshot of the process environment.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnv`] when a prefixed variable holds a value
/// that cannot be parsed for its key.
pub fn layer_from_env(env: &HashMap<String, String>) -> ConfigResult<ConfigLayer> {
    let lookup = EnvLookup { env };
    Ok(ConfigLayer {
        host: lookup.string("host"),
        port: lookup.parsed::<u16>("port", "expected a port number between 1 and 65535")?,
        auth: lookup.auth()?,
        client_id: lookup.verbatim("client_id"),
        client_secret: lookup.verbatim("client_secret"),
        token_url: lookup.verbatim("token_url"),
        username: lookup.verbatim("username"),
        password: lookup.verbatim("password"),
        insecure: lookup.flag("insecure")?,
        tls: lookup.flag("tls")?,
        ca_cert: lookup.paths("ca_cert"),
        timeout: lookup.parsed::<u64>("timeout", "expected a number of seconds")?,
    })
}

/// Name of the environment variable backing a canonical key.
#[must_use]
pub fn variable_name(key: &str) -> String {
    format!("{ENV_PREFIX}{}", key.to_ascii_uppercase())
}

struct EnvLookup<'a> {
    env: &'a HashMap<String, String>,
}

impl EnvLookup<'_> {
    /// Untrimmed value; blank values count as unset.
    fn raw(&self, key: &str) -> Option<(String, &str)> {
        let variable = variable_name(key);
        let value = self.env.get(&variable)?.as_str();
        if value.trim().is_empty() {
            None
        } else {
            Some((variable, value))
        }
    }

    fn string(&self, key: &str) -> Option<String> {
        self.raw(key).map(|(_, value)| value.trim().to_string())
    }

    /// Credentials are passed through exactly as set.
    fn verbatim(&self, key: &str) -> Option<String> {
        self.raw(key).map(|(_, value)| value.to_string())
    }

    fn parsed<T: FromStr>(&self, key: &str, reason: &str) -> ConfigResult<Option<T>> {
        self.raw(key)
            .map(|(variable, value)| {
                value.trim().parse::<T>().map_err(|_| invalid(variable, value, reason))
            })
            .transpose()
    }

    fn auth(&self) -> ConfigResult<Option<AuthMethod>> {
        self.raw("auth")
            .map(|(variable, value)| {
                value
                    .parse::<AuthMethod>()
                    .map_err(|err| invalid(variable, value, &err.to_string()))
            })
            .transpose()
    }

    fn flag(&self, key: &str) -> ConfigResult<Option<bool>> {
        self.raw(key)
            .map(|(variable, value)| {
                parse_bool(value.trim()).ok_or_else(|| invalid(variable, value, "expected a boolean"))
            })
            .transpose()
    }

    fn paths(&self, key: &str) -> Option<Vec<PathBuf>> {
        self.raw(key).map(|(_, value)| {
            value
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(PathBuf::from)
                .collect()
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(variable: String, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidEnv {
        variable,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn variable_names_use_prefix_and_upper_case() {
        assert_eq!(variable_name("client_id"), "POCLI_CLIENT_ID");
        assert_eq!(variable_name("ca_cert"), "POCLI_CA_CERT");
    }

    #[test]
    fn reads_every_key() -> ConfigResult<()> {
        let layer = layer_from_env(&env(&[
            ("POCLI_HOST", "veraison.example"),
            ("POCLI_PORT", "8443"),
            ("POCLI_AUTH", "oauth2"),
            ("POCLI_CLIENT_ID", "cli"),
            ("POCLI_CLIENT_SECRET", "secret"),
            ("POCLI_TOKEN_URL", "https://kc/token"),
            ("POCLI_USERNAME", "alice"),
            ("POCLI_PASSWORD", "pw"),
            ("POCLI_INSECURE", "no"),
            ("POCLI_TLS", "TRUE"),
            ("POCLI_CA_CERT", "/a.pem, /b.pem,"),
            ("POCLI_TIMEOUT", "30"),
        ]))?;

        assert_eq!(layer.host.as_deref(), Some("veraison.example"));
        assert_eq!(layer.port, Some(8443));
        assert_eq!(layer.auth, Some(AuthMethod::OAuth2));
        assert_eq!(layer.client_id.as_deref(), Some("cli"));
        assert_eq!(layer.token_url.as_deref(), Some("https://kc/token"));
        assert_eq!(layer.insecure, Some(false));
        assert_eq!(layer.tls, Some(true));
        assert_eq!(
            layer.ca_cert,
            Some(vec![PathBuf::from("/a.pem"), PathBuf::from("/b.pem")])
        );
        assert_eq!(layer.timeout, Some(30));
        Ok(())
    }

    #[test]
    fn ignores_unprefixed_and_empty_variables() -> ConfigResult<()> {
        let layer = layer_from_env(&env(&[("HOST", "nope"), ("POCLI_USERNAME", "  ")]))?;
        assert_eq!(layer, ConfigLayer::default());
        Ok(())
    }

    #[test]
    fn credentials_keep_surrounding_whitespace() -> ConfigResult<()> {
        let layer = layer_from_env(&env(&[
            ("POCLI_PASSWORD", " pw "),
            ("POCLI_CLIENT_SECRET", "secret\t"),
            ("POCLI_HOST", " veraison.example "),
        ]))?;
        assert_eq!(layer.password.as_deref(), Some(" pw "));
        assert_eq!(layer.client_secret.as_deref(), Some("secret\t"));
        assert_eq!(layer.host.as_deref(), Some("veraison.example"));
        Ok(())
    }

    #[test]
    fn rejects_unparsable_values() {
        let err = layer_from_env(&env(&[("POCLI_PORT", "99999")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv { ref variable, .. } if variable == "POCLI_PORT"
        ));

        let err = layer_from_env(&env(&[("POCLI_TLS", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("POCLI_TLS"));

        let err = layer_from_env(&env(&[("POCLI_AUTH", "ntlm")])).unwrap_err();
        assert!(err.to_string().contains("unknown auth method"));
    }
}
