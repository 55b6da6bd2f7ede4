use std::fs;
use std::path::PathBuf;

use pocli_config::{AuthMethod, ConfigError, ConfigLayer, ConfigSources, resolve};

fn write_config(dir: &std::path::Path, name: &str, body: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, body)?;
    Ok(path)
}

fn env_with(pairs: &[(&str, &str)]) -> std::collections::HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}

#[test]
fn flag_beats_env_beats_file_beats_default() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    write_config(
        work.path(),
        "config.yaml",
        "host: file-host\nport: 1111\nauth: basic\ntimeout: 11\n",
    )?;

    let mut sources = ConfigSources {
        working_dir: Some(work.path().to_path_buf()),
        ..ConfigSources::default()
    };

    // File only.
    let config = resolve(&sources)?;
    assert_eq!(config.host, "file-host");
    assert_eq!(config.port, 1111);
    assert_eq!(config.auth_method, AuthMethod::Basic);

    // Environment hides the file.
    sources.env = env_with(&[
        ("POCLI_HOST", "env-host"),
        ("POCLI_PORT", "2222"),
        ("POCLI_AUTH", "oauth2"),
    ]);
    let config = resolve(&sources)?;
    assert_eq!(config.host, "env-host");
    assert_eq!(config.port, 2222);
    assert_eq!(config.auth_method, AuthMethod::OAuth2);
    assert_eq!(config.timeout.as_secs(), 11);

    // Flags hide both.
    sources.flags = ConfigLayer {
        host: Some("flag-host".into()),
        port: Some(3333),
        auth: Some(AuthMethod::None),
        ..ConfigLayer::default()
    };
    let config = resolve(&sources)?;
    assert_eq!(config.host, "flag-host");
    assert_eq!(config.port, 3333);
    assert_eq!(config.auth_method, AuthMethod::None);
    assert_eq!(config.timeout.as_secs(), 11);
    Ok(())
}

#[test]
fn boolean_and_list_fields_follow_precedence() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    write_config(
        work.path(),
        "config.yml",
        "tls: true\ninsecure: true\nca_cert:\n  - /file/ca.pem\n",
    )?;

    let mut sources = ConfigSources {
        working_dir: Some(work.path().to_path_buf()),
        env: env_with(&[("POCLI_INSECURE", "false"), ("POCLI_CA_CERT", "/env/ca.pem")]),
        ..ConfigSources::default()
    };

    let config = resolve(&sources)?;
    assert!(config.use_tls);
    assert!(!config.insecure);
    assert_eq!(config.ca_certs, vec![PathBuf::from("/env/ca.pem")]);

    sources.flags.ca_cert = Some(vec![
        PathBuf::from("/flag/a.pem"),
        PathBuf::from("/flag/b.pem"),
    ]);
    let config = resolve(&sources)?;
    assert_eq!(
        config.ca_certs,
        vec![PathBuf::from("/flag/a.pem"), PathBuf::from("/flag/b.pem")]
    );
    Ok(())
}

#[test]
fn false_flag_overrides_true_env_and_file() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    write_config(work.path(), "config.yaml", "tls: true\ninsecure: true\n")?;

    let mut sources = ConfigSources {
        working_dir: Some(work.path().to_path_buf()),
        env: env_with(&[("POCLI_TLS", "true"), ("POCLI_INSECURE", "on")]),
        ..ConfigSources::default()
    };
    let config = resolve(&sources)?;
    assert!(config.use_tls);
    assert!(config.insecure);

    sources.flags.tls = Some(false);
    sources.flags.insecure = Some(false);
    let config = resolve(&sources)?;
    assert!(!config.use_tls);
    assert!(!config.insecure);
    Ok(())
}

#[test]
fn explicit_file_replaces_discovery() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let other = tempfile::tempdir()?;
    write_config(work.path(), "config.yaml", "host: discovered\n")?;
    let explicit = write_config(other.path(), "custom.yaml", "host: explicit\n")?;

    let sources = ConfigSources {
        explicit_file: Some(explicit),
        working_dir: Some(work.path().to_path_buf()),
        ..ConfigSources::default()
    };
    assert_eq!(resolve(&sources)?.host, "explicit");
    Ok(())
}

#[test]
fn user_config_dir_is_searched_after_working_dir() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let user = tempfile::tempdir()?;
    write_config(user.path(), "pocli/config.yaml", "host: from-user-dir\n")?;

    let mut sources = ConfigSources {
        working_dir: Some(work.path().to_path_buf()),
        user_config_dir: Some(user.path().to_path_buf()),
        ..ConfigSources::default()
    };
    assert_eq!(resolve(&sources)?.host, "from-user-dir");

    write_config(work.path(), "config.yaml", "host: from-working-dir\n")?;
    sources.flags = ConfigLayer::default();
    assert_eq!(resolve(&sources)?.host, "from-working-dir");
    Ok(())
}

#[test]
fn invalid_auth_in_file_is_a_config_error() -> anyhow::Result<()> {
    let work = tempfile::tempdir()?;
    let path = write_config(work.path(), "config.yaml", "auth: saml\n")?;
    let sources = ConfigSources {
        explicit_file: Some(path),
        ..ConfigSources::default()
    };
    assert!(matches!(
        resolve(&sources).unwrap_err(),
        ConfigError::FileParse { .. }
    ));
    Ok(())
}
