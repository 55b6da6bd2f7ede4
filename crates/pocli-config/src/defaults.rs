//! Built-in defaults applied beneath every other configuration source.

/// Host used when no source names the management service.
pub const DEFAULT_HOST: &str = "localhost";
/// Port the management service listens on in the standard deployment.
pub const DEFAULT_PORT: u16 = 10443;
/// Request timeout in seconds applied at the transport boundary.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Prefix shared by every environment variable the resolver reads.
pub const ENV_PREFIX: &str = "POCLI_";
/// Directory under the per-user configuration root holding the config file.
pub const CONFIG_DIR_NAME: &str = "pocli";
/// File names probed, in order, inside each search directory.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["config.yaml", "config.yml"];
