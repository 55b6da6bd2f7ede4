//! Output renderers and formatting helpers for CLI commands.

use std::fmt::Display;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, anyhow};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::client::{CliError, CliResult};

const INDENT: &[u8] = b"    ";

/// Writes command results to the console or to files.
pub(crate) struct Renderer<W: Write> {
    out: W,
}

impl<W: Write> Renderer<W> {
    pub(crate) const fn new(out: W) -> Self {
        Self { out }
    }

    /// Print a single line to the console.
    pub(crate) fn line(&mut self, text: impl Display) -> CliResult<()> {
        writeln!(self.out, "{text}")
            .context("failed to write to standard output")
            .map_err(CliError::failure)
    }

    /// Print `description` followed by the indented JSON form of `value`, or
    /// write only the JSON to `destination` when one is given.
    pub(crate) fn render<T: Serialize + ?Sized>(
        &mut self,
        description: &str,
        value: &T,
        destination: Option<&Path>,
    ) -> CliResult<()> {
        let text = to_pretty_json(value)?;
        match destination {
            Some(path) => write_file(path, &text),
            None => {
                self.line(description)?;
                self.out
                    .write_all(&text)
                    .and_then(|()| self.out.write_all(b"\n"))
                    .context("failed to write to standard output")
                    .map_err(CliError::failure)
            }
        }
    }
}

/// Serialize `value` as JSON indented with four spaces, fields in
/// declaration order.
pub(crate) fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> CliResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(INDENT));
    value
        .serialize(&mut serializer)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    Ok(buffer)
}

/// Write `bytes` to `path`, replacing any existing file.
pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> CliResult<()> {
    fs::write(path, bytes)
        .with_context(|| format!("failed to write '{}'", path.display()))
        .map_err(CliError::failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn console_render_prefixes_description() -> anyhow::Result<()> {
        let mut buffer = Vec::new();
        Renderer::new(&mut buffer)
            .render("Active policy:", &json!({"name": "p", "active": true}), None)
            .map_err(|err| anyhow!(err.display_message()))?;

        let text = String::from_utf8(buffer)?;
        assert_eq!(
            text,
            "Active policy:\n{\n    \"active\": true,\n    \"name\": \"p\"\n}\n"
        );
        Ok(())
    }

    #[test]
    fn file_render_writes_only_json() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("policy.json");
        let mut buffer = Vec::new();
        Renderer::new(&mut buffer)
            .render("ignored", &["a", "b"], Some(path.as_path()))
            .map_err(|err| anyhow!(err.display_message()))?;

        assert!(buffer.is_empty());
        assert_eq!(fs::read_to_string(&path)?, "[\n    \"a\",\n    \"b\"\n]");
        Ok(())
    }

    #[test]
    fn write_failures_name_the_path() {
        let err = write_file(Path::new("/definitely/missing/dir/out.bin"), b"x").unwrap_err();
        assert!(err.display_message().contains("/definitely/missing/dir/out.bin"));
        assert_eq!(err.exit_code(), 3);
    }
}
