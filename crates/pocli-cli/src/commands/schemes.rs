use std::io::Write;

use crate::client::{AppContext, CliResult};
use crate::output::Renderer;

/// Print the schemes the service supports, one per line in sorted order.
pub(crate) async fn handle_schemes<W: Write>(
    ctx: &AppContext,
    out: &mut Renderer<W>,
) -> CliResult<()> {
    let mut schemes = ctx.service.get_supported_schemes().await?;
    schemes.sort();

    let endpoint = ctx.service.endpoint();
    let host = endpoint.host_str().unwrap_or_default();
    match endpoint.port_or_known_default() {
        Some(port) => out.line(format!(
            "Attestation schemes supported by {host}:{port}:"
        ))?,
        None => out.line(format!("Attestation schemes supported by {host}:"))?,
    }

    for scheme in &schemes {
        out.line(scheme)?;
    }
    Ok(())
}
