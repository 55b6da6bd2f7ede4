use std::fs;
use std::io::Write;

use tracing::warn;
use uuid::Uuid;

use crate::cli::{ActivateArgs, CreateArgs, DeactivateArgs, GetArgs, ListArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{Renderer, write_file};

pub(crate) async fn handle_create<W: Write>(
    ctx: &AppContext,
    args: CreateArgs,
    out: &mut Renderer<W>,
) -> CliResult<()> {
    let rules = fs::read(&args.rules_file).map_err(|err| {
        CliError::argument(format!(
            "could not read rules file '{}': {err}",
            args.rules_file.display()
        ))
    })?;

    let policy = ctx
        .service
        .create_policy(&args.scheme, rules, args.name.as_deref())
        .await?;
    out.render("Policy created:", &policy, None)?;

    if args.dont_activate {
        return Ok(());
    }

    // The created policy stays in place if activation fails.
    if let Err(err) = ctx.service.activate_policy(&args.scheme, policy.uuid).await {
        warn!(policy = %policy.uuid, "policy created but not activated");
        return Err(err.into());
    }
    out.line("Policy activated.")
}

pub(crate) async fn handle_activate<W: Write>(
    ctx: &AppContext,
    args: ActivateArgs,
    out: &mut Renderer<W>,
) -> CliResult<()> {
    let id = parse_policy_id(&args.uuid)?;
    ctx.service.activate_policy(&args.scheme, id).await?;
    out.line("Policy activated.")
}

pub(crate) async fn handle_deactivate<W: Write>(
    ctx: &AppContext,
    args: DeactivateArgs,
    out: &mut Renderer<W>,
) -> CliResult<()> {
    ctx.service.deactivate_all_policies(&args.scheme).await?;
    out.line(format!(
        "All policies for scheme {} deactivated.",
        args.scheme
    ))
}

pub(crate) async fn handle_get<W: Write>(
    ctx: &AppContext,
    args: GetArgs,
    out: &mut Renderer<W>,
) -> CliResult<()> {
    let id = args.uuid.as_deref().map(parse_policy_id).transpose()?;

    let (policy, description) = match id {
        Some(id) => (
            ctx.service.get_policy(&args.scheme, id).await?,
            format!("Policy \"{id}\":"),
        ),
        None => (
            ctx.service.get_active_policy(&args.scheme).await?,
            "Active policy:".to_string(),
        ),
    };

    out.render(&description, &policy, args.output.as_deref())?;

    if let Some(path) = &args.write_rules {
        write_file(path, policy.rules_bytes())?;
    }
    Ok(())
}

pub(crate) async fn handle_list<W: Write>(
    ctx: &AppContext,
    args: ListArgs,
    out: &mut Renderer<W>,
) -> CliResult<()> {
    let name = args.name.as_deref().filter(|name| !name.is_empty());
    let policies = ctx.service.get_policies(&args.scheme, name).await?;

    if args.output.is_none() && policies.is_empty() {
        return out.line(empty_list_message(&args.scheme, name));
    }

    let description = match name {
        Some(name) => format!("Policies for scheme {} with name {name}:", args.scheme),
        None => format!("Policies for scheme {}:", args.scheme),
    };
    out.render(&description, &policies, args.output.as_deref())
}

fn empty_list_message(scheme: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("No policies for scheme {scheme} with name {name}."),
        None => format!("No policies for scheme {scheme}."),
    }
}

fn parse_policy_id(input: &str) -> CliResult<Uuid> {
    Uuid::parse_str(input.trim())
        .map_err(|err| CliError::argument(format!("invalid policy ID '{input}': {err}")))
}
