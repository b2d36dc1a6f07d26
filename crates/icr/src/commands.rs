//! Subcommand handlers: turn parsed args into a session request and
//! print the response body.

use icontrol::{Method, RequestOptions, Response, Session, Target, UriParts};

use crate::cli::{BodyArgs, Command, GlobalOpts, PartsArgs, RequestArgs};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let resp = match cmd {
        Command::Get(args) => send(session, Method::GET, args, None).await?,
        Command::Delete(args) => send(session, Method::DELETE, args, None).await?,
        Command::Post(args) => send_with_body(session, Method::POST, args).await?,
        Command::Put(args) => send_with_body(session, Method::PUT, args).await?,
        Command::Patch(args) => send_with_body(session, Method::PATCH, args).await?,
        Command::Completions(_) => unreachable!("handled before connecting"),
    };
    print_body(&resp, global.compact)
}

async fn send_with_body(session: &Session, method: Method, args: BodyArgs) -> Result<Response, CliError> {
    let body = read_body(&args)?;
    send(session, method, args.request, body).await
}

async fn send(
    session: &Session,
    method: Method,
    args: RequestArgs,
    body: Option<serde_json::Value>,
) -> Result<Response, CliError> {
    let mut options = RequestOptions {
        params: args.params,
        ..RequestOptions::default()
    };
    if let Some(body) = body {
        options = options.json(body);
    }
    let target = target(args.target, args.parts);
    Ok(session.request(method, target, options).await?)
}

fn target(target: String, parts: PartsArgs) -> Target {
    let Some(name) = parts.name else {
        return Target::Url(target);
    };
    let mut uri_parts = UriParts::new(name);
    if let Some(partition) = parts.partition {
        uri_parts = uri_parts.partition(partition);
    }
    if let Some(sub_path) = parts.sub_path {
        uri_parts = uri_parts.sub_path(sub_path);
    }
    if let Some(suffix) = parts.suffix {
        uri_parts = uri_parts.suffix(suffix);
    }
    Target::parts(target, uri_parts)
}

fn read_body(args: &BodyArgs) -> Result<Option<serde_json::Value>, CliError> {
    let raw = match (&args.data, &args.data_file) {
        (Some(data), _) => data.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => return Ok(None),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

fn print_body(resp: &Response, compact: bool) -> Result<(), CliError> {
    if resp.is_empty() {
        return Ok(());
    }
    // Non-JSON payloads are printed as received.
    let Ok(value) = resp.json::<serde_json::Value>() else {
        println!("{}", resp.text());
        return Ok(());
    };
    let rendered = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    println!("{rendered}");
    Ok(())
}
