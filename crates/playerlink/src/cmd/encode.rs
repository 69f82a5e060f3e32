use serde_json::Value;

use playerlink_wire::commands::is_known_command;
use playerlink_wire::{encode_envelope, Params};

use crate::cmd::EncodeArgs;
use crate::exit::{wire_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_fields, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    if !args.allow_unknown && !is_known_command(&args.command) {
        return Err(CliError::new(
            USAGE,
            format!(
                "unknown command {:?} (pass --allow-unknown to send it anyway)",
                args.command
            ),
        ));
    }

    let wire = args
        .wire
        .config()?
        .with_version(args.protocol_version.clone());
    let params = resolve_params(args.params_json.as_deref(), &args.params)?;
    let encoded = encode_envelope(&args.command, &params, &wire)
        .map_err(|err| wire_error("encode failed", err))?;

    match format {
        OutputFormat::Json | OutputFormat::Pretty => println!("{encoded}"),
        OutputFormat::Table => print_fields(&[
            ("command", args.command.clone()),
            ("namespace", wire.namespace.clone()),
            ("version", wire.version.clone()),
            ("bytes", encoded.len().to_string()),
            ("wire", encoded),
        ]),
    }

    Ok(SUCCESS)
}

fn resolve_params(json: Option<&str>, pairs: &[String]) -> CliResult<Params> {
    let mut params = match json {
        None => Params::new(),
        Some(json) => match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(params)) => params,
            Ok(_) => {
                return Err(CliError::new(USAGE, "--params must be a JSON object"));
            }
            Err(err) => {
                return Err(CliError::new(
                    USAGE,
                    format!("--params is not valid JSON: {err}"),
                ));
            }
        },
    };

    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(CliError::new(
                USAGE,
                format!("--param expects KEY=VALUE, got {pair:?}"),
            ));
        };
        if key.is_empty() {
            return Err(CliError::new(USAGE, "--param key must not be empty"));
        }
        let value =
            serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        params.insert(key.to_string(), value);
    }

    Ok(params)
}
