use serde::Serialize;
use serde_json::Value;

use playerlink_wire::{decode_envelope, is_known_event, Decoded};

use crate::cmd::{read_stdin, DecodeArgs};
use crate::exit::{wire_error, CliResult, FAILURE, SUCCESS};
use crate::output::{or_dash, print_fields, print_json, OutputFormat};

#[derive(Debug, Serialize, PartialEq)]
pub struct DecodeReport {
    pub status: &'static str,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_event: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl From<Decoded> for DecodeReport {
    fn from(decoded: Decoded) -> Self {
        match decoded {
            Decoded::Envelope(envelope) => Self {
                status: "envelope",
                known_event: Some(is_known_event(&envelope.name)),
                peer_id: envelope.peer_id(),
                layer_id: envelope.layer_id(),
                component_id: envelope.component_id(),
                version: Some(envelope.version),
                params: Some(Value::Object(envelope.params)),
                name: Some(envelope.name),
            },
            Decoded::Foreign { name } => Self {
                status: "foreign",
                name,
                version: None,
                known_event: None,
                peer_id: None,
                layer_id: None,
                component_id: None,
                params: None,
            },
        }
    }
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = args.wire.config()?;
    let raw = match args.message {
        Some(message) => message,
        None => read_stdin()?,
    };

    let decoded =
        decode_envelope(raw.trim(), &wire).map_err(|err| wire_error("decode failed", err))?;
    let report = DecodeReport::from(decoded);
    print_report(&report, format);

    Ok(if report.status == "envelope" {
        SUCCESS
    } else {
        FAILURE
    })
}

fn print_report(report: &DecodeReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut fields = vec![
                ("status", report.status.to_string()),
                ("name", or_dash(report.name.as_deref())),
            ];
            if report.status == "envelope" {
                fields.extend([
                    ("version", or_dash(report.version.as_deref())),
                    (
                        "known",
                        report.known_event.unwrap_or_default().to_string(),
                    ),
                    ("peer", or_dash(report.peer_id.as_deref())),
                    ("layer", or_dash(report.layer_id.as_deref())),
                    ("component", or_dash(report.component_id.as_deref())),
                    (
                        "params",
                        report
                            .params
                            .as_ref()
                            .map(Value::to_string)
                            .unwrap_or_default(),
                    ),
                ]);
            }
            print_fields(&fields);
        }
        OutputFormat::Pretty => match &report.params {
            Some(params) => println!(
                "{} name={} version={} peer={} params={}",
                report.status,
                or_dash(report.name.as_deref()),
                or_dash(report.version.as_deref()),
                or_dash(report.peer_id.as_deref()),
                params
            ),
            None => println!("{} name={}", report.status, or_dash(report.name.as_deref())),
        },
    }
}
