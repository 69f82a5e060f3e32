use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use playerlink_wire::{WireConfig, DEFAULT_NAMESPACE, PROTOCOL_VERSION};

use crate::exit::{io_error, wire_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod replay;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode one wire message.
    Decode(DecodeArgs),
    /// Build the wire message for a command.
    Encode(EncodeArgs),
    /// Drive a host from a transcript of inbound messages.
    Replay(ReplayArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct WireArgs {
    /// Protocol namespace prefixed to message names.
    #[arg(
        long,
        value_name = "PREFIX",
        env = "PLAYERLINK_NAMESPACE",
        default_value = DEFAULT_NAMESPACE
    )]
    pub namespace: String,
}

impl WireArgs {
    pub fn config(&self) -> CliResult<WireConfig> {
        let config = WireConfig::default().with_namespace(self.namespace.clone());
        config
            .validate()
            .map_err(|err| wire_error("invalid --namespace", err))?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Raw message. Read from stdin when omitted.
    pub message: Option<String>,
    #[command(flatten)]
    pub wire: WireArgs,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Command name without namespace (e.g. sdk.experience.page.goto).
    pub command: String,
    /// Parameter as KEY=VALUE; VALUE is parsed as JSON, falling back to a string.
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
    pub params: Vec<String>,
    /// Parameters as a JSON object. --param entries are applied on top.
    #[arg(long = "params", value_name = "JSON")]
    pub params_json: Option<String>,
    /// Protocol version stamped on the envelope.
    #[arg(long, default_value = PROTOCOL_VERSION)]
    pub protocol_version: String,
    /// Accept command names the player does not know.
    #[arg(long)]
    pub allow_unknown: bool,
    #[command(flatten)]
    pub wire: WireArgs,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines transcript (`{"frame": N, "message": ...}` per line), or `-` for stdin.
    pub transcript: PathBuf,
    /// Number of expected frames, numbered 1..=N.
    #[arg(long, default_value = "1")]
    pub frames: u64,
    /// Peer ids to look up before the replay starts (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub find: Vec<String>,
    /// Dynamically inserted peer aliases to await (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub insert: Vec<String>,
    /// Register the expected frames only after this many transcript messages.
    #[arg(long, default_value = "0", value_name = "N")]
    pub init_after: usize,
    /// Declare the frame set final once the transcript ends.
    #[arg(long)]
    pub seal: bool,
    #[command(flatten)]
    pub wire: WireArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn read_stdin() -> CliResult<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(input)
}
