mod cmd;
mod exit;
mod output;

use clap::Parser;

use playerlink::logging::{init_logging, LogFormat, LogLevel};

use crate::cmd::Command;
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "playerlink",
    version,
    about = "Inspect and replay embedded player messaging"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    let _log = init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_replay_subcommand() {
        let cli = Cli::try_parse_from([
            "playerlink",
            "replay",
            "transcript.jsonl",
            "--frames",
            "3",
            "--find",
            "e1,e2",
            "--seal",
        ])
        .expect("replay args should parse");

        let Command::Replay(args) = cli.command else {
            panic!("expected replay");
        };
        assert_eq!(args.frames, 3);
        assert_eq!(args.find, vec!["e1", "e2"]);
        assert!(args.seal);
        assert_eq!(args.wire.namespace, playerlink_wire::DEFAULT_NAMESPACE);
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "playerlink",
            "encode",
            "sdk.layer.show",
            "-p",
            "layerId=l1",
            "--format",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("encode args should parse");

        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert!(matches!(cli.command, Command::Encode(_)));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let err = Cli::try_parse_from(["playerlink", "--log-level", "loud", "version"])
            .expect_err("unknown level should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
