use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("playerlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: playerlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("protocol: {}", playerlink_wire::PROTOCOL_VERSION);
    println!("namespace: {}", playerlink_wire::DEFAULT_NAMESPACE);
    println!(
        "target: {}",
        option_env!("PLAYERLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "features: peer={}, logging={}, cli=true",
        cfg!(feature = "peer"),
        cfg!(feature = "logging")
    );

    Ok(SUCCESS)
}
