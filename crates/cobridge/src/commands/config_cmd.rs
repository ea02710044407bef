//! Config subcommand handlers.

use cobridge_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, ConfigInitArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", cobridge_config::config_path().display());
            Ok(())
        }

        ConfigCommand::Show => {
            let mut cfg = cobridge_config::load_config()?;
            if cfg.api_key.is_some() {
                cfg.api_key = Some("[REDACTED]".into());
            }
            output::print_json(&cfg, global.output)
        }

        ConfigCommand::Init(init) => init_config(init),
    }
}

fn init_config(args: ConfigInitArgs) -> Result<(), CliError> {
    let path = cobridge_config::config_path();
    if path.exists() && !args.force {
        return Err(CliError::Validation {
            field: "config".into(),
            reason: format!("{} already exists (use --force to overwrite)", path.display()),
        });
    }

    let cfg = Config {
        host: args.host,
        api_key_env: args.api_key_env,
        ..Config::default()
    };
    // Fail early on a host the client would reject anyway.
    cfg.session()?;

    let path = cobridge_config::save_config(&cfg)?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}
