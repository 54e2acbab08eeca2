//! Config subcommand handlers.

use std::fmt::Write as _;

use logicircle_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path(global).display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?.redacted();
            let out = output::render_single(&global.format, &cfg, detail, |c| {
                c.username.clone().unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let cfg = config::load(global)?;
            let username = cfg
                .username
                .filter(|u| !u.trim().is_empty())
                .ok_or_else(|| CliError::NoConfig {
                    path: config::config_path(global).display().to_string(),
                })?;

            let password = rpassword::prompt_password(format!("Password for {username}: "))?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            logicircle_config::store_password(&username, &password)?;
            if !global.quiet {
                eprintln!("Password for {username} stored in system keyring");
            }
            Ok(())
        }
    }
}

fn detail(cfg: &Config) -> String {
    let none = || "-".to_owned();
    let mut out = String::new();
    let rows = [
        ("Username", cfg.username.clone().unwrap_or_else(none)),
        ("Password", cfg.password.clone().unwrap_or_else(none)),
        ("Name", cfg.name.clone()),
        ("API URL", cfg.api_url.clone()),
        (
            "CA cert",
            cfg.ca_cert
                .as_ref()
                .map_or_else(none, |p| p.display().to_string()),
        ),
        ("Timeout", format!("{}s", cfg.timeout_secs)),
        ("Refresh", format!("{}s", cfg.refresh_interval_secs)),
        ("Failure threshold", cfg.failure_threshold.to_string()),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "{label:<18} {value}");
    }
    out.trim_end().to_owned()
}
