use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "SFG_HOST",
        "SFG_PORT",
        "SFG_DATABASE_URL",
        "SFG_APP_URL",
        "SFG_USE_X_FORWARDED_FOR",
        "SFG_USE_FORWARDED",
        "SFG_WEBHOOK_HMAC_CHECKS",
        "SFG_WEBHOOK_HMAC_HEADER",
        "SFG_WEBHOOK_IP_WHITELIST",
        "SFG_GATEWAY_TIMEOUT_MS",
        "SFG_GATEWAY_MAX_ATTEMPTS",
        "SFG_GATEWAY_BACKOFF_MS",
        "SFG_MP_API_URL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
