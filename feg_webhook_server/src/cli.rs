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
    // Secrets (FEG_RESEND_API_KEY, the webhook secret) are left off this list
    const DISPLAY_ENVS: [&str; 15] = [
        "RUST_LOG",
        "FEG_HOST",
        "FEG_PORT",
        "FEG_DATABASE_URL",
        "FEG_WEBHOOK_SECRET_NAME",
        "FEG_SIGNATURE_TOLERANCE",
        "FEG_STRIPE_IP_WHITELIST",
        "FEG_USE_X_FORWARDED_FOR",
        "FEG_USE_FORWARDED",
        "FEG_MAIL_PROVIDER",
        "FEG_MAIL_FROM",
        "FEG_RESEND_API_URL",
        "FEG_ADMIN_EMAIL",
        "FEG_SUPPORT_EMAIL",
        "FEG_NOTIFICATION_BUFFER",
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
