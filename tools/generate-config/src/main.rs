//! Configuration generator for the RAG file dashboard
//!
//! Writes a `.env` with a random session secret and admin credentials so a
//! fresh install never runs on the built-in fallback secret.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use clap::Parser;
use rand::RngCore;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output file path
    #[arg(short, long, default_value = ".env")]
    output: PathBuf,

    /// Force overwrite if file exists
    #[arg(short, long)]
    force: bool,

    /// Admin login name
    #[arg(long, default_value = "admin")]
    admin_username: String,

    /// Admin password (random when omitted)
    #[arg(long)]
    admin_password: Option<String>,

    /// Bind host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 3003)]
    port: u16,

    /// Base URL of the RAG API
    #[arg(long, default_value = "http://localhost:8000")]
    rag_api_url: String,

    /// Bearer token for the RAG API
    #[arg(long)]
    api_token: Option<String>,

    /// Session lifetime in hours
    #[arg(long, default_value_t = 24)]
    session_ttl_hours: u64,

    /// Largest accepted upload in MB
    #[arg(long, default_value_t = 50)]
    max_upload_mb: usize,

    /// Mark the session cookie Secure (serve behind HTTPS)
    #[arg(long)]
    cookie_secure: bool,

    /// Show generated secrets (WARNING: insecure, only for testing)
    #[arg(long)]
    show_keys: bool,
}

fn generate_random_key(length: usize) -> String {
    let mut key = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut key);
    BASE64.encode(&key)
}

/// Random password without characters that need quoting in a `.env` file
fn generate_password(length: usize) -> String {
    generate_random_key(length)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

struct Secrets {
    session_secret: String,
    admin_password: String,
}

fn generate_env_content(cli: &Cli, secrets: &Secrets, generated_at: &str) -> String {
    let api_token = match &cli.api_token {
        Some(token) => format!("API_AUTH_TOKEN={}", token),
        None => "# API_AUTH_TOKEN=".to_string(),
    };

    format!(
        "# ========================================\n\
         # RAG File Dashboard - Environment Configuration\n\
         # ========================================\n\
         # Generated: {}\n\
         #\n\
         # This file contains the admin password and session secret.\n\
         # Never commit it to version control.\n\
         \n\
         # Server\n\
         HOST={}\n\
         PORT={}\n\
         \n\
         # Admin login\n\
         ADMIN_USERNAME={}\n\
         ADMIN_PASSWORD={}\n\
         \n\
         # Sessions (AUTO-GENERATED secret)\n\
         SESSION_SECRET={}\n\
         SESSION_TTL_HOURS={}\n\
         COOKIE_SECURE={}\n\
         \n\
         # RAG API\n\
         RAG_API_BASE_URL={}\n\
         {}\n\
         \n\
         # Uploads\n\
         MAX_UPLOAD_MB={}\n\
         \n\
         # Logging\n\
         RAGDASH_LOG_LEVEL=info\n",
        generated_at,
        cli.host,
        cli.port,
        cli.admin_username,
        secrets.admin_password,
        secrets.session_secret,
        cli.session_ttl_hours,
        cli.cookie_secure,
        cli.rag_api_url.trim_end_matches('/'),
        api_token,
        cli.max_upload_mb,
    )
}

fn main() {
    let cli = Cli::parse();

    if cli.output.exists() && !cli.force {
        eprintln!("Error: File {:?} already exists!", cli.output);
        eprintln!("   Use --force to overwrite");
        std::process::exit(1);
    }

    println!("RAG File Dashboard Configuration Generator");
    println!();

    let secrets = Secrets {
        session_secret: generate_random_key(32),
        admin_password: cli
            .admin_password
            .clone()
            .unwrap_or_else(|| generate_password(18)),
    };

    if cli.show_keys {
        println!("WARNING: Showing secrets (DO NOT use in production)");
        println!("   SESSION_SECRET: {}", secrets.session_secret);
        println!("   ADMIN_PASSWORD: {}", secrets.admin_password);
    } else {
        println!("Generated SESSION_SECRET (32 bytes, base64)");
        if cli.admin_password.is_none() {
            println!("Generated ADMIN_PASSWORD (see {:?})", cli.output);
        }
    }
    println!();

    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let content = generate_env_content(&cli, &secrets, &generated_at);

    if let Err(e) = fs::write(&cli.output, content) {
        eprintln!("Failed to write file: {}", e);
        std::process::exit(1);
    }
    println!("Configuration written to: {:?}", cli.output);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        if let Err(e) = fs::set_permissions(&cli.output, perms) {
            eprintln!("Warning: Could not set file permissions: {}", e);
        } else {
            println!("Set secure file permissions (600 - owner only)");
        }
    }

    println!();
    println!("Next Steps:");
    println!("   1. Check RAG_API_BASE_URL in {:?}", cli.output);
    println!("   2. Start the dashboard: cargo run -p run-dashboard");
    println!("   3. Log in as '{}'", cli.admin_username);
}
