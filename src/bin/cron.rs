use sitenav::{Config, hash_password, sweep_sessions};
use std::io::BufRead;
use tracing_subscriber::EnvFilter;

fn print_usage(bin_name: &str) {
    eprintln!("Usage: {bin_name} <sweep-sessions|hash-password>");
    eprintln!("  sweep-sessions  delete expired admin sessions");
    eprintln!("  hash-password   read a password from stdin and print its Argon2 hash");
}

fn init_tracing(log_level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    if json_format {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let mut args = std::env::args();
    let bin_name = args.next().unwrap_or_else(|| "cron".to_string());
    let command = args.next();

    if args.next().is_some() {
        print_usage(&bin_name);
        std::process::exit(2);
    }

    match command.as_deref() {
        Some("sweep-sessions") => run_sweep().await,
        Some("hash-password") => run_hash_password(),
        _ => {
            print_usage(&bin_name);
            std::process::exit(2);
        }
    }
}

fn run_hash_password() {
    let mut password = String::new();
    if let Err(err) = std::io::stdin().lock().read_line(&mut password) {
        eprintln!("Failed to read password: {err}");
        std::process::exit(1);
    }
    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        eprintln!("Password must not be empty");
        std::process::exit(1);
    }

    match hash_password(password) {
        Ok(hash) => println!("{hash}"),
        Err(err) => {
            eprintln!("Failed to hash password: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_sweep() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level, config.logging.json_format);

    match sweep_sessions(&config).await {
        Ok(result) => println!("Expired session sweep completed: removed={}", result.removed),
        Err(err) => {
            eprintln!("Cron job failed: {err}");
            std::process::exit(1);
        }
    }
}
