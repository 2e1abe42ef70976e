use log::{error, info};
use std::process;
use std::sync::{Arc, Mutex};

use rax_ftp_uploader::terminal::{display_progress, finish_progress, format_bytes};
use rax_ftp_uploader::{ClientConfig, RaxFtpClient, Result};

/// Parsed command line
struct Args {
    config_path: Option<String>,
    files: Vec<String>,
}

fn main() {
    // Initialize logging
    env_logger::init();

    let args = match parse_args(std::env::args().skip(1)) {
        Some(args) => args,
        None => {
            print_usage();
            process::exit(2);
        }
    };

    let config = match ClientConfig::load(args.config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = run(&config, &args.files) {
        error!("Session failed: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(config: &ClientConfig, files: &[String]) -> Result<()> {
    let current_file = Arc::new(Mutex::new(String::new()));
    let observed_file = Arc::clone(&current_file);

    let mut client = RaxFtpClient::from_config(config).with_progress_observer(move |progress| {
        if let Ok(name) = observed_file.lock() {
            display_progress(&name, progress);
        }
    });

    let greeting = client.connect_with(config.host(), config.port(), config.server.timeout_secs)?;
    println!("Connected to {}: {}", config.display_name(), greeting.message());

    if let Some(credentials) = &config.credentials {
        let replies = client.logon(&credentials.user, &credentials.password)?;
        println!("{}", replies.user);
        println!("{}", replies.pass);
        if !replies.is_logged_in() {
            info!("Server did not confirm the login, continuing anyway");
        }
    }

    let mut outcome = Ok(());
    for file in files {
        if let Ok(mut name) = current_file.lock() {
            name.clone_from(file);
        }

        match client.upload_path(file) {
            Ok(summary) => {
                finish_progress();
                println!(
                    "Uploaded '{}' as '{}' ({} in {:?}): {}",
                    file,
                    summary.target,
                    format_bytes(summary.bytes_sent),
                    summary.elapsed,
                    summary.completion.message()
                );
            }
            Err(e) => {
                finish_progress();
                eprintln!("Upload of '{}' failed: {}", file, e);
                outcome = Err(e);
                if !client.is_connected() {
                    break;
                }
            }
        }
    }

    if client.is_connected() {
        let farewell = client.logoff()?;
        println!("{}", farewell);
    }
    client.disconnect();

    outcome
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Args> {
    let mut config_path = None;
    let mut files = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => config_path = Some(args.next()?),
            "-h" | "--help" => return None,
            _ => files.push(arg),
        }
    }

    if files.is_empty() {
        return None;
    }

    Some(Args { config_path, files })
}

fn print_usage() {
    println!("RAX FTP Uploader");
    println!("Usage: rax-ftp-uploader [--config <file>] <file>...");
    println!("Configuration file: rax-ftp.toml (optional)");
    println!("Environment Variables:");
    println!("  RAX_FTP__SERVER__HOST=127.0.0.1");
    println!("  RAX_FTP__SERVER__HOST_NAME=\"Comp Lab 2\"");
    println!("  RAX_FTP__SERVER__PORT=21");
    println!("  RAX_FTP__SERVER__TIMEOUT_SECS=30");
    println!("  RAX_FTP__CREDENTIALS__USER=anonymous");
    println!("  RAX_FTP__CREDENTIALS__PASSWORD=guest");
    println!("  RAX_FTP__TRANSFER__CHUNK_SIZE=4096");
    println!("  RUST_LOG=info");
}
