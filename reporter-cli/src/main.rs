//! Command-line front for the SJWG AI Reporter service
//!
//! Drives the library workflows: register, login, list/show reports, upload
//! a document for report generation, delete, logout.

use std::env;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use reporter_client::{ClientConfig, LoggingConfig, Report, WorkflowController};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.contains(&"--init".to_string()) {
        return init_config(&args);
    }

    let (config_path, rest) = split_config_arg(&args[1..]);
    let config = match ClientConfig::load_or_default(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            eprintln!("Run `{} --init <path>` to create one.", args[0]);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    let controller = WorkflowController::from_config(&config)?;
    info!("using API at {}", config.api.base_url);

    match rest.first().map(String::as_str) {
        Some("register") => {
            let (email, password) = credentials_from(&rest)?;
            controller.register(email, password).await?;
            println!("Registered and logged in as {email}.");
            print_reports(&controller.reports());
        }
        Some("login") => {
            let (email, password) = credentials_from(&rest)?;
            controller.login(email, password).await?;
            println!("Logged in as {email}.");
            print_reports(&controller.reports());
        }
        Some("list") => {
            require_session(&controller);
            controller.refresh_reports().await?;
            print_reports(&controller.reports());
        }
        Some("show") => {
            require_session(&controller);
            let id = id_from(&rest)?;
            let report = controller.get_report(id).await?;
            print_report(&report);
        }
        Some("upload") => {
            require_session(&controller);
            let file = rest
                .get(1)
                .ok_or_else(|| anyhow::anyhow!("usage: upload <file>"))?;
            let bytes = tokio::fs::read(file).await?;
            let file_name = Path::new(file)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(file)
                .to_string();

            let receipt = controller.upload(&file_name, bytes).await?;
            println!(
                "Upload accepted (report {}). Waiting for the server to pick it up...",
                receipt.report_id
            );
            controller.wait_for_scheduled_refresh().await;
            print_reports(&controller.reports());
        }
        Some("delete") => {
            require_session(&controller);
            let id = id_from(&rest)?;
            controller.delete_report(id).await?;
            println!("Report {id} deleted.");
            print_reports(&controller.reports());
        }
        Some("logout") => {
            controller.logout()?;
            println!("Logged out.");
        }
        _ => {
            print_usage(&args[0]);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false);

    let result = if config.format == "json" {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.expect("Failed to set global logging subscriber");
}

/// Pull `--config <path>` out of the argument list, returning the remainder.
fn split_config_arg(args: &[String]) -> (Option<&str>, Vec<String>) {
    let mut config_path = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            config_path = iter.next().map(String::as_str);
        } else {
            rest.push(arg.clone());
        }
    }
    (config_path, rest)
}

fn credentials_from(rest: &[String]) -> anyhow::Result<(&str, &str)> {
    match (rest.get(1), rest.get(2)) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => anyhow::bail!("usage: {} <email> <password>", rest[0]),
    }
}

fn id_from(rest: &[String]) -> anyhow::Result<i64> {
    let raw = rest
        .get(1)
        .ok_or_else(|| anyhow::anyhow!("usage: {} <report-id>", rest[0]))?;
    Ok(raw.parse()?)
}

fn require_session(controller: &WorkflowController) {
    if !controller.is_authenticated() {
        eprintln!("Not logged in. Run `login <email> <password>` first.");
        std::process::exit(1);
    }
}

fn print_reports(reports: &[Report]) {
    if reports.is_empty() {
        println!("No reports yet. Upload a document to get started.");
        return;
    }
    for report in reports {
        print_report(report);
    }
}

fn print_report(report: &Report) {
    let status = status_label(report);
    println!(
        "#{:<4} {:10} {}  {}",
        report.id, status, report.created_at, report.title
    );
    if let Some(preview) = &report.preview {
        if !preview.is_empty() {
            println!("      {preview}");
        }
    }
    if let Some(pdf) = &report.pdf_url {
        println!("      PDF: {pdf}");
    }
}

fn status_label(report: &Report) -> &'static str {
    use reporter_client::ReportStatus::*;
    match report.status {
        Pending => "pending",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
    }
}

fn init_config(args: &[String]) -> anyhow::Result<()> {
    let config_path = args
        .iter()
        .skip_while(|a| *a != "--init")
        .nth(1)
        .map(String::as_str)
        .unwrap_or("config.json");

    if Path::new(config_path).exists() {
        eprintln!("Configuration file '{config_path}' already exists.");
        eprintln!("Remove it first if you want to create a new one.");
        std::process::exit(1);
    }

    let config = ClientConfig::default();
    config.save(config_path)?;

    println!("Configuration file '{config_path}' created.");
    println!();
    println!("Defaults:");
    println!("  api.base_url: {}", config.api.base_url);
    println!("  storage.backend: file (platform data directory)");
    println!();
    println!("Usage:");
    println!("  {} [--config {config_path}] login <email> <password>", args[0]);
    Ok(())
}

fn print_usage(binary: &str) {
    eprintln!("Usage: {binary} [--config <path>] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  register <email> <password>   Create an account and log in");
    eprintln!("  login <email> <password>      Log in and list reports");
    eprintln!("  list                          Refresh and list reports");
    eprintln!("  show <report-id>              Show a single report");
    eprintln!("  upload <file>                 Upload a document for report generation");
    eprintln!("  delete <report-id>            Delete a report");
    eprintln!("  logout                        Clear the stored session");
}
