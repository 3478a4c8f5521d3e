use anyhow::{Context, Result};
use sfexport::{Credentials, KindReport, RestClient, SalesforceExport, Session};
use std::time::Duration;

fn env_var(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

fn print_kind(label: &str, report: &Option<KindReport>) {
    match report {
        None => println!("{label}: disabled"),
        Some(KindReport::Failed(e)) => println!("{label}: FAILED ({e})"),
        Some(KindReport::Completed {
            manifest_rows,
            summary,
        }) => {
            println!(
                "{label}: {} in manifest, {} saved, {} failed, {} skipped, {} failed batches{}",
                manifest_rows,
                summary.saved,
                summary.failed,
                summary.skipped,
                summary.failed_batches,
                if summary.cancelled { " (cancelled)" } else { "" },
            );
        }
    }
}

fn main() -> Result<()> {
    // All settings come from the environment; see README.md for the list.
    let username = env_var("SFEXPORT_USERNAME")?;
    let password = env_var("SFEXPORT_PASSWORD")?;
    let security_token = env_var("SFEXPORT_SECURITY_TOKEN")?;
    let parent_scope = env_var("SFEXPORT_PARENT_SCOPE")?;
    let sandbox = env_flag("SFEXPORT_SANDBOX", false);
    let output_dir =
        std::env::var("SFEXPORT_OUTPUT_DIR").unwrap_or_else(|_| "./export".to_string());
    let batch_size: usize = std::env::var("SFEXPORT_BATCH_SIZE")
        .ok()
        .map(|v| v.parse().context("SFEXPORT_BATCH_SIZE must be a positive integer"))
        .transpose()?
        .unwrap_or(100);
    let share_type = std::env::var("SFEXPORT_SHARE_TYPE").unwrap_or_else(|_| "V".to_string());
    let visibility =
        std::env::var("SFEXPORT_VISIBILITY").unwrap_or_else(|_| "AllUsers".to_string());
    let timeout = Duration::from_secs(60);

    println!("Export Notes & Attachments from Salesforce");
    println!("Username: {username}");
    println!("Output directory: {output_dir}");

    let session = Session::login(
        &Credentials {
            username,
            password,
            security_token,
        },
        sandbox,
        timeout,
    )?;
    let client = RestClient::new(session, timeout)?;

    let report = SalesforceExport::new()
        .output_dir(&output_dir)
        .parent_scope(&parent_scope)
        .attachments(env_flag("SFEXPORT_ATTACHMENTS", true))
        .notes(env_flag("SFEXPORT_NOTES", true))
        .batch_size(batch_size)
        .share_type(share_type)
        .visibility(visibility)
        .http_timeout(timeout)
        .progress(true)
        .run(&client, &client)?;

    print_kind("attachments", &report.attachments);
    print_kind("notes", &report.notes);

    if !report.success() {
        std::process::exit(1);
    }
    Ok(())
}
