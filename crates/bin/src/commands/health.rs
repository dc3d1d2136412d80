//! Health check command - checks a running devqueue server.

use crate::cli::HealthArgs;

/// Run the health check command
pub async fn run(args: &HealthArgs) -> Result<(), Box<dyn std::error::Error>> {
    let url = args.server.url("/health");
    let client = reqwest::Client::builder()
        .timeout(args.server.timeout())
        .build()?;

    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => {
            let body: serde_json::Value = response.json().await?;
            let status = body.get("status").and_then(|s| s.as_str()).unwrap_or("");
            if status == "healthy" {
                let count = |key: &str| body.get(key).and_then(|v| v.as_u64()).unwrap_or(0);
                println!(
                    "healthy: {} sessions, {} users, {} devices",
                    count("sessions"),
                    count("users"),
                    count("devices")
                );
                Ok(())
            } else {
                eprintln!("unhealthy: server returned status {}", status);
                std::process::exit(1);
            }
        }
        Ok(response) => {
            eprintln!(
                "unhealthy: server returned HTTP status {}",
                response.status()
            );
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("unhealthy: failed to connect to {}: {}", url, e);
            std::process::exit(1);
        }
    }
}
