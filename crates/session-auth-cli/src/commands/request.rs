//! Authorized API requests.

use super::Context;
use crate::output::{self, OutputFormat};
use anyhow::{Context as _, Result};
use reqwest::Method;

/// Send a request to `path` under the API URL with the session's credentials.
pub async fn request(ctx: &Context, method: &str, path: &str, data: Option<&str>) -> Result<()> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method {}", method))?;
    let url = ctx.api().endpoint(path)?;
    let manager = ctx.manager().await?;

    let mut builder = manager.http().request(method, url.as_str());
    if let Some(data) = data {
        let body: serde_json::Value =
            serde_json::from_str(data).context("Request body must be valid JSON")?;
        builder = builder.json(&body);
    }

    let response = builder.send().await?;
    let status = response.status();
    let text = response.text().await?;

    match ctx.format {
        OutputFormat::Text => {
            output::print_row("Status", status.as_str());
            if !text.is_empty() {
                println!("{}", text);
            }
        }
        OutputFormat::Json => {
            let body = serde_json::from_str::<serde_json::Value>(&text)
                .unwrap_or(serde_json::Value::String(text));
            output::print_json(&serde_json::json!({
                "status": status.as_u16(),
                "body": body,
            }))?;
        }
    }

    if !status.is_success() {
        anyhow::bail!("Request failed with status {}", status);
    }
    Ok(())
}
