//! Authentication commands.

use super::Context;
use crate::api::LoginParams;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Login with email and password.
pub async fn login(ctx: &Context, email: Option<String>, password_stdin: bool) -> Result<()> {
    let manager = ctx.manager().await?;

    if let Some(user) = manager.get_user() {
        output::print_success(
            &format!("Already logged in as {}", user.display_name()),
            &ctx.format,
        );
        return Ok(());
    }

    let email = match email {
        Some(email) => email,
        None => {
            print!("Email: ");
            io::stdout().flush()?;
            let mut email = String::new();
            io::stdin().read_line(&mut email)?;
            email.trim().to_string()
        }
    };
    if email.is_empty() {
        anyhow::bail!("Email is required");
    }

    let password = if password_stdin {
        let mut password = String::new();
        io::stdin().lock().read_line(&mut password)?;
        password.trim_end_matches(['\r', '\n']).to_string()
    } else {
        rpassword::prompt_password("Password: ")?
    };
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }

    match manager.sign_in(LoginParams { email, password }).await {
        Ok(()) => {
            let name = manager
                .get_user()
                .map(|user| user.display_name().to_string())
                .unwrap_or_else(|| "user".to_string());
            output::print_success(&format!("Logged in as {}", name), &ctx.format);
        }
        Err(e) => {
            debug!(error = %e, "Login failed");
            anyhow::bail!("Login failed: {}", e);
        }
    }

    Ok(())
}

/// Logout and clear the stored session.
pub async fn logout(ctx: &Context) -> Result<()> {
    let manager = ctx.manager().await?;
    if !manager.get_is_signed_in() {
        output::print_success("Not logged in", &ctx.format);
        return Ok(());
    }

    manager.sign_out().await;
    output::print_success("Logged out successfully", &ctx.format);
    Ok(())
}

/// Show the current session.
pub async fn status(ctx: &Context) -> Result<()> {
    let manager = ctx.manager().await?;
    let state = manager.state();

    match ctx.format {
        OutputFormat::Text => {
            output::print_row("API", ctx.api().base_url().as_str());
            output::print_row("Store", &ctx.store_path().display().to_string());
            match &state.user {
                Some(user) => {
                    output::print_row("Auth", "logged in");
                    output::print_row("User", user.display_name());
                    output::print_row("User ID", &user.id);
                }
                None => output::print_row("Auth", "not logged in"),
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "api_url": ctx.api().base_url().as_str(),
                "store": ctx.store_path(),
                "status": manager.status(),
                "logged_in": state.is_signed_in,
                "user": state.user,
            });
            output::print_json(&json)?;
        }
    }

    Ok(())
}

/// Force a token refresh.
pub async fn refresh(ctx: &Context) -> Result<()> {
    let manager = ctx.manager().await?;
    if !manager.get_is_signed_in() {
        anyhow::bail!("Not logged in");
    }

    match manager.refresh().await {
        Ok(_) => {
            output::print_success("Session refreshed", &ctx.format);
            Ok(())
        }
        Err(e) => anyhow::bail!("{}; the session was signed out", e),
    }
}
