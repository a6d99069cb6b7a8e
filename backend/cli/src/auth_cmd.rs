//! Sign-in commands.

use anyhow::Result;

use crate::context::AppContext;
use crate::terminal_output::{confirm, note_info, note_success, prompt};

fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(p) => Ok(p),
        None => prompt("Password: "),
    }
}

pub async fn login(ctx: &mut AppContext, email: &str, password: Option<String>) -> Result<()> {
    let password = password_or_prompt(password)?;
    let identity = ctx.authenticator().login(email, &password).await?;
    let identity = ctx.workspace.sign_in(identity)?;
    note_success(&format!("Signed in as {} <{}>", identity.full_name, identity.email));
    Ok(())
}

pub async fn signup(
    ctx: &mut AppContext,
    email: &str,
    name: &str,
    password: Option<String>,
    yes: bool,
) -> Result<()> {
    let password = password_or_prompt(password)?;
    let auth = ctx.authenticator();
    let pending = auth.sign_up(email, &password, name).await?;
    note_info(&format!(
        "We've sent a verification link to {}. Please verify your account to continue.",
        pending.email
    ));
    if !yes && !confirm("Verify account now?")? {
        note_info("Verification skipped. Run signup again when ready.");
        return Ok(());
    }
    let identity = auth.verify(pending).await;
    let identity = ctx.workspace.sign_in(identity)?;
    note_success(&format!("Welcome, {}! Signed in as {}", identity.full_name, identity.email));
    Ok(())
}

pub fn logout(ctx: &mut AppContext, yes: bool) -> Result<()> {
    let Some(identity) = ctx.workspace.identity() else {
        note_info("Not signed in");
        return Ok(());
    };
    if !yes && !confirm(&format!("Sign out of {}?", identity.email))? {
        return Ok(());
    }
    if let Some(identity) = ctx.workspace.sign_out()? {
        note_success(&format!("Signed out {}", identity.email));
    }
    Ok(())
}

pub fn whoami(ctx: &AppContext) {
    match ctx.workspace.identity() {
        Some(identity) => {
            println!("{} <{}>", identity.full_name, identity.email);
            if let Ok(records) = ctx.workspace.records() {
                println!("{} records", records.len());
            }
        }
        None => note_info("Not signed in. Run `leadscan login --email <address>`."),
    }
}
