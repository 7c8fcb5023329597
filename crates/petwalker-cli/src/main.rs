//! PetWalker CLI - a thin command-line front end for the session core.
//!
//! Restores the stored session at startup and, when unauthenticated, runs an
//! interactive login. `petwalker logout` discards the stored credential.
//! Doubles as a smoke test for the session lifecycle against a live server.

use std::io::{self, Write};

use anyhow::Result;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use petwalker_core::{
    ApiClient, Config, CredentialStore, KeyringStore, SessionManager, UserProfile,
};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("PetWalker CLI starting");

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    let api = match config.api_base_url.as_deref() {
        Some(url) => ApiClient::with_base_url(url)?,
        None => ApiClient::new()?,
    };
    let store = KeyringStore::new()?;

    let mut session = SessionManager::new(store, api.clone());
    session.restore_session().await;

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "logout" {
        session.sign_out();
        println!("Signed out.");
        return Ok(());
    }

    if let Some(user) = session.user() {
        print_profile(user);
    } else {
        login_interactive(&mut session, &mut config).await?;
    }

    if let Err(e) = show_dogs(&api).await {
        warn!(error = %e, "Failed to fetch dogs");
    }

    Ok(())
}

/// List the signed-in user's dogs, the way the app's screens consume the
/// generic client: the token flows credential store -> client per request,
/// never through the session manager.
async fn show_dogs(api: &ApiClient) -> Result<()> {
    let Some(token) = KeyringStore::new()?.get()? else {
        return Ok(());
    };

    let client = api.with_token(token);
    let dogs: Vec<DogSummary> = client.get("/api/dogs").await?;

    if dogs.is_empty() {
        println!("\nNo dogs registered yet.");
    } else {
        println!("\nDogs ({}):", dogs.len());
        for dog in dogs {
            println!("  {}", dog.name);
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct DogSummary {
    name: String,
}

/// Prompt for credentials and sign in.
async fn login_interactive(
    session: &mut SessionManager<KeyringStore, ApiClient>,
    config: &mut Config,
) -> Result<()> {
    println!("\n=== PetWalker Login ===\n");

    let default_email = std::env::var("PETWALKER_EMAIL")
        .ok()
        .or_else(|| config.last_email.clone());

    let email = prompt_email(default_email.as_deref())?;
    if email.is_empty() {
        anyhow::bail!("Email is required");
    }

    let password = match std::env::var("PETWALKER_PASSWORD") {
        Ok(p) if !p.is_empty() => p,
        _ => rpassword::prompt_password("Password: ")?,
    };
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }

    println!("\nAuthenticating...");

    match session.sign_in(&email, &password).await {
        Ok(()) => {
            config.last_email = Some(email);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }

            println!("Login successful!\n");
            if let Some(user) = session.user() {
                print_profile(user);
            }
            Ok(())
        }
        Err(e) => {
            anyhow::bail!("{}", e.message);
        }
    }
}

fn prompt_email(default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => print!("Email [{}]: ", d),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        Ok(default.unwrap_or("").to_string())
    } else {
        Ok(input.to_string())
    }
}

fn print_profile(user: &UserProfile) {
    println!("Signed in as {} <{}>", user.name, user.email);
    if user.is_admin {
        println!("Role: admin");
    }
    if let Some(ref phone) = user.phone {
        println!("Phone: {}", phone);
    }
}
