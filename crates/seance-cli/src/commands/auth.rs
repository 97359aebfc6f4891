use clap::Subcommand;
use seance_core::remote::{token_store, Claims, Registration};
use seance_core::Config;

use super::{print_json, services, CliResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Log in and store the access token in the OS keyring
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored access token
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Create an account
    Register {
        #[arg(long)]
        nom: String,
        #[arg(long)]
        prenom: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

pub async fn run(action: AuthAction) -> CliResult {
    let config = Config::load()?;
    match action {
        AuthAction::Login { email, password } => {
            let remote = services(&config)?;
            let token = remote.auth.login(&email, &password).await?;
            let claims = Claims::decode(&token)?;
            token_store::set(&token)?;
            tracing::info!(subject = %claims.sub, "logged in");
            println!("logged in as {}", claims.email.as_deref().unwrap_or(&email));
        }
        AuthAction::Logout => {
            token_store::delete()?;
            println!("logged out");
        }
        AuthAction::Whoami => {
            let Some(token) = token_store::get()? else {
                println!("not logged in");
                return Ok(());
            };
            let claims = Claims::decode(&token)?;
            if claims.is_expired(chrono::Utc::now()) {
                println!("session expired, run `seance login` again");
                return Ok(());
            }
            let remote = services(&config)?;
            match remote.auth.me().await {
                Ok(profile) => print_json(&profile)?,
                Err(e) => {
                    // Claims are enough to say who we are.
                    tracing::warn!(error = %e, "profile lookup failed");
                    println!("{} ({})", claims.sub, claims.role.as_deref().unwrap_or("?"));
                }
            }
        }
        AuthAction::Register {
            nom,
            prenom,
            email,
            password,
        } => {
            let remote = services(&config)?;
            let registration = Registration {
                nom,
                prenom,
                email,
                mot_de_passe: password,
            };
            let created = remote.auth.register(&registration).await?;
            print_json(&created)?;
        }
    }
    Ok(())
}
