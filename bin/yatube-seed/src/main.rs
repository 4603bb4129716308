//! yatube-seed
//!
//! Admin CLI for the records that have no page of their own: groups, and
//! users created without going through the signup form.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use uuid::Uuid;
use yt_auth_simple::SimpleAuthProvider;
use yt_config::Settings;
use yt_core::forms::SignupForm;
use yt_core::models::{Group, User};
use yt_core::{AuthProvider, ContentRepo, UserRepo};
use yt_db_sqlite::SqliteRepo;

#[derive(Parser, Debug)]
#[command(name = "yatube-seed")]
#[command(about = "Creates groups and users in the Yatube database", long_about = None)]
struct Args {
    /// Database URL; defaults to the configured one
    #[arg(long, value_name = "DATABASE")]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a group posts can be filed under
    Group {
        slug: String,
        title: String,
        #[arg(default_value = "")]
        description: String,
    },
    /// Create a user account
    User { username: String, password: String },
}

fn valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let args = Args::parse();
    let settings = Settings::load().context("loading configuration")?;
    let url = args.database.unwrap_or(settings.database.url);
    let repo = SqliteRepo::new(&url).await?;

    match args.command {
        Command::Group {
            slug,
            title,
            description,
        } => {
            if !valid_slug(&slug) {
                bail!("slug may contain only letters, digits, '-' and '_': {slug:?}");
            }
            if repo.get_group_by_slug(&slug).await?.is_some() {
                bail!("group {slug} already exists");
            }
            repo.create_group(Group {
                id: Uuid::now_v7(),
                slug: slug.clone(),
                title,
                description,
            })
            .await?;
            log::info!("created group /group/{slug}/");
        }
        Command::User { username, password } => {
            let form = SignupForm {
                username: username.clone(),
                password1: password.clone(),
                password2: password,
            };
            form.validate()?;
            let username = username.trim().to_string();
            if repo.get_user_by_username(&username).await?.is_some() {
                bail!("user {username} already exists");
            }
            let auth = SimpleAuthProvider::new(settings.auth.session_secret);
            repo.create_user(User {
                id: Uuid::now_v7(),
                username: username.clone(),
                password_hash: auth.hash_password(&form.password1)?,
                created_at: Utc::now(),
            })
            .await?;
            log::info!("created user {username}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_charset() {
        assert!(valid_slug("cats"));
        assert!(valid_slug("test-slug_2"));
        assert!(!valid_slug(""));
        assert!(!valid_slug("two words"));
        assert!(!valid_slug("коты"));
    }

    #[test]
    fn test_cli_parses_group_without_description() {
        let args = Args::parse_from(["yatube-seed", "group", "cats", "Cats"]);
        match args.command {
            Command::Group { slug, description, .. } => {
                assert_eq!(slug, "cats");
                assert_eq!(description, "");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
