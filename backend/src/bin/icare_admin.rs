//! Administrative maintenance of user accounts: grant admin rights, ban or
//! unban a user.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use icare::domain::ports::UserRepository;
use icare::domain::{AuthProvider, ProviderUid, User, UserId};
use icare::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
use mockable::{Clock, DefaultClock};
use tokio::runtime::Builder;

/// `icare-admin` command arguments.
#[derive(Debug, Parser)]
#[command(name = "icare-admin", about = "Maintain Icare user accounts", version)]
struct CliArgs {
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Grant administrator rights.
    Promote(Target),
    /// Prevent the user from signing in.
    Ban(Target),
    /// Allow a banned user to sign in again.
    Unban(Target),
}

/// Exactly one way of naming the user.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Facebook uid of the user.
    #[arg(long, value_name = "uid")]
    uid: Option<String>,
    /// Internal user id.
    #[arg(long, value_name = "uuid")]
    id: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: CliArgs) -> Result<()> {
    let database_url = resolve_database_url(args.database_url)?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .wrap_err("create database pool")?;
    let users = DieselUserRepository::new(pool);

    let (target, action) = match args.command {
        Command::Promote(target) => (target, Action::Promote),
        Command::Ban(target) => (target, Action::Ban),
        Command::Unban(target) => (target, Action::Unban),
    };
    let mut user = find_user(&users, &target).await?;
    action.apply(&mut user, DefaultClock.utc());
    users.save(&user).await.wrap_err("save user")?;

    println!("user_id={}", user.id());
    println!("uid={}", user.uid());
    println!("admin={}", user.is_admin());
    println!("banned={}", user.is_banned());
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Promote,
    Ban,
    Unban,
}

impl Action {
    fn apply(self, user: &mut User, now: chrono::DateTime<chrono::Utc>) {
        match self {
            Self::Promote => user.promote_to_admin(now),
            Self::Ban => user.set_banned(true, now),
            Self::Unban => user.set_banned(false, now),
        }
    }
}

async fn find_user<R: UserRepository>(users: &R, target: &Target) -> Result<User> {
    let found = match (&target.uid, &target.id) {
        (Some(uid), _) => {
            let uid = ProviderUid::new(uid.clone()).wrap_err("invalid --uid")?;
            users
                .find_by_provider_uid(AuthProvider::Facebook, &uid)
                .await
                .wrap_err("look up user by uid")?
        }
        (None, Some(id)) => {
            let id = UserId::new(id.clone()).wrap_err("invalid --id")?;
            users.find_by_id(&id).await.wrap_err("look up user by id")?
        }
        (None, None) => return Err(eyre!("either --uid or --id is required")),
    };
    found.ok_or_else(|| eyre!("user not found"))
}

fn resolve_database_url(explicit: Option<String>) -> Result<String> {
    let url = match explicit {
        Some(value) => value,
        None => env::var("DATABASE_URL")
            .map_err(|_| eyre!("database URL missing: set --database-url or DATABASE_URL"))?,
    };
    if url.trim().is_empty() {
        return Err(eyre!("database URL must not be empty"));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    //! Unit tests for argument parsing and account updates.

    use super::*;
    use icare::test_support::{facebook_identity, fixture_timestamp};
    use rstest::rstest;

    #[rstest]
    #[case(&["icare-admin", "promote", "--uid", "123"], Some("123"), None)]
    #[case(&["icare-admin", "ban", "--id", "3fa85f64-5717-4562-b3fc-2c963f66afa6"], None, Some("3fa85f64-5717-4562-b3fc-2c963f66afa6"))]
    fn parses_targets(#[case] argv: &[&str], #[case] uid: Option<&str>, #[case] id: Option<&str>) {
        let args = CliArgs::try_parse_from(argv).expect("valid arguments");
        let target = match args.command {
            Command::Promote(target) | Command::Ban(target) | Command::Unban(target) => target,
        };
        assert_eq!(target.uid.as_deref(), uid);
        assert_eq!(target.id.as_deref(), id);
    }

    #[rstest]
    #[case(&["icare-admin", "promote"])]
    #[case(&["icare-admin", "ban", "--uid", "1", "--id", "2"])]
    fn rejects_ambiguous_or_missing_targets(#[case] argv: &[&str]) {
        assert!(CliArgs::try_parse_from(argv).is_err());
    }

    #[rstest]
    fn explicit_blank_database_url_is_rejected() {
        assert!(resolve_database_url(Some("  ".to_owned())).is_err());
    }

    #[rstest]
    #[case(Action::Promote, true, true)]
    #[case(Action::Ban, false, true)]
    #[case(Action::Unban, false, false)]
    fn actions_update_flags(#[case] action: Action, #[case] admin: bool, #[case] banned: bool) {
        let mut user = User::from_identity(&facebook_identity("42", "Grace"), fixture_timestamp());
        user.set_banned(true, fixture_timestamp());
        if action == Action::Ban {
            user.set_banned(false, fixture_timestamp());
        }

        action.apply(&mut user, fixture_timestamp());

        assert_eq!(user.is_admin(), admin);
        assert_eq!(user.is_banned(), banned);
    }
}
