use crate::infra::Backend;
use clap::Args;
use skillcheck::config::AppConfig;
use skillcheck::error::AppError;
use skillcheck::telemetry::{self, LogSink};

#[derive(Args, Debug)]
pub(crate) struct UserAddArgs {
    /// Login id
    #[arg(long)]
    pub(crate) user: String,
    /// Password; stored as an argon2 PHC hash
    #[arg(long)]
    pub(crate) password: String,
}

pub(crate) fn run_user_add(args: UserAddArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, LogSink::Stderr)?;

    let auth = Backend::authenticator(&config)?;
    let user_id = auth.register(&args.user, &args.password)?;
    println!("Registered user {user_id}");
    Ok(())
}
