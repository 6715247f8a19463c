//! Terminal front end for the client: each command is a navigation through
//! the router guard followed by the gateway calls the target view needs.

use clap::Subcommand;
use thiserror::Error;
use tracing::info;

use crate::client::router::{LOGIN_PATH, Navigation, Router, View};
use crate::client::session::{Session, SessionError};
use crate::client::{Gateway, GatewayError};
use crate::config::ClientConfig;
use crate::db::models::{ApplicationWithJob, JobRow};

#[derive(Debug, Subcommand)]
pub enum ClientCommand {
    /// Create an account and log in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to the password
        #[arg(long)]
        password_confirmation: Option<String>,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List open positions
    Jobs,
    Job { id: i64 },
    /// Open a client path such as /dashboard or /apply/3
    Open { path: String },
    /// List your applications
    Applications,
    Apply {
        job_id: i64,
        #[arg(long)]
        reason: String,
    },
    Show { id: i64 },
    Edit {
        id: i64,
        #[arg(long)]
        reason: String,
    },
    /// Withdraw (delete) an application
    Withdraw { id: i64 },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("please log in first: job-board client login --email <EMAIL> --password <PASSWORD>")]
    LoginRequired,
    #[error("already logged in; log out first")]
    AlreadyLoggedIn,
    #[error("no page at {0}")]
    NotFound(String),
}

impl From<Navigation> for CliError {
    fn from(navigation: Navigation) -> Self {
        match navigation {
            Navigation::Show { path, .. } if path == LOGIN_PATH => CliError::LoginRequired,
            Navigation::Show { .. } => CliError::AlreadyLoggedIn,
            Navigation::NotFound { path } => CliError::NotFound(path),
        }
    }
}

/// Navigate to `path`; any guard redirect becomes an error
fn enter(router: &Router, session: &Session, path: &str) -> Result<View, CliError> {
    match router.navigate(path, session) {
        Navigation::Show { path: reached, view } if reached == path => Ok(view),
        other => Err(other.into()),
    }
}

fn print_job(job: &JobRow) {
    println!("#{} {}", job.id, job.title);
    println!("    {}", job.description);
}

fn print_application(entry: &ApplicationWithJob) {
    let application = &entry.application;
    println!(
        "#{} {} (applied {})",
        application.id,
        entry.job.title,
        application.created_at.format("%Y-%m-%d %H:%M")
    );
    println!("    {}", application.reason);
}

fn print_error(err: &CliError) {
    eprintln!("error: {err}");
    if let CliError::Gateway(GatewayError::Api { errors, .. }) = err {
        for (field, messages) in errors {
            for message in messages {
                eprintln!("  {field}: {message}");
            }
        }
    }
    if let CliError::Gateway(gateway_err) = err {
        if let Some(path) = gateway_err.redirect() {
            eprintln!("(redirected to {path})");
        }
    }
}

async fn render(gateway: &mut Gateway, view: View) -> Result<(), CliError> {
    match view {
        View::Dashboard => {
            let user = gateway.user().await?;
            println!("Logged in as {} <{}>", user.name, user.email);
            println!();
            println!("Open positions:");
            for job in gateway.jobs().await? {
                print_job(&job);
            }
            println!();
            println!("Your applications:");
            for entry in gateway.applications().await? {
                print_application(&entry);
            }
        }
        View::ApplyJob { job_id } => print_job(&gateway.job(job_id).await?),
        View::EditApplication { id } => print_application(&gateway.application(id).await?),
        View::Login | View::Register => {
            println!("Not logged in. Use `job-board client login` or `job-board client register`.")
        }
    }
    Ok(())
}

async fn execute(
    router: &Router,
    gateway: &mut Gateway,
    command: ClientCommand,
) -> Result<(), CliError> {
    match command {
        ClientCommand::Register {
            name,
            email,
            password,
            password_confirmation,
        } => {
            enter(router, gateway.session(), "/register")?;
            let confirmation = password_confirmation.unwrap_or_else(|| password.clone());
            let user = gateway
                .register(&name, &email, &password, &confirmation)
                .await?;
            println!("Registered and logged in as {} <{}>", user.name, user.email);
        }
        ClientCommand::Login { email, password } => {
            enter(router, gateway.session(), "/login")?;
            let user = gateway.login(&email, &password).await?;
            println!("Logged in as {} <{}>", user.name, user.email);
        }
        ClientCommand::Logout => {
            enter(router, gateway.session(), "/dashboard")?;
            println!("{}", gateway.logout().await?);
        }
        ClientCommand::Whoami => {
            enter(router, gateway.session(), "/dashboard")?;
            let user = gateway.user().await?;
            println!("{} <{}> (id {})", user.name, user.email, user.id);
        }
        ClientCommand::Jobs => {
            for job in gateway.jobs().await? {
                print_job(&job);
            }
        }
        ClientCommand::Job { id } => print_job(&gateway.job(id).await?),
        ClientCommand::Open { path } => match router.navigate(&path, gateway.session()) {
            Navigation::Show { path, view } => {
                info!("Opening {}", path);
                render(gateway, view).await?;
            }
            Navigation::NotFound { path } => return Err(CliError::NotFound(path)),
        },
        ClientCommand::Applications => {
            enter(router, gateway.session(), "/dashboard")?;
            for entry in gateway.applications().await? {
                print_application(&entry);
            }
        }
        ClientCommand::Apply { job_id, reason } => {
            enter(router, gateway.session(), &format!("/apply/{job_id}"))?;
            let response = gateway.create_application(job_id, &reason).await?;
            println!("{}", response.message);
            print_application(&response.application);
        }
        ClientCommand::Show { id } => {
            enter(router, gateway.session(), &format!("/edit-application/{id}"))?;
            print_application(&gateway.application(id).await?);
        }
        ClientCommand::Edit { id, reason } => {
            enter(router, gateway.session(), &format!("/edit-application/{id}"))?;
            let response = gateway.update_application(id, &reason).await?;
            println!("{}", response.message);
            print_application(&response.application);
        }
        ClientCommand::Withdraw { id } => {
            enter(router, gateway.session(), "/dashboard")?;
            println!("{}", gateway.delete_application(id).await?);
        }
    }
    Ok(())
}

async fn run_command(config: &ClientConfig, command: ClientCommand) -> Result<(), CliError> {
    let session = Session::load(&config.session_file)?;
    let mut gateway = Gateway::new(config.api_base_url.clone(), session)?;
    execute(&Router::new(), &mut gateway, command).await
}

/// Run one client command; returns false when it failed
pub async fn run(config: &ClientConfig, command: ClientCommand) -> bool {
    match run_command(config, command).await {
        Ok(()) => true,
        Err(err) => {
            print_error(&err);
            false
        }
    }
}
