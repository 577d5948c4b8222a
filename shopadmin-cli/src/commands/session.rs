use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Subcommand};
use client::{
    AdminClient, ApiError, AuthStore, GuardOutcome, RouteGuard, api::DEFAULT_API_URL,
    guard::GuardPaths,
};
use directories::BaseDirs;
use reqwest::cookie::{CookieStore, Jar};
use rpassword::prompt_password;
use shared::{
    config::ConsoleConfig,
    models::{Identity, LoginRequest},
};
use tracing::debug;
use url::Url;

const LOGIN_HINT: &str = "not signed in; run `shopadmin session login` first";

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Sign in and store the session cookie
    Login(LoginArgs),
    /// Show who the stored session belongs to
    Whoami,
    /// Sign out and forget the stored session cookie
    Logout,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long, short, help = "Email address to sign in with. Prompted for when omitted.")]
    pub email: Option<String>,

    #[arg(
        long,
        help = "Read the password from the first line of stdin instead of prompting."
    )]
    pub password_stdin: bool,
}

/// A signed-in client, ready for resource calls.
#[derive(Debug)]
pub struct Session {
    pub client: Arc<AdminClient>,
    pub identity: Identity,
}

pub async fn run(command: SessionCommand, config: &ConsoleConfig) -> Result<()> {
    match command {
        SessionCommand::Login(args) => login(args, config).await,
        SessionCommand::Whoami => whoami(config).await,
        SessionCommand::Logout => logout(config).await,
    }
}

async fn login(args: LoginArgs, config: &ConsoleConfig) -> Result<()> {
    let origin = api_origin(config)?;
    let jar_path = session_path(config);
    ensure_parent(&jar_path)?;

    let email = match args.email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = if args.password_stdin {
        read_stdin_line()?
    } else {
        prompt_password("Password: ")?
    };
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }

    let jar = Arc::new(Jar::default());
    let client = Arc::new(AdminClient::new(&config.api, jar.clone())?);
    let store = AuthStore::mount(client);
    store.settled().await;

    store
        .begin_session(&LoginRequest::new(email, password))
        .await
        .context("login failed")?;

    persist_cookie_jar(&jar, &origin, &jar_path)?;
    if let Some(identity) = store.identity() {
        print_identity(&identity);
    }
    println!("cookies stored at {}", jar_path.display());
    Ok(())
}

async fn whoami(config: &ConsoleConfig) -> Result<()> {
    let session = require_session(config).await?;
    print_identity(&session.identity);
    Ok(())
}

async fn logout(config: &ConsoleConfig) -> Result<()> {
    let origin = api_origin(config)?;
    let jar_path = session_path(config);

    match load_cookie_jar(&origin, &jar_path) {
        Ok(jar) => {
            let client = Arc::new(AdminClient::new(&config.api, jar)?);
            let store = AuthStore::mount(client);
            store.settled().await;
            store.end_session().await;
        }
        Err(err) => eprintln!("warning: {err}"),
    }

    if jar_path.exists() {
        fs::remove_file(&jar_path)
            .with_context(|| format!("failed to remove session jar {}", jar_path.display()))?;
        println!("Removed session cookies at {}", jar_path.display());
    } else {
        println!("No session cookies found at {}", jar_path.display());
    }
    Ok(())
}

/// Loads the stored session and waits for the guard to admit it.
pub async fn require_session(config: &ConsoleConfig) -> Result<Session> {
    let origin = api_origin(config)?;
    let jar_path = session_path(config);
    let jar = load_cookie_jar(&origin, &jar_path).context(LOGIN_HINT)?;

    let client = Arc::new(AdminClient::new(&config.api, jar.clone())?);
    let store = AuthStore::mount(client.clone());
    let mut guard = RouteGuard::protected(GuardPaths::from(&config.session), store.subscribe());

    let outcome = guard.settle().await;
    match (outcome, store.identity()) {
        (GuardOutcome::Render, Some(identity)) => {
            persist_cookie_jar(&jar, &origin, &jar_path)?;
            Ok(Session { client, identity })
        }
        (outcome, _) => {
            debug!(?outcome, "stored session rejected");
            Err(anyhow!(LOGIN_HINT))
        }
    }
}

/// Turns a 401 into the login hint; other errors pass through.
pub fn explain(err: ApiError) -> anyhow::Error {
    if err.is_authentication_required() {
        anyhow!(LOGIN_HINT)
    } else {
        err.into()
    }
}

fn api_origin(config: &ConsoleConfig) -> Result<Url> {
    match &config.api.base_url {
        Some(url) => Ok(url.clone()),
        None => Url::parse(DEFAULT_API_URL).context("invalid default API url"),
    }
}

pub fn session_path(config: &ConsoleConfig) -> PathBuf {
    if let Some(path) = &config.session.jar_path {
        return path.clone();
    }
    BaseDirs::new().map_or_else(
        || PathBuf::from("./session.cookies"),
        |dirs| dirs.config_dir().join("shopadmin").join("session.cookies"),
    )
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim().to_string();
    if trimmed.is_empty() {
        bail!("input must not be empty");
    }
    Ok(trimmed)
}

fn read_stdin_line() -> Result<String> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create session directory {}", parent.display()))?;
    }
    Ok(())
}

/// Rebuilds a jar from the `name=value; ...` line written by
/// [`persist_cookie_jar`].
pub fn load_cookie_jar(origin: &Url, path: &Path) -> Result<Arc<Jar>> {
    if !path.exists() {
        bail!("session cookie jar not found at {}", path.display());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read session jar {}", path.display()))?;
    let jar = Arc::new(Jar::default());
    for entry in contents.split(';') {
        let cookie = entry.trim();
        if !cookie.is_empty() {
            jar.add_cookie_str(cookie, origin);
        }
    }
    Ok(jar)
}

/// Writes the cookies for `origin` to `path`, readable by the owner only.
/// An empty jar removes the file.
pub fn persist_cookie_jar(jar: &Jar, origin: &Url, path: &Path) -> Result<()> {
    if let Some(header) = jar.cookies(origin) {
        write_private(path, header.to_str()?.as_bytes())
            .with_context(|| format!("failed to write session jar at {}", path.display()))?;
    } else if path.exists() {
        fs::remove_file(path).ok();
    }
    Ok(())
}

/// Creates the file owner-only and tightens an existing one before any
/// bytes land in it.
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)
}

fn print_identity(identity: &Identity) {
    println!("Logged in as {} <{}>", identity.username, identity.email);
    println!("role: {}", identity.role);
}
