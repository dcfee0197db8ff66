use colored::Colorize;

use crate::{
    app::App,
    error::AppError,
    storage::check_if_identities_exist,
    wizard::{prompt, stdio},
};

/// Switches the workspace to the identity called `name`
pub async fn switch_identity(app: &App, name: &str) -> Result<(), AppError> {
    let identity = app.manager().switch(name, app.workspace()).await?;
    println!(
        "{} {} ({} <{}>)",
        "switched to identity:".green(),
        identity.name,
        identity.username,
        identity.email
    );
    Ok(())
}

pub fn add_identity(app: &App, name: &str, username: &str, email: &str) -> Result<(), AppError> {
    app.manager().add(name, username, email)?;
    println!("{}", "identity added".green());
    Ok(())
}

/// Deletes `name`; an unknown name is reported but is not an error
pub fn delete_identity(app: &App, name: &str) -> Result<(), AppError> {
    if app.manager().delete(name)? {
        println!("{}", "identity deleted".green());
    } else {
        println!("{} '{}'", "identity not found:".yellow(), name);
    }
    Ok(())
}

/// Shows the workspace Git identity and which stored identity it is
pub async fn show_current_identity(app: &App) -> Result<(), AppError> {
    let current = app.manager().current(app.workspace()).await?;
    let username = current.git.username.as_deref().unwrap_or("<unset>");
    let email = current.git.email.as_deref().unwrap_or("<unset>");

    match current.matched {
        Some(identity) => println!(
            "{} {} <{}> [{}]",
            "current identity:".blue(),
            username,
            email,
            identity.name.green()
        ),
        None => println!("{} {} <{}>", "current identity:".blue(), username, email),
    }
    Ok(())
}

/// Lists all stored identities
pub fn list_all_identities(app: &App) -> Result<(), AppError> {
    let identities = app.manager().list()?;
    check_if_identities_exist(&identities)?;

    for identity in identities {
        println!(
            "{} {} <{}>",
            identity.name.bold(),
            identity.username,
            identity.email
        );
    }
    Ok(())
}

/// Runs the interactive SSH wizard
pub async fn run_wizard(app: &App) -> Result<(), AppError> {
    let controller = app.wizard();
    prompt::run_wizard(&controller, app.manager()).await
}

/// Serves the wizard protocol on stdin/stdout
pub async fn serve_wizard(app: &App) -> Result<(), AppError> {
    let controller = app.wizard();
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    stdio::serve(&controller, stdin, tokio::io::stdout()).await
}
