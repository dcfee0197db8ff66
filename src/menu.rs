use colored::Colorize;
use inquire::Select;

use crate::{
    app::App,
    commands::{
        add_identity, delete_identity, list_all_identities, run_wizard, show_current_identity,
        switch_identity,
    },
    error::AppError,
    identity::Identity,
    storage::check_if_identities_exist,
    validation::{
        prompt_until_valid, validate_email, validate_identity_name, validate_username, BACK_OPTION,
    },
};

/// Runs interactive menu interface
pub async fn run_menu(app: &App) -> Result<(), AppError> {
    loop {
        let actions: Vec<&'static str> = vec![
            "switch identity",
            "add identity",
            "delete identity",
            "show current identity",
            "show all identities",
            "ssh setup wizard",
            "quit",
        ];

        let action_selected: &'static str =
            Select::new(&format!("{}", "select action".blue()), actions).prompt()?;

        let result = match action_selected {
            "switch identity" => menu_switch_identity(app).await,
            "add identity" => menu_add_identity(app),
            "delete identity" => menu_delete_identity(app),
            "show current identity" => show_current_identity(app).await,
            "show all identities" => list_all_identities(app),
            "ssh setup wizard" => run_wizard(app).await,
            "quit" => {
                println!("{}", "quitting".yellow());
                break Ok(());
            }
            _ => unreachable!("unexpected input"),
        };

        // stay in the menu unless the prompt itself failed
        match result {
            Err(err @ AppError::Inquire(_)) => break Err(err),
            Err(err) => println!("{}", err.to_string().red()),
            Ok(()) => {}
        }
    }
}

/// Menu for switching identities
async fn menu_switch_identity(app: &App) -> Result<(), AppError> {
    let identities: Vec<Identity> = app.manager().list()?;
    check_if_identities_exist(&identities)?;

    let names: Vec<String> = build_name_list(&identities);
    let name_to_switch: String =
        Select::new(&format!("{}", "select identity to switch:".blue()), names).prompt()?;

    if name_to_switch != BACK_OPTION {
        switch_identity(app, &name_to_switch).await?;
    }

    Ok(())
}

/// Menu for adding a new identity
fn menu_add_identity(app: &App) -> Result<(), AppError> {
    let identities: Vec<Identity> = app.manager().list()?;

    // Input validation
    let name: String = prompt_until_valid(&format!("{}", "enter identity name:".blue()), |input| {
        validate_identity_name(input, &identities)
    })?;

    let username: String =
        prompt_until_valid(&format!("{}", "enter git username:".blue()), validate_username)?;

    let email: String = prompt_until_valid(&format!("{}", "enter git email:".blue()), validate_email)?;

    add_identity(app, &name, &username, &email)
}

/// Menu for deleting an identity
fn menu_delete_identity(app: &App) -> Result<(), AppError> {
    let identities: Vec<Identity> = app.manager().list()?;
    check_if_identities_exist(&identities)?;

    let names: Vec<String> = build_name_list(&identities);
    let name_to_delete: String =
        Select::new(&format!("{}", "select identity to delete:".blue()), names).prompt()?;

    if name_to_delete != BACK_OPTION {
        delete_identity(app, &name_to_delete)?;
    }

    Ok(())
}

/// Builds list of identity names for menu to display
pub fn build_name_list(identities: &[Identity]) -> Vec<String> {
    let mut names: Vec<String> = identities
        .iter()
        .map(|identity| identity.name.clone())
        .collect();
    names.push(BACK_OPTION.to_string());
    names
}
