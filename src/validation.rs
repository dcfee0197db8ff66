use colored::Colorize;
use inquire::Text;
use validator::ValidateEmail;

use crate::{error::AppError, identity::Identity};

/// Menu entry used to leave a selection list
pub const BACK_OPTION: &str = "back";

/// Maximum length for identity name
const MAX_NAME_LENGTH: usize = 30;
/// Maximum length for Git username
const MAX_USERNAME_LENGTH: usize = 50;
/// Maximum length for Git email address
const MAX_EMAIL_LENGTH: usize = 100;

/// Prompts user for input until valid input is provided
pub fn prompt_until_valid<F>(prompt_message: &str, input_validation: F) -> Result<String, AppError>
where
    F: Fn(&str) -> Result<(), AppError>,
{
    loop {
        let input: String = Text::new(prompt_message).prompt()?;
        let input = input.trim().to_string();
        match input_validation(&input) {
            Ok(_) => break Ok(input),
            Err(AppError::Validation(msg)) => println!("{}", msg.red()),
            Err(e) => return Err(e),
        }
    }
}

// Validate input helper functions

/// Validates an identity name against the stored identities
pub fn validate_identity_name(name: &str, existing: &[Identity]) -> Result<(), AppError> {
    if name.is_empty() {
        Err(AppError::Validation("Name cannot be empty".to_string()))
    } else if name.chars().count() > MAX_NAME_LENGTH {
        Err(AppError::Validation(format!("Name too long (max {} characters)", MAX_NAME_LENGTH)))
    } else if name == BACK_OPTION {
        Err(AppError::Validation("Name cannot be 'back'".to_string()))
    } else if existing.iter().any(|identity| identity.name == name) {
        Err(AppError::Validation(format!("Identity '{}' already exists", name)))
    } else {
        Ok(())
    }
}

/// Validates username input
pub fn validate_username(username: &str) -> Result<(), AppError> {
    if username.is_empty() {
        Err(AppError::Validation("Username cannot be empty".to_string()))
    } else if username.chars().count() > MAX_USERNAME_LENGTH {
        Err(AppError::Validation(format!("Username too long (max {} characters)", MAX_USERNAME_LENGTH)))
    } else {
        Ok(())
    }
}

/// Validates email input
pub fn validate_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() {
        Err(AppError::Validation("Email cannot be empty".to_string()))
    } else if email.len() > MAX_EMAIL_LENGTH {
        Err(AppError::Validation(format!("Email too long (max {} characters)", MAX_EMAIL_LENGTH)))
    } else if !email.validate_email() {
        Err(AppError::Validation("Invalid email format".to_string()))
    } else {
        Ok(())
    }
}
