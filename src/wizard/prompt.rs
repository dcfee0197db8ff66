use colored::Colorize;
use inquire::{Confirm, Select, Text};

use crate::{
    error::AppError,
    manager::IdentityManager,
    ssh::provider::Provider,
    validation::{prompt_until_valid, validate_username},
    wizard::{
        controller::WizardController,
        machine::{IdentityInfo, WizardStep},
    },
};

const GENERATE_KEY: &str = "generate key";
const COPY_PUBLIC_KEY: &str = "copy public key";
const CONTINUE: &str = "continue";
const WRITE_SSH_CONFIG: &str = "write ssh config";
const TEST_CONNECTION: &str = "test connection";
const FINISH: &str = "finish";
const BACK: &str = "back";
const QUIT: &str = "quit";

/// What the wizard loop does after a step
enum Flow {
    Stay,
    Finish,
    Quit,
}

fn report(err: &AppError) {
    println!("{}", err.to_string().red());
}

/// Runs the interactive SSH setup wizard
pub async fn run_wizard(controller: &WizardController, manager: &IdentityManager) -> Result<(), AppError> {
    println!("{}", "ssh setup wizard".blue().bold());

    loop {
        let step = controller.snapshot().step;
        println!(
            "{}",
            format!("step {}/{}: {}", step.number(), WizardStep::COUNT, step.title()).blue()
        );

        let flow = match step {
            WizardStep::IdentityInfo => identity_step(controller)?,
            WizardStep::GenerateKey => key_step(controller).await?,
            WizardStep::ProviderInstructions => instructions_step(controller).await?,
            WizardStep::ConfigureAndTest => configure_step(controller).await?,
        };

        match flow {
            Flow::Stay => continue,
            Flow::Finish => break,
            Flow::Quit => {
                println!("{}", "wizard closed".yellow());
                return Ok(());
            }
        }
    }

    offer_to_save(controller, manager)
}

fn identity_step(controller: &WizardController) -> Result<Flow, AppError> {
    let identity_name = Text::new(&format!("{}", "identity name:".blue())).prompt()?;
    let email = Text::new(&format!("{}", "email:".blue())).prompt()?;
    let provider = Select::new(&format!("{}", "provider:".blue()), Provider::ALL.to_vec()).prompt()?;
    let host_name = match provider.default_host() {
        Some(_) => None,
        None => Some(Text::new(&format!("{}", "host name (e.g. git.example.com):".blue())).prompt()?),
    };

    if let Err(err) = controller.submit_identity(IdentityInfo {
        identity_name,
        email,
        provider,
        host_name,
    }) {
        report(&err);
    }
    Ok(Flow::Stay)
}

async fn key_step(controller: &WizardController) -> Result<Flow, AppError> {
    let action = Select::new(&format!("{}", "next:".blue()), vec![GENERATE_KEY, BACK, QUIT]).prompt()?;

    match action {
        GENERATE_KEY => match controller.generate_key().await {
            Ok(pair) => println!("{} {}", "key ready:".green(), pair.key_name),
            Err(AppError::KeyExists(path)) => {
                println!("{} {}", "a key already exists at".yellow(), path.display());
                let reuse = Confirm::new("use the existing key instead of generating a new one?")
                    .with_default(true)
                    .prompt()?;
                if reuse {
                    match controller.reuse_existing_key().await {
                        Ok(pair) => println!("{} {}", "using key:".green(), pair.key_name),
                        Err(err) => report(&err),
                    }
                }
            }
            Err(err) => report(&err),
        },
        BACK => {
            controller.back()?;
        }
        QUIT => return Ok(Flow::Quit),
        _ => unreachable!("unexpected input"),
    }
    Ok(Flow::Stay)
}

async fn instructions_step(controller: &WizardController) -> Result<Flow, AppError> {
    let instructions = controller.instructions()?;
    let snapshot = controller.snapshot();

    println!("{}", instructions.title.bold());
    for (index, step) in instructions.steps.iter().enumerate() {
        println!("  {}. {}", index + 1, step);
    }
    if let Some(public_key) = &snapshot.session.public_key {
        println!("\n{}\n", public_key);
    }

    let action = Select::new(
        &format!("{}", "next:".blue()),
        vec![COPY_PUBLIC_KEY, CONTINUE, BACK, QUIT],
    )
    .prompt()?;

    match action {
        COPY_PUBLIC_KEY => match controller.copy_public_key(None).await {
            Ok(()) => println!("{}", "public key copied to clipboard".green()),
            Err(err) => report(&err),
        },
        CONTINUE => {
            if let Err(err) = controller.continue_to_configure() {
                report(&err);
            }
        }
        BACK => {
            controller.back()?;
        }
        QUIT => return Ok(Flow::Quit),
        _ => unreachable!("unexpected input"),
    }
    Ok(Flow::Stay)
}

async fn configure_step(controller: &WizardController) -> Result<Flow, AppError> {
    let action = Select::new(
        &format!("{}", "next:".blue()),
        vec![WRITE_SSH_CONFIG, TEST_CONNECTION, FINISH, BACK],
    )
    .prompt()?;

    match action {
        WRITE_SSH_CONFIG => match controller.update_ssh_config() {
            Ok(update) => {
                if update.written {
                    println!("{} {}", "added host alias:".green(), update.host_alias);
                } else {
                    println!("{} {}", "host alias already configured:".yellow(), update.host_alias);
                }
                println!("{} {}", "clone with:".blue(), update.clone_example);
            }
            Err(err) => report(&err),
        },
        TEST_CONNECTION => match controller.test_connection().await {
            Ok(probe) if probe.success => println!("{}", "connection successful".green()),
            Ok(probe) => {
                println!("{}", "connection test failed".red());
                println!("{}", probe.output);
            }
            Err(err) => report(&err),
        },
        FINISH => return Ok(Flow::Finish),
        BACK => {
            controller.back()?;
        }
        _ => unreachable!("unexpected input"),
    }
    Ok(Flow::Stay)
}

/// Offers to store the wizard's identity in the identity list
fn offer_to_save(controller: &WizardController, manager: &IdentityManager) -> Result<(), AppError> {
    let session = controller.snapshot().session;
    let (Some(identity_name), Some(email)) = (session.identity_name, session.email) else {
        return Ok(());
    };

    if manager.list()?.iter().any(|identity| identity.name == identity_name) {
        return Ok(());
    }

    let save = Confirm::new(&format!("save '{}' as a git identity?", identity_name))
        .with_default(true)
        .prompt()?;
    if !save {
        return Ok(());
    }

    let username = prompt_until_valid(&format!("{}", "enter git username:".blue()), validate_username)?;
    match manager.add(&identity_name, &username, &email) {
        Ok(_) => println!("{}", "identity added".green()),
        Err(err) => report(&err),
    }
    Ok(())
}
