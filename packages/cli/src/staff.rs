//! Staff account creation from the terminal.

use dialoguer::{Input, Password, Select};
use relief_map_user::{UserDirectory, UserError};
use relief_map_user_models::{Caller, NewUser, Role, User};

use crate::Commands;

/// Identity used for accounts created from the CLI.
const OPERATOR: &str = "cli-operator";

/// Creates a staff account, prompting for the password.
///
/// # Errors
///
/// Returns an error if the prompt fails or the directory rejects the
/// account.
pub fn create(
    users: &UserDirectory,
    name: String,
    role: Role,
    department: String,
    phone: String,
) -> Result<User, Box<dyn std::error::Error>> {
    if role == Role::Citizen {
        return Err(UserError::Validation {
            field: "role",
            message: "Citizens register through the app".to_string(),
        }
        .into());
    }

    let password = Password::new()
        .with_prompt(format!("Password for {name}"))
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;

    let operator = Caller {
        name: OPERATOR.to_string(),
        role: Role::Admin,
    };
    let user = users.register(
        Some(&operator),
        NewUser {
            name,
            password,
            role,
            department: Some(department),
            phone,
            national_id: None,
            address: None,
            emergency_contact: None,
        },
    )?;
    Ok(user)
}

/// Prompts for the non-secret staff fields.
///
/// # Errors
///
/// Returns an error if a prompt fails.
pub fn prompt_details() -> Result<Commands, dialoguer::Error> {
    let name: String = Input::new().with_prompt("Account name").interact_text()?;

    let roles = [Role::Worker, Role::Admin];
    let labels = ["Worker (field team)", "Admin"];
    let idx = Select::new()
        .with_prompt("Role")
        .items(&labels)
        .default(0)
        .interact()?;

    let department: String = Input::new()
        .with_prompt("Department")
        .default("Disaster Response".to_string())
        .interact_text()?;
    let phone: String = Input::new().with_prompt("Phone").interact_text()?;

    Ok(Commands::CreateStaff {
        name,
        role: roles[idx],
        department,
        phone,
    })
}
