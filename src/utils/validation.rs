// ============================================================================
// CLIENT-SIDE VALIDATION - runs before anything reaches the network
// ============================================================================

use crate::models::NewAppointment;
use crate::utils::constants::MIN_PASSWORD_LENGTH;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all fields.")]
    MissingField(&'static str),
    #[error("Password must be at least {min} characters.")]
    PasswordTooShort { min: usize },
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !email.contains(' ') =>
        {
            Ok(())
        }
        _ => Err(ValidationError::InvalidEmail),
    }
}

fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LENGTH });
    }
    Ok(())
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    require(email, "email")?;
    require(password, "password")?;
    Ok(())
}

/// Checks applied by the session manager itself on `register`, without the
/// confirmation field the form carries.
pub fn validate_new_account(
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), ValidationError> {
    require(name, "name")?;
    require(email, "email")?;
    require(password, "password")?;
    check_email(email)?;
    check_password(password)
}

pub fn validate_registration(form: &RegistrationForm) -> Result<(), ValidationError> {
    require(&form.name, "name")?;
    require(&form.email, "email")?;
    require(&form.password, "password")?;
    require(&form.confirm, "confirm")?;
    validate_new_account(&form.name, &form.email, &form.password)?;
    if form.password != form.confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

pub fn validate_new_appointment(data: &NewAppointment) -> Result<(), ValidationError> {
    require(&data.doctor, "doctor")?;
    require(&data.date, "date")?;
    require(&data.reason, "reason")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, password: &str, confirm: &str) -> RegistrationForm {
        RegistrationForm {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            confirm: confirm.into(),
        }
    }

    #[test]
    fn registration_rules() {
        let jane = form("Jane", "jane@x.com", "secret1", "secret1");
        assert_eq!(validate_registration(&jane), Ok(()));
        assert_eq!(
            validate_registration(&form("", "jane@x.com", "secret1", "secret1")),
            Err(ValidationError::MissingField("name"))
        );
        assert_eq!(
            validate_registration(&form("Jane", "jane@x.com", "short", "short")),
            Err(ValidationError::PasswordTooShort { min: 6 })
        );
        assert_eq!(
            validate_registration(&form("Jane", "jane@x.com", "secret1", "secret2")),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            validate_registration(&form("Jane", "jane.x.com", "secret1", "secret1")),
            Err(ValidationError::InvalidEmail)
        );
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            ValidationError::PasswordTooShort { min: 6 }.to_string(),
            "Password must be at least 6 characters."
        );
    }

    #[test]
    fn appointment_fields_must_not_be_blank() {
        let data = NewAppointment::new("Dr. Lee", "2025-01-01T10:00", "checkup");
        assert!(validate_new_appointment(&data).is_ok());
        assert_eq!(
            validate_new_appointment(&NewAppointment::new("Dr. Lee", "  ", "checkup")),
            Err(ValidationError::MissingField("date"))
        );
    }

    #[test]
    fn login_requires_both_fields() {
        assert!(validate_login("demo@medpal.com", "password").is_ok());
        assert_eq!(
            validate_login("demo@medpal.com", ""),
            Err(ValidationError::MissingField("password"))
        );
    }
}
