use crate::utils::error::AppError;

// Same constraints the frontend enforces on its forms.
const NAME_MIN: usize = 3;
const NAME_MAX: usize = 100;
const PASSWORD_MIN: usize = 4;
const PASSWORD_MAX: usize = 100;

pub fn validate_name(name: &str) -> Result<(), AppError> {
    let len = name.chars().count();
    if len < NAME_MIN || len > NAME_MAX {
        return Err(AppError::Validation(format!(
            "\"name\" length must be between {} and {} characters",
            NAME_MIN, NAME_MAX
        )));
    }
    Ok(())
}

/// Cheap structural check: one '@', non-empty local part, dotted domain.
/// Deliverability is not our problem.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");

    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.is_empty();

    if local.is_empty() || !domain_ok || email.contains(char::is_whitespace) {
        return Err(AppError::Validation(
            "\"email\" must be a valid email".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN || len > PASSWORD_MAX {
        return Err(AppError::Validation(format!(
            "\"password\" length must be between {} and {} characters",
            PASSWORD_MIN, PASSWORD_MAX
        )));
    }
    Ok(())
}

pub fn validate_role(role: &str) -> Result<crate::models::Role, AppError> {
    crate::models::Role::parse(role).ok_or_else(|| {
        AppError::Validation(format!(
            "\"role\" must be one of [user, admin, editor], got \"{}\"",
            role
        ))
    })
}
