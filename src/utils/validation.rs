use crate::utils::error::{InviteError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(InviteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_number<T>(field_name: &str, value: T, min_value: T) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min_value {
        return Err(InviteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(InviteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_file_extension(field_name: &str, filename: &str, allowed_extension: &str) -> Result<()> {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    if extension != allowed_extension {
        return Err(InviteError::BadRequest {
            message: format!(
                "invalid '{}' file extension for {}, expected '.{}'",
                if extension.is_empty() {
                    String::new()
                } else {
                    format!(".{}", extension)
                },
                field_name,
                allowed_extension
            ),
        });
    }

    Ok(())
}
