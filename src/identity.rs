use crate::errors::IdentityError;
use crate::models::EntryParams;

pub const DEFAULT_NAME: &str = "User";

/// Who is checking in, as stated by the page entry parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn from_params(params: &EntryParams) -> Result<Self, IdentityError> {
        let email = non_blank(params.email.as_deref()).ok_or(IdentityError::MissingEmail)?;
        let name = non_blank(params.name.as_deref()).unwrap_or(DEFAULT_NAME);
        Ok(Self::new(name, email))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
