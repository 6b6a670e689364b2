#![forbid(unsafe_code)]

const MAX_IDENT_LEN: usize = 64;

/// A table, column or index name that is safe to interpolate into DDL and catalog pragmas.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SqlIdent(String);

impl SqlIdent {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, SqlIdentError> {
        let value = value.into();
        validate_ident(&value)?;
        Ok(Self(value))
    }
}

impl std::fmt::Display for SqlIdent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SqlIdentError {
    Empty,
    TooLong,
    InvalidFirstChar,
    InvalidChar { ch: char, index: usize },
}

impl SqlIdentError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "identifier must not be empty",
            Self::TooLong => "identifier is too long",
            Self::InvalidFirstChar => "identifier must start with a letter or '_'",
            Self::InvalidChar { .. } => "identifier may only contain letters, digits and '_'",
        }
    }
}

pub fn is_valid_ident(value: &str) -> bool {
    validate_ident(value).is_ok()
}

fn validate_ident(value: &str) -> Result<(), SqlIdentError> {
    if value.is_empty() {
        return Err(SqlIdentError::Empty);
    }
    if value.len() > MAX_IDENT_LEN {
        return Err(SqlIdentError::TooLong);
    }
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(SqlIdentError::Empty);
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(SqlIdentError::InvalidFirstChar);
    }
    for (index, ch) in value.chars().enumerate().skip(1) {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            continue;
        }
        return Err(SqlIdentError::InvalidChar { ch, index });
    }
    Ok(())
}
