/// Errors raised while converting areas into pixel budgets.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AreaError {
    /// The reference area was zero, negative or not a finite number.
    #[error("invalid country area {area} km²: must be a positive, finite number")]
    InvalidArea { area: f64 },
}

/// Errors raised while parsing a configured color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    /// The value did not start with `#`.
    #[error("color '{0}' must start with '#'")]
    MissingHash(String),

    /// The value had a length other than 3, 6 or 8 hex digits.
    #[error("color '{0}' must have 3, 6 or 8 hex digits")]
    BadLength(String),

    /// The value contained a non-hex character.
    #[error("color '{0}' contains a non-hex digit")]
    BadDigit(String),
}
