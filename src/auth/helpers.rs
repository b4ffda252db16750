#[derive(Debug, PartialEq, Eq)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
}

/// Extracts the token from a `Bearer` Authorization header.
/// Returns `Ok(None)` if no header is present.
pub fn extract_bearer_token(auth_header: Option<&str>) -> Result<Option<String>, TokenValidationError> {
    let Some(header) = auth_header else {
        return Ok(None);
    };

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(TokenValidationError::InvalidScheme)?
        .trim();

    if token.is_empty() {
        return Err(TokenValidationError::InvalidToken);
    }
    Ok(Some(token.to_string()))
}

/// Compares a presented token with the configured one.
///
/// Always walks the full configured token, so timing does not reveal the
/// length of the matching prefix.
pub fn tokens_match(presented: &str, configured: &str) -> bool {
    let presented = presented.as_bytes();
    let configured = configured.as_bytes();

    let mut diff = presented.len() ^ configured.len();
    for (i, &byte) in configured.iter().enumerate() {
        diff |= usize::from(byte ^ presented.get(i).copied().unwrap_or(0));
    }
    diff == 0
}
