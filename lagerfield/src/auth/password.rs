use bcrypt::{hash, verify};

use super::{AuthError, AuthResult};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// bcrypt ignores input past 72 bytes.
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Hash on the blocking pool; bcrypt is CPU bound.
pub async fn hash_password(password: &str, cost: u32) -> AuthResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string())))
        .await
        .map_err(|e| AuthError::Hashing(format!("task join error: {e}")))?
}

pub async fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || verify(password, &hash).map_err(|e| AuthError::Hashing(e.to_string())))
        .await
        .map_err(|e| AuthError::Hashing(format!("task join error: {e}")))?
}

pub fn validate_password(password: &str) -> AuthResult<()> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hashed = hash_password("correct horse", 4).await.unwrap();
        assert_ne!(hashed, "correct horse");
        assert!(verify_password("correct horse", &hashed).await.unwrap());
        assert!(!verify_password("wrong horse", &hashed).await.unwrap());
    }

    #[test]
    fn length_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password(&"x".repeat(73)).is_err());
    }
}
