use crate::error::AppError;
use bcrypt::{hash, verify};

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, password_digest: &str) -> Result<bool, AppError> {
    verify(password, password_digest)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing_and_verification() {
        let password = "qwerty";
        let digest = hash_password(password, 4).unwrap();

        assert_ne!(digest, password);
        assert!(verify_password(password, &digest).unwrap());
        assert!(!verify_password("wrong_password", &digest).unwrap());
    }

    #[test]
    fn test_verify_with_invalid_digest() {
        match verify_password("qwerty", "invalidhashformat") {
            Err(AppError::InternalServerError(msg)) => {
                assert!(msg.contains("Failed to verify password"));
            }
            // Some bcrypt versions report a malformed digest as a plain mismatch.
            Ok(false) => {}
            Ok(true) => panic!("Password verification should fail for invalid hash format"),
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }
}
