//! 密码哈希工具模块
//!
//! 使用 Argon2id 算法进行密码哈希和验证

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::errors::TravelbookError;

/// 对密码进行 Argon2id 哈希
pub fn hash_password(password: &str) -> Result<String, TravelbookError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| TravelbookError::internal(format!("Password hash error: {}", e)))
}

/// 验证密码是否匹配哈希
///
/// 哈希格式损坏时返回错误，密码不匹配时返回 `Ok(false)`。
pub fn verify_password(password: &str, hash: &str) -> Result<bool, TravelbookError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| TravelbookError::internal(format!("Password verify error: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").expect("hash should succeed");

        assert!(hash.starts_with("$argon2id"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(verify_password("anything", "not-a-hash").is_err());
    }
}
