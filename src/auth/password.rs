//! # 密码处理
//!
//! bcrypt 哈希与校验

use bcrypt::{DEFAULT_COST, hash, verify};
use tracing::error;

use crate::error::Result;

/// 哈希明文密码
pub fn hash_password(password: &str) -> Result<String> {
    match hash(password, DEFAULT_COST) {
        Ok(hashed) => Ok(hashed),
        Err(err) => {
            error!("Failed to hash password: {err}");
            Err(crate::internal_error!("密码加密失败"))
        }
    }
}

/// 校验明文密码与哈希是否匹配
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    match verify(password, password_hash) {
        Ok(matched) => Ok(matched),
        Err(err) => {
            error!("Failed to verify password: {err}");
            Err(crate::internal_error!("密码校验失败"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password("secret123").expect("hash");
        assert!(verify_password("secret123", &hashed).expect("verify"));
        assert!(!verify_password("wrong", &hashed).expect("verify"));
    }
}
