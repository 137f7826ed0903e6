use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};

pub fn verify_password(password: &str, hashed: &str) -> Result<(), argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hashed)?;

    Argon2::default().verify_password(password.as_bytes(), &parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};

    fn hash(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    #[test]
    fn verifies_own_hash_only() {
        let hashed = hash("clock-in");
        assert!(verify_password("clock-in", &hashed).is_ok());
        assert!(verify_password("clock-out", &hashed).is_err());
        assert!(verify_password("clock-in", "not a phc string").is_err());
    }
}
