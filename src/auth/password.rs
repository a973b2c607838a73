use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};

/// Checks a login password against the stored PHC hash.
pub fn verify_password(password: &str, hashed: &str) -> Result<(), argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let parsed = PasswordHash::new(hashed)?;

    argon2.verify_password(password.as_bytes(), &parsed)
}
