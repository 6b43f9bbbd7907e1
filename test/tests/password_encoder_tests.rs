//! Password Encoder tests.
//!
//! Tests for the bcrypt encoder the demo stores its users with.

use session_guard_core::http::security::{
    BCryptPasswordEncoder, InMemoryUserRepository, PasswordEncoder, UserRepository,
};
use session_guard_test::seed_users;

#[actix_web::test]
async fn test_seeded_passwords_are_hashed() {
    let encoder = BCryptPasswordEncoder::with_cost(4);
    let repository = InMemoryUserRepository::new();
    seed_users(&repository, &encoder).await.unwrap();

    assert_eq!(repository.len().await, 3);
    for username in ["admin", "manager", "user"] {
        let record = repository.find_by_username(username).await.unwrap().unwrap();

        // Never the plain password
        assert_ne!(record.password, username);
        assert!(record.password.starts_with("$2"));
        assert!(encoder.matches(username, &record.password));
        assert!(!encoder.matches("wrong_password", &record.password));
    }
}

#[actix_web::test]
async fn test_password_hashes_are_different() {
    let encoder = BCryptPasswordEncoder::with_cost(4);
    let password = "same_password";

    let hash1 = encoder.encode(password).unwrap();
    let hash2 = encoder.encode(password).unwrap();

    // Different salts should produce different hashes
    assert_ne!(hash1, hash2);

    // Both should still verify
    assert!(encoder.matches(password, &hash1));
    assert!(encoder.matches(password, &hash2));
}
