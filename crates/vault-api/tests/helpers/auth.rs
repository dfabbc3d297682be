use chrono::Duration;
use vault_api::JwtService;
use vault_core::OwnerId;

pub const USER_A: &str = "user-a";
pub const USER_B: &str = "user-b";

/// Sign a one-hour token for `user_id`.
pub fn token_for(jwt: &JwtService, user_id: &str) -> String {
    jwt.issue(&OwnerId::new(user_id), Duration::hours(1))
        .expect("Failed to sign test token")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
