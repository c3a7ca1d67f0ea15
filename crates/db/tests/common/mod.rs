//! Shared fixtures for repository integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use sqlx::PgPool;
use tally_core::types::{Date, Timestamp};
use tally_db::models::user::{CreateUser, User};
use tally_db::repositories::UserRepo;

/// Insert a user with a placeholder password hash.
pub async fn create_user(pool: &PgPool, email: &str) -> User {
    let mut conn = pool.acquire().await.unwrap();
    let input = CreateUser {
        email: email.to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        is_staff: false,
    };
    UserRepo::create(&mut conn, &input)
        .await
        .expect("user creation should succeed")
}

pub fn date(y: i32, m: u32, d: u32) -> Date {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ts(y: i32, m: u32, d: u32) -> Timestamp {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}
