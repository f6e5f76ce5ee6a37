//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer};
use uuid::Uuid;

use super::schema::{apps, leaderboards, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: String,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for registering users.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: &'a str,
    pub nickname: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for registering apps.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = apps)]
pub(crate) struct NewAppRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
}

/// Insertable struct for score submissions.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = leaderboards)]
pub(crate) struct NewScoreRow<'a> {
    pub score_name: &'a str,
    pub user_id: &'a str,
    pub app_id: Uuid,
    pub value: i32,
}

/// Result of the single-statement standing query.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct StandingRow {
    #[diesel(sql_type = Integer)]
    pub value: i32,
    #[diesel(sql_type = BigInt)]
    pub entrant_count: i64,
    #[diesel(sql_type = BigInt)]
    pub lower_count: i64,
}
