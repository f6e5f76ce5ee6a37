//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered leaderboard users.
    users (id) {
        /// Caller-chosen identifier (max 30 characters).
        id -> Varchar,
        /// Display name (max 30 characters).
        nickname -> Varchar,
        /// Registration timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tenant apps.
    apps (id) {
        /// Server-issued identifier.
        id -> Uuid,
        /// Display name (max 30 characters).
        name -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per `(app, score name, user)` entry.
    ///
    /// Rows cascade away when their user or app is deleted.
    leaderboards (score_name, user_id, app_id) {
        /// Board within the app (max 30 characters).
        score_name -> Varchar,
        /// Entrant; references `users.id`.
        user_id -> Varchar,
        /// Owning app; references `apps.id`.
        app_id -> Uuid,
        /// Current value.
        value -> Int4,
        /// First submission timestamp.
        created_at -> Timestamptz,
        /// Last submission timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(leaderboards -> users (user_id));
diesel::joinable!(leaderboards -> apps (app_id));
diesel::allow_tables_to_appear_in_same_query!(apps, leaderboards, users);
