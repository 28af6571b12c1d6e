//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When the
//! migrations change, regenerate them with `diesel print-schema`.

diesel::table! {
    /// Registered users.
    ///
    /// `email` carries a unique index; the adapter maps violations of it to
    /// a duplicate-email persistence error.
    users (id) {
        /// Sequential primary key.
        id -> Int8,
        /// Display name, at most 50 characters.
        username -> Varchar,
        /// Lower-cased email address.
        email -> Varchar,
        /// Salted password digest in `sha256$<salt>$<hash>` form.
        password_digest -> Text,
        /// Row creation time.
        created_at -> Timestamptz,
        /// Last modification time.
        updated_at -> Timestamptz,
    }
}
