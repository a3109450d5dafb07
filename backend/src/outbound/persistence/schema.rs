//! Diesel table definitions mirroring the embedded migrations.

diesel::table! {
    /// Accounts that can sign in.
    users (id) {
        /// Login name, also the primary key.
        id -> Varchar,
        /// Human-readable name.
        display_name -> Varchar,
        /// PHC-formatted argon2 hash.
        password_hash -> Text,
        /// `ADMIN` or `CONSULTANT`.
        role -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tracked documents, one per delivery to a consultant.
    documents (id) {
        id -> Uuid,
        title -> Varchar,
        /// Assigned consultant; cascades on user removal.
        consultant_id -> Varchar,
        /// Workflow status, constrained to the five known values.
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Files bound to a document.
    attachments (id) {
        id -> Uuid,
        document_id -> Uuid,
        /// `INITIAL` or `RETURN`.
        kind -> Varchar,
        file_name -> Text,
        /// Blob store key.
        store_key -> Text,
        file_url -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(documents -> users (consultant_id));
diesel::joinable!(attachments -> documents (document_id));

diesel::allow_tables_to_appear_in_same_query!(users, documents, attachments);
