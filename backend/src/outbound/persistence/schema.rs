//! Diesel table definitions for the PostgreSQL schema.
//!
//! These must match the migrations exactly; Diesel uses them for type-safe
//! query generation. `diesel print-schema` can regenerate them from a live
//! database after a migration change.

diesel::table! {
    /// Households with denormalised member counts.
    ///
    /// `number_of_members` is maintained with atomic in-database deltas and
    /// guarded by a `CHECK (number_of_members >= 0)` constraint.
    households (id) {
        id -> Uuid,
        #[max_length = 64]
        name -> Varchar,
        #[max_length = 255]
        address -> Varchar,
        owner_id -> Uuid,
        number_of_members -> Int4,
    }
}

diesel::table! {
    /// Registered user accounts.
    ///
    /// `household_id` is the membership back-reference; NULL means the user
    /// belongs to no household.
    users (id) {
        id -> Uuid,
        #[max_length = 255]
        email -> Varchar,
        #[max_length = 255]
        password_hash -> Varchar,
        #[max_length = 100]
        full_name -> Varchar,
        #[max_length = 16]
        role -> Varchar,
        confirmed -> Bool,
        #[max_length = 64]
        confirmation_token -> Nullable<Varchar>,
        household_id -> Nullable<Uuid>,
    }
}

diesel::table! {
    /// Household occupants without accounts.
    ///
    /// `(household_id, full_name)` carries a unique constraint.
    unregistered_members (id) {
        id -> Uuid,
        #[max_length = 100]
        full_name -> Varchar,
        household_id -> Uuid,
    }
}

diesel::table! {
    /// Invitations and join requests.
    ///
    /// `kind` and `status` are CHECK-constrained to the domain enums'
    /// snake_case encodings.
    membership_requests (id) {
        id -> Uuid,
        household_id -> Uuid,
        sender_id -> Uuid,
        receiver_id -> Uuid,
        #[max_length = 16]
        kind -> Varchar,
        #[max_length = 16]
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(unregistered_members -> households (household_id));
diesel::joinable!(users -> households (household_id));

diesel::allow_tables_to_appear_in_same_query!(
    households,
    membership_requests,
    unregistered_members,
    users,
);
