diesel::table! {
    reminders (id) {
        id -> Integer,
        task -> Text,
        remind_at -> BigInt,
        created_at -> BigInt,
    }
}
