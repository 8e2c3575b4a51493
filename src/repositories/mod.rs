pub mod community_repository;
pub mod echo_repository;
pub mod user_repository;

// SQLite caps bound parameters per statement; IN-list queries are batched
// well below the cap.
pub(crate) const BIND_LIMIT: usize = 500;

pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
