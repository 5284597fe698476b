/// Database types for persisted selections

#[derive(Debug, Clone)]
pub struct DbSnapshot {
    pub user_key: String,
    pub snapshot: String, // JSON string
    pub course_count: i64,
    pub updated_at: String,
}
