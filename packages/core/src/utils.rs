use uuid::Uuid;

/// Generate a unique entity ID
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
