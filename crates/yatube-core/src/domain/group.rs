use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Group entity - a named category posts can belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    /// URL identifier, unique across all groups.
    pub slug: String,
    pub description: String,
}

impl Group {
    pub fn new(title: String, slug: String, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            slug,
            description,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_title() {
        let group = Group::new(
            "Тестовая группа".to_string(),
            "test-slug".to_string(),
            "Тестовое описание".to_string(),
        );
        assert_eq!(group.to_string(), "Тестовая группа");
    }
}
