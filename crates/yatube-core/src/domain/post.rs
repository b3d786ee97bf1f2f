use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of characters of the text shown when a post is displayed inline.
const DISPLAY_LEN: usize = 15;

/// Post entity - an authored text entry, optionally grouped and illustrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub text: String,
    /// Reference returned by the image store, e.g. `posts/small.gif`.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post.
    pub fn new(
        author_id: Uuid,
        text: String,
        group_id: Option<Uuid>,
        image: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            group_id,
            text,
            image,
            created_at: Utc::now(),
        }
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.text.chars().take(DISPLAY_LEN).collect();
        f.write_str(&short)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_truncates_to_fifteen_chars() {
        let post = Post::new(
            Uuid::new_v4(),
            "Тестовый пост длиннее пятнадцати".to_string(),
            None,
            None,
        );
        assert_eq!(post.to_string(), "Тестовый пост д");
    }

    #[test]
    fn test_display_short_text_unchanged() {
        let post = Post::new(Uuid::new_v4(), "short".to_string(), None, None);
        assert_eq!(post.to_string(), "short");
    }

    #[test]
    fn test_is_authored_by() {
        let author = Uuid::new_v4();
        let post = Post::new(author, "text".to_string(), None, None);
        assert!(post.is_authored_by(author));
        assert!(!post.is_authored_by(Uuid::new_v4()));
    }
}
