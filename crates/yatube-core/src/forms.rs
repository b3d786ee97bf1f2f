//! Form validators for user-submitted posts and comments.
//!
//! Validation never persists anything: it either yields the cleaned values
//! or a set of per-field error messages to show back on the form.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Group, Post};

pub const REQUIRED_MESSAGE: &str = "field must be filled in";
pub const INVALID_CHOICE_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE_MESSAGE: &str = "Upload a valid image.";

/// Per-field validation errors, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages attached to `field`, empty if the field is valid.
    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Only the literal empty string is rejected; whitespace passes untouched.
fn clean_text(text: &str) -> Result<String, &'static str> {
    if text.is_empty() {
        return Err(REQUIRED_MESSAGE);
    }
    Ok(text.to_string())
}

/// Metadata of an uploaded image. The bytes stay with the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub size: usize,
}

impl ImageUpload {
    fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// Post creation/edit form: text, optional group id, optional image.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostForm {
    pub text: String,
    /// Raw group selection; empty means "no group".
    pub group: String,
    #[serde(skip)]
    pub image: Option<ImageUpload>,
}

/// Values of a post form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<Uuid>,
}

impl PostForm {
    /// Initial form values for editing an existing post.
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
            image: None,
        }
    }

    /// Validate against the groups currently available for selection.
    pub fn validate(&self, groups: &[Group]) -> Result<CleanedPost, FormErrors> {
        let mut errors = FormErrors::default();

        let text = clean_text(&self.text).unwrap_or_else(|msg| {
            errors.add("text", msg);
            String::new()
        });

        let group_id = match self.group.trim() {
            "" => None,
            raw => match Uuid::parse_str(raw) {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.add("group", INVALID_CHOICE_MESSAGE);
                    None
                }
            },
        };

        if let Some(image) = &self.image {
            if !image.is_image() {
                errors.add("image", INVALID_IMAGE_MESSAGE);
            }
        }

        if errors.is_empty() {
            Ok(CleanedPost { text, group_id })
        } else {
            Err(errors)
        }
    }
}

/// Comment form: text only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, FormErrors> {
        clean_text(&self.text).map_err(|msg| {
            let mut errors = FormErrors::default();
            errors.add("text", msg);
            errors
        })
    }
}

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const INVALID_USERNAME_MESSAGE: &str = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const USERNAME_TAKEN_MESSAGE: &str = "A user with that username already exists.";

/// Sign-up form. Uniqueness is checked by the caller against storage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignupForm {
    pub username: String,
    #[serde(skip)]
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();

        if self.username.is_empty() {
            errors.add("username", REQUIRED_MESSAGE);
        } else if self.username.chars().count() > USERNAME_MAX_LEN {
            errors.add(
                "username",
                format!("Ensure this value has at most {USERNAME_MAX_LEN} characters."),
            );
        } else if !self
            .username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.add("username", INVALID_USERNAME_MESSAGE);
        }

        if self.password.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password",
                format!(
                    "This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."
                ),
            );
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> Group {
        Group::new(
            "Тестовая группа".to_string(),
            "test-slug".to_string(),
            "Тестовое описание".to_string(),
        )
    }

    #[test]
    fn test_post_form_rejects_empty_text() {
        let form = PostForm::default();
        let errors = form.validate(&[]).unwrap_err();
        assert_eq!(errors.field("text"), [REQUIRED_MESSAGE.to_string()]);
    }

    #[test]
    fn test_post_form_accepts_whitespace_text_unchanged() {
        let form = PostForm {
            text: "   ".to_string(),
            ..Default::default()
        };
        let cleaned = form.validate(&[]).unwrap();
        assert_eq!(cleaned.text, "   ");
        assert_eq!(cleaned.group_id, None);
    }

    #[test]
    fn test_post_form_resolves_known_group() {
        let group = group();
        let form = PostForm {
            text: "Тестовый текст".to_string(),
            group: group.id.to_string(),
            image: None,
        };
        let cleaned = form.validate(std::slice::from_ref(&group)).unwrap();
        assert_eq!(cleaned.group_id, Some(group.id));
    }

    #[test]
    fn test_post_form_rejects_unknown_group() {
        let form = PostForm {
            text: "text".to_string(),
            group: Uuid::new_v4().to_string(),
            image: None,
        };
        let errors = form.validate(&[group()]).unwrap_err();
        assert_eq!(errors.field("group"), [INVALID_CHOICE_MESSAGE.to_string()]);
        assert!(errors.field("text").is_empty());
    }

    #[test]
    fn test_post_form_rejects_malformed_group() {
        let form = PostForm {
            text: "text".to_string(),
            group: "not-a-uuid".to_string(),
            image: None,
        };
        assert!(form.validate(&[group()]).is_err());
    }

    #[test]
    fn test_post_form_image_content_type() {
        let mut form = PostForm {
            text: "text".to_string(),
            group: String::new(),
            image: Some(ImageUpload {
                file_name: "small.gif".to_string(),
                content_type: Some("image/gif".to_string()),
                size: 35,
            }),
        };
        assert!(form.validate(&[]).is_ok());

        form.image = Some(ImageUpload {
            file_name: "notes.txt".to_string(),
            content_type: Some("text/plain".to_string()),
            size: 5,
        });
        let errors = form.validate(&[]).unwrap_err();
        assert_eq!(errors.field("image"), [INVALID_IMAGE_MESSAGE.to_string()]);
    }

    #[test]
    fn test_post_form_from_post() {
        let group = group();
        let post = Post::new(Uuid::new_v4(), "text".to_string(), Some(group.id), None);
        let form = PostForm::from_post(&post);
        assert_eq!(form.text, "text");
        assert_eq!(form.group, group.id.to_string());
    }

    #[test]
    fn test_comment_form() {
        let empty = CommentForm::default();
        assert_eq!(
            empty.validate().unwrap_err().field("text"),
            [REQUIRED_MESSAGE.to_string()]
        );

        let ok = CommentForm {
            text: "Комментарий".to_string(),
        };
        assert_eq!(ok.validate().unwrap(), "Комментарий");
    }

    #[test]
    fn test_signup_form() {
        let ok = SignupForm {
            username: "leo.tolstoy+1@ya".to_string(),
            password: "long-enough".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = SignupForm {
            username: "no spaces".to_string(),
            password: "short".to_string(),
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.field("username"), [INVALID_USERNAME_MESSAGE.to_string()]);
        assert_eq!(errors.field("password").len(), 1);

        let long = SignupForm {
            username: "a".repeat(USERNAME_MAX_LEN + 1),
            password: "long-enough".to_string(),
        };
        assert_eq!(long.validate().unwrap_err().field("username").len(), 1);
    }

    #[test]
    fn test_form_errors_serialize_by_field() {
        let mut errors = FormErrors::default();
        errors.add("text", REQUIRED_MESSAGE);
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({ "text": [REQUIRED_MESSAGE] })
        );
    }
}
