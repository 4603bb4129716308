//! # Forms
//!
//! Raw user input and the rules it must pass before a service touches storage.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

/// Error messages keyed by form field, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(Vec<(String, String)>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push((field.to_string(), message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First message recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, msg)| msg.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(f, m)| (f.as_str(), m.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> crate::Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::AppError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, msg)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {msg}")?;
        }
        Ok(())
    }
}

pub const REQUIRED: &str = "This field is required.";

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Input of the create/edit post form.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub text: String,
    /// Raw value of the group `<select>`; empty means "no group".
    pub group: String,
    pub image: Option<Upload>,
}

impl PostForm {
    /// Checks the fields that need no storage lookup and parses the group id.
    pub fn clean(&self, errors: &mut FieldErrors) -> Option<Uuid> {
        if self.text.trim().is_empty() {
            errors.add("text", REQUIRED);
        }
        let group = self.group.trim();
        if group.is_empty() {
            return None;
        }
        match Uuid::parse_str(group) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add("group", INVALID_CHOICE);
                None
            }
        }
    }
}

pub const INVALID_CHOICE: &str = "Select a valid choice.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Input of the comment form on the post page.
#[derive(Debug, Clone, Default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    /// Shortest accepted comment, in characters.
    pub const MIN_LEN: usize = 2;

    pub fn validate(&self) -> crate::Result<String> {
        let text = self.text.trim();
        let mut errors = FieldErrors::new();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        } else if text.chars().count() < Self::MIN_LEN {
            errors.add(
                "text",
                format!(
                    "Ensure this value has at least {} characters (it has {}).",
                    Self::MIN_LEN,
                    text.chars().count()
                ),
            );
        }
        errors.into_result()?;
        Ok(text.to_string())
    }
}

/// Input of the signup form.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub password1: String,
    pub password2: String,
}

impl SignupForm {
    pub const USERNAME_MAX: usize = 150;
    pub const PASSWORD_MIN: usize = 8;

    pub fn validate(&self) -> crate::Result<()> {
        let mut errors = FieldErrors::new();
        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if username.chars().count() > Self::USERNAME_MAX
            || !username.chars().all(is_username_char)
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        if self.password1.chars().count() < Self::PASSWORD_MIN {
            errors.add(
                "password1",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    Self::PASSWORD_MIN
                ),
            );
        }
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }
        errors.into_result()
    }
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}
