//! Validation of user submitted forms.
//!
//! Validators return cleaned values or a set of field errors. Errors are not
//! failures of the request; handlers re-render the form with them.

use crate::filesystem::{is_image, UploadedFile};
use crate::orm::{groups, posts};
use serde::Deserialize;
use std::collections::BTreeMap;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

pub const USERNAME_MAX_LENGTH: usize = 150;

/// Field name to messages, in field order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has(&self, field: &str) -> bool {
        !self.field(field).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Post form fields as they arrive, from either encoding.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PostSubmission {
    #[serde(default)]
    pub text: String,
    /// Group id, or empty for none.
    #[serde(default)]
    pub group: String,
    #[serde(skip)]
    pub image: Option<UploadedFile>,
}

/// A post submission that passed validation.
#[derive(Debug)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<UploadedFile>,
}

/// Validates a post submission against the groups that exist.
pub fn clean_post(
    submission: PostSubmission,
    groups: &[groups::Model],
) -> Result<CleanPost, FormErrors> {
    let mut errors = FormErrors::default();

    let text = submission.text.trim().to_owned();
    if text.is_empty() {
        errors.add("text", REQUIRED);
    }

    let group = submission.group.trim();
    let group_id = if group.is_empty() {
        None
    } else {
        match group.parse::<i32>() {
            Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
            _ => {
                errors.add("group", INVALID_CHOICE);
                None
            }
        }
    };

    if let Some(image) = &submission.image {
        if !is_image(&image.data) {
            errors.add("image", INVALID_IMAGE);
        }
    }

    if errors.is_empty() {
        Ok(CleanPost {
            text,
            group_id,
            image: submission.image,
        })
    } else {
        Err(errors)
    }
}

/// Post form state handed to templates.
#[derive(Debug, Default)]
pub struct PostForm {
    pub text: String,
    pub group: String,
    /// Media path of the image already attached, when editing.
    pub image: Option<String>,
    pub errors: FormErrors,
    pub groups: Vec<groups::Model>,
}

impl PostForm {
    pub fn blank(groups: Vec<groups::Model>) -> Self {
        Self {
            groups,
            ..Default::default()
        }
    }

    /// A form filled with a post's current values.
    pub fn for_post(post: &posts::Model, groups: Vec<groups::Model>) -> Self {
        Self {
            text: post.text.to_owned(),
            group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
            image: post.image.to_owned(),
            errors: FormErrors::default(),
            groups,
        }
    }

    /// A form echoing a rejected submission.
    pub fn rejected(
        submission_text: String,
        submission_group: String,
        errors: FormErrors,
        groups: Vec<groups::Model>,
    ) -> Self {
        Self {
            text: submission_text,
            group: submission_group,
            image: None,
            errors,
            groups,
        }
    }

    pub fn is_selected(&self, group_id: &i32) -> bool {
        self.group.trim() == group_id.to_string()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CommentFormData {
    #[serde(default)]
    pub text: String,
}

/// Returns the cleaned comment text.
pub fn clean_comment(form: &CommentFormData) -> Result<String, FormErrors> {
    let text = form.text.trim();
    if text.is_empty() {
        let mut errors = FormErrors::default();
        errors.add("text", REQUIRED);
        return Err(errors);
    }
    Ok(text.to_owned())
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginFormData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SignupFormData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// A signup that passed validation. Username uniqueness is checked against the store separately.
#[derive(Debug)]
pub struct CleanSignup {
    pub username: String,
    pub password: String,
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

pub fn clean_signup(form: &SignupFormData) -> Result<CleanSignup, FormErrors> {
    let mut errors = FormErrors::default();

    let username = form.username.trim();
    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else if username.chars().count() > USERNAME_MAX_LENGTH {
        errors.add(
            "username",
            format!(
                "Ensure this value has at most {} characters.",
                USERNAME_MAX_LENGTH
            ),
        );
    } else if !username.chars().all(is_username_char) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }

    if form.password1.is_empty() {
        errors.add("password1", REQUIRED);
    }
    if form.password2.is_empty() {
        errors.add("password2", REQUIRED);
    } else if form.password1 != form.password2 {
        errors.add("password2", "The two password fields didn't match.");
    }

    if errors.is_empty() {
        Ok(CleanSignup {
            username: username.to_owned(),
            password: form.password1.to_owned(),
        })
    } else {
        Err(errors)
    }
}

/// Only local paths are followed after login.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next
        }
        _ => "/",
    }
}
