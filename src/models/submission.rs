use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Visitor input appended to the remote store: ideas, wishes and signups.
///
/// Submissions are write-only from the visitor's point of view; they are
/// listed only by the site operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub kind: SubmissionKind,
    pub content: String,
    pub contact_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Where a submission came from.
///
/// - `Idea`: a feature suggestion from the voting board, optionally with a contact email
/// - `Wish`: free-form wishlist text
/// - `Signup`: a mailing-list email address
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Idea,
    Wish,
    Signup,
}

impl SubmissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::Wish => "wish",
            Self::Signup => "signup",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idea" => Some(Self::Idea),
            "wish" => Some(Self::Wish),
            "signup" => Some(Self::Signup),
            _ => None,
        }
    }
}

/// Input for appending a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubmissionInput {
    pub kind: SubmissionKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl CreateSubmissionInput {
    /// Trim fields and check that the submission carries something.
    ///
    /// Ideas need text or an email, wishes need text, signups need an email.
    /// Returns the message to show the visitor when the input is rejected.
    pub fn normalized(self) -> Result<Self, String> {
        let content = self.content.trim().to_string();
        let contact_email = self
            .contact_email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        let ok = match self.kind {
            SubmissionKind::Idea => !content.is_empty() || contact_email.is_some(),
            SubmissionKind::Wish => !content.is_empty(),
            SubmissionKind::Signup => contact_email.is_some(),
        };
        if !ok {
            return Err(format!("Empty {} submission", self.kind.as_str()));
        }

        Ok(Self {
            kind: self.kind,
            content,
            contact_email,
        })
    }
}
