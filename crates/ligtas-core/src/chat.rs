//! Per-case chat threads between the reporter and staff.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatKind {
  Chat,
  /// The body is a comma-separated list of attachment references.
  File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub message_id: Uuid,
  pub case_id:    Uuid,
  pub kind:       ChatKind,
  pub body:       String,
  /// Staff e-mail, or the case id when the reporter is speaking.
  pub sender_id:  String,
  pub created_at: DateTime<Utc>,
}

impl ChatMessage {
  /// The attachment references of a `file` message.
  pub fn files(&self) -> Vec<&str> {
    match self.kind {
      ChatKind::File => self.body.split(',').filter(|s| !s.is_empty()).collect(),
      ChatKind::Chat => Vec::new(),
    }
  }
}

fn text_or_files(msg: &NewChatMessage) -> Result<(), ValidationError> {
  if msg.files.iter().any(|f| f.contains(',')) {
    let mut err = ValidationError::new("files");
    err.message = Some("Attachment references cannot contain commas.".into());
    return Err(err);
  }
  if msg.message.trim().is_empty() && msg.files.iter().all(|f| f.trim().is_empty())
  {
    let mut err = ValidationError::new("required");
    err.message = Some("A message or at least one file is required.".into());
    return Err(err);
  }
  Ok(())
}

/// A message as posted. Sending files turns the whole message into a
/// `file` message; any text alongside them is dropped.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "text_or_files"))]
#[serde(default)]
pub struct NewChatMessage {
  pub message: String,
  pub files:   Vec<String>,
}

impl NewChatMessage {
  pub fn text(message: impl Into<String>) -> Self {
    Self { message: message.into(), files: Vec::new() }
  }

  /// The stored kind and body.
  pub fn into_body(self) -> (ChatKind, String) {
    let files = crate::case::clean_refs(self.files);
    if files.is_empty() {
      (ChatKind::Chat, self.message)
    } else {
      (ChatKind::File, files.join(","))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn files_win_over_text() {
    let msg = NewChatMessage {
      message: "see attached".into(),
      files:   vec!["a.jpg".into(), " b.jpg ".into()],
    };
    assert!(msg.validate().is_ok());
    assert_eq!(msg.into_body(), (ChatKind::File, "a.jpg,b.jpg".to_owned()));
  }

  #[test]
  fn empty_message_is_invalid() {
    assert!(NewChatMessage::default().validate().is_err());
    assert!(NewChatMessage::text("   ").validate().is_err());
  }

  #[test]
  fn commas_in_references_are_refused() {
    let msg = NewChatMessage { message: String::new(), files: vec!["a,b".into()] };
    assert!(msg.validate().is_err());
  }
}
