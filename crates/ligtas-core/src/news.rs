//! Public news items published by the office.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
  pub news_id:    Uuid,
  pub title:      String,
  pub caption:    String,
  /// Image references, in upload order.
  pub images:     Vec<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct NewNews {
  #[validate(length(min = 1, message = "Title is required."))]
  pub title:   String,
  #[validate(length(min = 1, message = "Caption is required."))]
  pub caption: String,
  pub images:  Vec<String>,
}
