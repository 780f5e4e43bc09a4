use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub api_token: String,
    pub created_at: String,
}

/// Discriminator for the two content surfaces that can carry a comment
/// thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Video,
    Tweet,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Video => "video",
            ItemKind::Tweet => "tweet",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(ItemKind::Video),
            "tweet" => Ok(ItemKind::Tweet),
            other => Err(format!("unknown item kind {other:?}, expected video or tweet")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    pub kind: String, // 'video' or 'tweet'
    pub title: String,
    pub owner_user_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub item_id: String,
    pub author_user_id: String,
    /// None marks a top-level comment; Some points at the parent within the
    /// same item.
    pub parent_comment_id: Option<String>,
    pub content: String,
    pub created_at: String,
}
