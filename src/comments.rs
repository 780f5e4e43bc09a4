use crate::database::models::{CommentRecord, UserRecord};
use crate::database::repositories::{CommentRepository, ItemRepository, UserRepository};
use crate::database::Database;
use crate::utils::now_utc_iso;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Outcome of a comment operation the API layer can map onto a status code.
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct CommentService {
    database: Database,
}

impl CommentService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Returns one page of top-level comments for a content item, newest
    /// first, each carrying its full reply subtree. Reply lists are never
    /// paginated; only the top-level set is. An unknown item yields an empty
    /// page rather than an error.
    pub fn list_comments(
        &self,
        item_id: &str,
        page: usize,
        page_size: usize,
    ) -> Result<CommentPage, CommentError> {
        let page = page.max(1);
        let page_size = page_size.max(1);

        let records = self
            .database
            .with_repositories(|repos| repos.comments().list_for_item(item_id))?;
        let authors = self.resolve_authors(&records)?;

        // Single flat fetch, then forest reconstruction in memory: bucket
        // replies under their parent id, keep roots in fetch order
        // (oldest first, id tie-break).
        let mut children: HashMap<String, Vec<CommentRecord>> = HashMap::new();
        let mut roots: Vec<CommentRecord> = Vec::new();
        for record in records {
            match record.parent_comment_id.clone() {
                Some(parent_id) => children.entry(parent_id).or_default().push(record),
                None => roots.push(record),
            }
        }

        let total_comments = roots.len();
        let total_pages = total_comments.div_ceil(page_size);
        roots.reverse();

        let comments = roots
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .map(|record| build_view(record, &mut children, &authors))
            .collect();

        Ok(CommentPage {
            comments,
            total_comments,
            total_pages,
            current_page: page,
        })
    }

    /// Creates a top-level comment or a reply. A reply's parent must exist
    /// and belong to the same item.
    pub fn add_comment(&self, input: AddCommentInput) -> Result<CommentView, CommentError> {
        if input.content.trim().is_empty() {
            return Err(CommentError::Validation(
                "comment content may not be empty".into(),
            ));
        }
        if input.item_id.trim().is_empty() || input.author_user_id.trim().is_empty() {
            return Err(CommentError::Validation(
                "item id and author id are required".into(),
            ));
        }

        let record = CommentRecord {
            id: Uuid::new_v4().to_string(),
            item_id: input.item_id,
            author_user_id: input.author_user_id,
            parent_comment_id: input.parent_comment_id,
            content: input.content,
            created_at: now_utc_iso(),
        };

        let (item_exists, parent) = self.database.with_repositories(|repos| {
            let item = repos.items().get(&record.item_id)?;
            let parent = match record.parent_comment_id.as_deref() {
                Some(parent_id) => repos.comments().get(parent_id)?,
                None => None,
            };
            Ok((item.is_some(), parent))
        })?;

        if !item_exists {
            return Err(CommentError::NotFound(format!(
                "item {} not found",
                record.item_id
            )));
        }
        if let Some(parent_id) = record.parent_comment_id.as_deref() {
            match parent {
                None => {
                    return Err(CommentError::NotFound(format!(
                        "parent comment {parent_id} not found"
                    )))
                }
                Some(ref parent) if parent.item_id != record.item_id => {
                    return Err(CommentError::NotFound(format!(
                        "parent comment {parent_id} belongs to a different item"
                    )))
                }
                Some(_) => {}
            }
        }

        self.database
            .with_repositories(|repos| repos.comments().create(&record))?;
        tracing::debug!(
            comment_id = %record.id,
            item_id = %record.item_id,
            reply = record.parent_comment_id.is_some(),
            "comment created"
        );

        let author = self
            .database
            .with_repositories(|repos| repos.users().get(&record.author_user_id))?
            .map(AuthorView::from_record);
        Ok(CommentView::from_record(record, author))
    }

    /// Removes a comment and, through the cascade edge, its entire reply
    /// subtree. Only the comment's author may delete it.
    pub fn delete_comment(&self, comment_id: &str, requester_id: &str) -> Result<(), CommentError> {
        let existing = self
            .database
            .with_repositories(|repos| repos.comments().get(comment_id))?;
        let Some(existing) = existing else {
            return Err(CommentError::NotFound(format!(
                "comment {comment_id} not found"
            )));
        };
        if existing.author_user_id != requester_id {
            return Err(CommentError::Forbidden(
                "only the comment author may delete it".into(),
            ));
        }

        self.database
            .with_repositories(|repos| repos.comments().delete(comment_id))?;
        tracing::debug!(comment_id, item_id = %existing.item_id, "comment deleted");
        Ok(())
    }

    fn resolve_authors(
        &self,
        records: &[CommentRecord],
    ) -> Result<HashMap<String, AuthorView>, CommentError> {
        let mut ids: Vec<&str> = records.iter().map(|r| r.author_user_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut authors = HashMap::new();
        self.database.with_repositories(|repos| {
            let users = repos.users();
            for id in ids {
                match users.get(id) {
                    Ok(Some(user)) => {
                        authors.insert(id.to_string(), AuthorView::from_record(user));
                    }
                    Ok(None) => {}
                    // A failed author lookup degrades that comment's author
                    // field to null instead of failing the page.
                    Err(err) => {
                        tracing::warn!(user_id = %id, error = ?err, "author lookup failed");
                    }
                }
            }
            Ok(())
        })?;
        Ok(authors)
    }
}

fn build_view(
    record: CommentRecord,
    children: &mut HashMap<String, Vec<CommentRecord>>,
    authors: &HashMap<String, AuthorView>,
) -> CommentView {
    // Each node is consumed exactly once, so a malformed parent edge can
    // never loop the traversal.
    let replies = children
        .remove(&record.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| build_view(child, children, authors))
        .collect();
    let author = authors.get(&record.author_user_id).cloned();
    CommentView {
        id: record.id,
        item_id: record.item_id,
        author,
        parent_comment_id: record.parent_comment_id,
        content: record.content,
        created_at: record.created_at,
        replies,
    }
}

/// Public display fields of a comment author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorView {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl AuthorView {
    fn from_record(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            avatar_url: record.avatar_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: String,
    pub item_id: String,
    pub author: Option<AuthorView>,
    pub parent_comment_id: Option<String>,
    pub content: String,
    pub created_at: String,
    pub replies: Vec<CommentView>,
}

impl CommentView {
    fn from_record(record: CommentRecord, author: Option<AuthorView>) -> Self {
        Self {
            id: record.id,
            item_id: record.item_id,
            author,
            parent_comment_id: record.parent_comment_id,
            content: record.content,
            created_at: record.created_at,
            replies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentPage {
    pub comments: Vec<CommentView>,
    pub total_comments: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCommentInput {
    pub item_id: String,
    pub author_user_id: String,
    pub content: String,
    #[serde(default)]
    pub parent_comment_id: Option<String>,
}
