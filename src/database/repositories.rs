use super::models::{CommentRecord, ItemRecord, UserRecord};
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub trait UserRepository {
    fn create(&self, record: &UserRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<UserRecord>>;
    fn get_by_token(&self, token: &str) -> Result<Option<UserRecord>>;
}

pub trait ItemRepository {
    fn create(&self, record: &ItemRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<ItemRecord>>;
    fn list_recent(&self, limit: usize) -> Result<Vec<ItemRecord>>;
}

pub trait CommentRepository {
    fn create(&self, record: &CommentRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<CommentRecord>>;
    fn list_for_item(&self, item_id: &str) -> Result<Vec<CommentRecord>>;
    fn count_for_item(&self, item_id: &str) -> Result<i64>;
    fn delete(&self, id: &str) -> Result<usize>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn users(&self) -> impl UserRepository + '_ {
        SqliteUserRepository { conn: self.conn }
    }

    pub fn items(&self) -> impl ItemRepository + '_ {
        SqliteItemRepository { conn: self.conn }
    }

    pub fn comments(&self) -> impl CommentRepository + '_ {
        SqliteCommentRepository { conn: self.conn }
    }
}

struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        avatar_url: row.get(2)?,
        api_token: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl<'conn> UserRepository for SqliteUserRepository<'conn> {
    fn create(&self, record: &UserRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO users (id, name, avatar_url, api_token, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.id,
                record.name,
                record.avatar_url,
                record.api_token,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, name, avatar_url, api_token, created_at
                FROM users
                WHERE id = ?1
                "#,
                params![id],
                map_user_row,
            )
            .optional()?)
    }

    fn get_by_token(&self, token: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, name, avatar_url, api_token, created_at
                FROM users
                WHERE api_token = ?1
                "#,
                params![token],
                map_user_row,
            )
            .optional()?)
    }
}

struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

fn map_item_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRecord> {
    Ok(ItemRecord {
        id: row.get(0)?,
        kind: row.get(1)?,
        title: row.get(2)?,
        owner_user_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl<'conn> ItemRepository for SqliteItemRepository<'conn> {
    fn create(&self, record: &ItemRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO items (id, kind, title, owner_user_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.id,
                record.kind,
                record.title,
                record.owner_user_id,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<ItemRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, kind, title, owner_user_id, created_at
                FROM items
                WHERE id = ?1
                "#,
                params![id],
                map_item_row,
            )
            .optional()?)
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<ItemRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, kind, title, owner_user_id, created_at
            FROM items
            ORDER BY created_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map(params![limit as i64], map_item_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }
}

struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

fn map_comment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentRecord> {
    Ok(CommentRecord {
        id: row.get(0)?,
        item_id: row.get(1)?,
        author_user_id: row.get(2)?,
        parent_comment_id: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl<'conn> CommentRepository for SqliteCommentRepository<'conn> {
    fn create(&self, record: &CommentRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO comments (id, item_id, author_user_id, parent_comment_id, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.id,
                record.item_id,
                record.author_user_id,
                record.parent_comment_id,
                record.content,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<CommentRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, item_id, author_user_id, parent_comment_id, content, created_at
                FROM comments
                WHERE id = ?1
                "#,
                params![id],
                map_comment_row,
            )
            .optional()?)
    }

    // RFC 3339 timestamps compare lexicographically; the id column breaks
    // same-instant ties so listing order is stable across calls.
    fn list_for_item(&self, item_id: &str) -> Result<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, item_id, author_user_id, parent_comment_id, content, created_at
            FROM comments
            WHERE item_id = ?1
            ORDER BY created_at ASC, id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![item_id], map_comment_row)?;
        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    fn count_for_item(&self, item_id: &str) -> Result<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE item_id = ?1",
            params![item_id],
            |row| row.get(0),
        )?)
    }

    // Reply subtrees go with their root through the self-referential
    // ON DELETE CASCADE edge.
    fn delete(&self, id: &str) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        Ok(removed)
    }
}
