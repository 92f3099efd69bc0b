//! Chapter storage. Every operation is scoped to the acting user.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};

use crate::domain::Chapter;

pub fn insert_chapter(conn: &Connection, chapter: &Chapter) -> Result<i64> {
    conn.execute(
        "INSERT INTO chapters (user_id, name, created_at) VALUES (?1, ?2, ?3)",
        params![
            chapter.user_id,
            chapter.name,
            chapter.created_at.to_rfc3339()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Chapters in creation order, oldest first.
pub fn get_chapters_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Chapter>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, created_at
         FROM chapters
         WHERE user_id = ?1
         ORDER BY created_at ASC, id ASC",
    )?;

    let chapters = stmt
        .query_map(params![user_id], |row| row_to_chapter(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(chapters)
}

pub fn get_chapter_by_id(
    conn: &Connection,
    user_id: i64,
    chapter_id: i64,
) -> Result<Option<Chapter>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, created_at FROM chapters WHERE id = ?1 AND user_id = ?2",
    )?;
    let mut rows = stmt.query(params![chapter_id, user_id])?;

    match rows.next()? {
        Some(row) => Ok(Some(row_to_chapter(row)?)),
        None => Ok(None),
    }
}

/// Returns the number of renamed rows; 0 means the chapter does not
/// exist or belongs to someone else.
pub fn rename_chapter(
    conn: &Connection,
    user_id: i64,
    chapter_id: i64,
    name: &str,
) -> Result<usize> {
    conn.execute(
        "UPDATE chapters SET name = ?1 WHERE id = ?2 AND user_id = ?3",
        params![name, chapter_id, user_id],
    )
}

/// Removes the chapter and all of its vocabulary in one transaction,
/// so reads never observe a half-deleted chapter.
pub fn delete_chapter(conn: &mut Connection, user_id: i64, chapter_id: i64) -> Result<usize> {
    let tx = conn.transaction()?;
    tx.execute(
        "DELETE FROM vocabulary WHERE chapter_id = ?1 AND user_id = ?2",
        params![chapter_id, user_id],
    )?;
    let deleted = tx.execute(
        "DELETE FROM chapters WHERE id = ?1 AND user_id = ?2",
        params![chapter_id, user_id],
    )?;
    tx.commit()?;
    Ok(deleted)
}

fn row_to_chapter(row: &rusqlite::Row) -> Result<Chapter> {
    let created_at_str: String = row.get(3)?;

    Ok(Chapter {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::vocabulary::{get_vocabulary_for_chapter, insert_vocabulary};
    use crate::domain::{VocabularyItem, WritingSystem};
    use crate::testing::TestEnv;

    #[test]
    fn test_insert_and_fetch_chapter() {
        let env = TestEnv::new();
        let user_id = env.create_user("a@example.com");

        let id = insert_chapter(&env.conn, &Chapter::new(user_id, "Chapter 1".to_string()))
            .unwrap();
        assert!(id > 0);

        let chapter = get_chapter_by_id(&env.conn, user_id, id).unwrap().unwrap();
        assert_eq!(chapter.name, "Chapter 1");
        assert_eq!(chapter.user_id, user_id);
    }

    #[test]
    fn test_chapters_listed_in_creation_order() {
        let env = TestEnv::new();
        let user_id = env.create_user("a@example.com");

        for name in ["First", "Second", "Third"] {
            insert_chapter(&env.conn, &Chapter::new(user_id, name.to_string())).unwrap();
        }

        let names: Vec<String> = get_chapters_for_user(&env.conn, user_id)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_chapters_are_scoped_to_their_owner() {
        let env = TestEnv::new();
        let alice = env.create_user("alice@example.com");
        let bob = env.create_user("bob@example.com");

        let id = insert_chapter(&env.conn, &Chapter::new(alice, "Mine".to_string())).unwrap();

        assert!(get_chapter_by_id(&env.conn, bob, id).unwrap().is_none());
        assert!(get_chapters_for_user(&env.conn, bob).unwrap().is_empty());
        assert_eq!(rename_chapter(&env.conn, bob, id, "Stolen").unwrap(), 0);

        let chapter = get_chapter_by_id(&env.conn, alice, id).unwrap().unwrap();
        assert_eq!(chapter.name, "Mine");
    }

    #[test]
    fn test_rename_chapter() {
        let env = TestEnv::new();
        let user_id = env.create_user("a@example.com");

        let id = insert_chapter(&env.conn, &Chapter::new(user_id, "Old".to_string())).unwrap();
        assert_eq!(rename_chapter(&env.conn, user_id, id, "New").unwrap(), 1);

        let chapter = get_chapter_by_id(&env.conn, user_id, id).unwrap().unwrap();
        assert_eq!(chapter.name, "New");
    }

    #[test]
    fn test_delete_chapter_removes_its_vocabulary() {
        let mut env = TestEnv::new();
        let user_id = env.create_user("a@example.com");

        let id = insert_chapter(&env.conn, &Chapter::new(user_id, "Animals".to_string()))
            .unwrap();
        insert_vocabulary(
            &env.conn,
            &VocabularyItem::new(
                id,
                user_id,
                "dog".to_string(),
                "いぬ".to_string(),
                Some("犬".to_string()),
                WritingSystem::Hiragana,
            ),
        )
        .unwrap();

        assert_eq!(delete_chapter(&mut env.conn, user_id, id).unwrap(), 1);
        assert!(get_chapter_by_id(&env.conn, user_id, id).unwrap().is_none());
        assert!(get_vocabulary_for_chapter(&env.conn, user_id, id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_delete_chapter_ignores_other_users() {
        let mut env = TestEnv::new();
        let alice = env.create_user("alice@example.com");
        let bob = env.create_user("bob@example.com");

        let id = insert_chapter(&env.conn, &Chapter::new(alice, "Mine".to_string())).unwrap();
        assert_eq!(delete_chapter(&mut env.conn, bob, id).unwrap(), 0);
        assert!(get_chapter_by_id(&env.conn, alice, id).unwrap().is_some());
    }
}
