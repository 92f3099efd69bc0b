//! Vocabulary storage, keyed by (chapter, user).

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};

use crate::domain::{VocabularyItem, WritingSystem};

/// Random 32-character identifier for a vocabulary row.
pub fn new_item_id() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    (0..32)
        .map(|_| {
            let idx = rng.random_range(0..36);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect()
}

/// Inserts the item under a freshly generated id and returns that id;
/// the id on the passed item is ignored.
pub fn insert_vocabulary(conn: &Connection, item: &VocabularyItem) -> Result<String> {
    let id = new_item_id();
    conn.execute(
        "INSERT INTO vocabulary (id, chapter_id, user_id, meaning, reading, kanji, writing_system, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            item.chapter_id,
            item.user_id,
            item.meaning,
            item.reading,
            item.kanji,
            item.writing_system.as_str(),
            item.created_at.to_rfc3339(),
        ],
    )?;
    Ok(id)
}

/// Items of one chapter in creation order, oldest first.
pub fn get_vocabulary_for_chapter(
    conn: &Connection,
    user_id: i64,
    chapter_id: i64,
) -> Result<Vec<VocabularyItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, chapter_id, user_id, meaning, reading, kanji, writing_system, created_at
         FROM vocabulary
         WHERE chapter_id = ?1 AND user_id = ?2
         ORDER BY created_at ASC, id ASC",
    )?;

    let items = stmt
        .query_map(params![chapter_id, user_id], |row| row_to_item(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(items)
}

pub fn get_vocabulary_by_id(
    conn: &Connection,
    user_id: i64,
    id: &str,
) -> Result<Option<VocabularyItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, chapter_id, user_id, meaning, reading, kanji, writing_system, created_at
         FROM vocabulary
         WHERE id = ?1 AND user_id = ?2",
    )?;
    let mut rows = stmt.query(params![id, user_id])?;

    match rows.next()? {
        Some(row) => Ok(Some(row_to_item(row)?)),
        None => Ok(None),
    }
}

pub fn update_vocabulary(
    conn: &Connection,
    user_id: i64,
    id: &str,
    meaning: &str,
    reading: &str,
    kanji: Option<&str>,
    writing_system: WritingSystem,
) -> Result<usize> {
    conn.execute(
        "UPDATE vocabulary
         SET meaning = ?1, reading = ?2, kanji = ?3, writing_system = ?4
         WHERE id = ?5 AND user_id = ?6",
        params![meaning, reading, kanji, writing_system.as_str(), id, user_id],
    )
}

pub fn delete_vocabulary(conn: &Connection, user_id: i64, id: &str) -> Result<usize> {
    conn.execute(
        "DELETE FROM vocabulary WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )
}

fn row_to_item(row: &rusqlite::Row) -> Result<VocabularyItem> {
    let writing_system_str: String = row.get(6)?;
    let created_at_str: String = row.get(7)?;

    Ok(VocabularyItem {
        id: row.get(0)?,
        chapter_id: row.get(1)?,
        user_id: row.get(2)?,
        meaning: row.get(3)?,
        reading: row.get(4)?,
        kanji: row.get(5)?,
        writing_system: WritingSystem::from_str(&writing_system_str)
            .unwrap_or(WritingSystem::Hiragana),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::chapters::insert_chapter;
    use crate::domain::Chapter;
    use crate::testing::TestEnv;

    fn chapter_for(env: &TestEnv, user_id: i64) -> i64 {
        insert_chapter(&env.conn, &Chapter::new(user_id, "Animals".to_string())).unwrap()
    }

    fn item(chapter_id: i64, user_id: i64, reading: &str, meaning: &str) -> VocabularyItem {
        VocabularyItem::new(
            chapter_id,
            user_id,
            meaning.to_string(),
            reading.to_string(),
            None,
            WritingSystem::Hiragana,
        )
    }

    #[test]
    fn test_new_item_id_shape() {
        let a = new_item_id();
        let b = new_item_id();
        assert_eq!(a.chars().count(), 32);
        assert!(a.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_insert_and_fetch_roundtrip() {
        let env = TestEnv::new();
        let user_id = env.create_user("a@example.com");
        let chapter_id = chapter_for(&env, user_id);

        let id = insert_vocabulary(
            &env.conn,
            &VocabularyItem::new(
                chapter_id,
                user_id,
                "television".to_string(),
                "テレビ".to_string(),
                None,
                WritingSystem::Katakana,
            ),
        )
        .unwrap();

        let fetched = get_vocabulary_by_id(&env.conn, user_id, &id).unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.chapter_id, chapter_id);
        assert_eq!(fetched.meaning, "television");
        assert_eq!(fetched.reading, "テレビ");
        assert_eq!(fetched.kanji, None);
        assert_eq!(fetched.writing_system, WritingSystem::Katakana);
    }

    #[test]
    fn test_kanji_is_stored_and_returned() {
        let env = TestEnv::new();
        let user_id = env.create_user("a@example.com");
        let chapter_id = chapter_for(&env, user_id);

        let mut dog = item(chapter_id, user_id, "いぬ", "dog");
        dog.kanji = Some("犬".to_string());
        let id = insert_vocabulary(&env.conn, &dog).unwrap();

        let fetched = get_vocabulary_by_id(&env.conn, user_id, &id).unwrap().unwrap();
        assert_eq!(fetched.kanji.as_deref(), Some("犬"));
        assert!(fetched.has_kanji());
    }

    #[test]
    fn test_chapter_listing_in_creation_order() {
        let env = TestEnv::new();
        let user_id = env.create_user("a@example.com");
        let chapter_id = chapter_for(&env, user_id);

        for (reading, meaning) in [("いぬ", "dog"), ("ねこ", "cat"), ("とり", "bird")] {
            insert_vocabulary(&env.conn, &item(chapter_id, user_id, reading, meaning)).unwrap();
        }

        let readings: Vec<String> = get_vocabulary_for_chapter(&env.conn, user_id, chapter_id)
            .unwrap()
            .into_iter()
            .map(|i| i.reading)
            .collect();
        assert_eq!(readings, vec!["いぬ", "ねこ", "とり"]);
    }

    #[test]
    fn test_listing_is_scoped_to_chapter_and_user() {
        let env = TestEnv::new();
        let alice = env.create_user("alice@example.com");
        let bob = env.create_user("bob@example.com");
        let alice_chapter = chapter_for(&env, alice);
        let bob_chapter = chapter_for(&env, bob);

        insert_vocabulary(&env.conn, &item(alice_chapter, alice, "いぬ", "dog")).unwrap();
        insert_vocabulary(&env.conn, &item(bob_chapter, bob, "ねこ", "cat")).unwrap();

        let alices = get_vocabulary_for_chapter(&env.conn, alice, alice_chapter).unwrap();
        assert_eq!(alices.len(), 1);
        assert_eq!(alices[0].reading, "いぬ");

        // Bob cannot read out of Alice's chapter, even by its id.
        assert!(get_vocabulary_for_chapter(&env.conn, bob, alice_chapter)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_update_vocabulary() {
        let env = TestEnv::new();
        let user_id = env.create_user("a@example.com");
        let chapter_id = chapter_for(&env, user_id);

        let id = insert_vocabulary(&env.conn, &item(chapter_id, user_id, "いぬ", "dog")).unwrap();
        let changed = update_vocabulary(
            &env.conn,
            user_id,
            &id,
            "puppy",
            "いぬ",
            Some("犬"),
            WritingSystem::Hiragana,
        )
        .unwrap();
        assert_eq!(changed, 1);

        let fetched = get_vocabulary_by_id(&env.conn, user_id, &id).unwrap().unwrap();
        assert_eq!(fetched.meaning, "puppy");
        assert_eq!(fetched.kanji.as_deref(), Some("犬"));
    }

    #[test]
    fn test_update_can_clear_kanji() {
        let env = TestEnv::new();
        let user_id = env.create_user("a@example.com");
        let chapter_id = chapter_for(&env, user_id);

        let mut dog = item(chapter_id, user_id, "いぬ", "dog");
        dog.kanji = Some("犬".to_string());
        let id = insert_vocabulary(&env.conn, &dog).unwrap();

        update_vocabulary(
            &env.conn,
            user_id,
            &id,
            "dog",
            "イヌ",
            None,
            WritingSystem::Katakana,
        )
        .unwrap();

        let fetched = get_vocabulary_by_id(&env.conn, user_id, &id).unwrap().unwrap();
        assert_eq!(fetched.kanji, None);
        assert_eq!(fetched.writing_system, WritingSystem::Katakana);
        assert!(!fetched.has_kanji());
    }

    #[test]
    fn test_delete_vocabulary() {
        let env = TestEnv::new();
        let user_id = env.create_user("a@example.com");
        let chapter_id = chapter_for(&env, user_id);

        let id = insert_vocabulary(&env.conn, &item(chapter_id, user_id, "いぬ", "dog")).unwrap();
        assert_eq!(delete_vocabulary(&env.conn, user_id, &id).unwrap(), 1);
        assert!(get_vocabulary_by_id(&env.conn, user_id, &id).unwrap().is_none());
    }

    #[test]
    fn test_mutations_are_scoped_to_their_owner() {
        let env = TestEnv::new();
        let alice = env.create_user("alice@example.com");
        let bob = env.create_user("bob@example.com");
        let chapter_id = chapter_for(&env, alice);

        let id = insert_vocabulary(&env.conn, &item(chapter_id, alice, "いぬ", "dog")).unwrap();

        assert!(get_vocabulary_by_id(&env.conn, bob, &id).unwrap().is_none());
        assert_eq!(
            update_vocabulary(&env.conn, bob, &id, "x", "x", None, WritingSystem::Hiragana)
                .unwrap(),
            0
        );
        assert_eq!(delete_vocabulary(&env.conn, bob, &id).unwrap(), 0);
        assert!(get_vocabulary_by_id(&env.conn, alice, &id).unwrap().is_some());
    }
}
