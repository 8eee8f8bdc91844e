pub(super) const INSERT_LIKE: &str = r#"
    INSERT INTO item_likes (item_id, user_id, created_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(item_id, user_id) DO NOTHING
"#;

pub(super) const INSERT_FAVORITE: &str = r#"
    INSERT INTO item_favorites (item_id, user_id, created_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(item_id, user_id) DO NOTHING
"#;

pub(super) const DELETE_LIKE: &str = r#"
    DELETE FROM item_likes
    WHERE item_id = ?1 AND user_id = ?2
"#;

pub(super) const DELETE_FAVORITE: &str = r#"
    DELETE FROM item_favorites
    WHERE item_id = ?1 AND user_id = ?2
"#;

pub(super) const SELECT_LIKES_BY_USER: &str = r#"
    SELECT item_id, created_at
    FROM item_likes
    WHERE user_id = ?1
    ORDER BY created_at DESC
"#;

pub(super) const SELECT_FAVORITES_BY_USER: &str = r#"
    SELECT item_id, created_at
    FROM item_favorites
    WHERE user_id = ?1
    ORDER BY created_at DESC
"#;

pub(super) const COUNT_LIKES: &str = r#"
    SELECT COUNT(*) FROM item_likes WHERE item_id = ?1
"#;

pub(super) const COUNT_FAVORITES: &str = r#"
    SELECT COUNT(*) FROM item_favorites WHERE item_id = ?1
"#;

pub(super) const COUNT_COMMENTS: &str = r#"
    SELECT COUNT(*) FROM item_comments WHERE item_id = ?1
"#;

pub(super) const INSERT_COMMENT: &str = r#"
    INSERT INTO item_comments (item_id, user_id, content, created_at)
    VALUES (?1, ?2, ?3, ?4)
"#;

pub(super) const SELECT_COMMENT_BY_ID: &str = r#"
    SELECT id, item_id, user_id, content, created_at
    FROM item_comments
    WHERE id = ?1
"#;

pub(super) const SELECT_COMMENTS_BY_ITEM: &str = r#"
    SELECT id, item_id, user_id, content, created_at
    FROM item_comments
    WHERE item_id = ?1
    ORDER BY created_at DESC, id DESC
"#;

pub(super) const DELETE_COMMENT: &str = r#"
    DELETE FROM item_comments
    WHERE id = ?1
"#;
