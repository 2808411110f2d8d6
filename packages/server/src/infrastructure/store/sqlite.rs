//! SQLite ChatStore 実装
//!
//! ドメイン層が定義する ChatStore trait の具体的な実装。
//! sqlx の SQLite ドライバを使用し、スキーマは起動時に冪等に作成します。
//!
//! タイムスタンプはすべて Rust 側で `Utc::now()` を束縛して書き込みます
//! （RFC3339 の TEXT として保存され、chrono の `DateTime<Utc>` に復元される）。

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::domain::{
    ChatStore, MessageContent, MessageRecord, MessageWithSender, RefreshTokenRecord, Room, RoomId,
    RoomKind, StoreError, User, UserId, Username,
};

/// 起動時に実行する DDL（冪等）
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT    NOT NULL UNIQUE,
    email         TEXT    NOT NULL UNIQUE,
    password_hash TEXT    NOT NULL,
    full_name     TEXT,
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS chat_rooms (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT,
    kind       TEXT    NOT NULL CHECK (kind IN ('direct', 'group')),
    created_by INTEGER REFERENCES users (id) ON DELETE SET NULL,
    created_at TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS chat_room_members (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    room_id   INTEGER NOT NULL REFERENCES chat_rooms (id) ON DELETE CASCADE,
    user_id   INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    joined_at TEXT    NOT NULL,
    UNIQUE (room_id, user_id)
);

CREATE TABLE IF NOT EXISTS messages (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    room_id    INTEGER NOT NULL REFERENCES chat_rooms (id) ON DELETE CASCADE,
    sender_id  INTEGER NOT NULL REFERENCES users (id),
    content    TEXT    NOT NULL,
    is_read    INTEGER NOT NULL DEFAULT 0,
    created_at TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_room_created
    ON messages (room_id, created_at);

CREATE TABLE IF NOT EXISTS refresh_tokens (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE,
    token      TEXT    NOT NULL UNIQUE,
    expires_at TEXT    NOT NULL,
    created_at TEXT    NOT NULL
);
"#;

fn store_err(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// SQLite ChatStore 実装
///
/// コネクションプールを内包し、ドメイン層の ChatStore trait を実装します（依存性の逆転）。
pub struct SqliteChatStore {
    pool: SqlitePool,
}

impl SqliteChatStore {
    /// データベースに接続し、スキーマを作成して Store を返す
    ///
    /// ファイルが無ければ作成します。`sqlite::memory:` も受け付けますが、
    /// インメモリ DB はプールの各コネクションが別の DB を見てしまうため、
    /// コネクション数を 1 に固定して回収もさせません。
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(store_err)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = database_url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .idle_timeout(if in_memory {
                None
            } else {
                Some(std::time::Duration::from_secs(600))
            })
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(store_err)?;

        let store = Self { pool };
        store.bootstrap().await?;
        Ok(store)
    }

    /// スキーマを冪等に作成する
    async fn bootstrap(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}

#[async_trait]
impl ChatStore for SqliteChatStore {
    // --- users ---

    async fn create_user(
        &self,
        username: Username,
        email: String,
        password_hash: String,
        full_name: Option<String>,
    ) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, full_name, is_active, created_at)
            VALUES (?, ?, ?, ?, 1, ?)
            RETURNING id, username, email, password_hash, full_name, is_active, created_at
            "#,
        )
        .bind(username.as_str())
        .bind(&email)
        .bind(&password_hash)
        .bind(&full_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(user)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, full_name, is_active, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, full_name, is_active, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, full_name, is_active, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn update_password(&self, id: UserId, password_hash: String) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    // --- refresh tokens ---

    async fn save_refresh_token(
        &self,
        user_id: UserId,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&token)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn refresh_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError> {
        sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT id, user_id, token, expires_at, created_at
            FROM refresh_tokens
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn delete_refresh_token(&self, token: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_refresh_tokens_for(&self, user_id: UserId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected())
    }

    // --- rooms & durable membership ---

    async fn room_by_id(&self, id: RoomId) -> Result<Option<Room>, StoreError> {
        sqlx::query_as::<_, Room>(
            r#"
            SELECT id, name, kind, created_by, created_at
            FROM chat_rooms
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn get_or_create_direct_room(&self, a: UserId, b: UserId) -> Result<Room, StoreError> {
        // 既存の direct ルームを探す。両参加者がメンバーであるルームは
        // 高々 1 つ（direct ルームのメンバーは作成時の 2 人で固定）。
        let existing = sqlx::query_as::<_, Room>(
            r#"
            SELECT r.id, r.name, r.kind, r.created_by, r.created_at
            FROM chat_rooms r
            WHERE r.kind = 'direct'
              AND EXISTS (SELECT 1 FROM chat_room_members WHERE room_id = r.id AND user_id = ?1)
              AND EXISTS (SELECT 1 FROM chat_room_members WHERE room_id = r.id AND user_id = ?2)
            ORDER BY r.id
            LIMIT 1
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        if let Some(room) = existing {
            return Ok(room);
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let room = sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO chat_rooms (name, kind, created_by, created_at)
            VALUES (NULL, 'direct', ?, ?)
            RETURNING id, name, kind, created_by, created_at
            "#,
        )
        .bind(a)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;

        for user_id in [a, b] {
            sqlx::query(
                "INSERT INTO chat_room_members (room_id, user_id, joined_at) VALUES (?, ?, ?)",
            )
            .bind(room.id)
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        tx.commit().await.map_err(store_err)?;
        Ok(room)
    }

    async fn create_group_room(
        &self,
        name: String,
        creator: UserId,
        members: Vec<UserId>,
    ) -> Result<Room, StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let room = sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO chat_rooms (name, kind, created_by, created_at)
            VALUES (?, 'group', ?, ?)
            RETURNING id, name, kind, created_by, created_at
            "#,
        )
        .bind(&name)
        .bind(creator)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;

        // 作成者を先頭に、重複は OR IGNORE で吸収する
        for user_id in std::iter::once(creator).chain(members) {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO chat_room_members (room_id, user_id, joined_at)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(room.id)
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        tx.commit().await.map_err(store_err)?;
        Ok(room)
    }

    async fn is_member(&self, user_id: UserId, room_id: RoomId) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM chat_room_members WHERE room_id = ? AND user_id = ?",
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(count > 0)
    }

    async fn add_members(&self, room_id: RoomId, user_ids: Vec<UserId>) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let mut added = 0;
        for user_id in user_ids {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO chat_room_members (room_id, user_id, joined_at)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(room_id)
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
            added += result.rows_affected();
        }

        tx.commit().await.map_err(store_err)?;
        Ok(added)
    }

    async fn remove_member(&self, room_id: RoomId, user_id: UserId) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM chat_room_members WHERE room_id = ? AND user_id = ?")
                .bind(room_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn room_members(&self, room_id: RoomId) -> Result<Vec<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.full_name, u.is_active,
                   u.created_at
            FROM users u
            JOIN chat_room_members m ON m.user_id = u.id
            WHERE m.room_id = ?
            ORDER BY m.joined_at, u.id
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn rooms_of_user(&self, user_id: UserId, kind: RoomKind) -> Result<Vec<Room>, StoreError> {
        sqlx::query_as::<_, Room>(
            r#"
            SELECT r.id, r.name, r.kind, r.created_by, r.created_at
            FROM chat_rooms r
            JOIN chat_room_members m ON m.room_id = r.id
            WHERE m.user_id = ? AND r.kind = ?
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)
    }

    // --- messages ---

    async fn append_message(
        &self,
        room_id: RoomId,
        sender_id: UserId,
        content: &MessageContent,
    ) -> Result<MessageRecord, StoreError> {
        sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (room_id, sender_id, content, is_read, created_at)
            VALUES (?, ?, ?, 0, ?)
            RETURNING id, room_id, sender_id, content, is_read, created_at
            "#,
        )
        .bind(room_id)
        .bind(sender_id)
        .bind(content.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn messages_for_room(
        &self,
        room_id: RoomId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MessageWithSender>, StoreError> {
        sqlx::query_as::<_, MessageWithSender>(
            r#"
            SELECT m.id, m.room_id, m.sender_id, u.username AS sender_username,
                   m.content, m.is_read, m.created_at
            FROM messages m
            JOIN users u ON u.id = m.sender_id
            WHERE m.room_id = ?
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(room_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn mark_messages_read(&self, room_id: RoomId, reader: UserId) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = 1
            WHERE room_id = ? AND sender_id != ? AND is_read = 0
            "#,
        )
        .bind(room_id)
        .bind(reader)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(result.rows_affected())
    }

    async fn unread_count(&self, room_id: RoomId, reader: UserId) -> Result<i64, StoreError> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM messages
            WHERE room_id = ? AND sender_id != ? AND is_read = 0
            "#,
        )
        .bind(room_id)
        .bind(reader)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)
    }

    async fn last_message(&self, room_id: RoomId) -> Result<Option<MessageRecord>, StoreError> {
        sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, room_id, sender_id, content, is_read, created_at
            FROM messages
            WHERE room_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - SqliteChatStore の CRUD 操作（ユーザー・ルーム・メンバーシップ・
    //   メッセージ・リフレッシュトークン）
    // - direct ルームの get-or-create が冪等であること
    // - 既読管理が「自分以外の送信分」にだけ効くこと
    //
    // 【なぜこのテストが必要か】
    // - Store は UseCase から呼ばれるデータアクセス層の中核
    // - SQL とドメイン型のマッピング（newtype / enum / timestamp）は
    //   コンパイル時に検証されないため、実 DB に対して確認する必要がある
    //
    // 【どのようなシナリオをテストするか】
    // 1. ユーザー作成と各キーでの取得
    // 2. direct ルームの作成と再取得（引数の順序を入れ替えても同じルーム）
    // 3. group ルーム作成時に作成者がメンバーに含まれること
    // 4. メンバー追加のスキップ動作・削除の真偽値
    // 5. メッセージ追記・ページング・既読化・未読数
    // 6. リフレッシュトークンの保存・削除・一括削除
    // ========================================

    async fn create_test_store() -> SqliteChatStore {
        SqliteChatStore::connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory store")
    }

    async fn seed_user(store: &SqliteChatStore, name: &str) -> User {
        store
            .create_user(
                Username::new(name.to_string()).expect("Invalid username"),
                format!("{name}@example.com"),
                "$2b$12$testhash".to_string(),
                None,
            )
            .await
            .expect("Failed to create user")
    }

    #[tokio::test]
    async fn test_create_user_and_fetch_by_each_key() {
        // テスト項目: ユーザーを作成し、ID / ユーザー名 / メールで取得できる
        // given (前提条件):
        let store = create_test_store().await;

        // when (操作):
        let created = seed_user(&store, "alice").await;

        // then (期待する結果):
        let by_id = store.user_by_id(created.id).await.unwrap().unwrap();
        let by_name = store.user_by_username("alice").await.unwrap().unwrap();
        let by_email = store
            .user_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.id, created.id);
        assert_eq!(by_name.id, created.id);
        assert_eq!(by_email.id, created.id);
        assert!(by_id.is_active);
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_username() {
        // テスト項目: 同じユーザー名での二重登録は Backend エラーになる
        // given (前提条件):
        let store = create_test_store().await;
        seed_user(&store, "alice").await;

        // when (操作):
        let result = store
            .create_user(
                Username::new("alice".to_string()).unwrap(),
                "other@example.com".to_string(),
                "$2b$12$testhash".to_string(),
                None,
            )
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn test_unknown_user_returns_none() {
        // テスト項目: 存在しないユーザーの取得は Ok(None) を返す
        // given (前提条件):
        let store = create_test_store().await;

        // when (操作):
        let result = store.user_by_id(UserId(999)).await.unwrap();

        // then (期待する結果):
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_direct_room_get_or_create_is_idempotent() {
        // テスト項目: 同じ 2 人に対する get_or_create は同じルームを返す
        // （引数の順序を入れ替えても同じ）
        // given (前提条件):
        let store = create_test_store().await;
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;

        // when (操作):
        let first = store
            .get_or_create_direct_room(alice.id, bob.id)
            .await
            .unwrap();
        let second = store
            .get_or_create_direct_room(bob.id, alice.id)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(first.id, second.id);
        assert_eq!(first.kind, RoomKind::Direct);
        assert!(first.name.is_none());
        assert!(store.is_member(alice.id, first.id).await.unwrap());
        assert!(store.is_member(bob.id, first.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_distinct_pairs_get_distinct_direct_rooms() {
        // テスト項目: 参加者ペアが異なれば direct ルームも別になる
        // given (前提条件):
        let store = create_test_store().await;
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let carol = seed_user(&store, "carol").await;

        // when (操作):
        let ab = store
            .get_or_create_direct_room(alice.id, bob.id)
            .await
            .unwrap();
        let ac = store
            .get_or_create_direct_room(alice.id, carol.id)
            .await
            .unwrap();

        // then (期待する結果):
        assert_ne!(ab.id, ac.id);
    }

    #[tokio::test]
    async fn test_group_room_includes_creator_as_member() {
        // テスト項目: group ルーム作成時、members に作成者が無くても作成者は
        // メンバーになる
        // given (前提条件):
        let store = create_test_store().await;
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;

        // when (操作):
        let room = store
            .create_group_room("team".to_string(), alice.id, vec![bob.id])
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(room.kind, RoomKind::Group);
        assert_eq!(room.name.as_deref(), Some("team"));
        assert_eq!(room.created_by, Some(alice.id));
        let members = store.room_members(room.id).await.unwrap();
        let ids: Vec<UserId> = members.iter().map(|m| m.id).collect();
        assert!(ids.contains(&alice.id));
        assert!(ids.contains(&bob.id));
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn test_add_members_skips_existing_and_counts_added() {
        // テスト項目: メンバー追加は既存メンバーをスキップし、実際に追加した
        // 人数だけを返す
        // given (前提条件):
        let store = create_test_store().await;
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let carol = seed_user(&store, "carol").await;
        let room = store
            .create_group_room("team".to_string(), alice.id, vec![bob.id])
            .await
            .unwrap();

        // when (操作): bob は既にメンバー、carol だけが新規
        let added = store
            .add_members(room.id, vec![bob.id, carol.id])
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(added, 1);
        assert!(store.is_member(carol.id, room.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_member_reports_whether_present() {
        // テスト項目: メンバー削除は削除できたかどうかを返す（冪等）
        // given (前提条件):
        let store = create_test_store().await;
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let room = store
            .create_group_room("team".to_string(), alice.id, vec![bob.id])
            .await
            .unwrap();

        // when (操作):
        let first = store.remove_member(room.id, bob.id).await.unwrap();
        let second = store.remove_member(room.id, bob.id).await.unwrap();

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert!(!store.is_member(bob.id, room.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_rooms_of_user_filters_by_kind() {
        // テスト項目: rooms_of_user は指定した種別のルームだけを返す
        // given (前提条件):
        let store = create_test_store().await;
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        store
            .get_or_create_direct_room(alice.id, bob.id)
            .await
            .unwrap();
        let group = store
            .create_group_room("team".to_string(), alice.id, vec![])
            .await
            .unwrap();

        // when (操作):
        let groups = store.rooms_of_user(alice.id, RoomKind::Group).await.unwrap();
        let directs = store
            .rooms_of_user(alice.id, RoomKind::Direct)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, group.id);
        assert_eq!(directs.len(), 1);
        assert_eq!(directs[0].kind, RoomKind::Direct);
    }

    #[tokio::test]
    async fn test_append_message_assigns_id_and_preserves_content() {
        // テスト項目: メッセージ追記で ID が採番され、本文は送信されたまま
        // （前後の空白込み）保存される
        // given (前提条件):
        let store = create_test_store().await;
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let room = store
            .get_or_create_direct_room(alice.id, bob.id)
            .await
            .unwrap();
        let content = MessageContent::new("  hello bob  ").unwrap();

        // when (操作):
        let record = store
            .append_message(room.id, alice.id, &content)
            .await
            .unwrap();

        // then (期待する結果):
        assert!(record.id.value() > 0);
        assert_eq!(record.content, "  hello bob  ");
        assert!(!record.is_read);
        assert_eq!(record.sender_id, alice.id);
    }

    #[tokio::test]
    async fn test_messages_for_room_pages_newest_first() {
        // テスト項目: 履歴取得は新しい順に limit/offset でページングされる
        // given (前提条件):
        let store = create_test_store().await;
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let room = store
            .get_or_create_direct_room(alice.id, bob.id)
            .await
            .unwrap();
        for i in 1..=5 {
            let content = MessageContent::new(format!("msg-{i}")).unwrap();
            store
                .append_message(room.id, alice.id, &content)
                .await
                .unwrap();
        }

        // when (操作):
        let first_page = store.messages_for_room(room.id, 2, 0).await.unwrap();
        let second_page = store.messages_for_room(room.id, 2, 2).await.unwrap();

        // then (期待する結果): 新しい順（msg-5, msg-4 / msg-3, msg-2）
        let contents: Vec<&str> = first_page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["msg-5", "msg-4"]);
        let contents: Vec<&str> = second_page.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["msg-3", "msg-2"]);
        assert_eq!(first_page[0].sender_username, "alice");
    }

    #[tokio::test]
    async fn test_mark_messages_read_skips_own_messages() {
        // テスト項目: 既読化は自分が送ったメッセージに影響しない
        // given (前提条件):
        let store = create_test_store().await;
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let room = store
            .get_or_create_direct_room(alice.id, bob.id)
            .await
            .unwrap();
        let from_alice = MessageContent::new("from alice").unwrap();
        let from_bob = MessageContent::new("from bob").unwrap();
        store
            .append_message(room.id, alice.id, &from_alice)
            .await
            .unwrap();
        store
            .append_message(room.id, bob.id, &from_bob)
            .await
            .unwrap();

        // when (操作): alice が既読化する
        let marked = store.mark_messages_read(room.id, alice.id).await.unwrap();

        // then (期待する結果): bob の 1 件だけが既読になり、alice 宛ての
        // 未読は 0、bob から見ると alice の送信分が未読のまま
        assert_eq!(marked, 1);
        assert_eq!(store.unread_count(room.id, alice.id).await.unwrap(), 0);
        assert_eq!(store.unread_count(room.id, bob.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_last_message_returns_newest() {
        // テスト項目: last_message はルームの最新メッセージを返す
        // given (前提条件):
        let store = create_test_store().await;
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let room = store
            .get_or_create_direct_room(alice.id, bob.id)
            .await
            .unwrap();

        // when (操作):
        let empty = store.last_message(room.id).await.unwrap();
        for text in ["first", "second"] {
            let content = MessageContent::new(text).unwrap();
            store
                .append_message(room.id, alice.id, &content)
                .await
                .unwrap();
        }
        let latest = store.last_message(room.id).await.unwrap();

        // then (期待する結果):
        assert!(empty.is_none());
        assert_eq!(latest.unwrap().content, "second");
    }

    #[tokio::test]
    async fn test_refresh_token_lifecycle() {
        // テスト項目: リフレッシュトークンの保存・取得・削除・一括削除
        // given (前提条件):
        let store = create_test_store().await;
        let alice = seed_user(&store, "alice").await;
        let expires_at = Utc::now() + chrono::Duration::days(7);

        // when (操作):
        store
            .save_refresh_token(alice.id, "token-1".to_string(), expires_at)
            .await
            .unwrap();
        store
            .save_refresh_token(alice.id, "token-2".to_string(), expires_at)
            .await
            .unwrap();

        // then (期待する結果):
        let found = store.refresh_token("token-1").await.unwrap().unwrap();
        assert_eq!(found.user_id, alice.id);

        assert!(store.delete_refresh_token("token-1").await.unwrap());
        assert!(!store.delete_refresh_token("token-1").await.unwrap());

        let deleted = store.delete_refresh_tokens_for(alice.id).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store.refresh_token("token-2").await.unwrap().is_none());
    }
}
