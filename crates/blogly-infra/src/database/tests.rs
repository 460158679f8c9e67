use chrono::{TimeZone, Utc};
use sea_orm::{
    DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult, RuntimeErr,
};

use blogly_core::DomainError;
use blogly_core::domain::{
    DEFAULT_IMAGE_URL, NewPost, NewTag, NewUser, PostChanges, TagChanges, UserChanges,
};
use blogly_core::error::RepoError;
use blogly_core::ports::{BaseRepository, PostRepository, TagRepository, UserRepository};

use crate::database::entity::{post, post_tag, tag, user};
use crate::database::postgres_base::classify;
use crate::database::postgres_repo::{
    PostgresPostRepository, PostgresTagRepository, PostgresUserRepository,
};

fn user_model(id: i32, first: &str, last: &str) -> user::Model {
    user::Model {
        id,
        first_name: first.to_owned(),
        last_name: last.to_owned(),
        image_url: DEFAULT_IMAGE_URL.to_owned(),
    }
}

fn post_model(id: i32, user_id: i32, title: &str, hour: u32) -> post::Model {
    post::Model {
        id,
        title: title.to_owned(),
        content: "Content".to_owned(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 5, hour, 0, 0).unwrap().into(),
        user_id,
    }
}

fn tag_model(id: i32, name: &str) -> tag::Model {
    tag::Model {
        id,
        name: name.to_owned(),
    }
}

/// SQL of every logged transaction, one `Vec` per transaction.
fn transaction_sql(db: DatabaseConnection) -> Vec<Vec<String>> {
    db.into_transaction_log()
        .into_iter()
        .map(|txn| txn.statements().iter().map(|stmt| stmt.sql.clone()).collect())
        .collect()
}

/// Each statement must contain the matching fragment, in order.
fn assert_statements(sql: &[String], fragments: &[&str]) {
    assert_eq!(sql.len(), fragments.len(), "statements: {sql:#?}");
    for (stmt, fragment) in sql.iter().zip(fragments) {
        assert!(stmt.contains(fragment), "expected `{fragment}` in `{stmt}`");
    }
}

fn exec_ok(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

#[tokio::test]
async fn test_find_post_by_id_with_tags() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(3, 1, "Hi", 14)]])
        .append_query_results([vec![
            post_tag::Model {
                post_id: 3,
                tag_id: 2,
            },
            post_tag::Model {
                post_id: 3,
                tag_id: 5,
            },
        ]])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());
    let post = repo.get_by_id(3).await.unwrap();

    assert_eq!(post.id, 3);
    assert_eq!(post.title, "Hi");
    assert_eq!(post.user_id, 1);
    assert_eq!(post.tag_ids, vec![2, 5]);
    assert_eq!(post.pretty_date(), "Tue Mar 5 2024, 2:00 PM");

    // Post row and its links come from the same snapshot.
    let log = transaction_sql(db);
    assert_eq!(log.len(), 1);
    assert_statements(
        &log[0],
        &["BEGIN", r#"FROM "posts""#, r#"FROM "posts_tags""#, "COMMIT"],
    );
}

#[tokio::test]
async fn test_missing_user_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let err = repo.get_by_id(99).await.unwrap_err();

    assert_eq!(err, DomainError::not_found("User", 99));
}

#[tokio::test]
async fn test_list_users_preserves_database_order() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![
            user_model(2, "Grace", "Hopper"),
            user_model(1, "Ada", "Lovelace"),
        ]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let users = repo.list_all().await.unwrap();

    let names: Vec<String> = users.iter().map(|u| u.full_name()).collect();
    assert_eq!(names, ["Grace Hopper", "Ada Lovelace"]);
}

#[tokio::test]
async fn test_create_user_returns_inserted_row() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_model(7, "Ada", "Lovelace")]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let user = repo.create(NewUser::new("Ada", "Lovelace")).await.unwrap();

    assert_eq!(user.id, 7);
    assert_eq!(user.image_url, DEFAULT_IMAGE_URL);
}

#[tokio::test]
async fn test_create_user_validates_before_touching_database() {
    // No results queued: any query would fail the test with a mock error.
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let repo = PostgresUserRepository::new(db);
    let err = repo.create(NewUser::new("", "Lovelace")).await.unwrap_err();

    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_delete_user_cascades_in_one_transaction() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_model(1, "Ada", "Lovelace")]])
        .append_query_results([vec![post_model(10, 1, "Hi", 9)]])
        .append_exec_results([exec_ok(2), exec_ok(1), exec_ok(1)])
        .into_connection();

    let repo = PostgresUserRepository::new(db.clone());
    let deleted = repo.delete(1).await.unwrap();

    assert_eq!(deleted.full_name(), "Ada Lovelace");

    let log = transaction_sql(db);
    assert_eq!(log.len(), 1);
    assert_statements(
        &log[0],
        &[
            "BEGIN",
            r#"FROM "users""#,
            r#"FROM "posts""#,
            r#"DELETE FROM "posts_tags""#,
            r#"DELETE FROM "posts""#,
            r#"DELETE FROM "users""#,
            "COMMIT",
        ],
    );
}

#[tokio::test]
async fn test_list_recent_loads_tags() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![
            post_model(2, 1, "Later", 15),
            post_model(1, 1, "Earlier", 10),
        ]])
        .append_query_results([vec![post_tag::Model {
            post_id: 1,
            tag_id: 4,
        }]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let posts = repo.list_recent(5).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].title, "Later");
    assert!(posts[0].tag_ids.is_empty());
    assert_eq!(posts[1].tag_ids, vec![4]);
}

#[tokio::test]
async fn test_duplicate_tag_name_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tag::Model {
            id: 1,
            name: "tech".to_owned(),
        }]])
        .into_connection();

    let repo = PostgresTagRepository::new(db);
    let err = repo.create(NewTag::new("tech")).await.unwrap_err();

    assert_eq!(
        err,
        DomainError::Validation("tag name 'tech' is already taken".into())
    );
}

#[tokio::test]
async fn test_delete_tag_reports_untagged_posts() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tag::Model {
            id: 4,
            name: "tech".to_owned(),
        }]])
        .append_query_results([vec![
            post_tag::Model {
                post_id: 1,
                tag_id: 4,
            },
            post_tag::Model {
                post_id: 3,
                tag_id: 4,
            },
        ]])
        .append_exec_results([exec_ok(2), exec_ok(1)])
        .into_connection();

    let repo = PostgresTagRepository::new(db);
    let deleted = repo.delete(4).await.unwrap();

    assert_eq!(deleted.name, "tech");
    assert_eq!(deleted.post_ids, vec![1, 3]);
}

#[tokio::test]
async fn test_update_user_overwrites_fields() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_model(1, "Ada", "Lovelace")]])
        .append_query_results([vec![user_model(1, "Ada", "King")]])
        .into_connection();

    let repo = PostgresUserRepository::new(db.clone());
    let changes = UserChanges {
        first_name: "Ada".into(),
        last_name: "King".into(),
        image_url: String::new(),
    };
    let user = repo.update(1, changes).await.unwrap();

    assert_eq!(user.full_name(), "Ada King");
    assert_eq!(user.image_url, DEFAULT_IMAGE_URL);

    let log = transaction_sql(db);
    assert_eq!(log.len(), 1);
    assert_statements(
        &log[0],
        &["BEGIN", r#"FROM "users""#, r#"UPDATE "users""#, "COMMIT"],
    );
}

#[tokio::test]
async fn test_update_missing_user_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let changes = UserChanges {
        first_name: "Ada".into(),
        last_name: "King".into(),
        image_url: String::new(),
    };

    assert_eq!(
        repo.update(4, changes).await.unwrap_err(),
        DomainError::not_found("User", 4)
    );
}

#[tokio::test]
async fn test_create_post_links_only_existing_tags() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_model(1, "Ada", "Lovelace")]])
        .append_query_results([vec![tag_model(2, "tech")]])
        .append_query_results([vec![post_model(10, 1, "Hi", 9)]])
        .append_exec_results([exec_ok(1)])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());
    let post = repo
        .create(1, NewPost::new("Hi", "World").with_tags(vec![9, 2]))
        .await
        .unwrap();

    assert_eq!(post.id, 10);
    assert_eq!(post.user_id, 1);
    assert_eq!(post.tag_ids, vec![2]);

    let log = transaction_sql(db);
    assert_eq!(log.len(), 1);
    assert_statements(
        &log[0],
        &[
            "BEGIN",
            r#"FROM "users""#,
            r#"FROM "tags""#,
            r#"INSERT INTO "posts""#,
            r#"INSERT INTO "posts_tags""#,
            "COMMIT",
        ],
    );
}

#[tokio::test]
async fn test_create_post_for_missing_user_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());
    let err = repo
        .create(5, NewPost::new("Hi", "World"))
        .await
        .unwrap_err();

    assert_eq!(err, DomainError::not_found("User", 5));
    let inserted = transaction_sql(db)
        .concat()
        .iter()
        .any(|stmt| stmt.contains("INSERT"));
    assert!(!inserted);
}

#[tokio::test]
async fn test_update_post_replaces_tag_set() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(3, 1, "Hi", 9)]])
        .append_query_results([vec![tag_model(4, "rust"), tag_model(5, "tech")]])
        .append_query_results([vec![post_model(3, 1, "Hello", 9)]])
        .append_exec_results([exec_ok(1), exec_ok(2)])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());
    let changes = PostChanges {
        title: "Hello".into(),
        content: "Content".into(),
        tag_ids: vec![5, 4],
    };
    let post = repo.update(3, changes).await.unwrap();

    assert_eq!(post.title, "Hello");
    assert_eq!(post.tag_ids, vec![4, 5]);

    let log = transaction_sql(db);
    assert_eq!(log.len(), 1);
    assert_statements(
        &log[0],
        &[
            "BEGIN",
            r#"FROM "posts""#,
            r#"FROM "tags""#,
            r#"UPDATE "posts""#,
            r#"DELETE FROM "posts_tags""#,
            r#"INSERT INTO "posts_tags""#,
            "COMMIT",
        ],
    );
}

#[tokio::test]
async fn test_update_post_clearing_tags_inserts_no_links() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(3, 1, "Hi", 9)]])
        .append_query_results([vec![post_model(3, 1, "Hi", 9)]])
        .append_exec_results([exec_ok(2)])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());
    let changes = PostChanges {
        title: "Hi".into(),
        content: "Content".into(),
        tag_ids: Vec::new(),
    };
    let post = repo.update(3, changes).await.unwrap();

    assert!(post.tag_ids.is_empty());
    let log = transaction_sql(db);
    assert_statements(
        &log[0],
        &[
            "BEGIN",
            r#"FROM "posts""#,
            r#"UPDATE "posts""#,
            r#"DELETE FROM "posts_tags""#,
            "COMMIT",
        ],
    );
}

#[tokio::test]
async fn test_posts_by_missing_user_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let err = repo.list_by_user(8).await.unwrap_err();

    assert_eq!(err, DomainError::not_found("User", 8));
}

#[tokio::test]
async fn test_posts_by_user_load_tags_in_one_snapshot() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_model(1, "Ada", "Lovelace")]])
        .append_query_results([vec![post_model(6, 1, "Newer", 12), post_model(2, 1, "Older", 8)]])
        .append_query_results([vec![post_tag::Model {
            post_id: 2,
            tag_id: 7,
        }]])
        .into_connection();

    let repo = PostgresPostRepository::new(db.clone());
    let posts = repo.list_by_user(1).await.unwrap();

    let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Newer", "Older"]);
    assert_eq!(posts[1].tag_ids, vec![7]);

    let log = transaction_sql(db);
    assert_eq!(log.len(), 1);
    assert_statements(
        &log[0],
        &[
            "BEGIN",
            r#"FROM "users""#,
            r#"FROM "posts""#,
            r#"FROM "posts_tags""#,
            "COMMIT",
        ],
    );
}

#[tokio::test]
async fn test_create_tag_links_existing_posts() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<tag::Model>::new()])
        .append_query_results([vec![post_model(1, 1, "Hi", 9)]])
        .append_query_results([vec![tag_model(3, "tech")]])
        .append_exec_results([exec_ok(1)])
        .into_connection();

    let repo = PostgresTagRepository::new(db.clone());
    let tag = repo
        .create(NewTag::new("tech").with_posts(vec![1, 8]))
        .await
        .unwrap();

    assert_eq!(tag.id, 3);
    assert_eq!(tag.name, "tech");
    assert_eq!(tag.post_ids, vec![1]);

    let log = transaction_sql(db);
    assert_eq!(log.len(), 1);
    assert_statements(
        &log[0],
        &[
            "BEGIN",
            r#"FROM "tags""#,
            r#"FROM "posts""#,
            r#"INSERT INTO "tags""#,
            r#"INSERT INTO "posts_tags""#,
            "COMMIT",
        ],
    );
}

#[tokio::test]
async fn test_update_tag_keeping_its_own_name() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tag_model(3, "tech")]])
        .append_query_results([Vec::<tag::Model>::new()])
        .append_query_results([vec![tag_model(3, "tech")]])
        .append_exec_results([exec_ok(1)])
        .into_connection();

    let repo = PostgresTagRepository::new(db);
    let changes = TagChanges {
        name: "tech".into(),
        post_ids: Vec::new(),
    };
    let tag = repo.update(3, changes).await.unwrap();

    assert_eq!(tag.name, "tech");
    assert!(tag.post_ids.is_empty());
}

#[tokio::test]
async fn test_update_tag_to_taken_name_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tag_model(3, "tech")]])
        .append_query_results([vec![tag_model(1, "rust")]])
        .into_connection();

    let repo = PostgresTagRepository::new(db.clone());
    let changes = TagChanges {
        name: "rust".into(),
        post_ids: Vec::new(),
    };
    let err = repo.update(3, changes).await.unwrap_err();

    assert_eq!(
        err,
        DomainError::Validation("tag name 'rust' is already taken".into())
    );
    let updated = transaction_sql(db)
        .concat()
        .iter()
        .any(|stmt| stmt.contains("UPDATE"));
    assert!(!updated);
}

#[test]
fn test_classify_storage_errors() {
    let err = classify(DbErr::Conn(RuntimeErr::Internal("refused".into())));
    assert!(matches!(err, RepoError::Connection(_)));

    let err = classify(DbErr::Custom("syntax".into()));
    assert!(matches!(err, RepoError::Query(_)));
}
