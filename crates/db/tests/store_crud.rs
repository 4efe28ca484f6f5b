//! Integration tests for the relational mirror against an in-memory database.

use corpus_core::groups::Group;
use corpus_core::{ContentStatus, GroupMode};
use corpus_db::models::content::{ContentRow, CreateContent, UpdateContent};
use corpus_db::models::post::CreatePost;
use corpus_db::models::version::CreateVersion;
use corpus_db::repositories::{ContentRepo, GroupRepo, PostRepo, VersionRepo};
use sqlx::SqlitePool;

async fn setup() -> SqlitePool {
    corpus_db::connect_in_memory()
        .await
        .expect("in-memory pool")
}

fn blog_group() -> Group {
    Group {
        slug: "blog".into(),
        name: "Blog".into(),
        mode: GroupMode::Slug,
        content_type: "posts".into(),
        item_name: "Post".into(),
        item_name_plural: "Posts".into(),
        language: "en".into(),
        position: 0,
    }
}

async fn seed_post(pool: &SqlitePool, slug: &str) -> (i64, i64) {
    let group = GroupRepo::upsert(pool, &blog_group()).await.expect("group");
    let post = PostRepo::create(
        pool,
        &CreatePost {
            group_id: group.id,
            slug: slug.into(),
            post_date: None,
            post_time: None,
            status: ContentStatus::Draft.as_str().into(),
            primary_language: "en".into(),
            created_by: None,
        },
    )
    .await
    .expect("post");
    (group.id, post.id)
}

async fn seed_version(pool: &SqlitePool, post_id: i64, number: i64) -> i64 {
    VersionRepo::create(
        pool,
        &CreateVersion {
            post_id,
            version_number: number,
            status: ContentStatus::Draft.as_str().into(),
            created_from_version: None,
        },
    )
    .await
    .expect("version")
    .id
}

async fn seed_content(pool: &SqlitePool, version_id: i64, language: &str) -> ContentRow {
    ContentRepo::create(
        pool,
        &CreateContent {
            version_id,
            language: language.into(),
            title: format!("Title {language}"),
            body: format!("Body {language}"),
            status: ContentStatus::Draft.as_str().into(),
            custom_slug: None,
            metadata: None,
        },
    )
    .await
    .expect("content")
}

// --- groups ---

#[tokio::test]
async fn group_upsert_is_idempotent() {
    let pool = setup().await;
    let first = GroupRepo::upsert(&pool, &blog_group()).await.unwrap();

    let mut renamed = blog_group();
    renamed.name = "Weblog".into();
    let second = GroupRepo::upsert(&pool, &renamed).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.name, "Weblog");
    assert_eq!(GroupRepo::list(&pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn group_delete_cascades() {
    let pool = setup().await;
    let (_, post_id) = seed_post(&pool, "hello").await;
    let version_id = seed_version(&pool, post_id, 1).await;
    seed_content(&pool, version_id, "en").await;

    assert_eq!(GroupRepo::delete(&pool, "blog").await.unwrap(), 1);
    assert!(ContentRepo::list_by_version(&pool, version_id)
        .await
        .unwrap()
        .is_empty());
}

// --- posts ---

#[tokio::test]
async fn duplicate_post_slug_is_rejected() {
    let pool = setup().await;
    let (group_id, _) = seed_post(&pool, "hello").await;

    let dup = PostRepo::create(
        &pool,
        &CreatePost {
            group_id,
            slug: "hello".into(),
            post_date: None,
            post_time: None,
            status: ContentStatus::Draft.as_str().into(),
            primary_language: "en".into(),
            created_by: None,
        },
    )
    .await;
    assert!(dup.is_err());
}

#[tokio::test]
async fn post_upsert_updates_in_place() {
    let pool = setup().await;
    let (group_id, post_id) = seed_post(&pool, "hello").await;

    let upserted = PostRepo::upsert(
        &pool,
        &CreatePost {
            group_id,
            slug: "hello".into(),
            post_date: None,
            post_time: None,
            status: ContentStatus::Published.as_str().into(),
            primary_language: "de".into(),
            created_by: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(upserted.id, post_id);
    assert_eq!(upserted.status, "published");
    assert_eq!(upserted.primary_language, "de");
}

#[tokio::test]
async fn post_slug_rename() {
    let pool = setup().await;
    let (group_id, post_id) = seed_post(&pool, "hello").await;

    let renamed = PostRepo::update_slug(&pool, post_id, "hello-world")
        .await
        .unwrap()
        .expect("row");
    assert_eq!(renamed.slug, "hello-world");
    assert!(PostRepo::find_by_group_and_slug(&pool, group_id, "hello")
        .await
        .unwrap()
        .is_none());
}

// --- versions ---

#[tokio::test]
async fn max_version_number_starts_at_zero() {
    let pool = setup().await;
    let (_, post_id) = seed_post(&pool, "hello").await;
    assert_eq!(VersionRepo::max_version_number(&pool, post_id).await.unwrap(), 0);
    seed_version(&pool, post_id, 1).await;
    seed_version(&pool, post_id, 2).await;
    assert_eq!(VersionRepo::max_version_number(&pool, post_id).await.unwrap(), 2);
}

#[tokio::test]
async fn clone_from_copies_contents_as_draft() {
    let pool = setup().await;
    let (_, post_id) = seed_post(&pool, "hello").await;
    let v1 = seed_version(&pool, post_id, 1).await;
    seed_content(&pool, v1, "en").await;
    seed_content(&pool, v1, "de").await;
    VersionRepo::update_status(&pool, v1, "published").await.unwrap();

    let v2 = VersionRepo::clone_from(&pool, post_id, 1).await.unwrap();
    assert_eq!(v2.version_number, 2);
    assert_eq!(v2.status, "draft");
    assert_eq!(v2.created_from_version, Some(1));

    let cloned = ContentRepo::list_by_version(&pool, v2.id).await.unwrap();
    assert_eq!(cloned.len(), 2);
    assert!(cloned.iter().all(|c| c.status == "draft"));
    assert_eq!(cloned[0].title, "Title en");
}

#[tokio::test]
async fn clone_from_missing_source_fails() {
    let pool = setup().await;
    let (_, post_id) = seed_post(&pool, "hello").await;
    assert!(VersionRepo::clone_from(&pool, post_id, 7).await.is_err());
    assert!(VersionRepo::list_by_post(&pool, post_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn publish_archives_the_previously_live_version() {
    let pool = setup().await;
    let (_, post_id) = seed_post(&pool, "hello").await;
    let v1 = seed_version(&pool, post_id, 1).await;
    let v2 = seed_version(&pool, post_id, 2).await;
    let c1 = seed_content(&pool, v1, "en").await;
    seed_content(&pool, v2, "en").await;

    VersionRepo::publish(&pool, post_id, 1).await.unwrap();
    VersionRepo::publish(&pool, post_id, 2).await.unwrap();

    let versions = VersionRepo::list_by_post(&pool, post_id).await.unwrap();
    assert_eq!(versions[0].status, "archived");
    assert_eq!(versions[1].status, "published");

    let old = ContentRepo::find_by_version_and_language(&pool, v1, "en")
        .await
        .unwrap()
        .expect("row");
    assert_eq!(old.id, c1.id);
    assert_eq!(old.status, "archived");
}

#[tokio::test]
async fn publish_is_idempotent() {
    let pool = setup().await;
    let (_, post_id) = seed_post(&pool, "hello").await;
    let v1 = seed_version(&pool, post_id, 1).await;
    seed_content(&pool, v1, "en").await;

    VersionRepo::publish(&pool, post_id, 1).await.unwrap();
    VersionRepo::publish(&pool, post_id, 1).await.unwrap();

    let versions = VersionRepo::list_by_post(&pool, post_id).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].status, "published");
}

// --- contents ---

#[tokio::test]
async fn resolve_falls_back_to_primary_then_first() {
    let pool = setup().await;
    let (_, post_id) = seed_post(&pool, "hello").await;
    let version_id = seed_version(&pool, post_id, 1).await;
    seed_content(&pool, version_id, "de").await;
    seed_content(&pool, version_id, "en").await;

    let exact = ContentRepo::resolve(&pool, version_id, Some("de"), "en")
        .await
        .unwrap()
        .expect("row");
    assert_eq!(exact.language, "de");

    let primary = ContentRepo::resolve(&pool, version_id, Some("fr"), "en")
        .await
        .unwrap()
        .expect("row");
    assert_eq!(primary.language, "en");

    let first = ContentRepo::resolve(&pool, version_id, Some("fr"), "it")
        .await
        .unwrap()
        .expect("row");
    assert_eq!(first.language, "de");
}

#[tokio::test]
async fn update_patches_only_given_fields() {
    let pool = setup().await;
    let (_, post_id) = seed_post(&pool, "hello").await;
    let version_id = seed_version(&pool, post_id, 1).await;
    let row = seed_content(&pool, version_id, "en").await;

    let patched = ContentRepo::update(
        &pool,
        row.id,
        &UpdateContent {
            title: Some("New title".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .expect("row");
    assert_eq!(patched.title, "New title");
    assert_eq!(patched.body, "Body en");
}

#[tokio::test]
async fn count_active_ignores_archived_languages() {
    let pool = setup().await;
    let (_, post_id) = seed_post(&pool, "hello").await;
    let version_id = seed_version(&pool, post_id, 1).await;
    let en = seed_content(&pool, version_id, "en").await;
    seed_content(&pool, version_id, "de").await;

    assert_eq!(ContentRepo::count_active(&pool, version_id).await.unwrap(), 2);
    ContentRepo::set_status(&pool, en.id, "archived").await.unwrap();
    assert_eq!(ContentRepo::count_active(&pool, version_id).await.unwrap(), 1);
}

#[tokio::test]
async fn custom_slug_lookup_is_scoped_to_the_group() {
    let pool = setup().await;
    let (group_id, post_id) = seed_post(&pool, "hello").await;
    let version_id = seed_version(&pool, post_id, 1).await;
    let row = seed_content(&pool, version_id, "en").await;
    ContentRepo::update(
        &pool,
        row.id,
        &UpdateContent {
            custom_slug: Some("hello-custom".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let found = ContentRepo::find_by_custom_slug(&pool, group_id, "hello-custom")
        .await
        .unwrap()
        .expect("row");
    assert_eq!(found.id, row.id);
    assert!(ContentRepo::find_by_custom_slug(&pool, group_id + 1, "hello-custom")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn previous_slug_lookup_verifies_the_decoded_array() {
    let pool = setup().await;
    let (group_id, post_id) = seed_post(&pool, "hello").await;
    let version_id = seed_version(&pool, post_id, 1).await;
    let row = ContentRepo::create(
        &pool,
        &CreateContent {
            version_id,
            language: "en".into(),
            title: "Hello".into(),
            body: "Body".into(),
            status: "draft".into(),
            custom_slug: None,
            metadata: Some(r#"{"previous_slugs":["old-hello","older-hello"]}"#.into()),
        },
    )
    .await
    .unwrap();

    let found = ContentRepo::find_by_previous_slug(&pool, group_id, "old-hello")
        .await
        .unwrap()
        .expect("row");
    assert_eq!(found.id, row.id);

    // A substring hit in an unrelated field must not resolve.
    ContentRepo::create(
        &pool,
        &CreateContent {
            version_id,
            language: "de".into(),
            title: "Hallo".into(),
            body: "Body".into(),
            status: "draft".into(),
            custom_slug: None,
            metadata: Some(r#"{"description":"mentions \"ghost-slug\" in text"}"#.into()),
        },
    )
    .await
    .unwrap();
    assert!(ContentRepo::find_by_previous_slug(&pool, group_id, "ghost-slug")
        .await
        .unwrap()
        .is_none());
}
