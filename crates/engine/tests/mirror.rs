//! The one-way mirror never raises: relational failures and missing mirror
//! rows degrade to logged outcomes.

use corpus_core::frontmatter::FrontMatter;
use corpus_core::groups::Group;
use corpus_core::paths::PostId;
use corpus_core::types::{ContentStatus, GroupMode};
use corpus_db::repositories::{ContentRepo, GroupRepo, PostRepo, VersionRepo};
use corpus_engine::{MirrorContent, SyncOutcome, Synchronizer};
use sqlx::SqlitePool;

fn blog() -> Group {
    Group {
        slug: "blog".into(),
        name: "Blog".into(),
        mode: GroupMode::Slug,
        content_type: "posts".into(),
        item_name: "post".into(),
        item_name_plural: "posts".into(),
        language: "en".into(),
        position: 0,
    }
}

fn front(status: ContentStatus) -> FrontMatter {
    FrontMatter {
        slug: "hello-world".into(),
        status,
        ..Default::default()
    }
}

async fn setup() -> (SqlitePool, Synchronizer) {
    let pool = corpus_db::connect_in_memory().await.unwrap();
    (pool.clone(), Synchronizer::new(pool))
}

#[tokio::test]
async fn post_create_without_a_mirrored_group_is_skipped() {
    let (pool, sync) = setup().await;
    let fm = front(ContentStatus::Draft);

    let outcome = sync
        .sync_post_created(
            &blog(),
            &PostId::Slug("hello-world".into()),
            1,
            &MirrorContent {
                language: "en",
                title: "Hello World",
                body: "# Hello World",
                front: &fm,
            },
        )
        .await;

    assert!(matches!(outcome, SyncOutcome::Skipped(_)));
    // Nothing was written.
    assert!(GroupRepo::find_by_slug(&pool, "blog").await.unwrap().is_none());
}

#[tokio::test]
async fn post_create_with_a_mirrored_group_applies_all_rows() {
    let (pool, sync) = setup().await;
    let group = blog();
    assert_eq!(sync.sync_group_saved(&group).await, SyncOutcome::Applied);

    let fm = front(ContentStatus::Draft);
    let outcome = sync
        .sync_post_created(
            &group,
            &PostId::Slug("hello-world".into()),
            1,
            &MirrorContent {
                language: "en",
                title: "Hello World",
                body: "# Hello World\n\nBody.",
                front: &fm,
            },
        )
        .await;
    assert_eq!(outcome, SyncOutcome::Applied);

    let group_row = GroupRepo::find_by_slug(&pool, "blog").await.unwrap().unwrap();
    let post = PostRepo::find_by_group_and_slug(&pool, group_row.id, "hello-world")
        .await
        .unwrap()
        .unwrap();
    let version = VersionRepo::find_by_post_and_number(&pool, post.id, 1)
        .await
        .unwrap()
        .unwrap();
    let content = ContentRepo::find_by_version_and_language(&pool, version.id, "en")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(content.title, "Hello World");
}

#[tokio::test]
async fn relational_failures_degrade_to_a_logged_outcome() {
    let (pool, sync) = setup().await;
    let group = blog();
    sync.sync_group_saved(&group).await;

    // Break the schema out from under the mirror.
    sqlx::query("DROP TABLE posts").execute(&pool).await.unwrap();

    let fm = front(ContentStatus::Draft);
    let outcome = sync
        .sync_post_created(
            &group,
            &PostId::Slug("hello-world".into()),
            1,
            &MirrorContent {
                language: "en",
                title: "Hello World",
                body: "# Hello World",
                front: &fm,
            },
        )
        .await;
    assert_eq!(outcome, SyncOutcome::Failed);
}

#[tokio::test]
async fn version_archive_is_mirrored_down_to_the_content_rows() {
    let (pool, sync) = setup().await;
    let group = blog();
    sync.sync_group_saved(&group).await;

    let id = PostId::Slug("hello-world".into());
    let fm = front(ContentStatus::Draft);
    sync.sync_post_created(
        &group,
        &id,
        1,
        &MirrorContent {
            language: "en",
            title: "Hello World",
            body: "# Hello World",
            front: &fm,
        },
    )
    .await;
    sync.sync_version_created(
        &group,
        &id,
        2,
        Some(1),
        &[MirrorContent {
            language: "en",
            title: "Hello World",
            body: "# Hello World v2",
            front: &fm,
        }],
    )
    .await;

    assert_eq!(
        sync.sync_version_deleted(&group, &id, 2).await,
        SyncOutcome::Applied
    );

    let group_row = GroupRepo::find_by_slug(&pool, "blog").await.unwrap().unwrap();
    let post = PostRepo::find_by_group_and_slug(&pool, group_row.id, "hello-world")
        .await
        .unwrap()
        .unwrap();
    let version = VersionRepo::find_by_post_and_number(&pool, post.id, 2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(version.status, "archived");
    let content = ContentRepo::find_by_version_and_language(&pool, version.id, "en")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(content.status, "archived");
}

#[tokio::test]
async fn unmirrored_version_archive_is_skipped() {
    let (_pool, sync) = setup().await;
    let group = blog();
    sync.sync_group_saved(&group).await;

    let outcome = sync
        .sync_version_deleted(&group, &PostId::Slug("hello-world".into()), 1)
        .await;
    assert!(matches!(outcome, SyncOutcome::Skipped(_)));
}

#[tokio::test]
async fn publish_mirror_archives_the_previous_live_version() {
    let (pool, sync) = setup().await;
    let group = blog();
    sync.sync_group_saved(&group).await;

    let id = PostId::Slug("hello-world".into());
    let fm = front(ContentStatus::Published);
    sync.sync_post_created(
        &group,
        &id,
        1,
        &MirrorContent {
            language: "en",
            title: "Hello World",
            body: "# Hello World",
            front: &fm,
        },
    )
    .await;
    let draft = front(ContentStatus::Draft);
    sync.sync_version_created(
        &group,
        &id,
        2,
        Some(1),
        &[MirrorContent {
            language: "en",
            title: "Hello World",
            body: "# Hello World v2",
            front: &draft,
        }],
    )
    .await;

    assert_eq!(sync.sync_publish(&group, &id, 2).await, SyncOutcome::Applied);

    let group_row = GroupRepo::find_by_slug(&pool, "blog").await.unwrap().unwrap();
    let post = PostRepo::find_by_group_and_slug(&pool, group_row.id, "hello-world")
        .await
        .unwrap()
        .unwrap();
    let versions = VersionRepo::list_by_post(&pool, post.id).await.unwrap();
    let by_number = |n: i64| versions.iter().find(|v| v.version_number == n).unwrap();
    assert_eq!(by_number(1).status, "archived");
    assert_eq!(by_number(2).status, "published");
    assert_eq!(post.status, "published");
}
