//! Bulk comment deletion, restore and purge

mod common;

use blog_db::Repository;
use blog_models::CommentStatus;
use common::TestDb;

#[tokio::test]
#[ignore = "requires database"]
async fn delete_by_post_soft_deletes_every_comment() {
    let t = TestDb::new().await;
    let user = t.user().await;
    let post = t.post(user.id).await;
    let other = t.post(user.id).await;
    for _ in 0..4 {
        t.comment(post.id, user.id).await;
    }
    t.comment(other.id, user.id).await;

    let deleted = t.db.comments().delete_by_post(post.id).await.unwrap();
    assert_eq!(deleted, 4);

    assert!(t.db.comments().find_by_post(post.id).await.unwrap().is_empty());
    assert_eq!(t.raw_comment_rows(post.id).await, 4);
    assert_eq!(
        t.db.posts().get(post.id).await.unwrap().comment_status,
        CommentStatus::NoComments
    );

    // other posts are untouched
    assert_eq!(t.db.posts().live_comment_count(other.id).await.unwrap(), 1);
    assert!(t.db.posts().get(other.id).await.unwrap().has_comments());

    // nothing left to delete
    assert_eq!(t.db.comments().delete_by_post(post.id).await.unwrap(), 0);

    t.teardown().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn delete_by_post_ignores_non_positive_ids() {
    let t = TestDb::new().await;
    let user = t.user().await;
    let post = t.post(user.id).await;
    t.comment(post.id, user.id).await;

    assert_eq!(t.db.comments().delete_by_post(0).await.unwrap(), 0);
    assert_eq!(t.db.comments().delete_by_post(-7).await.unwrap(), 0);
    assert_eq!(t.db.comments().count().await.unwrap(), 1);

    t.teardown().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn delete_unknown_comment_is_not_found() {
    let t = TestDb::new().await;
    let user = t.user().await;
    let post = t.post(user.id).await;
    let comment = t.comment(post.id, user.id).await;

    t.db.comments().delete(comment.id).await.unwrap();
    let again = t.db.comments().delete(comment.id).await.unwrap_err();
    assert!(again.is_not_found());

    let missing = t.db.comments().delete(comment.id + 1000).await.unwrap_err();
    assert!(missing.is_not_found());

    t.teardown().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn restore_brings_comments_and_status_back() {
    let t = TestDb::new().await;
    let user = t.user().await;
    let post = t.post(user.id).await;
    t.comment(post.id, user.id).await;
    t.comment(post.id, user.id).await;

    t.db.comments().delete_by_post(post.id).await.unwrap();
    assert!(!t.db.posts().get(post.id).await.unwrap().has_comments());

    let restored = t.db.comments().restore_by_post(post.id).await.unwrap();
    assert_eq!(restored, 2);
    assert_eq!(t.db.comments().find_by_post(post.id).await.unwrap().len(), 2);
    assert_eq!(
        t.db.posts().get(post.id).await.unwrap().comment_status,
        CommentStatus::HasComments
    );

    assert_eq!(t.db.comments().restore_by_post(post.id).await.unwrap(), 0);
    assert_eq!(t.db.comments().restore_by_post(0).await.unwrap(), 0);

    t.teardown().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn purge_removes_only_deleted_rows() {
    let t = TestDb::new().await;
    let user = t.user().await;
    let post = t.post(user.id).await;
    let gone = t.comment(post.id, user.id).await;
    let kept = t.comment(post.id, user.id).await;

    t.db.comments().delete(gone.id).await.unwrap();
    assert_eq!(t.raw_comment_rows(post.id).await, 2);

    let purged = t.db.comments().purge_deleted(post.id).await.unwrap();
    assert_eq!(purged, 1);
    assert_eq!(t.raw_comment_rows(post.id).await, 1);

    let live = t.db.comments().find_by_post(post.id).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].id, kept.id);
    assert!(t.db.posts().get(post.id).await.unwrap().has_comments());

    t.teardown().await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn bulk_lookup_covers_several_posts() {
    let t = TestDb::new().await;
    let user = t.user().await;
    let a = t.post(user.id).await;
    let b = t.post(user.id).await;
    t.comment(a.id, user.id).await;
    t.comment(b.id, user.id).await;
    t.comment(b.id, user.id).await;

    let comments = t.db.comments().find_by_posts(&[a.id, b.id]).await.unwrap();
    assert_eq!(comments.len(), 3);
    assert!(comments.windows(2).all(|w| w[0].id < w[1].id));

    assert!(t.db.comments().find_by_posts(&[]).await.unwrap().is_empty());

    t.teardown().await;
}
