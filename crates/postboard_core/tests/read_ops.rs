use postboard_core::db::open_db_in_memory;
use postboard_core::{
    CreateCommentRequest, CreatePostRequest, CreateUserRequest, DalError, DataAccess, MemoryCache,
    RecordingRevalidator, User, RECENT_COMMENTS_LIMIT,
};
use rusqlite::Connection;
use uuid::Uuid;

fn dal(conn: &Connection) -> DataAccess<'_, MemoryCache, RecordingRevalidator> {
    DataAccess::new(conn, MemoryCache::new(), RecordingRevalidator::new())
}

fn user(dal: &DataAccess<'_, MemoryCache, RecordingRevalidator>, email: &str) -> User {
    dal.create_user(&CreateUserRequest::new(email)).unwrap()
}

#[test]
fn list_posts_caps_at_limit_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let dal = dal(&conn);
    let author = user(&dal, "a@x.com");

    let mut created = Vec::new();
    for i in 0..5 {
        let post = dal
            .create_post(&CreatePostRequest::new(format!("T{i}"), author.id.to_string()))
            .unwrap();
        created.push(post.post.id);
    }

    let listed = dal.list_posts(Some(3)).unwrap();
    assert_eq!(listed.len(), 3);
    let ids: Vec<Uuid> = listed.iter().map(|summary| summary.post.id).collect();
    assert_eq!(ids, vec![created[4], created[3], created[2]]);
    assert!(listed
        .windows(2)
        .all(|pair| pair[0].post.created_at >= pair[1].post.created_at));
}

#[test]
fn list_posts_defaults_to_five() {
    let conn = open_db_in_memory().unwrap();
    let dal = dal(&conn);
    let author = user(&dal, "a@x.com");
    for i in 0..7 {
        dal.create_post(&CreatePostRequest::new(format!("T{i}"), author.id.to_string()))
            .unwrap();
    }

    assert_eq!(dal.list_posts(None).unwrap().len(), 5);
}

#[test]
fn list_posts_embeds_authors_and_comment_threads() {
    let conn = open_db_in_memory().unwrap();
    let dal = dal(&conn);
    let author = user(&dal, "a@x.com");
    let reader = user(&dal, "b@x.com");
    let post = dal
        .create_post(&CreatePostRequest::new("T", author.id.to_string()))
        .unwrap()
        .post;
    for (content, who) in [("first", &reader), ("second", &author)] {
        dal.create_comment(&CreateCommentRequest::new(
            content,
            post.id.to_string(),
            who.id.to_string(),
        ))
        .unwrap();
    }

    let listed = dal.list_posts(None).unwrap();
    assert_eq!(listed.len(), 1);
    let summary = &listed[0];
    assert_eq!(summary.author, author);
    assert_eq!(summary.comment_count, 2);
    assert_eq!(summary.comments[0].comment.content, "second");
    assert_eq!(summary.comments[0].author, author);
    assert_eq!(summary.comments[1].author, reader);
}

#[test]
fn get_user_unknown_id_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let dal = dal(&conn);

    for id in ["does-not-exist".to_string(), Uuid::new_v4().to_string()] {
        assert_eq!(
            dal.get_user(&id).unwrap_err(),
            DalError::NotFound("user not found".to_string())
        );
    }
}

#[test]
fn get_user_orders_posts_and_caps_comments() {
    let conn = open_db_in_memory().unwrap();
    let dal = dal(&conn);
    let author = user(&dal, "a@x.com");

    let first = dal
        .create_post(&CreatePostRequest::new("first", author.id.to_string()))
        .unwrap()
        .post;
    let second = dal
        .create_post(&CreatePostRequest::new("second", author.id.to_string()))
        .unwrap()
        .post;
    for i in 0..12 {
        dal.create_comment(&CreateCommentRequest::new(
            format!("c{i}"),
            first.id.to_string(),
            author.id.to_string(),
        ))
        .unwrap();
    }

    let detail = dal.get_user(&author.id.to_string()).unwrap();
    assert_eq!(detail.user, author);
    let post_ids: Vec<Uuid> = detail.posts.iter().map(|post| post.id).collect();
    assert_eq!(post_ids, vec![second.id, first.id]);

    assert_eq!(detail.comments.len(), RECENT_COMMENTS_LIMIT as usize);
    assert_eq!(detail.comments[0].content, "c11");
    assert!(detail
        .comments
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
    assert_eq!(detail.counts.posts, 2);
    assert_eq!(detail.counts.comments, 12);
}

#[test]
fn list_users_includes_posts_and_counts() {
    let conn = open_db_in_memory().unwrap();
    let dal = dal(&conn);
    let older = user(&dal, "a@x.com");
    let newer = user(&dal, "b@x.com");
    dal.create_post(&CreatePostRequest::new("T", older.id.to_string()))
        .unwrap();

    let users = dal.list_users().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].user, newer);
    assert_eq!(users[1].user, older);
    assert_eq!(users[1].posts.len(), 1);
    assert_eq!(users[1].counts.posts, 1);
    assert_eq!(users[1].counts.comments, 0);
}

#[test]
fn list_users_twice_without_writes_is_equal() {
    let conn = open_db_in_memory().unwrap();
    let dal = dal(&conn);
    user(&dal, "a@x.com");

    let first = dal.list_users().unwrap();
    let second = dal.list_users().unwrap();
    assert_eq!(first, second);
}

#[test]
fn reads_never_signal_page_regeneration() {
    let conn = open_db_in_memory().unwrap();
    let dal = dal(&conn);

    dal.list_users().unwrap();
    dal.list_posts(None).unwrap();
    let _ = dal.get_user("does-not-exist");

    assert!(dal.pages().paths().is_empty());
}

#[test]
fn summaries_serialize_with_counts_and_flattened_rows() {
    let conn = open_db_in_memory().unwrap();
    let dal = dal(&conn);
    let author = user(&dal, "a@x.com");
    dal.create_post(&CreatePostRequest::new("T", author.id.to_string()))
        .unwrap();

    let json = serde_json::to_value(dal.list_posts(None).unwrap()).unwrap();
    assert_eq!(json[0]["title"], "T");
    assert_eq!(json[0]["authorId"], author.id.to_string());
    assert_eq!(json[0]["commentCount"], 0);
    assert_eq!(json[0]["author"]["email"], "a@x.com");

    let json = serde_json::to_value(dal.get_user(&author.id.to_string()).unwrap()).unwrap();
    assert_eq!(json["email"], "a@x.com");
    assert_eq!(json["_count"]["posts"], 1);
}
