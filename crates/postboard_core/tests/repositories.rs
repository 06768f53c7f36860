use postboard_core::db::open_db_in_memory;
use postboard_core::repo::{
    CommentRepository, PostRepository, SqliteCommentRepository, SqlitePostRepository,
    SqliteUserRepository, UserRepository,
};
use postboard_core::{CreatePostRequest, CreateUserRequest, RepoError};
use uuid::Uuid;

#[test]
fn create_user_round_trips_fields() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);

    let created = users
        .create_user(&CreateUserRequest::new("a@x.com").with_name("Ada"))
        .unwrap();
    let loaded = users.get_user(created.id).unwrap().unwrap();

    assert_eq!(loaded, created);
    assert_eq!(loaded.email, "a@x.com");
    assert_eq!(loaded.name.as_deref(), Some("Ada"));
    assert!(users.user_exists(created.id).unwrap());
    assert!(!users.user_exists(Uuid::new_v4()).unwrap());
}

#[test]
fn users_are_listed_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);

    let first = users.create_user(&CreateUserRequest::new("1@x.com")).unwrap();
    let second = users.create_user(&CreateUserRequest::new("2@x.com")).unwrap();
    let third = users.create_user(&CreateUserRequest::new("3@x.com")).unwrap();

    let ids: Vec<Uuid> = users.list_users().unwrap().into_iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
}

#[test]
fn recent_posts_respect_limit_and_order() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);
    let posts = SqlitePostRepository::new(&conn);

    let author = users.create_user(&CreateUserRequest::new("a@x.com")).unwrap();
    let created: Vec<Uuid> = (0..4)
        .map(|i| {
            let request = CreatePostRequest::new(format!("T{i}"), author.id.to_string());
            posts.create_post(author.id, &request).map(|post| post.id)
        })
        .collect::<Result<_, _>>()
        .unwrap();

    let recent: Vec<Uuid> = posts
        .list_recent_posts(3)
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(recent, vec![created[3], created[2], created[1]]);
    assert!(posts.list_recent_posts(0).unwrap().is_empty());
}

#[test]
fn comment_counts_and_author_window() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);
    let posts = SqlitePostRepository::new(&conn);
    let comments = SqliteCommentRepository::new(&conn);

    let author = users.create_user(&CreateUserRequest::new("a@x.com")).unwrap();
    let request = CreatePostRequest::new("T", author.id.to_string());
    let post = posts.create_post(author.id, &request).unwrap();
    for i in 0..12 {
        comments
            .create_comment(post.id, author.id, &format!("c{i}"))
            .unwrap();
    }

    assert_eq!(comments.list_comments_for_post(post.id).unwrap().len(), 12);
    let counts = users.user_counts(author.id).unwrap();
    assert_eq!((counts.posts, counts.comments), (1, 12));

    let recent = comments
        .list_recent_comments_by_author(author.id, 10)
        .unwrap();
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0].content, "c11");
    assert_eq!(recent[9].content, "c2");

    let thread = comments.list_comments_for_post(post.id).unwrap();
    assert_eq!(thread.len(), 12);
    assert_eq!(thread.last().unwrap().content, "c0");
}

#[test]
fn post_read_back_preserves_optional_fields() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);
    let posts = SqlitePostRepository::new(&conn);

    let author = users.create_user(&CreateUserRequest::new("a@x.com")).unwrap();
    let post = posts
        .create_post(
            author.id,
            &CreatePostRequest::new("T", author.id.to_string())
                .with_content("body")
                .published(true),
        )
        .unwrap();

    let loaded = posts.get_post(post.id).unwrap().unwrap();
    assert_eq!(loaded.content.as_deref(), Some("body"));
    assert!(loaded.published);
    assert_eq!(loaded.author_id, author.id);
    assert!(posts.post_exists(post.id).unwrap());
}

#[test]
fn duplicate_email_maps_to_conflict_message() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);

    users.create_user(&CreateUserRequest::new("a@x.com")).unwrap();
    let err = users
        .create_user(&CreateUserRequest::new("a@x.com"))
        .unwrap_err();
    match err {
        RepoError::Conflict(message) => {
            assert_eq!(message, "user with this email already exists")
        }
        other => panic!("unexpected error: {other}"),
    }
}
