//! Integration tests for the post, related-book and category repositories.
//!
//! Exercises the repository layer against a real database:
//! - Slug assignment and collision suffixing, including concurrent writers
//! - Sparse updates
//! - Atomic view counting and published-only reads
//! - Related-post ranking
//! - List filters and paging
//! - Book replacement and cascade delete

use boganto_core::pagination::resolve_page;
use boganto_core::post::PostStatus;
use boganto_core::ranking::{relevance_score, tag_terms, tags_overlap, DEFAULT_RELATED_LIMIT};
use boganto_db::models::post::{NewPost, PostChanges, PostFilter, PostKey};
use boganto_db::models::related_book::NewRelatedBook;
use boganto_db::repositories::{CategoryRepo, PostRepo, RelatedBookRepo};
use sqlx::PgPool;

// Seeded category ids.
const FICTION: i64 = 1;
const SCIENCE: i64 = 3;
const TECHNOLOGY: i64 = 4;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_post(title: &str, category_id: i64, tags: &str, status: PostStatus) -> NewPost {
    NewPost {
        title: title.to_string(),
        content: format!("<p>{title} body</p>"),
        excerpt: format!("{title} body..."),
        featured_image: None,
        featured_image_2: None,
        category_id,
        tags: tags.to_string(),
        meta_title: title.to_string(),
        meta_description: format!("{title} body..."),
        is_featured: false,
        status,
    }
}

async fn insert(pool: &PgPool, post: &NewPost, slug: &str) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    PostRepo::create(&mut conn, post, slug).await.unwrap().0
}

async fn published(pool: &PgPool, title: &str, category_id: i64, tags: &str) -> i64 {
    let slug = boganto_core::slug::generate_slug(title);
    insert(pool, &new_post(title, category_id, tags, PostStatus::Published), &slug).await
}

fn changes_from(post: &NewPost) -> PostChanges {
    PostChanges {
        title: post.title.clone(),
        content: post.content.clone(),
        category_id: post.category_id,
        is_featured: post.is_featured,
        status: post.status,
        ..Default::default()
    }
}

fn book(position: i32, title: &str) -> NewRelatedBook {
    NewRelatedBook {
        position,
        title: title.to_string(),
        author: Some("Anon".to_string()),
        purchase_link: format!("https://shop.example.com/{position}"),
        cover_image: None,
        description: None,
        price: Some("9.99".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_post_with_same_title_gets_suffixed_slug(pool: PgPool) {
    let post = new_post("Hello World", SCIENCE, "", PostStatus::Draft);
    let mut conn = pool.acquire().await.unwrap();

    let (_, first) = PostRepo::create(&mut conn, &post, "hello-world").await.unwrap();
    let (_, second) = PostRepo::create(&mut conn, &post, "hello-world").await.unwrap();

    assert_eq!(first, "hello-world");
    assert_ne!(second, first);
    assert!(second.starts_with("hello-world-"));
    assert!(PostRepo::slug_exists(&mut conn, &second).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_creates_get_distinct_slugs(pool: PgPool) {
    let post = new_post("Race", SCIENCE, "", PostStatus::Draft);

    let results = futures::future::join_all((0..4).map(|_| {
        let pool = pool.clone();
        let post = post.clone();
        async move {
            let mut conn = pool.acquire().await?;
            PostRepo::create(&mut conn, &post, "race").await
        }
    }))
    .await;

    let mut slugs: Vec<String> = results.into_iter().map(|r| r.unwrap().1).collect();
    slugs.sort();
    slugs.dedup();
    assert_eq!(slugs.len(), 4);
    assert!(slugs.contains(&"race".to_string()));
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_without_images_keeps_stored_images(pool: PgPool) {
    let mut post = new_post("Pictured", SCIENCE, "a", PostStatus::Published);
    post.featured_image = Some("/uploads/one.png".to_string());
    post.featured_image_2 = Some("/uploads/two.png".to_string());
    let id = insert(&pool, &post, "pictured").await;

    let mut changes = changes_from(&post);
    changes.title = "Pictured, revised".to_string();
    changes.featured_image_2 = Some("/uploads/three.png".to_string());

    let mut conn = pool.acquire().await.unwrap();
    let slug = PostRepo::update(&mut conn, id, &changes).await.unwrap();
    assert_eq!(slug.as_deref(), Some("pictured"));

    let row = PostRepo::fetch_and_count(&pool, &PostKey::Id(id), false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.title, "Pictured, revised");
    assert_eq!(row.featured_image.as_deref(), Some("/uploads/one.png"));
    assert_eq!(row.featured_image_2.as_deref(), Some("/uploads/three.png"));
    assert_eq!(row.tags, "a");
    assert!(row.updated_at >= row.created_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_missing_post_returns_none(pool: PgPool) {
    let post = new_post("Ghost", SCIENCE, "", PostStatus::Draft);
    let mut conn = pool.acquire().await.unwrap();
    let result = PostRepo::update(&mut conn, 999_999, &changes_from(&post)).await.unwrap();
    assert!(result.is_none());
}

// ---------------------------------------------------------------------------
// Reads and view counting
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_public_reads_only_see_published_posts(pool: PgPool) {
    let draft = new_post("Unfinished", SCIENCE, "", PostStatus::Draft);
    let id = insert(&pool, &draft, "unfinished").await;

    let public = PostRepo::fetch_and_count(&pool, &PostKey::Slug("unfinished".into()), false)
        .await
        .unwrap();
    assert!(public.is_none());

    let admin = PostRepo::fetch_and_count(&pool, &PostKey::Id(id), true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.status, "draft");
    assert_eq!(admin.category_slug.as_deref(), Some("science"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_reads_each_count_once(pool: PgPool) {
    let id = published(&pool, "Popular", SCIENCE, "").await;

    let key = PostKey::Id(id);
    let reads = futures::future::join_all(
        (0..10).map(|_| PostRepo::fetch_and_count(&pool, &key, false)),
    )
    .await;
    let mut seen: Vec<i64> = reads
        .into_iter()
        .map(|r| r.unwrap().unwrap().view_count)
        .collect();
    seen.sort();

    assert_eq!(seen, (1..=10).collect::<Vec<i64>>());
}

// ---------------------------------------------------------------------------
// Related posts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_related_posts_are_ranked_by_relevance(pool: PgPool) {
    let source_id = published(&pool, "Source", SCIENCE, "rust,web").await;
    let a = published(&pool, "Same Category", SCIENCE, "cooking").await;
    let b = published(&pool, "Shared Tag", TECHNOLOGY, "web,css").await;
    let c = published(&pool, "Both", SCIENCE, "rust").await;
    published(&pool, "Unrelated", FICTION, "poetry").await;
    insert(
        &pool,
        &new_post("Draft Sibling", SCIENCE, "rust", PostStatus::Draft),
        "draft-sibling",
    )
    .await;

    let source = PostRepo::fetch_and_count(&pool, &PostKey::Id(source_id), false)
        .await
        .unwrap()
        .unwrap();
    let related = PostRepo::related(&pool, &source, DEFAULT_RELATED_LIMIT)
        .await
        .unwrap();

    let ids: Vec<i64> = related.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![c, a, b]);

    let terms = tag_terms(&source.tags);
    for r in &related {
        let expected = relevance_score(
            r.category_id == source.category_id,
            tags_overlap(&r.tags, &terms),
        );
        assert_eq!(r.relevance_score, expected, "score for post {}", r.id);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_related_posts_break_ties_by_recency_and_respect_limit(pool: PgPool) {
    let source_id = published(&pool, "Hub", SCIENCE, "").await;
    let mut siblings = Vec::new();
    for i in 0..8 {
        siblings.push(published(&pool, &format!("Sibling {i}"), SCIENCE, "").await);
    }

    let source = PostRepo::fetch_and_count(&pool, &PostKey::Id(source_id), false)
        .await
        .unwrap()
        .unwrap();
    let related = PostRepo::related(&pool, &source, DEFAULT_RELATED_LIMIT)
        .await
        .unwrap();

    assert_eq!(related.len(), DEFAULT_RELATED_LIMIT as usize);
    let ids: Vec<i64> = related.iter().map(|r| r.id).collect();
    let newest: Vec<i64> = siblings.iter().rev().take(6).copied().collect();
    assert_eq!(ids, newest);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_and_pages(pool: PgPool) {
    published(&pool, "Quantum Basics", SCIENCE, "physics,quantum").await;
    published(&pool, "Stellar Nurseries", SCIENCE, "astronomy").await;
    published(&pool, "Gravity Waves", SCIENCE, "physics").await;
    published(&pool, "Compilers", TECHNOLOGY, "rust").await;
    insert(
        &pool,
        &new_post("Hidden Physics", SCIENCE, "physics", PostStatus::Draft),
        "hidden-physics",
    )
    .await;

    let filter = PostFilter {
        status: Some(PostStatus::Published),
        category_slug: Some("science".into()),
        ..Default::default()
    };
    assert_eq!(PostRepo::count(&pool, &filter).await.unwrap(), 3);

    let second_page = PostRepo::list(&pool, &filter, &resolve_page(Some(2), Some(2)))
        .await
        .unwrap();
    assert_eq!(second_page.len(), 1);
    assert_eq!(second_page[0].title, "Quantum Basics");

    let tagged = PostFilter {
        status: Some(PostStatus::Published),
        tag: Some("physics".into()),
        ..Default::default()
    };
    let rows = PostRepo::list(&pool, &tagged, &resolve_page(None, None)).await.unwrap();
    let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Gravity Waves", "Quantum Basics"]);

    let search = PostFilter {
        search: Some("STELLAR".into()),
        ..Default::default()
    };
    let rows = PostRepo::list(&pool, &search, &resolve_page(None, None)).await.unwrap();
    assert_eq!(rows.len(), 1);

    let everything = PostFilter::default();
    assert_eq!(PostRepo::count(&pool, &everything).await.unwrap(), 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_escapes_like_metacharacters(pool: PgPool) {
    published(&pool, "Half Off", SCIENCE, "50%_off").await;
    published(&pool, "Full Price", SCIENCE, "500-off").await;

    let filter = PostFilter {
        tag: Some("50%_".into()),
        ..Default::default()
    };
    let rows = PostRepo::list(&pool, &filter, &resolve_page(None, None)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Half Off");
}

// ---------------------------------------------------------------------------
// Related books and deletion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_replace_books_swaps_whole_set_in_order(pool: PgPool) {
    let id = published(&pool, "Reading List", FICTION, "").await;
    let mut conn = pool.acquire().await.unwrap();

    RelatedBookRepo::replace_all(&mut conn, id, &[book(0, "Old")]).await.unwrap();
    let stored = RelatedBookRepo::replace_all(&mut conn, id, &[book(2, "Third"), book(0, "First")])
        .await
        .unwrap();
    assert_eq!(stored, 2);

    let books = RelatedBookRepo::list_for_post(&pool, id).await.unwrap();
    let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Third"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_books_grouped_by_post(pool: PgPool) {
    let a = published(&pool, "Shelf A", FICTION, "").await;
    let b = published(&pool, "Shelf B", FICTION, "").await;
    let empty = published(&pool, "Shelf C", FICTION, "").await;
    let mut conn = pool.acquire().await.unwrap();
    RelatedBookRepo::replace_all(&mut conn, a, &[book(0, "A1"), book(1, "A2")]).await.unwrap();
    RelatedBookRepo::replace_all(&mut conn, b, &[book(0, "B1")]).await.unwrap();

    let grouped = RelatedBookRepo::list_for_posts(&pool, &[a, b, empty]).await.unwrap();
    assert_eq!(grouped[&a].len(), 2);
    assert_eq!(grouped[&b][0].title, "B1");
    assert!(!grouped.contains_key(&empty));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_post_cascades_to_books(pool: PgPool) {
    let id = published(&pool, "Doomed", FICTION, "").await;
    let mut conn = pool.acquire().await.unwrap();
    RelatedBookRepo::replace_all(&mut conn, id, &[book(0, "Gone")]).await.unwrap();

    assert!(PostRepo::delete(&pool, id).await.unwrap());
    assert!(!PostRepo::exists(&pool, id).await.unwrap());
    assert!(RelatedBookRepo::list_for_post(&pool, id).await.unwrap().is_empty());
    assert!(!PostRepo::delete(&pool, id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_category_counts_only_published_posts(pool: PgPool) {
    published(&pool, "One", SCIENCE, "").await;
    published(&pool, "Two", SCIENCE, "").await;
    insert(&pool, &new_post("Three", SCIENCE, "", PostStatus::Draft), "three").await;

    let categories = CategoryRepo::list_with_counts(&pool).await.unwrap();
    assert_eq!(categories.len(), 5);
    let science = categories.iter().find(|c| c.slug == "science").unwrap();
    assert_eq!(science.post_count, 2);
    let fiction = categories.iter().find(|c| c.slug == "fiction").unwrap();
    assert_eq!(fiction.post_count, 0);

    assert!(CategoryRepo::find_by_id(&pool, SCIENCE).await.unwrap().is_some());
    assert!(CategoryRepo::find_by_id(&pool, 9_999).await.unwrap().is_none());
}
