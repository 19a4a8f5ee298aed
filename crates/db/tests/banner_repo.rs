//! Integration tests for the hero banner repository.

use boganto_core::post::PostStatus;
use boganto_db::models::banner::{BannerChanges, NewBanner};
use boganto_db::models::post::NewPost;
use boganto_db::repositories::{BannerRepo, PostRepo};
use sqlx::PgPool;

fn new_banner(title: &str, sort_order: i32, is_active: bool) -> NewBanner {
    NewBanner {
        title: title.to_string(),
        subtitle: None,
        image_url: format!("/uploads/banners/{sort_order}.png"),
        post_id: None,
        link_url: None,
        sort_order,
        is_active,
    }
}

async fn create(pool: &PgPool, banner: &NewBanner) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    BannerRepo::create(&mut conn, banner).await.unwrap().id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_banner_carries_linked_post(pool: PgPool) {
    let post = NewPost {
        title: "Linked".into(),
        content: "body".into(),
        excerpt: "body...".into(),
        featured_image: None,
        featured_image_2: None,
        category_id: 1,
        tags: String::new(),
        meta_title: "Linked".into(),
        meta_description: "body...".into(),
        is_featured: true,
        status: PostStatus::Published,
    };
    let mut conn = pool.acquire().await.unwrap();
    let (post_id, slug) = PostRepo::create(&mut conn, &post, "linked").await.unwrap();

    let mut banner = new_banner("Featured", 0, true);
    banner.post_id = Some(post_id);
    let row = BannerRepo::create(&mut conn, &banner).await.unwrap();

    assert_eq!(row.post_title.as_deref(), Some("Linked"));
    assert_eq!(row.post_slug.as_deref(), Some(slug.as_str()));

    PostRepo::delete(&pool, post_id).await.unwrap();
    let orphan = BannerRepo::find_by_id(&pool, row.id).await.unwrap().unwrap();
    assert_eq!(orphan.post_id, None);
    assert_eq!(orphan.post_title, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_orders_by_sort_order_and_filters_inactive(pool: PgPool) {
    let third = create(&pool, &new_banner("Third", 3, true)).await;
    let first = create(&pool, &new_banner("First", 1, true)).await;
    let hidden = create(&pool, &new_banner("Hidden", 2, false)).await;

    let active: Vec<i64> = BannerRepo::list(&pool, true)
        .await
        .unwrap()
        .iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(active, vec![first, third]);

    let all: Vec<i64> = BannerRepo::list(&pool, false)
        .await
        .unwrap()
        .iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(all, vec![first, hidden, third]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_count_active_excluding(pool: PgPool) {
    let a = create(&pool, &new_banner("A", 0, true)).await;
    create(&pool, &new_banner("B", 1, true)).await;
    create(&pool, &new_banner("C", 2, false)).await;

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(BannerRepo::count_active_excluding(&mut conn, None).await.unwrap(), 2);
    assert_eq!(BannerRepo::count_active_excluding(&mut conn, Some(a)).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_keeps_image_when_not_replaced(pool: PgPool) {
    let id = create(&pool, &new_banner("Before", 0, true)).await;

    let changes = BannerChanges {
        title: "After".into(),
        subtitle: Some("Now with a subtitle".into()),
        image_url: None,
        post_id: None,
        link_url: Some("https://example.com".into()),
        sort_order: 5,
        is_active: false,
    };
    let mut conn = pool.acquire().await.unwrap();
    let row = BannerRepo::update(&mut conn, id, &changes).await.unwrap().unwrap();

    assert_eq!(row.title, "After");
    assert_eq!(row.image_url, "/uploads/banners/0.png");
    assert!(!row.is_active);
    assert!(BannerRepo::update(&mut conn, 424_242, &changes).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_banner(pool: PgPool) {
    let id = create(&pool, &new_banner("Temp", 0, true)).await;
    assert!(BannerRepo::delete(&pool, id).await.unwrap());
    assert!(!BannerRepo::delete(&pool, id).await.unwrap());
    assert!(BannerRepo::find_by_id(&pool, id).await.unwrap().is_none());
}
