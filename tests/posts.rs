#[macro_use]
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use common::*;
use sea_orm::{entity::*, query::*};
use yatube::orm::{comments, posts};

#[actix_rt::test]
async fn test_create_post_from_urlencoded_form() {
    let env = setup().await;
    create_user(env.db(), "auth").await;
    let group = create_group(env.db(), "test-slug").await;
    let app = init_app!(env);
    let cookie = login!(app, "auth");

    let req = test::TestRequest::post()
        .uri("/create/")
        .cookie(cookie)
        .set_form(&[
            ("text", "Тестовый текст"),
            ("group", group.id.to_string().as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/auth/");

    let all = posts::Entity::find().all(env.db()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].text, "Тестовый текст");
    assert_eq!(all[0].group_id, Some(group.id));
    assert_eq!(all[0].image, None);
}

#[actix_rt::test]
async fn test_create_post_with_image() {
    let env = setup().await;
    let author = create_user(env.db(), "auth").await;
    let group = create_group(env.db(), "test-slug").await;
    let app = init_app!(env);
    let cookie = login!(app, "auth");

    let boundary = "yatube-test-boundary";
    let group_id = group.id.to_string();
    let body = multipart_body(
        boundary,
        &[("text", "Пост с картинкой"), ("group", group_id.as_str())],
        &[("image", "small.gif", "image/gif", SMALL_GIF)],
    );
    let req = test::TestRequest::post()
        .uri("/create/")
        .cookie(cookie)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let post = posts::Entity::find()
        .filter(posts::Column::Text.eq("Пост с картинкой"))
        .one(env.db())
        .await
        .unwrap()
        .expect("post was created");
    assert_eq!(post.author_id, author.id);
    assert_eq!(post.group_id, Some(group.id));
    assert_eq!(post.image.as_deref(), Some("posts/small.gif"));

    let stored = std::fs::read(env.media.path().join("posts/small.gif")).expect("stored image");
    assert_eq!(stored, SMALL_GIF);

    // And it is served back.
    let req = test::TestRequest::get()
        .uri("/media/posts/small.gif")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_create_post_rejects_invalid_form() {
    let env = setup().await;
    create_user(env.db(), "auth").await;
    let app = init_app!(env);
    let cookie = login!(app, "auth");

    let req = test::TestRequest::post()
        .uri("/create/")
        .cookie(cookie.clone())
        .set_form(&[("text", "   "), ("group", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("This field is required."));

    let boundary = "yatube-test-boundary";
    let body = multipart_body(
        boundary,
        &[("text", "Текст")],
        &[("image", "notes.gif", "image/gif", &b"definitely not a gif"[..])],
    );
    let req = test::TestRequest::post()
        .uri("/create/")
        .cookie(cookie)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("Upload a valid image."));

    assert_eq!(posts::Entity::find().count(env.db()).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_author_edits_post() {
    let env = setup().await;
    let author = create_user(env.db(), "auth").await;
    let group = create_group(env.db(), "test-slug").await;
    let post = create_post(env.db(), &author, "Старый текст", None).await;
    let app = init_app!(env);
    let cookie = login!(app, "auth");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .cookie(cookie)
        .set_form(&[
            ("text", "Новый текст"),
            ("group", group.id.to_string().as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let edited = posts::Entity::find_by_id(post.id)
        .one(env.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edited.text, "Новый текст");
    assert_eq!(edited.group_id, Some(group.id));
    assert_eq!(edited.pub_date, post.pub_date);
    assert_eq!(edited.author_id, author.id);
    assert_eq!(posts::Entity::find().count(env.db()).await.unwrap(), 1);
}

#[actix_rt::test]
async fn test_stranger_cannot_edit_post() {
    let env = setup().await;
    let author = create_user(env.db(), "auth").await;
    create_user(env.db(), "stranger").await;
    let post = create_post(env.db(), &author, "Текст автора", None).await;
    let app = init_app!(env);
    let cookie = login!(app, "stranger");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", post.id))
        .cookie(cookie)
        .set_form(&[("text", "Чужой текст"), ("group", "")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let unchanged = posts::Entity::find_by_id(post.id)
        .one(env.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged, post);
}

#[actix_rt::test]
async fn test_authorized_user_comments() {
    let env = setup().await;
    let author = create_user(env.db(), "auth").await;
    create_user(env.db(), "reader").await;
    let post = create_post(env.db(), &author, "Текст поста", None).await;
    let app = init_app!(env);
    let cookie = login!(app, "reader");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .cookie(cookie.clone())
        .set_form(&[("text", "Тестовый коммент")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", post.id));

    let all = comments::Entity::find().all(env.db()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].text, "Тестовый коммент");
    assert_eq!(all[0].post_id, post.id);

    // Blank and missing bodies are dropped, still redirecting to the post.
    for form in [vec![("text", "   ")], vec![]] {
        let req = test::TestRequest::post()
            .uri(&format!("/posts/{}/comment/", post.id))
            .cookie(cookie.clone())
            .set_form(&form)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), format!("/posts/{}/", post.id));
    }
    assert_eq!(comments::Entity::find().count(env.db()).await.unwrap(), 1);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post.id))
        .to_request();
    let body = body_string(test::call_service(&app, req).await).await;
    assert!(body.contains("Тестовый коммент"));
}

#[actix_rt::test]
async fn test_guest_cannot_comment() {
    let env = setup().await;
    let author = create_user(env.db(), "auth").await;
    let post = create_post(env.db(), &author, "Текст поста", None).await;
    let app = init_app!(env);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .set_form(&[("text", "Коммент гостя")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(&resp),
        format!("/auth/login/?next=%2Fposts%2F{}%2Fcomment%2F", post.id)
    );
    assert_eq!(comments::Entity::find().count(env.db()).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_detail_shows_post_and_author_count() {
    let env = setup().await;
    let author = create_user(env.db(), "auth").await;
    create_post(env.db(), &author, "Первый пост", None).await;
    let post = create_post(env.db(), &author, "Второй пост", None).await;
    let app = init_app!(env);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post.id))
        .to_request();
    let body = body_string(test::call_service(&app, req).await).await;
    assert!(body.contains("Второй пост"));
    assert!(body.contains("<span class=\"post-count\">2</span>"));
}

#[actix_rt::test]
async fn test_create_post_rejects_image_with_only_a_signature() {
    let env = setup().await;
    create_user(env.db(), "auth").await;
    let app = init_app!(env);
    let cookie = login!(app, "auth");

    let boundary = "yatube-test-boundary";
    let body = multipart_body(
        boundary,
        &[("text", "Обзор")],
        &[("image", "review.gif", "image/gif", &b"BMW review: great car"[..])],
    );
    let req = test::TestRequest::post()
        .uri("/create/")
        .cookie(cookie)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("Upload a valid image."));

    assert_eq!(posts::Entity::find().count(env.db()).await.unwrap(), 0);
    assert!(!env.media.path().join("posts/review.gif").exists());
}

#[actix_rt::test]
async fn test_edit_keeps_or_replaces_image() {
    let env = setup().await;
    create_user(env.db(), "auth").await;
    let app = init_app!(env);
    let cookie = login!(app, "auth");
    let boundary = "yatube-test-boundary";

    let post_multipart = |uri: String, fields: Vec<(&'static str, &'static str)>, filename: Option<&'static str>| {
        let files: Vec<(&str, &str, &str, &[u8])> = match filename {
            Some(name) => vec![("image", name, "image/gif", SMALL_GIF)],
            None => vec![],
        };
        test::TestRequest::post()
            .uri(&uri)
            .cookie(cookie.clone())
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            ))
            .set_payload(multipart_body(boundary, &fields, &files))
            .to_request()
    };

    let req = post_multipart("/create/".to_owned(), vec![("text", "С картинкой")], Some("first.gif"));
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);
    let post = posts::Entity::find().one(env.db()).await.unwrap().expect("post");
    assert_eq!(post.image.as_deref(), Some("posts/first.gif"));

    // No file picked: the image stays.
    let edit = format!("/posts/{}/edit/", post.id);
    let req = post_multipart(edit.to_owned(), vec![("text", "Без новой картинки")], None);
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);
    let kept = posts::Entity::find_by_id(post.id).one(env.db()).await.unwrap().unwrap();
    assert_eq!(kept.text, "Без новой картинки");
    assert_eq!(kept.image.as_deref(), Some("posts/first.gif"));

    // A url-encoded edit carries no file either.
    let req = test::TestRequest::post()
        .uri(&edit)
        .cookie(cookie.clone())
        .set_form(&[("text", "Снова без картинки")])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);
    let kept = posts::Entity::find_by_id(post.id).one(env.db()).await.unwrap().unwrap();
    assert_eq!(kept.image.as_deref(), Some("posts/first.gif"));

    // A new file replaces it.
    let req = post_multipart(edit, vec![("text", "С новой картинкой")], Some("second.gif"));
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FOUND);
    let replaced = posts::Entity::find_by_id(post.id).one(env.db()).await.unwrap().unwrap();
    assert_eq!(replaced.text, "С новой картинкой");
    assert_eq!(replaced.image.as_deref(), Some("posts/second.gif"));
    assert!(env.media.path().join("posts/second.gif").exists());
}
