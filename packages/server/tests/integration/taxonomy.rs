use serde_json::json;

use crate::common::TestApp;
use crate::common::routes::{APPLICATIONS, CATEGORIES, COMPANIES, FEATURES};

#[tokio::test]
async fn terms_are_listed_by_name() {
    let app = TestApp::spawn().await;
    let token = app.editor_token();

    for route in [CATEGORIES, FEATURES, APPLICATIONS] {
        let zinc = app.create_term(&token, route, "Zinc").await;
        let alloy = app.create_term(&token, route, "Alloy").await;
        let mid = app.create_term(&token, route, "Mid").await;

        let res = app.get(route).await;
        assert_eq!(res.status, 200, "{route}: {}", res.text);
        assert_eq!(res.ids(), vec![alloy, mid, zinc], "{route}");
    }
}

#[tokio::test]
async fn create_derives_and_normalizes_slugs() {
    let app = TestApp::spawn().await;
    let token = app.editor_token();

    let res = app
        .post_with_token(CATEGORIES, &json!({ "name": "  Food Contact Plastics " }), &token)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["name"], "Food Contact Plastics");
    assert_eq!(res.body["slug"], "food-contact-plastics");

    let res = app
        .post_with_token(
            FEATURES,
            &json!({ "name": "Food Grade", "slug": "FDA Approved", "description": "  " }),
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["slug"], "fda-approved");
    assert!(res.body["description"].is_null());
}

#[tokio::test]
async fn companies_keep_their_profile() {
    let app = TestApp::spawn().await;
    let token = app.editor_token();

    let res = app
        .post_with_token(
            COMPANIES,
            &json!({
                "name": "Acme Corp",
                "website": "https://acme.example",
                "description": "Adhesives since 1950",
            }),
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["slug"], "acme-corp");

    let res = app.get(COMPANIES).await;
    assert_eq!(res.body[0]["website"], "https://acme.example");
    assert_eq!(res.body[0]["description"], "Adhesives since 1950");
}

#[tokio::test]
async fn duplicate_slug_is_a_field_error() {
    let app = TestApp::spawn().await;
    let token = app.editor_token();
    app.create_term(&token, APPLICATIONS, "Packaging").await;

    let res = app
        .post_with_token(APPLICATIONS, &json!({ "name": "packaging" }), &token)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert_eq!(res.body["field"], "slug");
}

#[tokio::test]
async fn blank_name_or_slug_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.editor_token();

    let res = app
        .post_with_token(COMPANIES, &json!({ "name": "   " }), &token)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["field"], "name");

    let res = app
        .post_with_token(CATEGORIES, &json!({ "name": "???" }), &token)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["field"], "slug");

    let res = app.post_with_token(CATEGORIES, &json!({}), &token).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn creation_requires_an_editor() {
    let app = TestApp::spawn().await;

    let res = app.post_json(COMPANIES, &json!({ "name": "Acme" })).await;
    assert_eq!(res.status, 401);

    let viewer = app.token("viewer");
    let res = app
        .post_with_token(FEATURES, &json!({ "name": "Food Grade" }), &viewer)
        .await;
    assert_eq!(res.status, 403);

    let res = app.get(FEATURES).await;
    assert_eq!(res.body, json!([]));
}
