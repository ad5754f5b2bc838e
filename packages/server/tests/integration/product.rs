use serde_json::json;

use crate::common::routes::{self, APPLICATIONS, CATEGORIES, FEATURES};
use crate::common::{TestApp, TestFile, product_fields};

fn term_ids(terms: &serde_json::Value) -> Vec<i32> {
    terms
        .as_array()
        .expect("terms should be an array")
        .iter()
        .map(|term| term["id"].as_i64().unwrap() as i32)
        .collect()
}

mod read {
    use super::*;

    #[tokio::test]
    async fn get_by_id_and_slug_compose_the_same_view() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme Corp").await;
        let pp = app.create_term(&token, CATEGORIES, "Polypropylene").await;
        let food = app.create_term(&token, FEATURES, "Food Grade").await;
        let id = app
            .create_product(&token, company, "Wonder Glue", &[pp], &[food], &[])
            .await;

        let by_id = app.get(&routes::product(id)).await;
        assert_eq!(by_id.status, 200, "{}", by_id.text);
        assert_eq!(by_id.body["name"], "Wonder Glue");
        assert_eq!(by_id.body["company"]["name"], "Acme Corp");
        assert_eq!(by_id.body["categories"][0]["id"], pp);
        assert_eq!(by_id.body["features"][0]["name"], "Food Grade");
        assert_eq!(by_id.body["applications"], json!([]));
        assert_eq!(by_id.body["images"], json!([]));
        assert_eq!(by_id.body["documents"], json!([]));

        let slug = by_id.body["slug"].as_str().unwrap().to_string();
        let by_slug = app.get(&routes::product(&slug)).await;
        assert_eq!(by_slug.status, 200);
        assert_eq!(by_slug.body["id"], id);
    }

    #[tokio::test]
    async fn unknown_identifier_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::product(9999)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");

        let res = app.get(&routes::product("no-such-product")).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn list_is_newest_first_with_category_terms() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;
        let pp = app.create_term(&token, CATEGORIES, "PP").await;
        let first = app.create_product(&token, company, "First", &[pp], &[], &[]).await;
        let second = app.create_product(&token, company, "Second", &[], &[], &[]).await;

        let res = app.get(routes::PRODUCTS).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.ids(), vec![second, first]);
        assert_eq!(res.body[1]["categories"][0]["name"], "PP");
        assert!(res.body[0].get("images").is_none());
    }

    #[tokio::test]
    async fn list_narrows_by_facet_and_search() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;
        let other = app.create_company(&token, "Other").await;
        let food = app.create_term(&token, FEATURES, "Food Grade").await;
        let glue = app.create_product(&token, company, "Wonder Glue", &[], &[food], &[]).await;
        let tape = app.create_product(&token, company, "Tape", &[], &[], &[]).await;
        let foreign = app.create_product(&token, other, "Glue Stick", &[], &[food], &[]).await;

        let res = app.get(&format!("{}?featureId={food}", routes::PRODUCTS)).await;
        assert_eq!(res.ids(), vec![foreign, glue]);

        let res = app
            .get(&format!("{}?featureId={food}&companyId={company}", routes::PRODUCTS))
            .await;
        assert_eq!(res.ids(), vec![glue]);

        let res = app.get(&format!("{}?search=GLUE", routes::PRODUCTS)).await;
        assert_eq!(res.ids(), vec![foreign, glue]);

        let res = app.get(&format!("{}?search=tap", routes::PRODUCTS)).await;
        assert_eq!(res.ids(), vec![tape]);
    }

    #[tokio::test]
    async fn list_intersects_all_three_facets() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;
        let pp = app.create_term(&token, CATEGORIES, "PP").await;
        let pvc = app.create_term(&token, CATEGORIES, "PVC").await;
        let food = app.create_term(&token, FEATURES, "Food Grade").await;
        let packaging = app.create_term(&token, APPLICATIONS, "Packaging").await;
        let medical = app.create_term(&token, APPLICATIONS, "Medical").await;

        let all_three = app
            .create_product(&token, company, "Tray", &[pp], &[food], &[packaging])
            .await;
        let wrong_application = app
            .create_product(&token, company, "Tube", &[pp], &[food], &[medical])
            .await;
        let no_feature = app
            .create_product(&token, company, "Lid", &[pp], &[], &[packaging])
            .await;
        let wrong_category = app
            .create_product(&token, company, "Pipe", &[pvc], &[food], &[packaging])
            .await;

        let res = app
            .get(&format!("{}?applicationId={packaging}", routes::PRODUCTS))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.ids(), vec![wrong_category, no_feature, all_three]);
        assert_eq!(res.body[0]["applicationIds"], json!([packaging]));

        let res = app.get(&format!("{}?categoryId={pp}", routes::PRODUCTS)).await;
        assert_eq!(res.ids(), vec![no_feature, wrong_application, all_three]);

        let res = app
            .get(&format!(
                "{}?categoryId={pp}&featureId={food}&applicationId={packaging}",
                routes::PRODUCTS
            ))
            .await;
        assert_eq!(res.ids(), vec![all_three]);

        let res = app
            .get(&format!(
                "{}?categoryId={pvc}&applicationId={medical}",
                routes::PRODUCTS
            ))
            .await;
        assert!(res.ids().is_empty());
    }

    #[tokio::test]
    async fn inactive_products_are_hidden_unless_requested() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;
        let mut fields = product_fields(company, "Retired", &[], &[], &[]);
        fields.push(("isActive", "false".into()));
        let res = app
            .post_multipart(routes::PRODUCTS, &fields, vec![], Some(&token))
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let retired = res.id();

        let res = app.get(routes::PRODUCTS).await;
        assert!(res.ids().is_empty());

        let res = app
            .get(&format!("{}?includeInactive=true", routes::PRODUCTS))
            .await;
        assert_eq!(res.ids(), vec![retired]);

        // Direct lookups still resolve inactive products.
        let res = app.get(&routes::product(retired)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["isActive"], false);
    }

    #[tokio::test]
    async fn malformed_query_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app.get(&format!("{}?categoryId=abc", routes::PRODUCTS)).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod write {
    use super::*;

    #[tokio::test]
    async fn slug_is_derived_from_company_and_name() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme Corp").await;

        let res = app
            .post_multipart(
                routes::PRODUCTS,
                &product_fields(company, "Wonder Glue 2000", &[], &[], &[]),
                vec![],
                Some(&token),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["slug"], "acme-corp-wonder-glue-2000");
    }

    #[tokio::test]
    async fn explicit_slug_is_normalized() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;
        let mut fields = product_fields(company, "Glue", &[], &[], &[]);
        fields.push(("slug", "  Super Glue! ".into()));

        let res = app
            .post_multipart(routes::PRODUCTS, &fields, vec![], Some(&token))
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["slug"], "super-glue");
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected_on_the_slug_field() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;
        app.create_product(&token, company, "Glue", &[], &[], &[]).await;

        let res = app
            .post_multipart(
                routes::PRODUCTS,
                &product_fields(company, "Glue", &[], &[], &[]),
                vec![],
                Some(&token),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["field"], "slug");
    }

    #[tokio::test]
    async fn missing_name_and_unknown_company_name_the_field() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;

        let res = app
            .post_multipart(
                routes::PRODUCTS,
                &[("companyId", company.to_string())],
                vec![],
                Some(&token),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "name");

        let res = app
            .post_multipart(
                routes::PRODUCTS,
                &product_fields(company + 100, "Glue", &[], &[], &[]),
                vec![],
                Some(&token),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "companyId");
    }

    #[tokio::test]
    async fn malformed_or_unknown_facet_ids_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;

        let mut fields = product_fields(company, "Glue", &[], &[], &[]);
        fields[2] = ("categoryIds", "[1, \"x\"]".into());
        let res = app
            .post_multipart(routes::PRODUCTS, &fields, vec![], Some(&token))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "categoryIds");

        let res = app
            .post_multipart(
                routes::PRODUCTS,
                &product_fields(company, "Glue", &[424242], &[], &[]),
                vec![],
                Some(&token),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "categoryIds");

        // Nothing was written by the failed attempts.
        let res = app.get(routes::PRODUCTS).await;
        assert!(res.ids().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_associations_wholesale() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;
        let pp = app.create_term(&token, CATEGORIES, "PP").await;
        let pvc = app.create_term(&token, CATEGORIES, "PVC").await;
        let food = app.create_term(&token, FEATURES, "Food Grade").await;
        let id = app
            .create_product(&token, company, "Glue", &[pp], &[food], &[])
            .await;

        let res = app
            .put_multipart(
                &routes::product(id),
                &product_fields(company, "Glue v2", &[pvc, pvc], &[], &[]),
                vec![],
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let view = app.get(&routes::product(id)).await;
        assert_eq!(view.body["name"], "Glue v2");
        let categories: Vec<i64> = view.body["categories"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_i64().unwrap())
            .collect();
        assert_eq!(categories, vec![pvc as i64]);
        assert_eq!(view.body["features"], json!([]));
    }

    #[tokio::test]
    async fn update_overwrites_every_taxonomy() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;
        let first = app.create_term(&token, CATEGORIES, "Alpha").await;
        let second = app.create_term(&token, CATEGORIES, "Beta").await;
        let food = app.create_term(&token, FEATURES, "Food Grade").await;
        let packaging = app.create_term(&token, APPLICATIONS, "Packaging").await;
        let medical = app.create_term(&token, APPLICATIONS, "Medical").await;
        let id = app
            .create_product(&token, company, "Tray", &[first], &[food], &[packaging])
            .await;

        let view = app.get(&routes::product(id)).await;
        assert_eq!(term_ids(&view.body["applications"]), vec![packaging]);
        assert_eq!(view.body["applications"][0]["name"], "Packaging");

        let res = app
            .put_multipart(
                &routes::product(id),
                &product_fields(company, "Tray", &[first, second], &[], &[medical]),
                vec![],
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let view = app.get(&routes::product(id)).await;
        assert_eq!(term_ids(&view.body["categories"]), vec![first, second]);
        assert_eq!(term_ids(&view.body["features"]), Vec::<i32>::new());
        assert_eq!(term_ids(&view.body["applications"]), vec![medical]);

        let res = app
            .get(&format!("{}?applicationId={packaging}", routes::PRODUCTS))
            .await;
        assert!(res.ids().is_empty());
    }

    #[tokio::test]
    async fn rejected_update_leaves_product_untouched() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;
        let pp = app.create_term(&token, CATEGORIES, "PP").await;
        let packaging = app.create_term(&token, APPLICATIONS, "Packaging").await;
        let id = app
            .create_product(&token, company, "Tray", &[pp], &[], &[packaging])
            .await;

        let res = app
            .put_multipart(
                &routes::product(id),
                &product_fields(company, "Renamed", &[], &[], &[packaging, 424242]),
                vec![],
                &token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "applicationIds");

        let view = app.get(&routes::product(id)).await;
        assert_eq!(view.body["name"], "Tray");
        assert_eq!(term_ids(&view.body["categories"]), vec![pp]);
        assert_eq!(term_ids(&view.body["applications"]), vec![packaging]);
    }

    #[tokio::test]
    async fn update_of_missing_product_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;

        let res = app
            .put_multipart(
                &routes::product(9999),
                &product_fields(company, "Ghost", &[], &[], &[]),
                vec![],
                &token,
            )
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn hero_image_is_stored_and_served() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;

        let res = app
            .post_multipart(
                routes::PRODUCTS,
                &product_fields(company, "Glue", &[], &[], &[]),
                vec![TestFile::png("heroImage", "hero.png")],
                Some(&token),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let view = app.get(&routes::product(res.id())).await;
        let hero = view.body["heroImage"].as_str().unwrap().to_string();
        assert!(hero.starts_with("/uploads/products/"), "{hero}");
        assert!(app.stored_file(&hero).exists());

        let served = app.get(&hero).await;
        assert_eq!(served.status, 200);
    }

    #[tokio::test]
    async fn delete_cascades_children_and_files() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;
        let pp = app.create_term(&token, CATEGORIES, "PP").await;
        let id = app.create_product(&token, company, "Glue", &[pp], &[], &[]).await;

        let res = app
            .post_multipart(
                &routes::product_images(id),
                &[],
                vec![TestFile::png("images", "a.png")],
                Some(&token),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let image_url = res.body[0]["imageUrl"].as_str().unwrap().to_string();

        let res = app
            .post_multipart(
                &routes::product_documents(id),
                &[],
                vec![TestFile::pdf("documents", "spec.pdf")],
                Some(&token),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app.delete_with_token(&routes::product(id), &token).await;
        assert_eq!(res.status, 204);

        let res = app.get(&routes::product(id)).await;
        assert_eq!(res.status, 404);
        assert!(!app.stored_file(&image_url).exists());

        // The category survives; only the association went away.
        let res = app.get(CATEGORIES).await;
        assert_eq!(res.ids(), vec![pp]);

        let res = app.delete_with_token(&routes::product(id), &token).await;
        assert_eq!(res.status, 404);
    }
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn writes_require_a_token() {
        let app = TestApp::spawn().await;

        let res = app
            .post_multipart(
                routes::PRODUCTS,
                &product_fields(1, "Glue", &[], &[], &[]),
                vec![],
                None,
            )
            .await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");

        let res = app
            .post_multipart(
                routes::PRODUCTS,
                &product_fields(1, "Glue", &[], &[], &[]),
                vec![],
                Some("not-a-jwt"),
            )
            .await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn viewers_cannot_write() {
        let app = TestApp::spawn().await;
        let token = app.editor_token();
        let company = app.create_company(&token, "Acme").await;
        let id = app.create_product(&token, company, "Glue", &[], &[], &[]).await;
        let viewer = app.token("viewer");

        let res = app
            .post_multipart(
                routes::PRODUCTS,
                &product_fields(company, "Other", &[], &[], &[]),
                vec![],
                Some(&viewer),
            )
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let res = app.delete_with_token(&routes::product(id), &viewer).await;
        assert_eq!(res.status, 403);

        let res = app.get(&routes::product(id)).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn admins_can_write() {
        let app = TestApp::spawn().await;
        let admin = app.token("admin");
        let company = app.create_company(&admin, "Acme").await;

        let id = app.create_product(&admin, company, "Glue", &[], &[], &[]).await;
        let res = app.delete_with_token(&routes::product(id), &admin).await;
        assert_eq!(res.status, 204);
    }
}
