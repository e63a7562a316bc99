//! Router tests for the recipe listing and its cache
//!
//! After any accepted create, update or delete the next listing must come
//! from the store, never from a value cached before the change.

#[cfg(test)]
mod tests {
    use crate::config::AuthStrategyKind;
    use crate::routes::test_support::TestApp;
    use crate::routes::CACHE_STATUS_HEADER;
    use axum::http::{Method, StatusCode};
    use rstest::rstest;
    use serde_json::json;
    use uuid::Uuid;

    #[rstest]
    #[case::signed(AuthStrategyKind::Signed)]
    #[case::session(AuthStrategyKind::Session)]
    #[tokio::test]
    async fn test_end_to_end_flow(#[case] strategy: AuthStrategyKind) {
        let app = TestApp::new(strategy);

        assert_eq!(app.signup("alice", "pw1").await.status, StatusCode::CREATED);
        let signin = app.signin("alice", "pw1").await;
        assert_eq!(signin.status, StatusCode::OK);
        assert_eq!(app.signin("alice", "wrong").await.status, StatusCode::UNAUTHORIZED);

        let anonymous = app
            .request(Method::POST, "/api/v1/recipes", Some(json!({ "name": "Soup" })), None)
            .await;
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

        // Prime the cache
        let before = app.list_recipes().await;
        assert_eq!(before.body, json!([]));
        assert_eq!(app.list_recipes().await.header(CACHE_STATUS_HEADER), Some("HIT"));

        let credential = signin.credential().unwrap();
        let created = app.create_recipe("Soup", &["dinner"], &credential).await;
        assert_eq!(created.status, StatusCode::CREATED);

        let after = app.list_recipes().await;
        assert_eq!(after.header(CACHE_STATUS_HEADER), Some("MISS"));
        assert_eq!(after.body.as_array().unwrap().len(), 1);
        assert_eq!(after.body[0]["name"], "Soup");
        assert_eq!(after.body[0]["id"], created.body["id"]);
    }

    #[tokio::test]
    async fn test_listing_hit_skips_store() {
        let app = TestApp::new(AuthStrategyKind::Signed);

        assert_eq!(app.list_recipes().await.header(CACHE_STATUS_HEADER), Some("MISS"));
        assert_eq!(app.list_recipes().await.header(CACHE_STATUS_HEADER), Some("HIT"));
        assert_eq!(app.list_recipes().await.header(CACHE_STATUS_HEADER), Some("HIT"));
        assert_eq!(app.recipes.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_refresh_listing() {
        let app = TestApp::new(AuthStrategyKind::Signed);
        let credential = app.register("alice", "pw1").await;
        let created = app.create_recipe("Soup", &[], &credential).await;
        let id = created.body["id"].as_str().unwrap().to_string();

        app.list_recipes().await;
        let updated = app
            .request(
                Method::PUT,
                &format!("/api/v1/recipes/{}", id),
                Some(json!({ "name": "Stew", "tags": ["winter"] })),
                Some(&credential),
            )
            .await;
        assert_eq!(updated.status, StatusCode::OK);
        assert_eq!(updated.body["publishedAt"], created.body["publishedAt"]);

        let listing = app.list_recipes().await;
        assert_eq!(listing.header(CACHE_STATUS_HEADER), Some("MISS"));
        assert_eq!(listing.body[0]["name"], "Stew");

        let deleted = app
            .request(Method::DELETE, &format!("/api/v1/recipes/{}", id), None, Some(&credential))
            .await;
        assert_eq!(deleted.status, StatusCode::OK);
        assert_eq!(app.list_recipes().await.body, json!([]));
    }

    #[tokio::test]
    async fn test_delete_unknown_recipe_is_benign() {
        let app = TestApp::new(AuthStrategyKind::Signed);
        let credential = app.register("alice", "pw1").await;
        app.list_recipes().await;

        let response = app
            .request(
                Method::DELETE,
                &format!("/api/v1/recipes/{}", Uuid::new_v4()),
                None,
                Some(&credential),
            )
            .await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body["error"]["code"], "NOT_FOUND");
        assert_eq!(app.cache.delete_calls(), 0);
        assert_eq!(app.list_recipes().await.header(CACHE_STATUS_HEADER), Some("HIT"));
    }

    #[tokio::test]
    async fn test_malformed_id_is_validation_error() {
        let app = TestApp::new(AuthStrategyKind::Signed);
        let credential = app.register("alice", "pw1").await;

        let response = app
            .request(Method::DELETE, "/api/v1/recipes/not-a-uuid", None, Some(&credential))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unauthenticated_mutations_do_not_touch_store() {
        let app = TestApp::new(AuthStrategyKind::Signed);
        let id = Uuid::new_v4();

        let update = app
            .request(
                Method::PUT,
                &format!("/api/v1/recipes/{}", id),
                Some(json!({ "name": "Stew" })),
                None,
            )
            .await;
        let delete = app
            .request(Method::DELETE, &format!("/api/v1/recipes/{}", id), None, None)
            .await;

        assert_eq!(update.status, StatusCode::UNAUTHORIZED);
        assert_eq!(delete.status, StatusCode::UNAUTHORIZED);
        assert_eq!(app.cache.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_invalidation_is_dependency_error() {
        let app = TestApp::new(AuthStrategyKind::Signed);
        let credential = app.register("alice", "pw1").await;
        app.cache.set_unavailable(true);

        let response = app.create_recipe("Soup", &[], &credential).await;
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body["error"]["code"], "DEPENDENCY_ERROR");

        // Reads still work from the store while the cache is down
        let listing = app.list_recipes().await;
        assert_eq!(listing.status, StatusCode::OK);
        assert_eq!(listing.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_outage_is_dependency_error() {
        let app = TestApp::new(AuthStrategyKind::Signed);
        app.recipes.set_unavailable(true);

        let response = app.list_recipes().await;
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_search_by_tag() {
        let app = TestApp::new(AuthStrategyKind::Signed);
        let credential = app.register("alice", "pw1").await;
        app.create_recipe("Soup", &["dinner"], &credential).await;
        app.create_recipe("Toast", &["breakfast"], &credential).await;

        let found = app.request(Method::GET, "/api/v1/recipes/search?tag=dinner", None, None).await;
        assert_eq!(found.status, StatusCode::OK);
        assert_eq!(found.body.as_array().unwrap().len(), 1);
        assert_eq!(found.body[0]["name"], "Soup");

        let none = app.request(Method::GET, "/api/v1/recipes/search?tag=lunch", None, None).await;
        assert_eq!(none.body, json!([]));

        let missing = app.request(Method::GET, "/api/v1/recipes/search", None, None).await;
        assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_recipe_is_rejected() {
        let app = TestApp::new(AuthStrategyKind::Signed);
        let credential = app.register("alice", "pw1").await;

        let response = app.create_recipe("", &[], &credential).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(app.cache.delete_calls(), 0);
    }
}
