// API Integration Tests
//
// Purpose: Test all API endpoints against the bundled catalog
// Run with: cargo test --features api --test api_integration_tests

#[cfg(feature = "api")]
mod api_tests {
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
    use crop_advisor_rust::adapters::{ImageInput, ServiceError, VisionBackend, VisionDiagnosisAdapter};
    use crop_advisor_rust::{create_router, AppState, KnowledgeBase, RecommendationOrchestrator};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt; // for oneshot

    struct WarmingVision;

    #[async_trait]
    impl VisionBackend for WarmingVision {
        fn name(&self) -> &str {
            "warming-vision"
        }

        async fn analyze(&self, _image: &ImageInput) -> Result<String, ServiceError> {
            Err(ServiceError::ModelLoading {
                estimated_time: Some(Duration::from_secs(15)),
            })
        }
    }

    fn orchestrator() -> RecommendationOrchestrator {
        let kb = Arc::new(KnowledgeBase::bundled().expect("bundled catalog loads"));
        RecommendationOrchestrator::new(kb)
    }

    // Helper: Create test app (rule-based only, no network services)
    fn create_test_app() -> axum::Router {
        create_router(AppState::new(orchestrator()))
    }

    // Helper: Parse JSON response
    async fn json_response(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        serde_json::from_slice(&body).expect("Failed to parse JSON")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn jpeg_base64() -> String {
        BASE64_STANDARD.encode([0xFFu8, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
    }

    // =========================================================================
    // Section 1: Health Check
    // =========================================================================

    #[tokio::test]
    async fn test_health_check() {
        let response = create_test_app().oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = json_response(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
        assert_eq!(body["aiEnabled"], false);
    }

    // =========================================================================
    // Section 2: Catalog
    // =========================================================================

    #[tokio::test]
    async fn test_list_crops() {
        let response = create_test_app().oneshot(get("/api/crops")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_response(response).await;
        let rows = body["rows"].as_u64().unwrap();
        assert!(rows > 0);
        assert_eq!(body["data"].as_array().unwrap().len() as u64, rows);
        assert_eq!(body["data"][0]["name"], "Rice (Paddy)");
    }

    #[tokio::test]
    async fn test_list_diseases_filtered_by_crop() {
        let response = create_test_app()
            .oneshot(get("/api/diseases?crop=Banana"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_response(response).await;
        let names: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|d| d["name"].as_str())
            .collect();
        assert!(names.contains(&"Panama Wilt"));
        assert!(names.contains(&"Sigatoka Leaf Spot"));
        assert!(!names.contains(&"Blast"));
    }

    #[tokio::test]
    async fn test_disease_lookup_by_id_and_name() {
        let response = create_test_app().oneshot(get("/api/diseases/5")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_response(response).await["name"], "Panama Wilt");

        let response = create_test_app()
            .oneshot(get("/api/diseases/Quick%20Wilt"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = create_test_app().oneshot(get("/api/diseases/999")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(json_response(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_list_symptoms() {
        let response = create_test_app().oneshot(get("/api/symptoms")).await.unwrap();
        let body = json_response(response).await;
        assert!(body["data"].as_array().unwrap().contains(&json!("wilting")));
    }

    // =========================================================================
    // Section 3: Crop Recommendations
    // =========================================================================

    #[tokio::test]
    async fn test_recommendations_rule_based_without_ai() {
        let request = post_json(
            "/api/recommendations",
            json!({
                "season": "kharif",
                "budget": 60000,
                "waterAvailability": "high",
                "goal": "profit",
                "soilType": "laterite",
                "rainfall": 250
            }),
        );
        let response = create_test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_response(response).await;
        let items = body["items"].as_array().unwrap();
        assert!(!items.is_empty() && items.len() <= 3);
        assert!(items.iter().all(|i| i["source"] == "rule-based"));
        assert_eq!(body["fallbackReason"], "AI advisor not configured");
    }

    #[tokio::test]
    async fn test_recommendations_accept_budget_tier() {
        let request = post_json(
            "/api/recommendations",
            json!({"season": "rabi", "budget": "low", "water": "low", "goal": "quick_harvest"}),
        );
        let response = create_test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_recommendations_reject_wildcard_season() {
        let request = post_json(
            "/api/recommendations",
            json!({"season": "all", "budget": 50000, "water": "moderate", "goal": "yield"}),
        );
        let response = create_test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_response(response).await["error"].is_string());
    }

    // =========================================================================
    // Section 4: Symptom Diagnosis
    // =========================================================================

    #[tokio::test]
    async fn test_diagnose_symptoms() {
        let request = post_json(
            "/api/diseases/diagnose",
            json!({
                "crop": "Banana",
                "symptoms": ["wilting", "yellowing", "root_damage"],
                "season": "kharif",
                "weather": "humid"
            }),
        );
        let response = create_test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_response(response).await;
        assert_eq!(body["items"][0]["name"], "Panama Wilt");
        assert_eq!(body["items"][0]["confidence"], 100);
    }

    #[tokio::test]
    async fn test_diagnose_rejects_empty_symptoms() {
        let request = post_json(
            "/api/diseases/diagnose",
            json!({"crop": "Banana", "symptoms": [], "season": "kharif"}),
        );
        let response = create_test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // =========================================================================
    // Section 5: Image Analysis
    // =========================================================================

    #[tokio::test]
    async fn test_analyze_image_without_vision_is_bad_gateway() {
        let request = post_json(
            "/api/analyze-image",
            json!({"image": jpeg_base64(), "mimeType": "image/jpeg"}),
        );
        let response = create_test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_analyze_image_falls_back_to_symptoms() {
        let request = post_json(
            "/api/analyze-image",
            json!({
                "image": format!("data:image/jpeg;base64,{}", jpeg_base64()),
                "crop": "Banana",
                "symptoms": ["wilting"],
                "season": "kharif"
            }),
        );
        let response = create_test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_response(response).await;
        assert!(body["fallbackReason"].as_str().unwrap().starts_with("Photo diagnosis unavailable"));
        assert_eq!(body["items"][0]["source"], "rule-based");
    }

    #[tokio::test]
    async fn test_analyze_image_rejects_bad_input() {
        let bad_base64 = post_json(
            "/api/analyze-image",
            json!({"image": "not base64!!", "mimeType": "image/png"}),
        );
        let response = create_test_app().oneshot(bad_base64).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bad_type = post_json(
            "/api/analyze-image",
            json!({"image": jpeg_base64(), "mimeType": "image/gif"}),
        );
        let response = create_test_app().oneshot(bad_type).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_image_warming_up_sets_retry_after() {
        let orchestrator = orchestrator().with_vision(VisionDiagnosisAdapter::new(
            Arc::new(WarmingVision),
            Duration::from_secs(2),
        ));
        let app = create_router(AppState::new(orchestrator));

        let request = post_json(
            "/api/analyze-image",
            json!({"image": jpeg_base64(), "mimeType": "image/jpeg"}),
        );
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "15");
        assert!(json_response(response).await["error"].is_string());
    }
}
