use crate::support::constants::*;
use crate::support::*;
use axum::http::StatusCode;

#[tokio::test]
async fn malformed_and_inverted_criteria_are_rejected() -> anyhow::Result<()> {
    with_test_app(cusco_catalog(), |app| {
        Box::pin(async move {
            for query in [
                "minPrice=500&maxPrice=400",
                "minPrice=-1",
                "minPrice=cheap",
                "startDate=2026-08-01&endDate=2026-07-01",
                "startDate=next-week",
                "minAge=30&maxAge=10",
                "minParticipants=8&maxParticipants=2",
                "travelers=0",
                "travelers=many",
                "minRating=6",
                "type=cruise",
                "difficulty=extreme",
                "hasHotelPickup=maybe",
                "cityId=cusco",
                "page=0",
                "limit=0",
                "limit=101",
                "sortBy=popularity",
                "order=sideways",
            ] {
                let (status, body) = app
                    .get_json(&format!("/api/packages/search?{query}"))
                    .await?;
                assert_invalid_input(status, &body, query)?;
                assert!(
                    body["error"]["message"].as_str().is_some_and(|m| !m.is_empty()),
                    "{query}: message present"
                );
            }
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn unknown_parameters_are_ignored() -> anyhow::Result<()> {
    with_test_app(cusco_catalog(), |app| {
        Box::pin(async move {
            let (status, body) = app
                .get_json("/api/packages/search?utm_source=newsletter&cityId=200")
                .await?;
            assert_status(status, StatusCode::OK, "unknown parameter");
            assert_ids(&body, &[LIMA_FOOD], "unknown parameter")?;
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn by_city_rejects_non_numeric_id() -> anyhow::Result<()> {
    with_test_app(cusco_catalog(), |app| {
        Box::pin(async move {
            let (status, body) = app.get_json("/api/packages/by-city/cusco").await?;
            assert_invalid_input(status, &body, "by-city/cusco")?;
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn store_outage_is_reported_as_unavailable() -> anyhow::Result<()> {
    with_test_app(cusco_catalog(), |app| {
        Box::pin(async move {
            app.store.set_unavailable(true);

            for path in [
                "/api/packages/search?destination=cusco".to_string(),
                "/api/packages/search?minPrice=10".to_string(),
                format!("/api/packages/by-city/{CUSCO_CITY_ID}"),
                "/api/packages/nearby?lat=-13.5&lng=-71.9".to_string(),
            ] {
                let (status, body) = app.get_json(&path).await?;
                assert_status(status, StatusCode::SERVICE_UNAVAILABLE, &path);
                assert_eq!(error_code(&body)?, "store_unavailable", "{path}");
            }

            app.store.set_unavailable(false);
            let (status, _) = app.get_json("/api/packages/search").await?;
            assert_status(status, StatusCode::OK, "store recovered");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn validation_runs_before_the_store() -> anyhow::Result<()> {
    with_test_app(cusco_catalog(), |app| {
        Box::pin(async move {
            app.store.set_unavailable(true);
            let (status, body) = app.get_json("/api/packages/search?limit=0").await?;
            assert_invalid_input(status, &body, "invalid input with store down")?;
            Ok(())
        })
    })
    .await
}
