use crate::support::*;
use axum::http::StatusCode;
use std::collections::HashSet;

#[tokio::test]
async fn scenario_second_page_holds_the_remainder() -> anyhow::Result<()> {
    with_test_app(bulk_cusco_packages(1000, 15), |app| {
        Box::pin(async move {
            let (status, first) = app
                .get_json("/api/packages/search?destination=cusco&page=1&limit=10")
                .await?;
            assert_status(status, StatusCode::OK, "page 1");
            let (status, second) = app
                .get_json("/api/packages/search?destination=cusco&page=2&limit=10")
                .await?;
            assert_status(status, StatusCode::OK, "page 2");

            let first_ids = data_ids(&first)?;
            let second_ids = data_ids(&second)?;
            assert_eq!(first_ids.len(), 10);
            assert_eq!(second_ids.len(), 5);

            let overlap: Vec<_> = second_ids
                .iter()
                .filter(|id| first_ids.contains(*id))
                .collect();
            assert!(overlap.is_empty(), "pages overlap on {overlap:?}");

            assert_eq!(meta_u64(&second, "total")?, 15);
            assert_eq!(meta_u64(&second, "totalPages")?, 2);
            assert_eq!(meta_u64(&second, "page")?, 2);
            assert_eq!(meta_u64(&second, "limit")?, 10);
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn pages_partition_the_result_set() -> anyhow::Result<()> {
    with_test_app(bulk_cusco_packages(1000, 23), |app| {
        Box::pin(async move {
            for query in ["", "&minPrice=50&maxPrice=150", "&sortBy=name&order=asc"] {
                let mut seen = HashSet::new();
                let mut visited = 0;
                for page in 1..=5 {
                    let (_, body) = app
                        .get_json(&format!("/api/packages/search?limit=7&page={page}{query}"))
                        .await?;
                    assert_eq!(meta_u64(&body, "total")?, 23, "{query}");
                    assert_eq!(meta_u64(&body, "totalPages")?, 4, "{query}");
                    for id in data_ids(&body)? {
                        assert!(seen.insert(id), "{query}: id {id} repeated on page {page}");
                        visited += 1;
                    }
                }
                assert_eq!(visited, 23, "{query}: every package visited once");
            }
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn post_filtered_totals_describe_the_paged_set() -> anyhow::Result<()> {
    let mut records = bulk_cusco_packages(1000, 12);
    records.push(
        PackageBuilder::new(2000, "Premium Cusco")
            .city(cusco())
            .pricing(PricingBuilder::new(20000, "Standard", "900.00"))
            .build(),
    );

    with_test_app(records, |app| {
        Box::pin(async move {
            let (_, body) = app
                .get_json("/api/packages/search?maxPrice=500&limit=5&page=3")
                .await?;
            assert_eq!(data_ids(&body)?.len(), 2);
            assert_eq!(meta_u64(&body, "total")?, 12);
            assert_eq!(meta_u64(&body, "totalPages")?, 3);
            assert_eq!(meta_u64(&body, "totalResults")?, 13);
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn page_past_the_end_is_empty() -> anyhow::Result<()> {
    with_test_app(bulk_cusco_packages(1000, 3), |app| {
        Box::pin(async move {
            let (status, body) = app.get_json("/api/packages/search?page=9").await?;
            assert_status(status, StatusCode::OK, "page past the end");
            assert_ids(&body, &[], "page past the end")?;
            assert_eq!(meta_u64(&body, "total")?, 3);
            assert_eq!(meta_u64(&body, "totalPages")?, 1);
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn default_limit_applies() -> anyhow::Result<()> {
    with_test_app(bulk_cusco_packages(1000, 15), |app| {
        Box::pin(async move {
            let (_, body) = app.get_json("/api/packages/search").await?;
            assert_eq!(data_ids(&body)?.len(), 10);
            assert_eq!(meta_u64(&body, "limit")?, 10);
            assert_eq!(meta_u64(&body, "page")?, 1);
            Ok(())
        })
    })
    .await
}
