use httpmock::prelude::*;
use portfolio_metrics::domain::model::MetricsReport;
use portfolio_metrics::{EtlEngine, EtlError, FetchPipeline, LocalStorage, Settings};
use serde_json::json;
use tempfile::TempDir;

fn settings(server: &MockServer) -> Settings {
    Settings {
        api_base: server.base_url(),
        author_id: "A5042578790".to_string(),
        mailto: Some("me@example.org".to_string()),
        request_delay_ms: 0,
        ..Settings::default()
    }
}

#[tokio::test]
async fn test_fetch_follows_cursor_and_writes_metrics() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let first_page = server.mock(|when, then| {
        when.method(GET)
            .path("/works")
            .query_param("filter", "authorships.author.id:A5042578790")
            .query_param("cursor", "*")
            .query_param("mailto", "me@example.org");
        then.status(200).json_body(json!({
            "meta": {"count": 3, "next_cursor": "page2"},
            "results": [
                {"id": "https://openalex.org/W1", "title": "Graph Kernels", "publication_year": 2021,
                 "cited_by_count": 12, "doi": "https://doi.org/10.5555/gk",
                 "primary_location": {"source": {"display_name": "JMLR", "type": "journal"}},
                 "open_access": {"is_oa": true, "oa_status": "gold"}},
                {"id": "https://openalex.org/W2", "title": "Graph kernels", "publication_year": 2021,
                 "cited_by_count": 1, "doi": "https://doi.org/10.5555/GK",
                 "primary_location": {"source": {"display_name": "arXiv", "type": "repository"}}}
            ]
        }));
    });

    let second_page = server.mock(|when, then| {
        when.method(GET).path("/works").query_param("cursor", "page2");
        then.status(200).json_body(json!({
            "meta": {"count": 3, "next_cursor": null},
            "results": [
                {"id": "https://openalex.org/W3", "title": "Sparse Coding", "publication_year": 2023,
                 "cited_by_count": 5}
            ]
        }));
    });

    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = FetchPipeline::new(storage, settings(&server)).unwrap();
    let output = EtlEngine::new(pipeline).run().await.unwrap();

    first_page.assert();
    second_page.assert();
    assert_eq!(output, "data/metrics.json");

    let bytes = std::fs::read(temp_dir.path().join("data/metrics.json")).unwrap();
    let report: MetricsReport = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(report.papers_tracked, Some(2));
    assert_eq!(report.total_citations, Some(17));
    assert_eq!(report.author_openalex_id.as_deref(), Some("A5042578790"));

    let titles: Vec<_> = report.works.iter().map(|w| w.title.as_str()).collect();
    assert_eq!(titles, vec!["Sparse Coding", "Graph Kernels"]);
    assert_eq!(report.works[1].venue, "JMLR");
    assert_eq!(report.works[1].oa_status, "gold");
}

#[tokio::test]
async fn test_fetch_surfaces_http_errors() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/works");
        then.status(503).body("upstream unavailable");
    });

    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = FetchPipeline::new(storage, settings(&server)).unwrap();
    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, EtlError::HttpStatusError { status: 503, .. }));
    assert!(!temp_dir.path().join("data/metrics.json").exists());
}
