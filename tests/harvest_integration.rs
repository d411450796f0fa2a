//! Integration tests for the harvest pipeline against a mock E-utilities server.

mod support;
use support::socket_guard::start_mock_server_or_skip;

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use harvester_core::{
    EutilsClient, FetchError, HarvestConfig, HarvestError, HarvestOutcome, Harvester, SearchError,
    TransportError,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WEB_ENV: &str = "MCID_integration";

/// Saturday 12:00 US/Eastern.
fn saturday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 16, 0, 0).unwrap()
}

/// Short timings so retry paths finish quickly.
fn config_for(server: &MockServer) -> HarvestConfig {
    HarvestConfig::default()
        .with_base_url(server.uri())
        .with_page_size(2)
        .with_max_requests_per_second(0)
        .with_request_timeout(Duration::from_millis(300))
        .with_retry_cooldown(Duration::from_millis(20))
}

fn search_body(ids: usize) -> String {
    let idlist: Vec<String> = (1..=ids).map(|i| format!("\"{i}\"")).collect();
    format!(
        r#"{{"header": {{"type": "esearch"}}, "esearchresult": {{"count": "{ids}", "retmax": "{ids}", "querykey": "1", "webenv": "{WEB_ENV}", "idlist": [{}]}}}}"#,
        idlist.join(", ")
    )
}

fn article(pmid: &str, title: &str) -> String {
    format!(
        "<PubmedArticle><MedlineCitation><PMID Version=\"1\">{pmid}</PMID><Article>\
         <Journal><JournalIssue><PubDate><Year>2020</Year></PubDate></JournalIssue>\
         <Title>Integration Journal</Title></Journal>\
         <ArticleTitle>{title}</ArticleTitle>\
         <AuthorList><Author><LastName>Doe</LastName><ForeName>Jane</ForeName></Author></AuthorList>\
         </Article></MedlineCitation>\
         <PubmedData><ArticleIdList><ArticleId IdType=\"doi\">10.1/{pmid}</ArticleId></ArticleIdList></PubmedData>\
         </PubmedArticle>"
    )
}

fn page_body(articles: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" ?>\n<PubmedArticleSet>{}</PubmedArticleSet>",
        articles.concat()
    )
}

async fn mount_search(server: &MockServer, ids: usize) {
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("db", "pubmed"))
        .and(query_param("term", "zebrafish"))
        .and(query_param("usehistory", "y"))
        .and(query_param("retmode", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_body(ids)))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, retstart: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("WebEnv", WEB_ENV))
        .and(query_param("query_key", "1"))
        .and(query_param("retstart", retstart))
        .and(query_param("retmax", "2"))
        .and(query_param("retmode", "xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn efetch_offsets(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == "/efetch.fcgi")
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "retstart")
                .map(|(_, value)| value.into_owned())
        })
        .collect()
}

#[tokio::test]
async fn test_harvest_pages_through_stored_result_set() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_search(&server, 3).await;
    mount_page(&server, "0", page_body(&[article("1", "First"), article("2", "Second")])).await;
    mount_page(&server, "2", page_body(&[article("3", "Third")])).await;

    let config = config_for(&server);
    let client = EutilsClient::new(&config).unwrap();
    let outcome = Harvester::new(&config, &client)
        .run("zebrafish", saturday())
        .await
        .unwrap();

    let HarvestOutcome::Completed { handle, records } = outcome else {
        panic!("expected a completed harvest");
    };
    assert_eq!(handle.total_count, 3);
    assert_eq!(handle.web_env, WEB_ENV);
    let pmids: Vec<&str> = records.iter().map(|r| r.pmid.as_str()).collect();
    assert_eq!(pmids, vec!["1", "2", "3"]);
    assert_eq!(records[2].title, "Third");
    assert_eq!(records[0].authors, vec!["Jane Doe"]);
    assert_eq!(records[0].year, "2020");
    assert_eq!(records[0].journal, "Integration Journal");
    assert_eq!(records[1].doi, "10.1/2");
    assert_eq!(efetch_offsets(&server).await, vec!["0", "2"]);
}

#[tokio::test]
async fn test_harvest_zero_matches_issues_no_fetch() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_search(&server, 0).await;

    let config = config_for(&server);
    let client = EutilsClient::new(&config).unwrap();
    let outcome = Harvester::new(&config, &client)
        .run("zebrafish", saturday())
        .await
        .unwrap();

    assert!(outcome.records().is_empty());
    assert!(efetch_offsets(&server).await.is_empty());
}

#[tokio::test]
async fn test_harvest_recovers_from_timed_out_page() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_search(&server, 2).await;
    // First two attempts at offset 0 hang past the request timeout.
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("retstart", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page_body(&[]))
                .set_delay(Duration::from_secs(2)),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "0", page_body(&[article("1", "A"), article("2", "B")])).await;

    let config = config_for(&server);
    let client = EutilsClient::new(&config).unwrap();
    let outcome = Harvester::new(&config, &client)
        .run("zebrafish", saturday())
        .await
        .unwrap();

    assert_eq!(outcome.records().len(), 2);
    assert_eq!(efetch_offsets(&server).await, vec!["0", "0", "0"]);
}

#[tokio::test]
async fn test_harvest_three_timeouts_abort_the_run() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_search(&server, 6).await;
    mount_page(&server, "0", page_body(&[article("1", "A"), article("2", "B")])).await;
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("retstart", "2"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = EutilsClient::new(&config).unwrap();
    let err = Harvester::new(&config, &client)
        .run("zebrafish", saturday())
        .await
        .unwrap_err();

    let fetch = match err {
        HarvestError::Fetch(fetch) => fetch,
        other => panic!("expected a fetch error, got {other}"),
    };
    assert_eq!(fetch.offset(), 2);
    assert!(matches!(fetch, FetchError::Exhausted { attempts: 3, .. }));
    // Offset 4 is never requested.
    assert_eq!(efetch_offsets(&server).await, vec!["0", "2", "2", "2"]);
}

#[tokio::test]
async fn test_harvest_server_error_is_not_retried() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_search(&server, 4).await;
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = EutilsClient::new(&config).unwrap();
    let err = Harvester::new(&config, &client)
        .run("zebrafish", saturday())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HarvestError::Fetch(FetchError::Transport {
            offset: 0,
            source: TransportError::HttpStatus { status: 502, .. }
        })
    ));
    assert_eq!(efetch_offsets(&server).await, vec!["0"]);
}

#[tokio::test]
async fn test_harvest_search_error_field_is_reported() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"esearchresult": {"ERROR": "Invalid query syntax"}}"#,
        ))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = EutilsClient::new(&config).unwrap();
    let err = Harvester::new(&config, &client)
        .run("zebrafish", saturday())
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::Search(SearchError::Protocol { .. })));
    assert!(err.to_string().contains("Invalid query syntax"));
}

#[tokio::test]
async fn test_harvest_malformed_page_writes_no_output() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_search(&server, 3).await;
    mount_page(&server, "0", page_body(&[article("1", "A"), article("2", "B")])).await;
    mount_page(&server, "2", "<PubmedArticleSet><PubmedArticle>".to_string()).await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("upload_data").join("output.csv");

    let config = config_for(&server);
    let client = EutilsClient::new(&config).unwrap();
    let err = Harvester::new(&config, &client)
        .run_to_csv("zebrafish", saturday(), &output)
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::Parse(ref parse) if parse.offset() == 2));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_harvest_run_to_csv_writes_table() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_search(&server, 1).await;
    mount_page(&server, "0", page_body(&[article("42", "Answer, \"quoted\"")])).await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("upload_data").join("output.csv");

    let config = config_for(&server);
    let client = EutilsClient::new(&config).unwrap();
    Harvester::new(&config, &client)
        .run_to_csv("zebrafish", saturday(), &output)
        .await
        .unwrap();

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(
        header,
        vec!["PMID", "Title", "Abstract", "Authors", "Affiliation", "Year", "Keywords", "Journal", "DOI"]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "42");
    assert_eq!(&rows[0][1], "Answer, \"quoted\"");
    assert_eq!(&rows[0][3], "Jane Doe");
    assert_eq!(&rows[0][8], "10.1/42");
}

#[tokio::test]
async fn test_harvest_denied_makes_no_requests() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_search(&server, 1).await;

    let config = config_for(&server);
    let client = EutilsClient::new(&config).unwrap();
    // Wednesday 14:00 US/Eastern.
    let weekday = Utc.with_ymd_and_hms(2024, 6, 12, 18, 0, 0).unwrap();
    let outcome = Harvester::new(&config, &client)
        .run("zebrafish", weekday)
        .await
        .unwrap();

    assert!(outcome.is_denied());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
