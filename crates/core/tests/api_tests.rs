//! Library API integration tests
use std::sync::Arc;
use std::time::Duration;

use quizsift_core::*;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).unwrap()
}

fn fast_fetch_config() -> FetchConfig {
    FetchConfig::builder()
        .timeout(5)
        .max_attempts(3)
        .initial_backoff(Duration::from_millis(10))
        .build()
}

#[test]
fn test_english_definition_lists() {
    let candidates = parse_questions(&read_fixture("english_dl.html")).unwrap();
    assert_eq!(candidates.len(), 3);

    let (result, questions) = classify(candidates, &TextFormatter::default());
    assert_eq!(result.main.len(), 2);
    assert_eq!(result.undetected.len(), 1);

    assert_eq!(questions[0].question(), "What is the capital of France?");
    assert!(result.main[0].contains("(a) Paris *"));
    assert!(result.main[0].ends_with("Ex: Paris has been the capital since 987."));
    // "tokyo" matches "Tokyo" after case folding
    assert!(result.main[1].contains("(c) Tokyo *"));
    assert!(result.undetected[0].starts_with("What is the capital of Australia?"));
}

#[test]
fn test_hindi_definition_lists() {
    let candidates = parse_questions(&read_fixture("hindi_dl.html")).unwrap();
    let (result, questions) = classify(candidates, &TextFormatter::default());

    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0].question(), "भारत की राजधानी क्या है?");
    assert_eq!(questions[0].correct(), Some(1));
    assert_eq!(questions[0].explanation(), Some("नई दिल्ली भारत की राजधानी है।"));
    assert_eq!(questions[1].correct(), Some(0));
    assert_eq!(questions[1].explanation(), None);
    assert_eq!(questions[2].bucket(), Bucket::Undetected);

    let main = result.main_document();
    assert_eq!(main.split("\n\n").count(), 2);
    assert!(main.contains("(b) नई दिल्ली *"));
}

#[test]
fn test_question_class_page() {
    let candidates = parse_questions(&read_fixture("question_class.html")).unwrap();
    let (result, questions) = classify(candidates, &TextFormatter::default());

    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0].question(), "Which gas do plants absorb from the air?");
    assert_eq!(questions[0].correct(), Some(1));
    assert_eq!(questions[1].correct(), Some(1));
    assert_eq!(result.main.len(), 2);
    assert_eq!(result.undetected.len(), 1);
}

#[test]
fn test_page_without_questions() {
    let candidates = parse_questions(&read_fixture("no_questions.html")).unwrap();
    assert!(candidates.is_empty());
}

#[test]
fn test_formatter_cap_and_json_export() {
    let candidates = parse_questions(&read_fixture("english_dl.html")).unwrap();
    let questions: Vec<ExtractedQuestion> = candidates.into_iter().map(ExtractedQuestion::from_candidate).collect();

    let capped = TextFormatter::new(TextConfig { max_options: Some(2), ..Default::default() });
    let block = capped.format(&questions[1]);
    // Two options plus the correct third one, which the cap never hides.
    assert_eq!(block.lines().count(), 1 + 3);
    assert!(block.ends_with("(c) Tokyo *"));

    let json = convert_to_json(&questions, &JsonConfig::default()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["counts"]["main"], 2);
    assert_eq!(value["main"][1]["answer"], "c");
}

#[tokio::test]
async fn test_http_fetcher_retries_then_gives_up() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(fast_fetch_config()).unwrap();
    let url = format!("{}/broken", mock_server.uri());
    let result = fetcher.fetch(&url, &CancellationToken::new()).await;

    match result {
        Err(FetchError::Exhausted { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, FetchError::Status { status: 500 }));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_http_fetcher_returns_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quiz"))
        .respond_with(ResponseTemplate::new(200).set_body_string(read_fixture("english_dl.html")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(fast_fetch_config()).unwrap();
    let url = format!("{}/quiz", mock_server.uri());
    let document = fetcher.fetch(&url, &CancellationToken::new()).await.unwrap();

    assert_eq!(document.url, url);
    assert!(document.html.contains("World Capitals Quiz"));
}

#[tokio::test]
async fn test_source_fetcher_reads_local_file() {
    let path = std::fs::canonicalize(get_fixture_path("hindi_dl.html")).unwrap();
    let url = url::Url::from_file_path(&path).unwrap();

    let fetcher = SourceFetcher::new(FetchConfig::default()).unwrap();
    let document = fetcher.fetch(url.as_str(), &CancellationToken::new()).await.unwrap();

    assert!(document.html.contains("प्रश्न 1"));
}

#[tokio::test]
async fn test_batch_with_failing_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quiz"))
        .respond_with(ResponseTemplate::new(200).set_body_string(read_fixture("english_dl.html")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/science"))
        .respond_with(ResponseTemplate::new(200).set_body_string(read_fixture("question_class.html")))
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(HttpFetcher::new(fast_fetch_config()).unwrap());
    let coordinator = BatchCoordinator::new(fetcher, CoordinatorConfig::default());

    let urls = ["/quiz", "/broken", "/science"]
        .iter()
        .map(|p| format!("{}{}", mock_server.uri(), p))
        .collect::<Vec<_>>()
        .join("\n");

    coordinator.start("alice").await.unwrap();
    coordinator.submit_urls("alice", &urls).await.unwrap();
    let job = coordinator.confirm("alice").await.unwrap();
    let report = coordinator.run(job, &NullTransport).await;

    assert_eq!(report.state, BatchState::Completed);
    assert_eq!(report.main.len(), 4);
    assert_eq!(report.undetected.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].url.ends_with("/broken"));
    assert!(report.failed[0].reason.contains("503"));

    let failures = report.failure_message().unwrap();
    assert!(failures.starts_with("Failed URLs:\n"));
    assert_eq!(report.main_caption(), "Main questions (4 total)");
}

#[tokio::test]
async fn test_batch_with_nothing_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_string(read_fixture("no_questions.html")))
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(HttpFetcher::new(fast_fetch_config()).unwrap());
    let coordinator = BatchCoordinator::new(fetcher, CoordinatorConfig::default());

    coordinator.start("bob").await.unwrap();
    coordinator.submit_urls("bob", &format!("{}/about", mock_server.uri())).await.unwrap();
    let job = coordinator.confirm("bob").await.unwrap();
    let report = coordinator.run(job, &NullTransport).await;

    assert_eq!(report.outcome(), BatchOutcome::NothingFound);
    assert_eq!(report.summary(), "No questions found on any URL.");
    assert!(report.failure_message().is_none());
}
