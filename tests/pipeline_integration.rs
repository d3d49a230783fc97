//! End-to-end runs of the niche pipeline against a mocked seller portal.

use async_trait::async_trait;
use niche_finder::config::Config;
use niche_finder::filters::FilterThresholds;
use niche_finder::pacing::{Pacing, Sleeper};
use niche_finder::search::{BatchDriver, NicheFinder, RunLog, RunOutcome, SearchCriteria};
use niche_finder::seller::{AuthContext, Endpoint, HttpTransport, RetryPolicy, SellerCentralClient};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Records waits without sleeping.
#[derive(Default)]
struct InstantSleeper {
    waits: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

fn niche(id: &str, title: &str, volume: f64, growth: f64, units: f64, price: f64) -> Value {
    json!({
        "nicheId": id,
        "nicheTitle": title,
        "nicheSummary": {
            "searchVolumeT360": volume,
            "searchVolumeGrowthT180": growth,
            "maximumAverageUnitsSoldT360": units,
            "avgPriceT360": price
        }
    })
}

fn detail(reviews: Value) -> Value {
    json!({
        "data": {
            "niche": {
                "launchPotential": {
                    "avgReviewCount": { "currentValue": reviews },
                    "newProductsLaunchedT360": { "currentValue": 12 },
                    "successfulLaunchesT360": { "currentValue": "3" }
                }
            }
        }
    })
}

async fn mount_niches(server: &MockServer, route: &str, keyword: &str, niches: Vec<Value>) {
    Mock::given(method("POST"))
        .and(path(route))
        .and(body_partial_json(json!({
            "operationName": "getNiches",
            "variables": { "filter": { "searchTermsFilter": { "searchInput": keyword } } }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "niches": niches } })),
        )
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, route: &str, niche_id: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path(route))
        .and(body_partial_json(json!({
            "operationName": "getNicheWithPurchaseDrivers",
            "variables": { "nicheInput": { "nicheId": niche_id } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn make_finder(endpoint: Endpoint, sleeper: Arc<InstantSleeper>) -> NicheFinder<HttpTransport> {
    let config = Config { request_timeout_secs: 5, ..Config::default() };
    let transport = HttpTransport::with_endpoint(&config, endpoint).unwrap();
    let client = SellerCentralClient::new(transport, sleeper.clone(), RetryPolicy::default());
    NicheFinder::new(client, sleeper, Pacing::disabled())
}

fn make_template() -> SearchCriteria {
    SearchCriteria::template(
        "A13V1IB3VIYZZH",
        AuthContext::new("csrf-token", "session-id=123", "FR"),
        FilterThresholds::default(),
    )
}

#[tokio::test]
async fn test_direct_mode_bento_box() {
    let server = MockServer::start().await;
    let route = "/ox-api/graphql";

    mount_niches(
        &server,
        route,
        "bento box",
        vec![
            niche("N1", "Bento Box Set", 500000.0, 0.1, 2000.0, 25.0),
            niche("N2", "Mini Bento", 100.0, 0.0, 1.0, 5.0),
        ],
    )
    .await;
    mount_detail(&server, route, "N1", detail(json!(50))).await;
    mount_detail(&server, route, "N2", detail(json!(10000))).await;

    let sleeper = Arc::new(InstantSleeper::default());
    let finder = make_finder(Endpoint::Direct { base_url: Some(server.uri()) }, sleeper);
    let driver = BatchDriver::new(finder);
    let mut log = RunLog::new();

    let outcome = driver.run("bento box", &make_template(), &mut log).await;

    assert!(matches!(outcome, RunOutcome::Completed { .. }));
    assert_eq!(log.results().len(), 1);

    let result = &log.results()[0];
    assert_eq!(result.niche_id, "N1");
    assert_eq!(result.niche_title, "Bento Box Set");
    assert_eq!(result.growth_percentage, 10.0);
    assert_eq!(result.new_products_launched, 12.0);
    assert_eq!(result.successful_products_launched, 3.0);
    assert_eq!(log.last().unwrap().message, "Search process finished.");

    // Direct mode forwards the session as portal headers
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        assert_eq!(request.headers.get("anti-csrftoken-a2z").unwrap(), "csrf-token");
        assert_eq!(request.headers.get("cookie").unwrap(), "session-id=123");
        assert_eq!(request.headers.get("origin").unwrap(), "https://sellercentral.amazon.fr");
    }
}

#[tokio::test]
async fn test_relay_mode_rate_limit_then_success() {
    let server = MockServer::start().await;
    let route = "/api/ox";

    Mock::given(method("POST"))
        .and(path(route))
        .and(header("x-amz-country", "FR"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_niches(&server, route, "yoga mat", vec![]).await;

    let sleeper = Arc::new(InstantSleeper::default());
    let endpoint = Endpoint::Relay(format!("{}{}", server.uri(), route));
    let finder = make_finder(endpoint, sleeper.clone());
    let mut log = RunLog::new();

    let report = finder.search(&make_template().with_keyword("yoga mat"), &mut log).await;

    assert!(!report.failed());
    assert_eq!(
        log.messages(),
        vec![
            "Processing keyword: \"yoga mat\" for FR marketplace",
            "Rate limit hit (attempt 1), waiting 15s...",
            "Rate limit hit (attempt 2), waiting 30s...",
            "No niches found for \"yoga mat\"",
        ]
    );
    assert_eq!(
        *sleeper.waits.lock().unwrap(),
        vec![Duration::from_secs(15), Duration::from_secs(30)]
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_failing_keyword_does_not_stop_the_batch() {
    let server = MockServer::start().await;
    let route = "/ox-api/graphql";

    Mock::given(method("POST"))
        .and(path(route))
        .and(body_partial_json(json!({
            "variables": { "filter": { "searchTermsFilter": { "searchInput": "broken" } } }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "errors": [{ "message": "Unauthorized" }] })),
        )
        .mount(&server)
        .await;
    let lunch_bag = niche("L1", "Lunch Bag", 400000.0, 0.3, 5000.0, 30.0);
    mount_niches(&server, route, "lunch bag", vec![lunch_bag]).await;
    mount_detail(&server, route, "L1", detail(json!("120"))).await;

    let sleeper = Arc::new(InstantSleeper::default());
    let finder = make_finder(Endpoint::Direct { base_url: Some(server.uri()) }, sleeper.clone());
    let driver = BatchDriver::new(finder);
    let mut log = RunLog::new();

    let outcome = driver.run("broken\nlunch bag", &make_template(), &mut log).await;

    let reports = outcome.reports();
    assert_eq!(reports.len(), 2);
    assert!(reports[0].failed());
    assert!(!reports[1].failed());

    let messages = log.messages();
    let error_line = messages
        .iter()
        .find(|m| m.starts_with("Error processing keyword \"broken\""))
        .unwrap();
    assert!(error_line.contains("Failed after 3 attempts: GraphQL Error"));
    assert!(error_line.contains("Unauthorized"));
    assert_eq!(messages.iter().filter(|m| m.contains("Retrying...")).count(), 2);

    assert_eq!(log.results().len(), 1);
    assert_eq!(log.results()[0].avg_reviews_number, 120.0);

    // Backoff between attempts: 2s then 3s
    let waits = sleeper.waits.lock().unwrap().clone();
    assert!(waits.starts_with(&[Duration::from_secs(2), Duration::from_secs(3)]));
}

#[tokio::test]
async fn test_missing_credentials_send_nothing() {
    let server = MockServer::start().await;

    let sleeper = Arc::new(InstantSleeper::default());
    let finder = make_finder(Endpoint::Direct { base_url: Some(server.uri()) }, sleeper);
    let driver = BatchDriver::new(finder);
    let template = SearchCriteria::template(
        "A13V1IB3VIYZZH",
        AuthContext::new("", "", "FR"),
        FilterThresholds::default(),
    );
    let mut log = RunLog::new();

    let outcome = driver.run("bento box", &template, &mut log).await;

    assert_eq!(outcome, RunOutcome::Invalid);
    assert!(server.received_requests().await.unwrap().is_empty());
}
