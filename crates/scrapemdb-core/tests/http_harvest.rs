use std::sync::Arc;

use scrapemdb_core::layout::{main_document, review_document};
use scrapemdb_core::{
    ClientConfig, DocumentStore, EntityHarvester, HarvestConfig, HarvestRequest, HttpNavigator,
    Navigator, OutputLayout, Schema,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCHEMA: &str = r#"{
    "targetTitle": { "by": "CSS_SELECTOR", "value": "h1 span.title" },
    "targetDate": { "by": "ID", "value": "release" },
    "targetRate": { "by": "class", "value": "rating" },
    "targetDescription": { "by": "css", "value": "p.plot" },
    "targetType": { "by": "CLASS_NAME", "value": "kind" },
    "castName": { "by": "CSS_SELECTOR", "value": ".cast .actor" },
    "castRole": { "by": "CSS_SELECTOR", "value": ".cast .role" },
    "runtime": { "by": "ID", "value": "runtime" },
    "targetDirs": { "by": "LINK_TEXT", "value": "Lana Wachowski" },
    "parentsGuide": { "by": "CSS_SELECTOR", "value": "li.advisory" },
    "parentsGuideType": { "by": "CSS_SELECTOR", "value": ".category" },
    "parentsGuideRating": { "by": "CSS_SELECTOR", "value": ".severity" },
    "reviewTitle": { "by": "CSS_SELECTOR", "value": ".review h3" },
    "reviewContent": { "by": "CSS_SELECTOR", "value": ".review .body" },
    "reviewAllbtn": { "by": "XPATH", "value": "//button[@id='all']" }
}"#;

const TITLE_PAGE: &str = r#"<html><body>
    <h1><span class="title">The Matrix</span></h1>
    <span id="release">1999–03–31</span>
    <span class="rating">8.7</span>
    <span class="kind">Movie</span>
    <p class="plot">A hacker learns the truth – and fights.</p>
    <ul class="cast">
        <li><a class="actor">Keanu Reeves</a><span class="role">Neo</span></li>
        <li><a class="actor">Carrie-Anne Moss</a><span class="role">Trinity</span></li>
    </ul>
    <span id="runtime">2h 16m</span>
    <a href="/name/nm1/">Lana Wachowski</a>
</body></html>"#;

const GUIDE_PAGE: &str = r#"<html><body><ul>
    <li class="advisory"><span class="category">Violence &amp; Gore</span><span class="severity">Moderate</span></li>
    <li class="advisory"><span class="category">Profanity</span><span class="severity">Mild</span></li>
</ul></body></html>"#;

const REVIEWS_PAGE: &str = r#"<html><body>
    <div class="review"><h3>Mind-bending</h3><div class="body">Still holds up.</div></div>
    <div class="review"><h3>Classic</h3><div class="body">Watch it.</div></div>
</body></html>"#;

async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_harvest_over_http() {
    let server = MockServer::start().await;
    serve(&server, "/title/tt0133093/", TITLE_PAGE).await;
    serve(&server, "/title/tt0133093/parentalguide/", GUIDE_PAGE).await;
    serve(&server, "/title/tt0133093/reviews/", REVIEWS_PAGE).await;

    let dir = tempfile::tempdir().unwrap();
    let navigator = HttpNavigator::start(ClientConfig {
        requests_per_second: 100.0,
        ..ClientConfig::default()
    })
    .unwrap();
    let schema = Arc::new(Schema::from_json_str(SCHEMA).unwrap());
    let mut harvester = EntityHarvester::new(
        navigator,
        schema,
        HarvestConfig::default(),
        OutputLayout::new(dir.path()),
    );
    let request = HarvestRequest {
        enhanced_reviews: true,
        ..HarvestRequest::root()
    };

    let origin = format!("{}/title/tt0133093/", server.uri());
    let report = harvester.harvest(&origin, &request).await.unwrap();

    assert_eq!(
        report.data_dir,
        dir.path().join("Movies").join("The Matrix (1999)").join("data")
    );
    let store = DocumentStore::new();
    let doc = store.read(&main_document(&report.data_dir)).unwrap();
    let entry = &doc["The Matrix"];
    assert_eq!(entry["Date"], "1999 - 03 - 31");
    assert_eq!(entry["Rate"], "8.7");
    assert_eq!(entry["Description"], "A hacker learns the truth - and fights.");
    assert_eq!(entry["Cast"][1]["role"], "Trinity");
    assert_eq!(entry["Runtime"], "2h 16m");
    assert_eq!(entry["Directors"][0], "Lana Wachowski");
    assert_eq!(entry["ParentsGuide"][0]["type"], "Violence & Gore");
    assert_eq!(entry["ParentsGuide"][1]["rate"], "Mild");

    let reviews = store.read(&review_document(&report.data_dir)).unwrap();
    assert_eq!(reviews["The Matrix"]["Reviews"][0]["title"], "Mind-bending");
    assert_eq!(reviews["The Matrix"]["Reviews"][1]["content"], "Watch it.");

    assert_eq!(harvester.navigator().current_url().await.unwrap(), origin);
}
