//! End-to-end classification through the orchestrator with scripted browsers.
//!
//! Primary page and secondary engines are mocks; everything between them
//! (platform routing, navigation fallback, signal extraction, rule walk,
//! secondary probe lifecycle, budget) is the real code.

use std::sync::Arc;
use std::time::Duration;

use linkwatch_engine::testing::{MockLauncher, MockPage, PageScript};
use linkwatch_engine::{
    BrowserEngine, Classifier, EngineFallbackProbe, Identities, LinkClassifier, LoginWallPolicy,
    NavigationProbe, Orchestrator, ProbeTimings, Profiles, Verdict,
};

fn timings() -> ProbeTimings {
    ProbeTimings {
        navigation_timeout: Duration::from_millis(200),
        network_idle_timeout: Duration::from_millis(200),
        settle: Duration::ZERO,
    }
}

fn build(page: MockPage, launcher: Arc<MockLauncher>) -> Orchestrator {
    let probe = NavigationProbe::new(timings());
    let secondary = EngineFallbackProbe::new(launcher, probe, Identities::default());
    let classifier = Classifier::new(Profiles::standard().unwrap(), LoginWallPolicy::FoldIntoActive)
        .with_secondary_probe(Arc::new(secondary));
    Orchestrator::new(Box::new(page), probe, classifier, Duration::from_secs(10))
}

#[tokio::test]
async fn facebook_watch_login_wall_confirmed_on_chromium() {
    let url = "https://www.facebook.com/watch/?v=42";
    let primary = MockPage::new().on(
        url,
        PageScript::ok(200, url, "<div>Log in to Facebook</div>"),
    );
    let launcher = Arc::new(MockLauncher::new().on(
        url,
        PageScript::ok(200, url, "<div>This video isn't available anymore</div>"),
    ));

    let result = build(primary, launcher.clone()).classify(url).await;

    assert_eq!(result.verdict, Verdict::Removed);
    let launched = launcher.launched();
    assert_eq!(launched.len(), 1);
    assert_eq!(launched[0].0, BrowserEngine::Chromium);
    assert_eq!(launched[0].1, Identities::default().chromium);
    assert_eq!(launcher.closed(), 1);
}

#[tokio::test]
async fn facebook_reel_login_wall_clean_on_webkit_stays_active() {
    let url = "https://www.facebook.com/reel/777";
    let primary = MockPage::new().on(url, PageScript::ok(200, url, "<div>Log in</div>"));
    let launcher = Arc::new(MockLauncher::new().on(
        url,
        PageScript::ok(200, url, r#"<meta property="og:video" content="https://cdn/v.mp4">"#),
    ));

    let result = build(primary, launcher.clone()).classify(url).await;

    assert_eq!(result.verdict, Verdict::Active);
    assert_eq!(launcher.launched()[0].0, BrowserEngine::Webkit);
    assert_eq!(launcher.closed(), 1);
}

#[tokio::test]
async fn facebook_reel_without_webkit_rechecked_on_chromium() {
    let url = "https://www.facebook.com/reel/778";
    let primary = MockPage::new().on(url, PageScript::ok(200, url, "<div>Log in</div>"));
    let launcher = Arc::new(
        MockLauncher::new()
            .without_engine(BrowserEngine::Webkit)
            .on(url, PageScript::ok(200, url, "<div>This content isn't available right now</div>")),
    );

    let result = build(primary, launcher.clone()).classify(url).await;

    assert_eq!(result.verdict, Verdict::Removed);
    assert!(result.detail.starts_with("secondary engine:"), "{}", result.detail);
    assert_eq!(
        launcher.launched(),
        vec![(BrowserEngine::Chromium, Identities::default().chromium)]
    );
    assert_eq!(launcher.closed(), 1);
}

#[tokio::test]
async fn facebook_secondary_engine_missing_never_removes() {
    let url = "https://www.facebook.com/somepage/posts/9";
    let primary = MockPage::new().on(url, PageScript::ok(200, url, "<div>Log in</div>"));
    let launcher = Arc::new(MockLauncher::new().failing_launch());

    let result = build(primary, launcher).classify(url).await;

    assert_eq!(result.verdict, Verdict::Active);
    assert_eq!(result.detail, "http success (http 200)");
}

#[tokio::test]
async fn statusless_driver_leaves_generic_unknown() {
    let url = "https://city.gov/notice";
    let primary = MockPage::new().on(url, PageScript::ok_without_status(url, "<p>Notice</p>"));

    let result = build(primary, Arc::new(MockLauncher::new())).classify(url).await;

    assert_eq!(result.verdict, Verdict::Unknown);
}

#[tokio::test]
async fn threads_redirect_to_error_page() {
    let url = "https://www.threads.net/@someone/post/abc";
    let primary = MockPage::new().on(
        url,
        PageScript::ok(200, "https://www.threads.com/?error=invalid_post", "<p>Threads</p>"),
    );

    let result = build(primary, Arc::new(MockLauncher::new())).classify(url).await;

    assert_eq!(result.verdict, Verdict::Removed);
    assert!(result.detail.starts_with("invalid_post redirect"));
}

#[tokio::test]
async fn one_page_serves_many_urls() {
    let a = "https://www.youtube.com/watch?v=a";
    let b = "https://www.youtube.com/watch?v=b";
    let primary = MockPage::new()
        .on(a, PageScript::ok(200, a, "<p>ok</p>"))
        .on(b, PageScript::ok(200, b, "<p>Video unavailable</p>"));
    let log = primary.clone();
    let mut orch = build(primary, Arc::new(MockLauncher::new()));

    assert_eq!(orch.classify(a).await.verdict, Verdict::Active);
    assert_eq!(orch.classify(b).await.verdict, Verdict::Removed);
    assert_eq!(log.visited(), vec![a.to_string(), b.to_string()]);

    orch.shutdown().await;
    assert_eq!(log.closed(), 1);
}
