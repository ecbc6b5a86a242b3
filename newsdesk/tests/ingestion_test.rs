use std::time::Duration;

use newsdesk::error::FetchError;
use newsdesk::ingestion::{FeedFetcher, HttpFeedFetcher};
use newsdesk::SourceDescriptor;

const RSS_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Test Wire</title>
    <link>https://news.example.com</link>
    <description>Test feed</description>
    <item>
      <title>Monsoon reaches Kerala</title>
      <link>https://news.example.com/monsoon</link>
      <description><![CDATA[<p>Rain arrives early in Kerala.</p><img src="/inline.jpg">]]></description>
      <pubDate>Mon, 02 Jun 2025 06:30:00 GMT</pubDate>
      <media:content url="https://cdn.example.com/monsoon.jpg" medium="image" type="image/jpeg"/>
    </item>
    <item>
      <title>Budget session opens</title>
      <link>https://news.example.com/budget</link>
      <description>Parliament debates the budget.</description>
    </item>
  </channel>
</rss>"#;

const ATOM_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Wire</title>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <updated>2025-06-02T08:00:00Z</updated>
  <entry>
    <title>Startup raises funding</title>
    <link rel="alternate" href="https://atom.example.com/startup"/>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2025-06-02T08:00:00Z</updated>
    <summary>A Bengaluru startup raised new capital.</summary>
  </entry>
</feed>"#;

fn fetcher(timeout_secs: u64) -> HttpFeedFetcher {
    HttpFeedFetcher::new(Duration::from_secs(timeout_secs), "newsdesk-test").expect("build fetcher")
}

#[tokio::test]
async fn test_fetch_rss_with_mock() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/feed.xml")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(RSS_FEED)
        .create_async()
        .await;

    let source = SourceDescriptor::new("Test Wire", format!("{}/feed.xml", server.url()), None);
    let items = fetcher(5).fetch(&source).await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Monsoon reaches Kerala");
    assert_eq!(items[0].url, "https://news.example.com/monsoon");
    assert!(items[0].body_text.contains("Rain arrives early"));
    assert!(items[0].published_at.is_some());
    // media:content wins over the inline image
    assert_eq!(items[0].image_url.as_deref(), Some("https://cdn.example.com/monsoon.jpg"));

    assert_eq!(items[1].title, "Budget session opens");
    assert!(items[1].image_url.is_none());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_atom_with_mock() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/atom.xml")
        .with_status(200)
        .with_header("content-type", "application/atom+xml")
        .with_body(ATOM_FEED)
        .create_async()
        .await;

    let items = fetcher(5)
        .try_fetch(&format!("{}/atom.xml", server.url()))
        .await
        .expect("atom feed parses");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Startup raises funding");
    assert_eq!(items[0].url, "https://atom.example.com/startup");
    assert_eq!(items[0].body_text, "A Bengaluru startup raised new capital.");
    assert!(items[0].published_at.is_some());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_success_status_yields_no_items() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/missing.xml")
        .with_status(404)
        .with_body("not found")
        .expect(2)
        .create_async()
        .await;

    let url = format!("{}/missing.xml", server.url());
    let fetcher = fetcher(5);

    let result = fetcher.try_fetch(&url).await;
    assert!(matches!(result, Err(FetchError::Status(s)) if s.as_u16() == 404));

    let source = SourceDescriptor::new("Missing", url, None);
    assert!(fetcher.fetch(&source).await.is_empty());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_malformed_document_yields_no_items() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("GET", "/broken.xml")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><body>maintenance</body></html>")
        .create_async()
        .await;

    let url = format!("{}/broken.xml", server.url());
    let fetcher = fetcher(5);

    let result = fetcher.try_fetch(&url).await;
    assert!(matches!(result, Err(FetchError::Parse(_))));

    let source = SourceDescriptor::new("Broken", url, None);
    assert!(fetcher.fetch(&source).await.is_empty());
}

#[tokio::test]
async fn test_unresponsive_source_times_out_to_empty() {
    // Accepts connections and never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let hold = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let source = SourceDescriptor::new("Silent", format!("http://{}/feed.xml", addr), None);
    let started = std::time::Instant::now();
    let items = fetcher(1).fetch(&source).await;

    assert!(items.is_empty());
    assert!(started.elapsed() < Duration::from_secs(5));

    hold.abort();
}

#[tokio::test]
async fn test_unreachable_source_yields_no_items() {
    // Bind then drop to get a port with nothing listening.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("local addr")
    };

    let source = SourceDescriptor::new("Gone", format!("http://{}/feed.xml", addr), None);
    assert!(fetcher(2).fetch(&source).await.is_empty());
}
