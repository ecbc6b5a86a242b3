use std::time::Duration;

use newsdesk::ingestion::HttpFeedFetcher;
use newsdesk::sources;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Feeds given on the command line, or the built-in list
    let mut feeds: Vec<String> = std::env::args().skip(1).collect();
    if feeds.is_empty() {
        feeds = sources::default_sources().into_iter().map(|s| s.feed_url).collect();
    }

    let fetcher = HttpFeedFetcher::new(Duration::from_secs(10), "Newsdesk/0.1.0 (probe)")?;

    for url in feeds {
        println!("\n{}", "=".repeat(60));
        println!("Probing: {}", url);
        println!("{}", "=".repeat(60));

        match fetcher.try_fetch(&url).await {
            Ok(items) => {
                println!("✓ Success!");
                println!("  Entries: {}", items.len());

                if !items.is_empty() {
                    println!("\n  First 3 entries:");
                    for (i, item) in items.iter().take(3).enumerate() {
                        println!("    {}. {}", i + 1, item.title);
                        println!("       URL: {}", if item.url.is_empty() { "none" } else { item.url.as_str() });
                        println!(
                            "       Published: {}",
                            item.published_at.map(|d| d.to_rfc3339()).unwrap_or_else(|| "unknown".into())
                        );
                        println!("       Image: {}", item.image_url.as_deref().unwrap_or("none"));
                        println!("       Body: {} chars", item.body_text.len());
                    }
                }
            }
            Err(e) => {
                println!("✗ Failed: {}", e);
            }
        }
    }

    Ok(())
}
