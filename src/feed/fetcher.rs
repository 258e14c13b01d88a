//! RSS feed fetcher.
//!
//! Retrieves a feed over HTTP with a single bounded GET, decodes the RSS
//! envelope and unescapes HTML entities in titles and descriptions.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use rss::Channel;
use tracing::debug;

use crate::config::FetcherConfig;
use crate::error::FetchError;
use crate::feed::types::{RawFeed, RawItem};
use crate::{FeedmillError, Result};

/// Capability to fetch and decode a feed.
pub trait FetchFeed {
    /// Fetch the feed at `url`.
    fn fetch(&self, url: &str) -> impl Future<Output = std::result::Result<RawFeed, FetchError>> + Send;
}

/// HTTP feed fetcher.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    max_feed_size: u64,
}

impl FeedFetcher {
    /// Create a fetcher from configuration.
    ///
    /// The total timeout bounds each request end to end; redirects follow the
    /// transport default.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FeedmillError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }
}

impl FetchFeed for FeedFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<RawFeed, FetchError> {
        validate_url(url)?;

        debug!("Fetching feed {}", url);
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        // An error page would otherwise surface as an XML parse failure.
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(FetchError::TooLarge {
                    size: content_length,
                    max: self.max_feed_size,
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?
        {
            let size = (body.len() + chunk.len()) as u64;
            if size > self.max_feed_size {
                return Err(FetchError::TooLarge {
                    size,
                    max: self.max_feed_size,
                });
            }
            body.extend_from_slice(&chunk);
        }

        parse_feed(&body)
    }
}

/// Validate that a URL is an absolute http(s) URL with a host.
pub fn validate_url(url: &str) -> std::result::Result<(), FetchError> {
    let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(FetchError::InvalidUrl(format!("URL has no host: {url}")));
    }

    Ok(())
}

/// Decode RSS bytes into a [`RawFeed`].
pub fn parse_feed(bytes: &[u8]) -> std::result::Result<RawFeed, FetchError> {
    let channel = Channel::read_from(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    let items = channel
        .items()
        .iter()
        .map(|item| RawItem {
            title: unescape(item.title().unwrap_or_default()),
            link: item.link().unwrap_or_default().trim().to_string(),
            description: unescape(item.description().unwrap_or_default()),
            pub_date: item.pub_date().unwrap_or_default().to_string(),
        })
        .collect();

    Ok(RawFeed {
        title: unescape(channel.title()),
        link: channel.link().trim().to_string(),
        description: unescape(channel.description()),
        items,
    })
}

/// Decode HTML entities left in text after XML decoding.
fn unescape(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_valid() {
        assert!(validate_url("https://example.com/feed.xml").is_ok());
        assert!(validate_url("http://127.0.0.1:8080/feed.xml").is_ok());
    }

    #[test]
    fn test_validate_url_invalid_scheme() {
        let result = validate_url("ftp://example.com/feed.xml");
        assert!(matches!(result, Err(FetchError::InvalidUrl(msg)) if msg.contains("unsupported URL scheme")));
    }

    #[test]
    fn test_validate_url_malformed() {
        assert!(matches!(validate_url("not a url"), Err(FetchError::InvalidUrl(_))));
        assert!(matches!(validate_url(""), Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_feed_rss() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>https://example.com</link>
    <description>A test feed</description>
    <item>
      <title>First Article</title>
      <link>https://example.com/1</link>
      <description>Description one</description>
      <pubDate>Mon, 02 Jan 2006 15:04:05 -0700</pubDate>
    </item>
    <item>
      <title>Second Article</title>
      <link>https://example.com/2</link>
    </item>
  </channel>
</rss>"#;

        let feed = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(feed.title, "Test Feed");
        assert_eq!(feed.link, "https://example.com");
        assert_eq!(feed.description, "A test feed");
        assert_eq!(feed.items.len(), 2);

        assert_eq!(feed.items[0].title, "First Article");
        assert_eq!(feed.items[0].link, "https://example.com/1");
        assert_eq!(feed.items[0].description, "Description one");
        assert_eq!(feed.items[0].pub_date, "Mon, 02 Jan 2006 15:04:05 -0700");

        assert_eq!(feed.items[1].description, "");
        assert_eq!(feed.items[1].pub_date, "");
    }

    #[test]
    fn test_parse_feed_unescapes_double_encoded_entities() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Caf&amp;eacute; News</title>
    <link>https://example.com</link>
    <description>Tom &amp;amp; Jerry</description>
    <item>
      <title>Caf&amp;eacute; &amp;#8220;open&amp;#8221;</title>
      <link>https://example.com/cafe</link>
      <description>&amp;lt;p&amp;gt;Hello&amp;lt;/p&amp;gt;</description>
    </item>
  </channel>
</rss>"#;

        let feed = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(feed.title, "Café News");
        assert_eq!(feed.description, "Tom & Jerry");
        assert_eq!(feed.items[0].title, "Café \u{201C}open\u{201D}");
        assert_eq!(feed.items[0].description, "<p>Hello</p>");
    }

    #[test]
    fn test_parse_feed_empty_channel() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
  </channel>
</rss>"#;

        let feed = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(feed, RawFeed::default());
    }

    #[test]
    fn test_parse_feed_invalid() {
        let result = parse_feed(b"This is not XML");
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_parse_feed_html_page() {
        let html = b"<html><head><title>502 Bad Gateway</title></head><body></body></html>";
        assert!(matches!(parse_feed(html), Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_new_fetcher_from_default_config() {
        let fetcher = FeedFetcher::new(&FetcherConfig::default()).unwrap();
        assert_eq!(fetcher.max_feed_size, 5 * 1024 * 1024);
    }
}
