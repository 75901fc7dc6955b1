//! RSS headline source.

use super::{ensure_success, validate_iso_date, NewsSource};
use crate::config::NewsSettings;
use crate::error::{BriefError, Result};
use crate::models::Headline;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Once this many same-day headlines are found, later feeds are not scanned
/// for same-day items.
const SAME_DAY_TARGET: usize = 3;

/// Headlines scraped from a list of RSS feeds.
pub struct RssNews {
    http: reqwest::Client,
    feeds: Vec<String>,
    default_page_size: usize,
    timeout: Duration,
}

impl RssNews {
    pub fn new(http: reqwest::Client, settings: &NewsSettings) -> Self {
        Self {
            http,
            feeds: settings.feeds.clone(),
            default_page_size: settings.default_page_size.max(1),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<FeedItem>> {
        let resp = self.http.get(url).timeout(self.timeout).send().await?;
        let body = ensure_success(resp, "RSS feed").await?.text().await?;
        parse_feed(&body)
    }
}

#[async_trait]
impl NewsSource for RssNews {
    #[instrument(skip(self))]
    async fn headlines(
        &self,
        iso_date: &str,
        query: Option<&str>,
        page_size: Option<usize>,
    ) -> Result<Vec<Headline>> {
        let date = validate_iso_date(iso_date)?;
        let limit = page_size
            .filter(|n| *n > 0)
            .unwrap_or(self.default_page_size);

        let mut feeds = Vec::with_capacity(self.feeds.len());
        for url in &self.feeds {
            match self.fetch_feed(url).await {
                Ok(items) => {
                    debug!("Feed {} returned {} items", url, items.len());
                    feeds.push(items);
                }
                Err(e) => warn!("Skipping feed {}: {}", url, e),
            }
        }

        Ok(select_headlines(&feeds, date, query, limit))
    }
}

/// One `<item>` from an RSS channel.
#[derive(Debug, Clone, Default, PartialEq)]
struct FeedItem {
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Link,
    PubDate,
}

/// Parse the items of an RSS 2.0 document.
fn parse_feed(xml: &str) -> Result<Vec<FeedItem>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<FeedItem> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" => current = Some(FeedItem::default()),
                b"title" if current.is_some() => field = Some(Field::Title),
                b"link" if current.is_some() => field = Some(Field::Link),
                b"pubDate" if current.is_some() => field = Some(Field::PubDate),
                _ => field = None,
            },
            Ok(Event::Text(t)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    let text = t
                        .unescape()
                        .map_err(|e| BriefError::Feed(e.to_string()))?;
                    append_field(item, f, &text);
                }
            }
            Ok(Event::CData(c)) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    append_field(item, f, &String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(BriefError::Feed(format!(
                    "malformed XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    Ok(items)
}

fn append_field(item: &mut FeedItem, field: Field, text: &str) {
    let slot = match field {
        Field::Title => &mut item.title,
        Field::Link => &mut item.link,
        Field::PubDate => &mut item.pub_date,
    };
    slot.get_or_insert_with(String::new).push_str(text);
}

/// Pick headlines: same-day items first, then fill from anything left.
fn select_headlines(
    feeds: &[Vec<FeedItem>],
    date: NaiveDate,
    query: Option<&str>,
    limit: usize,
) -> Vec<Headline> {
    let query = query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());
    let matches_query = |title: &str| {
        query
            .as_deref()
            .map_or(true, |q| title.to_lowercase().contains(q))
    };

    let mut headlines: Vec<Headline> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for items in feeds {
        for item in items {
            if headlines.len() >= limit {
                break;
            }
            let (Some(title), Some(link), Some(pub_date)) =
                (non_empty(&item.title), non_empty(&item.link), item.pub_date.as_deref())
            else {
                continue;
            };
            // Unparseable dates are given the benefit of the doubt.
            if let Ok(published) = DateTime::parse_from_rfc2822(pub_date.trim()) {
                if published.date_naive() != date {
                    continue;
                }
            }
            if matches_query(title) && seen.insert(link.to_string()) {
                headlines.push(Headline {
                    title: title.to_string(),
                    url: link.to_string(),
                });
            }
        }
        if headlines.len() >= SAME_DAY_TARGET {
            break;
        }
    }

    for items in feeds {
        for item in items {
            if headlines.len() >= limit {
                return headlines;
            }
            let (Some(title), Some(link)) = (non_empty(&item.title), non_empty(&item.link)) else {
                continue;
            };
            if matches_query(title) && seen.insert(link.to_string()) {
                headlines.push(Headline {
                    title: title.to_string(),
                    url: link.to_string(),
                });
            }
        }
    }

    headlines
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rss(items: &[(&str, &str, &str)]) -> String {
        let body: String = items
            .iter()
            .map(|(title, link, date)| {
                format!(
                    "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate></item>",
                    title, link, date
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Top stories</title><link>https://news.example.com</link>{}</channel></rss>"#,
            body
        )
    }

    fn item(title: &str, link: &str, date: &str) -> FeedItem {
        FeedItem {
            title: Some(title.to_string()),
            link: Some(link.to_string()),
            pub_date: Some(date.to_string()),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    const TODAY: &str = "Wed, 01 May 2024 08:00:00 GMT";
    const YESTERDAY: &str = "Tue, 30 Apr 2024 08:00:00 GMT";

    #[test]
    fn test_parse_feed() {
        let xml = r#"<rss><channel>
            <title>Channel</title>
            <item>
                <title>Rates &amp; bonds</title>
                <link>https://example.com/a</link>
                <pubDate>Wed, 01 May 2024 08:00:00 GMT</pubDate>
                <description><![CDATA[<p>ignored</p>]]></description>
            </item>
            <item><title><![CDATA[Chips rally]]></title><link>https://example.com/b</link></item>
        </channel></rss>"#;

        let items = parse_feed(xml).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("Rates & bonds"));
        assert_eq!(items[0].link.as_deref(), Some("https://example.com/a"));
        assert_eq!(items[0].pub_date.as_deref(), Some(TODAY));
        assert_eq!(items[1].title.as_deref(), Some("Chips rally"));
        assert!(items[1].pub_date.is_none());
    }

    #[test]
    fn test_parse_feed_malformed() {
        assert!(matches!(
            parse_feed("<rss><channel><item><title>x</link></item>"),
            Err(BriefError::Feed(_))
        ));
    }

    #[test]
    fn test_same_day_items_come_first() {
        let feeds = vec![vec![
            item("Old news", "https://e.com/old", YESTERDAY),
            item("Fresh one", "https://e.com/1", TODAY),
            item("Fresh two", "https://e.com/2", TODAY),
        ]];
        let headlines = select_headlines(&feeds, day(), None, 2);
        let titles: Vec<_> = headlines.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Fresh one", "Fresh two"]);
    }

    #[test]
    fn test_fill_from_older_items() {
        let feeds = vec![vec![
            item("Old news", "https://e.com/old", YESTERDAY),
            item("Fresh one", "https://e.com/1", TODAY),
        ]];
        let headlines = select_headlines(&feeds, day(), None, 5);
        let titles: Vec<_> = headlines.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Fresh one", "Old news"]);
    }

    #[test]
    fn test_unparseable_date_accepted_in_first_pass() {
        let feeds = vec![vec![item("Undated", "https://e.com/u", "sometime")]];
        let headlines = select_headlines(&feeds, day(), None, 1);
        assert_eq!(headlines.len(), 1);
    }

    #[test]
    fn test_urls_unique_and_limit_respected() {
        let feeds = vec![
            vec![
                item("A", "https://e.com/a", TODAY),
                item("A again", "https://e.com/a", TODAY),
                item("B", "https://e.com/b", YESTERDAY),
            ],
            vec![
                item("A elsewhere", "https://e.com/a", TODAY),
                item("C", "https://e.com/c", TODAY),
                item("D", "https://e.com/d", YESTERDAY),
            ],
        ];

        for limit in 1..=6 {
            let headlines = select_headlines(&feeds, day(), None, limit);
            assert!(headlines.len() <= limit);
            let urls: HashSet<_> = headlines.iter().map(|h| h.url.clone()).collect();
            assert_eq!(urls.len(), headlines.len(), "duplicate url at limit {}", limit);
        }

        // Four distinct URLs exist in total.
        assert_eq!(select_headlines(&feeds, day(), None, 10).len(), 4);
    }

    #[test]
    fn test_query_filters_titles() {
        let feeds = vec![vec![
            item("ASX closes higher", "https://e.com/1", TODAY),
            item("Weather warning", "https://e.com/2", TODAY),
            item("asx tech rally", "https://e.com/3", YESTERDAY),
        ]];
        let headlines = select_headlines(&feeds, day(), Some("ASX"), 7);
        let urls: Vec<_> = headlines.iter().map(|h| h.url.as_str()).collect();
        assert_eq!(urls, vec!["https://e.com/1", "https://e.com/3"]);
    }

    #[test]
    fn test_items_missing_fields_skipped() {
        let feeds = vec![vec![
            FeedItem {
                title: None,
                link: Some("https://e.com/x".to_string()),
                pub_date: Some(TODAY.to_string()),
            },
            FeedItem {
                title: Some("  ".to_string()),
                link: Some("https://e.com/y".to_string()),
                pub_date: None,
            },
        ]];
        assert!(select_headlines(&feeds, day(), None, 7).is_empty());
    }

    #[tokio::test]
    async fn test_failed_feed_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/business"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/technology"))
            .respond_with(ResponseTemplate::new(200).set_body_string(rss(&[
                ("Chip stocks climb", "https://e.com/chips", TODAY),
                ("Cloud deal signed", "https://e.com/cloud", TODAY),
            ])))
            .mount(&server)
            .await;

        let settings = NewsSettings {
            feeds: vec![
                format!("{}/business", server.uri()),
                format!("{}/technology", server.uri()),
            ],
            default_page_size: 7,
            timeout_secs: 5,
        };
        let news = RssNews::new(reqwest::Client::new(), &settings);
        let headlines = news.headlines("2024-05-01", None, Some(5)).await.unwrap();
        assert_eq!(headlines.len(), 2);
        assert_eq!(headlines[0].url, "https://e.com/chips");
    }

    #[tokio::test]
    async fn test_unusable_feed_yields_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<rss><item>"))
            .mount(&server)
            .await;

        let settings = NewsSettings {
            feeds: vec![format!("{}/broken", server.uri())],
            default_page_size: 7,
            timeout_secs: 5,
        };
        let news = RssNews::new(reqwest::Client::new(), &settings);
        assert!(news.headlines("2024-05-01", None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_date_fails_before_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let settings = NewsSettings {
            feeds: vec![server.uri()],
            ..NewsSettings::default()
        };
        let news = RssNews::new(reqwest::Client::new(), &settings);
        let err = news.headlines("2024-02-30", None, None).await.unwrap_err();
        assert!(matches!(err, BriefError::InvalidDate(_)));
    }
}
