//! Web access tools: search and fetch URLs.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; openswarm/0.1)";
const MAX_FETCH_CHARS: usize = 20_000;

/// Search the web via DuckDuckGo's HTML endpoint (no API key needed).
pub struct WebSearch;

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web. Returns result titles, snippets and URLs. Use for finding documentation or current information."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let query = args["query"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' argument"))?;

        let url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        let html = client.get(&url).send().await?.text().await?;

        let results = extract_search_results(&html);
        if results.is_empty() {
            Ok(format!("No results found for: {query}"))
        } else {
            Ok(results.join("\n\n"))
        }
    }
}

/// Fetch the content of a URL as readable text.
pub struct FetchUrl;

#[async_trait]
impl Tool for FetchUrl {
    fn name(&self) -> &str {
        "fetch_url"
    }

    fn description(&self) -> &str {
        "Fetch the content of a URL. HTML is reduced to readable text; long responses are truncated."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to fetch"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let url = args["url"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'url' argument"))?;

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("HTTP error: {status}"));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await?;

        let text = if content_type.contains("text/html") {
            html_to_text(&body)
        } else {
            body
        };

        if text.chars().count() > MAX_FETCH_CHARS {
            let truncated: String = text.chars().take(MAX_FETCH_CHARS).collect();
            Ok(format!("{truncated}\n... (response truncated)"))
        } else {
            Ok(text)
        }
    }
}

/// Extract result blocks from DuckDuckGo's HTML.
fn extract_search_results(html: &str) -> Vec<String> {
    let mut results = Vec::new();

    for (i, chunk) in html.split("class=\"result__body\"").enumerate().skip(1) {
        if i > 5 {
            break;
        }

        let title = chunk
            .split("class=\"result__a\"")
            .nth(1)
            .and_then(|s| s.split('>').nth(1))
            .and_then(|s| s.split('<').next())
            .unwrap_or("");
        let snippet = chunk
            .split("class=\"result__snippet\"")
            .nth(1)
            .and_then(|s| s.split('>').nth(1))
            .and_then(|s| s.split('<').next())
            .unwrap_or("");
        let url = chunk
            .split("class=\"result__url\"")
            .nth(1)
            .and_then(|s| s.split('>').nth(1))
            .and_then(|s| s.split('<').next())
            .map(str::trim)
            .unwrap_or("");

        if !title.is_empty() {
            results.push(format!(
                "**{}**\n{}\nURL: {}",
                html_decode(title),
                html_decode(snippet),
                url
            ));
        }
    }

    results
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

/// Reduce an HTML document to whitespace-normalized text.
fn html_to_text(html: &str) -> String {
    let mut text = html.to_string();

    for (open, close) in [("<script", "</script>"), ("<style", "</style>")] {
        while let Some(start) = text.find(open) {
            match text[start..].find(close) {
                Some(end) => text.replace_range(start..start + end + close.len(), ""),
                None => break,
            }
        }
    }

    let mut stripped = String::new();
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                stripped.push(' ');
            }
            _ if !in_tag => stripped.push(c),
            _ => {}
        }
    }

    let normalized = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    html_decode(&normalized)
}
