//! Release index scraping.
//!
//! The release server publishes no machine-readable manifest, only an HTML
//! listing shaped like this:
//!
//! ```html
//! <ul>
//!   <li><a href="../">../</a></li>
//!   <li>
//!     <a href="/terraform/1.9.2/">terraform_1.9.2</a>
//!   </li>
//! </ul>
//! ```
//!
//! [`parse_release_index`] walks the markup as a token stream and, for each
//! `<li>`, takes the first text token of the form `terraform_<version>`.
//!
//! ## Contract risk
//!
//! This is coupled to the page's markup. If the listing stops using `<li>`
//! items or changes the link text, parsing silently yields zero or wrong
//! versions rather than an error. Callers treat an empty catalog as an
//! error ([`TfgetError::EmptyCatalog`]) so at least total breakage is loud.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::{debug, info, warn};

use crate::config::{Config, PRODUCT};
use crate::errors::{Result, TfgetError};
use crate::toolchain::download::http_client;
use crate::toolchain::version::{ReleaseCatalog, VersionId};

/// Fetches the release index and returns its versions, newest first.
///
/// # Errors
///
/// Returns [`TfgetError::Network`] if the request fails, times out or the
/// server answers with a non-success status. There is no retry.
pub async fn fetch_release_index(config: &Config) -> Result<ReleaseCatalog> {
    let url = config.index_url();
    info!(%url, "Fetching release index");

    let client = http_client(config)?;
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| TfgetError::network_with_source(format!("failed to fetch {url}"), e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TfgetError::network(format!("HTTP error {status}: {url}")));
    }

    let markup = response
        .text()
        .await
        .map_err(|e| TfgetError::network_with_source(format!("failed to read {url}"), e))?;

    let catalog = ReleaseCatalog::from_unsorted(parse_release_index(&markup, PRODUCT));
    debug!(versions = catalog.len(), "Parsed release index");
    Ok(catalog)
}

/// Extracts `<product>_<version>` link texts found inside `<li>` elements.
///
/// Tolerates malformed HTML: unclosed and unmatched tags are accepted,
/// `<script>` and `<style>` bodies are skipped as raw text, and a tokenizer
/// error ends the scan keeping what was found so far. Versions are returned
/// in document order; sorting is the catalog's job.
#[must_use]
pub fn parse_release_index(markup: &str, product: &str) -> Vec<VersionId> {
    let prefix = format!("{product}_");
    let markup = strip_raw_text(markup);

    let mut reader = Reader::from_str(&markup);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.trim_text(true);

    let mut versions = Vec::new();
    // Inside an <li> that has not produced a version yet.
    let mut in_item = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) if is_list_item(tag.local_name().as_ref()) => {
                in_item = true;
            }
            Ok(Event::End(tag)) if is_list_item(tag.local_name().as_ref()) => {
                in_item = false;
            }
            Ok(Event::Text(text)) if in_item => {
                let text = String::from_utf8_lossy(&text);
                if let Some(version) = version_from_link_text(text.trim(), &prefix) {
                    versions.push(version);
                    in_item = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(
                    position = reader.error_position(),
                    error = %e,
                    "Release index markup could not be tokenized further"
                );
                break;
            }
            Ok(_) => {}
        }
    }

    versions
}

/// Elements whose content HTML treats as text, not markup. A `<` in there
/// (`console.log("a<b")`) would otherwise open a bogus tag and swallow the
/// rest of the page.
const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

/// Removes the bodies of raw-text elements, keeping their start and end tags.
///
/// An element that is never closed runs to the end of the document, as in a
/// browser.
fn strip_raw_text(markup: &str) -> String {
    // ASCII lowercasing keeps byte offsets, so indices found in `lower` are
    // valid in `markup`.
    let lower = markup.to_ascii_lowercase();
    let mut stripped = String::with_capacity(markup.len());
    let mut pos = 0;

    while let Some((body_start, name)) = next_raw_text_body(&lower, pos) {
        stripped.push_str(&markup[pos..body_start]);
        match lower[body_start..].find(&format!("</{name}")) {
            Some(offset) => pos = body_start + offset,
            None => return stripped,
        }
    }

    stripped.push_str(&markup[pos..]);
    stripped
}

/// Finds the next raw-text start tag at or after `from`, returning the offset
/// just past its `>` and the element name.
fn next_raw_text_body(lower: &str, from: usize) -> Option<(usize, &'static str)> {
    let mut search = from;
    loop {
        let (tag_start, name) = RAW_TEXT_ELEMENTS
            .iter()
            .filter_map(|name| {
                lower[search..]
                    .find(&format!("<{name}"))
                    .map(|i| (search + i, *name))
            })
            .min_by_key(|(i, _)| *i)?;

        let after_name = tag_start + 1 + name.len();
        let boundary = lower[after_name..].chars().next();
        if matches!(boundary, Some(c) if c == '>' || c == '/' || c.is_ascii_whitespace()) {
            let tag_end = lower[after_name..].find('>')?;
            return Some((after_name + tag_end + 1, name));
        }
        // `<scripts>` or similar: not a raw-text element.
        search = after_name;
    }
}

fn is_list_item(name: &[u8]) -> bool {
    name.eq_ignore_ascii_case(b"li")
}

/// `terraform_1.9.2` gives `1.9.2`; anything else gives `None`.
fn version_from_link_text(text: &str, prefix: &str) -> Option<VersionId> {
    let version = text.strip_prefix(prefix)?.split('_').next()?;
    (!version.is_empty()).then(|| VersionId::new(version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::platform::Platform;
    use std::path::PathBuf;

    const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Terraform Versions | HashiCorp Releases</title>
  </head>
  <body>
    <ul>
      <li>
        <a href="../">../</a>
      </li>
      <li>
        <a href="/terraform/1.10.0-alpha20240606/">terraform_1.10.0-alpha20240606</a>
      </li>
      <li>
        <a href="/terraform/1.9.2/">terraform_1.9.2</a>
      </li>
      <li>
        <a href="/terraform/0.12.0/">terraform_0.12.0</a>
      </li>
      <li>
        <a href="/terraform/0.9.11/">terraform_0.9.11</a>
      </li>
    </ul>
  </body>
</html>
"#;

    fn strings(versions: &[VersionId]) -> Vec<&str> {
        versions.iter().map(VersionId::as_str).collect()
    }

    #[test]
    fn extracts_versions_in_document_order() {
        let versions = parse_release_index(INDEX_PAGE, "terraform");
        assert_eq!(
            strings(&versions),
            vec!["1.10.0-alpha20240606", "1.9.2", "0.12.0", "0.9.11"]
        );
    }

    #[test]
    fn tolerates_extra_tokens_inside_list_items() {
        let markup = r#"<ul>
            <li><span class="icon"></span> <em>new</em>
                <a href="/terraform/1.5.7/" data-x>terraform_1.5.7</a></li>
            <li><a href="/terraform/1.5.6/">terraform_1.5.6</a><br></li>
        </ul>"#;

        let versions = parse_release_index(markup, "terraform");
        assert_eq!(strings(&versions), vec!["1.5.7", "1.5.6"]);
    }

    #[test]
    fn ignores_matching_text_outside_list_items() {
        let markup = r#"<p>terraform_9.9.9</p><ul><li><a>terraform_1.0.0</a></li></ul>"#;
        let versions = parse_release_index(markup, "terraform");
        assert_eq!(strings(&versions), vec!["1.0.0"]);
    }

    #[test]
    fn takes_only_first_match_per_item() {
        let markup = r#"<li><a>terraform_1.0.0</a> <small>terraform_0.1.0</small></li>"#;
        let versions = parse_release_index(markup, "terraform");
        assert_eq!(strings(&versions), vec!["1.0.0"]);
    }

    #[test]
    fn changed_markup_yields_nothing() {
        let markup = r#"<table><tr><td><a>terraform_1.0.0</a></td></tr></table>"#;
        assert!(parse_release_index(markup, "terraform").is_empty());
    }

    #[test]
    fn keeps_versions_found_before_a_tokenizer_error() {
        let markup = r#"<ul><li><a>terraform_1.0.0</a></li><li><a>terraform_0.9.0</a></li><!-- unterminated"#;
        let versions = parse_release_index(markup, "terraform");
        assert_eq!(strings(&versions), vec!["1.0.0", "0.9.0"]);
    }

    #[test]
    fn quoted_angle_bracket_in_script_does_not_hide_versions() {
        let markup = r#"<html><head>
            <script>console.log("a<b");</script>
            <style>li::before { content: "<"; }</style>
        </head><body><ul>
            <li><a href="/terraform/1.9.2/">terraform_1.9.2</a></li>
            <li><a href="/terraform/1.9.1/">terraform_1.9.1</a></li>
        </ul></body></html>"#;

        let versions = parse_release_index(markup, "terraform");
        assert_eq!(strings(&versions), vec!["1.9.2", "1.9.1"]);
    }

    #[test]
    fn script_text_is_never_a_version() {
        let markup = r#"<ul><li><SCRIPT type="text/javascript">var v = "<li>terraform_9.9.9</li>";</SCRIPT>
            <a>terraform_1.0.0</a></li></ul>"#;

        let versions = parse_release_index(markup, "terraform");
        assert_eq!(strings(&versions), vec!["1.0.0"]);
    }

    #[test]
    fn unclosed_script_runs_to_end_of_document() {
        let markup = r#"<ul><li><a>terraform_1.0.0</a></li></ul><script>if (a < b) {"#;
        let versions = parse_release_index(markup, "terraform");
        assert_eq!(strings(&versions), vec!["1.0.0"]);
    }

    #[test]
    fn strip_raw_text_keeps_tags_and_other_markup() {
        assert_eq!(
            strip_raw_text(r#"<p>x</p><script async src="a.js">"<"</script><scripts>y</scripts>"#),
            r#"<p>x</p><script async src="a.js"></script><scripts>y</scripts>"#
        );
    }

    #[test]
    fn link_text_parsing() {
        assert_eq!(
            version_from_link_text("terraform_1.2.3", "terraform_"),
            Some(VersionId::new("1.2.3"))
        );
        assert_eq!(version_from_link_text("../", "terraform_"), None);
        assert_eq!(version_from_link_text("terraform_", "terraform_"), None);
        assert_eq!(version_from_link_text("packer_1.0.0", "terraform_"), None);
    }

    fn config_for(server: &mockito::Server) -> Config {
        let mut config = Config::with_root(PathBuf::from("/unused"), Platform::new("linux", "amd64"));
        config.releases_url = format!("{}/terraform", server.url());
        config
    }

    #[tokio::test]
    async fn fetch_release_index_returns_sorted_catalog() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/terraform/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(INDEX_PAGE)
            .create_async()
            .await;

        let catalog = fetch_release_index(&config_for(&server)).await.unwrap();

        mock.assert_async().await;
        let listed: Vec<&str> = catalog.iter().map(VersionId::as_str).collect();
        assert_eq!(
            listed,
            vec!["1.10.0-alpha20240606", "1.9.2", "0.12.0", "0.9.11"]
        );
    }

    #[tokio::test]
    async fn fetch_release_index_fails_on_server_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/terraform/")
            .with_status(503)
            .create_async()
            .await;

        let result = fetch_release_index(&config_for(&server)).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(TfgetError::Network { .. })));
    }

    #[tokio::test]
    async fn fetch_release_index_fails_when_unreachable() {
        let mut config = Config::with_root(PathBuf::from("/unused"), Platform::new("linux", "amd64"));
        config.releases_url = "http://127.0.0.1:1/terraform".to_string();

        let result = fetch_release_index(&config).await;
        assert!(matches!(result, Err(TfgetError::Network { .. })));
    }
}
