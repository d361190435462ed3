use anyhow::Result;
use futures::future::BoxFuture;
use url::Url;

use super::{Handler, PartialResult};
use crate::utils::file_name;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];

/// Wraps a direct image link in a minimal document
pub struct ImageHandler;

impl Handler for ImageHandler {
    fn name(&self) -> &'static str {
        "image"
    }

    fn should_prehandle(&self, url: &Url) -> bool {
        let path = url.path().to_ascii_lowercase();
        path.rsplit_once('.')
            .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext))
    }

    fn prehandle<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<PartialResult>> {
        Box::pin(async move {
            let title = file_name(url).unwrap_or_else(|| url.to_string());
            let escaped_title = html_escape::encode_text(&title);
            let src = html_escape::encode_double_quoted_attribute(url.as_str());

            let content = format!(
                r#"<html>
  <head>
    <title>{escaped_title}</title>
    <meta property="og:image" content="{src}" />
    <meta property="og:title" content="{escaped_title}" />
    <meta property="og:type" content="image" />
  </head>
  <body>
    <div>
      <img src="{src}" alt="{alt}">
    </div>
  </body>
</html>"#,
                alt = html_escape::encode_double_quoted_attribute(&title),
            );

            Ok(PartialResult {
                title: Some(title),
                content: Some(content),
                ..PartialResult::default()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_extensions() {
        for (input, expected) in [
            ("https://example.com/a/photo.JPG", true),
            ("https://example.com/logo.svg?v=2", true),
            ("https://example.com/anim.webp", true),
            ("https://example.com/article.html", false),
            ("https://example.com/png", false),
        ] {
            let url = Url::parse(input).expect("url");
            assert_eq!(ImageHandler.should_prehandle(&url), expected, "{input}");
        }
    }

    #[tokio::test]
    async fn builds_document_titled_with_file_name() {
        let url = Url::parse("https://example.com/media/sunset%20beach.png").expect("url");
        let partial = ImageHandler.prehandle(&url).await.expect("prehandle");

        assert!(partial.has_document());
        assert_eq!(partial.title.as_deref(), Some("sunset beach.png"));
        let content = partial.content.expect("content");
        assert!(content.contains(r#"<img src="https://example.com/media/sunset%20beach.png""#));
    }
}
