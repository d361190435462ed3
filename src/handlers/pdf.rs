use anyhow::Result;
use futures::future::BoxFuture;
use url::Url;

use super::{Handler, PartialResult};
use crate::utils::PDF_CONTENT_TYPE;

/// Marks `.pdf` URLs so they go straight to the upload path
pub struct PdfHandler;

impl Handler for PdfHandler {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn should_prehandle(&self, url: &Url) -> bool {
        url.path().to_ascii_lowercase().ends_with(".pdf")
    }

    fn prehandle<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, Result<PartialResult>> {
        Box::pin(async {
            Ok(PartialResult {
                content_type: Some(PDF_CONTENT_TYPE.to_string()),
                ..PartialResult::default()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_pdf_paths_only() {
        let yes = Url::parse("https://example.com/papers/attention.PDF?dl=1").expect("url");
        let no = Url::parse("https://example.com/pdf/overview").expect("url");
        assert!(PdfHandler.should_prehandle(&yes));
        assert!(!PdfHandler.should_prehandle(&no));
        assert!(!PdfHandler.should_resolve(&yes));
    }

    #[tokio::test]
    async fn prehandle_sets_pdf_content_type() {
        let url = Url::parse("https://example.com/a.pdf").expect("url");
        let partial = PdfHandler.prehandle(&url).await.expect("prehandle");
        assert!(partial.is_pdf());
        assert!(partial.title.is_none());
    }
}
