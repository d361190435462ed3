//! Submission Client for the ingestion API
//!
//! HTML results go out as a single `createArticle` call carrying the prepared
//! document. PDFs take three steps: request an upload slot, stream the file
//! from its origin to the signed URL, then create the article by file id.
//! Every call carries a freshly signed `auth` cookie.

pub mod auth;
pub mod graphql;

use anyhow::Context;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::utils::{PDF_CONTENT_TYPE, SUBMISSION_SOURCE};
use crate::validation::{ensure_allowed, guarded_redirect_policy};

pub use auth::TokenSigner;
use graphql::{
    CREATE_ARTICLE, CreateArticleData, CreateArticleInput, GraphqlRequest, GraphqlResponse,
    PageInfo, PreparedDocument, UPLOAD_FILE_REQUEST, UploadFileRequestData,
    UploadFileRequestInput, Variables,
};

/// An extracted HTML document ready for ingestion
#[derive(Debug, Clone, Copy)]
pub struct DocumentSubmission<'a> {
    pub url: &'a Url,
    pub save_request_id: Option<&'a str>,
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
}

#[derive(Clone)]
pub struct IngestionClient {
    http: reqwest::Client,
    graphql_url: Url,
    signer: TokenSigner,
}

impl IngestionClient {
    /// # Errors
    ///
    /// `FetchError::Config` if the GraphQL URL cannot be derived or the HTTP
    /// client cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .redirect(guarded_redirect_policy())
            .build()
            .map_err(|e| FetchError::Config(format!("Failed to build ingestion HTTP client: {e}")))?;

        Ok(Self {
            http,
            graphql_url: graphql_url(config.api_base())?,
            signer: TokenSigner::new(config.jwt_secret()),
        })
    }

    /// Submit extracted HTML; `skipParsing` is set when no content was captured
    ///
    /// # Errors
    ///
    /// `FetchError::Submission` on transport failure, GraphQL errors or an
    /// error union result.
    pub async fn submit_document(
        &self,
        user_id: Option<&str>,
        submission: DocumentSubmission<'_>,
    ) -> Result<String, FetchError> {
        let content = submission.content.filter(|c| !c.is_empty());
        let input = CreateArticleInput {
            url: submission.url.as_str(),
            article_saving_request_id: submission.save_request_id,
            prepared_document: Some(PreparedDocument {
                document: content,
                page_info: PageInfo {
                    title: submission.title,
                    canonical_url: submission.url.as_str(),
                },
            }),
            skip_parsing: Some(content.is_none()),
            upload_file_id: None,
            source: SUBMISSION_SOURCE,
        };
        self.create_article(user_id, input).await
    }

    /// Upload the PDF at `url` and create an article referencing it
    ///
    /// # Errors
    ///
    /// `FetchError::InvalidUrl` if `url` fails validation; otherwise
    /// `FetchError::Submission` for any failed step.
    pub async fn submit_pdf(
        &self,
        user_id: Option<&str>,
        url: &Url,
        save_request_id: Option<&str>,
    ) -> Result<String, FetchError> {
        ensure_allowed(url)?;

        let (upload_id, signed_url) = self
            .request_upload_slot(user_id, url, save_request_id)
            .await?;
        self.upload_pdf(url, &signed_url).await?;

        let input = CreateArticleInput {
            url: url.as_str(),
            article_saving_request_id: save_request_id,
            prepared_document: None,
            skip_parsing: None,
            upload_file_id: Some(&upload_id),
            source: SUBMISSION_SOURCE,
        };
        self.create_article(user_id, input).await
    }

    async fn request_upload_slot(
        &self,
        user_id: Option<&str>,
        url: &Url,
        save_request_id: Option<&str>,
    ) -> Result<(String, String), FetchError> {
        let input = UploadFileRequestInput {
            url: url.as_str(),
            content_type: PDF_CONTENT_TYPE,
            client_request_id: save_request_id,
        };
        let data: UploadFileRequestData = self
            .execute(user_id, "uploadFileRequest", UPLOAD_FILE_REQUEST, input)
            .await?;
        let result = data.upload_file_request;

        match (result.id, result.upload_signed_url) {
            (Some(id), Some(signed_url)) if result.error_codes.is_empty() => {
                debug!("Upload slot {} granted for {}", id, url);
                Ok((id, signed_url))
            }
            _ => Err(FetchError::Submission(format!(
                "uploadFileRequest rejected: {}",
                result.error_codes.join(", ")
            ))),
        }
    }

    /// Stream the PDF from its origin straight into the signed upload URL
    async fn upload_pdf(&self, source: &Url, signed_url: &str) -> Result<(), FetchError> {
        let download = self
            .http
            .get(source.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| FetchError::Submission(format!("Failed to download PDF {source}: {e}")))?;

        self.http
            .put(signed_url)
            .header(CONTENT_TYPE, PDF_CONTENT_TYPE)
            .body(reqwest::Body::wrap_stream(download.bytes_stream()))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| FetchError::Submission(format!("Failed to upload PDF: {e}")))?;

        info!("Uploaded PDF from {}", source);
        Ok(())
    }

    async fn create_article(
        &self,
        user_id: Option<&str>,
        input: CreateArticleInput<'_>,
    ) -> Result<String, FetchError> {
        let data: CreateArticleData = self
            .execute(user_id, "createArticle", CREATE_ARTICLE, input)
            .await?;
        let result = data.create_article;

        match result.created_article {
            Some(article) if result.error_codes.is_empty() => {
                info!("Created article {}", article.id);
                Ok(article.id)
            }
            _ => Err(FetchError::Submission(format!(
                "createArticle rejected: {}",
                result.error_codes.join(", ")
            ))),
        }
    }

    async fn execute<V, T>(
        &self,
        user_id: Option<&str>,
        operation: &str,
        query: &'static str,
        input: V,
    ) -> Result<T, FetchError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let token = self.signer.sign(user_id)?;
        let body = GraphqlRequest {
            query,
            variables: Variables { input },
        };

        let response: GraphqlResponse<T> = async {
            self.http
                .post(self.graphql_url.clone())
                .header(COOKIE, format!("auth={token};"))
                .json(&body)
                .send()
                .await
                .context("request failed")?
                .error_for_status()
                .context("ingestion API returned an error status")?
                .json()
                .await
                .context("response is not valid GraphQL JSON")
        }
        .await
        .map_err(|e: anyhow::Error| FetchError::Submission(format!("{operation}: {e:#}")))?;

        if !response.errors.is_empty() {
            let messages: Vec<_> = response.errors.into_iter().map(|e| e.message).collect();
            return Err(FetchError::Submission(format!(
                "{operation}: {}",
                messages.join("; ")
            )));
        }

        response
            .data
            .ok_or_else(|| FetchError::Submission(format!("{operation}: response has no data")))
    }
}

fn graphql_url(api_base: &Url) -> Result<Url, FetchError> {
    let mut base = api_base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("graphql")
        .map_err(|e| FetchError::Config(format!("Invalid ingestion API base {api_base}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphql_url_appends_to_base_path() {
        let base = Url::parse("https://api.example.com").expect("url");
        assert_eq!(graphql_url(&base).expect("url").as_str(), "https://api.example.com/graphql");

        let base = Url::parse("https://example.com/api").expect("url");
        assert_eq!(graphql_url(&base).expect("url").as_str(), "https://example.com/api/graphql");
    }
}
