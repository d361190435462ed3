//! GraphQL documents and wire types for the ingestion API

use serde::{Deserialize, Serialize};

pub const UPLOAD_FILE_REQUEST: &str = r"mutation UploadFileRequest($input: UploadFileRequestInput!) {
  uploadFileRequest(input: $input) {
    ... on UploadFileRequestError {
      errorCodes
    }
    ... on UploadFileRequestSuccess {
      id
      uploadSignedUrl
    }
  }
}";

pub const CREATE_ARTICLE: &str = r"mutation CreateArticle($input: CreateArticleInput!) {
  createArticle(input: $input) {
    ... on CreateArticleSuccess {
      createdArticle {
        id
      }
    }
    ... on CreateArticleError {
      errorCodes
    }
  }
}";

#[derive(Debug, Serialize)]
pub struct GraphqlRequest<V: Serialize> {
    pub query: &'static str,
    pub variables: Variables<V>,
}

#[derive(Debug, Serialize)]
pub struct Variables<V: Serialize> {
    pub input: V,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileRequestInput<'a> {
    pub url: &'a str,
    pub content_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_request_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo<'a> {
    pub title: Option<&'a str>,
    pub canonical_url: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedDocument<'a> {
    pub document: Option<&'a str>,
    pub page_info: PageInfo<'a>,
}

/// Create-article input; exactly one of `prepared_document` / `upload_file_id` is set
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleInput<'a> {
    pub url: &'a str,
    pub article_saving_request_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepared_document: Option<PreparedDocument<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_parsing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_file_id: Option<&'a str>,
    pub source: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileRequestData {
    pub upload_file_request: UploadFileRequestResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileRequestResult {
    pub id: Option<String>,
    pub upload_signed_url: Option<String>,
    #[serde(default)]
    pub error_codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleData {
    pub create_article: CreateArticleResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleResult {
    pub created_article: Option<CreatedArticle>,
    #[serde(default)]
    pub error_codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedArticle {
    pub id: String,
}
