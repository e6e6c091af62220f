use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use super::transport::{ApiRequest, Body, FormPart, Method, RawResponse, Transport};
use crate::error::{ApiError, Result};
use crate::filters::FilterCriteria;
use crate::models::{Category, ContactInfo, Page, Property, RefreshedTokens, TokenPair};
use crate::session::store::{TokenStore, ACCESS_TOKEN_KEY};

/// Whether a read may be served from an HTTP cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    #[default]
    Default,
    NoStore,
}

/// Client for the listings REST API.
///
/// Cheap to clone; clones share the transport and the token store.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.to_string())
    }

    /// `Bearer <access>` when a token is stored; the header is omitted otherwise
    fn auth_header(&self) -> Option<(String, String)> {
        self.tokens
            .get(ACCESS_TOKEN_KEY)
            .map(|token| ("Authorization".to_string(), format!("Bearer {token}")))
    }

    fn request(&self, method: Method, url: String, body: Body, mode: FetchMode) -> ApiRequest {
        let mut headers: Vec<(String, String)> = self.auth_header().into_iter().collect();

        // Multipart bodies get their content type (and boundary) from the transport
        if !matches!(body, Body::Multipart(_)) {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

        ApiRequest {
            method,
            url,
            headers,
            body,
            no_store: mode == FetchMode::NoStore,
        }
    }

    /// Send a request and apply the response contract
    pub async fn execute(&self, request: ApiRequest) -> Result<Option<Value>> {
        let method = request.method;
        let url = request.url.clone();

        let response = self.transport.send(request).await?;
        let result = handle_response(response);

        match &result {
            Ok(_) => debug!("{} {} ok", method.as_str(), url),
            Err(e) => warn!("{} {} failed: {}", method.as_str(), url, e),
        }
        result
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let value = self
            .execute(request)
            .await?
            .ok_or_else(|| ApiError::Decode("expected a JSON body".to_string()))?;
        Ok(serde_json::from_value(value)?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        mode: FetchMode,
    ) -> Result<T> {
        let url = self.url(path, query)?;
        self.fetch(self.request(Method::Get, url, Body::Empty, mode))
            .await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: Value,
    ) -> Result<T> {
        let url = self.url(path, &[])?;
        self.fetch(self.request(method, url, Body::Json(payload), FetchMode::Default))
            .await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path, &[])?;
        self.execute(self.request(Method::Delete, url, Body::Empty, FetchMode::Default))
            .await?;
        Ok(())
    }

    // ----- Authentication -----

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair> {
        let url = self.url("/admin/login/", &[])?;
        let request = ApiRequest {
            method: Method::Post,
            url,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Body::Json(json!({ "username": username, "password": password })),
            no_store: true,
        };
        self.fetch(request).await
    }

    pub async fn refresh_token(&self, refresh: &str) -> Result<RefreshedTokens> {
        let url = self.url("/admin/token/refresh/", &[])?;
        let request = ApiRequest {
            method: Method::Post,
            url,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Body::Json(json!({ "refresh": refresh })),
            no_store: true,
        };
        self.fetch(request).await
    }

    // ----- Properties -----

    pub async fn get_properties(
        &self,
        criteria: &FilterCriteria,
        mode: FetchMode,
    ) -> Result<Page<Property>> {
        self.get("/properties/", &criteria.query_pairs(), mode).await
    }

    pub async fn get_property(&self, slug: &str, mode: FetchMode) -> Result<Property> {
        self.get(&format!("/properties/{slug}/"), &[], mode).await
    }

    pub async fn create_property(&self, form: Vec<FormPart>) -> Result<Property> {
        let url = self.url("/properties/", &[])?;
        self.fetch(self.request(Method::Post, url, Body::Multipart(form), FetchMode::Default))
            .await
    }

    pub async fn update_property(&self, slug: &str, form: Vec<FormPart>) -> Result<Property> {
        let url = self.url(&format!("/properties/{slug}/"), &[])?;
        self.fetch(self.request(Method::Put, url, Body::Multipart(form), FetchMode::Default))
            .await
    }

    /// Delete by id. The delete route is slug-keyed, so the slug is looked up first.
    pub async fn delete_property(&self, id: u64) -> Result<()> {
        let slug = self
            .lookup_slug::<Property>("/properties/", id, "Property", |p| p.slug)
            .await?;

        info!("Deleting property {} ({})", id, slug);
        self.delete(&format!("/properties/{slug}/")).await
    }

    // ----- Categories -----

    pub async fn get_categories(&self, mode: FetchMode) -> Result<Page<Category>> {
        self.get("/categories/", &[], mode).await
    }

    pub async fn get_category(&self, slug: &str, mode: FetchMode) -> Result<Category> {
        self.get(&format!("/categories/{slug}/"), &[], mode).await
    }

    pub async fn create_category(&self, name: &str) -> Result<Category> {
        self.send_json(Method::Post, "/categories/", json!({ "name": name }))
            .await
    }

    pub async fn update_category(&self, slug: &str, name: &str) -> Result<Category> {
        self.send_json(
            Method::Put,
            &format!("/categories/{slug}/"),
            json!({ "name": name }),
        )
        .await
    }

    /// Delete by id, refusing while any property still references the category
    pub async fn delete_category(&self, id: u64) -> Result<()> {
        let slug = self
            .lookup_slug::<Category>("/categories/", id, "Category", |c| c.slug)
            .await?;

        let dependents: Page<Property> = self
            .get("/properties/", &[("category", id.to_string())], FetchMode::NoStore)
            .await?;

        if !dependents.results.is_empty() {
            return Err(ApiError::Integrity(format!(
                "Cannot delete category that has properties ({} found). Please delete or reassign the properties first.",
                dependents.count.max(dependents.results.len() as u64)
            )));
        }

        info!("Deleting category {} ({})", id, slug);
        self.delete(&format!("/categories/{slug}/")).await
    }

    // ----- Contact info -----

    /// The site's contact record. Accepts a bare object or a one-row list.
    pub async fn get_contact_info(&self, mode: FetchMode) -> Result<ContactInfo> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Payload {
            Single(ContactInfo),
            Listed(Page<ContactInfo>),
        }

        match self.get::<Payload>("/contact-info/", &[], mode).await? {
            Payload::Single(info) => Ok(info),
            Payload::Listed(page) => page
                .results
                .into_iter()
                .next()
                .ok_or_else(|| ApiError::NotFound("Contact info".to_string())),
        }
    }

    pub async fn get_contact_info_by_id(&self, id: u64, mode: FetchMode) -> Result<ContactInfo> {
        self.get(&format!("/contact-info/{id}/"), &[], mode).await
    }

    pub async fn update_contact_info(&self, id: u64, payload: Value) -> Result<ContactInfo> {
        self.send_json(Method::Put, &format!("/contact-info/{id}/"), payload)
            .await
    }

    async fn lookup_slug<T: DeserializeOwned>(
        &self,
        path: &str,
        id: u64,
        what: &str,
        slug_of: impl Fn(T) -> String,
    ) -> Result<String> {
        let page: Page<T> = self
            .get(path, &[("id", id.to_string())], FetchMode::NoStore)
            .await?;

        page.results
            .into_iter()
            .next()
            .map(slug_of)
            .ok_or_else(|| ApiError::NotFound(what.to_string()))
    }
}

/// Turn a raw response into `Some(json)`, `None` (no JSON body) or an error
pub fn handle_response(response: RawResponse) -> Result<Option<Value>> {
    if !response.is_success() {
        return Err(match serde_json::from_slice::<Value>(&response.body) {
            Ok(body) => ApiError::Api {
                status: response.status,
                body,
            },
            Err(_) => ApiError::Status {
                status: response.status,
                status_text: response.status_text,
            },
        });
    }

    let is_json = response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("application/json"));

    if !is_json || response.body.is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_slice(&response.body)?))
}
