pub mod images;
pub mod panels;
pub mod reconcile;
pub mod validation;

pub use images::{ImageSelection, NewImage, MAX_IMAGES};
pub use panels::{CategoriesPanel, ContactPanel, PropertiesPanel};
pub use validation::{CategoryForm, ContactInfoForm, PropertyForm};

use tracing::{error, info, warn};

use crate::api::{ApiClient, FetchMode};
use crate::filters::FilterCriteria;
use crate::session::Session;

/// Where the caller should go instead of the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Login,
}

/// The admin dashboard: three panels loaded together behind the session gate
pub struct AdminConsole {
    client: ApiClient,
    pub properties: PropertiesPanel,
    pub categories: CategoriesPanel,
    pub contact: ContactPanel,
}

impl AdminConsole {
    /// Open the dashboard. Unauthenticated sessions are sent to login.
    pub async fn open(session: &Session) -> std::result::Result<Self, OpenError> {
        if !session.is_authenticated() {
            warn!("Admin console requested without a session");
            return Err(OpenError::Redirect(Redirect::Login));
        }

        let client = session.client().clone();
        let all = FilterCriteria::default();
        let (properties, contact, categories) = tokio::join!(
            client.get_properties(&all, FetchMode::NoStore),
            client.get_contact_info(FetchMode::NoStore),
            client.get_categories(FetchMode::NoStore),
        );

        // A failed load leaves only that panel empty
        let properties = properties.map(|page| page.results).unwrap_or_else(|e| {
            error!("Error loading properties: {}", e);
            Vec::new()
        });
        let categories = categories.map(|page| page.results).unwrap_or_else(|e| {
            error!("Error loading categories: {}", e);
            Vec::new()
        });
        let contact = contact
            .map_err(|e| error!("Error loading contact info: {}", e))
            .ok();

        info!(
            "Admin console loaded: {} properties, {} categories",
            properties.len(),
            categories.len()
        );

        Ok(Self {
            client,
            properties: PropertiesPanel::new(properties),
            categories: CategoriesPanel::new(categories),
            contact: ContactPanel::new(contact),
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("login required")]
    Redirect(Redirect),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::api::transport::fake::{FakeTransport, BASE};
    use crate::api::{Method, RawResponse};
    use crate::models::fixtures;
    use crate::session::claims::token_expiring_at;
    use crate::session::store::{MemoryTokenStore, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

    async fn signed_in(transport: Arc<FakeTransport>) -> Session {
        let store = Arc::new(MemoryTokenStore::new());
        let access = token_expiring_at(4_102_444_800);
        store
            .set(&[(ACCESS_TOKEN_KEY, access.as_str()), (REFRESH_TOKEN_KEY, "r")])
            .unwrap();
        let mut session = Session::new(ApiClient::new(BASE, transport, store.clone()), store);
        session.check_session().await;
        session
    }

    fn empty_page() -> RawResponse {
        RawResponse::json(200, json!({"count": 0, "next": null, "previous": null, "results": []}))
    }

    #[tokio::test]
    async fn test_unauthenticated_is_redirected_without_requests() {
        let transport = Arc::new(FakeTransport::new());
        let store = Arc::new(MemoryTokenStore::new());
        let mut session = Session::new(ApiClient::new(BASE, transport.clone(), store.clone()), store);
        session.check_session().await;

        let result = AdminConsole::open(&session).await;

        assert!(matches!(result, Err(OpenError::Redirect(Redirect::Login))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_loads_all_three_panels() {
        let transport = Arc::new(FakeTransport::new());
        transport.on(Method::Get, "/properties/", empty_page());
        transport.on(Method::Get, "/categories/", empty_page());
        transport.on(
            Method::Get,
            "/contact-info/",
            RawResponse::json(200, json!({"id": 1, "phone_number": "1", "email": "a@b.co", "whatsapp_number": "1"})),
        );

        let store = Arc::new(MemoryTokenStore::new());
        let access = token_expiring_at(4_102_444_800);
        store
            .set(&[(ACCESS_TOKEN_KEY, access.as_str()), (REFRESH_TOKEN_KEY, "r")])
            .unwrap();
        let mut session = Session::new(ApiClient::new(BASE, transport.clone(), store.clone()), store);
        session.check_session().await;

        let console = AdminConsole::open(&session).await.unwrap();

        assert_eq!(console.contact.info().map(|i| i.id), Some(1));
        assert_eq!(transport.requests().len(), 3);
        let bearer = format!("Bearer {access}");
        assert!(transport
            .requests()
            .iter()
            .all(|r| r.header("Authorization") == Some(bearer.as_str())));
    }

    #[tokio::test]
    async fn test_missing_contact_record_leaves_other_panels_usable() {
        let transport = Arc::new(FakeTransport::new());
        transport.on(
            Method::Get,
            "/properties/",
            RawResponse::json(200, json!({"count": 1, "next": null, "previous": null, "results": [fixtures::property(4, "Loft")]})),
        );
        transport.on(Method::Get, "/contact-info/", empty_page());
        transport.on(
            Method::Get,
            "/categories/",
            RawResponse::json(502, json!({"detail": "upstream"})),
        );
        let session = signed_in(transport.clone()).await;

        let console = AdminConsole::open(&session).await.unwrap();

        assert_eq!(console.properties.items().len(), 1);
        assert!(console.categories.items().is_empty());
        assert!(console.contact.info().is_none());
        assert!(console.contact.form().email.is_empty());
    }
}
