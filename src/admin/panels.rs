use tracing::{error, info};

use super::reconcile;
use super::validation::{CategoryForm, ContactInfoForm, PropertyForm};
use crate::api::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::{Category, ContactInfo, Property};

/// Properties tab: the local list plus the last inline error
#[derive(Debug, Clone, Default)]
pub struct PropertiesPanel {
    items: Vec<Property>,
    error: Option<String>,
}

impl PropertiesPanel {
    pub fn new(items: Vec<Property>) -> Self {
        Self { items, error: None }
    }

    pub fn items(&self) -> &[Property] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Validate, then create or update. Validation failures never reach the API.
    pub async fn submit(&mut self, client: &ApiClient, form: &mut PropertyForm) -> Result<Property> {
        if !form.validate() {
            return Err(ApiError::Validation(form.errors().clone()));
        }

        let parts = form.form_parts();
        let result = match form.editing() {
            Some((_, slug)) => client.update_property(slug, parts).await,
            None => client.create_property(parts).await,
        };

        match result {
            Ok(saved) => {
                self.items = match form.editing() {
                    Some(_) => reconcile::replace_by_id(&self.items, saved.clone()),
                    None => reconcile::insert_front(&self.items, saved.clone()),
                };
                info!("Saved property {} ({})", saved.id, saved.slug);
                Ok(saved)
            }
            Err(e) => {
                error!("Error submitting property: {}", e);
                form.set_error("submit", "Failed to save property. Please try again.");
                Err(e)
            }
        }
    }

    pub async fn delete(&mut self, client: &ApiClient, id: u64) -> Result<()> {
        self.error = None;
        match client.delete_property(id).await {
            Ok(()) => {
                self.items = reconcile::remove_by_id(&self.items, id);
                Ok(())
            }
            Err(e) => {
                error!("Error deleting property {}: {}", id, e);
                self.error = Some(format!("Failed to delete property: {e}"));
                Err(e)
            }
        }
    }
}

/// Categories tab
#[derive(Debug, Clone, Default)]
pub struct CategoriesPanel {
    items: Vec<Category>,
    error: Option<String>,
}

impl CategoriesPanel {
    pub fn new(items: Vec<Category>) -> Self {
        Self { items, error: None }
    }

    pub fn items(&self) -> &[Category] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn add(&mut self, client: &ApiClient, form: &mut CategoryForm) -> Result<Category> {
        if !form.validate() {
            return Err(ApiError::Validation(form.errors()));
        }

        match client.create_category(form.name.trim()).await {
            Ok(created) => {
                self.items = reconcile::append(&self.items, created.clone());
                Ok(created)
            }
            Err(e) => {
                error!("Error adding category: {}", e);
                form.set_error("Failed to add category. Please try again.");
                Err(e)
            }
        }
    }

    pub async fn rename(
        &mut self,
        client: &ApiClient,
        category: &Category,
        form: &mut CategoryForm,
    ) -> Result<Category> {
        if !form.validate() {
            return Err(ApiError::Validation(form.errors()));
        }

        match client.update_category(&category.slug, form.name.trim()).await {
            Ok(updated) => {
                self.items = reconcile::replace_by_id(&self.items, updated.clone());
                Ok(updated)
            }
            Err(e) => {
                error!("Error updating category: {}", e);
                form.set_error("Failed to update category. Please try again.");
                Err(e)
            }
        }
    }

    /// Refused with an integrity error while properties reference the category
    pub async fn delete(&mut self, client: &ApiClient, id: u64) -> Result<()> {
        self.error = None;
        match client.delete_category(id).await {
            Ok(()) => {
                self.items = reconcile::remove_by_id(&self.items, id);
                Ok(())
            }
            Err(e) => {
                error!("Error deleting category {}: {}", id, e);
                self.error = Some(match &e {
                    ApiError::Integrity(message) => message.clone(),
                    other => format!("Failed to delete category: {other}"),
                });
                Err(e)
            }
        }
    }
}

/// Contact information tab. Empty when the record could not be loaded.
#[derive(Debug, Clone, Default)]
pub struct ContactPanel {
    info: Option<ContactInfo>,
}

impl ContactPanel {
    pub fn new(info: Option<ContactInfo>) -> Self {
        Self { info }
    }

    pub fn info(&self) -> Option<&ContactInfo> {
        self.info.as_ref()
    }

    pub fn form(&self) -> ContactInfoForm {
        self.info
            .as_ref()
            .map(ContactInfoForm::from_contact)
            .unwrap_or_default()
    }

    pub async fn submit(&mut self, client: &ApiClient, form: &mut ContactInfoForm) -> Result<ContactInfo> {
        if !form.validate() {
            return Err(ApiError::Validation(form.errors().clone()));
        }

        let Some(id) = self.info.as_ref().map(|info| info.id) else {
            error!("No contact record loaded to update");
            form.set_error("submit", "Failed to update contact information. Please try again.");
            return Err(ApiError::NotFound("Contact info".to_string()));
        };

        match client.update_contact_info(id, form.payload()).await {
            Ok(updated) => {
                self.info = Some(updated.clone());
                form.set_success("Contact information updated successfully!");
                Ok(updated)
            }
            Err(e) => {
                error!("Error updating contact info: {}", e);
                form.set_error("submit", "Failed to update contact information. Please try again.");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::{json, Value};

    use crate::admin::images::{ImageSelection, NewImage};
    use crate::api::transport::fake::{FakeTransport, BASE};
    use crate::api::{Body, Method, RawResponse};
    use crate::models::fixtures;
    use crate::session::store::{MemoryTokenStore, TokenStore, ACCESS_TOKEN_KEY};

    fn client(transport: Arc<FakeTransport>) -> ApiClient {
        let store = Arc::new(MemoryTokenStore::new());
        store.set(&[(ACCESS_TOKEN_KEY, "tok")]).unwrap();
        ApiClient::new(BASE, transport, store)
    }

    fn listed(results: Value) -> RawResponse {
        let count = results.as_array().map(|a| a.len()).unwrap_or(0);
        RawResponse::json(200, json!({"count": count, "next": null, "previous": null, "results": results}))
    }

    fn as_json(property: &Property) -> Value {
        serde_json::to_value(property).unwrap()
    }

    fn valid_form() -> PropertyForm {
        let mut form = PropertyForm::new();
        for (k, v) in [
            ("title", "Harbour loft"),
            ("description", "Top floor"),
            ("price", "320000"),
            ("category", "1"),
            ("city", "Lisbon"),
            ("country", "Portugal"),
        ] {
            form.set(k, v);
        }
        form.attach(vec![NewImage::new("a.jpg", vec![1, 2, 3])]);
        form
    }

    #[tokio::test]
    async fn test_create_with_six_images_sends_nothing() {
        let transport = Arc::new(FakeTransport::new());
        let mut panel = PropertiesPanel::new(vec![fixtures::property(1, "A")]);
        let mut form = valid_form();
        form.images = ImageSelection::from_parts(
            vec![],
            (0..6).map(|i| NewImage::new(format!("{i}.jpg"), vec![0])).collect(),
        );

        let err = panel.submit(&client(transport.clone()), &mut form).await.unwrap_err();

        match err {
            ApiError::Validation(errors) => assert!(errors.get("images").is_some()),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(transport.requests().is_empty());
        assert_eq!(panel.items().len(), 1);
    }

    #[tokio::test]
    async fn test_create_inserts_at_front() {
        let transport = Arc::new(FakeTransport::new());
        let created = fixtures::property(9, "Harbour loft");
        transport.on(Method::Post, "/properties/", RawResponse::json(201, as_json(&created)));

        let mut panel = PropertiesPanel::new(vec![fixtures::property(1, "A"), fixtures::property(2, "B")]);
        let mut form = valid_form();
        panel.submit(&client(transport.clone()), &mut form).await.unwrap();

        let ids: Vec<u64> = panel.items().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![9, 1, 2]);

        match &transport.requests()[0].body {
            Body::Multipart(parts) => {
                assert!(parts.iter().any(|p| p.name() == "images"));
                assert!(parts.iter().any(|p| p.name() == "primary_image_index"));
            }
            other => panic!("expected multipart, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_replaces_in_place_via_slug_route() {
        let transport = Arc::new(FakeTransport::new());
        let original = fixtures::property(2, "B");
        let mut updated = original.clone();
        updated.title = "B, renovated".to_string();
        transport.on(
            Method::Put,
            &format!("/properties/{}/", original.slug),
            RawResponse::json(200, as_json(&updated)),
        );

        let mut panel = PropertiesPanel::new(vec![fixtures::property(1, "A"), original.clone()]);
        let mut form = PropertyForm::edit(&original);
        form.set("title", "B, renovated");
        panel.submit(&client(transport), &mut form).await.unwrap();

        assert_eq!(panel.items()[1].title, "B, renovated");
        assert_eq!(panel.items().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_save_sets_submit_error() {
        let transport = Arc::new(FakeTransport::new());
        transport.on(Method::Post, "/properties/", RawResponse::json(500, json!({"detail": "boom"})));

        let mut panel = PropertiesPanel::default();
        let mut form = valid_form();
        assert!(panel.submit(&client(transport), &mut form).await.is_err());
        assert_eq!(form.errors().get("submit"), Some("Failed to save property. Please try again."));
        assert!(panel.items().is_empty());
    }

    #[tokio::test]
    async fn test_delete_property_42() {
        let transport = Arc::new(FakeTransport::new());
        let target = fixtures::property(42, "Villa");
        transport.on(Method::Get, "/properties/?id=42", listed(json!([as_json(&target)])));
        transport.on(Method::Delete, &format!("/properties/{}/", target.slug), RawResponse::empty(204));

        let mut panel = PropertiesPanel::new(vec![
            fixtures::property(41, "A"),
            target.clone(),
            fixtures::property(43, "C"),
        ]);
        panel.delete(&client(transport.clone()), 42).await.unwrap();

        let ids: Vec<u64> = panel.items().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![41, 43]);
        assert_eq!(
            transport.calls(),
            vec!["GET /properties/?id=42".to_string(), format!("DELETE /properties/{}/", target.slug)]
        );
    }

    #[tokio::test]
    async fn test_category_delete_refused_keeps_list() {
        let transport = Arc::new(FakeTransport::new());
        let category = fixtures::category(1, "Apartment");
        transport.on(Method::Get, "/categories/?id=1", listed(json!([category.clone()])));
        transport.on(
            Method::Get,
            "/properties/?category=1",
            listed(json!([as_json(&fixtures::property(5, "A"))])),
        );

        let mut panel = CategoriesPanel::new(vec![category.clone()]);
        assert!(panel.delete(&client(transport.clone()), 1).await.is_err());

        assert_eq!(panel.items(), &[category]);
        assert!(panel.error().unwrap().contains("has properties"));
        assert!(transport.requests().iter().all(|r| r.method != Method::Delete));
    }

    #[tokio::test]
    async fn test_category_add_appends_and_rename_replaces() {
        let transport = Arc::new(FakeTransport::new());
        transport.on(
            Method::Post,
            "/categories/",
            RawResponse::json(201, json!({"id": 2, "slug": "villa", "name": "Villa"})),
        );
        transport.on(
            Method::Put,
            "/categories/villa/",
            RawResponse::json(200, json!({"id": 2, "slug": "villa", "name": "Villas"})),
        );
        let client = client(transport);

        let mut panel = CategoriesPanel::new(vec![fixtures::category(1, "Apartment")]);
        let created = panel.add(&client, &mut CategoryForm::new("Villa")).await.unwrap();
        assert_eq!(panel.items().last().map(|c| c.id), Some(2));

        panel.rename(&client, &created, &mut CategoryForm::new("Villas")).await.unwrap();
        assert_eq!(panel.items()[1].name, "Villas");
    }

    #[tokio::test]
    async fn test_contact_update_sets_success() {
        let transport = Arc::new(FakeTransport::new());
        let updated = json!({"id": 1, "phone_number": "+351 1", "email": "new@homes.pt", "whatsapp_number": "3511"});
        transport.on(Method::Put, "/contact-info/1/", RawResponse::json(200, updated));

        let mut panel = ContactPanel::new(Some(ContactInfo {
            id: 1,
            phone_number: "+351 1".to_string(),
            email: "old@homes.pt".to_string(),
            whatsapp_number: "3511".to_string(),
        }));
        let mut form = panel.form();
        form.set("email", "new@homes.pt");

        panel.submit(&client(transport), &mut form).await.unwrap();
        assert_eq!(panel.info().map(|i| i.email.as_str()), Some("new@homes.pt"));
        assert!(form.success().is_some());
    }

    #[tokio::test]
    async fn test_contact_submit_without_record_sends_nothing() {
        let transport = Arc::new(FakeTransport::new());
        let mut panel = ContactPanel::new(None);
        let mut form = panel.form();
        form.set("phone_number", "+351 2");
        form.set("email", "sales@homes.pt");
        form.set("whatsapp_number", "3512");

        let err = panel.submit(&client(transport.clone()), &mut form).await.unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(form.errors().get("submit").is_some());
        assert!(transport.requests().is_empty());
    }
}
