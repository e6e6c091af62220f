use tracing::{info, warn};

use super::{encode_component, format_currency, format_listed_date};
use crate::api::{ApiClient, FetchMode};
use crate::error::{ApiError, Result};
use crate::models::{ContactInfo, Property, PropertyImage};

/// Image carousel state; previous/next wrap around
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gallery {
    len: usize,
    current: usize,
}

impl Gallery {
    pub fn new(len: usize) -> Self {
        Self { len, current: 0 }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Arrows and thumbnails only show with more than one image
    pub fn has_controls(&self) -> bool {
        self.len > 1
    }

    pub fn previous(&mut self) {
        if self.len > 0 {
            self.current = if self.current == 0 { self.len - 1 } else { self.current - 1 };
        }
    }

    pub fn next(&mut self) {
        if self.len > 0 {
            self.current = (self.current + 1) % self.len;
        }
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.current = index;
        true
    }
}

/// Inquiry actions for one property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactLinks {
    pub whatsapp: String,
    pub phone: String,
    pub email: String,
}

impl ContactLinks {
    pub fn new(title: &str, contact: &ContactInfo) -> Self {
        let title = encode_component(title);
        Self {
            whatsapp: whatsapp_link(&contact.whatsapp_number, &title),
            phone: format!("tel:{}", contact.phone_number),
            email: format!("mailto:{}?subject=Inquiry about {}", contact.email, title),
        }
    }
}

pub(crate) fn whatsapp_link(number: &str, encoded_title: &str) -> String {
    format!("https://wa.me/{number}?text=I%20am%20interested%20in%20{encoded_title}")
}

/// Single-listing page
#[derive(Debug, Clone)]
pub struct PropertyDetail {
    pub property: Property,
    pub contact: ContactInfo,
    pub gallery: Gallery,
}

impl PropertyDetail {
    /// Fetch the property and the contact details. A missing or failing
    /// property maps to `NotFound`.
    pub async fn load(client: &ApiClient, slug: &str, mode: FetchMode) -> Result<Self> {
        let property = client.get_property(slug, mode).await.map_err(|e| {
            warn!("Property {} unavailable: {}", slug, e);
            ApiError::NotFound(format!("Property {slug}"))
        })?;
        let contact = client.get_contact_info(mode).await?;

        info!("Loaded property {} with {} images", property.slug, property.images.len());

        Ok(Self {
            gallery: Gallery::new(property.images.len()),
            property,
            contact,
        })
    }

    pub fn current_image(&self) -> Option<&PropertyImage> {
        self.property.images.get(self.gallery.current())
    }

    pub fn price_label(&self) -> String {
        format_currency(self.property.price)
    }

    pub fn listed_on(&self) -> String {
        format!("Listed on {}", format_listed_date(&self.property.created_at))
    }

    pub fn contact_links(&self) -> ContactLinks {
        ContactLinks::new(&self.property.title, &self.contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::api::transport::fake::{FakeTransport, BASE};
    use crate::api::{Method, RawResponse};
    use crate::models::fixtures;
    use crate::session::store::MemoryTokenStore;

    fn contact() -> ContactInfo {
        ContactInfo {
            id: 1,
            phone_number: "+351210000000".to_string(),
            email: "sales@homes.pt".to_string(),
            whatsapp_number: "351910000000".to_string(),
        }
    }

    #[test]
    fn test_gallery_wraps_both_ways() {
        let mut gallery = Gallery::new(3);
        gallery.previous();
        assert_eq!(gallery.current(), 2);
        gallery.next();
        assert_eq!(gallery.current(), 0);
        assert!(gallery.select(1));
        assert!(!gallery.select(3));
        assert_eq!(gallery.current(), 1);
    }

    #[test]
    fn test_empty_gallery_stays_put() {
        let mut gallery = Gallery::new(0);
        gallery.next();
        gallery.previous();
        assert_eq!(gallery.current(), 0);
        assert!(!gallery.has_controls());
    }

    #[test]
    fn test_contact_links_encode_title() {
        let links = ContactLinks::new("Loft & terrace", &contact());
        assert_eq!(
            links.whatsapp,
            "https://wa.me/351910000000?text=I%20am%20interested%20in%20Loft%20%26%20terrace"
        );
        assert_eq!(links.phone, "tel:+351210000000");
        assert_eq!(links.email, "mailto:sales@homes.pt?subject=Inquiry about Loft%20%26%20terrace");
    }

    #[tokio::test]
    async fn test_missing_property_is_not_found() {
        let transport = Arc::new(FakeTransport::new());
        let client = ApiClient::new(BASE, transport, Arc::new(MemoryTokenStore::new()));

        let err = PropertyDetail::load(&client, "gone", FetchMode::NoStore).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_load_detail() {
        let transport = Arc::new(FakeTransport::new());
        let property = fixtures::property(3, "Loft");
        transport.on(
            Method::Get,
            &format!("/properties/{}/", property.slug),
            RawResponse::json(200, serde_json::to_value(&property).unwrap()),
        );
        transport.on(Method::Get, "/contact-info/", RawResponse::json(200, json!(contact())));
        let client = ApiClient::new(BASE, transport, Arc::new(MemoryTokenStore::new()));

        let detail = PropertyDetail::load(&client, &property.slug, FetchMode::Default).await.unwrap();

        assert_eq!(detail.price_label(), "$250,000");
        assert_eq!(detail.listed_on(), "Listed on March 5, 2024");
        assert!(detail.current_image().is_none());
    }
}
