use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One image attached to a property listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyImage {
    pub id: u64,
    pub image: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Listing category, referenced by properties
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: u64,
    pub slug: String,
    pub name: String,
}

/// Core property data model, owned by the remote API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: u64,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "decimal_from_str_or_number")]
    pub price: f64,
    pub category: Category,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub images: Vec<PropertyImage>,
    #[serde(default)]
    pub primary_image: Option<PropertyImage>,
    pub created_at: DateTime<Utc>,
}

impl Property {
    /// "city, state, country" with empty parts skipped
    pub fn location_line(&self) -> String {
        [&self.city, &self.state, &self.country]
            .iter()
            .filter(|part| !part.trim().is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Thumbnail used on listing cards and admin tables
    pub fn card_thumbnail(&self) -> Option<&str> {
        self.primary_image
            .as_ref()
            .and_then(|img| img.thumbnail.as_deref().or(Some(img.image.as_str())))
    }
}

/// Contact details shown on detail pages and editable from the admin console
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactInfo {
    pub id: u64,
    pub phone_number: String,
    pub email: String,
    pub whatsapp_number: String,
}

/// Paginated list response: `{count, next, previous, results}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

/// Tokens returned by the login endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Refresh endpoint response; `refresh` is absent when the backend does not rotate
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedTokens {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Anything the admin panels keep in a local list
pub trait Identified {
    fn id(&self) -> u64;
}

impl Identified for Property {
    fn id(&self) -> u64 {
        self.id
    }
}

impl Identified for Category {
    fn id(&self) -> u64 {
        self.id
    }
}

/// The API serializes decimals as strings ("250000.00"); accept numbers too
fn decimal_from_str_or_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Number(f64),
        Text(String),
    }

    match Decimal::deserialize(deserializer)? {
        Decimal::Number(n) => Ok(n),
        Decimal::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_accepts_string_price() {
        let property: Property = serde_json::from_value(json!({
            "id": 7,
            "slug": "sea-view-7",
            "title": "Sea view",
            "description": "Two bedrooms",
            "price": "420000.50",
            "category": {"id": 2, "slug": "villa", "name": "Villa"},
            "city": "Porto",
            "state": "",
            "country": "Portugal",
            "images": [{"id": 1, "image": "/media/a.jpg", "thumbnail": "/media/a_t.jpg"}],
            "primary_image": {"id": 1, "image": "/media/a.jpg", "thumbnail": "/media/a_t.jpg"},
            "created_at": "2024-03-05T12:00:00Z"
        }))
        .unwrap();

        assert_eq!(property.price, 420000.5);
        assert_eq!(property.location_line(), "Porto, Portugal");
        assert_eq!(property.card_thumbnail(), Some("/media/a_t.jpg"));
    }

    #[test]
    fn test_page_flags() {
        let page: Page<Category> = serde_json::from_value(json!({
            "count": 30,
            "next": "http://api/categories/?page=2",
            "previous": null,
            "results": []
        }))
        .unwrap();

        assert!(page.has_next());
        assert!(!page.has_previous());
    }
}
