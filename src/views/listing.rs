use tracing::info;

use super::detail::whatsapp_link;
use super::{encode_component, format_currency};
use crate::api::{ApiClient, FetchMode};
use crate::error::Result;
use crate::filters::{FilterCriteria, Location, Pagination};
use crate::models::{ContactInfo, Page, Property};

/// What a listing card shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyCard {
    pub title: String,
    pub price: String,
    pub category: String,
    pub location: String,
    pub href: String,
    pub thumbnail: Option<String>,
    pub whatsapp: String,
}

impl PropertyCard {
    pub fn new(property: &Property, contact: &ContactInfo) -> Self {
        Self {
            title: property.title.clone(),
            price: format_currency(property.price),
            category: property.category.name.clone(),
            location: property.location_line(),
            href: format!("/property/{}", property.slug),
            thumbnail: property.card_thumbnail().map(str::to_string),
            whatsapp: whatsapp_link(&contact.whatsapp_number, &encode_component(&property.title)),
        }
    }
}

/// One page of the listing grid, driven by the location's filters
#[derive(Debug, Clone)]
pub struct ListingView {
    pub criteria: FilterCriteria,
    pub page: Page<Property>,
    pub contact: ContactInfo,
    pub pagination: Option<Pagination>,
}

impl ListingView {
    pub async fn load(
        client: &ApiClient,
        location: &Location,
        fallback_page_size: usize,
        mode: FetchMode,
    ) -> Result<Self> {
        let criteria = location.criteria();

        let (page, contact) = tokio::try_join!(
            client.get_properties(&criteria, mode),
            client.get_contact_info(mode),
        )?;

        info!(
            "Listing page {}: {} of {} properties ({})",
            criteria.current_page(),
            page.results.len(),
            page.count,
            criteria
        );

        let pagination = Pagination::from_page(&page, criteria.current_page(), fallback_page_size);

        Ok(Self {
            criteria,
            page,
            contact,
            pagination,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.page.results.is_empty()
    }

    pub fn cards(&self) -> Vec<PropertyCard> {
        self.page
            .results
            .iter()
            .map(|property| PropertyCard::new(property, &self.contact))
            .collect()
    }
}
