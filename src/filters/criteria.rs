use std::fmt;

use tracing::debug;
use url::form_urlencoded;

/// Sort orders offered in the filter bar. Anything else the location
/// carries is forwarded to the listing endpoint untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
    Newest,
    Oldest,
    Other(String),
}

impl SortOrder {
    pub fn as_param(&self) -> &str {
        match self {
            SortOrder::PriceAsc => "price",
            SortOrder::PriceDesc => "-price",
            SortOrder::Newest => "-created_at",
            SortOrder::Oldest => "created_at",
            SortOrder::Other(param) => param,
        }
    }

    /// `None` for "default" and the empty string
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "" | "default" => None,
            "price" => Some(SortOrder::PriceAsc),
            "-price" => Some(SortOrder::PriceDesc),
            "-created_at" => Some(SortOrder::Newest),
            "created_at" => Some(SortOrder::Oldest),
            other => Some(SortOrder::Other(other.to_string())),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SortOrder::PriceAsc => "Price (Low to High)",
            SortOrder::PriceDesc => "Price (High to Low)",
            SortOrder::Newest => "Newest First",
            SortOrder::Oldest => "Oldest First",
            SortOrder::Other(param) => param,
        }
    }
}

/// Search criteria for the property listing. `None` means "no constraint";
/// empty strings and zero numbers are never stored. Prices keep the decimal
/// text they were given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: Option<String>,
    pub category: Option<u64>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub ordering: Option<SortOrder>,
    pub page: Option<u32>,
}

impl FilterCriteria {
    /// Parse a query string, with or without the leading `?`
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(form_urlencoded::parse(query.as_bytes()))
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut criteria = Self::default();
        for (key, value) in pairs {
            if !criteria.set_field(key.as_ref(), value.as_ref()) {
                debug!("Ignoring unknown filter parameter {}", key.as_ref());
            }
        }
        criteria
    }

    /// Set one field from its query-parameter name. Falsy values clear the
    /// field. Returns false for unknown names.
    pub fn set_field(&mut self, name: &str, value: &str) -> bool {
        match name {
            "search" => self.search = text(value),
            "category" => self.category = if value == "all" { None } else { number(name, value) },
            "min_price" => self.min_price = price(name, value),
            "max_price" => self.max_price = price(name, value),
            "city" => self.city = text(value),
            "state" => self.state = text(value),
            "country" => self.country = text(value),
            "ordering" => self.ordering = SortOrder::from_param(value),
            "page" => self.page = number(name, value),
            _ => return false,
        }
        true
    }

    /// Present fields as `(parameter, value)`, in a fixed order
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(min) = &self.min_price {
            pairs.push(("min_price", min.clone()));
        }
        if let Some(max) = &self.max_price {
            pairs.push(("max_price", max.clone()));
        }
        if let Some(city) = &self.city {
            pairs.push(("city", city.clone()));
        }
        if let Some(state) = &self.state {
            pairs.push(("state", state.clone()));
        }
        if let Some(country) = &self.country {
            pairs.push(("country", country.clone()));
        }
        if let Some(ordering) = &self.ordering {
            pairs.push(("ordering", ordering.as_param().to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }

        pairs
    }

    /// Encoded query string without the leading `?`; empty when nothing is set
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query_pairs())
            .finish()
    }

    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    /// The page this criteria points at, 1-based
    pub fn current_page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    pub fn without_page(&self) -> Self {
        Self {
            page: None,
            ..self.clone()
        }
    }

    /// Slider bounds; zero leaves that end open
    pub fn set_price_range(&mut self, min: u64, max: u64) {
        self.min_price = (min > 0).then(|| min.to_string());
        self.max_price = (max > 0).then(|| max.to_string());
    }
}

impl fmt::Display for FilterCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "no filters")
        } else {
            write!(f, "{}", self.to_query())
        }
    }
}

fn text(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// A positive decimal, kept as written
fn price(name: &str, value: &str) -> Option<String> {
    let value = value.trim();
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => Some(value.to_string()),
        Ok(_) => None,
        Err(_) => {
            if !value.is_empty() {
                debug!("Ignoring non-numeric {} value {:?}", name, value);
            }
            None
        }
    }
}

fn number<T>(name: &str, value: &str) -> Option<T>
where
    T: std::str::FromStr + Default + PartialEq,
{
    if value.is_empty() {
        return None;
    }
    match value.parse::<T>() {
        Ok(n) if n != T::default() => Some(n),
        Ok(_) => None,
        Err(_) => {
            debug!("Ignoring non-numeric {} value {:?}", name, value);
            None
        }
    }
}
