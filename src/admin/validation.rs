use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

use super::images::{ImageSelection, NewImage, MAX_IMAGES, TOO_MANY_IMAGES};
use crate::api::FormPart;
use crate::error::FieldErrors;
use crate::models::{ContactInfo, Property};

lazy_static! {
    static ref EMAIL_PATTERN: Regex = Regex::new(r"\S+@\S+\.\S+").unwrap();
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

fn required(errors: &mut FieldErrors, field: &str, value: &str, message: &str) -> bool {
    if value.trim().is_empty() {
        errors.insert(field, message);
        return false;
    }
    true
}

/// Property create/edit form
#[derive(Debug, Clone, Default)]
pub struct PropertyForm {
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub images: ImageSelection,
    editing: Option<(u64, String)>,
    errors: FieldErrors,
}

impl PropertyForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefill from an existing property; submitting updates it
    pub fn edit(property: &Property) -> Self {
        Self {
            title: property.title.clone(),
            description: property.description.clone(),
            price: property.price.to_string(),
            category: property.category.id.to_string(),
            city: property.city.clone(),
            state: property.state.clone(),
            country: property.country.clone(),
            images: ImageSelection::from_property(property),
            editing: Some((property.id, property.slug.clone())),
            errors: FieldErrors::new(),
        }
    }

    /// `(id, slug)` of the property being edited, `None` when creating
    pub fn editing(&self) -> Option<(u64, &str)> {
        self.editing.as_ref().map(|(id, slug)| (*id, slug.as_str()))
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn set_error(&mut self, field: &str, message: &str) {
        self.errors.insert(field, message);
    }

    /// Input change by field name; editing a field clears its error
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        let slot = match name {
            "title" => &mut self.title,
            "description" => &mut self.description,
            "price" => &mut self.price,
            "category" => &mut self.category,
            "city" => &mut self.city,
            "state" => &mut self.state,
            "country" => &mut self.country,
            _ => return false,
        };
        *slot = value.to_string();
        self.errors.clear(name);
        true
    }

    pub fn attach(&mut self, files: Vec<NewImage>) -> bool {
        match self.images.attach(files) {
            Ok(()) => {
                self.errors.clear("images");
                true
            }
            Err(message) => {
                self.errors.insert("images", message);
                false
            }
        }
    }

    /// Check every rule, replacing the previous errors. True when submittable.
    pub fn validate(&mut self) -> bool {
        let mut errors = FieldErrors::new();

        required(&mut errors, "title", &self.title, "Title is required");
        required(&mut errors, "description", &self.description, "Description is required");

        if required(&mut errors, "price", &self.price, "Price is required") {
            match self.price.trim().parse::<f64>() {
                Ok(price) if price.is_finite() && price > 0.0 => {}
                _ => errors.insert("price", "Price must be a positive number"),
            }
        }

        required(&mut errors, "category", &self.category, "Category is required");
        required(&mut errors, "city", &self.city, "City is required");
        required(&mut errors, "country", &self.country, "Country is required");

        if self.images.len() > MAX_IMAGES {
            errors.insert("images", TOO_MANY_IMAGES);
        } else if self.editing.is_none() && self.images.is_empty() {
            errors.insert("images", "At least one image is required");
        }

        self.errors = errors;
        self.errors.is_empty()
    }

    /// Multipart body: text fields, then images
    pub fn form_parts(&self) -> Vec<FormPart> {
        let mut parts = vec![
            FormPart::text("title", &self.title),
            FormPart::text("description", &self.description),
            FormPart::text("price", self.price.trim()),
            FormPart::text("category", &self.category),
            FormPart::text("city", &self.city),
            FormPart::text("state", &self.state),
            FormPart::text("country", &self.country),
        ];
        parts.extend(self.images.form_parts());
        parts
    }
}

/// Category add/rename form
#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    pub name: String,
    error: Option<String>,
}

impl CategoryForm {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    pub fn validate(&mut self) -> bool {
        self.error = self
            .name
            .trim()
            .is_empty()
            .then(|| "Category name is required".to_string());
        self.error.is_none()
    }

    pub fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Some(message) = &self.error {
            errors.insert("name", message.as_str());
        }
        errors
    }
}

/// Contact details form
#[derive(Debug, Clone, Default)]
pub struct ContactInfoForm {
    pub phone_number: String,
    pub email: String,
    pub whatsapp_number: String,
    errors: FieldErrors,
    success: Option<String>,
}

impl ContactInfoForm {
    pub fn from_contact(info: &ContactInfo) -> Self {
        Self {
            phone_number: info.phone_number.clone(),
            email: info.email.clone(),
            whatsapp_number: info.whatsapp_number.clone(),
            ..Default::default()
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn set_error(&mut self, field: &str, message: &str) {
        self.errors.insert(field, message);
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn set_success(&mut self, message: &str) {
        self.success = Some(message.to_string());
    }

    /// Editing clears that field's error and any success message
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        let slot = match name {
            "phone_number" => &mut self.phone_number,
            "email" => &mut self.email,
            "whatsapp_number" => &mut self.whatsapp_number,
            _ => return false,
        };
        *slot = value.to_string();
        self.errors.clear(name);
        self.success = None;
        true
    }

    pub fn validate(&mut self) -> bool {
        let mut errors = FieldErrors::new();

        required(&mut errors, "phone_number", &self.phone_number, "Phone number is required");
        if required(&mut errors, "email", &self.email, "Email is required") && !is_valid_email(&self.email) {
            errors.insert("email", "Email is invalid");
        }
        required(&mut errors, "whatsapp_number", &self.whatsapp_number, "WhatsApp number is required");

        self.errors = errors;
        self.errors.is_empty()
    }

    pub fn payload(&self) -> Value {
        json!({
            "phone_number": self.phone_number,
            "email": self.email,
            "whatsapp_number": self.whatsapp_number,
        })
    }
}
