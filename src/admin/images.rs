use crate::api::FormPart;
use crate::models::{Property, PropertyImage};

/// Most images a property may carry, existing and new combined
pub const MAX_IMAGES: usize = 5;

pub const TOO_MANY_IMAGES: &str = "Maximum 5 images allowed per property";

/// A file picked for upload
#[derive(Debug, Clone, PartialEq)]
pub struct NewImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl NewImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Images of a property being edited: kept server images first, then new
/// uploads. `primary` indexes that combined sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageSelection {
    existing: Vec<PropertyImage>,
    added: Vec<NewImage>,
    primary: usize,
}

impl ImageSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a property's current images, primary preselected
    pub fn from_property(property: &Property) -> Self {
        let primary = property
            .primary_image
            .as_ref()
            .and_then(|p| property.images.iter().position(|img| img.id == p.id))
            .unwrap_or(0);

        Self {
            existing: property.images.clone(),
            added: Vec::new(),
            primary,
        }
    }

    /// Build without the attach limit; `validate` reports the overflow instead
    pub fn from_parts(existing: Vec<PropertyImage>, added: Vec<NewImage>) -> Self {
        Self {
            existing,
            added,
            primary: 0,
        }
    }

    pub fn existing(&self) -> &[PropertyImage] {
        &self.existing
    }

    pub fn added(&self) -> &[NewImage] {
        &self.added
    }

    pub fn len(&self) -> usize {
        self.existing.len() + self.added.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= MAX_IMAGES
    }

    /// Add uploads, refusing the whole batch if it would pass the limit
    pub fn attach(&mut self, files: Vec<NewImage>) -> Result<(), &'static str> {
        if self.len() + files.len() > MAX_IMAGES {
            return Err(TOO_MANY_IMAGES);
        }
        self.added.extend(files);
        Ok(())
    }

    pub fn remove_existing(&mut self, index: usize) -> bool {
        if index >= self.existing.len() {
            return false;
        }
        self.existing.remove(index);
        self.shift_primary(index);
        true
    }

    pub fn remove_added(&mut self, index: usize) -> bool {
        if index >= self.added.len() {
            return false;
        }
        self.added.remove(index);
        self.shift_primary(self.existing.len() + index);
        true
    }

    fn shift_primary(&mut self, removed: usize) {
        if self.primary == removed {
            self.primary = 0;
        } else if self.primary > removed {
            self.primary -= 1;
        }
    }

    pub fn set_primary_existing(&mut self, index: usize) -> bool {
        if index >= self.existing.len() {
            return false;
        }
        self.primary = index;
        true
    }

    pub fn set_primary_added(&mut self, index: usize) -> bool {
        if index >= self.added.len() {
            return false;
        }
        self.primary = self.existing.len() + index;
        true
    }

    /// Index of the primary image in the combined sequence
    pub fn primary_index(&self) -> usize {
        if self.primary < self.len() {
            self.primary
        } else {
            0
        }
    }

    /// Upload fields: new files, ids of kept images, and the primary marker
    pub fn form_parts(&self) -> Vec<FormPart> {
        let mut parts: Vec<FormPart> = self
            .added
            .iter()
            .map(|img| FormPart::File {
                name: "images".to_string(),
                file_name: img.file_name.clone(),
                bytes: img.bytes.clone(),
            })
            .collect();

        parts.extend(
            self.existing
                .iter()
                .map(|img| FormPart::text("existing_images", img.id.to_string())),
        );

        if self.is_empty() {
            return parts;
        }

        let primary = self.primary_index();
        match self.existing.get(primary) {
            Some(img) => parts.push(FormPart::text("primary_image", img.id.to_string())),
            None => parts.push(FormPart::text(
                "primary_image_index",
                (primary - self.existing.len()).to_string(),
            )),
        }

        parts
    }
}
