//! QR code form payload, its validation, and edit-state tracking.
use crate::catalog::PickedProduct;
use crate::entities::qr_code::Destination;
use crate::storage::{NewQrCode, QrCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormIntent {
    #[default]
    Save,
    Delete,
}

/// Body of `POST /app/qrcodes/{id}`.
///
/// The `clean_*` fields carry the baseline the editor was rendered with;
/// a save whose values equal the baseline writes nothing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeForm {
    #[serde(default)]
    pub intent: FormIntent,
    pub title: Option<String>,
    pub product_id: Option<String>,
    pub product_variant_id: Option<String>,
    pub product_handle: Option<String>,
    pub destination: Option<String>,
    pub clean_title: Option<String>,
    pub clean_product_id: Option<String>,
    pub clean_destination: Option<String>,
}

/// Field name to message. Keys follow the form field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Reject payloads missing a title, a product or a destination.
pub fn validate(form: &QrCodeForm) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if !present(&form.title) {
        errors.insert("title", "Title is required");
    }
    if !present(&form.product_id) {
        errors.insert("productId", "Product is required");
    }
    if !present(&form.destination) {
        errors.insert("destination", "Destination is required");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl QrCodeForm {
    /// True when a product was chosen but the variant or handle it needs for
    /// destination URLs was not submitted along with it.
    pub fn needs_product_details(&self) -> bool {
        present(&self.product_id)
            && (!present(&self.product_variant_id) || !present(&self.product_handle))
    }

    /// Reconcile submitted product details with the stored record.
    ///
    /// An unchanged product keeps the stored variant and handle. A changed
    /// product drops details that still belong to the stored one, so they
    /// get resolved for the new product instead.
    pub fn carry_product_details(&mut self, stored: &QrCode) {
        if self.product_id.as_deref() == Some(stored.product_id.as_str()) {
            self.product_variant_id = Some(stored.product_variant_id.clone());
            self.product_handle = Some(stored.product_handle.clone());
            return;
        }

        if self.product_variant_id.as_deref() == Some(stored.product_variant_id.as_str()) {
            self.product_variant_id = None;
        }
        if self.product_handle.as_deref() == Some(stored.product_handle.as_str()) {
            self.product_handle = None;
        }
    }

    pub fn apply_product(&mut self, product: &PickedProduct) {
        self.product_id = Some(product.id.clone());
        self.product_variant_id = Some(product.variant_id.clone());
        self.product_handle = Some(product.handle.clone());
    }

    /// Validate and convert into the typed record written to the store.
    pub fn into_new_qr_code(self) -> Result<NewQrCode, ValidationErrors> {
        validate(&self)?;

        let destination = self.destination.as_deref().and_then(Destination::parse);
        let Some(destination) = destination else {
            let mut errors = ValidationErrors::default();
            errors.insert("destination", "Destination must be product or cart");
            return Err(errors);
        };

        Ok(NewQrCode {
            title: self.title.unwrap_or_default(),
            product_id: self.product_id.unwrap_or_default(),
            product_handle: self.product_handle.unwrap_or_default(),
            product_variant_id: self.product_variant_id.unwrap_or_default(),
            destination,
        })
    }

    /// Snapshot of what the user submitted.
    pub fn current(&self) -> FormSnapshot {
        FormSnapshot {
            title: self.title.clone().unwrap_or_default(),
            product_id: self.product_id.clone().unwrap_or_default(),
            destination: self.destination.clone().unwrap_or_default(),
        }
    }

    /// Edit state as seen by the editor, if the baseline was submitted.
    pub fn state(&self) -> Option<FormState> {
        let clean = FormSnapshot {
            title: self.clean_title.clone()?,
            product_id: self.clean_product_id.clone().unwrap_or_default(),
            destination: self.clean_destination.clone().unwrap_or_default(),
        };
        Some(FormState::new(clean).with_current(self.current()))
    }
}

/// The user-editable part of a QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub title: String,
    pub product_id: String,
    pub destination: String,
}

impl FormSnapshot {
    /// Template for a new QR code.
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            product_id: String::new(),
            destination: Destination::Product.as_str().to_string(),
        }
    }

    pub fn from_qr_code(qr_code: &QrCode) -> Self {
        Self {
            title: qr_code.title.clone(),
            product_id: qr_code.product_id.clone(),
            destination: qr_code.destination.as_str().to_string(),
        }
    }
}

/// Baseline and in-progress snapshots of the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    clean: FormSnapshot,
    current: FormSnapshot,
}

impl FormState {
    pub fn new(clean: FormSnapshot) -> Self {
        Self {
            current: clean.clone(),
            clean,
        }
    }

    pub fn clean(&self) -> &FormSnapshot {
        &self.clean
    }

    pub fn current(&self) -> &FormSnapshot {
        &self.current
    }

    pub fn is_dirty(&self) -> bool {
        self.current != self.clean
    }

    pub fn with_current(self, current: FormSnapshot) -> Self {
        Self { current, ..self }
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        let current = FormSnapshot {
            title: title.into(),
            ..self.current.clone()
        };
        self.with_current(current)
    }

    pub fn with_product(self, product_id: impl Into<String>) -> Self {
        let current = FormSnapshot {
            product_id: product_id.into(),
            ..self.current.clone()
        };
        self.with_current(current)
    }

    pub fn with_destination(self, destination: Destination) -> Self {
        let current = FormSnapshot {
            destination: destination.as_str().to_string(),
            ..self.current.clone()
        };
        self.with_current(current)
    }

    /// The current snapshot becomes the new baseline.
    pub fn saved(self) -> Self {
        Self::new(self.current)
    }
}
