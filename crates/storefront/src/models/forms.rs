//! Request payloads with field-level validation.
//!
//! Every mutating route deserializes one of these forms and validates it
//! before touching the backend. Validation failures collect one message
//! per offending field so a client can mark up the whole form in one pass.

use std::collections::BTreeMap;

use serde::Deserialize;

use jarsy_core::{Email, VariantId};

use crate::commerce::{AddressPayload, ProfileInput, RegisterInput};
use crate::suggest::SuggestionInput;

const MIN_PASSWORD_LENGTH: usize = 8;

/// One message per offending field.
pub type FieldErrors = BTreeMap<String, String>;

/// Collects field errors while a form is checked.
#[derive(Debug, Default)]
struct Checker {
    errors: FieldErrors,
}

impl Checker {
    fn require<'a>(&mut self, field: &str, value: &'a str) -> &'a str {
        if value.trim().is_empty() {
            self.errors
                .insert(field.to_string(), "This field is required".to_string());
        }
        value.trim()
    }

    fn email(&mut self, field: &str, value: &str) -> Option<Email> {
        match value.trim().parse::<Email>() {
            Ok(email) => Some(email),
            Err(e) => {
                self.errors.insert(field.to_string(), e.to_string());
                None
            }
        }
    }

    fn password(&mut self, field: &str, value: &str) {
        if value.len() < MIN_PASSWORD_LENGTH {
            self.errors.insert(
                field.to_string(),
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
            );
        }
    }

    fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

fn clean_optional(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// =============================================================================
// Cart Forms
// =============================================================================

/// Body for adding an item to the cart.
#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    /// Variant to add.
    pub variant_id: String,
    /// Quantity; defaults to 1.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

impl AddItemForm {
    /// Validate into a variant ID and quantity.
    ///
    /// # Errors
    ///
    /// Returns field errors for an empty variant or zero quantity.
    pub fn validate(&self) -> Result<(VariantId, u32), FieldErrors> {
        let mut check = Checker::default();
        let variant_id = check.require("variant_id", &self.variant_id).to_string();
        if self.quantity == 0 {
            check.errors.insert(
                "quantity".to_string(),
                "Quantity must be at least 1".to_string(),
            );
        }
        check.finish()?;
        Ok((VariantId::new(variant_id), self.quantity))
    }
}

/// Body for changing a line item's quantity.
#[derive(Debug, Deserialize)]
pub struct UpdateItemForm {
    /// New quantity; zero or negative removes the line.
    pub quantity: i64,
}

// =============================================================================
// Auth and Account Forms
// =============================================================================

/// Body for logging in.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

impl LoginForm {
    /// Validate into a parsed email and the raw password.
    ///
    /// # Errors
    ///
    /// Returns field errors for a malformed email or empty password.
    pub fn validate(&self) -> Result<(Email, &str), FieldErrors> {
        let mut check = Checker::default();
        let email = check.email("email", &self.email);
        check.require("password", &self.password);
        check.finish()?;
        // finish() errored if the email failed to parse
        Ok((email.ok_or_else(FieldErrors::new)?, &self.password))
    }
}

/// Body for registering a new account.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Password.
    pub password: String,
}

impl RegisterForm {
    /// Validate into the backend's registration payload.
    ///
    /// # Errors
    ///
    /// Returns field errors for missing names, a malformed email, or a
    /// short password.
    pub fn validate(&self) -> Result<RegisterInput, FieldErrors> {
        let mut check = Checker::default();
        let first_name = check.require("first_name", &self.first_name).to_string();
        let last_name = check.require("last_name", &self.last_name).to_string();
        let email = check.email("email", &self.email);
        check.password("password", &self.password);
        check.finish()?;

        Ok(RegisterInput {
            first_name,
            last_name,
            email: email.ok_or_else(FieldErrors::new)?.to_string(),
            phone: clean_optional(self.phone.as_ref()),
            password: self.password.clone(),
        })
    }
}

/// Body for updating the customer profile.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: Option<String>,
}

impl ProfileForm {
    /// Validate into the backend's profile payload.
    ///
    /// # Errors
    ///
    /// Returns field errors for missing names or a malformed email.
    pub fn validate(&self) -> Result<ProfileInput, FieldErrors> {
        let mut check = Checker::default();
        let first_name = check.require("first_name", &self.first_name).to_string();
        let last_name = check.require("last_name", &self.last_name).to_string();
        let email = check.email("email", &self.email);
        check.finish()?;

        Ok(ProfileInput {
            first_name,
            last_name,
            email: email.ok_or_else(FieldErrors::new)?.to_string(),
            phone: clean_optional(self.phone.as_ref()),
        })
    }
}

// =============================================================================
// Address Forms
// =============================================================================

/// Body carrying a shipping address.
#[derive(Debug, Deserialize)]
pub struct AddressForm {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Street address.
    pub address_1: String,
    /// Additional address line.
    pub address_2: Option<String>,
    /// City.
    pub city: String,
    /// Province or state.
    pub province: Option<String>,
    /// Postal code.
    pub postal_code: String,
    /// 2-letter country code; falls back to the configured default.
    pub country_code: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
}

impl AddressForm {
    /// Validate into the backend's address payload.
    ///
    /// # Errors
    ///
    /// Returns field errors for any missing required field.
    pub fn validate(&self, default_country: &str) -> Result<AddressPayload, FieldErrors> {
        let mut check = Checker::default();
        let first_name = check.require("first_name", &self.first_name).to_string();
        let last_name = check.require("last_name", &self.last_name).to_string();
        let address_1 = check.require("address_1", &self.address_1).to_string();
        let city = check.require("city", &self.city).to_string();
        let postal_code = check.require("postal_code", &self.postal_code).to_string();

        let country_code = clean_optional(self.country_code.as_ref())
            .map_or_else(|| default_country.to_string(), |c| c.to_lowercase());
        if country_code.len() != 2 {
            check.errors.insert(
                "country_code".to_string(),
                "Must be a 2-letter country code".to_string(),
            );
        }
        check.finish()?;

        Ok(AddressPayload {
            first_name,
            last_name,
            address_1,
            address_2: clean_optional(self.address_2.as_ref()),
            city,
            province: clean_optional(self.province.as_ref()),
            postal_code,
            country_code,
            phone: clean_optional(self.phone.as_ref()),
        })
    }
}

/// Body for the checkout address step: contact email plus the address.
#[derive(Debug, Deserialize)]
pub struct CheckoutAddressForm {
    /// Contact email for the order.
    pub email: String,
    /// Shipping address fields.
    #[serde(flatten)]
    pub address: AddressForm,
}

impl CheckoutAddressForm {
    /// Validate into the email and address payload.
    ///
    /// # Errors
    ///
    /// Returns field errors covering both the email and address fields.
    pub fn validate(&self, default_country: &str) -> Result<(Email, AddressPayload), FieldErrors> {
        let mut check = Checker::default();
        let email = check.email("email", &self.email);

        match self.address.validate(default_country) {
            Ok(address) => {
                check.finish()?;
                Ok((email.ok_or_else(FieldErrors::new)?, address))
            }
            Err(mut fields) => {
                fields.append(&mut check.errors);
                Err(fields)
            }
        }
    }
}

// =============================================================================
// Suggestion Form
// =============================================================================

/// Body for requesting AI listing copy.
#[derive(Debug, Deserialize)]
pub struct SuggestForm {
    /// Storefront template name.
    pub template_name: String,
    /// Product name.
    pub product_name: String,
    /// Product category.
    pub product_category: String,
}

impl SuggestForm {
    /// Validate into the suggestion input.
    ///
    /// # Errors
    ///
    /// Returns field errors for any empty field.
    pub fn validate(&self) -> Result<SuggestionInput, FieldErrors> {
        let mut check = Checker::default();
        let template_name = check.require("template_name", &self.template_name).to_string();
        let product_name = check.require("product_name", &self.product_name).to_string();
        let product_category = check
            .require("product_category", &self.product_category)
            .to_string();
        check.finish()?;

        Ok(SuggestionInput {
            template_name,
            product_name,
            product_category,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_item_defaults_quantity() {
        let form: AddItemForm =
            serde_json::from_str(r#"{"variant_id": "variant_01"}"#).unwrap();
        let (variant_id, quantity) = form.validate().unwrap();
        assert_eq!(variant_id.as_str(), "variant_01");
        assert_eq!(quantity, 1);
    }

    #[test]
    fn test_add_item_rejects_zero_quantity() {
        let form = AddItemForm {
            variant_id: "variant_01".to_string(),
            quantity: 0,
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.contains_key("quantity"));
    }

    #[test]
    fn test_register_collects_all_field_errors() {
        let form = RegisterForm {
            first_name: String::new(),
            last_name: "Rao".to_string(),
            email: "not-an-email".to_string(),
            phone: None,
            password: "short".to_string(),
        };

        let errors = form.validate().unwrap_err();
        assert!(errors.contains_key("first_name"));
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));
        assert!(!errors.contains_key("last_name"));
    }

    #[test]
    fn test_register_valid() {
        let form = RegisterForm {
            first_name: " Asha ".to_string(),
            last_name: "Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: Some("  ".to_string()),
            password: "long-enough".to_string(),
        };

        let input = form.validate().unwrap();
        assert_eq!(input.first_name, "Asha");
        assert_eq!(input.phone, None);
    }

    #[test]
    fn test_address_defaults_country() {
        let form = AddressForm {
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            address_1: "12 MG Road".to_string(),
            address_2: None,
            city: "Bengaluru".to_string(),
            province: None,
            postal_code: "560001".to_string(),
            country_code: None,
            phone: None,
        };

        let payload = form.validate("in").unwrap();
        assert_eq!(payload.country_code, "in");
    }

    #[test]
    fn test_address_rejects_bad_country_code() {
        let form = AddressForm {
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            address_1: "12 MG Road".to_string(),
            address_2: None,
            city: "Bengaluru".to_string(),
            province: None,
            postal_code: "560001".to_string(),
            country_code: Some("india".to_string()),
            phone: None,
        };

        let errors = form.validate("in").unwrap_err();
        assert!(errors.contains_key("country_code"));
    }

    #[test]
    fn test_checkout_address_flattens_fields() {
        let form: CheckoutAddressForm = serde_json::from_value(serde_json::json!({
            "email": "asha@example.com",
            "first_name": "Asha",
            "last_name": "Rao",
            "address_1": "12 MG Road",
            "city": "Bengaluru",
            "postal_code": "560001"
        }))
        .unwrap();

        let (email, address) = form.validate("in").unwrap();
        assert_eq!(email.as_ref(), "asha@example.com");
        assert_eq!(address.city, "Bengaluru");
    }

    #[test]
    fn test_checkout_address_merges_errors() {
        let form: CheckoutAddressForm = serde_json::from_value(serde_json::json!({
            "email": "bad",
            "first_name": "",
            "last_name": "Rao",
            "address_1": "12 MG Road",
            "city": "Bengaluru",
            "postal_code": "560001"
        }))
        .unwrap();

        let errors = form.validate("in").unwrap_err();
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("first_name"));
    }

    #[test]
    fn test_suggest_form_requires_all_fields() {
        let form = SuggestForm {
            template_name: "Minimal".to_string(),
            product_name: String::new(),
            product_category: "Jars".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_key("product_name"));
    }
}
