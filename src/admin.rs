//! Admin panels: products, users, site content, banners
//!
//! Plain CRUD over the relevant tables. The role gate here is a UI
//! convenience only, NOT an authorization boundary: it decides whether to
//! render the panel at all, while row-level security on the server decides
//! what actually succeeds. Forms are validated client-side for required
//! fields and numeric ranges before any remote call.

use serde_json::json;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Product, ProductInput, Profile, Role, SiteSettings, StaticContent};
use crate::Backend;

/// Check whether a profile may see the admin UI.
///
/// UI convenience only, not an authorization boundary: a non-admin caller
/// who bypasses this still cannot write anything the server's row-level
/// security forbids.
pub fn ensure_admin(profile: &Profile) -> Result<(), Error> {
    if profile.is_admin() {
        Ok(())
    } else {
        Err(Error::auth("Admin role required"))
    }
}

/// Validate a product form before submission. Rejected input never reaches
/// the network.
pub fn validate_product(input: &ProductInput) -> Result<(), Error> {
    if input.name.trim().is_empty() {
        return Err(Error::validation("Product name is required"));
    }
    if input.category.trim().is_empty() {
        return Err(Error::validation("Category is required"));
    }
    if !input.price.is_finite() || input.price < 0.0 {
        return Err(Error::validation("Price must be a number of at least 0"));
    }
    if input.max_quantity < 1 {
        return Err(Error::validation("Max quantity must be at least 1"));
    }
    Ok(())
}

/// Admin CRUD operations, constructed only for admin profiles
pub struct AdminPanel<'a> {
    backend: &'a Backend,
    admin_id: Uuid,
}

impl<'a> AdminPanel<'a> {
    /// Create a panel for an admin profile; non-admins are refused as a UI
    /// convenience, see [`ensure_admin`]
    pub fn new(backend: &'a Backend, profile: &Profile) -> Result<Self, Error> {
        ensure_admin(profile)?;
        Ok(Self {
            backend,
            admin_id: profile.id,
        })
    }

    // --- products ---

    /// All products, active or not, grouped by category then name
    pub async fn list_products(&self) -> Result<Vec<Product>, Error> {
        self.backend
            .from("products")
            .select("*")
            .order("category", true)
            .order("name", true)
            .execute::<Product>()
            .await
    }

    /// Create a product
    pub async fn create_product(&self, input: ProductInput) -> Result<(), Error> {
        validate_product(&input)?;
        self.backend
            .from("products")
            .insert(input)
            .execute_no_return()
            .await
    }

    /// Update an existing product
    pub async fn update_product(&self, id: i64, input: ProductInput) -> Result<(), Error> {
        validate_product(&input)?;
        self.backend
            .from("products")
            .update(input)
            .eq("id", id)
            .execute_no_return()
            .await
    }

    /// Delete a product
    pub async fn delete_product(&self, id: i64) -> Result<(), Error> {
        self.backend
            .from("products")
            .delete()
            .eq("id", id)
            .execute_no_return()
            .await
    }

    // --- users ---

    /// All user profiles ordered by email
    pub async fn list_users(&self) -> Result<Vec<Profile>, Error> {
        self.backend
            .from("profiles")
            .select("*")
            .order("email", true)
            .execute::<Profile>()
            .await
    }

    /// Promote or demote a user. Admins cannot change their own role from
    /// the panel.
    pub async fn set_user_role(&self, user_id: Uuid, role: Role) -> Result<(), Error> {
        if user_id == self.admin_id {
            return Err(Error::validation("You cannot change your own role"));
        }
        self.backend
            .from("profiles")
            .update(json!({ "role": role }))
            .eq("id", user_id)
            .execute_no_return()
            .await
    }

    /// Set the display name this admin presents in chats
    pub async fn save_display_name(&self, name: &str) -> Result<(), Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("Display name cannot be empty"));
        }
        self.backend
            .from("profiles")
            .update(json!({ "admin_display_name": name }))
            .eq("id", self.admin_id)
            .execute_no_return()
            .await
    }

    // --- site settings / banners ---

    /// The single settings row; absence means defaults
    pub async fn fetch_settings(&self) -> Result<SiteSettings, Error> {
        let row = self
            .backend
            .from("settings")
            .select("*")
            .execute_one::<SiteSettings>()
            .await?;
        Ok(row.unwrap_or_default())
    }

    /// Save banner/header settings: update the existing row, or insert the
    /// first one
    pub async fn save_settings(&self, settings: &SiteSettings) -> Result<(), Error> {
        match settings.id {
            Some(id) => {
                self.backend
                    .from("settings")
                    .update(settings)
                    .eq("id", id)
                    .execute_no_return()
                    .await
            }
            None => {
                self.backend
                    .from("settings")
                    .insert(settings)
                    .execute_no_return()
                    .await
            }
        }
    }

    // --- static content pages ---

    /// Read an editable page's HTML; an absent row is an empty page
    pub async fn fetch_static_content(&self, page_name: &str) -> Result<Option<String>, Error> {
        let row = self
            .backend
            .from("static_content")
            .select("content_html")
            .eq("page_name", page_name)
            .execute_one::<StaticContent>()
            .await?;
        Ok(row.and_then(|c| c.content_html))
    }

    /// Upsert an editable page's HTML, keyed on the page name
    pub async fn save_static_content(
        &self,
        page_name: &str,
        content_html: &str,
    ) -> Result<(), Error> {
        self.backend
            .from("static_content")
            .upsert(StaticContent {
                page_name: page_name.to_string(),
                content_html: Some(content_html.to_string()),
            })
            .on_conflict("page_name")
            .execute_no_return()
            .await
    }

    // --- documents ---

    /// Upload a document and return its public link
    pub async fn upload_document(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, Error> {
        self.backend
            .storage()
            .upload(bucket, path, bytes, content_type)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_input(price: f64) -> ProductInput {
        ProductInput {
            name: "Grape Juice".into(),
            description: None,
            price,
            category: "Pantry".into(),
            max_quantity: 4,
            is_active: true,
        }
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = validate_product(&product_input(-1.0)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn nan_price_is_rejected() {
        assert!(validate_product(&product_input(f64::NAN)).is_err());
    }

    #[test]
    fn zero_price_is_allowed() {
        assert!(validate_product(&product_input(0.0)).is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut input = product_input(3.0);
        input.name = "  ".into();
        assert!(validate_product(&input).is_err());
    }

    #[test]
    fn non_admin_cannot_build_panel() {
        let profile = Profile::default();
        assert!(matches!(ensure_admin(&profile), Err(Error::Auth(_))));
    }
}
