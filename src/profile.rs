//! Profile lookup, patching, and the completeness gate
//!
//! A missing profile row is an expected case: the identity provider creates
//! accounts before any profile exists, so absence means "synthesize defaults
//! from the session". Order saving and messaging both require a complete
//! profile; the gate reports what is missing so the page can prompt and
//! redirect.

use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::User;
use crate::error::Error;
use crate::models::Profile;
use crate::Backend;

/// Delay before an incomplete-profile prompt redirects to the profile page
pub const PROFILE_REDIRECT_DELAY: Duration = Duration::from_millis(2500);

/// Fields a profile must carry before orders can be saved
pub const REQUIRED_FIELDS: &[&str] = &[
    "last_name",
    "first_name",
    "mailing_title",
    "address",
    "city",
    "family_members",
    "staying_home",
    "has_email_access",
    "association_husband",
    "association_wife",
];

/// Outcome of the completeness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileGate {
    Complete,
    /// Prompt the user and redirect to the profile page after
    /// [`PROFILE_REDIRECT_DELAY`]
    Incomplete { missing: Vec<&'static str> },
}

fn field_present(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Which required fields are missing from a profile
pub fn missing_fields(profile: &Profile) -> Vec<&'static str> {
    let mut missing = Vec::new();
    for &field in REQUIRED_FIELDS {
        let present = match field {
            "last_name" => field_present(&profile.last_name),
            "first_name" => field_present(&profile.first_name),
            "mailing_title" => field_present(&profile.mailing_title),
            "address" => field_present(&profile.address),
            "city" => field_present(&profile.city),
            "family_members" => profile.family_members.is_some(),
            "staying_home" => field_present(&profile.staying_home),
            "has_email_access" => field_present(&profile.has_email_access),
            "association_husband" => field_present(&profile.association_husband),
            "association_wife" => field_present(&profile.association_wife),
            _ => true,
        };
        if !present {
            missing.push(field);
        }
    }

    // "Other" as the city requires the actual city name alongside it.
    if profile.city.as_deref() == Some("Other") && !field_present(&profile.other_city) {
        missing.push("other_city");
    }

    missing
}

/// Run the completeness gate over a profile
pub fn profile_gate(profile: &Profile) -> ProfileGate {
    let missing = missing_fields(profile);
    if missing.is_empty() {
        ProfileGate::Complete
    } else {
        ProfileGate::Incomplete { missing }
    }
}

/// Fetch the signed-in user's profile; absence synthesizes a default row
/// carrying the session's id and email.
pub async fn fetch_profile(backend: &Backend, user: &User) -> Result<Profile, Error> {
    let row = backend
        .from("profiles")
        .select("*")
        .eq("id", user.id)
        .execute_one::<Profile>()
        .await?;

    Ok(row.unwrap_or_else(|| Profile {
        id: user.id,
        email: user.email.clone(),
        ..Profile::default()
    }))
}

/// Fields a user may patch on their own profile. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spouse_first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailing_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub husband_cell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wife_cell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_members: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staying_home: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_email_access: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub association_husband: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub association_wife: Option<String>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl ProfileUpdate {
    /// Resolve the submitted city: choosing "Other" stores the typed-in
    /// city name as the city itself.
    pub fn resolve_other_city(mut self) -> Self {
        if self.city.as_deref() == Some("Other") {
            if let Some(other) = self.other_city.clone() {
                self.city = Some(other);
            }
        }
        self
    }
}

/// Patch the user's profile row
pub async fn update_profile(
    backend: &Backend,
    user_id: Uuid,
    update: ProfileUpdate,
) -> Result<(), Error> {
    backend
        .from("profiles")
        .update(update)
        .eq("id", user_id)
        .execute_no_return()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_profile() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: Some("family@example.com".into()),
            first_name: Some("Dovid".into()),
            last_name: Some("Klein".into()),
            mailing_title: Some("Mr. and Mrs.".into()),
            address: Some("123 Main St".into()),
            city: Some("Cleveland Heights".into()),
            family_members: Some(5),
            staying_home: Some("yes".into()),
            has_email_access: Some("yes".into()),
            association_husband: Some("Shul A".into()),
            association_wife: Some("School B".into()),
            ..Profile::default()
        }
    }

    #[test]
    fn empty_profile_fails_on_every_required_field() {
        let profile = Profile::default();
        let missing = missing_fields(&profile);
        assert_eq!(missing.len(), REQUIRED_FIELDS.len());
        assert_eq!(
            profile_gate(&profile),
            ProfileGate::Incomplete { missing }
        );
    }

    #[test]
    fn complete_profile_passes_gate() {
        assert_eq!(profile_gate(&complete_profile()), ProfileGate::Complete);
    }

    #[test]
    fn other_city_requires_a_name() {
        let mut profile = complete_profile();
        profile.city = Some("Other".into());
        profile.other_city = None;
        assert_eq!(missing_fields(&profile), vec!["other_city"]);

        profile.other_city = Some("Wickliffe".into());
        assert!(missing_fields(&profile).is_empty());
    }

    #[test]
    fn whitespace_only_fields_count_as_missing() {
        let mut profile = complete_profile();
        profile.address = Some("   ".into());
        assert_eq!(missing_fields(&profile), vec!["address"]);
    }

    #[test]
    fn other_city_resolves_into_city_on_update() {
        let update = ProfileUpdate {
            city: Some("Other".into()),
            other_city: Some("Lakewood".into()),
            ..ProfileUpdate::default()
        }
        .resolve_other_city();
        assert_eq!(update.city.as_deref(), Some("Lakewood"));
    }
}
