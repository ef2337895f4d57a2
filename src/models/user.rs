//! User record model and the create request body.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of gender tags a user may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 4] = [
        Gender::Male,
        Gender::Female,
        Gender::NonBinary,
        Gender::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::NonBinary => "non-binary",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| format!("Invalid gender '{}'", s))
    }
}

/// The descriptive part of a user, shared by confirmed records and
/// not-yet-confirmed placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub gender: Gender,
    pub title: String,
}

/// A user as stored by the mock service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(flatten)]
    pub profile: Profile,
}

impl User {
    pub fn new(id: u64, profile: Profile) -> Self {
        Self { id, profile }
    }
}

/// Request body for creating a new user.
///
/// Every field is optional on the wire so that a missing field is reported
/// as a validation error rather than a body parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl CreateUserRequest {
    /// Check that all fields are present and non-empty and that the gender
    /// is one of the known tags.
    pub fn validate(&self) -> Result<Profile, String> {
        fn required(value: &Option<String>, field: &str) -> Result<String, String> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v.clone()),
                _ => Err(format!("Field '{}' is required", field)),
            }
        }

        let name = required(&self.name, "name")?;
        let email = required(&self.email, "email")?;
        let gender = required(&self.gender, "gender")?.parse::<Gender>()?;
        let title = required(&self.title, "title")?;

        Ok(Profile {
            name,
            email,
            gender,
            title,
        })
    }
}

impl From<Profile> for CreateUserRequest {
    fn from(profile: Profile) -> Self {
        Self {
            name: Some(profile.name),
            email: Some(profile.email),
            gender: Some(profile.gender.as_str().to_string()),
            title: Some(profile.title),
        }
    }
}

/// Response body for a successful delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub ok: bool,
    pub removed: User,
}

/// Number of users per gender tag.
pub type GenderCounts = BTreeMap<Gender, usize>;

/// Tally users by gender. Tags with no users are absent from the map.
pub fn gender_counts<'a>(profiles: impl IntoIterator<Item = &'a Profile>) -> GenderCounts {
    profiles.into_iter().fold(GenderCounts::new(), |mut acc, p| {
        *acc.entry(p.gender).or_default() += 1;
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(gender: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: Some("A".to_string()),
            email: Some("a@x.com".to_string()),
            gender: Some(gender.to_string()),
            title: Some("T".to_string()),
        }
    }

    #[test]
    fn test_user_json_shape() {
        let user = User::new(
            7,
            Profile {
                name: "Riley Lee".to_string(),
                email: "riley.lee.7@demo.io".to_string(),
                gender: Gender::NonBinary,
                title: "Designer".to_string(),
            },
        );

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 7,
                "name": "Riley Lee",
                "email": "riley.lee.7@demo.io",
                "gender": "non-binary",
                "title": "Designer"
            })
        );

        let back: User = serde_json::from_value(value).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_validate_accepts_complete_request() {
        let profile = request("other").validate().unwrap();
        assert_eq!(profile.gender, Gender::Other);
        assert_eq!(profile.name, "A");
    }

    #[test]
    fn test_validate_rejects_missing_field() {
        let mut req = request("male");
        req.title = None;
        let err = req.validate().unwrap_err();
        assert!(err.contains("title"));

        req.title = Some("   ".to_string());
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_gender() {
        let err = request("robot").validate().unwrap_err();
        assert!(err.contains("robot"));
    }

    #[test]
    fn test_gender_counts() {
        let profiles: Vec<Profile> = ["male", "female", "male"]
            .iter()
            .map(|g| request(g).validate().unwrap())
            .collect();

        let counts = gender_counts(&profiles);
        assert_eq!(counts.get(&Gender::Male), Some(&2));
        assert_eq!(counts.get(&Gender::Female), Some(&1));
        assert_eq!(counts.get(&Gender::Other), None);
    }
}
