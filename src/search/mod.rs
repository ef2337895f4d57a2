//! Free-text matching used by list queries.

use crate::models::Profile;

/// Normalised search filter.
///
/// Matching is a case-insensitive substring test against name, email and
/// title. An empty or whitespace-only filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    needle: Option<String>,
}

impl Filter {
    pub fn new(q: Option<&str>) -> Self {
        let needle = q
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        Self { needle }
    }

    pub fn matches(&self, profile: &Profile) -> bool {
        let Some(needle) = &self.needle else {
            return true;
        };

        [&profile.name, &profile.email, &profile.title]
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    fn profile() -> Profile {
        Profile {
            name: "Olivia Garcia".to_string(),
            email: "olivia.garcia.3@demo.io".to_string(),
            gender: Gender::Female,
            title: "QA Engineer".to_string(),
        }
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(Filter::new(None).matches(&profile()));
        assert!(Filter::new(Some("   ")).matches(&profile()));
    }

    #[test]
    fn test_case_insensitive_fields() {
        assert!(Filter::new(Some("GARCIA")).matches(&profile()));
        assert!(Filter::new(Some("demo.io")).matches(&profile()));
        assert!(Filter::new(Some("qa eng")).matches(&profile()));
        assert!(!Filter::new(Some("female")).matches(&profile()));
        assert!(!Filter::new(Some("smith")).matches(&profile()));
    }
}
