//! Pseudo-random user generation for the mock service.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{Gender, Profile, User};

const FIRST_NAMES: &[&str] = &[
    "Alex", "Taylor", "Jordan", "Casey", "Riley", "Morgan", "Avery", "Quinn", "Hayden", "Rowan",
    "Charlie", "Parker", "Emerson", "River", "Sawyer", "Dakota", "Reese", "Elliot", "Finley",
    "Harper", "Logan", "Mason", "Noah", "Olivia", "Sophia", "Isabella", "Mia", "Amelia", "James",
    "Benjamin",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White", "Harris",
];

const DOMAINS: &[&str] = &["example.com", "mail.com", "demo.io", "test.dev", "sample.org"];

const TITLES: &[&str] = &[
    "Software Engineer",
    "Product Manager",
    "Designer",
    "Data Analyst",
    "DevOps Engineer",
    "QA Engineer",
    "Project Coordinator",
    "Marketing Specialist",
    "Sales Associate",
    "Customer Success Manager",
    "HR Generalist",
    "Business Analyst",
    "Technical Writer",
    "Support Engineer",
    "Research Intern",
];

/// Generate `count` users with ids `1..=count`.
///
/// With a seed the output is reproducible; without one it comes from OS entropy.
pub fn generate_users(count: usize, seed: Option<u64>) -> Vec<User> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    (1..=count as u64)
        .map(|id| User::new(id, random_profile(&mut rng, id)))
        .collect()
}

fn random_profile(rng: &mut impl Rng, index: u64) -> Profile {
    let name = format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES));
    // Index suffix keeps generated emails unique.
    let email = format!("{}.{}@{}", slugify(&name), index, pick(rng, DOMAINS));
    let gender = *Gender::ALL.choose(rng).unwrap_or(&Gender::Other);
    let title = pick(rng, TITLES).to_string();

    Profile {
        name,
        email,
        gender,
        title,
    }
}

fn pick<'a>(rng: &mut impl Rng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// Lowercase and collapse every run of non-alphanumerics into a single dot,
/// trimming dots from both ends.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dot = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dot && !slug.is_empty() {
                slug.push('.');
            }
            pending_dot = false;
            slug.push(c);
        } else {
            pending_dot = true;
        }
    }

    slug
}
