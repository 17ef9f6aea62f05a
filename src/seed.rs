use rand::Rng;
use std::collections::HashSet;

use crate::core::store::{SeedUser, MAX_RATING, MIN_RATING};

/// The population never drops below this, whatever the configuration says.
const MIN_SEED_USERS: usize = 10000;

const NAMES: [&str; 20] = [
    "rahul", "aarav", "arjun", "isha", "kavya", "neha", "vivek", "meera", "saanvi", "anaya",
    "alex", "maria", "liam", "olivia", "noah", "emma", "ethan", "ava", "mia", "logan",
];
const NOUNS: [&str; 10] = [
    "nova", "atlas", "pixel", "ember", "quill", "ridge", "spark", "zen", "orbit", "flux",
];

// Curated accounts pinned at known ratings, seeded ahead of the random
// population so the search demo always has familiar names to find.
const SPECIALS: [(&str, i32); 4] = [
    ("rahul", 4600),
    ("rahul_burman", 3900),
    ("rahul_mathur", 3900),
    ("rahul_kumar", 1234),
];

fn add_user(
    users: &mut Vec<SeedUser>,
    seen: &mut HashSet<String>,
    username: String,
    rating: i32,
) {
    if !seen.insert(username.clone()) {
        return;
    }
    users.push(SeedUser { username, rating });
}

/// Generate the seed population: the curated block first, then random
/// `name_noun_NNNN` users with uniform ratings until `count` random users
/// exist on top of the curated ones. Usernames are unique.
pub fn generate_users(count: usize) -> Vec<SeedUser> {
    let count = count.max(MIN_SEED_USERS);

    let mut rng = rand::rng();
    let mut seen: HashSet<String> = HashSet::with_capacity(count);
    let mut users: Vec<SeedUser> = Vec::with_capacity(count);

    for (name, rating) in SPECIALS {
        add_user(&mut users, &mut seen, name.to_string(), rating);
    }
    for name in ["rahul_jain", "rahul_sen"] {
        let rating = rng.random_range(MIN_RATING..=MAX_RATING);
        add_user(&mut users, &mut seen, name.to_string(), rating);
    }
    for i in 1..=200 {
        let rating = rng.random_range(MIN_RATING..=MAX_RATING);
        add_user(&mut users, &mut seen, format!("rahul_{i:03}"), rating);
    }

    let target = count + users.len();
    while users.len() < target {
        let name = NAMES[rng.random_range(0..NAMES.len())];
        let noun = NOUNS[rng.random_range(0..NOUNS.len())];
        let suffix: u32 = rng.random_range(0..9999);
        let rating = rng.random_range(MIN_RATING..=MAX_RATING);
        add_user(
            &mut users,
            &mut seen,
            format!("{name}_{noun}_{suffix:04}"),
            rating,
        );
    }

    users
}
