//! Survivor name generation for ritual mode

use rand::seq::SliceRandom;
use rand::Rng;

/// Generate `count` full names with distinct given names.
pub fn generate_names(rng: &mut impl Rng, count: usize) -> Vec<String> {
    let mut given: Vec<&str> = GIVEN_NAMES.to_vec();
    given.shuffle(rng);
    given
        .into_iter()
        .cycle()
        .take(count)
        .map(|g| {
            let family = FAMILY_NAMES[rng.gen_range(0..FAMILY_NAMES.len())];
            format!("{} {}", g, family)
        })
        .collect()
}

static GIVEN_NAMES: &[&str] = &[
    "Somchai",
    "Somsak",
    "Prasert",
    "Arthit",
    "Wichai",
    "Thira",
    "Kitti",
    "Montri",
    "Anon",
    "Narong",
    "Pornchai",
    "Somsri",
    "Malee",
    "Yupa",
    "Arunee",
    "Rattana",
    "Kanokwan",
    "Wilai",
    "Duangjai",
    "Nittaya",
    "Orathai",
    "Napha",
];

static FAMILY_NAMES: &[&str] = &[
    "Wongsuwan",
    "Jongjaroen",
    "Srisawat",
    "Thongdee",
    "Boonjaroen",
    "Chaiwong",
    "Maneerat",
    "Udomsuk",
    "Rungruang",
    "Phongam",
    "Jansawang",
    "Singharat",
    "Boonma",
    "Saengthong",
    "Jaidee",
];
