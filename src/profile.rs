// Copyright (c) 2026 rezky_nightky

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::Serialize;

use crate::util::{clamp, rand_int, rand_range, to_base36, weighted_choice};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub job_title: String,
    pub industry: String,
    pub income_usd: i64,
    pub education: String,
    pub city: String,
    pub relationship_status: String,
    pub emotional_state: String,
    pub activity: String,
    pub interests: Vec<String>,
    pub risk_score: u8,
    pub last_active: String,
}

pub struct Industry {
    pub name: &'static str,
    pub income: (i64, i64),
}

pub const INDUSTRIES: &[Industry] = &[
    Industry { name: "Software", income: (70_000, 210_000) },
    Industry { name: "Finance", income: (60_000, 260_000) },
    Industry { name: "Healthcare", income: (38_000, 180_000) },
    Industry { name: "Education", income: (30_000, 90_000) },
    Industry { name: "Retail", income: (22_000, 65_000) },
    Industry { name: "Logistics", income: (28_000, 85_000) },
    Industry { name: "Media", income: (32_000, 140_000) },
    Industry { name: "Energy", income: (55_000, 190_000) },
    Industry { name: "Hospitality", income: (20_000, 60_000) },
    Industry { name: "Biotech", income: (65_000, 230_000) },
];

const JOBS: &[&str] = &[
    "Engineer",
    "Analyst",
    "Designer",
    "Nurse",
    "Teacher",
    "Consultant",
    "Operator",
    "Researcher",
    "Manager",
    "Technician",
    "Writer",
    "Courier",
    "Architect",
    "Pharmacist",
    "Barista",
];

pub const MOODS: &[(&str, u32, i32)] = &[
    ("focused", 3, 0),
    ("curious", 3, -3),
    ("calm", 2, -5),
    ("anxious", 2, 8),
    ("restless", 2, 5),
    ("euphoric", 1, 2),
    ("melancholic", 1, 6),
    ("flow", 1, -8),
    ("burnout", 1, 15),
];

const FIRST_NAMES: &[&str] = &[
    "Ada", "Kenji", "Mara", "Tomas", "Noor", "Elio", "Sana", "Viktor", "Leah", "Ravi", "Ines",
    "Dmitri", "Yara", "Oskar", "Mei", "Idris",
];

const LAST_NAMES: &[&str] = &[
    "Okafor", "Lindqvist", "Tanaka", "Moreau", "Haddad", "Novak", "Silva", "Kowalski", "Reyes",
    "Brandt", "Aziz", "Petrov", "Quinn", "Castillo",
];

const GENDERS: &[&str] = &["female", "male", "nonbinary"];

const EDUCATION: &[&str] = &["high school", "associate", "bachelor", "master", "doctorate", "bootcamp"];

const CITIES: &[&str] = &[
    "Lagos", "Stockholm", "Osaka", "Lyon", "Beirut", "Prague", "Porto", "Krakow", "Austin",
    "Hamburg", "Karachi", "Tallinn", "Montreal", "Bogota",
];

const RELATIONSHIP: &[&str] = &["single", "partnered", "married", "divorced", "complicated"];

const ACTIVITIES: &[&str] = &[
    "scrolling feed",
    "idle",
    "streaming video",
    "in a meeting",
    "commuting",
    "gaming",
    "online shopping",
    "reading news",
    "messaging",
    "asleep",
];

pub const INTERESTS: &[&str] = &[
    "cycling",
    "synthwave",
    "chess",
    "crypto",
    "gardening",
    "anime",
    "climbing",
    "cooking",
    "astronomy",
    "film noir",
    "vinyl",
    "running",
    "poetry",
    "robotics",
    "tea",
    "photography",
];

pub const MIN_INTERESTS: usize = 2;
pub const MAX_INTERESTS: usize = 6;

const ACTIVE_WINDOW: Duration = Duration::from_secs(72 * 3600);

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, from: &[&'a str]) -> &'a str {
    from.choose(rng).copied().unwrap_or_default()
}

pub fn income_adjustment(income: i64) -> i32 {
    if income > 150_000 {
        -10
    } else if income < 40_000 {
        10
    } else {
        0
    }
}

pub fn mood_adjustment(mood: &str) -> i32 {
    MOODS
        .iter()
        .find(|(m, _, _)| *m == mood)
        .map(|(_, _, adj)| *adj)
        .unwrap_or(0)
}

pub fn risk_score(base: f32, income: i64, mood: &str) -> u8 {
    let raw = (base + income_adjustment(income) as f32 + mood_adjustment(mood) as f32).round();
    clamp(raw, 0.0, 100.0) as u8
}

pub fn round_thousand(v: i64) -> i64 {
    ((v as f64) / 1000.0).round() as i64 * 1000
}

pub fn make_id<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> String {
    let prefix: String = (0..2)
        .map(|_| to_base36(rng.random_range(0..36)))
        .collect();
    let stamp = to_base36(now.timestamp_millis().max(0) as u64);
    let tail = &stamp[stamp.len().saturating_sub(4)..];
    format!("{prefix}-{tail:0>4}")
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn generate<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Profile {
    let industry = &INDUSTRIES[rng.random_range(0..INDUSTRIES.len())];
    let job_title = pick(rng, JOBS);

    let moods: Vec<(&str, u32)> = MOODS.iter().map(|(m, w, _)| (*m, *w)).collect();
    let mood = *weighted_choice(rng, &moods);

    let (lo, hi) = industry.income;
    let income_usd = round_thousand(rand_int(rng, lo, hi));

    let risk = risk_score(rand_range(rng, 10.0, 90.0), income_usd, mood);

    let count = rng.random_range(MIN_INTERESTS..=MAX_INTERESTS);
    let mut pool: Vec<&str> = INTERESTS.to_vec();
    pool.shuffle(rng);
    let interests = pool.into_iter().take(count).map(str::to_string).collect();

    let seen_ago = TimeDelta::seconds(rng.random_range(0..ACTIVE_WINDOW.as_secs()) as i64);

    Profile {
        id: make_id(rng, now),
        name: format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES)),
        age: rand_int(rng, 19, 67) as u32,
        gender: pick(rng, GENDERS).to_string(),
        job_title: job_title.to_string(),
        industry: industry.name.to_string(),
        income_usd,
        education: pick(rng, EDUCATION).to_string(),
        city: pick(rng, CITIES).to_string(),
        relationship_status: pick(rng, RELATIONSHIP).to_string(),
        emotional_state: mood.to_string(),
        activity: pick(rng, ACTIVITIES).to_string(),
        interests,
        risk_score: risk,
        last_active: format_timestamp(now - seen_ago),
    }
}
