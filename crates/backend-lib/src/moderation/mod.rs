// ============================
// crates/backend-lib/src/moderation/mod.rs
// ============================
//! Deterministic content scoring over a fixed category table.
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const FLAG_THRESHOLD: f64 = 0.3;
const REMOVE_THRESHOLD: f64 = 0.6;
const MIN_SPAM_LINKS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Profanity,
    Hate,
    Violence,
    Spam,
    PersonalInfo,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Profanity,
        Category::Hate,
        Category::Violence,
        Category::Spam,
        Category::PersonalInfo,
    ];

    pub fn weight(self) -> f64 {
        match self {
            Category::Profanity => 0.4,
            Category::Hate => 0.6,
            Category::Violence => 0.6,
            Category::Spam => 0.3,
            Category::PersonalInfo => 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    Allow,
    Flag,
    Remove,
}

impl ModerationAction {
    pub fn for_score(score: f64) -> Self {
        if score >= REMOVE_THRESHOLD {
            ModerationAction::Remove
        } else if score >= FLAG_THRESHOLD {
            ModerationAction::Flag
        } else {
            ModerationAction::Allow
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationScore {
    /// Weighted severity in `[0, 1]`
    pub score: f64,
    pub action: ModerationAction,
    pub categories: Vec<Category>,
}

fn word_list(words: &[&str]) -> Regex {
    let alternatives = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).unwrap()
}

static PROFANITY: LazyLock<Regex> = LazyLock::new(|| {
    word_list(&["damn", "crap", "shit", "bullshit", "fuck", "fucking", "bastard", "asshole"])
});
static HATE: LazyLock<Regex> = LazyLock::new(|| {
    word_list(&["subhuman", "vermin", "inferior race", "go back to your country", "degenerates"])
});
static VIOLENCE: LazyLock<Regex> = LazyLock::new(|| {
    word_list(&["kill", "murder", "shoot", "stab", "bomb", "assassinate", "lynch", "beat up"])
});
static SPAM_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    word_list(&["buy now", "click here", "free money", "limited offer", "act now", "work from home"])
});
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)https?://\S+").unwrap());
static PERSONAL_INFO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
        r"|\b\d{3}[-. ]\d{3,4}[-. ]\d{4}\b",
        r"|\b\d{3}-\d{2}-\d{4}\b",
        r"|\b\d{6}-\d{7}\b",
    ))
    .unwrap()
});

fn matches(category: Category, content: &str) -> bool {
    match category {
        Category::Profanity => PROFANITY.is_match(content),
        Category::Hate => HATE.is_match(content),
        Category::Violence => VIOLENCE.is_match(content),
        Category::Spam => {
            SPAM_PHRASES.is_match(content) || LINK.find_iter(content).count() >= MIN_SPAM_LINKS
        }
        Category::PersonalInfo => PERSONAL_INFO.is_match(content),
    }
}

/// Score `content`. Each category counts once, however often it matches.
pub fn score_content(content: &str) -> ModerationScore {
    let categories: Vec<Category> = Category::ALL
        .into_iter()
        .filter(|category| matches(*category, content))
        .collect();

    let sum: f64 = categories.iter().map(|c| c.weight()).sum();
    // two decimals keeps 0.4 + 0.2 from landing just above 0.6
    let score = ((sum * 100.0).round() / 100.0).min(1.0);

    ModerationScore {
        score,
        action: ModerationAction::for_score(score),
        categories,
    }
}
