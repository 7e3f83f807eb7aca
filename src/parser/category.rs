use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Economic Collapse")]
    EconomicCollapse,
    #[serde(rename = "Tech Apocalypse")]
    TechApocalypse,
    #[serde(rename = "Environmental Doom")]
    EnvironmentalDoom,
    #[serde(rename = "Political Catastrophe")]
    PoliticalCatastrophe,
    #[serde(rename = "Health Crisis")]
    HealthCrisis,
    #[serde(rename = "Social Breakdown")]
    SocialBreakdown,
    #[serde(rename = "Food & Resource Scarcity")]
    FoodAndResourceScarcity,
    #[serde(rename = "War & Conflict")]
    WarAndConflict,
}

/// Used when no keyword matches.
pub const DEFAULT_CATEGORY: Category = Category::PoliticalCatastrophe;

impl Category {
    /// Enumeration order; ties in scoring go to the earlier entry.
    pub const ALL: [Category; 8] = [
        Category::EconomicCollapse,
        Category::TechApocalypse,
        Category::EnvironmentalDoom,
        Category::PoliticalCatastrophe,
        Category::HealthCrisis,
        Category::SocialBreakdown,
        Category::FoodAndResourceScarcity,
        Category::WarAndConflict,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::EconomicCollapse => "Economic Collapse",
            Category::TechApocalypse => "Tech Apocalypse",
            Category::EnvironmentalDoom => "Environmental Doom",
            Category::PoliticalCatastrophe => "Political Catastrophe",
            Category::HealthCrisis => "Health Crisis",
            Category::SocialBreakdown => "Social Breakdown",
            Category::FoodAndResourceScarcity => "Food & Resource Scarcity",
            Category::WarAndConflict => "War & Conflict",
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::EconomicCollapse => &[
                "economy", "financial", "stock", "crash", "bank", "depression", "debt",
                "dollar", "inflation", "recession",
            ],
            Category::TechApocalypse => &[
                "computer", "internet", "ai", "robot", "nuclear plant", "technology",
                "software", "cyber", "y2k",
            ],
            Category::EnvironmentalDoom => &[
                "climate", "ozone", "pollution", "asteroid", "comet", "flood", "ice age",
                "warming", "cooling", "sea level", "extinction", "biodiversity",
            ],
            Category::PoliticalCatastrophe => &[
                "war", "election", "government", "fascism", "communism", "dictatorship",
                "coup", "democracy",
            ],
            Category::HealthCrisis => &[
                "pandemic", "plague", "virus", "disease", "epidemic", "flu", "cancer", "aids",
                "ebola", "bacteria",
            ],
            Category::SocialBreakdown => &[
                "crime", "drugs", "violence", "moral", "youth", "media", "society", "culture",
            ],
            Category::FoodAndResourceScarcity => &[
                "food", "famine", "hunger", "water", "oil", "energy", "resource", "population",
                "starvation",
            ],
            Category::WarAndConflict => &[
                "nuclear war", "world war", "armageddon", "invasion", "missile", "bomb",
                "military",
            ],
        }
    }

    /// Number of this category's keywords occurring in already-lowercased text.
    fn score(self, lowered: &str) -> usize {
        self.keywords()
            .iter()
            .filter(|kw| lowered.contains(*kw))
            .count()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword-scored guess. Always returns a category.
pub fn guess_category(text: &str) -> Category {
    let lowered = text.to_lowercase();
    let mut best = DEFAULT_CATEGORY;
    let mut best_score = 0;
    for category in Category::ALL {
        let score = category.score(&lowered);
        if score > best_score {
            best = category;
            best_score = score;
        }
    }
    best
}
