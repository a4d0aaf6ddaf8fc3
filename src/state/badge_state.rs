use crate::types::{Badge, Tier};

/// Achievement table. Nothing mutates it after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeState {
    badges: Vec<Badge>,
}

impl BadgeState {
    pub fn seeded() -> Self {
        let seed = [
            ("top10-social", "Top 10 in Social", "Among the top 10 users in social mini apps", "👥", Tier::Gold, 100),
            ("defi-explorer", "DeFi Explorer", "Explored 5+ different mini apps", "📈", Tier::Silver, 100),
            ("volume-master", "Volume Master", "Generated $50K+ in transaction volume", "👛", Tier::Platinum, 100),
            ("early-adopter", "Early Adopter", "Active in first 30 days of mini app launch", "⚡", Tier::Silver, 100),
            ("trending-hunter", "Trending Hunter", "Trade on 3 mini apps before they hit 10K users", "🎯", Tier::Gold, 67),
            ("power-user", "Power User", "Complete 100 transactions in a single day", "🏅", Tier::Bronze, 42),
        ];
        let badges = seed
            .into_iter()
            .map(|(id, title, description, icon, tier, progress)| Badge {
                id: id.to_string(),
                title: title.to_string(),
                description: description.to_string(),
                icon: icon.to_string(),
                tier,
                earned: progress == 100,
                progress,
            })
            .collect();
        Self { badges }
    }

    /// Wrap a badge table received from elsewhere, e.g. the snapshot API.
    pub fn from_badges(badges: Vec<Badge>) -> Self {
        Self { badges }
    }

    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    pub fn earned(&self) -> Vec<&Badge> {
        self.badges.iter().filter(|b| b.earned).collect()
    }

    pub fn in_progress(&self) -> Vec<&Badge> {
        self.badges.iter().filter(|b| !b.earned).collect()
    }
}

impl Default for BadgeState {
    fn default() -> Self {
        Self::seeded()
    }
}
