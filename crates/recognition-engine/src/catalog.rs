//! 内置徽章目录
//!
//! 启动时按 slug 幂等写入；已存在的条目会被更新为这里的定义。

use tracing::{info, instrument};

use crate::error::Result;
use crate::models::{BadgeTier, NewBadgeDefinition, TriggerKind};
use crate::repository::BadgeRepositoryTrait;

/// (slug, 名称, 描述, 等级, 分类, 触发类型, 阈值)
type Seed = (
    &'static str,
    &'static str,
    &'static str,
    BadgeTier,
    &'static str,
    TriggerKind,
    Option<i32>,
);

fn seeds() -> Vec<Seed> {
    use BadgeTier::{Bronze, Gold, Silver};
    use TriggerKind::*;

    vec![
        // onboarding
        ("hello-world", "Hello World", "First day on the team. Welcome!", Bronze, "onboarding", FirstAction, None),
        ("first-pr", "First PR", "First Pull Request approved and merged.", Bronze, "onboarding", PullRequests, Some(1)),
        ("first-review", "First Review", "First code review completed.", Bronze, "onboarding", CodeReviews, Some(1)),
        // coding
        ("code-ninja", "Code Ninja", "Clean, fast, and efficient code.", Silver, "coding", PullRequests, Some(10)),
        ("bug-hunter", "Bug Hunter", "Detects and fixes bugs before production.", Silver, "coding", IssuesClosed, Some(20)),
        // collaboration
        ("team-spirit", "Team Spirit", "Keeps team morale high.", Silver, "collaboration", KudosReceived, Some(50)),
        ("code-reviewer", "Code Reviewer", "Detailed and constructive reviews.", Silver, "collaboration", CodeReviews, Some(100)),
        ("feedback-friend", "Feedback Friend", "Always gives constructive feedback.", Bronze, "collaboration", KudosSent, Some(20)),
        ("mentor", "Mentor", "Guides new teammates.", Bronze, "collaboration", Manual, None),
        // leadership
        ("crisis-averted", "Crisis Averted", "Saved the deploy at a critical moment.", Gold, "leadership", Manual, None),
        ("tech-lead", "Tech Lead", "Leads technical decisions with vision.", Gold, "leadership", Manual, None),
        // documentation
        ("docs-hero", "Docs Hero", "Clear documentation for the whole team.", Bronze, "documentation", Manual, None),
        // special
        ("anniversary-1", "1 Year", "1 year at the organization.", Bronze, "special", TenureDays, Some(365)),
        ("anniversary-3", "3 Years", "3 years at the organization.", Silver, "special", TenureDays, Some(1095)),
        ("anniversary-5", "5 Years", "5 years at the organization.", Gold, "special", TenureDays, Some(1825)),
        ("mvp", "MVP", "Most Valuable Player of the quarter.", Gold, "special", Manual, None),
        ("legend", "Legend", "Legendary contribution to the team.", Gold, "special", Manual, None),
        // community
        ("resonancia", "Resonance", "Received first peer-to-peer badge.", Bronze, "community", PeerAwardsCount, Some(1)),
        ("vinculo-fuerte", "Strong Bond", "Received 5+ peer badges from different colleagues.", Silver, "community", PeerAwardsCount, Some(5)),
        ("alma-del-equipo", "Team Soul", "Received 10+ peer badges. True team pillar.", Gold, "community", PeerAwardsCount, Some(10)),
        ("generous-spirit", "Generous Spirit", "Awarded all available peer badges this year.", Silver, "community", ManualPeerAward, None),
        // premium
        ("patron-seed", "Patron Seed", "Early supporter of the platform.", Bronze, "premium", Investment, None),
        ("patron-growth", "Patron Growth", "Sustained supporter with continued investment.", Silver, "premium", Investment, None),
        ("patron-bloom", "Patron Bloom", "Major supporter enabling platform growth.", Gold, "premium", Investment, None),
    ]
}

/// 内置目录
pub fn default_catalog() -> Vec<NewBadgeDefinition> {
    seeds()
        .into_iter()
        .map(
            |(slug, name, description, tier, category, trigger_kind, threshold)| {
                NewBadgeDefinition {
                    slug: slug.to_string(),
                    name: name.to_string(),
                    description: description.to_string(),
                    tier,
                    category: category.to_string(),
                    trigger_kind,
                    threshold,
                    is_active: true,
                }
            },
        )
        .collect()
}

/// 将内置目录写入仓储，返回写入条数
#[instrument(skip(repo))]
pub async fn seed_catalog(repo: &dyn BadgeRepositoryTrait) -> Result<usize> {
    let catalog = default_catalog();
    for badge in &catalog {
        repo.upsert(badge).await?;
    }
    info!(count = catalog.len(), "内置徽章目录已写入");
    Ok(catalog.len())
}
