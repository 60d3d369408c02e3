// Raw collector posts.
//
// Collectors that cannot score their own output dump raw engagement counts
// instead. RawPostFileSource turns those dumps into signals with the
// heuristics in `estimate`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use signalgeo_common::Signal;

use crate::estimate::{
    forum_entropy, forum_impact, forum_velocity, hours_old, microblog_entropy, microblog_impact,
    microblog_velocity, news_entropy, news_impact, news_velocity,
};
use crate::sources::SignalSource;

/// Router node that stands in for the news aggregator a story came through.
const NEWS_AGGREGATOR: &str = "news_aggregator_ai";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawPost {
    /// A forum thread (reddit).
    Forum {
        id: String,
        subreddit: String,
        title: String,
        score: i64,
        num_comments: u64,
        #[serde(default)]
        upvote_ratio: Option<f64>,
        created_utc: DateTime<Utc>,
        #[serde(default)]
        route: Vec<String>,
    },
    /// A microblog post (twitter) fetched for a seed node's account.
    Microblog {
        id: String,
        node: String,
        text: String,
        likes: u64,
        reposts: u64,
        created_at: DateTime<Utc>,
    },
    /// A news article found for a topic query.
    News {
        id: String,
        topic: String,
        title: String,
        content: String,
        published_at: DateTime<Utc>,
    },
}

fn headline(text: &str) -> String {
    text.chars().take(80).collect()
}

impl RawPost {
    /// Score the post as of `now`.
    pub fn into_signal(self, now: DateTime<Utc>) -> Signal {
        match self {
            RawPost::Forum {
                id,
                subreddit,
                title,
                score,
                num_comments,
                upvote_ratio,
                created_utc,
                route,
            } => {
                let age = hours_old(created_utc, now);
                let mut signal = Signal::new(
                    format!("{subreddit}_{id}"),
                    title.clone(),
                    title,
                    subreddit.clone(),
                    created_utc,
                    forum_entropy(score.max(0) as u64, num_comments),
                    forum_velocity(score, age),
                )
                .with_route(route)
                .with_topic(subreddit);
                signal.impact = forum_impact(upvote_ratio);
                signal
            }
            RawPost::Microblog {
                id,
                node,
                text,
                likes,
                reposts,
                created_at,
            } => {
                let age = hours_old(created_at, now);
                let mut signal = Signal::new(
                    format!("{node}_{id}"),
                    headline(&text),
                    text,
                    "twitter",
                    created_at,
                    microblog_entropy(reposts, likes),
                    microblog_velocity(likes, age),
                )
                .with_route([node.clone()]);
                signal.impact = microblog_impact(likes);
                signal.seed_node = Some(node);
                signal
            }
            RawPost::News {
                id,
                topic,
                title,
                content,
                published_at,
            } => {
                let entropy = news_entropy(&content);
                let velocity = news_velocity(hours_old(published_at, now));
                let mut signal = Signal::new(
                    id,
                    headline(&title),
                    content,
                    "newsapi",
                    published_at,
                    entropy,
                    velocity,
                )
                .with_route([NEWS_AGGREGATOR])
                .with_topic(topic);
                signal.impact = news_impact(entropy, velocity);
                signal
            }
        }
    }
}

/// A JSON array of raw posts on disk, scored when fetched.
pub struct RawPostFileSource {
    name: String,
    path: PathBuf,
    now: Option<DateTime<Utc>>,
}

impl RawPostFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: format!("posts:{}", path.display()),
            path,
            now: None,
        }
    }

    /// Pin the scoring clock instead of using the fetch time.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

#[async_trait]
impl SignalSource for RawPostFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<Signal>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let posts: Vec<RawPost> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse posts in {}", self.path.display()))?;
        let now = self.now.unwrap_or_else(Utc::now);
        Ok(posts.into_iter().map(|post| post.into_signal(now)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn forum_thread_is_scored_from_engagement() {
        let post = RawPost::Forum {
            id: "abc".into(),
            subreddit: "worldnews".into(),
            title: "Leaders meet".into(),
            score: 300,
            num_comments: 75,
            upvote_ratio: None,
            created_utc: Utc.with_ymd_and_hms(2025, 1, 1, 2, 0, 0).unwrap(),
            route: vec![],
        };

        let signal = post.into_signal(now());
        assert_eq!(signal.id, "worldnews_abc");
        assert_eq!(signal.topic.as_deref(), Some("worldnews"));
        assert_eq!(signal.entropy, 0.25); // 75 / 301
        assert_eq!(signal.velocity, 0.3); // 300 / 10h / 100
        assert_eq!(signal.impact, 0.8);
        assert!(signal.validate().is_ok());
    }

    #[test]
    fn microblog_post_starts_at_its_seed_node() {
        let post = RawPost::Microblog {
            id: "42".into(),
            node: "elon_musk".into(),
            text: "x".repeat(120),
            likes: 999,
            reposts: 100,
            created_at: now(),
        };

        let signal = post.into_signal(now());
        assert_eq!(signal.id, "elon_musk_42");
        assert_eq!(signal.source, "twitter");
        assert_eq!(signal.title.chars().count(), 80);
        assert_eq!(signal.route, vec!["elon_musk"]);
        assert_eq!(signal.seed_node.as_deref(), Some("elon_musk"));
        assert_eq!(signal.entropy, 0.1);
        assert_eq!(signal.velocity, 1.0);
        assert_eq!(signal.impact, 1.0);
    }

    #[test]
    fn news_article_routes_through_aggregator() {
        let post = RawPost::News {
            id: "ukraine_0".into(),
            topic: "ukraine".into(),
            title: "Talks resume".into(),
            content: "y".repeat(300),
            published_at: Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
        };

        let signal = post.into_signal(now());
        assert_eq!(signal.source, "newsapi");
        assert_eq!(signal.route, vec![NEWS_AGGREGATOR]);
        assert_eq!(signal.entropy, 0.3);
        assert_eq!(signal.velocity, 0.25);
        assert_eq!(signal.impact, 0.55);
    }

    #[test]
    fn posts_are_tagged_by_kind() {
        let json = r#"[
            {"kind": "news", "id": "n1", "topic": "ukraine", "title": "t",
             "content": "c", "published_at": "2025-01-01T09:00:00Z"}
        ]"#;
        let posts: Vec<RawPost> = serde_json::from_str(json).unwrap();
        assert!(matches!(posts[0], RawPost::News { .. }));
    }
}
