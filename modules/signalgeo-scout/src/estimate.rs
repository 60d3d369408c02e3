//! Engagement heuristics collectors use to score raw posts before they become
//! signals. Every estimate is clamped into `[0, 1]` and rounded to two places.
//!
//! [`crate::posts::RawPost`] applies these when reading raw post dumps; outside
//! collectors that emit finished signals can call them directly.

use chrono::{DateTime, Utc};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn unit(value: f64) -> f64 {
    round2(value).clamp(0.0, 1.0)
}

/// Hours between `published` and `now`, never negative.
pub fn hours_old(published: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    ((now - published).num_seconds() as f64 / 3600.0).max(0.0)
}

// --- Forum threads (reddit) ---

/// Discussion relative to approval: `comments / (upvotes + 1)`.
pub fn forum_entropy(upvotes: u64, comments: u64) -> f64 {
    unit(comments as f64 / (upvotes as f64 + 1.0))
}

/// Score per hour, in hundreds. Brand-new posts are maximally fast.
pub fn forum_velocity(score: i64, hours_old: f64) -> f64 {
    if hours_old == 0.0 {
        return 1.0;
    }
    unit(score as f64 / hours_old / 100.0)
}

/// Upvote ratio, assuming 0.8 when the forum hides it.
pub fn forum_impact(upvote_ratio: Option<f64>) -> f64 {
    unit(upvote_ratio.unwrap_or(0.8))
}

// --- Microblog posts (twitter) ---

pub fn microblog_entropy(reposts: u64, likes: u64) -> f64 {
    unit(reposts as f64 / (likes as f64 + 1.0))
}

pub fn microblog_velocity(likes: u64, hours_old: f64) -> f64 {
    if hours_old == 0.0 {
        return 1.0;
    }
    unit(likes as f64 / hours_old / 100.0)
}

/// Reach in thousands of likes.
pub fn microblog_impact(likes: u64) -> f64 {
    unit((likes as f64 + 1.0) / 1000.0)
}

// --- News articles ---

/// Longer articles carry more room for reinterpretation.
pub fn news_entropy(content: &str) -> f64 {
    unit(content.chars().count() as f64 / 1000.0)
}

/// Decays with age: `1 / (hours + 1)`.
pub fn news_velocity(hours_old: f64) -> f64 {
    unit(1.0 / (hours_old + 1.0))
}

pub fn news_impact(entropy: f64, velocity: f64) -> f64 {
    unit(entropy + velocity)
}
