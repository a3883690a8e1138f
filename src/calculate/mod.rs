//! Statistics calculation engine.
//!
//! Reduces a set of match records into an [`AggregateStats`] for one player.
//! Everything here is pure: the same records always give the same summary.

use crate::models::{AggregateStats, MatchRecord, Puuid};

/// Floor for per-match minutes so a zero-length match cannot divide by zero.
const MIN_MINUTES: f64 = 1e-6;

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Calculate KDA across aggregated totals. Deaths are floored at 1.
pub fn calculate_kda(kills: u64, deaths: u64, assists: u64) -> f64 {
    (kills + assists) as f64 / deaths.max(1) as f64
}

/// Calculate creep score per minute.
pub fn calculate_cs_per_min(creep_score: u64, minutes: f64) -> f64 {
    if minutes > 0.0 {
        creep_score as f64 / minutes
    } else {
        0.0
    }
}

/// Most frequent champion; on equal counts the one seen first wins.
///
/// Counts are kept in first-seen order and the scan only replaces the
/// leader on a strictly greater count.
pub fn most_played<'a>(champions: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: Vec<(&str, u32)> = Vec::new();
    for champion in champions {
        match counts.iter_mut().find(|(name, _)| *name == champion) {
            Some((_, count)) => *count += 1,
            None => counts.push((champion, 1)),
        }
    }

    let mut leader: Option<(&str, u32)> = None;
    for (name, count) in counts {
        if leader.map_or(true, |(_, best)| count > best) {
            leader = Some((name, count));
        }
    }

    leader.map(|(name, _)| name.to_string())
}

/// Summarize `matches` from the point of view of `puuid`.
///
/// Matches without an entry for the player are skipped.
pub fn summarize(puuid: &Puuid, matches: &[MatchRecord]) -> AggregateStats {
    let mut games = 0u32;
    // Totals are widened so absurd upstream counts cannot overflow.
    let (mut kills, mut deaths, mut assists, mut creep_score) = (0u64, 0u64, 0u64, 0u64);
    let mut minutes = 0.0f64;
    let mut champions = Vec::new();

    for record in matches {
        let Some(me) = record.participant(puuid) else {
            continue;
        };

        games += 1;
        kills += u64::from(me.kills);
        deaths += u64::from(me.deaths);
        assists += u64::from(me.assists);
        creep_score += me.creep_score();
        minutes += (record.duration_seconds / 60.0).max(MIN_MINUTES);
        champions.push(me.champion_name.as_str());
    }

    if games == 0 {
        return AggregateStats::default();
    }

    AggregateStats {
        games,
        avg_kda: round2(calculate_kda(kills, deaths, assists)),
        avg_cs_per_min: round2(calculate_cs_per_min(creep_score, minutes)),
        top_champion: most_played(champions),
    }
}
