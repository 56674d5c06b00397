mod config;
pub mod builder;
pub mod flow;
pub mod manual;
pub mod quick_start;

use log::{debug, info};

use std::collections::{BTreeMap, HashMap};

pub use crate::config::*;

// **** Private structures ****

// Running counts for one group of responses.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
struct ScoreTally {
    total: u64,
    with_score: u64,
    promoters: u64,
    passives: u64,
    detractors: u64,
    score_sum: u64,
}

impl ScoreTally {
    fn add(&mut self, record: &ResponseRecord) {
        self.total += 1;
        // Missing or out of range scores only count in the total.
        if let Some(score) = record.valid_score() {
            self.with_score += 1;
            self.score_sum += score as u64;
            match Tier::classify(score) {
                Tier::Promoter => self.promoters += 1,
                Tier::Passive => self.passives += 1,
                Tier::Detractor => self.detractors += 1,
            }
        }
    }

    fn to_summary(self) -> Summary {
        Summary {
            total: self.total,
            with_score: self.with_score,
            promoters: self.promoters,
            passives: self.passives,
            detractors: self.detractors,
            mean_score: mean_score(self.score_sum, self.with_score),
            net_score_percentage: net_score_percentage(
                self.promoters,
                self.detractors,
                self.with_score,
            ),
        }
    }
}

// Integer division rounded to the nearest integer, ties away from zero.
// The denominator is strictly positive.
fn round_half_away(num: i64, den: i64) -> i64 {
    let q = (2 * num.abs() + den) / (2 * den);
    if num < 0 {
        -q
    } else {
        q
    }
}

/// The share of promoters minus the share of detractors, as a rounded percentage.
///
/// Returns `None` when no response carried a score.
pub fn net_score_percentage(promoters: u64, detractors: u64, with_score: u64) -> Option<i64> {
    if with_score == 0 {
        return None;
    }
    let diff = promoters as i64 - detractors as i64;
    Some(round_half_away(diff * 100, with_score as i64))
}

/// The mean of the scores, rounded to one decimal.
///
/// Returns `None` when there is nothing to average.
pub fn mean_score(score_sum: u64, with_score: u64) -> Option<f64> {
    if with_score == 0 {
        return None;
    }
    let tenths = round_half_away(score_sum as i64 * 10, with_score as i64);
    Some(tenths as f64 / 10.0)
}

/// Summary over the whole collection.
pub fn summarize_overall(responses: &[ResponseRecord]) -> Summary {
    let mut tally = ScoreTally::default();
    for r in responses.iter() {
        tally.add(r);
    }
    debug!("summarize_overall: {:?}", tally);
    tally.to_summary()
}

/// One summary per distinct key.
///
/// Responses for which `key_fn` returns `None` do not belong to any group.
/// Groups are returned in the order in which their key first appears. A group
/// takes the first non-empty name returned by `name_fn` among its responses,
/// and falls back to its key when there is none.
pub fn summarize_by_key<K, N>(responses: &[ResponseRecord], key_fn: K, name_fn: N) -> Vec<GroupSummary>
where
    K: Fn(&ResponseRecord) -> Option<String>,
    N: Fn(&ResponseRecord) -> Option<String>,
{
    // Key -> position in `groups`
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Option<String>, ScoreTally)> = Vec::new();
    let mut skipped: u64 = 0;
    for r in responses.iter() {
        let key = match key_fn(r) {
            Some(k) => k,
            None => {
                skipped += 1;
                continue;
            }
        };
        let idx = match positions.get(&key) {
            Some(idx) => *idx,
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, None, ScoreTally::default()));
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        if group.1.is_none() {
            group.1 = name_fn(r).filter(|n| !n.is_empty());
        }
        group.2.add(r);
    }
    debug!(
        "summarize_by_key: {} groups, {} responses without key",
        groups.len(),
        skipped
    );
    groups
        .into_iter()
        .map(|(id, name, tally)| GroupSummary {
            name: name.unwrap_or_else(|| id.clone()),
            id,
            summary: tally.to_summary(),
        })
        .collect()
}

/// One bucket per calendar month, oldest first.
pub fn summarize_by_month<M>(responses: &[ResponseRecord], month_of: M) -> Vec<MonthSummary>
where
    M: Fn(&ResponseRecord) -> MonthKey,
{
    let mut buckets: BTreeMap<MonthKey, ScoreTally> = BTreeMap::new();
    for r in responses.iter() {
        buckets.entry(month_of(r)).or_default().add(r);
    }
    buckets
        .iter()
        .map(|(month, tally)| MonthSummary {
            month: month.key(),
            label: month.label(),
            count: tally.total,
            with_score: tally.with_score,
            mean_score: mean_score(tally.score_sum, tally.with_score),
        })
        .collect()
}

/// The `limit` most recently submitted responses, newest first.
///
/// Responses submitted at the same instant keep their input order.
pub fn recent_responses(responses: &[ResponseRecord], limit: usize) -> Vec<RecentResponse> {
    let mut sorted: Vec<&ResponseRecord> = responses.iter().collect();
    // sort_by is stable
    sorted.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    sorted
        .into_iter()
        .take(limit)
        .map(|r| {
            let score = r.valid_score();
            RecentResponse {
                id: r.id.clone(),
                group_name: r.campaign_name.clone(),
                unit_name: r.unit_name.clone(),
                score,
                tier: score.map(Tier::classify),
                submitted_at: r.submitted_at,
            }
        })
        .collect()
}

/// Computes all the views of a report.
///
/// Arguments:
/// * `responses` the stored responses, in arrival order
/// * `rules` the options that control the report
pub fn build_report(responses: &[ResponseRecord], rules: &ReportRules) -> Report {
    info!(
        "Processing {:?} responses, rules: {:?}",
        responses.len(),
        rules
    );
    let overall = summarize_overall(responses);
    info!(
        "Overall: {} responses, {} with score, net score {:?}",
        overall.total, overall.with_score, overall.net_score_percentage
    );

    let by_campaign = summarize_by_key(
        responses,
        |r| Some(r.campaign_id.clone()),
        |r| Some(r.campaign_name.clone()),
    );
    let by_unit = summarize_by_key(responses, |r| r.unit_id.clone(), |r| r.unit_name.clone());
    let offset = rules.utc_offset_minutes;
    let by_month = summarize_by_month(responses, |r| MonthKey::with_offset(&r.submitted_at, offset));
    let recent = recent_responses(responses, rules.recent_limit);
    debug!(
        "build_report: {} campaigns, {} units, {} months",
        by_campaign.len(),
        by_unit.len(),
        by_month.len()
    );

    Report {
        overall,
        by_campaign,
        by_unit,
        by_month,
        recent_responses: recent,
    }
}
