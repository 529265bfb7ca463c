use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use super::overdue::is_overdue;
use super::rate_percent;
use super::types::{ProblematicTag, TagStats};
use crate::model::Task;

/// Bucket for tasks that carry no tags.
pub const UNTAGGED: &str = "untagged";

/// Minimum sample before a tag can be flagged.
pub const PROBLEM_MIN_TASKS: u64 = 3;

#[derive(Default)]
struct Counts {
    total: u64,
    completed: u64,
    overdue: u64,
}

/// Per-tag counters over `tasks`, busiest tag first.
///
/// Tags are trimmed and de-duplicated within a task; a task left with no tags
/// lands in [`UNTAGGED`]. Ties on `total` are ordered by tag name.
pub fn aggregate_by_tag(tasks: &[Task], now: NaiveDateTime) -> Vec<TagStats> {
    let mut counts: BTreeMap<&str, Counts> = BTreeMap::new();

    for task in tasks {
        let mut tags: Vec<&str> = task
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        tags.sort_unstable();
        tags.dedup();
        if tags.is_empty() {
            tags.push(UNTAGGED);
        }

        let completed = task.is_completed();
        let overdue = is_overdue(task, now);
        for tag in tags {
            let c = counts.entry(tag).or_default();
            c.total += 1;
            if completed {
                c.completed += 1;
            }
            if overdue {
                c.overdue += 1;
            }
        }
    }

    let mut stats: Vec<TagStats> = counts
        .into_iter()
        .map(|(tag, c)| TagStats {
            tag: tag.to_string(),
            total: c.total,
            completed: c.completed,
            active: c.total - c.completed,
            overdue: c.overdue,
            completion_rate: rate_percent(c.completed, c.total),
            overdue_rate: rate_percent(c.overdue, c.total),
        })
        .collect();

    // Stable sort over name-ordered input keeps name order within equal totals.
    stats.sort_by(|a, b| b.total.cmp(&a.total));
    stats
}

/// Tags with at least [`PROBLEM_MIN_TASKS`] tasks of which more than 30% are
/// overdue, worst first.
pub fn problematic_tags(stats: &[TagStats]) -> Vec<ProblematicTag> {
    let mut flagged: Vec<ProblematicTag> = stats
        .iter()
        .filter(|s| s.total >= PROBLEM_MIN_TASKS && s.overdue * 10 > s.total * 3)
        .map(|s| ProblematicTag {
            tag: s.tag.clone(),
            total: s.total,
            overdue: s.overdue,
            overdue_rate: s.overdue_rate,
        })
        .collect();

    // Compare exact ratios rather than the rounded percentages.
    flagged.sort_by(|a, b| {
        (b.overdue * a.total)
            .cmp(&(a.overdue * b.total))
            .then_with(|| a.tag.cmp(&b.tag))
    });
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskStatus;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn tagged(id: &str, tags: &[&str]) -> Task {
        let mut t = Task::new(id, id, "2024-01-01");
        t.tags = tags.iter().map(|s| s.to_string()).collect();
        t
    }

    fn overdue(mut t: Task) -> Task {
        t.due_date = Some("2024-01-01".to_string());
        t
    }

    fn completed(mut t: Task) -> Task {
        t.status = TaskStatus::Completed;
        t
    }

    fn find<'a>(stats: &'a [TagStats], tag: &str) -> &'a TagStats {
        stats.iter().find(|s| s.tag == tag).unwrap()
    }

    #[test]
    fn test_multi_tag_attribution_is_full() {
        let stats = aggregate_by_tag(&[completed(tagged("t1", &["ops", "finance"]))], now());
        assert_eq!(stats.len(), 2);
        let ops = find(&stats, "ops");
        let finance = find(&stats, "finance");
        assert_eq!((ops.total, ops.completed), (1, 1));
        assert_eq!((finance.total, finance.completed), (1, 1));
        assert_eq!(ops.completion_rate, 100);
    }

    #[test]
    fn test_untagged_sentinel() {
        let stats = aggregate_by_tag(&[tagged("t1", &[]), tagged("t2", &["  "])], now());
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].tag, UNTAGGED);
        assert_eq!(stats[0].total, 2);
        assert_eq!(stats[0].active, 2);
    }

    #[test]
    fn test_duplicate_tags_count_once_per_task() {
        let stats = aggregate_by_tag(&[tagged("t1", &["ops", " ops", "ops"])], now());
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total, 1);
    }

    #[test]
    fn test_sorted_by_total_then_name() {
        let tasks = vec![
            tagged("t1", &["zeta"]),
            tagged("t2", &["alpha"]),
            tagged("t3", &["mid"]),
            tagged("t4", &["mid"]),
        ];
        let stats = aggregate_by_tag(&tasks, now());
        let order: Vec<&str> = stats.iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(order, vec!["mid", "alpha", "zeta"]);
    }

    #[test]
    fn test_billing_scenario() {
        let mut tasks = vec![
            overdue(tagged("b1", &["billing"])),
            overdue(tagged("b2", &["billing"])),
            completed(tagged("b3", &["billing"])),
        ];
        for i in 0..7 {
            tasks.push(tagged(&format!("o{i}"), &["other"]));
        }
        assert_eq!(tasks.len(), 10);

        let stats = aggregate_by_tag(&tasks, now());
        let billing = find(&stats, "billing");
        assert_eq!(billing.total, 3);
        assert_eq!(billing.overdue, 2);
        assert_eq!(billing.completed, 1);
        assert_eq!(billing.active, 2);
        assert_eq!(billing.overdue_rate, 67);

        let problems = problematic_tags(&stats);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].tag, "billing");
        assert_eq!(problems[0].overdue_rate, 67);
    }

    #[test]
    fn test_problem_thresholds() {
        let stat = |tag: &str, total: u64, overdue: u64| TagStats {
            tag: tag.to_string(),
            total,
            completed: 0,
            active: total,
            overdue,
            completion_rate: 0,
            overdue_rate: rate_percent(overdue, total),
        };
        let stats = vec![
            // too small a sample
            stat("tiny", 2, 2),
            // exactly 30% is not above the cutoff
            stat("edge", 10, 3),
            stat("bad", 10, 4),
            stat("worse", 4, 3),
        ];
        let problems = problematic_tags(&stats);
        let names: Vec<&str> = problems.iter().map(|p| p.tag.as_str()).collect();
        assert_eq!(names, vec!["worse", "bad"]);
    }
}
