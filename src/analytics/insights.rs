use serde::Serialize;

use super::types::ProblematicTag;

/// Above this many critical tasks the dashboard suggests re-planning.
const CRITICAL_TASK_ALERT: u64 = 5;

/// Aggregates the insight rules read from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InsightInputs {
    pub total_tasks: u64,
    pub overdue_tasks: u64,
    pub recurring_tasks: u64,
    pub completed_this_week: u64,
    pub created_this_week: u64,
    pub critical_priority_count: u64,
    /// The highest-ranked problematic tag, if any.
    pub worst_problematic_tag: Option<ProblematicTag>,
}

/// Human-readable observations, in a fixed rule order. Each rule adds at most
/// one line.
pub fn derive_insights(inputs: &InsightInputs) -> Vec<String> {
    let mut out = Vec::new();

    if inputs.overdue_tasks > 0 {
        out.push(format!(
            "{} {} overdue and {} attention",
            inputs.overdue_tasks,
            if inputs.overdue_tasks == 1 { "task is" } else { "tasks are" },
            if inputs.overdue_tasks == 1 { "needs" } else { "need" }
        ));
    }

    if let Some(tag) = &inputs.worst_problematic_tag {
        out.push(format!(
            "Tag \"{}\" has a {}% overdue rate ({} of {} tasks)",
            tag.tag, tag.overdue_rate, tag.overdue, tag.total
        ));
    }

    // recurring > total / 2, kept in integers
    if inputs.recurring_tasks * 2 > inputs.total_tasks {
        out.push(format!(
            "{} of {} tasks are recurring; consider automating them",
            inputs.recurring_tasks, inputs.total_tasks
        ));
    }

    if inputs.completed_this_week > inputs.created_this_week {
        out.push(format!(
            "Completed {} tasks this week against {} created; the backlog is shrinking",
            inputs.completed_this_week, inputs.created_this_week
        ));
    }

    if inputs.critical_priority_count > CRITICAL_TASK_ALERT {
        out.push(format!(
            "{} tasks are marked critical; review resource planning",
            inputs.critical_priority_count
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_dashboard_has_no_insights() {
        let inputs = InsightInputs {
            total_tasks: 10,
            recurring_tasks: 5,
            completed_this_week: 2,
            created_this_week: 2,
            critical_priority_count: 5,
            ..Default::default()
        };
        assert!(derive_insights(&inputs).is_empty());
    }

    #[test]
    fn test_overdue_rule() {
        let one = derive_insights(&InsightInputs {
            total_tasks: 3,
            overdue_tasks: 1,
            ..Default::default()
        });
        assert_eq!(one, vec!["1 task is overdue and needs attention".to_string()]);

        let many = derive_insights(&InsightInputs {
            total_tasks: 3,
            overdue_tasks: 3,
            ..Default::default()
        });
        assert!(many[0].starts_with("3 tasks are overdue"));
    }

    #[test]
    fn test_problem_tag_rule_names_worst_tag() {
        let insights = derive_insights(&InsightInputs {
            total_tasks: 10,
            worst_problematic_tag: Some(ProblematicTag {
                tag: "billing".to_string(),
                total: 3,
                overdue: 2,
                overdue_rate: 67,
            }),
            ..Default::default()
        });
        assert_eq!(insights.len(), 1);
        assert!(insights[0].contains("\"billing\""));
        assert!(insights[0].contains("67%"));
    }

    #[test]
    fn test_recurring_rule_is_strictly_above_half() {
        let at_half = derive_insights(&InsightInputs {
            total_tasks: 10,
            recurring_tasks: 5,
            ..Default::default()
        });
        assert!(at_half.is_empty());

        let above = derive_insights(&InsightInputs {
            total_tasks: 10,
            recurring_tasks: 6,
            ..Default::default()
        });
        assert_eq!(above.len(), 1);
        assert!(above[0].contains("automating"));
    }

    #[test]
    fn test_trend_and_critical_rules() {
        let insights = derive_insights(&InsightInputs {
            total_tasks: 20,
            completed_this_week: 4,
            created_this_week: 3,
            critical_priority_count: 6,
            ..Default::default()
        });
        assert_eq!(insights.len(), 2);
        assert!(insights[0].contains("backlog is shrinking"));
        assert!(insights[1].contains("6 tasks are marked critical"));
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let insights = derive_insights(&InsightInputs {
            total_tasks: 10,
            overdue_tasks: 2,
            recurring_tasks: 8,
            completed_this_week: 5,
            created_this_week: 1,
            critical_priority_count: 9,
            worst_problematic_tag: Some(ProblematicTag {
                tag: "ops".to_string(),
                total: 4,
                overdue: 2,
                overdue_rate: 50,
            }),
        });
        assert_eq!(insights.len(), 5);
        assert!(insights[0].contains("2 tasks are overdue and need attention"));
        assert!(insights[1].contains("\"ops\""));
        assert!(insights[2].contains("recurring"));
        assert!(insights[3].contains("this week"));
        assert!(insights[4].contains("critical"));
    }
}
