//! Severity mapping and plain-text rendering.

use std::fmt::Write as _;
use std::time::Duration;

use nodecycle_model::Node;
use nodecycle_optimizer::RunOutcome;

/// How loudly the run result should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Everything went through and only preemptible capacity was touched.
    Success,
    /// The run succeeded but drained an autoscaled on-demand node;
    /// capacity headroom deserves a look.
    Warning,
    /// The run failed.
    Failure,
}

/// Classify a run outcome.
pub fn severity(outcome: &RunOutcome) -> Severity {
    if outcome.error.is_some() {
        return Severity::Failure;
    }
    let touched_ondemand = outcome
        .selection
        .as_ref()
        .is_some_and(|s| s.target_ondemand.is_some());
    if touched_ondemand {
        Severity::Warning
    } else {
        Severity::Success
    }
}

/// Headline for the report.
pub fn title(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "Succeeded in optimizing cluster nodes.",
        Severity::Warning => {
            "Succeeded in optimizing cluster nodes, but there are some things to check."
        }
        Severity::Failure => "Failed to optimize cluster nodes.",
    }
}

/// One-line run message.
pub fn message(outcome: &RunOutcome) -> String {
    match (&outcome.error, severity(outcome)) {
        (Some(error), _) => error.to_string(),
        (None, Severity::Warning) => {
            "All tasks completed, but an autoscaled on-demand node was drained. \
             Check that capacity headroom is sufficient."
                .to_string()
        }
        (None, _) => "All tasks completed.".to_string(),
    }
}

fn node_line(index: usize, node: &Node) -> String {
    format!(
        "- {:02}: {} (age={}, pods={:02})",
        index + 1,
        node.name,
        short_duration(node.age),
        node.pods.len()
    )
}

/// Render the full run summary as plain text.
pub fn render_text(outcome: &RunOutcome, elapsed: Duration) -> String {
    let mut out = String::new();
    let sev = severity(outcome);
    let _ = writeln!(out, "{}", title(sev));

    match &outcome.cluster {
        Some(cluster) => {
            let _ = writeln!(
                out,
                "cluster: {} (region={}, nodes={})",
                cluster.name,
                cluster.region,
                outcome.nodes.len()
            );
        }
        None => {
            let _ = writeln!(out, "cluster: unknown");
        }
    }

    if let Some(selection) = &outcome.selection {
        let _ = writeln!(
            out,
            "preemptible nodes: actual={} minimum={}",
            selection.preemptible_actual, selection.preemptible_floor
        );
        if !selection.active_pools.is_empty() {
            let _ = writeln!(out, "active node pools:");
            for (i, pool) in selection.active_pools.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "- {:02}: {} (preemptible={}, autoscale={})",
                    i + 1,
                    pool.name,
                    pool.preemptible,
                    pool.autoscale
                );
            }
        }
        if !outcome.nodes.is_empty() {
            let _ = writeln!(out, "active nodes:");
            for (i, node) in outcome.nodes.iter().enumerate() {
                let _ = writeln!(out, "{}", node_line(i, node));
            }
        }
        if let Some(node) = &selection.target_preemptible {
            let _ = writeln!(out, "refresh target preemptible node:");
            let _ = writeln!(out, "{}", node_line(0, node));
            for (i, pod) in outcome.evicted_pods_on(&node.name).iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  - {:02}: {} (ns={})",
                    i + 1,
                    short_text(&pod.name, 40),
                    pod.namespace
                );
            }
        }
        if let Some(node) = &selection.target_ondemand {
            let _ = writeln!(out, "refresh target ondemand autoscale node:");
            let _ = writeln!(out, "{}", node_line(0, node));
            for (i, pod) in outcome.evicted_pods_on(&node.name).iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  - {:02}: {} (ns={})",
                    i + 1,
                    short_text(&pod.name, 40),
                    pod.namespace
                );
            }
        }
    }

    let _ = writeln!(out, "elapsed: {}", short_duration(elapsed));
    let _ = writeln!(out, "message: {}", message(outcome));
    out
}

/// Shorten a duration to its most significant unit, e.g. `03h` for
/// 3h23m16s.
pub fn short_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 86_400 {
        format!("{:02}d", secs / 86_400)
    } else if secs >= 3_600 {
        format!("{:02}h", secs / 3_600)
    } else if secs >= 60 {
        format!("{:02}m", secs / 60)
    } else {
        format!("{secs:02}s")
    }
}

/// Truncate `text` to at most `max` characters, appending an ellipsis
/// when anything was cut.
pub fn short_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use nodecycle_model::{Cluster, ClusterStatus, Pod, PodPhase};
    use nodecycle_select::SelectionResult;

    fn target_node(name: &str, preemptible: bool, pods: usize) -> Node {
        Node {
            name: name.to_string(),
            pool: "spot".to_string(),
            region: "asia-northeast1".to_string(),
            zone: "asia-northeast1-a".to_string(),
            ready: true,
            schedulable: true,
            preemptible,
            age: Duration::from_secs(3 * 3600 + 23 * 60),
            pods: (0..pods)
                .map(|i| Pod {
                    name: format!("pod-{i}"),
                    namespace: "default".to_string(),
                    node_name: name.to_string(),
                    phase: PodPhase::Running,
                })
                .collect(),
        }
    }

    fn outcome_with(target_ondemand: Option<Node>) -> RunOutcome {
        RunOutcome {
            cluster: Some(Cluster {
                name: "prod".to_string(),
                region: "asia-northeast1".to_string(),
                status: ClusterStatus::Running,
                pools: Vec::new(),
            }),
            nodes: vec![target_node("gke-prod-spot-a", true, 1)],
            selection: Some(SelectionResult {
                preemptible_floor: 2,
                preemptible_actual: 3,
                active_pools: Vec::new(),
                target_preemptible: Some(target_node("gke-prod-spot-a", true, 1)),
                target_ondemand,
                refresh_targets: vec!["gke-prod-spot-a".to_string()],
            }),
            node_outcomes: Vec::new(),
            evicted_pods: vec![Pod {
                name: "pod-0".to_string(),
                namespace: "default".to_string(),
                node_name: "gke-prod-spot-a".to_string(),
                phase: PodPhase::Running,
            }],
            error: None,
        }
    }

    #[test]
    fn clean_preemptible_only_run_is_success() {
        let outcome = outcome_with(None);
        assert_eq!(severity(&outcome), Severity::Success);
    }

    #[test]
    fn touching_ondemand_capacity_is_a_warning() {
        let outcome = outcome_with(Some(target_node("gke-prod-ondemand-b", false, 4)));
        assert_eq!(severity(&outcome), Severity::Warning);
        assert!(message(&outcome).contains("headroom"));
    }

    #[test]
    fn failed_run_is_failure_with_error_message() {
        let mut outcome = outcome_with(None);
        outcome.error = Some(nodecycle_optimizer::OptimizeError::Inventory(
            nodecycle_model::GatewayError::Api("boom".to_string()),
        ));
        assert_eq!(severity(&outcome), Severity::Failure);
        assert!(message(&outcome).contains("boom"));
    }

    #[test]
    fn text_report_lists_targets_and_evictions() {
        let outcome = outcome_with(None);
        let text = render_text(&outcome, Duration::from_secs(90));
        assert!(text.contains("preemptible nodes: actual=3 minimum=2"));
        assert!(text.contains("gke-prod-spot-a (age=03h, pods=01)"));
        assert!(text.contains("pod-0 (ns=default)"));
        assert!(text.contains("elapsed: 01m"));
    }

    #[test]
    fn short_duration_picks_most_significant_unit() {
        assert_eq!(short_duration(Duration::from_secs(3 * 86_400)), "03d");
        assert_eq!(short_duration(Duration::from_secs(3 * 3600 + 23 * 60)), "03h");
        assert_eq!(short_duration(Duration::from_secs(5 * 60 + 30)), "05m");
        assert_eq!(short_duration(Duration::from_secs(42)), "42s");
    }

    #[test]
    fn short_text_truncates_with_ellipsis() {
        assert_eq!(short_text("short", 40), "short");
        let long = "a".repeat(50);
        let cut = short_text(&long, 40);
        assert_eq!(cut.chars().count(), 41);
        assert!(cut.ends_with('…'));
    }
}
