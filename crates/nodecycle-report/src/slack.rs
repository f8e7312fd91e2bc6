//! Slack delivery of the run report.
//!
//! Builds a `chat.postMessage` payload with one color-coded attachment
//! and posts it with a bot token. Long lists are chunked into paginated
//! fields so a big cluster never overflows a single attachment field.

use std::time::Duration;

use serde_json::{Value, json};
use tracing::info;

use nodecycle_optimizer::RunOutcome;

use crate::error::ReportError;
use crate::render::{Severity, message, severity, short_duration, short_text, title};

const COLOR_GREEN: &str = "#00FF00";
const COLOR_ORANGE: &str = "#FFA500";
const COLOR_RED: &str = "#FF0000";

/// Max lines per attachment field before pagination kicks in.
const BULK_MAX_LINES: usize = 20;

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

fn color(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => COLOR_GREEN,
        Severity::Warning => COLOR_ORANGE,
        Severity::Failure => COLOR_RED,
    }
}

fn code_block(lines: &[String]) -> String {
    format!("```\n{}\n```", lines.join("\n"))
}

fn short_field(title: &str, value: String) -> Value {
    json!({ "title": title, "value": value, "short": true })
}

/// Append `values` as one field, or as `(i/n)`-numbered fields when the
/// list exceeds the per-field line budget.
fn append_lines(fields: &mut Vec<Value>, title: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    if values.len() < BULK_MAX_LINES {
        fields.push(json!({ "title": title, "value": code_block(values) }));
        return;
    }
    let pages = values.len().div_ceil(BULK_MAX_LINES);
    for (index, chunk) in values.chunks(BULK_MAX_LINES).enumerate() {
        fields.push(json!({
            "title": format!("{} ({}/{})", title, index + 1, pages),
            "value": code_block(chunk),
        }));
    }
}

/// Build the `chat.postMessage` payload for a run outcome.
pub fn payload(channel: &str, outcome: &RunOutcome, elapsed: Duration) -> Value {
    let sev = severity(outcome);
    let cluster_name = outcome
        .cluster
        .as_ref()
        .map_or_else(|| "unknown".to_string(), |c| c.name.clone());

    let mut fields = vec![
        short_field("Cluster name", cluster_name),
        short_field("Cluster nodes count", outcome.nodes.len().to_string()),
    ];
    if let Some(selection) = &outcome.selection {
        fields.push(short_field(
            "Preemptible nodes count",
            selection.preemptible_actual.to_string(),
        ));
        fields.push(short_field(
            "Preemptible nodes minimum count",
            selection.preemptible_floor.to_string(),
        ));
    }
    fields.push(short_field("Elapsed", short_duration(elapsed)));

    if let Some(selection) = &outcome.selection {
        let pools: Vec<String> = selection
            .active_pools
            .iter()
            .enumerate()
            .map(|(i, p)| {
                format!(
                    "- {:02}: {} (preemptible={}, autoscale={})",
                    i + 1,
                    p.name,
                    p.preemptible,
                    p.autoscale
                )
            })
            .collect();
        append_lines(&mut fields, "Active node pools", &pools);

        let nodes: Vec<String> = outcome
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| {
                format!(
                    "- {:02}: {} (age={}, pods={:02})",
                    i + 1,
                    n.name,
                    short_duration(n.age),
                    n.pods.len()
                )
            })
            .collect();
        append_lines(&mut fields, "Active nodes", &nodes);

        for (field_title, target) in [
            ("Refresh target preemptible node", &selection.target_preemptible),
            (
                "Refresh target ondemand autoscale node",
                &selection.target_ondemand,
            ),
        ] {
            if let Some(node) = target {
                let mut lines = vec![format!(
                    "{} (age={}, pods={:02})",
                    node.name,
                    short_duration(node.age),
                    node.pods.len()
                )];
                for (i, pod) in outcome.evicted_pods_on(&node.name).iter().enumerate() {
                    lines.push(format!(
                        "- {:02}: {} (ns={})",
                        i + 1,
                        short_text(&pod.name, 40),
                        pod.namespace
                    ));
                }
                append_lines(&mut fields, field_title, &lines);
            }
        }
    }

    fields.push(json!({
        "title": "Message",
        "value": code_block(&[message(outcome)]),
    }));

    json!({
        "channel": channel,
        "text": title(sev),
        "unfurl_links": false,
        "attachments": [{ "color": color(sev), "fields": fields }],
    })
}

/// Posts run reports to a Slack channel via a bot token.
pub struct SlackReporter {
    client: reqwest::Client,
    token: String,
    channel: String,
}

impl SlackReporter {
    pub fn new(token: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            channel: channel.into(),
        }
    }

    /// Post the report. The Slack API signals failure in-band with
    /// `ok: false`, which is surfaced as `ReportError::Slack`.
    pub async fn post(&self, outcome: &RunOutcome, elapsed: Duration) -> Result<(), ReportError> {
        let body = payload(&self.channel, outcome, elapsed);
        let response: Value = self
            .client
            .post(POST_MESSAGE_URL)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        if response.get("ok").and_then(Value::as_bool) != Some(true) {
            let reason = response
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            return Err(ReportError::Slack(reason));
        }
        info!(channel = %self.channel, "posted run report to slack");
        Ok(())
    }
}

/// Report sink chosen at startup: Slack when credentials exist,
/// otherwise nothing.
pub enum Reporter {
    Noop,
    Slack(SlackReporter),
}

impl Reporter {
    /// Build from optional credentials; both must be present for Slack.
    pub fn from_credentials(token: Option<String>, channel: Option<String>) -> Self {
        match (token, channel) {
            (Some(token), Some(channel)) if !token.is_empty() && !channel.is_empty() => {
                Reporter::Slack(SlackReporter::new(token, channel))
            }
            _ => Reporter::Noop,
        }
    }

    pub async fn report(&self, outcome: &RunOutcome, elapsed: Duration) -> Result<(), ReportError> {
        match self {
            Reporter::Noop => Ok(()),
            Reporter::Slack(slack) => slack.post(outcome, elapsed).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use nodecycle_model::{Cluster, ClusterStatus, Node, Pod, PodPhase};
    use nodecycle_select::SelectionResult;

    fn spot_node(name: &str, pods: usize) -> Node {
        Node {
            name: name.to_string(),
            pool: "spot".to_string(),
            region: "asia-northeast1".to_string(),
            zone: "asia-northeast1-a".to_string(),
            ready: true,
            schedulable: true,
            preemptible: true,
            age: Duration::from_secs(7200),
            pods: (0..pods)
                .map(|i| Pod {
                    name: format!("{name}-pod-{i}"),
                    namespace: "default".to_string(),
                    node_name: name.to_string(),
                    phase: PodPhase::Running,
                })
                .collect(),
        }
    }

    fn sample_outcome(node_count: usize) -> RunOutcome {
        let nodes: Vec<Node> = (0..node_count)
            .map(|i| spot_node(&format!("gke-prod-spot-{i}"), 1))
            .collect();
        RunOutcome {
            cluster: Some(Cluster {
                name: "prod".to_string(),
                region: "asia-northeast1".to_string(),
                status: ClusterStatus::Running,
                pools: Vec::new(),
            }),
            nodes: nodes.clone(),
            selection: Some(SelectionResult {
                preemptible_floor: 1,
                preemptible_actual: node_count as u32,
                active_pools: Vec::new(),
                target_preemptible: nodes.first().cloned(),
                target_ondemand: None,
                refresh_targets: vec!["gke-prod-spot-0".to_string()],
            }),
            node_outcomes: Vec::new(),
            evicted_pods: Vec::new(),
            error: None,
        }
    }

    fn fields(value: &Value) -> &Vec<Value> {
        value["attachments"][0]["fields"].as_array().unwrap()
    }

    #[test]
    fn payload_carries_channel_color_and_counts() {
        let outcome = sample_outcome(3);
        let value = payload("#ops", &outcome, Duration::from_secs(65));
        assert_eq!(value["channel"], "#ops");
        assert_eq!(value["attachments"][0]["color"], COLOR_GREEN);
        let counts: Vec<&Value> = fields(&value)
            .iter()
            .filter(|f| f["title"] == "Cluster nodes count")
            .collect();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0]["value"], "3");
    }

    #[test]
    fn failure_payload_is_red_with_error_message() {
        let mut outcome = sample_outcome(1);
        outcome.error = Some(nodecycle_optimizer::OptimizeError::Inventory(
            nodecycle_model::GatewayError::Api("quota exceeded".to_string()),
        ));
        let value = payload("#ops", &outcome, Duration::from_secs(5));
        assert_eq!(value["attachments"][0]["color"], COLOR_RED);
        let msg = fields(&value)
            .iter()
            .find(|f| f["title"] == "Message")
            .unwrap();
        assert!(msg["value"].as_str().unwrap().contains("quota exceeded"));
    }

    #[test]
    fn long_node_lists_paginate() {
        let outcome = sample_outcome(45);
        let value = payload("#ops", &outcome, Duration::from_secs(5));
        let titles: Vec<String> = fields(&value)
            .iter()
            .filter_map(|f| f["title"].as_str())
            .filter(|t| t.starts_with("Active nodes"))
            .map(str::to_string)
            .collect();
        assert_eq!(
            titles,
            vec![
                "Active nodes (1/3)".to_string(),
                "Active nodes (2/3)".to_string(),
                "Active nodes (3/3)".to_string()
            ]
        );
    }

    #[test]
    fn reporter_without_credentials_is_noop() {
        assert!(matches!(
            Reporter::from_credentials(None, Some("#ops".to_string())),
            Reporter::Noop
        ));
        assert!(matches!(
            Reporter::from_credentials(Some(String::new()), Some("#ops".to_string())),
            Reporter::Noop
        ));
        assert!(matches!(
            Reporter::from_credentials(Some("xoxb-1".to_string()), Some("#ops".to_string())),
            Reporter::Slack(_)
        ));
    }
}
