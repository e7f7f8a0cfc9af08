//! Research runner: issues research queries concurrently against the LLM
//! and folds the results into a prompt-injectable block.
//!
//! Every query is bounded by a timeout. A failed or timed-out query is
//! recorded and skipped; research never fails a conversation turn.

use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm_client::{ChatMessage, CompletionService};
use crate::research::prompts::{RESEARCH_CONTEXT_HEADER, RESEARCH_SYSTEM};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchFinding {
    pub query: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchOutcome {
    pub findings: Vec<ResearchFinding>,
    pub failed_queries: Vec<String>,
}

/// Per-request research progress. Owned by the request handler and updated
/// from the runner's return value; nothing here is shared across requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchSession {
    pub is_researching: bool,
    pub queries: Vec<String>,
    pub completed: usize,
    pub failed: usize,
}

impl ResearchSession {
    pub fn begin(&mut self, queries: &[String]) {
        self.is_researching = true;
        self.queries = queries.to_vec();
        self.completed = 0;
        self.failed = 0;
    }

    pub fn finish(&mut self, outcome: &ResearchOutcome) {
        self.is_researching = false;
        self.completed = outcome.findings.len();
        self.failed = outcome.failed_queries.len();
    }
}

async fn run_query(
    llm: &dyn CompletionService,
    query: &str,
    timeout: Duration,
) -> Result<ResearchFinding, String> {
    let messages = [ChatMessage::user(query)];
    match tokio::time::timeout(timeout, llm.complete(&messages, RESEARCH_SYSTEM)).await {
        Ok(Ok(summary)) if !summary.trim().is_empty() => Ok(ResearchFinding {
            query: query.to_string(),
            summary: summary.trim().to_string(),
        }),
        Ok(Ok(_)) => Err("empty research summary".to_string()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("timed out after {}s", timeout.as_secs())),
    }
}

/// Runs all queries concurrently; findings keep query order.
pub async fn run_research(
    llm: &dyn CompletionService,
    queries: &[String],
    timeout: Duration,
) -> ResearchOutcome {
    let results = join_all(queries.iter().map(|q| run_query(llm, q, timeout))).await;

    let mut outcome = ResearchOutcome::default();
    for (query, result) in queries.iter().zip(results) {
        match result {
            Ok(finding) => outcome.findings.push(finding),
            Err(reason) => {
                warn!("Research query {query:?} failed: {reason}");
                outcome.failed_queries.push(query.clone());
            }
        }
    }

    info!(
        "Research finished: {} findings, {} failed",
        outcome.findings.len(),
        outcome.failed_queries.len()
    );
    outcome
}

/// `None` when there is nothing worth injecting.
pub fn format_research_context(outcome: &ResearchOutcome) -> Option<String> {
    if outcome.findings.is_empty() {
        return None;
    }
    let mut block = format!("{RESEARCH_CONTEXT_HEADER}\n");
    for finding in &outcome.findings {
        block.push_str(&format!("\n### {}\n{}\n", finding.query, finding.summary));
    }
    Some(block)
}
