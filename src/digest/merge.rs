use crate::digest::client::{Completion, ModelSettings};
use crate::digest::normalize::normalize_response;
use crate::digest::prompts::{SYSTEM_PROMPT, build_merge_prompt};
use crate::error::SummarizationError;

/// Folds ordered partial summaries into one document with a single extra call.
pub struct SummaryMerger<'a> {
    client: &'a dyn Completion,
    settings: &'a ModelSettings,
}

impl<'a> SummaryMerger<'a> {
    pub fn new(client: &'a dyn Completion, settings: &'a ModelSettings) -> Self {
        Self { client, settings }
    }

    pub fn merge(&self, partials: &[String]) -> Result<String, SummarizationError> {
        tracing::info!(parts = partials.len(), "merging partial summaries");
        let request = self
            .settings
            .request(SYSTEM_PROMPT, build_merge_prompt(partials));
        let merged = self
            .client
            .complete(&request)
            .and_then(|reply| {
                let text = normalize_response(&reply);
                if text.is_empty() {
                    Err(SummarizationError::EmptyResponse)
                } else {
                    Ok(text)
                }
            })
            .map_err(|err| SummarizationError::MergeFailed(Box::new(err)))?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::test_support::FnCompletion;
    use std::error::Error;

    fn settings() -> ModelSettings {
        ModelSettings {
            model: "m".to_string(),
            temperature: 0.3,
            max_tokens: 100,
        }
    }

    #[test]
    fn merge_sends_labeled_parts_once() {
        let client = FnCompletion::new(|_| Ok("```\n#### api\n- merged\n```".to_string()));
        let settings = settings();
        let merger = SummaryMerger::new(&client, &settings);

        let merged = merger
            .merge(&["alpha".to_string(), "beta".to_string()])
            .expect("merge succeeds");
        assert_eq!(merged, "#### api\n- merged");
        assert_eq!(client.calls(), 1);
        let prompt = client.requests.borrow()[0].user_content().to_string();
        assert!(prompt.contains("=== Part 1 ===\nalpha"));
        assert!(prompt.contains("=== Part 2 ===\nbeta"));
    }

    #[test]
    fn merge_failure_wraps_cause() {
        let client = FnCompletion::new(|_| Err(SummarizationError::Timeout(
            std::time::Duration::from_secs(120),
        )));
        let settings = settings();
        let merger = SummaryMerger::new(&client, &settings);

        let err = merger
            .merge(&["a".to_string(), "b".to_string()])
            .expect_err("merge must fail");
        assert!(matches!(err, SummarizationError::MergeFailed(_)));
        let source = err.source().expect("cause is attached");
        assert!(source.to_string().contains("120"));
    }
}
