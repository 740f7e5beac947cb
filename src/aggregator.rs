use crate::models::{TokenStatus, ValidationResult};

/// Collects results into input order.
///
/// Each token owns one slot; results may arrive in any order.
#[derive(Debug)]
pub struct ResultAggregator {
    labels: Vec<String>,
    slots: Vec<Option<ValidationResult>>,
    required_scopes: Vec<String>,
    recorded: usize,
}

/// 集計結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub errors: usize,
    /// Valid tokens that also hold every required scope
    pub meeting_requirements: usize,
}

/// True when `granted` contains every entry of `required`.
pub fn meets_scopes(granted: &[String], required: &[String]) -> bool {
    required.iter().all(|scope| granted.contains(scope))
}

impl ResultAggregator {
    /// `labels[i]` is the display form of token `i`, used for placeholders.
    pub fn new(labels: Vec<String>, required_scopes: Vec<String>) -> Self {
        let slots = vec![None; labels.len()];
        Self {
            labels,
            slots,
            required_scopes,
            recorded: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn recorded(&self) -> usize {
        self.recorded
    }

    /// Stores `result` in its slot. A second result for the same index or an
    /// out-of-range index is ignored.
    pub fn record(&mut self, mut result: ValidationResult) {
        let index = result.index;
        let Some(slot) = self.slots.get_mut(index) else {
            tracing::error!("Dropping result for unknown token index {}", index);
            return;
        };
        if slot.is_some() {
            tracing::error!("Duplicate result for token #{}, keeping the first", index + 1);
            return;
        }

        result.meets_required_scopes =
            result.valid && meets_scopes(&result.scopes, &self.required_scopes);
        if result.valid && !result.meets_required_scopes {
            tracing::info!(
                "{} is valid but lacks required scopes (has: {})",
                result.token,
                if result.scopes.is_empty() {
                    "none".to_string()
                } else {
                    result.scopes.join(",")
                }
            );
        }

        *slot = Some(result);
        self.recorded += 1;
    }

    /// Results in input order; slots never filled become `error` results.
    pub fn finish(self) -> Vec<ValidationResult> {
        self.slots
            .into_iter()
            .zip(self.labels)
            .enumerate()
            .map(|(index, (slot, label))| {
                slot.unwrap_or_else(|| {
                    tracing::error!("No result recorded for token #{}", index + 1);
                    ValidationResult::missing(index, label)
                })
            })
            .collect()
    }
}

impl Summary {
    pub fn from_results(results: &[ValidationResult]) -> Self {
        results.iter().fold(
            Summary {
                total: results.len(),
                ..Summary::default()
            },
            |mut summary, result| {
                match result.status {
                    TokenStatus::Valid => summary.valid += 1,
                    TokenStatus::Invalid => summary.invalid += 1,
                    TokenStatus::Error => summary.errors += 1,
                }
                if result.meets_required_scopes {
                    summary.meeting_requirements += 1;
                }
                summary
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn result(index: usize, status: TokenStatus, granted: &[&str]) -> ValidationResult {
        let mut r = ValidationResult::missing(index, format!("tok{}", index));
        r.status = status;
        r.valid = status == TokenStatus::Valid;
        r.scopes = scopes(granted);
        r.error = None;
        r.attempts = 1;
        r
    }

    #[test]
    fn test_meets_scopes_superset() {
        let required = scopes(&["repo", "read:org"]);
        assert!(meets_scopes(&scopes(&["repo", "read:org"]), &required));
        assert!(meets_scopes(&scopes(&["gist", "read:org", "repo"]), &required));
        assert!(!meets_scopes(&scopes(&["repo"]), &required));
        assert!(!meets_scopes(&[], &required));
        assert!(meets_scopes(&[], &[]));
    }

    #[test]
    fn test_results_are_reassembled_in_input_order() {
        let labels = (0..4).map(|i| format!("tok{}", i)).collect();
        let mut agg = ResultAggregator::new(labels, Vec::new());
        for i in [2, 0, 3, 1] {
            agg.record(result(i, TokenStatus::Valid, &[]));
        }
        assert_eq!(agg.recorded(), 4);
        let indices: Vec<usize> = agg.finish().iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_missing_slots_become_errors() {
        let labels = vec!["a".to_string(), "b".to_string()];
        let mut agg = ResultAggregator::new(labels, Vec::new());
        agg.record(result(1, TokenStatus::Valid, &[]));
        let results = agg.finish();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, TokenStatus::Error);
        assert_eq!(results[0].token, "a");
        assert!(results[1].valid);
    }

    #[test]
    fn test_duplicate_and_out_of_range_results_are_ignored() {
        let mut agg = ResultAggregator::new(vec!["a".to_string()], Vec::new());
        agg.record(result(0, TokenStatus::Valid, &[]));
        agg.record(result(0, TokenStatus::Invalid, &[]));
        agg.record(result(5, TokenStatus::Invalid, &[]));
        assert_eq!(agg.recorded(), 1);
        assert!(agg.finish()[0].valid);
    }

    #[test]
    fn test_min_scopes_flag() {
        let labels = (0..3).map(|i| format!("tok{}", i)).collect();
        let mut agg = ResultAggregator::new(labels, scopes(&["repo", "read:org"]));
        agg.record(result(0, TokenStatus::Valid, &["repo", "read:org", "gist"]));
        agg.record(result(1, TokenStatus::Valid, &["repo"]));
        agg.record(result(2, TokenStatus::Invalid, &["repo", "read:org"]));
        let results = agg.finish();
        assert!(results[0].meets_required_scopes);
        assert!(!results[1].meets_required_scopes);
        assert!(!results[2].meets_required_scopes);

        let summary = Summary::from_results(&results);
        assert_eq!(
            summary,
            Summary {
                total: 3,
                valid: 2,
                invalid: 1,
                errors: 0,
                meeting_requirements: 1,
            }
        );
    }
}
