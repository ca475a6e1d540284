//! Per-factor-type rubric evaluators.
//!
//! A closed lookup table keyed by [`RiskFactorType`]; each evaluator is a
//! standalone `(evidence, rubric) -> score` function so it can be tested in
//! isolation. Evaluators never fail: anything unreadable or unmatched scores
//! the neutral default.

use serde_json::Value;

use crate::model::Rubric;
use crate::scoring::RiskScoringEngine;
use crate::types::RiskFactorType;

/// A factor evaluator: evidence payload + rubric to a 0-100 score.
pub type FactorEvaluator = fn(&Value, &Rubric) -> f64;

/// Look up the evaluator for a factor type.
#[must_use]
pub fn evaluator_for(factor_type: RiskFactorType) -> FactorEvaluator {
    match factor_type {
        RiskFactorType::Coverage => evaluate_coverage,
        RiskFactorType::Security => evaluate_security,
        RiskFactorType::Testing => evaluate_testing,
        RiskFactorType::Rollback => evaluate_rollback,
        RiskFactorType::Scope => evaluate_scope,
    }
}

const NEUTRAL: f64 = RiskScoringEngine::NEUTRAL_SCORE;

/// Rollback plans shorter than this read as "minimal".
const MIN_ROLLBACK_PLAN_CHARS: usize = 100;

/// Test coverage percentage against numeric bands.
fn evaluate_coverage(evidence: &Value, rubric: &Rubric) -> f64 {
    evidence
        .pointer("/test_results/coverage_percent")
        .and_then(Value::as_f64)
        .and_then(|coverage| rubric.points_for_value(coverage))
        .unwrap_or(NEUTRAL)
}

/// Combined critical + high security finding count against count bands.
fn evaluate_security(evidence: &Value, rubric: &Rubric) -> f64 {
    let scan = match evidence.pointer("/security_scan") {
        Some(scan) => scan,
        None => return NEUTRAL,
    };

    let critical = scan.get("critical_count").and_then(Value::as_u64);
    let high = scan.get("high_count").and_then(Value::as_u64);

    match (critical, high) {
        (None, None) => NEUTRAL,
        (critical, high) => {
            let findings = critical.unwrap_or(0) + high.unwrap_or(0);
            rubric
                .points_for_value(findings as f64)
                .unwrap_or(NEUTRAL)
        }
    }
}

/// Manual test execution status against categorical bands.
fn evaluate_testing(evidence: &Value, rubric: &Rubric) -> f64 {
    evidence
        .pointer("/manual_testing/status")
        .and_then(Value::as_str)
        .and_then(|status| rubric.points_for_label(status))
        .unwrap_or(NEUTRAL)
}

/// Rollback plan presence/length heuristic against categorical bands.
///
/// Absence of a plan is itself signal: it maps to the `missing` label rather
/// than the neutral default.
fn evaluate_rollback(evidence: &Value, rubric: &Rubric) -> f64 {
    let plan = evidence
        .pointer("/rollback_plan")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");

    let label = if plan.is_empty() {
        "missing"
    } else if plan.chars().count() < MIN_ROLLBACK_PLAN_CHARS {
        "minimal"
    } else {
        "documented"
    };

    rubric.points_for_label(label).unwrap_or(NEUTRAL)
}

/// Affected component count against count bands.
///
/// Accepts either a list of component names or a bare count.
fn evaluate_scope(evidence: &Value, rubric: &Rubric) -> f64 {
    let components = match evidence.pointer("/deployment_scope/affected_components") {
        Some(Value::Array(items)) => Some(items.len() as f64),
        Some(value) => value.as_f64(),
        None => None,
    };

    components
        .and_then(|count| rubric.points_for_value(count))
        .unwrap_or(NEUTRAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coverage_rubric() -> Rubric {
        Rubric::new([(">90", 10.0), ("80-90", 30.0), ("<80", 70.0)])
    }

    #[test]
    fn test_coverage_bands() {
        let rubric = coverage_rubric();

        let high = json!({"test_results": {"coverage_percent": 92.0}});
        assert_eq!(evaluate_coverage(&high, &rubric), 10.0);

        let mid = json!({"test_results": {"coverage_percent": 85.0}});
        assert_eq!(evaluate_coverage(&mid, &rubric), 30.0);

        let low = json!({"test_results": {"coverage_percent": 60.0}});
        assert_eq!(evaluate_coverage(&low, &rubric), 70.0);
    }

    #[test]
    fn test_coverage_missing_is_neutral() {
        let rubric = coverage_rubric();
        assert_eq!(evaluate_coverage(&json!({}), &rubric), NEUTRAL);

        let wrong_type = json!({"test_results": {"coverage_percent": "ninety"}});
        assert_eq!(evaluate_coverage(&wrong_type, &rubric), NEUTRAL);
    }

    #[test]
    fn test_security_sums_critical_and_high() {
        let rubric = Rubric::new([("0", 5.0), ("1-5", 50.0), (">5", 90.0)]);

        let clean = json!({"security_scan": {"critical_count": 0, "high_count": 0}});
        assert_eq!(evaluate_security(&clean, &rubric), 5.0);

        let some = json!({"security_scan": {"critical_count": 1, "high_count": 3}});
        assert_eq!(evaluate_security(&some, &rubric), 50.0);

        let many = json!({"security_scan": {"critical_count": 4, "high_count": 4}});
        assert_eq!(evaluate_security(&many, &rubric), 90.0);
    }

    #[test]
    fn test_security_partial_counts_still_score() {
        let rubric = Rubric::new([("0", 5.0), (">=1", 60.0)]);

        // Only one of the two counters present.
        let partial = json!({"security_scan": {"critical_count": 2}});
        assert_eq!(evaluate_security(&partial, &rubric), 60.0);

        let no_counts = json!({"security_scan": {"scanner": "trivy"}});
        assert_eq!(evaluate_security(&no_counts, &rubric), NEUTRAL);
    }

    #[test]
    fn test_testing_status_labels() {
        let rubric = Rubric::new([("passed", 10.0), ("partial", 50.0), ("failed", 90.0)]);

        let passed = json!({"manual_testing": {"status": "passed"}});
        assert_eq!(evaluate_testing(&passed, &rubric), 10.0);

        let unknown = json!({"manual_testing": {"status": "skipped"}});
        assert_eq!(evaluate_testing(&unknown, &rubric), NEUTRAL);
    }

    #[test]
    fn test_rollback_plan_heuristic() {
        let rubric = Rubric::new([("documented", 10.0), ("minimal", 50.0), ("missing", 90.0)]);

        assert_eq!(evaluate_rollback(&json!({}), &rubric), 90.0);

        let blank = json!({"rollback_plan": "   "});
        assert_eq!(evaluate_rollback(&blank, &rubric), 90.0);

        let short = json!({"rollback_plan": "revert the deploy"});
        assert_eq!(evaluate_rollback(&short, &rubric), 50.0);

        let long_plan = "a".repeat(200);
        let documented = json!({ "rollback_plan": long_plan });
        assert_eq!(evaluate_rollback(&documented, &rubric), 10.0);
    }

    #[test]
    fn test_scope_accepts_list_or_count() {
        let rubric = Rubric::new([("<=2", 10.0), ("3-10", 40.0), (">10", 80.0)]);

        let listed = json!({"deployment_scope": {"affected_components": ["api", "worker"]}});
        assert_eq!(evaluate_scope(&listed, &rubric), 10.0);

        let counted = json!({"deployment_scope": {"affected_components": 7}});
        assert_eq!(evaluate_scope(&counted, &rubric), 40.0);

        assert_eq!(evaluate_scope(&json!({}), &rubric), NEUTRAL);
    }

    #[test]
    fn test_every_factor_type_has_an_evaluator() {
        for factor_type in [
            RiskFactorType::Coverage,
            RiskFactorType::Security,
            RiskFactorType::Testing,
            RiskFactorType::Rollback,
            RiskFactorType::Scope,
        ] {
            let evaluate = evaluator_for(factor_type);
            // Empty evidence must never panic.
            let _ = evaluate(&json!({}), &Rubric::default());
        }
    }
}
