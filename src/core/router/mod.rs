//! Router (§4.4)
//!
//! Contract: `select(prompt, promptId, userId?, tags, now) -> {variantId,
//! variant, reason, weight?}`. Four policy layers evaluated in strict
//! order; the first that matches wins.

mod hash;

use crate::config::models::{Prompt, Variant};
use crate::utils::error::{EngineError, ErrorDetails, Result};
use std::fmt;

/// Why a particular variant was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingReason {
    TagMatch,
    PhasedRollout,
    WeightDistribution,
    Default,
}

impl fmt::Display for RoutingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TagMatch => write!(f, "tag-match"),
            Self::PhasedRollout => write!(f, "phased-rollout"),
            Self::WeightDistribution => write!(f, "weight-distribution"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Result of a routing decision.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub variant_id: String,
    pub variant: &'a Variant,
    pub reason: RoutingReason,
    pub tags: Option<Vec<String>>,
    pub selected_weight: Option<u8>,
}

/// Pick a key from a weight list using the deterministic algorithm of
/// §4.4: iterate in order, subtracting each weight from `r * total`; the
/// first key whose cumulative weight crosses zero wins.
fn weighted_pick<'a>(entries: &'a [(String, u8)], r: f64) -> (&'a str, u8) {
    let total: f64 = entries.iter().map(|(_, w)| *w as f64).sum();
    if total == 0.0 {
        let (k, w) = &entries[0];
        return (k, *w);
    }
    let mut remaining = r * total;
    for (k, w) in entries {
        remaining -= *w as f64;
        if remaining <= 0.0 {
            return (k, *w);
        }
    }
    let (k, w) = &entries[0];
    (k, *w)
}

fn tags_intersect(rule_tags: &[String], request_tags: &[String]) -> bool {
    rule_tags.iter().any(|t| request_tags.contains(t))
}

/// Select a variant for a request. `now` is unix seconds, threaded in by
/// the caller so routing stays a pure function of its inputs (§8 "Routing
/// determinism").
pub fn select<'a>(
    prompt: &'a Prompt,
    prompt_id: &str,
    user_id: Option<&str>,
    tags: &[String],
    now: i64,
) -> Result<Selection<'a>> {
    // Layer 1: tag match.
    let tag_matches: Vec<(String, u8)> = prompt
        .routing
        .rules
        .iter()
        .filter(|r| r.tags.as_deref().map(|t| tags_intersect(t, tags)).unwrap_or(false))
        .map(|r| (r.target.clone(), r.weight))
        .collect();
    if !tag_matches.is_empty() {
        let r = hash::bucket(user_id, prompt_id, "tag");
        let (variant_id, weight) = weighted_pick(&tag_matches, r);
        return finalize(prompt, variant_id, RoutingReason::TagMatch, Some(tags.to_vec()), Some(weight));
    }

    // Layer 2: phased rollout — entry with greatest `start` s.t. start <= now <= end.
    if let Some(phased) = &prompt.routing.phased {
        let mut best: Option<&crate::config::models::PhasedRule> = None;
        for entry in phased {
            let end = entry.end.unwrap_or(i64::MAX);
            if entry.start <= now && now <= end {
                let replace = match best {
                    Some(b) => entry.start > b.start,
                    None => true,
                };
                if replace {
                    best = Some(entry);
                }
            }
        }
        if let Some(entry) = best {
            let weights: Vec<(String, u8)> = entry.weights.iter().map(|(k, v)| (k.clone(), *v)).collect();
            let r = hash::bucket(user_id, prompt_id, "phase");
            let (variant_id, weight) = weighted_pick(&weights, r);
            return finalize(prompt, variant_id, RoutingReason::PhasedRollout, None, Some(weight));
        }
    }

    // Layer 3: default rules (no tags, or empty tags).
    let default_rules: Vec<(String, u8)> = prompt
        .routing
        .rules
        .iter()
        .filter(|r| r.tags.as_deref().map(|t| t.is_empty()).unwrap_or(true))
        .map(|r| (r.target.clone(), r.weight))
        .collect();
    if !default_rules.is_empty() {
        let r = hash::bucket(user_id, prompt_id, "weight");
        let (variant_id, weight) = weighted_pick(&default_rules, r);
        return finalize(prompt, variant_id, RoutingReason::WeightDistribution, None, Some(weight));
    }

    // Layer 4: hard default.
    let (variant_id, _) = prompt
        .variants
        .iter()
        .find(|(_, v)| v.default)
        .map(|(id, v)| (id.clone(), v))
        .ok_or_else(|| EngineError::execution(format!("prompt `{prompt_id}` has no default variant")))?;
    finalize(prompt, &variant_id, RoutingReason::Default, None, None)
}

fn finalize<'a>(
    prompt: &'a Prompt,
    variant_id: &str,
    reason: RoutingReason,
    tags: Option<Vec<String>>,
    selected_weight: Option<u8>,
) -> Result<Selection<'a>> {
    let variant = prompt.variants.get(variant_id).ok_or_else(|| {
        EngineError::execution_with(
            format!("routing selected unknown variant `{variant_id}`"),
            ErrorDetails::new().with_identifier(variant_id.to_string()),
        )
    })?;
    Ok(Selection {
        variant_id: variant_id.to_string(),
        variant,
        reason,
        tags,
        selected_weight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::*;
    use std::collections::{BTreeMap, HashMap};

    fn variant(default: bool) -> Variant {
        Variant {
            provider: "oa".into(),
            model: "gpt-4o".into(),
            default,
            parameters: CanonicalParameters::default(),
            messages: vec![MessageTemplate {
                role: MessageRole::User,
                content: MessageContent { template: "hi".into() },
            }],
            response_format: ResponseFormat::RawText,
            fallback: None,
        }
    }

    fn prompt_with_tags() -> Prompt {
        let mut variants = HashMap::new();
        variants.insert("v_us".to_string(), variant(false));
        variants.insert("v_beta".to_string(), variant(false));
        variants.insert("v_default".to_string(), variant(true));
        Prompt {
            description: String::new(),
            variants,
            routing: Routing {
                rules: vec![
                    RoutingRule { target: "v_us".into(), weight: 70, tags: Some(vec!["US".into()]) },
                    RoutingRule { target: "v_beta".into(), weight: 30, tags: Some(vec!["beta".into()]) },
                    RoutingRule { target: "v_default".into(), weight: 60, tags: None },
                    RoutingRule { target: "v_beta".into(), weight: 40, tags: None },
                ],
                phased: None,
            },
            chains: None,
        }
    }

    #[test]
    fn tag_match_wins_when_a_tag_rule_matches() {
        let prompt = prompt_with_tags();
        let selection = select(&prompt, "greeting", Some("alice"), &["US".to_string()], 0).unwrap();
        assert_eq!(selection.variant_id, "v_us");
        assert_eq!(selection.reason, RoutingReason::TagMatch);
    }

    #[test]
    fn falls_back_to_default_rules_when_no_tag_matches() {
        let prompt = prompt_with_tags();
        let selection = select(&prompt, "greeting", Some("alice"), &[], 0).unwrap();
        assert_eq!(selection.reason, RoutingReason::WeightDistribution);
    }

    #[test]
    fn phased_rollout_applies_within_window() {
        let mut prompt = prompt_with_tags();
        let mut weights = BTreeMap::new();
        weights.insert("v_us".to_string(), 50);
        weights.insert("v_default".to_string(), 50);
        prompt.routing.phased = Some(vec![PhasedRule { start: 1_751_328_000, end: Some(1_752_537_600), weights }]);
        let selection = select(&prompt, "greeting", Some("bob"), &[], 1_751_400_000).unwrap();
        assert_eq!(selection.reason, RoutingReason::PhasedRollout);
        assert!(["v_us", "v_default"].contains(&selection.variant_id.as_str()));
    }

    #[test]
    fn routing_is_deterministic_for_fixed_inputs() {
        let prompt = prompt_with_tags();
        let a = select(&prompt, "greeting", Some("alice"), &[], 0).unwrap();
        let b = select(&prompt, "greeting", Some("alice"), &[], 0).unwrap();
        assert_eq!(a.variant_id, b.variant_id);
    }

    #[test]
    fn hard_default_when_no_rules_match() {
        let mut prompt = prompt_with_tags();
        prompt.routing.rules.clear();
        let selection = select(&prompt, "greeting", Some("alice"), &[], 0).unwrap();
        assert_eq!(selection.reason, RoutingReason::Default);
        assert_eq!(selection.variant_id, "v_default");
    }
}
