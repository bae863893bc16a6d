//! Smart retrieval: token-budgeted context assembly over the architecture
//! graph, and score fusion for the troubleshoot matcher.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use mcw_domain::entities::{ArchitectureItem, TroubleshootItem};
use mcw_domain::error::{Error, Result};
use mcw_domain::ops::{MatchCandidate, SmartContext};
use mcw_domain::utils::{estimate_tokens, first_sentences};

use mcw_domain::constants::{
    MATCH_SIMILARITY_WEIGHT, MATCH_SUCCESS_WEIGHT, MATCH_USAGE_WEIGHT,
};

use crate::constants::{
    CONTEXT_CHILD_SENTENCES, CONTEXT_RELATED_SENTENCES, CONTEXT_SUMMARY_SENTENCES,
};

/// Assemble a context blob starting from `start_slug`.
///
/// Children are walked breadth-first to `depth`; related items of the start
/// item contribute one-line blurbs. Once the cumulative token estimate
/// exceeds the budget, later items are summarized; a second breach stops
/// assembly with `truncated = true`. A `deadline` in the past has the same
/// effect: whatever was gathered so far is returned with `truncated = true`
/// instead of losing the partial result to a hard timeout.
///
/// # Errors
///
/// Returns `ErrNotFound` when the start slug does not resolve.
pub fn assemble_context(
    items: &HashMap<String, ArchitectureItem>,
    start_slug: &str,
    token_budget: usize,
    depth: usize,
    deadline: Option<Instant>,
) -> Result<SmartContext> {
    let start = items
        .get(start_slug)
        .ok_or_else(|| Error::not_found(format!("architecture item '{start_slug}'")))?;

    let mut context = String::new();
    let mut visited_slugs = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut used = 0usize;
    let mut summary_mode = false;
    let mut truncated = false;

    let mut push_segment = |context: &mut String, used: &mut usize, segment: String| {
        *used += estimate_tokens(&segment);
        context.push_str(&segment);
    };

    // The start item is always included in full.
    push_segment(
        &mut context,
        &mut used,
        format!("# {}\n\n{}\n\n", start.title, start.ai_requirements),
    );
    visited_slugs.push(start.slug.clone());
    seen.insert(start_slug);

    let mut frontier: VecDeque<(&str, usize)> = start
        .children_slugs
        .iter()
        .map(|slug| (slug.as_str(), 1))
        .collect();

    let expired = |deadline: Option<Instant>| deadline.is_some_and(|d| Instant::now() >= d);

    while let Some((slug, level)) = frontier.pop_front() {
        if expired(deadline) {
            truncated = true;
            break;
        }
        if level > depth || !seen.insert(slug) {
            continue;
        }
        // Dangling links are skipped here; reads report them separately.
        let Some(item) = items.get(slug) else { continue };

        if used >= token_budget {
            if summary_mode {
                truncated = true;
                break;
            }
            summary_mode = true;
        }

        let segment = if summary_mode {
            let mut s = format!(
                "## {}\n{}\n",
                item.title,
                first_sentences(&item.ai_requirements, CONTEXT_SUMMARY_SENTENCES)
            );
            if !item.keywords.is_empty() {
                s.push_str(&format!("Keywords: {}\n", item.keywords.join(", ")));
            }
            s.push('\n');
            s
        } else {
            let mut s = format!("## {}\n", item.title);
            for bullet in &item.ai_when_to_use {
                s.push_str(&format!("- {bullet}\n"));
            }
            s.push_str(first_sentences(&item.ai_requirements, CONTEXT_CHILD_SENTENCES));
            s.push_str("\n\n");
            s
        };
        push_segment(&mut context, &mut used, segment);
        visited_slugs.push(item.slug.clone());

        for child in &item.children_slugs {
            frontier.push_back((child.as_str(), level + 1));
        }
    }
    if !frontier.is_empty() {
        truncated = true;
    }

    // Related items: depth 1 from the start item only.
    let related: Vec<&ArchitectureItem> = start
        .related_slugs
        .iter()
        .filter_map(|slug| items.get(slug.as_str()))
        .filter(|item| !visited_slugs.contains(&item.slug))
        .collect();
    if !related.is_empty() && !truncated {
        push_segment(&mut context, &mut used, "Related:\n".to_owned());
        for item in related {
            if used >= token_budget || expired(deadline) {
                truncated = true;
                break;
            }
            push_segment(
                &mut context,
                &mut used,
                format!(
                    "- {}: {}\n",
                    item.title,
                    first_sentences(&item.ai_requirements, CONTEXT_RELATED_SENTENCES)
                ),
            );
            visited_slugs.push(item.slug.clone());
        }
    }

    Ok(SmartContext {
        context,
        visited_slugs,
        truncated,
    })
}

/// Fuse similarity with usage statistics for one matcher candidate:
/// `similarity + 0.4·success_rate + 0.1·ln(1 + usage_count)`.
#[must_use]
pub fn match_score(item: &TroubleshootItem, similarity: f64) -> f64 {
    MATCH_SIMILARITY_WEIGHT * similarity
        + MATCH_SUCCESS_WEIGHT * item.success_rate()
        + MATCH_USAGE_WEIGHT * (1.0 + item.usage_count as f64).ln()
}

/// Rank matcher candidates by fused score, best first.
#[must_use]
pub fn rank_candidates(
    candidates: Vec<(TroubleshootItem, f64)>,
    limit: usize,
) -> Vec<MatchCandidate> {
    let mut ranked: Vec<MatchCandidate> = candidates
        .into_iter()
        .map(|(item, similarity)| MatchCandidate {
            score: match_score(&item, similarity),
            slug: item.slug,
            title: item.title,
            ai_solutions: item.ai_solutions,
            similarity,
            success_rate: item.success_count as f64 / item.usage_count.max(1) as f64,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.slug.cmp(&b.slug))
    });
    ranked.truncate(limit);
    ranked
}
