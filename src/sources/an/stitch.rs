//! Splice the records of one bill carried over between legislatures.

use crate::runtime::logging::Diagnostics;
use crate::types::{Dossier, Step};

/// Merge `earlier` (previous legislature) into `later`.
///
/// The earlier record loses its trailing promulgation and any predicted
/// step. Walking backward from its end, the first step whose url also
/// appears in the later record is the overlap point: earlier steps before it
/// are kept, followed by every step of the later record. Without a shared
/// url the two sequences are concatenated.
pub fn stitch(later: Dossier, earlier: Dossier, diagnostics: &mut Diagnostics) -> Dossier {
    let mut earlier_steps: Vec<Step> = earlier
        .steps
        .into_iter()
        .filter(|step| !step.predicted)
        .collect();
    while earlier_steps.last().is_some_and(Step::is_promulgation) {
        earlier_steps.pop();
    }

    let overlap = earlier_steps.iter().enumerate().rev().find_map(|(index, step)| {
        let url = step.source_url.as_deref()?;
        later
            .steps
            .iter()
            .position(|other| other.source_url.as_deref() == Some(url))
            .map(|later_index| (index, later_index))
    });

    let mut merged = Dossier {
        senate_url: later.senate_url.clone().or(earlier.senate_url),
        long_title: later.long_title.clone().or(earlier.long_title),
        urgent: later.urgent || earlier.urgent,
        previous_works: earlier.previous_works,
        ..later
    };

    let later_steps = std::mem::take(&mut merged.steps);
    merged.steps = match overlap {
        Some((earlier_index, later_index)) => {
            if later_index > 0 {
                diagnostics.warn(
                    "later record has steps before the shared step",
                    Some(serde_json::json!({
                        "shared": later_steps[later_index].source_url,
                        "leading": later_index,
                        "later": merged.url,
                    })),
                );
            }
            earlier_steps.truncate(earlier_index);
            earlier_steps.extend(later_steps);
            earlier_steps
        }
        None => {
            diagnostics.warn(
                "no shared step between legislatures, concatenating",
                Some(serde_json::json!({ "earlier": earlier.url, "later": merged.url })),
            );
            earlier_steps.extend(later_steps);
            earlier_steps
        }
    };
    merged.refresh_beginning();
    merged
}
