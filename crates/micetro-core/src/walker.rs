// Range tree walker.
//
// Only the children listed under each top-level range are scanned; the
// containers themselves never are.

use std::collections::HashSet;

use indexmap::IndexSet;
use tracing::{debug, warn};

use micetro_api::{Gateway, RangeRef};

use crate::error::CoreError;

/// Allow-list of child range names. Empty means every child range.
pub type RangeSelector = IndexSet<String>;

/// List the child ranges to traverse, in server order, each reference at
/// most once.
pub async fn select_ranges(
    gateway: &Gateway,
    selector: &RangeSelector,
) -> Result<Vec<RangeRef>, CoreError> {
    let list = gateway.list_ranges(None).await?;
    let selected = pick_children(list.ranges.iter().flat_map(|r| &r.child_ranges), selector);

    debug!(
        top_level = list.ranges.len(),
        selected = selected.len(),
        "range tree walked"
    );
    for wanted in selector {
        if !selected.iter().any(|r| &r.name == wanted) {
            warn!(range = %wanted, "selected range not found among child ranges");
        }
    }

    Ok(selected)
}

fn pick_children<'a>(
    candidates: impl IntoIterator<Item = &'a RangeRef>,
    selector: &RangeSelector,
) -> Vec<RangeRef> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|child| selector.is_empty() || selector.contains(&child.name))
        .filter(|child| seen.insert(child.reference.clone()))
        .cloned()
        .collect()
}
