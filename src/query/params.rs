use crate::core::models::{Filter, FilterParams, Tag};

pub const STATE_FILTER: &str = "instance-state-name";
pub const RUNNING: &str = "running";

/// Builds the query parameters: running instances only, narrowed by one
/// filter per tag in the order the tags were configured.
pub fn build(tags: &[Tag]) -> FilterParams {
    let mut filters = Vec::with_capacity(tags.len() + 1);
    filters.push(Filter::new(STATE_FILTER, RUNNING));
    filters.extend(
        tags.iter()
            .map(|tag| Filter::new(format!("tag:{}", tag.key), tag.value.clone())),
    );
    FilterParams { filters }
}
