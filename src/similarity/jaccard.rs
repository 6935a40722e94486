use crate::clustering::DistanceMatrix;
use crate::entity::EntityType;
use crate::events::Event;

/// Jaccard similarity between two events over their named mention values:
/// intersection and union sizes are summed across the six named types.
/// Two events with no values at all have similarity 0.
pub fn event_similarity(a: &Event, b: &Event) -> f64 {
    let mut intersection = 0usize;
    let mut union = 0usize;
    for entity_type in EntityType::NAMED {
        let (va, vb) = (a.values(entity_type), b.values(entity_type));
        let shared = va.intersection(vb).count();
        intersection += shared;
        union += va.len() + vb.len() - shared;
    }

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Distance matrix `1 - J` over a list of events.
pub fn event_distance_matrix(events: &[&Event]) -> DistanceMatrix {
    DistanceMatrix::from_fn(events.len(), |i, j| 1.0 - event_similarity(events[i], events[j]))
}
