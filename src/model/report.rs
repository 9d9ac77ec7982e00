//! Human-readable edge state reports.

use std::collections::HashSet;

use super::{LinkState, Topology};

/// Format the state of every link, pairing each link with its reverse.
///
/// ```text
/// #A : 4 || #I : 2 || #U : 0 || Sum : 6
///    eAB : A ||    eBA : A
///    eAC : I ||    eCA : I
///    eBC : A ||    eCB : A
/// ```
pub fn format_edge_state_report(topology: &Topology) -> String {
    let mut links: Vec<_> = topology.links().collect();
    links.sort_by(|a, b| a.1.id().cmp(b.1.id()));

    let counts = topology.state_counts();
    let count = |state: LinkState| counts.get(&state).copied().unwrap_or(0);

    let mut report = format!(
        "#A : {} || #I : {} || #U : {} || Sum : {}\n",
        count(LinkState::Active),
        count(LinkState::Inactive),
        count(LinkState::Unclassified),
        topology.link_count()
    );

    let mut processed = HashSet::new();
    for (handle, link) in links {
        if !processed.insert(handle) {
            continue;
        }
        report.push_str(&format!("{:>6} : {}", link.id(), link.state().abbreviation()));
        if let Some(reverse) = link.reverse().and_then(|r| topology.link(r).map(|l| (r, l))) {
            processed.insert(reverse.0);
            report.push_str(&format!(" || {:>6} : {}", reverse.1.id(), reverse.1.state().abbreviation()));
        }
        report.push('\n');
    }

    report.trim_end().to_string()
}
