//! Overlap detection and missing-transition proposals.
//!
//! After a single-clip drag or resize stops, the clip's new extent is
//! checked against every other clip on its layer. A fresh overlap
//! region becomes a transition proposal for the host, unless it is too
//! short or a transition already sits on that seam.

use cutline_common::EngineConfig;
use cutline_project::Project;
use serde::Serialize;

/// A proposed transition covering a clip overlap.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransitionProposal {
    pub layer: i32,
    pub position: f64,
    pub start: f64,
    /// Duration of the overlap (transitions carry `start = 0`).
    pub end: f64,
}

/// Probe a clip's overlaps on its own layer. Returns the first valid
/// proposal (one seam is proposed per edit; the host menu flow handles
/// one at a time).
pub fn missing_transition(
    project: &Project,
    clip_id: &str,
    config: &EngineConfig,
) -> Option<TransitionProposal> {
    let clip = project.clips.iter().find(|c| c.id == clip_id)?;
    let (left, right) = (clip.position, clip.right());

    for other in &project.clips {
        if other.id == clip_id || other.layer != clip.layer {
            continue;
        }
        let (other_left, other_right) = (other.position, other.right());

        let proposal = if left < other_right && left > other_left {
            // Our head overlaps their tail.
            Some(TransitionProposal {
                layer: clip.layer,
                position: left,
                start: 0.0,
                end: other_right - left,
            })
        } else if right > other_left && right < other_right {
            // Our tail overlaps their head.
            Some(TransitionProposal {
                layer: clip.layer,
                position: other_left,
                start: 0.0,
                end: right - other_left,
            })
        } else {
            None
        };

        let Some(proposal) = proposal else {
            continue;
        };
        if proposal.end < config.min_transition_len {
            tracing::debug!(
                clip_id,
                duration = proposal.end,
                "Overlap too short for a transition"
            );
            continue;
        }
        if transition_on_seam(project, &proposal, config.transition_edge_epsilon) {
            tracing::debug!(clip_id, "Transition already covers the seam");
            continue;
        }
        return Some(proposal);
    }
    None
}

/// Whether an existing transition on the proposal's layer already has an
/// edge on (either end of) the proposed region.
fn transition_on_seam(project: &Project, proposal: &TransitionProposal, epsilon: f64) -> bool {
    let proposal_right = proposal.position + proposal.end;
    project.effects.iter().any(|tran| {
        tran.layer == proposal.layer
            && ((tran.position - proposal.position).abs() < epsilon
                || (tran.right() - proposal_right).abs() < epsilon)
    })
}
