//! Host bridge — the outbound RPC surface.
//!
//! The engine never mutates authoritative state: every change is
//! reported through this trait and the native host applies it (grouping
//! calls that share a transaction id into one undoable action).
//! Production hosts implement [`HostBridge`] over their IPC channel;
//! tests use [`RecordingBridge`] to assert on the exact call stream.

use cutline_common::{ItemKind, TransactionId};
use parking_lot::Mutex;
use serde_json::Value;

/// Outbound calls from the engine to the native host.
///
/// Default implementations are no-ops so embedders can start with the
/// subset they support.
pub trait HostBridge: Send + Sync {
    // -- Selection sync --
    fn add_selection(&self, _id: &str, _kind: ItemKind, _clear_others: bool) {}
    fn remove_selection(&self, _id: &str, _kind: ItemKind) {}

    // -- Entity commits --
    fn update_clip_data(
        &self,
        _clip: &Value,
        _allow_keyframes: bool,
        _force_json_diff: bool,
        _ignore_refresh: bool,
        _transaction: Option<&TransactionId>,
    ) {
    }
    fn update_transition_data(
        &self,
        _transition: &Value,
        _force_json_diff: bool,
        _ignore_refresh: bool,
        _transaction: Option<&TransactionId>,
    ) {
    }

    // -- Keyframe transactions --
    fn start_keyframe_drag(&self, _kind: ItemKind, _id: &str, _transaction: &TransactionId) {}
    fn finalize_keyframe_drag(&self, _kind: ItemKind, _id: &str) {}

    // -- Timing --
    fn retime_clip(&self, _id: &str, _end: f64, _position: f64) {}
    fn seek_to_keyframe(&self, _frame: i64) {}

    // -- Razor --
    fn razor_slice_at_cursor(&self, _clip_id: &str, _transition_id: &str, _seconds: f64) {}

    // -- Preview & sync --
    fn playhead_moved(&self, _frame: i64) {}
    fn preview_clip_frame(&self, _clip_id: &str, _frame: i64) {}
    fn page_ready(&self) {}
    fn qt_log(&self, _level: &str, _message: &str) {}
    fn resize_timeline(&self, _seconds: f64) {}

    // -- Context menus --
    fn show_clip_menu(&self, _id: &str) {}
    fn show_effect_menu(&self, _id: &str) {}
    fn show_transition_menu(&self, _id: &str) {}
    fn show_track_menu(&self, _number: i32) {}
    fn show_marker_menu(&self, _id: &str) {}
    fn show_playhead_menu(&self, _seconds: f64) {}
    fn show_timeline_menu(&self, _seconds: f64, _layer: i32) {}

    // -- Proposals --
    fn add_missing_transition(&self, _proposal: &Value) {}
}

/// A host that swallows every call (headless tests, demo mode).
#[derive(Debug, Default)]
pub struct NullBridge;

impl HostBridge for NullBridge {}

/// One recorded outbound call.
#[derive(Clone, Debug, PartialEq)]
pub enum HostCall {
    AddSelection {
        id: String,
        kind: ItemKind,
        clear_others: bool,
    },
    RemoveSelection {
        id: String,
        kind: ItemKind,
    },
    UpdateClipData {
        clip: Value,
        allow_keyframes: bool,
        force_json_diff: bool,
        ignore_refresh: bool,
        transaction: Option<TransactionId>,
    },
    UpdateTransitionData {
        transition: Value,
        force_json_diff: bool,
        ignore_refresh: bool,
        transaction: Option<TransactionId>,
    },
    StartKeyframeDrag {
        kind: ItemKind,
        id: String,
        transaction: TransactionId,
    },
    FinalizeKeyframeDrag {
        kind: ItemKind,
        id: String,
    },
    RetimeClip {
        id: String,
        end: f64,
        position: f64,
    },
    SeekToKeyframe {
        frame: i64,
    },
    RazorSliceAtCursor {
        clip_id: String,
        transition_id: String,
        seconds: f64,
    },
    PlayheadMoved {
        frame: i64,
    },
    PreviewClipFrame {
        clip_id: String,
        frame: i64,
    },
    PageReady,
    ResizeTimeline {
        seconds: f64,
    },
    ShowClipMenu {
        id: String,
    },
    ShowEffectMenu {
        id: String,
    },
    ShowTransitionMenu {
        id: String,
    },
    ShowTrackMenu {
        number: i32,
    },
    ShowMarkerMenu {
        id: String,
    },
    ShowPlayheadMenu {
        seconds: f64,
    },
    ShowTimelineMenu {
        seconds: f64,
        layer: i32,
    },
    AddMissingTransition {
        proposal: Value,
    },
}

/// Test double that records every outbound call in order.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    calls: Mutex<Vec<HostCall>>,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: HostCall) {
        self.calls.lock().push(call);
    }

    /// Snapshot of the recorded calls.
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    /// Drain the recorded calls.
    pub fn take(&self) -> Vec<HostCall> {
        std::mem::take(&mut *self.calls.lock())
    }
}

impl HostBridge for RecordingBridge {
    fn add_selection(&self, id: &str, kind: ItemKind, clear_others: bool) {
        self.push(HostCall::AddSelection {
            id: id.to_string(),
            kind,
            clear_others,
        });
    }

    fn remove_selection(&self, id: &str, kind: ItemKind) {
        self.push(HostCall::RemoveSelection {
            id: id.to_string(),
            kind,
        });
    }

    fn update_clip_data(
        &self,
        clip: &Value,
        allow_keyframes: bool,
        force_json_diff: bool,
        ignore_refresh: bool,
        transaction: Option<&TransactionId>,
    ) {
        self.push(HostCall::UpdateClipData {
            clip: clip.clone(),
            allow_keyframes,
            force_json_diff,
            ignore_refresh,
            transaction: transaction.cloned(),
        });
    }

    fn update_transition_data(
        &self,
        transition: &Value,
        force_json_diff: bool,
        ignore_refresh: bool,
        transaction: Option<&TransactionId>,
    ) {
        self.push(HostCall::UpdateTransitionData {
            transition: transition.clone(),
            force_json_diff,
            ignore_refresh,
            transaction: transaction.cloned(),
        });
    }

    fn start_keyframe_drag(&self, kind: ItemKind, id: &str, transaction: &TransactionId) {
        self.push(HostCall::StartKeyframeDrag {
            kind,
            id: id.to_string(),
            transaction: transaction.clone(),
        });
    }

    fn finalize_keyframe_drag(&self, kind: ItemKind, id: &str) {
        self.push(HostCall::FinalizeKeyframeDrag {
            kind,
            id: id.to_string(),
        });
    }

    fn retime_clip(&self, id: &str, end: f64, position: f64) {
        self.push(HostCall::RetimeClip {
            id: id.to_string(),
            end,
            position,
        });
    }

    fn seek_to_keyframe(&self, frame: i64) {
        self.push(HostCall::SeekToKeyframe { frame });
    }

    fn razor_slice_at_cursor(&self, clip_id: &str, transition_id: &str, seconds: f64) {
        self.push(HostCall::RazorSliceAtCursor {
            clip_id: clip_id.to_string(),
            transition_id: transition_id.to_string(),
            seconds,
        });
    }

    fn playhead_moved(&self, frame: i64) {
        self.push(HostCall::PlayheadMoved { frame });
    }

    fn preview_clip_frame(&self, clip_id: &str, frame: i64) {
        self.push(HostCall::PreviewClipFrame {
            clip_id: clip_id.to_string(),
            frame,
        });
    }

    fn page_ready(&self) {
        self.push(HostCall::PageReady);
    }

    fn resize_timeline(&self, seconds: f64) {
        self.push(HostCall::ResizeTimeline { seconds });
    }

    fn show_clip_menu(&self, id: &str) {
        self.push(HostCall::ShowClipMenu { id: id.to_string() });
    }

    fn show_effect_menu(&self, id: &str) {
        self.push(HostCall::ShowEffectMenu { id: id.to_string() });
    }

    fn show_transition_menu(&self, id: &str) {
        self.push(HostCall::ShowTransitionMenu { id: id.to_string() });
    }

    fn show_track_menu(&self, number: i32) {
        self.push(HostCall::ShowTrackMenu { number });
    }

    fn show_marker_menu(&self, id: &str) {
        self.push(HostCall::ShowMarkerMenu { id: id.to_string() });
    }

    fn show_playhead_menu(&self, seconds: f64) {
        self.push(HostCall::ShowPlayheadMenu { seconds });
    }

    fn show_timeline_menu(&self, seconds: f64, layer: i32) {
        self.push(HostCall::ShowTimelineMenu { seconds, layer });
    }

    fn add_missing_transition(&self, proposal: &Value) {
        self.push(HostCall::AddMissingTransition {
            proposal: proposal.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_bridge_keeps_call_order() {
        let bridge = RecordingBridge::new();
        bridge.page_ready();
        bridge.add_selection("c1", ItemKind::Clip, true);
        bridge.playhead_moved(49);

        let calls = bridge.take();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], HostCall::PageReady);
        assert_eq!(
            calls[1],
            HostCall::AddSelection {
                id: "c1".into(),
                kind: ItemKind::Clip,
                clear_others: true
            }
        );
        assert!(bridge.calls().is_empty(), "take drains the log");
    }

    #[test]
    fn null_bridge_accepts_everything() {
        let bridge = NullBridge;
        bridge.razor_slice_at_cursor("c1", "", 1.0);
        bridge.resize_timeline(300.0);
        bridge.qt_log("info", "hello");
    }
}
