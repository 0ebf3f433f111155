//! End-to-end gesture scenarios driven through the recording bridge.
//!
//! These pin the engine-level contracts a unit test cannot see: one
//! transaction id per gesture, no commits from locked tracks, snap line
//! teardown, and the literal trim/retime/keyframe boundary cases.

use serde_json::{json, Value};
use std::sync::Arc;
use timeline_ui::{Edge, HostCall, ItemKind, RecordingBridge, TimelineEngine};

/// 24fps project at 100 px/s with two tracks (2 on top, 1 below).
fn project_json(clips: Value, lock_top_track: bool) -> String {
    json!({
        "fps": {"num": 24, "den": 1},
        "duration": 300.0,
        "scale": 1.0,
        "tick_pixels": 100.0,
        "playhead_position": 0.0,
        "layers": [
            {"id": "L1", "number": 1, "label": "Track 1", "lock": false, "height": 64.0},
            {"id": "L2", "number": 2, "label": "Track 2", "lock": lock_top_track, "height": 64.0}
        ],
        "clips": clips,
        "effects": [],
        "markers": []
    })
    .to_string()
}

fn clip_json(id: &str, layer: i32, position: f64, start: f64, end: f64, selected: bool) -> Value {
    json!({
        "id": id,
        "file_id": format!("file-{id}"),
        "layer": layer,
        "position": position,
        "start": start,
        "end": end,
        "selected": selected,
        "reader": {
            "has_video": true,
            "has_audio": false,
            "fps": {"num": 24, "den": 1},
            "duration": 10.0,
            "video_length": 240,
            "media_type": "video",
            "has_single_image": false
        }
    })
}

fn make_engine(project: String) -> (TimelineEngine, Arc<RecordingBridge>) {
    let bridge = Arc::new(RecordingBridge::new());
    let mut engine = TimelineEngine::new(bridge.clone());
    engine.load_json(&project);
    bridge.take();
    (engine, bridge)
}

fn clip_updates(calls: &[HostCall]) -> Vec<&HostCall> {
    calls
        .iter()
        .filter(|c| matches!(c, HostCall::UpdateClipData { .. }))
        .collect()
}

// Track 1 sits below track 2: ruler 32px + track 2 (64px) puts it at y 96.
const TRACK1_Y: f64 = 100.0;

#[test]
fn group_drag_shares_one_transaction_and_quantises() {
    let project = project_json(
        json!([
            clip_json("c1", 1, 1.0, 0.0, 3.0, true),
            clip_json("c2", 1, 5.0, 0.0, 2.0, true)
        ]),
        false,
    );
    let (mut engine, bridge) = make_engine(project);

    assert!(engine.begin_item_drag("c1", ItemKind::Clip, (110.0, TRACK1_Y), false));
    engine.update_item_drag((211.0, TRACK1_Y)); // 101px right = 1.01s
    engine.finish_item_drag();
    engine.tick();

    let calls = bridge.take();
    let updates = clip_updates(&calls);
    assert_eq!(updates.len(), 2);

    let mut transactions = Vec::new();
    let mut refresh_flags = Vec::new();
    for call in &updates {
        if let HostCall::UpdateClipData {
            transaction,
            ignore_refresh,
            allow_keyframes,
            ..
        } = call
        {
            transactions.push(transaction.clone().expect("drag carries a transaction"));
            refresh_flags.push(*ignore_refresh);
            assert!(!allow_keyframes);
        }
    }
    assert_eq!(transactions[0], transactions[1], "one transaction per gesture");
    assert_eq!(refresh_flags, vec![true, false], "only the last commit refreshes");

    // 1.01s quantises to the 24fps grid; relative offset preserved.
    let c1 = engine.project().clips.iter().find(|c| c.id == "c1").unwrap();
    let c2 = engine.project().clips.iter().find(|c| c.id == "c2").unwrap();
    let snapped = cutline_common::time::snap_to_fps_grid(c1.position, engine.project().fps);
    assert!((c1.position - snapped).abs() < 1e-9);
    assert!((c2.position - c1.position - 4.0).abs() < 1e-9);
}

#[test]
fn locked_track_in_path_blocks_every_commit() {
    let project = project_json(json!([clip_json("c1", 1, 2.0, 0.0, 3.0, true)]), true);
    let (mut engine, bridge) = make_engine(project);

    assert!(engine.begin_item_drag("c1", ItemKind::Clip, (210.0, TRACK1_Y), false));
    // Drag up into the locked track 2.
    engine.update_item_drag((260.0, TRACK1_Y - 64.0));
    engine.finish_item_drag();

    let calls = bridge.take();
    assert!(clip_updates(&calls).is_empty(), "refused drags must not commit");
    let c1 = engine.project().clips.iter().find(|c| c.id == "c1").unwrap();
    assert!((c1.position - 2.0).abs() < 1e-9);
    assert_eq!(c1.layer, 1);
}

#[test]
fn razor_mode_redirects_press_to_host() {
    let project = project_json(json!([clip_json("c1", 1, 2.0, 0.0, 3.0, false)]), false);
    let (mut engine, bridge) = make_engine(project);
    engine.set_razor_mode(true);

    assert!(!engine.begin_item_drag("c1", ItemKind::Clip, (250.0, TRACK1_Y), false));
    let calls = bridge.take();
    assert!(calls.iter().any(|c| matches!(
        c,
        HostCall::RazorSliceAtCursor { clip_id, seconds, .. }
            if clip_id == "c1" && (*seconds - 2.5).abs() < 1e-9
    )));
    assert!(
        !calls.iter().any(|c| matches!(c, HostCall::AddSelection { .. })),
        "razor clicks never select"
    );
}

#[test]
fn left_trim_overflow_absorbs_into_slice() {
    let project = project_json(json!([clip_json("c1", 1, 2.0, 1.0, 5.0, true)]), false);
    let (mut engine, bridge) = make_engine(project);

    assert!(engine.begin_item_resize("c1", ItemKind::Clip, Edge::Left));
    engine.update_item_resize(-100.0); // cursor at -1.0s
    engine.finish_item_resize();

    let c1 = engine.project().clips.iter().find(|c| c.id == "c1").unwrap();
    assert!((c1.position - 0.0).abs() < 1e-9);
    assert!((c1.start - 0.0).abs() < 1e-9);
    assert!((c1.end - 4.0).abs() < 1e-9);
    assert!(c1.ui.keyframe_preview.is_none(), "preview closed on stop");

    let calls = bridge.take();
    let updates = clip_updates(&calls);
    assert_eq!(updates.len(), 1);
    if let HostCall::UpdateClipData { clip, transaction, .. } = updates[0] {
        assert_eq!(clip["position"], json!(0.0));
        assert_eq!(clip["start"], json!(0.0));
        assert_eq!(clip["end"], json!(4.0));
        assert!(transaction.is_some());
        assert!(clip.get("ui").is_none(), "transient ui never reaches the host");
    }
}

#[test]
fn right_trim_clamps_to_media() {
    let mut clip = clip_json("c1", 1, 0.0, 1.0, 4.0, true);
    clip["reader"]["duration"] = json!(6.0);
    let project = project_json(json!([clip]), false);
    let (mut engine, _bridge) = make_engine(project);

    assert!(engine.begin_item_resize("c1", ItemKind::Clip, Edge::Right));
    engine.update_item_resize(1300.0); // 13s, way past the media
    engine.finish_item_resize();

    let c1 = engine.project().clips.iter().find(|c| c.id == "c1").unwrap();
    assert!((c1.end - 7.0).abs() < 1e-9, "end clamps to start + reader duration");
    assert!((c1.start - 1.0).abs() < 1e-9);
}

#[test]
fn trim_previews_the_moving_edge() {
    let project = project_json(json!([clip_json("c1", 1, 2.0, 0.0, 4.0, true)]), false);
    let (mut engine, bridge) = make_engine(project);

    engine.begin_item_resize("c1", ItemKind::Clip, Edge::Left);
    engine.update_item_resize(300.0); // trim in to start = 1.0s
    let calls = bridge.take();
    assert!(calls.iter().any(|c| matches!(
        c,
        HostCall::PreviewClipFrame { clip_id, frame } if clip_id == "c1" && *frame == 25
    )));
    engine.finish_item_resize();
}

#[test]
fn keyframe_preview_repositions_icons_during_trim() {
    let mut clip = clip_json("c1", 1, 2.0, 0.0, 4.0, true);
    clip["alpha"] = json!({"Points": [
        {"co": {"X": 1, "Y": 0.0}, "interpolation": 1},
        {"co": {"X": 49, "Y": 1.0}, "interpolation": 1}
    ]});
    let project = project_json(json!([clip]), false);
    let (mut engine, _bridge) = make_engine(project);

    engine.begin_item_resize("c1", ItemKind::Clip, Edge::Left);
    engine.update_item_resize(300.0); // display window now [1.0, 4.0]
    let scene = engine.scene();
    let icons = &scene.clips[0].keyframes;
    let at_start = icons.iter().find(|i| i.frame == 1).unwrap();
    let at_two = icons.iter().find(|i| i.frame == 49).unwrap();
    assert!(!at_start.inside_preview, "outside the window, kept for dimming");
    assert_eq!(at_start.left_px, -100);
    assert!(at_two.inside_preview);
    assert_eq!(at_two.left_px, 100, "round((2.0 - 1.0) * 100px)");

    engine.finish_item_resize();
    let scene = engine.scene();
    let icons = &scene.clips[0].keyframes;
    // Preview closed: offsets come from the committed slice again.
    let at_two = icons.iter().find(|i| i.frame == 49).unwrap();
    assert_eq!(at_two.left_px, 100);
    assert!(at_two.inside_preview);
}

#[test]
fn retime_emits_host_call_and_resamples_waveform() {
    let mut clip = clip_json("c1", 1, 1.0, 0.0, 4.0, true);
    clip["ui"] = json!({
        "audio_data": (0..800).map(|i| ((i as f64) / 50.0).sin()).collect::<Vec<f64>>()
    });
    let project = project_json(json!([clip]), false);
    let (mut engine, bridge) = make_engine(project);
    engine.set_timing_mode(true);

    assert!(engine.begin_item_resize("c1", ItemKind::Clip, Edge::Right));
    engine.update_item_resize(300.0); // right edge from 5.0s to 3.0s: halve
    engine.finish_item_resize();

    let calls = bridge.take();
    let retime = calls
        .iter()
        .find_map(|c| match c {
            HostCall::RetimeClip { id, end, position } => Some((id.clone(), *end, *position)),
            _ => None,
        })
        .expect("retime reported to host");
    assert_eq!(retime.0, "c1");
    assert!((retime.1 - 2.0).abs() < 1e-9, "end = pinned start + new duration");
    assert!((retime.2 - 1.0).abs() < 1e-9);
    assert!(
        !calls.iter().any(|c| matches!(c, HostCall::UpdateClipData { .. })),
        "retimes never write Points directly"
    );

    let c1 = engine.project().clips.iter().find(|c| c.id == "c1").unwrap();
    assert_eq!(c1.ui.audio_data.len(), 400, "800 samples over 4s -> 400 over 2s");
}

#[test]
fn keyframe_drag_commits_frame_49() {
    let mut clip = clip_json("c1", 1, 3.0, 0.0, 4.0, true);
    clip["alpha"] = json!({"Points": [
        {"co": {"X": 1, "Y": 0.0}, "interpolation": 1},
        {"co": {"X": 25, "Y": 1.0}, "interpolation": 1}
    ]});
    let project = project_json(json!([clip]), false);
    let (mut engine, bridge) = make_engine(project);

    assert!(engine.begin_keyframe_drag(
        ItemKind::Clip,
        "c1",
        ItemKind::Clip,
        "c1",
        25,
        (400.0, TRACK1_Y),
    ));
    // Pointer at timeline 5.0s = 2.0s into the slice = frame 49.
    engine.update_keyframe_drag(500.0);
    engine.finish_keyframe_drag();

    let calls = bridge.take();
    let start_index = calls
        .iter()
        .position(|c| matches!(c, HostCall::StartKeyframeDrag { .. }))
        .expect("StartKeyframeDrag");
    let update_index = calls
        .iter()
        .position(|c| matches!(c, HostCall::UpdateClipData { .. }))
        .expect("commit");
    let finalize_index = calls
        .iter()
        .position(|c| matches!(c, HostCall::FinalizeKeyframeDrag { .. }))
        .expect("FinalizeKeyframeDrag");
    assert!(start_index < update_index && update_index < finalize_index);

    let (HostCall::StartKeyframeDrag { transaction: started_tx, .. },) = (&calls[start_index],)
    else {
        unreachable!()
    };
    if let HostCall::UpdateClipData {
        clip,
        allow_keyframes,
        force_json_diff,
        transaction,
        ..
    } = &calls[update_index]
    {
        assert!(!allow_keyframes);
        assert!(force_json_diff);
        assert_eq!(transaction.as_ref(), Some(started_tx));
        let frames: Vec<i64> = clip["alpha"]["Points"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["co"]["X"].as_f64().unwrap() as i64)
            .collect();
        assert_eq!(frames, vec![1, 49]);
    }
}

#[test]
fn keyframe_click_selects_owner_and_seeks() {
    let mut clip = clip_json("c1", 1, 3.0, 0.0, 4.0, false);
    clip["alpha"] = json!({"Points": [
        {"co": {"X": 1, "Y": 0.0}, "interpolation": 1},
        {"co": {"X": 25, "Y": 1.0}, "interpolation": 1}
    ]});
    let project = project_json(json!([clip]), false);
    let (mut engine, bridge) = make_engine(project);

    engine.begin_keyframe_drag(ItemKind::Clip, "c1", ItemKind::Clip, "c1", 25, (400.0, 100.0));
    engine.finish_keyframe_drag(); // no move: a plain click

    let calls = bridge.take();
    assert!(calls.iter().any(|c| matches!(
        c,
        HostCall::AddSelection { id, kind: ItemKind::Clip, .. } if id == "c1"
    )));
    // position 3.0 = frame 72; keyframe 25 -> absolute 97.
    assert!(calls
        .iter()
        .any(|c| matches!(c, HostCall::SeekToKeyframe { frame: 97 })));
    assert!(!calls
        .iter()
        .any(|c| matches!(c, HostCall::StartKeyframeDrag { .. })));
}

#[test]
fn snapline_appears_during_drag_and_clears_on_stop() {
    let project = project_json(
        json!([
            clip_json("c1", 1, 1.0, 0.0, 2.0, true),
            clip_json("c2", 1, 8.0, 0.0, 2.0, false)
        ]),
        false,
    );
    let (mut engine, _bridge) = make_engine(project);

    engine.begin_item_drag("c1", ItemKind::Clip, (110.0, TRACK1_Y), false);
    // c1's left edge lands 5px short of c2's left edge (800px).
    engine.update_item_drag((805.0, TRACK1_Y));
    let scene = engine.scene();
    let snapline = scene.snapline_px.expect("snap line shown");
    assert!((snapline - 800.0).abs() < 1e-9);

    engine.finish_item_drag();
    let scene = engine.scene();
    assert!(scene.snapline_px.is_none(), "snap line hidden on drag stop");
}

#[test]
fn overlap_after_single_drag_proposes_transition() {
    let project = project_json(
        json!([
            clip_json("a", 1, 0.0, 0.0, 5.0, false),
            clip_json("b", 1, 8.0, 0.0, 6.0, true)
        ]),
        false,
    );
    let (mut engine, bridge) = make_engine(project);

    engine.begin_item_drag("b", ItemKind::Clip, (810.0, TRACK1_Y), false);
    engine.update_item_drag((410.0, TRACK1_Y)); // b moves to 4.0s
    engine.finish_item_drag();

    let calls = bridge.take();
    let proposal = calls
        .iter()
        .find_map(|c| match c {
            HostCall::AddMissingTransition { proposal } => Some(proposal.clone()),
            _ => None,
        })
        .expect("proposal emitted");
    assert_eq!(proposal["layer"], json!(1));
    assert_eq!(proposal["position"], json!(4.0));
    assert_eq!(proposal["end"], json!(1.0));
}

#[test]
fn overlap_after_trim_proposes_transition() {
    // a spans [0, 5]; b sits clear of it at [6, 10].
    let project = project_json(
        json!([
            clip_json("a", 1, 0.0, 0.0, 5.0, false),
            clip_json("b", 1, 6.0, 1.0, 5.0, false)
        ]),
        false,
    );
    let (mut engine, bridge) = make_engine(project);

    // Trim b's left edge out to 4.0s so its head overlaps a's tail.
    assert!(engine.begin_item_resize("b", ItemKind::Clip, Edge::Left));
    engine.update_item_resize(400.0);
    engine.finish_item_resize();

    let b = engine.project().clips.iter().find(|c| c.id == "b").unwrap();
    assert!((b.position - 4.0).abs() < 1e-9);

    let calls = bridge.take();
    let proposal = calls
        .iter()
        .find_map(|c| match c {
            HostCall::AddMissingTransition { proposal } => Some(proposal.clone()),
            _ => None,
        })
        .expect("resize stop probes overlaps too");
    assert_eq!(proposal["layer"], json!(1));
    assert_eq!(proposal["position"], json!(4.0));
    assert_eq!(proposal["end"], json!(1.0));
}

#[test]
fn context_menu_requests_reach_host() {
    let mut clip = clip_json("c1", 1, 1.0, 0.0, 3.0, false);
    clip["effects"] = json!([{"id": "fx1", "type": "blur", "selected": false}]);
    let project = json!({
        "fps": {"num": 24, "den": 1},
        "duration": 300.0,
        "scale": 1.0,
        "tick_pixels": 100.0,
        "playhead_position": 0.0,
        "layers": [
            {"id": "L1", "number": 1, "label": "Track 1", "lock": false, "height": 64.0},
            {"id": "L2", "number": 2, "label": "Track 2", "lock": false, "height": 64.0}
        ],
        "clips": [clip],
        "effects": [
            {"id": "t1", "layer": 1, "position": 6.0, "start": 0.0, "end": 1.0}
        ],
        "markers": [
            {"id": "m1", "position": 12.0, "icon": "blue.png", "vector": "blue"}
        ]
    })
    .to_string();
    let (mut engine, bridge) = make_engine(project);
    engine.move_playhead(2.0);

    engine.open_clip_menu("c1");
    engine.open_effect_menu("fx1");
    engine.open_effect_menu("t1"); // transition-level effect resolves too
    engine.open_transition_menu("t1");
    engine.open_track_menu(2);
    engine.open_marker_menu("m1");
    engine.open_playhead_menu();
    engine.open_timeline_menu(250.0, TRACK1_Y);

    let calls = bridge.take();
    assert!(calls.contains(&HostCall::ShowClipMenu { id: "c1".into() }));
    assert!(calls.contains(&HostCall::ShowEffectMenu { id: "fx1".into() }));
    assert!(calls.contains(&HostCall::ShowEffectMenu { id: "t1".into() }));
    assert!(calls.contains(&HostCall::ShowTransitionMenu { id: "t1".into() }));
    assert!(calls.contains(&HostCall::ShowTrackMenu { number: 2 }));
    assert!(calls.contains(&HostCall::ShowMarkerMenu { id: "m1".into() }));
    assert!(calls.iter().any(|c| matches!(
        c,
        HostCall::ShowPlayheadMenu { seconds } if (*seconds - 2.0).abs() < 1e-9
    )));
    assert!(calls.iter().any(|c| matches!(
        c,
        HostCall::ShowTimelineMenu { seconds, layer }
            if (*seconds - 2.5).abs() < 1e-9 && *layer == 1
    )));
}

#[test]
fn context_menus_ignore_unknown_entities() {
    let project = project_json(json!([clip_json("c1", 1, 1.0, 0.0, 3.0, false)]), false);
    let (engine, bridge) = make_engine(project);

    engine.open_clip_menu("ghost");
    engine.open_effect_menu("ghost");
    engine.open_transition_menu("ghost");
    engine.open_track_menu(99);
    engine.open_marker_menu("ghost");

    assert!(bridge.take().is_empty(), "unknown ids never reach the host");
}

#[test]
fn autogrow_requests_longer_timeline() {
    let mut project: Value = serde_json::from_str(&project_json(
        json!([clip_json("c1", 1, 1.0, 0.0, 4.0, true)]),
        false,
    ))
    .unwrap();
    project["duration"] = json!(10.0);
    let (mut engine, bridge) = make_engine(project.to_string());

    engine.begin_item_drag("c1", ItemKind::Clip, (110.0, TRACK1_Y), false);
    engine.update_item_drag((2110.0, TRACK1_Y)); // to ~21s, past the 10s timeline
    engine.finish_item_drag();

    let calls = bridge.take();
    let wanted = calls
        .iter()
        .find_map(|c| match c {
            HostCall::ResizeTimeline { seconds } => Some(*seconds),
            _ => None,
        })
        .expect("timeline resize requested");
    assert!((wanted - 300.0).abs() < 1e-9, "MIN_LEN dominates short content");
}

#[test]
fn marquee_selection_syncs_host_additively() {
    let project = project_json(
        json!([
            clip_json("c1", 1, 1.0, 0.0, 2.0, true),
            clip_json("c2", 1, 8.0, 0.0, 2.0, false)
        ]),
        false,
    );
    let (mut engine, bridge) = make_engine(project);

    // Non-additive marquee first clears the old selection.
    engine.begin_marquee((750.0, 96.0), false);
    engine.update_marquee((1050.0, 160.0));
    engine.finish_marquee();

    let calls = bridge.take();
    assert!(calls.iter().any(|c| matches!(
        c,
        HostCall::RemoveSelection { id, .. } if id == "c1"
    )));
    assert!(calls.iter().any(|c| matches!(
        c,
        HostCall::AddSelection { id, .. } if id == "c2"
    )));
    let c2 = engine.project().clips.iter().find(|c| c.id == "c2").unwrap();
    assert!(c2.selected);
}
