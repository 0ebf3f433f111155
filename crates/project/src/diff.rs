//! JSON-diff application.
//!
//! The host pushes arrays of `{type, key, value}` actions where `key`
//! is a path of property names (strings) and `{id: ..}` selectors for
//! arrays of entities. Top-level collections (`clips`, `effects`,
//! `markers`, `layers`) are dispatched onto the typed model; paths that
//! descend into an entity are applied through a `serde_json::Value`
//! round-trip of that entity only, with its transient `ui` state held
//! aside so a patch can never leak or destroy it.
//!
//! Failed actions are skipped with a debug log; the host owns the
//! authoritative state and a partial diff must not take the engine down.

use crate::error::{ProjectError, ProjectResult};
use crate::types::{Clip, Layer, Marker, Project, Transition, UiState};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Diff operation kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOp {
    Insert,
    Update,
    Delete,
}

/// One element of a diff key path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySegment {
    /// A property name.
    Name(String),
    /// An `{id: ..}` selector into an array of entities.
    Selector { id: String },
}

/// A single host-issued diff action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiffAction {
    #[serde(rename = "type")]
    pub op: DiffOp,
    pub key: Vec<KeySegment>,
    #[serde(default)]
    pub value: Value,
}

/// Apply a batch of actions, skipping (and logging) any that fail.
/// Returns the number of actions applied. Callers are expected to
/// re-sort and re-index the project afterwards (deferred tick).
pub fn apply_actions(project: &mut Project, actions: &[DiffAction]) -> usize {
    let mut applied = 0;
    for action in actions {
        match apply_action(project, action) {
            Ok(()) => applied += 1,
            Err(err) => {
                tracing::debug!(error = %err, key = ?action.key, op = ?action.op, "Skipping diff action")
            }
        }
    }
    applied
}

fn apply_action(project: &mut Project, action: &DiffAction) -> ProjectResult<()> {
    let Some((root, rest)) = action.key.split_first() else {
        return Err(ProjectError::BadKey("empty key".into()));
    };
    let KeySegment::Name(root) = root else {
        return Err(ProjectError::BadKey("key must start with a name".into()));
    };

    match root.as_str() {
        "clips" => apply_to_entities(&mut project.clips, rest, action.op, &action.value),
        "effects" => apply_to_entities(&mut project.effects, rest, action.op, &action.value),
        "markers" => apply_to_entities(&mut project.markers, rest, action.op, &action.value),
        "layers" => apply_to_entities(&mut project.layers, rest, action.op, &action.value),
        "fps" => apply_to_slot(&mut project.fps, rest, action.op, &action.value),
        "duration" => apply_to_slot(&mut project.duration, rest, action.op, &action.value),
        "scale" => apply_to_slot(&mut project.scale, rest, action.op, &action.value),
        "tick_pixels" => apply_to_slot(&mut project.tick_pixels, rest, action.op, &action.value),
        "playhead_position" => {
            apply_to_slot(&mut project.playhead_position, rest, action.op, &action.value)
        }
        "progress" => apply_to_slot(&mut project.progress, rest, action.op, &action.value),
        other => Err(ProjectError::BadKey(format!("unknown root: {other}"))),
    }
}

/// An entity addressable by `{id}` selectors. `ui` carriers hold their
/// transient state aside while the JSON shape is patched.
trait DiffEntity: Serialize + DeserializeOwned {
    fn entity_id(&self) -> &str;

    fn take_ui(&mut self) -> Option<UiState> {
        None
    }

    fn restore_ui(&mut self, _ui: Option<UiState>) {}
}

impl DiffEntity for Clip {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn take_ui(&mut self) -> Option<UiState> {
        Some(std::mem::take(&mut self.ui))
    }

    fn restore_ui(&mut self, ui: Option<UiState>) {
        if let Some(ui) = ui {
            self.ui = ui;
        }
    }
}

impl DiffEntity for Transition {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn take_ui(&mut self) -> Option<UiState> {
        Some(std::mem::take(&mut self.ui))
    }

    fn restore_ui(&mut self, ui: Option<UiState>) {
        if let Some(ui) = ui {
            self.ui = ui;
        }
    }
}

impl DiffEntity for Marker {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

impl DiffEntity for Layer {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

fn apply_to_entities<T: DiffEntity>(
    list: &mut Vec<T>,
    path: &[KeySegment],
    op: DiffOp,
    value: &Value,
) -> ProjectResult<()> {
    // Whole-collection operations.
    let Some((selector, rest)) = path.split_first() else {
        match op {
            DiffOp::Insert => list.push(serde_json::from_value(value.clone())?),
            DiffOp::Update => *list = serde_json::from_value(value.clone())?,
            DiffOp::Delete => list.clear(),
        }
        return Ok(());
    };

    let KeySegment::Selector { id } = selector else {
        return Err(ProjectError::BadKey(
            "entity collections are addressed by {id} selectors".into(),
        ));
    };
    let Some(index) = list.iter().position(|e| e.entity_id() == id) else {
        return Err(ProjectError::UnknownEntity(id.clone()));
    };

    if rest.is_empty() && op == DiffOp::Delete {
        list.remove(index);
        return Ok(());
    }

    let entity = &mut list[index];
    let ui = entity.take_ui();
    let mut tree = serde_json::to_value(&*entity)?;
    let result = if rest.is_empty() {
        // Target is the entity itself: merge for updates, replace for inserts.
        match op {
            DiffOp::Update => {
                merge_or_replace(&mut tree, value);
                Ok(())
            }
            DiffOp::Insert => {
                tree = value.clone();
                Ok(())
            }
            DiffOp::Delete => unreachable!("handled above"),
        }
    } else {
        apply_in_value(&mut tree, rest, op, value)
    };
    match result.and_then(|()| serde_json::from_value::<T>(tree).map_err(ProjectError::from)) {
        Ok(mut patched) => {
            patched.restore_ui(ui);
            list[index] = patched;
            Ok(())
        }
        Err(err) => {
            list[index].restore_ui(ui);
            Err(err)
        }
    }
}

/// Apply an op to a typed project field through its JSON shape.
fn apply_to_slot<T: Serialize + DeserializeOwned + Default>(
    slot: &mut T,
    path: &[KeySegment],
    op: DiffOp,
    value: &Value,
) -> ProjectResult<()> {
    if path.is_empty() && op == DiffOp::Delete {
        *slot = T::default();
        return Ok(());
    }
    let mut tree = serde_json::to_value(&*slot)?;
    if path.is_empty() {
        match op {
            DiffOp::Insert => {
                if let Value::Array(items) = &mut tree {
                    items.push(value.clone());
                } else {
                    tree = value.clone();
                }
            }
            DiffOp::Update => merge_or_replace(&mut tree, value),
            DiffOp::Delete => unreachable!("handled above"),
        }
    } else {
        apply_in_value(&mut tree, path, op, value)?;
    }
    *slot = serde_json::from_value(tree)?;
    Ok(())
}

/// Walk `path` inside a JSON tree and apply the op at the leaf.
fn apply_in_value(
    tree: &mut Value,
    path: &[KeySegment],
    op: DiffOp,
    value: &Value,
) -> ProjectResult<()> {
    let (leaf, parents) = path.split_last().expect("non-empty path");

    let mut current = tree;
    for segment in parents {
        current = descend(current, segment)?;
    }

    match op {
        DiffOp::Insert => {
            // Append when the addressed slot is an array, otherwise
            // replace the parent's slot.
            if peek(current, leaf).is_some_and(Value::is_array) {
                if let Ok(Value::Array(items)) = descend(current, leaf) {
                    items.push(value.clone());
                }
            } else {
                assign(current, leaf, value.clone())?;
            }
        }
        DiffOp::Update => {
            let target = descend(current, leaf)?;
            merge_or_replace(target, value);
        }
        DiffOp::Delete => match leaf {
            KeySegment::Name(name) => {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ProjectError::MissingTarget(name.clone()))?;
                obj.remove(name)
                    .ok_or_else(|| ProjectError::MissingTarget(name.clone()))?;
            }
            KeySegment::Selector { id } => {
                let items = current
                    .as_array_mut()
                    .ok_or_else(|| ProjectError::MissingTarget(id.clone()))?;
                let index = items
                    .iter()
                    .position(|item| item.get("id").and_then(Value::as_str) == Some(id))
                    .ok_or_else(|| ProjectError::UnknownEntity(id.clone()))?;
                items.remove(index);
            }
        },
    }
    Ok(())
}

fn peek<'a>(current: &'a Value, segment: &KeySegment) -> Option<&'a Value> {
    match segment {
        KeySegment::Name(name) => current.get(name.as_str()),
        KeySegment::Selector { id } => current
            .as_array()?
            .iter()
            .find(|item| item.get("id").and_then(Value::as_str) == Some(id.as_str())),
    }
}

fn descend<'a>(current: &'a mut Value, segment: &KeySegment) -> ProjectResult<&'a mut Value> {
    match segment {
        KeySegment::Name(name) => current
            .get_mut(name.as_str())
            .ok_or_else(|| ProjectError::MissingTarget(name.clone())),
        KeySegment::Selector { id } => {
            let items = current
                .as_array_mut()
                .ok_or_else(|| ProjectError::MissingTarget(id.clone()))?;
            items
                .iter_mut()
                .find(|item| item.get("id").and_then(Value::as_str) == Some(id.as_str()))
                .ok_or_else(|| ProjectError::UnknownEntity(id.clone()))
        }
    }
}

fn assign(parent: &mut Value, leaf: &KeySegment, value: Value) -> ProjectResult<()> {
    match leaf {
        KeySegment::Name(name) => {
            let obj = parent
                .as_object_mut()
                .ok_or_else(|| ProjectError::MissingTarget(name.clone()))?;
            obj.insert(name.clone(), value);
            Ok(())
        }
        KeySegment::Selector { id } => {
            let target = descend(parent, &KeySegment::Selector { id: id.clone() })?;
            *target = value;
            Ok(())
        }
    }
}

/// Update semantics: merge own properties when both sides are objects,
/// otherwise replace.
fn merge_or_replace(target: &mut Value, value: &Value) {
    match (target.as_object_mut(), value.as_object()) {
        (Some(dst), Some(src)) => {
            for (key, item) in src {
                dst.insert(key.clone(), item.clone());
            }
        }
        _ => *target = value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn name(s: &str) -> KeySegment {
        KeySegment::Name(s.to_string())
    }

    fn sel(id: &str) -> KeySegment {
        KeySegment::Selector { id: id.to_string() }
    }

    fn clip_json(id: &str, position: f64) -> Value {
        json!({
            "id": id,
            "file_id": "F1",
            "layer": 1,
            "position": position,
            "start": 0.0,
            "end": 4.0
        })
    }

    fn make_project() -> Project {
        let mut project = Project::default();
        project.clips = vec![
            serde_json::from_value(clip_json("c1", 0.0)).unwrap(),
            serde_json::from_value(clip_json("c2", 6.0)).unwrap(),
        ];
        project
    }

    #[test]
    fn action_wire_format() {
        let action: DiffAction = serde_json::from_value(json!({
            "type": "update",
            "key": ["clips", {"id": "c1"}, "position"],
            "value": 3.0
        }))
        .unwrap();
        assert_eq!(action.op, DiffOp::Update);
        assert_eq!(action.key[0], name("clips"));
        assert_eq!(action.key[1], sel("c1"));
    }

    #[test]
    fn insert_appends_to_collection() {
        let mut project = make_project();
        let actions = [DiffAction {
            op: DiffOp::Insert,
            key: vec![name("clips")],
            value: clip_json("c3", 12.0),
        }];
        assert_eq!(apply_actions(&mut project, &actions), 1);
        assert_eq!(project.clips.len(), 3);
        assert_eq!(project.clips[2].id, "c3");
    }

    #[test]
    fn update_merges_entity_properties() {
        let mut project = make_project();
        let actions = [DiffAction {
            op: DiffOp::Update,
            key: vec![name("clips"), sel("c2")],
            value: json!({"position": 9.5, "layer": 3}),
        }];
        apply_actions(&mut project, &actions);
        let clip = &project.clips[1];
        assert!((clip.position - 9.5).abs() < 1e-9);
        assert_eq!(clip.layer, 3);
        // Untouched fields survive the merge.
        assert!((clip.end - 4.0).abs() < 1e-9);
        assert_eq!(clip.file_id, "F1");
    }

    #[test]
    fn delete_then_insert_restores_project() {
        let mut project = make_project();
        let original = serde_json::to_value(&project.clips[0]).unwrap();
        apply_actions(
            &mut project,
            &[DiffAction {
                op: DiffOp::Delete,
                key: vec![name("clips"), sel("c1")],
                value: Value::Null,
            }],
        );
        assert_eq!(project.clips.len(), 1);

        apply_actions(
            &mut project,
            &[DiffAction {
                op: DiffOp::Insert,
                key: vec![name("clips")],
                value: original.clone(),
            }],
        );
        assert_eq!(project.clips.len(), 2);
        assert_eq!(serde_json::to_value(&project.clips[1]).unwrap(), original);
    }

    #[test]
    fn unknown_entity_is_skipped() {
        let mut project = make_project();
        let applied = apply_actions(
            &mut project,
            &[DiffAction {
                op: DiffOp::Update,
                key: vec![name("clips"), sel("ghost")],
                value: json!({"position": 1.0}),
            }],
        );
        assert_eq!(applied, 0);
        assert_eq!(project.clips.len(), 2);
    }

    #[test]
    fn deep_property_insert_creates_missing_track() {
        let mut project = make_project();
        let actions = [DiffAction {
            op: DiffOp::Update,
            key: vec![name("clips"), sel("c1"), name("alpha")],
            value: json!({"Points": [
                {"co": {"X": 1, "Y": 1.0}, "interpolation": 1},
                {"co": {"X": 25, "Y": 0.0}, "interpolation": 1}
            ]}),
        }];
        // "alpha" does not exist yet -> update fails, insert creates it.
        assert_eq!(apply_actions(&mut project, &actions), 0);

        let actions = [DiffAction {
            op: DiffOp::Insert,
            key: vec![name("clips"), sel("c1"), name("alpha")],
            value: json!({"Points": [
                {"co": {"X": 1, "Y": 1.0}, "interpolation": 1},
                {"co": {"X": 25, "Y": 0.0}, "interpolation": 1}
            ]}),
        }];
        assert_eq!(apply_actions(&mut project, &actions), 1);
        assert!(project.clips[0].properties.get("alpha").unwrap().is_animated());
    }

    #[test]
    fn update_preserves_transient_ui() {
        let mut project = make_project();
        project.clips[0].ui.audio_data = vec![0.5; 10];
        apply_actions(
            &mut project,
            &[DiffAction {
                op: DiffOp::Update,
                key: vec![name("clips"), sel("c1"), name("position")],
                value: json!(2.0),
            }],
        );
        assert!((project.clips[0].position - 2.0).abs() < 1e-9);
        assert_eq!(project.clips[0].ui.audio_data.len(), 10);
    }

    #[test]
    fn scalar_roots() {
        let mut project = make_project();
        apply_actions(
            &mut project,
            &[
                DiffAction {
                    op: DiffOp::Update,
                    key: vec![name("duration")],
                    value: json!(420.0),
                },
                DiffAction {
                    op: DiffOp::Update,
                    key: vec![name("fps")],
                    value: json!({"num": 24, "den": 1}),
                },
            ],
        );
        assert!((project.duration - 420.0).abs() < 1e-9);
        assert_eq!(project.fps, cutline_common::Rational::FPS_24);
    }

    #[test]
    fn progress_ranges_insert_appends() {
        let mut project = make_project();
        let applied = apply_actions(
            &mut project,
            &[DiffAction {
                op: DiffOp::Insert,
                key: vec![name("progress"), name("ranges")],
                value: json!({"start": 1, "end": 120}),
            }],
        );
        assert_eq!(applied, 1);
        assert_eq!(project.progress.ranges.len(), 1);
        assert_eq!(project.progress.ranges[0].end, 120);
    }

    #[test]
    fn delete_nested_selector_from_effects_array() {
        let mut project = make_project();
        project.clips[0].effects.push(crate::types::Effect {
            id: "fx1".into(),
            kind: "blur".into(),
            ..Default::default()
        });
        let applied = apply_actions(
            &mut project,
            &[DiffAction {
                op: DiffOp::Delete,
                key: vec![name("clips"), sel("c1"), name("effects"), sel("fx1")],
                value: Value::Null,
            }],
        );
        assert_eq!(applied, 1);
        assert!(project.clips[0].effects.is_empty());
    }

    #[test]
    fn unknown_root_is_skipped() {
        let mut project = make_project();
        let applied = apply_actions(
            &mut project,
            &[DiffAction {
                op: DiffOp::Update,
                key: vec![name("nonsense")],
                value: json!(1),
            }],
        );
        assert_eq!(applied, 0);
    }
}
