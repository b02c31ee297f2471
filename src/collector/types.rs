//! Pointer event and sample types.
//!
//! A [`RawPointerEvent`] is what the host delivers: one multi-pointer motion
//! event. A [`Sample`] is one pointer slot of one such event, flattened into a
//! fixed-shape record. Field values pass through unmodified.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Gesture phase of a motion event, after masking out the pointer index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum MotionAction {
    Down,
    Up,
    Move,
    Cancel,
    Outside,
    PointerDown,
    PointerUp,
    HoverMove,
    Scroll,
    HoverEnter,
    HoverExit,
    ButtonPress,
    ButtonRelease,
    /// Any code this crate does not name, carried through as-is
    Other(i32),
}

impl MotionAction {
    const ACTION_MASK: i32 = 0xff;
    const POINTER_INDEX_MASK: i32 = 0xff00;
    const POINTER_INDEX_SHIFT: u32 = 8;

    /// Split a packed action into the masked action and the pointer index.
    pub fn split_packed(raw: i32) -> (Self, usize) {
        let action = Self::from(raw & Self::ACTION_MASK);
        let index = ((raw & Self::POINTER_INDEX_MASK) >> Self::POINTER_INDEX_SHIFT) as usize;
        (action, index)
    }

    /// Numeric action code.
    pub fn code(self) -> i32 {
        self.into()
    }
}

impl From<i32> for MotionAction {
    fn from(code: i32) -> Self {
        match code {
            0 => MotionAction::Down,
            1 => MotionAction::Up,
            2 => MotionAction::Move,
            3 => MotionAction::Cancel,
            4 => MotionAction::Outside,
            5 => MotionAction::PointerDown,
            6 => MotionAction::PointerUp,
            7 => MotionAction::HoverMove,
            8 => MotionAction::Scroll,
            9 => MotionAction::HoverEnter,
            10 => MotionAction::HoverExit,
            11 => MotionAction::ButtonPress,
            12 => MotionAction::ButtonRelease,
            other => MotionAction::Other(other),
        }
    }
}

impl From<MotionAction> for i32 {
    fn from(action: MotionAction) -> Self {
        match action {
            MotionAction::Down => 0,
            MotionAction::Up => 1,
            MotionAction::Move => 2,
            MotionAction::Cancel => 3,
            MotionAction::Outside => 4,
            MotionAction::PointerDown => 5,
            MotionAction::PointerUp => 6,
            MotionAction::HoverMove => 7,
            MotionAction::Scroll => 8,
            MotionAction::HoverEnter => 9,
            MotionAction::HoverExit => 10,
            MotionAction::ButtonPress => 11,
            MotionAction::ButtonRelease => 12,
            MotionAction::Other(code) => code,
        }
    }
}

/// Kind of contact that produced a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ToolType {
    #[default]
    Unknown,
    Finger,
    Stylus,
    Mouse,
    Eraser,
    Palm,
    Other(i32),
}

impl From<i32> for ToolType {
    fn from(code: i32) -> Self {
        match code {
            0 => ToolType::Unknown,
            1 => ToolType::Finger,
            2 => ToolType::Stylus,
            3 => ToolType::Mouse,
            4 => ToolType::Eraser,
            5 => ToolType::Palm,
            other => ToolType::Other(other),
        }
    }
}

impl From<ToolType> for i32 {
    fn from(tool: ToolType) -> Self {
        match tool {
            ToolType::Unknown => 0,
            ToolType::Finger => 1,
            ToolType::Stylus => 2,
            ToolType::Mouse => 3,
            ToolType::Eraser => 4,
            ToolType::Palm => 5,
            ToolType::Other(code) => code,
        }
    }
}

/// Per-pointer attributes of one slot in a raw event.
///
/// Optional axes default to zero when a source does not report them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerSlot {
    /// Stable identifier of the contact for its down-to-up lifetime
    pub pointer_id: i32,
    #[serde(default)]
    pub tool_type: ToolType,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub pressure: f32,
    #[serde(default)]
    pub size: f32,
    #[serde(default)]
    pub touch_major: f32,
    #[serde(default)]
    pub touch_minor: f32,
    #[serde(default)]
    pub tool_major: f32,
    #[serde(default)]
    pub tool_minor: f32,
    #[serde(default)]
    pub orientation: f32,
    #[serde(default)]
    pub tilt: f32,
    #[serde(default)]
    pub distance: f32,
}

impl PointerSlot {
    /// Create a slot with a position and every other axis zeroed.
    pub fn at(pointer_id: i32, tool_type: ToolType, x: f32, y: f32) -> Self {
        Self {
            pointer_id,
            tool_type,
            x,
            y,
            pressure: 0.0,
            size: 0.0,
            touch_major: 0.0,
            touch_minor: 0.0,
            tool_major: 0.0,
            tool_minor: 0.0,
            orientation: 0.0,
            tilt: 0.0,
            distance: 0.0,
        }
    }
}

/// One multi-pointer motion event as delivered by the host surface.
///
/// When loaded without an `action_index`, `action` is read as a packed code
/// and split with [`MotionAction::split_packed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPointerEventRecord")]
pub struct RawPointerEvent {
    /// Event time in the source clock, milliseconds
    pub event_time_ms: i64,
    /// Masked action for the whole event
    pub action: MotionAction,
    /// Index of the pointer that triggered the event
    pub action_index: usize,
    pub button_state: i32,
    pub meta_state: i32,
    pub edge_flags: i32,
    /// Pointer slots in event order
    pub pointers: Vec<PointerSlot>,
}

#[derive(Deserialize)]
struct RawPointerEventRecord {
    event_time_ms: i64,
    action: i32,
    #[serde(default)]
    action_index: Option<usize>,
    #[serde(default)]
    button_state: i32,
    #[serde(default)]
    meta_state: i32,
    #[serde(default)]
    edge_flags: i32,
    pointers: Vec<PointerSlot>,
}

impl From<RawPointerEventRecord> for RawPointerEvent {
    fn from(record: RawPointerEventRecord) -> Self {
        let (action, action_index) = match record.action_index {
            Some(index) => (MotionAction::from(record.action), index),
            None => MotionAction::split_packed(record.action),
        };
        Self {
            event_time_ms: record.event_time_ms,
            action,
            action_index,
            button_state: record.button_state,
            meta_state: record.meta_state,
            edge_flags: record.edge_flags,
            pointers: record.pointers,
        }
    }
}

impl RawPointerEvent {
    /// Number of pointers carried by this event.
    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    /// Expand the event into one sample per pointer slot, in slot order.
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.pointers
            .iter()
            .enumerate()
            .map(move |(index, slot)| Sample::from_slot(self, index, slot))
    }
}

/// One pointer's state at one instant.
///
/// Serializes to the flat mapping the script layer consumes; the renamed keys
/// are part of that contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    #[serde(rename = "t_ms")]
    pub timestamp_ms: i64,
    pub action: MotionAction,
    pub action_index: i32,
    #[serde(rename = "is_action_index")]
    pub is_triggering_pointer: bool,
    pub pointer_index: i32,
    pub pointer_id: i32,
    #[serde(rename = "tool")]
    pub tool_type: ToolType,
    pub x: f64,
    pub y: f64,
    pub pressure: f64,
    pub size: f64,
    pub touch_major: f64,
    pub touch_minor: f64,
    pub tool_major: f64,
    pub tool_minor: f64,
    pub orientation: f64,
    pub tilt: f64,
    pub distance: f64,
    pub button_state: i32,
    pub meta_state: i32,
    pub edge_flags: i32,
}

impl Sample {
    fn from_slot(event: &RawPointerEvent, index: usize, slot: &PointerSlot) -> Self {
        Self {
            timestamp_ms: event.event_time_ms,
            action: event.action,
            action_index: event.action_index as i32,
            is_triggering_pointer: index == event.action_index,
            pointer_index: index as i32,
            pointer_id: slot.pointer_id,
            tool_type: slot.tool_type,
            x: f64::from(slot.x),
            y: f64::from(slot.y),
            pressure: f64::from(slot.pressure),
            size: f64::from(slot.size),
            touch_major: f64::from(slot.touch_major),
            touch_minor: f64::from(slot.touch_minor),
            tool_major: f64::from(slot.tool_major),
            tool_minor: f64::from(slot.tool_minor),
            orientation: f64::from(slot.orientation),
            tilt: f64::from(slot.tilt),
            distance: f64::from(slot.distance),
            button_state: event.button_state,
            meta_state: event.meta_state,
            edge_flags: event.edge_flags,
        }
    }

    /// Flat key/value form handed to the script layer.
    ///
    /// JSON has no NaN or infinity, so a non-finite axis value comes out as
    /// `null`, the same as `serde_json` serializes it.
    pub fn to_dictionary(&self) -> Map<String, Value> {
        let mut map = Map::with_capacity(21);
        map.insert("t_ms".into(), Value::from(self.timestamp_ms));
        map.insert("action".into(), Value::from(self.action.code()));
        map.insert("action_index".into(), Value::from(self.action_index));
        map.insert(
            "is_action_index".into(),
            Value::from(self.is_triggering_pointer),
        );
        map.insert("pointer_index".into(), Value::from(self.pointer_index));
        map.insert("pointer_id".into(), Value::from(self.pointer_id));
        map.insert("tool".into(), Value::from(i32::from(self.tool_type)));
        map.insert("x".into(), Value::from(self.x));
        map.insert("y".into(), Value::from(self.y));
        map.insert("pressure".into(), Value::from(self.pressure));
        map.insert("size".into(), Value::from(self.size));
        map.insert("touch_major".into(), Value::from(self.touch_major));
        map.insert("touch_minor".into(), Value::from(self.touch_minor));
        map.insert("tool_major".into(), Value::from(self.tool_major));
        map.insert("tool_minor".into(), Value::from(self.tool_minor));
        map.insert("orientation".into(), Value::from(self.orientation));
        map.insert("tilt".into(), Value::from(self.tilt));
        map.insert("distance".into(), Value::from(self.distance));
        map.insert("button_state".into(), Value::from(self.button_state));
        map.insert("meta_state".into(), Value::from(self.meta_state));
        map.insert("edge_flags".into(), Value::from(self.edge_flags));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_finger_event() -> RawPointerEvent {
        RawPointerEvent {
            event_time_ms: 1_000,
            action: MotionAction::PointerDown,
            action_index: 2,
            button_state: 0,
            meta_state: 0,
            edge_flags: 0,
            pointers: vec![
                PointerSlot::at(7, ToolType::Finger, 10.0, 20.0),
                PointerSlot::at(3, ToolType::Finger, 30.0, 40.0),
                PointerSlot::at(9, ToolType::Finger, 50.0, 60.0),
            ],
        }
    }

    #[test]
    fn test_fan_out_one_sample_per_slot() {
        let samples: Vec<Sample> = three_finger_event().samples().collect();

        assert_eq!(samples.len(), 3);
        let indices: Vec<i32> = samples.iter().map(|s| s.pointer_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        let ids: Vec<i32> = samples.iter().map(|s| s.pointer_id).collect();
        assert_eq!(ids, vec![7, 3, 9]);

        let triggering: Vec<&Sample> =
            samples.iter().filter(|s| s.is_triggering_pointer).collect();
        assert_eq!(triggering.len(), 1);
        assert_eq!(triggering[0].pointer_index, 2);
        assert!(samples.iter().all(|s| s.action_index == 2));
        assert!(samples.iter().all(|s| s.timestamp_ms == 1_000));
    }

    #[test]
    fn test_event_without_pointers_yields_nothing() {
        let mut event = three_finger_event();
        event.pointers.clear();
        assert_eq!(event.samples().count(), 0);
    }

    #[test]
    fn test_split_packed_action() {
        // pointer-up for the pointer at index 1
        let (action, index) = MotionAction::split_packed(0x0106);
        assert_eq!(action, MotionAction::PointerUp);
        assert_eq!(index, 1);

        let (action, index) = MotionAction::split_packed(2);
        assert_eq!(action, MotionAction::Move);
        assert_eq!(index, 0);
    }

    #[test]
    fn test_unknown_codes_pass_through() {
        assert_eq!(MotionAction::from(42), MotionAction::Other(42));
        assert_eq!(MotionAction::Other(42).code(), 42);
        assert_eq!(i32::from(ToolType::from(17)), 17);
    }

    #[test]
    fn test_dictionary_keys_and_types() {
        let sample = three_finger_event().samples().next().unwrap();
        let dict = sample.to_dictionary();

        assert_eq!(dict.len(), 21);
        assert_eq!(dict["t_ms"], Value::from(1_000));
        assert_eq!(dict["action"], Value::from(5));
        assert_eq!(dict["is_action_index"], Value::from(false));
        assert_eq!(dict["tool"], Value::from(1));
        assert_eq!(dict["x"].as_f64(), Some(10.0));
        assert!(dict["pointer_id"].is_i64());
    }

    #[test]
    fn test_serialize_matches_dictionary() {
        for sample in three_finger_event().samples() {
            let serialized = serde_json::to_value(&sample).unwrap();
            assert_eq!(serialized, Value::Object(sample.to_dictionary()));
        }
    }

    #[test]
    fn test_raw_event_deserializes_with_defaults() {
        let json = r#"{
            "event_time_ms": 55,
            "action": 0,
            "pointers": [{"pointer_id": 4, "x": 1.5, "y": 2.5}]
        }"#;
        let event: RawPointerEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.action, MotionAction::Down);
        assert_eq!(event.action_index, 0);
        assert_eq!(event.pointers[0].tool_type, ToolType::Unknown);
        assert_eq!(event.pointers[0].pressure, 0.0);
    }

    #[test]
    fn test_raw_event_splits_packed_action() {
        // pointer-down for the pointer at index 1, no separate index given
        let json = r#"{"event_time_ms": 9, "action": 261, "pointers": [
            {"pointer_id": 0, "x": 0.0, "y": 0.0},
            {"pointer_id": 1, "x": 5.0, "y": 5.0}
        ]}"#;
        let event: RawPointerEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.action, MotionAction::PointerDown);
        assert_eq!(event.action_index, 1);
        let triggering: Vec<i32> = event
            .samples()
            .filter(|s| s.is_triggering_pointer)
            .map(|s| s.pointer_id)
            .collect();
        assert_eq!(triggering, vec![1]);
    }

    #[test]
    fn test_raw_event_round_trips_through_json() {
        let event = three_finger_event();
        let json = serde_json::to_string(&event).unwrap();
        let loaded: RawPointerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, event);
    }

    #[test]
    fn test_non_finite_axes_become_null() {
        let mut event = three_finger_event();
        event.pointers[0].pressure = f32::NAN;
        event.pointers[0].orientation = f32::INFINITY;
        let sample = event.samples().next().unwrap();

        let dict = sample.to_dictionary();
        assert_eq!(dict["pressure"], Value::Null);
        assert_eq!(dict["orientation"], Value::Null);
        assert_eq!(dict["x"].as_f64(), Some(10.0));
        assert_eq!(serde_json::to_value(&sample).unwrap(), Value::Object(dict));
    }
}
