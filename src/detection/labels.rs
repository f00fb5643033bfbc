//! Object class label tables.

use std::path::Path;

use anyhow::Context;

/// The 80 class names of the COCO dataset, in training order.
const COCO_NAMES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// Maps the numeric class IDs emitted by an object detection network to class names.
///
/// The class ID of a name is its position in the table plus a configurable first ID (networks
/// trained with a background class at ID 0 number their real classes from 1).
#[derive(Debug, Clone)]
pub struct ClassLabels {
    names: Vec<String>,
    first_id: u32,
}

impl ClassLabels {
    /// Returns the COCO class table, numbered from 0.
    pub fn coco() -> Self {
        Self::new(COCO_NAMES.iter().map(|s| s.to_string()).collect())
    }

    pub fn new(names: Vec<String>) -> Self {
        Self { names, first_id: 0 }
    }

    /// Loads a newline-separated class name file (eg. `coco.names`).
    ///
    /// Trailing empty lines are ignored.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read class names from '{}'", path.display()))?;
        Ok(Self::parse(&text))
    }

    fn parse(text: &str) -> Self {
        let names = text
            .trim_end_matches(['\n', '\r'])
            .lines()
            .map(|line| line.trim().to_string())
            .collect();
        Self::new(names)
    }

    /// Returns a copy of `self` whose first class has the ID `first_id`.
    pub fn with_first_id(self, first_id: u32) -> Self {
        Self { first_id, ..self }
    }

    /// Returns the class ID belonging to `name`, if the table contains it.
    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|pos| pos as u32 + self.first_id)
    }

    /// Returns the name of the class with ID `id`.
    pub fn name_of(&self, id: u32) -> Option<&str> {
        let index = id.checked_sub(self.first_id)?;
        self.names.get(index as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coco_person_is_first() {
        let labels = ClassLabels::coco();
        assert_eq!(labels.len(), 80);
        assert_eq!(labels.id_of("person"), Some(0));
        assert_eq!(labels.id_of("dog"), Some(16));
        assert_eq!(labels.name_of(16), Some("dog"));
    }

    #[test]
    fn first_id_offsets_lookups() {
        let labels = ClassLabels::coco().with_first_id(1);
        assert_eq!(labels.id_of("person"), Some(1));
        assert_eq!(labels.name_of(1), Some("person"));
        assert_eq!(labels.name_of(0), None);
    }

    #[test]
    fn parse_names_file() {
        let labels = ClassLabels::parse("person\nbicycle\r\ncar\n\n");
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.id_of("car"), Some(2));
        assert_eq!(labels.id_of("truck"), None);
    }
}
