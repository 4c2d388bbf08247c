use serde::{Serialize, Serializer};
use std::fmt;

/// 类别数量，等于模型输出向量长度
pub const CLASS_COUNT: usize = 6;

/// 发育缺陷类别，顺序与模型输出下标一一对应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassLabel {
    CurvedSpine,
    Dead,
    Edema,
    Normal,
    Unhatched,
    YolkDeformation,
}

impl ClassLabel {
    pub const ALL: [ClassLabel; CLASS_COUNT] = [
        ClassLabel::CurvedSpine,
        ClassLabel::Dead,
        ClassLabel::Edema,
        ClassLabel::Normal,
        ClassLabel::Unhatched,
        ClassLabel::YolkDeformation,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ClassLabel::CurvedSpine => "Curved spine",
            ClassLabel::Dead => "Dead",
            ClassLabel::Edema => "Edema",
            ClassLabel::Normal => "Normal",
            ClassLabel::Unhatched => "Unhatched",
            ClassLabel::YolkDeformation => "Yolk deformation",
        }
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ClassLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_model_output_order() {
        for (i, label) in ClassLabel::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
            assert_eq!(ClassLabel::from_index(i), Some(*label));
        }
        assert_eq!(ClassLabel::from_index(CLASS_COUNT), None);
    }

    #[test]
    fn names_are_display_names() {
        assert_eq!(ClassLabel::CurvedSpine.to_string(), "Curved spine");
        assert_eq!(ClassLabel::Normal.name(), "Normal");
        assert_eq!(
            serde_json::to_string(&ClassLabel::YolkDeformation).unwrap(),
            "\"Yolk deformation\""
        );
    }
}
