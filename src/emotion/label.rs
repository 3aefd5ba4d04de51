use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the seven facial-expression classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmotionLabel {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

/// The ordered label set.
///
/// Position `i` is both the one-hot index used when labelling training data
/// and the output neuron `i` read back at inference time. Every path that
/// maps indices to labels goes through this constant.
pub const EMOTIONS: [EmotionLabel; 7] = [
    EmotionLabel::Angry,
    EmotionLabel::Disgust,
    EmotionLabel::Fear,
    EmotionLabel::Happy,
    EmotionLabel::Sad,
    EmotionLabel::Surprise,
    EmotionLabel::Neutral,
];

/// Number of output classes.
pub const NUM_CLASSES: usize = EMOTIONS.len();

impl EmotionLabel {
    /// Position of this label in [`EMOTIONS`].
    pub fn index(self) -> usize {
        match self {
            EmotionLabel::Angry    => 0,
            EmotionLabel::Disgust  => 1,
            EmotionLabel::Fear     => 2,
            EmotionLabel::Happy    => 3,
            EmotionLabel::Sad      => 4,
            EmotionLabel::Surprise => 5,
            EmotionLabel::Neutral  => 6,
        }
    }

    pub fn from_index(index: usize) -> Option<EmotionLabel> {
        EMOTIONS.get(index).copied()
    }

    /// Display name, e.g. `"Angry"`.
    pub fn name(self) -> &'static str {
        match self {
            EmotionLabel::Angry    => "Angry",
            EmotionLabel::Disgust  => "Disgust",
            EmotionLabel::Fear     => "Fear",
            EmotionLabel::Happy    => "Happy",
            EmotionLabel::Sad      => "Sad",
            EmotionLabel::Surprise => "Surprise",
            EmotionLabel::Neutral  => "Neutral",
        }
    }

    /// Directory name used by the on-disk dataset layout, e.g. `"angry"`.
    pub fn dir_name(self) -> &'static str {
        match self {
            EmotionLabel::Angry    => "angry",
            EmotionLabel::Disgust  => "disgust",
            EmotionLabel::Fear     => "fear",
            EmotionLabel::Happy    => "happy",
            EmotionLabel::Sad      => "sad",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Neutral  => "neutral",
        }
    }

    /// One-hot target vector of length [`NUM_CLASSES`].
    pub fn one_hot(self) -> Vec<f64> {
        let mut v = vec![0.0; NUM_CLASSES];
        v[self.index()] = 1.0;
        v
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown emotion label '{0}'")]
pub struct UnknownLabel(pub String);

impl FromStr for EmotionLabel {
    type Err = UnknownLabel;

    /// Case-insensitive; accepts both `"Happy"` and the directory form `"happy"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EMOTIONS
            .iter()
            .copied()
            .find(|label| label.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownLabel(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_position_in_label_set() {
        for (i, label) in EMOTIONS.iter().enumerate() {
            assert_eq!(label.index(), i);
            assert_eq!(EmotionLabel::from_index(i), Some(*label));
        }
        assert_eq!(EmotionLabel::from_index(NUM_CLASSES), None);
    }

    #[test]
    fn one_hot_sets_only_own_index() {
        let v = EmotionLabel::Sad.one_hot();
        assert_eq!(v.len(), 7);
        assert_eq!(v[4], 1.0);
        assert_eq!(v.iter().sum::<f64>(), 1.0);
    }

    #[test]
    fn parses_display_and_directory_names() {
        assert_eq!("Neutral".parse::<EmotionLabel>(), Ok(EmotionLabel::Neutral));
        assert_eq!("surprise".parse::<EmotionLabel>(), Ok(EmotionLabel::Surprise));
        assert!("contempt".parse::<EmotionLabel>().is_err());
    }

    #[test]
    fn serializes_as_display_name() {
        let json = serde_json::to_string(&EMOTIONS.to_vec()).unwrap();
        assert_eq!(
            json,
            r#"["Angry","Disgust","Fear","Happy","Sad","Surprise","Neutral"]"#
        );
    }
}
