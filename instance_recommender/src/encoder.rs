use itertools::Itertools;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("label {0:?} was not seen during fitting")]
pub struct UnseenLabel(pub String);

/// Maps categorical labels to `0..n`, in lexical order of the labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        LabelEncoder {
            classes: labels.into_iter().map(str::to_owned).sorted().dedup().collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn transform(&self, label: &str) -> Result<usize, UnseenLabel> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| UnseenLabel(label.to_owned()))
    }

    pub fn inverse_transform(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }
}
