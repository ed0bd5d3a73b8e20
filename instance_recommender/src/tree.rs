/**
 * CART decision tree classifier.
 *
 * Nodes split on `feature <= threshold`, thresholds being midpoints between
 * consecutive distinct values of a feature. The split with the largest Gini
 * impurity decrease wins; on equal decrease the first feature, then the lowest
 * threshold, is kept. Leaves store per-class sample counts, so probabilities
 * are class frequencies of the leaf.
 */
use log::debug;
use std::fmt::Write;
use thiserror::Error;

/// Decreases closer than this are considered equal.
const GAIN_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TreeError {
    #[error("the classifier is not fitted")]
    NotFitted,
    #[error("empty training set")]
    EmptyTrainingSet,
    #[error("expected {expected} values, found {found}")]
    ShapeMismatch { expected: usize, found: usize },
    #[error("class {class} out of range for {n_classes} classes")]
    UnknownClass { class: usize, n_classes: usize },
    #[error("failed to format the tree: {0}")]
    Format(#[from] std::fmt::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub class_counts: Vec<usize>,
}

impl Leaf {
    fn new(y: &[usize], n_classes: usize) -> Self {
        let mut class_counts = vec![0; n_classes];
        for &label in y {
            class_counts[label] += 1;
        }
        Leaf { class_counts }
    }

    /// Most frequent class, the lowest one on ties.
    pub fn majority_class(&self) -> usize {
        let mut best = 0;
        for (class, &count) in self.class_counts.iter().enumerate() {
            if count > self.class_counts[best] {
                best = class;
            }
        }
        best
    }

    pub fn probabilities(&self) -> Vec<f64> {
        let total: usize = self.class_counts.iter().sum();
        self.class_counts
            .iter()
            .map(|&c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub feature: usize,
    pub threshold: f64,
    pub left: Box<TreeNode>,
    pub right: Box<TreeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Leaf(Leaf),
    Node(Node),
}

impl TreeNode {
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 0,
            TreeNode::Node(node) => 1 + node.left.depth().max(node.right.depth()),
        }
    }

    fn leaf_for(&self, sample: &[f64]) -> &Leaf {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(leaf) => return leaf,
                TreeNode::Node(split) => {
                    node = if sample[split.feature] <= split.threshold {
                        &split.left
                    } else {
                        &split.right
                    };
                }
            }
        }
    }
}

/// Gini impurity `1 - sum(p_i^2)` of a set of labels.
pub fn gini_impurity(y: &[usize], n_classes: usize) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    let mut counts = vec![0usize; n_classes];
    for &label in y {
        counts[label] += 1;
    }
    let n = y.len() as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

fn split_gain(
    x: &[Vec<f64>],
    y: &[usize],
    indices: &[usize],
    feature: usize,
    threshold: f64,
    parent_impurity: f64,
    n_classes: usize,
) -> Option<f64> {
    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| x[i][feature] <= threshold);
    if left.is_empty() || right.is_empty() {
        return None;
    }
    let labels = |side: &[usize]| side.iter().map(|&i| y[i]).collect::<Vec<_>>();
    let n = indices.len() as f64;
    let weighted = left.len() as f64 / n * gini_impurity(&labels(&left), n_classes)
        + right.len() as f64 / n * gini_impurity(&labels(&right), n_classes);
    Some(parent_impurity - weighted)
}

/// Best `(feature, threshold)` over all features, if any split decreases the
/// impurity.
fn find_best_split(
    x: &[Vec<f64>],
    y: &[usize],
    indices: &[usize],
    n_features: usize,
    n_classes: usize,
) -> Option<(usize, f64)> {
    let labels: Vec<usize> = indices.iter().map(|&i| y[i]).collect();
    let parent_impurity = gini_impurity(&labels, n_classes);
    let mut best: Option<(usize, f64, f64)> = None;

    for feature in 0..n_features {
        let mut values: Vec<f64> = indices.iter().map(|&i| x[i][feature]).collect();
        values.sort_by(f64::total_cmp);
        values.dedup();
        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let Some(gain) = split_gain(x, y, indices, feature, threshold, parent_impurity, n_classes)
            else {
                continue;
            };
            let best_gain = best.map_or(0.0, |(_, _, g)| g);
            if gain > best_gain + GAIN_EPSILON {
                best = Some((feature, threshold, gain));
            }
        }
    }
    best.map(|(feature, threshold, _)| (feature, threshold))
}

fn build_tree(
    x: &[Vec<f64>],
    y: &[usize],
    indices: &[usize],
    depth: usize,
    max_depth: Option<usize>,
    n_features: usize,
    n_classes: usize,
) -> TreeNode {
    let labels: Vec<usize> = indices.iter().map(|&i| y[i]).collect();
    let leaf = || TreeNode::Leaf(Leaf::new(&labels, n_classes));

    let pure = labels.windows(2).all(|w| w[0] == w[1]);
    if pure || max_depth.is_some_and(|max| depth >= max) {
        return leaf();
    }
    let Some((feature, threshold)) = find_best_split(x, y, indices, n_features, n_classes) else {
        return leaf();
    };
    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| x[i][feature] <= threshold);
    debug!(
        "depth {}: feature {} <= {:.2} ({} / {})",
        depth,
        feature,
        threshold,
        left.len(),
        right.len()
    );
    TreeNode::Node(Node {
        feature,
        threshold,
        left: Box::new(build_tree(x, y, &left, depth + 1, max_depth, n_features, n_classes)),
        right: Box::new(build_tree(x, y, &right, depth + 1, max_depth, n_features, n_classes)),
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionTreeClassifier {
    max_depth: Option<usize>,
    n_features: usize,
    n_classes: usize,
    tree: Option<TreeNode>,
}

impl DecisionTreeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn tree(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Fits on rows `x` and class indices `y` in `0..n_classes`.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[usize], n_classes: usize) -> Result<(), TreeError> {
        if x.is_empty() {
            return Err(TreeError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(TreeError::ShapeMismatch {
                expected: x.len(),
                found: y.len(),
            });
        }
        let n_features = x[0].len();
        if let Some(row) = x.iter().find(|row| row.len() != n_features) {
            return Err(TreeError::ShapeMismatch {
                expected: n_features,
                found: row.len(),
            });
        }
        if let Some(&class) = y.iter().find(|&&c| c >= n_classes) {
            return Err(TreeError::UnknownClass { class, n_classes });
        }

        let indices: Vec<usize> = (0..x.len()).collect();
        let tree = build_tree(x, y, &indices, 0, self.max_depth, n_features, n_classes);
        debug!("Fitted a tree of depth {} on {} samples", tree.depth(), x.len());
        self.n_features = n_features;
        self.n_classes = n_classes;
        self.tree = Some(tree);
        Ok(())
    }

    fn leaf(&self, sample: &[f64]) -> Result<&Leaf, TreeError> {
        let tree = self.tree.as_ref().ok_or(TreeError::NotFitted)?;
        if sample.len() != self.n_features {
            return Err(TreeError::ShapeMismatch {
                expected: self.n_features,
                found: sample.len(),
            });
        }
        Ok(tree.leaf_for(sample))
    }

    pub fn predict(&self, sample: &[f64]) -> Result<usize, TreeError> {
        Ok(self.leaf(sample)?.majority_class())
    }

    /// Class frequencies of the leaf `sample` falls in.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, TreeError> {
        Ok(self.leaf(sample)?.probabilities())
    }

    /// Rules of the tree, one line per node:
    ///
    /// ```text
    /// |--- CPU <= 7.00
    /// |   |--- class: t3.medium
    /// |--- CPU >  7.00
    /// |   |--- class: c5.large
    /// ```
    pub fn export_text(&self, feature_names: &[&str], class_names: &[String]) -> Result<String, TreeError> {
        let tree = self.tree.as_ref().ok_or(TreeError::NotFitted)?;
        if feature_names.len() != self.n_features {
            return Err(TreeError::ShapeMismatch {
                expected: self.n_features,
                found: feature_names.len(),
            });
        }
        if class_names.len() != self.n_classes {
            return Err(TreeError::ShapeMismatch {
                expected: self.n_classes,
                found: class_names.len(),
            });
        }
        let mut text = String::new();
        export_node(tree, feature_names, class_names, 0, &mut text)?;
        Ok(text)
    }
}

fn export_node(
    node: &TreeNode,
    features: &[&str],
    classes: &[String],
    depth: usize,
    text: &mut String,
) -> std::fmt::Result {
    let prefix = format!("{}|--- ", "|   ".repeat(depth));
    match node {
        TreeNode::Leaf(leaf) => writeln!(text, "{}class: {}", prefix, classes[leaf.majority_class()]),
        TreeNode::Node(split) => {
            let name = features[split.feature];
            writeln!(text, "{}{} <= {:.2}", prefix, name, split.threshold)?;
            export_node(&split.left, features, classes, depth + 1, text)?;
            writeln!(text, "{}{} >  {:.2}", prefix, name, split.threshold)?;
            export_node(&split.right, features, classes, depth + 1, text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_like() -> (Vec<Vec<f64>>, Vec<usize>) {
        (
            vec![
                vec![1.0, 1.0],
                vec![2.0, 1.0],
                vec![1.0, 5.0],
                vec![2.0, 5.0],
                vec![8.0, 1.0],
                vec![9.0, 5.0],
            ],
            vec![0, 0, 1, 1, 2, 2],
        )
    }

    #[test]
    fn gini() {
        assert_eq!(gini_impurity(&[], 2), 0.0);
        assert_eq!(gini_impurity(&[1, 1, 1], 2), 0.0);
        assert!((gini_impurity(&[0, 1], 2) - 0.5).abs() < 1e-12);
        assert!((gini_impurity(&[0, 1, 2], 3) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn fits_training_data() {
        let (x, y) = xor_like();
        let mut clf = DecisionTreeClassifier::new().with_max_depth(5);
        clf.fit(&x, &y, 3).unwrap();
        for (row, &label) in x.iter().zip(&y) {
            assert_eq!(clf.predict(row).unwrap(), label);
            let proba = clf.predict_proba(row).unwrap();
            assert_eq!(proba[label], 1.0);
            assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn thresholds_are_midpoints() {
        let mut clf = DecisionTreeClassifier::new();
        clf.fit(&[vec![1.0], vec![3.0]], &[0, 1], 2).unwrap();
        match clf.tree() {
            Some(TreeNode::Node(node)) => {
                assert_eq!(node.feature, 0);
                assert_eq!(node.threshold, 2.0);
            }
            other => panic!("expected a split, got {:?}", other),
        }
    }

    #[test]
    fn depth_limit_keeps_counts() {
        let (x, y) = xor_like();
        let mut clf = DecisionTreeClassifier::new().with_max_depth(1);
        clf.fit(&x, &y, 3).unwrap();
        assert_eq!(clf.tree().unwrap().depth(), 1);
        // The x <= 5 side mixes classes 0 and 1 evenly.
        let proba = clf.predict_proba(&[1.0, 1.0]).unwrap();
        assert_eq!(proba, vec![0.5, 0.5, 0.0]);
        assert_eq!(clf.predict(&[1.0, 1.0]).unwrap(), 0);
    }

    #[test]
    fn export_layout() {
        let mut clf = DecisionTreeClassifier::new();
        clf.fit(&[vec![1.0], vec![3.0]], &[0, 1], 2).unwrap();
        let text = clf
            .export_text(&["CPU"], &["small".to_owned(), "large".to_owned()])
            .unwrap();
        assert_eq!(
            text,
            "|--- CPU <= 2.00\n|   |--- class: small\n|--- CPU >  2.00\n|   |--- class: large\n"
        );
    }

    #[test]
    fn export_nested_splits() {
        let (x, y) = xor_like();
        let mut clf = DecisionTreeClassifier::new().with_max_depth(5);
        clf.fit(&x, &y, 3).unwrap();
        let classes = ["a".to_owned(), "b".to_owned(), "c".to_owned()];
        let text = clf.export_text(&["x", "y"], &classes).unwrap();
        assert!(text.starts_with("|--- x <= 5.00\n|   |--- y <= 3.00\n|   |   |--- class: a\n"));
        assert_eq!(text.lines().count(), 7);
        assert!(text.ends_with("|--- x >  5.00\n|   |--- class: c\n"));
        assert_eq!(
            clf.export_text(&["x"], &classes),
            Err(TreeError::ShapeMismatch { expected: 2, found: 1 })
        );
    }

    #[test]
    fn errors() {
        let clf = DecisionTreeClassifier::new();
        assert_eq!(clf.predict(&[1.0]), Err(TreeError::NotFitted));
        let mut clf = DecisionTreeClassifier::new();
        assert_eq!(clf.fit(&[], &[], 2), Err(TreeError::EmptyTrainingSet));
        assert!(matches!(
            clf.fit(&[vec![1.0], vec![1.0, 2.0]], &[0, 1], 2),
            Err(TreeError::ShapeMismatch { .. })
        ));
        assert_eq!(
            clf.fit(&[vec![1.0]], &[3], 2),
            Err(TreeError::UnknownClass { class: 3, n_classes: 2 })
        );
        clf.fit(&[vec![1.0]], &[0], 1).unwrap();
        assert!(matches!(clf.predict(&[1.0, 2.0]), Err(TreeError::ShapeMismatch { .. })));
    }
}
