use crate::encoder::{LabelEncoder, UnseenLabel};
use crate::knowledge_base::{Example, FEATURE_NAMES, KNOWLEDGE_BASE, KNOWLEDGE_BASE_VERSION};
use crate::tree::{DecisionTreeClassifier, TreeError};
use core::fmt::{Display, Formatter};
use itertools::Itertools;
use log::{error, info};
use thiserror::Error;

pub const MAX_DEPTH: usize = 5;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("training failed: {0}")]
    Tree(#[from] TreeError),
    #[error("inconsistent encoders: {0}")]
    Encoding(#[from] UnseenLabel),
}

/// A fitted classifier with the encoders of its categorical inputs.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub classifier: DecisionTreeClassifier,
    pub workload_encoder: LabelEncoder,
    pub budget_encoder: LabelEncoder,
    pub class_encoder: LabelEncoder,
}

impl TrainedModel {
    /// Decision rules of the classifier.
    pub fn export_text(&self) -> Result<String, ModelError> {
        Ok(self
            .classifier
            .export_text(&FEATURE_NAMES, self.class_encoder.classes())?)
    }
}

/// Trains on the built-in knowledge base.
pub fn train() -> Result<TrainedModel, ModelError> {
    info!("Training on knowledge base v{}", KNOWLEDGE_BASE_VERSION);
    train_on(&KNOWLEDGE_BASE)
}

pub fn train_on(examples: &[Example]) -> Result<TrainedModel, ModelError> {
    let workload_encoder = LabelEncoder::fit(examples.iter().map(|e| e.workload_type));
    let budget_encoder = LabelEncoder::fit(examples.iter().map(|e| e.budget_sensitive));
    let class_encoder = LabelEncoder::fit(examples.iter().map(|e| e.recommended_instance));

    let x = examples
        .iter()
        .map(|e| -> Result<Vec<f64>, UnseenLabel> {
            Ok(vec![
                e.cpu_intensity,
                e.memory_gb,
                workload_encoder.transform(e.workload_type)? as f64,
                budget_encoder.transform(e.budget_sensitive)? as f64,
            ])
        })
        .collect::<Result<Vec<_>, _>>()?;
    let y = examples
        .iter()
        .map(|e| class_encoder.transform(e.recommended_instance))
        .collect::<Result<Vec<_>, _>>()?;

    let mut classifier = DecisionTreeClassifier::new().with_max_depth(MAX_DEPTH);
    classifier.fit(&x, &y, class_encoder.len())?;
    Ok(TrainedModel {
        classifier,
        workload_encoder,
        budget_encoder,
        class_encoder,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    Instance {
        label: String,
        /// One per class, in `classes` order.
        probabilities: Vec<f64>,
        classes: Vec<String>,
    },
    /// A categorical input was not in the knowledge base.
    UnknownInput,
}

impl Recommendation {
    pub fn label(&self) -> Option<&str> {
        match self {
            Recommendation::Instance { label, .. } => Some(label),
            Recommendation::UnknownInput => None,
        }
    }

    /// `(class, probability)` pairs, empty for an unknown input.
    pub fn confidence(&self) -> Vec<(&str, f64)> {
        match self {
            Recommendation::Instance {
                probabilities,
                classes,
                ..
            } => classes.iter().map(String::as_str).zip(probabilities.iter().copied()).collect(),
            Recommendation::UnknownInput => Vec::new(),
        }
    }
}

impl Display for Recommendation {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Recommendation::Instance { label, .. } => write!(f, "{}", label),
            Recommendation::UnknownInput => write!(f, "Unknown Input"),
        }
    }
}

/// Formats the confidence as `class=p, ...`, or `n/a` for an unknown input.
pub fn format_confidence(recommendation: &Recommendation) -> String {
    let confidence = recommendation.confidence();
    if confidence.is_empty() {
        return "n/a".to_owned();
    }
    confidence
        .iter()
        .map(|(class, p)| format!("{}={:.2}", class, p))
        .join(", ")
}

pub fn predict(
    model: &TrainedModel,
    cpu: f64,
    memory_gb: f64,
    workload_type: &str,
    budget_sensitive: &str,
) -> Recommendation {
    let (workload, budget) = match (
        model.workload_encoder.transform(workload_type),
        model.budget_encoder.transform(budget_sensitive),
    ) {
        (Ok(w), Ok(b)) => (w, b),
        (Err(e), _) | (_, Err(e)) => {
            info!("{}", e);
            return Recommendation::UnknownInput;
        }
    };
    let sample = [cpu, memory_gb, workload as f64, budget as f64];
    let result = model.classifier.predict(&sample).and_then(|class| {
        Ok((class, model.classifier.predict_proba(&sample)?))
    });
    match result {
        Ok((class, probabilities)) => match model.class_encoder.inverse_transform(class) {
            Some(label) => Recommendation::Instance {
                label: label.to_owned(),
                probabilities,
                classes: model.class_encoder.classes().to_vec(),
            },
            None => {
                error!("Predicted class {} has no label", class);
                Recommendation::UnknownInput
            }
        },
        Err(e) => {
            error!("Prediction failed: {}", e);
            Recommendation::UnknownInput
        }
    }
}
