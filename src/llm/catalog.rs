//! Model catalog: provider descriptors and model selection.

use std::collections::BTreeSet;

use serde::Deserialize;

/// Capability a model must report to be usable for analysis.
pub const GENERATE_CONTENT: &str = "generateContent";

/// A model offered by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Resource id, e.g. `models/gemini-2.5-flash`.
    pub id: String,
    /// Generation methods the model supports.
    pub capabilities: BTreeSet<String>,
}

impl ModelDescriptor {
    pub fn new<I, S>(id: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            capabilities: capabilities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn supports(&self, method: &str) -> bool {
        self.capabilities.contains(method)
    }

    /// Whether the model can be used for content generation.
    pub fn can_generate(&self) -> bool {
        self.supports(GENERATE_CONTENT)
    }
}

/// Pick the model to use for a request.
///
/// The first preferred id that is present and can generate wins, regardless
/// of catalog order. Otherwise the first generating model in catalog order is
/// used. Returns `None` if no model can generate.
pub fn choose_model<'a>(models: &'a [ModelDescriptor], preferred: &[String]) -> Option<&'a str> {
    preferred
        .iter()
        .find_map(|id| models.iter().find(|m| &m.id == id && m.can_generate()))
        .or_else(|| models.iter().find(|m| m.can_generate()))
        .map(|m| m.id.as_str())
}

/// `GET /models` response body.
#[derive(Debug, Deserialize)]
pub(crate) struct ModelListResponse {
    #[serde(default)]
    pub models: Vec<WireModel>,
}

/// A model as the provider reports it.
#[derive(Debug, Deserialize)]
pub(crate) struct WireModel {
    pub name: String,
    #[serde(flatten)]
    pub capabilities: WireCapabilities,
}

/// Capability list. Providers report it under `supportedGenerationMethods`,
/// `supportedMethods`, both, or not at all.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireCapabilities {
    Both {
        #[serde(rename = "supportedGenerationMethods")]
        generation: Vec<String>,
        #[serde(rename = "supportedMethods")]
        methods: Vec<String>,
    },
    GenerationMethods {
        #[serde(rename = "supportedGenerationMethods")]
        generation: Vec<String>,
    },
    Methods {
        #[serde(rename = "supportedMethods")]
        methods: Vec<String>,
    },
    Unreported {},
}

impl From<WireModel> for ModelDescriptor {
    fn from(model: WireModel) -> Self {
        let capabilities: Vec<String> = match model.capabilities {
            WireCapabilities::Both {
                mut generation,
                methods,
            } => {
                generation.extend(methods);
                generation
            }
            WireCapabilities::GenerationMethods { generation } => generation,
            WireCapabilities::Methods { methods } => methods,
            WireCapabilities::Unreported {} => Vec::new(),
        };
        ModelDescriptor::new(model.name, capabilities)
    }
}

impl ModelListResponse {
    pub fn into_descriptors(self) -> Vec<ModelDescriptor> {
        self.models.into_iter().map(Into::into).collect()
    }
}
