use serde::{Deserialize, Serialize};

/// One top-level entry of a server's tool panel, without its tools.
///
/// The tag matches the `model_class` Galaxy reports for panel entries.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "model_class")]
pub enum PanelSkeletonItem {
    ToolSectionLabel { id: String, text: String },
    ToolSection { id: String, name: String },
}

impl PanelSkeletonItem {
    pub fn id(&self) -> &str {
        match self {
            PanelSkeletonItem::ToolSectionLabel { id, .. } => id,
            PanelSkeletonItem::ToolSection { id, .. } => id,
        }
    }
}

/// Ordered panel layout for a server.
pub type PanelSkeleton = Vec<PanelSkeletonItem>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_by_model_class() {
        let items = vec![
            PanelSkeletonItem::ToolSectionLabel {
                id: "get_data_label".into(),
                text: "Get Data".into(),
            },
            PanelSkeletonItem::ToolSection {
                id: "getext".into(),
                name: "Upload".into(),
            },
        ];
        let json = serde_json::to_value(&items).unwrap();
        assert_eq!(json[0]["model_class"], "ToolSectionLabel");
        assert_eq!(json[1]["model_class"], "ToolSection");
        assert_eq!(json[1]["name"], "Upload");

        let back: PanelSkeleton = serde_json::from_value(json).unwrap();
        assert_eq!(back, items);
        assert_eq!(back[0].id(), "get_data_label");
    }
}
