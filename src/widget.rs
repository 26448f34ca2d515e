//! Payloads for Geckoboard number widgets.

use serde::Serialize;

pub const POUND_PREFIX: &str = "£";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetItem {
    pub value: f64,
    pub text: Option<String>,
    pub prefix: Option<String>,
    #[serde(rename = "type")]
    pub value_type: Option<String>,
}

impl WidgetItem {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            text: None,
            prefix: None,
            value_type: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetContent {
    pub item: Vec<WidgetItem>,
}

/// The first item is the headline metric, the second (if any) the value it
/// is compared against.
pub fn widget_content(items: Vec<WidgetItem>) -> WidgetContent {
    WidgetContent { item: items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_item_serializes_nulls() {
        let value = serde_json::to_value(WidgetItem::new(1.5)).unwrap();
        assert_eq!(
            value,
            json!({"value": 1.5, "text": null, "prefix": null, "type": null})
        );
    }

    #[test]
    fn builder_sets_optional_fields() {
        let item = WidgetItem::new(100.0)
            .with_text("Resources invested this week")
            .with_prefix(POUND_PREFIX)
            .with_type("reverse");
        let value = serde_json::to_value(item).unwrap();
        assert_eq!(value["prefix"], "£");
        assert_eq!(value["text"], "Resources invested this week");
        assert_eq!(value["type"], "reverse");
    }

    #[test]
    fn content_keeps_caller_order() {
        let content = widget_content(vec![WidgetItem::new(2.0), WidgetItem::new(1.0)]);
        let value = serde_json::to_value(content).unwrap();
        assert_eq!(value["item"][0]["value"].as_f64(), Some(2.0));
        assert_eq!(value["item"][1]["value"].as_f64(), Some(1.0));
    }
}
