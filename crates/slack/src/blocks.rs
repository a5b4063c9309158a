use brewbot_core::DrinkType;
use serde::Serialize;

pub const ACTION_COFFEE_ORDER: &str = "coffee_order";
pub const ORDER_FORM_SUFFIX: &str = "coffee_order_form";

pub const FIELD_DRINK_TYPE: &str = "drinkType";
pub const FIELD_CUSTOMIZATION: &str = "customization";
pub const FIELD_TIME_TO_DELIVER: &str = "timeToDeliver";

const PROMPT_COLOR: &str = "#3AA3E3";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttachmentAction {
    pub name: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
}

impl AttachmentAction {
    pub fn button(
        name: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), text: label.into(), kind: "button", value: value.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<AttachmentAction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<AttachmentField>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

/// Synchronous callback response that swaps the clicked message in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplacementMessage {
    pub replace_original: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    #[serde(flatten)]
    pub message: MessageTemplate,
}

pub struct MessageBuilder {
    text: String,
    attachments: Vec<Attachment>,
}

impl MessageBuilder {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), attachments: Vec::new() }
    }

    pub fn attachment<F>(mut self, build: F) -> Self
    where
        F: FnOnce(&mut AttachmentBuilder),
    {
        let mut builder = AttachmentBuilder::default();
        build(&mut builder);
        self.attachments.push(builder.attachment);
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { text: self.text, attachments: self.attachments }
    }
}

#[derive(Default)]
pub struct AttachmentBuilder {
    attachment: Attachment,
}

impl AttachmentBuilder {
    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        self.attachment.text = text.into();
        self
    }

    pub fn color(&mut self, color: impl Into<String>) -> &mut Self {
        self.attachment.color = Some(color.into());
        self
    }

    pub fn callback_id(&mut self, callback_id: impl Into<String>) -> &mut Self {
        self.attachment.callback_id = Some(callback_id.into());
        self
    }

    pub fn button(&mut self, action: AttachmentAction) -> &mut Self {
        self.attachment.actions.push(action);
        self
    }

    pub fn field(&mut self, title: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.attachment.fields.push(AttachmentField {
            title: title.into(),
            value: value.into(),
            short: true,
        });
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogElement {
    Select {
        label: String,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        options: Vec<SelectOption>,
    },
    Textarea {
        label: String,
        name: String,
        optional: bool,
    },
    Text {
        label: String,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        optional: bool,
    },
}

impl DialogElement {
    pub fn name(&self) -> &str {
        match self {
            Self::Select { name, .. } | Self::Textarea { name, .. } | Self::Text { name, .. } => {
                name
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Dialog {
    pub title: String,
    pub submit_label: String,
    pub callback_id: String,
    pub elements: Vec<DialogElement>,
}

pub struct DialogBuilder {
    dialog: Dialog,
}

impl DialogBuilder {
    pub fn new(title: impl Into<String>, callback_id: impl Into<String>) -> Self {
        Self {
            dialog: Dialog {
                title: title.into(),
                submit_label: "Submit".to_owned(),
                callback_id: callback_id.into(),
                elements: Vec::new(),
            },
        }
    }

    pub fn submit_label(mut self, label: impl Into<String>) -> Self {
        self.dialog.submit_label = label.into();
        self
    }

    pub fn select(
        mut self,
        name: impl Into<String>,
        label: impl Into<String>,
        placeholder: impl Into<String>,
        options: impl IntoIterator<Item = SelectOption>,
    ) -> Self {
        self.dialog.elements.push(DialogElement::Select {
            label: label.into(),
            name: name.into(),
            placeholder: Some(placeholder.into()),
            options: options.into_iter().collect(),
        });
        self
    }

    pub fn textarea(mut self, name: impl Into<String>, label: impl Into<String>) -> Self {
        self.dialog.elements.push(DialogElement::Textarea {
            label: label.into(),
            name: name.into(),
            optional: true,
        });
        self
    }

    pub fn text(
        mut self,
        name: impl Into<String>,
        label: impl Into<String>,
        placeholder: impl Into<String>,
    ) -> Self {
        self.dialog.elements.push(DialogElement::Text {
            label: label.into(),
            name: name.into(),
            placeholder: Some(placeholder.into()),
            optional: false,
        });
        self
    }

    pub fn build(self) -> Dialog {
        self.dialog
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DialogValidationError {
    pub name: String,
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DialogValidationErrors {
    pub errors: Vec<DialogValidationError>,
}

impl DialogValidationErrors {
    pub fn single(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self { errors: vec![DialogValidationError { name: name.into(), error: error.into() }] }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderSummary {
    pub drink: String,
    pub deliver_at: String,
    pub customization: Option<String>,
}

pub fn order_prompt_message(bot_id: &str) -> MessageTemplate {
    MessageBuilder::new("Order coffee")
        .attachment(|attachment| {
            attachment
                .text(
                    "I am Coffeebot :robot_face:, and I'm here to help bring you fresh coffee :coffee:",
                )
                .color(PROMPT_COLOR)
                .callback_id(format!("{bot_id}{ORDER_FORM_SUFFIX}"))
                .button(AttachmentAction::button(
                    ACTION_COFFEE_ORDER,
                    ":coffee: Order Coffee",
                    ACTION_COFFEE_ORDER,
                ));
        })
        .build()
}

/// Replaces the prompt with a button-less acknowledgement so it cannot be clicked again.
pub fn taking_order_message(message_ts: &str) -> ReplacementMessage {
    ReplacementMessage {
        replace_original: true,
        ts: (!message_ts.is_empty()).then(|| message_ts.to_owned()),
        message: MessageTemplate {
            text: ":pencil: Taking your order...".to_owned(),
            attachments: Vec::new(),
        },
    }
}

pub fn order_confirmation_message(bot_id: &str, summary: &OrderSummary) -> MessageTemplate {
    MessageBuilder::new(format!("Order received: {} at {}", summary.drink, summary.deliver_at))
        .attachment(|attachment| {
            attachment
                .text(":white_check_mark: Order received!")
                .callback_id(format!("{bot_id}{ORDER_FORM_SUFFIX}"))
                .field("Drink", summary.drink.clone())
                .field("Deliver at", summary.deliver_at.clone());
            if let Some(customization) = &summary.customization {
                attachment.field("Customization", customization.clone());
            }
        })
        .build()
}

pub fn order_dialog(user_id: &str) -> Dialog {
    let options = DrinkType::ALL
        .into_iter()
        .map(|drink| SelectOption {
            label: drink.label().to_owned(),
            value: drink.value().to_owned(),
        });

    DialogBuilder::new("Request a coffee", format!("{user_id}{ORDER_FORM_SUFFIX}"))
        .submit_label("Submit")
        .select(FIELD_DRINK_TYPE, "Coffee Type", "Select a drink", options)
        .textarea(FIELD_CUSTOMIZATION, "Customization orders")
        .text(FIELD_TIME_TO_DELIVER, "Time to deliver", "hh:mm")
        .build()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        order_confirmation_message, order_dialog, order_prompt_message, taking_order_message,
        DialogElement, DialogValidationErrors, OrderSummary, ACTION_COFFEE_ORDER,
    };

    #[test]
    fn prompt_carries_a_single_order_button() {
        let message = order_prompt_message("UBOT");

        assert_eq!(message.attachments.len(), 1);
        let attachment = &message.attachments[0];
        assert_eq!(attachment.callback_id.as_deref(), Some("UBOTcoffee_order_form"));
        assert_eq!(attachment.actions.len(), 1);
        assert_eq!(attachment.actions[0].value, ACTION_COFFEE_ORDER);
        assert!(attachment.actions[0].text.contains("Order Coffee"));

        let value = serde_json::to_value(&message).expect("serialize prompt");
        assert_eq!(value["attachments"][0]["actions"][0]["type"], "button");
        assert!(value["attachments"][0].get("fields").is_none());
    }

    #[test]
    fn acknowledgement_replaces_original_without_buttons() {
        let value = serde_json::to_value(taking_order_message("1730000000.0001"))
            .expect("serialize replacement");

        assert_eq!(
            value,
            json!({
                "replace_original": true,
                "ts": "1730000000.0001",
                "text": ":pencil: Taking your order...",
                "attachments": [],
            })
        );
    }

    #[test]
    fn dialog_lists_menu_and_required_time_field() {
        let dialog = order_dialog("U42");

        assert_eq!(dialog.title, "Request a coffee");
        assert_eq!(dialog.callback_id, "U42coffee_order_form");
        let names: Vec<&str> = dialog.elements.iter().map(DialogElement::name).collect();
        assert_eq!(names, vec!["drinkType", "customization", "timeToDeliver"]);

        let value = serde_json::to_value(&dialog).expect("serialize dialog");
        let labels: Vec<&str> = value["elements"][0]["options"]
            .as_array()
            .expect("options array")
            .iter()
            .filter_map(|option| option["label"].as_str())
            .collect();
        assert_eq!(labels, vec!["Cappuccino", "Latte", "Pour Over", "Cold Brew"]);
        assert_eq!(value["elements"][0]["type"], "select");
        assert_eq!(value["elements"][1]["type"], "textarea");
        assert_eq!(value["elements"][1]["optional"], true);
        assert_eq!(value["elements"][2]["type"], "text");
        assert_eq!(value["elements"][2]["placeholder"], "hh:mm");
        assert_eq!(value["elements"][2]["optional"], false);
    }

    #[test]
    fn confirmation_echoes_order_details() {
        let message = order_confirmation_message(
            "UBOT",
            &OrderSummary {
                drink: "Latte".to_owned(),
                deliver_at: "10:30".to_owned(),
                customization: Some("oat milk".to_owned()),
            },
        );

        assert!(message.attachments[0].text.contains("Order received"));
        assert_eq!(message.attachments[0].fields.len(), 3);
        assert!(message.text.contains("Latte"));
    }

    #[test]
    fn validation_errors_serialize_as_slack_expects() {
        let value = serde_json::to_value(DialogValidationErrors::single("timeToDeliver", "nope"))
            .expect("serialize errors");
        assert_eq!(value, json!({ "errors": [{ "name": "timeToDeliver", "error": "nope" }] }));
    }
}
