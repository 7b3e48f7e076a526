//! JSON wire form of actions.
//!
//! ```json
//! {"type": "GEN@linodes.configs/ONE", "ids": ["42", 1], "resource": {"id": 1}}
//! {"type": "GEN@linodes/MANY", "page": {"linodes": [..], "pages": 2, "results": 40}}
//! {"type": "GEN@linodes/INVALIDATE", "ids": [5], "partial": true}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::id::coerce_values;
use super::types::{Action, ActionType, ActionTypeError, Operation, Page};
use crate::schema::OpKind;
use crate::state::Fields;
use crate::store::Dispatchable;

/// Errors from decoding wire actions.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Invalid action JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Type(#[from] ActionTypeError),

    #[error("Action '{ty}' is missing its '{field}' payload")]
    MissingPayload { ty: String, field: &'static str },

    #[error("Action '{ty}' page has no '{key}' list of objects")]
    InvalidPage { ty: String, key: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAction {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub ids: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Fields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<Fields>,
    #[serde(default)]
    pub partial: bool,
}

impl WireAction {
    pub fn parse(json: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode into an [`Action`] without a dispatcher.
    pub fn into_action(self) -> Result<Action, WireError> {
        let ty: ActionType = self.ty.parse()?;
        let ids = coerce_values(&self.ids);
        let op = match ty.op {
            OpKind::One => Operation::One {
                resource: self.resource.ok_or(WireError::MissingPayload {
                    ty: self.ty.clone(),
                    field: "resource",
                })?,
            },
            OpKind::Many => {
                let page = self.page.as_ref().ok_or(WireError::MissingPayload {
                    ty: self.ty.clone(),
                    field: "page",
                })?;
                // The list lives under the resource's plural name, which is
                // the last path segment.
                let key = ty.path.last().unwrap_or_default().to_string();
                Operation::Many {
                    page: decode_page(&self.ty, &key, page)?,
                }
            }
            OpKind::Delete => Operation::Delete,
            OpKind::Invalidate => Operation::Invalidate {
                partial: self.partial,
            },
        };
        Ok(Action::new(ty.path, op, ids))
    }

    /// Decode the way the action creators build it: ONE and MANY become
    /// thunks that attach the dispatcher, the rest stay plain.
    pub fn into_dispatchable(self) -> Result<Dispatchable, WireError> {
        let action = self.into_action()?;
        Ok(match action.kind() {
            OpKind::One | OpKind::Many => Dispatchable::deferred(action),
            OpKind::Delete | OpKind::Invalidate => Dispatchable::Action(action),
        })
    }
}

impl From<&Action> for WireAction {
    fn from(action: &Action) -> Self {
        let ids = action
            .ids
            .iter()
            .map(|id| serde_json::to_value(id).unwrap_or(Value::Null))
            .collect();
        let mut wire = WireAction {
            ty: action.action_type().to_string(),
            ids,
            resource: None,
            page: None,
            partial: false,
        };
        match &action.op {
            Operation::One { resource } => wire.resource = Some(resource.clone()),
            Operation::Many { page } => {
                let key = action.path.last().unwrap_or_default().to_string();
                let mut fields = Fields::new();
                fields.insert(
                    key,
                    Value::Array(page.items.iter().cloned().map(Value::Object).collect()),
                );
                fields.insert("pages".to_string(), Value::from(page.pages));
                fields.insert("results".to_string(), Value::from(page.results));
                wire.page = Some(fields);
            }
            Operation::Delete => {}
            Operation::Invalidate { partial } => wire.partial = *partial,
        }
        wire
    }
}

fn decode_page(ty: &str, key: &str, page: &Fields) -> Result<Page, WireError> {
    let invalid = || WireError::InvalidPage {
        ty: ty.to_string(),
        key: key.to_string(),
    };
    let items = page
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(invalid)?
        .iter()
        .map(|item| item.as_object().cloned().ok_or_else(invalid))
        .collect::<Result<Vec<_>, _>>()?;
    let total = |field: &'static str| {
        page.get(field)
            .and_then(Value::as_i64)
            .ok_or(WireError::MissingPayload {
                ty: ty.to_string(),
                field,
            })
    };
    Ok(Page::new(items, total("pages")?, total("results")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Id;
    use crate::schema::ResourcePath;

    #[test]
    fn decodes_one_with_coerced_ids() {
        let wire = WireAction::parse(
            r#"{"type": "GEN@linodes.configs/ONE", "ids": ["42", 1], "resource": {"id": 1}}"#,
        )
        .unwrap();
        let action = wire.into_action().unwrap();
        assert_eq!(action.path, ResourcePath::parse("linodes.configs"));
        assert_eq!(action.ids, vec![Id::Num(42), Id::Num(1)]);
        assert!(matches!(action.op, Operation::One { .. }));
    }

    #[test]
    fn decodes_many_page_under_plural_key() {
        let wire = WireAction::parse(
            r#"{"type": "GEN@nodebalancers/MANY",
                "page": {"nodebalancers": [{"id": 1}, {"id": 2}], "pages": 1, "results": 2}}"#,
        )
        .unwrap();
        match wire.into_action().unwrap().op {
            Operation::Many { page } => {
                assert_eq!(page.items.len(), 2);
                assert_eq!(page.pages, 1);
                assert_eq!(page.results, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn many_without_list_is_rejected() {
        let wire = WireAction::parse(
            r#"{"type": "GEN@linodes/MANY", "page": {"data": [], "pages": 1, "results": 0}}"#,
        )
        .unwrap();
        assert!(matches!(
            wire.into_action(),
            Err(WireError::InvalidPage { .. })
        ));
    }

    #[test]
    fn one_without_resource_is_rejected() {
        let wire = WireAction::parse(r#"{"type": "GEN@linodes/ONE", "ids": [1]}"#).unwrap();
        assert!(matches!(
            wire.into_action(),
            Err(WireError::MissingPayload { field: "resource", .. })
        ));
    }

    #[test]
    fn bad_type_is_rejected() {
        let wire = WireAction::parse(r#"{"type": "linodes/ONE"}"#).unwrap();
        assert!(matches!(wire.into_action(), Err(WireError::Type(_))));
    }

    #[test]
    fn encodes_back_to_same_type() {
        let wire = WireAction::parse(r#"{"type": "GEN@linodes/INVALIDATE", "ids": ["5"], "partial": true}"#)
            .unwrap();
        let action = wire.clone().into_action().unwrap();
        let encoded = WireAction::from(&action);
        assert_eq!(encoded.ty, wire.ty);
        assert_eq!(encoded.ids, vec![serde_json::json!(5)]);
        assert!(encoded.partial);
    }

    #[test]
    fn one_and_many_decode_to_thunks() {
        let one = WireAction::parse(r#"{"type": "GEN@linodes/ONE", "resource": {"id": 1}}"#).unwrap();
        assert!(one.into_dispatchable().unwrap().is_thunk());
        let delete = WireAction::parse(r#"{"type": "GEN@linodes/DELETE", "ids": [1]}"#).unwrap();
        assert!(!delete.into_dispatchable().unwrap().is_thunk());
    }
}
