use std::collections::BTreeSet;

use serde_json::Value;

use crate::core::models::audit_record::AuditAction;
use crate::core::models::change_set::{Attributes, Change, ChangeSet};
use crate::core::models::schema::EntitySchema;

/// Attributes that never reach the log unless the configuration says
/// otherwise: bookkeeping timestamps, lock counters, ids and credentials.
pub const DEFAULT_EXCLUDED: &[&str] =
    &["created_at", "updated_at", "lock_version", "id", "password"];

/// Computes the attribute-level diff for one lifecycle event.
pub struct ChangeSetService {
    excluded: BTreeSet<String>,
}

impl Default for ChangeSetService {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED.iter().map(|s| s.to_string()))
    }
}

impl ChangeSetService {
    pub fn new(excluded: impl IntoIterator<Item = String>) -> Self {
        Self {
            excluded: excluded.into_iter().collect(),
        }
    }

    pub fn is_excluded(&self, schema: &EntitySchema, attribute: &str) -> bool {
        self.excluded.contains(attribute) || schema.excluded.contains(attribute)
    }

    /// Diff `before` against `after` for `action`.
    ///
    /// - `Create`: every non-default attribute of `after`, as `(absent, new)`
    /// - `Update`: attributes whose cast values differ, as `(old, new)`
    /// - `Destroy`: the full final state, as `(old, absent)`. The final state
    ///   is `before`, or `after` when the host only passed that side.
    ///
    /// Values are stored in their cast form. Excluded attributes are dropped.
    pub fn compute(
        &self,
        schema: &EntitySchema,
        action: AuditAction,
        before: &Attributes,
        after: &Attributes,
    ) -> ChangeSet {
        match action {
            AuditAction::Create => after
                .iter()
                .filter(|(k, v)| !self.is_excluded(schema, k) && !schema.is_default(k, v))
                .map(|(k, v)| (k.clone(), Change::new(None, present(schema.normalize(k, v)))))
                .collect(),
            AuditAction::Update => {
                let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
                keys.into_iter()
                    .filter(|k| !self.is_excluded(schema, k))
                    .filter_map(|k| {
                        let old = schema.normalize(k, before.get(k).unwrap_or(&Value::Null));
                        let new = schema.normalize(k, after.get(k).unwrap_or(&Value::Null));
                        (old != new).then(|| (k.clone(), Change::new(present(old), present(new))))
                    })
                    .collect()
            }
            AuditAction::Destroy => {
                let last_state = if before.is_empty() { after } else { before };
                last_state
                    .iter()
                    .filter(|(k, _)| !self.is_excluded(schema, k))
                    .map(|(k, v)| (k.clone(), Change::new(present(schema.normalize(k, v)), None)))
                    .collect()
            }
        }
    }
}

fn present(value: Value) -> Option<Value> {
    (!value.is_null()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::schema::AttributeType;
    use serde_json::json;

    fn user_schema() -> EntitySchema {
        EntitySchema::new("User")
            .with_attribute("name", AttributeType::Text)
            .with_attribute("username", AttributeType::Text)
            .with_attribute("logins", AttributeType::Integer)
            .with_attribute("activated", AttributeType::Boolean)
    }

    fn attrs(pairs: &[(&str, Value)]) -> Attributes {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn create_keeps_non_default_values() {
        let svc = ChangeSetService::default();
        let after = attrs(&[
            ("name", json!("Brandon")),
            ("username", json!("brandon")),
            ("logins", json!(0)),
            ("activated", json!(false)),
        ]);
        let cs = svc.compute(&user_schema(), AuditAction::Create, &Attributes::new(), &after);

        assert_eq!(cs.len(), 2);
        assert_eq!(cs.get("name"), Some(&Change::new(None, Some(json!("Brandon")))));
        assert!(cs.get("logins").is_none());
    }

    #[test]
    fn excluded_columns_never_recorded() {
        let svc = ChangeSetService::default();
        let after = attrs(&[
            ("name", json!("Brandon")),
            ("password", json!("hunter2")),
            ("created_at", json!("2026-01-01T00:00:00Z")),
            ("updated_at", json!("2026-01-01T00:00:00Z")),
            ("lock_version", json!(3)),
            ("id", json!(1)),
        ]);
        let cs = svc.compute(&user_schema(), AuditAction::Create, &Attributes::new(), &after);

        assert_eq!(cs.attribute_names().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn per_type_exclusions_apply() {
        let svc = ChangeSetService::default();
        let schema = user_schema().with_excluded("username");
        let after = attrs(&[("name", json!("B")), ("username", json!("b"))]);
        let cs = svc.compute(&schema, AuditAction::Create, &Attributes::new(), &after);

        assert!(cs.get("username").is_none());
    }

    #[test]
    fn update_records_only_changed_attributes() {
        let svc = ChangeSetService::default();
        let before = attrs(&[("name", json!("Brandon")), ("username", json!("brandon"))]);
        let after = attrs(&[("name", json!("Changed")), ("username", json!("brandon"))]);
        let cs = svc.compute(&user_schema(), AuditAction::Update, &before, &after);

        assert_eq!(cs.len(), 1);
        assert_eq!(
            cs.get("name"),
            Some(&Change::new(Some(json!("Brandon")), Some(json!("Changed"))))
        );
    }

    #[test]
    fn update_ignores_representation_only_changes() {
        let svc = ChangeSetService::default();
        let before = attrs(&[("logins", json!(0)), ("activated", json!(true))]);

        for after in [
            attrs(&[("logins", json!("0")), ("activated", json!(true))]),
            attrs(&[("logins", json!(0)), ("activated", json!(1))]),
            attrs(&[("logins", json!(0)), ("activated", json!("1"))]),
        ] {
            let cs = svc.compute(&user_schema(), AuditAction::Update, &before, &after);
            assert!(cs.is_empty(), "{after:?}");
        }
    }

    #[test]
    fn update_tracks_attributes_that_appear_or_vanish() {
        let svc = ChangeSetService::default();
        let before = attrs(&[("nickname", json!("b"))]);
        let after = attrs(&[("email", json!("b@example.com"))]);
        let cs = svc.compute(&EntitySchema::new("User"), AuditAction::Update, &before, &after);

        assert_eq!(cs.get("nickname"), Some(&Change::new(Some(json!("b")), None)));
        assert_eq!(cs.get("email"), Some(&Change::new(None, Some(json!("b@example.com")))));
    }

    #[test]
    fn destroy_captures_final_state() {
        let svc = ChangeSetService::default();
        let before = attrs(&[("name", json!("Brandon")), ("password", json!("x"))]);
        let cs = svc.compute(&user_schema(), AuditAction::Destroy, &before, &Attributes::new());

        assert_eq!(cs.len(), 1);
        assert_eq!(cs.get("name"), Some(&Change::new(Some(json!("Brandon")), None)));
    }

    #[test]
    fn destroy_falls_back_to_after_side() {
        let svc = ChangeSetService::default();
        let after = attrs(&[("name", json!("Brandon"))]);
        let cs = svc.compute(&user_schema(), AuditAction::Destroy, &Attributes::new(), &after);

        assert_eq!(cs.old_attributes()["name"], json!("Brandon"));
    }
}
