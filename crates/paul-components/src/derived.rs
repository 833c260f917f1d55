//! Components built on top of another component.

use std::sync::Arc;

use serde_json::Value;

use crate::{Component, ComponentError, Props, merge_props};

/// A variant of an existing component.
///
/// `defaults` replace the base defaults but callers may still override
/// them. `fixed` props are applied after the caller's props and always win,
/// which is how a themed variant pins its colours.
pub struct DerivedComponent {
    base: Arc<dyn Component>,
    defaults: Value,
    fixed: Props,
}

impl DerivedComponent {
    #[must_use]
    pub fn new(base: Arc<dyn Component>, defaults: Props, fixed: Props) -> Self {
        let mut merged = merge_props(base.default_props(), Some(&defaults));
        merged.extend(fixed.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            base,
            defaults: Value::Object(merged),
            fixed,
        }
    }

    fn pin(&self, props: &Props) -> Props {
        merge_props(&Value::Object(props.clone()), Some(&self.fixed))
    }
}

impl Component for DerivedComponent {
    fn default_props(&self) -> &Value {
        &self.defaults
    }

    fn render(&self, props: &Props) -> Result<String, ComponentError> {
        self.base.render(&self.pin(props))
    }

    fn styles(&self, props: &Props) -> Result<Option<String>, ComponentError> {
        self.base.styles(&self.pin(props))
    }

    fn alt_render(&self, props: &Props) -> Option<Result<String, ComponentError>> {
        self.base.alt_render(&self.pin(props))
    }
}
