//! In-memory backend: compiles a plan into the runtime `TypeModel` that
//! drives a `ConfigObject`.

use crate::{
    classify::{PropertyPlan, ValueShape},
    plan::ImplementationPlan,
};
use std::sync::Arc;
use typedconf_core::model::{
    DispatchTable, ElementShape, PropertyModel, TypeModel, VisitModel, property::literal_value,
};

impl ValueShape {
    #[must_use]
    pub const fn element(&self) -> ElementShape {
        match self {
            Self::Primitive(p) => ElementShape::Primitive(*p),
            Self::Item(_) => ElementShape::Item,
            Self::Opaque(_) | Self::Dynamic => ElementShape::Any,
        }
    }
}

/// Runtime descriptor of one property.
#[must_use]
pub fn property_model(prop: &PropertyPlan) -> PropertyModel {
    let element = prop.shape.element();
    let mut model = PropertyModel::new(&prop.name, prop.slot, prop.kind)
        .element(element)
        .nullable(prop.nullable)
        .indexed(prop.indexed);

    if let Some(key) = &prop.key {
        model = model.key(&key.property);
    }
    if let Some(default) = &prop.default {
        model = model.default_value(literal_value(default, element));
    }

    model
}

/// Compile `plan` on top of the already compiled model of its primary.
#[must_use]
pub fn compile_model(plan: &ImplementationPlan, primary: Arc<TypeModel>) -> TypeModel {
    TypeModel {
        path: plan.path.clone(),
        primary: Some(primary),
        properties: plan.properties.iter().map(property_model).collect(),
        table: DispatchTable::new(plan.dispatch.start, plan.dispatch.routes.clone()),
        visits: plan
            .visits
            .iter()
            .map(|v| VisitModel {
                name: v.method.clone(),
                visitor: v.visitor.to_string(),
                arg: v.arg.to_string(),
                result: v.result.to_string(),
                handler: v.handler.clone(),
            })
            .collect(),
        is_abstract: plan.is_abstract,
        value_equality: plan.value_equality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{PlanOptions, Planner};
    use typedconf_core::{ConfigObject, item::ConfigItem, value::Value};
    use typedconf_schema::{
        node::{Property, Schema, SchemaType},
        types::{Literal, PropertyKind},
    };

    fn compile(schema: &Schema, path: &str) -> Arc<TypeModel> {
        let planner = Planner::new(schema, PlanOptions::default());
        let mut chain = vec![planner.plan(path).expect("plannable")];
        while let Some(primary) = chain.last().and_then(|p| p.primary.clone()) {
            chain.push(planner.plan(&primary).expect("plannable"));
        }

        chain
            .iter()
            .rev()
            .fold(TypeModel::root(), |primary, plan| Arc::new(compile_model(plan, primary)))
    }

    #[test]
    fn declared_defaults_follow_the_element_shape() {
        let schema = Schema::new().with_type(
            SchemaType::new("m", "Limits")
                .property_with(Property::plain("ratio", "Float64").default_value(Literal::Int(2)))
                .property_with(Property::new("ids", PropertyKind::List, "Int32").accessors()),
        );

        let model = compile(&schema, "m.Limits");
        let obj = ConfigObject::new(model).expect("concrete");

        assert_eq!(obj.get("ratio").expect("readable"), Value::Float(2.0));
        assert_eq!(obj.get("ids").expect("readable"), Value::List(Vec::new()));
    }

    #[test]
    fn inherited_slots_resolve_through_the_primary() {
        let schema = Schema::new()
            .with_type(SchemaType::new("m", "Base").property_with(Property::plain("name", "Text")))
            .with_type(
                SchemaType::new("m", "Leaf")
                    .extends("m.Base")
                    .property_with(Property::plain("size", "Int32")),
            );

        let model = compile(&schema, "m.Leaf");
        let (level, _) = model.resolve(0).expect("name is served");
        assert_eq!(level.path, "m.Base");

        let mut obj = ConfigObject::new(model).expect("concrete");
        obj.set("name", "edge".into()).expect("writable");
        obj.set("size", 3.into()).expect("writable");
        assert_eq!(obj.get("name").expect("readable"), Value::Text("edge".into()));
        assert!(obj.get("missing").is_err());
    }
}
