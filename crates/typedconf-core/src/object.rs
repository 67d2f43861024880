use crate::{
    PropertyKind,
    collection::{ItemList, ItemMap},
    error::AccessError,
    item::{ConfigItem, ItemState, structural_eq},
    model::{PropertyModel, Route, TypeModel},
    slot::Slot,
    value::Value,
    visitor::Visitor,
};
use std::{any::Any, sync::Arc};

///
/// Cell
///

#[derive(Clone, Debug)]
enum Cell {
    Single(Slot<Value>),
    List(ItemList<Value>),
    Map(ItemMap<Value, Value>),
}

impl Cell {
    fn for_property(prop: &PropertyModel) -> Self {
        match prop.kind {
            PropertyKind::List => Self::List(ItemList::new()),
            PropertyKind::Map => Self::Map(ItemMap::new()),
            _ => Self::Single(Slot::new(Value::Null)),
        }
    }

    fn load(&self) -> Value {
        match self {
            Self::Single(slot) => slot.get().clone(),
            Self::List(list) => Value::List(list.to_vec()),
            Self::Map(map) => Value::Map(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        }
    }

    fn store(&mut self, value: Value, is_set: bool) -> Value {
        match self {
            Self::Single(slot) => slot.update(value, is_set),
            Self::List(list) => {
                let old = Value::List(list.to_vec());
                list.replace(into_items(value), is_set);
                old
            }
            Self::Map(map) => {
                let old = Value::Map(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
                map.replace(into_entries(value), is_set);
                old
            }
        }
    }

    // Containers are refilled in place, keeping their identity.
    fn clear(&mut self, initial: Value) {
        match self {
            Self::Single(slot) => slot.reset(initial),
            Self::List(list) => list.replace(into_items(initial), false),
            Self::Map(map) => map.replace(into_entries(initial), false),
        }
    }

    const fn flag(&self) -> bool {
        match self {
            Self::Single(slot) => slot.is_set(),
            Self::List(list) => list.is_modified(),
            Self::Map(map) => map.is_modified(),
        }
    }
}

fn into_items(value: Value) -> Vec<Value> {
    match value {
        Value::List(items) => items,
        _ => Vec::new(),
    }
}

fn into_entries(value: Value) -> Vec<(Value, Value)> {
    match value {
        Value::Map(entries) => entries,
        _ => Vec::new(),
    }
}

///
/// ConfigObject
///
/// In-memory configuration instance driven by a [`TypeModel`]. Storage is
/// one cell per slot across the whole implementation chain; every index is
/// routed through the model's dispatch tables before a cell is touched.
///

#[derive(Debug)]
pub struct ConfigObject {
    model: Arc<TypeModel>,
    cells: Vec<Cell>,
    state: ItemState,
}

impl ConfigObject {
    /// A fresh instance with every property in its initial state.
    pub fn new(model: Arc<TypeModel>) -> Result<Self, AccessError> {
        if model.is_abstract {
            return Err(AccessError::AbstractType {
                type_path: model.path.clone(),
            });
        }

        let cells = model.properties.iter().map(Cell::for_property).collect();
        let mut object = Self {
            model,
            cells,
            state: ItemState::default(),
        };
        object.init()?;

        Ok(object)
    }

    /// Copy of every property value and is-set state; listeners and the
    /// frozen flag are not carried over.
    #[must_use]
    pub fn copy_of(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            cells: self.cells.clone(),
            state: ItemState::default(),
        }
    }

    #[must_use]
    pub const fn model(&self) -> &Arc<TypeModel> {
        &self.model
    }

    /// Which implementation level serves `index`, and how.
    pub fn route_of(&self, index: usize) -> Result<(&str, Route), AccessError> {
        self.model
            .resolve(index)
            .map(|(owner, route)| (owner.path.as_str(), route))
            .ok_or_else(|| AccessError::missing_property(&self.model.path, index))
    }

    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.state.is_frozen()
    }

    /// Live list container of a list property.
    pub fn list(&self, property: &str) -> Result<&ItemList<Value>, AccessError> {
        match self.named_cell(property)? {
            Cell::List(list) => Ok(list),
            _ => Err(self.container_mismatch(property, "list")),
        }
    }

    pub fn list_mut(&mut self, property: &str) -> Result<&mut ItemList<Value>, AccessError> {
        self.check_set()?;
        let index = self.slot_of(property)?;
        let mismatch = self.container_mismatch(property, "list");
        match self.cell_mut(index)? {
            Cell::List(list) => Ok(list),
            _ => Err(mismatch),
        }
    }

    /// Live map container of a map property.
    pub fn map(&self, property: &str) -> Result<&ItemMap<Value, Value>, AccessError> {
        match self.named_cell(property)? {
            Cell::Map(map) => Ok(map),
            _ => Err(self.container_mismatch(property, "map")),
        }
    }

    pub fn map_mut(&mut self, property: &str) -> Result<&mut ItemMap<Value, Value>, AccessError> {
        self.check_set()?;
        let index = self.slot_of(property)?;
        let mismatch = self.container_mismatch(property, "map");
        match self.cell_mut(index)? {
            Cell::Map(map) => Ok(map),
            _ => Err(mismatch),
        }
    }

    /// Dispatch a visit operation to the handler chosen for this type.
    pub fn accept(
        &self,
        visit: &str,
        visitor: &mut dyn Visitor,
        arg: Value,
    ) -> Result<Value, AccessError> {
        let handler = self
            .model
            .visit(visit)
            .and_then(|v| v.handler.as_deref())
            .ok_or_else(|| AccessError::unimplemented_visit(visit, &self.model.path))?;

        visitor.visit(handler, self, arg)
    }

    //
    // cell routing
    //

    fn cell(&self, index: usize) -> Result<&Cell, AccessError> {
        self.route_of(index)?;
        self.cells
            .get(index)
            .ok_or_else(|| AccessError::missing_property(&self.model.path, index))
    }

    fn cell_mut(&mut self, index: usize) -> Result<&mut Cell, AccessError> {
        self.route_of(index)?;
        let path = &self.model.path;
        self.cells
            .get_mut(index)
            .ok_or_else(|| AccessError::missing_property(path, index))
    }

    fn named_cell(&self, property: &str) -> Result<&Cell, AccessError> {
        self.cell(self.slot_of(property)?)
    }

    fn container_mismatch(&self, property: &str, expected: &str) -> AccessError {
        AccessError::TypeMismatch {
            type_path: self.model.path.clone(),
            property: property.to_string(),
            expected: expected.to_string(),
            found: "single value".to_string(),
        }
    }
}

impl Clone for ConfigObject {
    fn clone(&self) -> Self {
        self.copy_of()
    }
}

impl PartialEq for ConfigObject {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }

        self.model.value_equality && other.model.value_equality && structural_eq(self, other)
    }
}

impl ConfigItem for ConfigObject {
    fn type_path(&self) -> &str {
        &self.model.path
    }

    fn properties(&self) -> &[PropertyModel] {
        &self.model.properties
    }

    fn state(&self) -> &ItemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ItemState {
        &mut self.state
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value_equality(&self) -> bool {
        self.model.value_equality
    }

    fn load(&self, index: usize) -> Result<Value, AccessError> {
        self.cell(index).map(Cell::load)
    }

    fn store(&mut self, index: usize, value: Value, is_set: bool) -> Result<Value, AccessError> {
        self.cell_mut(index).map(|cell| cell.store(value, is_set))
    }

    fn clear(&mut self, index: usize, initial: Value) -> Result<(), AccessError> {
        self.cell_mut(index).map(|cell| cell.clear(initial))
    }

    fn flag(&self, index: usize) -> Result<bool, AccessError> {
        self.cell(index).map(Cell::flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Primitive,
        model::{DispatchTable, ElementShape, VisitModel},
        value::ItemRef,
    };
    use std::sync::Mutex;

    // demo.Server { host: Text = "localhost", port: Nat16, tags: List<Text>, env: Map<Text, Text> }
    fn server_model() -> Arc<TypeModel> {
        let text = ElementShape::Primitive(Primitive::Text);
        Arc::new(TypeModel {
            path: "demo.Server".into(),
            primary: Some(TypeModel::root()),
            properties: vec![
                PropertyModel::new("host", 0, PropertyKind::Plain)
                    .element(text)
                    .default_value("localhost".into()),
                PropertyModel::new("port", 1, PropertyKind::Plain)
                    .element(ElementShape::Primitive(Primitive::Nat16)),
                PropertyModel::new("tags", 2, PropertyKind::List)
                    .element(text)
                    .indexed(true),
                PropertyModel::new("env", 3, PropertyKind::Map)
                    .element(text)
                    .key("name"),
            ],
            table: DispatchTable::new(0, vec![Route::Declared; 4]),
            visits: vec![VisitModel {
                name: "describe".into(),
                visitor: "demo.Describer".into(),
                arg: "Text".into(),
                result: "Text".into(),
                handler: Some("describe_server".into()),
            }],
            is_abstract: false,
            value_equality: true,
        })
    }

    fn server() -> ConfigObject {
        ConfigObject::new(server_model()).expect("concrete model")
    }

    #[test]
    fn fresh_instance_holds_defaults_and_nothing_is_set() {
        let obj = server();

        assert_eq!(obj.get("host"), Ok(Value::Text("localhost".into())));
        assert_eq!(obj.get("port"), Ok(Value::Int(0)));
        assert_eq!(obj.get("tags"), Ok(Value::List(Vec::new())));
        for index in 0..4 {
            assert_eq!(obj.is_set(index), Ok(false), "slot {index} starts unset");
        }
    }

    #[test]
    fn null_write_to_non_nullable_scalar_stores_the_default() {
        let mut obj = server();

        obj.set("host", "example.org".into()).expect("set host");
        obj.set("host", Value::Null).expect("null host");

        assert_eq!(obj.get("host"), Ok(Value::Text("localhost".into())));
        assert_eq!(obj.is_property_set("host"), Ok(true));
    }

    #[test]
    fn reset_keeps_container_identity() {
        let mut obj = server();
        obj.list_mut("tags").expect("tags").push("a".into());
        let before: *const ItemList<Value> = obj.list("tags").expect("tags");
        assert_eq!(obj.is_property_set("tags"), Ok(true));

        obj.reset_property("tags").expect("reset tags");

        let after: *const ItemList<Value> = obj.list("tags").expect("tags");
        assert!(std::ptr::eq(before, after), "same container after reset");
        assert_eq!(obj.get("tags"), Ok(Value::List(Vec::new())));
        assert_eq!(obj.is_property_set("tags"), Ok(false));
    }

    #[test]
    fn indexed_access_pads_with_the_sentinel() {
        let mut obj = server();
        obj.set_indexed("tags", 2, "c".into()).expect("indexed write");

        assert_eq!(obj.get_indexed("tags", 0), Ok(Value::Text(String::new())));
        assert_eq!(obj.get_indexed("tags", 2), Ok(Value::Text("c".into())));
        assert_eq!(obj.get_indexed("tags", 9), Ok(Value::Text(String::new())));
        assert!(matches!(
            obj.get_indexed("host", 0),
            Err(AccessError::NotIndexed { .. })
        ));
    }

    #[test]
    fn keyed_map_lookup_returns_null_when_absent() {
        let mut obj = server();
        obj.map_mut("env")
            .expect("env")
            .insert("MODE".into(), "prod".into());

        assert_eq!(obj.get_keyed("env", &"MODE".into()), Ok(Value::Text("prod".into())));
        assert_eq!(obj.get_keyed("env", &"HOME".into()), Ok(Value::Text(String::new())));
    }

    #[test]
    fn out_of_chain_index_is_missing() {
        let obj = server();

        assert_eq!(
            obj.value(4),
            Err(AccessError::missing_property("demo.Server", 4))
        );
    }

    #[test]
    fn bad_shapes_are_rejected_before_commit() {
        let mut obj = server();

        assert!(obj.set("port", Value::Int(70_000)).is_err());
        assert_eq!(obj.get("port"), Ok(Value::Int(0)));
        assert_eq!(obj.is_property_set("port"), Ok(false));
    }

    #[test]
    fn frozen_objects_reject_writes() {
        let mut obj = server();
        obj.freeze();

        assert_eq!(
            obj.set("port", Value::Int(1)),
            Err(AccessError::frozen("demo.Server"))
        );
        assert!(obj.list_mut("tags").is_err());
        assert!(!obj.copy_of().is_frozen(), "copies start unfrozen");
    }

    #[test]
    fn listeners_see_old_and_new_values() {
        #[derive(Default)]
        struct Recorder(Mutex<Vec<(String, Value, Value)>>);

        impl crate::item::UpdateListener for Recorder {
            fn property_updated(&self, _: &str, property: &str, old: &Value, new: &Value) {
                if let Ok(mut log) = self.0.lock() {
                    log.push((property.to_string(), old.clone(), new.clone()));
                }
            }
        }

        let recorder = Arc::new(Recorder::default());
        let mut obj = server();
        obj.add_listener(recorder.clone());
        obj.set("port", Value::Int(8080)).expect("set port");

        let log = recorder.0.lock().expect("log");
        assert_eq!(
            log.as_slice(),
            &[("port".to_string(), Value::Int(0), Value::Int(8080))]
        );
    }

    #[test]
    fn value_equality_compares_contents() {
        let mut a = server();
        let b = server();
        assert_eq!(a, b);

        a.set("port", Value::Int(1)).expect("set port");
        assert_ne!(a, b);
        assert_eq!(a, a.copy_of());

        let left = ItemRef::new(a.copy_of());
        let right = ItemRef::new(a);
        assert_eq!(left, right, "handles compare by value for value-equality types");
    }

    #[test]
    fn visit_forwards_to_the_chosen_handler() {
        struct Describer(usize);

        impl Visitor for Describer {
            fn visit(
                &mut self,
                handler: &str,
                item: &dyn ConfigItem,
                arg: Value,
            ) -> Result<Value, AccessError> {
                self.0 += 1;
                Ok(Value::Text(format!("{handler}:{}:{arg:?}", item.type_path())))
            }
        }

        let obj = server();
        let mut visitor = Describer(0);
        let out = obj
            .accept("describe", &mut visitor, Value::Null)
            .expect("handled visit");

        assert_eq!(out, Value::Text("describe_server:demo.Server:Null".into()));
        assert_eq!(visitor.0, 1);
        assert_eq!(
            obj.accept("render", &mut visitor, Value::Null),
            Err(AccessError::unimplemented_visit("render", "demo.Server"))
        );
    }

    #[test]
    fn abstract_models_cannot_be_instantiated() {
        let mut model = (*server_model()).clone();
        model.is_abstract = true;

        assert!(matches!(
            ConfigObject::new(Arc::new(model)),
            Err(AccessError::AbstractType { .. })
        ));
    }
}
