use crate::model::{DispatchTable, PropertyModel, Route};
use std::sync::Arc;
use typedconf_schema::ROOT_TYPE;

///
/// VisitModel
///
/// One deduplicated visit stub. `handler` is the visitor method it forwards
/// to; `None` marks an unimplemented visit case.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VisitModel {
    pub name: String,
    pub visitor: String,
    pub arg: String,
    pub result: String,
    pub handler: Option<String>,
}

///
/// TypeModel
///
/// Compiled form of one implementation level.
///

#[derive(Clone, Debug, PartialEq)]
pub struct TypeModel {
    pub path: String,

    /// `None` only for the root.
    pub primary: Option<Arc<Self>>,

    /// Every property visible at this type, indexed by slot.
    pub properties: Vec<PropertyModel>,

    pub table: DispatchTable,
    pub visits: Vec<VisitModel>,
    pub is_abstract: bool,
    pub value_equality: bool,
}

impl TypeModel {
    /// The trivial implementation every chain ends in.
    #[must_use]
    pub fn root() -> Arc<Self> {
        Arc::new(Self {
            path: ROOT_TYPE.to_string(),
            primary: None,
            properties: Vec::new(),
            table: DispatchTable::default(),
            visits: Vec::new(),
            is_abstract: false,
            value_equality: false,
        })
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.primary.is_none()
    }

    #[must_use]
    pub fn property(&self, index: usize) -> Option<&PropertyModel> {
        self.properties.get(index)
    }

    #[must_use]
    pub fn property_named(&self, name: &str) -> Option<&PropertyModel> {
        self.properties.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.property_named(name).map(|p| p.slot)
    }

    #[must_use]
    pub fn visit(&self, name: &str) -> Option<&VisitModel> {
        self.visits.iter().find(|v| v.name == name)
    }

    /// Walk the dispatch chain for `index`: the level that serves it and
    /// how, or `None` when the chain ends at the root.
    #[must_use]
    pub fn resolve(&self, index: usize) -> Option<(&Self, Route)> {
        let mut model = self;
        loop {
            match model.table.route(index) {
                Some(route @ (Route::Declared | Route::Redeclared)) => return Some((model, route)),
                Some(Route::Inherited) | None => model = model.primary.as_deref()?,
            }
        }
    }

    /// This model followed by its primary chain, ending at the root.
    pub fn chain(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |m| m.primary.as_deref())
    }
}
