use crate::{error::AccessError, item::ConfigItem, value::Value};

///
/// Visitor
///
/// Externally supplied handler object for in-memory visit dispatch. The
/// `handler` name is the visitor method chosen for the concrete type.
///

pub trait Visitor {
    fn visit(
        &mut self,
        handler: &str,
        item: &dyn ConfigItem,
        arg: Value,
    ) -> Result<Value, AccessError>;
}
