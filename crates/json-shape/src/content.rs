//! Content generation.
//!
//! [`ContentGenerator`] walks any [`ShapeObject`] through the generic
//! enumeration and kind-check operations only, so it works for every schema and
//! every backing store. Events go to a [`ContentHandler`];
//! [`JsonValueBuilder`] is the handler that collects them into a
//! `serde_json::Value`.

use crate::collections::builtin;
use crate::error::{ShapeError, ShapeResult};
use crate::number::Number;
use crate::object::ShapeObject;
use serde_json::{Map, Value};

/// A leaf value.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// JSON null.
    Null,
    /// A boolean.
    Boolean(bool),
    /// A number.
    Number(Number),
    /// A string.
    String(String),
}

impl Primitive {
    fn label(&self) -> &'static str {
        match self {
            Primitive::Null => "null",
            Primitive::Boolean(_) => "boolean",
            Primitive::Number(_) => "number",
            Primitive::String(_) => "string",
        }
    }
}

/// Receives the events of one content walk.
///
/// Every method defaults to doing nothing, so handlers only implement the
/// events they care about.
pub trait ContentHandler {
    /// The walk begins.
    fn start_json(&mut self) -> ShapeResult<()> {
        Ok(())
    }

    /// The walk ends.
    fn end_json(&mut self) -> ShapeResult<()> {
        Ok(())
    }

    /// An object begins.
    fn start_object(&mut self) -> ShapeResult<()> {
        Ok(())
    }

    /// The current object ends.
    fn end_object(&mut self) -> ShapeResult<()> {
        Ok(())
    }

    /// An array begins.
    fn start_array(&mut self) -> ShapeResult<()> {
        Ok(())
    }

    /// The current array ends.
    fn end_array(&mut self) -> ShapeResult<()> {
        Ok(())
    }

    /// The next value belongs to member `name` of the current object.
    fn member_name(&mut self, _name: &str) -> ShapeResult<()> {
        Ok(())
    }

    /// A leaf value.
    fn primitive(&mut self, _value: Primitive) -> ShapeResult<()> {
        Ok(())
    }
}

/// Walks a shape and reports its content.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentGenerator;

impl ContentGenerator {
    /// Walk `object` and everything reachable from it.
    pub fn generate(&self, object: &ShapeObject, handler: &mut dyn ContentHandler) -> ShapeResult<()> {
        handler.start_json()?;
        self.value(object, handler)?;
        handler.end_json()
    }

    fn value(&self, object: &ShapeObject, handler: &mut dyn ContentHandler) -> ShapeResult<()> {
        if object.is_array() {
            self.array(object, handler)
        } else {
            self.object(object, handler)
        }
    }

    fn object(&self, object: &ShapeObject, handler: &mut dyn ContentHandler) -> ShapeResult<()> {
        handler.start_object()?;
        for name in object.property_names()? {
            handler.member_name(&name)?;
            if object.is_null_property(&name)? {
                handler.primitive(Primitive::Null)?;
            } else if object.is_boolean_property(&name)? {
                let v = object.get_boolean_property(&name)?;
                handler.primitive(v.map_or(Primitive::Null, Primitive::Boolean))?;
            } else if object.is_number_property(&name)? {
                let v = object.get_number_property(&name)?;
                handler.primitive(v.map_or(Primitive::Null, Primitive::Number))?;
            } else if object.is_string_property(&name)? {
                let v = object.get_string_property(&name)?;
                handler.primitive(v.map_or(Primitive::Null, Primitive::String))?;
            } else {
                match object.get_object_property(&name, &builtin::json_object_ref())? {
                    Some(nested) => self.value(&nested, handler)?,
                    None => handler.primitive(Primitive::Null)?,
                }
            }
        }
        handler.end_object()
    }

    fn array(&self, array: &ShapeObject, handler: &mut dyn ContentHandler) -> ShapeResult<()> {
        handler.start_array()?;
        for i in 0..array.length()? {
            if array.is_null_element(i)? {
                handler.primitive(Primitive::Null)?;
            } else if array.is_boolean_element(i)? {
                let v = array.get_boolean_element(i)?;
                handler.primitive(v.map_or(Primitive::Null, Primitive::Boolean))?;
            } else if array.is_number_element(i)? {
                let v = array.get_number_element(i)?;
                handler.primitive(v.map_or(Primitive::Null, Primitive::Number))?;
            } else if array.is_string_element(i)? {
                let v = array.get_string_element(i)?;
                handler.primitive(v.map_or(Primitive::Null, Primitive::String))?;
            } else {
                match array.get_object_element(i, &builtin::json_object_ref())? {
                    Some(nested) => self.value(&nested, handler)?,
                    None => handler.primitive(Primitive::Null)?,
                }
            }
        }
        handler.end_array()
    }
}

enum Frame {
    Object {
        members: Map<String, Value>,
        pending: Option<String>,
    },
    Array(Vec<Value>),
}

/// Collects content events into a `serde_json::Value`.
///
/// Non-finite numbers become `null`.
#[derive(Default)]
pub struct JsonValueBuilder {
    stack: Vec<Frame>,
    result: Option<Value>,
}

impl JsonValueBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected value, once a complete value has been reported.
    pub fn finish(self) -> Option<Value> {
        self.result
    }

    fn emit(&mut self, value: Value) -> ShapeResult<()> {
        match self.stack.last_mut() {
            None => {
                self.result = Some(value);
                Ok(())
            }
            Some(Frame::Array(elements)) => {
                elements.push(value);
                Ok(())
            }
            Some(Frame::Object { members, pending }) => {
                let name = pending
                    .take()
                    .ok_or_else(|| ShapeError::value_mismatch("member name", "value"))?;
                members.insert(name, value);
                Ok(())
            }
        }
    }
}

impl ContentHandler for JsonValueBuilder {
    fn start_json(&mut self) -> ShapeResult<()> {
        self.stack.clear();
        self.result = None;
        Ok(())
    }

    fn start_object(&mut self) -> ShapeResult<()> {
        self.stack.push(Frame::Object {
            members: Map::new(),
            pending: None,
        });
        Ok(())
    }

    fn end_object(&mut self) -> ShapeResult<()> {
        match self.stack.pop() {
            Some(Frame::Object { members, .. }) => self.emit(Value::Object(members)),
            Some(Frame::Array(_)) => Err(ShapeError::value_mismatch("end_array", "end_object")),
            None => Err(ShapeError::value_mismatch("start_object", "end_object")),
        }
    }

    fn start_array(&mut self) -> ShapeResult<()> {
        self.stack.push(Frame::Array(Vec::new()));
        Ok(())
    }

    fn end_array(&mut self) -> ShapeResult<()> {
        match self.stack.pop() {
            Some(Frame::Array(elements)) => self.emit(Value::Array(elements)),
            Some(Frame::Object { .. }) => {
                Err(ShapeError::value_mismatch("end_object", "end_array"))
            }
            None => Err(ShapeError::value_mismatch("start_array", "end_array")),
        }
    }

    fn member_name(&mut self, name: &str) -> ShapeResult<()> {
        match self.stack.last_mut() {
            Some(Frame::Object { pending, .. }) => {
                *pending = Some(name.to_string());
                Ok(())
            }
            _ => Err(ShapeError::value_mismatch("object", "member name")),
        }
    }

    fn primitive(&mut self, value: Primitive) -> ShapeResult<()> {
        let found = value.label();
        let value = match value {
            Primitive::Null => Value::Null,
            Primitive::Boolean(b) => Value::Bool(b),
            Primitive::Number(n) => n.to_json().map_or(Value::Null, Value::Number),
            Primitive::String(s) => Value::String(s),
        };
        self.emit(value).map_err(|_| ShapeError::value_mismatch("member name", found))
    }
}

impl ShapeObject {
    /// Render the object and everything reachable from it as JSON.
    pub fn to_json_value(&self) -> ShapeResult<Value> {
        let mut builder = JsonValueBuilder::new();
        ContentGenerator.generate(self, &mut builder)?;
        Ok(builder.finish().unwrap_or(Value::Null))
    }
}
