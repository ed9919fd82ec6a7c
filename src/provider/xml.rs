//! XML bodies folded into a JSON tree.
//!
//! Conversion rules:
//! - the document becomes `{ "<root>": <element> }`
//! - attributes become `"@name"` keys
//! - text content becomes `"#text"`, or the element's whole value when the
//!   element has neither attributes nor children
//! - repeated child elements with the same name become an array
//! - an empty element with no attributes becomes `null`
//!
//! [`OneOrMany`] and [`Text`] read the shapes these rules produce.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::domain::ProviderError;

/// A repeated element, which is a bare object when it occurs once
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

/// Element text, whether or not the element also carries attributes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Text {
    Plain(String),
    Attributed {
        #[serde(rename = "#text", default)]
        text: String,
    },
}

impl Text {
    pub fn into_string(self) -> String {
        match self {
            Text::Plain(text) | Text::Attributed { text } => text,
        }
    }
}

/// An element being built while its children are read.
struct Frame {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, ProviderError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut fields = Map::new();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| ProviderError::decode(format!("bad XML attribute: {e}")))?;
            let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
            let value = attr
                .unescape_value()
                .map_err(|e| ProviderError::decode(format!("bad XML attribute value: {e}")))?;
            fields.insert(key, Value::String(value.into_owned()));
        }

        Ok(Self {
            name,
            fields,
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        let text = self.text.trim().to_string();
        let value = match (self.fields.is_empty(), text.is_empty()) {
            (true, true) => Value::Null,
            (true, false) => Value::String(text),
            (false, _) => {
                let mut fields = self.fields;
                if !text.is_empty() {
                    fields.insert("#text".to_string(), Value::String(text));
                }
                Value::Object(fields)
            }
        };
        (self.name, value)
    }

    fn push_child(&mut self, name: String, value: Value) {
        match self.fields.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.fields.insert(name, value);
            }
        }
    }
}

/// Parse an XML document into a JSON tree.
pub fn to_tree(body: &str) -> Result<Value, ProviderError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    // The bottom frame collects the root element.
    let mut stack = vec![Frame {
        name: String::new(),
        fields: Map::new(),
        text: String::new(),
    }];

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(Frame::open(&start)?),
            Ok(Event::Empty(start)) => {
                let (name, value) = Frame::open(&start)?.close();
                if let Some(parent) = stack.last_mut() {
                    parent.push_child(name, value);
                }
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err(ProviderError::decode("unbalanced XML end tag"));
                }
                let frame = stack.pop().ok_or_else(|| ProviderError::decode("unbalanced XML"))?;
                let (name, value) = frame.close();
                if let Some(parent) = stack.last_mut() {
                    parent.push_child(name, value);
                }
            }
            Ok(Event::Text(text)) => {
                let text = text
                    .unescape()
                    .map_err(|e| ProviderError::decode(format!("bad XML text: {e}")))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ProviderError::decode(format!(
                    "XML error at position {}: {e}",
                    reader.error_position()
                )));
            }
        }
    }

    if stack.len() != 1 {
        return Err(ProviderError::decode("XML document ended inside an element"));
    }

    let root = stack.pop().map(|f| f.fields).unwrap_or_default();
    if root.is_empty() {
        return Err(ProviderError::decode("XML document has no root element"));
    }
    Ok(Value::Object(root))
}
