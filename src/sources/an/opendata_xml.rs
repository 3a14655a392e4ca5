//! XML flavour of the open-data export, turned into the same JSON shape as
//! the publisher's JSON files: attributes under `@name`, text next to child
//! elements under `#text`, repeated children as arrays, empty or
//! `xsi:nil` elements as null.

use crate::error::DossierError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

struct Frame {
    name: String,
    attributes: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
    nil: bool,
}

impl Frame {
    fn open(element: &BytesStart<'_>) -> Result<Self, DossierError> {
        let name = String::from_utf8_lossy(element.name().as_ref()).to_string();
        let mut attributes = Map::new();
        let mut nil = false;
        for attribute in element.attributes().flatten() {
            let key = String::from_utf8_lossy(attribute.key.as_ref()).to_string();
            let value = attribute
                .unescape_value()
                .map_err(|e| DossierError::Xml(e.to_string()))?
                .to_string();
            if key == "xsi:nil" && value == "true" {
                nil = true;
            }
            attributes.insert(format!("@{key}"), Value::String(value));
        }
        Ok(Self {
            name,
            attributes,
            children: Map::new(),
            text: String::new(),
            nil,
        })
    }

    fn close(self) -> (String, Value) {
        let text = self.text.trim().to_string();
        if self.nil {
            return (self.name, Value::Null);
        }
        if self.attributes.is_empty() && self.children.is_empty() {
            let value = if text.is_empty() {
                Value::Null
            } else {
                Value::String(text)
            };
            return (self.name, value);
        }

        let mut object = self.attributes;
        object.extend(self.children);
        if !text.is_empty() {
            object.insert("#text".to_string(), Value::String(text));
        }
        (self.name, Value::Object(object))
    }
}

fn attach(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(values)) => values.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}

pub fn xml_to_json(xml: &str) -> Result<Value, DossierError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut document = Map::new();

    let mut finish = |stack: &mut Vec<Frame>, frame: Frame| {
        let (name, value) = frame.close();
        match stack.last_mut() {
            Some(parent) => attach(&mut parent.children, name, value),
            None => attach(&mut document, name, value),
        }
    };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => stack.push(Frame::open(e)?),
            Ok(Event::Empty(ref e)) => {
                let frame = Frame::open(e)?;
                finish(&mut stack, frame);
            }
            Ok(Event::End(_)) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| DossierError::Xml("unbalanced closing tag".to_string()))?;
                finish(&mut stack, frame);
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|e| DossierError::Xml(e.to_string()))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DossierError::Xml(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(frame) = stack.last() {
        return Err(DossierError::Xml(format!("unclosed element <{}>", frame.name)));
    }
    Ok(Value::Object(document))
}
