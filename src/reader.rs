//! Decoding of response envelopes.
//!
//! The [`MessageReader`] trait is what a [`PendingCall`][crate::PendingCall]
//! uses to turn response bytes into a [`Message`] and its [`Headers`].
//! [`EnvelopeReader`] is the built-in implementation on top of the `xml-rs`
//! pull parser.

use xml::name::OwnedName;
use xml::reader::{EventReader, XmlEvent};

use crate::message::{Headers, Message, SoapValue, SoapVersion};
use crate::Error;

/// Turns raw response bytes into a message and header collection.
///
/// Implementations must be pure: no I/O, and the same input gives the same
/// output. A server fault is not an error, it is a message with
/// [`Message::is_fault()`] set.
pub trait MessageReader {
    /// Decode one response envelope.
    fn decode(&self, input: &[u8], version: SoapVersion) -> Result<(Message, Headers), Error>;
}

/// Reader for SOAP 1.1 and 1.2 envelopes.
///
/// * The root must be an `Envelope` in one of the SOAP envelope namespaces.
/// * Each child of `Header` becomes one header [`Message`].
/// * The first child of `Body` becomes the message. A `Fault` in the envelope
///   namespace is flagged as a fault.
///
/// The envelope namespace in the response wins over the version asked for.
/// Multi-ref (`href`/`id`) encoding is not resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeReader(());

impl EnvelopeReader {
    /// Create a new reader.
    pub fn new() -> Self {
        EnvelopeReader(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Envelope,
    Header,
    Body,
    Other,
}

impl MessageReader for EnvelopeReader {
    fn decode(&self, input: &[u8], version: SoapVersion) -> Result<(Message, Headers), Error> {
        if input.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(Error::NoEnvelope);
        }

        let mut depth = 0_usize;
        let mut section = Section::Envelope;
        let mut seen_body = false;

        // Open elements below Header/Body, with their text so far.
        let mut stack: Vec<(SoapValue, String)> = Vec::new();

        let mut headers = Headers::new();
        let mut message: Option<Message> = None;

        for event in EventReader::new(input) {
            match event? {
                XmlEvent::StartElement {
                    name, attributes, ..
                } => {
                    depth += 1;

                    match depth {
                        1 => {
                            let env_version = envelope_version(&name);
                            if name.local_name != "Envelope" || env_version.is_none() {
                                return Err(Error::UnexpectedRoot(name.local_name));
                            }
                            if env_version != Some(version) {
                                debug!(
                                    "Response envelope is {:?}, call expected {:?}",
                                    env_version, version
                                );
                            }
                        }
                        2 => {
                            section = match name.local_name.as_str() {
                                _ if envelope_version(&name).is_none() => Section::Other,
                                "Header" => Section::Header,
                                "Body" => {
                                    seen_body = true;
                                    Section::Body
                                }
                                _ => Section::Other,
                            };
                        }
                        _ => {
                            if matches!(section, Section::Header | Section::Body) {
                                let mut value = SoapValue::new(name.local_name, None);
                                if let Some(ns) = name.namespace {
                                    value = value.with_namespace(ns);
                                }
                                for attr in attributes {
                                    value.push_attribute(attr.name.local_name, attr.value);
                                }
                                stack.push((value, String::new()));
                            }
                        }
                    }
                }

                XmlEvent::Characters(s) | XmlEvent::CData(s) => {
                    if let Some((_, text)) = stack.last_mut() {
                        text.push_str(&s);
                    }
                }

                XmlEvent::EndElement { .. } => {
                    if depth >= 3 {
                        if let Some((mut value, text)) = stack.pop() {
                            if !text.is_empty() {
                                value.set_value(Some(text));
                            }

                            if let Some((parent, _)) = stack.last_mut() {
                                parent.push_child(value);
                            } else if section == Section::Header {
                                headers.push(Message::new(value));
                            } else if message.is_none() {
                                message = Some(to_message(value));
                            }
                        }
                    }

                    depth -= 1;
                    if depth == 1 {
                        section = Section::Envelope;
                    }
                }

                _ => {}
            }
        }

        if !seen_body {
            return Err(Error::NoBody);
        }

        Ok((message.unwrap_or_default(), headers))
    }
}

fn envelope_version(name: &OwnedName) -> Option<SoapVersion> {
    name.namespace
        .as_deref()
        .and_then(SoapVersion::from_envelope_namespace)
}

fn to_message(value: SoapValue) -> Message {
    let is_fault = value.name() == "Fault"
        && value
            .namespace()
            .and_then(SoapVersion::from_envelope_namespace)
            .is_some();

    let mut message = Message::new(value);
    message.set_fault(is_fault);
    message
}
