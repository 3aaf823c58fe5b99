use std::fmt;

/// SOAP 1.1 envelope namespace.
pub(crate) const SOAP11_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// SOAP 1.2 envelope namespace.
pub(crate) const SOAP12_ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Version of the SOAP protocol.
///
/// The version decides the envelope namespace and the layout of fault messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoapVersion {
    /// SOAP 1.1
    #[default]
    Soap11,
    /// SOAP 1.2
    Soap12,
}

impl SoapVersion {
    /// The envelope namespace for this version.
    pub fn envelope_namespace(&self) -> &'static str {
        match self {
            SoapVersion::Soap11 => SOAP11_ENVELOPE_NS,
            SoapVersion::Soap12 => SOAP12_ENVELOPE_NS,
        }
    }

    /// The version using the given envelope namespace, if any.
    pub fn from_envelope_namespace(ns: &str) -> Option<SoapVersion> {
        match ns {
            SOAP11_ENVELOPE_NS => Some(SoapVersion::Soap11),
            SOAP12_ENVELOPE_NS => Some(SoapVersion::Soap12),
            _ => None,
        }
    }
}

/// A named value in a SOAP message.
///
/// Each XML element of the message body becomes a `SoapValue`. Leaf elements
/// carry their text in [`value()`][SoapValue::value], compound elements their
/// children in [`child_values()`][SoapValue::child_values].
///
/// `SoapValue::default()` is the empty, untyped value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SoapValue {
    name: String,
    namespace: Option<String>,
    value: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<SoapValue>,
}

impl SoapValue {
    /// Create a value with a name and optional text.
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        SoapValue {
            name: name.into(),
            value,
            ..Default::default()
        }
    }

    /// Create a leaf value with text.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        SoapValue::new(name, Some(value.into()))
    }

    /// Set the namespace URI of this value.
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = Some(ns.into());
        self
    }

    /// Local name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace URI of the element, if it has one.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Text content of a leaf element.
    ///
    /// `None` for the empty value and for elements without text.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Attributes in document order, `(local name, value)`.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Look up an attribute by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Add an attribute.
    pub fn push_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    /// Child elements in document order.
    pub fn child_values(&self) -> &[SoapValue] {
        &self.children
    }

    /// Add a child element.
    pub fn push_child(&mut self, child: SoapValue) {
        self.children.push(child);
    }

    /// First child with the given local name.
    pub fn child(&self, name: &str) -> Option<&SoapValue> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Tell if this is the empty value.
    pub fn is_null(&self) -> bool {
        self.name.is_empty()
            && self.value.is_none()
            && self.attributes.is_empty()
            && self.children.is_empty()
    }

    pub(crate) fn set_value(&mut self, value: Option<String>) {
        self.value = value;
    }
}

/// A SOAP message, either the body of a response or one header block.
///
/// The message is the first element in the SOAP body. When that element is a
/// `Fault` in the envelope namespace, the message is flagged as a fault and
/// [`fault_code()`][Message::fault_code] and [`fault_reason()`][Message::fault_reason]
/// give the details, for both SOAP 1.1 and 1.2 layouts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    value: SoapValue,
    fault: bool,
}

impl Message {
    /// Wrap a value as a (non-fault) message.
    pub fn new(value: SoapValue) -> Self {
        Message {
            value,
            fault: false,
        }
    }

    /// Element name of the message, e.g. `getCountryResponse`.
    pub fn name(&self) -> &str {
        self.value.name()
    }

    /// Namespace of the message element.
    pub fn namespace(&self) -> Option<&str> {
        self.value.namespace()
    }

    /// The message content as a value.
    pub fn as_value(&self) -> &SoapValue {
        &self.value
    }

    /// The arguments (or return values) of the message.
    pub fn child_values(&self) -> &[SoapValue] {
        self.value.child_values()
    }

    /// Tell if the message was never populated.
    pub fn is_null(&self) -> bool {
        !self.fault && self.value.is_null()
    }

    /// Tell if this message is a fault.
    pub fn is_fault(&self) -> bool {
        self.fault
    }

    pub(crate) fn set_fault(&mut self, fault: bool) {
        self.fault = fault;
    }

    /// Turn this message into a fault.
    ///
    /// Any previous content is replaced. For SOAP 1.1 the result is
    ///
    /// ```text
    /// <Fault><faultcode>..</faultcode><faultstring>..</faultstring></Fault>
    /// ```
    ///
    /// and for SOAP 1.2
    ///
    /// ```text
    /// <Fault><Code><Value>..</Value></Code><Reason><Text xml:lang="en">..</Text></Reason></Fault>
    /// ```
    pub fn create_fault_message(&mut self, code: &str, reason: &str, version: SoapVersion) {
        let mut fault = SoapValue::new("Fault", None).with_namespace(version.envelope_namespace());

        match version {
            SoapVersion::Soap11 => {
                fault.push_child(SoapValue::text("faultcode", code));
                fault.push_child(SoapValue::text("faultstring", reason));
            }
            SoapVersion::Soap12 => {
                let mut code_value = SoapValue::new("Code", None);
                code_value.push_child(SoapValue::text("Value", code));
                fault.push_child(code_value);

                let mut text = SoapValue::text("Text", reason);
                text.push_attribute("lang", "en");
                let mut reason_value = SoapValue::new("Reason", None);
                reason_value.push_child(text);
                fault.push_child(reason_value);
            }
        }

        self.value = fault;
        self.fault = true;
    }

    /// Fault code, for either SOAP version. `None` if this is not a fault.
    pub fn fault_code(&self) -> Option<&str> {
        if !self.fault {
            return None;
        }
        self.value.child("faultcode").and_then(|v| v.value()).or_else(|| {
            self.value
                .child("Code")
                .and_then(|c| c.child("Value"))
                .and_then(|v| v.value())
        })
    }

    /// Human readable fault reason, for either SOAP version.
    pub fn fault_reason(&self) -> Option<&str> {
        if !self.fault {
            return None;
        }
        self.value
            .child("faultstring")
            .and_then(|v| v.value())
            .or_else(|| {
                self.value
                    .child("Reason")
                    .and_then(|r| r.child("Text"))
                    .and_then(|v| v.value())
            })
    }

    /// The fault as one line of text, `Fault code <code>: <reason>`.
    ///
    /// Empty when this is not a fault.
    pub fn fault_as_string(&self) -> String {
        if !self.fault {
            return String::new();
        }
        format!(
            "Fault code {}: {}",
            self.fault_code().unwrap_or_default(),
            self.fault_reason().unwrap_or_default()
        )
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fault {
            write!(f, "{}", self.fault_as_string())
        } else {
            write!(f, "<{}> ({} values)", self.name(), self.child_values().len())
        }
    }
}

/// Header blocks of a SOAP message, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Headers(Vec<Message>);

impl Headers {
    /// Create an empty collection.
    pub fn new() -> Self {
        Headers(Vec::new())
    }

    /// Add a header block.
    pub fn push(&mut self, header: Message) {
        self.0.push(header);
    }

    /// First header with the given element name.
    pub fn header(&self, name: &str) -> Option<&Message> {
        self.0.iter().find(|h| h.name() == name)
    }

    /// Number of header blocks.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Tell if there are no header blocks.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the header blocks.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.0.iter()
    }

    /// Remove all header blocks.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
