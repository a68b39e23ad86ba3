//! Owned XML element tree with relative path lookup.
//!
//! EMR responses are small, so the body is read once into an [`XmlElement`]
//! tree and fields are addressed with XPath-like relative paths such as
//! `./ExecutionStatusDetail/State` or `Steps/member`. Namespace prefixes are
//! dropped while reading; elements are matched by local name.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::str;

use crate::error::{EmrError, EmrResult};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Local name, without any namespace prefix.
    pub name: String,
    /// Text directly inside this element (not its children).
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> EmrResult<XmlElement> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => stack.push(XmlElement::new(&local_name(e)?)),
                Ok(Event::Empty(ref e)) => {
                    let element = XmlElement::new(&local_name(e)?);
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| EmrError::xml("Unexpected closing tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(t)) => {
                    if let Some(current) = stack.last_mut() {
                        let text = t.unescape().map_err(|e| EmrError::xml(e.to_string()))?;
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::CData(c)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(EmrError::xml(format!(
                        "XML error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(EmrError::xml("Document ended inside an open element"));
        }
        root.ok_or_else(|| EmrError::xml("Document has no root element"))
    }

    /// All elements reached by a relative path, in document order.
    pub fn find_all(&self, path: &str) -> Vec<&XmlElement> {
        let mut current: Vec<&XmlElement> = vec![self];
        for segment in path_segments(path) {
            current = current
                .into_iter()
                .flat_map(|el| el.children.iter().filter(move |c| c.name == segment))
                .collect();
        }
        current
    }

    /// First element reached by a relative path.
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        self.find_all(path).into_iter().next()
    }

    /// This element's text followed by that of its descendants, depth first.
    pub fn inner_text(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.inner_text());
        }
        out
    }

    /// Concatenated text of every element matching `path`; empty when none do.
    pub fn text_at(&self, path: &str) -> String {
        self.find_all(path)
            .into_iter()
            .map(XmlElement::inner_text)
            .collect()
    }
}

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

fn local_name(e: &BytesStart) -> EmrResult<String> {
    let name = e.local_name();
    str::from_utf8(name.as_ref())
        .map(|s| s.to_string())
        .map_err(|_| EmrError::xml("Invalid UTF-8 in tag name"))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> EmrResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(EmrError::xml("Document has more than one root element"))
    }
}

// ── Error documents ─────────────────────────────────────────────────────

/// Fields of an AWS Query-protocol error document.
///
/// ```xml
/// <ErrorResponse>
///   <Error>
///     <Type>Sender</Type>
///     <Code>ValidationError</Code>
///     <Message>Specified job flow ID not valid</Message>
///   </Error>
///   <RequestId>abc-123</RequestId>
/// </ErrorResponse>
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorDocument {
    pub code: String,
    pub message: String,
    pub request_id: String,
}

impl ErrorDocument {
    /// Read `/ErrorResponse/Error/{Code,Message}` and `/ErrorResponse/RequestId`.
    /// Anything that is not such a document yields empty fields.
    pub fn parse(body: &str) -> Self {
        match XmlElement::parse(body) {
            Ok(root) if root.name == "ErrorResponse" => Self {
                code: root.text_at("Error/Code").trim().to_string(),
                message: root.text_at("Error/Message"),
                request_id: root.text_at("RequestId").trim().to_string(),
            },
            _ => Self::default(),
        }
    }
}

/// The human-readable message at `/ErrorResponse/Error/Message`.
pub fn parse_error_response(body: &str) -> String {
    ErrorDocument::parse(body).message
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOWS: &str = r#"<?xml version="1.0"?>
<DescribeJobFlowsResponse xmlns="http://elasticmapreduce.amazonaws.com/doc/2009-03-31">
  <DescribeJobFlowsResult>
    <JobFlows>
      <member><Name>first</Name><Steps><member><Name>a</Name></member><member><Name>b</Name></member></Steps></member>
      <member><Name>second</Name><Steps/></member>
    </JobFlows>
  </DescribeJobFlowsResult>
</DescribeJobFlowsResponse>"#;

    #[test]
    fn parse_strips_default_namespace() {
        let root = XmlElement::parse(FLOWS).unwrap();
        assert_eq!(root.name, "DescribeJobFlowsResponse");
    }

    #[test]
    fn find_all_follows_path_in_order() {
        let root = XmlElement::parse(FLOWS).unwrap();
        let members = root.find_all("./DescribeJobFlowsResult/JobFlows/member");
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].text_at("./Name"), "first");
        assert_eq!(members[1].text_at("Name"), "second");
        assert_eq!(members[0].find_all("Steps/member").len(), 2);
        assert!(members[1].find_all("Steps/member").is_empty());
    }

    #[test]
    fn text_at_missing_is_empty() {
        let root = XmlElement::parse("<a><b>1</b></a>").unwrap();
        assert_eq!(root.text_at("c/d"), "");
        assert!(root.find("c").is_none());
    }

    #[test]
    fn text_at_concatenates_matches() {
        let root = XmlElement::parse("<a><b>1</b><b>2</b></a>").unwrap();
        assert_eq!(root.text_at("b"), "12");
    }

    #[test]
    fn entities_are_unescaped() {
        let root = XmlElement::parse("<a>x &amp; y &lt;z&gt;</a>").unwrap();
        assert_eq!(root.text, "x & y <z>");
    }

    #[test]
    fn prefixed_names_use_local_part() {
        let root = XmlElement::parse(r#"<aws:Root xmlns:aws="urn:x"><aws:Leaf>v</aws:Leaf></aws:Root>"#).unwrap();
        assert_eq!(root.name, "Root");
        assert_eq!(root.text_at("Leaf"), "v");
    }

    #[test]
    fn malformed_documents_fail() {
        assert!(XmlElement::parse("<a><b></a>").is_err());
        assert!(XmlElement::parse("<a>").is_err());
        assert!(XmlElement::parse("").is_err());
    }

    #[test]
    fn error_message_extracted() {
        let body = "<ErrorResponse><Error><Message>Bad thing</Message></Error></ErrorResponse>";
        assert_eq!(parse_error_response(body), "Bad thing");
    }

    #[test]
    fn error_document_with_namespace() {
        let body = r#"<ErrorResponse xmlns="http://elasticmapreduce.amazonaws.com/doc/2009-03-31/">
  <Error>
    <Type>Sender</Type>
    <Code>ValidationError</Code>
    <Message>Specified job flow ID not valid</Message>
  </Error>
  <RequestId>8eb7b1d2-1f63-11e4-8c4f-6f1b1b0f3f6d</RequestId>
</ErrorResponse>"#;
        let doc = ErrorDocument::parse(body);
        assert_eq!(doc.code, "ValidationError");
        assert_eq!(doc.message, "Specified job flow ID not valid");
        assert_eq!(doc.request_id, "8eb7b1d2-1f63-11e4-8c4f-6f1b1b0f3f6d");
    }

    #[test]
    fn non_error_documents_give_empty_message() {
        assert_eq!(parse_error_response("<Other><Error><Message>x</Message></Error></Other>"), "");
        assert_eq!(parse_error_response("not xml at all"), "");
    }
}
