// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Codadef XML parsing (§4.6 C6).
//!
//! Parsing runs in two passes over `quick_xml`'s event stream. The first
//! pass drives a stack of open-element frames (one pushed per `Start`,
//! popped on the matching `End`) into a generic [`XmlNode`] tree — the same
//! "stack of partially-built nodes" shape the original definition-file
//! parser uses, just with the interpretation step factored out so each
//! element handler below is a plain function over an already-validated
//! tree rather than interleaved with the event loop. The second pass walks
//! that tree and builds the typed dictionary model (product classes, types,
//! detection rules). An element this crate does not know how to interpret
//! (a foreign namespace, a future schema addition) is kept as an opaque
//! child and simply never visited by the interpreter — "skipped in
//! balance" without needing a special skip-depth counter.

use std::collections::HashMap;
use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::core::{ArrayOrdering, CodaError, Result};
use crate::expr;
use crate::types::number::{NumberClass, NumberType, ReadType};
use crate::types::special::{ComplexType, TimeType, VsfIntegerType};
use crate::types::text::{TextType, TextVariant};
use crate::types::{ArrayType, BitSize, Dimension, Field, RawType, RecordType, SpecialType, StaticType, TypeRef};

use super::strings::{decode_c_escapes, decode_xml_entities};
use super::{DetectionRule, NamedType, ProductClass, ProductType};

/// A generic XML element: tag name, attributes, text content, children.
#[derive(Debug, Clone, Default)]
pub struct XmlNode {
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    fn child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }
}

/// Parse an XML document's bytes into a generic node tree rooted at the
/// single top-level element.
pub fn parse_xml_tree(data: &[u8]) -> Result<XmlNode> {
    let mut reader = Reader::from_reader(data);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| CodaError::Xml { message: e.to_string() })? {
            Event::Start(e) => {
                let mut node = XmlNode { tag: local_name(e.name().as_ref()), ..Default::default() };
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| CodaError::Xml { message: e.to_string() })?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .unescape_value()
                        .map_err(|e| CodaError::Xml { message: e.to_string() })?
                        .into_owned();
                    node.attrs.insert(key, decode_xml_entities(&value)?);
                }
                stack.push(node);
            }
            Event::Empty(e) => {
                let mut node = XmlNode { tag: local_name(e.name().as_ref()), ..Default::default() };
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| CodaError::Xml { message: e.to_string() })?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .unescape_value()
                        .map_err(|e| CodaError::Xml { message: e.to_string() })?
                        .into_owned();
                    node.attrs.insert(key, decode_xml_entities(&value)?);
                }
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| CodaError::Xml { message: e.to_string() })?.into_owned();
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&decode_xml_entities(&text)?);
                }
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| CodaError::Xml { message: "unmatched closing tag".into() })?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    root.ok_or_else(|| CodaError::Xml { message: "document has no root element".into() })
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(node);
            Ok(())
        }
        None => {
            if root.is_some() {
                return Err(CodaError::Xml { message: "document has more than one root element".into() });
            }
            *root = Some(node);
            Ok(())
        }
    }
}

fn local_name(qualified: &[u8]) -> String {
    let s = String::from_utf8_lossy(qualified);
    s.rsplit(':').next().unwrap_or(&s).to_string()
}

/// Interpret a `<ProductClass>` element tree into the typed model.
pub fn build_product_class(node: &XmlNode) -> Result<ProductClass> {
    if node.tag != "ProductClass" {
        return Err(CodaError::data_definition_msg(format!("expected <ProductClass>, found <{}>", node.tag)));
    }
    let name = node
        .attr("name")
        .ok_or_else(|| CodaError::data_definition_msg("<ProductClass> has no name attribute"))?
        .to_string();
    let revision: u64 = node
        .attr("revision")
        .map(|v| v.parse())
        .transpose()
        .map_err(|_| CodaError::data_definition_msg("<ProductClass> has a non-numeric revision"))?
        .unwrap_or(1);

    let mut class = ProductClass::new(name, revision);
    if let Some(desc) = node.child("Description") {
        class.description = desc.text.clone();
    }

    for named in node.children_named("NamedType") {
        let name = named
            .attr("name")
            .ok_or_else(|| CodaError::data_definition_msg("<NamedType> has no name attribute"))?
            .to_string();
        let type_node = named
            .children
            .iter()
            .find(|c| is_type_element(&c.tag))
            .ok_or_else(|| CodaError::data_definition_msg(format!("NamedType '{name}' has no type definition")))?;
        let static_type = build_type(type_node)?;
        class.named_types.insert(name.clone(), NamedType { name, static_type });
    }

    for product_type in node.children_named("ProductType") {
        let built = build_product_type(product_type, &class)?;
        class.product_types.insert(built.name.clone(), built);
    }

    Ok(class)
}

fn build_product_type(node: &XmlNode, class: &ProductClass) -> Result<ProductType> {
    let name = node
        .attr("name")
        .ok_or_else(|| CodaError::data_definition_msg("<ProductType> has no name attribute"))?
        .to_string();
    let description = node.child("Description").map(|d| d.text.clone()).unwrap_or_default();
    let format = node
        .attr("format")
        .and_then(crate::core::Format::try_from_str)
        .unwrap_or(crate::core::Format::Binary);

    let definition = node
        .children
        .iter()
        .find(|c| c.tag == "ProductDefinition")
        .ok_or_else(|| CodaError::data_definition_msg(format!("ProductType '{name}' has no ProductDefinition")))?;

    let type_node = definition
        .children
        .iter()
        .find(|c| is_type_element(&c.tag))
        .ok_or_else(|| CodaError::data_definition_msg(format!("ProductType '{name}' has no root type")))?;
    let root_type = resolve_type(type_node, class)?;

    let mut detection_rules = Vec::new();
    for rule_node in node.children_named("DetectionRule") {
        detection_rules.push(build_detection_rule(rule_node)?);
    }

    Ok(ProductType { name, description, format, root_type, detection_rules })
}

fn build_detection_rule(node: &XmlNode) -> Result<DetectionRule> {
    let file_size = node.child("MatchSize").and_then(|n| n.text.trim().parse::<u64>().ok());
    let filename_regex = node.child("MatchFilename").map(|n| super::strings::wildcard_to_regex(n.text.trim()));
    let mut expressions = Vec::new();
    for expr_node in node.children_named("MatchExpression") {
        expressions.push(expr::parse(expr_node.text.trim())?);
    }
    Ok(DetectionRule { file_size, filename_regex, expressions })
}

fn is_type_element(tag: &str) -> bool {
    matches!(
        tag,
        "Integer" | "Float" | "Text" | "Raw" | "Array" | "Record" | "Union" | "Time" | "VSFInteger" | "Complex"
    )
}

/// Resolve a type element that may be a direct definition or a `type="name"`
/// reference into an already-defined named type.
fn resolve_type(node: &XmlNode, class: &ProductClass) -> Result<TypeRef> {
    if let Some(reference) = node.attr("type") {
        return class
            .named_types
            .get(reference)
            .map(|t| t.static_type.clone())
            .ok_or_else(|| CodaError::data_definition_msg(format!("reference to unknown named type '{reference}'")));
    }
    build_type(node)
}

fn bit_size_of(node: &XmlNode) -> Result<Option<BitSize>> {
    if let Some(bits) = node.child("BitSize") {
        if let Ok(n) = bits.text.trim().parse::<u64>() {
            return Ok(Some(BitSize::Fixed(n)));
        }
        return Ok(Some(BitSize::Expression(Box::new(expr::parse(bits.text.trim())?))));
    }
    if let Some(bytes) = node.child("ByteSize") {
        if let Ok(n) = bytes.text.trim().parse::<u64>() {
            return Ok(Some(BitSize::Fixed(n * 8)));
        }
        return Ok(Some(BitSize::Expression(Box::new(expr::parse(bytes.text.trim())?))));
    }
    Ok(None)
}

fn build_type(node: &XmlNode) -> Result<TypeRef> {
    let static_type = match node.tag.as_str() {
        "Integer" | "Float" => build_number(node)?,
        "Text" => build_text(node)?,
        "Raw" => build_raw(node)?,
        "Array" => build_array(node)?,
        "Record" => StaticType::Record(build_record(node, false)?),
        "Union" => StaticType::Record(build_record(node, true)?),
        "Time" => build_time(node)?,
        "VSFInteger" => build_vsf_integer(node)?,
        "Complex" => build_complex(node)?,
        other => return Err(CodaError::data_definition_msg(format!("unsupported type element <{other}>"))),
    };
    Ok(Arc::new(static_type))
}

fn build_number(node: &XmlNode) -> Result<StaticType> {
    let class = if node.tag == "Integer" { NumberClass::Integer } else { NumberClass::Real };
    let read_type = match node.attr("NativeType").unwrap_or("") {
        "int8" => ReadType::I8,
        "uint8" => ReadType::U8,
        "int16" => ReadType::I16,
        "uint16" => ReadType::U16,
        "int32" => ReadType::I32,
        "uint32" => ReadType::U32,
        "int64" => ReadType::I64,
        "uint64" => ReadType::U64,
        "float" => ReadType::F32,
        "double" => ReadType::F64,
        "" => match class {
            NumberClass::Integer => ReadType::I32,
            NumberClass::Real => ReadType::F64,
        },
        other => return Err(CodaError::data_definition_msg(format!("unknown native type '{other}'"))),
    };
    let bit_size = bit_size_of(node)?.unwrap_or(BitSize::Fixed(read_type.byte_size() * 8));
    let mut number = match bit_size {
        BitSize::Fixed(n) => NumberType::new(class, read_type, n),
        BitSize::Expression(e) => NumberType::with_expression_bit_size(class, read_type, *e),
    };
    number.little_endian = node.attr("LittleEndian").map(|v| v == "true").unwrap_or(false);
    if let Some(unit) = node.child("Unit") {
        number = number.with_unit(unit.text.clone());
    }
    if let Some(conversion) = node.child("Conversion") {
        let numerator = conversion.child("Numerator").map(|n| n.text.trim().parse().unwrap_or(1.0)).unwrap_or(1.0);
        let denominator = conversion.child("Denominator").map(|n| n.text.trim().parse().unwrap_or(1.0)).unwrap_or(1.0);
        number = number.with_conversion(crate::types::number::Conversion::new(numerator, denominator, 0.0));
    }
    Ok(StaticType::Number(number))
}

fn build_text(node: &XmlNode) -> Result<StaticType> {
    let variant = match node.attr("SpecialText").unwrap_or("") {
        "AsciiLine" => TextVariant::AsciiLine,
        "LineSeparator" => TextVariant::LineSeparator,
        "WhiteSpace" => TextVariant::Whitespace,
        _ => TextVariant::String,
    };
    let bit_size = bit_size_of(node)?.unwrap_or(BitSize::Fixed(0));
    let mut text = TextType::new(variant, bit_size);
    if let Some(fixed) = node.child("FixedValue") {
        text = text.with_fixed_value(fixed.text.clone());
    }
    Ok(StaticType::Text(text))
}

fn build_raw(node: &XmlNode) -> Result<StaticType> {
    let bit_size = bit_size_of(node)?.ok_or_else(|| CodaError::data_definition_msg("<Raw> has no size"))?;
    let mut raw = RawType::new(bit_size);
    if let Some(fixed) = node.child("FixedValue") {
        raw = raw.with_fixed_value(decode_c_escapes(&fixed.text)?);
    }
    Ok(StaticType::Raw(raw))
}

fn build_array(node: &XmlNode) -> Result<StaticType> {
    let base_node = node
        .children
        .iter()
        .find(|c| is_type_element(&c.tag))
        .ok_or_else(|| CodaError::data_definition_msg("<Array> has no element type"))?;
    let base_type = build_type(base_node)?;

    let mut dimensions = Vec::new();
    for dim in node.children_named("Dimension") {
        let text = dim.text.trim();
        if let Ok(n) = text.parse::<u64>() {
            dimensions.push(Dimension::Constant(n));
        } else {
            dimensions.push(Dimension::Expression(Box::new(expr::parse(text)?)));
        }
    }
    if dimensions.is_empty() {
        return Err(CodaError::data_definition_msg("<Array> has no dimensions"));
    }

    let ordering = match node.attr("ArrayOrdering").unwrap_or("C") {
        "Fortran" => ArrayOrdering::Fortran,
        _ => ArrayOrdering::C,
    };
    Ok(StaticType::Array(ArrayType::new(base_type, dimensions).with_ordering(ordering)))
}

fn build_record(node: &XmlNode, is_union: bool) -> Result<RecordType> {
    let mut record = RecordType::new();
    if is_union {
        let selector = node
            .attr("FieldExpression")
            .ok_or_else(|| CodaError::data_definition_msg("<Union> has no selector expression"))?;
        record = record.as_union(expr::parse(selector)?);
    }
    for field_node in node.children_named("Field") {
        let name = field_node
            .attr("name")
            .ok_or_else(|| CodaError::data_definition_msg("<Field> has no name attribute"))?
            .to_string();
        let type_node = field_node
            .children
            .iter()
            .find(|c| is_type_element(&c.tag))
            .ok_or_else(|| CodaError::data_definition_msg(format!("field '{name}' has no type")))?;
        let field_type = build_type(type_node)?;
        let mut field = Field::new(name, field_type);
        if let Some(real_name) = field_node.attr("real_name") {
            field = field.with_real_name(real_name);
        }
        field = field.with_optional(field_node.child("Optional").is_some());
        field = field.with_hidden(field_node.child("Hidden").is_some());
        if let Some(available) = field_node.child("Available") {
            field = field.with_availability_expr(expr::parse(available.text.trim())?);
        }
        record.add_field(field)?;
    }
    record.validate(false)?;
    Ok(record)
}

fn build_time(node: &XmlNode) -> Result<StaticType> {
    let base_node = node
        .children
        .iter()
        .find(|c| is_type_element(&c.tag))
        .ok_or_else(|| CodaError::data_definition_msg("<Time> has no base type"))?;
    let base = build_type(base_node)?;
    let unit_text = node.child("Unit").map(|u| u.text.trim().to_string()).unwrap_or_else(|| "seconds since 2000-01-01".into());
    let unit_expr = crate::expr::Expr::StringLiteral(Arc::from(unit_text.into_bytes().into_boxed_slice()));
    Ok(StaticType::Special(SpecialType::Time(TimeType::new(base, unit_expr))))
}

fn build_vsf_integer(node: &XmlNode) -> Result<StaticType> {
    let mut type_children = node.children.iter().filter(|c| is_type_element(&c.tag));
    let base_node = type_children.next().ok_or_else(|| CodaError::data_definition_msg("<VSFInteger> has no base type"))?;
    let scale_node = type_children.next().ok_or_else(|| CodaError::data_definition_msg("<VSFInteger> has no scale-factor type"))?;
    let base = build_type(base_node)?;
    let scale_factor = build_type(scale_node)?;
    let mut vsf = VsfIntegerType::new(base, scale_factor);
    if let Some(unit) = node.child("Unit") {
        vsf = vsf.with_unit(unit.text.clone());
    }
    Ok(StaticType::Special(SpecialType::VsfInteger(vsf)))
}

fn build_complex(node: &XmlNode) -> Result<StaticType> {
    let mut type_children = node.children.iter().filter(|c| is_type_element(&c.tag));
    let real_node = type_children.next().ok_or_else(|| CodaError::data_definition_msg("<Complex> has no real component"))?;
    let imag_node = type_children.next().ok_or_else(|| CodaError::data_definition_msg("<Complex> has no imaginary component"))?;
    let real = build_type(real_node)?;
    let imag = build_type(imag_node)?;
    Ok(StaticType::Special(SpecialType::Complex(ComplexType::new(real, imag))))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <ProductClass name="TEST" revision="2">
            <Description>a test class</Description>
            <ProductType name="Simple" format="binary">
                <ProductDefinition>
                    <Record>
                        <Field name="count">
                            <Integer><NativeType>int32</NativeType></Integer>
                        </Field>
                        <Field name="values">
                            <Array>
                                <Dimension>4</Dimension>
                                <Float><NativeType>double</NativeType></Float>
                            </Array>
                        </Field>
                    </Record>
                </ProductDefinition>
                <DetectionRule>
                    <MatchFilename>TEST_*.bin</MatchFilename>
                </DetectionRule>
            </ProductType>
        </ProductClass>
    "#;

    #[test]
    fn parses_tree_and_builds_class() {
        let tree = parse_xml_tree(SAMPLE.as_bytes()).unwrap();
        let class = build_product_class(&tree).unwrap();
        assert_eq!(class.name, "TEST");
        assert_eq!(class.revision, 2);
        assert_eq!(class.description, "a test class");
        let product_type = class.product_types.get("Simple").unwrap();
        assert_eq!(product_type.detection_rules.len(), 1);
        match product_type.root_type.as_ref() {
            StaticType::Record(r) => assert_eq!(r.num_fields(), 2),
            _ => panic!("expected record root type"),
        }
    }
}
