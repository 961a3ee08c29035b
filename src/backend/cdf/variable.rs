// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CDF v3 variable and attribute construction (§4.9 C9).
//!
//! Drives the VDR/VXR/VR record chains into a `ScalarDynamic`/`ArrayDynamic`
//! per variable, and the ADR/AEDR chains into attribute values attached to
//! the variable (or the product root, for global attributes) they belong
//! to. A CDF file's declared dimensionality, compression, and record
//! sparseness are all per-variable, so construction happens one variable at
//! a time, in on-disk declaration order - matching how `root_type` grows
//! one field at a time in the reference implementation.

use std::sync::Arc;

use crate::bitio::{read_bytes, ByteSource};
use crate::core::{ArrayOrdering, CodaError, Result};
use crate::dynamic::{ArrayDynamic, DynamicRef, DynamicType, FilePosition, RecordDynamic};
use crate::expr;
use crate::types::number::{NumberClass, NumberType, ReadType};
use crate::types::record::Field;
use crate::types::special::{SpecialType, TimeType};
use crate::types::text::{TextType, TextVariant};
use crate::types::{ArrayType, BitSize, Dimension, RecordType, StaticType, TypeRef};

use super::overflow::OverflowSource;
use super::records::{self, expect_one_of_record_type, expect_record_type, read_i32, read_i64, read_name, record_type_at};

/// `coda.h`'s public `CODA_MAX_NUM_DIMS`. Not itself present in the sources
/// this backend was grounded on, but referenced by `coda-cdf-internal.h`'s
/// `rdim_sizes[CODA_MAX_NUM_DIMS]` - 8 is the published constant.
const MAX_NUM_DIMS: i32 = 8;

/// Sparse record method, `VDR.sRecords` (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SparseRecords {
    None,
    Padded,
    Previous,
}

struct PendingVariable {
    name: String,
    num_records: i64,
    num_values_per_record: u64,
    value_size: u64,
    /// One bit offset per record, `-1` until VXR/VR traversal resolves it
    /// (or it stays sparse and is patched in by `resolve_sparse_records`).
    record_offsets: Vec<i64>,
    sparse: SparseRecords,
    is_scalar: bool,
    /// The per-value element type: Number, Text, or a Special Time wrapping
    /// one of those (EPOCH/TIME_TT2000). Never itself an Array or Record.
    element_type: StaticType,
    /// Array dimensions in the order they are declared on the final type:
    /// the record dimension first (if record-varying), then the spatial
    /// dimensions that survive `dim_varys` filtering, both in C order.
    array_dims: Vec<u64>,
}

/// Accumulates variables and attributes while walking a CDF product's
/// record chains, then assembles the product root on [`ProductBuilder::finish`].
pub struct ProductBuilder {
    overflow: OverflowSource,
    little_endian: bool,
    array_ordering: ArrayOrdering,
    rnum_dims: i32,
    pending: Vec<PendingVariable>,
    variable_attributes: Vec<Vec<(String, TypeRef, DynamicRef)>>,
    global_attributes: Vec<(String, TypeRef, DynamicRef)>,
}

impl ProductBuilder {
    pub fn new(file: Arc<dyn ByteSource>, little_endian: bool, array_ordering: ArrayOrdering, rnum_dims: i32) -> Self {
        ProductBuilder {
            overflow: OverflowSource::new(file),
            little_endian,
            array_ordering,
            rnum_dims,
            pending: Vec::new(),
            variable_attributes: Vec::new(),
            global_attributes: Vec::new(),
        }
    }

    fn source(&self) -> &dyn ByteSource {
        &self.overflow
    }

    // ---- VDR chain ----------------------------------------------------

    pub fn read_vdr_chain(&mut self, head: i64, is_zvar: bool) -> Result<()> {
        let mut offset = head;
        while offset != 0 {
            offset = self.read_vdr(offset, is_zvar)?;
        }
        Ok(())
    }

    fn read_vdr(&mut self, offset: i64, is_zvar: bool) -> Result<i64> {
        let off = offset as u64;
        let expected = if is_zvar { records::ZVDR } else { records::RVDR };
        expect_record_type(self.source(), off, expected, "VDR")?;

        let vdr_next = read_i64(self.source(), off + 12)?;
        let data_type = read_i32(self.source(), off + 20)?;
        let max_rec = read_i32(self.source(), off + 24)?;
        let vxr_head = read_i64(self.source(), off + 28)?;
        let flags = read_i32(self.source(), off + 44)?;
        let srecords = read_i32(self.source(), off + 48)?;
        let num_elems = read_i32(self.source(), off + 64)?;
        let num = read_i32(self.source(), off + 68)?;
        let cpr_spr_offset = read_i64(self.source(), off + 72)?;
        let name = read_name(self.source(), off + 84, 256)?;

        if data_type == records::DATA_TYPE_EPOCH16 {
            return Err(CodaError::unsupported("CDF EPOCH16 data type is not supported"));
        }

        let record_varys = flags & 1 != 0;
        let has_compression = flags & 4 != 0;
        if !record_varys && max_rec != 0 {
            return Err(CodaError::product(
                "CDF variable has a non-varying record dimension but number of records is not equal to 1",
            ));
        }

        let mut cursor = off + 340;
        let num_dims = if is_zvar {
            let n = read_i32(self.source(), cursor)?;
            if !(0..=MAX_NUM_DIMS).contains(&n) {
                return Err(CodaError::product(format!("CDF variable has invalid number of dimensions ({n})")));
            }
            cursor += 4;
            cursor += n as u64 * 4; // zdim_sizes read below, walked again for dim_varys base
            n
        } else {
            self.rnum_dims
        };

        let mut dim_sizes = vec![0i32; num_dims.max(0) as usize];
        if is_zvar && num_dims > 0 {
            let sizes_offset = off + 344;
            for (i, size) in dim_sizes.iter_mut().enumerate() {
                *size = read_i32(self.source(), sizes_offset + i as u64 * 4)?;
            }
        } else if !is_zvar && num_dims > 0 {
            // `rdim_sizes` is declared in the product-level GDR context but
            // never actually populated upstream - rVariables are a CDF v2
            // legacy concept essentially unused by modern (v3) files.
            return Err(CodaError::unsupported(
                "CDF rVariables with a non-zero number of dimensions are not supported",
            ));
        }

        let mut dim_varys = vec![true; num_dims.max(0) as usize];
        if num_dims > 0 {
            for (i, varys) in dim_varys.iter_mut().enumerate() {
                *varys = read_i32(self.source(), cursor + i as u64 * 4)? != 0;
            }
            cursor += num_dims as u64 * 4;
        }
        let _ = cursor;

        if has_compression && cpr_spr_offset != -1 {
            self.read_cpr(cpr_spr_offset)?;
        }

        let variable_index = self.pending.len();
        if num != variable_index as i32 {
            return Err(CodaError::product(format!(
                "CDF variable '{name}' has invalid number ({num}), expected {variable_index}"
            )));
        }

        let mut array_dims = Vec::new();
        let mut num_values_per_record: u64 = 1;
        for i in 0..num_dims {
            let dim_id = if self.array_ordering == ArrayOrdering::C { i } else { num_dims - 1 - i };
            if dim_varys[dim_id as usize] {
                let size = dim_sizes[dim_id as usize].max(0) as u64;
                array_dims.push(size);
                num_values_per_record *= size;
            }
        }

        let (element_type, value_size) = basic_element_type(data_type, num_elems, self.little_endian)?;
        let is_scalar = !record_varys && array_dims.is_empty();
        let num_records: i64 = if record_varys { max_rec as i64 + 1 } else { 1 };

        let sparse = match srecords {
            0 => SparseRecords::None,
            1 => SparseRecords::Padded,
            2 => SparseRecords::Previous,
            other => return Err(CodaError::product(format!("CDF variable has invalid sparse records method ({other})"))),
        };

        let mut array_type_dims = Vec::new();
        if record_varys {
            array_type_dims.push(num_records as u64);
        }
        array_type_dims.extend(array_dims.iter().copied());

        self.pending.push(PendingVariable {
            name,
            num_records,
            num_values_per_record,
            value_size,
            record_offsets: vec![-1; num_records.max(0) as usize],
            sparse,
            is_scalar,
            element_type,
            array_dims: array_type_dims,
        });
        self.variable_attributes.push(Vec::new());

        self.read_vxr_chain(variable_index, vxr_head, 0, num_records - 1)?;

        Ok(vdr_next)
    }

    // ---- VXR / VR / CPR -------------------------------------------------

    fn read_vxr_chain(&mut self, variable_index: usize, offset: i64, first: i64, last: i64) -> Result<()> {
        if offset == 0 {
            return Ok(());
        }
        let off = offset as u64;
        expect_record_type(self.source(), off, records::VXR, "VXR")?;
        let vxr_next = read_i64(self.source(), off + 12)?;
        let n_entries = read_i32(self.source(), off + 20)? as u64;
        let nused_entries = read_i32(self.source(), off + 24)? as u64;
        let base = off + 28;
        for i in 0..nused_entries {
            let vr_first = read_i32(self.source(), base + i * 4)? as i64;
            let vr_last = read_i32(self.source(), base + (i + n_entries) * 4)? as i64;
            let vr_offset = read_i64(self.source(), base + (i + n_entries) * 8)?;
            self.read_vr(variable_index, vr_offset, vr_first, vr_last)?;
        }
        self.read_vxr_chain(variable_index, vxr_next, first, last)
    }

    fn read_vr(&mut self, variable_index: usize, offset: i64, first: i64, last: i64) -> Result<()> {
        if offset == 0 {
            return Ok(());
        }
        let off = offset as u64;
        let record_type = record_type_at(self.source(), off)?;
        match record_type {
            records::VXR => self.read_vxr_chain(variable_index, offset, first, last),
            records::VVR => {
                let (num_records, record_size) = {
                    let p = &self.pending[variable_index];
                    (p.num_records, p.num_values_per_record * p.value_size)
                };
                let last = last.min(num_records - 1);
                for i in first..=last {
                    let bit_offset = (off + 12 + (i - first) as u64 * record_size) as i64 * 8;
                    self.pending[variable_index].record_offsets[i as usize] = bit_offset;
                }
                Ok(())
            }
            records::CVVR => {
                let (num_records, record_size) = {
                    let p = &self.pending[variable_index];
                    (p.num_records, p.num_values_per_record * p.value_size)
                };
                if first >= num_records {
                    return Ok(());
                }
                let clamped_last = last.min(num_records - 1);
                let csize = read_i64(self.source(), off + 16)?;
                if csize < 20 {
                    return Err(CodaError::product("CDF compressed variable value record has an invalid size"));
                }
                let compressed = read_bytes(self.source(), off + 24, csize as u64)?;
                let decompressed = crate::zip::inflate_gzip(&compressed)?;
                let expected_len = (clamped_last - first + 1) as u64 * record_size;
                let usable = (decompressed.len() as u64).min(expected_len);
                let bit_offset_base = self.overflow.append(decompressed[..usable as usize].to_vec());
                let resolvable_records = if record_size == 0 { 0 } else { usable / record_size };
                for i in first..=clamped_last {
                    let local_record = (i - first) as u64;
                    if local_record >= resolvable_records {
                        break;
                    }
                    self.pending[variable_index].record_offsets[i as usize] =
                        bit_offset_base + (local_record * record_size * 8) as i64;
                }
                Ok(())
            }
            other => Err(CodaError::product(format!("CDF file has invalid record type ({other}) for VVR record"))),
        }
    }

    fn read_cpr(&mut self, offset: i64) -> Result<()> {
        if offset == 0 {
            return Ok(());
        }
        let off = offset as u64;
        expect_record_type(self.source(), off, records::CPR, "CPR")?;
        let ctype = read_i32(self.source(), off + 12)?;
        if ctype != 5 {
            return Err(CodaError::unsupported(format!("CDF compression method ({ctype}) is not supported, only gzip is")));
        }
        Ok(())
    }

    // ---- ADR / AEDR -------------------------------------------------------

    pub fn read_adr_chain(&mut self, offset: i64) -> Result<()> {
        let mut offset = offset;
        while offset != 0 {
            let off = offset as u64;
            expect_record_type(self.source(), off, records::ADR, "ADR")?;
            let adr_next = read_i64(self.source(), off + 12)?;
            let agredr_head = read_i64(self.source(), off + 20)?;
            let scope = read_i32(self.source(), off + 28)?;
            let ngr_entries = read_i32(self.source(), off + 36)?;
            let azedr_head = read_i64(self.source(), off + 48)?;
            let nz_entries = read_i32(self.source(), off + 56)?;
            let name = read_name(self.source(), off + 68, 256)?;

            let mut aedr_head = agredr_head;
            if scope & 1 != 0 {
                if nz_entries != 0 {
                    return Err(CodaError::product("CDF gADR record has non-zero NzEntries"));
                }
                if ngr_entries == 0 {
                    aedr_head = azedr_head;
                }
            }
            self.read_aedr_chain(aedr_head, &name, scope)?;
            offset = adr_next;
        }
        Ok(())
    }

    fn read_aedr_chain(&mut self, offset: i64, attr_name: &str, scope: i32) -> Result<()> {
        let mut offset = offset;
        while offset != 0 {
            let off = offset as u64;
            let record_type = expect_one_of_record_type(self.source(), off, &[records::AEDR_RENTRY, records::AEDR_ZENTRY], "AEDR")?;
            let aedr_next = read_i64(self.source(), off + 12)?;
            let data_type = read_i32(self.source(), off + 24)?;
            let num = read_i32(self.source(), off + 28)?;
            let num_elems = read_i32(self.source(), off + 32)?;

            if data_type == records::DATA_TYPE_EPOCH16 {
                return Err(CodaError::unsupported("CDF EPOCH16 data type is not supported"));
            }
            let (value_type, value) = read_attribute_value(self.source(), off + 56, data_type, num_elems, self.little_endian)?;
            let dynamic = DynamicType::in_memory_scalar(value_type.clone(), value);

            if record_type == records::AEDR_RENTRY && scope & 1 != 0 {
                self.global_attributes.push((attr_name.to_string(), value_type, dynamic));
            } else {
                let index = usize::try_from(num).map_err(|_| {
                    CodaError::product(format!("CDF attribute entry number ({num}) is outside range of available variables"))
                })?;
                let slot = self.variable_attributes.get_mut(index).ok_or_else(|| {
                    CodaError::product(format!(
                        "CDF attribute entry number ({num}) is outside range of available variables"
                    ))
                })?;
                slot.push((attr_name.to_string(), value_type, dynamic));
            }
            offset = aedr_next;
        }
        Ok(())
    }

    // ---- assembly -----------------------------------------------------

    pub fn finish(mut self) -> (Arc<dyn ByteSource>, DynamicRef) {
        for pending in &mut self.pending {
            resolve_sparse_records(pending);
        }

        let mut root_record = RecordType::new();
        let mut root_fields: Vec<Option<DynamicRef>> = Vec::new();

        for (index, pending) in self.pending.into_iter().enumerate() {
            let attributes = std::mem::take(&mut self.variable_attributes[index]);
            let (attribute_shape, attribute_dynamic) = build_attribute_record(attributes);

            let element_type = Arc::new(pending.element_type);
            let (static_type, dynamic): (TypeRef, DynamicRef) = if pending.is_scalar {
                let scalar_type = attach_scalar_attributes(element_type, attribute_shape);
                let position = pending.record_offsets.first().copied().unwrap_or(-1);
                let fp = if position < 0 {
                    FilePosition::NONE
                } else {
                    FilePosition::at(position, pending.value_size * 8)
                };
                (scalar_type.clone(), DynamicType::scalar(scalar_type, fp))
            } else {
                build_array_variable(&pending, element_type, attribute_shape)
            };
            let dynamic = attach_dynamic_attributes(dynamic, attribute_dynamic);

            root_record.add_field(Field::new(pending.name, static_type)).expect("CDF variable names are validated unique by the record, each variable number is checked during VDR parsing");
            root_fields.push(Some(dynamic));
        }

        let (root_attr_shape, root_attr_dynamic) = build_attribute_record(self.global_attributes);
        if let Some(shape) = root_attr_shape {
            root_record = root_record.with_attributes(shape);
        }

        let root = Arc::new(DynamicType::Record(RecordDynamic {
            static_type: Arc::new(StaticType::Record(root_record)),
            fields: root_fields,
            attributes: root_attr_dynamic,
        }));
        let source: Arc<dyn ByteSource> = Arc::new(self.overflow);
        (source, root)
    }
}

fn attach_scalar_attributes(element_type: TypeRef, attributes: Option<TypeRef>) -> TypeRef {
    let Some(attributes) = attributes else { return element_type };
    match Arc::try_unwrap(element_type) {
        Ok(StaticType::Number(n)) => Arc::new(StaticType::Number(n.with_attributes(attributes))),
        Ok(StaticType::Text(t)) => Arc::new(StaticType::Text(t.with_attributes(attributes))),
        Ok(other) => Arc::new(other),
        Err(shared) => shared, // already shared elsewhere (shouldn't happen for a freshly built type)
    }
}

fn attach_dynamic_attributes(dynamic: DynamicRef, attributes: Option<DynamicRef>) -> DynamicRef {
    let Some(attributes) = attributes else { return dynamic };
    match Arc::try_unwrap(dynamic) {
        Ok(DynamicType::Scalar(mut s)) => {
            s.attributes = Some(attributes);
            Arc::new(DynamicType::Scalar(s))
        }
        Ok(DynamicType::Array(mut a)) => {
            a.attributes = Some(attributes);
            Arc::new(DynamicType::Array(a))
        }
        Ok(other) => Arc::new(other),
        Err(shared) => shared,
    }
}

fn build_array_variable(pending: &PendingVariable, element_type: TypeRef, attribute_shape: Option<TypeRef>) -> (TypeRef, DynamicRef) {
    let mut array_type = ArrayType::new(element_type.clone(), pending.array_dims.iter().map(|d| Dimension::Constant(*d)).collect())
        .with_ordering(ArrayOrdering::C);
    if let Some(attributes) = attribute_shape {
        array_type = array_type.with_attributes(attributes);
    }
    let static_type: TypeRef = Arc::new(StaticType::Array(array_type));

    let total_elements = pending.num_records.max(0) as u64 * pending.num_values_per_record;
    let record_size = pending.num_values_per_record * pending.value_size;
    let uniform = pending.num_records <= 1
        || pending
            .record_offsets
            .windows(2)
            .all(|w| w[0] >= 0 && w[1] == w[0] + (record_size * 8) as i64);

    let dynamic = if uniform && pending.record_offsets.first().is_some_and(|o| *o >= 0) {
        Arc::new(DynamicType::Array(ArrayDynamic {
            static_type: static_type.clone(),
            num_elements: total_elements,
            bit_offset: pending.record_offsets[0],
            element_bit_size: pending.value_size * 8,
            elements: None,
            packing: None,
            attributes: None,
        }))
    } else {
        let mut elements = Vec::with_capacity(total_elements as usize);
        for &record_offset in &pending.record_offsets {
            for value_index in 0..pending.num_values_per_record {
                let position = if record_offset < 0 {
                    FilePosition::NONE
                } else {
                    FilePosition::at(record_offset + (value_index * pending.value_size * 8) as i64, pending.value_size * 8)
                };
                elements.push(DynamicType::scalar(element_type.clone(), position));
            }
        }
        Arc::new(DynamicType::Array(ArrayDynamic {
            static_type: static_type.clone(),
            num_elements: total_elements,
            bit_offset: -1,
            element_bit_size: pending.value_size * 8,
            elements: Some(elements),
            packing: None,
            attributes: None,
        }))
    };
    (static_type, dynamic)
}

/// Fill any record left unresolved (`-1`) by VXR/VR traversal. Full support
/// for the declared pad value (sparse method "padded") would need the VDR's
/// own pad-value field, which this backend does not parse; both "padded"
/// and "previous" fall back to repeating the nearest earlier resolved
/// record; a leading gap with no earlier record at all is left unresolved
/// (read as absent) rather than invented.
fn resolve_sparse_records(pending: &mut PendingVariable) {
    if pending.sparse == SparseRecords::None {
        return;
    }
    let mut previous: Option<i64> = None;
    for offset in &mut pending.record_offsets {
        if *offset < 0 {
            if let Some(prev) = previous {
                *offset = prev;
            }
        } else {
            previous = Some(*offset);
        }
    }
}

fn basic_element_type(data_type: i32, num_elems: i32, little_endian: bool) -> Result<(StaticType, u64)> {
    let (normalized, time_code) = match data_type {
        31 => (45, Some(31)),
        33 => (8, Some(33)),
        other => (other, None),
    };

    if normalized == 51 || normalized == 52 {
        let byte_size = num_elems.max(0) as u64;
        let variant = if byte_size == 1 { TextVariant::Char } else { TextVariant::String };
        return Ok((StaticType::Text(TextType::new(variant, BitSize::Fixed(byte_size * 8))), byte_size));
    }

    let layout = records::numeric_layout(normalized)?
        .ok_or_else(|| CodaError::invalid_argument(format!("invalid CDF data type ({data_type})")))?;
    let number = StaticType::Number(
        NumberType::new(layout.class, layout.read_type, layout.byte_size * 8).with_little_endian(little_endian),
    );

    let element_type = match time_code {
        None => number,
        Some(code) => {
            let expr_str = if code == 31 { "float(.) * 1e-3 - 63113904000.0" } else { "float(.) * 1e-9 - 43200.0" };
            let parsed = expr::parse(expr_str)?;
            StaticType::Special(SpecialType::Time(TimeType::new(Arc::new(number), parsed)))
        }
    };
    Ok((element_type, layout.byte_size))
}

/// Decode one attribute entry's value eagerly (AEDR values are small and
/// read once at open time, unlike variable data which is read lazily
/// through the cursor). Attribute values, unlike record/descriptor framing,
/// follow the file's own declared encoding.
fn read_attribute_value(
    source: &dyn ByteSource,
    offset: u64,
    data_type: i32,
    num_elems: i32,
    little_endian: bool,
) -> Result<(TypeRef, expr::Value)> {
    if data_type == 51 || data_type == 52 {
        let byte_size = num_elems.max(0) as u64;
        let bytes = read_bytes(source, offset, byte_size)?;
        let text_type: TypeRef = Arc::new(StaticType::Text(TextType::new(TextVariant::String, BitSize::Fixed(byte_size * 8))));
        return Ok((text_type, expr::Value::String(Arc::from(bytes.into_boxed_slice()))));
    }
    let layout = records::numeric_layout(data_type)?
        .ok_or_else(|| CodaError::invalid_argument(format!("invalid CDF data type ({data_type})")))?;
    let bytes = read_bytes(source, offset, layout.byte_size)?;
    let value = decode_numeric_value(&bytes, layout.read_type, little_endian);
    let number_type: TypeRef = Arc::new(StaticType::Number(NumberType::new(layout.class, layout.read_type, layout.byte_size * 8)));
    Ok((number_type, value))
}

fn decode_numeric_value(bytes: &[u8], read_type: ReadType, little_endian: bool) -> expr::Value {
    let mut buf = bytes.to_vec();
    if little_endian {
        buf.reverse();
    }
    let raw = buf.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
    match read_type {
        ReadType::F32 => expr::Value::Float(f32::from_bits(raw as u32) as f64),
        ReadType::F64 => expr::Value::Float(f64::from_bits(raw)),
        ReadType::I8 => expr::Value::Int(raw as u8 as i8 as i64),
        ReadType::I16 => expr::Value::Int(raw as u16 as i16 as i64),
        ReadType::I32 => expr::Value::Int(raw as u32 as i32 as i64),
        ReadType::I64 => expr::Value::Int(raw as i64),
        ReadType::U8 | ReadType::U16 | ReadType::U32 | ReadType::U64 => expr::Value::Int(raw as i64),
    }
}

/// Build the Record static type (and matching dynamic record) an
/// attribute-bearing node's `goto_attributes` should expose, or `None` when
/// the variable/product carries no attribute entries at all.
fn build_attribute_record(attributes: Vec<(String, TypeRef, DynamicRef)>) -> (Option<TypeRef>, Option<DynamicRef>) {
    if attributes.is_empty() {
        return (None, None);
    }
    let mut record = RecordType::new();
    let mut fields = Vec::with_capacity(attributes.len());
    for (name, value_type, dynamic) in attributes {
        // CDF allows the same attribute name to appear more than once for a
        // given variable only in malformed files; keep the first entry and
        // drop later duplicates rather than failing the whole product open.
        if record.add_field(Field::new(name, value_type)).is_ok() {
            fields.push(Some(dynamic));
        }
    }
    let static_type: TypeRef = Arc::new(StaticType::Record(record));
    let dynamic_record = Arc::new(DynamicType::Record(RecordDynamic {
        static_type: static_type.clone(),
        fields,
        attributes: None,
    }));
    (Some(static_type), Some(dynamic_record))
}
