use std::fmt;

use crate::PoloError;

/// Wire type carried in the low nibble of every POLO tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Null = 0,
    False = 1,
    True = 2,
    PosInt = 3,
    NegInt = 4,
    Raw = 5,
    Word = 6,
    Float = 7,
    Doc = 13,
    Pack = 14,
    Load = 15,
}

impl WireType {
    pub fn from_tag(tag: u64) -> Result<Self, PoloError> {
        Ok(match tag & 0x0f {
            0 => WireType::Null,
            1 => WireType::False,
            2 => WireType::True,
            3 => WireType::PosInt,
            4 => WireType::NegInt,
            5 => WireType::Raw,
            6 => WireType::Word,
            7 => WireType::Float,
            13 => WireType::Doc,
            14 => WireType::Pack,
            15 => WireType::Load,
            other => return Err(PoloError::UnknownWireType(other as u8)),
        })
    }

    /// Compound wires carry a load (head + body) as their data.
    pub fn is_compound(self) -> bool {
        matches!(self, WireType::Pack | WireType::Doc)
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::Null => "null",
            WireType::False => "false",
            WireType::True => "true",
            WireType::PosInt => "posint",
            WireType::NegInt => "negint",
            WireType::Raw => "raw",
            WireType::Word => "word",
            WireType::Float => "float",
            WireType::Doc => "document",
            WireType::Pack => "pack",
            WireType::Load => "load",
        };
        f.write_str(name)
    }
}

/// Appends `value` as an unsigned LEB128 varint.
pub fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Reads an unsigned LEB128 varint, returning the value and the bytes consumed.
pub fn read_varint(bytes: &[u8]) -> Result<(u64, usize), PoloError> {
    let mut value: u64 = 0;
    for (idx, byte) in bytes.iter().enumerate() {
        if idx >= 10 {
            return Err(PoloError::MalformedVarint);
        }
        value |= u64::from(byte & 0x7f) << (7 * idx);
        if byte & 0x80 == 0 {
            return Ok((value, idx + 1));
        }
    }
    Err(PoloError::MalformedVarint)
}

/// A single decoded wire: its type and the data following the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadBuffer<'a> {
    pub wire: WireType,
    pub data: &'a [u8],
}

impl<'a> ReadBuffer<'a> {
    /// Parses a complete wire (`tag ++ data`).
    pub fn from_wire(bytes: &'a [u8]) -> Result<Self, PoloError> {
        if bytes.is_empty() {
            return Err(PoloError::InsufficientWire);
        }
        let (tag, consumed) = read_varint(bytes)?;
        Ok(ReadBuffer {
            wire: WireType::from_tag(tag)?,
            data: &bytes[consumed..],
        })
    }

    /// Splits the load of a pack or document into its elements.
    pub fn unpack(&self) -> Result<Vec<ReadBuffer<'a>>, PoloError> {
        if !self.wire.is_compound() {
            return Err(PoloError::UnexpectedWire {
                expected: "pack or document",
                found: self.wire,
            });
        }
        read_load(self.data)
    }
}

/// Encodes `entries` as a load: `varint(len(head) << 4 | load) ++ head ++ body`.
pub fn write_load(entries: &[(WireType, Vec<u8>)]) -> Vec<u8> {
    let mut head = Vec::new();
    let mut body = Vec::new();
    for (wire, data) in entries {
        write_varint(&mut head, ((body.len() as u64) << 4) | *wire as u64);
        body.extend_from_slice(data);
    }
    let mut out = Vec::with_capacity(head.len() + body.len() + 2);
    write_varint(&mut out, ((head.len() as u64) << 4) | WireType::Load as u64);
    out.extend_from_slice(&head);
    out.extend_from_slice(&body);
    out
}

pub fn read_load(bytes: &[u8]) -> Result<Vec<ReadBuffer<'_>>, PoloError> {
    let (tag, consumed) = read_varint(bytes)?;
    if WireType::from_tag(tag)? != WireType::Load {
        return Err(PoloError::MalformedLoad("missing load tag".into()));
    }
    let head_len = usize::try_from(tag >> 4)
        .map_err(|_| PoloError::MalformedLoad("head length overflow".into()))?;
    let rest = &bytes[consumed..];
    if head_len > rest.len() {
        return Err(PoloError::MalformedLoad(format!(
            "head length {head_len} exceeds load of {} bytes",
            rest.len()
        )));
    }
    let (mut head, body) = rest.split_at(head_len);

    let mut marks = Vec::new();
    while !head.is_empty() {
        let (entry, used) = read_varint(head)?;
        head = &head[used..];
        let offset = usize::try_from(entry >> 4)
            .map_err(|_| PoloError::MalformedLoad("offset overflow".into()))?;
        marks.push((offset, WireType::from_tag(entry)?));
    }

    let mut out = Vec::with_capacity(marks.len());
    for (idx, (start, wire)) in marks.iter().enumerate() {
        let end = marks.get(idx + 1).map_or(body.len(), |(next, _)| *next);
        if *start > end || end > body.len() {
            return Err(PoloError::MalformedLoad(format!(
                "element {idx} spans {start}..{end} outside body of {} bytes",
                body.len()
            )));
        }
        out.push(ReadBuffer {
            wire: *wire,
            data: &body[*start..end],
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_round_trip() {
        for value in [0u64, 1, 127, 128, 300, 16_384, u64::MAX] {
            let mut buf = Vec::new();
            write_varint(&mut buf, value);
            assert_eq!(read_varint(&buf).expect("varint"), (value, buf.len()));
        }
        assert!(read_varint(&[0x80, 0x80]).is_err());
    }

    #[test]
    fn load_layout_matches_offsets() {
        let load = write_load(&[
            (WireType::PosInt, vec![0x05, 0xf5, 0xe1, 0x00]),
            (WireType::Word, b"ok".to_vec()),
        ]);
        // head: 0x03 (offset 0, posint), 0x46 (offset 4, word)
        assert_eq!(load, vec![0x2f, 0x03, 0x46, 0x05, 0xf5, 0xe1, 0x00, b'o', b'k']);
        let elements = read_load(&load).expect("load");
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[1].wire, WireType::Word);
        assert_eq!(elements[1].data, b"ok");
    }

    #[test]
    fn empty_load_has_no_elements() {
        assert_eq!(write_load(&[]), vec![0x0f]);
        assert!(read_load(&[0x0f]).expect("load").is_empty());
    }
}
