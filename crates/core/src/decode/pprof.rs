//! Decodes a binary pprof profile (`perftools.profiles.Profile`) into
//! [`Profile`](super::model::Profile).
//!
//! Field numbers follow the public `profile.proto` schema:
//!
//! ```text
//! message Profile {
//!   repeated ValueType sample_type = 1;
//!   repeated Sample    sample      = 2;
//!   repeated Mapping   mapping     = 3;  // skipped, not needed by the core
//!   repeated Location  location    = 4;
//!   repeated Function  function    = 5;
//!   repeated bytes     string_table = 6;
//!   int64 time_nanos     = 9;
//!   int64 duration_nanos = 10;
//!   ValueType period_type = 11;          // skipped
//!   int64 period          = 12;
//! }
//! ```

use super::model::{Function, Line, Location, Profile, Sample, SampleType, StringTable};
use super::wire::{read_repeated_varint, DecodeError, Reader, WireType};

pub fn decode_profile(bytes: &[u8]) -> Result<Profile, DecodeError> {
    let mut reader = Reader::new(bytes);
    let mut profile = Profile::default();

    while !reader.is_empty() {
        let (field, wire_type) = reader.read_tag()?;
        match field {
            1 => profile.sample_types.push(decode_value_type(&mut reader)?),
            2 => profile.samples.push(decode_sample(&mut reader)?),
            4 => profile.locations.push(decode_location(&mut reader)?),
            5 => profile.functions.push(decode_function(&mut reader)?),
            6 => {
                let bytes = reader.read_bytes()?;
                profile
                    .string_table
                    .0
                    .push(String::from_utf8_lossy(bytes).into_owned());
            }
            9 => profile.time_nanos = reader.read_varint()? as i64,
            10 => profile.duration_nanos = reader.read_varint()? as i64,
            12 => profile.period = reader.read_varint()? as i64,
            _ => reader.skip_field(wire_type)?,
        }
    }

    if profile.string_table.0.is_empty() {
        profile.string_table = StringTable(vec![String::new()]);
    }

    Ok(profile)
}

fn decode_value_type(outer: &mut Reader<'_>) -> Result<SampleType, DecodeError> {
    let bytes = outer.read_bytes()?;
    let mut reader = Reader::new(bytes);
    let mut value_type = SampleType::default();
    while !reader.is_empty() {
        let (field, wire_type) = reader.read_tag()?;
        match field {
            1 => value_type.type_idx = reader.read_varint()?,
            2 => value_type.unit_idx = reader.read_varint()?,
            _ => reader.skip_field(wire_type)?,
        }
    }
    Ok(value_type)
}

fn decode_sample(outer: &mut Reader<'_>) -> Result<Sample, DecodeError> {
    let bytes = outer.read_bytes()?;
    let mut reader = Reader::new(bytes);
    let mut sample = Sample::default();
    while !reader.is_empty() {
        let (field, wire_type) = reader.read_tag()?;
        match field {
            1 => read_repeated_varint(&mut reader, wire_type, &mut sample.location_ids)?,
            2 => {
                let mut values = Vec::new();
                read_repeated_varint(&mut reader, wire_type, &mut values)?;
                sample.values.extend(values.into_iter().map(|v| v as i64));
            }
            _ => reader.skip_field(wire_type)?,
        }
    }
    Ok(sample)
}

fn decode_location(outer: &mut Reader<'_>) -> Result<Location, DecodeError> {
    let bytes = outer.read_bytes()?;
    let mut reader = Reader::new(bytes);
    let mut location = Location::default();
    while !reader.is_empty() {
        let (field, wire_type) = reader.read_tag()?;
        match field {
            1 => location.id = reader.read_varint()?,
            4 => location.lines.push(decode_line(&mut reader)?),
            _ => reader.skip_field(wire_type)?,
        }
    }
    Ok(location)
}

fn decode_line(outer: &mut Reader<'_>) -> Result<Line, DecodeError> {
    let bytes = outer.read_bytes()?;
    let mut reader = Reader::new(bytes);
    let mut line = Line::default();
    while !reader.is_empty() {
        let (field, wire_type) = reader.read_tag()?;
        match field {
            1 => line.function_id = reader.read_varint()?,
            2 => line.line = reader.read_varint()? as i64,
            _ => reader.skip_field(wire_type)?,
        }
    }
    Ok(line)
}

fn decode_function(outer: &mut Reader<'_>) -> Result<Function, DecodeError> {
    let bytes = outer.read_bytes()?;
    let mut reader = Reader::new(bytes);
    let mut function = Function::default();
    while !reader.is_empty() {
        let (field, wire_type) = reader.read_tag()?;
        match field {
            1 => function.id = reader.read_varint()?,
            2 => function.name_idx = reader.read_varint()?,
            4 => function.filename_idx = reader.read_varint()?,
            5 => function.start_line = reader.read_varint()? as i64,
            _ => reader.skip_field(wire_type)?,
        }
    }
    Ok(function)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-encode a minimal valid profile: one string table, one sample
    /// type, one function/location, one sample.
    fn encode_varint(buf: &mut Vec<u8>, mut v: u64) {
        loop {
            let mut byte = (v & 0x7f) as u8;
            v >>= 7;
            if v != 0 {
                byte |= 0x80;
            }
            buf.push(byte);
            if v == 0 {
                break;
            }
        }
    }

    fn tag(buf: &mut Vec<u8>, field: u64, wire_type: u64) {
        encode_varint(buf, (field << 3) | wire_type);
    }

    fn length_delimited(buf: &mut Vec<u8>, field: u64, payload: &[u8]) {
        tag(buf, field, 2);
        encode_varint(buf, payload.len() as u64);
        buf.extend_from_slice(payload);
    }

    fn string_field(field: u64, s: &str) -> Vec<u8> {
        let mut out = Vec::new();
        length_delimited(&mut out, field, s.as_bytes());
        out
    }

    #[test]
    fn decodes_strings_functions_locations_samples() {
        let mut buf = Vec::new();

        for s in ["", "cpu", "nanoseconds", "main", "work"] {
            buf.extend(string_field(6, s));
        }

        // sample_type { type: 1, unit: 2 }
        let mut value_type = Vec::new();
        tag(&mut value_type, 1, 0);
        encode_varint(&mut value_type, 1);
        tag(&mut value_type, 2, 0);
        encode_varint(&mut value_type, 2);
        length_delimited(&mut buf, 1, &value_type);

        // function { id: 1, name: 3 (main) }
        let mut f1 = Vec::new();
        tag(&mut f1, 1, 0);
        encode_varint(&mut f1, 1);
        tag(&mut f1, 2, 0);
        encode_varint(&mut f1, 3);
        length_delimited(&mut buf, 5, &f1);

        // function { id: 2, name: 4 (work) }
        let mut f2 = Vec::new();
        tag(&mut f2, 1, 0);
        encode_varint(&mut f2, 2);
        tag(&mut f2, 2, 0);
        encode_varint(&mut f2, 4);
        length_delimited(&mut buf, 5, &f2);

        // location { id: 1, line: { function_id: 1 } }
        let mut line1 = Vec::new();
        tag(&mut line1, 1, 0);
        encode_varint(&mut line1, 1);
        let mut loc1 = Vec::new();
        tag(&mut loc1, 1, 0);
        encode_varint(&mut loc1, 1);
        length_delimited(&mut loc1, 4, &line1);
        length_delimited(&mut buf, 4, &loc1);

        // location { id: 2, line: { function_id: 2 } }
        let mut line2 = Vec::new();
        tag(&mut line2, 1, 0);
        encode_varint(&mut line2, 2);
        let mut loc2 = Vec::new();
        tag(&mut loc2, 1, 0);
        encode_varint(&mut loc2, 2);
        length_delimited(&mut loc2, 4, &line2);
        length_delimited(&mut buf, 4, &loc2);

        // sample { location_id: [2, 1] (leaf-first: work, main), value: [10] }
        let mut sample = Vec::new();
        let mut loc_ids = Vec::new();
        encode_varint(&mut loc_ids, 2);
        encode_varint(&mut loc_ids, 1);
        length_delimited(&mut sample, 1, &loc_ids);
        let mut values = Vec::new();
        encode_varint(&mut values, 10);
        length_delimited(&mut sample, 2, &values);
        length_delimited(&mut buf, 2, &sample);

        // time_nanos = 12345
        tag(&mut buf, 9, 0);
        encode_varint(&mut buf, 12345);

        let profile = decode_profile(&buf).unwrap();
        assert_eq!(profile.string_table.0, vec!["", "cpu", "nanoseconds", "main", "work"]);
        assert_eq!(profile.sample_types.len(), 1);
        assert_eq!(profile.functions.len(), 2);
        assert_eq!(profile.locations.len(), 2);
        assert_eq!(profile.samples.len(), 1);
        assert_eq!(profile.samples[0].location_ids, vec![2, 1]);
        assert_eq!(profile.samples[0].values, vec![10]);
        assert_eq!(profile.time_nanos, 12345);
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let mut buf = Vec::new();
        // field 99, wire type 0 (varint) — not a field we know about.
        tag(&mut buf, 99, 0);
        encode_varint(&mut buf, 42);
        // field 7 (drop_frames, int64) — also not retained.
        tag(&mut buf, 7, 0);
        encode_varint(&mut buf, 1);
        let profile = decode_profile(&buf).unwrap();
        assert!(profile.samples.is_empty());
    }

    #[test]
    fn truncated_input_is_an_error() {
        let mut buf = Vec::new();
        tag(&mut buf, 6, 2);
        // Claim a length far larger than the remaining bytes.
        encode_varint(&mut buf, 1000);
        buf.push(b'x');
        assert!(decode_profile(&buf).is_err());
    }

    #[test]
    fn packed_varint_values_decode() {
        // Build a Sample with packed location_id/value fields only.
        let mut sample = Vec::new();
        let mut loc_ids = Vec::new();
        encode_varint(&mut loc_ids, 5);
        encode_varint(&mut loc_ids, 6);
        encode_varint(&mut loc_ids, 7);
        length_delimited(&mut sample, 1, &loc_ids);
        let mut values = Vec::new();
        encode_varint(&mut values, 100);
        length_delimited(&mut sample, 2, &values);

        let mut buf = Vec::new();
        length_delimited(&mut buf, 2, &sample);

        let profile = decode_profile(&buf).unwrap();
        assert_eq!(profile.samples[0].location_ids, vec![5, 6, 7]);
        assert_eq!(profile.samples[0].values, vec![100]);
    }
}
