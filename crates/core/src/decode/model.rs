//! Typed in-memory model produced by the pprof decoder (spec §3/§4.1).

/// Ordered sequence of byte strings, index 0 conventionally empty.
#[derive(Debug, Clone, Default)]
pub struct StringTable(pub Vec<String>);

impl StringTable {
    pub fn get(&self, idx: u64) -> Option<&str> {
        self.0.get(idx as usize).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Function {
    pub id: u64,
    pub name_idx: u64,
    pub filename_idx: u64,
    pub start_line: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Line {
    pub function_id: u64,
    pub line: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Location {
    pub id: u64,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, Default)]
pub struct Sample {
    /// Leaf-to-root, as encoded on the wire.
    pub location_ids: Vec<u64>,
    pub values: Vec<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct SampleType {
    pub type_idx: u64,
    pub unit_idx: u64,
}

/// Output of the pprof decoder: a typed record of everything the core
/// needs, with unknown/unused fields (mappings, labels, comments) already
/// discarded during decode.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub string_table: StringTable,
    pub sample_types: Vec<SampleType>,
    pub samples: Vec<Sample>,
    pub locations: Vec<Location>,
    pub functions: Vec<Function>,
    pub time_nanos: i64,
    pub duration_nanos: i64,
    pub period: i64,
}

impl Profile {
    pub fn string(&self, idx: u64) -> &str {
        self.string_table.get(idx).unwrap_or("")
    }
}
