//! Component B: profile metadata classifier.
//!
//! Decides whether a decoded profile is a CPU or heap profile, which
//! `sample_types` column to read values from, and the scale factor that
//! normalizes that column's unit to nanoseconds (CPU) or bytes (heap).

use crate::decode::Profile;

const SKIP_TYPES: &[&str] = &["samples", "objects", "alloc_objects", "inuse_objects"];
const CPU_TYPES: &[&str] = &["wall", "cpu", "time"];
const HEAP_TYPES: &[&str] = &["space", "alloc_space", "inuse_space"];

/// A CPU profile's sample-type unit, normalized to nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Ns,
    Us,
    Ms,
    S,
}

impl TimeUnit {
    /// Multiply a raw sample value by this to get nanoseconds.
    pub fn scale_to_nanos(self) -> f64 {
        match self {
            TimeUnit::Ns => 1.0,
            TimeUnit::Us => 1_000.0,
            TimeUnit::Ms => 1_000_000.0,
            TimeUnit::S => 1_000_000_000.0,
        }
    }
}

/// A heap profile's sample-type unit, normalized to bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    B,
    Kb,
    Mb,
    Gb,
}

impl SizeUnit {
    /// Multiply a raw sample value by this to get bytes.
    pub fn scale_to_bytes(self) -> f64 {
        match self {
            SizeUnit::B => 1.0,
            SizeUnit::Kb => 1024.0,
            SizeUnit::Mb => 1024.0 * 1024.0,
            SizeUnit::Gb => 1024.0 * 1024.0 * 1024.0,
        }
    }
}

/// Sum-typed so a `Cpu` kind can never be paired with a `SizeUnit` (or a
/// `Heap` kind with a `TimeUnit`) at runtime — formatters switch on this
/// one value instead of pairing a bare `kind` against a separately-held
/// unit that could drift out of sync with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Cpu(TimeUnit),
    Heap(SizeUnit),
    Unknown,
}

/// Result of classification: which kind of profile this is (carrying its
/// unit), which `sample_types` column to read, and the scale factor to
/// normalize that column's unit to the kind's base unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileMetadata {
    pub kind: ProfileKind,
    pub value_column: usize,
    /// Multiply raw sample values by this to get nanoseconds (CPU) or
    /// bytes (heap). 1.0 for unknown profiles. Always `kind`'s own unit
    /// scale — kept alongside `kind` since callers that just want to fold
    /// values (`tree::build_tree`) don't need to match on the unit.
    pub scale: f64,
}

pub fn classify(profile: &Profile) -> ProfileMetadata {
    let candidates: Vec<(usize, &str, &str)> = profile
        .sample_types
        .iter()
        .enumerate()
        .map(|(idx, st)| (idx, profile.string(st.type_idx), profile.string(st.unit_idx)))
        .collect();

    let filtered: Vec<_> = candidates
        .iter()
        .filter(|(_, ty, _)| !SKIP_TYPES.contains(ty))
        .collect();
    let pool: &[&(usize, &str, &str)] = if filtered.is_empty() {
        // None remain after skipping: fall back to considering every
        // column, including the normally-skipped count types.
        &[]
    } else {
        &filtered
    };

    let chosen = if pool.is_empty() {
        candidates.first()
    } else {
        pool.first().copied()
    };

    let Some(&(idx, ty, unit)) = chosen else {
        return ProfileMetadata {
            kind: ProfileKind::Unknown,
            value_column: 0,
            scale: 1.0,
        };
    };

    if CPU_TYPES.contains(&ty) {
        let unit = parse_time_unit(unit);
        ProfileMetadata {
            kind: ProfileKind::Cpu(unit),
            value_column: idx,
            scale: unit.scale_to_nanos(),
        }
    } else if HEAP_TYPES.contains(&ty) {
        let unit = parse_size_unit(unit);
        ProfileMetadata {
            kind: ProfileKind::Heap(unit),
            value_column: idx,
            scale: unit.scale_to_bytes(),
        }
    } else {
        ProfileMetadata {
            kind: ProfileKind::Unknown,
            value_column: idx,
            scale: 1.0,
        }
    }
}

fn parse_time_unit(unit: &str) -> TimeUnit {
    let unit = unit.to_ascii_lowercase();
    if unit.contains("nanosecond") || unit == "ns" {
        TimeUnit::Ns
    } else if unit.contains("microsecond") || unit == "us" || unit == "µs" {
        TimeUnit::Us
    } else if unit.contains("millisecond") || unit == "ms" {
        TimeUnit::Ms
    } else if unit.contains("second") || unit == "s" {
        TimeUnit::S
    } else {
        TimeUnit::Ns
    }
}

fn parse_size_unit(unit: &str) -> SizeUnit {
    let unit = unit.to_ascii_lowercase();
    if unit.contains("byte") && !unit.contains("kb") && !unit.contains("mb") && !unit.contains("gb")
    {
        SizeUnit::B
    } else if unit.contains("kb") {
        SizeUnit::Kb
    } else if unit.contains("mb") {
        SizeUnit::Mb
    } else if unit.contains("gb") {
        SizeUnit::Gb
    } else {
        SizeUnit::B
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{Profile, SampleType, StringTable};

    fn profile_with_types(types: &[(&str, &str)]) -> Profile {
        let mut strings = vec![String::new()];
        let mut sample_types = Vec::new();
        for (ty, unit) in types {
            let type_idx = strings.len() as u64;
            strings.push((*ty).to_string());
            let unit_idx = strings.len() as u64;
            strings.push((*unit).to_string());
            sample_types.push(SampleType { type_idx, unit_idx });
        }
        Profile {
            string_table: StringTable(strings),
            sample_types,
            ..Default::default()
        }
    }

    #[test]
    fn cpu_profile_picks_wall_time_in_nanoseconds() {
        let profile = profile_with_types(&[("samples", "count"), ("wall", "nanoseconds")]);
        let meta = classify(&profile);
        assert_eq!(meta.kind, ProfileKind::Cpu(TimeUnit::Ns));
        assert_eq!(meta.value_column, 1);
        assert_eq!(meta.scale, 1.0);
    }

    #[test]
    fn cpu_profile_scales_microseconds_to_nanos() {
        let profile = profile_with_types(&[("cpu", "microseconds")]);
        let meta = classify(&profile);
        assert_eq!(meta.kind, ProfileKind::Cpu(TimeUnit::Us));
        assert_eq!(meta.scale, 1_000.0);
    }

    #[test]
    fn heap_profile_picks_inuse_space_and_scales_kb() {
        let profile = profile_with_types(&[("inuse_objects", "count"), ("inuse_space", "kB")]);
        let meta = classify(&profile);
        assert_eq!(meta.kind, ProfileKind::Heap(SizeUnit::Kb));
        assert_eq!(meta.value_column, 1);
        assert_eq!(meta.scale, 1024.0);
    }

    #[test]
    fn unknown_when_no_recognized_type_remains() {
        let profile = profile_with_types(&[("goroutine", "count")]);
        let meta = classify(&profile);
        assert_eq!(meta.kind, ProfileKind::Unknown);
        assert_eq!(meta.scale, 1.0);
    }

    #[test]
    fn falls_back_to_skip_list_when_nothing_remains() {
        let profile = profile_with_types(&[("samples", "count"), ("objects", "count")]);
        let meta = classify(&profile);
        // Only skip-listed types present: nothing remains after filtering,
        // so the classifier falls back to the first column.
        assert_eq!(meta.value_column, 0);
    }

    #[test]
    fn empty_profile_is_unknown() {
        let profile = Profile::default();
        let meta = classify(&profile);
        assert_eq!(meta.kind, ProfileKind::Unknown);
        assert_eq!(meta.value_column, 0);
    }
}
