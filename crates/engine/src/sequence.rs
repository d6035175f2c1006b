// NDB - Neo Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Mapping instruction addresses back to source code.
//!
//! Two lookups feed a source location: the method whose address range
//! contains the instruction pointer, then the sequence point of that method
//! active at the pointer.

use std::path::Path;

use ndb_common::{DebugInfo, Method, ScriptHash, SequencePoint};
use thiserror::Error;
use tracing::warn;

/// Errors raised while resolving an address to a method
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// More than one method range of the script contains the address
    #[error("address {address} of {script_hash} lies in several methods: {}", .candidates.join(", "))]
    AmbiguousMethod {
        /// Script being resolved
        script_hash: ScriptHash,
        /// Instruction address
        address: usize,
        /// Identifiers of every matching method
        candidates: Vec<String>,
    },
}

/// Find the sequence point active at `ip`.
///
/// `points` must be ascending by address. An exact match wins; an address at
/// or before the first point maps to the first point; otherwise the point
/// whose address is the greatest one strictly below `ip` is returned, as long
/// as a following point exists at or above `ip`. Past the last point there is
/// no active point.
pub fn resolve_sequence_point(points: &[SequencePoint], ip: usize) -> Option<&SequencePoint> {
    if let Some(exact) = points.iter().find(|sp| sp.address == ip) {
        return Some(exact);
    }

    let first = points.first()?;
    if ip <= first.address {
        return Some(first);
    }

    points
        .windows(2)
        .find(|pair| ip > pair[0].address && ip <= pair[1].address)
        .map(|pair| &pair[0])
}

/// Find the single method of `script_hash` whose range contains `ip`
pub fn resolve_method<'a, I>(
    methods: I,
    script_hash: &ScriptHash,
    ip: usize,
) -> Result<Option<&'a Method>, SequenceError>
where
    I: IntoIterator<Item = &'a Method>,
{
    let mut matches =
        methods.into_iter().filter(|m| &m.script_hash == script_hash && m.contains(ip));

    let Some(found) = matches.next() else {
        return Ok(None);
    };

    let rest: Vec<_> = matches.collect();
    if rest.is_empty() {
        return Ok(Some(found));
    }

    let candidates = std::iter::once(found).chain(rest).map(|m| m.id.clone()).collect();
    Err(SequenceError::AmbiguousMethod { script_hash: *script_hash, address: ip, candidates })
}

/// Source-level position of an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation<'a> {
    /// Method containing the instruction
    pub method: &'a Method,
    /// Active sequence point, `None` when the method has none covering the address
    pub sequence_point: Option<&'a SequencePoint>,
    /// Document of the sequence point
    pub document: Option<&'a Path>,
}

/// Address resolution over contract debug information
pub trait SourceResolver {
    /// Method of this contract containing `ip`
    fn method_at(&self, ip: usize) -> Result<Option<&Method>, SequenceError>;

    /// Method and sequence point active at `ip`
    fn source_location(&self, ip: usize) -> Result<Option<SourceLocation<'_>>, SequenceError>;
}

impl SourceResolver for DebugInfo {
    fn method_at(&self, ip: usize) -> Result<Option<&Method>, SequenceError> {
        resolve_method(&self.methods, &self.script_hash, ip)
    }

    fn source_location(&self, ip: usize) -> Result<Option<SourceLocation<'_>>, SequenceError> {
        let Some(method) = self.method_at(ip)? else {
            return Ok(None);
        };
        let sequence_point = resolve_sequence_point(&method.sequence_points, ip);
        if sequence_point.is_none() {
            warn!(method = %method.qualified_name(), ip, "No sequence point covers address");
        }
        let document = sequence_point.and_then(|sp| self.document(sp));
        Ok(Some(SourceLocation { method, sequence_point, document }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndb_common::SourcePosition;

    fn point(address: usize) -> SequencePoint {
        let pos = SourcePosition { line: address as u32, column: 1 };
        SequencePoint { address, document: 0, start: pos, end: pos }
    }

    fn method(id: &str, start: usize, end: usize, script_hash: ScriptHash) -> Method {
        Method {
            id: id.to_string(),
            namespace: "Contract".to_string(),
            name: id.to_string(),
            start,
            end,
            parameters: vec![],
            variables: vec![],
            return_type: None,
            sequence_points: vec![point(start)],
            script_hash,
        }
    }

    #[test]
    fn test_exact_match() {
        let points = [point(2), point(5), point(9)];
        assert_eq!(resolve_sequence_point(&points, 5).unwrap().address, 5);
    }

    #[test]
    fn test_before_first_maps_to_first() {
        let points = [point(2), point(5)];
        assert_eq!(resolve_sequence_point(&points, 0).unwrap().address, 2);
        assert_eq!(resolve_sequence_point(&points, 2).unwrap().address, 2);
    }

    #[test]
    fn test_between_points_maps_to_lower() {
        let points = [point(2), point(5), point(9)];
        assert_eq!(resolve_sequence_point(&points, 3).unwrap().address, 2);
        assert_eq!(resolve_sequence_point(&points, 6).unwrap().address, 5);
        assert_eq!(resolve_sequence_point(&points, 8).unwrap().address, 5);
    }

    #[test]
    fn test_past_last_point_is_none() {
        let points = [point(2), point(5)];
        assert!(resolve_sequence_point(&points, 6).is_none());
        assert!(resolve_sequence_point(&[], 0).is_none());
    }

    #[test]
    fn test_every_address_of_property() {
        let points: Vec<_> = [0usize, 4, 7, 15].into_iter().map(point).collect();
        for ip in 0..=20 {
            let resolved = resolve_sequence_point(&points, ip).map(|sp| sp.address);
            let expected = match ip {
                0 | 4 | 7 | 15 => Some(ip),
                1..=3 => Some(0),
                5..=6 => Some(4),
                8..=14 => Some(7),
                _ => None,
            };
            assert_eq!(resolved, expected, "ip = {ip}");
        }
    }

    #[test]
    fn test_resolve_method_by_range_and_script() {
        let ours = ScriptHash::new([1; 20]);
        let theirs = ScriptHash::new([2; 20]);
        let methods =
            vec![method("a", 0, 9, ours), method("b", 10, 20, ours), method("c", 0, 20, theirs)];

        assert_eq!(resolve_method(&methods, &ours, 10).unwrap().unwrap().id, "b");
        assert_eq!(resolve_method(&methods, &ours, 9).unwrap().unwrap().id, "a");
        assert!(resolve_method(&methods, &ours, 21).unwrap().is_none());
        assert_eq!(resolve_method(&methods, &theirs, 5).unwrap().unwrap().id, "c");
    }

    #[test]
    fn test_overlapping_ranges_are_ambiguous() {
        let hash = ScriptHash::new([1; 20]);
        let methods = vec![method("a", 0, 10, hash), method("b", 5, 20, hash)];
        let err = resolve_method(&methods, &hash, 7).unwrap_err();
        assert_eq!(
            err,
            SequenceError::AmbiguousMethod {
                script_hash: hash,
                address: 7,
                candidates: vec!["a".to_string(), "b".to_string()]
            }
        );
        assert_eq!(resolve_method(&methods, &hash, 2).unwrap().unwrap().id, "a");
    }

    #[test]
    fn test_source_location() {
        let hash = ScriptHash::new([3; 20]);
        let mut m = method("main", 0, 30, hash);
        m.sequence_points = vec![point(0), point(12)];
        let info = DebugInfo {
            script_hash: hash,
            entrypoint: "main".to_string(),
            documents: vec!["a.cs".into()],
            methods: vec![m],
        };

        let location = info.source_location(5).unwrap().unwrap();
        assert_eq!(location.method.id, "main");
        assert_eq!(location.sequence_point.unwrap().address, 0);
        assert_eq!(location.document, Some(Path::new("a.cs")));

        let past = info.source_location(20).unwrap().unwrap();
        assert!(past.sequence_point.is_none());
        assert!(past.document.is_none());

        assert!(info.source_location(31).unwrap().is_none());
    }
}
