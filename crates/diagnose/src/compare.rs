//! The Round-Trip Comparator (spec section 4.8): a diagnostic that
//! compares two buffers (or their decoded `ScriptState`s) and reports the
//! first point at which they diverge.

use std::fmt;

use gdsc_core::revision::RevisionDescriptor;
use gdsc_core::state::ScriptState;
use gdsc_core::token::GlobalToken;
use gdsc_core::variant::VariantCodec;

/// A single divergent token, named by both sides' global token and payload
/// (spec section 4.8: "for each divergent token, the global-token names on
/// both sides and their payloads").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDivergence {
    pub index: usize,
    pub left: Option<(GlobalToken, u32)>,
    pub right: Option<(GlobalToken, u32)>,
}

/// The outcome of [`compare`]. Fields are populated in the order spec
/// section 4.8 enumerates them; `None` means "no divergence found in this
/// dimension".
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub raw_bytes_match: bool,
    pub decompressed_bodies_match: Option<bool>,
    pub first_identifier_divergence: Option<usize>,
    pub first_constant_divergence: Option<usize>,
    pub first_token_divergence: Option<TokenDivergence>,
    pub first_line_map_divergence: Option<u32>,
    pub first_column_map_divergence: Option<u32>,
    pub first_end_line_map_divergence: Option<u32>,
}

impl Report {
    pub fn is_identical(&self) -> bool {
        self.raw_bytes_match
            && self.decompressed_bodies_match.unwrap_or(true)
            && self.first_identifier_divergence.is_none()
            && self.first_constant_divergence.is_none()
            && self.first_token_divergence.is_none()
            && self.first_line_map_divergence.is_none()
            && self.first_column_map_divergence.is_none()
            && self.first_end_line_map_divergence.is_none()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identical() {
            return writeln!(f, "buffers are identical");
        }
        writeln!(f, "raw bytes match: {}", self.raw_bytes_match)?;
        if let Some(bodies_match) = self.decompressed_bodies_match {
            writeln!(f, "decompressed bodies match: {bodies_match}")?;
        }
        if let Some(i) = self.first_identifier_divergence {
            writeln!(f, "identifier table diverges at index {i}")?;
        }
        if let Some(i) = self.first_constant_divergence {
            writeln!(f, "constant table diverges at index {i}")?;
        }
        if let Some(div) = &self.first_token_divergence {
            writeln!(
                f,
                "token stream diverges at index {}: left={:?} right={:?}",
                div.index, div.left, div.right
            )?;
        }
        if let Some(i) = self.first_line_map_divergence {
            writeln!(f, "line map diverges at token index {i}")?;
        }
        if let Some(i) = self.first_column_map_divergence {
            writeln!(f, "column map diverges at token index {i}")?;
        }
        if let Some(i) = self.first_end_line_map_divergence {
            writeln!(f, "end-line map diverges at token index {i}")?;
        }
        Ok(())
    }
}

fn first_vec_divergence<T: PartialEq>(a: &[T], b: &[T]) -> Option<usize> {
    a.iter().zip(b.iter()).position(|(x, y)| x != y).or_else(|| {
        if a.len() != b.len() {
            Some(a.len().min(b.len()))
        } else {
            None
        }
    })
}

fn first_map_divergence(a: &std::collections::BTreeMap<u32, u32>, b: &std::collections::BTreeMap<u32, u32>) -> Option<u32> {
    let mut keys: Vec<u32> = a.keys().chain(b.keys()).copied().collect();
    keys.sort_unstable();
    keys.dedup();
    keys.into_iter().find(|k| a.get(k) != b.get(k))
}

fn first_token_divergence(
    left: &ScriptState,
    right: &ScriptState,
    revision: &RevisionDescriptor,
) -> Option<TokenDivergence> {
    let max_len = left.tokens.len().max(right.tokens.len());
    for i in 0..max_len {
        let l = left.tokens.get(i).map(|t| (revision.global_of(t.local_id()).unwrap_or(GlobalToken::Max), t.payload()));
        let r = right.tokens.get(i).map(|t| (revision.global_of(t.local_id()).unwrap_or(GlobalToken::Max), t.payload()));
        if l != r {
            return Some(TokenDivergence {
                index: i,
                left: l,
                right: r,
            });
        }
    }
    None
}

/// Compares two decoded states under the same revision, populating every
/// dimension of a [`Report`] except the two byte-level fields (caller owns
/// those, since only it has the raw buffers).
fn compare_states(left: &ScriptState, right: &ScriptState, revision: &RevisionDescriptor) -> Report {
    Report {
        raw_bytes_match: false, // overwritten by `compare`
        decompressed_bodies_match: None,
        first_identifier_divergence: first_vec_divergence(&left.identifiers, &right.identifiers),
        first_constant_divergence: first_vec_divergence(&left.constants, &right.constants),
        first_token_divergence: first_token_divergence(left, right, revision),
        first_line_map_divergence: first_map_divergence(&left.lines, &right.lines),
        first_column_map_divergence: first_map_divergence(&left.columns, &right.columns),
        first_end_line_map_divergence: first_map_divergence(&left.end_lines, &right.end_lines),
    }
}

/// Compares two raw buffers under `revision` (spec section 4.8's public
/// contract). Decode failures on either side are folded into a `Corrupt`-
/// flavored [`Report`] with every table marked as fully divergent, since
/// there is no decoded state left to compare dimension-by-dimension.
pub fn compare(bytes_a: &[u8], bytes_b: &[u8], revision: &RevisionDescriptor, variant_codec: &dyn VariantCodec) -> Report {
    let raw_bytes_match = bytes_a == bytes_b;

    let decoded_a = gdsc_codec::decode(bytes_a, revision, variant_codec);
    let decoded_b = gdsc_codec::decode(bytes_b, revision, variant_codec);

    match (decoded_a, decoded_b) {
        (Ok(a), Ok(b)) => {
            let mut report = compare_states(&a, &b, revision);
            report.raw_bytes_match = raw_bytes_match;
            if revision.is_v2() {
                report.decompressed_bodies_match = Some(
                    a.identifiers == b.identifiers
                        && a.constants == b.constants
                        && a.tokens == b.tokens
                        && a.lines == b.lines
                        && a.columns == b.columns,
                );
            }
            report
        }
        _ => Report {
            raw_bytes_match,
            decompressed_bodies_match: if revision.is_v2() { Some(false) } else { None },
            first_identifier_divergence: Some(0),
            first_constant_divergence: Some(0),
            first_token_divergence: Some(TokenDivergence {
                index: 0,
                left: None,
                right: None,
            }),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdsc_core::revision::RevisionFlags;
    use gdsc_core::token::EncodedToken;
    use gdsc_variant::GdscriptVariantCodec;
    use std::collections::HashMap;

    fn test_revision() -> RevisionDescriptor {
        use GlobalToken::*;
        RevisionDescriptor {
            commit_id: 1,
            engine_version_min: "3.0.0".to_string(),
            engine_version_max: None,
            bytecode_format_version: 13,
            variant_format_major: 1,
            token_table: vec![Empty, Identifier, Constant, Newline, Eof],
            function_table: vec![],
            function_arity_overrides: HashMap::new(),
            parent_commit_id: None,
            flags: RevisionFlags::empty(),
        }
    }

    #[test]
    fn identical_buffers_report_no_divergence() {
        let rev = test_revision();
        let codec = GdscriptVariantCodec;
        let mut state = ScriptState::new(13);
        state.identifiers.push("x".to_string());
        state.tokens.push(EncodedToken::from_parts(1, 0));
        let bytes = gdsc_codec::encode(&state, &rev, &codec).unwrap();
        let report = compare(&bytes, &bytes, &rev, &codec);
        assert!(report.is_identical());
    }

    #[test]
    fn differing_identifiers_are_reported() {
        let rev = test_revision();
        let codec = GdscriptVariantCodec;
        let mut a = ScriptState::new(13);
        a.identifiers.push("x".to_string());
        a.tokens.push(EncodedToken::from_parts(1, 0));
        let mut b = ScriptState::new(13);
        b.identifiers.push("y".to_string());
        b.tokens.push(EncodedToken::from_parts(1, 0));

        let bytes_a = gdsc_codec::encode(&a, &rev, &codec).unwrap();
        let bytes_b = gdsc_codec::encode(&b, &rev, &codec).unwrap();
        let report = compare(&bytes_a, &bytes_b, &rev, &codec);
        assert!(!report.raw_bytes_match);
        assert_eq!(report.first_identifier_divergence, Some(0));
    }
}
