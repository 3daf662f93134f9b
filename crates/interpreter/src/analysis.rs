use crate::opcode;

/// Padding appended to the code so that the dispatch loop needs no bounds
/// check (execution always lands on a STOP) and a trailing PUSH reads its
/// missing immediate bytes as zeros. 32 bytes of PUSH data plus the final
/// STOP.
const CODE_PADDING: usize = 33;

/// Pre-execution view of a contract's code: the padded buffer the dispatch
/// loop reads from, and the set of valid jump destinations.
#[derive(Debug, Clone)]
pub struct CodeAnalysis {
    padded_code: Box<[u8]>,
    jumpdest_map: Vec<bool>,
}

/// Single left-to-right scan of the code. PUSH immediates are skipped, so a
/// 0x5b byte inside push data is not a destination.
pub fn analyze(code: &[u8]) -> CodeAnalysis {
    let mut jumpdest_map = vec![false; code.len()];
    let mut i = 0;
    while i < code.len() {
        let op = code[i];
        if opcode::is_push(op) {
            i += opcode::push_data_len(op);
        } else if op == opcode::JUMPDEST {
            jumpdest_map[i] = true;
        }
        i += 1;
    }

    // STOP is 0x00, so the padding also serves as PUSH zero-fill.
    let mut padded_code = vec![opcode::STOP; code.len() + CODE_PADDING];
    padded_code[..code.len()].copy_from_slice(code);

    CodeAnalysis {
        padded_code: padded_code.into_boxed_slice(),
        jumpdest_map,
    }
}

impl CodeAnalysis {
    pub fn padded_code(&self) -> &[u8] {
        &self.padded_code
    }

    /// Length of the original, unpadded code.
    pub fn code_size(&self) -> usize {
        self.jumpdest_map.len()
    }

    /// Whether `offset` is a valid jump destination. Offsets at or past the
    /// end of the original code are not.
    pub fn is_jumpdest(&self, offset: usize) -> bool {
        self.jumpdest_map.get(offset).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jumpdests(analysis: &CodeAnalysis) -> Vec<usize> {
        (0..analysis.code_size())
            .filter(|&i| analysis.is_jumpdest(i))
            .collect()
    }

    #[test]
    fn test_empty_code() {
        let analysis = analyze(&[]);
        assert_eq!(analysis.code_size(), 0);
        assert_eq!(analysis.padded_code().len(), CODE_PADDING);
        assert!(analysis.padded_code().iter().all(|&b| b == opcode::STOP));
        assert!(!analysis.is_jumpdest(0));
    }

    #[test]
    fn test_plain_jumpdest() {
        // JUMPDEST, STOP, JUMPDEST
        let analysis = analyze(&[0x5b, 0x00, 0x5b]);
        assert_eq!(jumpdests(&analysis), vec![0, 2]);
    }

    #[test]
    fn test_jumpdest_inside_push_data_is_skipped() {
        // PUSH2 0x5b 0x5b, JUMPDEST
        let analysis = analyze(&[0x61, 0x5b, 0x5b, 0x5b]);
        assert_eq!(jumpdests(&analysis), vec![3]);
    }

    #[test]
    fn test_truncated_trailing_push() {
        // PUSH32 with only one immediate byte present.
        let code = [0x7f, 0x5b];
        let analysis = analyze(&code);
        assert_eq!(jumpdests(&analysis), Vec::<usize>::new());
        // Reads of the missing immediate land in zero padding.
        assert_eq!(analysis.padded_code()[1], 0x5b);
        for k in 0..=32 {
            assert_eq!(analysis.padded_code()[code.len() + k], opcode::STOP);
        }
    }

    #[test]
    fn test_padding_invariant() {
        let code = [0x60, 0x01, 0x00];
        let analysis = analyze(&code);
        for k in 0..=32 {
            assert_eq!(analysis.padded_code()[code.len() + k], opcode::STOP);
        }
    }

    #[test]
    fn test_queries_beyond_code_size() {
        let analysis = analyze(&[0x5b]);
        assert!(analysis.is_jumpdest(0));
        assert!(!analysis.is_jumpdest(1));
        assert!(!analysis.is_jumpdest(usize::MAX));
    }

    #[test]
    fn test_reanalyzing_padded_code_is_stable() {
        // The padding must not introduce or drop jump destinations.
        let samples: [&[u8]; 4] = [
            &[0x5b, 0x60, 0x5b, 0x5b, 0x00],
            &[0x7f, 0x5b],
            &[0x61, 0x5b],
            &[0x5b; 64],
        ];
        for code in samples {
            let first = analyze(code);
            let second = analyze(first.padded_code());
            for i in 0..second.code_size() {
                assert_eq!(
                    first.is_jumpdest(i),
                    second.is_jumpdest(i),
                    "mismatch at offset {i}"
                );
            }
        }
    }
}
