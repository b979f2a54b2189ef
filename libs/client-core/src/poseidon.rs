//! Poseidon permutation hash
//!
//! Sponge-less Poseidon over the BN254 scalar field with S-box `x^5`.
//! A parameter set is identified by `(t, n_rounds_f, n_rounds_p)`:
//! state width, number of full rounds and number of partial rounds.
//!
//! Round constants and the MDS matrix are derived deterministically from
//! the seed `"poseidon"`: each constant is the next BLAKE2b-256 digest in
//! a chain starting at the seed, read little-endian and reduced modulo `p`
//! (`"poseidon_constants"` for round constants, `"poseidon_matrix_0000"`
//! for the Cauchy matrix `M[i][j] = 1 / (c[i] - c[t + j])`).

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::field::FieldElement;

type Blake2b256 = Blake2b<U32>;

const SEED: &str = "poseidon";

/// Poseidon parameter errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoseidonError {
    #[error("invalid parameters t={t} rounds_f={rounds_f} rounds_p={rounds_p}")]
    InvalidParams { t: usize, rounds_f: usize, rounds_p: usize },

    #[error("{inputs} inputs do not fit state width {t}")]
    TooManyInputs { inputs: usize, t: usize },

    #[error("empty input vector")]
    EmptyInput,

    #[error("degenerate matrix seed")]
    DegenerateMatrix,
}

/// `(t, n_rounds_f, n_rounds_p)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashParams {
    pub t: usize,
    pub rounds_f: usize,
    pub rounds_p: usize,
}

impl HashParams {
    pub const fn new(t: usize, rounds_f: usize, rounds_p: usize) -> Self {
        Self { t, rounds_f, rounds_p }
    }
}

/// Expanded constants for one parameter set.
#[derive(Debug, Clone)]
pub struct Poseidon {
    params: HashParams,
    round_constants: Vec<FieldElement>,
    matrix: Vec<Vec<FieldElement>>,
}

impl Poseidon {
    pub fn new(params: HashParams) -> Result<Self, PoseidonError> {
        let HashParams { t, rounds_f, rounds_p } = params;
        if t < 2 || rounds_f == 0 || rounds_f % 2 != 0 || rounds_p == 0 {
            return Err(PoseidonError::InvalidParams { t, rounds_f, rounds_p });
        }

        let round_constants = derive_constants(&format!("{}_constants", SEED), rounds_f + rounds_p);
        let matrix = derive_matrix(&format!("{}_matrix_0000", SEED), t)?;

        Ok(Self {
            params,
            round_constants,
            matrix,
        })
    }

    pub fn params(&self) -> HashParams {
        self.params
    }

    /// Hash up to `t - 1` inputs; the first state word is the digest.
    pub fn hash(&self, inputs: &[FieldElement]) -> Result<FieldElement, PoseidonError> {
        let t = self.params.t;
        if inputs.is_empty() {
            return Err(PoseidonError::EmptyInput);
        }
        if inputs.len() >= t {
            return Err(PoseidonError::TooManyInputs { inputs: inputs.len(), t });
        }

        let mut state = vec![FieldElement::zero(); t];
        state[..inputs.len()].clone_from_slice(inputs);

        let half_f = self.params.rounds_f / 2;
        for (round, constant) in self.round_constants.iter().enumerate() {
            for word in state.iter_mut() {
                *word = &*word + constant;
            }

            let full = round < half_f || round >= half_f + self.params.rounds_p;
            if full {
                for word in state.iter_mut() {
                    *word = word.pow5();
                }
            } else {
                state[0] = state[0].pow5();
            }

            state = self.mix(&state);
        }

        Ok(state.swap_remove(0))
    }

    fn mix(&self, state: &[FieldElement]) -> Vec<FieldElement> {
        self.matrix
            .iter()
            .map(|row| {
                row.iter()
                    .zip(state)
                    .fold(FieldElement::zero(), |acc, (m, s)| &acc + &(m * s))
            })
            .collect()
    }
}

fn derive_constants(seed: &str, count: usize) -> Vec<FieldElement> {
    let mut digest = Blake2b256::digest(seed.as_bytes());
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(FieldElement::from_le_bytes_mod_order(&digest));
        digest = Blake2b256::digest(digest.as_slice());
    }
    out
}

fn derive_matrix(seed: &str, t: usize) -> Result<Vec<Vec<FieldElement>>, PoseidonError> {
    let c = derive_constants(seed, 2 * t);
    let mut matrix = Vec::with_capacity(t);
    for i in 0..t {
        let mut row = Vec::with_capacity(t);
        for j in 0..t {
            let entry = (&c[i] - &c[t + j])
                .inverse()
                .ok_or(PoseidonError::DegenerateMatrix)?;
            row.push(entry);
        }
        matrix.push(row);
    }
    Ok(matrix)
}

static CACHE: Lazy<RwLock<HashMap<HashParams, Arc<Poseidon>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Shared instance for a parameter set; constants are expanded once per
/// process.
pub fn hasher(params: HashParams) -> Result<Arc<Poseidon>, PoseidonError> {
    if let Some(existing) = CACHE.read().get(&params) {
        return Ok(Arc::clone(existing));
    }
    let created = Arc::new(Poseidon::new(params)?);
    let mut cache = CACHE.write();
    Ok(Arc::clone(cache.entry(params).or_insert(created)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    #[test]
    fn test_deterministic() {
        let h = hasher(HashParams::new(3, 6, 53)).unwrap();
        let a = h.hash(&[fe(1), fe(2)]).unwrap();
        let b = h.hash(&[fe(1), fe(2)]).unwrap();
        assert_eq!(a, b);
    }

    fn dec(s: &str) -> FieldElement {
        s.parse().unwrap()
    }

    #[test]
    fn test_matches_circomlib_reference_vectors() {
        // circomlib createHash(6, 8, 57)
        let h = Poseidon::new(HashParams::new(6, 8, 57)).unwrap();
        assert_eq!(
            h.hash(&[fe(1), fe(2)]).unwrap(),
            dec("12242166908188651009877250812424843524687801523336557272219921456462821518061")
        );
        assert_eq!(
            h.hash(&[fe(3), fe(4)]).unwrap(),
            dec("17185195740979599334254027721507328033796809509313949281114643312710535000993")
        );
    }

    #[test]
    fn test_known_answer_request_width() {
        let h = hasher(HashParams::new(3, 6, 53)).unwrap();
        assert_eq!(
            h.hash(&[fe(1), fe(2)]).unwrap(),
            dec("18034868597434240293665220970421168445584131937984445797953356852217236273181")
        );
    }

    #[test]
    fn test_known_answer_challenge_width() {
        let h = hasher(HashParams::new(6, 6, 52)).unwrap();
        assert_eq!(
            h.hash(&[fe(1), fe(2), fe(3), fe(4), fe(5)]).unwrap(),
            dec("20002669713706407975383835106433032299526979861028476537868281298098601907001")
        );
    }

    #[test]
    fn test_input_order_matters() {
        let h = hasher(HashParams::new(3, 6, 53)).unwrap();
        assert_ne!(
            h.hash(&[fe(1), fe(2)]).unwrap(),
            h.hash(&[fe(2), fe(1)]).unwrap()
        );
    }

    #[test]
    fn test_width_changes_digest() {
        let narrow = hasher(HashParams::new(2, 6, 53)).unwrap();
        let wide = hasher(HashParams::new(3, 6, 53)).unwrap();
        assert_ne!(narrow.hash(&[fe(7)]).unwrap(), wide.hash(&[fe(7)]).unwrap());
    }

    #[test]
    fn test_trailing_zero_input_is_padding() {
        // inputs fill the state from the left; an explicit zero equals padding
        let h = hasher(HashParams::new(4, 6, 53)).unwrap();
        assert_eq!(
            h.hash(&[fe(9), fe(8)]).unwrap(),
            h.hash(&[fe(9), fe(8), fe(0)]).unwrap()
        );
    }

    #[test]
    fn test_rejects_full_width_input() {
        let h = hasher(HashParams::new(2, 6, 53)).unwrap();
        assert_eq!(
            h.hash(&[fe(1), fe(2)]),
            Err(PoseidonError::TooManyInputs { inputs: 2, t: 2 })
        );
        assert_eq!(h.hash(&[]), Err(PoseidonError::EmptyInput));
    }

    #[test]
    fn test_invalid_params() {
        assert!(Poseidon::new(HashParams::new(1, 6, 53)).is_err());
        assert!(Poseidon::new(HashParams::new(3, 5, 53)).is_err());
        assert!(Poseidon::new(HashParams::new(3, 6, 0)).is_err());
    }

    #[test]
    fn test_constant_counts() {
        let h = Poseidon::new(HashParams::new(9, 6, 53)).unwrap();
        assert_eq!(h.round_constants.len(), 59);
        assert_eq!(h.matrix.len(), 9);
        assert!(h.matrix.iter().all(|row| row.len() == 9));
    }

    #[test]
    fn test_cache_shares_instance() {
        let a = hasher(HashParams::new(14, 6, 53)).unwrap();
        let b = hasher(HashParams::new(14, 6, 53)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
