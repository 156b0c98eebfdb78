use ark_bn254::Fr;
use ark_r1cs_std::fields::{FieldVar, fp::FpVar};
use ark_relations::r1cs::SynthesisError;
use zkdvp_privacy::poseidon_parameters;

/// In-circuit Poseidon, sharing round constants with the native hash.
///
/// The arity is the number of inputs (3, 4 or 5). State is `[0, inputs..]`
/// and the digest is `state[0]` after the final round, as in circomlib.
pub fn poseidon_var(inputs: &[FpVar<Fr>]) -> Result<FpVar<Fr>, SynthesisError> {
    let params = poseidon_parameters(inputs.len()).ok_or(SynthesisError::Unsatisfiable)?;
    let width = params.width;
    let half_full = params.full_rounds / 2;
    let rounds = params.full_rounds + params.partial_rounds;

    let mut state = Vec::with_capacity(width);
    state.push(FpVar::zero());
    state.extend(inputs.iter().cloned());

    for round in 0..rounds {
        for (i, x) in state.iter_mut().enumerate() {
            *x += params.ark[round * width + i];
        }

        if round < half_full || round >= half_full + params.partial_rounds {
            for x in state.iter_mut() {
                *x = x.pow_by_constant([params.alpha])?;
            }
        } else {
            state[0] = state[0].pow_by_constant([params.alpha])?;
        }

        state = params
            .mds
            .iter()
            .map(|row| {
                state
                    .iter()
                    .zip(row)
                    .fold(FpVar::zero(), |acc, (x, m)| acc + x * *m)
            })
            .collect();
    }

    Ok(state.swap_remove(0))
}
