use crate::core::ops::mean_abs_difference;
use crate::core::{PhaseError, check_shape, magnitude_error, magnitude_project, validate_magnitude};
use crate::signal_processing::{Transform, range_project};
use log::{debug, trace};
use ndarray::{Array2, Zip};
use num_complex::Complex;

/// One iteration of a phase recovery algorithm, as a pure state transition.
///
/// `step` consumes the state of the previous iteration and returns the next state
/// together with the magnitude-consistent estimate `x` of this iteration. Nothing
/// beyond the previous state is carried between iterations.
pub trait StepFunction {
    type State;

    fn step(
        &self,
        state: Self::State,
        amp: &Array2<f32>,
    ) -> Result<(Self::State, Array2<Complex<f32>>), PhaseError>;

    /// Convergence measure of an iteration, computed from its new state and estimate.
    fn residual(
        &self,
        state: &Self::State,
        x: &Array2<Complex<f32>>,
        amp: &Array2<f32>,
    ) -> Result<f32, PhaseError>;
}

/// Griffin-Lim state: the current complex spectrogram estimate `z`.
#[derive(Debug, Clone, PartialEq)]
pub struct GlaState {
    pub z: Array2<Complex<f32>>,
}

/// ADMM-GLA state: the split variable `z` and the scaled dual variable `u`.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmmState {
    pub z: Array2<Complex<f32>>,
    pub u: Array2<Complex<f32>>,
}

/// Griffin-Lim iteration: `x = amp ⊙ mysign(z)`, then `z = STFT(iSTFT(x))`.
///
/// The residual is the mean magnitude error of the range-projected `z`, i.e. how far
/// the spectrogram of the signal synthesized from `x` is from `amp`.
pub struct GlaStep<'a, T: Transform + ?Sized> {
    transform: &'a T,
}

impl<'a, T: Transform + ?Sized> GlaStep<'a, T> {
    pub fn new(transform: &'a T) -> Self {
        Self { transform }
    }
}

impl<T: Transform + ?Sized> StepFunction for GlaStep<'_, T> {
    type State = GlaState;

    fn step(
        &self,
        state: GlaState,
        amp: &Array2<f32>,
    ) -> Result<(GlaState, Array2<Complex<f32>>), PhaseError> {
        let x = magnitude_project(&state.z, amp)?;
        let z = range_project(&x, self.transform)?;
        Ok((GlaState { z }, x))
    }

    fn residual(
        &self,
        state: &GlaState,
        _x: &Array2<Complex<f32>>,
        amp: &Array2<f32>,
    ) -> Result<f32, PhaseError> {
        magnitude_error(&state.z, amp)
    }
}

/// ADMM-GLA iteration with penalty `rho`:
///
/// 1. `x = amp ⊙ mysign(z - u)`
/// 2. `v = x + u`
/// 3. `z = (rho·v + STFT(iSTFT(v))) / (1 + rho)`
/// 4. `u = u + x - z`
///
/// Step 3 is the closed-form minimizer of `rho/2·‖z - v‖² + 1/2·‖z - P(v)‖²`, so the
/// range constraint is relaxed rather than enforced at every step. Large `rho` keeps
/// `z` close to `v`; small `rho` keeps it close to the range projection, as in GLA.
/// The residual is the mean primal residual `mean(|x - z|)`.
pub struct AdmmStep<'a, T: Transform + ?Sized> {
    transform: &'a T,
    rho: f32,
}

impl<'a, T: Transform + ?Sized> AdmmStep<'a, T> {
    /// # Errors
    /// `InvalidParameter` unless `rho` is finite and strictly positive.
    pub fn new(transform: &'a T, rho: f32) -> Result<Self, PhaseError> {
        validate_rho(rho)?;
        Ok(Self { transform, rho })
    }

    pub fn rho(&self) -> f32 {
        self.rho
    }
}

impl<T: Transform + ?Sized> StepFunction for AdmmStep<'_, T> {
    type State = AdmmState;

    fn step(
        &self,
        state: AdmmState,
        amp: &Array2<f32>,
    ) -> Result<(AdmmState, Array2<Complex<f32>>), PhaseError> {
        let AdmmState { z, mut u } = state;
        check_shape(z.dim(), u.dim())?;

        let x = magnitude_project(&(&z - &u), amp)?;
        let v = &x + &u;
        let projected = range_project(&v, self.transform)?;
        let rho = self.rho;
        let z = Zip::from(&v)
            .and(&projected)
            .map_collect(|&v, &p| (v * rho + p) / (1.0 + rho));
        Zip::from(&mut u)
            .and(&x)
            .and(&z)
            .for_each(|u, &x, &z| *u = *u + x - z);

        Ok((AdmmState { z, u }, x))
    }

    fn residual(
        &self,
        state: &AdmmState,
        x: &Array2<Complex<f32>>,
        _amp: &Array2<f32>,
    ) -> Result<f32, PhaseError> {
        check_shape(x.dim(), state.z.dim())?;
        Ok(mean_abs_difference(x, &state.z))
    }
}

pub(crate) fn validate_rho(rho: f32) -> Result<(), PhaseError> {
    if !rho.is_finite() || rho <= 0.0 {
        return Err(PhaseError::InvalidParameter(format!(
            "rho must be finite and positive, got {}",
            rho
        )));
    }
    Ok(())
}

/// Outcome of a phase recovery run.
#[derive(Debug, Clone)]
pub struct Recovery {
    /// Magnitude-consistent estimate `x` of the last iteration.
    pub estimate: Array2<Complex<f32>>,
    /// Number of iterations actually run.
    pub iterations: usize,
    /// Residual of every iteration, in order.
    pub residuals: Vec<f32>,
}

/// Griffin-Lim parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlaParams {
    pub max_iter: usize,
    /// Stop once an iteration's residual drops to this value. Off by default.
    pub tolerance: Option<f32>,
}

impl Default for GlaParams {
    fn default() -> Self {
        Self {
            max_iter: 10,
            tolerance: None,
        }
    }
}

impl GlaParams {
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
}

/// ADMM-GLA parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmmParams {
    pub max_iter: usize,
    /// Penalty weight of the consensus constraint `x = z`.
    pub rho: f32,
    /// Stop once an iteration's residual drops to this value. Off by default.
    pub tolerance: Option<f32>,
}

impl Default for AdmmParams {
    fn default() -> Self {
        Self {
            max_iter: 10,
            rho: 0.1,
            tolerance: None,
        }
    }
}

impl AdmmParams {
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn rho(mut self, rho: f32) -> Self {
        self.rho = rho;
        self
    }

    pub fn tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
}

/// Runs up to `max_iter` iterations of `step_fn` and returns the last estimate.
///
/// Inputs are validated once here, never inside the loop. `observer` is called after
/// every iteration with the zero-based iteration index, the estimate `x` and the
/// residual. With `tolerance` set, the loop stops after the first iteration whose
/// residual is at or below it; without it exactly `max_iter` iterations run.
///
/// # Errors
/// * `InvalidParameter` - `max_iter == 0`, a negative or non-finite tolerance, or an invalid `amp`.
/// * Any error of the step function, which aborts the run.
pub fn run_steps<S, F>(
    step_fn: &S,
    init: S::State,
    amp: &Array2<f32>,
    max_iter: usize,
    tolerance: Option<f32>,
    mut observer: F,
) -> Result<Recovery, PhaseError>
where
    S: StepFunction,
    F: FnMut(usize, &Array2<Complex<f32>>, f32),
{
    if max_iter == 0 {
        return Err(PhaseError::InvalidParameter(
            "max_iter must be at least 1".to_string(),
        ));
    }
    if let Some(tol) = tolerance {
        if !tol.is_finite() || tol < 0.0 {
            return Err(PhaseError::InvalidParameter(format!(
                "tolerance must be finite and non-negative, got {}",
                tol
            )));
        }
    }
    validate_magnitude(amp)?;

    let mut state = init;
    let mut estimate = None;
    let mut residuals = Vec::with_capacity(max_iter);

    for i in 0..max_iter {
        let (next, x) = step_fn.step(state, amp)?;
        let residual = step_fn.residual(&next, &x, amp)?;
        trace!("iteration {}/{}: residual {:.6e}", i + 1, max_iter, residual);
        observer(i, &x, residual);

        residuals.push(residual);
        state = next;
        estimate = Some(x);

        if tolerance.is_some_and(|tol| residual <= tol) {
            debug!("residual {:.6e} reached tolerance after {} iterations", residual, i + 1);
            break;
        }
    }

    let iterations = residuals.len();
    let estimate = estimate.ok_or_else(|| {
        PhaseError::InvalidParameter("no iteration was run".to_string())
    })?;
    Ok(Recovery {
        estimate,
        iterations,
        residuals,
    })
}

/// Recovers a phase for `amp` with the Griffin-Lim algorithm.
///
/// # Arguments
/// * `z0` - Initial complex spectrogram, same shape as `amp`.
/// * `amp` - Target magnitude spectrogram (shape: `[n_freqs, n_frames]`).
/// * `max_iter` - Number of iterations (at least 1).
/// * `transform` - Forward/inverse STFT pair that produced `amp`'s frame grid.
///
/// # Returns
/// The final magnitude-consistent estimate `x` (not the final `z`).
pub fn run_gla<T: Transform + ?Sized>(
    z0: &Array2<Complex<f32>>,
    amp: &Array2<f32>,
    max_iter: usize,
    transform: &T,
) -> Result<Array2<Complex<f32>>, PhaseError> {
    let params = GlaParams::default().max_iter(max_iter);
    Ok(run_gla_with_params(z0, amp, params, transform)?.estimate)
}

/// Griffin-Lim with full parameters; returns the iteration count and residual history too.
pub fn run_gla_with_params<T: Transform + ?Sized>(
    z0: &Array2<Complex<f32>>,
    amp: &Array2<f32>,
    params: GlaParams,
    transform: &T,
) -> Result<Recovery, PhaseError> {
    check_shape(amp.dim(), z0.dim())?;
    debug!(
        "GLA on {:?} spectrogram: max_iter={}, tolerance={:?}",
        amp.dim(),
        params.max_iter,
        params.tolerance
    );

    let step = GlaStep::new(transform);
    let init = GlaState { z: z0.to_owned() };
    let recovery = run_steps(&step, init, amp, params.max_iter, params.tolerance, |_, _, _| {})?;
    debug!(
        "GLA finished after {} iterations, residual {:?}",
        recovery.iterations,
        recovery.residuals.last()
    );
    Ok(recovery)
}

/// Recovers a phase for `amp` with ADMM-based Griffin-Lim.
///
/// # Arguments
/// * `z0` - Initial complex spectrogram, same shape as `amp`.
/// * `u0` - Initial dual variable, same shape as `amp` (usually all zeros).
/// * `amp` - Target magnitude spectrogram.
/// * `max_iter` - Number of iterations (at least 1).
/// * `rho` - Penalty parameter, strictly positive.
/// * `transform` - Forward/inverse STFT pair.
///
/// # Returns
/// The final magnitude-consistent estimate `x`.
///
/// # Errors
/// `InvalidParameter` for `rho <= 0`; `ShapeMismatch` when `z0` or `u0` does not match `amp`.
pub fn run_admm<T: Transform + ?Sized>(
    z0: &Array2<Complex<f32>>,
    u0: &Array2<Complex<f32>>,
    amp: &Array2<f32>,
    max_iter: usize,
    rho: f32,
    transform: &T,
) -> Result<Array2<Complex<f32>>, PhaseError> {
    let params = AdmmParams::default().max_iter(max_iter).rho(rho);
    Ok(run_admm_with_params(z0, u0, amp, params, transform)?.estimate)
}

/// ADMM-GLA with full parameters; returns the iteration count and residual history too.
pub fn run_admm_with_params<T: Transform + ?Sized>(
    z0: &Array2<Complex<f32>>,
    u0: &Array2<Complex<f32>>,
    amp: &Array2<f32>,
    params: AdmmParams,
    transform: &T,
) -> Result<Recovery, PhaseError> {
    let step = AdmmStep::new(transform, params.rho)?;
    check_shape(amp.dim(), z0.dim())?;
    check_shape(amp.dim(), u0.dim())?;
    debug!(
        "ADMM-GLA on {:?} spectrogram: max_iter={}, rho={}, tolerance={:?}",
        amp.dim(),
        params.max_iter,
        params.rho,
        params.tolerance
    );

    let init = AdmmState {
        z: z0.to_owned(),
        u: u0.to_owned(),
    };
    let recovery = run_steps(&step, init, amp, params.max_iter, params.tolerance, |_, _, _| {})?;
    debug!(
        "ADMM-GLA finished after {} iterations, residual {:?}",
        recovery.iterations,
        recovery.residuals.last()
    );
    Ok(recovery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::relative_difference;
    use crate::signal_generation::{random_phase_init, zero_dual};
    use crate::signal_processing::{Stft, StftConfig, magnitude_spectrogram};
    use approx::assert_abs_diff_eq;

    fn setup() -> (Stft, Array2<f32>, Array2<Complex<f32>>) {
        let stft = Stft::new(StftConfig::new(64, 32)).unwrap();
        let y: Vec<f32> = (0..64 + 12 * 32)
            .map(|n| (0.21 * n as f32).sin() + 0.5 * (0.047 * n as f32).cos())
            .collect();
        let amp = magnitude_spectrogram(&y, &stft).unwrap();
        let z0 = random_phase_init(&amp, 0).unwrap();
        (stft, amp, z0)
    }

    #[test]
    fn test_gla_step_magnitude_invariant() {
        let (stft, amp, z0) = setup();
        let step = GlaStep::new(&stft);
        let (state, x) = step.step(GlaState { z: z0 }, &amp).unwrap();
        assert_eq!(state.z.dim(), amp.dim());
        for (x, a) in x.iter().zip(amp.iter()) {
            assert_abs_diff_eq!(x.norm(), *a, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_admm_step_updates_dual() {
        let (stft, amp, z0) = setup();
        let step = AdmmStep::new(&stft, 0.1).unwrap();
        let u0 = zero_dual(&amp);
        let (state, x) = step
            .step(AdmmState { z: z0, u: u0 }, &amp)
            .unwrap();
        // u starts at zero, so after one step u == x - z.
        let expected = &x - &state.z;
        for (u, e) in state.u.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(u.re, e.re, epsilon = 1e-5);
            assert_abs_diff_eq!(u.im, e.im, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_admm_large_rho_keeps_z_near_v() {
        let (stft, amp, z0) = setup();
        let step = AdmmStep::new(&stft, 1000.0).unwrap();
        let u0 = zero_dual(&amp);
        let (state, x) = step
            .step(AdmmState { z: z0, u: u0.clone() }, &amp)
            .unwrap();
        let v = &x + &u0;
        assert!(relative_difference(&state.z, &v).unwrap() < 5e-3);
    }

    #[test]
    fn test_admm_rejects_bad_rho() {
        let (stft, _, _) = setup();
        for rho in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                AdmmStep::new(&stft, rho),
                Err(PhaseError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_run_steps_zero_iterations() {
        let (stft, amp, z0) = setup();
        let step = GlaStep::new(&stft);
        let result = run_steps(&step, GlaState { z: z0 }, &amp, 0, None, |_, _, _| {});
        assert!(matches!(result, Err(PhaseError::InvalidParameter(_))));
    }

    #[test]
    fn test_run_steps_observer_sees_every_iteration() {
        let (stft, amp, z0) = setup();
        let step = GlaStep::new(&stft);
        let mut seen = Vec::new();
        let recovery = run_steps(&step, GlaState { z: z0 }, &amp, 4, None, |i, x, r| {
            assert_eq!(x.dim(), amp.dim());
            seen.push((i, r));
        })
        .unwrap();
        assert_eq!(recovery.iterations, 4);
        assert_eq!(seen.len(), 4);
        assert_eq!(seen.iter().map(|&(i, _)| i).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(
            seen.iter().map(|&(_, r)| r).collect::<Vec<_>>(),
            recovery.residuals
        );
    }

    #[test]
    fn test_tolerance_stops_early() {
        let (stft, amp, z0) = setup();
        let params = GlaParams::default().max_iter(50).tolerance(f32::MAX);
        let recovery = run_gla_with_params(&z0, &amp, params, &stft).unwrap();
        assert_eq!(recovery.iterations, 1);
        assert_eq!(recovery.residuals.len(), 1);
    }

    #[test]
    fn test_default_runs_all_iterations() {
        let (stft, amp, z0) = setup();
        let u0 = zero_dual(&amp);
        let recovery =
            run_admm_with_params(&z0, &u0, &amp, AdmmParams::default(), &stft).unwrap();
        assert_eq!(recovery.iterations, 10);
        assert!(recovery.residuals.iter().all(|r| r.is_finite()));
    }

    #[test]
    fn test_invalid_tolerance() {
        let (stft, amp, z0) = setup();
        let params = GlaParams::default().tolerance(-1.0);
        assert!(matches!(
            run_gla_with_params(&z0, &amp, params, &stft),
            Err(PhaseError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let (stft, amp, z0) = setup();
        let wrong = Array2::zeros((amp.nrows(), amp.ncols() + 1));
        assert!(matches!(
            run_gla(&wrong, &amp, 2, &stft),
            Err(PhaseError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            run_admm(&z0, &wrong, &amp, 2, 0.1, &stft),
            Err(PhaseError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_engines_are_reentrant() {
        let (stft, amp, z0) = setup();
        let u0 = zero_dual(&amp);
        let gla_first = run_gla(&z0, &amp, 3, &stft).unwrap();
        let admm = run_admm(&z0, &u0, &amp, 3, 0.1, &stft).unwrap();
        let gla_second = run_gla(&z0, &amp, 3, &stft).unwrap();
        assert_eq!(gla_first, gla_second);
        assert_eq!(admm.dim(), amp.dim());
    }
}
