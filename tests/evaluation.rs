extern crate float_eq;
extern crate lake_eval;
mod common;

use common::*;
use float_eq::*;
use lake_eval::*;
use rand::prelude::*;
use rstest::rstest;

/// Always heads Up; laterals are Left/Right so the top row is never left.
struct AlwaysUp;

impl Policy for AlwaysUp {
    fn decide(&mut self, _s: &State) -> Result<Action> {
        Ok(Action::Up)
    }
}

/// Always heads Down, burning `draws` numbers of its own stream per decision.
struct NoisyDown {
    rng: StdRng,
    draws: usize,
}

impl Policy for NoisyDown {
    fn decide(&mut self, _s: &State) -> Result<Action> {
        for _ in 0..self.draws {
            let _ = self.rng.gen::<u64>();
        }
        Ok(Action::Down)
    }
}

fn assert_probabilities_sum_to_one(s: &EvaluationSummary) {
    assert_float_eq!(s.p_goal + s.p_hole + s.p_none, 1., abs <= 1e-9);
}

#[test]
fn run_trial_is_deterministic() {
    init_tracing();
    let lake = default_lake();
    let analyzer = UtilityAnalyzer::new(&lake, AnalyzerConfig::default()).unwrap();

    for seed in [0, 1, 42, u64::MAX] {
        let a = analyzer.run_trial(RandomPolicy::new, seed).unwrap();
        let b = analyzer.run_trial(RandomPolicy::new, seed).unwrap();

        assert_eq!(a.utility.to_bits(), b.utility.to_bits());
        assert_eq!(a.length, b.length);
        assert_eq!(a.terminal, b.terminal);
    }
}

#[test]
fn empty_batch_does_not_fail() {
    let lake = default_lake();
    let analyzer = UtilityAnalyzer::new(&lake, AnalyzerConfig::default()).unwrap();

    let s = analyzer.evaluate(RandomPolicy::new, 0, 123).unwrap();

    assert_eq!(s, EvaluationSummary::default());
    assert_eq!(analyzer.evaluate_par(CustomPolicy::new, 0, 123).unwrap(), s);
}

#[test]
fn evaluate_is_reproducible_and_order_free() {
    let lake = default_lake();
    let analyzer = UtilityAnalyzer::new(&lake, AnalyzerConfig::default()).unwrap();

    let seq = analyzer.evaluate(RandomPolicy::new, 300, 7).unwrap();
    let again = analyzer.evaluate(RandomPolicy::new, 300, 7).unwrap();
    let par = analyzer.evaluate_par(RandomPolicy::new, 300, 7).unwrap();

    assert_eq!(seq, again);
    assert_eq!(seq, par);
    assert_eq!(seq.mean_utility.to_bits(), par.mean_utility.to_bits());
}

#[test]
fn base_seed_drives_outcomes() {
    let lake = default_lake();
    let analyzer = UtilityAnalyzer::new(&lake, AnalyzerConfig::default()).unwrap();

    let a = analyzer.evaluate(RandomPolicy::new, 50, 0).unwrap();
    let b = analyzer.evaluate(RandomPolicy::new, 50, 1_000).unwrap();

    assert_ne!(a, b);
}

#[rstest]
fn terminal_probabilities_sum_to_one(
    #[values(0.5, 0.9, 1.0)] gamma: f64,
    #[values(0, 123, 9_999)] base_seed: u64,
) {
    let lake = default_lake();
    let config = AnalyzerConfig::default().with_gamma(gamma);
    let analyzer = UtilityAnalyzer::new(&lake, config).unwrap();

    let random = analyzer.evaluate(RandomPolicy::new, 101, base_seed).unwrap();
    let custom = analyzer.evaluate(CustomPolicy::new, 101, base_seed).unwrap();

    for s in [random, custom] {
        assert_eq!(s.n_trials, 101);
        assert_probabilities_sum_to_one(&s);
        assert!(s.utility_variance >= 0.);
        assert!(s.mean_length >= 1.);
    }
}

#[test]
fn custom_policy_matches_slip_model() {
    init_tracing();
    let lake = default_lake();
    let config = AnalyzerConfig {
        gamma: 1.0,
        step_limit: 100,
    };
    let analyzer = UtilityAnalyzer::new(&lake, config).unwrap();

    let exact = absorption(
        &lake,
        &mut CustomPolicy::new(&lake, StdRng::seed_from_u64(0)),
        config.step_limit,
    );
    let s = analyzer.evaluate_par(CustomPolicy::new, 4000, 123).unwrap();

    assert_float_eq!(exact.p_goal + exact.p_hole + exact.p_none, 1., abs <= 1e-9);
    assert_float_eq!(s.p_goal, exact.p_goal, abs <= 0.035);
    assert_float_eq!(s.p_hole, exact.p_hole, abs <= 0.035);
    assert_float_eq!(s.p_none, exact.p_none, abs <= 0.035);
    assert_probabilities_sum_to_one(&s);
}

#[test]
fn never_absorbing_policy_hits_step_limit() {
    let lake = default_lake();
    let config = AnalyzerConfig {
        gamma: 1.0,
        step_limit: 100,
    };
    let analyzer = UtilityAnalyzer::new(&lake, config).unwrap();

    let s = analyzer.evaluate(|_, _| AlwaysUp, 20, 5).unwrap();

    assert_eq!(s.p_none, 1.);
    assert_eq!(s.mean_length, 100.);
    assert_float_eq!(s.mean_utility, 10., abs <= 1e-9);
    assert_float_eq!(s.utility_variance, 0., abs <= 1e-12);
}

#[test]
fn trace_adds_up_to_utility() {
    let lake = default_lake();
    let gamma = 0.9;
    let analyzer = UtilityAnalyzer::new(&lake, AnalyzerConfig::default().with_gamma(gamma)).unwrap();

    for seed in 0..20 {
        let (ret, ep) = analyzer.simulator().trace(RandomPolicy::new, seed).unwrap();

        let utility = ep
            .iter()
            .enumerate()
            .map(|(t, e)| gamma.powi(t as i32) * e.r)
            .sum::<f64>();
        assert_eq!(ret.length, ep.len());
        assert_eq!(ep[0].s, lake.start_state());
        assert_float_eq!(ret.utility, utility, abs <= 1e-12);
        if ret.terminal != TerminalKind::StepLimit {
            assert_eq!(
                TerminalKind::from_entry_reward(ep[ep.len() - 1].r),
                ret.terminal
            );
        }
    }
}

#[test]
fn policy_draws_do_not_shift_environment() {
    let lake = default_lake();
    let sim = EpisodeSimulator::new(&lake, 0.9, 100);

    for seed in 0..20 {
        let quiet = sim
            .trace(|_, rng| NoisyDown { rng, draws: 0 }, seed)
            .unwrap();
        let noisy = sim
            .trace(|_, rng| NoisyDown { rng, draws: 3 }, seed)
            .unwrap();

        assert_eq!(quiet, noisy);
    }
}

#[test]
fn illegal_action_is_an_error() {
    struct Stay;

    impl Policy for Stay {
        fn decide(&mut self, _s: &State) -> Result<Action> {
            Ok(Action::Absorb)
        }
    }

    let lake = default_lake();
    let analyzer = UtilityAnalyzer::new(&lake, AnalyzerConfig::default()).unwrap();

    let ret = analyzer.evaluate(|_, _| Stay, 3, 0);

    assert!(matches!(
        ret,
        Err(LakeError::IllegalAction {
            action: Action::Absorb,
            ..
        })
    ));
}

#[test]
fn invalid_discount_is_rejected() {
    let lake = default_lake();
    let ret = UtilityAnalyzer::new(&lake, AnalyzerConfig::default().with_gamma(-0.1));
    assert!(matches!(ret, Err(LakeError::InvalidDiscount(_))));
}
