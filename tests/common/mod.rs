use lake_eval::*;
use std::collections::HashMap;

#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[allow(dead_code)]
pub fn default_lake() -> LakeMdp {
    LakeMdp::default_map().unwrap()
}

/// Exact probabilities of ending in a goal, a hole, or neither within `step_limit` steps.
#[allow(dead_code)]
#[derive(Debug)]
pub struct Absorption {
    pub p_goal: f64,
    pub p_hole: f64,
    pub p_none: f64,
}

/// Pushes the state distribution through the transition model under a memoryless policy.
#[allow(dead_code)]
pub fn absorption<P: Policy>(mdp: &LakeMdp, policy: &mut P, step_limit: usize) -> Absorption {
    let mut mass = HashMap::from([(mdp.start_state(), 1.)]);
    let (mut p_goal, mut p_hole) = (0., 0.);

    for _ in 0..step_limit {
        let mut next = HashMap::new();
        for (s, m) in &mass {
            let a = policy.decide(s).unwrap();
            for o in mdp.transition(s, a).unwrap() {
                let w = m * o.probability;
                if !mdp.is_terminal(&o.next_state).unwrap() {
                    *next.entry(o.next_state).or_insert(0.) += w;
                } else if o.reward > 0. {
                    p_goal += w;
                } else {
                    p_hole += w;
                }
            }
        }
        mass = next;
    }

    Absorption {
        p_goal,
        p_hole,
        p_none: mass.values().sum(),
    }
}
